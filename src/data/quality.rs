//! Data-quality tallies gathered while cleaning.
//!
//! Cleaning never fails on bad values; it substitutes null (or `false` for
//! flags) and counts the substitution here so a run can optionally report it.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TableQuality {
    pub table: String,
    pub rows: usize,
    /// Non-empty source values that could not be coerced, per column
    pub coercion_failures: BTreeMap<String, usize>,
}

impl TableQuality {
    pub fn new(table: &str, rows: usize) -> Self {
        Self {
            table: table.to_string(),
            rows,
            coercion_failures: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, column: &str, failures: usize) {
        if failures > 0 {
            *self
                .coercion_failures
                .entry(column.to_string())
                .or_insert(0) += failures;
        }
    }

    pub fn failures_for(&self, column: &str) -> usize {
        self.coercion_failures.get(column).copied().unwrap_or(0)
    }

    pub fn total_failures(&self) -> usize {
        self.coercion_failures.values().sum()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct QualityReport {
    pub tables: Vec<TableQuality>,
}

impl QualityReport {
    pub fn total_failures(&self) -> usize {
        self.tables.iter().map(|t| t.total_failures()).sum()
    }
}
