//! Statistics Calculator Module
//! Descriptive statistics for the numeric columns shown in the preview.

use polars::prelude::*;
use statrs::statistics::{Data, Distribution, Median, OrderStatistics};

/// Summary of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub nulls: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub p05: f64,
    pub p95: f64,
    pub min: f64,
    pub max: f64,
}

impl ColumnSummary {
    fn empty(column: &str, nulls: usize) -> Self {
        Self {
            column: column.to_string(),
            count: 0,
            nulls,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            p05: f64::NAN,
            p95: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        }
    }
}

pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(column: &str, values: &[f64], nulls: usize) -> ColumnSummary {
        if values.is_empty() {
            return ColumnSummary::empty(column, nulls);
        }

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        let mut data = Data::new(values.to_vec());
        let mean = data.mean().unwrap_or(f64::NAN);
        // Sample standard deviation; a single value has no spread
        let std = if values.len() > 1 {
            data.std_dev().unwrap_or(f64::NAN)
        } else {
            0.0
        };
        let median = data.median();
        let p05 = data.percentile(5);
        let p95 = data.percentile(95);

        ColumnSummary {
            column: column.to_string(),
            count: values.len(),
            nulls,
            mean,
            median,
            std,
            p05,
            p95,
            min,
            max,
        }
    }

    /// Summaries for every integer/float column of a DataFrame, in column order.
    pub fn summarize_numeric_columns(df: &DataFrame) -> Vec<ColumnSummary> {
        df.get_columns()
            .iter()
            .filter(|col| col.dtype().is_integer() || col.dtype().is_float())
            .filter_map(|col| {
                let as_f64 = col.cast(&DataType::Float64).ok()?;
                let ca = as_f64.f64().ok()?;
                let values: Vec<f64> = ca.into_iter().flatten().collect();
                let nulls = col.null_count();
                Some(Self::compute_descriptive_stats(col.name(), &values, nulls))
            })
            .collect()
    }
}
