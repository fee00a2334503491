//! Query Runner Module
//! Executes the fixed catalog against an open store.

use crate::query::catalog::{QuerySpec, QUERIES};
use crate::store::{Store, StoreError};
use polars::prelude::DataFrame;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
#[error("Query '{name}' failed: {source}")]
pub struct QueryError {
    pub name: &'static str,
    #[source]
    pub source: StoreError,
}

/// One executed query.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub spec: &'static QuerySpec,
    pub df: DataFrame,
}

impl QueryResult {
    pub fn name(&self) -> &'static str {
        self.spec.name
    }
}

pub struct QueryRunner;

impl QueryRunner {
    pub fn run(store: &Store, spec: &'static QuerySpec) -> Result<QueryResult, QueryError> {
        let df = store.query_frame(spec.sql).map_err(|source| QueryError {
            name: spec.name,
            source,
        })?;
        debug!(query = spec.name, rows = df.height(), "query finished");
        Ok(QueryResult { spec, df })
    }

    /// Run every catalog query in order.
    pub fn run_all(store: &Store) -> Result<Vec<QueryResult>, QueryError> {
        let results = QUERIES
            .iter()
            .map(|spec| Self::run(store, spec))
            .collect::<Result<Vec<_>, _>>()?;
        info!("Ran {} queries against {}", results.len(), store.path().display());
        Ok(results)
    }
}
