//! Query module - the fixed analytical queries and their runner

mod catalog;
mod runner;

pub use catalog::{find_query, ChartSpec, QuerySpec, QUERIES};
pub use runner::{QueryError, QueryResult, QueryRunner};
