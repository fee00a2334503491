//! Card Insights - batch analysis of users, cards and transactions
//!
//! Loads the three source CSVs, cleans them against declared schemas, stores
//! them in SQLite, runs a fixed set of analytical queries and exports the
//! results as CSV files, bar charts, a slide deck and a text preview.

pub mod charts;
pub mod config;
pub mod data;
pub mod export;
pub mod pipeline;
pub mod ppt;
pub mod query;
pub mod stats;
pub mod store;

pub use config::{ConfigError, PipelineConfig};
pub use pipeline::{Pipeline, PipelineError, RunSummary};
