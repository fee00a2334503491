//! Data module - source loading, schema and cleaning

pub mod cleaner;
pub mod loader;
pub mod quality;
pub mod schema;

pub use cleaner::{CleanError, CleanTable, DataCleaner};
pub use loader::{locate_source, DataLoader, DataSourceError, RawTable};
pub use quality::{QualityReport, TableQuality};
pub use schema::{ColumnKind, TableSchema, ALL_TABLES, CARDS, TRANSACTIONS, USERS};
