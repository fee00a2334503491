//! Export module - result files, charts, deck and preview

mod exporter;
mod preview;

pub use exporter::{write_csv, ExportError, ExportFailure, ExportReport, Exporter};
pub use preview::{PreviewBuilder, KEY_COLUMNS};
