//! Pipeline Module
//! Runs the batch end to end: locate, load, clean, preview, store, query,
//! export.

use crate::charts::ensure_chart_font;
use crate::config::PipelineConfig;
use crate::data::{
    locate_source, CleanError, CleanTable, DataCleaner, DataLoader, DataSourceError, QualityReport,
    ALL_TABLES,
};
use crate::export::{ExportFailure, ExportReport, Exporter, PreviewBuilder};
use crate::query::{QueryError, QueryRunner};
use crate::store::{Store, StoreError};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that stop the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] DataSourceError),
    #[error("Cleaning failed: {0}")]
    Clean(#[from] CleanError),
    #[error("Store failed: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("Cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a run produced.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Row counts per stored table, in load order
    pub tables: Vec<(String, usize)>,
    pub written: Vec<PathBuf>,
    pub failures: Vec<ExportFailure>,
    /// The run stopped after the preview
    pub preview_only: bool,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn absorb(&mut self, report: ExportReport) {
        self.written.extend(report.written);
        self.failures.extend(report.failures);
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    search_root: PathBuf,
}

impl Pipeline {
    /// Sources are searched under the working directory.
    pub fn new(config: PipelineConfig) -> Self {
        let search_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            config,
            search_root,
        }
    }

    pub fn with_search_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.search_root = root.into();
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        let config = &self.config;
        std::fs::create_dir_all(&config.output_dir).map_err(|source| PipelineError::OutputDir {
            path: config.output_dir.clone(),
            source,
        })?;

        let tables = self.load_tables()?;
        let mut summary = RunSummary {
            tables: tables
                .iter()
                .map(|t| (t.schema.name.to_string(), t.df.height()))
                .collect(),
            preview_only: config.preview_only,
            ..Default::default()
        };

        let with_text = config.charts.enabled && ensure_chart_font(config.charts.font_path.as_deref());
        let exporter = Exporter::new(config, with_text);

        let preview = PreviewBuilder::render(&tables);
        info!("Data preview:\n{}", preview);
        match exporter.export_preview(&preview) {
            Ok(path) => {
                info!("Preview written to {}", path.display());
                summary.written.push(path);
            }
            Err(e) => warn!("Could not write preview: {}", e),
        }

        if config.quality_report {
            let quality = QualityReport {
                tables: tables.iter().map(|t| t.quality.clone()).collect(),
            };
            info!("{} values failed coercion", quality.total_failures());
            summary.absorb(exporter.export_quality(&quality));
        }

        if config.preview_only {
            info!("PREVIEW_ONLY=1, stopping after preview");
            return Ok(summary);
        }

        let db_path = config.database_path();
        let mut store = Store::open(&db_path)?;
        for table in &tables {
            let rows = store.replace_table(table.schema.name, &table.df)?;
            info!("Stored {} rows in table {}", rows, table.schema.name);
        }
        let results = QueryRunner::run_all(&store)?;
        store.close()?;
        summary.written.push(db_path);

        summary.absorb(exporter.export_results(&results));

        info!(
            "Run finished: {} outputs written, {} failed",
            summary.written.len(),
            summary.failures.len()
        );
        Ok(summary)
    }

    fn load_tables(&self) -> Result<Vec<CleanTable>, PipelineError> {
        let mut tables = Vec::with_capacity(ALL_TABLES.len());
        for schema in ALL_TABLES {
            let file = self
                .config
                .sources
                .for_table(schema.name)
                .unwrap_or(schema.source_file);
            let path = locate_source(file, self.config.data_dir.as_deref(), &self.search_root)?;
            let raw = DataLoader::load_table(schema, &path)?;
            tables.push(DataCleaner::clean_table(&raw)?);
        }
        Ok(tables)
    }
}
