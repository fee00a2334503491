//! Result Exporter Module
//! Writes query results as CSV, charts as PNG, the chart deck and the
//! optional data-quality report. A failing target is recorded and the
//! remaining targets are still written.

use crate::charts::{ChartData, ChartError, StaticChartRenderer};
use crate::config::PipelineConfig;
use crate::data::QualityReport;
use crate::ppt::{DeckError, DeckGenerator, DeckImage};
use crate::query::QueryResult;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

const DECK_TITLE: &str = "Card and transaction insights";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV write failed: {0}")]
    Csv(#[from] PolarsError),
    #[error("Chart failed: {0}")]
    Chart(#[from] ChartError),
    #[error("Deck failed: {0}")]
    Deck(#[from] DeckError),
    #[error("JSON write failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// An output that could not be written.
#[derive(Debug)]
pub struct ExportFailure {
    pub target: PathBuf,
    pub error: ExportError,
}

/// Outputs written and failed by one export pass.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<ExportFailure>,
}

impl ExportReport {
    fn record(&mut self, target: PathBuf, outcome: Result<(), ExportError>) {
        match outcome {
            Ok(()) => {
                info!("Wrote {}", target.display());
                self.written.push(target);
            }
            Err(error) => {
                error!("Failed to write {}: {}", target.display(), error);
                self.failures.push(ExportFailure { target, error });
            }
        }
    }
}

pub struct Exporter<'a> {
    config: &'a PipelineConfig,
    /// Whether chart text can be drawn
    with_text: bool,
}

impl<'a> Exporter<'a> {
    pub fn new(config: &'a PipelineConfig, with_text: bool) -> Self {
        Self { config, with_text }
    }

    /// CSV for every result, PNG for every charted result, then the deck.
    pub fn export_results(&self, results: &[QueryResult]) -> ExportReport {
        let mut report = ExportReport::default();

        let results_dir = self.config.results_path();
        for result in results {
            let target = results_dir.join(format!("{}.csv", result.name()));
            let outcome = write_csv(&target, &result.df);
            report.record(target, outcome);
        }

        if !self.config.charts.enabled {
            return report;
        }

        let charts_dir = self.config.charts_path();
        let mut images = Vec::new();
        for result in results {
            let target = charts_dir.join(format!("{}.png", result.name()));
            match self.render_chart(result) {
                Ok(Some(png)) => {
                    let outcome = write_bytes(&target, &png);
                    if outcome.is_ok() {
                        images.push(DeckImage {
                            caption: result.spec.title.to_string(),
                            png,
                        });
                    }
                    report.record(target, outcome);
                }
                Ok(None) => {}
                Err(e) => report.record(target, Err(e)),
            }
        }

        if self.config.charts.deck && !images.is_empty() {
            let target = self.config.deck_path();
            let outcome = DeckGenerator::write_deck(&images, &target, DECK_TITLE)
                .map(|_| ())
                .map_err(ExportError::from);
            report.record(target, outcome);
        }

        report
    }

    fn render_chart(&self, result: &QueryResult) -> Result<Option<Vec<u8>>, ExportError> {
        let Some(data) = ChartData::from_result(result)? else {
            return Ok(None);
        };
        let png = StaticChartRenderer::render_png(
            &data,
            self.config.charts.width,
            self.config.charts.height,
            self.with_text,
        )?;
        Ok(Some(png))
    }

    /// Per-table coercion failure counts as pretty JSON.
    pub fn export_quality(&self, quality: &QualityReport) -> ExportReport {
        let mut report = ExportReport::default();
        let target = self.config.quality_path();
        let outcome = serde_json::to_vec_pretty(quality)
            .map_err(ExportError::from)
            .and_then(|json| write_bytes(&target, &json));
        report.record(target, outcome);
        report
    }

    /// Write the preview text.
    pub fn export_preview(&self, text: &str) -> Result<PathBuf, ExportError> {
        let target = self.config.preview_path();
        write_bytes(&target, text.as_bytes())?;
        Ok(target)
    }
}

fn ensure_parent(path: &Path) -> Result<(), ExportError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| ExportError::io(dir, e))
        }
        _ => Ok(()),
    }
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    ensure_parent(path)?;
    fs::write(path, bytes).map_err(|e| ExportError::io(path, e))
}

/// Header row, frame column order, no index.
pub fn write_csv(path: &Path, df: &DataFrame) -> Result<(), ExportError> {
    ensure_parent(path)?;
    let mut file = File::create(path).map_err(|e| ExportError::io(path, e))?;
    let mut df = df.clone();
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TableQuality;
    use crate::query::find_query;
    use tempfile::TempDir;

    fn config(dir: &Path) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.output_dir = dir.to_path_buf();
        config.charts.width = 320;
        config.charts.height = 200;
        config
    }

    fn age_groups() -> QueryResult {
        QueryResult {
            spec: find_query("users_by_age_group").unwrap(),
            df: DataFrame::new(vec![
                Column::new("age_group".into(), [30_i64, 40]),
                Column::new("num_users".into(), [1_i64, 1]),
            ])
            .unwrap(),
        }
    }

    fn avg_cards() -> QueryResult {
        QueryResult {
            spec: find_query("avg_cards_per_user").unwrap(),
            df: DataFrame::new(vec![Column::new("avg_num_credit_cards".into(), [2.5_f64])]).unwrap(),
        }
    }

    #[test]
    fn csv_has_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        write_csv(&path, &age_groups().df).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["age_group,num_users", "30,1", "40,1"]);
    }

    #[test]
    fn uncharted_queries_get_csv_only() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let report = Exporter::new(&config, false).export_results(&[age_groups(), avg_cards()]);

        assert!(report.failures.is_empty());
        assert!(dir.path().join("results/avg_cards_per_user.csv").is_file());
        assert!(dir.path().join("charts/users_by_age_group.png").is_file());
        assert!(!dir.path().join("charts/avg_cards_per_user.png").exists());
        assert!(dir.path().join("charts/charts_deck.pptx").is_file());
        assert_eq!(report.written.len(), 4);
    }

    #[test]
    fn charts_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let mut config = config(dir.path());
        config.charts.enabled = false;
        let report = Exporter::new(&config, false).export_results(&[age_groups()]);
        assert_eq!(report.written.len(), 1);
        assert!(!dir.path().join("charts").exists());
    }

    #[test]
    fn unwritable_target_is_collected() {
        let dir = TempDir::new().unwrap();
        // A file where the results directory should be
        fs::write(dir.path().join("results"), "not a dir").unwrap();
        let mut config = config(dir.path());
        config.charts.enabled = false;

        let report = Exporter::new(&config, false).export_results(&[age_groups(), avg_cards()]);
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(report.failures[0].error, ExportError::Io { .. }));
    }

    #[test]
    fn quality_report_is_json() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let mut users = TableQuality::new("users", 2);
        users.record("total_debt", 1);
        let report = Exporter::new(&config, false).export_quality(&QualityReport { tables: vec![users] });
        assert!(report.failures.is_empty());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(config.quality_path()).unwrap()).unwrap();
        assert_eq!(json["tables"][0]["coercion_failures"]["total_debt"], 1);
    }
}
