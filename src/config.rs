//! Pipeline configuration.
//!
//! Read from `card_insights.toml` in the working directory when present,
//! then adjusted by environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const CONFIG_FILE: &str = "card_insights.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory searched first for the source files.
    pub data_dir: Option<PathBuf>,
    /// Root for every output; relative names below resolve against it.
    pub output_dir: PathBuf,
    pub sources: SourceFiles,
    pub database_file: String,
    pub results_dir: String,
    pub preview_file: String,
    pub quality_file: String,
    /// Stop after writing the preview.
    pub preview_only: bool,
    /// Write the JSON data-quality report.
    pub quality_report: bool,
    pub charts: ChartConfig,
}

/// Source CSV file names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFiles {
    pub users: String,
    pub cards: String,
    pub transactions: String,
}

/// Chart output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub enabled: bool,
    pub dir: String,
    pub width: u32,
    pub height: u32,
    /// TTF file used for chart text, tried before the system fonts.
    pub font_path: Option<PathBuf>,
    /// Bundle the charts into a slide deck.
    pub deck: bool,
    pub deck_file: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            output_dir: PathBuf::from("."),
            sources: SourceFiles::default(),
            database_file: "user_behavior.db".to_string(),
            results_dir: "results".to_string(),
            preview_file: "data_preview.txt".to_string(),
            quality_file: "data_quality.json".to_string(),
            preview_only: false,
            quality_report: false,
            charts: ChartConfig::default(),
        }
    }
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            users: "users_data.csv".to_string(),
            cards: "cards_data.csv".to_string(),
            transactions: "transactions_data.csv".to_string(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "charts".to_string(),
            width: 900,
            height: 540,
            font_path: None,
            deck: true,
            deck_file: "charts_deck.pptx".to_string(),
        }
    }
}

impl SourceFiles {
    /// File name configured for a table.
    pub fn for_table(&self, table: &str) -> Option<&str> {
        match table {
            "users" => Some(&self.users),
            "cards" => Some(&self.cards),
            "transactions" => Some(&self.transactions),
            _ => None,
        }
    }
}

impl PipelineConfig {
    /// Load `card_insights.toml` from the working directory, then apply
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(Path::new(CONFIG_FILE))?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Defaults when the file does not exist.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// `DATA_DIR`, `OUTPUT_DIR`, `PREVIEW_ONLY=1`, `QUALITY_REPORT=1`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = set("DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = set("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if set("PREVIEW_ONLY").as_deref() == Some("1") {
            self.preview_only = true;
        }
        if set("QUALITY_REPORT").as_deref() == Some("1") {
            self.quality_report = true;
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.output_dir.join(&self.database_file)
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join(&self.results_dir)
    }

    pub fn charts_path(&self) -> PathBuf {
        self.output_dir.join(&self.charts.dir)
    }

    pub fn deck_path(&self) -> PathBuf {
        self.charts_path().join(&self.charts.deck_file)
    }

    pub fn preview_path(&self) -> PathBuf {
        self.output_dir.join(&self.preview_file)
    }

    pub fn quality_path(&self) -> PathBuf {
        self.output_dir.join(&self.quality_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_output_layout() {
        let config = PipelineConfig::default();
        assert_eq!(config.database_path(), Path::new("./user_behavior.db"));
        assert_eq!(config.deck_path(), Path::new("./charts/charts_deck.pptx"));
        assert_eq!(config.sources.for_table("cards"), Some("cards_data.csv"));
        assert!(!config.quality_report);
        assert!(!config.preview_only);
    }

    #[test]
    fn env_overrides() {
        let mut config = PipelineConfig::default();
        config.apply_env_overrides(env(&[
            ("DATA_DIR", "/srv/in"),
            ("OUTPUT_DIR", "/srv/out"),
            ("PREVIEW_ONLY", "1"),
            ("QUALITY_REPORT", "0"),
        ]));
        assert_eq!(config.data_dir.as_deref(), Some(Path::new("/srv/in")));
        assert_eq!(config.preview_path(), Path::new("/srv/out/data_preview.txt"));
        assert!(config.preview_only);
        assert!(!config.quality_report);
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = PipelineConfig::default();
        config.apply_env_overrides(env(&[("DATA_DIR", "  "), ("OUTPUT_DIR", "")]));
        assert!(config.data_dir.is_none());
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "results_dir = \"out\"\n[charts]\nwidth = 640\ndeck = false\n").unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.results_dir, "out");
        assert_eq!(config.charts.width, 640);
        assert_eq!(config.charts.height, 540);
        assert!(!config.charts.deck);
        assert_eq!(config.sources.users, "users_data.csv");
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "charts = 3").unwrap();
        assert!(matches!(
            PipelineConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig::from_file(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.charts.width, 900);
    }
}
