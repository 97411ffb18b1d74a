use crate::model::{DateWindow, SourceKind};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Column names for one source, plus where its raw export lives.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,
    pub date_field: String,
    pub value_field: String,
    #[serde(default)]
    pub category_field: Option<String>,
}

impl SourceConfig {
    pub fn fields(&self) -> FieldMapping {
        FieldMapping {
            date_field: self.date_field.clone(),
            value_field: self.value_field.clone(),
            category_field: self.category_field.clone(),
        }
    }
}

/// The subset of a source's config the normalizer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    pub date_field: String,
    pub value_field: String,
    pub category_field: Option<String>,
}

impl FieldMapping {
    pub fn new(date_field: &str, value_field: &str) -> Self {
        Self {
            date_field: date_field.to_string(),
            value_field: value_field.to_string(),
            category_field: None,
        }
    }

    pub fn with_category(mut self, category_field: &str) -> Self {
        self.category_field = Some(category_field.to_string());
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub price: SourceConfig,
    pub rate: SourceConfig,
    pub search: SourceConfig,
}

impl SourcesConfig {
    pub fn get(&self, kind: SourceKind) -> &SourceConfig {
        match kind {
            SourceKind::Price => &self.price,
            SourceKind::Rate => &self.rate,
            SourceKind::Search => &self.search,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub csv_path: Option<PathBuf>,
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,
    #[serde(default)]
    pub summary_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub sources: SourcesConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
}

fn default_smoothing_window() -> usize {
    6
}

impl AppConfig {
    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start_date, self.end_date)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_date > self.end_date {
            return Err(ConfigError::Invalid(format!(
                "start_date {} is after end_date {}",
                self.start_date, self.end_date
            )));
        }
        if self.smoothing_window == 0 {
            return Err(ConfigError::Invalid("smoothing_window must be at least 1".into()));
        }
        for kind in SourceKind::ALL {
            let source = self.sources.get(kind);
            if source.date_field.trim().is_empty() || source.value_field.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "{kind} source needs non-empty date_field and value_field"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
