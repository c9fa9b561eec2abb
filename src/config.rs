//! Run configuration.
//!
//! One [`AnalysisConfig`] is built at startup (defaults, optional TOML file,
//! CLI overrides), validated once, and then passed by reference to every
//! pipeline stage. Nothing downstream mutates it.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

pub const DEFAULT_FALLBACK_CATEGORY: &str = "Very Low";

// ── Category table ──────────────────────────────────────────────────────────

/// One `(label, cutoff)` pair of the category table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCutoff {
    pub label: String,
    pub cutoff: f64,
}

impl CategoryCutoff {
    pub fn new(label: impl Into<String>, cutoff: f64) -> Self {
        Self {
            label: label.into(),
            cutoff,
        }
    }
}

/// Ordered category table, strictly descending by cutoff.
///
/// Only constructible through [`CategoryTable::new`], so holding one means
/// the ordering precondition of `classify` already holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCategoryTable")]
pub struct CategoryTable {
    fallback: String,
    #[serde(rename = "table")]
    entries: Vec<CategoryCutoff>,
}

#[derive(Deserialize)]
struct RawCategoryTable {
    table: Vec<CategoryCutoff>,
    #[serde(default = "default_fallback")]
    fallback: String,
}

impl TryFrom<RawCategoryTable> for CategoryTable {
    type Error = AnalysisError;

    fn try_from(raw: RawCategoryTable) -> Result<Self> {
        Self::new(raw.table, raw.fallback)
    }
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK_CATEGORY.to_string()
}

impl CategoryTable {
    pub fn new(entries: Vec<CategoryCutoff>, fallback: impl Into<String>) -> Result<Self> {
        let fallback = fallback.into();
        if entries.is_empty() {
            return Err(AnalysisError::configuration("category table is empty"));
        }
        if fallback.trim().is_empty() {
            return Err(AnalysisError::configuration(
                "fallback category label is empty",
            ));
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if entry.label.trim().is_empty() {
                return Err(AnalysisError::configuration(
                    "category table contains an empty label",
                ));
            }
            if !entry.cutoff.is_finite() {
                return Err(AnalysisError::configuration(format!(
                    "category '{}' has non-finite cutoff {}",
                    entry.label, entry.cutoff
                )));
            }
            if !seen.insert(entry.label.as_str()) {
                return Err(AnalysisError::configuration(format!(
                    "category label '{}' appears more than once",
                    entry.label
                )));
            }
        }

        for pair in entries.windows(2) {
            if pair[0].cutoff <= pair[1].cutoff {
                return Err(AnalysisError::configuration(format!(
                    "category table must be strictly descending: '{}' ({}) is followed by '{}' ({})",
                    pair[0].label, pair[0].cutoff, pair[1].label, pair[1].cutoff
                )));
            }
        }

        Ok(Self { entries, fallback })
    }

    pub fn entries(&self) -> &[CategoryCutoff] {
        &self.entries
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Labels in rank order (highest first), fallback last unless the table
    /// already ends with it.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.entries.iter().map(|e| e.label.as_str()).collect();
        if !labels.contains(&self.fallback.as_str()) {
            labels.push(self.fallback.as_str());
        }
        labels
    }

    /// Reference table: 14 / 6 / 3 / 1 / 0.5 / 0 kg per capita.
    pub fn reference() -> Self {
        Self {
            entries: vec![
                CategoryCutoff::new("Exceptionally High", 14.0),
                CategoryCutoff::new("Very High", 6.0),
                CategoryCutoff::new("High", 3.0),
                CategoryCutoff::new("Moderate", 1.0),
                CategoryCutoff::new("Low", 0.5),
                CategoryCutoff::new("Very Low", 0.0),
            ],
            fallback: default_fallback(),
        }
    }
}

// ── Policies ────────────────────────────────────────────────────────────────

/// What to do with a row whose required fields do not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MalformedRowPolicy {
    #[default]
    Fail,
    Skip,
}

/// What to do when a country name appears more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    #[default]
    Fail,
    KeepFirst,
}

// ── Presentation settings ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub coffee_only: String,
    pub happiness_only: String,
    pub intersection: String,
    pub base: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            coffee_only: "#FFA500".to_string(),
            happiness_only: "#006400".to_string(),
            intersection: "#8B4513".to_string(),
            base: "#EAEAEA".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
        }
    }
}

// ── Top-level config ────────────────────────────────────────────────────────

/// Everything a run needs. Thresholds have no defaults in a config file:
/// a file that omits either one is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub coffee_threshold: f64,
    pub happiness_threshold: f64,
    #[serde(default = "CategoryTable::reference")]
    pub categories: CategoryTable,
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub malformed_rows: MalformedRowPolicy,
    #[serde(default)]
    pub duplicate_countries: DuplicatePolicy,
    /// Input header renames, applied before required columns are checked.
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
    #[serde(default)]
    pub colors: Palette,
    #[serde(default)]
    pub map: MapSettings,
    #[serde(default)]
    pub watermark: Option<String>,
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data/coffee_happiness_correlation.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            coffee_threshold: 2.0,
            happiness_threshold: 6.0,
            categories: CategoryTable::reference(),
            data_file: default_data_file(),
            output_dir: default_output_dir(),
            malformed_rows: MalformedRowPolicy::default(),
            duplicate_countries: DuplicatePolicy::default(),
            columns: BTreeMap::new(),
            colors: Palette::default(),
            map: MapSettings::default(),
            watermark: None,
        }
    }
}

/// Threshold values supplied outside the file, e.g. by command-line flags.
/// They fill in or replace the file's values before deserialization, so a
/// file may omit a threshold that is given here.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThresholdOverrides {
    pub coffee: Option<f64>,
    pub happiness: Option<f64>,
}

fn toml_error(e: toml::de::Error) -> AnalysisError {
    AnalysisError::configuration(e.message().to_string())
}

impl AnalysisConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::from_toml_str_with(content, ThresholdOverrides::default())
    }

    /// Parse a TOML document with thresholds overridden, then validate.
    pub fn from_toml_str_with(content: &str, overrides: ThresholdOverrides) -> Result<Self> {
        let mut table: toml::Table = content.parse().map_err(toml_error)?;
        if let Some(t) = overrides.coffee {
            table.insert("coffee_threshold".to_string(), toml::Value::Float(t));
        }
        if let Some(t) = overrides.happiness {
            table.insert("happiness_threshold".to_string(), toml::Value::Float(t));
        }
        let config: Self = toml::Value::Table(table).try_into().map_err(toml_error)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(path, ThresholdOverrides::default())
    }

    pub fn load_with(path: impl AsRef<Path>, overrides: ThresholdOverrides) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str_with(&content, overrides).map_err(|e| match e {
            AnalysisError::Configuration(msg) => {
                AnalysisError::configuration(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.coffee_threshold.is_finite() {
            return Err(AnalysisError::configuration(format!(
                "coffee_threshold must be finite, got {}",
                self.coffee_threshold
            )));
        }
        if !self.happiness_threshold.is_finite() {
            return Err(AnalysisError::configuration(format!(
                "happiness_threshold must be finite, got {}",
                self.happiness_threshold
            )));
        }
        if self.map.width == 0 || self.map.height == 0 {
            return Err(AnalysisError::configuration(
                "map width and height must be non-zero",
            ));
        }
        for (from, to) in &self.columns {
            if from.trim().is_empty() || to.trim().is_empty() {
                return Err(AnalysisError::configuration(
                    "column renames must not be empty",
                ));
            }
        }
        // Re-check the table in case it was assembled by hand after loading.
        CategoryTable::new(
            self.categories.entries.clone(),
            self.categories.fallback.clone(),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_reference_values() {
        let config = AnalysisConfig::default();
        assert_eq!(config.coffee_threshold, 2.0);
        assert_eq!(config.happiness_threshold, 6.0);
        assert_eq!(config.categories.entries().len(), 6);
        assert_eq!(config.categories.fallback(), "Very Low");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn minimal_file_only_needs_thresholds() {
        let config = AnalysisConfig::from_toml_str(
            "coffee_threshold = 3.0\nhappiness_threshold = 7.0\n",
        )
        .unwrap();
        assert_eq!(config.coffee_threshold, 3.0);
        assert_eq!(config.happiness_threshold, 7.0);
        assert_eq!(config.categories, CategoryTable::reference());
        assert_eq!(config.output_dir, PathBuf::from("reports"));
        assert_eq!(config.malformed_rows, MalformedRowPolicy::Fail);
    }

    #[test]
    fn missing_threshold_is_configuration_error() {
        let err = AnalysisConfig::from_toml_str("coffee_threshold = 3.0\n").unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)), "{err}");
        assert!(err.to_string().contains("happiness_threshold"));
    }

    #[test]
    fn overridden_threshold_may_be_omitted_from_file() {
        let overrides = ThresholdOverrides {
            coffee: None,
            happiness: Some(6.5),
        };
        let config =
            AnalysisConfig::from_toml_str_with("coffee_threshold = 3.0\n", overrides).unwrap();
        assert_eq!(config.coffee_threshold, 3.0);
        assert_eq!(config.happiness_threshold, 6.5);

        let both = ThresholdOverrides {
            coffee: Some(1.5),
            happiness: Some(5.0),
        };
        let config = AnalysisConfig::from_toml_str_with(
            "coffee_threshold = 3.0\nhappiness_threshold = 7.0\n",
            both,
        )
        .unwrap();
        assert_eq!(config.coffee_threshold, 1.5);
        assert_eq!(config.happiness_threshold, 5.0);
    }

    #[test]
    fn full_file_parses() {
        let toml = r##"
coffee_threshold = 2.5
happiness_threshold = 6.5
malformed_rows = "skip"
duplicate_countries = "keep-first"
watermark = "© 2025 Batloon"

[categories]
fallback = "Trace"
table = [
    { label = "Heavy", cutoff = 5.0 },
    { label = "Light", cutoff = 1.0 },
]

[columns]
"Coffee (kg)" = "Coffee_Consumption_Per_Capita_KG"

[colors]
coffee_only = "#123456"

[map]
width = 800
"##;
        let config = AnalysisConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.malformed_rows, MalformedRowPolicy::Skip);
        assert_eq!(config.duplicate_countries, DuplicatePolicy::KeepFirst);
        assert_eq!(config.categories.fallback(), "Trace");
        assert_eq!(config.categories.labels(), vec!["Heavy", "Light", "Trace"]);
        assert_eq!(config.colors.coffee_only, "#123456");
        assert_eq!(config.colors.base, "#EAEAEA");
        assert_eq!(config.map.width, 800);
        assert_eq!(config.map.height, 800);
        assert_eq!(
            config.columns.get("Coffee (kg)").map(String::as_str),
            Some("Coffee_Consumption_Per_Capita_KG")
        );
    }

    #[test]
    fn non_descending_table_rejected() {
        let err = CategoryTable::new(
            vec![
                CategoryCutoff::new("High", 3.0),
                CategoryCutoff::new("Moderate", 3.0),
            ],
            "Very Low",
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));

        let err = CategoryTable::new(
            vec![
                CategoryCutoff::new("Low", 0.5),
                CategoryCutoff::new("High", 3.0),
            ],
            "Very Low",
        )
        .unwrap_err();
        assert!(err.to_string().contains("strictly descending"));
    }

    #[test]
    fn unordered_table_in_file_rejected() {
        let toml = r#"
coffee_threshold = 2.0
happiness_threshold = 6.0

[categories]
table = [
    { label = "Low", cutoff = 0.5 },
    { label = "High", cutoff = 3.0 },
]
"#;
        let err = AnalysisConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }

    #[test]
    fn bad_tables_rejected() {
        assert!(CategoryTable::new(vec![], "Very Low").is_err());
        assert!(CategoryTable::new(vec![CategoryCutoff::new("A", f64::NAN)], "Z").is_err());
        assert!(CategoryTable::new(vec![CategoryCutoff::new("", 1.0)], "Z").is_err());
        assert!(CategoryTable::new(vec![CategoryCutoff::new("A", 1.0)], " ").is_err());
        assert!(CategoryTable::new(
            vec![CategoryCutoff::new("A", 2.0), CategoryCutoff::new("A", 1.0)],
            "Z"
        )
        .is_err());
    }

    #[test]
    fn non_finite_threshold_rejected() {
        let config = AnalysisConfig {
            coffee_threshold: f64::NAN,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::Configuration(_))
        ));
    }

    #[test]
    fn reference_labels_do_not_repeat_fallback() {
        let table = CategoryTable::reference();
        let labels = table.labels();
        assert_eq!(labels.len(), 6);
        assert_eq!(labels.last(), Some(&"Very Low"));
    }
}
