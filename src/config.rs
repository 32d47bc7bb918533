//! Reconciliation settings
//!
//! Which families and line styles a project should carry, where to load
//! families from, and how new line styles look. Settings come from a TOML
//! file; anything left out falls back to the embedded defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::catalog::{DesiredSet, FamilyCatalog};
use crate::document::{Color, Segment};
use crate::reconcile::StyleAppearance;

/// Errors that can occur when loading or parsing a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Default settings; the style list and pattern match the office standard
const DEFAULT_CONFIG: &str = r##"
[families]
catalog_dir = "Family"
extension = "rfa"
names = []

[line_styles]
category = "Lines"
pattern = "Solid"
names = ["C1", "T1", "梁成", "ラチ", "G1", "B1", "B2", "B3", "B4", "P1", "P2", "Ga", "Gc"]
line_weight = 8
color = "#ff0000"

# Used only when `pattern` names a pattern the project does not have yet
[[line_styles.segments]]
kind = "dot"
length = 0.0

[[line_styles.segments]]
kind = "space"
length = 0.02

[[line_styles.segments]]
kind = "dash"
length = 0.03

[[line_styles.segments]]
kind = "space"
length = 0.02
"##;

/// Family reconciliation settings
#[derive(Debug, Clone, PartialEq)]
pub struct FamilySettings {
    pub catalog_dir: PathBuf,
    pub extension: String,
    pub names: Vec<String>,
}

impl FamilySettings {
    pub fn catalog(&self) -> FamilyCatalog {
        FamilyCatalog::new(&self.catalog_dir, &self.extension)
    }

    pub fn desired(&self) -> DesiredSet {
        DesiredSet::new(self.names.iter().map(String::as_str))
    }
}

/// Line style reconciliation settings
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyleSettings {
    /// Parent category the styles live under
    pub category: String,
    /// Line pattern every new style references
    pub pattern: String,
    pub names: Vec<String>,
    pub line_weight: u8,
    pub color: Color,
    pub segments: Vec<Segment>,
}

impl LineStyleSettings {
    pub fn desired(&self) -> DesiredSet {
        DesiredSet::new(self.names.iter().map(String::as_str))
    }

    pub fn appearance(&self) -> StyleAppearance {
        StyleAppearance {
            line_weight: self.line_weight,
            color: self.color,
            pattern_segments: self.segments.clone(),
        }
    }
}

/// Complete configuration for a reconciliation run
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileConfig {
    pub families: FamilySettings,
    pub line_styles: LineStyleSettings,
}

/// TOML structure for deserializing configuration; every field is optional
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    families: Option<TomlFamilies>,
    line_styles: Option<TomlLineStyles>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlFamilies {
    catalog_dir: Option<PathBuf>,
    extension: Option<String>,
    names: Option<Vec<String>>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlLineStyles {
    category: Option<String>,
    pattern: Option<String>,
    names: Option<Vec<String>>,
    line_weight: Option<u8>,
    color: Option<Color>,
    segments: Option<Vec<Segment>>,
}

impl ReconcileConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string, filling gaps from the defaults
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        Self::from_toml(parsed, Some(&Self::default()))
    }

    fn from_toml(parsed: TomlConfig, base: Option<&Self>) -> Result<Self, ConfigError> {
        let missing = |key: &str| ConfigError::Invalid(format!("missing '{key}'"));
        let fam = parsed.families.unwrap_or_default();
        let styles = parsed.line_styles.unwrap_or_default();
        let base_fam = base.map(|b| &b.families);
        let base_styles = base.map(|b| &b.line_styles);

        let config = Self {
            families: FamilySettings {
                catalog_dir: fam
                    .catalog_dir
                    .or_else(|| base_fam.map(|b| b.catalog_dir.clone()))
                    .ok_or_else(|| missing("families.catalog_dir"))?,
                extension: fam
                    .extension
                    .or_else(|| base_fam.map(|b| b.extension.clone()))
                    .ok_or_else(|| missing("families.extension"))?,
                names: fam
                    .names
                    .or_else(|| base_fam.map(|b| b.names.clone()))
                    .unwrap_or_default(),
            },
            line_styles: LineStyleSettings {
                category: styles
                    .category
                    .or_else(|| base_styles.map(|b| b.category.clone()))
                    .ok_or_else(|| missing("line_styles.category"))?,
                pattern: styles
                    .pattern
                    .or_else(|| base_styles.map(|b| b.pattern.clone()))
                    .ok_or_else(|| missing("line_styles.pattern"))?,
                names: styles
                    .names
                    .or_else(|| base_styles.map(|b| b.names.clone()))
                    .unwrap_or_default(),
                line_weight: styles
                    .line_weight
                    .or_else(|| base_styles.map(|b| b.line_weight))
                    .ok_or_else(|| missing("line_styles.line_weight"))?,
                color: styles
                    .color
                    .or_else(|| base_styles.map(|b| b.color))
                    .ok_or_else(|| missing("line_styles.color"))?,
                segments: styles
                    .segments
                    .or_else(|| base_styles.map(|b| b.segments.clone()))
                    .unwrap_or_default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.families.extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::Invalid("families.extension is empty".to_string()));
        }
        if !(1..=16).contains(&self.line_styles.line_weight) {
            return Err(ConfigError::Invalid(format!(
                "line_styles.line_weight {} is outside 1..=16",
                self.line_styles.line_weight
            )));
        }
        Ok(())
    }

    /// Set the family catalog directory
    pub fn with_catalog_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.families.catalog_dir = dir.into();
        self
    }

    /// Set the desired family names
    pub fn with_families<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.families.names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the desired line style names
    pub fn with_line_styles<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.line_styles.names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the line pattern new styles reference
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.line_styles.pattern = pattern.into();
        self
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        let parsed: TomlConfig =
            toml::from_str(DEFAULT_CONFIG).expect("Default config should be valid TOML");
        Self::from_toml(parsed, None).expect("Default config should be complete")
    }
}
