use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{PosterError, PosterResult};
use crate::export::{DEFAULT_EXPORT_SCALE, DEFAULT_FILENAME_PREFIX};
use crate::html::DEFAULT_TITLE;
use crate::render::{EXAMPLES_PLACEHOLDER, PATTERN_PLACEHOLDER};

const MAX_EXPORT_SCALE: u32 = 4;

fn prefix_regex() -> &'static Regex {
    static PREFIX_REGEX: OnceLock<Regex> = OnceLock::new();
    PREFIX_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap())
}

/// Editor settings, loadable from YAML. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub title: String,
    pub pattern_placeholder: String,
    pub examples_placeholder: String,
    /// Characters of selected text shown in the toolbar preview
    pub preview_chars: usize,
    /// Increment of the global font-size stepper
    pub font_step: f64,
    pub examples_visible: bool,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    pub filename_prefix: String,
    pub scale: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            title: DEFAULT_TITLE.to_string(),
            pattern_placeholder: PATTERN_PLACEHOLDER.to_string(),
            examples_placeholder: EXAMPLES_PLACEHOLDER.to_string(),
            preview_chars: 30,
            font_step: 0.1,
            examples_visible: false,
            export: ExportConfig::default(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
            scale: DEFAULT_EXPORT_SCALE,
        }
    }
}

impl EditorConfig {
    pub fn from_yaml(yaml: &str) -> PosterResult<Self> {
        let config: EditorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> PosterResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> PosterResult<()> {
        if self.preview_chars == 0 {
            return Err(PosterError::Config("previewChars must be at least 1".to_string()));
        }
        validate_range(self.font_step, 0.01, 1.0, "fontStep")?;
        validate_range(self.export.scale as f64, 1.0, MAX_EXPORT_SCALE as f64, "export.scale")?;
        if !prefix_regex().is_match(&self.export.filename_prefix) {
            return Err(PosterError::Config(format!(
                "export.filenamePrefix '{}' may only contain letters, digits, '_' and '-'",
                self.export.filename_prefix
            )));
        }
        Ok(())
    }
}

fn validate_range(value: f64, min: f64, max: f64, property: &str) -> PosterResult<()> {
    if value < min || value > max {
        Err(PosterError::ValueOutOfRange {
            property: property.to_string(),
            value: value.to_string(),
            range: format!("{} to {}", min, max),
        })
    } else {
        Ok(())
    }
}
