//! YAML poster files: the saved contents of a poster.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::date::normalize_date;
use crate::error::{PosterError, PosterResult};
use crate::store::{PatternId, PatternRecord, PatternStore, MAX_PATTERNS};
use crate::style::FontScale;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosterFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples_visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_scale: Option<FontScale>,
    #[serde(default)]
    pub patterns: Vec<PatternEntry>,
}

/// One card as written in a poster file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternEntry {
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub examples: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_markup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples_markup: Option<String>,
}

impl PosterFile {
    pub fn from_yaml(yaml: &str) -> PosterResult<Self> {
        let file: PosterFile = serde_yaml::from_str(yaml)?;
        file.validate()?;
        Ok(file)
    }

    pub fn load(path: impl AsRef<Path>) -> PosterResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn to_yaml(&self) -> PosterResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> PosterResult<()> {
        if self.patterns.len() > MAX_PATTERNS {
            return Err(PosterError::CapacityExceeded { max: MAX_PATTERNS });
        }
        for entry in &self.patterns {
            normalize_date(&entry.date)?;
        }
        Ok(())
    }

    /// Load the entries into a fresh store.
    pub fn to_store(&self) -> PosterResult<PatternStore> {
        self.validate()?;
        let mut store = PatternStore::new();
        for entry in &self.patterns {
            store.insert(PatternRecord {
                id: PatternId(0),
                pattern_text: entry.pattern.trim().to_string(),
                examples_text: entry.examples.trim().to_string(),
                date: entry.date.clone(),
                pattern_markup: entry.pattern_markup.clone(),
                examples_markup: entry.examples_markup.clone(),
            })?;
        }
        Ok(store)
    }

    pub fn entries_from(store: &PatternStore) -> Vec<PatternEntry> {
        store
            .records()
            .iter()
            .map(|r| PatternEntry {
                pattern: r.pattern_text.clone(),
                examples: r.examples_text.clone(),
                date: r.date.clone(),
                pattern_markup: r.pattern_markup.clone(),
                examples_markup: r.examples_markup.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn loads_entries_in_order() {
        let yaml = r#"
title: Week 34
patterns:
  - pattern: "I used to []"
    date: "25.08.25"
  - pattern: "Would you mind [ ]?"
    examples: "Would you mind closing the door?"
"#;
        let file = PosterFile::from_yaml(yaml).unwrap();
        let store = file.to_store().unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].date, "25.08.25 (Mon)");
        assert_eq!(store.records()[1].id, PatternId(2));
        assert_eq!(store.records()[1].date, "");
    }

    #[test]
    fn rejects_too_many_and_bad_dates() {
        let four = "patterns:\n  - {}\n  - {}\n  - {}\n  - {}\n";
        assert_eq!(
            PosterFile::from_yaml(four),
            Err(PosterError::CapacityExceeded { max: MAX_PATTERNS })
        );
        let bad = "patterns:\n  - date: \"2025-08-25\"\n";
        assert!(matches!(
            PosterFile::from_yaml(bad),
            Err(PosterError::InvalidDate { .. })
        ));
    }
}
