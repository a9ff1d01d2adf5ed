use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::date::{format_date, normalize_date};
use crate::error::{PosterError, PosterResult};

/// A poster never holds more cards than this.
pub const MAX_PATTERNS: usize = 3;

/// Session-unique pattern id, assigned in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternId(pub u32);

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Plain-text fields editable through the input path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternField {
    Pattern,
    Examples,
    Date,
}

/// Display regions whose styled markup can be persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupField {
    Pattern,
    Examples,
}

/// One card on the poster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRecord {
    pub id: PatternId,
    pub pattern_text: String,
    pub examples_text: String,
    /// `YY.MM.DD (Day)` or empty
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_markup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples_markup: Option<String>,
}

impl PatternRecord {
    fn new(id: PatternId, date: String) -> Self {
        PatternRecord {
            id,
            pattern_text: String::new(),
            examples_text: String::new(),
            date,
            pattern_markup: None,
            examples_markup: None,
        }
    }

    pub fn text(&self, field: MarkupField) -> &str {
        match field {
            MarkupField::Pattern => &self.pattern_text,
            MarkupField::Examples => &self.examples_text,
        }
    }

    pub fn markup(&self, field: MarkupField) -> Option<&str> {
        match field {
            MarkupField::Pattern => self.pattern_markup.as_deref(),
            MarkupField::Examples => self.examples_markup.as_deref(),
        }
    }

    /// Combined plain-text length, used for the card size class.
    pub fn text_len(&self) -> usize {
        self.pattern_text.chars().count() + self.examples_text.chars().count()
    }
}

/// Ordered in-memory list of pattern records. Never renders anything itself.
#[derive(Debug, Clone, Default)]
pub struct PatternStore {
    records: Vec<PatternRecord>,
    last_id: u32,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PatternRecord] {
        &self.records
    }

    pub fn get(&self, id: PatternId) -> Option<&PatternRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn get_mut(&mut self, id: PatternId) -> PosterResult<&mut PatternRecord> {
        self.records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(PosterError::PatternNotFound { id })
    }

    /// 1-based position of a record on the poster.
    pub fn position(&self, id: PatternId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id).map(|i| i + 1)
    }

    /// Append an empty record dated `date`.
    pub fn add(&mut self, date: NaiveDate) -> PosterResult<PatternId> {
        if self.records.len() >= MAX_PATTERNS {
            return Err(PosterError::CapacityExceeded { max: MAX_PATTERNS });
        }
        self.last_id += 1;
        let id = PatternId(self.last_id);
        self.records.push(PatternRecord::new(id, format_date(date)));
        info!("added pattern {} ({} of {})", id, self.records.len(), MAX_PATTERNS);
        Ok(id)
    }

    /// Insert a fully populated record, e.g. one loaded from a poster file.
    /// The id is assigned by the store.
    pub fn insert(&mut self, mut record: PatternRecord) -> PosterResult<PatternId> {
        if self.records.len() >= MAX_PATTERNS {
            return Err(PosterError::CapacityExceeded { max: MAX_PATTERNS });
        }
        record.date = normalize_date(&record.date)?;
        self.last_id += 1;
        record.id = PatternId(self.last_id);
        let id = record.id;
        self.records.push(record);
        Ok(id)
    }

    pub fn remove(&mut self, id: PatternId) -> PosterResult<PatternRecord> {
        let index = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or(PosterError::PatternNotFound { id })?;
        if self.records.len() == 1 {
            return Err(PosterError::LastPattern);
        }
        info!("removed pattern {}", id);
        Ok(self.records.remove(index))
    }

    /// Drop every record and restart id assignment.
    pub fn clear(&mut self) -> PosterResult<usize> {
        if self.records.is_empty() {
            return Err(PosterError::NothingToClear);
        }
        let removed = self.records.len();
        self.records.clear();
        self.last_id = 0;
        info!("cleared {} patterns", removed);
        Ok(removed)
    }

    /// Overwrite a plain-text field.
    ///
    /// Text is trimmed and drops the persisted markup of the same region.
    /// Dates are validated and normalized; an invalid date leaves the
    /// previous value in place.
    pub fn update(&mut self, id: PatternId, field: PatternField, value: &str) -> PosterResult<()> {
        let record = self.get_mut(id)?;
        match field {
            PatternField::Pattern => {
                record.pattern_text = value.trim().to_string();
                record.pattern_markup = None;
            }
            PatternField::Examples => {
                record.examples_text = value.trim().to_string();
                record.examples_markup = None;
            }
            PatternField::Date => {
                record.date = normalize_date(value)?;
            }
        }
        debug!("updated {:?} of pattern {}", field, id);
        Ok(())
    }

    /// Persist the rendered markup of a styled region.
    pub fn set_markup(&mut self, id: PatternId, field: MarkupField, markup: String) -> PosterResult<()> {
        let record = self.get_mut(id)?;
        match field {
            MarkupField::Pattern => record.pattern_markup = Some(markup),
            MarkupField::Examples => record.examples_markup = Some(markup),
        }
        debug!("persisted {:?} markup of pattern {}", field, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 25).unwrap()
    }

    #[test]
    fn add_assigns_increasing_ids_and_default_date() {
        let mut store = PatternStore::new();
        let a = store.add(day()).unwrap();
        let b = store.add(day()).unwrap();
        assert!(a < b);
        assert_eq!(store.get(a).unwrap().date, "25.08.25 (Mon)");
    }

    #[test]
    fn fourth_add_is_refused() {
        let mut store = PatternStore::new();
        for _ in 0..MAX_PATTERNS {
            store.add(day()).unwrap();
        }
        assert_eq!(
            store.add(day()),
            Err(PosterError::CapacityExceeded { max: MAX_PATTERNS })
        );
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn last_record_cannot_be_removed() {
        let mut store = PatternStore::new();
        let id = store.add(day()).unwrap();
        assert_eq!(store.remove(id), Err(PosterError::LastPattern));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ids_are_not_reused_after_remove() {
        let mut store = PatternStore::new();
        let a = store.add(day()).unwrap();
        let b = store.add(day()).unwrap();
        store.remove(b).unwrap();
        let c = store.add(day()).unwrap();
        assert_ne!(b, c);
        assert_eq!(store.position(a), Some(1));
        assert_eq!(store.position(c), Some(2));
    }

    #[test]
    fn clear_resets_counter() {
        let mut store = PatternStore::new();
        store.add(day()).unwrap();
        store.add(day()).unwrap();
        assert_eq!(store.clear(), Ok(2));
        assert!(store.is_empty());
        assert_eq!(store.clear(), Err(PosterError::NothingToClear));
        assert_eq!(store.add(day()).unwrap(), PatternId(1));
    }

    #[test]
    fn text_update_drops_markup() {
        let mut store = PatternStore::new();
        let id = store.add(day()).unwrap();
        store
            .set_markup(id, MarkupField::Pattern, "<span class=\"text-bold\">x</span>".to_string())
            .unwrap();
        store
            .set_markup(id, MarkupField::Examples, "y".to_string())
            .unwrap();
        store.update(id, PatternField::Pattern, "  I can []  ").unwrap();
        let record = store.get(id).unwrap();
        assert_eq!(record.pattern_text, "I can []");
        assert_eq!(record.pattern_markup, None);
        assert_eq!(record.examples_markup.as_deref(), Some("y"));
    }

    #[test]
    fn invalid_date_keeps_previous() {
        let mut store = PatternStore::new();
        let id = store.add(day()).unwrap();
        assert!(matches!(
            store.update(id, PatternField::Date, "2025.08.25"),
            Err(PosterError::InvalidDate { .. })
        ));
        assert_eq!(store.get(id).unwrap().date, "25.08.25 (Mon)");
        store.update(id, PatternField::Date, "25.09.01").unwrap();
        assert_eq!(store.get(id).unwrap().date, "25.09.01 (Mon)");
        store.update(id, PatternField::Date, "").unwrap();
        assert_eq!(store.get(id).unwrap().date, "");
    }

    #[test]
    fn unknown_id() {
        let mut store = PatternStore::new();
        store.add(day()).unwrap();
        assert_eq!(
            store.update(PatternId(9), PatternField::Pattern, "x"),
            Err(PosterError::PatternNotFound { id: PatternId(9) })
        );
    }
}
