use thiserror::Error;

use crate::store::PatternId;

pub type PosterResult<T> = Result<T, PosterError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PosterError {
    // --- date validation ---

    #[error("Invalid date '{value}': expected YY.MM.DD or YY.MM.DD (Day), e.g. 25.08.25 (Mon)")]
    InvalidDate { value: String },

    // --- capacity ---

    #[error("A poster holds at most {max} patterns")]
    CapacityExceeded { max: usize },

    #[error("At least one pattern must remain on the poster")]
    LastPattern,

    #[error("There are no patterns to clear")]
    NothingToClear,

    #[error("Pattern {id} not found")]
    PatternNotFound { id: PatternId },

    // --- selection / styling ---

    #[error("No text is selected")]
    NoSelection,

    #[error("The selection is out of date: the poster changed since it was made. Please select the text again")]
    StaleSelection,

    #[error("Styling is not available while editing text. Save the edit first, then select the displayed text")]
    UnsupportedTarget,

    #[error("Invalid style property '{property}': {reason}")]
    InvalidStyle { property: String, reason: String },

    #[error("Value out of range for '{property}': {value}. Expected range: {range}")]
    ValueOutOfRange {
        property: String,
        value: String,
        range: String,
    },

    #[error("Markup error: {0}")]
    Markup(String),

    // --- export ---

    #[error("{format} export failed: {reason}")]
    Export { format: String, reason: String },

    // --- config / files ---

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    YamlError(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<roxmltree::Error> for PosterError {
    fn from(err: roxmltree::Error) -> Self {
        PosterError::Markup(err.to_string())
    }
}

impl From<std::fmt::Error> for PosterError {
    fn from(err: std::fmt::Error) -> Self {
        PosterError::Markup(format!("could not write poster HTML: {}", err))
    }
}

impl From<serde_yaml::Error> for PosterError {
    fn from(err: serde_yaml::Error) -> Self {
        PosterError::YamlError(err.to_string())
    }
}

impl From<std::io::Error> for PosterError {
    fn from(err: std::io::Error) -> Self {
        PosterError::Io(err.to_string())
    }
}

impl From<image::ImageError> for PosterError {
    fn from(err: image::ImageError) -> Self {
        PosterError::Export {
            format: "PNG".to_string(),
            reason: err.to_string(),
        }
    }
}
