use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PosterError, PosterResult};

/// Class applied to bold spans instead of an inline `font-weight`.
pub const BOLD_CLASS: &str = "text-bold";

pub const MIN_FONT_SCALE: f64 = 0.5;
pub const MAX_FONT_SCALE: f64 = 5.0;

/// The closed palette offered by the color toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Navy,
}

impl TextColor {
    pub const ALL: [TextColor; 8] = [
        TextColor::Red,
        TextColor::Orange,
        TextColor::Yellow,
        TextColor::Green,
        TextColor::Blue,
        TextColor::Purple,
        TextColor::Pink,
        TextColor::Navy,
    ];

    pub fn hex(self) -> &'static str {
        match self {
            TextColor::Red => "#ef4444",
            TextColor::Orange => "#f97316",
            TextColor::Yellow => "#eab308",
            TextColor::Green => "#22c55e",
            TextColor::Blue => "#3b82f6",
            TextColor::Purple => "#8b5cf6",
            TextColor::Pink => "#ec4899",
            TextColor::Navy => "#1e293b",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextColor::Red => "red",
            TextColor::Orange => "orange",
            TextColor::Yellow => "yellow",
            TextColor::Green => "green",
            TextColor::Blue => "blue",
            TextColor::Purple => "purple",
            TextColor::Pink => "pink",
            TextColor::Navy => "navy",
        }
    }

    /// Resolve a palette name or one of the palette's hex values (any case).
    pub fn parse(value: &str) -> PosterResult<Self> {
        let value = value.trim();
        TextColor::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(value) || c.hex().eq_ignore_ascii_case(value))
            .ok_or_else(|| PosterError::InvalidStyle {
                property: "color".to_string(),
                reason: format!(
                    "'{}' is not in the palette ({})",
                    value,
                    TextColor::ALL.map(|c| c.name()).join(", ")
                ),
            })
    }
}

impl fmt::Display for TextColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Font-size multiplier, kept within [`MIN_FONT_SCALE`]..=[`MAX_FONT_SCALE`]
/// and rounded to two decimals so markup stays stable.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FontScale(f64);

impl FontScale {
    pub const DEFAULT: FontScale = FontScale(1.0);

    pub fn new(value: f64) -> PosterResult<Self> {
        if !value.is_finite() || value < MIN_FONT_SCALE || value > MAX_FONT_SCALE {
            return Err(PosterError::ValueOutOfRange {
                property: "fontSize".to_string(),
                value: value.to_string(),
                range: format!("{} to {}", MIN_FONT_SCALE, MAX_FONT_SCALE),
            });
        }
        Ok(FontScale((value * 100.0).round() / 100.0))
    }

    /// Clamp instead of rejecting; used by the stepper.
    pub fn clamped(value: f64) -> Self {
        let value = if value.is_finite() { value } else { 1.0 };
        FontScale((value.clamp(MIN_FONT_SCALE, MAX_FONT_SCALE) * 100.0).round() / 100.0)
    }

    pub fn step(self, delta: f64) -> Self {
        FontScale::clamped(self.0 + delta)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// `1.5em`, `2em`, ...
    pub fn css(self) -> String {
        format!("{}em", self.0)
    }

    fn parse_css(value: &str) -> PosterResult<Self> {
        let number = value.trim().trim_end_matches("em");
        let parsed = number.parse::<f64>().map_err(|_| PosterError::InvalidStyle {
            property: "font-size".to_string(),
            reason: format!("expected a number of em, got '{}'", value),
        })?;
        FontScale::new(parsed)
    }
}

impl TryFrom<f64> for FontScale {
    type Error = PosterError;

    fn try_from(value: f64) -> PosterResult<Self> {
        FontScale::new(value)
    }
}

impl From<FontScale> for f64 {
    fn from(scale: FontScale) -> f64 {
        scale.0
    }
}

impl Default for FontScale {
    fn default() -> Self {
        FontScale::DEFAULT
    }
}

/// One property a style action sets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum StyleProperty {
    Color(TextColor),
    FontScale(FontScale),
    Bold,
}

impl StyleProperty {
    pub fn name(&self) -> &'static str {
        match self {
            StyleProperty::Color(_) => "color",
            StyleProperty::FontScale(_) => "fontSize",
            StyleProperty::Bold => "bold",
        }
    }
}

/// Visual properties carried by a styled span
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpanStyle {
    pub color: Option<TextColor>,
    pub font_scale: Option<FontScale>,
    pub bold: bool,
}

impl SpanStyle {
    /// Set one property, leaving the others untouched.
    pub fn set(&mut self, property: StyleProperty) {
        match property {
            StyleProperty::Color(color) => self.color = Some(color),
            StyleProperty::FontScale(scale) => self.font_scale = Some(scale),
            StyleProperty::Bold => self.bold = true,
        }
    }

    /// Copy of `self` with `property` applied on top.
    pub fn with(mut self, property: StyleProperty) -> Self {
        self.set(property);
        self
    }

    /// Value for the `class` attribute, if any.
    pub fn class_attr(&self) -> Option<&'static str> {
        self.bold.then_some(BOLD_CLASS)
    }

    /// Value for the `style` attribute, if any.
    pub fn style_attr(&self) -> Option<String> {
        let mut css = String::new();
        if let Some(color) = self.color {
            css.push_str(&format!("color: {};", color.hex()));
        }
        if let Some(scale) = self.font_scale {
            if !css.is_empty() {
                css.push(' ');
            }
            css.push_str(&format!("font-size: {};", scale.css()));
        }
        (!css.is_empty()).then_some(css)
    }

    /// Rebuild a style from `class` and `style` attribute values.
    pub fn from_attrs(class: Option<&str>, style: Option<&str>) -> PosterResult<Self> {
        let mut span = SpanStyle::default();

        if let Some(classes) = class {
            for class in classes.split_whitespace() {
                if class == BOLD_CLASS {
                    span.bold = true;
                } else {
                    return Err(PosterError::InvalidStyle {
                        property: "class".to_string(),
                        reason: format!("unknown span class '{}'", class),
                    });
                }
            }
        }

        if let Some(s) = style {
            for entry in s.split(';') {
                let entry = entry.trim();
                if entry.is_empty() {
                    continue;
                }
                let colon = entry.find(':').ok_or_else(|| PosterError::InvalidStyle {
                    property: entry.to_string(),
                    reason: "expected 'property: value' format".to_string(),
                })?;
                let key = entry[..colon].trim();
                let val = entry[colon + 1..].trim();
                match key {
                    "color" => span.color = Some(TextColor::parse(val)?),
                    "font-size" => span.font_scale = Some(FontScale::parse_css(val)?),
                    "font-weight" if val == "bold" || val == "700" => span.bold = true,
                    other => {
                        return Err(PosterError::InvalidStyle {
                            property: other.to_string(),
                            reason: format!("unsupported span style '{}'", entry),
                        });
                    }
                }
            }
        }

        Ok(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn palette_lookup_by_name_and_hex() {
        assert_eq!(TextColor::parse("red").unwrap(), TextColor::Red);
        assert_eq!(TextColor::parse("#3B82F6").unwrap(), TextColor::Blue);
        assert!(matches!(
            TextColor::parse("#123456"),
            Err(PosterError::InvalidStyle { .. })
        ));
    }

    #[test]
    fn font_scale_bounds() {
        assert!(FontScale::new(0.5).is_ok());
        assert!(FontScale::new(5.0).is_ok());
        assert!(matches!(
            FontScale::new(0.4),
            Err(PosterError::ValueOutOfRange { .. })
        ));
        assert!(FontScale::new(5.1).is_err());
        assert!(FontScale::new(f64::NAN).is_err());
    }

    #[test]
    fn font_scale_stepper_clamps() {
        let scale = FontScale::new(4.95).unwrap();
        assert_eq!(scale.step(0.1).value(), 5.0);
        assert_eq!(FontScale::new(0.6).unwrap().step(-0.5).value(), 0.5);
        assert_eq!(FontScale::DEFAULT.step(0.1).value(), 1.1);
    }

    #[test]
    fn set_keeps_other_properties() {
        let style = SpanStyle::default()
            .with(StyleProperty::Color(TextColor::Red))
            .with(StyleProperty::FontScale(FontScale::new(1.5).unwrap()))
            .with(StyleProperty::Bold);
        assert_eq!(style.color, Some(TextColor::Red));
        assert_eq!(style.font_scale.map(FontScale::value), Some(1.5));
        assert!(style.bold);
        assert_eq!(
            style.style_attr().as_deref(),
            Some("color: #ef4444; font-size: 1.5em;")
        );
        assert_eq!(style.class_attr(), Some(BOLD_CLASS));
    }

    #[test]
    fn parse_attrs() {
        let style =
            SpanStyle::from_attrs(Some("text-bold"), Some("color: #22c55e; font-size: 2em;"))
                .unwrap();
        assert_eq!(
            style,
            SpanStyle {
                color: Some(TextColor::Green),
                font_scale: Some(FontScale::new(2.0).unwrap()),
                bold: true,
            }
        );
    }

    #[test]
    fn parse_attrs_rejects_unknown() {
        assert!(SpanStyle::from_attrs(Some("evil"), None).is_err());
        assert!(SpanStyle::from_attrs(None, Some("background: red")).is_err());
        assert!(SpanStyle::from_attrs(None, Some("color")).is_err());
    }
}
