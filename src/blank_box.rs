//! Bracket placeholders (`[]`, `[ ]`, `[   ]`, ...) rendered as empty boxes.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::sanitize::{escape_html, sanitize};

/// CSS class shared by every blank box.
pub const BLANK_BOX_CLASS: &str = "blank-box";

/// Visual width of a blank box, picked from the whitespace run inside the brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlankSize {
    Smallest,
    Small,
    Medium,
    Large,
    Largest,
}

impl BlankSize {
    /// Step function over the number of whitespace characters between `[` and `]`.
    pub fn from_run_length(run: usize) -> Self {
        match run {
            0 => BlankSize::Smallest,
            1 => BlankSize::Small,
            2 | 3 => BlankSize::Medium,
            4 | 5 => BlankSize::Large,
            _ => BlankSize::Largest,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            BlankSize::Smallest => "space-1",
            BlankSize::Small => "space-2",
            BlankSize::Medium => "space-3",
            BlankSize::Large => "space-4",
            BlankSize::Largest => "space-5-plus",
        }
    }

    pub fn from_css_class(class: &str) -> Option<Self> {
        match class {
            "space-1" => Some(BlankSize::Smallest),
            "space-2" => Some(BlankSize::Small),
            "space-3" => Some(BlankSize::Medium),
            "space-4" => Some(BlankSize::Large),
            "space-5-plus" => Some(BlankSize::Largest),
            _ => None,
        }
    }

    /// Markup for an empty box of this size.
    pub fn markup(self) -> String {
        format!("<span class=\"{} {}\"></span>", BLANK_BOX_CLASS, self.css_class())
    }
}

fn blank_regex() -> &'static Regex {
    static BLANK_REGEX: OnceLock<Regex> = OnceLock::new();
    BLANK_REGEX.get_or_init(|| Regex::new(r"\[(\s*)\]").unwrap())
}

/// Render user text into display markup.
///
/// Titles are only escaped. Everything else is sanitized and each bracket
/// placeholder becomes a blank box.
pub fn render_blank_boxes(text: &str, is_title: bool) -> String {
    if is_title {
        return escape_html(text);
    }

    let sanitized = sanitize(text);
    blank_regex()
        .replace_all(&sanitized, |caps: &Captures| {
            let run = caps.get(1).map(|m| m.as_str().chars().count()).unwrap_or(0);
            BlankSize::from_run_length(run).markup()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn size_table() {
        let cases = [
            (0, "space-1"),
            (1, "space-2"),
            (2, "space-3"),
            (3, "space-3"),
            (4, "space-4"),
            (5, "space-4"),
            (6, "space-5-plus"),
            (10, "space-5-plus"),
        ];
        for (run, class) in cases {
            let out = render_blank_boxes(&format!("[{}]", " ".repeat(run)), false);
            assert_eq!(out.matches(BLANK_BOX_CLASS).count(), 1, "run {}", run);
            assert_eq!(out, format!("<span class=\"blank-box {}\"></span>", class));
        }
    }

    #[test]
    fn surrounding_text_is_kept() {
        assert_eq!(
            render_blank_boxes("I can [] and [ ]!", false),
            "I can <span class=\"blank-box space-1\"></span> and <span class=\"blank-box space-2\"></span>!"
        );
    }

    #[test]
    fn text_is_sanitized_before_substitution() {
        assert_eq!(
            render_blank_boxes("<script>x</script>a < b []", false),
            "a &lt; b <span class=\"blank-box space-1\"></span>"
        );
    }

    #[test]
    fn tabs_count_as_whitespace() {
        assert_eq!(
            render_blank_boxes("[\t\t]", false),
            BlankSize::Medium.markup()
        );
    }

    #[test]
    fn title_is_only_escaped() {
        assert_eq!(render_blank_boxes("Week [1] <b>", true), "Week [1] &lt;b&gt;");
    }

    #[test]
    fn unbalanced_brackets_stay_text() {
        assert_eq!(render_blank_boxes("[ x ] [", false), "[ x ] [");
    }
}
