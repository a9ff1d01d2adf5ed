//! Free-text sanitizing for everything that ends up inside a display region.
//!
//! Dangerous fragments are removed from the raw text first, the remainder is
//! HTML-escaped, and the result is cut to [`MAX_SANITIZED_CHARS`]. The output
//! is stable under re-sanitizing. Characters XML 1.0 forbids are dropped on
//! the way, so every output parses back as region markup.

use regex::Regex;
use std::sync::OnceLock;

/// Maximum number of characters a sanitized string may hold.
pub const MAX_SANITIZED_CHARS: usize = 500;

fn dangerous_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?is)<script\b.*?</script>",
            r"(?is)<iframe\b.*?</iframe>",
            r"(?i)javascript:",
            r"(?i)on[a-z0-9_]+\s*=",
            r"(?is)<object\b.*?</object>",
            r"(?is)<embed\b.*?</embed>",
            r"(?i)<link\b[^>]*>",
            r"(?i)<meta\b[^>]*>",
            r"(?is)<style\b.*?</style>",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

fn entity_regex() -> &'static Regex {
    static ENTITY_REGEX: OnceLock<Regex> = OnceLock::new();
    ENTITY_REGEX.get_or_init(|| {
        Regex::new(r"^&(?:amp|lt|gt|quot|apos|#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6}));").unwrap()
    })
}

/// Whether XML 1.0 allows `ch` in character data.
pub fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{d7ff}' | '\u{e000}'..='\u{fffd}' | '\u{10000}'..='\u{10ffff}'
    )
}

/// Whether `rest` starts with an entity that can be kept verbatim. Character
/// references must name a character XML allows.
fn starts_with_entity(rest: &str) -> bool {
    let Some(caps) = entity_regex().captures(rest) else {
        return false;
    };
    let code = match (caps.get(1), caps.get(2)) {
        (Some(dec), _) => dec.as_str().parse::<u32>().ok(),
        (_, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
        _ => return true,
    };
    code.and_then(char::from_u32).is_some_and(is_xml_char)
}

/// Sanitize an untrusted string for display.
pub fn sanitize(input: &str) -> String {
    let stripped = strip_dangerous(input);
    truncate_escaped(&escape_html(&stripped), MAX_SANITIZED_CHARS)
}

/// Remove every dangerous fragment, repeating until none is left so that a
/// removal cannot splice a new match together.
fn strip_dangerous(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let mut changed = false;
        for re in dangerous_patterns() {
            if re.is_match(&current) {
                current = re.replace_all(&current, "").into_owned();
                changed = true;
            }
        }
        if !changed {
            return current;
        }
    }
}

/// Escape `& < > "` for use as element text or attribute value. An `&` that
/// already starts a well-formed XML entity is kept as is; characters XML
/// forbids are dropped.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, ch) in s.char_indices() {
        match ch {
            _ if !is_xml_char(ch) => {}
            '&' if starts_with_entity(&s[i..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape every special character unconditionally. Used when serializing
/// decoded text back into markup, so the result always parses back to `s`
/// minus any character XML forbids.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            _ if !is_xml_char(ch) => {}
            // A raw CR would come back as LF.
            '\r' => out.push_str("&#13;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&#160;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Cut escaped text to `max` characters without splitting an entity.
fn truncate_escaped(escaped: &str, max: usize) -> String {
    let Some((cut, _)) = escaped.char_indices().nth(max) else {
        return escaped.to_string();
    };
    let head = &escaped[..cut];
    match head.rfind('&') {
        Some(amp) if !head[amp..].contains(';') => head[..amp].to_string(),
        _ => head.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_script_block() {
        assert_eq!(sanitize("hi<script>alert(1)</script>there"), "hithere");
        assert_eq!(sanitize("a<SCRIPT type=\"x\">\nbad()\n</ScRiPt>b"), "ab");
    }

    #[test]
    fn strips_iframe_and_handlers() {
        assert_eq!(sanitize("<iframe src=x></iframe>ok"), "ok");
        assert_eq!(sanitize("<b onClick=steal()>x</b>"), "&lt;b steal()&gt;x&lt;/b&gt;");
        assert_eq!(sanitize("go javascript:run()"), "go run()");
    }

    #[test]
    fn strips_link_meta_object_embed_style() {
        assert_eq!(
            sanitize("<link rel=x><meta charset=y><object>o</object><embed>e</embed><style>s</style>!"),
            "!"
        );
    }

    #[test]
    fn removal_cannot_splice_new_match() {
        assert_eq!(sanitize("javajavascript:script:x"), "x");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(sanitize("I <3 \"you\" & me"), "I &lt;3 &quot;you&quot; &amp; me");
    }

    #[test]
    fn keeps_existing_entities() {
        assert_eq!(sanitize("&lt;b&gt; &amp; &#160;"), "&lt;b&gt; &amp; &#160;");
        assert_eq!(sanitize("&copy;"), "&amp;copy;");
    }

    #[test]
    fn typed_entities_are_kept_as_written() {
        assert_eq!(sanitize("AT&amp;T"), "AT&amp;T");
        assert_eq!(sanitize("AT&T"), "AT&amp;T");
    }

    #[test]
    fn drops_characters_xml_forbids() {
        assert_eq!(sanitize("a\u{1}b\u{b}c\u{fffe}d"), "abcd");
        assert_eq!(sanitize("tab\there"), "tab\there");
        assert_eq!(
            sanitize("\u{1}<script>alert(1)</script>ok"),
            "ok"
        );
    }

    #[test]
    fn only_legal_character_references_survive() {
        assert_eq!(sanitize("&#0;&#x1;&#xD800;&#1114112;"), "&amp;#0;&amp;#x1;&amp;#xD800;&amp;#1114112;");
        assert_eq!(sanitize("&#160;&#x41;"), "&#160;&#x41;");
    }

    #[test]
    fn escape_text_output_always_parses() {
        let text = "I used to\u{b} swim\r\n & <more>";
        let parsed = crate::markup::parse_markup(&escape_text(text)).unwrap();
        assert_eq!(
            parsed,
            vec![crate::markup::Inline::Text("I used to swim\r\n & <more>".to_string())]
        );
    }

    #[test]
    fn truncates_to_limit() {
        let long = "a".repeat(800);
        assert_eq!(sanitize(&long).chars().count(), MAX_SANITIZED_CHARS);
    }

    #[test]
    fn truncation_never_splits_entity() {
        let input = format!("{}<", "a".repeat(498));
        let out = sanitize(&input);
        assert_eq!(out, "a".repeat(498));
        assert_eq!(sanitize(&out), out);
    }

    #[test]
    fn idempotent_on_mixed_input() {
        let samples = [
            "plain text",
            "<script>x</script><iframe></iframe>javascript:onClick=",
            "a & b < c > d \"e\"",
            "&amp;amp; &lt;&gt;",
            "[  ] blanks [ ]",
            "ononclick=click=",
            "&#0; \u{1}<iframe src=x></iframe>",
        ];
        for s in samples {
            let once = sanitize(s);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", s);
        }
    }
}
