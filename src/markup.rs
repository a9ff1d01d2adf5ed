//! Inline markup held by display regions.
//!
//! Persisted region markup is a flat run of text, styled spans and blank
//! boxes. It is parsed back with `roxmltree` under a synthetic wrapper
//! element, so only well-formed markup is accepted.

use roxmltree::{Node, NodeType};
use serde::{Deserialize, Serialize};

use crate::blank_box::{BlankSize, BLANK_BOX_CLASS};
use crate::error::{PosterError, PosterResult};
use crate::sanitize::escape_text;
use crate::style::SpanStyle;

/// Synthetic root tag wrapping a region's markup.
const WRAPPER: &str = "__poster_region__";

const MAX_NESTING_DEPTH: usize = 20;

fn wrap(markup: &str) -> String {
    format!("<{0}>{1}</{0}>", WRAPPER, markup)
}

/// One inline piece of a display region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inline {
    Text(String),
    Styled {
        style: SpanStyle,
        children: Vec<Inline>,
    },
    BlankBox(BlankSize),
}

impl Inline {
    /// Concatenated text, blank boxes contribute nothing.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Inline::Text(t) => out.push_str(t),
            Inline::Styled { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
            Inline::BlankBox(_) => {}
        }
    }
}

/// Parse region markup into inline pieces.
pub fn parse_markup(markup: &str) -> PosterResult<Vec<Inline>> {
    let wrapped = wrap(markup);
    let doc = roxmltree::Document::parse(&wrapped)?;
    parse_children(doc.root_element(), 0)
}

fn parse_children(node: Node, depth: usize) -> PosterResult<Vec<Inline>> {
    if depth > MAX_NESTING_DEPTH {
        return Err(PosterError::Markup(format!(
            "spans nested deeper than {}",
            MAX_NESTING_DEPTH
        )));
    }

    let mut out = Vec::new();
    for child in node.children() {
        match child.node_type() {
            NodeType::Text => {
                if let Some(text) = child.text() {
                    push_text(&mut out, text);
                }
            }
            NodeType::Element => out.push(parse_element(child, depth)?),
            _ => {}
        }
    }
    Ok(out)
}

fn parse_element(node: Node, depth: usize) -> PosterResult<Inline> {
    match node.tag_name().name() {
        "span" => {
            let class = node.attribute("class");
            let is_blank = class
                .map(|c| c.split_whitespace().any(|t| t == BLANK_BOX_CLASS))
                .unwrap_or(false);

            if is_blank {
                let size = class
                    .into_iter()
                    .flat_map(str::split_whitespace)
                    .find_map(BlankSize::from_css_class)
                    .ok_or_else(|| {
                        PosterError::Markup("blank box without a size class".to_string())
                    })?;
                return Ok(Inline::BlankBox(size));
            }

            let style = SpanStyle::from_attrs(class, node.attribute("style"))?;
            let children = parse_children(node, depth + 1)?;
            Ok(Inline::Styled { style, children })
        }
        "br" => Ok(Inline::Text("\n".to_string())),
        other => Err(PosterError::Markup(format!(
            "unsupported element <{}> in region markup",
            other
        ))),
    }
}

fn push_text(out: &mut Vec<Inline>, text: &str) {
    if let Some(Inline::Text(prev)) = out.last_mut() {
        prev.push_str(text);
    } else {
        out.push(Inline::Text(text.to_string()));
    }
}

/// Serialize inline pieces back into markup.
pub fn to_markup(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        write_inline(inline, &mut out);
    }
    out
}

fn write_inline(inline: &Inline, out: &mut String) {
    match inline {
        Inline::Text(t) => out.push_str(&escape_text(t)),
        Inline::Styled { style, children } => {
            out.push_str(&span_open_tag(style));
            for child in children {
                write_inline(child, out);
            }
            out.push_str("</span>");
        }
        Inline::BlankBox(size) => out.push_str(&size.markup()),
    }
}

/// `<span class=".." style="..">` for a styled span.
pub fn span_open_tag(style: &SpanStyle) -> String {
    let mut tag = String::from("<span");
    if let Some(class) = style.class_attr() {
        tag.push_str(&format!(" class=\"{}\"", class));
    }
    if let Some(css) = style.style_attr() {
        tag.push_str(&format!(" style=\"{}\"", css));
    }
    tag.push('>');
    tag
}
