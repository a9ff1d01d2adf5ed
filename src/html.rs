//! Writes the display tree out as a standalone HTML poster.
//! Only structure, classes and the span styles the editor produces; no script.

use chrono::NaiveDate;
use std::fmt::{self, Write};

use crate::blank_box::render_blank_boxes;
use crate::display::{CardInfo, DisplayTree, NodeId, NodeKind, RegionKind};
use crate::error::PosterResult;
use crate::export::{A4_HEIGHT_PX, A4_WIDTH_PX};
use crate::markup::span_open_tag;
use crate::sanitize::escape_text;
use crate::store::{MarkupField, PatternId};
use crate::style::FontScale;

/// Base poster styles: layout, blank boxes, bold spans and card sizes.
const POSTER_BASE_STYLES: &str = "html,body{margin:0;background:#f1f5f9;color:#1e293b;font-family:'Noto Sans KR',sans-serif;}\
#poster-container{--current-font-size:1;width:794px;min-height:1123px;margin:0 auto;background:#ffffff;border-radius:16px;padding:40px;box-sizing:border-box;}\
#poster-container.exporting{height:1123px;border-radius:0;}\
.poster-header{display:flex;justify-content:space-between;align-items:center;margin-bottom:24px;}\
.poster-title{font-size:calc(2rem * var(--current-font-size));margin:0;}\
.date-badge{background:#1e293b;color:#ffffff;border-radius:999px;padding:6px 14px;font-size:0.85rem;}\
.patterns-grid{display:flex;flex-direction:column;gap:20px;}\
.pattern-card{position:relative;border:2px solid #e2e8f0;border-radius:12px;padding:20px;}\
.pattern-card.size-small{min-height:140px;}\
.pattern-card.size-medium{min-height:200px;}\
.pattern-card.size-large{min-height:260px;}\
.pattern-card.size-xl{min-height:320px;}\
.pattern-label{font-weight:700;color:#3b82f6;margin-bottom:8px;}\
.pattern-display,.examples-display{font-size:calc(1.25rem * var(--current-font-size));line-height:1.8;white-space:pre-wrap;}\
.pattern-display.empty,.examples-display.empty{color:#94a3b8;font-style:italic;}\
.examples-section{display:none;margin-top:16px;}\
.examples-section.show{display:block;}\
.pattern-date{font-size:0.9rem;color:#64748b;}\
.blank-box{display:inline-block;height:1.1em;border-bottom:2px solid #1e293b;vertical-align:bottom;margin:0 2px;}\
.blank-box.space-1{width:2em;}\
.blank-box.space-2{width:3.5em;}\
.blank-box.space-3{width:5em;}\
.blank-box.space-4{width:7em;}\
.blank-box.space-5-plus{width:9em;}\
.text-bold{font-weight:700;}\
.empty-state{text-align:center;color:#94a3b8;padding:80px 0;}";

/// Title shown when a poster has none of its own.
pub const DEFAULT_TITLE: &str = "ZENITH English Weekly Pattern";

pub const EMPTY_STATE_TITLE: &str = "No patterns yet";
pub const EMPTY_STATE_HINT: &str = "Click \"Add New Pattern\" to get started";

/// Who the HTML is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlMode {
    /// Interactive editing: inputs, delete and calendar buttons, date badge
    Editor,
    /// Fixed A4 capture with all editing chrome left out
    Export,
}

#[derive(Debug, Clone)]
pub struct PosterView<'a> {
    pub title: &'a str,
    pub mode: HtmlMode,
    pub font_scale: FontScale,
    /// Date shown in the header badge (editor only).
    pub today: NaiveDate,
}

/// `Aug 25, 2025 - Monday`
pub fn date_badge(today: NaiveDate) -> String {
    today.format("%b %-d, %Y - %A").to_string()
}

/// Render the full poster document.
pub fn poster_html(tree: &DisplayTree, view: &PosterView) -> PosterResult<String> {
    let mut out = String::new();
    write_poster(&mut out, tree, view)?;
    Ok(out)
}

fn write_poster(out: &mut String, tree: &DisplayTree, view: &PosterView) -> fmt::Result {
    let title = render_blank_boxes(view.title, true);
    write!(
        out,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title><style>{}</style></head><body>",
        title, POSTER_BASE_STYLES
    )?;

    out.push_str("<div id=\"poster-container\"");
    match view.mode {
        HtmlMode::Editor => write!(out, " style=\"--current-font-size: {};\">", view.font_scale.value())?,
        HtmlMode::Export => write!(
            out,
            " class=\"exporting\" style=\"--current-font-size: {}; width: {}px; height: {}px; border-radius: 0;\">",
            view.font_scale.value(),
            A4_WIDTH_PX,
            A4_HEIGHT_PX
        )?,
    }

    write!(out, "<header class=\"poster-header\"><h1 class=\"poster-title\">{}</h1>", title)?;
    if view.mode == HtmlMode::Editor {
        write!(out, "<div class=\"date-badge\" id=\"date-badge\">{}</div>", date_badge(view.today))?;
    }
    out.push_str("</header><div class=\"patterns-grid\" id=\"patterns-grid\">");

    for &child in tree.children(tree.root()) {
        match tree.kind(child) {
            Some(NodeKind::Card(info)) => write_card(out, tree, info, view.mode)?,
            Some(NodeKind::EmptyState) => write!(
                out,
                "<div class=\"empty-state\"><h3>{}</h3><p>{}</p></div>",
                EMPTY_STATE_TITLE,
                escape_text(EMPTY_STATE_HINT)
            )?,
            _ => {}
        }
    }

    out.push_str("</div></div></body></html>");
    Ok(())
}

fn write_card(out: &mut String, tree: &DisplayTree, info: &CardInfo, mode: HtmlMode) -> fmt::Result {
    let id = info.pattern_id;
    let mut class = format!("pattern-card {}", info.size.css_class());
    if info.editing.is_some() && mode == HtmlMode::Editor {
        class.push_str(" editing");
    }
    write!(out, "<div class=\"{}\" id=\"pattern-{}\">", class, id)?;

    if mode == HtmlMode::Editor {
        write!(
            out,
            "<button class=\"pattern-delete-btn\" data-pattern=\"{}\" title=\"Delete pattern\">&#215;</button>",
            id
        )?;
    }

    let region_text = |kind: RegionKind| {
        tree.region(id, kind)
            .map(|r| tree.text_content(r))
            .unwrap_or_default()
    };

    out.push_str("<div class=\"pattern-date-section\">");
    match mode {
        HtmlMode::Editor => write!(
            out,
            "<input type=\"text\" class=\"pattern-date-input\" id=\"pattern-date-{}\" value=\"{}\" placeholder=\"YY.MM.DD (Day)\"/>\
             <button class=\"calendar-btn\" data-pattern=\"{}\" title=\"Pick a date\">&#128197;</button>",
            id,
            escape_text(&region_text(RegionKind::DateInput)),
            id
        )?,
        HtmlMode::Export => write!(out, "<div class=\"pattern-date\">{}</div>", escape_text(&info.date))?,
    }
    out.push_str("</div>");

    write!(
        out,
        "<div class=\"pattern-input-group\"><div class=\"pattern-label\">Pattern {}</div>",
        info.number
    )?;
    if mode == HtmlMode::Editor && info.editing == Some(MarkupField::Pattern) {
        write!(
            out,
            "<input type=\"text\" class=\"pattern-input\" id=\"pattern-input-{}\" value=\"{}\"/>",
            id,
            escape_text(&region_text(RegionKind::PatternInput))
        )?;
    } else {
        write_display(out, tree, id, RegionKind::PatternDisplay, "pattern-display")?;
    }
    out.push_str("</div>");

    let shown = if info.examples_visible { " show" } else { "" };
    write!(
        out,
        "<div class=\"examples-section{}\" id=\"examples-section-{}\"><div class=\"pattern-label\">Examples</div>",
        shown, id
    )?;
    if mode == HtmlMode::Editor && info.editing == Some(MarkupField::Examples) {
        write!(
            out,
            "<textarea class=\"examples-input\" id=\"examples-input-{}\">{}</textarea>",
            id,
            escape_text(&region_text(RegionKind::ExamplesInput))
        )?;
    } else {
        write_display(out, tree, id, RegionKind::ExamplesDisplay, "examples-display")?;
    }
    out.push_str("</div></div>");
    Ok(())
}

fn write_display(out: &mut String, tree: &DisplayTree, id: PatternId, kind: RegionKind, class: &str) -> fmt::Result {
    let Some(region) = tree.region(id, kind) else {
        return Ok(());
    };
    let empty = matches!(tree.region_info(region), Some((_, _, true)));
    write!(
        out,
        "<div class=\"{}{}\" id=\"{}-{}\">",
        class,
        if empty { " empty" } else { "" },
        class,
        id
    )?;
    write_inline_nodes(out, tree, region);
    out.push_str("</div>");
    Ok(())
}

fn write_inline_nodes(out: &mut String, tree: &DisplayTree, parent: NodeId) {
    for &child in tree.children(parent) {
        match tree.kind(child) {
            Some(NodeKind::Text(t)) => out.push_str(&escape_text(t)),
            Some(NodeKind::Span(style)) => {
                out.push_str(&span_open_tag(style));
                write_inline_nodes(out, tree, child);
                out.push_str("</span>");
            }
            Some(NodeKind::BlankBox(size)) => out.push_str(&size.markup()),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render_all, RenderOptions};
    use crate::store::{PatternField, PatternStore};

    fn view(mode: HtmlMode) -> PosterView<'static> {
        PosterView {
            title: DEFAULT_TITLE,
            mode,
            font_scale: FontScale::DEFAULT,
            today: NaiveDate::from_ymd_opt(2025, 8, 25).unwrap(),
        }
    }

    fn rendered(pattern: &str) -> DisplayTree {
        let mut store = PatternStore::new();
        let id = store
            .add(NaiveDate::from_ymd_opt(2025, 8, 25).unwrap())
            .unwrap();
        store.update(id, PatternField::Pattern, pattern).unwrap();
        let mut tree = DisplayTree::new();
        render_all(&store, &mut tree, &RenderOptions::default());
        tree
    }

    #[test]
    fn editor_html_has_chrome() {
        let html = poster_html(&rendered("I [] run"), &view(HtmlMode::Editor)).unwrap();
        assert!(html.contains("id=\"date-badge\">Aug 25, 2025 - Monday</div>"));
        assert!(html.contains("pattern-delete-btn"));
        assert!(html.contains("calendar-btn"));
        assert!(html.contains(
            "<div class=\"pattern-display\" id=\"pattern-display-1\">I <span class=\"blank-box space-1\"></span> run</div>"
        ));
        assert!(html.contains("<div class=\"examples-display empty\""));
    }

    #[test]
    fn export_html_drops_chrome() {
        let html = poster_html(&rendered("x"), &view(HtmlMode::Export)).unwrap();
        assert!(!html.contains("date-badge\""));
        assert!(!html.contains("<button"));
        assert!(!html.contains("<input"));
        assert!(html.contains("width: 794px; height: 1123px; border-radius: 0;"));
        assert!(html.contains("<div class=\"pattern-date\">25.08.25 (Mon)</div>"));
    }

    #[test]
    fn empty_state() {
        let mut tree = DisplayTree::new();
        render_all(&PatternStore::new(), &mut tree, &RenderOptions::default());
        let html = poster_html(&tree, &view(HtmlMode::Editor)).unwrap();
        assert!(html.contains("<h3>No patterns yet</h3>"));
        assert!(html.contains("Click &quot;Add New Pattern&quot; to get started"));
    }

    #[test]
    fn title_is_escaped() {
        let tree = rendered("x");
        let mut v = view(HtmlMode::Export);
        v.title = "<b>Week</b>";
        let html = poster_html(&tree, &v).unwrap();
        assert!(html.contains("<h1 class=\"poster-title\">&lt;b&gt;Week&lt;/b&gt;</h1>"));
    }
}
