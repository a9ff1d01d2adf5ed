//! Applying and resetting span styles on a captured selection.
//!
//! Every successful action re-serializes the region into the store and bumps
//! the tree generation, so a capture can be used at most once.

use log::{debug, warn};

use crate::display::{DisplayTree, Enclosing, NodeId, NodeKind, TextRange};
use crate::error::{PosterError, PosterResult};
use crate::selection::SelectionCapture;
use crate::store::PatternStore;
use crate::style::{SpanStyle, StyleProperty};

/// What a style action did to the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleAction {
    /// An existing span around the selection was restyled
    Updated,
    /// A new span was wrapped around the selection
    Created,
    /// A styled span was flattened back to plain text
    Cleared,
    /// Reset found no styled span to remove
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleOutcome {
    pub action: StyleAction,
    /// Region markup as persisted
    pub markup: String,
}

/// Check that a capture still describes the tree.
fn validate(tree: &DisplayTree, capture: &SelectionCapture) -> PosterResult<()> {
    if capture.region_kind.is_editable() {
        return Err(PosterError::UnsupportedTarget);
    }
    if !capture.is_current(tree) {
        debug!(
            "capture from generation {} used at {}",
            capture.generation.value(),
            tree.generation().value()
        );
        return Err(PosterError::StaleSelection);
    }
    let region_matches = tree.region_of(capture.range.start.node) == Some(capture.region)
        && tree.region_of(capture.range.end.node) == Some(capture.region);
    if !region_matches || tree.selected_text(&capture.range).as_deref() != Some(capture.text.as_str()) {
        return Err(PosterError::StaleSelection);
    }
    Ok(())
}

/// Apply one style property to the captured selection.
///
/// When the selection already sits inside a styled span, that span is
/// updated in place. Otherwise the selected text is cut out and wrapped in a
/// new span that inherits the nearest enclosing span's other properties.
pub fn apply_style(
    store: &mut PatternStore,
    tree: &mut DisplayTree,
    capture: &SelectionCapture,
    property: StyleProperty,
) -> PosterResult<StyleOutcome> {
    validate(tree, capture)?;

    let enclosing = tree
        .enclosing(&capture.range)
        .ok_or(PosterError::StaleSelection)?;

    let action = match enclosing {
        Enclosing::StyledSpan(span) => {
            let style = tree
                .span_style_mut(span)
                .ok_or(PosterError::StaleSelection)?;
            style.set(property);
            StyleAction::Updated
        }
        Enclosing::TextSpan(_) => {
            let inherited = tree
                .nearest_styled(capture.range.start.node)
                .and_then(|span| tree.span_style(span).copied())
                .unwrap_or_default();
            let text = capture.text.replace(' ', "\u{a0}");
            wrap_range(tree, &capture.range, inherited.with(property), text)?;
            StyleAction::Created
        }
    };

    debug!("{} applied to pattern {}", property.name(), capture.pattern_id);
    persist(store, tree, capture, action)
}

/// Remove the styled span enclosing the captured selection, keeping its text.
pub fn reset_style(
    store: &mut PatternStore,
    tree: &mut DisplayTree,
    capture: &SelectionCapture,
) -> PosterResult<StyleOutcome> {
    validate(tree, capture)?;

    let action = match tree.enclosing(&capture.range) {
        Some(Enclosing::StyledSpan(span)) => {
            let text = tree.text_content(span);
            let parent = tree.parent(span).ok_or(PosterError::StaleSelection)?;
            let index = tree
                .index_in_parent(span)
                .ok_or(PosterError::StaleSelection)?;
            tree.detach(span);
            tree.insert_child(parent, index, NodeKind::Text(text));
            StyleAction::Cleared
        }
        Some(Enclosing::TextSpan(_)) => StyleAction::Unchanged,
        None => return Err(PosterError::StaleSelection),
    };

    persist(store, tree, capture, action)
}

fn persist(
    store: &mut PatternStore,
    tree: &mut DisplayTree,
    capture: &SelectionCapture,
    action: StyleAction,
) -> PosterResult<StyleOutcome> {
    let markup = tree.region_markup(capture.region);
    match capture.region_kind.markup_field() {
        Some(field) => store.set_markup(capture.pattern_id, field, markup.clone())?,
        None => warn!("region {:?} has no markup field", capture.region_kind),
    }
    tree.touch();
    Ok(StyleOutcome { action, markup })
}

/// Replace the content of `range` with a new span holding `text`.
///
/// The span is inserted into the common ancestor of both ends, right after
/// the child holding the start. Text nodes and spans left empty by the cut
/// are pruned; blank boxes are never pruned.
fn wrap_range(
    tree: &mut DisplayTree,
    range: &TextRange,
    style: SpanStyle,
    text: String,
) -> PosterResult<NodeId> {
    let (start, end) = (range.start, range.end);

    if start.node == end.node {
        let parent = tree.parent(start.node).ok_or(PosterError::StaleSelection)?;
        let index = tree
            .index_in_parent(start.node)
            .ok_or(PosterError::StaleSelection)?;
        let full = tree
            .text(start.node)
            .ok_or(PosterError::StaleSelection)?
            .to_string();
        let before: String = full.chars().take(start.offset).collect();
        let after: String = full.chars().skip(end.offset).collect();

        let span = tree.insert_child(parent, index + 1, NodeKind::Span(style));
        tree.append(span, NodeKind::Text(text));
        if !after.is_empty() {
            tree.insert_child(parent, index + 2, NodeKind::Text(after));
        }
        if before.is_empty() {
            tree.detach(start.node);
        } else {
            tree.set_text(start.node, before);
        }
        return Ok(span);
    }

    let common = tree
        .common_ancestor(start.node, end.node)
        .ok_or(PosterError::StaleSelection)?;
    let start_top = child_toward(tree, common, start.node)?;
    let end_top = child_toward(tree, common, end.node)?;

    let head: String = tree
        .text(start.node)
        .ok_or(PosterError::StaleSelection)?
        .chars()
        .take(start.offset)
        .collect();
    tree.set_text(start.node, head);
    let mut current = start.node;
    while current != start_top {
        let parent = tree.parent(current).ok_or(PosterError::StaleSelection)?;
        let siblings = tree.children(parent).to_vec();
        if let Some(pos) = siblings.iter().position(|&c| c == current) {
            for &sibling in &siblings[pos + 1..] {
                tree.detach(sibling);
            }
        }
        current = parent;
    }

    let tail: String = tree
        .text(end.node)
        .ok_or(PosterError::StaleSelection)?
        .chars()
        .skip(end.offset)
        .collect();
    tree.set_text(end.node, tail);
    let mut current = end.node;
    while current != end_top {
        let parent = tree.parent(current).ok_or(PosterError::StaleSelection)?;
        let siblings = tree.children(parent).to_vec();
        if let Some(pos) = siblings.iter().position(|&c| c == current) {
            for &sibling in &siblings[..pos] {
                tree.detach(sibling);
            }
        }
        current = parent;
    }

    let siblings = tree.children(common).to_vec();
    let from = siblings.iter().position(|&c| c == start_top);
    let to = siblings.iter().position(|&c| c == end_top);
    if let (Some(from), Some(to)) = (from, to) {
        for &middle in &siblings[from + 1..to] {
            tree.detach(middle);
        }
    }

    let index = tree
        .index_in_parent(start_top)
        .ok_or(PosterError::StaleSelection)?;
    let span = tree.insert_child(common, index + 1, NodeKind::Span(style));
    tree.append(span, NodeKind::Text(text));

    prune(tree, start_top);
    prune(tree, end_top);
    Ok(span)
}

/// The child of `ancestor` on the path down to `node`.
fn child_toward(tree: &DisplayTree, ancestor: NodeId, node: NodeId) -> PosterResult<NodeId> {
    let mut current = node;
    loop {
        let parent = tree.parent(current).ok_or(PosterError::StaleSelection)?;
        if parent == ancestor {
            return Ok(current);
        }
        current = parent;
    }
}

/// Drop empty text nodes and spans left with nothing in them.
fn prune(tree: &mut DisplayTree, id: NodeId) {
    for child in tree.children(id).to_vec() {
        prune(tree, child);
    }
    let empty = match tree.kind(id) {
        Some(NodeKind::Text(t)) => t.is_empty(),
        Some(NodeKind::Span(_)) => tree.children(id).is_empty(),
        _ => false,
    };
    if empty {
        tree.detach(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blank_box::BlankSize;
    use crate::display::RegionKind;
    use crate::store::{MarkupField, PatternId};
    use crate::style::{FontScale, TextColor};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    struct Fixture {
        store: PatternStore,
        tree: DisplayTree,
        region: NodeId,
        id: PatternId,
    }

    fn fixture(build: impl FnOnce(&mut DisplayTree, NodeId)) -> Fixture {
        let mut store = PatternStore::new();
        let id = store
            .add(NaiveDate::from_ymd_opt(2025, 8, 25).unwrap())
            .unwrap();
        let mut tree = DisplayTree::new();
        let region = tree.append(
            tree.root(),
            NodeKind::Region {
                pattern_id: id,
                kind: RegionKind::PatternDisplay,
                empty: false,
            },
        );
        build(&mut tree, region);
        Fixture {
            store,
            tree,
            region,
            id,
        }
    }

    fn capture(f: &Fixture, needle: &str) -> SelectionCapture {
        let range = f.tree.locate(f.region, needle).unwrap();
        SelectionCapture::from_range(&f.tree, &range).unwrap()
    }

    #[test]
    fn wraps_plain_text_in_new_span() {
        let mut f = fixture(|tree, region| {
            tree.append(region, NodeKind::Text("I can swim".to_string()));
        });
        let c = capture(&f, "swim");
        let out = apply_style(&mut f.store, &mut f.tree, &c, StyleProperty::Color(TextColor::Red)).unwrap();
        assert_eq!(out.action, StyleAction::Created);
        assert_eq!(out.markup, "I can <span style=\"color: #ef4444;\">swim</span>");
        assert_eq!(
            f.store.get(f.id).unwrap().markup(MarkupField::Pattern),
            Some(out.markup.as_str())
        );
    }

    #[test]
    fn spaces_in_new_span_become_nbsp() {
        let mut f = fixture(|tree, region| {
            tree.append(region, NodeKind::Text("I can swim fast".to_string()));
        });
        let c = capture(&f, "swim fast");
        let out = apply_style(&mut f.store, &mut f.tree, &c, StyleProperty::Bold).unwrap();
        assert_eq!(
            out.markup,
            "I can <span class=\"text-bold\">swim&#160;fast</span>"
        );
    }

    #[test]
    fn updates_enclosing_span_in_place() {
        let mut f = fixture(|tree, region| {
            tree.append(region, NodeKind::Text("I ".to_string()));
            let span = tree.append(
                region,
                NodeKind::Span(SpanStyle::default().with(StyleProperty::Color(TextColor::Red))),
            );
            tree.append(span, NodeKind::Text("swim".to_string()));
        });
        let c = capture(&f, "swim");
        let scale = FontScale::new(1.5).unwrap();
        let out = apply_style(&mut f.store, &mut f.tree, &c, StyleProperty::FontScale(scale)).unwrap();
        assert_eq!(out.action, StyleAction::Updated);
        assert_eq!(
            out.markup,
            "I <span style=\"color: #ef4444; font-size: 1.5em;\">swim</span>"
        );
    }

    #[test]
    fn capture_is_single_use() {
        let mut f = fixture(|tree, region| {
            tree.append(region, NodeKind::Text("I can swim".to_string()));
        });
        let c = capture(&f, "swim");
        apply_style(&mut f.store, &mut f.tree, &c, StyleProperty::Bold).unwrap();
        assert_eq!(
            apply_style(&mut f.store, &mut f.tree, &c, StyleProperty::Bold),
            Err(PosterError::StaleSelection)
        );
    }

    #[test]
    fn cut_across_blank_box_removes_it() {
        let mut f = fixture(|tree, region| {
            tree.append(region, NodeKind::Text("go ".to_string()));
            tree.append(region, NodeKind::BlankBox(BlankSize::Smallest));
            tree.append(region, NodeKind::Text(" now".to_string()));
        });
        let c = capture(&f, "o  n");
        let out = apply_style(&mut f.store, &mut f.tree, &c, StyleProperty::Bold).unwrap();
        assert_eq!(
            out.markup,
            "g<span class=\"text-bold\">o&#160;&#160;n</span>ow"
        );
    }

    #[test]
    fn partial_overlap_inherits_start_span_style() {
        let mut f = fixture(|tree, region| {
            let span = tree.append(
                region,
                NodeKind::Span(SpanStyle::default().with(StyleProperty::Color(TextColor::Blue))),
            );
            tree.append(span, NodeKind::Text("blue".to_string()));
            tree.append(region, NodeKind::Text(" plain".to_string()));
        });
        let c = capture(&f, "ue pl");
        let out = apply_style(&mut f.store, &mut f.tree, &c, StyleProperty::Bold).unwrap();
        assert_eq!(out.action, StyleAction::Created);
        assert_eq!(
            out.markup,
            "<span style=\"color: #3b82f6;\">bl</span>\
             <span class=\"text-bold\" style=\"color: #3b82f6;\">ue&#160;pl</span>ain"
        );
    }

    #[test]
    fn reset_flattens_span() {
        let mut f = fixture(|tree, region| {
            tree.append(region, NodeKind::Text("I ".to_string()));
            let span = tree.append(
                region,
                NodeKind::Span(SpanStyle::default().with(StyleProperty::Bold)),
            );
            tree.append(span, NodeKind::Text("swim".to_string()));
        });
        let c = capture(&f, "wi");
        let out = reset_style(&mut f.store, &mut f.tree, &c).unwrap();
        assert_eq!(out.action, StyleAction::Cleared);
        assert_eq!(out.markup, "I swim");

        let c = capture(&f, "swim");
        let out = reset_style(&mut f.store, &mut f.tree, &c).unwrap();
        assert_eq!(out.action, StyleAction::Unchanged);
    }

    #[test]
    fn rejects_stale_and_input_captures() {
        let mut f = fixture(|tree, region| {
            tree.append(region, NodeKind::Text("I can swim".to_string()));
        });
        let c = capture(&f, "swim");
        f.tree.touch();
        assert_eq!(
            apply_style(&mut f.store, &mut f.tree, &c, StyleProperty::Bold),
            Err(PosterError::StaleSelection)
        );

        let input = f.tree.append(
            f.tree.root(),
            NodeKind::Region {
                pattern_id: f.id,
                kind: RegionKind::PatternInput,
                empty: false,
            },
        );
        f.tree.append(input, NodeKind::Text("typed".to_string()));
        let range = f.tree.locate(input, "typed").unwrap();
        let c = SelectionCapture::from_range(&f.tree, &range).unwrap();
        assert_eq!(
            apply_style(&mut f.store, &mut f.tree, &c, StyleProperty::Bold),
            Err(PosterError::UnsupportedTarget)
        );
        assert_eq!(f.store.get(f.id).unwrap().pattern_markup, None);
    }
}
