//! Rebuilding the display tree from the pattern store.

use log::{debug, warn};

use crate::blank_box::render_blank_boxes;
use crate::display::{CardInfo, CardSize, DisplayTree, Generation, NodeId, NodeKind, RegionKind};
use crate::markup::{parse_markup, Inline};
use crate::sanitize::sanitize;
use crate::store::{MarkupField, PatternId, PatternRecord, PatternStore};

pub const PATTERN_PLACEHOLDER: &str = "Click to add pattern (use [], [ ], [   ] for different sizes)";
pub const EXAMPLES_PLACEHOLDER: &str =
    "Click to add example sentences (use [], [ ], [   ] for different sizes)";

/// Editor state that shapes the rendered cards.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    pub examples_visible: bool,
    /// Region currently switched to its input, if any.
    pub editing: Option<(PatternId, MarkupField)>,
    pub pattern_placeholder: &'a str,
    pub examples_placeholder: &'a str,
}

impl Default for RenderOptions<'_> {
    fn default() -> Self {
        RenderOptions {
            examples_visible: false,
            editing: None,
            pattern_placeholder: PATTERN_PLACEHOLDER,
            examples_placeholder: EXAMPLES_PLACEHOLDER,
        }
    }
}

/// Throw away the current tree and rebuild every card.
///
/// Returns the new generation; selections taken before it are stale.
pub fn render_all(store: &PatternStore, tree: &mut DisplayTree, options: &RenderOptions) -> Generation {
    tree.reset();
    let root = tree.root();

    if store.is_empty() {
        tree.append(root, NodeKind::EmptyState);
        return tree.generation();
    }

    for (index, record) in store.records().iter().enumerate() {
        let editing = options
            .editing
            .filter(|(id, _)| *id == record.id)
            .map(|(_, field)| field);
        let card = tree.append(
            root,
            NodeKind::Card(CardInfo {
                pattern_id: record.id,
                number: index + 1,
                size: CardSize::for_text_len(record.text_len()),
                date: record.date.clone(),
                editing,
                examples_visible: options.examples_visible,
            }),
        );

        append_input(tree, card, record, RegionKind::DateInput, &record.date);
        append_input(tree, card, record, RegionKind::PatternInput, &record.pattern_text);
        append_display(tree, card, record, MarkupField::Pattern, options.pattern_placeholder);
        append_input(tree, card, record, RegionKind::ExamplesInput, &record.examples_text);
        append_display(tree, card, record, MarkupField::Examples, options.examples_placeholder);
    }

    debug!(
        "rendered {} cards at generation {}",
        store.len(),
        tree.generation().value()
    );
    tree.generation()
}

fn append_input(tree: &mut DisplayTree, card: NodeId, record: &PatternRecord, kind: RegionKind, value: &str) {
    let region = tree.append(
        card,
        NodeKind::Region {
            pattern_id: record.id,
            kind,
            empty: value.is_empty(),
        },
    );
    if !value.is_empty() {
        tree.append(region, NodeKind::Text(value.to_string()));
    }
}

fn append_display(
    tree: &mut DisplayTree,
    card: NodeId,
    record: &PatternRecord,
    field: MarkupField,
    placeholder: &str,
) {
    let kind = match field {
        MarkupField::Pattern => RegionKind::PatternDisplay,
        MarkupField::Examples => RegionKind::ExamplesDisplay,
    };
    let (inlines, empty) = display_content(record, field, placeholder);
    let region = tree.append(
        card,
        NodeKind::Region {
            pattern_id: record.id,
            kind,
            empty,
        },
    );
    tree.append_inlines(region, &inlines);
}

/// Persisted markup wins over the plain text; an empty region shows the
/// placeholder and is flagged empty.
fn display_content(record: &PatternRecord, field: MarkupField, placeholder: &str) -> (Vec<Inline>, bool) {
    let text = record.text(field);

    if let Some(markup) = record.markup(field) {
        match parse_markup(markup) {
            Ok(inlines) => return (inlines, false),
            Err(e) => warn!(
                "discarding stored {:?} markup of pattern {}: {}",
                field, record.id, e
            ),
        }
    }

    if text.is_empty() {
        return (vec![Inline::Text(placeholder.to_string())], true);
    }

    match parse_markup(&render_blank_boxes(text, false)) {
        Ok(inlines) => (inlines, false),
        Err(e) => {
            warn!("rendering pattern {} {:?} without blank boxes: {}", record.id, field, e);
            (vec![Inline::Text(sanitize(text))], false)
        }
    }
}
