//! Arena-backed display tree standing in for the rendered poster DOM.
//!
//! Nodes are addressed by [`NodeId`] and never freed; detached nodes stay in
//! the arena but are no longer reachable. Every rebuild and every structural
//! edit bumps the tree's [`Generation`], which is what selection captures are
//! checked against.

use serde::{Deserialize, Serialize};

use crate::blank_box::BlankSize;
use crate::markup::{to_markup, Inline};
use crate::store::{MarkupField, PatternId};
use crate::style::SpanStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Validity token for node ids and selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Which part of a card a region is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegionKind {
    PatternDisplay,
    ExamplesDisplay,
    PatternInput,
    ExamplesInput,
    DateInput,
}

impl RegionKind {
    /// Rendered rich-text areas that accept styling.
    pub fn is_display(self) -> bool {
        matches!(self, RegionKind::PatternDisplay | RegionKind::ExamplesDisplay)
    }

    /// Plain-text inputs and textareas.
    pub fn is_editable(self) -> bool {
        !self.is_display()
    }

    pub fn markup_field(self) -> Option<MarkupField> {
        match self {
            RegionKind::PatternDisplay => Some(MarkupField::Pattern),
            RegionKind::ExamplesDisplay => Some(MarkupField::Examples),
            _ => None,
        }
    }
}

/// Card height class, picked from the amount of text on the card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardSize {
    Small,
    Medium,
    Large,
    Xl,
}

impl CardSize {
    pub fn for_text_len(len: usize) -> Self {
        match len {
            0..=49 => CardSize::Small,
            50..=99 => CardSize::Medium,
            100..=199 => CardSize::Large,
            _ => CardSize::Xl,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            CardSize::Small => "size-small",
            CardSize::Medium => "size-medium",
            CardSize::Large => "size-large",
            CardSize::Xl => "size-xl",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardInfo {
    pub pattern_id: PatternId,
    /// 1-based position on the poster
    pub number: usize,
    pub size: CardSize,
    pub date: String,
    pub editing: Option<MarkupField>,
    pub examples_visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    EmptyState,
    Card(CardInfo),
    Region {
        pattern_id: PatternId,
        kind: RegionKind,
        /// Showing the placeholder prompt rather than content
        empty: bool,
    },
    Text(String),
    Span(SpanStyle),
    BlankBox(BlankSize),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attached: bool,
}

/// A caret position: a text node and a character offset into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl TextPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        TextPoint { node, offset }
    }
}

/// Selection endpoints. `start` may come after `end` for backward selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: TextPoint,
    pub end: TextPoint,
}

impl TextRange {
    pub fn new(start: TextPoint, end: TextPoint) -> Self {
        TextRange { start, end }
    }
}

/// The element that encloses a selection, seen through the only distinction
/// styling cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enclosing {
    /// Plain text directly inside a region (or an unstyled wrapper)
    TextSpan(NodeId),
    StyledSpan(NodeId),
}

#[derive(Debug, Clone)]
pub struct DisplayTree {
    nodes: Vec<Node>,
    generation: Generation,
}

impl Default for DisplayTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayTree {
    pub fn new() -> Self {
        DisplayTree {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
                attached: true,
            }],
            generation: Generation(0),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Drop every node and start a new generation.
    pub(crate) fn reset(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0].children.clear();
        self.touch();
    }

    /// Invalidate outstanding selections after a structural edit.
    pub(crate) fn touch(&mut self) {
        self.generation = Generation(self.generation.0 + 1);
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).filter(|n| n.attached)
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Text of a text node, `None` for anything else.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn span_style(&self, id: NodeId) -> Option<&SpanStyle> {
        match self.kind(id)? {
            NodeKind::Span(style) => Some(style),
            _ => None,
        }
    }

    // ─── Building ────────────────────────────────────────────────────────────

    pub(crate) fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let index = self.children(parent).len();
        self.insert_child(parent, index, kind)
    }

    pub(crate) fn insert_child(&mut self, parent: NodeId, index: usize, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            attached: true,
        });
        let siblings = &mut self.nodes[parent.0].children;
        let index = index.min(siblings.len());
        siblings.insert(index, id);
        id
    }

    pub(crate) fn append_inlines(&mut self, parent: NodeId, inlines: &[Inline]) {
        for inline in inlines {
            match inline {
                Inline::Text(t) => {
                    self.append(parent, NodeKind::Text(t.clone()));
                }
                Inline::Styled { style, children } => {
                    let span = self.append(parent, NodeKind::Span(*style));
                    self.append_inlines(span, children);
                }
                Inline::BlankBox(size) => {
                    self.append(parent, NodeKind::BlankBox(*size));
                }
            }
        }
    }

    // ─── Editing ─────────────────────────────────────────────────────────────

    pub(crate) fn set_text(&mut self, id: NodeId, text: String) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            if let NodeKind::Text(t) = &mut node.kind {
                *t = text;
            }
        }
    }

    pub(crate) fn span_style_mut(&mut self, id: NodeId) -> Option<&mut SpanStyle> {
        match self.nodes.get_mut(id.0) {
            Some(Node {
                kind: NodeKind::Span(style),
                attached: true,
                ..
            }) => Some(style),
            _ => None,
        }
    }

    /// Unlink a node (and its subtree) from its parent.
    pub(crate) fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current.0];
            node.attached = false;
            stack.extend(node.children.iter().copied());
        }
    }

    pub(crate) fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    // ─── Queries ─────────────────────────────────────────────────────────────

    pub fn cards(&self) -> Vec<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .filter(|&id| matches!(self.kind(id), Some(NodeKind::Card(_))))
            .collect()
    }

    pub fn region(&self, pattern_id: PatternId, kind: RegionKind) -> Option<NodeId> {
        self.cards().into_iter().find_map(|card| {
            self.children(card).iter().copied().find(|&child| {
                matches!(
                    self.kind(child),
                    Some(NodeKind::Region { pattern_id: p, kind: k, .. }) if *p == pattern_id && *k == kind
                )
            })
        })
    }

    /// The region containing `id` (or `id` itself when it is a region).
    pub fn region_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(NodeKind::Region { .. }) = self.kind(node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    pub fn region_info(&self, region: NodeId) -> Option<(PatternId, RegionKind, bool)> {
        match self.kind(region)? {
            NodeKind::Region {
                pattern_id,
                kind,
                empty,
            } => Some((*pattern_id, *kind, *empty)),
            _ => None,
        }
    }

    /// Whether a display region is currently swapped out for its input.
    pub fn is_being_edited(&self, region: NodeId) -> bool {
        let Some((_, kind, _)) = self.region_info(region) else {
            return false;
        };
        match self.parent(region).and_then(|card| self.kind(card)) {
            Some(NodeKind::Card(info)) => info.editing.is_some() && info.editing == kind.markup_field(),
            _ => false,
        }
    }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        if !self.is_attached(a) || !self.is_attached(b) {
            return None;
        }
        let mut current = Some(a);
        while let Some(n) = current {
            if self.is_ancestor(n, b) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    /// Text nodes below `id` in document order.
    pub fn text_leaves(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_text_leaves(id, &mut out);
        out
    }

    fn collect_text_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        match self.kind(id) {
            Some(NodeKind::Text(_)) => out.push(id),
            Some(_) => {
                for &child in self.children(id) {
                    self.collect_text_leaves(child, out);
                }
            }
            None => {}
        }
    }

    pub fn text_content(&self, id: NodeId) -> String {
        self.text_leaves(id)
            .into_iter()
            .filter_map(|leaf| self.text(leaf))
            .collect()
    }

    /// Nearest styled span at or above `id`, stopping at the region.
    pub fn nearest_styled(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(n) = current {
            match self.kind(n)? {
                NodeKind::Span(_) => return Some(n),
                NodeKind::Region { .. } => return None,
                _ => current = self.parent(n),
            }
        }
        None
    }

    /// Classify the element enclosing a range.
    pub fn enclosing(&self, range: &TextRange) -> Option<Enclosing> {
        let common = self.common_ancestor(range.start.node, range.end.node)?;
        let element = match self.kind(common)? {
            NodeKind::Text(_) => self.parent(common)?,
            _ => common,
        };
        match self.kind(element)? {
            NodeKind::Span(_) => Some(Enclosing::StyledSpan(element)),
            _ => Some(Enclosing::TextSpan(element)),
        }
    }

    fn check_point(&self, point: &TextPoint) -> Option<usize> {
        let text = self.text(point.node)?;
        (point.offset <= text.chars().count()).then_some(point.offset)
    }

    /// Put a range in document order. `None` when either end no longer
    /// resolves or the ends sit in different regions.
    pub fn normalize(&self, range: &TextRange) -> Option<TextRange> {
        self.check_point(&range.start)?;
        self.check_point(&range.end)?;
        let region = self.region_of(range.start.node)?;
        if self.region_of(range.end.node)? != region {
            return None;
        }
        let leaves = self.text_leaves(region);
        let start_index = leaves.iter().position(|&l| l == range.start.node)?;
        let end_index = leaves.iter().position(|&l| l == range.end.node)?;
        let backwards = end_index < start_index
            || (end_index == start_index && range.end.offset < range.start.offset);
        Some(if backwards {
            TextRange::new(range.end, range.start)
        } else {
            *range
        })
    }

    /// Text covered by a document-ordered range, re-read from the tree.
    pub fn selected_text(&self, range: &TextRange) -> Option<String> {
        let ordered = self.normalize(range)?;
        if ordered != *range {
            return None;
        }
        let region = self.region_of(range.start.node)?;
        let leaves = self.text_leaves(region);
        let start_index = leaves.iter().position(|&l| l == range.start.node)?;
        let end_index = leaves.iter().position(|&l| l == range.end.node)?;

        let mut out = String::new();
        for (i, &leaf) in leaves.iter().enumerate().take(end_index + 1).skip(start_index) {
            let text = self.text(leaf)?;
            let from = if i == start_index { range.start.offset } else { 0 };
            let to = if i == end_index {
                range.end.offset
            } else {
                text.chars().count()
            };
            out.extend(text.chars().skip(from).take(to.saturating_sub(from)));
        }
        Some(out)
    }

    /// Range covering the first occurrence of `needle` in a region's text.
    pub fn locate(&self, region: NodeId, needle: &str) -> Option<TextRange> {
        self.locate_nth(region, needle, 0)
    }

    /// Range covering the `nth` (0-based) occurrence of `needle`.
    pub fn locate_nth(&self, region: NodeId, needle: &str, nth: usize) -> Option<TextRange> {
        if needle.is_empty() {
            return None;
        }
        let leaves = self.text_leaves(region);
        let mut haystack = String::new();
        let mut spans = Vec::with_capacity(leaves.len());
        for &leaf in &leaves {
            let text = self.text(leaf)?;
            let start = haystack.chars().count();
            haystack.push_str(text);
            spans.push((leaf, start, text.chars().count()));
        }

        let (byte_index, _) = haystack.match_indices(needle).nth(nth)?;
        let first = haystack[..byte_index].chars().count();
        let last = first + needle.chars().count();

        let start = spans
            .iter()
            .find(|(_, s, len)| first >= *s && first < s + len)
            .map(|(leaf, s, _)| TextPoint::new(*leaf, first - s))?;
        let end = spans
            .iter()
            .find(|(_, s, len)| last > *s && last <= s + len)
            .map(|(leaf, s, _)| TextPoint::new(*leaf, last - s))?;
        Some(TextRange::new(start, end))
    }

    /// Inline pieces below `id`, for serialization.
    pub fn inlines(&self, id: NodeId) -> Vec<Inline> {
        self.children(id)
            .iter()
            .filter_map(|&child| match self.kind(child)? {
                NodeKind::Text(t) => Some(Inline::Text(t.clone())),
                NodeKind::Span(style) => Some(Inline::Styled {
                    style: *style,
                    children: self.inlines(child),
                }),
                NodeKind::BlankBox(size) => Some(Inline::BlankBox(*size)),
                _ => None,
            })
            .collect()
    }

    /// Current markup of a region, as persisted into the store.
    pub fn region_markup(&self, region: NodeId) -> String {
        to_markup(&self.inlines(region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{StyleProperty, TextColor};
    use pretty_assertions::assert_eq;

    fn sample() -> (DisplayTree, NodeId) {
        let mut tree = DisplayTree::new();
        let region = tree.append(
            tree.root(),
            NodeKind::Region {
                pattern_id: PatternId(1),
                kind: RegionKind::PatternDisplay,
                empty: false,
            },
        );
        tree.append(region, NodeKind::Text("I can ".to_string()));
        tree.append(region, NodeKind::BlankBox(BlankSize::Small));
        let span = tree.append(
            region,
            NodeKind::Span(SpanStyle::default().with(StyleProperty::Color(TextColor::Red))),
        );
        tree.append(span, NodeKind::Text("swim".to_string()));
        tree.append(region, NodeKind::Text(" fast".to_string()));
        (tree, region)
    }

    #[test]
    fn locate_across_leaves() {
        let (tree, region) = sample();
        let range = tree.locate(region, "can swim f").unwrap();
        assert_eq!(tree.selected_text(&range).as_deref(), Some("can swim f"));
        assert_eq!(range.start.offset, 2);
        assert_eq!(range.end.offset, 2);
    }

    #[test]
    fn backward_range_is_normalized() {
        let (tree, region) = sample();
        let range = tree.locate(region, "swim f").unwrap();
        let backwards = TextRange::new(range.end, range.start);
        assert_eq!(tree.selected_text(&backwards), None);
        assert_eq!(tree.normalize(&backwards), Some(range));
    }

    #[test]
    fn enclosing_classification() {
        let (tree, region) = sample();
        let inside = tree.locate(region, "wi").unwrap();
        assert!(matches!(tree.enclosing(&inside), Some(Enclosing::StyledSpan(_))));
        let across = tree.locate(region, "swim f").unwrap();
        assert_eq!(tree.enclosing(&across), Some(Enclosing::TextSpan(region)));
    }

    #[test]
    fn detach_hides_subtree() {
        let (mut tree, region) = sample();
        let range = tree.locate(region, "swim").unwrap();
        let span = tree.parent(range.start.node).unwrap();
        tree.detach(span);
        assert!(!tree.is_attached(range.start.node));
        assert_eq!(tree.selected_text(&range), None);
        assert_eq!(tree.text_content(region), "I can  fast");
    }

    #[test]
    fn reset_bumps_generation() {
        let (mut tree, _) = sample();
        let before = tree.generation();
        tree.reset();
        assert!(tree.generation() > before);
        assert!(tree.cards().is_empty());
        assert!(tree.children(tree.root()).is_empty());
    }

    #[test]
    fn region_markup_serializes_children() {
        let (tree, region) = sample();
        assert_eq!(
            tree.region_markup(region),
            "I can <span class=\"blank-box space-2\"></span><span style=\"color: #ef4444;\">swim</span> fast"
        );
    }

    #[test]
    fn card_size_steps() {
        assert_eq!(CardSize::for_text_len(0), CardSize::Small);
        assert_eq!(CardSize::for_text_len(50), CardSize::Medium);
        assert_eq!(CardSize::for_text_len(199), CardSize::Large);
        assert_eq!(CardSize::for_text_len(200), CardSize::Xl);
    }
}
