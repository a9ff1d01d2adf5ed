//! Selection capture and toolbar state.

use log::debug;

use crate::display::{DisplayTree, Generation, NodeId, RegionKind, TextRange};
use crate::store::PatternId;

/// Preview text shown when nothing is selected.
pub const NO_SELECTION_PREVIEW: &str = "No text selected";

/// A selection remembered so a later toolbar action can style it.
///
/// Only valid against the tree generation it was taken in.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionCapture {
    pub(crate) generation: Generation,
    pub(crate) region: NodeId,
    pub(crate) pattern_id: PatternId,
    pub(crate) region_kind: RegionKind,
    pub(crate) range: TextRange,
    pub(crate) text: String,
}

impl SelectionCapture {
    /// Snapshot any range that lies within a single region, inputs included.
    pub fn from_range(tree: &DisplayTree, range: &TextRange) -> Option<Self> {
        let range = tree.normalize(range)?;
        let common = tree.common_ancestor(range.start.node, range.end.node)?;
        let region = tree.region_of(common)?;
        let (pattern_id, region_kind, _) = tree.region_info(region)?;
        let text = tree.selected_text(&range)?;
        Some(SelectionCapture {
            generation: tree.generation(),
            region,
            pattern_id,
            region_kind,
            range,
            text,
        })
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn region(&self) -> NodeId {
        self.region
    }

    pub fn pattern_id(&self) -> PatternId {
        self.pattern_id
    }

    pub fn region_kind(&self) -> RegionKind {
        self.region_kind
    }

    pub fn range(&self) -> &TextRange {
        &self.range
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_current(&self, tree: &DisplayTree) -> bool {
        self.generation == tree.generation()
    }
}

/// What the styling toolbar should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarState {
    pub preview: String,
    pub enabled: bool,
}

/// Holds at most one capture.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    capture: Option<SelectionCapture>,
    /// The last selection sat in a text input rather than a display region.
    in_input: bool,
    preview_chars: usize,
}

impl SelectionTracker {
    pub fn new(preview_chars: usize) -> Self {
        SelectionTracker {
            capture: None,
            in_input: false,
            preview_chars,
        }
    }

    /// Handle a selection-change event. Returns whether a capture was taken.
    ///
    /// A range qualifies when it lies inside one rendered display region that
    /// shows real content, is not switched to its input, and covers some
    /// non-whitespace text. Anything else clears the capture.
    pub fn on_selection(&mut self, tree: &DisplayTree, range: Option<&TextRange>) -> bool {
        let selected = range.and_then(|r| SelectionCapture::from_range(tree, r));
        self.in_input = selected
            .as_ref()
            .is_some_and(|c| c.region_kind.is_editable() || tree.is_being_edited(c.region));

        let capture = selected
            .filter(|_| !self.in_input)
            .filter(|c| !matches!(tree.region_info(c.region), Some((_, _, true))))
            .filter(|c| !c.text.trim().is_empty());

        match capture {
            Some(c) => {
                debug!(
                    "captured {} chars in {:?} of pattern {}",
                    c.text.chars().count(),
                    c.region_kind,
                    c.pattern_id
                );
                self.capture = Some(c);
                true
            }
            None => {
                if self.capture.take().is_some() {
                    debug!("selection cleared");
                }
                false
            }
        }
    }

    pub fn current(&self) -> Option<&SelectionCapture> {
        self.capture.as_ref()
    }

    /// Whether the last selection was refused for lying in an input.
    pub fn in_input(&self) -> bool {
        self.in_input
    }

    /// Hand the capture to an action, leaving the tracker empty.
    pub fn take(&mut self) -> Option<SelectionCapture> {
        self.capture.take()
    }

    pub fn clear(&mut self) {
        self.capture = None;
        self.in_input = false;
    }

    /// Toolbar for the current tree. A capture from an older generation
    /// leaves the toolbar disabled.
    pub fn toolbar(&self, tree: &DisplayTree) -> ToolbarState {
        match self.capture.as_ref().filter(|c| c.is_current(tree)) {
            Some(c) => ToolbarState {
                preview: preview(&c.text, self.preview_chars),
                enabled: true,
            },
            None => ToolbarState {
                preview: NO_SELECTION_PREVIEW.to_string(),
                enabled: false,
            },
        }
    }
}

/// First `max` characters, with `...` appended when cut.
pub fn preview(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let mut out: String = text.chars().take(max).collect();
        out.push_str("...");
        out
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::NodeKind;
    use pretty_assertions::assert_eq;

    fn tree_with(kind: RegionKind, text: &str, empty: bool) -> (DisplayTree, NodeId) {
        let mut tree = DisplayTree::new();
        let region = tree.append(
            tree.root(),
            NodeKind::Region {
                pattern_id: PatternId(1),
                kind,
                empty,
            },
        );
        tree.append(region, NodeKind::Text(text.to_string()));
        (tree, region)
    }

    #[test]
    fn captures_display_selection() {
        let (tree, region) = tree_with(RegionKind::PatternDisplay, "I can swim", false);
        let mut tracker = SelectionTracker::new(30);
        let range = tree.locate(region, "swim").unwrap();
        assert!(tracker.on_selection(&tree, Some(&range)));
        let capture = tracker.current().unwrap();
        assert_eq!(capture.text(), "swim");
        assert_eq!(capture.pattern_id(), PatternId(1));
        assert!(capture.is_current(&tree));
        assert_eq!(
            tracker.toolbar(&tree),
            ToolbarState {
                preview: "swim".to_string(),
                enabled: true
            }
        );
    }

    #[test]
    fn rejects_inputs_placeholders_and_whitespace() {
        let mut tracker = SelectionTracker::new(30);

        let (tree, region) = tree_with(RegionKind::PatternInput, "I can swim", false);
        let range = tree.locate(region, "swim").unwrap();
        assert!(!tracker.on_selection(&tree, Some(&range)));
        assert!(tracker.in_input());

        let (tree, region) = tree_with(RegionKind::ExamplesDisplay, "Click to add", true);
        let range = tree.locate(region, "Click").unwrap();
        assert!(!tracker.on_selection(&tree, Some(&range)));

        let (tree, region) = tree_with(RegionKind::PatternDisplay, "a   b", false);
        let range = tree.locate(region, "   ").unwrap();
        assert!(!tracker.on_selection(&tree, Some(&range)));
        assert!(!tracker.in_input());
        assert_eq!(tracker.toolbar(&tree).preview, NO_SELECTION_PREVIEW);
    }

    #[test]
    fn stale_capture_disables_toolbar() {
        let (mut tree, region) = tree_with(RegionKind::PatternDisplay, "I can swim", false);
        let mut tracker = SelectionTracker::new(30);
        let range = tree.locate(region, "swim").unwrap();
        tracker.on_selection(&tree, Some(&range));
        tree.touch();
        assert!(tracker.current().is_some());
        assert_eq!(tracker.toolbar(&tree).preview, NO_SELECTION_PREVIEW);
        assert!(!tracker.toolbar(&tree).enabled);
    }

    #[test]
    fn empty_selection_clears_capture() {
        let (tree, region) = tree_with(RegionKind::PatternDisplay, "I can swim", false);
        let mut tracker = SelectionTracker::new(30);
        let range = tree.locate(region, "can").unwrap();
        tracker.on_selection(&tree, Some(&range));
        assert!(!tracker.on_selection(&tree, None));
        assert!(tracker.current().is_none());
        assert!(!tracker.toolbar(&tree).enabled);
    }

    #[test]
    fn preview_truncates() {
        assert_eq!(preview("short", 30), "short");
        let long = "a".repeat(31);
        assert_eq!(preview(&long, 30), format!("{}...", "a".repeat(30)));
    }
}
