//! The poster editor: one object owning the store, the display tree and the
//! selection, with one method per user gesture.

use chrono::NaiveDate;
use log::{info, warn};

use crate::applicator::{apply_style, reset_style, StyleOutcome};
use crate::config::EditorConfig;
use crate::date::{format_date, parse_date, CalendarDay, CalendarMonth};
use crate::display::{DisplayTree, Generation, TextRange};
use crate::error::{PosterError, PosterResult};
use crate::export::{export_filename, export_poster, DocumentWriter, ExportFormat, ExportedFile, RasterTarget, Rasterizer};
use crate::html::{poster_html, HtmlMode, PosterView};
use crate::poster_file::PosterFile;
use crate::render::{render_all, RenderOptions};
use crate::selection::{SelectionCapture, SelectionTracker, ToolbarState};
use crate::store::{MarkupField, PatternField, PatternId, PatternStore};
use crate::style::{FontScale, StyleProperty, TextColor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the user, e.g. a toast or an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Open date picker
#[derive(Debug, Clone, PartialEq, Eq)]
struct DatePicker {
    pattern_id: PatternId,
    month: CalendarMonth,
}

#[derive(Debug, Clone)]
pub struct PosterEditor {
    config: EditorConfig,
    title: String,
    store: PatternStore,
    tree: DisplayTree,
    tracker: SelectionTracker,
    examples_visible: bool,
    editing: Option<(PatternId, MarkupField)>,
    font_scale: FontScale,
    save_modal_open: bool,
    busy: bool,
    picker: Option<DatePicker>,
    notices: Vec<Notice>,
}

impl PosterEditor {
    /// An empty editor. Call [`PosterEditor::start`] to get the first card.
    pub fn new(config: EditorConfig) -> Self {
        let mut editor = PosterEditor {
            title: config.title.clone(),
            tracker: SelectionTracker::new(config.preview_chars),
            examples_visible: config.examples_visible,
            store: PatternStore::new(),
            tree: DisplayTree::new(),
            editing: None,
            font_scale: FontScale::DEFAULT,
            save_modal_open: false,
            busy: false,
            picker: None,
            notices: Vec::new(),
            config,
        };
        editor.render();
        editor
    }

    /// Render and add the first pattern, dated `today`.
    pub fn start(&mut self, today: NaiveDate) -> PosterResult<PatternId> {
        self.add_pattern(today)
    }

    pub fn from_poster_file(config: EditorConfig, file: &PosterFile) -> PosterResult<Self> {
        let mut editor = PosterEditor::new(config);
        editor.store = file.to_store()?;
        if let Some(title) = &file.title {
            editor.title = title.clone();
        }
        if let Some(visible) = file.examples_visible {
            editor.examples_visible = visible;
        }
        if let Some(scale) = file.font_scale {
            editor.font_scale = scale;
        }
        editor.render();
        info!("loaded poster with {} patterns", editor.store.len());
        Ok(editor)
    }

    pub fn to_poster_file(&self) -> PosterFile {
        PosterFile {
            title: Some(self.title.clone()),
            examples_visible: Some(self.examples_visible),
            font_scale: Some(self.font_scale),
            patterns: PosterFile::entries_from(&self.store),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    pub fn tree(&self) -> &DisplayTree {
        &self.tree
    }

    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    pub fn editing(&self) -> Option<(PatternId, MarkupField)> {
        self.editing
    }

    pub fn examples_visible(&self) -> bool {
        self.examples_visible
    }

    pub fn font_scale(&self) -> FontScale {
        self.font_scale
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_save_modal_open(&self) -> bool {
        self.save_modal_open
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }

    /// Surface an error to the user and hand it back.
    fn report<T>(&mut self, result: PosterResult<T>) -> PosterResult<T> {
        if let Err(e) = &result {
            warn!("{}", e);
            self.notify(NoticeLevel::Warning, e.to_string());
        }
        result
    }

    /// Rebuild the display tree. Outstanding selections become stale.
    pub fn render(&mut self) -> Generation {
        let options = RenderOptions {
            examples_visible: self.examples_visible,
            editing: self.editing,
            pattern_placeholder: &self.config.pattern_placeholder,
            examples_placeholder: &self.config.examples_placeholder,
        };
        render_all(&self.store, &mut self.tree, &options)
    }

    // ─── Patterns ────────────────────────────────────────────────────────────

    /// Add a card dated `today` and open its pattern input.
    pub fn add_pattern(&mut self, today: NaiveDate) -> PosterResult<PatternId> {
        let result = self.store.add(today);
        let id = self.report(result)?;
        self.editing = Some((id, MarkupField::Pattern));
        self.render();
        Ok(id)
    }

    pub fn delete_pattern(&mut self, id: PatternId) -> PosterResult<()> {
        let result = self.store.remove(id);
        self.report(result)?;
        if self.editing.map(|(e, _)| e) == Some(id) {
            self.editing = None;
        }
        if self.picker.as_ref().map(|p| p.pattern_id) == Some(id) {
            self.picker = None;
        }
        self.render();
        Ok(())
    }

    /// Remove every card. The caller is expected to have confirmed with the user.
    pub fn clear_all(&mut self) -> PosterResult<usize> {
        let result = self.store.clear();
        let removed = self.report(result)?;
        self.editing = None;
        self.picker = None;
        self.tracker.clear();
        self.render();
        self.notify(NoticeLevel::Info, "All patterns cleared");
        Ok(removed)
    }

    // ─── Text editing ────────────────────────────────────────────────────────

    pub fn edit_pattern(&mut self, id: PatternId) -> PosterResult<()> {
        self.begin_edit(id, MarkupField::Pattern)
    }

    pub fn edit_examples(&mut self, id: PatternId) -> PosterResult<()> {
        self.begin_edit(id, MarkupField::Examples)
    }

    fn begin_edit(&mut self, id: PatternId, field: MarkupField) -> PosterResult<()> {
        if self.store.get(id).is_none() {
            return self.report(Err(PosterError::PatternNotFound { id }));
        }
        self.editing = Some((id, field));
        self.tracker.clear();
        self.render();
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        if self.editing.take().is_some() {
            self.render();
        }
    }

    pub fn save_pattern(&mut self, id: PatternId, text: &str) -> PosterResult<()> {
        self.save_text(id, PatternField::Pattern, text)
    }

    pub fn save_examples(&mut self, id: PatternId, text: &str) -> PosterResult<()> {
        self.save_text(id, PatternField::Examples, text)
    }

    fn save_text(&mut self, id: PatternId, field: PatternField, text: &str) -> PosterResult<()> {
        let result = self.store.update(id, field, text);
        self.report(result)?;
        self.editing = None;
        self.render();
        Ok(())
    }

    /// Save typed date input. Invalid input is refused and the old value kept.
    pub fn save_date(&mut self, id: PatternId, value: &str) -> PosterResult<()> {
        let result = self.store.update(id, PatternField::Date, value);
        self.report(result)?;
        self.render();
        Ok(())
    }

    // ─── Date picker ─────────────────────────────────────────────────────────

    /// Open the picker on the month of the card's date (or `today`'s month).
    pub fn open_date_picker(&mut self, id: PatternId, today: NaiveDate) -> PosterResult<Vec<CalendarDay>> {
        let record_date = match self.store.get(id) {
            Some(record) => record.date.clone(),
            None => return self.report(Err(PosterError::PatternNotFound { id })),
        };
        self.picker = Some(DatePicker {
            pattern_id: id,
            month: CalendarMonth::for_record_date(&record_date, today),
        });
        Ok(self.date_picker_grid(today).unwrap_or_default())
    }

    /// Title and grid of the open picker.
    pub fn date_picker_title(&self) -> Option<String> {
        self.picker.as_ref().map(|p| p.month.title())
    }

    pub fn date_picker_grid(&self, today: NaiveDate) -> Option<Vec<CalendarDay>> {
        let picker = self.picker.as_ref()?;
        let selected = self
            .store
            .get(picker.pattern_id)
            .and_then(|r| parse_date(&r.date));
        Some(picker.month.grid(today, selected))
    }

    /// Move the picker by whole months; negative goes back.
    pub fn navigate_date_picker(&mut self, direction: i32) {
        if let Some(picker) = &mut self.picker {
            picker.month = picker.month.navigate(direction);
        }
    }

    /// Write the picked day into the card and close the picker.
    pub fn pick_date(&mut self, date: NaiveDate) -> PosterResult<()> {
        let Some(picker) = self.picker.take() else {
            return Ok(());
        };
        let result = self
            .store
            .update(picker.pattern_id, PatternField::Date, &format_date(date));
        self.report(result)?;
        self.render();
        Ok(())
    }

    pub fn close_date_picker(&mut self) {
        self.picker = None;
    }

    // ─── Selection and styling ───────────────────────────────────────────────

    /// Feed a selection-change event. Returns whether it was captured.
    pub fn select(&mut self, range: Option<&TextRange>) -> bool {
        self.tracker.on_selection(&self.tree, range)
    }

    pub fn toolbar(&self) -> ToolbarState {
        self.tracker.toolbar(&self.tree)
    }

    pub fn apply_color(&mut self, color: TextColor) -> PosterResult<StyleOutcome> {
        self.apply(StyleProperty::Color(color))
    }

    pub fn apply_font_size(&mut self, scale: f64) -> PosterResult<StyleOutcome> {
        let result = FontScale::new(scale);
        let scale = self.report(result)?;
        self.apply(StyleProperty::FontScale(scale))
    }

    pub fn apply_bold(&mut self) -> PosterResult<StyleOutcome> {
        self.apply(StyleProperty::Bold)
    }

    /// Apply a property to the captured selection. The capture is consumed
    /// whether or not the action succeeds.
    pub fn apply(&mut self, property: StyleProperty) -> PosterResult<StyleOutcome> {
        let capture = self.take_capture()?;
        let result = apply_style(&mut self.store, &mut self.tree, &capture, property);
        self.report(result)
    }

    pub fn reset_style(&mut self) -> PosterResult<StyleOutcome> {
        let capture = self.take_capture()?;
        let result = reset_style(&mut self.store, &mut self.tree, &capture);
        self.report(result)
    }

    /// With no capture, styling text in an input (or while an input is open)
    /// is refused as unsupported rather than as a missing selection.
    fn take_capture(&mut self) -> PosterResult<SelectionCapture> {
        let in_input = self.editing.is_some() || self.tracker.in_input();
        let result = match self.tracker.take() {
            Some(capture) => Ok(capture),
            None if in_input => Err(PosterError::UnsupportedTarget),
            None => Err(PosterError::NoSelection),
        };
        self.tracker.clear();
        self.report(result)
    }

    // ─── View ────────────────────────────────────────────────────────────────

    /// Show or hide every examples section. Returns the new state.
    pub fn toggle_examples(&mut self) -> bool {
        self.examples_visible = !self.examples_visible;
        self.render();
        self.examples_visible
    }

    /// Step the global font scale by `steps` configured increments.
    pub fn step_font_scale(&mut self, steps: i32) -> FontScale {
        self.font_scale = self.font_scale.step(self.config.font_step * steps as f64);
        self.font_scale
    }

    pub fn set_font_scale(&mut self, value: f64) -> PosterResult<FontScale> {
        let result = FontScale::new(value);
        self.font_scale = self.report(result)?;
        Ok(self.font_scale)
    }

    pub fn html(&self, mode: HtmlMode, today: NaiveDate) -> PosterResult<String> {
        poster_html(
            &self.tree,
            &PosterView {
                title: &self.title,
                mode,
                font_scale: self.font_scale,
                today,
            },
        )
    }

    // ─── Export ──────────────────────────────────────────────────────────────

    /// Open the save dialog. Any selection is dropped.
    pub fn open_save_modal(&mut self) {
        self.tracker.clear();
        self.save_modal_open = true;
    }

    pub fn close_save_modal(&mut self) {
        self.save_modal_open = false;
    }

    /// Export the poster. Editing chrome is left out of the captured HTML,
    /// and the busy flag is held for the duration.
    pub fn export(
        &mut self,
        format: ExportFormat,
        today: NaiveDate,
        rasterizer: &dyn Rasterizer,
        writer: &dyn DocumentWriter,
    ) -> PosterResult<ExportedFile> {
        self.close_save_modal();
        self.busy = true;

        let filename = export_filename(&self.config.export.filename_prefix, format, today);
        let target = RasterTarget::a4(self.config.export.scale);
        let result = self
            .html(HtmlMode::Export, today)
            .and_then(|html| export_poster(&html, format, filename, &target, rasterizer, writer));

        self.busy = false;
        match &result {
            Ok(file) => self.notify(NoticeLevel::Info, format!("{} saved as {}", format, file.filename)),
            Err(e) => self.notify(NoticeLevel::Error, format!("{} export failed. Please try again. ({})", format, e)),
        }
        result
    }
}
