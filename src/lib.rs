//! # ZENITH Pattern Poster
//!
//! Core of a single-page poster editor for weekly English sentence patterns.
//! Up to three cards, each with a pattern line, example sentences and a date,
//! laid out on an A4 poster and exported as PDF or PNG.
//!
//! ## Features
//! - Bracket placeholders (`[]`, `[ ]`, `[   ]`) rendered as sized blank boxes
//! - Sanitizing of all user text before it is rendered
//! - Selection-driven span styling (color, font size, bold) with reset
//! - Selections tied to a tree generation so stale ones are refused
//! - Month-grid date picker and `YY.MM.DD (Day)` dates
//! - HTML output for the editor and a chrome-free A4 export mode
//!
//! ## Example
//! ```ignore
//! use zenith_poster::{EditorConfig, HtmlMode, PosterEditor, RegionKind};
//!
//! let today = chrono::Local::now().date_naive();
//! let mut editor = PosterEditor::new(EditorConfig::default());
//! let id = editor.start(today)?;
//! editor.save_pattern(id, "I used to [ ] when I was young")?;
//!
//! let region = editor.tree().region(id, RegionKind::PatternDisplay).unwrap();
//! let range = editor.tree().locate(region, "used to").unwrap();
//! editor.select(Some(&range));
//! editor.apply_bold()?;
//!
//! let html = editor.html(HtmlMode::Editor, today)?;
//! ```

pub mod applicator;
pub mod blank_box;
pub mod config;
pub mod date;
pub mod display;
pub mod editor;
pub mod error;
pub mod export;
pub mod html;
pub mod markup;
pub mod poster_file;
pub mod render;
pub mod sanitize;
pub mod selection;
pub mod store;
pub mod style;

// --- Core types ---
pub use config::{EditorConfig, ExportConfig};
pub use display::{DisplayTree, Enclosing, Generation, NodeId, NodeKind, RegionKind, TextPoint, TextRange};
pub use editor::{Notice, NoticeLevel, PosterEditor};
pub use error::{PosterError, PosterResult};
pub use poster_file::{PatternEntry, PosterFile};
pub use selection::{SelectionCapture, SelectionTracker, ToolbarState};
pub use store::{MarkupField, PatternField, PatternId, PatternRecord, PatternStore, MAX_PATTERNS};
pub use style::{FontScale, SpanStyle, StyleProperty, TextColor};

// --- Operations ---
pub use applicator::{apply_style, reset_style, StyleAction, StyleOutcome};
pub use blank_box::render_blank_boxes;
pub use date::{format_date, validate_date};
pub use export::{
    export_filename, Bitmap, DocumentWriter, ExportFormat, ExportedFile, PngWriter, RasterTarget, Rasterizer,
};
pub use html::{poster_html, HtmlMode, PosterView};
pub use render::{render_all, RenderOptions};
pub use sanitize::sanitize;
