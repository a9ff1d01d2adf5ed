//! Poster export: file naming, raster targets and the seams a host plugs a
//! renderer and document writer into.

use chrono::NaiveDate;
use image::{ImageFormat, Rgba, RgbaImage};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

use crate::date::compact_date;
use crate::error::{PosterError, PosterResult};

/// A4 at 96 dpi.
pub const A4_WIDTH_PX: u32 = 794;
pub const A4_HEIGHT_PX: u32 = 1123;
pub const DEFAULT_EXPORT_SCALE: u32 = 3;
pub const DEFAULT_FILENAME_PREFIX: &str = "ZENITH_English_Weekly_Pattern";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Png,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Pdf => f.write_str("PDF"),
            ExportFormat::Png => f.write_str("PNG"),
        }
    }
}

/// `<prefix>_YYYYMMDD.<ext>`
pub fn export_filename(prefix: &str, format: ExportFormat, date: NaiveDate) -> String {
    format!("{}_{}.{}", prefix, compact_date(date), format.extension())
}

/// Fixed-size capture area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterTarget {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    pub background: [u8; 4],
}

impl RasterTarget {
    /// One A4 page with an opaque white background.
    pub fn a4(scale: u32) -> Self {
        RasterTarget {
            width: A4_WIDTH_PX,
            height: A4_HEIGHT_PX,
            scale,
            background: [0xff, 0xff, 0xff, 0xff],
        }
    }

    pub fn pixel_width(&self) -> u32 {
        self.width * self.scale
    }

    pub fn pixel_height(&self) -> u32 {
        self.height * self.scale
    }
}

impl Default for RasterTarget {
    fn default() -> Self {
        RasterTarget::a4(DEFAULT_EXPORT_SCALE)
    }
}

/// Packed RGBA pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> PosterResult<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(PosterError::Export {
                format: "bitmap".to_string(),
                reason: format!("expected {} bytes for {}x{}, got {}", expected, width, height, rgba.len()),
            });
        }
        Ok(Bitmap { width, height, rgba })
    }

    /// A bitmap filled with one color.
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color.iter().copied().cycle().take(width as usize * height as usize * 4).collect();
        Bitmap { width, height, rgba }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Composite onto an opaque background so the output has no transparency.
    fn flatten(&self, background: [u8; 4]) -> RgbaImage {
        let mut img = RgbaImage::new(self.width, self.height);
        for (pixel, chunk) in img.pixels_mut().zip(self.rgba.chunks_exact(4)) {
            let alpha = chunk[3] as u32;
            let blend = |fg: u8, bg: u8| ((fg as u32 * alpha + bg as u32 * (255 - alpha)) / 255) as u8;
            *pixel = Rgba([
                blend(chunk[0], background[0]),
                blend(chunk[1], background[1]),
                blend(chunk[2], background[2]),
                0xff,
            ]);
        }
        img
    }
}

/// Turns export-mode poster HTML into pixels.
pub trait Rasterizer {
    fn rasterize(&self, html: &str, target: &RasterTarget) -> PosterResult<Bitmap>;
}

/// Encodes a rasterized poster as a downloadable document.
pub trait DocumentWriter {
    fn write(&self, bitmap: &Bitmap, format: ExportFormat) -> PosterResult<Vec<u8>>;
}

/// PNG encoder backed by the `image` crate. Does not produce PDFs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngWriter;

impl PngWriter {
    pub fn new() -> Self {
        PngWriter
    }
}

impl DocumentWriter for PngWriter {
    fn write(&self, bitmap: &Bitmap, format: ExportFormat) -> PosterResult<Vec<u8>> {
        if format != ExportFormat::Png {
            return Err(PosterError::Export {
                format: format.to_string(),
                reason: "the PNG writer only encodes PNG".to_string(),
            });
        }
        let img = bitmap.flatten(RasterTarget::default().background);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// A finished export, ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

/// Rasterize `html` into `target` and encode it.
pub fn export_poster(
    html: &str,
    format: ExportFormat,
    filename: String,
    target: &RasterTarget,
    rasterizer: &dyn Rasterizer,
    writer: &dyn DocumentWriter,
) -> PosterResult<ExportedFile> {
    let result = rasterizer.rasterize(html, target).and_then(|bitmap| {
        if bitmap.width() != target.pixel_width() || bitmap.height() != target.pixel_height() {
            return Err(PosterError::Export {
                format: format.to_string(),
                reason: format!(
                    "rasterizer produced {}x{}, expected {}x{}",
                    bitmap.width(),
                    bitmap.height(),
                    target.pixel_width(),
                    target.pixel_height()
                ),
            });
        }
        writer.write(&bitmap, format)
    });

    match result {
        Ok(bytes) => {
            info!("exported {} ({} bytes)", filename, bytes.len());
            Ok(ExportedFile {
                filename,
                format,
                bytes,
            })
        }
        Err(e) => {
            error!("{} export failed: {}", format, e);
            Err(match e {
                PosterError::Export { .. } => e,
                other => PosterError::Export {
                    format: format.to_string(),
                    reason: other.to_string(),
                },
            })
        }
    }
}
