//! First-page PDF rendering via Google PDFium.
//!
//! `Pdfium` is `!Send`, so each conversion loads the library inside a blocking
//! task. The OS caches the `dlopen`, which keeps repeat loads cheap.

use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use image::ImageFormat;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use crate::conversion::{ConversionError, DocumentConverter};
use crate::storage::FilePayload;

/// Upper bound for either side of the rendered image.
const MAX_DIMENSION_PX: u32 = 4096;

pub struct PdfiumConverter {
    library_path: Option<String>,
    scale: f32,
}

impl PdfiumConverter {
    /// Verifies up front that the PDFium library can be loaded.
    ///
    /// Discovery order: the configured path, the executable's directory,
    /// then the system library search path.
    pub fn new(library_path: Option<String>, scale: f32) -> Result<Self, ConversionError> {
        let _ = load_pdfium(library_path.as_deref())?;
        Ok(Self {
            library_path,
            scale,
        })
    }
}

#[async_trait]
impl DocumentConverter for PdfiumConverter {
    async fn convert_pdf_to_image(&self, file: &FilePayload) -> Result<FilePayload, ConversionError> {
        let pdf_bytes = file.bytes.clone();
        let library_path = self.library_path.clone();
        let scale = self.scale;

        let png = tokio::task::spawn_blocking(move || {
            render_first_page(library_path.as_deref(), &pdf_bytes, scale)
        })
        .await
        .map_err(|e| ConversionError::Task(e.to_string()))??;

        debug!(
            source = %file.name,
            png_size = png.len(),
            "Rendered first resume page to PNG"
        );

        Ok(FilePayload::new(
            format!("{}.png", file.stem()),
            "image/png",
            Bytes::from(png),
        ))
    }
}

fn load_pdfium(library_path: Option<&str>) -> Result<Pdfium, ConversionError> {
    if let Some(path) = library_path {
        let bindings = Pdfium::bind_to_library(path)
            .map_err(|e| ConversionError::Library(format!("failed to load {path}: {e}")))?;
        return Ok(Pdfium::new(bindings));
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
    {
        let lib_path =
            Pdfium::pdfium_platform_library_name_at_path(exe_dir.to_string_lossy().as_ref());
        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            debug!(dir = %exe_dir.display(), "Loaded PDFium next to the executable");
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| {
        ConversionError::Library(format!(
            "library not found; set PDFIUM_DYNAMIC_LIB_PATH or install PDFium: {e}"
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

fn render_first_page(
    library_path: Option<&str>,
    pdf_bytes: &[u8],
    scale: f32,
) -> Result<Vec<u8>, ConversionError> {
    let pdfium = load_pdfium(library_path)?;
    let document = pdfium
        .load_pdf_from_byte_slice(pdf_bytes, None)
        .map_err(|e| ConversionError::Rendering(format!("failed to load PDF: {e}")))?;

    let pages = document.pages();
    let page = pages
        .get(0)
        .map_err(|e| ConversionError::Rendering(format!("PDF has no first page: {e}")))?;

    let (width, height) = compute_render_dimensions(page.width().value, page.height().value, scale);
    if width == MAX_DIMENSION_PX || height == MAX_DIMENSION_PX {
        warn!(width, height, "Preview dimensions capped to {MAX_DIMENSION_PX}px");
    }

    let config = PdfRenderConfig::new()
        .set_target_width(width as i32)
        .set_maximum_height(height as i32);

    let bitmap = page
        .render_with_config(&config)
        .map_err(|e| ConversionError::Rendering(e.to_string()))?;

    let mut cursor = Cursor::new(Vec::new());
    bitmap
        .as_image()
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| ConversionError::Encoding(e.to_string()))?;

    Ok(cursor.into_inner())
}

/// Pixel size of a page of `width_points` × `height_points` rendered at `scale`
/// (1.0 = one pixel per PDF point). Both sides end up in `[1, MAX_DIMENSION_PX]`
/// with the aspect ratio preserved when capping.
fn compute_render_dimensions(width_points: f32, height_points: f32, scale: f32) -> (u32, u32) {
    let raw_w = (width_points * scale).max(1.0);
    let raw_h = (height_points * scale).max(1.0);

    let longest = raw_w.max(raw_h);
    if longest > MAX_DIMENSION_PX as f32 {
        let ratio = MAX_DIMENSION_PX as f32 / longest;
        let w = ((raw_w * ratio) as u32).clamp(1, MAX_DIMENSION_PX);
        let h = ((raw_h * ratio) as u32).clamp(1, MAX_DIMENSION_PX);
        (w, h)
    } else {
        (raw_w as u32, raw_h as u32)
    }
}
