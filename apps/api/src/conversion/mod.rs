//! PDF → preview image conversion.

use async_trait::async_trait;
use thiserror::Error;

use crate::storage::FilePayload;

pub mod pdfium;

pub use pdfium::PdfiumConverter;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("PDFium unavailable: {0}")]
    Library(String),

    #[error("PDF rendering failed: {0}")]
    Rendering(String),

    #[error("Image encoding failed: {0}")]
    Encoding(String),

    #[error("Conversion task failed: {0}")]
    Task(String),
}

/// Renders the first page of a PDF into an image file.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert_pdf_to_image(&self, file: &FilePayload) -> Result<FilePayload, ConversionError>;
}
