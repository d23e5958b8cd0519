use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to read page count: {0}")]
    PageCount(String),
    #[error("failed to extract text from page {page}: {message}")]
    PageError { page: usize, message: String },
}

/// Trait for PDF parsing backends.
///
/// Implementors own the parsing library; the page loop, text assembly and
/// progress reporting live in [`crate::extract`].
pub trait PdfBackend: Send + Sync {
    /// Open a document held entirely in memory.
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, BackendError>;
}

/// An opened document. Only ever used from the thread that opened it.
pub trait PdfDocument {
    fn page_count(&self) -> Result<usize, BackendError>;

    /// Text fragments of a page in reading order. `page_number` is 1-based.
    fn page_fragments(&self, page_number: usize) -> Result<Vec<String>, BackendError>;
}
