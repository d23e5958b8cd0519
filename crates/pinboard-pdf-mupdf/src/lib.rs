use mupdf::{Document, TextPageFlags};

use pinboard_core::{BackendError, PdfBackend, PdfDocument};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so that the tree and settings code paths do not
/// transitively depend on it.
///
/// Each text line of MuPDF's structured text is one fragment. Header and
/// footer bands can optionally be excluded, which keeps running page headers
/// and page numbers out of the extracted text.
#[derive(Debug, Clone, Default)]
pub struct MupdfBackend {
    /// Fraction of page height from bottom to exclude as footer (0.0–1.0).
    /// `None` disables footer exclusion.
    footer_exclusion_ratio: Option<f32>,
    /// Fraction of page height from top to exclude as header (0.0–1.0).
    /// `None` disables header exclusion.
    header_exclusion_ratio: Option<f32>,
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the footer exclusion ratio. Pass `0.0` to disable.
    pub fn with_footer_exclusion(mut self, ratio: f32) -> Self {
        self.footer_exclusion_ratio = if ratio > 0.0 { Some(ratio) } else { None };
        self
    }

    /// Set the header exclusion ratio. Pass `0.0` to disable.
    pub fn with_header_exclusion(mut self, ratio: f32) -> Self {
        self.header_exclusion_ratio = if ratio > 0.0 { Some(ratio) } else { None };
        self
    }
}

impl PdfBackend for MupdfBackend {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, BackendError> {
        let document = Document::from_bytes(bytes, "application/pdf")
            .map_err(|e| BackendError::OpenError(e.to_string()))?;
        Ok(Box::new(MupdfDocument {
            document,
            footer_exclusion_ratio: self.footer_exclusion_ratio,
            header_exclusion_ratio: self.header_exclusion_ratio,
        }))
    }
}

struct MupdfDocument {
    document: Document,
    footer_exclusion_ratio: Option<f32>,
    header_exclusion_ratio: Option<f32>,
}

fn page_error(page: usize, e: mupdf::Error) -> BackendError {
    BackendError::PageError {
        page,
        message: e.to_string(),
    }
}

impl PdfDocument for MupdfDocument {
    fn page_count(&self) -> Result<usize, BackendError> {
        let count = self
            .document
            .page_count()
            .map_err(|e| BackendError::PageCount(e.to_string()))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn page_fragments(&self, page_number: usize) -> Result<Vec<String>, BackendError> {
        let index = page_number
            .checked_sub(1)
            .and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| BackendError::PageError {
                page: page_number,
                message: "page number out of range".into(),
            })?;

        let page = self
            .document
            .load_page(index)
            .map_err(|e| page_error(page_number, e))?;
        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| page_error(page_number, e))?;

        // Page bounds for header/footer exclusion
        let page_bounds = page.bounds().map_err(|e| page_error(page_number, e))?;
        let page_height = page_bounds.y1 - page_bounds.y0;

        let header_threshold = self
            .header_exclusion_ratio
            .map(|r| page_bounds.y0 + page_height * r);
        let footer_threshold = self
            .footer_exclusion_ratio
            .map(|r| page_bounds.y1 - page_height * r);

        let mut fragments = Vec::new();
        for block in text_page.blocks() {
            let block_bounds = block.bounds();

            // Skip blocks entirely within the header region
            if let Some(threshold) = header_threshold
                && block_bounds.y1 <= threshold
            {
                continue;
            }

            // Skip blocks whose top edge is in the footer region
            if let Some(threshold) = footer_threshold
                && block_bounds.y0 >= threshold
            {
                continue;
            }

            for line in block.lines() {
                let line_text: String = line
                    .chars()
                    .map(|c| c.char().unwrap_or('\u{FFFD}'))
                    .collect();
                let line_text = line_text.trim();
                if !line_text.is_empty() {
                    fragments.push(line_text.to_string());
                }
            }
        }

        Ok(fragments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_to_open() {
        let result = MupdfBackend::new().open(b"definitely not a pdf");
        assert!(matches!(result, Err(BackendError::OpenError(_))));
    }

    #[test]
    fn zero_ratio_disables_exclusion() {
        let backend = MupdfBackend::new()
            .with_header_exclusion(0.04)
            .with_footer_exclusion(0.0);
        assert_eq!(backend.header_exclusion_ratio, Some(0.04));
        assert_eq!(backend.footer_exclusion_ratio, None);
    }
}
