//! MuPDF-backed rendering engine

use log::debug;
use mupdf::{Colorspace, Document, Matrix, Pixmap};

use super::engine::{CancellationToken, PdfDocument, PdfEngine};
use super::source::DocumentSource;
use super::types::{Bitmap, PageSize};
use crate::error::EngineError;

const PDF_MAGIC: &str = "application/pdf";

/// Opens documents from local paths, `file://` URLs or data URI bytes
#[derive(Clone, Copy, Debug, Default)]
pub struct MupdfEngine;

impl PdfEngine for MupdfEngine {
    type Document = MupdfDocument;

    fn open(&self, source: &DocumentSource) -> Result<MupdfDocument, EngineError> {
        let doc = match source {
            DocumentSource::Url(url) => Document::open(local_path(url)?)?,
            DocumentSource::Data(bytes) => Document::from_bytes(bytes, PDF_MAGIC)?,
        };
        let page_count = usize::try_from(doc.page_count()?).unwrap_or(0);
        Ok(MupdfDocument { doc, page_count })
    }

    fn configure_worker(&self, worker_url: &str) {
        debug!("MuPDF renders in-process; ignoring worker URL {worker_url}");
    }
}

fn local_path(url: &str) -> Result<&str, EngineError> {
    if let Some(path) = url.strip_prefix("file://") {
        return Ok(path);
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return Err(EngineError::generic(format!(
            "remote documents are not supported by the MuPDF engine: {url}"
        )));
    }
    Ok(url)
}

pub struct MupdfDocument {
    doc: Document,
    page_count: usize,
}

impl PdfDocument for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_size(&self, index: usize) -> Result<PageSize, EngineError> {
        let page = self.doc.load_page(index as i32)?;
        let bounds = page.bounds()?;
        Ok(PageSize::new(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
    }

    fn render(
        &self,
        index: usize,
        scale: f32,
        cancel: &CancellationToken,
    ) -> Result<Bitmap, EngineError> {
        cancel.check()?;
        let page = self.doc.load_page(index as i32)?;

        cancel.check()?;
        let rgb = Colorspace::device_rgb();
        let pixmap = page.to_pixmap(&Matrix::new_scale(scale, scale), &rgb, false, false)?;

        cancel.check()?;
        Ok(Bitmap {
            pixels: pixmap_to_rgb(&pixmap)?,
            width_px: pixmap.width(),
            height_px: pixmap.height(),
        })
    }
}

fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<Vec<u8>, EngineError> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(EngineError::generic(format!(
            "Unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(EngineError::generic("Pixmap buffer size mismatch"));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row = &samples[y * stride..y * stride + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_urls_become_paths() {
        assert_eq!(local_path("file:///tmp/a.pdf").unwrap(), "/tmp/a.pdf");
        assert_eq!(local_path("docs/a.pdf").unwrap(), "docs/a.pdf");
        assert!(local_path("https://example.com/a.pdf").is_err());
    }

    #[test]
    fn missing_file_fails_to_open() {
        let source = DocumentSource::Url("/definitely/not/here.pdf".to_string());
        assert!(MupdfEngine.open(&source).is_err());
    }
}
