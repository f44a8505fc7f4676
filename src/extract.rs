use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::{Error, Result};

/// Plain text extracted from one page of a source document.
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub text: String,
    /// 1-based page number within the source document.
    pub page: usize,
    pub total_pages: usize,
}

/// Extract the text of a single file, page by page.
///
/// PDF files go through `pdf-extract`; anything else is read as UTF-8 and
/// treated as a single page. Pages that contain no visible text are dropped.
pub fn extract_pages(path: &Path) -> Result<Vec<ExtractedPage>> {
    let name = file_base_name(path);

    let raw_pages = if is_pdf(path) {
        pdf_extract::extract_text_by_pages(path).map_err(|e| {
            Error::Extract {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?
    } else {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Extract {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?;
        vec![text]
    };

    let total_pages = raw_pages.len();
    let pages: Vec<ExtractedPage> = raw_pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| ExtractedPage {
            text,
            page: i + 1,
            total_pages,
        })
        .collect();

    if pages.is_empty() {
        return Err(Error::Extract {
            name,
            reason: "no text content found".into(),
        });
    }

    Ok(pages)
}

/// Extract a batch of files in parallel.
///
/// Returns `(base_name, pages)` per file in input order. Any single
/// extraction failure fails the whole batch; batch-level error policy is
/// the caller's concern.
pub fn extract_batch(files: &[PathBuf]) -> Result<Vec<(String, Vec<ExtractedPage>)>> {
    files
        .par_iter()
        .map(|path| Ok((file_base_name(path), extract_pages(path)?)))
        .collect()
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn file_base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
