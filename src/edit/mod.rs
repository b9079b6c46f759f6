// Whole-document edits: resave and page removal

pub mod pages;

use std::path::Path;

use tracing::info;

use crate::config::settings::Settings;
use crate::error::{PdfEditError, Result};
use crate::tool::{PdfTool, info::page_count};

pub use pages::{parse_page_specifier, validate_page_numbers};

/// Rewrite `input` to `output` through the toolkit's `optimize` command.
pub fn resave(settings: &Settings, input: &Path, output: &Path) -> Result<()> {
    let tool = PdfTool::new(settings);
    tool.optimize(input, output)?;
    ensure_output(output, "optimize")?;
    info!(input = %input.display(), output = %output.display(), "document resaved");
    Ok(())
}

/// Remove the pages named by `spec` (e.g. `"1,3,5-7"`) and write the result to `output`.
///
/// Returns the removed page numbers, ascending. Pages outside the document, or a
/// request that would remove every page, are rejected before the toolkit runs.
pub fn remove_pages(settings: &Settings, input: &Path, output: &Path, spec: &str) -> Result<Vec<u32>> {
    let pages = parse_page_specifier(spec)?;
    let tool = PdfTool::new(settings);
    let total = page_count(&tool, input)?;
    validate_page_numbers(&pages, total)?;
    if pages.len() >= total as usize {
        return Err(PdfEditError::validation(format!(
            "cannot remove all {total} pages of the document"
        )));
    }

    let list = pages
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    tool.remove_pages(input, output, &list)?;
    ensure_output(output, "pages remove")?;

    info!(removed = %list, output = %output.display(), "pages removed");
    Ok(pages)
}

fn ensure_output(output: &Path, command: &str) -> Result<()> {
    if output.exists() {
        Ok(())
    } else {
        Err(PdfEditError::ExternalToolFailure {
            command: command.to_string(),
            status: "no output file produced".to_string(),
            output: String::new(),
        })
    }
}
