// Sequential blank-image replacement
//
// `images update` replaces one image per call, so N occurrences take N calls, each
// reading the previous call's output. Intermediate files live in a scratch directory
// next to the output and disappear with it; only the last call writes `output`.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::debug;

use crate::error::{PdfEditError, Result};
use crate::listing::Occurrence;
use crate::tool::PdfTool;

const BLANK_IMAGE_NAME: &str = "blank.png";

/// Replace every occurrence in `occurrences` with a transparent 1×1 image.
pub fn replace_occurrences(
    tool: &PdfTool,
    input: &Path,
    output: &Path,
    occurrences: &[Occurrence],
) -> Result<()> {
    if occurrences.is_empty() {
        return Err(PdfEditError::no_match("no image occurrences to replace"));
    }

    let selectors = occurrences
        .iter()
        .map(|occ| {
            occ.selector().ok_or_else(|| {
                PdfEditError::validation(format!(
                    "cannot identify image on page {} for removal: no object reference or id",
                    occ.page
                ))
            })
        })
        .collect::<Result<Vec<String>>>()?;

    let scratch = tempfile::Builder::new()
        .prefix(".pdf_editor_chain_")
        .tempdir_in(parent_dir(output))?;
    let blank = write_blank_image(scratch.path())?;

    let last = selectors.len() - 1;
    let mut current = input.to_path_buf();
    for (step, selector) in selectors.iter().enumerate() {
        let target = if step == last {
            output.to_path_buf()
        } else {
            scratch.path().join(format!("step_{step:04}.pdf"))
        };
        debug!(step, selector = %selector, target = %target.display(), "replacing image");
        tool.update_image(&current, &blank, &target, selector)?;
        current = target;
    }

    Ok(())
}

/// Fully transparent 1×1 PNG.
pub fn write_blank_image(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(BLANK_IMAGE_NAME);
    RgbaImage::new(1, 1).save(&path)?;
    Ok(path)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
