// Preview image extraction for a single candidate

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::analysis::UnwantedElementCandidate;
use crate::config::settings::Settings;
use crate::error::{PdfEditError, Result};
use crate::tool::PdfTool;

/// Page sampled for every preview, whatever page the candidate's representative is on.
pub const PREVIEW_PAGE: u32 = 1;

const MAX_PREVIEW_ID_LEN: usize = 50;
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Extract the candidate's image and copy it to `output_dir/preview_<id>.<ext>`.
///
/// The extracted file whose name contains the candidate's image id is preferred; without
/// one the first extracted image (by name) is used.
pub fn extract_preview(
    settings: &Settings,
    document: &Path,
    candidate: &UnwantedElementCandidate,
    output_dir: &Path,
) -> Result<PathBuf> {
    let image_id = &candidate.detail.representative().image_id;
    if image_id.is_empty() {
        return Err(PdfEditError::validation(format!(
            "candidate {} has no image id to preview",
            candidate.id
        )));
    }

    fs::create_dir_all(output_dir)?;
    let scratch = tempfile::Builder::new()
        .prefix(".extract_")
        .tempdir_in(output_dir)?;

    let tool = PdfTool::new(settings);
    tool.extract_images(document, PREVIEW_PAGE, scratch.path())?;

    let files = image_files(scratch.path())?;
    let chosen = files
        .iter()
        .find(|p| {
            p.file_name()
                .is_some_and(|n| n.to_string_lossy().contains(image_id.as_str()))
        })
        .or_else(|| files.first())
        .ok_or_else(|| {
            PdfEditError::no_match(format!(
                "no image file extracted from page {PREVIEW_PAGE} for candidate {}",
                candidate.id
            ))
        })?;

    let extension = chosen
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| "png".to_string());
    let dest = output_dir.join(format!("preview_{}.{extension}", sanitize_id(&candidate.id)));
    fs::copy(chosen, &dest)?;

    info!(candidate = %candidate.id, preview = %dest.display(), "preview extracted");
    Ok(dest)
}

/// Image files directly inside `dir`, sorted by name.
fn image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_image = path.is_file()
            && path.extension().is_some_and(|e| {
                let ext = e.to_string_lossy().to_lowercase();
                IMAGE_EXTENSIONS.contains(&ext.as_str())
            });
        if is_image {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// File-name-safe form of a candidate id: path and drive separators and spaces become
/// `_`, cut to 50 characters.
pub fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' => '_',
            other => other,
        })
        .take(MAX_PREVIEW_ID_LEN)
        .collect()
}
