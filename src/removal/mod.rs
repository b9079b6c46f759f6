// Element removal: toolkit watermark/stamp removal or selective image replacement

pub mod chain;
pub mod resolve;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{info, warn};

use crate::analysis::{DetectionParams, UnwantedElementsAnalysis, detect_candidates};
use crate::config::settings::Settings;
use crate::diagnostics::Diagnostics;
use crate::digest::document_digest;
use crate::error::{PdfEditError, Result};
use crate::listing::{Occurrence, parse_image_listing};
use crate::tool::{PdfTool, info::page_count};

pub use resolve::{Resolution, ResolutionHints, Strategy, plan_removals, resolve_candidate};

/// Phrase the toolkit prints when a document has no watermark objects.
pub const NO_WATERMARKS_FOUND: &str = "no watermarks found";
/// Phrase the toolkit prints when a document has no stamp objects.
pub const NO_STAMPS_FOUND: &str = "no stamps found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    /// Bulk removal through the toolkit's own watermark/stamp commands.
    Watermark,
    /// Selective replacement of the images behind chosen candidates.
    Image,
}

impl FromStr for ElementType {
    type Err = PdfEditError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "watermark" => Ok(ElementType::Watermark),
            "image" => Ok(ElementType::Image),
            other => Err(PdfEditError::validation(format!(
                "invalid element type '{other}' (expected 'watermark' or 'image')"
            ))),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ElementType::Watermark => "watermark",
            ElementType::Image => "image",
        })
    }
}

/// How the output file was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalMethod {
    ToolWatermark,
    ToolStamp,
    ImageReplacement,
}

#[derive(Debug, Clone)]
pub struct RemovalOutcome {
    pub output: PathBuf,
    pub method: RemovalMethod,
    /// Occurrences blanked, in replacement order. Empty for toolkit removal.
    pub replaced: Vec<Occurrence>,
    pub diagnostics: Diagnostics,
}

/// Remove the selected elements from `input` and write the result to `output`.
///
/// `prior` is an earlier analysis of the same document; it is reused only when its
/// digest matches `input`, otherwise candidates are recomputed from a fresh listing.
pub fn resolve_and_remove(
    settings: &Settings,
    input: &Path,
    output: &Path,
    element_type: ElementType,
    selected_ids: &[String],
    prior: Option<&UnwantedElementsAnalysis>,
) -> Result<RemovalOutcome> {
    let tool = PdfTool::new(settings);

    if element_type == ElementType::Watermark {
        let method = remove_watermarks(&tool, input, output)?;
        return Ok(RemovalOutcome {
            output: output.to_path_buf(),
            method,
            replaced: Vec::new(),
            diagnostics: Diagnostics::new(),
        });
    }

    let ids: Vec<String> = selected_ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    if ids.is_empty() {
        return Err(PdfEditError::validation(
            "image removal requires at least one candidate id",
        ));
    }

    let mut diags = Diagnostics::new();
    let listing_text = tool.list_images(input)?;
    let listing = parse_image_listing(&listing_text, &mut diags);
    let table = listing.occurrence_table();

    let digest = document_digest(input)?;
    let candidates = match prior {
        Some(analysis) if analysis.matches_document(&digest, &mut diags) => {
            analysis.image_candidates.clone()
        }
        _ => {
            let total_pages = page_count(&tool, input)?;
            detect_candidates(
                &listing.records,
                total_pages,
                &DetectionParams::from(settings),
                &mut diags,
            )
        }
    };

    let plan = plan_removals(&candidates, &ids, &table, &mut diags);
    if plan.is_empty() {
        return Err(PdfEditError::no_match(format!(
            "no images found for the selected candidates: {}",
            ids.join(", ")
        )));
    }

    chain::replace_occurrences(&tool, input, output, &plan)?;
    info!(
        replaced = plan.len(),
        output = %output.display(),
        "images replaced"
    );

    Ok(RemovalOutcome {
        output: output.to_path_buf(),
        method: RemovalMethod::ImageReplacement,
        replaced: plan,
        diagnostics: diags,
    })
}

/// `watermark remove`, then `stamp remove` when the toolkit finds no watermarks.
///
/// Both reporting nothing found means the images are ordinary page content; that is
/// [`PdfEditError::UnsupportedRemoval`].
pub fn remove_watermarks(tool: &PdfTool, input: &Path, output: &Path) -> Result<RemovalMethod> {
    match tool.remove_watermarks(input, output) {
        Ok(_) => {
            info!(output = %output.display(), "watermarks removed");
            Ok(RemovalMethod::ToolWatermark)
        }
        Err(e) if e.output_mentions(NO_WATERMARKS_FOUND) || e.output_mentions(NO_STAMPS_FOUND) => {
            warn!("no watermark objects found, trying stamp removal");
            match tool.remove_stamps(input, output) {
                Ok(_) => {
                    info!(output = %output.display(), "stamps removed");
                    Ok(RemovalMethod::ToolStamp)
                }
                Err(e) if e.output_mentions(NO_STAMPS_FOUND) => {
                    Err(PdfEditError::unsupported_removal(
                        "the document has no watermark or stamp objects; repeated images are \
                         ordinary page content and must be removed with --type image",
                    ))
                }
                Err(e) => Err(e),
            }
        }
        Err(e) => Err(e),
    }
}
