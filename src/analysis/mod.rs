// Document analysis: page count, image listing, detection and scoring

pub mod candidate;
pub mod detect;
pub mod signature;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::settings::Settings;
use crate::diagnostics::Diagnostics;
use crate::digest::document_digest;
use crate::error::{PdfEditError, Result};
use crate::listing::{ImageListing, parse_image_listing};
use crate::tool::{PdfTool, info::page_count};

pub use candidate::{CandidateDetail, ElementKind, UnwantedElementCandidate};
pub use detect::{DetectionParams, detect_candidates};

pub const RECOMMEND_IMAGES: &str =
    "Images detected that may be unwanted elements - review and select for removal";
pub const RECOMMEND_TEXT: &str =
    "Text elements detected that may be unwanted elements - review and select for removal";
pub const RECOMMEND_NONE: &str =
    "No obvious unwanted element candidates found - the PDF may not contain unwanted elements";

/// Raw listing text kept in the debug log is cut to this many characters.
const LISTING_SAMPLE_LEN: usize = 500;

/// Result of analysing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnwantedElementsAnalysis {
    pub total_pages: u32,
    pub image_candidates: Vec<UnwantedElementCandidate>,
    /// Always empty; text detection is not performed.
    pub text_candidates: Vec<UnwantedElementCandidate>,
    pub overall_confidence: f64,
    pub recommendations: Vec<String>,
    pub debug_logs: Diagnostics,
    /// SHA-256 of the analysed file. Empty in analyses written before it was recorded.
    #[serde(default)]
    pub document_digest: String,
}

impl UnwantedElementsAnalysis {
    pub fn find_image_candidate(&self, id: &str) -> Option<&UnwantedElementCandidate> {
        self.image_candidates.iter().find(|c| c.id == id)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
            .map_err(|e| PdfEditError::parse(format!("{}: {e}", path.display())))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether this analysis may be reused for the document with `digest`.
    ///
    /// A digest mismatch rejects it. An analysis without a digest cannot be checked and is
    /// accepted with a warning.
    pub fn matches_document(&self, digest: &str, diags: &mut Diagnostics) -> bool {
        if self.document_digest.is_empty() {
            diags.warn("Prior analysis carries no document digest; using it unverified");
            true
        } else if self.document_digest != digest {
            diags.warn("Prior analysis was made for a different document; re-analysing");
            false
        } else {
            true
        }
    }
}

/// Analyse `document` with the external toolkit.
pub fn analyze(settings: &Settings, document: &Path) -> Result<UnwantedElementsAnalysis> {
    let tool = PdfTool::new(settings);
    let mut diags = Diagnostics::new();

    let digest = document_digest(document)?;
    let total_pages = page_count(&tool, document)?;
    diags.debug(format!(
        "Analysing {} ({total_pages} pages)",
        document.display()
    ));

    let output = tool.list_images(document)?;
    diags.debug(format!(
        "Image listing: {} bytes, sample: {}",
        output.len(),
        crate::error::excerpt(&output, LISTING_SAMPLE_LEN)
    ));

    let listing = parse_image_listing(&output, &mut diags);
    let analysis = analyze_listing(
        &listing,
        total_pages,
        &DetectionParams::from(settings),
        digest,
        diags,
    );

    info!(
        document = %document.display(),
        pages = analysis.total_pages,
        candidates = analysis.image_candidates.len(),
        "analysis complete"
    );
    Ok(analysis)
}

/// Scoring over an already parsed listing; no external calls.
pub fn analyze_listing(
    listing: &ImageListing,
    total_pages: u32,
    params: &DetectionParams,
    document_digest: String,
    mut diags: Diagnostics,
) -> UnwantedElementsAnalysis {
    let image_candidates = detect_candidates(&listing.records, total_pages, params, &mut diags);
    let text_candidates = Vec::new();

    let candidate_count = image_candidates.len() + text_candidates.len();
    UnwantedElementsAnalysis {
        total_pages,
        overall_confidence: overall_confidence(candidate_count, total_pages),
        recommendations: recommendations(&image_candidates, &text_candidates),
        image_candidates,
        text_candidates,
        debug_logs: diags,
        document_digest,
    }
}

/// 0 without candidates, 0.8 when candidates outnumber pages, else 0.5.
pub fn overall_confidence(candidate_count: usize, total_pages: u32) -> f64 {
    if candidate_count == 0 {
        0.0
    } else if candidate_count > total_pages as usize {
        0.8
    } else {
        0.5
    }
}

pub fn recommendations(
    images: &[UnwantedElementCandidate],
    text: &[UnwantedElementCandidate],
) -> Vec<String> {
    let mut out = Vec::new();
    if !images.is_empty() {
        out.push(RECOMMEND_IMAGES.to_string());
    }
    if !text.is_empty() {
        out.push(RECOMMEND_TEXT.to_string());
    }
    if out.is_empty() {
        out.push(RECOMMEND_NONE.to_string());
    }
    out
}

/// Reuse `prior` when it matches the document on disk, otherwise analyse afresh.
pub fn trusted_or_fresh(
    settings: &Settings,
    document: &Path,
    prior: Option<UnwantedElementsAnalysis>,
) -> Result<UnwantedElementsAnalysis> {
    let mut diags = Diagnostics::new();
    if let Some(prior) = prior {
        let digest = document_digest(document)?;
        if prior.matches_document(&digest, &mut diags) {
            return Ok(prior);
        }
    }

    let mut fresh = analyze(settings, document)?;
    diags.extend(fresh.debug_logs);
    fresh.debug_logs = diags;
    Ok(fresh)
}
