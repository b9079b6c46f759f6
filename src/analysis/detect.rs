// Repeated-image detection
//
// Pass 1 groups by naming prefix and rounded file size and scores on page coverage.
// Pass 2 groups by exact signature and scores on page ratio, dimensions and soft mask.
// Signatures claimed by pass 1 are not reported again by pass 2.

use std::collections::{BTreeMap, BTreeSet};

use super::candidate::{
    CandidateDetail, ElementKind, PrefixCoverage, SignatureCoverage, UnwantedElementCandidate,
};
use super::signature::{
    GroupIndex, UNKNOWN_PREFIX, distinct_pages, image_prefix, signature_with_prefix,
};
use crate::config::settings::Settings;
use crate::diagnostics::Diagnostics;
use crate::listing::ImageRecord;
use crate::listing::size::parse_file_size_kb;

pub const FULL_PAGE_CONFIDENCE: f64 = 0.95;
pub const COVERAGE_CONFIDENCE_BASE: f64 = 0.80;
pub const COVERAGE_CONFIDENCE_SCALE: f64 = 0.15;

pub const REPEATING_CONFIDENCE_BASE: f64 = 0.4;
pub const REPEATING_PAGE_WEIGHT: f64 = 0.6;
pub const LARGE_IMAGE_BONUS: f64 = 0.15;
pub const VERY_LARGE_IMAGE_BONUS: f64 = 0.15;
pub const SOFT_MASK_BONUS: f64 = 0.05;

/// Tunables for both passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    pub coverage_threshold: f64,
    pub min_overlay_size_kb: f64,
}

impl Default for DetectionParams {
    fn default() -> Self {
        DetectionParams {
            coverage_threshold: 0.8,
            min_overlay_size_kb: 30.0,
        }
    }
}

impl From<&Settings> for DetectionParams {
    fn from(settings: &Settings) -> Self {
        DetectionParams {
            coverage_threshold: settings.coverage_threshold,
            min_overlay_size_kb: settings.min_overlay_size_kb,
        }
    }
}

impl DetectionParams {
    /// floor(total × threshold), at least one page.
    pub fn min_pages(&self, total_pages: u32) -> usize {
        ((total_pages as f64 * self.coverage_threshold).floor() as usize).max(1)
    }
}

/// Run both passes over the listing records.
///
/// Output order is deterministic: pass 1 candidates by prefix then size key, then pass 2
/// candidates by signature.
pub fn detect_candidates(
    records: &[ImageRecord],
    total_pages: u32,
    params: &DetectionParams,
    diags: &mut Diagnostics,
) -> Vec<UnwantedElementCandidate> {
    if total_pages == 0 {
        diags.warn("Document reports 0 pages; skipping detection");
        return Vec::new();
    }

    let index = GroupIndex::build(records);
    diags.debug(format!(
        "Grouped {} images into {} signatures and {} prefixes",
        records.len(),
        index.by_signature.len(),
        index.by_prefix.len()
    ));

    let (mut candidates, claimed) = detect_by_prefix(&index, total_pages, params, diags);
    let by_signature = detect_by_signature(&index, total_pages, params, &claimed, diags);
    candidates.extend(by_signature);

    diags.debug(format!("Detected {} image candidates", candidates.len()));
    candidates
}

fn detect_by_prefix(
    index: &GroupIndex<'_>,
    total_pages: u32,
    params: &DetectionParams,
    diags: &mut Diagnostics,
) -> (Vec<UnwantedElementCandidate>, BTreeSet<String>) {
    let needed = params.min_pages(total_pages);
    let mut candidates = Vec::new();
    let mut claimed = BTreeSet::new();

    for (prefix, images) in &index.by_prefix {
        if images.len() < needed {
            diags.debug(format!(
                "Prefix '{prefix}': {} images, below the {needed} needed",
                images.len()
            ));
            continue;
        }

        let mut by_size: BTreeMap<String, Vec<&ImageRecord>> = BTreeMap::new();
        for &record in images {
            let kb = parse_file_size_kb(&record.size);
            if kb >= params.min_overlay_size_kb {
                by_size.entry(format!("{kb:.0}KB")).or_default().push(record);
            }
        }

        for (size_key, group) in by_size {
            let pages = distinct_pages(&group);
            let page_count = pages.len() as u32;
            let coverage = page_count as f64 / total_pages as f64;
            if coverage < params.coverage_threshold {
                diags.debug(format!(
                    "Prefix '{prefix}' size {size_key}: {page_count}/{total_pages} pages, below threshold"
                ));
                continue;
            }

            let rep = group[0];
            let full_page = page_count >= total_pages;
            let file_size_kb = parse_file_size_kb(&rep.size);
            let detail = PrefixCoverage {
                prefix: prefix.clone(),
                signature: signature_with_prefix(rep, prefix),
                size_key: size_key.clone(),
                file_size_kb,
                page_count,
                total_pages,
                coverage,
                representative: rep.occurrence(),
                soft_mask: rep.soft_mask,
                image_mask: rep.image_mask,
            };

            let (confidence, detail) = if full_page {
                (FULL_PAGE_CONFIDENCE, CandidateDetail::FullpageWatermark(detail))
            } else {
                (
                    COVERAGE_CONFIDENCE_BASE + coverage * COVERAGE_CONFIDENCE_SCALE,
                    CandidateDetail::RepeatingWatermark(detail),
                )
            };

            let coverage_label = if full_page {
                "100%".to_string()
            } else {
                format!("{:.0}%", coverage * 100.0)
            };
            let description = format!(
                "Unwanted element (prefix '{prefix}'): size {}x{} ({}), file size {size_key}, appears on {page_count}/{total_pages} pages ({coverage_label})",
                rep.width, rep.height, rep.color_space
            );
            let id = format!("{}_{prefix}_{size_key}", detail.type_tag());

            diags.debug(format!(
                "Candidate {id}: {page_count}/{total_pages} pages, confidence {confidence:.2}"
            ));

            claimed.extend(group.iter().map(|r| signature_with_prefix(r, prefix)));
            candidates.push(UnwantedElementCandidate {
                kind: ElementKind::Image,
                id,
                page: 0,
                description,
                confidence,
                detail,
                occurrences: group.iter().map(|r| r.occurrence()).collect(),
            });
        }
    }

    (candidates, claimed)
}

fn detect_by_signature(
    index: &GroupIndex<'_>,
    total_pages: u32,
    params: &DetectionParams,
    claimed: &BTreeSet<String>,
    diags: &mut Diagnostics,
) -> Vec<UnwantedElementCandidate> {
    let needed = params.min_pages(total_pages);
    let mut candidates = Vec::new();
    let mut issued: BTreeMap<String, usize> = BTreeMap::new();

    for (signature, group) in &index.by_signature {
        if claimed.contains(signature) {
            continue;
        }
        let pages = group.pages();
        if pages.len() < needed && !has_continuous_run(&pages, needed) {
            continue;
        }
        let Some(rep) = group.representative() else {
            continue;
        };

        let page_count = pages.len() as u32;
        let confidence = repeating_confidence(rep, page_count, total_pages);
        let prefix = image_prefix(&rep.id);

        let description = if prefix == UNKNOWN_PREFIX {
            format!(
                "Repeating unwanted element image: size {}x{} ({}), appears on {page_count}/{total_pages} pages ({})",
                rep.width, rep.height, rep.color_space, rep.size
            )
        } else {
            format!(
                "Repeating unwanted element image (prefix '{prefix}'): size {}x{} ({}), file size {}, appears on {page_count}/{total_pages} pages",
                rep.width, rep.height, rep.color_space, rep.size
            )
        };

        let base_id = format!(
            "{}_{}",
            CandidateDetail::SIGNATURE_TAG,
            signature.chars().take(8).collect::<String>()
        );
        let seen = issued.entry(base_id.clone()).or_insert(0);
        *seen += 1;
        let id = if *seen == 1 {
            base_id
        } else {
            format!("{base_id}_{seen}")
        };

        diags.debug(format!(
            "Candidate {id}: signature {signature}, {page_count}/{total_pages} pages, confidence {confidence:.2}"
        ));

        candidates.push(UnwantedElementCandidate {
            kind: ElementKind::Image,
            id,
            page: 0,
            description,
            confidence,
            detail: CandidateDetail::RepeatingUnwantedElement(SignatureCoverage {
                prefix,
                signature: signature.clone(),
                page_count,
                max_pages: total_pages,
                representative: rep.occurrence(),
                soft_mask: rep.soft_mask,
                image_mask: rep.image_mask,
            }),
            occurrences: group.records.iter().map(|r| r.occurrence()).collect(),
        });
    }

    candidates
}

/// 0.4 + ratio × 0.6, bonuses for large dimensions and soft masks, capped at 1.0.
pub fn repeating_confidence(rep: &ImageRecord, page_count: u32, total_pages: u32) -> f64 {
    let ratio = if total_pages > 0 {
        page_count as f64 / total_pages as f64
    } else {
        0.0
    };
    let mut confidence = REPEATING_CONFIDENCE_BASE + ratio * REPEATING_PAGE_WEIGHT;
    if rep.width > 300 || rep.height > 400 {
        confidence += LARGE_IMAGE_BONUS;
    }
    if rep.width > 500 || rep.height > 700 {
        confidence += VERY_LARGE_IMAGE_BONUS;
    }
    if rep.soft_mask {
        confidence += SOFT_MASK_BONUS;
    }
    confidence.min(1.0)
}

/// True when ascending, distinct `pages` contain a run of consecutive page numbers at
/// least `min_len` long.
pub fn has_continuous_run(pages: &[u32], min_len: usize) -> bool {
    if min_len == 0 {
        return true;
    }
    if pages.len() < min_len {
        return false;
    }
    let mut run = 1;
    for pair in pages.windows(2) {
        run = if pair[1] == pair[0] + 1 { run + 1 } else { 1 };
        if run >= min_len {
            return true;
        }
    }
    run >= min_len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(page: u32, id: &str, w: u32, h: u32, size: &str) -> ImageRecord {
        ImageRecord {
            page,
            object: format!("{}", 100 + page),
            id: id.to_string(),
            kind: "image".to_string(),
            soft_mask: false,
            image_mask: false,
            width: w,
            height: h,
            color_space: "DeviceRGB".to_string(),
            components: 3,
            bits_per_component: 8,
            interpolate: false,
            size: size.to_string(),
        }
    }

    #[test]
    fn test_continuous_run() {
        assert!(has_continuous_run(&[1, 2, 3, 7], 3));
        assert!(!has_continuous_run(&[1, 3, 5, 7], 2));
        assert!(has_continuous_run(&[4], 1));
        assert!(!has_continuous_run(&[], 1));
    }

    #[test]
    fn test_repeating_confidence_bonuses() {
        let small = record(1, "x", 100, 100, "1KB");
        assert!((repeating_confidence(&small, 5, 10) - 0.7).abs() < 1e-9);

        let mut big = record(1, "x", 600, 100, "1KB");
        big.soft_mask = true;
        assert_eq!(repeating_confidence(&big, 10, 10), 1.0);
        assert!((repeating_confidence(&big, 0, 10) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_min_pages_floor() {
        let params = DetectionParams::default();
        assert_eq!(params.min_pages(10), 8);
        assert_eq!(params.min_pages(7), 5);
        assert_eq!(params.min_pages(1), 1);
    }

    #[test]
    fn test_zero_pages_yields_nothing() {
        let mut diags = Diagnostics::new();
        let records = vec![record(1, "Image-1", 800, 600, "120KB")];
        let found = detect_candidates(&records, 0, &DetectionParams::default(), &mut diags);
        assert!(found.is_empty());
        assert_eq!(diags.warnings().count(), 1);
    }

    #[test]
    fn test_prefix_pass_claims_signature() {
        let records: Vec<ImageRecord> = (1..=4)
            .map(|p| record(p, "Image-1", 800, 600, "120KB"))
            .collect();
        let mut diags = Diagnostics::new();
        let found = detect_candidates(&records, 4, &DetectionParams::default(), &mut diags);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "fullpage_watermark_Image_120KB");
        assert_eq!(found[0].occurrences.len(), 4);
    }
}
