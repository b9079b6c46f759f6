// Unwanted-element candidates
//
// Candidates carry a typed detail per detection kind plus every occurrence they cover.
// On the wire they use a flat `metadata` string map; `CandidateWire` is the only place
// that map is built or read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::listing::Occurrence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Image,
    Text,
}

/// Group found by prefix + rounded file size.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixCoverage {
    pub prefix: String,
    pub signature: String,
    /// Rounded size bucket, e.g. `"120KB"`.
    pub size_key: String,
    pub file_size_kb: f64,
    pub page_count: u32,
    pub total_pages: u32,
    /// Distinct pages covered / total pages.
    pub coverage: f64,
    pub representative: Occurrence,
    pub soft_mask: bool,
    pub image_mask: bool,
}

/// Group found by identical signature.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureCoverage {
    pub prefix: String,
    pub signature: String,
    pub page_count: u32,
    pub max_pages: u32,
    pub representative: Occurrence,
    pub soft_mask: bool,
    pub image_mask: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CandidateDetail {
    /// Prefix group present on every page.
    FullpageWatermark(PrefixCoverage),
    /// Prefix group above the coverage threshold but not on every page.
    RepeatingWatermark(PrefixCoverage),
    RepeatingUnwantedElement(SignatureCoverage),
}

impl CandidateDetail {
    pub const FULLPAGE_TAG: &'static str = "fullpage_watermark";
    pub const REPEATING_TAG: &'static str = "repeating_watermark";
    pub const SIGNATURE_TAG: &'static str = "repeating_unwanted_element";

    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::FullpageWatermark(_) => Self::FULLPAGE_TAG,
            Self::RepeatingWatermark(_) => Self::REPEATING_TAG,
            Self::RepeatingUnwantedElement(_) => Self::SIGNATURE_TAG,
        }
    }

    pub fn prefix(&self) -> &str {
        match self {
            Self::FullpageWatermark(d) | Self::RepeatingWatermark(d) => &d.prefix,
            Self::RepeatingUnwantedElement(d) => &d.prefix,
        }
    }

    pub fn signature(&self) -> &str {
        match self {
            Self::FullpageWatermark(d) | Self::RepeatingWatermark(d) => &d.signature,
            Self::RepeatingUnwantedElement(d) => &d.signature,
        }
    }

    pub fn representative(&self) -> &Occurrence {
        match self {
            Self::FullpageWatermark(d) | Self::RepeatingWatermark(d) => &d.representative,
            Self::RepeatingUnwantedElement(d) => &d.representative,
        }
    }

    pub fn page_count(&self) -> u32 {
        match self {
            Self::FullpageWatermark(d) | Self::RepeatingWatermark(d) => d.page_count,
            Self::RepeatingUnwantedElement(d) => d.page_count,
        }
    }

    /// Flatten into the transport metadata map.
    pub fn to_metadata(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        let mut put = |key: &str, value: String| {
            map.insert(key.to_string(), value);
        };

        put("type", self.type_tag().to_string());
        match self {
            Self::FullpageWatermark(d) | Self::RepeatingWatermark(d) => {
                put("signature", d.signature.clone());
                put("prefix", d.prefix.clone());
                put("size_key", d.size_key.clone());
                put("file_size_kb", d.file_size_kb.to_string());
                put("page_count", d.page_count.to_string());
                put("total_pages", d.total_pages.to_string());
                put("coverage", format!("{:.0}%", d.coverage * 100.0));
                put("soft_mask", d.soft_mask.to_string());
                put("image_mask", d.image_mask.to_string());
                put_representative(&mut put, &d.representative);
            }
            Self::RepeatingUnwantedElement(d) => {
                put("signature", d.signature.clone());
                put("prefix", d.prefix.clone());
                put("page_count", d.page_count.to_string());
                put("max_pages", d.max_pages.to_string());
                put("soft_mask", d.soft_mask.to_string());
                put("image_mask", d.image_mask.to_string());
                put_representative(&mut put, &d.representative);
            }
        }
        map
    }

    /// Rebuild from a metadata map. Missing numeric fields read as 0; `fallback_page`
    /// stands in for the representative page when the map does not carry one.
    pub fn from_metadata(
        map: &BTreeMap<String, String>,
        fallback_page: u32,
    ) -> Result<Self, String> {
        let text = |key: &str| map.get(key).cloned().unwrap_or_default();
        let number = |key: &str| map.get(key).and_then(|v| v.trim().parse::<u32>().ok());
        let flag = |key: &str| map.get(key).is_some_and(|v| v.trim() == "true");

        let representative = Occurrence {
            page: number("representative_page").unwrap_or(fallback_page),
            object: text("object"),
            image_id: text("image_id"),
        };

        match text("type").as_str() {
            tag @ (Self::FULLPAGE_TAG | Self::REPEATING_TAG) => {
                let page_count = number("page_count").unwrap_or(0);
                let total_pages = number("total_pages").unwrap_or(0);
                let coverage = if total_pages > 0 {
                    page_count as f64 / total_pages as f64
                } else {
                    0.0
                };
                let detail = PrefixCoverage {
                    prefix: text("prefix"),
                    signature: text("signature"),
                    size_key: text("size_key"),
                    file_size_kb: map
                        .get("file_size_kb")
                        .and_then(|v| v.trim().parse().ok())
                        .unwrap_or(0.0),
                    page_count,
                    total_pages,
                    coverage,
                    representative,
                    soft_mask: flag("soft_mask"),
                    image_mask: flag("image_mask"),
                };
                Ok(if tag == Self::FULLPAGE_TAG {
                    Self::FullpageWatermark(detail)
                } else {
                    Self::RepeatingWatermark(detail)
                })
            }
            Self::SIGNATURE_TAG => Ok(Self::RepeatingUnwantedElement(SignatureCoverage {
                prefix: text("prefix"),
                signature: text("signature"),
                page_count: number("page_count").unwrap_or(0),
                max_pages: number("max_pages").unwrap_or(0),
                representative,
                soft_mask: flag("soft_mask"),
                image_mask: flag("image_mask"),
            })),
            other => Err(format!("unknown candidate type '{other}'")),
        }
    }
}

fn put_representative(put: &mut impl FnMut(&str, String), occ: &Occurrence) {
    put("object", occ.object.clone());
    put("image_id", occ.image_id.clone());
    put("representative_page", occ.page.to_string());
}

/// A detected, scored grouping of image occurrences proposed for removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "CandidateWire", try_from = "CandidateWire")]
pub struct UnwantedElementCandidate {
    pub kind: ElementKind,
    pub id: String,
    /// 0 when the candidate spans several pages.
    pub page: u32,
    pub description: String,
    pub confidence: f64,
    pub detail: CandidateDetail,
    /// Every occurrence the candidate covers, in page order. Empty for candidates
    /// read from analyses that predate occurrence tracking.
    pub occurrences: Vec<Occurrence>,
}

impl UnwantedElementCandidate {
    pub fn metadata(&self) -> BTreeMap<String, String> {
        self.detail.to_metadata()
    }
}

#[derive(Serialize, Deserialize)]
struct CandidateWire {
    #[serde(rename = "type")]
    kind: ElementKind,
    id: String,
    page: u32,
    description: String,
    confidence: f64,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    #[serde(default)]
    occurrences: Vec<Occurrence>,
}

impl From<UnwantedElementCandidate> for CandidateWire {
    fn from(c: UnwantedElementCandidate) -> Self {
        CandidateWire {
            metadata: c.detail.to_metadata(),
            kind: c.kind,
            id: c.id,
            page: c.page,
            description: c.description,
            confidence: c.confidence,
            occurrences: c.occurrences,
        }
    }
}

impl TryFrom<CandidateWire> for UnwantedElementCandidate {
    type Error = String;

    fn try_from(w: CandidateWire) -> Result<Self, Self::Error> {
        let detail = CandidateDetail::from_metadata(&w.metadata, w.page)
            .map_err(|e| format!("candidate {}: {e}", w.id))?;
        Ok(UnwantedElementCandidate {
            kind: w.kind,
            id: w.id,
            page: w.page,
            description: w.description,
            confidence: w.confidence,
            detail,
            occurrences: w.occurrences,
        })
    }
}
