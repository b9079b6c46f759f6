// Image naming prefixes, composite signatures and the two grouping indexes

use std::collections::{BTreeMap, BTreeSet};

use crate::listing::ImageRecord;

/// Prefix assigned to identifiers too short to yield one.
pub const UNKNOWN_PREFIX: &str = "unknown";

/// Marker preceding the prefix inside a signature string.
pub const SIGNATURE_PREFIX_MARKER: &str = "prefix:";

/// Derive the naming prefix of a tool-assigned image id.
///
/// Known literals first, then the text before the first `-` or `_`, then the first
/// three (ids up to five chars) or five characters, else [`UNKNOWN_PREFIX`].
pub fn image_prefix(id: &str) -> String {
    if id.starts_with("Image-") {
        return "Image".to_string();
    }
    if id.starts_with("Img") {
        return "Img".to_string();
    }
    if id.starts_with("WM-") || id.starts_with("Watermark") {
        return "Watermark".to_string();
    }
    if let Some(idx) = id.find(['-', '_']) {
        if idx > 0 {
            return id[..idx].to_string();
        }
    }

    let len = id.chars().count();
    if len >= 3 {
        let take = if len > 5 { 5 } else { 3 };
        return id.chars().take(take).collect();
    }

    UNKNOWN_PREFIX.to_string()
}

/// Composite key for images presumed visually identical:
/// `<width>x<height>_<colorSpace>_<size>_prefix:<prefix>`.
pub fn signature(record: &ImageRecord) -> String {
    signature_with_prefix(record, &image_prefix(&record.id))
}

pub fn signature_with_prefix(record: &ImageRecord, prefix: &str) -> String {
    format!(
        "{}x{}_{}_{}_{SIGNATURE_PREFIX_MARKER}{}",
        record.width, record.height, record.color_space, record.size, prefix
    )
}

/// Recover the prefix embedded after the last `prefix:` marker of a signature.
pub fn prefix_from_signature(signature: &str) -> Option<&str> {
    let start = signature.rfind(SIGNATURE_PREFIX_MARKER)? + SIGNATURE_PREFIX_MARKER.len();
    let rest = signature[start..].trim_start();
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let prefix = &rest[..end];
    (!prefix.is_empty()).then_some(prefix)
}

/// All records sharing one signature.
#[derive(Debug, Clone, Default)]
pub struct SignatureGroup<'a> {
    pub records: Vec<&'a ImageRecord>,
}

impl SignatureGroup<'_> {
    /// Distinct pages covered, ascending.
    pub fn pages(&self) -> Vec<u32> {
        distinct_pages(&self.records)
    }

    /// First member in page order.
    pub fn representative(&self) -> Option<&ImageRecord> {
        self.records.iter().copied().min_by_key(|r| r.page)
    }
}

/// Signature → records and prefix → records, both in sorted key order.
#[derive(Debug, Clone, Default)]
pub struct GroupIndex<'a> {
    pub by_signature: BTreeMap<String, SignatureGroup<'a>>,
    /// Records whose prefix is [`UNKNOWN_PREFIX`] are left out of this index.
    pub by_prefix: BTreeMap<String, Vec<&'a ImageRecord>>,
}

impl<'a> GroupIndex<'a> {
    /// Records are visited in page order so every group lists its members by page.
    pub fn build(records: &'a [ImageRecord]) -> Self {
        let mut ordered: Vec<&ImageRecord> = records.iter().collect();
        ordered.sort_by_key(|r| r.page);

        let mut index = GroupIndex::default();
        for record in ordered {
            let prefix = image_prefix(&record.id);
            index
                .by_signature
                .entry(signature_with_prefix(record, &prefix))
                .or_default()
                .records
                .push(record);
            if prefix != UNKNOWN_PREFIX {
                index.by_prefix.entry(prefix).or_default().push(record);
            }
        }
        index
    }
}

pub fn distinct_pages(records: &[&ImageRecord]) -> Vec<u32> {
    records
        .iter()
        .map(|r| r.page)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
