// Structured view of the toolkit's `images list` report

pub mod parser;
pub mod size;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use parser::parse_image_listing;

/// One row of the image listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub page: u32,
    /// Object reference token, opaque to this crate.
    pub object: String,
    /// Tool-assigned image identifier; not unique across pages.
    pub id: String,
    pub kind: String,
    pub soft_mask: bool,
    pub image_mask: bool,
    /// 0 when the column could not be parsed.
    pub width: u32,
    pub height: u32,
    pub color_space: String,
    pub components: u32,
    pub bits_per_component: u32,
    pub interpolate: bool,
    /// Free-form size string as printed by the tool, e.g. `"35.2KB"`.
    pub size: String,
}

impl ImageRecord {
    pub fn occurrence(&self) -> Occurrence {
        Occurrence {
            page: self.page,
            object: self.object.clone(),
            image_id: self.id.clone(),
        }
    }
}

/// One concrete place an image appears in the document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    pub page: u32,
    pub object: String,
    pub image_id: String,
}

impl Occurrence {
    /// Selector understood by `images update`: the object reference when known,
    /// otherwise a `"page id"` pair.
    pub fn selector(&self) -> Option<String> {
        if !self.object.is_empty() {
            Some(self.object.clone())
        } else if self.page > 0 && !self.image_id.is_empty() {
            Some(format!("{} {}", self.page, self.image_id))
        } else {
            None
        }
    }
}

/// Parsed listing plus the counters gathered while reading it.
#[derive(Debug, Clone, Default)]
pub struct ImageListing {
    pub records: Vec<ImageRecord>,
    pub header_found: bool,
    pub lines_processed: usize,
    pub lines_skipped: usize,
}

impl ImageListing {
    /// Records grouped by page, pages ascending, input order kept within a page.
    pub fn by_page(&self) -> BTreeMap<u32, Vec<&ImageRecord>> {
        let mut pages: BTreeMap<u32, Vec<&ImageRecord>> = BTreeMap::new();
        for record in &self.records {
            pages.entry(record.page).or_default().push(record);
        }
        pages
    }

    pub fn occurrence_table(&self) -> OccurrenceTable {
        OccurrenceTable::from_records(&self.records)
    }
}

/// Occurrences indexed by image id, plus the flat list for pattern scans.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceTable {
    by_id: BTreeMap<String, Vec<Occurrence>>,
    all: Vec<Occurrence>,
}

impl OccurrenceTable {
    pub fn from_records(records: &[ImageRecord]) -> Self {
        let mut table = Self::default();
        for record in records {
            let occ = record.occurrence();
            table
                .by_id
                .entry(occ.image_id.clone())
                .or_default()
                .push(occ.clone());
            table.all.push(occ);
        }
        table
    }

    pub fn with_id(&self, image_id: &str) -> &[Occurrence] {
        self.by_id.get(image_id).map_or(&[], Vec::as_slice)
    }

    pub fn all(&self) -> &[Occurrence] {
        &self.all
    }

    /// True when an occurrence on the same page with the same object (or, lacking an
    /// object reference, the same image id) is present.
    pub fn contains(&self, occ: &Occurrence) -> bool {
        self.all.iter().any(|o| {
            o.page == occ.page
                && if occ.object.is_empty() {
                    o.image_id == occ.image_id
                } else {
                    o.object == occ.object
                }
        })
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}
