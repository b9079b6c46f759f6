// `images list` report → ImageRecord rows
//
// The report is free text: a heading, a header row, separator rules, table rows and a
// trailing summary. Column separators vary between tool versions, so each row is split
// with the first separator style that yields enough fields.

use std::sync::LazyLock;

use regex::Regex;

use super::size::looks_like_size;
use super::{ImageListing, ImageRecord};
use crate::diagnostics::Diagnostics;

/// Minimum number of non-empty fields for a row to be considered a table row.
const MIN_FIELDS: usize = 3;

/// Only the first few skipped rows are reported individually.
const MAX_SKIP_REPORTS: usize = 5;

const SUMMARY_PHRASES: &[&str] = &["images available", "total images", "no images"];

static SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

/// Column positions in a full-width row.
mod col {
    pub const PAGE: usize = 0;
    pub const OBJECT: usize = 1;
    pub const ID: usize = 2;
    pub const KIND: usize = 3;
    pub const SOFT_MASK: usize = 4;
    pub const IMAGE_MASK: usize = 5;
    pub const WIDTH: usize = 6;
    pub const HEIGHT: usize = 7;
    pub const COLOR_SPACE: usize = 8;
    pub const COMPONENTS: usize = 9;
    pub const BPC: usize = 10;
    pub const INTERPOLATE: usize = 11;
    pub const SIZE: usize = 12;
}

/// Parse the raw listing text.
///
/// Malformed rows are skipped; an empty result is reported as a warning in `diags`,
/// never as an error.
pub fn parse_image_listing(output: &str, diags: &mut Diagnostics) -> ImageListing {
    let mut listing = ImageListing::default();

    for (idx, line) in output.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();

        if !listing.header_found {
            if is_header(trimmed) {
                listing.header_found = true;
                diags.debug(format!("Found table header at line {line_no}: {trimmed}"));
            }
            continue;
        }

        if trimmed.is_empty() || is_separator(trimmed) {
            continue;
        }

        let lower = trimmed.to_lowercase();
        if SUMMARY_PHRASES.iter().any(|p| lower.contains(p)) {
            diags.debug(format!("Reached end of table at line {line_no}: {trimmed}"));
            break;
        }

        let Some(fields) = split_fields(trimmed) else {
            listing.lines_skipped += 1;
            if listing.lines_skipped <= MAX_SKIP_REPORTS {
                diags.debug(format!(
                    "Skipped line {line_no} (too few fields): {}",
                    preview(trimmed)
                ));
            }
            continue;
        };

        listing.lines_processed += 1;

        match record_from_fields(&fields) {
            Some(record) => {
                diags.debug(format!(
                    "Image found - page {}, id {}, size {}, {}x{} {}",
                    record.page,
                    record.id,
                    record.size,
                    record.width,
                    record.height,
                    record.color_space
                ));
                listing.records.push(record);
            }
            None => {
                diags.debug(format!(
                    "Discarded line {line_no} (missing page or id): {}",
                    preview(trimmed)
                ));
            }
        }
    }

    diags.debug(format!(
        "Lines processed: {}, lines skipped: {}, images parsed: {}",
        listing.lines_processed,
        listing.lines_skipped,
        listing.records.len()
    ));

    if listing.records.is_empty() {
        if listing.lines_processed > 0 {
            diags.warn(format!(
                "Processed {} table lines but parsed 0 images; the listing format may be unexpected",
                listing.lines_processed
            ));
        }
        if !listing.header_found && !output.trim().is_empty() {
            diags.warn("Table header not found; the listing format may be unexpected");
        }
    }

    listing
}

fn is_header(line: &str) -> bool {
    line.contains("Page")
        && ["Obj", "Type", "Id", "ID"]
            .iter()
            .any(|token| line.contains(token))
}

/// Rules made only of dashes, equals, underscores, pipes or box-drawing characters.
fn is_separator(line: &str) -> bool {
    line.chars().all(|c| {
        c.is_whitespace()
            || matches!(c, '-' | '=' | '_' | '|' | '+' | ':')
            || ('\u{2500}'..='\u{257F}').contains(&c)
    })
}

/// Split a row by box-drawing bar, pipe, tab, then runs of 2+ spaces; the first style
/// producing at least [`MIN_FIELDS`] non-empty fields wins.
fn split_fields(line: &str) -> Option<Vec<String>> {
    for delim in ['│', '|', '\t'] {
        if !line.contains(delim) {
            continue;
        }
        let mut fields = split_delimited(line, delim);
        split_page_object_cell(&mut fields);
        if non_empty(&fields) >= MIN_FIELDS {
            return Some(fields);
        }
    }

    let fields: Vec<String> = SPACE_RUN
        .split(line)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();
    (fields.len() >= MIN_FIELDS).then_some(fields)
}

/// Delimited cells keep their positions, so blank cells stay blank instead of
/// shifting later columns left. Border delimiters at either end are dropped.
fn split_delimited(line: &str, delim: char) -> Vec<String> {
    let inner = line.strip_prefix(delim).unwrap_or(line);
    let inner = inner.strip_suffix(delim).unwrap_or(inner);
    inner.split(delim).map(|f| f.trim().to_string()).collect()
}

/// Box-drawing layouts print page and object number in one cell (`"1    3"`).
fn split_page_object_cell(fields: &mut Vec<String>) {
    let Some(first) = fields.first() else {
        return;
    };
    let parts: Vec<&str> = first.split_whitespace().collect();
    if let [page, object] = parts[..] {
        if page.parse::<u32>().is_ok() && object.parse::<u32>().is_ok() {
            let (page, object) = (page.to_string(), object.to_string());
            fields.splice(0..1, [page, object]);
        }
    }
}

fn non_empty(fields: &[String]) -> usize {
    fields.iter().filter(|f| !f.is_empty()).count()
}

fn record_from_fields(fields: &[String]) -> Option<ImageRecord> {
    let field = |i: usize| fields.get(i).map(String::as_str).unwrap_or("");

    let id = field(col::ID);
    let page: u32 = field(col::PAGE).parse().unwrap_or(0);
    if page == 0 || id.is_empty() {
        return None;
    }

    let mut size = field(col::SIZE).to_string();
    if size.is_empty() {
        size = fields
            .iter()
            .skip(col::COLOR_SPACE)
            .chain(fields.iter())
            .find(|f| looks_like_size(f))
            .cloned()
            .unwrap_or_default();
    }

    Some(ImageRecord {
        page,
        object: field(col::OBJECT).to_string(),
        id: id.to_string(),
        kind: field(col::KIND).to_string(),
        soft_mask: is_flag_set(field(col::SOFT_MASK)),
        image_mask: is_flag_set(field(col::IMAGE_MASK)),
        width: field(col::WIDTH).parse().unwrap_or(0),
        height: field(col::HEIGHT).parse().unwrap_or(0),
        color_space: field(col::COLOR_SPACE).to_string(),
        components: field(col::COMPONENTS).parse().unwrap_or(0),
        bits_per_component: field(col::BPC).parse().unwrap_or(0),
        interpolate: is_flag_set(field(col::INTERPOLATE)),
        size,
    })
}

fn is_flag_set(cell: &str) -> bool {
    matches!(
        cell.to_lowercase().as_str(),
        "*" | "x" | "y" | "yes" | "true"
    )
}

fn preview(line: &str) -> String {
    crate::error::excerpt(line, 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_lines() {
        assert!(is_separator("-----+------+-----"));
        assert!(is_separator("━━━━━━━━┿━━━━━━"));
        assert!(is_separator("====="));
        assert!(!is_separator("1 | 12 | Im0"));
    }

    #[test]
    fn test_pipe_split_keeps_blank_cells() {
        let fields = split_fields("| 1 | 12 | Im0 | image |  | * | 10 |").expect("row");
        assert_eq!(fields, vec!["1", "12", "Im0", "image", "", "*", "10"]);
    }

    #[test]
    fn test_pipe_with_too_few_fields_falls_back_to_spaces() {
        // The pipe yields only two cells, the space-run split yields four.
        let fields = split_fields("1  12  a|b  image").expect("row");
        assert_eq!(fields, vec!["1", "12", "a|b", "image"]);
    }

    #[test]
    fn test_box_drawing_row_shares_page_and_object_cell() {
        let fields = split_fields("   1    3 │ Im0 │ image │  │  │ 10 │ 10").expect("row");
        assert_eq!(fields, vec!["1", "3", "Im0", "image", "", "", "10", "10"]);

        let record = record_from_fields(&fields).expect("record");
        assert_eq!(record.page, 1);
        assert_eq!(record.object, "3");
        assert_eq!(record.id, "Im0");
        assert_eq!(record.width, 10);
    }

    #[test]
    fn test_header_detection() {
        assert!(is_header("Page Obj# │ Id │ Type"));
        assert!(is_header("Page | ID | Size"));
        assert!(!is_header("1 | 12 | Im0"));
    }

    #[test]
    fn test_size_found_outside_expected_column() {
        let fields: Vec<String> = ["1", "12", "Im0", "image", "800", "600", "45KB"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let record = record_from_fields(&fields).expect("record");
        assert_eq!(record.size, "45KB");
    }
}
