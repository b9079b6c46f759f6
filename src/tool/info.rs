use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::PdfTool;
use crate::error::{OUTPUT_EXCERPT_LEN, PdfEditError, Result, excerpt};

/// Known phrasings of the page-count line in `info` output, tried in order.
static PAGE_COUNT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"Page count:\s+(\d+)",
        r"Pages:\s+(\d+)",
        r"pages\s*=\s*(\d+)",
        r"No\. of pages:\s+(\d+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Extract the page count from `info` output.
pub fn parse_page_count(info_output: &str) -> Option<u32> {
    PAGE_COUNT_PATTERNS.iter().find_map(|re| {
        re.captures(info_output)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    })
}

/// Ask the toolkit for the document's page count.
pub fn page_count(tool: &PdfTool, file: &Path) -> Result<u32> {
    let output = tool.info(file)?;
    parse_page_count(&output).ok_or_else(|| {
        PdfEditError::parse(format!(
            "could not determine page count from output: {}",
            excerpt(&output, OUTPUT_EXCERPT_LEN)
        ))
    })
}
