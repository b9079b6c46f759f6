use std::collections::BTreeSet;

use crate::error::{PdfEditError, Result};

/// ページ番号の上限。範囲展開の前に検査する。
pub const MAX_PAGE_NUMBER: u32 = 1_000_000;

/// ページ指定文字列をパースしてページ番号のベクタに変換する。
///
/// 形式:
/// - 単一ページ: `"5"`
/// - 範囲: `"5-10"` (5, 6, 7, 8, 9, 10)
/// - 混合（カンマ区切り）: `"1,3,5-7"`
///
/// 空白は無視する。結果はソート済み・重複なし。
pub fn parse_page_specifier(spec: &str) -> Result<Vec<u32>> {
    let compact: String = spec.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(PdfEditError::validation("empty page specification"));
    }

    let mut pages = BTreeSet::new();

    for part in compact.split(',') {
        if part.is_empty() {
            return Err(PdfEditError::validation(format!(
                "empty entry in page specification '{spec}'"
            )));
        }

        if let Some((start_str, end_str)) = part.split_once('-') {
            let start = parse_page_number(start_str, "start page")?;
            let end = parse_page_number(end_str, "end page")?;

            if start > end {
                return Err(PdfEditError::validation(format!(
                    "invalid range: start > end ({start} > {end})"
                )));
            }

            pages.extend(start..=end);
        } else {
            pages.insert(parse_page_number(part, "page number")?);
        }
    }

    Ok(pages.into_iter().collect())
}

fn parse_page_number(text: &str, what: &str) -> Result<u32> {
    let page: u32 = text
        .parse()
        .map_err(|_| PdfEditError::validation(format!("invalid {what}: '{text}'")))?;
    if page > MAX_PAGE_NUMBER {
        return Err(PdfEditError::validation(format!(
            "{what} {page} exceeds the maximum of {MAX_PAGE_NUMBER}"
        )));
    }
    Ok(page)
}

/// 全ページ番号が 1..=total_pages に収まっていることを検証する。
pub fn validate_page_numbers(pages: &[u32], total_pages: u32) -> Result<()> {
    for &page in pages {
        if page < 1 {
            return Err(PdfEditError::validation(format!(
                "page numbers must be positive, got {page}"
            )));
        }
        if page > total_pages {
            return Err(PdfEditError::validation(format!(
                "page {page} exceeds total pages ({total_pages})"
            )));
        }
    }
    Ok(())
}
