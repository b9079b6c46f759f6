// ページ指定パーサとページ削除・再保存テスト

mod common;

use common::FakeTool;
use pdf_editor::edit::{parse_page_specifier, remove_pages, resave, validate_page_numbers};
use pdf_editor::error::PdfEditError;

// ============================================================
// 1. ページ指定パーサ
// ============================================================

#[test]
fn test_parse_single_range() {
    let result = parse_page_specifier("5-10").expect("should parse range");
    assert_eq!(result, vec![5, 6, 7, 8, 9, 10]);
}

#[test]
fn test_parse_single_page() {
    assert_eq!(parse_page_specifier("1").expect("single page"), vec![1]);
}

#[test]
fn test_parse_mixed_with_spaces_and_duplicates() {
    let result = parse_page_specifier("7, 1, 3, 5-7,  1").expect("should parse mixed");
    assert_eq!(result, vec![1, 3, 5, 6, 7]);
}

#[test]
fn test_parse_invalid_text() {
    assert!(matches!(
        parse_page_specifier("abc"),
        Err(PdfEditError::ValidationError(_))
    ));
}

#[test]
fn test_parse_reversed_range() {
    assert!(parse_page_specifier("10-5").is_err(), "start > end");
}

#[test]
fn test_parse_huge_range_is_rejected_before_expansion() {
    let err = parse_page_specifier("1-4294967295").unwrap_err();
    assert!(matches!(err, PdfEditError::ValidationError(_)), "got {err:?}");
    assert!(parse_page_specifier("4294967295").is_err());
}

#[test]
fn test_parse_empty_string() {
    assert!(parse_page_specifier("").is_err());
    assert!(parse_page_specifier("   ").is_err());
}

// ============================================================
// 2. ページ番号の範囲検証
// ============================================================

#[test]
fn test_validate_in_range() {
    assert!(validate_page_numbers(&[1, 2, 10], 10).is_ok());
}

#[test]
fn test_validate_zero_page() {
    assert!(validate_page_numbers(&[0], 10).is_err());
}

#[test]
fn test_validate_beyond_last_page() {
    let err = validate_page_numbers(&[3, 11], 10).unwrap_err();
    assert!(err.to_string().contains("11"));
}

#[cfg(unix)]
#[test]
fn test_remove_pages_huge_range_skips_tool() {
    let fake = FakeTool::new();
    fake.set_page_count(3);
    let input = fake.document("in.pdf", b"%PDF-1.7 source");
    let output = fake.path().join("out.pdf");

    let err = remove_pages(&fake.settings(), &input, &output, "1-4294967295").unwrap_err();
    assert!(matches!(err, PdfEditError::ValidationError(_)));
    assert_eq!(fake.calls_starting_with("pages"), 0);
}

// ============================================================
// 3. ツール経由の削除・再保存
// ============================================================

#[cfg(unix)]
#[test]
fn test_remove_pages_normalises_list() {
    let fake = FakeTool::new();
    fake.set_page_count(10);
    let input = fake.document("in.pdf", b"%PDF-1.7 source");
    let output = fake.path().join("out.pdf");

    let removed = remove_pages(&fake.settings(), &input, &output, "5-6, 2").expect("remove");

    assert_eq!(removed, vec![2, 5, 6]);
    assert!(output.exists());
    let calls = fake.calls();
    assert!(
        calls.iter().any(|c| c.starts_with("pages remove -p 2,5,6 -- ")),
        "got {calls:?}"
    );
}

#[cfg(unix)]
#[test]
fn test_remove_pages_out_of_range_skips_tool() {
    let fake = FakeTool::new();
    fake.set_page_count(3);
    let input = fake.document("in.pdf", b"%PDF-1.7 source");
    let output = fake.path().join("out.pdf");

    let err = remove_pages(&fake.settings(), &input, &output, "2-4").unwrap_err();
    assert!(matches!(err, PdfEditError::ValidationError(_)));
    assert_eq!(fake.calls_starting_with("pages"), 0);
}

#[cfg(unix)]
#[test]
fn test_remove_every_page_is_rejected() {
    let fake = FakeTool::new();
    fake.set_page_count(2);
    let input = fake.document("in.pdf", b"%PDF-1.7 source");
    let output = fake.path().join("out.pdf");

    let err = remove_pages(&fake.settings(), &input, &output, "1-2").unwrap_err();
    assert!(matches!(err, PdfEditError::ValidationError(_)));
}

#[cfg(unix)]
#[test]
fn test_resave() {
    let fake = FakeTool::new();
    let input = fake.document("in.pdf", b"%PDF-1.7 source");
    let output = fake.path().join("resaved.pdf");

    resave(&fake.settings(), &input, &output).expect("resave");
    assert_eq!(std::fs::read(&output).expect("output"), b"%PDF-1.7 source");
    assert_eq!(fake.calls_starting_with("optimize"), 1);
}
