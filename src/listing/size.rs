/// サイズ文字列（例: "30KB", "35.2kb", "1,024 B"）をKB単位の数値に変換する。
///
/// 単位なし・"B" はバイトとみなす。解析できない場合は 0 を返す。
pub fn parse_file_size_kb(size: &str) -> f64 {
    let normalized: String = size
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    let split = normalized
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(normalized.len());
    let (num_str, unit) = normalized.split_at(split);

    let Ok(num) = num_str.parse::<f64>() else {
        return 0.0;
    };

    match unit.chars().next() {
        Some('K') => num,
        Some('M') => num * 1024.0,
        Some('G') => num * 1024.0 * 1024.0,
        _ => num / 1024.0,
    }
}

/// True for tokens shaped like a byte size: a leading digit and a byte-unit suffix.
pub fn looks_like_size(token: &str) -> bool {
    let upper = token.trim().to_uppercase();
    let starts_numeric = upper.chars().next().is_some_and(|c| c.is_ascii_digit());
    let unit_suffix = ["KB", "MB", "GB", "B"]
        .iter()
        .any(|unit| upper.ends_with(unit));
    starts_numeric && unit_suffix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(parse_file_size_kb("30KB"), 30.0);
        assert_eq!(parse_file_size_kb("35.2kb"), 35.2);
        assert_eq!(parse_file_size_kb("2 MB"), 2048.0);
        assert_eq!(parse_file_size_kb("1GB"), 1024.0 * 1024.0);
        assert_eq!(parse_file_size_kb("1,024 B"), 1.0);
        assert_eq!(parse_file_size_kb("2048"), 2.0);
        assert_eq!(parse_file_size_kb("12K"), 12.0);
    }

    #[test]
    fn test_unparsable_is_zero() {
        assert_eq!(parse_file_size_kb(""), 0.0);
        assert_eq!(parse_file_size_kb("KB"), 0.0);
        assert_eq!(parse_file_size_kb("n/a"), 0.0);
    }

    #[test]
    fn test_looks_like_size() {
        assert!(looks_like_size("35.2KB"));
        assert!(looks_like_size("512B"));
        assert!(looks_like_size("1 MB"));
        assert!(!looks_like_size("DeviceRGB"));
        assert!(!looks_like_size("KB"));
        assert!(!looks_like_size("800"));
    }
}
