use std::time::Duration;

use thiserror::Error;

/// Maximum number of characters of captured tool output shown in an error message.
pub const OUTPUT_EXCERPT_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum PdfEditError {
    #[error("{command} timed out after {timeout:?}")]
    ExternalToolTimeout { command: String, timeout: Duration },

    #[error("{command} failed ({status}){}", excerpt_suffix(.output))]
    ExternalToolFailure {
        command: String,
        status: String,
        /// Full combined stdout/stderr of the failed invocation.
        output: String,
    },

    #[error("Parse failure: {0}")]
    ParseFailure(String),

    #[error("No match found: {0}")]
    NoMatchFound(String),

    #[error("Unsupported removal: {0}")]
    UnsupportedRemoval(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`PdfEditError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl PdfEditError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a parse failure.
    parse => ParseFailure,
    /// Create a no-match error.
    no_match => NoMatchFound,
    /// Create an unsupported-removal error.
    unsupported_removal => UnsupportedRemoval,
    /// Create a validation error.
    validation => ValidationError,
    /// Create a configuration error.
    config => ConfigError,
    /// Create an image error.
    image => ImageError,
}

impl PdfEditError {
    /// Captured tool output carried by the error, if any.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            Self::ExternalToolFailure { output, .. } => Some(output),
            _ => None,
        }
    }

    /// True when the tool output of a failed call contains `phrase` (case-insensitive).
    pub fn output_mentions(&self, phrase: &str) -> bool {
        self.tool_output()
            .is_some_and(|out| out.to_lowercase().contains(&phrase.to_lowercase()))
    }
}

/// Truncate `text` to at most `max` characters, appending `...` when cut.
pub fn excerpt(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

fn excerpt_suffix(output: &str) -> String {
    if output.trim().is_empty() {
        String::new()
    } else {
        format!(": {}", excerpt(output, OUTPUT_EXCERPT_LEN))
    }
}

impl From<serde_yml::Error> for PdfEditError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for PdfEditError {
    fn from(e: serde_json::Error) -> Self {
        Self::ParseFailure(e.to_string())
    }
}

impl From<image::ImageError> for PdfEditError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PdfEditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_keeps_short_text() {
        assert_eq!(excerpt("  short output \n", 200), "short output");
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let text = "│".repeat(300);
        let cut = excerpt(&text, 10);
        assert_eq!(cut, format!("{}...", "│".repeat(10)));
    }

    #[test]
    fn test_tool_failure_display_is_bounded() {
        let err = PdfEditError::ExternalToolFailure {
            command: "pdfcpu info".to_string(),
            status: "exit code 1".to_string(),
            output: "x".repeat(1000),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("pdfcpu info failed (exit code 1): "));
        assert!(msg.len() < 300, "message should be bounded, got {} bytes", msg.len());
        assert_eq!(err.tool_output().map(str::len), Some(1000));
    }

    #[test]
    fn test_output_mentions_is_case_insensitive() {
        let err = PdfEditError::ExternalToolFailure {
            command: "pdfcpu watermark remove".to_string(),
            status: "exit code 1".to_string(),
            output: "pdfcpu: No Watermarks Found".to_string(),
        };
        assert!(err.output_mentions("no watermarks found"));
        assert!(!PdfEditError::validation("x").output_mentions("x"));
    }
}
