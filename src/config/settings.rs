use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// External PDF toolkit program.
    pub tool: String,
    /// Leading arguments inserted before every sub-command.
    pub tool_args: Vec<String>,
    pub command_timeout_secs: u64,
    pub analysis_timeout_secs: u64,
    /// Minimum fraction of pages an image group must cover to be reported.
    pub coverage_threshold: f64,
    /// Images below this size never qualify for prefix+size detection.
    pub min_overlay_size_kb: f64,
    pub preview_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            tool: "pdfcpu".to_string(),
            tool_args: Vec::new(),
            command_timeout_secs: 30,
            analysis_timeout_secs: 60,
            coverage_threshold: 0.8,
            min_overlay_size_kb: 30.0,
            preview_dir: PathBuf::from("previews"),
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let settings: Settings = serde_yml::from_str(yaml).map_err(|e| {
            crate::error::PdfEditError::config(format!("Failed to parse settings YAML: {e}"))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// 設定値の範囲を検証する。
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.tool.trim().is_empty() {
            return Err(crate::error::PdfEditError::config("tool must not be empty"));
        }
        if !(self.coverage_threshold > 0.0 && self.coverage_threshold <= 1.0) {
            return Err(crate::error::PdfEditError::config(format!(
                "coverage_threshold must be in (0, 1], got {}",
                self.coverage_threshold
            )));
        }
        if self.min_overlay_size_kb.is_nan() || self.min_overlay_size_kb < 0.0 {
            return Err(crate::error::PdfEditError::config(format!(
                "min_overlay_size_kb must not be negative, got {}",
                self.min_overlay_size_kb
            )));
        }
        if self.command_timeout_secs == 0 || self.analysis_timeout_secs == 0 {
            return Err(crate::error::PdfEditError::config(
                "timeouts must be at least one second",
            ));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }
}
