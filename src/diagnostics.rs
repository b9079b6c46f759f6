// Per-call diagnostic log
//
// Collected by value and returned inside analysis/removal results; every entry is
// mirrored to `tracing` as it is recorded.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Debug,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
}

/// Ordered, append-only list of diagnostics for one operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("{message}");
        self.entries.push(Diagnostic {
            level: DiagnosticLevel::Debug,
            message,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.entries.push(Diagnostic {
            level: DiagnosticLevel::Warning,
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Warning)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append all entries of `other`, preserving order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}
