//! Non-fatal decode diagnostics.
//!
//! Some cells are decoded leniently: an unsupported wire type or a malformed
//! JSON document becomes `NULL` instead of failing the whole row. Those events
//! are reported to a [`DiagnosticSink`] so callers can route them wherever
//! they like.

use std::fmt;
use std::sync::{Mutex, PoisonError};

/// What went wrong while decoding a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The column's wire type has no decoder
    UnsupportedColumnType,
    /// A JSON column held text that does not parse
    JsonFallbackFailure,
}

impl DiagnosticKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::UnsupportedColumnType => "unsupported_column_type",
            DiagnosticKind::JsonFallbackFailure => "json_fallback_failure",
        }
    }
}

/// One decode diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub column: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in column '{}': {}",
            self.kind.as_str(),
            self.column,
            self.message
        )
    }
}

/// Destination for decode diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Emits diagnostics as `tracing` warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::warn!(
            kind = diagnostic.kind.as_str(),
            column = %diagnostic.column,
            message = %diagnostic.message,
            "cell decoded as NULL"
        );
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all diagnostics collected so far.
    pub fn drain(&self) -> Vec<Diagnostic> {
        let mut guard = self
            .diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *guard)
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_drains() {
        let sink = CollectingSink::new();
        sink.report(Diagnostic {
            kind: DiagnosticKind::JsonFallbackFailure,
            column: "payload".to_string(),
            message: "expected value at line 1 column 1".to_string(),
        });
        let drained = sink.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(
            drained[0].to_string(),
            "json_fallback_failure in column 'payload': expected value at line 1 column 1"
        );
        assert!(sink.drain().is_empty());
    }
}
