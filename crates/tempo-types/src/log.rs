//! Diagnostics sink for the compilation pipeline.
//!
//! Every diagnostic carries the context of the attribute being compiled
//! ("Attribute invariant: ...", "Attribute provided: ...", "Attribute do:
//! ...") plus a message. Errors are tallied; a nonzero count after the
//! compilation pass fails model construction.

use std::fmt;

/// Severity of a [`Log`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub severity: Severity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{kind}: {}, {}", self.context, self.message)
    }
}

/// Collecting logger with error and warning counts.
#[derive(Debug, Clone, Default)]
pub struct Log {
    entries: Vec<Entry>,
    error_count: usize,
    warning_count: usize,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, context: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(context, %message, "attribute error");
        self.entries.push(Entry {
            severity: Severity::Error,
            context: context.to_string(),
            message,
        });
        self.error_count += 1;
    }

    pub fn warning(&mut self, context: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(context, %message, "attribute warning");
        self.entries.push(Entry {
            severity: Severity::Warning,
            context: context.to_string(),
            message,
        });
        self.warning_count += 1;
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}
