//! Structured diagnostics emitted while building the instruction registry.
//!
//! Diagnostics are recorded as values so the hosting application decides how
//! to present them; each one is also forwarded to `tracing` when recorded.

use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Recoverable: the offending definition was skipped.
    Warning,
    /// Unrecoverable: the registry could not be built.
    Fatal,
}

/// A single diagnostic signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity of the signal.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// Create a warning.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    /// Create a fatal diagnostic.
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Fatal,
            message: message.into(),
        }
    }

    /// Forward this diagnostic to the `tracing` subscriber.
    pub(crate) fn emit(&self) {
        match self.severity {
            Severity::Warning => tracing::warn!(target: "vsim::registry", "{}", self.message),
            Severity::Fatal => tracing::error!(target: "vsim::registry", "{}", self.message),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Fatal => write!(f, "fatal"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::warning("duplicated instruction name: 'add', skip this");
        assert_eq!(
            diag.to_string(),
            "warning: duplicated instruction name: 'add', skip this"
        );
        assert_eq!(Diagnostic::fatal("boom").severity, Severity::Fatal);
    }
}
