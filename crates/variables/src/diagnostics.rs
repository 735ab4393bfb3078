//! Structured diagnostics emitted while binding variables.
//!
//! The evaluator never logs through a global; every event goes to the
//! [`DiagnosticsSink`] it was constructed with.
use core::fmt;
use std::cell::RefCell;

pub const UNKNOWN_VARIABLE: &str = "variable.unknown";
pub const NO_BINDING: &str = "variable.no-binding";
pub const DUPLICATE_FACT: &str = "partition.duplicate";
pub const IDENTITY_FAILURE: &str = "partition.identity";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub category: &'static str,
    pub message: String,
    pub details: Vec<(String, String)>,
}

impl Diagnostic {
    pub fn new(severity: Severity, category: &'static str, message: impl Into<String>) -> Self {
        Self { severity, category, message: message.into(), details: Vec::new() }
    }

    pub fn error(category: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    pub fn warning(category: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, message)
    }

    pub fn debug(category: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Debug, category, message)
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.details.push((key.into(), value.to_string()));
        self
    }

    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)?;
        for (k, v) in &self.details {
            write!(f, " {k}={v}")?;
        }
        Ok(())
    }
}

pub trait DiagnosticsSink {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing` at the matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn report(&self, d: Diagnostic) {
        let category = d.category;
        match d.severity {
            Severity::Debug => tracing::debug!(category, "{d}"),
            Severity::Info => tracing::info!(category, "{d}"),
            Severity::Warning => tracing::warn!(category, "{d}"),
            Severity::Error => tracing::error!(category, "{d}"),
        }
    }
}

/// Keeps every reported diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    events: RefCell<Vec<Diagnostic>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.borrow().clone()
    }

    pub fn in_category(&self, category: &str) -> Vec<Diagnostic> {
        self.events.borrow().iter().filter(|d| d.category == category).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl DiagnosticsSink for CollectingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        self.events.borrow_mut().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_keeps_order_and_details() {
        let sink = CollectingDiagnostics::new();
        sink.report(Diagnostic::error(UNKNOWN_VARIABLE, "no such variable").with_detail("variable", "a"));
        sink.report(Diagnostic::debug(DUPLICATE_FACT, "dropped"));
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].detail("variable"), Some("a"));
        assert_eq!(sink.in_category(DUPLICATE_FACT)[0].severity, Severity::Debug);
        assert_eq!(events[0].to_string(), "[variable.unknown] no such variable variable=a");
    }
}
