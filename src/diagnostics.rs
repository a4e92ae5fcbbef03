//! Diagnostic sink for non-fatal construction events
//!
//! Graph construction distinguishes recoverable data-quality conditions
//! (an edge to code the dataflow pass proved unreachable) from internal
//! invariant violations. Both are reported through a [`DiagnosticSink`]
//! that is passed into the components explicitly, so tests can capture
//! diagnostics without touching global logger state.

use once_cell::sync::Lazy;
use std::sync::Arc;

/// Receiver for diagnostics emitted during graph construction
pub trait DiagnosticSink: Send + Sync {
    /// Report a recoverable condition (e.g. a skipped edge to unreachable code)
    fn warn(&self, message: &str);

    /// Report an internal invariant violation
    fn error(&self, message: &str);

    /// Report informational output (e.g. instruction dumps)
    fn info(&self, message: &str) {
        let _ = message;
    }
}

/// Default sink forwarding to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn warn(&self, message: &str) {
        log::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        log::error!("{}", message);
    }

    fn info(&self, message: &str) {
        log::debug!("{}", message);
    }
}

static DEFAULT_SINK: Lazy<Arc<dyn DiagnosticSink>> = Lazy::new(|| Arc::new(LogSink));

/// Shared default sink backed by [`LogSink`]
pub fn default_sink() -> Arc<dyn DiagnosticSink> {
    Arc::clone(&DEFAULT_SINK)
}
