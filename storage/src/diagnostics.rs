//! Failure channel for absorbed persistence errors.

use crate::PersistenceFailure;

/// Receives persistence failures that were not surfaced to callers
///
/// Implementations must not panic; they are called on the write path of
/// every persisted value.
pub trait DiagnosticsSink: Send + Sync {
    /// Record one failure
    fn record(&self, failure: &PersistenceFailure);
}

/// Default sink: logs each failure as a `tracing` warning
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn record(&self, failure: &PersistenceFailure) {
        tracing::warn!(
            key = %failure.key,
            operation = %failure.operation,
            error = %failure.error,
            "Persistence failed, keeping in-memory value"
        );
    }
}
