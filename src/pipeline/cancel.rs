use crate::errors::{TelemetryError, TelemetryResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between the caller and running extractions.
///
/// Clones observe the same flag. Work checks it between samples, chunks,
/// streams and videos; a read already in flight is allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation was requested
    pub fn check(&self) -> TelemetryResult<()> {
        if self.is_cancelled() {
            Err(TelemetryError::Cancelled)
        } else {
            Ok(())
        }
    }
}
