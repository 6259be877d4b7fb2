//! Progress reporting for long-running loads and ingestion passes.
//!
//! [`ProgressCallback`] keeps the pipeline independent of how progress is
//! rendered. A callback is handed to a single call and lives only as long
//! as that call needs it; there is no process-wide progress state.

use std::sync::Arc;

/// Receives progress updates from a single load or ingestion pass.
///
/// Implementations must be `Send + Sync` so they can be shared with
/// blocking worker threads.
pub trait ProgressCallback: Send + Sync {
    /// Sets the current position (absolute, not delta).
    fn set_position(&self, pos: u64);

    /// Replaces the status message.
    fn set_message(&self, msg: String);

    /// Marks the work as complete with a final message.
    fn finish(&self, msg: String);

    /// Marks the work as complete and removes any indicator.
    fn finish_and_clear(&self);
}

/// Ignores every update. Used by tests and library callers that do not
/// render progress.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_position(&self, _pos: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
