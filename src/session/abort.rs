use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{ReelpressError, ReelpressResult};

/// Cooperative cancellation flag shared between a host and a running export.
///
/// Clones observe the same flag. Engines poll it at frame boundaries and before spawning
/// external processes.
#[derive(Clone, Debug, Default)]
pub struct AbortSignal {
    flag: Arc<AtomicBool>,
}

impl AbortSignal {
    /// Create a signal in the not-aborted state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation has been requested.
    pub fn check(&self) -> ReelpressResult<()> {
        if self.is_aborted() {
            Err(ReelpressError::Cancelled)
        } else {
            Ok(())
        }
    }
}
