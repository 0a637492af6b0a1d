//! Cooperative cancellation handle threaded through the scanner, collector,
//! renderer, and provider calls. Every loop iteration and I/O call checks
//! it; there is no preemption.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, ShotgunError};

#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns `Err(ShotgunError::Cancelled)` if cancellation has been
    /// requested; otherwise `Ok(())`. Call at loop heads and before I/O.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ShotgunError::Cancelled)
        } else {
            Ok(())
        }
    }
}
