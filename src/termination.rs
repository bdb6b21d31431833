//! Cooperative cancellation for long-running compiles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{FabricError, Result};

/// Shared flag checked by the compiler between feature files and between
/// major phases. Cloning shares the underlying flag.
#[derive(Clone, Debug, Default)]
pub struct TerminationFlag {
    stop: Arc<AtomicBool>,
}

impl TerminationFlag {
    /// A flag that never terminates unless [`terminate`](Self::terminate)
    /// is called.
    pub fn running_true() -> Self {
        Self::default()
    }

    pub fn running(&self) -> bool {
        !self.stop.load(Ordering::Relaxed)
    }

    /// Requests termination. Takes effect at the next check point.
    pub fn terminate(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn check(&self) -> Result<()> {
        if self.running() {
            Ok(())
        } else {
            Err(FabricError::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_starts_running() {
        let flag = TerminationFlag::running_true();
        assert!(flag.running());
        assert!(flag.check().is_ok());
    }

    #[test]
    fn test_terminate_is_shared_across_clones() {
        let flag = TerminationFlag::running_true();
        let clone = flag.clone();
        clone.terminate();
        assert!(!flag.running());
        assert!(matches!(flag.check(), Err(FabricError::Cancelled)));
    }
}
