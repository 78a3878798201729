//! Search limits, cancellation, and termination reporting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{EngineError, EngineResult};

/// Budgets for one `search` call.
///
/// `deadline_ms` semantics: `None` means unlimited; `Some(0)` means "return
/// the result of iteration 1"; any other value is a wall-clock budget checked
/// between nodes. A negative deadline is unrepresentable by construction.
#[derive(Debug, Clone)]
pub struct SearchLimits {
    /// Stop after finishing the iteration that reached this depth.
    pub max_depth: u8,
    /// Soft node cap; the search stops between nodes once exceeded.
    pub max_nodes: Option<u64>,
    /// Wall-clock budget in milliseconds.
    pub deadline_ms: Option<u64>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_depth: 6,
            max_nodes: None,
            deadline_ms: None,
        }
    }
}

impl SearchLimits {
    pub fn depth(max_depth: u8) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.max_depth < 1 {
            return Err(EngineError::LimitsError(
                "max_depth must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Shared early-termination flag. Cloning shares the underlying flag, so a
/// caller can hand one end to the worker and keep the other.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

/// Why the search returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// All requested iterations finished.
    Completed,
    /// The wall-clock deadline fired; the best completed iteration is
    /// reported.
    Deadline,
    /// The cancel token was set.
    Cancelled,
    /// The node cap was exceeded.
    NodeCap,
}
