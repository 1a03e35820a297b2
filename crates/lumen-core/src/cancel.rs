//! Caller-supplied cancellation for engine operations.
//!
//! Engine operations check the token before every store call. Once the token
//! is cancelled or its deadline has passed, the pending call fails with
//! [`ReputationError::Cancelled`] and the error propagates unchanged.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::ReputationError;

/// Cancellation flag with an optional deadline. Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A token that never trips unless [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that trips once `timeout` has elapsed from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail with [`ReputationError::Cancelled`] naming `op` when tripped.
    pub fn check(&self, op: &'static str) -> Result<(), ReputationError> {
        if self.is_cancelled() {
            return Err(ReputationError::Cancelled(op));
        }
        Ok(())
    }
}
