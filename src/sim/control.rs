//! Cooperative cancellation for long trajectories.
//!
//! A trajectory checks its [`RunControl`] once per event. The step budget stays
//! the primary guard; the token lets a caller abort a whole batch (for example
//! a Monte Carlo sweep running on the rayon pool) and the deadline bounds wall
//! time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared flag; clones observe the same cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Cancellation sources checked by a running trajectory.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    pub cancel: Option<CancelToken>,
    pub deadline: Option<Instant>,
}

impl RunControl {
    /// No cancellation; only the step budget applies.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_token(token: CancelToken) -> Self {
        Self {
            cancel: Some(token),
            deadline: None,
        }
    }

    /// Abort once `timeout` of wall time has elapsed from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn should_stop(&self) -> bool {
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                return true;
            }
        }
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_clones_share_state() {
        let token = CancelToken::new();
        let control = RunControl::with_token(token.clone());
        assert!(!control.should_stop());
        token.cancel();
        assert!(control.should_stop());
    }

    #[test]
    fn expired_deadline_stops() {
        let control = RunControl::none().with_timeout(Duration::ZERO);
        assert!(control.should_stop());
        assert!(!RunControl::none().should_stop());
    }
}
