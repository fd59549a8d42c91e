//! Observer trait for workflow state changes.
//!
//! Register an [`Arc<dyn WorkflowObserver>`] with
//! [`crate::WorkflowEngine::add_observer`] to be told about every
//! transition. This is the read-only "current state" feed a front end renders
//! from: a CLI spinner, a websocket push, a log line.
//!
//! # Example
//!
//! ```rust
//! use pdf2xlsx::{WorkflowObserver, WorkflowState};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct History(Mutex<Vec<&'static str>>);
//!
//! impl WorkflowObserver for History {
//!     fn on_transition(&self, _from: &'static str, to: &WorkflowState) {
//!         self.0.lock().unwrap().push(to.name());
//!     }
//! }
//!
//! let history = Arc::new(History::default());
//! history.on_transition("idle", &WorkflowState::Processing);
//! assert_eq!(*history.0.lock().unwrap(), vec!["processing"]);
//! ```

use crate::error::PipelineError;
use crate::state::WorkflowState;
use std::sync::Arc;

/// Called by the engine as it moves between states.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The engine calls observers from whichever task
/// drives it, hence `Send + Sync`.
pub trait WorkflowObserver: Send + Sync {
    /// Called after every state change.
    ///
    /// # Arguments
    /// * `from` — name of the state that was left
    /// * `to`   — the state now active
    fn on_transition(&self, from: &'static str, to: &WorkflowState) {
        let _ = (from, to);
    }

    /// Called when a pipeline step fails, before the transition to failed.
    ///
    /// # Arguments
    /// * `error`   — the classified failure
    /// * `message` — the localized text the failed state will carry
    fn on_failure(&self, error: &PipelineError, message: &str) {
        let _ = (error, message);
    }

    /// Called after a successful conversion was counted.
    ///
    /// # Arguments
    /// * `total` — the persisted total after the increment
    fn on_conversion_counted(&self, total: u64) {
        let _ = total;
    }
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl WorkflowObserver for NoopObserver {}

/// Convenience alias for the type the engine stores.
pub type SharedObserver = Arc<dyn WorkflowObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    struct TrackingObserver {
        transitions: AtomicUsize,
        failures: AtomicUsize,
        last_total: AtomicU64,
    }

    impl WorkflowObserver for TrackingObserver {
        fn on_transition(&self, _from: &'static str, _to: &WorkflowState) {
            self.transitions.fetch_add(1, Ordering::SeqCst);
        }

        fn on_failure(&self, _error: &PipelineError, _message: &str) {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_counted(&self, total: u64) {
            self.last_total.store(total, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let obs = NoopObserver;
        obs.on_transition("idle", &WorkflowState::Merging);
        obs.on_failure(&PipelineError::unknown("x"), "x");
        obs.on_conversion_counted(3);
    }

    #[test]
    fn tracking_observer_receives_events() {
        let obs = TrackingObserver {
            transitions: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            last_total: AtomicU64::new(0),
        };
        obs.on_transition("idle", &WorkflowState::Processing);
        obs.on_transition("processing", &WorkflowState::Idle);
        obs.on_failure(&PipelineError::unknown("x"), "x");
        obs.on_conversion_counted(7);

        assert_eq!(obs.transitions.load(Ordering::SeqCst), 2);
        assert_eq!(obs.failures.load(Ordering::SeqCst), 1);
        assert_eq!(obs.last_total.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn arc_dyn_observer_works() {
        let obs: SharedObserver = Arc::new(NoopObserver);
        obs.on_transition("idle", &WorkflowState::Idle);
    }
}
