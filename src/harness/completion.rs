//! Single-shot completion guard.

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::{Error, Result};

// ============================================================================
// CompletionState
// ============================================================================

/// Completion state of a test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    /// The test body has not signalled completion.
    Running,
    /// Completion was signalled.
    Completed,
}

// ============================================================================
// CompletionGuard
// ============================================================================

/// Guards the `Running -> Completed` transition.
///
/// The first [`complete`](Self::complete) notifies the runner; later calls
/// fail and are recorded as misuse.
#[derive(Debug)]
pub(crate) struct CompletionGuard {
    state: Mutex<CompletionState>,
    misuse: Mutex<Vec<String>>,
}

impl CompletionGuard {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(CompletionState::Running),
            misuse: Mutex::new(Vec::new()),
        }
    }

    /// Transitions to `Completed` and signals `done`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolViolation`] if the run was already completed.
    pub(crate) fn complete(&self, done: &mpsc::UnboundedSender<()>) -> Result<()> {
        {
            let mut state = self.state.lock();
            if *state == CompletionState::Running {
                *state = CompletionState::Completed;
                let _ = done.send(());
                return Ok(());
            }
        }

        let message = "completeTest called on an already completed run".to_string();
        warn!("{message}");
        self.misuse.lock().push(message.clone());
        Err(Error::protocol_violation(message))
    }

    pub(crate) fn state(&self) -> CompletionState {
        *self.state.lock()
    }

    pub(crate) fn take_misuse(&self) -> Vec<String> {
        std::mem::take(&mut *self.misuse.lock())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_completion_signals() {
        let guard = CompletionGuard::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        assert_eq!(guard.state(), CompletionState::Running);
        guard.complete(&tx).expect("first completion");
        assert_eq!(guard.state(), CompletionState::Completed);
        assert_eq!(rx.try_recv(), Ok(()));
    }

    #[test]
    fn test_second_completion_is_flagged() {
        let guard = CompletionGuard::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        guard.complete(&tx).expect("first completion");
        let err = guard.complete(&tx).expect_err("second completion");
        assert!(err.is_protocol_violation());

        assert_eq!(rx.try_recv(), Ok(()));
        assert!(rx.try_recv().is_err());
        assert_eq!(guard.take_misuse().len(), 1);
        assert!(guard.take_misuse().is_empty());
    }
}
