//! Shared first-error slot and insertion counter, threaded through every
//! pipeline stage: a write-once error slot, a cancellation token, and an
//! atomic running total.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

use crate::error::ImportError;

/// State shared by every decode and insertion worker in a single import run.
pub struct PipelineState {
    cancel: CancellationToken,
    first_error: Mutex<Option<ImportError>>,
    inserted: AtomicU64,
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            first_error: Mutex::new(None),
            inserted: AtomicU64::new(0),
        }
    }

    /// The cancellation token stages should race against every blocking
    /// channel operation.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Record a terminal error, if none has been recorded yet, and signal
    /// cancellation. First error wins.
    pub fn record_error(&self, err: ImportError) {
        let mut slot = self.first_error.lock().unwrap();
        if slot.is_none() {
            *slot = Some(err);
        }
        self.cancel.cancel();
    }

    pub fn add_inserted(&self, n: u64) {
        self.inserted.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inserted_count(&self) -> u64 {
        self.inserted.load(Ordering::Relaxed)
    }

    /// Take the first recorded error, leaving the slot empty.
    pub fn take_error(&self) -> Option<ImportError> {
        self.first_error.lock().unwrap().take()
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_wins() {
        let state = PipelineState::new();
        state.record_error(ImportError::Generic("first".into()));
        state.record_error(ImportError::Generic("second".into()));
        assert!(state.is_cancelled());
        match state.take_error() {
            Some(ImportError::Generic(msg)) => assert_eq!(msg, "first"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(state.take_error().is_none());
    }

    #[test]
    fn inserted_count_accumulates() {
        let state = PipelineState::new();
        state.add_inserted(3);
        state.add_inserted(4);
        assert_eq!(state.inserted_count(), 7);
    }
}
