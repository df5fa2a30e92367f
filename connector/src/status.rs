//! Status tracker holding the current connection status and its observers.

use std::sync::{Arc, Mutex, PoisonError};

use sage_types::{ConnectionStatus, InvalidTransition};

/// Callback invoked with the new status after every explicit change.
pub type StatusObserver = Arc<dyn Fn(ConnectionStatus) + Send + Sync>;

/// Owns the connection status and notifies observers on every transition.
///
/// Observers run in registration order, exactly once per change, with no
/// deduplication of repeated states. They are invoked outside the registry
/// lock, so an observer may subscribe further observers or read the status.
pub(crate) struct StatusTracker {
    current: Mutex<ConnectionStatus>,
    observers: Mutex<Vec<StatusObserver>>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(ConnectionStatus::default()),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn get(&self) -> ConnectionStatus {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, observer: StatusObserver) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Commit `next` and notify observers. Edges outside the status machine
    /// are rejected and leave the status untouched.
    pub fn set(&self, next: ConnectionStatus) -> Result<(), InvalidTransition> {
        let previous = {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            let previous = *current;
            *current = previous.transition(next)?;
            previous
        };
        tracing::debug!(from = %previous, to = %next, "connection status changed");

        let observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in &observers {
            observer(next);
        }
        Ok(())
    }

    /// Drop every observer.
    pub fn clear_observers(&self) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[cfg(test)]
    pub fn observer_count(&self) -> usize {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
