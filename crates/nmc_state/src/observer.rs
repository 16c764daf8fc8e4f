//! Explicit observer list for state changes.

use tracing::trace;

use crate::state::AppState;

/// A callback run with the new state after every change.
pub type Observer = Box<dyn FnMut(&AppState) + Send>;

/// Identifies one subscription, for [`Observers::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subscription(u64);

/// Observers in subscription order.
#[derive(Default)]
pub struct Observers {
    next_id: u64,
    entries: Vec<(Subscription, Observer)>,
}

impl Observers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Observer) -> Subscription {
        let id = Subscription(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    /// Returns `true` if the subscription existed.
    pub fn unsubscribe(&mut self, id: Subscription) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    /// Run every observer with `state`, synchronously and in order.
    pub fn notify(&mut self, state: &AppState) {
        trace!(observers = self.entries.len(), "notifying observers");
        for (_, observer) in &mut self.entries {
            observer(state);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::config::StoreConfig;

    #[test]
    fn test_notify_in_subscription_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut observers = Observers::new();
        for name in ["first", "second"] {
            let log = Arc::clone(&log);
            observers.subscribe(Box::new(move |_| log.lock().unwrap().push(name)));
        }
        observers.notify(&AppState::new(&StoreConfig::new("/tmp/nmc")));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_unsubscribe() {
        let calls = Arc::new(Mutex::new(0));
        let mut observers = Observers::new();
        let counter = Arc::clone(&calls);
        let id = observers.subscribe(Box::new(move |_| *counter.lock().unwrap() += 1));
        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        observers.notify(&AppState::new(&StoreConfig::new("/tmp/nmc")));
        assert_eq!(*calls.lock().unwrap(), 0);
        assert!(observers.is_empty());
    }
}
