//! Listener registry for "command executed" notifications.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use uuid::Uuid;

/// Identifies one subscription.
pub type ListenerId = Uuid;

pub type CommandCallback = Arc<dyn Fn(&str) + Send + Sync + 'static>;

/// Thread-safe registry of callbacks that receive the textual identifier of
/// every command a dispatcher executed (e.g. `"lamp one"`, `"circle"`).
///
/// Each notification reaches each listener registered at that moment exactly
/// once. Callbacks run on the notifying thread, outside the registry lock, so
/// a callback may subscribe or unsubscribe.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use hue_rig::Notifier;
///
/// let notifier = Notifier::new();
/// let heard = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&heard);
/// let id = notifier.subscribe(move |text| sink.lock().unwrap().push(text.to_string()));
///
/// notifier.notify("red");
/// notifier.unsubscribe(&id);
/// notifier.notify("blue");
/// assert_eq!(*heard.lock().unwrap(), vec!["red"]);
/// ```
#[derive(Default)]
pub struct Notifier {
    listeners: Mutex<HashMap<ListenerId, CommandCallback>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F: Fn(&str) + Send + Sync + 'static>(&self, callback: F) -> ListenerId {
        let id = Uuid::new_v4();
        self.lock().insert(id, Arc::new(callback));
        id
    }

    /// Returns `false` if the listener was not registered.
    pub fn unsubscribe(&self, id: &ListenerId) -> bool {
        self.lock().remove(id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    pub fn notify(&self, command: &str) {
        let listeners: Vec<CommandCallback> = self.lock().values().cloned().collect();
        debug!("notifying {} listeners of {command:?}", listeners.len());
        for callback in listeners {
            callback(command);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ListenerId, CommandCallback>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscribe_unsubscribe() {
        let notifier = Notifier::new();
        let id = notifier.subscribe(|_| {});
        assert_eq!(notifier.listener_count(), 1);
        assert!(notifier.unsubscribe(&id));
        assert!(!notifier.unsubscribe(&id));
        assert_eq!(notifier.listener_count(), 0);
    }

    #[test]
    fn test_each_listener_called_once() {
        let notifier = Notifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            notifier.subscribe(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }

        notifier.notify("on");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_notify_from_many_threads() {
        let notifier = Arc::new(Notifier::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        notifier.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let notifier = Arc::clone(&notifier);
                std::thread::spawn(move || notifier.notify("line"))
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
