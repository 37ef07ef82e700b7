//! Observable value cell shared by the selection and filter state.
//!
//! Publishing is synchronous: `set` stores the value and calls every
//! listener before returning. A publish lock serializes concurrent `set`
//! calls, so each listener sees values in exactly the order they were set.
//! Listeners must not call `set` on the cell that is notifying them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
    value: RwLock<T>,
    listeners: Mutex<Vec<(u64, Listener<T>)>>,
    publish: Mutex<()>,
    next_id: AtomicU64,
}

/// Shared value with change listeners. Clones refer to the same cell.
pub struct Observable<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default + Clone + Send + Sync + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: RwLock::new(initial),
                listeners: Mutex::new(Vec::new()),
                publish: Mutex::new(()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.inner
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Store `value` and notify every listener registered at this moment.
    pub fn set(&self, value: T) {
        let _publishing = self
            .inner
            .publish
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.store_and_notify(value);
    }

    /// Like [`set`](Self::set), but a value equal to the current one is
    /// dropped without notifying. The comparison happens under the publish
    /// lock, so of several racing callers with the same value only the
    /// first one publishes.
    ///
    /// Returns the replaced value when the cell changed.
    pub fn set_if_changed(&self, value: T) -> Option<T>
    where
        T: PartialEq,
    {
        let _publishing = self
            .inner
            .publish
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let previous = self.get();
        if previous == value {
            return None;
        }
        self.store_and_notify(value);
        Some(previous)
    }

    /// Caller must hold the publish lock.
    fn store_and_notify(&self, value: T) {
        *self
            .inner
            .value
            .write()
            .unwrap_or_else(PoisonError::into_inner) = value.clone();

        // Snapshot so listeners may subscribe or unsubscribe while notified
        let listeners: Vec<Listener<T>> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(&value);
        }
    }

    /// Register a listener for future values. The current value is not replayed.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));

        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner
                        .listeners
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .retain(|(listener_id, _)| *listener_id != id);
                }
            })),
        }
    }
}

/// Handle for a registered listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
