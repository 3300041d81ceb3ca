//! Observable state container.
//!
//! [`Store`] wraps a value and notifies subscribers synchronously on every
//! mutation. It is the uniform mechanism through which the stores expose
//! their state to a UI.
//!
//! Mutations run their closure under the value lock, so an `update` always
//! sees the current value even when the operations that caused two updates
//! resolved close together; never stage a mutation against a value captured
//! before an intervening await.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Shared<T> {
    value: RwLock<T>,
    version: AtomicU64,
    subscribers: Mutex<Vec<(u64, Listener<T>)>>,
    next_subscriber_id: AtomicU64,
    /// Version of the newest snapshot delivered to listeners. Guards
    /// delivery so a slower notification never overtakes a newer one.
    delivered: Mutex<u64>,
}

/// A subscribable value holder.
///
/// Cloning a `Store` clones a handle to the same underlying value.
pub struct Store<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Store<T> {
    pub fn new(initial: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                value: RwLock::new(initial),
                version: AtomicU64::new(0),
                subscribers: Mutex::new(Vec::new()),
                next_subscriber_id: AtomicU64::new(0),
                delivered: Mutex::new(0),
            }),
        }
    }

    /// Returns a clone of the current value.
    pub fn read(&self) -> T {
        self.shared.value.read().unwrap().clone()
    }

    /// Replaces the value and notifies subscribers.
    pub fn set(&self, value: T) {
        self.update(move |current| *current = value);
    }

    /// Mutates the current value in place and notifies subscribers.
    ///
    /// The closure runs under the value lock; listeners are invoked after
    /// the lock is released, in subscription order. Each notification
    /// carries the version assigned under the lock, and delivery keeps
    /// versions monotonic: when two updates race, the one that lost the
    /// lock never delivers its older snapshot after the newer one. A
    /// listener may therefore miss an intermediate value, but the last
    /// value it sees is always the newest.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let (version, snapshot) = {
            let mut guard = self.shared.value.write().unwrap();
            f(&mut guard);
            let version = self.shared.version.fetch_add(1, Ordering::SeqCst) + 1;
            (version, guard.clone())
        };
        self.notify(version, &snapshot);
    }

    /// Monotonically increasing mutation counter.
    pub fn version(&self) -> u64 {
        self.shared.version.load(Ordering::SeqCst)
    }

    /// Registers a listener invoked with the new value on every mutation.
    ///
    /// The listener is removed when the returned [`Subscription`] is
    /// dropped or explicitly unsubscribed.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.shared.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        self.shared
            .subscribers
            .lock()
            .unwrap()
            .push((id, Arc::new(listener)));

        let weak = Arc::downgrade(&self.shared);
        Subscription {
            cancel: Some(Box::new(move || Self::remove_subscriber(&weak, id))),
        }
    }

    /// Creates a read-only projection of this store.
    ///
    /// The projection recomputes only when the source notifies; reads hit
    /// the cached value.
    pub fn derive<U>(&self, f: impl Fn(&T) -> U + Send + Sync + 'static) -> Derived<U>
    where
        U: Clone + Send + Sync + 'static,
    {
        let inner = Store::new(f(&self.read()));
        let sink = inner.clone();
        let subscription = self.subscribe(move |value| sink.set(f(value)));
        Derived {
            inner,
            _source: subscription,
        }
    }

    /// Delivers a snapshot to listeners unless a newer one already went
    /// out. The delivery lock is held across the listener calls, so
    /// listeners must not mutate the store they observe.
    fn notify(&self, version: u64, value: &T) {
        let mut delivered = self.shared.delivered.lock().unwrap();
        if version <= *delivered {
            return;
        }
        *delivered = version;
        // Snapshot so listeners may subscribe/unsubscribe reentrantly.
        let listeners: Vec<Listener<T>> = self
            .shared
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(value);
        }
    }

    fn remove_subscriber(shared: &Weak<Shared<T>>, id: u64) {
        if let Some(shared) = shared.upgrade() {
            shared
                .subscribers
                .lock()
                .unwrap()
                .retain(|(sub_id, _)| *sub_id != id);
        }
    }
}

/// Handle to an active store subscription; unsubscribes on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Explicitly removes the listener.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// A read-only store derived from another store.
pub struct Derived<U> {
    inner: Store<U>,
    _source: Subscription,
}

impl<U: Clone + Send + Sync + 'static> Derived<U> {
    pub fn read(&self) -> U {
        self.inner.read()
    }

    pub fn subscribe(&self, listener: impl Fn(&U) + Send + Sync + 'static) -> Subscription {
        self.inner.subscribe(listener)
    }
}
