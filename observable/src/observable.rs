mod flat_map;
mod map;
mod read;

pub use read::*;

use std::sync::{
    Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    broadcast::{Broadcast, BroadcastId},
    porcelain::SubscriptionGuard,
};

/// A single-value reactive cell.
///
/// An `Observable` always holds exactly one value. Every call to [`Observable::set`]
/// synchronously notifies all registered observers with the new value, in the order
/// they subscribed, before it returns.
///
/// Cloning an `Observable` shares the same underlying value and observers.
pub struct Observable<T>(Arc<Inner<T>>);

struct Inner<T> {
    value: RwLock<T>,
    broadcast: Broadcast<T>,
    /// Bumped under the value lock on every write
    version: AtomicU64,
    /// Subscriptions this cell holds on the cells it is derived from
    upstream: Mutex<Vec<SubscriptionGuard>>,
}

impl<T> Inner<T> {
    fn read(&self) -> RwLockReadGuard<'_, T> { self.value.read().unwrap_or_else(|poisoned| poisoned.into_inner()) }
    fn write(&self) -> RwLockWriteGuard<'_, T> { self.value.write().unwrap_or_else(|poisoned| poisoned.into_inner()) }
}

/// A non-owning reference to an observable, held by the listeners that write into derived cells
pub(crate) struct WeakObservable<T>(Weak<Inner<T>>);

impl<T> Clone for WeakObservable<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> WeakObservable<T> {
    pub(crate) fn upgrade(&self) -> Option<Observable<T>> { self.0.upgrade().map(Observable) }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self { Self(Arc::clone(&self.0)) }
}

impl<T> Observable<T> {
    /// Calls a closure with a borrow of the current value
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R { f(&*self.0.read()) }

    /// Identity of this cell, shared by all of its clones
    pub fn id(&self) -> BroadcastId { self.0.broadcast.id() }

    /// Whether two handles refer to the same cell
    pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }

    /// Number of observers currently registered on this cell
    pub fn observer_count(&self) -> usize { self.0.broadcast.len() }

    pub(crate) fn downgrade(&self) -> WeakObservable<T> { WeakObservable(Arc::downgrade(&self.0)) }

    /// Ties the lifetime of an upstream subscription to this cell
    pub(crate) fn hold(&self, guard: SubscriptionGuard) {
        self.0.upstream.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(guard);
    }
}

impl<T> Observable<T>
where T: Clone + Send + Sync + 'static
{
    pub fn new(value: T) -> Self {
        Self(Arc::new(Inner {
            value: RwLock::new(value),
            broadcast: Broadcast::new(),
            version: AtomicU64::new(0),
            upstream: Mutex::new(Vec::new()),
        }))
    }

    /// Returns a clone of the current value
    pub fn get(&self) -> T { self.with(T::clone) }

    /// Replaces the current value and notifies every observer before returning.
    ///
    /// The value lock is released before observers run, so observers may read
    /// or set this cell again. A nested set fans the newer value out to every
    /// observer, and the outer fan-out then stops, so the last value each observer
    /// receives is always the cell's current value.
    pub fn set(&self, value: T) {
        let version = {
            let mut current = self.0.write();
            *current = value.clone();
            self.0.version.fetch_add(1, Ordering::AcqRel) + 1
        };
        tracing::trace!("observable {} → set", self.id());
        self.publish(value, version);
    }

    /// Mutates the current value in place, then notifies like [`Observable::set`]
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let (value, version) = {
            let mut current = self.0.write();
            f(&mut *current);
            (current.clone(), self.0.version.fetch_add(1, Ordering::AcqRel) + 1)
        };
        tracing::trace!("observable {} → update", self.id());
        self.publish(value, version);
    }

    fn publish(&self, value: T, version: u64) {
        let called = self.0.broadcast.send_while(value, || self.0.version.load(Ordering::Acquire) == version);
        if called < self.0.broadcast.len() {
            tracing::trace!("observable {} → fan-out superseded after {} observer(s)", self.id(), called);
        }
    }

    /// Registers an observer for future changes only.
    pub fn listen<F>(&self, observer: F) -> SubscriptionGuard
    where F: Fn(T) + Send + Sync + 'static {
        let guard = self.0.broadcast.listen(observer);
        SubscriptionGuard::new(guard, self.clone())
    }

    /// Registers an observer and immediately calls it once with the current value.
    ///
    /// The observer is then called on every future change until the returned guard is
    /// dropped. The guard keeps this cell alive.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionGuard
    where F: Fn(T) + Send + Sync + 'static {
        let observer = Arc::new(observer);
        let guard = {
            let observer = observer.clone();
            self.0.broadcast.listen(move |value| observer(value))
        };
        observer(self.get());
        SubscriptionGuard::new(guard, self.clone())
    }

    /// Read-only view of this cell
    pub fn read(&self) -> Read<T> { Read::new(self.clone()) }
}

impl<T: std::fmt::Display> std::fmt::Display for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.with(|v| write!(f, "{}", v)) }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with(|v| f.debug_struct("Observable").field("id", &self.id()).field("value", v).finish())
    }
}

impl<T> Default for Observable<T>
where T: Default + Clone + Send + Sync + 'static
{
    fn default() -> Self { Self::new(T::default()) }
}
