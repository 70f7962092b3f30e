use super::Observable;
use crate::{broadcast::BroadcastId, porcelain::SubscriptionGuard};

/// Read-only view of an [`Observable`].
///
/// Shares the value and observers of the cell it was created from, but cannot set it.
pub struct Read<T>(pub(crate) Observable<T>);

impl<T> Clone for Read<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Read<T> {
    pub(crate) fn new(observable: Observable<T>) -> Self { Self(observable) }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R { self.0.with(f) }

    pub fn id(&self) -> BroadcastId { self.0.id() }
}

impl<T> Read<T>
where T: Clone + Send + Sync + 'static
{
    pub fn get(&self) -> T { self.0.get() }

    pub fn listen<F>(&self, observer: F) -> SubscriptionGuard
    where F: Fn(T) + Send + Sync + 'static {
        self.0.listen(observer)
    }

    pub fn subscribe<F>(&self, observer: F) -> SubscriptionGuard
    where F: Fn(T) + Send + Sync + 'static {
        self.0.subscribe(observer)
    }

    pub fn map<U, F>(&self, transform: F) -> Read<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        Read(self.0.map(transform))
    }

    pub fn flat_map<U, F>(&self, transform: F) -> Read<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> Observable<U> + Send + Sync + 'static,
    {
        Read(self.0.flat_map(transform))
    }
}

impl<T> From<Observable<T>> for Read<T> {
    fn from(observable: Observable<T>) -> Self { Self(observable) }
}

impl<T: std::fmt::Display> std::fmt::Display for Read<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { std::fmt::Display::fmt(&self.0, f) }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Read<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_tuple("Read").field(&self.0).finish() }
}
