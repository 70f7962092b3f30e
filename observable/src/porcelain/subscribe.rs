use std::any::Any;

use crate::broadcast::ListenerGuard;

/// Object-safe handle over a `ListenerGuard<T>` of any `T`
trait Registration: Send + Sync {
    /// Leave the listener registered for as long as its broadcast lives
    fn detach(self: Box<Self>);
}

impl<T: 'static> Registration for ListenerGuard<T> {
    fn detach(self: Box<Self>) { ListenerGuard::detach(*self) }
}

/// A guard for a subscription to an observable.
///
/// The guard keeps the observed cell, and everything upstream of it, alive.
/// Dropping it removes the observer.
#[must_use = "dropping a SubscriptionGuard unsubscribes immediately"]
pub struct SubscriptionGuard {
    registration: Option<Box<dyn Registration>>,
    _keepalive: Box<dyn Any + Send + Sync>,
}

impl SubscriptionGuard {
    pub(crate) fn new<T, K>(guard: ListenerGuard<T>, keepalive: K) -> Self
    where
        T: 'static,
        K: Send + Sync + 'static,
    {
        Self { registration: Some(Box::new(guard)), _keepalive: Box::new(keepalive) }
    }

    /// Give up the handle without unsubscribing.
    ///
    /// The observer stays registered for as long as the observed cell lives,
    /// but the guard no longer keeps that cell alive.
    pub fn detach(mut self) {
        if let Some(registration) = self.registration.take() {
            registration.detach();
        }
    }
}

impl std::fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionGuard").field("attached", &self.registration.is_some()).finish()
    }
}
