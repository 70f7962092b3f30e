use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

/// A unique identifier for a broadcast that cannot be forged.
/// Can only be created by a Broadcast and used for deduplication/comparison.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct BroadcastId(usize);

impl From<BroadcastId> for usize {
    fn from(id: BroadcastId) -> Self { id.0 }
}

impl std::fmt::Display for BroadcastId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "#{:x}", self.0) }
}

/// A listener that is called synchronously when a broadcast is sent.
pub type Listener<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

/// Synchronous, ordered fan-out to any number of listeners.
///
/// Listeners are keyed by a monotonically increasing id, so [`Broadcast::send`]
/// always calls them in the order they were registered.
pub struct Broadcast<T>(Arc<Inner<T>>);

struct Inner<T> {
    listeners: RwLock<BTreeMap<usize, Listener<T>>>,
    next_id: AtomicUsize,
}

impl<T> Inner<T> {
    // A listener that panicked mid-send must not wedge the broadcast for everyone else
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<usize, Listener<T>>> {
        self.listeners.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<usize, Listener<T>>> {
        self.listeners.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T> Clone for Broadcast<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Default for Broadcast<T> {
    fn default() -> Self { Self::new() }
}

impl<T> std::fmt::Debug for Broadcast<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcast").field("id", &self.id()).field("listeners", &self.len()).finish()
    }
}

/// Removes its listener from the broadcast when dropped.
///
/// The guard does not keep the broadcast alive.
pub struct ListenerGuard<T> {
    inner: Weak<Inner<T>>,
    id: usize,
}

impl<T> ListenerGuard<T> {
    /// Consume the guard without removing the listener
    pub fn detach(mut self) { self.inner = Weak::new(); }
}

impl<T> Drop for ListenerGuard<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.write().remove(&self.id);
        }
    }
}

impl<T> Broadcast<T> {
    pub fn new() -> Self { Self(Arc::new(Inner { listeners: RwLock::new(BTreeMap::new()), next_id: AtomicUsize::new(0) })) }

    pub fn id(&self) -> BroadcastId { BroadcastId(Arc::as_ptr(&self.0) as *const () as usize) }

    /// Number of registered listeners
    pub fn len(&self) -> usize { self.0.read().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Register a listener. It stays registered until the returned guard is dropped.
    pub fn listen<F>(&self, listener: F) -> ListenerGuard<T>
    where F: Fn(T) + Send + Sync + 'static {
        let id = self.0.next_id.fetch_add(1, Ordering::Relaxed);
        self.0.write().insert(id, Arc::new(listener));
        ListenerGuard { inner: Arc::downgrade(&self.0), id }
    }
}

impl<T: Clone> Broadcast<T> {
    /// Sends a value to all listeners registered at the time of the call
    pub fn send(&self, value: T) { self.send_while(value, || true); }

    /// Like [`Broadcast::send`], but checks `proceed` before each listener and stops
    /// at the first `false`. Returns how many listeners were called.
    pub fn send_while(&self, value: T, mut proceed: impl FnMut() -> bool) -> usize {
        // Snapshot so listeners may listen or drop guards without deadlocking
        let listeners = {
            let listeners = self.0.read();
            listeners.values().cloned().collect::<Vec<_>>()
        };
        tracing::trace!("broadcast {} → send to {} listener(s)", self.id(), listeners.len());

        let mut called = 0;
        // clone the value for each listener except the last one
        if let Some((last, rest)) = listeners.split_last() {
            for listener in rest {
                if !proceed() {
                    return called;
                }
                listener(value.clone());
                called += 1;
            }
            if proceed() {
                last(value);
                called += 1;
            }
        }
        called
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_multiple_listeners() {
        let sender = Broadcast::<()>::new();
        let counter = Arc::new(Mutex::new(0));

        let _sub1 = {
            let counter = counter.clone();
            sender.listen(move |_| *counter.lock().unwrap() += 1)
        };
        let sub2 = {
            let counter = counter.clone();
            sender.listen(move |_| *counter.lock().unwrap() += 10)
        };

        sender.send(());
        assert_eq!(*counter.lock().unwrap(), 11);

        drop(sub2);

        // only sub1 remains
        sender.send(());
        assert_eq!(*counter.lock().unwrap(), 12);
        assert_eq!(sender.len(), 1);
    }

    #[test]
    fn test_registration_order() {
        let sender = Broadcast::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let guards: Vec<_> = (0..16)
            .map(|i| {
                let log = log.clone();
                sender.listen(move |v: u32| log.lock().unwrap().push((i, v)))
            })
            .collect();

        sender.send(7);
        let expected: Vec<_> = (0..16).map(|i| (i, 7)).collect();
        assert_eq!(*log.lock().unwrap(), expected);
        drop(guards);
        assert!(sender.is_empty());
    }

    #[test]
    fn test_reentrant_listen_during_send() {
        let sender = Broadcast::<()>::new();
        let counter = Arc::new(Mutex::new(0));

        let sender_clone = sender.clone();
        let counter_clone = counter.clone();
        let _sub = sender.listen(move |_| {
            *counter_clone.lock().unwrap() += 1;
            // registering and dropping during a send must not deadlock
            let _temp = sender_clone.listen(|_| {});
        });

        sender.send(());
        assert_eq!(*counter.lock().unwrap(), 1);

        sender.send(());
        assert_eq!(*counter.lock().unwrap(), 2);
    }

    #[test]
    fn test_listener_added_during_send_misses_that_send() {
        let sender = Broadcast::<u8>::new();
        let late = Arc::new(Mutex::new(Vec::new()));
        let slot = Arc::new(Mutex::new(None));

        let _sub = {
            let weak = Arc::downgrade(&sender.0);
            let late = late.clone();
            let slot = slot.clone();
            sender.listen(move |_| {
                let mut slot = slot.lock().unwrap();
                if slot.is_none() {
                    if let Some(inner) = weak.upgrade() {
                        let late = late.clone();
                        *slot = Some(Broadcast(inner).listen(move |v: u8| late.lock().unwrap().push(v)));
                    }
                }
            })
        };

        sender.send(1);
        assert!(late.lock().unwrap().is_empty());
        sender.send(2);
        assert_eq!(*late.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_guard_outlives_broadcast() {
        let sender = Broadcast::<()>::new();
        let guard = sender.listen(|_| {});
        drop(sender);
        // dropping after the broadcast is gone is a no-op
        drop(guard);
    }

    #[test]
    fn test_send_while_stops_at_first_refusal() {
        let sender = Broadcast::<u8>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _guards: Vec<_> = (0..4)
            .map(|i| {
                let log = log.clone();
                sender.listen(move |v: u8| log.lock().unwrap().push((i, v)))
            })
            .collect();

        let mut budget = 2;
        let called = sender.send_while(9, || {
            budget -= 1;
            budget >= 0
        });
        assert_eq!(called, 2);
        assert_eq!(*log.lock().unwrap(), [(0, 9), (1, 9)]);
    }
}
