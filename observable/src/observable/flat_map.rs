use std::sync::{Arc, Mutex, MutexGuard};

use super::{Observable, WeakObservable};
use crate::porcelain::SubscriptionGuard;

/// The single live subscription a flat-mapped cell holds on its current inner cell
struct InnerBinding<U> {
    target: WeakObservable<U>,
    slot: Mutex<Slot>,
}

#[derive(Default)]
struct Slot {
    /// Bumped on every re-bind so a superseded bind never installs its guard
    generation: u64,
    guard: Option<SubscriptionGuard>,
}

impl<U> InnerBinding<U>
where U: Clone + Send + Sync + 'static
{
    fn new(target: WeakObservable<U>) -> Self { Self { target, slot: Mutex::new(Slot::default()) } }

    fn slot(&self) -> MutexGuard<'_, Slot> { self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) }

    /// Detach from the previous inner cell, then forward `inner` into the target.
    ///
    /// With `replay` the target immediately takes the inner cell's current value.
    fn bind(&self, inner: &Observable<U>, replay: bool) {
        let (generation, previous) = {
            let mut slot = self.slot();
            slot.generation += 1;
            (slot.generation, slot.guard.take())
        };
        drop(previous);

        if let Some(target) = self.target.upgrade() {
            tracing::debug!("flat_map {} → bind inner {} (generation {})", target.id(), inner.id(), generation);
        }

        let target = self.target.clone();
        let forward = move |value: U| {
            if let Some(target) = target.upgrade() {
                target.set(value);
            }
        };
        let guard = if replay { inner.subscribe(forward) } else { inner.listen(forward) };

        let mut slot = self.slot();
        if slot.generation == generation {
            slot.guard = Some(guard);
        }
    }
}

impl<T> Observable<T>
where T: Clone + Send + Sync + 'static
{
    /// Derives a cell that follows the inner cell produced by `transform`.
    ///
    /// `transform` is called with the current value and the derived cell is seeded once
    /// with the resulting inner cell's current value. Later changes of that inner cell
    /// are forwarded. Every change of this cell calls `transform` again: the previous
    /// inner cell is detached first, then the derived cell takes the fresh inner cell's
    /// value and follows it. Superseded inner cells can no longer reach the derived cell.
    pub fn flat_map<U, F>(&self, transform: F) -> Observable<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> Observable<U> + Send + Sync + 'static,
    {
        let first = transform(self.get());
        let derived = Observable::new(first.get());

        let binding = Arc::new(InnerBinding::new(derived.downgrade()));
        binding.bind(&first, false);

        let guard = self.listen(move |value| binding.bind(&transform(value), true));
        derived.hold(guard);
        derived
    }
}
