use std::future::Future;

use crate::{Observable, Read};

/// Trait for waiting on observable values asynchronously
pub trait Wait<T: 'static> {
    /// Wait for the cell to hold a specific value
    fn wait_value(&self, target_value: T) -> impl Future<Output = ()> + Send
    where T: PartialEq + Send + Sync;

    /// Wait for the cell to hold a value matching the given predicate
    fn wait_for<F, R>(&self, predicate: F) -> impl Future<Output = R::Output> + Send
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: WaitResult;
}

/// Helper trait for `wait_for` to allow flexible predicate return types.
///
/// ## Semantics
/// - `result()` returns `Some(output)` to stop waiting and return `output`
/// - `result()` returns `None` to continue waiting for the next change
pub trait WaitResult {
    type Output;
    /// Returns Some(output) if we should stop waiting, None if we should continue
    fn result(self) -> Option<Self::Output>;
}

// true = stop with (), false = continue waiting
impl WaitResult for bool {
    type Output = ();
    fn result(self) -> Option<Self::Output> { if self { Some(()) } else { None } }
}

// Some(value) = stop with value, None = continue waiting
impl<T> WaitResult for Option<T> {
    type Output = T;
    fn result(self) -> Option<Self::Output> { self }
}

impl<T> Wait<T> for Observable<T>
where T: Clone + Send + Sync + 'static
{
    fn wait_value(&self, target_value: T) -> impl Future<Output = ()> + Send
    where T: PartialEq + Send + Sync {
        self.wait_for(move |value| *value == target_value)
    }

    fn wait_for<F, R>(&self, predicate: F) -> impl Future<Output = R::Output> + Send
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: WaitResult,
    {
        let cell = self.clone();
        async move {
            // Bridge the synchronous fan-out into a channel. Listen before the first
            // check so a change between the check and the await is not lost.
            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<()>();
            let _subscription = cell.listen(move |_| {
                let _ = tx.send(());
            });

            loop {
                if let Some(result) = cell.with(|value| predicate(value).result()) {
                    return result;
                }
                if rx.recv().await.is_none() {
                    // The sender lives in our own subscription, so this cannot close while we wait
                    std::future::pending::<()>().await;
                }
            }
        }
    }
}

impl<T> Wait<T> for Read<T>
where T: Clone + Send + Sync + 'static
{
    fn wait_value(&self, target_value: T) -> impl Future<Output = ()> + Send
    where T: PartialEq + Send + Sync {
        self.0.wait_value(target_value)
    }

    fn wait_for<F, R>(&self, predicate: F) -> impl Future<Output = R::Output> + Send
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: WaitResult,
    {
        self.0.wait_for(predicate)
    }
}
