//! Short-circuiting composition over cells whose value is a success or a failure.

use crate::{Failure, Observable, porcelain::SubscriptionGuard};

/// The value carried by an outcome cell: `Ok` on success, `Err` on failure.
///
/// There is no pending state. Cells are seeded with a placeholder error such as
/// [`Failure::NotLoaded`] until the first result arrives.
pub type Outcome<T, E = Failure> = Result<T, E>;

impl<T, E> Observable<Outcome<T, E>>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// An outcome cell that already holds `error`
    pub fn failed(error: E) -> Self { Observable::new(Err(error)) }

    pub fn is_ok(&self) -> bool { self.with(|outcome| outcome.is_ok()) }

    /// The current error, if the cell currently holds one
    pub fn error(&self) -> Option<E> { self.with(|outcome| outcome.as_ref().err().cloned()) }

    /// Calls `handler` with the current success value (if any) and with every future one.
    ///
    /// Failures are ignored. Inspect the cell directly to observe them.
    pub fn next<F>(&self, handler: F) -> SubscriptionGuard
    where F: Fn(T) + Send + Sync + 'static {
        self.subscribe(move |outcome| {
            if let Ok(value) = outcome {
                handler(value);
            }
        })
    }

    /// Like [`Observable::flat_map`], but only for successes.
    ///
    /// On `Ok(v)` the derived cell follows `transform(v)`. On `Err(e)` `transform` is not
    /// called and the derived cell holds the same `e`, so the first failure in a chain of
    /// `then` stages reaches the end of the chain unchanged.
    pub fn then<U, F>(&self, transform: F) -> Observable<Outcome<U, E>>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> Observable<Outcome<U, E>> + Send + Sync + 'static,
    {
        let id = self.id();
        self.flat_map(move |outcome| match outcome {
            Ok(value) => transform(value),
            Err(error) => {
                tracing::trace!("then {} → short-circuit on failure", id);
                Observable::failed(error)
            }
        })
    }
}

impl<T> Observable<Outcome<T>>
where T: Clone + Send + Sync + 'static
{
    /// An outcome cell seeded with [`Failure::NotLoaded`]
    pub fn not_loaded() -> Self { Self::failed(Failure::NotLoaded) }
}
