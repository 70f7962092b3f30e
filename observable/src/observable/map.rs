use super::Observable;

impl<T> Observable<T>
where T: Clone + Send + Sync + 'static
{
    /// Derives a cell whose value is always `transform` of this cell's latest value.
    ///
    /// The derived cell is seeded synchronously and recomputed on every change of this
    /// cell. It keeps this cell alive; this cell only holds it weakly, so dropping the
    /// derived cell detaches it.
    pub fn map<U, F>(&self, transform: F) -> Observable<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let derived = Observable::new(transform(self.get()));

        let target = derived.downgrade();
        let guard = self.listen(move |value| {
            if let Some(derived) = target.upgrade() {
                derived.set(transform(value));
            }
        });
        derived.hold(guard);
        derived
    }
}
