//! Single-writer discipline for observables.
//!
//! Observables notify synchronously on whichever thread calls `set`. To keep every
//! mutation of a group of cells on one logical thread of execution, writers on other
//! threads or tasks forward their sets through a [`DispatchHandle`]; the [`Dispatcher`]
//! applies them one at a time, in send order, on the task that runs it.

use std::{future::Future, sync::Arc};

use tokio::sync::mpsc;

use crate::{DispatchError, Observable};

type Job = Box<dyn FnOnce() + Send + 'static>;

const DEFAULT_LABEL: &str = "dispatch";
const DEFAULT_YIELD_EVERY: usize = 64;

/// Configuration for a [`Dispatcher`]
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    label: String,
    yield_every: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self { Self { label: DEFAULT_LABEL.to_string(), yield_every: DEFAULT_YIELD_EVERY } }
}

impl DispatcherConfig {
    /// Creates a builder starting from the defaults
    pub fn builder() -> DispatcherConfigBuilder { DispatcherConfigBuilder { config: Self::default() } }

    /// Name used in log lines and errors
    pub fn label(&self) -> &str { &self.label }

    /// Number of jobs [`Dispatcher::run`] executes before yielding to the runtime
    pub fn yield_every(&self) -> usize { self.yield_every }
}

/// Builder for [`DispatcherConfig`]
#[derive(Debug, Clone)]
pub struct DispatcherConfigBuilder {
    config: DispatcherConfig,
}

impl DispatcherConfigBuilder {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = label.into();
        self
    }

    /// Zero is treated as one
    pub fn yield_every(mut self, jobs: usize) -> Self {
        self.config.yield_every = jobs.max(1);
        self
    }

    pub fn build(self) -> DispatcherConfig { self.config }
}

/// Executes forwarded jobs sequentially.
///
/// Run it on the task (or thread) that owns the cells it serves, either with
/// [`Dispatcher::run`] or by draining it from an existing loop with
/// [`Dispatcher::run_pending`].
pub struct Dispatcher {
    config: DispatcherConfig,
    rx: mpsc::UnboundedReceiver<Job>,
}

/// Cloneable, `Send` handle that forwards work onto a [`Dispatcher`]
#[derive(Clone)]
pub struct DispatchHandle {
    label: Arc<str>,
    tx: mpsc::UnboundedSender<Job>,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> (Self, DispatchHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = DispatchHandle { label: Arc::from(config.label()), tx };
        (Self { config, rx }, handle)
    }

    pub fn config(&self) -> &DispatcherConfig { &self.config }

    /// Runs jobs until every [`DispatchHandle`] has been dropped
    pub async fn run(mut self) {
        tracing::debug!("dispatcher {} → started", self.config.label);
        let mut since_yield = 0;
        while let Some(job) = self.rx.recv().await {
            job();
            since_yield += 1;
            if since_yield >= self.config.yield_every {
                since_yield = 0;
                tokio::task::yield_now().await;
            }
        }
        tracing::debug!("dispatcher {} → stopped", self.config.label);
    }

    /// Runs every job queued so far without waiting, returning how many ran
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!("dispatcher {} → ran {} pending job(s)", self.config.label, ran);
        }
        ran
    }
}

impl DispatchHandle {
    pub fn label(&self) -> &str { &self.label }

    /// Whether the dispatcher has gone away
    pub fn is_closed(&self) -> bool { self.tx.is_closed() }

    fn closed(&self) -> DispatchError {
        tracing::warn!("dispatcher {} → closed, dropping job", self.label);
        DispatchError::Closed(self.label.to_string())
    }

    /// Queue an arbitrary job
    pub fn dispatch<F>(&self, job: F) -> Result<(), DispatchError>
    where F: FnOnce() + Send + 'static {
        self.tx.send(Box::new(job)).map_err(|_| self.closed())
    }

    /// Queue `cell.set(value)`
    pub fn set<T>(&self, cell: &Observable<T>, value: T) -> Result<(), DispatchError>
    where T: Clone + Send + Sync + 'static {
        let cell = cell.clone();
        self.dispatch(move || cell.set(value))
    }

    /// A writer whose sets are forwarded through this dispatcher
    pub fn writer<T>(&self, cell: &Observable<T>) -> Writer<T>
    where T: Clone + Send + Sync + 'static {
        Writer { cell: cell.clone(), handle: self.clone() }
    }

    /// Runs `future` on a background task and sets its output on `cell` through the dispatcher.
    ///
    /// Must be called from within a tokio runtime.
    pub fn complete<T, Fut>(&self, cell: &Observable<T>, future: Fut) -> Result<(), DispatchError>
    where
        T: Clone + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        if self.is_closed() {
            return Err(self.closed());
        }
        let writer = self.writer(cell);
        tokio::spawn(async move {
            let value = future.await;
            // closed() has already logged
            let _ = writer.set(value);
        });
        Ok(())
    }
}

impl std::fmt::Debug for DispatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchHandle").field("label", &self.label).field("closed", &self.is_closed()).finish()
    }
}

/// Forwards writes to one cell through a dispatcher
pub struct Writer<T> {
    cell: Observable<T>,
    handle: DispatchHandle,
}

impl<T> Clone for Writer<T> {
    fn clone(&self) -> Self { Self { cell: self.cell.clone(), handle: self.handle.clone() } }
}

impl<T> Writer<T>
where T: Clone + Send + Sync + 'static
{
    pub fn set(&self, value: T) -> Result<(), DispatchError> { self.handle.set(&self.cell, value) }

    pub fn update<F>(&self, f: F) -> Result<(), DispatchError>
    where F: FnOnce(&mut T) + Send + 'static {
        let cell = self.cell.clone();
        self.handle.dispatch(move || cell.update(f))
    }
}
