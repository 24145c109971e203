//! Concurrent emission.
//!
//! A fixed number of workers drain one [`WorkQueue`]. A worker that fails
//! stops, but its peers keep going until the queue is empty; failures are
//! only looked at once every worker has returned.

use crate::config::ConfigError;
use crate::error::{CompileError, EmitError};
use crate::queue::WorkQueue;
use crate::sink::Sink;
use protogen_codegen::Generator;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag asking workers to stop before their next item.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How one worker ended.
#[derive(Debug)]
enum WorkerOutcome {
    Drained(Vec<PathBuf>),
    Failed(EmitError),
    Interrupted,
}

pub struct EmissionPool {
    concurrency: usize,
    shutdown: ShutdownSignal,
}

impl EmissionPool {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency,
            shutdown: ShutdownSignal::default(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Drain `queue` with `concurrency` workers and return every emitted
    /// path, sorted.
    ///
    /// A concurrency of zero is rejected before anything is dequeued.
    ///
    /// If any worker saw the shutdown signal the run is
    /// [`Interrupted`](CompileError::Interrupted). Otherwise the first failure
    /// in worker order is returned.
    pub fn run(
        &self,
        queue: &WorkQueue,
        generator: &dyn Generator,
        sink: &dyn Sink,
    ) -> Result<Vec<PathBuf>, CompileError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency.into());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|i| format!("protogen-worker-{i}"))
            .build()?;

        let outcomes: Vec<WorkerOutcome> = pool.install(|| {
            (0..self.concurrency)
                .into_par_iter()
                .map(|worker| self.work(worker, queue, generator, sink))
                .collect()
        });

        let mut paths = Vec::new();
        let mut first_failure = None;
        let mut interrupted = false;
        for outcome in outcomes {
            match outcome {
                WorkerOutcome::Drained(emitted) => paths.extend(emitted),
                WorkerOutcome::Failed(err) => {
                    first_failure.get_or_insert(err);
                }
                WorkerOutcome::Interrupted => interrupted = true,
            }
        }

        if interrupted {
            return Err(CompileError::Interrupted);
        }
        if let Some(err) = first_failure {
            return Err(err.into());
        }
        paths.sort();
        Ok(paths)
    }

    fn work(
        &self,
        worker: usize,
        queue: &WorkQueue,
        generator: &dyn Generator,
        sink: &dyn Sink,
    ) -> WorkerOutcome {
        let mut emitted = Vec::new();
        loop {
            if self.shutdown.is_raised() {
                tracing::debug!(worker, "shutdown requested");
                return WorkerOutcome::Interrupted;
            }
            let Some(ty) = queue.pop() else {
                return WorkerOutcome::Drained(emitted);
            };
            tracing::trace!(worker, type_name = %ty.name, "dequeued");

            let file = match generator.generate(&ty) {
                Ok(file) => file,
                Err(source) => {
                    return WorkerOutcome::Failed(EmitError::Generate {
                        type_name: ty.name,
                        source,
                    });
                }
            };
            match sink.emit(&file) {
                Ok(path) => emitted.push(path),
                Err(err) => return WorkerOutcome::Failed(err),
            }
        }
    }
}
