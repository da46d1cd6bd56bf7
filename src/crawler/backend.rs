//! Worker execution backends
//!
//! The coordinator drives workers as futures and does not care where they
//! run. A [`WorkerBackend`] decides that:
//! - [`ThreadBackend`] gives every worker its own OS thread with a
//!   single-threaded runtime
//! - [`TaskBackend`] spawns every worker as a task on the ambient runtime

use crate::CrawlError;
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;

/// A worker loop, resolving to the number of pages it emitted
pub type WorkerFuture = Pin<Box<dyn Future<Output = usize> + Send + 'static>>;

/// How workers are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrencyMode {
    /// One OS thread per worker
    #[default]
    Thread,
    /// One async task per worker on the shared runtime
    Task,
}

impl ConcurrencyMode {
    pub fn backend(&self) -> Box<dyn WorkerBackend> {
        match self {
            Self::Thread => Box::new(ThreadBackend),
            Self::Task => Box::new(TaskBackend),
        }
    }
}

/// Starts workers and hands back joinable handles
pub trait WorkerBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn spawn(&self, worker_id: usize, worker: WorkerFuture) -> Result<WorkerHandle, CrawlError>;
}

/// A running worker
#[derive(Debug)]
pub struct WorkerHandle {
    worker_id: usize,
    inner: HandleKind,
}

#[derive(Debug)]
enum HandleKind {
    Task(tokio::task::JoinHandle<usize>),
    Thread(std::thread::JoinHandle<usize>),
}

impl WorkerHandle {
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Waits for the worker to finish and returns its emitted page count
    pub async fn join(self) -> Result<usize, CrawlError> {
        let worker = self.worker_id;
        match self.inner {
            HandleKind::Task(handle) => handle.await.map_err(|e| {
                if e.is_panic() {
                    CrawlError::WorkerPanicked { worker }
                } else {
                    CrawlError::WorkerJoin {
                        worker,
                        message: e.to_string(),
                    }
                }
            }),
            HandleKind::Thread(handle) => {
                let joined = tokio::task::spawn_blocking(move || handle.join())
                    .await
                    .map_err(|e| CrawlError::WorkerJoin {
                        worker,
                        message: e.to_string(),
                    })?;
                joined.map_err(|_| CrawlError::WorkerPanicked { worker })
            }
        }
    }
}

/// Runs each worker on a dedicated OS thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadBackend;

impl WorkerBackend for ThreadBackend {
    fn name(&self) -> &'static str {
        "thread"
    }

    fn spawn(&self, worker_id: usize, worker: WorkerFuture) -> Result<WorkerHandle, CrawlError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CrawlError::WorkerSpawn {
                worker: worker_id,
                message: e.to_string(),
            })?;

        let handle = std::thread::Builder::new()
            .name(format!("page-crawler-{}", worker_id))
            .spawn(move || runtime.block_on(worker))
            .map_err(|e| CrawlError::WorkerSpawn {
                worker: worker_id,
                message: e.to_string(),
            })?;

        Ok(WorkerHandle {
            worker_id,
            inner: HandleKind::Thread(handle),
        })
    }
}

/// Runs each worker as a task on the current tokio runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskBackend;

impl WorkerBackend for TaskBackend {
    fn name(&self) -> &'static str {
        "task"
    }

    fn spawn(&self, worker_id: usize, worker: WorkerFuture) -> Result<WorkerHandle, CrawlError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| CrawlError::WorkerSpawn {
                worker: worker_id,
                message: e.to_string(),
            })?;

        Ok(WorkerHandle {
            worker_id,
            inner: HandleKind::Task(runtime.spawn(worker)),
        })
    }
}
