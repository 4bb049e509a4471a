/*!
 * Worker Pool
 * OS threads for blocking branch syscalls, with ordered result handles
 *
 * Work is submitted in two phases: `submit` returns a `TaskHandle` at once,
 * and the caller later waits on the handles in whatever order it needs.
 * Branch-priority semantics come from draining handles in submission order,
 * even though the tasks themselves race.
 */

use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::thread::JoinHandle;

use crate::core::errors::{PoolError, PoolResult};
use crate::core::limits::WORKER_THREAD_NAME;

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Kind {
    /// Fixed set of workers fed from one queue
    Bounded {
        sender: Option<flume::Sender<Job>>,
        workers: Mutex<Vec<JoinHandle<()>>>,
        size: usize,
    },
    /// One fresh thread per task
    Unbounded,
}

/// Thread pool owned by one merger or dispatcher instance
pub struct ThreadPool {
    kind: Kind,
    name: String,
}

impl ThreadPool {
    /// Create a pool of `threads` workers; `0` means unbounded
    pub fn new(threads: usize) -> PoolResult<Self> {
        Self::with_name(threads, WORKER_THREAD_NAME)
    }

    pub fn with_name(threads: usize, name: &str) -> PoolResult<Self> {
        if threads == 0 {
            return Ok(Self {
                kind: Kind::Unbounded,
                name: name.to_string(),
            });
        }

        let (sender, receiver) = flume::unbounded::<Job>();
        let mut workers = Vec::with_capacity(threads);
        for i in 0..threads {
            let receiver = receiver.clone();
            let handle = std::thread::Builder::new()
                .name(format!("{}-{}", name, i))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        job();
                    }
                })
                .map_err(|e| PoolError::io(e, format!("spawn {} worker", name)))?;
            workers.push(handle);
        }

        tracing::debug!(pool = name, threads, "worker pool started");
        Ok(Self {
            kind: Kind::Bounded {
                sender: Some(sender),
                workers: Mutex::new(workers),
                size: threads,
            },
            name: name.to_string(),
        })
    }

    /// Worker count, `None` when unbounded
    pub fn size(&self) -> Option<usize> {
        match &self.kind {
            Kind::Bounded { size, .. } => Some(*size),
            Kind::Unbounded => None,
        }
    }

    /// Queue `task` and return a handle to its eventual result
    ///
    /// The task always runs to completion; dropping the handle only
    /// discards the result.
    pub fn submit<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = flume::bounded(1);
        let job: Job = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(task)).map_err(|_| {
                PoolError::io(
                    std::io::Error::new(std::io::ErrorKind::Other, "task panicked"),
                    "worker",
                )
            });
            // Receiver gone means the caller lost interest
            let _ = tx.send(result);
        });

        match &self.kind {
            Kind::Bounded { sender: Some(sender), .. } => {
                if let Err(flume::SendError(job)) = sender.send(job) {
                    // Workers are gone; run inline rather than lose the task
                    job();
                }
            }
            Kind::Bounded { sender: None, .. } => job(),
            Kind::Unbounded => {
                let spawned = std::thread::Builder::new()
                    .name(self.name.clone())
                    .spawn(job);
                if let Err(e) = spawned {
                    return TaskHandle::failed(PoolError::io(e, format!("spawn {} task", self.name)));
                }
            }
        }

        TaskHandle { rx: Ok(rx) }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if let Kind::Bounded { sender, workers, .. } = &mut self.kind {
            sender.take();
            for handle in workers.get_mut().drain(..) {
                if handle.join().is_err() {
                    tracing::error!(pool = %self.name, "worker thread panicked");
                }
            }
        }
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("name", &self.name)
            .field("size", &self.size())
            .finish()
    }
}

/// Pending result of a submitted task
#[must_use = "the task result is lost unless waited on"]
pub struct TaskHandle<T> {
    rx: Result<flume::Receiver<PoolResult<T>>, PoolError>,
}

impl<T> TaskHandle<T> {
    fn failed(err: PoolError) -> Self {
        Self { rx: Err(err) }
    }

    /// Block until the task finishes
    pub fn wait(self) -> PoolResult<T> {
        let rx = self.rx?;
        rx.recv().map_err(|_| {
            PoolError::io(
                std::io::Error::new(std::io::ErrorKind::Other, "task dropped"),
                "worker",
            )
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[test]
    fn test_results_in_submission_order() {
        let pool = ThreadPool::new(4).unwrap();
        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                pool.submit(move || {
                    std::thread::sleep(Duration::from_millis(40 - i * 5));
                    i
                })
            })
            .collect();

        let results: Vec<u64> = handles.into_iter().map(|h| h.wait().unwrap()).collect();
        assert_eq!(results, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_unbounded_runs_in_parallel() {
        let pool = ThreadPool::new(0).unwrap();
        assert_eq!(pool.size(), None);

        let start = Instant::now();
        let handles: Vec<_> = (0..6)
            .map(|_| pool.submit(|| std::thread::sleep(Duration::from_millis(100))))
            .collect();
        for handle in handles {
            handle.wait().unwrap();
        }
        assert!(start.elapsed() < Duration::from_millis(450));
    }

    #[test]
    fn test_panicking_task_reports_error() {
        let pool = ThreadPool::new(1).unwrap();
        let handle = pool.submit(|| -> u32 { panic!("boom") });
        assert_eq!(handle.wait().unwrap_err().errno(), libc::EIO);

        // Worker survives the panic
        assert_eq!(pool.submit(|| 7).wait().unwrap(), 7);
    }

    #[test]
    fn test_dropped_handle_still_runs() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = ThreadPool::new(2).unwrap();
            for _ in 0..4 {
                let counter = counter.clone();
                drop(pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }));
            }
        }
        // Dropping the pool joins its workers
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }
}
