use crate::pipeline::cancel::CancellationToken;
use log::debug;
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;

/// Fixed number of worker threads draining a shared job queue.
///
/// Jobs do not talk to each other; each produces one result. Cancellation is
/// checked before a job starts, never during one.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        WorkerPool {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `work` over every item. Results come back in input order; items
    /// skipped because of cancellation are `None`.
    pub fn run<T, R, F>(&self, items: Vec<T>, cancel: &CancellationToken, work: F) -> Vec<Option<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        let count = items.len();
        let (job_tx, job_rx) = mpsc::channel::<(usize, T)>();
        for job in items.into_iter().enumerate() {
            if job_tx.send(job).is_err() {
                break;
            }
        }
        drop(job_tx);

        let job_rx = Mutex::new(job_rx);
        let (result_tx, result_rx) = mpsc::channel::<(usize, R)>();

        thread::scope(|scope| {
            for worker in 0..self.workers.min(count) {
                let job_rx = &job_rx;
                let result_tx = result_tx.clone();
                let work = &work;
                scope.spawn(move || loop {
                    let job = match job_rx.lock() {
                        Ok(rx) => rx.recv(),
                        Err(_) => break,
                    };
                    let Ok((index, item)) = job else {
                        break;
                    };
                    if cancel.is_cancelled() {
                        debug!("Worker {} skipping job {} after cancellation", worker, index);
                        continue;
                    }
                    if result_tx.send((index, work(item))).is_err() {
                        break;
                    }
                });
            }
        });
        drop(result_tx);

        let mut results: Vec<Option<R>> = (0..count).map(|_| None).collect();
        for (index, result) in result_rx {
            results[index] = Some(result);
        }
        results
    }
}
