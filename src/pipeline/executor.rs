// src/pipeline/executor.rs

//! Bounded-concurrency runner for independent crawl jobs.

use std::any::Any;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Local;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};

/// Receives the completed-job count as each job finishes.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, completed: usize, total: usize);
}

/// Writes an in-place `[n/total]` progress line to stderr.
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn on_progress(&self, completed: usize, total: usize) {
        let mut stderr = std::io::stderr();
        let _ = write!(
            stderr,
            "\r[{}] [PROG] {completed}/{total}",
            Local::now().format("%H:%M:%S")
        );
        if completed == total {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }
}

/// Runs a batch of jobs and returns one result per job, in input order.
#[derive(Clone)]
pub enum TaskExecutor {
    Simple {
        limit: usize,
    },
    Progress {
        limit: usize,
        observer: Arc<dyn ProgressObserver>,
    },
}

impl TaskExecutor {
    pub fn simple(limit: usize) -> Self {
        TaskExecutor::Simple {
            limit: limit.max(1),
        }
    }

    pub fn with_progress(limit: usize, observer: Arc<dyn ProgressObserver>) -> Self {
        TaskExecutor::Progress {
            limit: limit.max(1),
            observer,
        }
    }

    pub fn limit(&self) -> usize {
        match self {
            TaskExecutor::Simple { limit } | TaskExecutor::Progress { limit, .. } => *limit,
        }
    }

    /// Run every job with at most `limit` in flight.
    ///
    /// `results[i]` belongs to `jobs[i]`. A failing or panicking job yields an
    /// `AppError::Job` in its own slot and leaves its siblings untouched.
    pub async fn run<'a, T>(&self, jobs: Vec<BoxFuture<'a, Result<T>>>) -> Vec<Result<T>>
    where
        T: Send + 'a,
    {
        let total = jobs.len();
        let completed = AtomicUsize::new(0);
        let observer = match self {
            TaskExecutor::Simple { .. } => None,
            TaskExecutor::Progress { observer, .. } => Some(observer.as_ref()),
        };
        let completed = &completed;

        stream::iter(jobs.into_iter().enumerate())
            .map(|(index, job)| async move {
                let result = match AssertUnwindSafe(job).catch_unwind().await {
                    Ok(result) => result,
                    Err(payload) => Err(AppError::job(
                        format!("#{index}"),
                        format!("panicked: {}", panic_message(payload.as_ref())),
                    )),
                };
                if let Some(observer) = observer {
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    observer.on_progress(done, total);
                }
                result
            })
            .buffered(self.limit())
            .collect()
            .await
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        counts: Mutex<Vec<(usize, usize)>>,
    }

    impl ProgressObserver for Recorder {
        fn on_progress(&self, completed: usize, total: usize) {
            self.counts.lock().unwrap().push((completed, total));
        }
    }

    fn delayed(label: &'static str, millis: u64) -> BoxFuture<'static, Result<&'static str>> {
        async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            Ok(label)
        }
        .boxed()
    }

    fn values(results: Vec<Result<&'static str>>) -> Vec<&'static str> {
        results.into_iter().map(|r| r.unwrap()).collect()
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let jobs = vec![delayed("slow", 60), delayed("fast", 5), delayed("medium", 30)];
        let results = TaskExecutor::simple(3).run(jobs).await;
        assert_eq!(values(results), vec!["slow", "fast", "medium"]);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_to_its_slot() {
        let jobs: Vec<BoxFuture<'static, Result<&'static str>>> = vec![
            delayed("first", 5),
            async { Err(AppError::validation("bad target")) }.boxed(),
            delayed("third", 1),
        ];
        let results = TaskExecutor::simple(2).run(jobs).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), &"first");
        assert!(matches!(results[1], Err(AppError::Validation(_))));
        assert_eq!(results[2].as_ref().unwrap(), &"third");
    }

    #[tokio::test]
    async fn test_panic_becomes_job_failure() {
        let exploding = async {
            if true {
                panic!("boom");
            }
            Ok::<_, AppError>("never")
        };
        let jobs = vec![exploding.boxed(), delayed("ok", 1)];
        let results = TaskExecutor::simple(2).run(jobs).await;

        match &results[0] {
            Err(AppError::Job { target, message }) => {
                assert_eq!(target, "#0");
                assert!(message.contains("boom"));
            }
            other => panic!("expected job failure, got {other:?}"),
        }
        assert_eq!(results[1].as_ref().unwrap(), &"ok");
    }

    #[tokio::test]
    async fn test_progress_counts_up_to_total() {
        let recorder = Arc::new(Recorder::default());
        let executor = TaskExecutor::with_progress(2, recorder.clone());
        let jobs = vec![delayed("a", 20), delayed("b", 1), delayed("c", 10), delayed("d", 1)];

        let results = executor.run(jobs).await;
        assert_eq!(values(results), vec!["a", "b", "c", "d"]);

        let counts = recorder.counts.lock().unwrap().clone();
        assert_eq!(counts, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }

    #[tokio::test]
    async fn test_limit_caps_jobs_in_flight() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs: Vec<BoxFuture<'static, Result<()>>> = (0..6)
            .map(|_| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
                .boxed()
            })
            .collect();

        let results = TaskExecutor::simple(2).run(jobs).await;
        assert!(results.iter().all(|r| r.is_ok()));
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let jobs: Vec<BoxFuture<'static, Result<()>>> = Vec::new();
        assert!(TaskExecutor::simple(4).run(jobs).await.is_empty());
        assert_eq!(TaskExecutor::simple(0).limit(), 1);
    }
}
