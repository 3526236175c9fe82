//! Bounded-concurrency job dispatch
//!
//! The dispatcher runs a fixed pool of render workers fed from a bounded job
//! queue and funnels every completed record through a single writer task that
//! owns the key-file append cursor. Workers never touch the file; the producer
//! blocks when the queue is full, which bounds in-memory pending work.

use crate::{LogAppender, Record, Renderer, SnapshotError, Thumbnailer};
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

/// Terminal state of one URL's job.
#[derive(Debug)]
pub enum JobOutcome {
    /// Render succeeded (thumbnail optional); the record goes to the key file.
    Completed(Record),
    /// Render failed; the URL is reported and left absent from the key file so
    /// a later run retries it.
    Failed { url: String, error: SnapshotError },
}

/// Counts reported by the writer task once every submitted URL is accounted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub completed: usize,
    pub failed: usize,
}

impl DispatchSummary {
    pub fn total(&self) -> usize {
        self.completed + self.failed
    }
}

struct RenderWorker {
    id: usize,
    renderer: Arc<dyn Renderer>,
    thumbnailer: Option<Arc<dyn Thumbnailer>>,
    processed_count: AtomicUsize,
    error_count: AtomicUsize,
}

impl RenderWorker {
    fn new(
        id: usize,
        renderer: Arc<dyn Renderer>,
        thumbnailer: Option<Arc<dyn Thumbnailer>>,
    ) -> Self {
        Self {
            id,
            renderer,
            thumbnailer,
            processed_count: AtomicUsize::new(0),
            error_count: AtomicUsize::new(0),
        }
    }

    async fn run(
        &self,
        jobs: Arc<Mutex<mpsc::Receiver<String>>>,
        outcomes: mpsc::Sender<JobOutcome>,
    ) {
        debug!("Starting render worker {}", self.id);

        loop {
            // Hold the lock only while pulling the next URL, never across a render
            let url = {
                let mut receiver = jobs.lock().await;
                receiver.recv().await
            };

            let Some(url) = url else { break };

            let outcome = self.process_job(url).await;
            match &outcome {
                JobOutcome::Completed(record) => {
                    self.processed_count.fetch_add(1, Ordering::Relaxed);
                    debug!("Worker {} completed job for {}", self.id, record.url);
                }
                JobOutcome::Failed { url, error } => {
                    self.error_count.fetch_add(1, Ordering::Relaxed);
                    debug!("Worker {} failed job for {}: {}", self.id, url, error);
                }
            }

            if outcomes.send(outcome).await.is_err() {
                error!("Worker {} failed to deliver result, stopping", self.id);
                break;
            }
        }

        debug!(
            "Render worker {} stopped ({} completed, {} failed)",
            self.id,
            self.processed_count.load(Ordering::Relaxed),
            self.error_count.load(Ordering::Relaxed)
        );
    }

    async fn process_job(&self, url: String) -> JobOutcome {
        let fullsize = match self.renderer.render(&url).await {
            Ok(fullsize) => fullsize,
            Err(error) => return JobOutcome::Failed { url, error },
        };

        // A thumbnail failure must not discard the successful render: the
        // record is still written, just without the thumbnail field.
        let thumbnail = match &self.thumbnailer {
            Some(thumbnailer) => match thumbnailer.thumbnail(&fullsize).await {
                Ok(name) => Some(name),
                Err(e) => {
                    warn!("Thumbnail failed for {}: {}", url, e);
                    None
                }
            },
            None => None,
        };

        JobOutcome::Completed(Record::new(url, fullsize, thumbnail))
    }
}

/// Fixed-size worker pool with a single serializing writer.
pub struct JobDispatcher {
    worker_count: usize,
    queue_capacity: usize,
    renderer: Arc<dyn Renderer>,
    thumbnailer: Option<Arc<dyn Thumbnailer>>,
}

impl JobDispatcher {
    pub fn new(
        worker_count: usize,
        queue_capacity: usize,
        renderer: Arc<dyn Renderer>,
        thumbnailer: Option<Arc<dyn Thumbnailer>>,
    ) -> Self {
        Self {
            worker_count: worker_count.max(1),
            queue_capacity: queue_capacity.max(1),
            renderer,
            thumbnailer,
        }
    }

    /// Process every URL in `urls`, appending a record for each success.
    ///
    /// This is the join point: when it returns, every submitted URL has been
    /// accounted for and no further key-file writes will occur.
    pub async fn run(
        &self,
        urls: Vec<String>,
        mut appender: LogAppender,
    ) -> Result<DispatchSummary, SnapshotError> {
        let (job_tx, job_rx) = mpsc::channel::<String>(self.queue_capacity);
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<JobOutcome>(self.queue_capacity);
        let shared_jobs = Arc::new(Mutex::new(job_rx));

        let mut worker_handles = Vec::with_capacity(self.worker_count);
        for id in 0..self.worker_count {
            let worker =
                RenderWorker::new(id, self.renderer.clone(), self.thumbnailer.clone());
            let jobs = shared_jobs.clone();
            let outcomes = outcome_tx.clone();
            worker_handles.push(tokio::spawn(async move {
                worker.run(jobs, outcomes).await;
            }));
        }
        drop(outcome_tx);

        // The writer exclusively owns the append cursor for the rest of the run
        let writer_handle = tokio::spawn(async move {
            let mut summary = DispatchSummary {
                completed: 0,
                failed: 0,
            };

            while let Some(outcome) = outcome_rx.recv().await {
                match outcome {
                    JobOutcome::Completed(record) => {
                        appender.append(&record).await?;
                        info!("Created screenshot for '{}'", record.url);
                        summary.completed += 1;
                    }
                    JobOutcome::Failed { url, error } => {
                        warn!("Cannot create screenshot for {}: {}", url, error);
                        summary.failed += 1;
                    }
                }
            }

            Ok::<DispatchSummary, SnapshotError>(summary)
        });

        info!(
            "Dispatching {} URLs across {} workers",
            urls.len(),
            self.worker_count
        );

        for url in urls {
            // Blocks while the queue is full: the backpressure point
            if job_tx.send(url).await.is_err() {
                error!("All workers stopped before the batch was fully submitted");
                break;
            }
        }
        drop(job_tx);

        for joined in join_all(worker_handles).await {
            joined?;
        }
        // Workers are gone, so their outcome senders are dropped and the writer
        // drains whatever remains before reporting.
        writer_handle.await?
    }
}
