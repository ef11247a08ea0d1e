// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixed-size conversion worker pool.
//
// One dispatcher task owns all queue and in-flight bookkeeping; workers and
// callers talk to it exclusively through channels, so no shared mutable state
// needs a lock. Workers are long-lived for the pool session and run the
// CPU-bound pipeline under `tokio::task::spawn_blocking`.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::{AppConfig, ConversionOutcome, ConvertOptions, JobId, JobStatus, SourceFile};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::messages::{ConvertRequest, WorkerReply, WorkerReport};

/// One queued or in-flight job as tracked by the dispatcher.
struct PendingJob {
    request: ConvertRequest,
    reply_tx: oneshot::Sender<Result<ConversionOutcome>>,
    submitted_at: DateTime<Utc>,
}

/// Fixed-size pool of background conversion workers.
///
/// Created once per application session with [`WorkerPool::start`] and torn
/// down with [`WorkerPool::shutdown`]. Submissions beyond the concurrency cap
/// wait in FIFO order; backpressure is implicit — the caller's future simply
/// resolves later. Dispatched jobs cannot be cancelled; they run to
/// completion or failure.
pub struct WorkerPool {
    submit_tx: mpsc::UnboundedSender<PendingJob>,
    busy: Arc<AtomicUsize>,
    worker_count: usize,
    job_timeout_secs: Option<u64>,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn the worker tasks and the dispatcher.
    ///
    /// Workers live for the pool session and are not recreated per job.
    pub fn start(config: AppConfig) -> Self {
        let worker_count = config.worker_count.max(1);
        let job_timeout_secs = config.job_timeout_secs;
        let busy = Arc::new(AtomicUsize::new(0));
        let config = Arc::new(config);

        let (submit_tx, submit_rx) = mpsc::unbounded_channel();
        let (report_tx, report_rx) = mpsc::unbounded_channel();

        let mut worker_txs = Vec::with_capacity(worker_count);
        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let (tx, rx) = mpsc::unbounded_channel();
            worker_txs.push(tx);
            workers.push(tokio::spawn(worker_loop(
                index,
                rx,
                report_tx.clone(),
                Arc::clone(&config),
            )));
        }
        drop(report_tx);

        let dispatcher = tokio::spawn(dispatcher_loop(
            submit_rx,
            report_rx,
            worker_txs,
            Arc::clone(&busy),
        ));

        info!(worker_count, "conversion worker pool started");
        Self {
            submit_tx,
            busy,
            worker_count,
            job_timeout_secs,
            dispatcher,
            workers,
        }
    }

    /// Submit one file for conversion.
    ///
    /// The file's byte buffer moves into the pool immediately; the returned
    /// future resolves or rejects exactly once with the job's outcome. When a
    /// job timeout is configured, a worker that never reports back turns into
    /// an explicit [`BildwerkError::Timeout`] instead of hanging the caller.
    pub fn submit(
        &self,
        file: SourceFile,
        options: ConvertOptions,
    ) -> impl Future<Output = Result<ConversionOutcome>> + Send + 'static {
        let id = JobId::new();
        let (reply_tx, reply_rx) = oneshot::channel();
        let job = PendingJob {
            request: ConvertRequest {
                id,
                buffer: file.bytes,
                original_name: file.name,
                options,
            },
            reply_tx,
            submitted_at: Utc::now(),
        };

        debug!(job_id = %id, status = ?JobStatus::Queued, "job submitted");
        let enqueued = self.submit_tx.send(job).is_ok();
        let timeout_secs = self.job_timeout_secs;

        async move {
            if !enqueued {
                return Err(BildwerkError::WorkerUnavailable(
                    "worker pool is shut down".into(),
                ));
            }
            let await_reply = async {
                reply_rx.await.map_err(|_| {
                    BildwerkError::WorkerUnavailable("reply channel closed".into())
                })?
            };
            match timeout_secs {
                Some(seconds) => {
                    tokio::time::timeout(Duration::from_secs(seconds), await_reply)
                        .await
                        .map_err(|_| BildwerkError::Timeout {
                            job_id: id.to_string(),
                            seconds,
                        })?
                }
                None => await_reply.await,
            }
        }
    }

    /// Number of jobs currently dispatched to workers.
    pub fn busy(&self) -> usize {
        self.busy.load(Ordering::Relaxed)
    }

    /// Size of the worker pool.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Tear the pool down: stop accepting submissions, drain queued and
    /// in-flight jobs, then join the dispatcher and all workers. Call once at
    /// the end of the session.
    pub async fn shutdown(self) {
        let Self {
            submit_tx,
            dispatcher,
            workers,
            ..
        } = self;
        drop(submit_tx);

        if let Err(err) = dispatcher.await {
            error!(error = %err, "dispatcher task failed during shutdown");
        }
        for (index, worker) in workers.into_iter().enumerate() {
            if let Err(err) = worker.await {
                error!(worker = index, error = %err, "worker task failed during shutdown");
            }
        }
        info!("conversion worker pool shut down");
    }
}

/// Dispatcher: sole owner of the FIFO queue, the idle-worker list, and the
/// pending-job table. All state changes happen in this one task.
async fn dispatcher_loop(
    mut submit_rx: mpsc::UnboundedReceiver<PendingJob>,
    mut report_rx: mpsc::UnboundedReceiver<WorkerReport>,
    worker_txs: Vec<mpsc::UnboundedSender<ConvertRequest>>,
    busy: Arc<AtomicUsize>,
) {
    let mut queue: VecDeque<PendingJob> = VecDeque::new();
    let mut pending: HashMap<JobId, (oneshot::Sender<Result<ConversionOutcome>>, DateTime<Utc>)> =
        HashMap::new();
    let mut idle: Vec<usize> = (0..worker_txs.len()).collect();
    let mut intake_open = true;

    loop {
        tokio::select! {
            submission = submit_rx.recv(), if intake_open => {
                match submission {
                    Some(job) => {
                        queue.push_back(job);
                        dispatch_queued(&mut queue, &mut pending, &mut idle, &worker_txs, &busy);
                    }
                    None => {
                        intake_open = false;
                        debug!("pool intake closed, draining remaining jobs");
                    }
                }
            }
            report = report_rx.recv() => {
                let Some(WorkerReport { worker, reply }) = report else {
                    // All workers gone; fail whatever is still tracked.
                    fail_all(&mut queue, &mut pending);
                    return;
                };
                busy.fetch_sub(1, Ordering::Relaxed);
                idle.push(worker);
                resolve_reply(&mut pending, reply);
                dispatch_queued(&mut queue, &mut pending, &mut idle, &worker_txs, &busy);
            }
        }

        if !intake_open && queue.is_empty() && pending.is_empty() {
            return;
        }
    }
}

/// Hand queued jobs to idle workers while both exist.
fn dispatch_queued(
    queue: &mut VecDeque<PendingJob>,
    pending: &mut HashMap<JobId, (oneshot::Sender<Result<ConversionOutcome>>, DateTime<Utc>)>,
    idle: &mut Vec<usize>,
    worker_txs: &[mpsc::UnboundedSender<ConvertRequest>],
    busy: &AtomicUsize,
) {
    while !queue.is_empty() && !idle.is_empty() {
        let job = queue.pop_front().expect("queue checked non-empty");
        let worker = idle.pop().expect("idle checked non-empty");
        let id = job.request.id;

        debug!(job_id = %id, worker, status = ?JobStatus::Dispatched, "job dispatched");
        pending.insert(id, (job.reply_tx, job.submitted_at));
        busy.fetch_add(1, Ordering::Relaxed);

        if worker_txs[worker].send(job.request).is_err() {
            // Worker is gone; fail this job but leave its siblings alone.
            warn!(job_id = %id, worker, "worker channel closed at dispatch");
            busy.fetch_sub(1, Ordering::Relaxed);
            if let Some((reply_tx, _)) = pending.remove(&id) {
                let _ = reply_tx.send(Err(BildwerkError::WorkerUnavailable(
                    "worker exited before dispatch".into(),
                )));
            }
        }
    }
}

/// Correlate a worker reply with its pending caller and resolve it.
fn resolve_reply(
    pending: &mut HashMap<JobId, (oneshot::Sender<Result<ConversionOutcome>>, DateTime<Utc>)>,
    reply: WorkerReply,
) {
    let id = reply.job_id();
    let Some((reply_tx, submitted_at)) = pending.remove(&id) else {
        // Caller gave up (e.g. timed out); drop the late result.
        warn!(job_id = %id, "reply for unknown or abandoned job");
        return;
    };
    let wait_ms = (Utc::now() - submitted_at).num_milliseconds();

    match reply {
        WorkerReply::Done { outcome, .. } => {
            info!(
                job_id = %id,
                status = ?JobStatus::Completed,
                wait_ms,
                out_bytes = outcome.output_size,
                "job completed"
            );
            let _ = reply_tx.send(Ok(outcome));
        }
        WorkerReply::Error {
            message,
            original_name,
            ..
        } => {
            warn!(
                job_id = %id,
                status = ?JobStatus::Failed,
                wait_ms,
                name = %original_name,
                error = %message,
                "job failed"
            );
            let _ = reply_tx.send(Err(BildwerkError::JobFailed(message)));
        }
    }
}

/// Reject every tracked job; used when the worker side collapses entirely.
fn fail_all(
    queue: &mut VecDeque<PendingJob>,
    pending: &mut HashMap<JobId, (oneshot::Sender<Result<ConversionOutcome>>, DateTime<Utc>)>,
) {
    error!(
        queued = queue.len(),
        in_flight = pending.len(),
        "all workers exited; failing remaining jobs"
    );
    for job in queue.drain(..) {
        let _ = job.reply_tx.send(Err(BildwerkError::WorkerUnavailable(
            "worker pool collapsed".into(),
        )));
    }
    for (_, (reply_tx, _)) in pending.drain() {
        let _ = reply_tx.send(Err(BildwerkError::WorkerUnavailable(
            "worker pool collapsed".into(),
        )));
    }
}

/// One background worker: receives requests, runs the conversion pipeline on
/// the blocking thread pool, reports the result. Stateless between jobs.
async fn worker_loop(
    index: usize,
    mut rx: mpsc::UnboundedReceiver<ConvertRequest>,
    report_tx: mpsc::UnboundedSender<WorkerReport>,
    config: Arc<AppConfig>,
) {
    while let Some(request) = rx.recv().await {
        let ConvertRequest {
            id,
            buffer,
            original_name,
            options,
        } = request;

        let config = Arc::clone(&config);
        let name = original_name.clone();
        let joined = tokio::task::spawn_blocking(move || {
            bildwerk_convert::convert(&buffer, &name, &options, &config)
        })
        .await;

        let reply = match joined {
            Ok(Ok(outcome)) => WorkerReply::Done { id, outcome },
            Ok(Err(err)) => WorkerReply::Error {
                id,
                message: err.to_string(),
                original_name,
            },
            Err(join_err) => WorkerReply::Error {
                id,
                message: format!("conversion task panicked: {join_err}"),
                original_name,
            },
        };

        if report_tx.send(WorkerReport {
            worker: index,
            reply,
        })
        .is_err()
        {
            // Dispatcher is gone; nothing left to report to.
            break;
        }
    }
    debug!(worker = index, "worker exiting");
}
