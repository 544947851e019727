use async_trait::async_trait;
use chrono::Utc;
use courtlist_model::CourtListId;
use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::join_all;
use std::{fmt, sync::Arc};
use tokio::{
    sync::{Mutex, mpsc, mpsc::error::TrySendError},
    task::{AbortHandle, JoinHandle},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{config::DispatcherConfig, job::PublishJob, pipeline::RunOutcome};
use crate::error::{PublicationError, Result};

/// Executes a dequeued job. Implemented by the orchestrator; tests plug in
/// their own runners.
#[async_trait]
pub trait JobRunner: Send + Sync + 'static {
    async fn run_job(&self, job: PublishJob) -> RunOutcome;
}

/// What happened to a dispatched job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Enqueued,
    /// A run for the same id was already queued or running.
    Coalesced,
}

type InFlight = Arc<DashMap<CourtListId, ()>>;

/// Marks an id as queued or running; released on drop.
struct InFlightClaim {
    id: CourtListId,
    in_flight: InFlight,
}

impl InFlightClaim {
    fn acquire(in_flight: &InFlight, id: CourtListId) -> Option<Self> {
        match in_flight.entry(id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(Self {
                    id,
                    in_flight: Arc::clone(in_flight),
                })
            }
        }
    }
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.in_flight.remove(&self.id);
    }
}

/// Aborts the run it guards when dropped, so a worker aborted at shutdown
/// does not leave its run behind.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct QueuedJob {
    job: PublishJob,
    _claim: Option<InFlightClaim>,
}

/// Bounded publish queue feeding a fixed pool of workers.
///
/// `dispatch` never waits for room: a full queue is reported to the caller
/// as `QueueFull`. Jobs already queued when `shutdown` starts still run.
pub struct PublishDispatcher {
    config: DispatcherConfig,
    mailbox_tx: Arc<Mutex<Option<mpsc::Sender<QueuedJob>>>>,
    in_flight: InFlight,
    shutdown_token: CancellationToken,
    worker_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl fmt::Debug for PublishDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mailbox_ready = self
            .mailbox_tx
            .try_lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false);
        let worker_handle_count = self
            .worker_handles
            .try_lock()
            .map(|handles| handles.len())
            .unwrap_or_default();

        f.debug_struct("PublishDispatcher")
            .field("config", &self.config)
            .field("in_flight", &self.in_flight.len())
            .field("worker_handle_count", &worker_handle_count)
            .field("mailbox_ready", &mailbox_ready)
            .field("shutdown_cancelled", &self.shutdown_token.is_cancelled())
            .finish()
    }
}

impl PublishDispatcher {
    /// Spawns the worker pool on the current runtime.
    pub fn start(config: DispatcherConfig, runner: Arc<dyn JobRunner>) -> Self {
        let capacity = config.queue_capacity.max(1);
        let workers = config.workers.max(1);
        let (tx, rx) = mpsc::channel::<QueuedJob>(capacity);
        let rx = Arc::new(Mutex::new(rx));

        let handles = (0..workers)
            .map(|index| {
                tokio::spawn(worker_loop(
                    index,
                    Arc::clone(&rx),
                    Arc::clone(&runner),
                ))
            })
            .collect();

        info!(
            queue_capacity = capacity,
            workers,
            single_flight = config.single_flight,
            "publish dispatcher started"
        );

        Self {
            config,
            mailbox_tx: Arc::new(Mutex::new(Some(tx))),
            in_flight: Arc::new(DashMap::new()),
            shutdown_token: CancellationToken::new(),
            worker_handles: Mutex::new(handles),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Ids currently queued or running. Only tracked with single-flight on.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    pub async fn dispatch(&self, job: PublishJob) -> Result<DispatchOutcome> {
        if self.shutdown_token.is_cancelled() {
            return Err(PublicationError::ShuttingDown);
        }

        let id = job.court_list_id;
        let claim = if self.config.single_flight {
            match InFlightClaim::acquire(&self.in_flight, id) {
                Some(claim) => Some(claim),
                None => {
                    debug!(
                        court_list_id = %id,
                        "run already in flight; coalesced"
                    );
                    return Ok(DispatchOutcome::Coalesced);
                }
            }
        } else {
            None
        };

        let tx = {
            let guard = self.mailbox_tx.lock().await;
            guard.clone().ok_or(PublicationError::ShuttingDown)?
        };

        // A rejected job drops its claim on the way out.
        match tx.try_send(QueuedJob { job, _claim: claim }) {
            Ok(()) => {
                debug!(court_list_id = %id, "publish job enqueued");
                Ok(DispatchOutcome::Enqueued)
            }
            Err(TrySendError::Full(_)) => {
                warn!(court_list_id = %id, "publish queue full");
                Err(PublicationError::QueueFull {
                    capacity: tx.max_capacity(),
                })
            }
            Err(TrySendError::Closed(_)) => {
                Err(PublicationError::ShuttingDown)
            }
        }
    }

    /// Stops intake, lets workers drain the queue, and waits up to the
    /// configured grace period before aborting them.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown of publish dispatcher");
        self.shutdown_token.cancel();

        {
            let mut guard = self.mailbox_tx.lock().await;
            *guard = None;
        }

        let handles = {
            let mut guard = self.worker_handles.lock().await;
            std::mem::take(&mut *guard)
        };
        let aborts: Vec<_> =
            handles.iter().map(JoinHandle::abort_handle).collect();

        match tokio::time::timeout(
            self.config.shutdown_grace,
            join_all(handles),
        )
        .await
        {
            Ok(results) => {
                for result in results {
                    if let Err(e) = result {
                        warn!("Publish worker failed: {e}");
                    }
                }
                info!("Publish dispatcher shutdown complete");
            }
            Err(_) => {
                warn!(
                    grace_ms = self.config.shutdown_grace.as_millis() as u64,
                    "Publish workers still busy after grace period; aborting"
                );
                // Each aborted worker drops its guard, which aborts its run.
                for abort in aborts {
                    abort.abort();
                }
            }
        }
    }
}

async fn worker_loop(
    index: usize,
    rx: Arc<Mutex<mpsc::Receiver<QueuedJob>>>,
    runner: Arc<dyn JobRunner>,
) {
    loop {
        let next = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(QueuedJob { job, _claim: claim }) = next else {
            break;
        };

        let id = job.court_list_id;
        let queued_ms = (Utc::now() - job.requested_at).num_milliseconds();
        debug!(worker = index, court_list_id = %id, queued_ms, "run starting");

        let runner = Arc::clone(&runner);
        // Own task so a panicking run cannot take the worker down.
        let run = tokio::spawn(async move { runner.run_job(job).await });
        let _abort_run = AbortOnDrop(run.abort_handle());
        match run.await {
            Ok(outcome) => {
                debug!(
                    worker = index,
                    court_list_id = %id,
                    ?outcome,
                    "run finished"
                )
            }
            Err(e) if e.is_cancelled() => {
                warn!(worker = index, court_list_id = %id, "run aborted")
            }
            Err(e) => {
                error!(
                    worker = index,
                    court_list_id = %id,
                    "publication run panicked: {e}"
                )
            }
        }
        drop(claim);
    }
    debug!(worker = index, "publish worker exiting");
}
