use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use alloy_primitives::B256;
use eyre::Result;
use tokio::{sync::watch, task::JoinHandle, time::Instant};

use crate::{
    common::{BlockInfo, SharedHeads},
    engine::{BuiltPayload, PayloadAttributes, PayloadId},
    telemetry::metrics,
};

use super::{BuildArguments, BuilderConfig, PayloadBuilder};

/// Upper bound on retained jobs; the oldest is evicted when a new one would exceed it.
pub const MAX_PAYLOAD_JOBS: usize = 32;

/// Runs payload build jobs and hands out their best payloads by [PayloadId].
#[derive(Debug)]
pub struct BuildCoordinator<B: PayloadBuilder> {
    inner: Arc<Inner<B>>,
}

impl<B: PayloadBuilder> Clone for BuildCoordinator<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

#[derive(Debug)]
struct Inner<B> {
    builder: Arc<B>,
    heads: SharedHeads,
    config: BuilderConfig,
    jobs: Mutex<JobTable>,
}

#[derive(Debug, Default)]
struct JobTable {
    jobs: HashMap<PayloadId, BuildJob>,
    by_parent: HashMap<B256, PayloadId>,
    /// Insertion order, for eviction
    order: VecDeque<PayloadId>,
}

#[derive(Debug)]
struct BuildJob {
    parent: B256,
    flags: Arc<JobFlags>,
    best: watch::Receiver<Option<BuiltPayload>>,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct JobFlags {
    cancelled: AtomicBool,
    resolved: AtomicBool,
}

impl JobTable {
    fn remove(&mut self, id: &PayloadId) -> Option<BuildJob> {
        let job = self.jobs.remove(id)?;
        job.flags.cancelled.store(true, Ordering::SeqCst);
        if self.by_parent.get(&job.parent) == Some(id) {
            self.by_parent.remove(&job.parent);
        }
        self.order.retain(|queued| queued != id);
        Some(job)
    }

    fn active(&self) -> usize {
        self.jobs
            .values()
            .filter(|job| !job.handle.is_finished())
            .count()
    }

    /// Like [JobTable::active], leaving out the job `id` whose task is returning.
    fn active_except(&self, id: &PayloadId) -> usize {
        self.jobs
            .iter()
            .filter(|(job_id, job)| *job_id != id && !job.handle.is_finished())
            .count()
    }
}

impl<B: PayloadBuilder> BuildCoordinator<B> {
    pub fn new(builder: Arc<B>, heads: SharedHeads, config: BuilderConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                builder,
                heads,
                config,
                jobs: Mutex::new(JobTable::default()),
            }),
        }
    }

    /// Starts building on top of `parent` and returns the new job's id immediately.
    ///
    /// Any earlier job for the same parent is cancelled.
    pub fn start_build(&self, parent: BlockInfo, attributes: PayloadAttributes) -> Result<PayloadId> {
        let mut table = self
            .inner
            .jobs
            .lock()
            .map_err(|_| eyre::eyre!("lock poisoned"))?;

        if let Some(previous) = table.by_parent.get(&parent.hash).copied() {
            table.remove(&previous);
            tracing::debug!(target: "tiller", id = %previous, "superseded payload job");
        }
        while table.jobs.len() >= MAX_PAYLOAD_JOBS {
            let Some(oldest) = table.order.front().copied() else {
                break;
            };
            table.remove(&oldest);
            tracing::debug!(target: "tiller", id = %oldest, "evicted payload job");
        }

        let id = loop {
            let id = PayloadId::new(rand::random());
            if !table.jobs.contains_key(&id) {
                break id;
            }
        };

        let flags = Arc::new(JobFlags::default());
        let (tx, best) = watch::channel(None);
        let args = BuildArguments {
            id,
            parent,
            attributes,
            iteration: 0,
        };
        let handle = tokio::spawn(run_job(self.inner.clone(), flags.clone(), args, tx));

        table.jobs.insert(
            id,
            BuildJob {
                parent: parent.hash,
                flags,
                best,
                handle,
            },
        );
        table.by_parent.insert(parent.hash, id);
        table.order.push_back(id);
        metrics::PAYLOAD_JOBS.set(table.active() as i64);

        tracing::info!(target: "tiller", id = %id, parent = %parent.hash, "started payload job");
        Ok(id)
    }

    /// Stops the job; its payload is no longer retrievable. Returns false for unknown ids.
    pub fn cancel(&self, id: &PayloadId) -> bool {
        let Ok(mut table) = self.inner.jobs.lock() else {
            return false;
        };
        table.remove(id).is_some()
    }

    /// Returns the best payload of the job, waiting for its first iteration if needed.
    ///
    /// The job stops improving once retrieved, and gives up after its next failed
    /// attempt if it has nothing to return yet. Returns `None` for unknown or
    /// cancelled ids, and for jobs that ended without producing a payload.
    pub async fn retrieve(&self, id: &PayloadId) -> Option<BuiltPayload> {
        let mut best = {
            let table = self.inner.jobs.lock().ok()?;
            let job = table.jobs.get(id)?;
            job.flags.resolved.store(true, Ordering::SeqCst);
            job.best.clone()
        };

        loop {
            let current = best.borrow_and_update().clone();
            if current.is_some() {
                return current;
            }
            if best.changed().await.is_err() {
                return best.borrow().clone();
            }
        }
    }

    /// Returns the id of the live job building on `parent`, if any.
    pub fn current_for_parent(&self, parent: &B256) -> Option<PayloadId> {
        self.inner.jobs.lock().ok()?.by_parent.get(parent).copied()
    }

    /// Number of jobs still building.
    pub fn active_jobs(&self) -> usize {
        self.inner
            .jobs
            .lock()
            .map(|table| table.active())
            .unwrap_or_default()
    }
}

async fn run_job<B: PayloadBuilder>(
    inner: Arc<Inner<B>>,
    flags: Arc<JobFlags>,
    mut args: BuildArguments,
    best: watch::Sender<Option<BuiltPayload>>,
) {
    let deadline = Instant::now() + inner.config.deadline();
    let parent = args.parent.hash;

    loop {
        if flags.cancelled.load(Ordering::SeqCst) {
            break;
        }
        if flags.resolved.load(Ordering::SeqCst) && best.borrow().is_some() {
            break;
        }
        if !is_head(&inner.heads, &parent) {
            tracing::debug!(target: "tiller", id = %args.id, "parent no longer canonical head");
            break;
        }

        match inner.builder.build(args.clone()).await {
            Ok(mut payload) => {
                payload.iteration = args.iteration;
                best.send_replace(Some(payload));
            }
            Err(err) => {
                tracing::warn!(target: "tiller", id = %args.id, "payload build failed: {:?}", err);
                if flags.resolved.load(Ordering::SeqCst) && best.borrow().is_none() {
                    break;
                }
            }
        }
        args.iteration += 1;

        if Instant::now() >= deadline {
            break;
        }
        tokio::time::sleep_until(deadline.min(Instant::now() + inner.config.interval())).await;
    }

    tracing::debug!(target: "tiller", id = %args.id, iterations = args.iteration, "payload job done");
    if let Ok(table) = inner.jobs.lock() {
        metrics::PAYLOAD_JOBS.set(table.active_except(&args.id) as i64);
    }
}

fn is_head(heads: &SharedHeads, parent: &B256) -> bool {
    heads
        .read()
        .map(|heads| heads.head.hash == *parent)
        .unwrap_or(false)
}
