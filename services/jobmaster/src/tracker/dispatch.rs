//! Batched, fire-and-forget release and promote calls.
//!
//! Records handed to the dispatcher have already left the registry. Each
//! invocation groups the local-resource records by producer and issues one
//! call per worker; shuffle master notifications are issued per record, each
//! in its own task. Every remote call is bounded by the RPC timeout and
//! nothing here waits for one to finish.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use shoal_id::{JobId, PartitionId, WorkerId};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::gateway::{ShuffleMaster, WorkerGateway, WorkerGatewayResolver};
use crate::partition::{PartitionRecord, ShuffleDescriptor};

/// What happens to a partition when the tracker lets go of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionAction {
    /// Discard the partition and its resources.
    Release,
    /// Keep the partition as a cluster partition beyond the job.
    Promote,
}

impl PartitionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Promote => "promote",
        }
    }
}

impl std::fmt::Display for PartitionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of issuing one release or promote invocation.
///
/// The registry change is already complete when this is returned. The
/// spawned calls keep running whether or not it is awaited or dropped.
#[derive(Debug)]
pub struct PartitionDispatch {
    action: PartitionAction,
    untracked: Vec<PartitionId>,
    workers_called: Vec<WorkerId>,
    unreachable_workers: Vec<WorkerId>,
    external_releases: usize,
    tasks: Vec<JoinHandle<()>>,
}

impl PartitionDispatch {
    pub fn action(&self) -> PartitionAction {
        self.action
    }

    /// Ids that were tracked and have now been removed.
    pub fn untracked(&self) -> &[PartitionId] {
        &self.untracked
    }

    /// Workers that were sent a batched call, one call each.
    pub fn workers_called(&self) -> &[WorkerId] {
        &self.workers_called
    }

    /// Workers holding local resources for which no gateway resolved.
    pub fn unreachable_workers(&self) -> &[WorkerId] {
        &self.unreachable_workers
    }

    pub fn remote_calls(&self) -> usize {
        self.workers_called.len()
    }

    /// Number of shuffle master notifications issued.
    pub fn external_releases(&self) -> usize {
        self.external_releases
    }

    /// Wait for every spawned call to finish. Failures were already logged.
    pub async fn settled(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Partition dispatch task did not complete");
            }
        }
    }
}

/// Issues the remote side of one release or promote invocation.
pub(crate) struct Dispatcher<'a> {
    pub job_id: JobId,
    pub rpc_timeout: Duration,
    pub executor: &'a Handle,
    pub gateways: &'a dyn WorkerGatewayResolver,
    pub shuffle_master: &'a Arc<dyn ShuffleMaster>,
}

impl Dispatcher<'_> {
    pub fn dispatch(
        &self,
        action: PartitionAction,
        removed: Vec<PartitionRecord>,
        notify_shuffle_master: bool,
    ) -> PartitionDispatch {
        let mut dispatch = PartitionDispatch {
            action,
            untracked: removed.iter().map(PartitionRecord::partition_id).collect(),
            workers_called: Vec::new(),
            unreachable_workers: Vec::new(),
            external_releases: 0,
            tasks: Vec::new(),
        };

        for (worker_id, partitions) in local_partitions_by_worker(&removed) {
            match self.gateways.resolve(&worker_id) {
                Some(gateway) => {
                    let task = self.spawn_worker_call(action, worker_id, gateway, partitions);
                    dispatch.tasks.push(task);
                    dispatch.workers_called.push(worker_id);
                }
                None => {
                    warn!(
                        job_id = %self.job_id,
                        worker_id = %worker_id,
                        action = %action,
                        partition_count = partitions.len(),
                        "No gateway for worker, skipping partition call"
                    );
                    dispatch.unreachable_workers.push(worker_id);
                }
            }
        }

        if notify_shuffle_master {
            for record in removed {
                let task = self.spawn_external_release(record.into_shuffle_descriptor());
                dispatch.tasks.push(task);
                dispatch.external_releases += 1;
            }
        }

        dispatch
    }

    fn spawn_worker_call(
        &self,
        action: PartitionAction,
        worker_id: WorkerId,
        gateway: Arc<dyn WorkerGateway>,
        partitions: BTreeSet<PartitionId>,
    ) -> JoinHandle<()> {
        let job_id = self.job_id;
        let rpc_timeout = self.rpc_timeout;

        self.executor.spawn(async move {
            let partition_count = partitions.len();
            let call = match action {
                PartitionAction::Release => gateway.release_partitions(job_id, partitions),
                PartitionAction::Promote => gateway.promote_partitions(job_id, partitions),
            };

            match tokio::time::timeout(rpc_timeout, call).await {
                Ok(Ok(())) => {
                    debug!(
                        job_id = %job_id,
                        worker_id = %worker_id,
                        action = %action,
                        partition_count,
                        "Worker accepted partition call"
                    );
                }
                Ok(Err(e)) => {
                    warn!(
                        job_id = %job_id,
                        worker_id = %worker_id,
                        action = %action,
                        partition_count,
                        error = %e,
                        "Partition call to worker failed"
                    );
                }
                Err(_) => {
                    warn!(
                        job_id = %job_id,
                        worker_id = %worker_id,
                        action = %action,
                        partition_count,
                        timeout = ?rpc_timeout,
                        "Partition call to worker timed out"
                    );
                }
            }
        })
    }

    fn spawn_external_release(&self, descriptor: ShuffleDescriptor) -> JoinHandle<()> {
        let shuffle_master = Arc::clone(self.shuffle_master);
        let job_id = self.job_id;
        let rpc_timeout = self.rpc_timeout;

        self.executor.spawn(async move {
            let call = shuffle_master.release_partition_externally(&descriptor);
            match tokio::time::timeout(rpc_timeout, call).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(
                        job_id = %job_id,
                        partition_id = %descriptor.partition_id,
                        error = %e,
                        "Shuffle master failed to release partition"
                    );
                }
                Err(_) => {
                    warn!(
                        job_id = %job_id,
                        partition_id = %descriptor.partition_id,
                        timeout = ?rpc_timeout,
                        "Shuffle master release timed out"
                    );
                }
            }
        })
    }
}

/// Local-resource partition ids grouped by producer. External records are
/// left out since their worker holds nothing for them.
fn local_partitions_by_worker(
    records: &[PartitionRecord],
) -> BTreeMap<WorkerId, BTreeSet<PartitionId>> {
    let mut grouped: BTreeMap<WorkerId, BTreeSet<PartitionId>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.occupies_local_resource()) {
        grouped
            .entry(record.producer())
            .or_default()
            .insert(record.partition_id());
    }
    grouped
}
