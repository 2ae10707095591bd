//! In-memory collaborators that record what the tracker asks of them.
//!
//! Used by the test suites and for running the tracker without a cluster.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use shoal_id::{DatasetId, JobId, PartitionId, WorkerId};
use tracing::debug;

use crate::error::GatewayError;
use crate::gateway::{ResourceManagerGateway, ShuffleMaster, WorkerGateway, WorkerGatewayResolver};
use crate::partition::ShuffleDescriptor;
use crate::tracker::PartitionAction;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One release or promote call received by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionCall {
    pub worker_id: WorkerId,
    pub job_id: JobId,
    pub action: PartitionAction,
    pub partitions: BTreeSet<PartitionId>,
}

/// How a recorded worker answers once the call is recorded.
#[derive(Debug, Clone)]
enum WorkerBehavior {
    Fail(GatewayError),
    Stall,
}

#[derive(Default)]
struct WorkerFleetState {
    calls: Vec<PartitionCall>,
    unreachable: HashSet<WorkerId>,
    behaviors: HashMap<WorkerId, WorkerBehavior>,
}

/// Gateway resolver for a fleet of recording workers.
///
/// Every worker resolves unless marked unreachable, and every call is
/// recorded before the worker answers.
#[derive(Clone, Default)]
pub struct RecordingWorkers {
    state: Arc<Mutex<WorkerFleetState>>,
}

impl RecordingWorkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve no gateway for `worker_id`.
    pub fn mark_unreachable(&self, worker_id: WorkerId) {
        lock(&self.state).unreachable.insert(worker_id);
    }

    /// Answer every call to `worker_id` with `error`.
    pub fn fail_calls_to(&self, worker_id: WorkerId, error: GatewayError) {
        lock(&self.state)
            .behaviors
            .insert(worker_id, WorkerBehavior::Fail(error));
    }

    /// Never answer calls to `worker_id`.
    pub fn stall_calls_to(&self, worker_id: WorkerId) {
        lock(&self.state)
            .behaviors
            .insert(worker_id, WorkerBehavior::Stall);
    }

    pub fn calls(&self) -> Vec<PartitionCall> {
        lock(&self.state).calls.clone()
    }

    pub fn release_calls(&self) -> Vec<PartitionCall> {
        self.calls_of(PartitionAction::Release)
    }

    pub fn promote_calls(&self) -> Vec<PartitionCall> {
        self.calls_of(PartitionAction::Promote)
    }

    fn calls_of(&self, action: PartitionAction) -> Vec<PartitionCall> {
        lock(&self.state)
            .calls
            .iter()
            .filter(|call| call.action == action)
            .cloned()
            .collect()
    }
}

impl WorkerGatewayResolver for RecordingWorkers {
    fn resolve(&self, worker_id: &WorkerId) -> Option<Arc<dyn WorkerGateway>> {
        if lock(&self.state).unreachable.contains(worker_id) {
            return None;
        }
        let gateway: Arc<dyn WorkerGateway> = Arc::new(RecordingWorkerGateway {
            worker_id: *worker_id,
            state: Arc::clone(&self.state),
        });
        Some(gateway)
    }
}

struct RecordingWorkerGateway {
    worker_id: WorkerId,
    state: Arc<Mutex<WorkerFleetState>>,
}

impl RecordingWorkerGateway {
    async fn record(
        &self,
        action: PartitionAction,
        job_id: JobId,
        partitions: BTreeSet<PartitionId>,
    ) -> Result<(), GatewayError> {
        let behavior = {
            let mut state = lock(&self.state);
            state.calls.push(PartitionCall {
                worker_id: self.worker_id,
                job_id,
                action,
                partitions,
            });
            state.behaviors.get(&self.worker_id).cloned()
        };

        debug!(worker_id = %self.worker_id, action = %action, "[RECORDING] Partition call");

        match behavior {
            None => Ok(()),
            Some(WorkerBehavior::Fail(error)) => Err(error),
            Some(WorkerBehavior::Stall) => std::future::pending().await,
        }
    }
}

#[async_trait]
impl WorkerGateway for RecordingWorkerGateway {
    async fn release_partitions(
        &self,
        job_id: JobId,
        partitions: BTreeSet<PartitionId>,
    ) -> Result<(), GatewayError> {
        self.record(PartitionAction::Release, job_id, partitions)
            .await
    }

    async fn promote_partitions(
        &self,
        job_id: JobId,
        partitions: BTreeSet<PartitionId>,
    ) -> Result<(), GatewayError> {
        self.record(PartitionAction::Promote, job_id, partitions)
            .await
    }
}

/// Shuffle master that records external releases.
#[derive(Default)]
pub struct RecordingShuffleMaster {
    released: Mutex<Vec<PartitionId>>,
    stalled: Mutex<HashSet<PartitionId>>,
}

impl RecordingShuffleMaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the release of `partition_id`, then never answer it.
    pub fn stall_release_of(&self, partition_id: PartitionId) {
        lock(&self.stalled).insert(partition_id);
    }

    /// Partition ids released externally, in call order.
    pub fn externally_released(&self) -> Vec<PartitionId> {
        lock(&self.released).clone()
    }
}

#[async_trait]
impl ShuffleMaster for RecordingShuffleMaster {
    async fn release_partition_externally(
        &self,
        descriptor: &ShuffleDescriptor,
    ) -> Result<(), GatewayError> {
        lock(&self.released).push(descriptor.partition_id);
        if lock(&self.stalled).contains(&descriptor.partition_id) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

/// Resource manager that serves canned descriptors and records lookups.
#[derive(Default)]
pub struct RecordingResourceManager {
    descriptors: Mutex<HashMap<DatasetId, Vec<ShuffleDescriptor>>>,
    requested: Mutex<Vec<DatasetId>>,
    failure: Mutex<Option<GatewayError>>,
}

impl RecordingResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_descriptors(&self, dataset_id: DatasetId, descriptors: Vec<ShuffleDescriptor>) {
        lock(&self.descriptors).insert(dataset_id, descriptors);
    }

    /// Answer every following lookup with `error`.
    pub fn fail_with(&self, error: GatewayError) {
        *lock(&self.failure) = Some(error);
    }

    pub fn requested_datasets(&self) -> Vec<DatasetId> {
        lock(&self.requested).clone()
    }
}

#[async_trait]
impl ResourceManagerGateway for RecordingResourceManager {
    async fn cluster_partition_shuffle_descriptors(
        &self,
        dataset_id: DatasetId,
    ) -> Result<Vec<ShuffleDescriptor>, GatewayError> {
        lock(&self.requested).push(dataset_id);

        if let Some(error) = lock(&self.failure).clone() {
            return Err(error);
        }

        Ok(lock(&self.descriptors)
            .get(&dataset_id)
            .cloned()
            .unwrap_or_default())
    }
}
