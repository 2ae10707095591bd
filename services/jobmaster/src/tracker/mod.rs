//! The job master partition tracker.
//!
//! The tracker is owned by the job's control context, which performs every
//! mutation through `&mut self`. Each mutation edits the registry in place
//! under its write lock, so [`PartitionTrackerView`] handles held by other
//! contexts always read a complete state and a mutation costs the same no
//! matter how many partitions are tracked.
//!
//! Letting go of partitions comes in three forms:
//!
//! - release: remove, one release call per worker holding local resources,
//!   and a shuffle master notification for every record
//! - promote: remove and one promote call per worker holding local
//!   resources; the shuffle master keeps the partitions
//! - stop tracking: remove only, for partitions whose worker is gone

mod directory;
mod dispatch;
mod view;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use shoal_id::{DatasetId, JobId, PartitionId, WorkerId};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::gateway::{ResourceManagerGateway, ShuffleMaster, WorkerGatewayResolver};
use crate::partition::{
    PartitionDeploymentDescriptor, PartitionRecord, PartitionRegistry, ShuffleDescriptor,
};

pub use directory::ClusterPartitionDirectory;
pub use dispatch::{PartitionAction, PartitionDispatch};
pub use view::{PartitionTrackerView, TrackerSummary, WorkerSummary};

use dispatch::Dispatcher;

/// Options for [`JobMasterPartitionTracker::stop_tracking_and_release_partitions_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseOptions {
    /// Notify the shuffle master for every released record. Turn off when the
    /// shuffle service is being cleaned up for the whole job by other means.
    pub release_on_shuffle_master: bool,
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        Self {
            release_on_shuffle_master: true,
        }
    }
}

/// Tracks the partitions of one job and reclaims them when told to.
pub struct JobMasterPartitionTracker {
    job_id: JobId,
    rpc_timeout: Duration,
    view: PartitionTrackerView,
    directory: ClusterPartitionDirectory,
    shuffle_master: Arc<dyn ShuffleMaster>,
    gateways: Arc<dyn WorkerGatewayResolver>,
    executor: Handle,
}

impl JobMasterPartitionTracker {
    /// Create a tracker for `config.job_id`.
    ///
    /// Worker and shuffle master calls are spawned on `executor` and never
    /// awaited by the tracker.
    pub fn new(
        config: &TrackerConfig,
        shuffle_master: Arc<dyn ShuffleMaster>,
        gateways: Arc<dyn WorkerGatewayResolver>,
        executor: Handle,
    ) -> Self {
        Self {
            job_id: config.job_id,
            rpc_timeout: config.rpc_timeout,
            view: PartitionTrackerView::new(config.job_id),
            directory: ClusterPartitionDirectory::new(),
            shuffle_master,
            gateways,
            executor,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// A read handle that can be moved to other contexts.
    pub fn view(&self) -> PartitionTrackerView {
        self.view.clone()
    }

    pub fn directory(&self) -> ClusterPartitionDirectory {
        self.directory.clone()
    }

    /// Start tracking a partition deployed on `producer`.
    ///
    /// Returns false for kinds that are never tracked; nothing is recorded for
    /// them and the caller owes the tracker nothing further.
    pub fn start_tracking_partition(
        &mut self,
        producer: WorkerId,
        descriptor: PartitionDeploymentDescriptor,
    ) -> bool {
        let partition_id = descriptor.partition_id();
        let kind = descriptor.kind;

        if !kind.requires_tracking() {
            debug!(
                job_id = %self.job_id,
                worker_id = %producer,
                partition_id = %partition_id,
                kind = %kind,
                "Partition kind is not tracked"
            );
            return false;
        }

        let record = PartitionRecord::new(producer, descriptor);
        let occupies_local_resource = record.occupies_local_resource();
        let tracked = self.update_registry(|registry| registry.register(record));

        debug!(
            job_id = %self.job_id,
            worker_id = %producer,
            partition_id = %partition_id,
            kind = %kind,
            occupies_local_resource,
            "Tracking partition"
        );
        tracked
    }

    /// Forget every partition of `producer` without contacting anyone.
    ///
    /// Used when the worker is gone and its resources went with it.
    pub fn stop_tracking_partitions_for(&mut self, producer: &WorkerId) -> Vec<PartitionRecord> {
        let removed = self.update_registry(|registry| registry.remove_for_worker(producer));
        if !removed.is_empty() {
            info!(
                job_id = %self.job_id,
                worker_id = %producer,
                partition_count = removed.len(),
                "Stopped tracking partitions of worker"
            );
        }
        removed
    }

    /// Forget the given partitions without contacting anyone.
    pub fn stop_tracking_partitions<I>(&mut self, partition_ids: I) -> Vec<PartitionRecord>
    where
        I: IntoIterator<Item = PartitionId>,
    {
        let ids: HashSet<PartitionId> = partition_ids.into_iter().collect();
        let removed = self.update_registry(|registry| registry.remove_by_ids(&ids));
        debug!(
            job_id = %self.job_id,
            requested = ids.len(),
            partition_count = removed.len(),
            "Stopped tracking partitions"
        );
        removed
    }

    /// Stop tracking and release the given partitions.
    ///
    /// Ids that are not tracked are ignored.
    pub fn stop_tracking_and_release_partitions<I>(&mut self, partition_ids: I) -> PartitionDispatch
    where
        I: IntoIterator<Item = PartitionId>,
    {
        self.stop_tracking_and_release_partitions_with(partition_ids, ReleaseOptions::default())
    }

    pub fn stop_tracking_and_release_partitions_with<I>(
        &mut self,
        partition_ids: I,
        options: ReleaseOptions,
    ) -> PartitionDispatch
    where
        I: IntoIterator<Item = PartitionId>,
    {
        self.stop_tracking_and_dispatch(
            PartitionAction::Release,
            partition_ids,
            options.release_on_shuffle_master,
        )
    }

    /// Stop tracking the given partitions and have their workers keep them as
    /// cluster partitions. The shuffle master is not told to release them.
    pub fn stop_tracking_and_promote_partitions<I>(&mut self, partition_ids: I) -> PartitionDispatch
    where
        I: IntoIterator<Item = PartitionId>,
    {
        self.stop_tracking_and_dispatch(PartitionAction::Promote, partition_ids, false)
    }

    pub fn is_tracking_partitions_for(&self, producer: &WorkerId) -> bool {
        self.view.is_tracking_partitions_for(producer)
    }

    pub fn is_partition_tracked(&self, partition_id: &PartitionId) -> bool {
        self.view.is_partition_tracked(partition_id)
    }

    pub fn all_tracked_partitions(&self) -> Vec<PartitionRecord> {
        self.view.all_tracked_partitions()
    }

    pub fn all_tracked_cluster_partitions(&self) -> Vec<PartitionRecord> {
        self.view.all_tracked_cluster_partitions()
    }

    pub fn all_tracked_non_cluster_partitions(&self) -> Vec<PartitionRecord> {
        self.view.all_tracked_non_cluster_partitions()
    }

    pub fn partitions_for(&self, producer: &WorkerId) -> Vec<PartitionRecord> {
        self.view.partitions_for(producer)
    }

    pub fn summary(&self) -> TrackerSummary {
        self.view.summary()
    }

    pub fn connect_to_resource_manager(&self, gateway: Arc<dyn ResourceManagerGateway>) {
        self.directory.connect(gateway);
    }

    /// Shuffle descriptors of the cluster partitions of `dataset_id`, which
    /// may have been produced by another job.
    pub async fn cluster_partition_shuffle_descriptors(
        &self,
        dataset_id: DatasetId,
    ) -> Result<Vec<ShuffleDescriptor>, TrackerError> {
        self.directory.shuffle_descriptors_for(dataset_id).await
    }

    fn stop_tracking_and_dispatch<I>(
        &mut self,
        action: PartitionAction,
        partition_ids: I,
        notify_shuffle_master: bool,
    ) -> PartitionDispatch
    where
        I: IntoIterator<Item = PartitionId>,
    {
        let ids: HashSet<PartitionId> = partition_ids.into_iter().collect();
        let removed = self.update_registry(|registry| registry.remove_by_ids(&ids));

        let dispatch = Dispatcher {
            job_id: self.job_id,
            rpc_timeout: self.rpc_timeout,
            executor: &self.executor,
            gateways: self.gateways.as_ref(),
            shuffle_master: &self.shuffle_master,
        }
        .dispatch(action, removed, notify_shuffle_master);

        info!(
            job_id = %self.job_id,
            action = %action,
            requested = ids.len(),
            partition_count = dispatch.untracked().len(),
            remote_calls = dispatch.remote_calls(),
            unreachable_workers = dispatch.unreachable_workers().len(),
            external_releases = dispatch.external_releases(),
            "Stopped tracking partitions"
        );
        dispatch
    }

    fn update_registry<R>(&mut self, update: impl FnOnce(&mut PartitionRegistry) -> R) -> R {
        self.view.update(update)
    }
}
