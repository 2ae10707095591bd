//! Read-only access to the tracker's registry from any context.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use serde::Serialize;
use shoal_id::{JobId, PartitionId, WorkerId};

use crate::partition::{PartitionRecord, PartitionRegistry};

/// Cloneable read handle on the partition registry.
///
/// The owner mutates the registry in place under the write lock, so a query
/// never observes a release or registration half applied. Use
/// [`snapshot`](Self::snapshot) to answer several questions from the same
/// state.
#[derive(Debug, Clone)]
pub struct PartitionTrackerView {
    job_id: JobId,
    registry: Arc<RwLock<PartitionRegistry>>,
}

impl PartitionTrackerView {
    pub(crate) fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            registry: Arc::new(RwLock::new(PartitionRegistry::new())),
        }
    }

    /// Apply one mutation while readers are held off.
    pub(crate) fn update<R>(&self, update: impl FnOnce(&mut PartitionRegistry) -> R) -> R {
        let mut registry = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        update(&mut registry)
    }

    fn read(&self) -> RwLockReadGuard<'_, PartitionRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// A detached copy of the current registry. Costs a copy of the indexes;
    /// prefer the single queries below when one answer is enough.
    pub fn snapshot(&self) -> Arc<PartitionRegistry> {
        Arc::new(self.read().clone())
    }

    pub fn is_tracking_partitions_for(&self, producer: &WorkerId) -> bool {
        self.read().is_tracking(producer)
    }

    pub fn is_partition_tracked(&self, partition_id: &PartitionId) -> bool {
        self.read().is_tracked(partition_id)
    }

    pub fn all_tracked_partitions(&self) -> Vec<PartitionRecord> {
        self.read().all_records()
    }

    pub fn all_tracked_cluster_partitions(&self) -> Vec<PartitionRecord> {
        self.read().cluster_records()
    }

    pub fn all_tracked_non_cluster_partitions(&self) -> Vec<PartitionRecord> {
        self.read().non_cluster_records()
    }

    pub fn partitions_for(&self, producer: &WorkerId) -> Vec<PartitionRecord> {
        self.read().records_for(producer)
    }

    pub fn summary(&self) -> TrackerSummary {
        TrackerSummary::from_registry(self.job_id, &self.read())
    }
}

/// Counts for a monitoring surface, computed from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerSummary {
    pub job_id: JobId,
    pub tracked: usize,
    pub cluster: usize,
    pub non_cluster: usize,
    pub occupying_local_resources: usize,
    pub workers: BTreeMap<WorkerId, WorkerSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WorkerSummary {
    pub partitions: usize,
    pub occupying_local_resources: usize,
}

impl TrackerSummary {
    fn from_registry(job_id: JobId, registry: &PartitionRegistry) -> Self {
        let mut summary = Self {
            job_id,
            tracked: 0,
            cluster: 0,
            non_cluster: 0,
            occupying_local_resources: 0,
            workers: BTreeMap::new(),
        };

        for record in registry.all_records() {
            summary.tracked += 1;
            if record.is_cluster_partition() {
                summary.cluster += 1;
            } else {
                summary.non_cluster += 1;
            }

            let worker = summary.workers.entry(record.producer()).or_default();
            worker.partitions += 1;
            if record.occupies_local_resource() {
                worker.occupying_local_resources += 1;
                summary.occupying_local_resources += 1;
            }
        }

        summary
    }
}
