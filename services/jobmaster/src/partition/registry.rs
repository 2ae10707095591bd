//! In-memory index of tracked partitions.
//!
//! Records are indexed by partition id and by producing worker. The registry
//! itself is a plain value that the tracker keeps behind a lock; every method
//! here is a total function over local state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use shoal_id::{PartitionId, WorkerId};

use super::PartitionRecord;

#[derive(Debug, Clone, Default)]
pub struct PartitionRegistry {
    by_partition: HashMap<PartitionId, Arc<PartitionRecord>>,
    by_worker: HashMap<WorkerId, HashSet<PartitionId>>,
}

impl PartitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record` if its kind requires tracking.
    ///
    /// Returns false, leaving the registry untouched, for kinds that are never
    /// tracked. A record with an already tracked id replaces the old one,
    /// moving it to the new producer if that changed.
    pub fn register(&mut self, record: PartitionRecord) -> bool {
        if !record.kind().requires_tracking() {
            return false;
        }

        let partition_id = record.partition_id();
        let producer = record.producer();

        if let Some(previous) = self.by_partition.remove(&partition_id) {
            self.unindex(previous.producer(), &partition_id);
        }

        self.by_worker
            .entry(producer)
            .or_default()
            .insert(partition_id);
        self.by_partition.insert(partition_id, Arc::new(record));
        true
    }

    /// True iff at least one record of `producer` occupies local resources.
    pub fn is_tracking(&self, producer: &WorkerId) -> bool {
        self.by_worker.get(producer).is_some_and(|ids| {
            ids.iter()
                .filter_map(|id| self.by_partition.get(id))
                .any(|record| record.occupies_local_resource())
        })
    }

    pub fn is_tracked(&self, partition_id: &PartitionId) -> bool {
        self.by_partition.contains_key(partition_id)
    }

    pub fn get(&self, partition_id: &PartitionId) -> Option<&PartitionRecord> {
        self.by_partition.get(partition_id).map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.by_partition.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_partition.is_empty()
    }

    pub fn all_records(&self) -> Vec<PartitionRecord> {
        self.records_where(|_| true)
    }

    pub fn cluster_records(&self) -> Vec<PartitionRecord> {
        self.records_where(PartitionRecord::is_cluster_partition)
    }

    pub fn non_cluster_records(&self) -> Vec<PartitionRecord> {
        self.records_where(|record| !record.is_cluster_partition())
    }

    pub fn records_for(&self, producer: &WorkerId) -> Vec<PartitionRecord> {
        self.by_worker
            .get(producer)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_partition.get(id))
            .map(|record| PartitionRecord::clone(record))
            .collect()
    }

    /// Workers with at least one tracked record.
    pub fn workers(&self) -> impl Iterator<Item = &WorkerId> {
        self.by_worker.keys()
    }

    /// Removes and returns every record of `producer`.
    pub fn remove_for_worker(&mut self, producer: &WorkerId) -> Vec<PartitionRecord> {
        let Some(ids) = self.by_worker.remove(producer) else {
            return Vec::new();
        };

        ids.iter()
            .filter_map(|id| self.by_partition.remove(id))
            .map(Arc::unwrap_or_clone)
            .collect()
    }

    /// Removes and returns the records matching `ids`. Unknown ids are ignored.
    pub fn remove_by_ids<'a, I>(&mut self, ids: I) -> Vec<PartitionRecord>
    where
        I: IntoIterator<Item = &'a PartitionId>,
    {
        let mut removed = Vec::new();
        for id in ids {
            if let Some(record) = self.by_partition.remove(id) {
                self.unindex(record.producer(), id);
                removed.push(Arc::unwrap_or_clone(record));
            }
        }
        removed
    }

    fn records_where<F>(&self, predicate: F) -> Vec<PartitionRecord>
    where
        F: Fn(&PartitionRecord) -> bool,
    {
        self.by_partition
            .values()
            .filter(|record| predicate(record))
            .map(|record| PartitionRecord::clone(record))
            .collect()
    }

    fn unindex(&mut self, producer: WorkerId, partition_id: &PartitionId) {
        if let Some(ids) = self.by_worker.get_mut(&producer) {
            ids.remove(partition_id);
            if ids.is_empty() {
                self.by_worker.remove(&producer);
            }
        }
    }
}
