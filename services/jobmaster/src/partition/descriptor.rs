//! Deployment descriptors handed in by the scheduler, and the records the
//! registry keeps for them.

use serde::{Deserialize, Serialize};
use shoal_id::{DatasetId, PartitionId, WorkerId};

use super::PartitionKind;

/// What the shuffle service needs to locate or release a partition.
///
/// Opaque to the tracker apart from the partition id and whether a worker
/// still holds local resources for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuffleDescriptor {
    pub partition_id: PartitionId,

    /// Worker that keeps storage or buffers for this partition. `None` when the
    /// shuffle service has taken full custody of the data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stores_local_resources_on: Option<WorkerId>,

    /// Shuffle-service specific payload, passed through untouched.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ShuffleDescriptor {
    /// Descriptor for a partition whose data lives on `worker`.
    pub fn local(partition_id: PartitionId, worker: WorkerId) -> Self {
        Self {
            partition_id,
            stores_local_resources_on: Some(worker),
            payload: serde_json::Value::Null,
        }
    }

    /// Descriptor for a partition held entirely by the shuffle service.
    pub fn external(partition_id: PartitionId) -> Self {
        Self {
            partition_id,
            stores_local_resources_on: None,
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Partition information produced by the scheduler when a producer is deployed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionDeploymentDescriptor {
    pub dataset_id: DatasetId,
    pub kind: PartitionKind,
    pub shuffle: ShuffleDescriptor,
}

impl PartitionDeploymentDescriptor {
    pub fn new(dataset_id: DatasetId, kind: PartitionKind, shuffle: ShuffleDescriptor) -> Self {
        Self {
            dataset_id,
            kind,
            shuffle,
        }
    }

    pub fn partition_id(&self) -> PartitionId {
        self.shuffle.partition_id
    }

    pub fn occupies_local_resource(&self) -> bool {
        self.shuffle.stores_local_resources_on.is_some()
    }
}

/// One tracked partition.
///
/// Locality and cluster membership are fixed when the record is created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionRecord {
    producer: WorkerId,
    dataset_id: DatasetId,
    kind: PartitionKind,
    occupies_local_resource: bool,
    shuffle: ShuffleDescriptor,
}

impl PartitionRecord {
    pub fn new(producer: WorkerId, descriptor: PartitionDeploymentDescriptor) -> Self {
        let occupies_local_resource = descriptor.occupies_local_resource();
        Self {
            producer,
            dataset_id: descriptor.dataset_id,
            kind: descriptor.kind,
            occupies_local_resource,
            shuffle: descriptor.shuffle,
        }
    }

    pub fn partition_id(&self) -> PartitionId {
        self.shuffle.partition_id
    }

    pub fn producer(&self) -> WorkerId {
        self.producer
    }

    pub fn dataset_id(&self) -> DatasetId {
        self.dataset_id
    }

    pub fn kind(&self) -> PartitionKind {
        self.kind
    }

    pub fn occupies_local_resource(&self) -> bool {
        self.occupies_local_resource
    }

    pub fn is_cluster_partition(&self) -> bool {
        self.kind.is_cluster()
    }

    pub fn shuffle_descriptor(&self) -> &ShuffleDescriptor {
        &self.shuffle
    }

    pub fn into_shuffle_descriptor(self) -> ShuffleDescriptor {
        self.shuffle
    }
}
