//! Interfaces to the collaborators the tracker talks to.
//!
//! - Workers: release or promote the partitions they host
//! - Shuffle master: global record of partition metadata
//! - Resource manager: cluster partitions produced by other jobs
//!
//! Implementations live with the embedding system; `crate::testing` has
//! in-memory recording versions.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use shoal_id::{DatasetId, JobId, PartitionId, WorkerId};

use crate::error::GatewayError;
use crate::partition::ShuffleDescriptor;

/// Remote endpoint of one worker process.
#[async_trait]
pub trait WorkerGateway: Send + Sync {
    /// Free the local resources of `partitions`, produced by `job_id`.
    async fn release_partitions(
        &self,
        job_id: JobId,
        partitions: BTreeSet<PartitionId>,
    ) -> Result<(), GatewayError>;

    /// Turn the job-scoped local resources of `partitions` into cluster
    /// partitions that survive the job.
    async fn promote_partitions(
        &self,
        job_id: JobId,
        partitions: BTreeSet<PartitionId>,
    ) -> Result<(), GatewayError>;
}

/// Looks up the gateway of a worker. `None` means the worker is unknown or
/// no longer reachable.
pub trait WorkerGatewayResolver: Send + Sync {
    fn resolve(&self, worker_id: &WorkerId) -> Option<Arc<dyn WorkerGateway>>;
}

impl<F> WorkerGatewayResolver for F
where
    F: Fn(&WorkerId) -> Option<Arc<dyn WorkerGateway>> + Send + Sync,
{
    fn resolve(&self, worker_id: &WorkerId) -> Option<Arc<dyn WorkerGateway>> {
        self(worker_id)
    }
}

/// The shuffle subsystem's master.
#[async_trait]
pub trait ShuffleMaster: Send + Sync {
    /// Forget the partition globally, whether or not a worker held data for it.
    async fn release_partition_externally(
        &self,
        descriptor: &ShuffleDescriptor,
    ) -> Result<(), GatewayError>;
}

/// The resource manager, which knows the cluster partitions of every job.
#[async_trait]
pub trait ResourceManagerGateway: Send + Sync {
    async fn cluster_partition_shuffle_descriptors(
        &self,
        dataset_id: DatasetId,
    ) -> Result<Vec<ShuffleDescriptor>, GatewayError>;
}
