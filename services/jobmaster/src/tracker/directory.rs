//! Lookup of cluster partitions produced by other jobs.
//!
//! Those partitions are not in this job's registry; the resource manager
//! knows where they are, so lookups are forwarded to it once bound.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use shoal_id::DatasetId;
use tracing::{debug, info};

use crate::error::TrackerError;
use crate::gateway::ResourceManagerGateway;
use crate::partition::ShuffleDescriptor;

struct ResourceManagerBinding {
    gateway: Arc<dyn ResourceManagerGateway>,
}

/// Shared handle to the resource manager binding.
///
/// Clones see the same binding. Publishing a new one is atomic and lookups
/// never block on it.
#[derive(Clone)]
pub struct ClusterPartitionDirectory {
    binding: Arc<ArcSwapOption<ResourceManagerBinding>>,
}

impl ClusterPartitionDirectory {
    pub fn new() -> Self {
        Self {
            binding: Arc::new(ArcSwapOption::empty()),
        }
    }

    /// Bind the resource manager, replacing any previous binding.
    pub fn connect(&self, gateway: Arc<dyn ResourceManagerGateway>) {
        let replaced = self
            .binding
            .swap(Some(Arc::new(ResourceManagerBinding { gateway })))
            .is_some();
        info!(replaced, "Connected to resource manager");
    }

    pub fn is_connected(&self) -> bool {
        self.binding.load().is_some()
    }

    /// Shuffle descriptors of the cluster partitions of `dataset_id`.
    ///
    /// Fails with [`TrackerError::NotConnected`] until [`connect`](Self::connect)
    /// has been called.
    pub async fn shuffle_descriptors_for(
        &self,
        dataset_id: DatasetId,
    ) -> Result<Vec<ShuffleDescriptor>, TrackerError> {
        let binding = self.binding.load_full().ok_or(TrackerError::NotConnected)?;

        let descriptors = binding
            .gateway
            .cluster_partition_shuffle_descriptors(dataset_id)
            .await
            .map_err(TrackerError::ResourceManager)?;

        debug!(
            dataset_id = %dataset_id,
            descriptor_count = descriptors.len(),
            "Resolved cluster partition descriptors"
        );
        Ok(descriptors)
    }
}

impl Default for ClusterPartitionDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClusterPartitionDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterPartitionDirectory")
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::testing::RecordingResourceManager;
    use shoal_id::PartitionId;

    #[tokio::test]
    async fn test_lookup_before_connect_is_not_connected() {
        let directory = ClusterPartitionDirectory::new();

        let err = directory
            .shuffle_descriptors_for(DatasetId::new())
            .await
            .unwrap_err();

        assert!(err.is_not_connected());
        assert!(!directory.is_connected());
    }

    #[tokio::test]
    async fn test_lookup_forwards_to_resource_manager() {
        let dataset_id = DatasetId::new();
        let descriptor = ShuffleDescriptor::external(PartitionId::new());
        let resource_manager = Arc::new(RecordingResourceManager::new());
        resource_manager.set_descriptors(dataset_id, vec![descriptor.clone()]);

        let directory = ClusterPartitionDirectory::new();
        directory.connect(resource_manager.clone());

        let descriptors = directory.shuffle_descriptors_for(dataset_id).await.unwrap();

        assert_eq!(descriptors, vec![descriptor]);
        assert_eq!(resource_manager.requested_datasets(), vec![dataset_id]);
    }

    #[tokio::test]
    async fn test_reconnect_replaces_binding_for_all_clones() {
        let dataset_id = DatasetId::new();
        let first = Arc::new(RecordingResourceManager::new());
        let second = Arc::new(RecordingResourceManager::new());

        let directory = ClusterPartitionDirectory::new();
        let shared = directory.clone();
        directory.connect(first.clone());
        directory.connect(second.clone());

        shared.shuffle_descriptors_for(dataset_id).await.unwrap();

        assert!(first.requested_datasets().is_empty());
        assert_eq!(second.requested_datasets(), vec![dataset_id]);
    }

    #[tokio::test]
    async fn test_resource_manager_failure_is_reported() {
        let resource_manager = Arc::new(RecordingResourceManager::new());
        resource_manager.fail_with(GatewayError::Unreachable("rm-0".to_string()));

        let directory = ClusterPartitionDirectory::new();
        directory.connect(resource_manager);

        let err = directory
            .shuffle_descriptors_for(DatasetId::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TrackerError::ResourceManager(GatewayError::Unreachable(_))
        ));
    }
}
