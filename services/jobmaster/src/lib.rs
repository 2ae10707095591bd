//! shoal Job Master partition tracking
//!
//! The job master keeps track of the intermediate-result partitions that
//! workers produce while a job runs, and decides how each one is reclaimed
//! once the scheduler no longer needs it.
//!
//! ## Architecture
//!
//! ```text
//! JobMasterPartitionTracker          (owner context, all mutations)
//! ├── PartitionRegistry              (edited in place under an RwLock)
//! │   └── PartitionTrackerView       (read-only handles for other contexts)
//! ├── release / promote dispatch     (one batched RPC per worker, fire-and-forget)
//! └── ClusterPartitionDirectory      (optional resource manager binding)
//! ```
//!
//! ## Modules
//!
//! - `partition`: partition kinds, deployment descriptors, records and the registry
//! - `tracker`: the tracker, its read view, dispatch and the cluster partition directory
//! - `gateway`: traits for the worker, shuffle master and resource manager collaborators
//! - `testing`: in-memory recording collaborators for tests and local development
//! - `config` / `telemetry`: environment configuration and tracing setup

pub mod config;
pub mod error;
pub mod gateway;
pub mod partition;
pub mod telemetry;
pub mod testing;
pub mod tracker;

pub use config::{LogFormat, TrackerConfig};
pub use error::{GatewayError, TrackerError};
pub use gateway::{ResourceManagerGateway, ShuffleMaster, WorkerGateway, WorkerGatewayResolver};
pub use partition::{
    PartitionDeploymentDescriptor, PartitionKind, PartitionRecord, PartitionRegistry,
    ShuffleDescriptor,
};
pub use tracker::{
    ClusterPartitionDirectory, JobMasterPartitionTracker, PartitionAction, PartitionDispatch,
    PartitionTrackerView, ReleaseOptions, TrackerSummary, WorkerSummary,
};
