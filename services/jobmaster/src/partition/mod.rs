//! Partition model: kinds, deployment descriptors, tracked records and the
//! registry that indexes them.

mod descriptor;
mod kind;
mod registry;

pub use descriptor::{PartitionDeploymentDescriptor, PartitionRecord, ShuffleDescriptor};
pub use kind::PartitionKind;
pub use registry::PartitionRegistry;
