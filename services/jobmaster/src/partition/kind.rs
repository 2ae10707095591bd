use serde::{Deserialize, Serialize};

/// How a partition is written and consumed, which decides whether the
/// tracker has to account for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKind {
    /// Consumed while being produced. Producer and consumer fail together,
    /// so nothing is left behind to release.
    Pipelined,

    /// Fully written before consumption; must be released explicitly.
    Blocking,

    /// Pipelined, but kept until released so a region can fail over.
    PipelinedApproximate,

    /// Blocking partition that outlives its job and can be read by later jobs.
    BlockingPersistent,
}

impl PartitionKind {
    /// Whether partitions of this kind are registered with the tracker.
    pub fn requires_tracking(&self) -> bool {
        match self {
            Self::Pipelined => false,
            Self::Blocking | Self::PipelinedApproximate | Self::BlockingPersistent => true,
        }
    }

    /// Whether partitions of this kind are cluster partitions.
    pub fn is_cluster(&self) -> bool {
        match self {
            Self::BlockingPersistent => true,
            Self::Pipelined | Self::Blocking | Self::PipelinedApproximate => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pipelined => "pipelined",
            Self::Blocking => "blocking",
            Self::PipelinedApproximate => "pipelined_approximate",
            Self::BlockingPersistent => "blocking_persistent",
        }
    }
}

impl std::fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
