//! Identifier types used across the job master.

use crate::define_id;

define_id!(
    /// A job whose partitions are being tracked.
    JobId,
    "job"
);

define_id!(
    /// A worker process that produces and hosts partitions.
    WorkerId,
    "wkr"
);

define_id!(
    /// One intermediate-result partition.
    PartitionId,
    "rp"
);

define_id!(
    /// An intermediate dataset; a cluster partition belongs to exactly one.
    DatasetId,
    "ds"
);
