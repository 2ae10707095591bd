//! # shoal-id
//!
//! Typed identifiers shared by the shoal job master and its collaborators.
//!
//! Every identifier is opaque to the partition tracker: it is only ever
//! compared, hashed and logged. The canonical string form is
//! `{prefix}_{ulid}`, for example:
//!
//! - `job_01HV4Z2WQXKJNM8GPQY6VBKC3D`
//! - `wkr_01HV4Z3MXNKPQR9HSTZ7WCLD4E`
//! - `rp_01HV4Z4NYPLTRS0JTUA8XDME5F`
//!
//! The prefix keeps a worker id from being passed where a partition id is
//! expected, both in code and in logs.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
