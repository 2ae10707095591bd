//! Configuration for the job master partition tracker.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use shoal_id::JobId;

/// Default bound on a single release or promote call.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Partition tracker configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Job whose partitions are tracked; sent along with every worker call.
    pub job_id: JobId,

    /// Upper bound on each release/promote call before it is abandoned.
    pub rpc_timeout: Duration,

    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is unset.
    pub log_level: String,

    pub log_format: LogFormat,
}

impl TrackerConfig {
    /// Defaults for `job_id`.
    pub fn for_job(job_id: JobId) -> Self {
        Self {
            job_id,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
        }
    }

    pub fn with_rpc_timeout(mut self, rpc_timeout: Duration) -> Self {
        self.rpc_timeout = rpc_timeout;
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source using the `SHOAL_*` names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Job ID can be provided or auto-generated
        let job_id = match lookup("SHOAL_JOB_ID") {
            Some(raw) => raw
                .parse::<JobId>()
                .with_context(|| format!("invalid SHOAL_JOB_ID '{raw}'"))?,
            None => JobId::new(),
        };

        let rpc_timeout = match lookup("SHOAL_RPC_TIMEOUT_MS") {
            Some(raw) => {
                let millis = raw
                    .parse::<u64>()
                    .with_context(|| format!("invalid SHOAL_RPC_TIMEOUT_MS '{raw}'"))?;
                if millis == 0 {
                    bail!("SHOAL_RPC_TIMEOUT_MS must be greater than zero");
                }
                Duration::from_millis(millis)
            }
            None => DEFAULT_RPC_TIMEOUT,
        };

        let log_level = lookup("SHOAL_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_format = match lookup("SHOAL_LOG_FORMAT").as_deref() {
            None | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => bail!("invalid SHOAL_LOG_FORMAT '{other}', expected json or pretty"),
        };

        Ok(Self {
            job_id,
            rpc_timeout,
            log_level,
            log_format,
        })
    }
}
