//! Process configuration for participant and coordinator nodes.
//!
//! Loaded from environment variables with documented defaults, plus an
//! optional TOML file for the coordinator's static participant list.

use std::time::Duration;

/// Configuration for a participant node.
#[derive(Debug, Clone)]
pub struct ParticipantConfig {
    /// Arbitrary string used only for logs (`NODE_ID`).
    pub node_id: String,
    /// TCP port for the RPC listener (`PORT`). Unused by the in-process
    /// transport; kept for parity with a real network-facing deployment.
    pub port: u16,
    /// Bounded worker parallelism for this node's handler pool.
    pub worker_pool_size: usize,
}

impl Default for ParticipantConfig {
    fn default() -> Self {
        Self {
            node_id: "participant-1".to_string(),
            port: 5004,
            worker_pool_size: 10,
        }
    }
}

impl ParticipantConfig {
    /// Read `NODE_ID` and `PORT` from the environment, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let node_id = std::env::var("NODE_ID").unwrap_or(defaults.node_id);
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);
        Self {
            node_id,
            port,
            worker_pool_size: defaults.worker_pool_size,
        }
    }
}

/// Configuration for the coordinator: the static, ordered list of
/// participant endpoints and the per-RPC deadline.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// `host:port` pairs, ordered, duplicates allowed.
    pub participants: Vec<String>,
    /// Per-RPC deadline for Prepare/Commit/Abort calls.
    pub deadline: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            participants: Vec::new(),
            deadline: Duration::from_millis(2000),
        }
    }
}

impl CoordinatorConfig {
    /// Parse a TOML document shaped like:
    ///
    /// ```toml
    /// participants = ["host1:5004", "host2:5004"]
    /// deadline_ms = 2000
    /// ```
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        #[derive(serde::Deserialize)]
        struct Raw {
            #[serde(default)]
            participants: Vec<String>,
            #[serde(default)]
            deadline_ms: Option<u64>,
        }
        let raw: Raw = toml::from_str(text)?;
        let defaults = Self::default();
        Ok(Self {
            participants: raw.participants,
            deadline: raw
                .deadline_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.deadline),
        })
    }
}
