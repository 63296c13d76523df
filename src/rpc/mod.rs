//! Transport boundary between the coordinator and a participant node.
//!
//! Wire framing and service discovery are out of scope for this crate:
//! this trait is the abstract message-passing boundary that would sit on
//! top of a real RPC framework (`tonic`/`prost` would be the natural
//! choice), but no wire implementation is built here.

use async_trait::async_trait;

use crate::participant::{PrepareRequest, PrepareResponse};

pub mod flaky;
pub mod local;
pub mod pool;

/// Everything the coordinator needs to drive one participant through a
/// transaction's Prepare/Commit/Abort calls.
#[async_trait]
pub trait ParticipantClient: Send + Sync {
    /// A label for this endpoint, used only in log lines and abort-reason
    /// strings (e.g. `participant-1`).
    fn participant_id(&self) -> &str;

    async fn prepare(&self, req: PrepareRequest) -> anyhow::Result<PrepareResponse>;
    async fn commit(&self, transaction_id: &str) -> anyhow::Result<()>;
    async fn abort(&self, transaction_id: &str) -> anyhow::Result<()>;
}
