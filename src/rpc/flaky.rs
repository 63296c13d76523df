//! Test-tooling transport that wraps another [`ParticipantClient`] and
//! injects configurable latency or failures, for simulating an
//! unreachable or slow participant during voting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::participant::{PrepareRequest, PrepareResponse};
use crate::rpc::ParticipantClient;

/// Wraps a real client and can be told to simulate an unreachable node
/// (every call fails) or a slow node (every call sleeps before
/// delegating, useful for exercising the coordinator's deadline).
pub struct FlakyParticipantClient<C: ParticipantClient> {
    inner: C,
    down: AtomicBool,
    extra_latency: Duration,
}

impl<C: ParticipantClient> FlakyParticipantClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            down: AtomicBool::new(false),
            extra_latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.extra_latency = latency;
        self
    }

    /// Make every subsequent call fail with a transport error, as if the
    /// node were unreachable.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> anyhow::Result<()> {
        if self.down.load(Ordering::SeqCst) {
            anyhow::bail!(
                "RPC error: participant {} unreachable",
                self.inner.participant_id()
            );
        }
        Ok(())
    }
}

#[async_trait]
impl<C: ParticipantClient> ParticipantClient for FlakyParticipantClient<C> {
    fn participant_id(&self) -> &str {
        self.inner.participant_id()
    }

    async fn prepare(&self, req: PrepareRequest) -> anyhow::Result<PrepareResponse> {
        self.check_reachable()?;
        if !self.extra_latency.is_zero() {
            tokio::time::sleep(self.extra_latency).await;
        }
        self.inner.prepare(req).await
    }

    async fn commit(&self, transaction_id: &str) -> anyhow::Result<()> {
        self.check_reachable()?;
        if !self.extra_latency.is_zero() {
            tokio::time::sleep(self.extra_latency).await;
        }
        self.inner.commit(transaction_id).await
    }

    async fn abort(&self, transaction_id: &str) -> anyhow::Result<()> {
        self.check_reachable()?;
        if !self.extra_latency.is_zero() {
            tokio::time::sleep(self.extra_latency).await;
        }
        self.inner.abort(transaction_id).await
    }
}
