//! Bounds the number of concurrent RPCs a single participant node will
//! process at once, independent of how many are in flight from callers.
//!
//! This is the "bounded worker pool" a participant node presents at its
//! RPC boundary: callers can fan out as many Prepare/Commit/Abort calls as
//! they like, but only `worker_pool_size` of them are ever running
//! against this node's handler at the same time — the rest wait for a
//! permit.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::participant::{PrepareRequest, PrepareResponse};
use crate::rpc::ParticipantClient;

pub struct BoundedParticipantClient<C: ParticipantClient> {
    inner: C,
    permits: Arc<Semaphore>,
}

impl<C: ParticipantClient> BoundedParticipantClient<C> {
    /// `worker_pool_size` of zero would mean no call could ever acquire a
    /// permit; treated as 1 instead.
    pub fn new(inner: C, worker_pool_size: usize) -> Self {
        Self {
            inner,
            permits: Arc::new(Semaphore::new(worker_pool_size.max(1))),
        }
    }
}

#[async_trait]
impl<C: ParticipantClient> ParticipantClient for BoundedParticipantClient<C> {
    fn participant_id(&self) -> &str {
        self.inner.participant_id()
    }

    async fn prepare(&self, req: PrepareRequest) -> anyhow::Result<PrepareResponse> {
        let _permit = self
            .permits
            .acquire()
            .await
            .expect("semaphore is never closed");
        self.inner.prepare(req).await
    }

    async fn commit(&self, transaction_id: &str) -> anyhow::Result<()> {
        let _permit = self
            .permits
            .acquire()
            .await
            .expect("semaphore is never closed");
        self.inner.commit(transaction_id).await
    }

    async fn abort(&self, transaction_id: &str) -> anyhow::Result<()> {
        let _permit = self
            .permits
            .acquire()
            .await
            .expect("semaphore is never closed");
        self.inner.abort(transaction_id).await
    }
}
