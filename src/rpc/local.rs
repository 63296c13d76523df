//! In-process `ParticipantClient` that calls a [`ParticipantHandler`]
//! directly, skipping any real network hop. Used by the demo binary (all
//! participants in one process) and by integration tests.

use async_trait::async_trait;

use crate::participant::{ParticipantHandler, PrepareRequest, PrepareResponse};
use crate::rpc::ParticipantClient;

pub struct LocalParticipantClient {
    handler: std::sync::Arc<ParticipantHandler>,
}

impl LocalParticipantClient {
    pub fn new(handler: std::sync::Arc<ParticipantHandler>) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl ParticipantClient for LocalParticipantClient {
    fn participant_id(&self) -> &str {
        self.handler.node_id()
    }

    async fn prepare(&self, req: PrepareRequest) -> anyhow::Result<PrepareResponse> {
        Ok(self.handler.prepare(req))
    }

    async fn commit(&self, transaction_id: &str) -> anyhow::Result<()> {
        self.handler.commit(transaction_id);
        Ok(())
    }

    async fn abort(&self, transaction_id: &str) -> anyhow::Result<()> {
        self.handler.abort(transaction_id);
        Ok(())
    }
}
