//! Drives a single account-creation transaction across N participants.

pub mod txid;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::CoordinatorError;
use crate::participant::PrepareRequest;
use crate::rpc::ParticipantClient;

/// Request to create one account, before any transaction id is minted.
#[derive(Debug, Clone)]
pub struct CreateAccountRequest {
    pub name: String,
    pub email: String,
    pub initial_balance: f64,
}

/// Client-facing outcome of a `create_account` call. `success` is the
/// only thing a caller needs to branch on; `message` carries a
/// human-readable summary on abort.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateAccountResponse {
    pub success: bool,
    pub message: String,
    pub name: String,
    pub email: String,
    pub balance: f64,
    pub created_at: Option<DateTime<Utc>>,
}

struct Vote {
    participant_id: String,
    commit: bool,
    reason: String,
}

/// Coordinates 2PC account-creation transactions across a fixed, ordered
/// list of participant endpoints.
///
/// Holds no state across transactions beyond that endpoint list — the
/// decision for any one transaction lives only on the stack of the
/// `create_account` call that made it.
pub struct Coordinator {
    coordinator_id: u64,
    participants: Vec<Arc<dyn ParticipantClient>>,
    deadline: Duration,
}

impl Coordinator {
    pub fn new(participants: Vec<Arc<dyn ParticipantClient>>, deadline: Duration) -> Self {
        Self {
            coordinator_id: 1,
            participants,
            deadline,
        }
    }

    /// Run one CreateAccount transaction to completion: mint a tx id,
    /// collect votes, decide, broadcast the decision, and return a
    /// client-facing summary. Never returns an error: a coordinator-local
    /// failure (a voting task panicking, for instance) is caught and
    /// folded into a `success: false` response with a generic message,
    /// the same as any participant-reported abort.
    pub async fn create_account(&self, req: CreateAccountRequest) -> CreateAccountResponse {
        let fallback = req.clone();
        match self.try_create_account(req).await {
            Ok(resp) => resp,
            Err(err) => {
                warn!(
                    coordinator_id = self.coordinator_id,
                    "coordinator-local failure: {err}"
                );
                CreateAccountResponse {
                    success: false,
                    message: "internal coordinator error, please retry".to_string(),
                    name: fallback.name,
                    email: fallback.email,
                    balance: fallback.initial_balance,
                    created_at: None,
                }
            }
        }
    }

    async fn try_create_account(
        &self,
        req: CreateAccountRequest,
    ) -> Result<CreateAccountResponse, CoordinatorError> {
        let tx_id = txid::new_transaction_id();

        if self.participants.is_empty() {
            // Degenerate case: no participants configured. Treated as an
            // immediate COMMIT so a misconfigured cluster doesn't hang a
            // client forever.
            info!(coordinator_id = self.coordinator_id, phase = "decision", tx_id = %tx_id, outcome = "commit", "zero participants configured, committing immediately");
            return Ok(CreateAccountResponse {
                success: true,
                message: "account created (no participants configured)".to_string(),
                name: req.name,
                email: req.email,
                balance: req.initial_balance,
                created_at: Some(Utc::now()),
            });
        }

        info!(coordinator_id = self.coordinator_id, phase = "voting", tx_id = %tx_id, email = %req.email, "voting phase starts");
        let votes = self.collect_votes(&tx_id, &req).await?;
        let all_commit = votes.iter().all(|v| v.commit);

        if all_commit {
            info!(coordinator_id = self.coordinator_id, phase = "decision", tx_id = %tx_id, outcome = "commit", "decision = COMMIT");
        } else {
            info!(coordinator_id = self.coordinator_id, phase = "decision", tx_id = %tx_id, outcome = "abort", "decision = ABORT");
        }

        self.broadcast_decision(&tx_id, all_commit).await;

        if all_commit {
            Ok(CreateAccountResponse {
                success: true,
                message: "account created via 2PC successfully".to_string(),
                name: req.name,
                email: req.email,
                balance: req.initial_balance,
                created_at: Some(Utc::now()),
            })
        } else {
            let message = votes
                .iter()
                .filter(|v| !v.commit)
                .map(|v| format!("{}: {}", v.participant_id, v.reason))
                .collect::<Vec<_>>()
                .join("; ");
            Ok(CreateAccountResponse {
                success: false,
                message,
                name: req.name,
                email: req.email,
                balance: req.initial_balance,
                created_at: None,
            })
        }
    }

    /// Phase 1: send Prepare to every configured participant in
    /// parallel, each on its own spawned task and under its own deadline.
    /// A transport failure or a timed-out call is recorded as a NO vote
    /// with the transport error folded into the reason string. A task
    /// that panics outright is a coordinator-local failure, not a
    /// participant vote, and aborts the whole transaction with
    /// `CoordinatorError::TaskJoin`.
    async fn collect_votes(
        &self,
        tx_id: &str,
        req: &CreateAccountRequest,
    ) -> Result<Vec<Vote>, CoordinatorError> {
        let deadline = self.deadline;
        let handles: Vec<_> = self
            .participants
            .iter()
            .map(|client| {
                let client = Arc::clone(client);
                let prepare_req = PrepareRequest {
                    transaction_id: tx_id.to_string(),
                    name: req.name.clone(),
                    email: req.email.clone(),
                    initial_balance: req.initial_balance,
                };
                tokio::spawn(async move {
                    let participant_id = client.participant_id().to_string();
                    match tokio::time::timeout(deadline, client.prepare(prepare_req)).await {
                        Ok(Ok(resp)) => Vote {
                            participant_id,
                            commit: resp.vote_commit,
                            reason: resp.reason,
                        },
                        Ok(Err(e)) => Vote {
                            participant_id,
                            commit: false,
                            reason: format!("RPC error: {e}"),
                        },
                        Err(_) => Vote {
                            participant_id,
                            commit: false,
                            reason: "RPC error: deadline exceeded".to_string(),
                        },
                    }
                })
            })
            .collect();

        let mut votes = Vec::with_capacity(handles.len());
        for handle in handles {
            votes.push(handle.await?);
        }
        Ok(votes)
    }

    /// Phase 2: broadcast Commit or Abort to every participant that was
    /// contacted, including ones that voted NO or timed out (sending
    /// Abort to a node that never prepared is a harmless no-op). Failures
    /// here, transport or task panic alike, are logged and otherwise
    /// ignored — the decision has already been made and reported to the
    /// client.
    async fn broadcast_decision(&self, tx_id: &str, commit: bool) {
        let handles: Vec<_> = self
            .participants
            .iter()
            .map(|client| {
                let client = Arc::clone(client);
                let tx_id = tx_id.to_string();
                tokio::spawn(async move {
                    let result = if commit {
                        client.commit(&tx_id).await
                    } else {
                        client.abort(&tx_id).await
                    };
                    (client.participant_id().to_string(), result)
                })
            })
            .collect();

        for handle in handles {
            match handle.await {
                Ok((participant_id, Err(e))) => {
                    warn!(
                        coordinator_id = self.coordinator_id,
                        phase = "decision",
                        tx_id = %tx_id,
                        participant_id = %participant_id,
                        "decision-phase delivery failed: {e}"
                    );
                }
                Err(e) => {
                    warn!(
                        coordinator_id = self.coordinator_id,
                        phase = "decision",
                        tx_id = %tx_id,
                        "decision-phase task panicked: {e}"
                    );
                }
                Ok((_, Ok(()))) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::participant::ParticipantHandler;
    use crate::rpc::local::LocalParticipantClient;

    fn local_participant(node_id: &str) -> Arc<dyn ParticipantClient> {
        Arc::new(LocalParticipantClient::new(Arc::new(ParticipantHandler::new(
            node_id,
        ))))
    }

    #[tokio::test]
    async fn zero_participants_commits_immediately() {
        let coordinator = Coordinator::new(Vec::new(), Duration::from_secs(2));
        let resp = coordinator
            .create_account(CreateAccountRequest {
                name: "A".to_string(),
                email: "a@x".to_string(),
                initial_balance: 100.0,
            })
            .await;
        assert!(resp.success);
    }

    #[tokio::test]
    async fn single_participant_happy_path() {
        let coordinator = Coordinator::new(vec![local_participant("p1")], Duration::from_secs(2));
        let resp = coordinator
            .create_account(CreateAccountRequest {
                name: "A".to_string(),
                email: "a@x".to_string(),
                initial_balance: 100.0,
            })
            .await;
        assert!(resp.success);
        assert_eq!(resp.email, "a@x");
    }

    #[tokio::test]
    async fn committed_email_rejects_new_transaction() {
        let coordinator = Coordinator::new(vec![local_participant("p1")], Duration::from_secs(2));
        let first = coordinator
            .create_account(CreateAccountRequest {
                name: "A".to_string(),
                email: "a@x".to_string(),
                initial_balance: 100.0,
            })
            .await;
        assert!(first.success);

        let second = coordinator
            .create_account(CreateAccountRequest {
                name: "B".to_string(),
                email: "a@x".to_string(),
                initial_balance: 50.0,
            })
            .await;
        assert!(!second.success);
        assert!(second.message.contains("email exists (committed)"));
    }
}
