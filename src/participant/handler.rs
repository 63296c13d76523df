//! Stateless protocol handler exposing Prepare, Commit, Abort over a
//! [`ParticipantStore`].
//!
//! Each operation is keyed by an opaque `transaction_id`. None of them
//! ever return an error: a negative Prepare vote is a normal outcome, and
//! Commit/Abort are defined to always succeed (possibly as a no-op).

use tracing::{info, warn};

use super::store::{ParticipantStore, ReserveOutcome};

/// Request to reserve a new account under a transaction id.
#[derive(Debug, Clone)]
pub struct PrepareRequest {
    pub transaction_id: String,
    pub name: String,
    pub email: String,
    pub initial_balance: f64,
}

/// Vote returned from a Prepare call.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepareResponse {
    pub vote_commit: bool,
    pub reason: String,
}

/// A participant node's Prepare/Commit/Abort handler.
///
/// Holds no state of its own beyond its `node_id` (for logging) and a
/// handle to the store it mutates; all three operations are safe to call
/// concurrently across distinct transactions, and are each serialized
/// internally by the store's lock for any single transaction id.
pub struct ParticipantHandler {
    node_id: String,
    store: ParticipantStore,
}

impl ParticipantHandler {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            store: ParticipantStore::new(),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn store(&self) -> &ParticipantStore {
        &self.store
    }

    /// Vote on whether a candidate account can be reserved.
    ///
    /// Idempotent: a retry with the same `transaction_id` always returns
    /// `vote_commit: true` without reinspecting the request, and without
    /// consuming a new account_id. The idempotency check, both
    /// email-conflict scans, and the reservation insert all happen inside
    /// a single `reserve_if_unique` call, so two concurrent Prepares for
    /// the same email can never both see an empty scan.
    pub fn prepare(&self, req: PrepareRequest) -> PrepareResponse {
        info!(node_id = %self.node_id, phase = "prepare", tx_id = %req.transaction_id, "prepare received");

        let outcome = self.store.reserve_if_unique(
            &req.transaction_id,
            &req.name,
            &req.email,
            req.initial_balance,
        );

        match outcome {
            ReserveOutcome::AlreadyPrepared => {
                info!(node_id = %self.node_id, phase = "prepare", tx_id = %req.transaction_id, outcome = "commit", "already prepared");
                PrepareResponse {
                    vote_commit: true,
                    reason: "already prepared".to_string(),
                }
            }
            ReserveOutcome::EmailCommitted => {
                info!(node_id = %self.node_id, phase = "prepare", tx_id = %req.transaction_id, outcome = "abort", "email exists (committed)");
                PrepareResponse {
                    vote_commit: false,
                    reason: "email exists (committed)".to_string(),
                }
            }
            ReserveOutcome::EmailPending => {
                info!(node_id = %self.node_id, phase = "prepare", tx_id = %req.transaction_id, outcome = "abort", "email pending in another transaction");
                PrepareResponse {
                    vote_commit: false,
                    reason: "email pending in another transaction".to_string(),
                }
            }
            ReserveOutcome::Reserved { account_id } => {
                info!(node_id = %self.node_id, phase = "prepare", tx_id = %req.transaction_id, outcome = "commit", account_id = %account_id, "prepared");
                PrepareResponse {
                    vote_commit: true,
                    reason: "prepared".to_string(),
                }
            }
        }
    }

    /// Move a reservation into committed state. Never fails: a missing
    /// reservation (already committed, or a duplicate delivery) is a
    /// silent success.
    pub fn commit(&self, transaction_id: &str) {
        match self.store.promote(transaction_id) {
            Some(account_id) => {
                info!(node_id = %self.node_id, phase = "commit", tx_id = %transaction_id, outcome = "committed", account_id = %account_id, "committed");
            }
            None => {
                warn!(node_id = %self.node_id, phase = "commit", tx_id = %transaction_id, outcome = "noop", "commit with no matching reservation");
            }
        }
    }

    /// Discard a reservation. Never fails: a missing reservation is a
    /// silent success.
    pub fn abort(&self, transaction_id: &str) {
        if self.store.discard(transaction_id) {
            info!(node_id = %self.node_id, phase = "abort", tx_id = %transaction_id, outcome = "aborted", "aborted");
        } else {
            warn!(node_id = %self.node_id, phase = "abort", tx_id = %transaction_id, outcome = "noop", "abort with no matching reservation");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(tx: &str, email: &str) -> PrepareRequest {
        PrepareRequest {
            transaction_id: tx.to_string(),
            name: "A".to_string(),
            email: email.to_string(),
            initial_balance: 100.0,
        }
    }

    #[test]
    fn prepare_retry_is_idempotent_and_does_not_consume_new_id() {
        let handler = ParticipantHandler::new("p1");
        let first = handler.prepare(req("t1", "a@x"));
        let second = handler.prepare(req("t1", "a@x"));
        assert!(first.vote_commit);
        assert!(second.vote_commit);
        assert_eq!(second.reason, "already prepared");
        assert_eq!(handler.store().pending_count(), 1);
    }

    #[test]
    fn prepare_rejects_committed_email() {
        let handler = ParticipantHandler::new("p1");
        assert!(handler.prepare(req("t1", "a@x")).vote_commit);
        handler.commit("t1");

        let resp = handler.prepare(req("t2", "a@x"));
        assert!(!resp.vote_commit);
        assert_eq!(resp.reason, "email exists (committed)");
    }

    #[test]
    fn prepare_rejects_pending_email_from_another_tx() {
        let handler = ParticipantHandler::new("p1");
        assert!(handler.prepare(req("t1", "a@x")).vote_commit);

        let resp = handler.prepare(req("t2", "a@x"));
        assert!(!resp.vote_commit);
        assert_eq!(resp.reason, "email pending in another transaction");
    }

    #[test]
    fn commit_without_prepare_is_a_silent_noop() {
        let handler = ParticipantHandler::new("p1");
        handler.commit("never-prepared");
        assert_eq!(handler.store().committed_accounts().len(), 0);
    }

    #[test]
    fn abort_without_prepare_is_a_silent_noop() {
        let handler = ParticipantHandler::new("p1");
        handler.abort("never-prepared");
        assert_eq!(handler.store().pending_count(), 0);
    }

    #[test]
    fn commit_is_idempotent() {
        let handler = ParticipantHandler::new("p1");
        handler.prepare(req("t1", "a@x"));
        handler.commit("t1");
        handler.commit("t1");
        assert_eq!(handler.store().committed_accounts().len(), 1);
    }

    #[test]
    fn abort_is_idempotent() {
        let handler = ParticipantHandler::new("p1");
        handler.prepare(req("t1", "a@x"));
        handler.abort("t1");
        handler.abort("t1");
        assert_eq!(handler.store().pending_count(), 0);
    }

    #[test]
    fn empty_name_is_accepted() {
        let handler = ParticipantHandler::new("p1");
        let resp = handler.prepare(PrepareRequest {
            transaction_id: "t1".to_string(),
            name: String::new(),
            email: "a@x".to_string(),
            initial_balance: 0.0,
        });
        assert!(resp.vote_commit);
    }
}
