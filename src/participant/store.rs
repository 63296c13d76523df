//! Per-node in-memory participant state.
//!
//! Holds committed accounts and pending reservations behind a single
//! `parking_lot::Mutex`: the lock is held for the full duration of
//! whatever operation needs it, so a conflict scan and the insert that
//! follows it are atomic.
//!
//! Invariants (hold between calls, never observed broken mid-call):
//! - I1/I2/I3: no email is shared across two `committed` entries, two
//!   `pending` entries, or one of each.
//! - I4: an account_id appears in at most one of `committed`/`pending`.
//! - I5: `next_account_id` exceeds every account_id ever allocated here.
//! - I6: a reservation that voted commit ends up in `committed` (after
//!   `promote`) or is removed (after `discard`); it is never mutated in
//!   place.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// A committed, client-visible account.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub account_id: String,
    pub name: String,
    pub email: String,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
}

/// A reservation held under a transaction id until Commit or Abort.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReservation {
    pub transaction_id: String,
    pub account_id: String,
    pub name: String,
    pub email: String,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a single, lock-atomic `reserve_if_unique` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ReserveOutcome {
    /// `tx_id` already held a reservation; no new id was consumed.
    AlreadyPrepared,
    /// The email is already attached to a committed account on this node.
    EmailCommitted,
    /// The email is already reserved by a different in-flight transaction.
    EmailPending,
    /// A fresh account id was allocated and reserved under `tx_id`.
    Reserved { account_id: String },
}

#[derive(Default)]
struct StoreState {
    committed: HashMap<String, Account>,
    pending: HashMap<String, PendingReservation>,
    next_account_id: u64,
}

/// Thread-safe container for one participant node's account state.
pub struct ParticipantStore {
    state: Mutex<StoreState>,
}

impl Default for ParticipantStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticipantStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                committed: HashMap::new(),
                pending: HashMap::new(),
                next_account_id: 1,
            }),
        }
    }

    pub fn has_pending(&self, tx_id: &str) -> bool {
        self.state.lock().pending.contains_key(tx_id)
    }

    pub fn email_in_committed(&self, email: &str) -> bool {
        self.state
            .lock()
            .committed
            .values()
            .any(|a| a.email == email)
    }

    pub fn email_in_pending(&self, email: &str) -> bool {
        self.state.lock().pending.values().any(|p| p.email == email)
    }

    /// Check idempotency, both email-conflict sources, and allocate+insert
    /// a reservation, all under one lock acquisition. This is the only
    /// entry point that may insert into `pending`: doing the scan and the
    /// insert under the same `lock()` call is what makes I2/I3 hold even
    /// when two Prepares for the same email race on this node.
    pub fn reserve_if_unique(
        &self,
        tx_id: &str,
        name: &str,
        email: &str,
        balance: f64,
    ) -> ReserveOutcome {
        let mut state = self.state.lock();

        if state.pending.contains_key(tx_id) {
            return ReserveOutcome::AlreadyPrepared;
        }
        if state.committed.values().any(|a| a.email == email) {
            return ReserveOutcome::EmailCommitted;
        }
        if state.pending.values().any(|p| p.email == email) {
            return ReserveOutcome::EmailPending;
        }

        let account_id = state.next_account_id.to_string();
        state.next_account_id += 1;
        state.pending.insert(
            tx_id.to_string(),
            PendingReservation {
                transaction_id: tx_id.to_string(),
                account_id: account_id.clone(),
                name: name.to_string(),
                email: email.to_string(),
                balance,
                created_at: Utc::now(),
            },
        );
        ReserveOutcome::Reserved { account_id }
    }

    /// Move a pending reservation into `committed`. Returns the
    /// account_id if a reservation was found, `None` if the commit is a
    /// duplicate or arrived with no matching prepare.
    pub fn promote(&self, tx_id: &str) -> Option<String> {
        let mut state = self.state.lock();
        let reservation = state.pending.remove(tx_id)?;
        let account_id = reservation.account_id.clone();
        state.committed.insert(
            account_id.clone(),
            Account {
                account_id: reservation.account_id,
                name: reservation.name,
                email: reservation.email,
                balance: reservation.balance,
                created_at: reservation.created_at,
            },
        );
        Some(account_id)
    }

    /// Remove a pending reservation without committing it. Returns
    /// whether a reservation was actually present.
    pub fn discard(&self, tx_id: &str) -> bool {
        self.state.lock().pending.remove(tx_id).is_some()
    }

    /// Snapshot of committed accounts, for tests and the demo binary.
    pub fn committed_accounts(&self) -> Vec<Account> {
        self.state.lock().committed.values().cloned().collect()
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserved_id(outcome: ReserveOutcome) -> String {
        match outcome {
            ReserveOutcome::Reserved { account_id } => account_id,
            other => panic!("expected Reserved, got {other:?}"),
        }
    }

    #[test]
    fn allocated_ids_are_monotonic() {
        let store = ParticipantStore::new();
        let id1 = reserved_id(store.reserve_if_unique("t1", "a", "a@x", 1.0));
        let id2 = reserved_id(store.reserve_if_unique("t2", "b", "b@x", 2.0));
        assert_eq!(id1, "1");
        assert_eq!(id2, "2");
    }

    #[test]
    fn promote_moves_pending_to_committed() {
        let store = ParticipantStore::new();
        let account_id = reserved_id(store.reserve_if_unique("t1", "a", "a@x", 1.0));
        assert!(store.has_pending("t1"));
        let promoted = store.promote("t1").expect("reservation present");
        assert_eq!(promoted, account_id);
        assert!(!store.has_pending("t1"));
        assert!(store.email_in_committed("a@x"));
    }

    #[test]
    fn promote_without_prepare_is_none() {
        let store = ParticipantStore::new();
        assert_eq!(store.promote("never-prepared"), None);
    }

    #[test]
    fn discard_removes_reservation_without_committing() {
        let store = ParticipantStore::new();
        store.reserve_if_unique("t1", "a", "a@x", 1.0);
        assert!(store.discard("t1"));
        assert!(!store.has_pending("t1"));
        assert!(!store.email_in_committed("a@x"));
    }

    #[test]
    fn discard_on_unknown_tx_is_false_but_harmless() {
        let store = ParticipantStore::new();
        assert!(!store.discard("never-prepared"));
    }

    #[test]
    fn account_ids_are_not_recycled_on_abort() {
        let store = ParticipantStore::new();
        store.reserve_if_unique("t1", "a", "a@x", 1.0);
        store.discard("t1");
        let id2 = reserved_id(store.reserve_if_unique("t2", "b", "b@x", 2.0));
        assert_eq!(id2, "2", "account_id 1 must not be reused after abort");
    }

    #[test]
    fn retry_with_same_tx_id_does_not_consume_a_new_account_id() {
        let store = ParticipantStore::new();
        let first = reserved_id(store.reserve_if_unique("t1", "a", "a@x", 1.0));
        let retry = store.reserve_if_unique("t1", "a", "a@x", 1.0);
        assert_eq!(retry, ReserveOutcome::AlreadyPrepared);
        let next = reserved_id(store.reserve_if_unique("t2", "b", "b@x", 2.0));
        assert_eq!(first, "1");
        assert_eq!(next, "2");
    }

    #[test]
    fn second_reservation_for_a_pending_email_is_rejected() {
        let store = ParticipantStore::new();
        store.reserve_if_unique("t1", "a", "a@x", 1.0);
        let outcome = store.reserve_if_unique("t2", "b", "a@x", 2.0);
        assert_eq!(outcome, ReserveOutcome::EmailPending);
    }

    #[test]
    fn second_reservation_for_a_committed_email_is_rejected() {
        let store = ParticipantStore::new();
        store.reserve_if_unique("t1", "a", "a@x", 1.0);
        store.promote("t1");
        let outcome = store.reserve_if_unique("t2", "b", "a@x", 2.0);
        assert_eq!(outcome, ReserveOutcome::EmailCommitted);
    }

    /// Drives N concurrent reservations for the same email from separate
    /// OS threads: `reserve_if_unique`'s single lock acquisition must let
    /// exactly one of them win, never zero and never more than one.
    #[test]
    fn concurrent_reservations_for_the_same_email_yield_exactly_one_winner() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(ParticipantStore::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store.reserve_if_unique(&format!("t{i}"), "racer", "race@x", 1.0)
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|outcome| matches!(outcome, ReserveOutcome::Reserved { .. }))
            .count();

        assert_eq!(winners, 1, "exactly one thread should win the reservation");
        assert_eq!(store.pending_count(), 1);
    }
}
