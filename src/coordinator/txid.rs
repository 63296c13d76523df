//! Transaction id minting.
//!
//! A random 128-bit id, formatted as a canonical lower-case hex string
//! with no separators. Uniqueness is relied on probabilistically, as
//! spec'd: this is not coordinated with any other coordinator.

use uuid::Uuid;

pub fn new_transaction_id() -> String {
    Uuid::new_v4().simple().to_string()
}
