//! Internal coordinator error type.
//!
//! Participant and coordinator *protocol* outcomes never propagate as
//! `Err` — a negative vote or a failed transport call are just fields in
//! a response struct. This type only covers failures that are genuinely
//! exceptional for the coordinator itself: a voting or decision task
//! panicking before it could even report a vote.

#[derive(thiserror::Error, Debug)]
pub enum CoordinatorError {
    #[error("task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
