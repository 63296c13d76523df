//! Per-node participant state and protocol handler.

pub mod handler;
pub mod store;

pub use handler::{ParticipantHandler, PrepareRequest, PrepareResponse};
pub use store::{Account, ParticipantStore, PendingReservation};
