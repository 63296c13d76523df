//! Two-phase commit core for distributed account creation.
//!
//! A coordinator drives account creation across replicated participant
//! nodes: it fans Prepare out to every participant, collects votes under
//! a per-call deadline, decides Commit-all or Abort-all, and broadcasts
//! the decision. Each participant enforces email uniqueness across its
//! own committed accounts and in-flight reservations.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod participant;
pub mod rpc;
pub mod telemetry;

pub use config::{CoordinatorConfig, ParticipantConfig};
pub use coordinator::{Coordinator, CreateAccountRequest, CreateAccountResponse};
pub use error::CoordinatorError;
pub use participant::{Account, ParticipantHandler, ParticipantStore, PendingReservation};
