//! Reaction toggle engine.
//!
//! Idempotent like/unlike toggling with race-tolerant conflict handling and
//! an aggregate summary per target.

mod error;
mod service;
mod types;

pub use error::ReactionError;
pub use service::{ReactionRepository, ReactionService};
pub use types::{NewReactionRecord, Reaction, ReactionSummary, ReactionType, TargetKind};
