// Domain Layer - Pure admission-control types

pub mod error;
pub mod participant;
pub mod queue;

// Re-exports
pub use error::DomainError;
pub use participant::{ParticipantId, Rank};
pub use queue::{QueueKeyspace, QueueName, DEFAULT_QUEUE};
