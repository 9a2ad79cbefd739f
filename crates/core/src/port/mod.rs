// Port Layer - Interfaces for external dependencies

pub mod ordered_set_store;
pub mod time_provider;

// Re-exports
pub use ordered_set_store::{KeyPage, OrderedSetStore, ScoredMember};
pub use time_provider::TimeProvider;
