// Application Layer - Use Cases and Background Loops

pub mod admission;
pub mod constants;
pub mod promotion;
mod shutdown;

// Re-exports
pub use admission::AdmissionQueue;
pub use promotion::{
    PromotionScheduler, QueueFailure, QueuePromotion, SchedulerConfig, SchedulerSwitch,
    TickOutcome, TickReport,
};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
