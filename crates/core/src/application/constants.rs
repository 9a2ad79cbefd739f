// Scheduler constants (No magic values)
use std::time::Duration;

/// Participants promoted per queue per tick
pub const DEFAULT_BATCH_SIZE: u64 = 300;

/// Delay between process start and the first tick (5s)
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(5);

/// Delay between the end of one tick and the start of the next (3s)
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);

/// Wait keys fetched per discovery round trip
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 100;
