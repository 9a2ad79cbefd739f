// Time Provider Port (for testability)

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Get current time in milliseconds since epoch
    fn now_millis(&self) -> i64;

    /// Get current time in whole seconds since epoch (arrival/admission score resolution)
    fn now_secs(&self) -> i64 {
        self.now_millis().div_euclid(1000)
    }
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

pub mod mocks {
    use super::TimeProvider;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Manually driven clock
    ///
    /// `step_millis` is added after every read, so consecutive registrations
    /// get distinct scores when it is at least 1000.
    pub struct ManualTimeProvider {
        now_millis: AtomicI64,
        step_millis: i64,
    }

    impl ManualTimeProvider {
        pub fn new(start_millis: i64) -> Self {
            Self::with_step(start_millis, 0)
        }

        pub fn with_step(start_millis: i64, step_millis: i64) -> Self {
            Self {
                now_millis: AtomicI64::new(start_millis),
                step_millis,
            }
        }

        pub fn advance_millis(&self, delta: i64) {
            self.now_millis.fetch_add(delta, Ordering::SeqCst);
        }
    }

    impl TimeProvider for ManualTimeProvider {
        fn now_millis(&self) -> i64 {
            self.now_millis.fetch_add(self.step_millis, Ordering::SeqCst)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::ManualTimeProvider;
    use super::*;

    #[test]
    fn test_now_secs_truncates() {
        let clock = ManualTimeProvider::new(1_700_000_000_999);
        assert_eq!(clock.now_secs(), 1_700_000_000);
    }

    #[test]
    fn test_stepping_clock() {
        let clock = ManualTimeProvider::with_step(0, 1000);
        assert_eq!(clock.now_secs(), 0);
        assert_eq!(clock.now_secs(), 1);
        clock.advance_millis(10_000);
        assert_eq!(clock.now_secs(), 12);
    }
}
