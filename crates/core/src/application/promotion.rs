//! Promotion Scheduler - periodic sweep that admits a batch from every queue
//!
//! One tick:
//! 1. Return early if the scheduler is switched off (the switch is read every tick)
//! 2. Page through every key matching the wait-key pattern
//! 3. Promote `batch_size` participants from each discovered queue
//!
//! Queues are promoted independently: a failure on one is logged and the
//! tick moves on. Ticks never overlap inside one process, and the next tick
//! starts `interval` after the previous one finished.

use crate::application::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_INITIAL_DELAY, DEFAULT_INTERVAL, DEFAULT_SCAN_PAGE_SIZE,
};
use crate::application::{AdmissionQueue, ShutdownToken};
use crate::port::OrderedSetStore;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub initial_delay: Duration,
    pub interval: Duration,
    pub batch_size: u64,
    pub scan_page_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_delay: DEFAULT_INITIAL_DELAY,
            interval: DEFAULT_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        }
    }
}

/// Runtime on/off toggle shared between the scheduler and its controllers
#[derive(Debug, Clone)]
pub struct SchedulerSwitch(Arc<AtomicBool>);

impl SchedulerSwitch {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuePromotion {
    pub queue: String,
    pub promoted: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueFailure {
    pub queue: String,
    pub error: String,
}

/// What one completed tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub promotions: Vec<QueuePromotion>,
    pub failures: Vec<QueueFailure>,
    /// Set when key discovery itself failed part way through
    pub discovery_error: Option<String>,
}

impl TickReport {
    pub fn queues_visited(&self) -> usize {
        self.promotions.len() + self.failures.len()
    }

    pub fn total_promoted(&self) -> u64 {
        self.promotions.iter().map(|p| p.promoted).sum()
    }

    pub fn promoted_in(&self, queue: &str) -> Option<u64> {
        self.promotions
            .iter()
            .find(|p| p.queue == queue)
            .map(|p| p.promoted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Disabled,
    /// Another tick was still running in this process
    AlreadyRunning,
    Completed(TickReport),
}

/// Periodic promotion across all active queues
pub struct PromotionScheduler {
    admission: Arc<AdmissionQueue>,
    store: Arc<dyn OrderedSetStore>,
    config: SchedulerConfig,
    switch: SchedulerSwitch,
    tick_guard: Mutex<()>,
}

impl PromotionScheduler {
    /// Create a new promotion scheduler
    ///
    /// # Arguments
    /// * `admission` - Admission queue used for every promotion
    /// * `store` - Same store the admission queue talks to (used for key discovery)
    /// * `config` - Timing and batch configuration; `config.enabled` seeds the switch
    pub fn new(
        admission: Arc<AdmissionQueue>,
        store: Arc<dyn OrderedSetStore>,
        config: SchedulerConfig,
    ) -> Self {
        let switch = SchedulerSwitch::new(config.enabled);
        Self {
            admission,
            store,
            config,
            switch,
            tick_guard: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Handle for flipping the scheduler on or off at runtime
    pub fn switch(&self) -> SchedulerSwitch {
        self.switch.clone()
    }

    /// Run the scheduler loop until shutdown (background task)
    ///
    /// A tick that is in progress when shutdown arrives runs to completion.
    pub async fn run(&self, mut shutdown: ShutdownToken) {
        info!(
            enabled = self.switch.is_enabled(),
            initial_delay_ms = self.config.initial_delay.as_millis() as u64,
            interval_ms = self.config.interval.as_millis() as u64,
            batch_size = self.config.batch_size,
            "Promotion scheduler started"
        );

        tokio::select! {
            _ = sleep(self.config.initial_delay) => {},
            _ = shutdown.wait() => {
                info!("Promotion scheduler stopped before first tick");
                return;
            }
        }

        loop {
            if shutdown.is_shutdown() {
                break;
            }

            if let TickOutcome::Completed(report) = self.run_tick().await {
                if report.queues_visited() > 0 || report.discovery_error.is_some() {
                    info!(
                        queues = report.queues_visited(),
                        promoted = report.total_promoted(),
                        failed = report.failures.len(),
                        "Promotion tick completed"
                    );
                }
            }

            tokio::select! {
                _ = sleep(self.config.interval) => {},
                _ = shutdown.wait() => break,
            }
        }

        info!("Promotion scheduler stopped");
    }

    /// Run one tick now
    ///
    /// Returns `AlreadyRunning` instead of waiting if a tick is in flight.
    pub async fn run_tick(&self) -> TickOutcome {
        if !self.switch.is_enabled() {
            debug!("Promotion scheduler disabled, skipping tick");
            return TickOutcome::Disabled;
        }

        let Ok(_guard) = self.tick_guard.try_lock() else {
            debug!("Previous promotion tick still running, skipping");
            return TickOutcome::AlreadyRunning;
        };

        let keyspace = self.admission.keyspace();
        let pattern = keyspace.wait_pattern();
        let batch_size = self.config.batch_size;

        let mut report = TickReport::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = match self
                .store
                .scan_keys(&pattern, cursor.as_deref(), self.config.scan_page_size)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    error!(error = %e, pattern = %pattern, "Queue discovery failed");
                    report.discovery_error = Some(e.to_string());
                    break;
                }
            };

            let queues: Vec<String> = page
                .keys
                .iter()
                .filter_map(|key| match keyspace.queue_from_wait_key(key) {
                    Some(queue) => Some(queue.to_string()),
                    None => {
                        warn!(key = %key, "Skipping key outside the queue keyspace");
                        None
                    }
                })
                .filter(|queue| seen.insert(queue.clone()))
                .collect();

            let results = join_all(queues.into_iter().map(|queue| async move {
                let result = self.admission.promote(&queue, batch_size).await;
                (queue, result)
            }))
            .await;

            for (queue, result) in results {
                match result {
                    Ok(promoted) => {
                        info!(
                            queue = %queue,
                            requested = batch_size,
                            promoted,
                            "Queue batch promoted"
                        );
                        report.promotions.push(QueuePromotion { queue, promoted });
                    }
                    Err(e) => {
                        error!(queue = %queue, error = %e, "Promotion failed, skipping queue");
                        report.failures.push(QueueFailure {
                            queue,
                            error: e.to_string(),
                        });
                    }
                }
            }

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        TickOutcome::Completed(report)
    }
}
