// Admission Queue - register, promote, rank, proceed-check
//
// Every operation is a round trip to the store. Nothing about queue state is
// kept in this process, so any number of instances can share one store.

use crate::domain::{DomainError, QueueKeyspace, Rank};
use crate::error::Result;
use crate::port::{OrderedSetStore, TimeProvider};
use std::sync::Arc;
use tracing::{debug, info};

/// Admission control over named queues
pub struct AdmissionQueue {
    store: Arc<dyn OrderedSetStore>,
    keyspace: QueueKeyspace,
    time_provider: Arc<dyn TimeProvider>,
}

impl AdmissionQueue {
    pub fn new(
        store: Arc<dyn OrderedSetStore>,
        keyspace: QueueKeyspace,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            store,
            keyspace,
            time_provider,
        }
    }

    pub fn keyspace(&self) -> &QueueKeyspace {
        &self.keyspace
    }

    /// Register a participant at the tail of the wait set
    ///
    /// Uses the store's add-if-absent primitive, so two concurrent
    /// registrations of the same id cannot both succeed.
    ///
    /// # Errors
    /// - `DomainError::AlreadyRegistered` if the id is still waiting
    /// - `AppError::StoreUnavailable` on store failure
    pub async fn register(&self, queue: &str, participant: &str) -> Result<Rank> {
        let wait_key = self.keyspace.wait(queue);
        let arrived_at = self.time_provider.now_secs();

        let inserted = self
            .store
            .add_if_absent(&wait_key, participant, arrived_at as f64)
            .await?;

        if !inserted {
            debug!(queue = %queue, participant = %participant, "Rejected duplicate registration");
            return Err(DomainError::AlreadyRegistered {
                queue: queue.to_string(),
                participant: participant.to_string(),
            }
            .into());
        }

        // A promotion may already have moved the participant; that reads as ABSENT
        let rank = Rank::from_zero_based(self.store.rank(&wait_key, participant).await?);

        debug!(
            queue = %queue,
            participant = %participant,
            rank = %rank,
            "Participant registered"
        );
        Ok(rank)
    }

    /// Move up to `count` earliest arrivals into the proceed set
    ///
    /// Returns how many were promoted: `min(count, waiting)`. An empty or
    /// short queue is not an error.
    pub async fn promote(&self, queue: &str, count: u64) -> Result<u64> {
        if count == 0 {
            return Ok(0);
        }

        let admitted_at = self.time_provider.now_secs();
        let moved = self
            .store
            .move_minimum(
                &self.keyspace.wait(queue),
                &self.keyspace.proceed(queue),
                count,
                admitted_at as f64,
            )
            .await?;

        let promoted = moved.len() as u64;
        if promoted > 0 {
            info!(queue = %queue, requested = count, promoted = promoted, "Promoted participants");
        }
        Ok(promoted)
    }

    /// Whether the participant has been promoted into the proceed set
    pub async fn is_allowed(&self, queue: &str, participant: &str) -> Result<bool> {
        let rank = self
            .store
            .rank(&self.keyspace.proceed(queue), participant)
            .await?;
        Ok(rank.is_some())
    }

    /// Current 1-based rank in the wait set, `Rank::ABSENT` if not waiting
    pub async fn rank(&self, queue: &str, participant: &str) -> Result<Rank> {
        let rank = self
            .store
            .rank(&self.keyspace.wait(queue), participant)
            .await?;
        Ok(Rank::from_zero_based(rank))
    }
}
