//! RPC Method Handlers
//!
//! Thin adapters: validate what would break the keyspace, call the core,
//! shape the response.

use crate::error::{to_rpc_error, validation_error};
use crate::types::{
    AllowRequest, AllowResponse, AllowedRequest, AllowedResponse, RankRequest, RankResponse,
    RegisterRequest, RegisterResponse, SchedulerRequest, SchedulerResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use tracing::info;
use waitroom_core::application::{AdmissionQueue, PromotionScheduler};
use waitroom_core::domain::QueueKeyspace;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    admission: Arc<AdmissionQueue>,
    scheduler: Arc<PromotionScheduler>,
}

fn check_queue(queue: &str) -> Result<(), ErrorObjectOwned> {
    if QueueKeyspace::is_valid_queue_name(queue) {
        Ok(())
    } else {
        Err(validation_error(format!(
            "Invalid queue name {:?}: must be non-empty without ':', '*', '?', '[' or ']'",
            queue
        )))
    }
}

fn check_participant(user_id: &str) -> Result<(), ErrorObjectOwned> {
    if user_id.is_empty() {
        return Err(validation_error("user_id must not be empty"));
    }
    Ok(())
}

impl RpcHandler {
    pub fn new(admission: Arc<AdmissionQueue>, scheduler: Arc<PromotionScheduler>) -> Self {
        Self {
            admission,
            scheduler,
        }
    }

    /// queue.register.v1
    pub async fn register(
        &self,
        params: RegisterRequest,
    ) -> Result<RegisterResponse, ErrorObjectOwned> {
        check_queue(&params.queue)?;
        check_participant(&params.user_id)?;

        let rank = self
            .admission
            .register(&params.queue, &params.user_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(RegisterResponse { rank: rank.value() })
    }

    /// queue.allow.v1
    pub async fn allow(&self, params: AllowRequest) -> Result<AllowResponse, ErrorObjectOwned> {
        check_queue(&params.queue)?;

        let allowed = self
            .admission
            .promote(&params.queue, params.count)
            .await
            .map_err(to_rpc_error)?;

        Ok(AllowResponse {
            requested_count: params.count,
            allowed_count: allowed,
        })
    }

    /// queue.allowed.v1
    pub async fn allowed(
        &self,
        params: AllowedRequest,
    ) -> Result<AllowedResponse, ErrorObjectOwned> {
        check_queue(&params.queue)?;
        check_participant(&params.user_id)?;

        let allowed = self
            .admission
            .is_allowed(&params.queue, &params.user_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(AllowedResponse { allowed })
    }

    /// queue.rank.v1
    pub async fn rank(&self, params: RankRequest) -> Result<RankResponse, ErrorObjectOwned> {
        check_queue(&params.queue)?;
        check_participant(&params.user_id)?;

        let rank = self
            .admission
            .rank(&params.queue, &params.user_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(RankResponse { rank: rank.value() })
    }

    /// admin.scheduler.v1
    pub async fn scheduler(
        &self,
        params: SchedulerRequest,
    ) -> Result<SchedulerResponse, ErrorObjectOwned> {
        let switch = self.scheduler.switch();
        if let Some(enabled) = params.enabled {
            switch.set(enabled);
            info!(enabled = enabled, "Promotion scheduler switched");
        }

        let config = self.scheduler.config();
        Ok(SchedulerResponse {
            enabled: switch.is_enabled(),
            batch_size: config.batch_size,
            interval_ms: config.interval.as_millis() as u64,
        })
    }
}
