//! RPC Request/Response Types
//!
//! Every queue-scoped request falls back to the `default` queue.

use serde::{Deserialize, Deserializer, Serialize};
use waitroom_core::domain::DEFAULT_QUEUE;

fn default_queue() -> String {
    DEFAULT_QUEUE.to_string()
}

/// Participant ids arrive as JSON strings or integers
fn participant_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// queue.register.v1 - Enter the wait set
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default = "default_queue")]
    pub queue: String,
    #[serde(deserialize_with = "participant_id")]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub rank: i64,
}

/// queue.allow.v1 - Promote a batch by hand
#[derive(Debug, Deserialize)]
pub struct AllowRequest {
    #[serde(default = "default_queue")]
    pub queue: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowResponse {
    pub requested_count: u64,
    pub allowed_count: u64,
}

/// queue.allowed.v1 - Proceed check
#[derive(Debug, Deserialize)]
pub struct AllowedRequest {
    #[serde(default = "default_queue")]
    pub queue: String,
    #[serde(deserialize_with = "participant_id")]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowedResponse {
    pub allowed: bool,
}

/// queue.rank.v1 - Current wait position
#[derive(Debug, Deserialize)]
pub struct RankRequest {
    #[serde(default = "default_queue")]
    pub queue: String,
    #[serde(deserialize_with = "participant_id")]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankResponse {
    pub rank: i64,
}

/// admin.scheduler.v1 - Read or flip the promotion scheduler switch
#[derive(Debug, Default, Deserialize)]
pub struct SchedulerRequest {
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerResponse {
    pub enabled: bool,
    pub batch_size: u64,
    pub interval_ms: u64,
}
