//! JSON-RPC end to end: real server, real HTTP client, SQLite store

mod common;

use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::core::ClientError;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use jsonrpsee::server::ServerHandle;
use serde_json::{json, Value};
use std::sync::Arc;
use waitroom_api_rpc::error::{code, ALREADY_REGISTERED_REASON};
use waitroom_api_rpc::{RpcHandler, RpcServer, RpcServerConfig};
use waitroom_core::application::{PromotionScheduler, SchedulerConfig};
use waitroom_core::port::time_provider::SystemTimeProvider;

async fn start_server() -> (HttpClient, ServerHandle) {
    let store = common::memory_store().await;
    let admission = common::admission(store.clone(), Arc::new(SystemTimeProvider));
    let scheduler = Arc::new(PromotionScheduler::new(
        admission.clone(),
        store,
        SchedulerConfig::default(),
    ));

    let config = RpcServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    let (addr, handle) = RpcServer::new(config, RpcHandler::new(admission, scheduler))
        .start()
        .await
        .unwrap();

    let client = HttpClientBuilder::default()
        .build(format!("http://{}", addr))
        .unwrap();
    (client, handle)
}

fn params(value: Value) -> ObjectParams {
    let mut params = ObjectParams::new();
    if let Value::Object(map) = value {
        for (key, value) in map {
            params.insert(&key, value).unwrap();
        }
    }
    params
}

async fn call(client: &HttpClient, method: &str, value: Value) -> Result<Value, ClientError> {
    client.request(method, params(value)).await
}

#[tokio::test]
async fn test_register_allow_and_query_over_http() {
    let (client, handle) = start_server().await;

    for (i, id) in ["1", "2", "3"].iter().enumerate() {
        let res = call(&client, "queue.register.v1", json!({ "queue": "default", "user_id": id }))
            .await
            .unwrap();
        assert_eq!(res["rank"], json!(i + 1));
    }

    let res = call(&client, "queue.allow.v1", json!({ "queue": "default", "count": 5 }))
        .await
        .unwrap();
    assert_eq!(res, json!({ "requested_count": 5, "allowed_count": 3 }));

    let res = call(&client, "queue.allowed.v1", json!({ "queue": "default", "user_id": "1" }))
        .await
        .unwrap();
    assert_eq!(res["allowed"], json!(true));

    let res = call(&client, "queue.rank.v1", json!({ "queue": "default", "user_id": "1" }))
        .await
        .unwrap();
    assert_eq!(res["rank"], json!(-1));

    handle.stop().unwrap();
}

/// Queue defaults to "default" and numeric ids are accepted
#[tokio::test]
async fn test_default_queue_and_numeric_id() {
    let (client, handle) = start_server().await;

    let res = call(&client, "queue.register.v1", json!({ "user_id": 42 }))
        .await
        .unwrap();
    assert_eq!(res["rank"], json!(1));

    let res = call(&client, "queue.rank.v1", json!({ "queue": "default", "user_id": "42" }))
        .await
        .unwrap();
    assert_eq!(res["rank"], json!(1));

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_duplicate_registration_error_shape() {
    let (client, handle) = start_server().await;

    call(&client, "queue.register.v1", json!({ "user_id": "7" }))
        .await
        .unwrap();
    let err = call(&client, "queue.register.v1", json!({ "user_id": "7" }))
        .await
        .unwrap_err();

    let err = match err {
        ClientError::Call(err) => err,
        other => panic!("expected a call error, got {:?}", other),
    };
    assert_eq!(err.code(), code::CONFLICT);
    let data: Value = serde_json::from_str(err.data().unwrap().get()).unwrap();
    assert_eq!(data, json!({ "code": ALREADY_REGISTERED_REASON }));

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_invalid_queue_name_is_rejected() {
    let (client, handle) = start_server().await;

    let err = call(&client, "queue.register.v1", json!({ "queue": "a*b", "user_id": "1" }))
        .await
        .unwrap_err();
    let err = match err {
        ClientError::Call(err) => err,
        other => panic!("expected a call error, got {:?}", other),
    };
    assert_eq!(err.code(), code::VALIDATION_ERROR);

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_scheduler_admin_switch() {
    let (client, handle) = start_server().await;

    let res: Value = client
        .request("admin.scheduler.v1", rpc_params![])
        .await
        .unwrap();
    assert_eq!(res["enabled"], json!(false));
    assert_eq!(res["batch_size"], json!(300));

    let res = call(&client, "admin.scheduler.v1", json!({ "enabled": true }))
        .await
        .unwrap();
    assert_eq!(res["enabled"], json!(true));

    handle.stop().unwrap();
}
