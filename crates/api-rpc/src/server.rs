//! JSON-RPC Server
//!
//! HTTP transport. Binds to localhost unless configured otherwise.

use crate::handler::RpcHandler;
use crate::types::{AllowRequest, AllowedRequest, RankRequest, RegisterRequest, SchedulerRequest};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9528;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: RpcHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the bound address (useful with port 0) and the stop handle.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method("queue.register.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RegisterRequest = params.parse()?;
                    handler.register(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.allow.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: AllowRequest = params.parse()?;
                    handler.allow(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.allowed.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: AllowedRequest = params.parse()?;
                    handler.allowed(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.rank.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RankRequest = params.parse()?;
                    handler.rank(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("admin.scheduler.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: SchedulerRequest = if params.is_object() {
                        params.parse()?
                    } else {
                        SchedulerRequest::default()
                    };
                    handler.scheduler(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        info!(address = %local_addr, "JSON-RPC server listening");

        let handle = server.start(module);
        Ok((local_addr, handle))
    }
}
