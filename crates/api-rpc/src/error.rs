//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use jsonrpsee::types::ErrorObjectOwned;
use serde_json::json;
use waitroom_core::domain::DomainError;
use waitroom_core::error::AppError;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const CONFLICT: i32 = 4002;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const STORE_UNAVAILABLE: i32 = 5001;
}

/// Stable reason code for double registration
pub const ALREADY_REGISTERED_REASON: &str = "UQ-0001";

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    match err {
        AppError::Domain(e @ DomainError::AlreadyRegistered { .. }) => ErrorObjectOwned::owned(
            code::CONFLICT,
            e.to_string(),
            Some(json!({ "code": ALREADY_REGISTERED_REASON })),
        ),
        AppError::Domain(e @ DomainError::Validation(_)) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, e.to_string(), None::<()>)
        }
        AppError::StoreUnavailable(msg) => {
            ErrorObjectOwned::owned(code::STORE_UNAVAILABLE, msg, None::<()>)
        }
        AppError::Config(msg) | AppError::Internal(msg) => {
            ErrorObjectOwned::owned(code::INTERNAL_ERROR, msg, None::<()>)
        }
    }
}

/// Validation failure raised by the RPC layer itself
pub fn validation_error(msg: impl Into<String>) -> ErrorObjectOwned {
    to_rpc_error(DomainError::Validation(msg.into()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_registered_maps_to_conflict() {
        let err = to_rpc_error(
            DomainError::AlreadyRegistered {
                queue: "default".to_string(),
                participant: "7".to_string(),
            }
            .into(),
        );
        assert_eq!(err.code(), code::CONFLICT);
        assert!(err.message().contains("default"));
        let data = err.data().map(|d| d.get().to_string()).unwrap_or_default();
        assert!(data.contains(ALREADY_REGISTERED_REASON));
    }

    #[test]
    fn test_store_failure_maps_to_store_unavailable() {
        let err = to_rpc_error(AppError::StoreUnavailable("timeout".to_string()));
        assert_eq!(err.code(), code::STORE_UNAVAILABLE);
        assert_eq!(err.message(), "timeout");
    }
}
