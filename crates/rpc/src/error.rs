//! RPC error types and code mapping.

use thiserror::Error;
use veristake_delegation::DelegationError;
use veristake_registry::RegistryError;

/// Errors surfaced to RPC callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// A parameter failed validation or a precondition was not met.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The wallet is not configured for the requested role.
    #[error("wallet not configured: {0}")]
    WalletNotConfigured(String),

    /// Internal failure while serving the request.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RpcError {
    /// The JSON-RPC error code for this failure.
    pub fn code(&self) -> i32 {
        match self {
            RpcError::InvalidParams(_) => -32602,
            RpcError::NotFound(_) => -32001,
            RpcError::WalletNotConfigured(_) => -32002,
            RpcError::Internal(_) => -32603,
        }
    }
}

// Precondition failures from the core map to InvalidParams; missing
// entities map to NotFound.

impl From<RegistryError> for RpcError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::UnknownValidator(id) => RpcError::NotFound(format!("validator {id}")),
            other => RpcError::InvalidParams(other.to_string()),
        }
    }
}

impl From<DelegationError> for RpcError {
    fn from(e: DelegationError) -> Self {
        match e {
            DelegationError::UnknownValidator(id) => {
                RpcError::NotFound(format!("validator {id}"))
            }
            DelegationError::UnknownDelegation => {
                RpcError::NotFound("delegation".to_string())
            }
            other => RpcError::InvalidParams(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veristake_types::KeyId;

    #[test]
    fn test_codes() {
        assert_eq!(RpcError::InvalidParams(String::new()).code(), -32602);
        assert_eq!(RpcError::NotFound(String::new()).code(), -32001);
        assert_eq!(RpcError::Internal(String::new()).code(), -32603);
    }

    #[test]
    fn test_core_error_mapping() {
        let err: RpcError = RegistryError::UnknownValidator(KeyId::ZERO).into();
        assert!(matches!(err, RpcError::NotFound(_)));

        let err: RpcError = RegistryError::FeeOutOfRange(20_000).into();
        assert!(matches!(err, RpcError::InvalidParams(_)));

        let err: RpcError = DelegationError::InvalidSignature.into();
        assert!(matches!(err, RpcError::InvalidParams(_)));
    }
}
