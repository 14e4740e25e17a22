use alloy::primitives::B256;
use gasless_execution::ExecutionResult;
use serde::{Deserialize, Serialize};

/// Returned once the operation has a successful receipt
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub transaction_hash: B256,
    pub user_operation_hash: B256,
}

impl From<ExecutionResult> for ExecuteResponse {
    fn from(value: ExecutionResult) -> Self {
        Self {
            transaction_hash: value.transaction_hash,
            user_operation_hash: value.user_operation_hash,
        }
    }
}
