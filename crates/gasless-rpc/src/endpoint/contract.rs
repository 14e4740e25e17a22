use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::Error;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ContractInfoResponse {
    pub address: Address,
    pub abi: serde_json::Value,
}

pub async fn get_contract_info_endpoint(ctx: &Context) -> Result<ContractInfoResponse, Error> {
    let info = ctx.execution.get_contract_info()?;

    Ok(ContractInfoResponse {
        address: info.address,
        abi: info.abi,
    })
}
