use gasless_execution::DonateIntent;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::endpoint::common::ExecuteResponse;
use crate::endpoint::validation::check_non_empty;
use crate::Error;

/// Amount of stablecoin given by the donor, as a decimal string such as `"5.25"`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DonateRequest {
    pub amount: String,
}

pub async fn donate_endpoint(ctx: &Context, request: DonateRequest) -> Result<ExecuteResponse, Error> {
    let intent = DonateIntent {
        amount: check_non_empty(&request.amount, "amount")?,
    };

    Ok(ctx.execution.donate(intent).await?.into())
}
