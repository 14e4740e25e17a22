use gasless_execution::{MarkCompletedIntent, MintIntent, RedeemIntent};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::endpoint::common::ExecuteResponse;
use crate::endpoint::validation::{check_address, check_badge_id, check_non_empty, check_positive};
use crate::Error;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MintRequest {
    /// Recipient of the badge
    pub account: String,
    pub id: i64,
    pub value: i64,
    pub uri: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MarkCompletedRequest {
    pub user: String,
    pub id: i64,
    pub new_uri: String,
}

/// The two shapes redeem requests come in. Only the holder shape is executed, the other one would
/// require a holder key to travel in the request.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum RedeemRequest {
    Holder(HolderRedeemRequest),
    PrivateKey(PrivateKeyRedeemRequest),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HolderRedeemRequest {
    pub user: String,
    pub id: i64,
    pub amount: i64,
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PrivateKeyRedeemRequest {
    pub id: i64,
    pub amount: i64,
    pub user_private_key: String,
}

impl std::fmt::Debug for PrivateKeyRedeemRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKeyRedeemRequest")
            .field("id", &self.id)
            .field("amount", &self.amount)
            .finish_non_exhaustive()
    }
}

impl TryFrom<MintRequest> for MintIntent {
    type Error = Error;

    fn try_from(value: MintRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            recipient: check_address(&value.account, "account")?,
            id: check_badge_id(value.id)?,
            value: check_positive(value.value, "value")?,
            uri: check_non_empty(&value.uri, "uri")?,
        })
    }
}

impl TryFrom<MarkCompletedRequest> for MarkCompletedIntent {
    type Error = Error;

    fn try_from(value: MarkCompletedRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            user: check_address(&value.user, "user")?,
            id: check_badge_id(value.id)?,
            new_uri: check_non_empty(&value.new_uri, "newUri")?,
        })
    }
}

impl TryFrom<RedeemRequest> for RedeemIntent {
    type Error = Error;

    fn try_from(value: RedeemRequest) -> Result<Self, Self::Error> {
        match value {
            RedeemRequest::Holder(request) => Ok(Self {
                holder: check_address(&request.user, "user")?,
                id: check_badge_id(request.id)?,
                amount: check_positive(request.amount, "amount")?,
            }),
            RedeemRequest::PrivateKey(_) => Err(Error::Unsupported(
                "redeem by private key, send the holder address as `user` instead".to_string(),
            )),
        }
    }
}

pub async fn mint_endpoint(ctx: &Context, request: MintRequest) -> Result<ExecuteResponse, Error> {
    let intent = MintIntent::try_from(request)?;

    Ok(ctx.execution.mint(intent).await?.into())
}

pub async fn mark_completed_endpoint(ctx: &Context, request: MarkCompletedRequest) -> Result<ExecuteResponse, Error> {
    let intent = MarkCompletedIntent::try_from(request)?;

    Ok(ctx.execution.mark_completed(intent).await?.into())
}

pub async fn redeem_endpoint(ctx: &Context, request: RedeemRequest) -> Result<ExecuteResponse, Error> {
    let intent = RedeemIntent::try_from(request)?;

    Ok(ctx.execution.redeem(intent).await?.into())
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{b256, Address, U256};
    use alloy::sol_types::SolCall;
    use gasless_evm::contract::{IFraminoBadge, ISimple7702Account};
    use gasless_evm::testing::TestAccount;
    use gasless_execution::testing::{Outcome, SimulatedNetwork};
    use gasless_execution::{ErrorKind, RedeemIntent};

    use crate::endpoint::badge::{mark_completed_endpoint, mint_endpoint, redeem_endpoint, MarkCompletedRequest, MintRequest, RedeemRequest};
    use crate::testing::TestEnvironment;
    use crate::Error;

    const USER: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";

    fn mint(id: i64) -> MintRequest {
        MintRequest {
            account: USER.to_string(),
            id,
            value: 1,
            uri: "ipfs://season-3".to_string(),
        }
    }

    #[test]
    fn both_redeem_shapes_are_recognized() {
        let holder: RedeemRequest = serde_json::from_value(serde_json::json!({ "user": USER, "id": 1, "amount": 10 })).unwrap();
        let private_key: RedeemRequest = serde_json::from_value(serde_json::json!({
            "id": 1,
            "amount": 10,
            "userPrivateKey": "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
        }))
        .unwrap();

        assert!(matches!(holder, RedeemRequest::Holder(_)));
        assert!(matches!(private_key, RedeemRequest::PrivateKey(_)));
        assert!(!format!("{:?}", private_key).contains("ac0974"));
    }

    #[test]
    fn holder_shape_maps_onto_the_canonical_intent() {
        let request: RedeemRequest = serde_json::from_value(serde_json::json!({ "user": USER, "id": 1, "amount": 10 })).unwrap();

        let intent = RedeemIntent::try_from(request).unwrap();

        assert_eq!(intent.holder, USER.parse::<Address>().unwrap());
        assert_eq!(intent.id, U256::from(1));
        assert_eq!(intent.amount, U256::from(10));
    }

    #[tokio::test]
    async fn private_key_shape_is_rejected_before_any_request() {
        let test = TestEnvironment::new();
        let request: RedeemRequest = serde_json::from_value(serde_json::json!({
            "id": 1,
            "amount": 10,
            "userPrivateKey": "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
        }))
        .unwrap();

        // When
        let error = redeem_endpoint(test.context(), request).await.unwrap_err();

        // Then
        assert!(matches!(error, Error::Unsupported(_)));
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
        assert_eq!(test.network().state().await.requests, 0);
    }

    #[tokio::test]
    async fn mint_out_of_range_id_is_rejected() {
        let test = TestEnvironment::new();

        // When
        let error = mint_endpoint(test.context(), mint(8)).await.unwrap_err();

        // Then
        assert!(matches!(error, Error::InvalidParameters(_)));
        assert_eq!(test.network().state().await.requests, 0);
    }

    #[tokio::test]
    async fn mint_sends_the_validated_arguments() {
        let test = TestEnvironment::new();

        // When
        mint_endpoint(test.context(), mint(3)).await.unwrap();

        // Then
        let state = test.network().state().await;
        let execute = ISimple7702Account::executeCall::abi_decode(&state.sent[0].call_data).unwrap();
        let call = IFraminoBadge::mintCall::abi_decode(&execute.data).unwrap();

        assert_eq!(state.sent[0].sender, TestAccount::ADMIN.address);
        assert_eq!(call.account, USER.parse::<Address>().unwrap());
        assert_eq!(call.id, U256::from(3));
    }

    #[tokio::test]
    async fn mark_completed_requires_a_new_uri() {
        let test = TestEnvironment::new();
        let request = MarkCompletedRequest {
            user: USER.to_string(),
            id: 4,
            new_uri: String::new(),
        };

        // When
        let error = mark_completed_endpoint(test.context(), request).await.unwrap_err();

        // Then
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn redeem_returns_the_receipt_transaction_hash() {
        // Given
        let transaction_hash = b256!("dead00000000000000000000000000000000000000000000000000000000beef");
        let test = TestEnvironment::with_network(SimulatedNetwork::default().with_outcome(Outcome::Included(transaction_hash)));
        let request: RedeemRequest = serde_json::from_value(serde_json::json!({ "user": USER, "id": 1, "amount": 10 })).unwrap();

        // When
        let response = redeem_endpoint(test.context(), request).await.unwrap();

        // Then
        assert_eq!(response.transaction_hash, transaction_hash);
    }
}
