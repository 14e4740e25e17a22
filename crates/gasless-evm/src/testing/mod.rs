use std::fmt::Debug;

use alloy::primitives::{address, b256, Address, B256, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use wiremock::{Request, Respond, ResponseTemplate};

use crate::account::EvmAccountConfiguration;
use crate::signature::permit::TokenDomain;
use crate::{ChainID, Error};

#[async_trait]
pub trait MockChainClient: 'static + Send + Sync + Debug {
    fn new() -> Self
    where
        Self: Sized;

    fn chain_id(&self) -> ChainID {
        ChainID::ArbitrumSepolia
    }

    async fn fetch_chain_id(&self) -> Result<u64, Error> {
        Ok(self.chain_id().as_u64())
    }

    async fn fetch_token_balance(&self, _token: Address, _owner: Address) -> Result<U256, Error> {
        unimplemented!()
    }

    async fn fetch_transaction_count(&self, _address: Address) -> Result<u64, Error> {
        unimplemented!()
    }

    async fn fetch_permit_nonce(&self, _token: Address, _owner: Address) -> Result<U256, Error> {
        unimplemented!()
    }

    async fn fetch_token_domain(&self, _token: Address) -> Result<TokenDomain, Error> {
        unimplemented!()
    }

    async fn fetch_account_nonce(&self, _entry_point: Address, _sender: Address) -> Result<U256, Error> {
        unimplemented!()
    }
}

/// Well known development keys
#[derive(Debug, Clone, Copy)]
pub struct TestAccount {
    pub address: Address,
    pub private_key: B256,
}

impl TestAccount {
    pub const DONOR: TestAccount = TestAccount {
        address: address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
        private_key: b256!("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"),
    };

    pub const ADMIN: TestAccount = TestAccount {
        address: address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
        private_key: b256!("59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"),
    };

    pub fn configuration(&self) -> EvmAccountConfiguration {
        EvmAccountConfiguration { private_key: self.private_key }
    }
}

/// JSON-RPC answer for a [`wiremock::MockServer`], echoing the id of the incoming request
pub struct JsonRpcResponder(Value);

impl JsonRpcResponder {
    pub fn result(value: Value) -> Self {
        Self(json!({ "result": value }))
    }

    pub fn error(code: i64, message: &str) -> Self {
        Self(json!({ "error": { "code": code, "message": message } }))
    }
}

impl Respond for JsonRpcResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let id = serde_json::from_slice::<Value>(&request.body)
            .ok()
            .and_then(|body| body.get("id").cloned())
            .unwrap_or(Value::Null);

        let mut body = self.0.clone();
        body["jsonrpc"] = json!("2.0");
        body["id"] = id;

        ResponseTemplate::new(200).set_body_json(body)
    }
}
