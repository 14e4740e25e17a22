use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{address, Address, B256, U256};
use async_trait::async_trait;
use gasless_bundler::testing::{receipt, MockBundlerClient};
use gasless_bundler::{ErrorCode, UserOperationReceipt};
use gasless_evm::operation::{GasFees, GasLimits, UserOperation};
use gasless_evm::signature::permit::TokenDomain;
use gasless_evm::testing::{MockChainClient, TestAccount};
use gasless_evm::ChainID;
use gasless_relayer::lock::LockLayerConfiguration;
use tokio::sync::{Mutex, MutexGuard};

use crate::{Client, ConfirmationConfiguration, Configuration, ContractsConfiguration, Error, OwnersConfiguration};

pub const DONATION_RECIPIENT: Address = address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");

/// What happens to an operation accepted by the simulated bundler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Included(B256),
    Reverted(B256),
    Pending,
}

#[derive(Debug)]
pub struct NetworkState {
    pub balance: U256,
    pub fees: Option<GasFees>,
    pub outcome: Outcome,

    /// Number of upcoming submissions rejected for a stale nonce
    pub stale_rejections: usize,
    pub rejection: Option<(i64, String)>,

    pub transaction_counts: HashMap<Address, u64>,
    pub account_nonces: HashMap<Address, U256>,
    pub permit_nonces: HashMap<Address, U256>,

    /// Authorization nonces of the accepted operations, per owner
    pub authorizations: Vec<(Address, u64)>,
    pub sent: Vec<UserOperation>,
    pub submissions: usize,
    pub gas_price_requests: usize,
    pub requests: usize,

    receipts: HashMap<B256, UserOperationReceipt>,
}

/// Chain and bundler sharing one state. An accepted operation is included right away unless the
/// outcome is [`Outcome::Pending`], consuming the transaction count of its owner.
#[derive(Debug)]
pub struct SimulatedNetwork {
    state: Mutex<NetworkState>,
}

impl Default for SimulatedNetwork {
    fn default() -> Self {
        Self {
            state: Mutex::new(NetworkState {
                balance: U256::from(100_000_000),
                fees: Some(GasFees {
                    max_fee_per_gas: 100_000_000,
                    max_priority_fee_per_gas: 1_000_000,
                }),
                outcome: Outcome::Included(B256::repeat_byte(0x01)),
                stale_rejections: 0,
                rejection: None,
                transaction_counts: HashMap::new(),
                account_nonces: HashMap::new(),
                permit_nonces: HashMap::new(),
                authorizations: vec![],
                sent: vec![],
                submissions: 0,
                gas_price_requests: 0,
                requests: 0,
                receipts: HashMap::new(),
            }),
        }
    }
}

impl SimulatedNetwork {
    pub fn with_balance(mut self, balance: U256) -> Self {
        self.state.get_mut().balance = balance;
        self
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.state.get_mut().outcome = outcome;
        self
    }

    pub fn with_stale_rejections(mut self, count: usize) -> Self {
        self.state.get_mut().stale_rejections = count;
        self
    }

    pub fn with_rejection(mut self, code: i64, message: &str) -> Self {
        self.state.get_mut().rejection = Some((code, message.to_string()));
        self
    }

    pub fn without_fees(mut self) -> Self {
        self.state.get_mut().fees = None;
        self
    }

    pub async fn state(&self) -> MutexGuard<'_, NetworkState> {
        self.state.lock().await
    }

    async fn request(&self) -> MutexGuard<'_, NetworkState> {
        let mut state = self.state.lock().await;
        state.requests += 1;
        state
    }
}

#[async_trait]
impl MockChainClient for SimulatedNetwork {
    fn new() -> Self {
        Self::default()
    }

    async fn fetch_token_balance(&self, _token: Address, _owner: Address) -> Result<U256, gasless_evm::Error> {
        Ok(self.request().await.balance)
    }

    async fn fetch_transaction_count(&self, address: Address) -> Result<u64, gasless_evm::Error> {
        let count = self.request().await.transaction_counts.get(&address).copied().unwrap_or_default();

        // leaves room for a concurrent pipeline to interleave
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(count)
    }

    async fn fetch_permit_nonce(&self, _token: Address, owner: Address) -> Result<U256, gasless_evm::Error> {
        Ok(self.request().await.permit_nonces.get(&owner).copied().unwrap_or_default())
    }

    async fn fetch_token_domain(&self, _token: Address) -> Result<TokenDomain, gasless_evm::Error> {
        self.request().await;
        Ok(TokenDomain {
            name: "USDC".to_string(),
            version: "2".to_string(),
        })
    }

    async fn fetch_account_nonce(&self, _entry_point: Address, sender: Address) -> Result<U256, gasless_evm::Error> {
        Ok(self.request().await.account_nonces.get(&sender).copied().unwrap_or_default())
    }
}

#[async_trait]
impl MockBundlerClient for SimulatedNetwork {
    fn new() -> Self {
        Self::default()
    }

    async fn fetch_gas_price(&self) -> Result<GasFees, gasless_bundler::Error> {
        let mut state = self.request().await;
        state.gas_price_requests += 1;

        state
            .fees
            .ok_or_else(|| gasless_bundler::Error::InvalidResponse("missing standard tier".to_string()))
    }

    async fn estimate_user_operation_gas(&self, _operation: &UserOperation, _entry_point: Address) -> Result<GasLimits, gasless_bundler::Error> {
        self.request().await;
        Ok(GasLimits {
            call_gas_limit: 120_000,
            verification_gas_limit: 150_000,
            pre_verification_gas: 60_000,
        })
    }

    async fn send_user_operation(&self, operation: &UserOperation, entry_point: Address) -> Result<B256, gasless_bundler::Error> {
        let mut state = self.request().await;
        state.submissions += 1;

        let current = state.transaction_counts.get(&operation.sender).copied().unwrap_or_default();
        if state.stale_rejections > 0 || operation.authorization.nonce != current {
            state.stale_rejections = state.stale_rejections.saturating_sub(1);

            return Err(gasless_bundler::Error::Rejected {
                code: ErrorCode::REJECTED_BY_VALIDATION,
                message: "AA25 invalid account nonce".to_string(),
            });
        }

        if let Some((code, message)) = state.rejection.clone() {
            return Err(gasless_bundler::Error::Rejected { code, message });
        }

        let hash = operation.hash(entry_point, ChainID::ArbitrumSepolia.as_u64());
        state.authorizations.push((operation.sender, operation.authorization.nonce));
        state.sent.push(operation.clone());

        let included = match state.outcome {
            Outcome::Included(transaction_hash) => Some(receipt(hash, transaction_hash, true)),
            Outcome::Reverted(transaction_hash) => Some(receipt(hash, transaction_hash, false)),
            Outcome::Pending => None,
        };

        if let Some(included) = included {
            *state.transaction_counts.entry(operation.sender).or_default() += 1;
            *state.account_nonces.entry(operation.sender).or_default() += U256::from(1);
            *state.permit_nonces.entry(operation.sender).or_default() += U256::from(1);
            state.receipts.insert(hash, included);
        }

        Ok(hash)
    }

    async fn fetch_user_operation_receipt(&self, hash: B256) -> Result<Option<UserOperationReceipt>, gasless_bundler::Error> {
        Ok(self.request().await.receipts.get(&hash).cloned())
    }
}

/// Configuration wired to a [`SimulatedNetwork`], with both owners set to development keys
pub struct TestEnvironment {
    pub network: Arc<SimulatedNetwork>,
    pub configuration: Configuration,
}

impl TestEnvironment {
    pub fn new(network: SimulatedNetwork) -> Self {
        let network = Arc::new(network);

        Self {
            configuration: Configuration {
                chain: gasless_evm::Configuration::Mock(network.clone()),
                bundler: gasless_bundler::Configuration::Mock(network.clone()),
                sponsoring: gasless_sponsoring::Configuration::default(),
                lock: LockLayerConfiguration {
                    retry_timeout: Duration::from_secs(5),
                },
                owners: OwnersConfiguration {
                    donor: Some(TestAccount::DONOR.configuration()),
                    badge_admin: Some(TestAccount::ADMIN.configuration()),
                },
                contracts: ContractsConfiguration {
                    donation_recipient: Some(DONATION_RECIPIENT),
                    ..ContractsConfiguration::default()
                },
                confirmation: ConfirmationConfiguration {
                    polling_interval: Duration::from_millis(10),
                    timeout: Duration::from_millis(300),
                },
                max_attempts: 3,
            },
            network,
        }
    }

    pub fn client(&self) -> Result<Client, Error> {
        Client::new(&self.configuration)
    }
}
