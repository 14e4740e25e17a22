use alloy::primitives::{Address, Bytes, Signature, B256, U256};
use alloy::sol_types::{Eip712Domain, SolStruct};
use tracing::instrument;

use crate::account::SmartAccount;
use crate::contract::Permit;
use crate::{ChainID, Client, Error};

/// Name and version of a token EIP-712 domain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenDomain {
    pub name: String,
    pub version: String,
}

impl TokenDomain {
    pub fn eip712_domain(&self, chain_id: &ChainID, token: Address) -> Eip712Domain {
        Eip712Domain::new(Some(self.name.clone().into()), Some(self.version.clone().into()), Some(chain_id.as_u256()), Some(token), None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermitRequest {
    pub token: Address,
    pub spender: Address,
    pub value: U256,
    pub nonce: U256,
    pub deadline: U256,
}

/// Off-chain allowance given by `owner` to `spender` over `value` units of `token`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitAuthorization {
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    pub nonce: U256,
    pub deadline: U256,

    pub signature: Signature,
}

impl PermitAuthorization {
    /// Signature packed as `r || s || v` with `v` in {27, 28}
    pub fn signature_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.signature.as_bytes())
    }
}

pub fn hash_permit(domain: &TokenDomain, chain_id: &ChainID, owner: Address, request: &PermitRequest) -> B256 {
    let permit = Permit {
        owner,
        spender: request.spender,
        value: request.value,
        nonce: request.nonce,
        deadline: request.deadline,
    };

    permit.eip712_signing_hash(&domain.eip712_domain(chain_id, request.token))
}

/// Sign the permit with the key owning `account`. The signature only depends on the domain, the
/// request and the key.
pub fn sign_permit(account: &SmartAccount, domain: &TokenDomain, request: &PermitRequest) -> Result<PermitAuthorization, Error> {
    let hash = hash_permit(domain, account.chain_id(), account.address(), request);

    Ok(PermitAuthorization {
        token: request.token,
        owner: account.address(),
        spender: request.spender,
        value: request.value,
        nonce: request.nonce,
        deadline: request.deadline,
        signature: account.sign_hash(&hash)?,
    })
}

/// Signs permits after reading the token domain and the owner permit nonce from the chain
#[derive(Clone)]
pub struct PermitSigner {
    client: Client,
}

impl PermitSigner {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    #[instrument(name = "sign_permit", skip(self, account), fields(owner = %account.address()))]
    pub async fn sign(&self, account: &SmartAccount, token: Address, spender: Address, value: U256, deadline: U256) -> Result<PermitAuthorization, Error> {
        let (domain, nonce) = futures::try_join!(self.client.fetch_token_domain(token), self.client.fetch_permit_nonce(token, account.address()))?;

        let request = PermitRequest {
            token,
            spender,
            value,
            nonce,
            deadline,
        };

        sign_permit(account, &domain, &request)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, U256};
    use async_trait::async_trait;

    use crate::account::SmartAccount;
    use crate::constants::{Contract, Permit, Token};
    use crate::signature::permit::{hash_permit, sign_permit, PermitRequest, PermitSigner, TokenDomain};
    use crate::testing::{MockChainClient, TestAccount};
    use crate::{ChainID, Client, Configuration, Error};

    fn usdc_domain() -> TokenDomain {
        TokenDomain {
            name: "USDC".to_string(),
            version: "2".to_string(),
        }
    }

    fn request(nonce: u64) -> PermitRequest {
        PermitRequest {
            token: Token::USDC_ARBITRUM_SEPOLIA,
            spender: Contract::PAYMASTER_V08_ARBITRUM_SEPOLIA,
            value: Permit::AMOUNT,
            nonce: U256::from(nonce),
            deadline: Permit::DEADLINE,
        }
    }

    fn account() -> SmartAccount {
        SmartAccount::new(&TestAccount::DONOR.configuration(), ChainID::ArbitrumSepolia).unwrap()
    }

    #[test]
    fn signature_is_deterministic() {
        let first = sign_permit(&account(), &usdc_domain(), &request(0)).unwrap();
        let second = sign_permit(&account(), &usdc_domain(), &request(0)).unwrap();

        assert_eq!(first.signature_bytes(), second.signature_bytes());
    }

    #[test]
    fn signature_recovers_the_owner() {
        let permit = sign_permit(&account(), &usdc_domain(), &request(3)).unwrap();
        let hash = hash_permit(&usdc_domain(), &ChainID::ArbitrumSepolia, permit.owner, &request(3));

        assert_eq!(permit.signature.recover_address_from_prehash(&hash).unwrap(), TestAccount::DONOR.address);
    }

    #[test]
    fn signature_is_65_bytes_with_legacy_v() {
        let permit = sign_permit(&account(), &usdc_domain(), &request(0)).unwrap();
        let bytes = permit.signature_bytes();

        assert_eq!(bytes.len(), 65);
        assert!(bytes[64] == 27 || bytes[64] == 28);
    }

    #[test]
    fn domain_binds_the_signature() {
        let other_domain = TokenDomain {
            name: "USDC".to_string(),
            version: "1".to_string(),
        };

        let first = sign_permit(&account(), &usdc_domain(), &request(0)).unwrap();
        let second = sign_permit(&account(), &other_domain, &request(0)).unwrap();
        let third = sign_permit(&account(), &usdc_domain(), &request(1)).unwrap();

        assert_ne!(first.signature, second.signature);
        assert_ne!(first.signature, third.signature);
    }

    #[derive(Debug)]
    struct PermitChain;

    #[async_trait]
    impl MockChainClient for PermitChain {
        fn new() -> Self {
            Self
        }

        async fn fetch_permit_nonce(&self, _token: Address, _owner: Address) -> Result<U256, Error> {
            Ok(U256::from(12))
        }

        async fn fetch_token_domain(&self, _token: Address) -> Result<TokenDomain, Error> {
            Ok(usdc_domain())
        }
    }

    #[tokio::test]
    async fn signer_uses_the_onchain_permit_nonce() {
        let client = Client::new(&Configuration::mock::<PermitChain>()).unwrap();
        let signer = PermitSigner::new(client);

        // When
        let permit = signer
            .sign(&account(), Token::USDC_ARBITRUM_SEPOLIA, Contract::PAYMASTER_V08_ARBITRUM_SEPOLIA, Permit::AMOUNT, Permit::DEADLINE)
            .await
            .unwrap();

        // Then
        assert_eq!(permit.nonce, U256::from(12));
        assert_eq!(permit, sign_permit(&account(), &usdc_domain(), &request(12)).unwrap());
    }
}
