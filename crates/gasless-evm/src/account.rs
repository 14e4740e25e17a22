use std::fmt::{Debug, Formatter};

use alloy::primitives::{Address, Signature, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use serde::{Deserialize, Serialize};

use crate::constants::Contract;
use crate::{ChainID, Error};

/// Key material of an owning EOA, as found in the configuration
#[derive(Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct EvmAccountConfiguration {
    pub private_key: B256,
}

impl Debug for EvmAccountConfiguration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmAccountConfiguration").field("private_key", &"<redacted>").finish()
    }
}

/// EIP-7702 smart account. The account lives at the address of its owning key, which delegates its
/// code to the Simple7702Account implementation for the duration of an operation.
#[derive(Clone)]
pub struct SmartAccount {
    chain_id: ChainID,
    delegate: Address,

    owner: PrivateKeySigner,
}

impl Debug for SmartAccount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartAccount")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .field("delegate", &self.delegate)
            .finish_non_exhaustive()
    }
}

impl SmartAccount {
    pub fn new(configuration: &EvmAccountConfiguration, chain_id: ChainID) -> Result<Self, Error> {
        let owner = PrivateKeySigner::from_bytes(&configuration.private_key).map_err(|e| Error::InvalidKey(e.to_string()))?;

        Ok(Self {
            chain_id,
            delegate: Contract::SIMPLE_7702_ACCOUNT,
            owner,
        })
    }

    pub fn address(&self) -> Address {
        self.owner.address()
    }

    pub fn chain_id(&self) -> &ChainID {
        &self.chain_id
    }

    pub fn delegate(&self) -> Address {
        self.delegate
    }

    /// Raw secp256k1 signature of the owning key over `hash`
    pub fn sign_hash(&self, hash: &B256) -> Result<Signature, Error> {
        Ok(self.owner.sign_hash_sync(hash)?)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{b256, keccak256};

    use crate::account::{EvmAccountConfiguration, SmartAccount};
    use crate::testing::TestAccount;
    use crate::ChainID;

    #[test]
    fn account_lives_at_owner_address() {
        let account = SmartAccount::new(&TestAccount::DONOR.configuration(), ChainID::ArbitrumSepolia).unwrap();

        assert_eq!(account.address(), TestAccount::DONOR.address)
    }

    #[test]
    fn debug_never_shows_the_key() {
        let configuration = TestAccount::DONOR.configuration();
        let account = SmartAccount::new(&configuration, ChainID::ArbitrumSepolia).unwrap();

        let key = configuration.private_key.to_string();
        assert!(!format!("{:?}", account).contains(&key[2..]));
        assert!(!format!("{:?}", configuration).contains(&key[2..]));
    }

    #[test]
    fn zero_key_is_rejected() {
        let configuration = EvmAccountConfiguration {
            private_key: b256!("0000000000000000000000000000000000000000000000000000000000000000"),
        };

        assert!(SmartAccount::new(&configuration, ChainID::ArbitrumSepolia).is_err())
    }

    #[test]
    fn signature_recovers_owner() {
        let account = SmartAccount::new(&TestAccount::ADMIN.configuration(), ChainID::ArbitrumSepolia).unwrap();
        let hash = keccak256(b"gasless");

        let signature = account.sign_hash(&hash).unwrap();
        assert_eq!(signature.recover_address_from_prehash(&hash).unwrap(), account.address())
    }
}
