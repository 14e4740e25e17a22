use alloy::primitives::{address, Address, U256};

use crate::ChainID;

pub struct Token;

impl Token {
    pub const USDC_ARBITRUM_SEPOLIA: Address = address!("75faf114eafb1BDbe2F0316DF893fd58CE46AA4d");
    pub const USDC_ARBITRUM_ONE: Address = address!("af88d065e77c8cC2239327C5EDb3A432268e5831");

    pub const USDC_DECIMALS: u32 = 6;

    pub fn usdc(chain_id: &ChainID) -> Address {
        match chain_id {
            ChainID::ArbitrumSepolia => Self::USDC_ARBITRUM_SEPOLIA,
            ChainID::ArbitrumOne => Self::USDC_ARBITRUM_ONE,
        }
    }
}

pub struct Contract;

impl Contract {
    /// ERC-4337 EntryPoint v0.8
    pub const ENTRY_POINT_V08: Address = address!("4337084D9E255Ff0702461CF8895CE9E3b5Ff108");

    /// Simple7702Account implementation the owning keys delegate to
    pub const SIMPLE_7702_ACCOUNT: Address = address!("e6Cae83BdE06E4c305530e199D7217f42808555B");

    pub const FRAMINO_BADGE_ARBITRUM_SEPOLIA: Address = address!("73050b11f0Dd5C48Ed1C05c56236F0D235ba4f57");
    pub const PAYMASTER_V08_ARBITRUM_SEPOLIA: Address = address!("3BA9A96eE3eFf3A69E2B18886AcF52027EFF8966");

    pub fn badge(chain_id: &ChainID) -> Option<Address> {
        match chain_id {
            ChainID::ArbitrumSepolia => Some(Self::FRAMINO_BADGE_ARBITRUM_SEPOLIA),
            ChainID::ArbitrumOne => None,
        }
    }

    pub fn paymaster(chain_id: &ChainID) -> Option<Address> {
        match chain_id {
            ChainID::ArbitrumSepolia => Some(Self::PAYMASTER_V08_ARBITRUM_SEPOLIA),
            ChainID::ArbitrumOne => None,
        }
    }
}

pub struct Permit;

impl Permit {
    /// Allowance granted to the paymaster, enough to cover any sponsored operation fee
    pub const AMOUNT: U256 = U256::from_limbs([0x1_0000_0000, 0, 0, 0]);
    pub const DEADLINE: U256 = U256::MAX;
}

pub struct Bundler;

impl Bundler {
    pub fn endpoint(chain_id: &ChainID) -> String {
        format!("https://public.pimlico.io/v2/{}/rpc", chain_id.as_u64())
    }
}
