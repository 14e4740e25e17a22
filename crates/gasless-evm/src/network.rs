use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Chains on which the relayer can operate
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainID {
    ArbitrumSepolia,
    ArbitrumOne,
}

impl ChainID {
    const ARBITRUM_SEPOLIA: u64 = 421614;
    const ARBITRUM_ONE: u64 = 42161;

    /// Convert a numeric chain id into a ChainID
    ///
    /// If the chain is not supported, return an error
    pub fn from_u64(value: u64) -> Result<Self, Error> {
        match value {
            Self::ARBITRUM_SEPOLIA => Ok(Self::ArbitrumSepolia),
            Self::ARBITRUM_ONE => Ok(Self::ArbitrumOne),
            _ => Err(Error::InvalidChainID(value.to_string())),
        }
    }

    /// Convert a chain name or a decimal chain id into a ChainID
    /// - arbitrum_sepolia, arbitrum-sepolia, 421614 -> ChainID::ArbitrumSepolia
    /// - arbitrum_one, arbitrum, 42161 -> ChainID::ArbitrumOne
    pub fn from_string(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "arbitrum_sepolia" => Ok(Self::ArbitrumSepolia),
            "arbitrum_one" | "arbitrum" => Ok(Self::ArbitrumOne),
            value => value
                .parse::<u64>()
                .map_err(|_| Error::InvalidChainID(s.to_string()))
                .and_then(Self::from_u64),
        }
    }

    pub fn as_u64(&self) -> u64 {
        match self {
            Self::ArbitrumSepolia => Self::ARBITRUM_SEPOLIA,
            Self::ArbitrumOne => Self::ARBITRUM_ONE,
        }
    }

    pub fn as_u256(&self) -> U256 {
        U256::from(self.as_u64())
    }
}

#[cfg(test)]
mod tests {
    use crate::ChainID;

    #[test]
    fn numeric_ids_are_recognized() {
        assert_eq!(ChainID::from_u64(421614).unwrap(), ChainID::ArbitrumSepolia);
        assert_eq!(ChainID::from_u64(42161).unwrap(), ChainID::ArbitrumOne);
        assert!(ChainID::from_u64(1).is_err());
    }

    #[test]
    fn names_are_recognized() {
        assert_eq!(ChainID::from_string("arbitrum-sepolia").unwrap(), ChainID::ArbitrumSepolia);
        assert_eq!(ChainID::from_string("ARBITRUM_SEPOLIA").unwrap(), ChainID::ArbitrumSepolia);
        assert_eq!(ChainID::from_string("421614").unwrap(), ChainID::ArbitrumSepolia);
        assert_eq!(ChainID::from_string("arbitrum").unwrap(), ChainID::ArbitrumOne);
        assert!(ChainID::from_string("sepolia").is_err());
    }
}
