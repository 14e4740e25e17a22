use alloy::primitives::{Address, U256};
use gasless_execution::intent::MAX_BADGE_ID;

use crate::Error;

/// `0x` followed by 40 hexadecimal characters
pub fn check_address(value: &str, field: &str) -> Result<Address, Error> {
    if !value.starts_with("0x") || value.len() != 42 {
        return Err(Error::InvalidParameters(format!("invalid {} address format", field)));
    }

    value
        .parse()
        .map_err(|_| Error::InvalidParameters(format!("invalid {} address format", field)))
}

pub fn check_badge_id(id: i64) -> Result<U256, Error> {
    match u64::try_from(id) {
        Ok(id) if id <= MAX_BADGE_ID => Ok(U256::from(id)),
        _ => Err(Error::InvalidParameters(format!("invalid id, must be an integer between 0-{}", MAX_BADGE_ID))),
    }
}

pub fn check_positive(value: i64, field: &str) -> Result<U256, Error> {
    if value <= 0 {
        return Err(Error::InvalidParameters(format!("invalid {}, must be a positive integer", field)));
    }

    Ok(U256::from(value))
}

pub fn check_non_empty(value: &str, field: &str) -> Result<String, Error> {
    if value.trim().is_empty() {
        return Err(Error::InvalidParameters(format!("{} cannot be empty", field)));
    }

    Ok(value.to_string())
}
