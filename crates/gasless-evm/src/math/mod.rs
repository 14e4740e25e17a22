use std::str::FromStr;

use alloy::primitives::U256;
use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::{BigDecimal, RoundingMode};

use crate::Error;

// A uint256 holds at most 78 decimal digits
const MAX_AMOUNT_LENGTH: usize = 96;

/// Convert a human readable decimal `amount` into base units of a token with `decimals` decimals.
/// Digits below the smallest unit are dropped (floor). An amount that floors to zero is rejected.
pub fn to_base_units(amount: &str, decimals: u32) -> Result<U256, Error> {
    let amount = amount.trim();
    if amount.len() > MAX_AMOUNT_LENGTH {
        return Err(Error::InvalidAmount(format!("amount of {} characters is too long", amount.len())));
    }

    // plain notation only, an exponent would let the scaling below allocate without bound
    if !amount.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-' || c == '+') {
        return Err(Error::InvalidAmount(format!("{} is not a decimal number", amount)));
    }

    let value = BigDecimal::from_str(amount).map_err(|_| Error::InvalidAmount(format!("{} is not a decimal number", amount)))?;
    if value.sign() != Sign::Plus {
        return Err(Error::InvalidAmount(format!("{} is not positive", amount)));
    }

    let scaled = (value * BigDecimal::from(10u64.pow(decimals))).with_scale_round(0, RoundingMode::Down);
    let (units, _) = scaled.into_bigint_and_exponent();
    if units.sign() != Sign::Plus {
        return Err(Error::InvalidAmount(format!("{} is below the smallest unit", amount)));
    }

    U256::from_str(&units.to_string()).map_err(|e| Error::InvalidAmount(e.to_string()))
}

/// Render `units` base units as a decimal amount, trailing zeros removed
pub fn format_base_units(units: U256, decimals: u32) -> String {
    BigInt::from_str(&units.to_string())
        .map(|units| BigDecimal::new(units, decimals as i64).normalized().to_string())
        .unwrap_or_else(|_| units.to_string())
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;

    use crate::math::{format_base_units, to_base_units};
    use crate::Error;

    #[test]
    fn amounts_are_scaled_to_base_units() {
        assert_eq!(to_base_units("5", 6).unwrap(), U256::from(5_000_000));
        assert_eq!(to_base_units("4.999999", 6).unwrap(), U256::from(4_999_999));
        assert_eq!(to_base_units(" 0.000001 ", 6).unwrap(), U256::from(1));
    }

    #[test]
    fn extra_digits_are_floored() {
        assert_eq!(to_base_units("1.2345679", 6).unwrap(), U256::from(1_234_567));
        assert_eq!(to_base_units("0.0000019", 6).unwrap(), U256::from(1));
    }

    #[test]
    fn amounts_below_one_unit_are_rejected() {
        assert!(matches!(to_base_units("0.0000009", 6), Err(Error::InvalidAmount(_))));
        assert!(matches!(to_base_units("0", 6), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn malformed_or_negative_amounts_are_rejected() {
        assert!(to_base_units("-1", 6).is_err());
        assert!(to_base_units("abc", 6).is_err());
        assert!(to_base_units("", 6).is_err());
    }

    #[test]
    fn exponent_notation_is_rejected_before_scaling() {
        let started = std::time::Instant::now();

        assert!(matches!(to_base_units("1e10000000", 6), Err(Error::InvalidAmount(_))));
        assert!(matches!(to_base_units("1E6", 6), Err(Error::InvalidAmount(_))));
        assert!(matches!(to_base_units(&"9".repeat(10_000), 6), Err(Error::InvalidAmount(_))));
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn amounts_beyond_uint256_are_rejected() {
        assert!(matches!(to_base_units(&"9".repeat(80), 6), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn any_amount_of_at_least_one_unit_stays_positive() {
        for amount in ["0.000001", "0.0000010", "0.00000199", "1", "123456.789012345"] {
            assert!(to_base_units(amount, 6).unwrap() > U256::ZERO, "{}", amount);
        }
    }

    #[test]
    fn base_units_are_rendered_as_decimals() {
        assert_eq!(format_base_units(U256::from(4_999_999), 6), "4.999999");
        assert_eq!(format_base_units(U256::from(5_000_000), 6), "5");
    }
}
