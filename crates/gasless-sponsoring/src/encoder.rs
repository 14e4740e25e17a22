use alloy::primitives::{Address, Bytes};
use gasless_evm::operation::PaymasterFields;
use gasless_evm::signature::PermitAuthorization;

/// Mode byte telling the paymaster that fees are pulled through a permit
pub const PERMIT_MODE: u8 = 0;

/// Gas limits reserved for the paymaster itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymasterGasLimits {
    pub verification: u128,
    pub post_op: u128,
}

impl Default for PaymasterGasLimits {
    fn default() -> Self {
        Self {
            verification: 0x200000,
            post_op: 0x15000,
        }
    }
}

/// `encodePacked(uint8 mode, address token, uint256 permitAmount, bytes signature)`
pub fn encode_paymaster_data(permit: &PermitAuthorization) -> Bytes {
    let amount = permit.value.to_be_bytes::<32>();
    let signature = permit.signature_bytes();

    let parts: [&[u8]; 4] = [&[PERMIT_MODE], permit.token.as_slice(), &amount, &signature];
    parts.concat().into()
}

/// Everything the operation needs to be sponsored by `paymaster`
pub fn encode_sponsorship(paymaster: Address, gas: &PaymasterGasLimits, permit: &PermitAuthorization) -> PaymasterFields {
    PaymasterFields {
        paymaster,
        verification_gas_limit: gas.verification,
        post_op_gas_limit: gas.post_op,
        data: encode_paymaster_data(permit),
    }
}

#[cfg(test)]
mod tests {
    use alloy::hex;
    use alloy::primitives::{address, Signature, U256};
    use gasless_evm::constants::{Contract, Permit, Token};
    use gasless_evm::signature::PermitAuthorization;

    use crate::encoder::{encode_paymaster_data, encode_sponsorship, PaymasterGasLimits};

    const GOLDEN_PAYMASTER_DATA: &str = "0075faf114eafb1bdbe2f0316df893fd58ce46aa4d0000000000000000000000000000000000000000000000000000000100000000111111111111111111111111111111111111111111111111111111111111111122222222222222222222222222222222222222222222222222222222222222221b";

    fn permit(y_parity: bool) -> PermitAuthorization {
        PermitAuthorization {
            token: Token::USDC_ARBITRUM_SEPOLIA,
            owner: address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            spender: Contract::PAYMASTER_V08_ARBITRUM_SEPOLIA,
            value: Permit::AMOUNT,
            nonce: U256::ZERO,
            deadline: Permit::DEADLINE,
            signature: Signature::new(U256::from_be_bytes([0x11; 32]), U256::from_be_bytes([0x22; 32]), y_parity),
        }
    }

    #[test]
    fn paymaster_data_matches_golden_bytes() {
        let data = encode_paymaster_data(&permit(false));

        assert_eq!(hex::encode(&data), GOLDEN_PAYMASTER_DATA);
        assert_eq!(data.len(), 118);
    }

    #[test]
    fn odd_parity_is_encoded_as_28() {
        let data = encode_paymaster_data(&permit(true));

        assert_eq!(data[117], 0x1c);
        assert_eq!(data[..117], encode_paymaster_data(&permit(false))[..117]);
    }

    #[test]
    fn fields_are_laid_out_in_protocol_order() {
        let data = encode_paymaster_data(&permit(false));

        assert_eq!(data[0], 0);
        assert_eq!(data[1..21], Token::USDC_ARBITRUM_SEPOLIA[..]);
        assert_eq!(U256::from_be_slice(&data[21..53]), Permit::AMOUNT);
        assert_eq!(data[53..85], [0x11; 32]);
        assert_eq!(data[85..117], [0x22; 32]);
    }

    #[test]
    fn sponsorship_carries_fixed_gas_limits() {
        let sponsorship = encode_sponsorship(Contract::PAYMASTER_V08_ARBITRUM_SEPOLIA, &PaymasterGasLimits::default(), &permit(false));

        assert_eq!(sponsorship.paymaster, Contract::PAYMASTER_V08_ARBITRUM_SEPOLIA);
        assert_eq!(sponsorship.verification_gas_limit, 0x200000);
        assert_eq!(sponsorship.post_op_gas_limit, 0x15000);
        assert_eq!(hex::encode(&sponsorship.data), GOLDEN_PAYMASTER_DATA);
    }
}
