use alloy::eips::eip7702::SignedAuthorization;
use alloy::primitives::{bytes, Address, Bytes, B256, U256};
use alloy::sol_types::{Eip712Domain, SolStruct};

use crate::account::SmartAccount;
use crate::contract::PackedUserOperation;
use crate::Error;

mod call;
pub use call::{encode_calls, Call};

/// Signature used while the operation is being estimated. It has the shape of a real signature so that
/// the account validation spends the same amount of gas.
pub const STUB_SIGNATURE: Bytes = bytes!(
    "fffffffffffffffffffffffffffffff0000000000000000000000000000000007aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1c"
);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GasLimits {
    pub call_gas_limit: u128,
    pub verification_gas_limit: u128,
    pub pre_verification_gas: u128,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GasFees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// Sponsorship attached to the operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymasterFields {
    pub paymaster: Address,
    pub verification_gas_limit: u128,
    pub post_op_gas_limit: u128,
    pub data: Bytes,
}

impl PaymasterFields {
    /// `paymaster || verificationGasLimit (16 bytes) || postOpGasLimit (16 bytes) || data`
    pub fn pack(&self) -> Bytes {
        let mut packed = Vec::with_capacity(52 + self.data.len());
        packed.extend_from_slice(self.paymaster.as_slice());
        packed.extend_from_slice(&self.verification_gas_limit.to_be_bytes());
        packed.extend_from_slice(&self.post_op_gas_limit.to_be_bytes());
        packed.extend_from_slice(&self.data);
        packed.into()
    }
}

/// ERC-4337 v0.8 user operation sent by a 7702 smart account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub call_data: Bytes,

    pub gas: GasLimits,
    pub fees: GasFees,
    pub paymaster: PaymasterFields,

    pub authorization: SignedAuthorization,
    pub signature: Bytes,
}

fn pack_u128(high: u128, low: u128) -> B256 {
    B256::from((U256::from(high) << 128) | U256::from(low))
}

impl UserOperation {
    /// Unsigned operation carrying the stub signature, ready to be estimated
    pub fn new(sender: Address, nonce: U256, call_data: Bytes, fees: GasFees, paymaster: PaymasterFields, authorization: SignedAuthorization) -> Self {
        Self {
            sender,
            nonce,
            call_data,
            gas: GasLimits::default(),
            fees,
            paymaster,
            authorization,
            signature: STUB_SIGNATURE,
        }
    }

    /// For a 7702 account the init code is the delegate designated by the authorization
    pub fn init_code(&self) -> Bytes {
        Bytes::copy_from_slice(self.authorization.address.as_slice())
    }

    pub fn account_gas_limits(&self) -> B256 {
        pack_u128(self.gas.verification_gas_limit, self.gas.call_gas_limit)
    }

    pub fn gas_fees(&self) -> B256 {
        pack_u128(self.fees.max_priority_fee_per_gas, self.fees.max_fee_per_gas)
    }

    pub fn paymaster_and_data(&self) -> Bytes {
        self.paymaster.pack()
    }

    /// Hash signed by the account, as computed by the entry point
    pub fn hash(&self, entry_point: Address, chain_id: u64) -> B256 {
        let domain = Eip712Domain::new(Some("ERC4337".into()), Some("1".into()), Some(U256::from(chain_id)), Some(entry_point), None);
        let packed = PackedUserOperation {
            sender: self.sender,
            nonce: self.nonce,
            initCode: self.init_code(),
            callData: self.call_data.clone(),
            accountGasLimits: self.account_gas_limits(),
            preVerificationGas: U256::from(self.gas.pre_verification_gas),
            gasFees: self.gas_fees(),
            paymasterAndData: self.paymaster_and_data(),
        };

        packed.eip712_signing_hash(&domain)
    }

    /// Replace the stub signature with the signature of the owning key
    pub fn sign(mut self, account: &SmartAccount, entry_point: Address) -> Result<Self, Error> {
        let hash = self.hash(entry_point, account.chain_id().as_u64());
        self.signature = Bytes::copy_from_slice(&account.sign_hash(&hash)?.as_bytes());

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, Bytes, Signature, U256};

    use crate::account::SmartAccount;
    use crate::constants::Contract;
    use crate::operation::{GasFees, GasLimits, PaymasterFields, UserOperation, STUB_SIGNATURE};
    use crate::signature::authorization::sign_authorization;
    use crate::testing::TestAccount;
    use crate::ChainID;

    fn account() -> SmartAccount {
        SmartAccount::new(&TestAccount::DONOR.configuration(), ChainID::ArbitrumSepolia).unwrap()
    }

    fn operation() -> UserOperation {
        let account = account();
        let mut operation = UserOperation::new(
            account.address(),
            U256::from(3),
            Bytes::from_static(&[0xb6, 0x1d, 0x27, 0xf6]),
            GasFees {
                max_fee_per_gas: 0x02,
                max_priority_fee_per_gas: 0x01,
            },
            PaymasterFields {
                paymaster: Contract::PAYMASTER_V08_ARBITRUM_SEPOLIA,
                verification_gas_limit: 0x200000,
                post_op_gas_limit: 0x15000,
                data: Bytes::from_static(&[0xaa, 0xbb]),
            },
            sign_authorization(&account, 0).unwrap(),
        );

        operation.gas = GasLimits {
            call_gas_limit: 0x10,
            verification_gas_limit: 0x20,
            pre_verification_gas: 0x30,
        };

        operation
    }

    #[test]
    fn new_operation_carries_the_stub_signature() {
        assert_eq!(operation().signature, STUB_SIGNATURE);
    }

    #[test]
    fn stub_signature_has_the_shape_of_a_signature() {
        assert_eq!(STUB_SIGNATURE.len(), 65);
        assert_eq!(STUB_SIGNATURE[32], 0x7a);
        assert_eq!(STUB_SIGNATURE[64], 0x1c);
    }

    #[test]
    fn gas_fields_are_packed_high_then_low() {
        let operation = operation();

        let limits = operation.account_gas_limits();
        assert_eq!(limits[15], 0x20);
        assert_eq!(limits[31], 0x10);

        let fees = operation.gas_fees();
        assert_eq!(fees[15], 0x01);
        assert_eq!(fees[31], 0x02);
    }

    #[test]
    fn paymaster_and_data_layout() {
        let packed = operation().paymaster_and_data();

        assert_eq!(packed.len(), 20 + 16 + 16 + 2);
        assert_eq!(packed[..20], address!("3BA9A96eE3eFf3A69E2B18886AcF52027EFF8966")[..]);
        assert_eq!(packed[33..36], [0x20, 0x00, 0x00]);
        assert_eq!(packed[49..52], [0x01, 0x50, 0x00]);
        assert_eq!(packed[52..], [0xaa, 0xbb]);
    }

    #[test]
    fn init_code_is_the_delegate() {
        assert_eq!(operation().init_code(), Bytes::copy_from_slice(Contract::SIMPLE_7702_ACCOUNT.as_slice()));
    }

    #[test]
    fn hash_depends_on_every_signed_field() {
        let base = operation();
        let hash = base.hash(Contract::ENTRY_POINT_V08, 421614);

        let mut other = base.clone();
        other.nonce = U256::from(4);
        assert_ne!(other.hash(Contract::ENTRY_POINT_V08, 421614), hash);

        let mut other = base.clone();
        other.gas.pre_verification_gas += 1;
        assert_ne!(other.hash(Contract::ENTRY_POINT_V08, 421614), hash);

        assert_ne!(base.hash(Contract::ENTRY_POINT_V08, 42161), hash);

        let mut other = base.clone();
        other.signature = Bytes::new();
        assert_eq!(other.hash(Contract::ENTRY_POINT_V08, 421614), hash);
    }

    #[test]
    fn signature_recovers_the_sender() {
        let signed = operation().sign(&account(), Contract::ENTRY_POINT_V08).unwrap();
        let hash = signed.hash(Contract::ENTRY_POINT_V08, 421614);

        let signature = Signature::try_from(signed.signature.as_ref()).unwrap();
        assert_eq!(signature.recover_address_from_prehash(&hash).unwrap(), signed.sender);
    }
}
