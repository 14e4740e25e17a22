use alloy::sol;

/// JSON ABI of the badge collection, handed to clients that interact with it directly
pub const FRAMINO_BADGE_ABI: &str = include_str!("../../../../resources/abi/FraminoBadge.json");

sol! {
    /// Fungible token implementing EIP-2612 permits
    interface IERC20Permit {
        function balanceOf(address owner) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function name() external view returns (string);
        function version() external view returns (string);
        function nonces(address owner) external view returns (uint256);
    }

    /// Seasonal badge collection (ERC-1155)
    interface IFraminoBadge {
        function mint(address account, uint256 id, uint256 value, string uri, bytes data) external;
        function markCompleted(address user, uint256 id, string newUri) external;
        function redeem(address user, uint256 id, uint256 amount) external;
    }

    interface ISimple7702Account {
        struct Call {
            address target;
            uint256 value;
            bytes data;
        }

        function execute(address target, uint256 value, bytes data) external;
        function executeBatch(Call[] calls) external;
    }

    interface IEntryPoint {
        function getNonce(address sender, uint192 key) external view returns (uint256 nonce);
    }

    #[derive(Debug)]
    struct Permit {
        address owner;
        address spender;
        uint256 value;
        uint256 nonce;
        uint256 deadline;
    }

    #[derive(Debug)]
    struct PackedUserOperation {
        address sender;
        uint256 nonce;
        bytes initCode;
        bytes callData;
        bytes32 accountGasLimits;
        uint256 preVerificationGas;
        bytes32 gasFees;
        bytes paymasterAndData;
    }
}

#[cfg(test)]
mod tests {
    use alloy::json_abi::JsonAbi;
    use alloy::sol_types::SolCall;

    use crate::contract::{IFraminoBadge, FRAMINO_BADGE_ABI};

    #[test]
    fn published_abi_matches_the_bindings() {
        let abi: JsonAbi = serde_json::from_str(FRAMINO_BADGE_ABI).unwrap();

        let selector = |name: &str| abi.function(name).unwrap()[0].selector().0;

        assert_eq!(selector("mint"), IFraminoBadge::mintCall::SELECTOR);
        assert_eq!(selector("markCompleted"), IFraminoBadge::markCompletedCall::SELECTOR);
        assert_eq!(selector("redeem"), IFraminoBadge::redeemCall::SELECTOR);
    }
}
