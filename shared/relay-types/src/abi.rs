//! Solidity ABI bindings for the Gelato diamond and `GelatoRelay`.
//!
//! These mirror the deployed contracts bit-for-bit; the off-chain digest in
//! `relay-message-codec` is checked against `MessageFeeCollector`'s EIP-712 struct hash.

use alloy_sol_types::sol;

sol! {
    /// Payload signed by both the executor and checker signers.
    #[derive(Debug, PartialEq, Eq)]
    struct MessageFeeCollector {
        address service;
        bytes data;
        uint256 salt;
        uint256 deadline;
        address feeToken;
    }

    /// Argument of `execWithSigsFeeCollector`.
    #[derive(Debug, PartialEq, Eq)]
    struct ExecWithSigsFeeCollector {
        bytes32 correlationId;
        MessageFeeCollector msg;
        bytes executorSignerSig;
        bytes checkerSignerSig;
    }

    /// Subset of the Gelato diamond surface used by the relay tooling.
    interface IGelato {
        function DOMAIN_SEPARATOR() external view returns (bytes32);
        function execWithSigsFeeCollector(ExecWithSigsFeeCollector calldata _call)
            external
            returns (uint256 estimatedGasUsed, uint256 observedFee);
        function addExecutorSigners(address[] calldata _executorSigners) external;
        function addCheckerSigners(address[] calldata _checkerSigners) external;
    }

    interface IGelatoRelay {
        function callWithSyncFeeV2(
            address _target,
            bytes calldata _data,
            bool _isRelayContext,
            bytes32 _correlationId
        ) external;
    }
}
