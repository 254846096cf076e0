use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Errors while encoding, signing or recovering a relay message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("{field} does not fit in uint256")]
    EncodingOverflow { field: &'static str },
    #[error("invalid integer for {field}: {value:?}")]
    InvalidInteger { field: &'static str, value: String },
    #[error("invalid address for {field}: expected 20 bytes, got {len}")]
    InvalidAddressFormat { field: &'static str, len: usize },
    #[error("invalid hex for {field}")]
    InvalidHex { field: &'static str },
    #[error("domain separator must be 32 bytes, got {0}")]
    InvalidDomainSeparator(usize),
    #[error("correlation id must be at most 31 bytes, got {0}")]
    CorrelationIdTooLong(usize),
    #[error("malformed signature: {0}")]
    InvalidSignature(String),
    #[error("signing failed: {0}")]
    SigningFailure(String),
}

/// Reasons the off-chain verifier refuses an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("deadline {deadline} is before {now}")]
    DeadlineExpired { deadline: U256, now: u64 },
    #[error("executor signature recovers to unregistered signer {0}")]
    InvalidExecutorSigner(Address),
    #[error("checker signature recovers to unregistered signer {0}")]
    InvalidCheckerSigner(Address),
    #[error(transparent)]
    Codec(#[from] CodecError),
}
