//! Off-chain codec for Gelato `execWithSigsFeeCollector` messages.
//!
//! Builds the `MessageFeeCollector` EIP-712 digest against a domain separator read from the
//! verifying contract, signs it for the executor and checker roles, and mirrors the on-chain
//! acceptance rule so envelopes can be checked before they are submitted.

pub mod encoder;
pub mod errors;
pub mod types;
pub mod verifier;

#[cfg(test)]
mod tests;

pub use encoder::{
    compute_digest, compute_digest_from_slice, hash_struct, message_type_hash, recover_signer,
    sign_digest, sign_execution_envelope, signer_address, signing_key_from_hex,
};
pub use errors::{CodecError, VerifyError};
pub use k256::ecdsa::SigningKey;
pub use types::{correlation_id_from_str, ExecutionEnvelope, RelayMessage, RelaySignature};
pub use verifier::{verify_envelope, SignerRegistry, VerifiedSigners};
