use alloy_primitives::{Address, B256};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use tracing::debug;

use crate::errors::CodecError;
use crate::types::{ExecutionEnvelope, RelayMessage, RelaySignature};

/// EIP-712 type string of the signed message (must match the diamond's `_MESSAGE_FEE_COLLECTOR_TYPEHASH`).
pub const MESSAGE_FEE_COLLECTOR_TYPE: &[u8] =
    b"MessageFeeCollector(address service,bytes data,uint256 salt,uint256 deadline,address feeToken)";

fn keccak256_bytes(bytes: &[u8]) -> B256 {
    let mut h = Keccak256::new();
    h.update(bytes);
    B256::from_slice(h.finalize().as_slice())
}

fn address_word(address: Address) -> [u8; 32] {
    let mut padded = [0u8; 32];
    padded[12..32].copy_from_slice(address.as_slice());
    padded
}

pub fn message_type_hash() -> B256 {
    keccak256_bytes(MESSAGE_FEE_COLLECTOR_TYPE)
}

/// `hashStruct(MessageFeeCollector)`; dynamic `data` is folded in as its keccak256.
pub fn hash_struct(msg: &RelayMessage) -> B256 {
    let mut struct_buf = Vec::with_capacity(32 * 6);
    struct_buf.extend_from_slice(message_type_hash().as_slice());
    struct_buf.extend_from_slice(&address_word(msg.service()));
    struct_buf.extend_from_slice(keccak256_bytes(msg.data()).as_slice());
    struct_buf.extend_from_slice(&msg.salt().to_be_bytes::<32>());
    struct_buf.extend_from_slice(&msg.deadline().to_be_bytes::<32>());
    struct_buf.extend_from_slice(&address_word(msg.fee_token()));
    keccak256_bytes(&struct_buf)
}

/// Compute the digest both signers sign: `keccak256("\x19\x01" || domainSeparator || hashStruct(msg))`.
pub fn compute_digest(msg: &RelayMessage, domain_separator: &B256) -> B256 {
    let struct_hash = hash_struct(msg);

    let mut final_buf = Vec::with_capacity(2 + 32 + 32);
    final_buf.extend_from_slice(b"\x19\x01");
    final_buf.extend_from_slice(domain_separator.as_slice());
    final_buf.extend_from_slice(struct_hash.as_slice());
    let digest = keccak256_bytes(&final_buf);

    debug!(%struct_hash, %digest, service = %msg.service(), "computed relay message digest");
    digest
}

/// Same as [`compute_digest`] for a domain separator of unchecked length.
pub fn compute_digest_from_slice(
    msg: &RelayMessage,
    domain_separator: &[u8],
) -> Result<B256, CodecError> {
    if domain_separator.len() != 32 {
        return Err(CodecError::InvalidDomainSeparator(domain_separator.len()));
    }
    Ok(compute_digest(msg, &B256::from_slice(domain_separator)))
}

/// Sign a 32-byte digest (RFC 6979 nonce, low-s) and return `r || s || v` with v in {27, 28}.
pub fn sign_digest(digest: &B256, signing_key: &SigningKey) -> Result<RelaySignature, CodecError> {
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(digest.as_slice())
        .map_err(|e| CodecError::SigningFailure(e.to_string()))?;
    let recovery = recovery_id.to_byte();
    if recovery > 1 {
        return Err(CodecError::SigningFailure(format!(
            "unsupported recovery id {recovery}"
        )));
    }
    let (r, s) = signature.split_bytes();

    Ok(RelaySignature {
        r: B256::from_slice(r.as_slice()),
        s: B256::from_slice(s.as_slice()),
        v: 27 + recovery,
    })
}

/// Recover the address that produced `signature` over `digest`.
pub fn recover_signer(digest: &B256, signature: &RelaySignature) -> Result<Address, CodecError> {
    let raw = signature.to_bytes();
    let sig = Signature::from_slice(&raw[..64])
        .map_err(|e| CodecError::InvalidSignature(e.to_string()))?;
    let recovery_id = RecoveryId::from_byte(signature.recovery_id()?)
        .ok_or_else(|| CodecError::InvalidSignature(format!("bad v {}", signature.v)))?;
    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id)
        .map_err(|e| CodecError::InvalidSignature(e.to_string()))?;
    Ok(verifying_key_address(&key))
}

pub fn signer_address(signing_key: &SigningKey) -> Address {
    verifying_key_address(signing_key.verifying_key())
}

fn verifying_key_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    // Skip the 0x04 SEC1 tag; the address is the low 20 bytes of keccak256(x || y).
    let hash = keccak256_bytes(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Parse a hex private key (with or without `0x`).
pub fn signing_key_from_hex(value: &str) -> Result<SigningKey, CodecError> {
    let raw = hex::decode(value.trim().trim_start_matches("0x"))
        .map_err(|_| CodecError::SigningFailure("private key is not valid hex".to_string()))?;
    if raw.len() != 32 {
        return Err(CodecError::SigningFailure(format!(
            "private key must be 32 bytes, got {}",
            raw.len()
        )));
    }
    SigningKey::from_slice(&raw)
        .map_err(|_| CodecError::SigningFailure("private key is not a valid secp256k1 scalar".to_string()))
}

/// Sign `msg` for both roles over a single digest and assemble the `execWithSigsFeeCollector` argument.
///
/// Returns the envelope together with the digest both signatures cover.
pub fn sign_execution_envelope(
    correlation_id: B256,
    msg: RelayMessage,
    domain_separator: &B256,
    executor_key: &SigningKey,
    checker_key: &SigningKey,
) -> Result<(ExecutionEnvelope, B256), CodecError> {
    let digest = compute_digest(&msg, domain_separator);
    let executor_signer_sig = sign_digest(&digest, executor_key)?;
    let checker_signer_sig = sign_digest(&digest, checker_key)?;

    debug!(
        %correlation_id,
        %digest,
        executor = %signer_address(executor_key),
        checker = %signer_address(checker_key),
        "signed relay envelope"
    );

    let envelope = ExecutionEnvelope {
        correlation_id,
        msg,
        executor_signer_sig,
        checker_signer_sig,
    };
    Ok((envelope, digest))
}
