use alloy_primitives::{address, b256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolStruct};
use relay_types::IGelato;

use crate::{
    compute_digest, correlation_id_from_str, hash_struct, recover_signer, sign_digest,
    sign_execution_envelope, signer_address, signing_key_from_hex, verify_envelope, CodecError,
    ExecutionEnvelope, RelayMessage, SignerRegistry, SigningKey, VerifyError,
};

const EXEC_SIGNER_PK: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
const CHECKER_SIGNER_PK: &str = "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";
const EXEC_SIGNER: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
const CHECKER_SIGNER: Address = address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");

const SALT: u64 = 42069;
const DEADLINE: u64 = 2664381086;
// Block timestamp well before DEADLINE.
const NOW: u64 = 1_700_000_000;

fn executor_key() -> SigningKey {
    signing_key_from_hex(EXEC_SIGNER_PK).unwrap()
}

fn checker_key() -> SigningKey {
    signing_key_from_hex(CHECKER_SIGNER_PK).unwrap()
}

fn sample_message() -> RelayMessage {
    RelayMessage::new(
        Address::repeat_byte(0x11),
        Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
        U256::from(SALT),
        U256::from(DEADLINE),
        Address::repeat_byte(0xee),
    )
}

fn domain_separator() -> B256 {
    B256::repeat_byte(0x22)
}

fn registry() -> SignerRegistry {
    let mut registry = SignerRegistry::new();
    registry.add_executor_signers(&[EXEC_SIGNER]);
    registry.add_checker_signers(&[CHECKER_SIGNER]);
    registry
}

fn signed_envelope(msg: RelayMessage) -> ExecutionEnvelope {
    let (envelope, _) = sign_execution_envelope(
        correlation_id_from_str("CORRELATION_ID").unwrap(),
        msg,
        &domain_separator(),
        &executor_key(),
        &checker_key(),
    )
    .unwrap();
    envelope
}

#[test]
fn test_known_signer_addresses() {
    assert_eq!(signer_address(&executor_key()), EXEC_SIGNER);
    assert_eq!(signer_address(&checker_key()), CHECKER_SIGNER);
}

#[test]
fn test_digest_golden_vectors() {
    let msg = sample_message();
    assert_eq!(
        hash_struct(&msg),
        b256!("8c51057cb3ce7dea509b5b8b06976f4752bb61a138844df25688b5b3fbca1eee")
    );
    assert_eq!(
        compute_digest(&msg, &domain_separator()),
        b256!("950ca120f690c5f38c81e9aaabb58168c9b7e6ab4391a5694b4b13c9311087b7")
    );

    let empty = RelayMessage::new(
        Address::repeat_byte(0x11),
        Bytes::new(),
        U256::ZERO,
        U256::ZERO,
        Address::repeat_byte(0xee),
    );
    assert_eq!(
        compute_digest(&empty, &B256::ZERO),
        b256!("a2fe931915bf3cd75a09feff3f608c45582c64ab300e9048667ce626f27571bf")
    );
}

#[test]
fn test_struct_hash_matches_sol_types() {
    let msg = sample_message();
    assert_eq!(hash_struct(&msg), msg.to_abi().eip712_hash_struct());

    let large = RelayMessage::new(
        address!("3AC05161b76a35c1c28dC99Aa01BEd7B24cEA3bf"),
        vec![0x5au8; 100_000],
        U256::MAX,
        U256::MAX,
        Address::ZERO,
    );
    assert_eq!(hash_struct(&large), large.to_abi().eip712_hash_struct());
}

#[test]
fn test_digest_is_idempotent() {
    let msg = sample_message();
    assert_eq!(
        compute_digest(&msg, &domain_separator()),
        compute_digest(&msg.clone(), &domain_separator())
    );
}

#[test]
fn test_single_field_changes_alter_digest() {
    let base = sample_message();
    let ds = domain_separator();
    let reference = compute_digest(&base, &ds);

    let variants = [
        RelayMessage::new(
            Address::repeat_byte(0x12),
            base.data().clone(),
            base.salt(),
            base.deadline(),
            base.fee_token(),
        ),
        RelayMessage::new(
            base.service(),
            Bytes::from_static(&[0xde, 0xad, 0xbe, 0xee]),
            base.salt(),
            base.deadline(),
            base.fee_token(),
        ),
        base.with_salt(U256::from(SALT + 1)),
        base.with_deadline(U256::from(DEADLINE + 1)),
        RelayMessage::new(
            base.service(),
            base.data().clone(),
            base.salt(),
            base.deadline(),
            Address::repeat_byte(0xef),
        ),
    ];

    let mut seen = vec![reference];
    for variant in &variants {
        let digest = compute_digest(variant, &ds);
        assert!(!seen.contains(&digest), "collision for {variant:?}");
        seen.push(digest);
    }
}

#[test]
fn test_domain_separation() {
    let msg = sample_message();
    let a = compute_digest(&msg, &B256::repeat_byte(0x22));
    let b = compute_digest(&msg, &B256::repeat_byte(0x23));
    assert_ne!(a, b);
}

#[test]
fn test_empty_and_large_data() {
    let ds = domain_separator();
    let empty = RelayMessage::new(Address::ZERO, Bytes::new(), U256::ZERO, U256::ZERO, Address::ZERO);
    let large = RelayMessage::new(
        Address::ZERO,
        vec![0u8; 1 << 20],
        U256::ZERO,
        U256::ZERO,
        Address::ZERO,
    );
    assert_ne!(compute_digest(&empty, &ds), compute_digest(&large, &ds));

    // A trailing byte must not be truncated away.
    let mut longer = vec![0u8; 1 << 20];
    longer.push(0);
    let longer = RelayMessage::new(Address::ZERO, longer, U256::ZERO, U256::ZERO, Address::ZERO);
    assert_ne!(compute_digest(&large, &ds), compute_digest(&longer, &ds));
}

#[test]
fn test_sign_and_recover() {
    let digest = compute_digest(&sample_message(), &domain_separator());
    for (key, expected) in [(executor_key(), EXEC_SIGNER), (checker_key(), CHECKER_SIGNER)] {
        let sig = sign_digest(&digest, &key).unwrap();
        assert_eq!(recover_signer(&digest, &sig).unwrap(), expected);
    }
}

#[test]
fn test_both_signatures_cover_the_same_digest() {
    let envelope = signed_envelope(sample_message());
    let digest = compute_digest(&envelope.msg, &domain_separator());
    assert_eq!(
        recover_signer(&digest, &envelope.executor_signer_sig).unwrap(),
        EXEC_SIGNER
    );
    assert_eq!(
        recover_signer(&digest, &envelope.checker_signer_sig).unwrap(),
        CHECKER_SIGNER
    );
}

#[test]
fn test_returned_digest_is_the_signed_one() {
    let (envelope, digest) = sign_execution_envelope(
        B256::ZERO,
        sample_message(),
        &domain_separator(),
        &executor_key(),
        &checker_key(),
    )
    .unwrap();
    assert_eq!(digest, compute_digest(&envelope.msg, &domain_separator()));
    assert_eq!(
        recover_signer(&digest, &envelope.checker_signer_sig).unwrap(),
        CHECKER_SIGNER
    );
}

#[test]
fn test_valid_envelope_is_accepted() {
    let envelope = signed_envelope(sample_message());
    let verified = verify_envelope(&envelope, &domain_separator(), &registry(), NOW).unwrap();
    assert_eq!(verified.executor, EXEC_SIGNER);
    assert_eq!(verified.checker, CHECKER_SIGNER);
    assert_eq!(verified.digest, compute_digest(&envelope.msg, &domain_separator()));
}

#[test]
fn test_correlation_id_is_not_signed() {
    let mut envelope = signed_envelope(sample_message());
    envelope.correlation_id = B256::repeat_byte(0x99);
    assert!(verify_envelope(&envelope, &domain_separator(), &registry(), NOW).is_ok());
}

#[test]
fn test_tampered_salt_is_rejected() {
    let mut envelope = signed_envelope(sample_message());
    envelope.msg = envelope.msg.with_salt(U256::from(SALT + 1));

    // Recovery yields some other address, which is not registered.
    let err = verify_envelope(&envelope, &domain_separator(), &registry(), NOW).unwrap_err();
    assert!(matches!(
        err,
        VerifyError::InvalidExecutorSigner(addr) if addr != EXEC_SIGNER
    ));
}

#[test]
fn test_other_domain_is_rejected() {
    let envelope = signed_envelope(sample_message());
    let err = verify_envelope(&envelope, &B256::repeat_byte(0x33), &registry(), NOW).unwrap_err();
    assert!(matches!(err, VerifyError::InvalidExecutorSigner(_)));
}

#[test]
fn test_swapped_roles_are_rejected() {
    let mut envelope = signed_envelope(sample_message());
    std::mem::swap(
        &mut envelope.executor_signer_sig,
        &mut envelope.checker_signer_sig,
    );
    let err = verify_envelope(&envelope, &domain_separator(), &registry(), NOW).unwrap_err();
    assert_eq!(err, VerifyError::InvalidExecutorSigner(CHECKER_SIGNER));
}

#[test]
fn test_unregistered_checker_is_rejected() {
    let envelope = signed_envelope(sample_message());
    let mut registry = SignerRegistry::new();
    registry.add_executor_signers(&[EXEC_SIGNER]);
    let err = verify_envelope(&envelope, &domain_separator(), &registry, NOW).unwrap_err();
    assert_eq!(err, VerifyError::InvalidCheckerSigner(CHECKER_SIGNER));
}

#[test]
fn test_expired_deadline_is_rejected() {
    let envelope = signed_envelope(sample_message());
    let err =
        verify_envelope(&envelope, &domain_separator(), &registry(), DEADLINE + 1).unwrap_err();
    assert_eq!(
        err,
        VerifyError::DeadlineExpired {
            deadline: U256::from(DEADLINE),
            now: DEADLINE + 1
        }
    );
    // The deadline itself is still valid.
    assert!(verify_envelope(&envelope, &domain_separator(), &registry(), DEADLINE).is_ok());
}

#[test]
fn test_raw_recovery_id_in_v_is_accepted() {
    let mut envelope = signed_envelope(sample_message());
    envelope.executor_signer_sig.v -= 27;
    envelope.checker_signer_sig.v -= 27;
    let verified = verify_envelope(&envelope, &domain_separator(), &registry(), NOW).unwrap();
    assert_eq!(verified.executor, EXEC_SIGNER);
    assert_eq!(verified.checker, CHECKER_SIGNER);
}

#[test]
fn test_out_of_range_v_is_rejected() {
    for v in [2u8, 26, 29, 255] {
        let mut envelope = signed_envelope(sample_message());
        envelope.executor_signer_sig.v = v;
        let err = verify_envelope(&envelope, &domain_separator(), &registry(), NOW).unwrap_err();
        assert!(matches!(
            err,
            VerifyError::Codec(CodecError::InvalidSignature(_))
        ));
    }
}

#[test]
fn test_malformed_signature_is_reported() {
    let mut envelope = signed_envelope(sample_message());
    envelope.executor_signer_sig.r = B256::ZERO;
    let err = verify_envelope(&envelope, &domain_separator(), &registry(), NOW).unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Codec(CodecError::InvalidSignature(_))
    ));
}

#[test]
fn test_exec_calldata_round_trips_through_abi() {
    let envelope = signed_envelope(sample_message());
    let calldata = envelope.exec_calldata();
    assert_eq!(
        &calldata[..4],
        IGelato::execWithSigsFeeCollectorCall::SELECTOR.as_slice()
    );

    let decoded = IGelato::execWithSigsFeeCollectorCall::abi_decode(&calldata, true).unwrap();
    assert_eq!(decoded._call, envelope.to_abi());
    assert_eq!(decoded._call.executorSignerSig.len(), 65);
}

#[test]
fn test_envelope_json_shape() {
    let envelope = signed_envelope(sample_message());
    let json = serde_json::to_value(&envelope).unwrap();
    assert!(json.get("correlationId").is_some());
    assert!(json["msg"].get("feeToken").is_some());
    let sig = json["executorSignerSig"].as_str().unwrap();
    assert_eq!(sig.len(), 2 + 130);

    let back: ExecutionEnvelope = serde_json::from_value(json).unwrap();
    assert_eq!(back, envelope);
}
