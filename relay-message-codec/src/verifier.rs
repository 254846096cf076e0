//! Off-chain mirror of the diamond's `execWithSigsFeeCollector` signature checks.
//!
//! Lets callers reject an envelope before paying for a reverted transaction. Salt replay
//! tracking stays with the on-chain contract and is not reproduced here.

use std::collections::BTreeSet;

use alloy_primitives::{Address, B256, U256};
use tracing::debug;

use crate::{
    encoder::{compute_digest, recover_signer},
    errors::VerifyError,
    types::ExecutionEnvelope,
};

/// Executor and checker signer sets (`addExecutorSigners` / `addCheckerSigners`).
#[derive(Clone, Debug, Default)]
pub struct SignerRegistry {
    executor_signers: BTreeSet<Address>,
    checker_signers: BTreeSet<Address>,
}

impl SignerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_executor_signers(&mut self, signers: &[Address]) {
        self.executor_signers.extend(signers.iter().copied());
    }

    pub fn add_checker_signers(&mut self, signers: &[Address]) {
        self.checker_signers.extend(signers.iter().copied());
    }

    pub fn remove_executor_signers(&mut self, signers: &[Address]) {
        for signer in signers {
            self.executor_signers.remove(signer);
        }
    }

    pub fn remove_checker_signers(&mut self, signers: &[Address]) {
        for signer in signers {
            self.checker_signers.remove(signer);
        }
    }

    pub fn is_executor_signer(&self, signer: &Address) -> bool {
        self.executor_signers.contains(signer)
    }

    pub fn is_checker_signer(&self, signer: &Address) -> bool {
        self.checker_signers.contains(signer)
    }
}

/// Outcome of a successful verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifiedSigners {
    pub digest: B256,
    pub executor: Address,
    pub checker: Address,
}

/// Check an envelope the way the verifying contract does.
///
/// The digest is always recomputed from `envelope.msg`; `now` is the block timestamp the
/// envelope would execute at.
pub fn verify_envelope(
    envelope: &ExecutionEnvelope,
    domain_separator: &B256,
    registry: &SignerRegistry,
    now: u64,
) -> Result<VerifiedSigners, VerifyError> {
    let deadline = envelope.msg.deadline();
    if deadline < U256::from(now) {
        return Err(VerifyError::DeadlineExpired { deadline, now });
    }

    let digest = compute_digest(&envelope.msg, domain_separator);

    let executor = recover_signer(&digest, &envelope.executor_signer_sig)?;
    if !registry.is_executor_signer(&executor) {
        debug!(%executor, %digest, "executor signature from unregistered signer");
        return Err(VerifyError::InvalidExecutorSigner(executor));
    }

    let checker = recover_signer(&digest, &envelope.checker_signer_sig)?;
    if !registry.is_checker_signer(&checker) {
        debug!(%checker, %digest, "checker signature from unregistered signer");
        return Err(VerifyError::InvalidCheckerSigner(checker));
    }

    Ok(VerifiedSigners {
        digest,
        executor,
        checker,
    })
}
