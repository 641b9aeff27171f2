//! Off-chain SpyMaster prover.
//!
//! Takes an agent record as it currently stands on-chain together with a
//! private message, runs the shared validator, and signs the resulting
//! `CertifiedClaim`. The message itself never leaves this process; only the
//! record (public input) and new message number (public output) are
//! revealed in the certificate.

use sp_core::{sr25519, Pair};
use spymaster_primitives::{
    validate, AgentId, AgentRecord, CertifiedClaim, Message, SignedCertificate, ValidationError,
};

/// Errors raised while producing a certificate.
#[derive(Debug, thiserror::Error)]
pub enum ProverError {
    /// The message fails the validator; no certificate is issued.
    #[error("message rejected: {0}")]
    Validation(#[from] ValidationError),
    /// The message names a different agent than the record it is checked
    /// against.
    #[error("message addressed to agent {message}, record belongs to agent {record}")]
    AgentMismatch { record: AgentId, message: AgentId },
    /// The secret URI could not be turned into a signing key.
    #[error("invalid secret URI: {0}")]
    InvalidSecretUri(String),
}

/// Holds the signing key whose public half the runtime trusts.
pub struct Prover {
    pair: sr25519::Pair,
}

impl Prover {
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self { pair: sr25519::Pair::from_seed(seed) }
    }

    /// Build from a secret URI such as `//Alice` or a mnemonic phrase.
    pub fn from_uri(suri: &str) -> Result<Self, ProverError> {
        sr25519::Pair::from_string(suri, None)
            .map(|pair| Self { pair })
            .map_err(|e| ProverError::InvalidSecretUri(format!("{e:?}")))
    }

    /// Key the runtime must be configured with to accept our certificates.
    pub fn public(&self) -> sr25519::Public {
        self.pair.public()
    }

    /// Validate `message` against `record` and certify the outcome.
    pub fn prove(
        &self,
        record: &AgentRecord,
        message: &Message,
    ) -> Result<SignedCertificate, ProverError> {
        if message.agent_id != record.agent_id {
            return Err(ProverError::AgentMismatch {
                record: record.agent_id,
                message: message.agent_id,
            });
        }
        let public_output = validate(record, message)?;
        let claim = CertifiedClaim { public_input: record.clone(), public_output };
        tracing::debug!(
            agent_id = record.agent_id,
            last_message = record.last_message,
            public_output,
            "certifying message"
        );
        Ok(self.sign(claim))
    }

    /// Sign an arbitrary claim without running the validator.
    ///
    /// Only useful for exercising verifier-side checks; an honest prover
    /// always goes through [`Prover::prove`].
    pub fn sign(&self, claim: CertifiedClaim) -> SignedCertificate {
        let signature = self.pair.sign(&claim.signing_payload());
        SignedCertificate { claim, signature }
    }
}

/// Check a certificate's signature against `public` off-chain.
pub fn verify_signature(certificate: &SignedCertificate, public: &sr25519::Public) -> bool {
    sr25519::Pair::verify(&certificate.signature, certificate.claim.signing_payload(), public)
}
