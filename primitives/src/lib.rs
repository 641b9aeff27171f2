//! SpyMaster shared primitive types.
//!
//! Both the on-chain pallet and the off-chain prover import from this crate.
//! The message validator lives here so that the two sides enforce exactly
//! the same rules: a certificate is only as trustworthy as the prover's copy
//! of `validate`, and that copy is this one.
//!
//! ## Contents
//! - Agent, message and provenance data types
//! - `validate`: the three message rules, applied in fixed order
//! - Pure state transitions used by the directory (`register`,
//!   `apply_message`, `bind_claim`)
//! - Certificate claims and the `CertificateVerifier` capability
//! - `AgentDirectoryInterface` for cross-pallet queries

#![cfg_attr(not(feature = "std"), no_std)]

use codec::{Decode, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_core::{sr25519, ConstU32};
use sp_runtime::BoundedVec;

// ============================================================
// Core identifiers
// ============================================================

/// Unique key of an agent in the directory.
pub type AgentId = u64;

/// Strictly increasing per-agent counter used for replay protection.
pub type MessageNumber = u64;

/// One scalar symbol of a security code or message body.
pub type Symbol = u8;

/// Exact number of symbols an accepted message body carries.
pub const MESSAGE_BODY_LEN: u32 = 12;

/// Decode-time bound on a message body. Bodies up to this size are
/// accepted on the wire so the length rule can reject them explicitly.
pub const MAX_MESSAGE_BODY_LEN: u32 = 64;

/// Message payload. Variable-length on the wire, validated to exactly
/// `MESSAGE_BODY_LEN` symbols.
pub type MessageBody = BoundedVec<Symbol, ConstU32<MAX_MESSAGE_BODY_LEN>>;

// ============================================================
// Agents and messages
// ============================================================

/// Shared secret between the registry and an agent.
#[derive(
    Clone, Copy, PartialEq, Eq, Default,
    Encode, Decode, MaxEncodedLen, TypeInfo, Debug,
)]
pub struct SecurityCode {
    pub char0: Symbol,
    pub char1: Symbol,
}

impl SecurityCode {
    pub const fn new(char0: Symbol, char1: Symbol) -> Self {
        Self { char0, char1 }
    }

    /// Both symbols must match; there is no partial credit.
    pub fn matches(&self, other: &SecurityCode) -> bool {
        self.char0 == other.char0 && self.char1 == other.char1
    }
}

impl From<(Symbol, Symbol)> for SecurityCode {
    fn from((char0, char1): (Symbol, Symbol)) -> Self {
        Self::new(char0, char1)
    }
}

/// Directory entry for a registered agent.
#[derive(
    Clone, PartialEq, Eq,
    Encode, Decode, MaxEncodedLen, TypeInfo, Debug,
)]
pub struct AgentRecord {
    pub agent_id: AgentId,
    /// Highest message number accepted so far. Zero right after registration.
    pub last_message: MessageNumber,
    pub security_code: SecurityCode,
}

impl AgentRecord {
    /// A freshly registered record.
    pub fn registered(agent_id: AgentId, security_code: SecurityCode) -> Self {
        Self { agent_id, last_message: 0, security_code }
    }

    fn with_last_message(&self, last_message: MessageNumber) -> Self {
        Self { last_message, ..self.clone() }
    }
}

/// A message submitted by (or on behalf of) an agent. Never persisted.
#[derive(
    Clone, PartialEq, Eq,
    Encode, Decode, MaxEncodedLen, TypeInfo, Debug,
)]
pub struct Message {
    pub message_number: MessageNumber,
    pub agent_id: AgentId,
    pub body: MessageBody,
    pub security_code: SecurityCode,
}

/// Provenance of an accepted state transition.
///
/// Built once by the host at the start of a call and threaded explicitly
/// into the transition, never read from ambient state halfway through.
#[derive(
    Clone, PartialEq, Eq,
    Encode, Decode, MaxEncodedLen, TypeInfo, Debug,
)]
pub struct BlockInfo<BlockNumber, AccountId, Nonce> {
    pub block_height: BlockNumber,
    pub transaction_sender: AccountId,
    pub sender_nonce: Nonce,
}

/// Which transitions the block-info indexer records.
#[derive(
    Clone, Copy, PartialEq, Eq,
    Encode, Decode, MaxEncodedLen, TypeInfo, Debug,
)]
pub enum ProvenanceMode {
    /// Only certified updates are indexed by height. Registration still
    /// restamps the agent's forward entry.
    CertifiedOnly,
    /// Direct messages are indexed the same way certified updates are.
    AllTransitions,
}

impl Default for ProvenanceMode {
    fn default() -> Self {
        Self::CertifiedOnly
    }
}

impl ProvenanceMode {
    pub fn tracks_direct_updates(&self) -> bool {
        matches!(self, Self::AllTransitions)
    }
}

// ============================================================
// Message validation
// ============================================================

/// Why a message was rejected. Variants are listed in check order.
#[derive(
    Clone, Copy, PartialEq, Eq,
    Encode, Decode, MaxEncodedLen, TypeInfo, Debug,
)]
pub enum ValidationError {
    CredentialMismatch,
    InvalidLength,
    StaleOrReplayed,
}

impl ValidationError {
    /// Fixed status string surfaced to callers.
    pub fn description(&self) -> &'static str {
        match self {
            Self::CredentialMismatch => "Security code does not match",
            Self::InvalidLength => "Message length is not 12 characters",
            Self::StaleOrReplayed => {
                "Message number is not greater than the last message number"
            }
        }
    }
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ValidationError {}

/// Validate `message` against `record`.
///
/// Checks run in a fixed order and the first failure wins:
/// 1. the security code matches symbol for symbol,
/// 2. the body is exactly `MESSAGE_BODY_LEN` symbols,
/// 3. the message number is strictly greater than `record.last_message`.
///
/// Returns the message number that becomes the new `last_message`.
pub fn validate(record: &AgentRecord, message: &Message) -> Result<MessageNumber, ValidationError> {
    if !record.security_code.matches(&message.security_code) {
        return Err(ValidationError::CredentialMismatch);
    }
    if message.body.len() != MESSAGE_BODY_LEN as usize {
        return Err(ValidationError::InvalidLength);
    }
    if message.message_number <= record.last_message {
        return Err(ValidationError::StaleOrReplayed);
    }
    Ok(message.message_number)
}

// ============================================================
// Directory transitions
// ============================================================

/// Registration always yields a fresh record, overwriting whatever existed.
pub fn register(agent_id: AgentId, security_code: SecurityCode) -> AgentRecord {
    AgentRecord::registered(agent_id, security_code)
}

/// Direct update: the record after `message` is accepted.
pub fn apply_message(record: &AgentRecord, message: &Message) -> Result<AgentRecord, ValidationError> {
    validate(record, message).map(|next| record.with_last_message(next))
}

// ============================================================
// Certificates
// ============================================================

/// Domain separator mixed into every certificate payload.
pub const CERTIFICATE_CONTEXT: &[u8] = b"spymaster/message-certificate/v1";

/// What a verified certificate attests: running `validate` on
/// `public_input` and some private message produced `public_output`.
#[derive(
    Clone, PartialEq, Eq,
    Encode, Decode, MaxEncodedLen, TypeInfo, Debug,
)]
pub struct CertifiedClaim {
    pub public_input: AgentRecord,
    pub public_output: MessageNumber,
}

impl CertifiedClaim {
    /// 32-byte digest the prover signs.
    pub fn signing_payload(&self) -> [u8; 32] {
        sp_core::hashing::blake2_256(&(CERTIFICATE_CONTEXT, self).encode())
    }
}

/// Certificate format understood by the bundled sr25519 verifier.
#[derive(Clone, PartialEq, Eq, Encode, Decode, TypeInfo, Debug)]
pub struct SignedCertificate {
    pub claim: CertifiedClaim,
    pub signature: sr25519::Signature,
}

/// Capability for checking detached certificates.
///
/// Returns the claim the certificate proves, or `None` if the certificate
/// does not verify. Implementors never look at the directory.
pub trait CertificateVerifier<Certificate> {
    fn verify(certificate: &Certificate) -> Option<CertifiedClaim>;
}

/// Why a verified claim could not be committed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CertificateRejection {
    /// The claim was proven against a record that is no longer current.
    StaleInput,
    /// The claimed output does not advance the counter.
    NonAdvancing,
}

/// Certified update: bind a verified claim to the live record.
///
/// The public input must equal the live record exactly, otherwise a
/// certificate produced earlier could be replayed after the record moved on.
pub fn bind_claim(live: &AgentRecord, claim: &CertifiedClaim) -> Result<AgentRecord, CertificateRejection> {
    if claim.public_input != *live {
        return Err(CertificateRejection::StaleInput);
    }
    if claim.public_output <= live.last_message {
        return Err(CertificateRejection::NonAdvancing);
    }
    Ok(live.with_last_message(claim.public_output))
}

// ============================================================
// Cross-pallet interface
// ============================================================

/// Read access to the agent directory for other pallets.
pub trait AgentDirectoryInterface<BlockNumber> {
    fn is_registered(agent_id: AgentId) -> bool;
    fn last_message(agent_id: AgentId) -> Option<MessageNumber>;
    fn agent_at_height(height: BlockNumber) -> Option<AgentId>;
}
