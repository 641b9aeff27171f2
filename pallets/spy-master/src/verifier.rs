//! sr25519 certificate verifier.
//!
//! The prover runs the shared validator off-chain and signs the resulting
//! `CertifiedClaim` with a key the runtime trusts. Verification is a single
//! `sr25519_verify` host call over the claim's signing payload.

use core::marker::PhantomData;
use frame_support::traits::Get;
use sp_core::sr25519;
use spymaster_primitives::{CertificateVerifier, CertifiedClaim, SignedCertificate};

/// Accepts certificates signed by the prover key `K`.
pub struct Sr25519Verifier<K>(PhantomData<K>);

impl<K: Get<sr25519::Public>> CertificateVerifier<SignedCertificate> for Sr25519Verifier<K> {
    fn verify(certificate: &SignedCertificate) -> Option<CertifiedClaim> {
        let payload = certificate.claim.signing_payload();
        sp_io::crypto::sr25519_verify(&certificate.signature, &payload, &K::get())
            .then(|| certificate.claim.clone())
    }
}
