//! BBS+ signature and verification as per section 4.3 of the paper. Signature is in group G1 and public key in
//! group G2.
//!
//! A signer can sign messages it does not know, i.e. create a (partially) blind signature: the requester sends a
//! Pedersen commitment `h_0 * blinding + sum(h_i * m_i)` over the hidden messages, the signer signs the
//! commitment together with the known messages using [`SignatureG1::new_with_committed_messages`] and the
//! requester calls [`SignatureG1::unblind`] with its blinding to get a regular signature.

use crate::{
    error::BBSPlusError,
    setup::{PublicKeyG2, SecretKey, SignatureParamsG1},
};
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use ark_ff::{Field, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{collections::BTreeMap, rand::RngCore, UniformRand, Zero};
use ld_crypto_utils::{expect_equality, serde_utils::ArkObjectBytes};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// BBS+ signature created by the signer after signing a multi-message
#[serde_as]
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    CanonicalSerialize,
    CanonicalDeserialize,
    Serialize,
    Deserialize,
    Zeroize,
    ZeroizeOnDrop,
)]
pub struct SignatureG1<E: Pairing> {
    #[serde_as(as = "ArkObjectBytes")]
    pub A: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub e: E::ScalarField,
    #[serde_as(as = "ArkObjectBytes")]
    pub s: E::ScalarField,
}

impl<E: Pairing> SignatureG1<E> {
    /// Create a new signature with all messages known to the signer.
    pub fn new<R: RngCore>(
        rng: &mut R,
        messages: &[E::ScalarField],
        sk: &SecretKey<E::ScalarField>,
        params: &SignatureParamsG1<E>,
    ) -> Result<Self, BBSPlusError> {
        if messages.is_empty() {
            return Err(BBSPlusError::NoMessageToSign);
        }
        expect_equality!(
            messages.len(),
            params.supported_message_count(),
            BBSPlusError::MessageCountIncompatibleWithSigParams
        );
        let msg_map = messages.iter().enumerate().collect::<BTreeMap<_, _>>();
        // All messages are known so commitment is the zero element
        Self::new_with_committed_messages(rng, &E::G1Affine::zero(), msg_map, sk, params)
    }

    /// Create a new (partially) blind signature where some of the messages are hidden from the
    /// signer under the given commitment. `uncommitted_messages` is the map from message index
    /// to message. Eg if signer while signing a multi-message `[m_0, m_1, m_2]` only knows `m_1` and `m_2`
    /// while `m_0` is committed in `commitment` by the requester, `uncommitted_messages` is
    /// `(1 -> m_1), (2 -> m_2)`. The signer must have verified the requester's knowledge of the committed
    /// messages before calling this.
    pub fn new_with_committed_messages<R: RngCore>(
        rng: &mut R,
        commitment: &E::G1Affine,
        uncommitted_messages: BTreeMap<usize, &E::ScalarField>,
        sk: &SecretKey<E::ScalarField>,
        params: &SignatureParamsG1<E>,
    ) -> Result<Self, BBSPlusError> {
        if uncommitted_messages.is_empty() && commitment.is_zero() {
            return Err(BBSPlusError::NoMessageToSign);
        }
        if uncommitted_messages.len() > params.supported_message_count() {
            return Err(BBSPlusError::MessageCountIncompatibleWithSigParams(
                uncommitted_messages.len(),
                params.supported_message_count(),
            ));
        }

        let s = E::ScalarField::rand(rng);
        // b = g_1 + h_0 * s + sum(h_i * m_i) for all i in uncommitted_messages
        let b = params.b(uncommitted_messages, &s)?;

        let mut e = E::ScalarField::rand(rng);
        while (e + sk.0).is_zero() {
            e = E::ScalarField::rand(rng)
        }
        // 1/(e+x)
        let e_plus_x_inv = (e + sk.0)
            .inverse()
            .ok_or(BBSPlusError::CannotInvert0)?;

        // {commitment + b} * {1/(e+x)}
        let commitment_plus_b = (b + *commitment).into_affine();
        let A = commitment_plus_b.mul_bigint(e_plus_x_inv.into_bigint());
        Ok(Self {
            A: A.into_affine(),
            e,
            s,
        })
    }

    /// Checks that the elliptic curve point in the signature is non-zero
    pub fn is_non_zero(&self) -> bool {
        !self.A.is_zero()
    }

    /// Used to unblind a blind signature from signer
    pub fn unblind(&self, blinding: &E::ScalarField) -> Self {
        Self {
            A: self.A,
            e: self.e,
            s: self.s + blinding,
        }
    }

    /// Verify the validity of the signature. Assumes that the public key and parameters
    /// have been validated already.
    pub fn verify(
        &self,
        messages: &[E::ScalarField],
        pk: &PublicKeyG2<E>,
        params: &SignatureParamsG1<E>,
    ) -> Result<(), BBSPlusError> {
        if messages.is_empty() {
            return Err(BBSPlusError::NoMessageToSign);
        }
        expect_equality!(
            messages.len(),
            params.supported_message_count(),
            BBSPlusError::MessageCountIncompatibleWithSigParams
        );
        if !self.is_non_zero() {
            return Err(BBSPlusError::ZeroSignature);
        }
        let b = params.b(messages.iter().enumerate(), &self.s)?;
        // The pairing check is `e(A, pk + g2*e) == e(b, g2)` which can be written as `e(A, pk)*e(A*e - b, g2) == 1`.
        let Aeb = self.A.mul_bigint(self.e.into_bigint()) - b;
        if !E::multi_pairing([self.A, Aeb.into_affine()], [pk.0, params.g2]).is_zero() {
            return Err(BBSPlusError::InvalidSignature);
        }
        Ok(())
    }
}
