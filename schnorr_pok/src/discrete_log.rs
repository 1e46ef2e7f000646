//! Proof of knowledge of the 2 discrete logs opening a Pedersen commitment, i.e. given public `y`, `g1` and `g2`,
//! prove knowledge of `x1` and `x2` in `g1 * x1 + g2 * x2 = y`.
//!
//! This is the relation proven by a holder when requesting a blind signature over a secret: `x1` is the
//! secret and `x2` the blinding of the commitment `y`. A specialization of [`SchnorrCommitment`] that avoids
//! allocating vectors for the common 2-witness case.
//!
//! [`SchnorrCommitment`]: crate::SchnorrCommitment

use crate::error::SchnorrError;
use ark_ec::{AffineRepr, CurveGroup, VariableBaseMSM};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::io::Write;
use ld_crypto_utils::serde_utils::ArkObjectBytes;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Prover's state after committing to randomness. Holds the witnesses so is zeroized on drop.
#[serde_as]
#[derive(
    Clone,
    PartialEq,
    Eq,
    Debug,
    CanonicalSerialize,
    CanonicalDeserialize,
    Serialize,
    Deserialize,
    Zeroize,
    ZeroizeOnDrop,
)]
pub struct PokTwoDiscreteLogsProtocol<G: AffineRepr> {
    #[zeroize(skip)]
    #[serde_as(as = "ArkObjectBytes")]
    pub t: G,
    #[serde_as(as = "ArkObjectBytes")]
    secret: G::ScalarField,
    #[serde_as(as = "ArkObjectBytes")]
    secret_blinding: G::ScalarField,
    #[serde_as(as = "ArkObjectBytes")]
    opening: G::ScalarField,
    #[serde_as(as = "ArkObjectBytes")]
    opening_blinding: G::ScalarField,
}

/// Proof of knowledge of 2 discrete logs
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct PokTwoDiscreteLogs<G: AffineRepr> {
    #[serde_as(as = "ArkObjectBytes")]
    pub t: G,
    /// Response for the witness of `bases[0]`
    #[serde_as(as = "ArkObjectBytes")]
    pub response1: G::ScalarField,
    /// Response for the witness of `bases[1]`
    #[serde_as(as = "ArkObjectBytes")]
    pub response2: G::ScalarField,
}

impl<G: AffineRepr> PokTwoDiscreteLogsProtocol<G> {
    /// `witnesses[i]` is the discrete log w.r.t. `bases[i]`; `blindings[i]` its randomness.
    pub fn init(
        witnesses: [G::ScalarField; 2],
        blindings: [G::ScalarField; 2],
        bases: &[G; 2],
    ) -> Self {
        let t = G::Group::msm_unchecked(bases, &blindings).into_affine();
        Self {
            t,
            secret: witnesses[0],
            secret_blinding: blindings[0],
            opening: witnesses[1],
            opening_blinding: blindings[1],
        }
    }

    pub fn challenge_contribution<W: Write>(
        &self,
        bases: &[G; 2],
        y: &G,
        writer: W,
    ) -> Result<(), SchnorrError> {
        Self::compute_challenge_contribution(bases, y, &self.t, writer)
    }

    pub fn gen_proof(self, challenge: &G::ScalarField) -> PokTwoDiscreteLogs<G> {
        PokTwoDiscreteLogs {
            t: self.t,
            response1: self.secret_blinding + (self.secret * *challenge),
            response2: self.opening_blinding + (self.opening * *challenge),
        }
    }

    /// Bases, then `y`, then `t`, each in compressed form.
    pub fn compute_challenge_contribution<W: Write>(
        bases: &[G; 2],
        y: &G,
        t: &G,
        mut writer: W,
    ) -> Result<(), SchnorrError> {
        for b in bases {
            b.serialize_compressed(&mut writer)?;
        }
        y.serialize_compressed(&mut writer)?;
        t.serialize_compressed(&mut writer)?;
        Ok(())
    }
}

impl<G: AffineRepr> PokTwoDiscreteLogs<G> {
    pub fn challenge_contribution<W: Write>(
        &self,
        bases: &[G; 2],
        y: &G,
        writer: W,
    ) -> Result<(), SchnorrError> {
        PokTwoDiscreteLogsProtocol::compute_challenge_contribution(bases, y, &self.t, writer)
    }

    /// `bases[0]*response1 + bases[1]*response2 - y*challenge == t`
    pub fn verify(&self, y: &G, bases: &[G; 2], challenge: &G::ScalarField) -> bool {
        let points = [bases[0], bases[1], *y];
        let scalars = [self.response1, self.response2, -*challenge];
        G::Group::msm_unchecked(&points, &scalars).into_affine() == self.t
    }
}
