#![cfg_attr(not(feature = "std"), no_std)]

//! Schnorr protocol to prove knowledge of 1 or more discrete logs in zero knowledge. Refer <https://crypto.stanford.edu/cs355/19sp/lec5.pdf>
//!
//! To prove knowledge of witnesses `x_1, x_2, ..., x_n` in `g_1 * x_1 + g_2 * x_2 + ... + g_n * x_n = y`:
//! 1. Prover picks blindings `r_i` and computes the commitment `t = g_1 * r_1 + ... + g_n * r_n` - [`SchnorrCommitment`]
//! 2. The challenge `c` is derived by hashing public values and `t` (Fiat-Shamir).
//! 3. Prover computes responses `s_i = r_i + c * x_i` - [`SchnorrResponse`]
//! 4. Verifier checks `g_1 * s_1 + ... + g_n * s_n - y * c == t`
//!
//! Using the same blinding for a witness in 2 different relations makes the responses equal, which
//! is how equality of witnesses across relations is proven.

use crate::error::SchnorrError;
use ark_ec::{AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{io::Write, vec::Vec};
use digest::Digest;
use ld_crypto_utils::{
    expect_equality, hashing_utils::field_elem_from_try_and_incr, serde_utils::ArkObjectBytes,
};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub mod discrete_log;
pub mod error;

/// Trait implemented by Schnorr-based protocols for returning their contribution to the overall challenge.
pub trait SchnorrChallengeContributor {
    fn challenge_contribution<W: Write>(&self, writer: W) -> Result<(), SchnorrError>;
}

/// Commitment to randomness during step 1 of the Schnorr protocol to prove knowledge of 1 or more discrete logs
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
pub struct SchnorrCommitment<G: AffineRepr> {
    /// Randomness. 1 per discrete log
    #[serde_as(as = "Vec<ArkObjectBytes>")]
    pub blindings: Vec<G::ScalarField>,
    /// The commitment to all the randomnesses
    #[zeroize(skip)]
    #[serde_as(as = "ArkObjectBytes")]
    pub t: G,
}

impl<G: AffineRepr> SchnorrCommitment<G> {
    /// Create commitment as `bases[0] * blindings[0] + bases[1] * blindings[1] + ... bases[i] * blindings[i]`
    /// for step-1 of the protocol. Extra `bases` or `blindings` are ignored.
    pub fn new(bases: &[G], blindings: Vec<G::ScalarField>) -> Self {
        let t = G::Group::msm_unchecked(bases, &blindings).into_affine();
        Self { blindings, t }
    }

    /// Create responses for each witness (discrete log) as `response[i] = self.blindings[i] + (witnesses[i] * challenge)`
    pub fn response(
        &self,
        witnesses: &[G::ScalarField],
        challenge: &G::ScalarField,
    ) -> Result<SchnorrResponse<G>, SchnorrError> {
        expect_equality!(
            self.blindings.len(),
            witnesses.len(),
            SchnorrError::ExpectedSameSizeSequences
        );

        #[cfg(feature = "parallel")]
        let responses = self
            .blindings
            .par_iter()
            .zip(witnesses.par_iter())
            .map(|(b, w)| *b + (*w * *challenge))
            .collect::<Vec<_>>();

        #[cfg(not(feature = "parallel"))]
        let responses = self
            .blindings
            .iter()
            .zip(witnesses.iter())
            .map(|(b, w)| *b + (*w * *challenge))
            .collect::<Vec<_>>();

        Ok(SchnorrResponse(responses))
    }
}

impl<G: AffineRepr> SchnorrChallengeContributor for SchnorrCommitment<G> {
    /// The commitment's contribution to the overall challenge of the protocol. The bases and `y`
    /// (`g_i` and `y` in `{g_i} * {x_i} = y`) are not included and must be added by the caller.
    fn challenge_contribution<W: Write>(&self, writer: W) -> Result<(), SchnorrError> {
        self.t.serialize_compressed(writer).map_err(|e| e.into())
    }
}

/// Response during step 3 of the Schnorr protocol to prove knowledge of 1 or more discrete logs
#[serde_as]
#[derive(
    Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct SchnorrResponse<G: AffineRepr>(
    #[serde_as(as = "Vec<ArkObjectBytes>")] pub Vec<G::ScalarField>,
);

impl<G: AffineRepr> SchnorrResponse<G> {
    /// Check if response is valid and thus validity of Schnorr proof
    /// `bases[0]*responses[0] + bases[1]*responses[1] + ... bases[i]*responses[i] - y*challenge == t`
    pub fn is_valid(
        &self,
        bases: &[G],
        y: &G,
        t: &G,
        challenge: &G::ScalarField,
    ) -> Result<(), SchnorrError> {
        expect_equality!(
            self.0.len(),
            bases.len(),
            SchnorrError::ExpectedSameSizeSequences
        );
        let mut points = bases.to_vec();
        let mut scalars = self.0.clone();
        points.push(*y);
        scalars.push(-*challenge);
        if G::Group::msm_unchecked(&points, &scalars).into_affine() == *t {
            Ok(())
        } else {
            Err(SchnorrError::InvalidResponse)
        }
    }

    /// Get response for the specified discrete log
    pub fn get_response(&self, idx: usize) -> Result<&G::ScalarField, SchnorrError> {
        self.0
            .get(idx)
            .ok_or(SchnorrError::IndexOutOfBounds(idx, self.0.len()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Uses try-and-increment. Vulnerable to side channel attacks.
pub fn compute_random_oracle_challenge<F: PrimeField, D: Digest>(challenge_bytes: &[u8]) -> F {
    field_elem_from_try_and_incr::<F, D>(challenge_bytes)
}
