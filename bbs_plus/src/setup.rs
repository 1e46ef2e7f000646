//! Keys and setup parameters
//!
//! Parameters are either generated by hashing a public label, so that nobody knows the discrete log of any
//! generator w.r.t. another, or randomly for tests. Generators derived from a label are prefix-stable: the `i`th
//! message generator only depends on the label and `i`, so params for a longer multi-message extend those for a
//! shorter one.

use crate::error::BBSPlusError;
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{cfg_into_iter, cfg_iter, rand::RngCore, vec::Vec, UniformRand};
use digest::Digest;
use ld_crypto_utils::{
    concat_slices, hashing_utils::affine_group_elem_from_try_and_incr,
    serde_utils::ArkObjectBytes,
};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Secret key used by the signer to sign messages
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
pub struct SecretKey<F: PrimeField>(#[serde_as(as = "ArkObjectBytes")] pub F);

impl<F: PrimeField> SecretKey<F> {
    pub fn generate_using_rng<R: RngCore>(rng: &mut R) -> Self {
        Self(F::rand(rng))
    }
}

/// Signature params used while signing and verifying. Also used when proving knowledge of signature.
/// Size of parameters is proportional to the number of messages
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct SignatureParamsG1<E: Pairing> {
    #[serde_as(as = "ArkObjectBytes")]
    pub g1: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub g2: E::G2Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub h_0: E::G1Affine,
    /// Vector of size same as the size of multi-message that needs to be signed.
    #[serde_as(as = "Vec<ArkObjectBytes>")]
    pub h: Vec<E::G1Affine>,
}

/// Public key of the signer. The signer can use the same public key with params of different sizes as long as
/// they share `g2`.
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct PublicKeyG2<E: Pairing>(#[serde_as(as = "ArkObjectBytes")] pub E::G2Affine);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct KeypairG2<E: Pairing> {
    pub secret_key: SecretKey<E::ScalarField>,
    pub public_key: PublicKeyG2<E>,
}

/// Hash `label : h_{i}` to the `i`th message generator. `h_0` is the generator for the blinding `s`.
fn message_generator<E: Pairing, D: Digest>(label: &[u8], i: u64) -> E::G1Affine {
    affine_group_elem_from_try_and_incr::<E::G1Affine, D>(&concat_slices!(
        label,
        b" : h_",
        i.to_le_bytes()
    ))
}

impl<E: Pairing> SignatureParamsG1<E> {
    /// Generate params by hashing a known string. The hash function is vulnerable to timing
    /// attack but since all this is public knowledge, it is fine.
    pub fn new<D: Digest>(label: &[u8], n: usize) -> Self {
        let g1 =
            affine_group_elem_from_try_and_incr::<E::G1Affine, D>(&concat_slices!(label, b" : g1"));
        let g2 =
            affine_group_elem_from_try_and_incr::<E::G2Affine, D>(&concat_slices!(label, b" : g2"));
        let h_0 = message_generator::<E, D>(label, 0);
        let h = cfg_into_iter!(1..=n as u64)
            .map(|i| message_generator::<E, D>(label, i))
            .collect::<Vec<_>>();
        Self { g1, g2, h_0, h }
    }

    /// Params for a multi-message of size `n` using the same label as `self` was created with. Generators already
    /// present are reused and only the missing ones are hashed.
    pub fn resized<D: Digest>(&self, label: &[u8], n: usize) -> Self {
        let mut h = Vec::with_capacity(n);
        h.extend_from_slice(&self.h[..n.min(self.h.len())]);
        let start = h.len() as u64 + 1;
        let extra = cfg_into_iter!(start..=n as u64)
            .map(|i| message_generator::<E, D>(label, i))
            .collect::<Vec<_>>();
        h.extend(extra);
        Self {
            g1: self.g1,
            g2: self.g2,
            h_0: self.h_0,
            h,
        }
    }

    /// Generate params using a random number generator
    pub fn generate_using_rng<R: RngCore>(rng: &mut R, n: usize) -> Self {
        let h = (0..n).map(|_| E::G1::rand(rng)).collect::<Vec<_>>();
        Self {
            g1: E::G1::rand(rng).into_affine(),
            g2: E::G2::rand(rng).into_affine(),
            h_0: E::G1::rand(rng).into_affine(),
            h: E::G1::normalize_batch(&h),
        }
    }

    /// Check if no group element is zero
    pub fn is_valid(&self) -> bool {
        !(self.g1.is_zero()
            || self.g2.is_zero()
            || self.h_0.is_zero()
            || cfg_iter!(self.h).any(|v| v.is_zero()))
    }

    /// Number of messages in the multi-message these params sign
    pub fn supported_message_count(&self) -> usize {
        self.h.len()
    }

    /// Commit to given messages using the parameters and the given blinding as a Pedersen commitment.
    /// Eg. if given messages `m_i`, `m_j`, and `m_k` in the map, the commitment is
    /// `h_0 * blinding + h_i * m_i + h_j * m_j + h_k * m_k`
    pub fn commit_to_messages<'a>(
        &self,
        messages: impl IntoIterator<Item = (usize, &'a E::ScalarField)>,
        blinding: &E::ScalarField,
    ) -> Result<E::G1Affine, BBSPlusError> {
        let (mut bases, mut scalars) = self.bases_and_messages(messages)?;
        bases.push(self.h_0);
        scalars.push(*blinding);
        Ok(E::G1::msm_unchecked(&bases, &scalars).into_affine())
    }

    /// Compute `b` from the paper. Commits to the given messages and adds `self.g1` to it
    /// `b = g_1 + h_0 * s + sum(h_i * m_i)` for all indices `i` given.
    pub fn b<'a>(
        &self,
        messages: impl IntoIterator<Item = (usize, &'a E::ScalarField)>,
        s: &E::ScalarField,
    ) -> Result<E::G1, BBSPlusError> {
        let commitment = self.commit_to_messages(messages, s)?;
        Ok(commitment.into_group() + self.g1)
    }

    fn bases_and_messages<'a>(
        &self,
        messages: impl IntoIterator<Item = (usize, &'a E::ScalarField)>,
    ) -> Result<(Vec<E::G1Affine>, Vec<E::ScalarField>), BBSPlusError> {
        let mut bases = Vec::new();
        let mut scalars = Vec::new();
        for (i, msg) in messages {
            let base = self
                .h
                .get(i)
                .ok_or(BBSPlusError::InvalidMessageIdx(i))?;
            bases.push(*base);
            scalars.push(*msg);
        }
        Ok((bases, scalars))
    }
}

impl<E: Pairing> PublicKeyG2<E> {
    /// Generate public key from given secret key and signature parameters as `g2 * sk`
    pub fn generate_using_secret_key(
        secret_key: &SecretKey<E::ScalarField>,
        params: &SignatureParamsG1<E>,
    ) -> Self {
        Self(params.g2.mul_bigint(secret_key.0.into_bigint()).into_affine())
    }

    /// Public key shouldn't be 0
    pub fn is_valid(&self) -> bool {
        !self.0.is_zero()
    }
}

impl<E: Pairing> KeypairG2<E> {
    pub fn generate_using_rng<R: RngCore>(rng: &mut R, params: &SignatureParamsG1<E>) -> Self {
        let secret_key = SecretKey::generate_using_rng(rng);
        Self::generate_using_secret_key(secret_key, params)
    }

    pub fn generate_using_secret_key(
        secret_key: SecretKey<E::ScalarField>,
        params: &SignatureParamsG1<E>,
    ) -> Self {
        let public_key = PublicKeyG2::generate_using_secret_key(&secret_key, params);
        Self {
            secret_key,
            public_key,
        }
    }
}
