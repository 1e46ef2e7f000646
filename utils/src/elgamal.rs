//! Elgamal encryption of group elements. Encryption is randomized so that 2 ciphertexts of the
//! same message cannot be linked without the secret key.

use crate::serde_utils::ArkObjectBytes;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{ops::Neg, rand::RngCore, UniformRand};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[serde_as]
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Zeroize,
    ZeroizeOnDrop,
    CanonicalSerialize,
    CanonicalDeserialize,
    Serialize,
    Deserialize,
)]
pub struct SecretKey<F: PrimeField>(#[serde_as(as = "ArkObjectBytes")] pub F);

#[serde_as]
#[derive(
    Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct PublicKey<G: AffineRepr>(#[serde_as(as = "ArkObjectBytes")] pub G);

impl<F: PrimeField> SecretKey<F> {
    pub fn new<R: RngCore>(rng: &mut R) -> Self {
        Self(F::rand(rng))
    }
}

impl<G: AffineRepr> PublicKey<G> {
    pub fn new(secret_key: &SecretKey<G::ScalarField>, gen: &G) -> Self {
        Self(gen.mul_bigint(secret_key.0.into_bigint()).into_affine())
    }

    pub fn is_valid(&self) -> bool {
        !self.0.is_zero()
    }
}

pub fn keygen<R: RngCore, G: AffineRepr>(
    rng: &mut R,
    gen: &G,
) -> (SecretKey<G::ScalarField>, PublicKey<G>) {
    let sk = SecretKey::new(rng);
    let pk = PublicKey::new(&sk, gen);
    (sk, pk)
}

/// Elgamal encryption of a group element `m`
#[serde_as]
#[derive(
    Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct Ciphertext<G: AffineRepr> {
    /// `m + r * pk`
    #[serde_as(as = "ArkObjectBytes")]
    pub enc1: G,
    /// Ephemeral public key `r * gen`
    #[serde_as(as = "ArkObjectBytes")]
    pub enc2: G,
}

impl<G: AffineRepr> Ciphertext<G> {
    /// Returns the ciphertext and the randomness used for encryption
    pub fn new<R: RngCore>(
        rng: &mut R,
        msg: &G,
        public_key: &G,
        gen: &G,
    ) -> (Self, G::ScalarField) {
        let r = G::ScalarField::rand(rng);
        (Self::new_given_randomness(msg, &r, public_key, gen), r)
    }

    pub fn new_given_randomness(
        msg: &G,
        randomness: &G::ScalarField,
        public_key: &G,
        gen: &G,
    ) -> Self {
        let r = randomness.into_bigint();
        Self {
            enc1: (public_key.mul_bigint(r) + msg).into_affine(),
            enc2: gen.mul_bigint(r).into_affine(),
        }
    }

    pub fn decrypt(&self, secret_key: &G::ScalarField) -> G {
        (self.enc2.mul_bigint(secret_key.into_bigint()).neg() + self.enc1).into_affine()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use ark_bls12_381::{G1Affine, G2Affine};
    use ark_ec::Group;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn encrypt_decrypt() {
        let mut rng = StdRng::seed_from_u64(0u64);

        fn check<G: AffineRepr>(rng: &mut StdRng) {
            let gen = G::Group::rand(rng).into_affine();
            let (sk, pk) = keygen(rng, &gen);
            assert!(pk.is_valid());

            let msg = G::Group::rand(rng).into_affine();
            let (ciphertext, _) = Ciphertext::new(rng, &msg, &pk.0, &gen);
            assert_eq!(ciphertext.decrypt(&sk.0), msg);

            // Fresh randomness gives a different ciphertext of the same message
            let (ciphertext_1, _) = Ciphertext::new(rng, &msg, &pk.0, &gen);
            assert_ne!(ciphertext.enc1, ciphertext_1.enc1);
            assert_ne!(ciphertext.enc2, ciphertext_1.enc2);
            assert_eq!(ciphertext_1.decrypt(&sk.0), msg);

            // Wrong key doesn't decrypt
            let (sk_other, _) = keygen::<_, G>(rng, &gen);
            assert_ne!(ciphertext.decrypt(&sk_other.0), msg);
        }

        check::<G1Affine>(&mut rng);
        check::<G2Affine>(&mut rng);
    }

    #[test]
    fn serialization() {
        let mut rng = StdRng::seed_from_u64(1u64);
        let gen = <G1Affine as AffineRepr>::Group::generator().into_affine();
        let (_, pk) = keygen(&mut rng, &gen);
        let (ciphertext, _) = Ciphertext::new(&mut rng, &gen, &pk.0, &gen);
        let ser = serde_json::to_string(&ciphertext).unwrap();
        assert_eq!(
            serde_json::from_str::<Ciphertext<G1Affine>>(&ser).unwrap(),
            ciphertext
        );
    }
}
