//! Proof of knowledge of the signature and corresponding messages as per section 4.5 of the paper.
//!
//! The prover randomizes the signature and runs 2 Schnorr protocols. Messages can be revealed to the verifier
//! or kept hidden. Hidden messages get a Schnorr response and 2 hidden messages (in the same or different
//! signatures) are proven equal by using the same blinding for both, making their responses equal. See
//! [`PoKOfSignatureG1Proof::get_resp_for_message`].

use crate::{
    error::BBSPlusError,
    setup::{PublicKeyG2, SignatureParamsG1},
    signature::SignatureG1,
};
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::{Field, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{
    collections::{BTreeMap, BTreeSet},
    io::Write,
    rand::RngCore,
    vec,
    vec::Vec,
    UniformRand, Zero,
};
use ld_crypto_utils::serde_utils::ArkObjectBytes;
use schnorr_pok::{error::SchnorrError, SchnorrCommitment, SchnorrResponse};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Stateful protocol to prove knowledge of signature. The protocol randomizes the signature and executes 2 Schnorr
/// proof of knowledge protocols with the verifier in addition to verification of the randomized signature.
/// It contains commitment (Schnorr step 1) and witnesses to both Schnorr protocols in `sc_comm_` and `sc_wits_`
/// respectively. The protocol executes in 2 phases, pre-challenge (`init`) which is used to create the
/// challenge and post-challenge (`gen_proof`). Thus, several instances of the protocol can be used
/// together where the pre-challenge phase of all protocols is used to create a combined challenge and then
/// that challenge is used in post-challenge phase of all protocols.
#[derive(Clone, PartialEq, Eq, Debug, Zeroize, ZeroizeOnDrop)]
pub struct PoKOfSignatureG1Protocol<E: Pairing> {
    #[zeroize(skip)]
    pub A_prime: E::G1Affine,
    #[zeroize(skip)]
    pub A_bar: E::G1Affine,
    #[zeroize(skip)]
    pub d: E::G1Affine,
    /// For proving relation `A_bar - d == A_prime * -e + h_0 * r2`
    pub sc_comm_1: SchnorrCommitment<E::G1Affine>,
    sc_wits_1: [E::ScalarField; 2],
    /// For proving relation `-(g1 + sum(h_i * m_i))` for all disclosed messages `m_i` equals
    /// `d * -r3 + h_0 * s_prime + sum(h_j * m_j)` for all undisclosed messages `m_j`
    pub sc_comm_2: SchnorrCommitment<E::G1Affine>,
    sc_wits_2: Vec<E::ScalarField>,
}

/// Proof of knowledge of the signature. It contains the randomized signature, commitment (Schnorr step 1)
/// and response (Schnorr step 3) to both Schnorr protocols in `T_` and `sc_resp_`
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
#[serde(bound = "")]
pub struct PoKOfSignatureG1Proof<E: Pairing> {
    #[serde_as(as = "ArkObjectBytes")]
    pub A_prime: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub A_bar: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub d: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub T1: E::G1Affine,
    pub sc_resp_1: SchnorrResponse<E::G1Affine>,
    #[serde_as(as = "ArkObjectBytes")]
    pub T2: E::G1Affine,
    pub sc_resp_2: SchnorrResponse<E::G1Affine>,
}

impl<E: Pairing> PoKOfSignatureG1Protocol<E> {
    /// Initiate the protocol, i.e. pre-challenge phase. This will generate the randomized signature and execute
    /// the commit-to-randomness step (step 1) of both Schnorr protocols. Accepts the indices of the
    /// multi-message which are revealed to the verifier and thus their knowledge is not proven.
    /// Accepts blindings (randomness) to be used for any messages in the multi-message. This is useful
    /// when some messages need to be proven same as they will generate same response (step 3 in Schnorr protocol).
    /// Blindings for revealed messages are ignored and any hidden message without one gets a random blinding.
    pub fn init<R: RngCore>(
        rng: &mut R,
        signature: &SignatureG1<E>,
        params: &SignatureParamsG1<E>,
        messages: &[E::ScalarField],
        mut blindings: BTreeMap<usize, E::ScalarField>,
        revealed_msg_indices: &BTreeSet<usize>,
    ) -> Result<Self, BBSPlusError> {
        if messages.len() != params.supported_message_count() {
            return Err(BBSPlusError::MessageCountIncompatibleWithSigParams(
                messages.len(),
                params.supported_message_count(),
            ));
        }
        if let Some(idx) = revealed_msg_indices.iter().find(|i| **i >= messages.len()) {
            return Err(BBSPlusError::InvalidMessageIdx(*idx));
        }

        let mut r1 = E::ScalarField::rand(rng);
        while r1.is_zero() {
            r1 = E::ScalarField::rand(rng);
        }
        let r2 = E::ScalarField::rand(rng);
        let r3 = r1.inverse().ok_or(BBSPlusError::CannotInvert0)?;

        let b = params.b(messages.iter().enumerate(), &signature.s)?;
        // A' = A * r1
        let A_prime = signature.A.mul_bigint(r1.into_bigint()).into_affine();
        // A_bar = r1 * b - e * A'
        let b_r1 = b * r1;
        let A_bar = b_r1 - A_prime.mul_bigint(signature.e.into_bigint());
        // d = r1 * b - r2 * h_0
        let d = (b_r1 - params.h_0.mul_bigint(r2.into_bigint())).into_affine();
        // s' = s - r2*r3
        let s_prime = signature.s - (r2 * r3);

        let bases_1 = [A_prime, params.h_0];
        let sc_comm_1 = SchnorrCommitment::new(
            &bases_1,
            vec![E::ScalarField::rand(rng), E::ScalarField::rand(rng)],
        );

        // Negations are done on the revealed messages (public, so computed by the verifier as a point
        // negation) and not on the hidden ones.
        let hidden_count = messages.len() - revealed_msg_indices.len();
        let mut bases_2 = Vec::with_capacity(2 + hidden_count);
        let mut blindings_2 = Vec::with_capacity(2 + hidden_count);
        let mut wits_2 = Vec::with_capacity(2 + hidden_count);
        bases_2.push(d);
        blindings_2.push(E::ScalarField::rand(rng));
        wits_2.push(-r3);
        bases_2.push(params.h_0);
        blindings_2.push(E::ScalarField::rand(rng));
        wits_2.push(s_prime);

        for (i, msg) in messages.iter().enumerate() {
            if revealed_msg_indices.contains(&i) {
                continue;
            }
            bases_2.push(params.h[i]);
            blindings_2.push(
                blindings
                    .remove(&i)
                    .unwrap_or_else(|| E::ScalarField::rand(rng)),
            );
            wits_2.push(*msg);
        }

        let sc_comm_2 = SchnorrCommitment::new(&bases_2, blindings_2);
        Ok(Self {
            A_prime,
            A_bar: A_bar.into_affine(),
            d,
            sc_comm_1,
            sc_wits_1: [-signature.e, r2],
            sc_comm_2,
            sc_wits_2: wits_2,
        })
    }

    /// Get the contribution of this protocol towards the challenge.
    pub fn challenge_contribution<W: Write>(
        &self,
        revealed_msgs: &BTreeMap<usize, E::ScalarField>,
        params: &SignatureParamsG1<E>,
        writer: W,
    ) -> Result<(), BBSPlusError> {
        Self::compute_challenge_contribution(
            &self.A_prime,
            &self.A_bar,
            &self.d,
            &self.sc_comm_1.t,
            &self.sc_comm_2.t,
            revealed_msgs,
            params,
            writer,
        )
    }

    /// Generate proof. Post-challenge phase of the protocol.
    pub fn gen_proof(
        self,
        challenge: &E::ScalarField,
    ) -> Result<PoKOfSignatureG1Proof<E>, BBSPlusError> {
        let sc_resp_1 = self.sc_comm_1.response(&self.sc_wits_1, challenge)?;
        let sc_resp_2 = self.sc_comm_2.response(&self.sc_wits_2, challenge)?;

        Ok(PoKOfSignatureG1Proof {
            A_prime: self.A_prime,
            A_bar: self.A_bar,
            d: self.d,
            T1: self.sc_comm_1.t,
            sc_resp_1,
            T2: self.sc_comm_2.t,
            sc_resp_2,
        })
    }

    /// Helper that serializes state to get challenge contribution. Serializes the randomized signature,
    /// and commitments and instances for both Schnorr protocols
    #[allow(clippy::too_many_arguments)]
    pub fn compute_challenge_contribution<W: Write>(
        A_prime: &E::G1Affine,
        A_bar: &E::G1Affine,
        d: &E::G1Affine,
        T1: &E::G1Affine,
        T2: &E::G1Affine,
        revealed_msgs: &BTreeMap<usize, E::ScalarField>,
        params: &SignatureParamsG1<E>,
        mut writer: W,
    ) -> Result<(), BBSPlusError> {
        A_bar.serialize_compressed(&mut writer)?;

        // For 1st Schnorr
        A_prime.serialize_compressed(&mut writer)?;
        params.h_0.serialize_compressed(&mut writer)?;
        (A_bar.into_group() - d.into_group()).into_affine().serialize_compressed(&mut writer)?;
        T1.serialize_compressed(&mut writer)?;

        // For 2nd Schnorr
        d.serialize_compressed(&mut writer)?;
        params.g1.serialize_compressed(&mut writer)?;
        for (i, msg) in revealed_msgs {
            let h_i = params.h.get(*i).ok_or(BBSPlusError::InvalidMessageIdx(*i))?;
            (*i as u64).serialize_compressed(&mut writer)?;
            h_i.serialize_compressed(&mut writer)?;
            msg.serialize_compressed(&mut writer)?;
        }
        T2.serialize_compressed(&mut writer)?;
        Ok(())
    }
}

impl<E: Pairing> PoKOfSignatureG1Proof<E> {
    /// Verify if the proof is valid. Assumes that the public key and parameters have been validated already.
    pub fn verify(
        &self,
        revealed_msgs: &BTreeMap<usize, E::ScalarField>,
        challenge: &E::ScalarField,
        pk: &PublicKeyG2<E>,
        params: &SignatureParamsG1<E>,
    ) -> Result<(), BBSPlusError> {
        if self.A_prime.is_zero() {
            return Err(BBSPlusError::ZeroSignature);
        }
        if let Some(idx) = revealed_msgs
            .keys()
            .find(|i| **i >= params.supported_message_count())
        {
            return Err(BBSPlusError::InvalidMessageIdx(*idx));
        }

        // Verify the randomized signature, `e(A_prime, pk) == e(A_bar, g2)`
        let minus_A_bar = (-self.A_bar.into_group()).into_affine();
        if !E::multi_pairing([self.A_prime, minus_A_bar], [pk.0, params.g2]).is_zero() {
            return Err(BBSPlusError::PairingCheckFailed);
        }

        // Verify the 1st Schnorr proof
        let bases_1 = [self.A_prime, params.h_0];
        let A_bar_minus_d = (self.A_bar.into_group() - self.d.into_group()).into_affine();
        self.sc_resp_1
            .is_valid(&bases_1, &A_bar_minus_d, &self.T1, challenge)
            .map_err(|e| match e {
                SchnorrError::InvalidResponse => BBSPlusError::FirstSchnorrVerificationFailed,
                e => e.into(),
            })?;

        // Verify the 2nd Schnorr proof
        let hidden_count = params.supported_message_count() - revealed_msgs.len();
        let mut bases_2 = Vec::with_capacity(2 + hidden_count);
        bases_2.push(self.d);
        bases_2.push(params.h_0);

        let mut bases_disclosed = Vec::with_capacity(1 + revealed_msgs.len());
        let mut exponents = Vec::with_capacity(1 + revealed_msgs.len());
        bases_disclosed.push(params.g1);
        exponents.push(E::ScalarField::from(1u64));
        for (i, h_i) in params.h.iter().enumerate() {
            match revealed_msgs.get(&i) {
                Some(message) => {
                    bases_disclosed.push(*h_i);
                    exponents.push(*message);
                }
                None => bases_2.push(*h_i),
            }
        }
        // pr = -(g1 + h_i * m_i + ...) for all disclosed messages m_i
        let pr = (-E::G1::msm_unchecked(&bases_disclosed, &exponents)).into_affine();
        self.sc_resp_2
            .is_valid(&bases_2, &pr, &self.T2, challenge)
            .map_err(|e| match e {
                SchnorrError::InvalidResponse => BBSPlusError::SecondSchnorrVerificationFailed,
                e => e.into(),
            })?;

        Ok(())
    }

    /// For the verifier to independently calculate the challenge
    pub fn challenge_contribution<W: Write>(
        &self,
        revealed_msgs: &BTreeMap<usize, E::ScalarField>,
        params: &SignatureParamsG1<E>,
        writer: W,
    ) -> Result<(), BBSPlusError> {
        PoKOfSignatureG1Protocol::compute_challenge_contribution(
            &self.A_prime,
            &self.A_bar,
            &self.d,
            &self.T1,
            &self.T2,
            revealed_msgs,
            params,
            writer,
        )
    }

    /// Get the response from post-challenge phase of the Schnorr protocol for the given message index
    /// `msg_idx`. Used when comparing message equality
    pub fn get_resp_for_message(
        &self,
        msg_idx: usize,
        revealed_msg_ids: &BTreeSet<usize>,
    ) -> Result<&E::ScalarField, BBSPlusError> {
        // Revealed messages are not part of Schnorr protocol
        if revealed_msg_ids.contains(&msg_idx) {
            return Err(BBSPlusError::InvalidMsgIdxForResponse(msg_idx));
        }
        // Adjust message index as the revealed messages are not part of the Schnorr protocol
        let adjusted_idx = msg_idx - revealed_msg_ids.range(..msg_idx).count();
        // 2 added to the index, since 0th and 1st index are reserved for `r3` and `s_prime`
        let r = self.sc_resp_2.get_response(2 + adjusted_idx)?;
        Ok(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::KeypairG2;
    use ark_bls12_381::{Bls12_381, Fr};
    use ark_serialize::CanonicalSerialize;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use blake2::Blake2b512;
    use schnorr_pok::compute_random_oracle_challenge;
    use std::time::Instant;
    use test_utils::test_serialization;

    fn sig_setup<R: RngCore>(
        rng: &mut R,
        message_count: usize,
    ) -> (
        Vec<Fr>,
        SignatureParamsG1<Bls12_381>,
        KeypairG2<Bls12_381>,
        SignatureG1<Bls12_381>,
    ) {
        let messages: Vec<Fr> = (0..message_count).map(|_| Fr::rand(rng)).collect();
        let params = SignatureParamsG1::<Bls12_381>::generate_using_rng(rng, message_count);
        let keypair = KeypairG2::<Bls12_381>::generate_using_rng(rng, &params);
        let sig =
            SignatureG1::<Bls12_381>::new(rng, &messages, &keypair.secret_key, &params).unwrap();
        (messages, params, keypair, sig)
    }

    #[test]
    fn pok_signature_revealed_message() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let message_count = 20;
        let (messages, params, keypair, sig) = sig_setup(&mut rng, message_count);
        sig.verify(&messages, &keypair.public_key, &params).unwrap();

        let revealed_indices = BTreeSet::from([0, 2, 19]);
        let revealed_msgs = revealed_indices
            .iter()
            .map(|i| (*i, messages[*i]))
            .collect::<BTreeMap<_, _>>();

        let start = Instant::now();
        let pok = PoKOfSignatureG1Protocol::init(
            &mut rng,
            &sig,
            &params,
            &messages,
            BTreeMap::new(),
            &revealed_indices,
        )
        .unwrap();

        let mut chal_bytes_prover = vec![];
        pok.challenge_contribution(&revealed_msgs, &params, &mut chal_bytes_prover)
            .unwrap();
        let challenge_prover =
            compute_random_oracle_challenge::<Fr, Blake2b512>(&chal_bytes_prover);
        let proof = pok.gen_proof(&challenge_prover).unwrap();
        println!(
            "Time to create proof with message size {} and revealing {} messages is {:?}",
            message_count,
            revealed_indices.len(),
            start.elapsed()
        );

        let mut chal_bytes_verifier = vec![];
        proof
            .challenge_contribution(&revealed_msgs, &params, &mut chal_bytes_verifier)
            .unwrap();
        assert_eq!(chal_bytes_prover, chal_bytes_verifier);
        let challenge_verifier =
            compute_random_oracle_challenge::<Fr, Blake2b512>(&chal_bytes_verifier);

        proof
            .verify(
                &revealed_msgs,
                &challenge_verifier,
                &keypair.public_key,
                &params,
            )
            .unwrap();

        // Wrong revealed message
        let mut wrong_msgs = revealed_msgs.clone();
        wrong_msgs.insert(2, Fr::rand(&mut rng));
        assert!(matches!(
            proof.verify(&wrong_msgs, &challenge_verifier, &keypair.public_key, &params),
            Err(BBSPlusError::SecondSchnorrVerificationFailed)
        ));

        // Wrong challenge
        assert!(proof
            .verify(
                &revealed_msgs,
                &Fr::rand(&mut rng),
                &keypair.public_key,
                &params
            )
            .is_err());

        // Wrong public key
        let other = KeypairG2::<Bls12_381>::generate_using_rng(&mut rng, &params);
        assert!(matches!(
            proof.verify(&revealed_msgs, &challenge_verifier, &other.public_key, &params),
            Err(BBSPlusError::PairingCheckFailed)
        ));

        test_serialization!(PoKOfSignatureG1Proof<Bls12_381>, proof);
    }

    #[test]
    fn pok_multiple_sigs_with_same_msg() {
        // Prove knowledge of 2 signatures and the equality of a specific message under both signatures.
        let mut rng = StdRng::seed_from_u64(0u64);
        let message_1_count = 10;
        let message_2_count = 7;
        let params_1 =
            SignatureParamsG1::<Bls12_381>::new::<Blake2b512>("test".as_bytes(), message_1_count);
        let params_2 =
            SignatureParamsG1::<Bls12_381>::new::<Blake2b512>("test-1".as_bytes(), message_2_count);
        let keypair_1 = KeypairG2::<Bls12_381>::generate_using_rng(&mut rng, &params_1);
        let keypair_2 = KeypairG2::<Bls12_381>::generate_using_rng(&mut rng, &params_2);

        let mut messages_1: Vec<Fr> = (0..message_1_count - 1)
            .map(|_| Fr::rand(&mut rng))
            .collect();
        let mut messages_2: Vec<Fr> = (0..message_2_count - 1)
            .map(|_| Fr::rand(&mut rng))
            .collect();

        let same_msg_idx_1 = 4;
        let same_msg_idx_2 = 1;
        let same_msg = Fr::rand(&mut rng);
        messages_1.insert(same_msg_idx_1, same_msg);
        messages_2.insert(same_msg_idx_2, same_msg);

        let sig_1 =
            SignatureG1::<Bls12_381>::new(&mut rng, &messages_1, &keypair_1.secret_key, &params_1)
                .unwrap();
        let sig_2 =
            SignatureG1::<Bls12_381>::new(&mut rng, &messages_2, &keypair_2.secret_key, &params_2)
                .unwrap();

        let same_blinding = Fr::rand(&mut rng);
        let blindings_1 = BTreeMap::from([(same_msg_idx_1, same_blinding), (0, Fr::rand(&mut rng))]);
        let blindings_2 = BTreeMap::from([(same_msg_idx_2, same_blinding)]);

        // 1st signature reveals a message before the shared one
        let revealed_1 = BTreeSet::from([2]);
        let revealed_msgs_1 = BTreeMap::from([(2, messages_1[2])]);

        let pok_1 = PoKOfSignatureG1Protocol::init(
            &mut rng,
            &sig_1,
            &params_1,
            &messages_1,
            blindings_1,
            &revealed_1,
        )
        .unwrap();
        let pok_2 = PoKOfSignatureG1Protocol::init(
            &mut rng,
            &sig_2,
            &params_2,
            &messages_2,
            blindings_2,
            &BTreeSet::new(),
        )
        .unwrap();

        let mut chal_bytes_prover = vec![];
        pok_1
            .challenge_contribution(&revealed_msgs_1, &params_1, &mut chal_bytes_prover)
            .unwrap();
        pok_2
            .challenge_contribution(&BTreeMap::new(), &params_2, &mut chal_bytes_prover)
            .unwrap();
        let challenge = compute_random_oracle_challenge::<Fr, Blake2b512>(&chal_bytes_prover);

        let proof_1 = pok_1.gen_proof(&challenge).unwrap();
        let proof_2 = pok_2.gen_proof(&challenge).unwrap();

        proof_1
            .verify(&revealed_msgs_1, &challenge, &keypair_1.public_key, &params_1)
            .unwrap();
        proof_2
            .verify(&BTreeMap::new(), &challenge, &keypair_2.public_key, &params_2)
            .unwrap();

        // Response for the same message should be same (this check is made by the verifier)
        assert_eq!(
            proof_1
                .get_resp_for_message(same_msg_idx_1, &revealed_1)
                .unwrap(),
            proof_2
                .get_resp_for_message(same_msg_idx_2, &BTreeSet::new())
                .unwrap()
        );
        assert_ne!(
            proof_1.get_resp_for_message(0, &revealed_1).unwrap(),
            proof_2.get_resp_for_message(0, &BTreeSet::new()).unwrap()
        );
        assert!(proof_1.get_resp_for_message(2, &revealed_1).is_err());
    }

    #[test]
    fn pok_signature_schnorr_response() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let message_count = 6;
        let (messages, params, _, sig) = sig_setup(&mut rng, message_count);

        let revealed_indices = BTreeSet::from([1, 3]);
        let blindings = (0..message_count)
            .map(|i| (i, Fr::rand(&mut rng)))
            .collect::<BTreeMap<_, _>>();
        let pok = PoKOfSignatureG1Protocol::init(
            &mut rng,
            &sig,
            &params,
            &messages,
            blindings.clone(),
            &revealed_indices,
        )
        .unwrap();
        let challenge = Fr::rand(&mut rng);
        let proof = pok.gen_proof(&challenge).unwrap();

        // Response is blinding + challenge * message
        for i in [0, 2, 4, 5] {
            assert_eq!(
                *proof.get_resp_for_message(i, &revealed_indices).unwrap(),
                blindings[&i] + challenge * messages[i]
            );
        }
        assert_eq!(proof.sc_resp_2.len(), 2 + 4);
        assert!(proof.get_resp_for_message(6, &revealed_indices).is_err());
    }
}
