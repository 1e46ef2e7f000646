//! Blind issuance of holder-bound credentials.
//!
//! The holder commits to a secret as message 0, `C = h_1 * secret + h_0 * blinding`, and proves
//! knowledge of the opening. The issuer signs the commitment together with the credential's messages
//! without learning the secret, and the holder unblinds the signature by adding its blinding to `s`.
//! The result is a signature over `[secret] ++ statement messages` with cryptosuite
//! [`CRYPTOSUITE_BOUND_SIGN`], which only verifies, and can only be presented, with the secret.

use std::collections::BTreeMap;

use ark_bls12_381::{Bls12_381, Fr, G1Affine};
use ark_ec::AffineRepr;
use ark_std::{rand::RngCore, UniformRand};
use bbs_plus::signature::SignatureG1;
use ld_crypto_utils::{
    multibase_utils::{ark_to_multibase, multibase_to_ark},
    transcript::{new_merlin_transcript, MerlinTranscript, Transcript},
};
use schnorr_pok::discrete_log::{PokTwoDiscreteLogs, PokTwoDiscreteLogsProtocol};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    backend::{Backend, BackendParams},
    constants::{
        BLIND_SIGN_TRANSCRIPT_LABEL, CHALLENGE_LABEL, COMMITMENT_POK_LABEL,
        CRYPTOSUITE_BOUND_SIGN, CRYPTOSUITE_SIGN, NONCE_LABEL,
    },
    credential::secret_to_message,
    error::{Error, Result, VerifyResult},
    loader::DocumentLoader,
    signature::{check_signature, into_verify_result, prepare_issuance, Proof},
};

/// What the holder sends to the issuer. Multibase encoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlindSignRequest {
    pub commitment: String,
    /// Absent when the holder skipped the proof, e.g. because the commitment is proven as part of a
    /// presentation instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pok_for_commitment: Option<String>,
}

/// A request and the blinding the holder keeps to unblind the signature
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlindSignRequestWithBlinding {
    #[serde(flatten)]
    pub request: BlindSignRequest,
    pub blinding: String,
}

fn commitment_bases(params: &BackendParams) -> [G1Affine; 2] {
    [params.message_generator(0), params.blinding_generator()]
}

fn commitment_challenge(
    challenge: Option<&str>,
    contribution: impl FnOnce(&mut Vec<u8>) -> Result<()>,
) -> Result<Fr> {
    let mut transcript: MerlinTranscript = new_merlin_transcript(BLIND_SIGN_TRANSCRIPT_LABEL);
    transcript.append_bytes(NONCE_LABEL, challenge.unwrap_or_default().as_bytes());
    let mut bytes = Vec::new();
    contribution(&mut bytes)?;
    transcript.append_bytes(COMMITMENT_POK_LABEL, &bytes);
    Ok(transcript.challenge_scalar(CHALLENGE_LABEL))
}

/// Commit to the holder secret and, unless `skip_pok`, prove knowledge of the opening bound to the
/// issuer's `challenge`
pub fn request_blind_sign(
    backend: &Backend,
    secret: &[u8],
    challenge: Option<&str>,
    skip_pok: bool,
) -> Result<BlindSignRequestWithBlinding> {
    let params = backend.require_ready()?;
    let mut rng = backend.rng();
    let secret = secret_to_message(secret);
    let blinding = Fr::rand(&mut rng);
    let commitment = params
        .signature_params(1)
        .commit_to_messages([(0, &secret)], &blinding)?;
    let pok_for_commitment = if skip_pok {
        None
    } else {
        Some(prove_opening(params, &mut rng, secret, blinding, &commitment, challenge)?)
    };
    Ok(BlindSignRequestWithBlinding {
        request: BlindSignRequest {
            commitment: ark_to_multibase(&commitment)?,
            pok_for_commitment,
        },
        blinding: ark_to_multibase(&blinding)?,
    })
}

fn prove_opening<R: RngCore>(
    params: &BackendParams,
    rng: &mut R,
    secret: Fr,
    blinding: Fr,
    commitment: &G1Affine,
    challenge: Option<&str>,
) -> Result<String> {
    let bases = commitment_bases(params);
    let protocol = PokTwoDiscreteLogsProtocol::init(
        [secret, blinding],
        [Fr::rand(rng), Fr::rand(rng)],
        &bases,
    );
    let c = commitment_challenge(challenge, |w| {
        Ok(protocol.challenge_contribution(&bases, commitment, w)?)
    })?;
    Ok(ark_to_multibase(&protocol.gen_proof(&c))?)
}

pub fn verify_blind_sign_request(
    backend: &Backend,
    request: &BlindSignRequest,
    challenge: Option<&str>,
) -> Result<VerifyResult> {
    let params = backend.require_ready()?;
    let commitment = multibase_to_ark::<G1Affine>(&request.commitment)?;
    let Some(pok) = request.pok_for_commitment.as_deref() else {
        return Ok(VerifyResult::failure("request has no pokForCommitment"));
    };
    let pok = match multibase_to_ark::<PokTwoDiscreteLogs<G1Affine>>(pok) {
        Ok(pok) => pok,
        Err(e) => return Ok(VerifyResult::failure(format!("invalid pokForCommitment: {}", e))),
    };
    let bases = commitment_bases(params);
    let c = commitment_challenge(challenge, |w| {
        Ok(pok.challenge_contribution(&bases, &commitment, w)?)
    })?;
    if pok.verify(&commitment, &bases, &c) {
        Ok(VerifyResult::success())
    } else {
        debug!("proof of knowledge of the commitment opening does not verify");
        Ok(VerifyResult::failure(
            "proof of knowledge of the commitment opening does not verify",
        ))
    }
}

/// Sign `document` over a committed holder secret. The request should have been checked with
/// [`verify_blind_sign_request`] first. The returned proof must be unblinded by the holder.
pub fn blind_sign(
    backend: &Backend,
    commitment: &str,
    document: &Value,
    proof_template: &Proof,
    loader: &impl DocumentLoader,
) -> Result<Proof> {
    let params = backend.require_ready()?;
    if proof_template.cryptosuite != CRYPTOSUITE_SIGN
        && proof_template.cryptosuite != CRYPTOSUITE_BOUND_SIGN
    {
        return Err(Error::malformed(format!(
            "cannot blind sign with cryptosuite {}",
            proof_template.cryptosuite
        )));
    }
    let commitment = multibase_to_ark::<G1Affine>(commitment)?;
    if commitment.is_zero() {
        return Err(Error::malformed("commitment is the identity"));
    }
    let (mut proof, secret_key, credential) = prepare_issuance(
        params,
        document,
        proof_template,
        CRYPTOSUITE_BOUND_SIGN,
        loader,
    )?;
    let messages = credential.statement_messages();
    let uncommitted = messages
        .iter()
        .enumerate()
        .map(|(i, m)| (i + credential.offset(), m))
        .collect::<BTreeMap<_, _>>();
    let signature = SignatureG1::<Bls12_381>::new_with_committed_messages(
        &mut backend.rng(),
        &commitment,
        uncommitted,
        &secret_key,
        &params.signature_params(credential.message_count()),
    )?;
    debug!(
        statements = credential.statements.len(),
        messages = credential.message_count(),
        verification_method = %proof.verification_method,
        "blind signed credential"
    );
    proof.proof_value = Some(ark_to_multibase(&signature)?);
    Ok(proof)
}

/// Turn the issuer's blind signature into a signature over the holder secret
pub fn unblind(backend: &Backend, proof: &Proof, blinding: &str) -> Result<Proof> {
    backend.require_ready()?;
    if !proof.is_holder_bound() {
        return Err(Error::malformed(format!(
            "cannot unblind a proof with cryptosuite {}",
            proof.cryptosuite
        )));
    }
    let proof_value = proof
        .proof_value
        .as_deref()
        .ok_or_else(|| Error::malformed("proof has no proofValue"))?;
    let signature = multibase_to_ark::<SignatureG1<Bls12_381>>(proof_value)?;
    let blinding = multibase_to_ark::<Fr>(blinding)?;
    Ok(Proof {
        proof_value: Some(ark_to_multibase(&signature.unblind(&blinding))?),
        ..proof.clone()
    })
}

/// Verify a holder-bound credential using the holder secret
pub fn blind_verify(
    backend: &Backend,
    secret: &[u8],
    document: &Value,
    proof: &Proof,
    loader: &impl DocumentLoader,
) -> Result<VerifyResult> {
    let params = backend.require_ready()?;
    if !proof.is_holder_bound() {
        return Ok(VerifyResult::failure(format!(
            "cryptosuite {} is not holder-bound",
            proof.cryptosuite
        )));
    }
    let secret = secret_to_message(secret);
    Ok(into_verify_result(check_signature(
        params,
        document,
        proof,
        Some(&secret),
        loader,
    )?))
}
