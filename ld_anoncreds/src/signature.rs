//! Key generation, signing and verification of credentials.

use ark_bls12_381::{Bls12_381, Fr};
use bbs_plus::{
    setup::{KeypairG2, PublicKeyG2, SecretKey},
    signature::SignatureG1,
};
use chrono::{SecondsFormat, Utc};
use ld_crypto_utils::multibase_utils::{ark_to_multibase, multibase_to_ark};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    backend::{Backend, BackendParams},
    constants::{CRYPTOSUITE_BOUND_SIGN, CRYPTOSUITE_SIGN},
    credential::CanonicalCredential,
    error::{Error, Result, VerifyResult},
    loader::{load_verification_method, DocumentLoader, VerificationMethod},
};

/// Multibase encoded key pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    pub secret_key: String,
    pub public_key: String,
}

/// Data integrity proof attached to a credential. Without `proof_value` it is the proof
/// configuration, which is signed along with the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(rename = "type")]
    pub proof_type: String,
    pub cryptosuite: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    pub verification_method: String,
    pub proof_purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,
}

impl Proof {
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| Error::malformed(format!("invalid proof: {}", e)))
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// The proof without its value
    pub fn config(&self) -> Self {
        Self {
            proof_value: None,
            ..self.clone()
        }
    }

    pub fn is_holder_bound(&self) -> bool {
        self.cryptosuite == CRYPTOSUITE_BOUND_SIGN
    }
}

/// A credential whose signature verified
pub(crate) struct SignedCredential {
    pub credential: CanonicalCredential,
    pub signature: SignatureG1<Bls12_381>,
    pub public_key: PublicKeyG2<Bls12_381>,
}

/// Outcome of a cryptographic check, the error being the reason of the mismatch
pub(crate) type Checked<T> = std::result::Result<T, String>;

pub fn key_gen(backend: &Backend) -> Result<KeyPair> {
    let params = backend.require_ready()?;
    let keypair = KeypairG2::<Bls12_381>::generate_using_rng(&mut backend.rng(), &params.key_params());
    Ok(KeyPair {
        secret_key: ark_to_multibase(&keypair.secret_key)?,
        public_key: ark_to_multibase(&keypair.public_key)?,
    })
}

/// Sign `document` with the key of the verification method named in `proof_template`. The loader
/// must resolve that verification method including its `secretKeyMultibase`.
pub fn sign(
    backend: &Backend,
    document: &Value,
    proof_template: &Proof,
    loader: &impl DocumentLoader,
) -> Result<Proof> {
    let params = backend.require_ready()?;
    if proof_template.cryptosuite != CRYPTOSUITE_SIGN {
        return Err(Error::malformed(format!(
            "cannot sign with cryptosuite {}",
            proof_template.cryptosuite
        )));
    }
    let (mut proof, secret_key, credential) =
        prepare_issuance(params, document, proof_template, CRYPTOSUITE_SIGN, loader)?;
    let messages = credential.messages(None)?;
    let signature = SignatureG1::new(
        &mut backend.rng(),
        &messages,
        &secret_key,
        &params.signature_params(messages.len()),
    )?;
    debug!(
        statements = credential.statements.len(),
        messages = messages.len(),
        verification_method = %proof.verification_method,
        "signed credential"
    );
    proof.proof_value = Some(ark_to_multibase(&signature)?);
    Ok(proof)
}

pub fn verify(
    backend: &Backend,
    document: &Value,
    proof: &Proof,
    loader: &impl DocumentLoader,
) -> Result<VerifyResult> {
    let params = backend.require_ready()?;
    match proof.cryptosuite.as_str() {
        CRYPTOSUITE_SIGN => {}
        CRYPTOSUITE_BOUND_SIGN => {
            return Ok(VerifyResult::failure(
                "holder-bound credential can only be verified with the holder secret",
            ))
        }
        other => return Ok(VerifyResult::failure(format!("unsupported cryptosuite {}", other))),
    }
    Ok(into_verify_result(check_signature(
        params, document, proof, None, loader,
    )?))
}

pub(crate) fn into_verify_result<T>(checked: Checked<T>) -> VerifyResult {
    match checked {
        Ok(_) => VerifyResult::success(),
        Err(reason) => {
            debug!(%reason, "verification failed");
            VerifyResult::failure(reason)
        }
    }
}

/// Everything an issuer needs before signing: the completed proof configuration, the secret key
/// and the canonical credential
pub(crate) fn prepare_issuance(
    params: &BackendParams,
    document: &Value,
    proof_template: &Proof,
    cryptosuite: &str,
    loader: &impl DocumentLoader,
) -> Result<(Proof, SecretKey<Fr>, CanonicalCredential)> {
    let mut proof = proof_template.config();
    proof.cryptosuite = cryptosuite.to_string();
    if proof.created.is_none() {
        proof.created = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
    }

    let method = load_verification_method(loader, &proof.verification_method)?;
    check_issuer(document, &method).map_err(Error::MalformedInput)?;
    let secret_key = method.secret_key_multibase.as_deref().ok_or_else(|| {
        Error::malformed(format!("verification method {} has no secret key", method.id))
    })?;
    let secret_key = multibase_to_ark::<SecretKey<Fr>>(secret_key)?;
    let public_key = multibase_to_ark::<PublicKeyG2<Bls12_381>>(&method.public_key_multibase)?;
    if PublicKeyG2::generate_using_secret_key(&secret_key, &params.key_params()) != public_key {
        return Err(Error::malformed(format!(
            "secret key of {} does not match its public key",
            method.id
        )));
    }

    let credential = CanonicalCredential::new(document, &proof, loader)?;
    Ok((proof, secret_key, credential))
}

/// Verify the signature in `proof` over `document`. Hard errors are structural, mismatches are
/// returned as the inner error.
pub(crate) fn check_signature(
    params: &BackendParams,
    document: &Value,
    proof: &Proof,
    secret: Option<&Fr>,
    loader: &impl DocumentLoader,
) -> Result<Checked<SignedCredential>> {
    let proof_value = proof
        .proof_value
        .as_deref()
        .ok_or_else(|| Error::malformed("proof has no proofValue"))?;
    let signature = match multibase_to_ark::<SignatureG1<Bls12_381>>(proof_value) {
        Ok(s) if s.is_non_zero() => s,
        Ok(_) => return Ok(Err("signature is zero".to_string())),
        Err(e) => return Ok(Err(format!("invalid proofValue: {}", e))),
    };

    let method = load_verification_method(loader, &proof.verification_method)?;
    if let Err(reason) = check_issuer(document, &method) {
        return Ok(Err(reason));
    }
    let public_key = multibase_to_ark::<PublicKeyG2<Bls12_381>>(&method.public_key_multibase)?;
    if !public_key.is_valid() {
        return Ok(Err(format!("public key of {} is invalid", method.id)));
    }

    let credential = CanonicalCredential::new(document, proof, loader)?;
    let messages = credential.messages(secret)?;
    if let Err(e) = signature.verify(
        &messages,
        &public_key,
        &params.signature_params(messages.len()),
    ) {
        warn!(error = ?e, verification_method = %method.id, "signature does not verify");
        return Ok(Err(format!("signature does not verify: {:?}", e)));
    }
    Ok(Ok(SignedCredential {
        credential,
        signature,
        public_key,
    }))
}

/// The issuer of a document, when given, must be the controller of the verification method.
/// Hidden issuers (blank nodes) are not checked.
pub(crate) fn check_issuer(document: &Value, method: &VerificationMethod) -> Checked<()> {
    let issuer = match document.get("issuer") {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(Value::Object(o)) => o.get("id").and_then(Value::as_str),
        _ => None,
    };
    match (issuer, method.controller.as_deref()) {
        (Some(issuer), Some(controller)) if !issuer.starts_with("_:") && issuer != controller => {
            Err(format!(
                "issuer {} is not the controller {} of {}",
                issuer, controller, method.id
            ))
        }
        _ => Ok(()),
    }
}
