//! Selective disclosure presentations.
//!
//! For each credential the holder proves knowledge of a BBS+ signature over all its messages while
//! revealing only the messages of the disclosed statements. The verifier learns, per credential, the
//! disclosed document, the number of statements of the original document and which original statement
//! each disclosed statement is. Proof configurations are always revealed.
//!
//! Hidden messages that must be equal, because they are the same blank node of a credential, the same
//! placeholder across credentials or the holder secret, get the same blinding so their Schnorr
//! responses are equal, which the verifier checks.
//!
//! All proofs share one challenge squeezed from a Merlin transcript of the nonce, the domain if any,
//! the number of credentials and each credential's layout and challenge contribution, in that order.

use std::{
    collections::{btree_map::Entry, BTreeMap, BTreeSet, HashMap},
    fmt,
};

use ark_bls12_381::{Bls12_381, Fr};
use ark_std::UniformRand;
use bbs_plus::{
    proof::{PoKOfSignatureG1Proof, PoKOfSignatureG1Protocol},
    setup::{PublicKeyG2, SignatureParamsG1},
};
use chrono::{SecondsFormat, Utc};
use ld_crypto_utils::{
    multibase_utils::{ark_to_multibase, multibase_to_ark},
    transcript::{new_merlin_transcript, MerlinTranscript, Transcript},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    backend::Backend,
    canonicalize::canonicalize,
    constants::{
        AUTO_BLANK_NODE_PREFIX, CHALLENGE_LABEL, CREDENTIAL_COUNT_LABEL, CREDENTIAL_PROOF_LABEL,
        CRYPTOSUITE_BOUND_SIGN, CRYPTOSUITE_PROOF, CRYPTOSUITE_SIGN, DATA_INTEGRITY_PROOF,
        DOMAIN_LABEL, INDEX_MAP_LABEL, MAX_STATEMENT_COUNT, NONCE_LABEL, PRESENTATION_CONTEXT,
        PRESENTATION_PROOF_PURPOSE, PRESENTATION_TRANSCRIPT_LABEL, STATEMENT_COUNT_LABEL,
        VERIFIABLE_PRESENTATION,
    },
    credential::{
        layout_message_count, proof_statements, secret_to_message, term_to_message,
        MESSAGES_PER_STATEMENT,
    },
    error::{Error, Result, VerifyResult},
    loader::{load_verification_method, DocumentLoader},
    matching::{match_statements, statement_pattern, DeanonMap},
    signature::{check_issuer, check_signature, Proof},
    term::Statement,
};

/// A credential and the part of it to disclose
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcWithDisclosed {
    pub vc_document: Value,
    pub vc_proof: Proof,
    pub disclosed_document: Value,
    pub disclosed_proof: Proof,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeriveProofRequest {
    pub vc_with_disclosed: Vec<VcWithDisclosed>,
    /// `_:label` to the N-Triples form of the term the label hides
    #[serde(default)]
    pub deanon_map: HashMap<String, String>,
    pub nonce: String,
    /// Verifier's domain the presentation is restricted to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Holder secret, needed when any credential is holder-bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationProof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub cryptosuite: String,
    pub proof_purpose: String,
    pub created: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub proof_value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiablePresentation {
    #[serde(rename = "@context")]
    pub context: Value,
    #[serde(rename = "type")]
    pub presentation_type: Vec<String>,
    /// Disclosed documents, each with its proof configuration as `proof`
    pub verifiable_credential: Vec<Value>,
    pub proof: PresentationProof,
}

impl VerifiablePresentation {
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Kept apart from the crate's `Result` alias which the serialization derives would pick up
mod wire {
    use ark_bls12_381::Bls12_381;
    use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
    use bbs_plus::proof::PoKOfSignatureG1Proof;

    #[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
    pub(super) struct CredentialProof {
        /// Number of statements of the original document
        pub(super) statement_count: u32,
        /// Original statement index of each disclosed statement
        pub(super) index_map: Vec<u32>,
        pub(super) pok: PoKOfSignatureG1Proof<Bls12_381>,
    }

    /// Decoded `proofValue` of a presentation
    #[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
    pub(super) struct PresentationProofValue {
        pub(super) credentials: Vec<CredentialProof>,
    }
}

use wire::{CredentialProof, PresentationProofValue};

/// Hidden messages in the same class are proven equal
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum EqualityClass {
    HolderSecret,
    /// Blank node chosen by the holder, shared by all credentials
    Global(String),
    /// Blank node labelled during canonicalization, scoped to one credential
    Local(usize, String),
}

impl EqualityClass {
    fn of_blank_node(credential: usize, label: &str) -> Self {
        if label.starts_with(AUTO_BLANK_NODE_PREFIX) {
            Self::Local(credential, label.to_string())
        } else {
            Self::Global(label.to_string())
        }
    }
}

impl fmt::Display for EqualityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HolderSecret => write!(f, "holder secret"),
            Self::Global(label) => write!(f, "_:{}", label),
            Self::Local(credential, label) => write!(f, "_:{} of credential {}", label, credential),
        }
    }
}

/// Revealed and hidden messages of one credential, as both the prover and the verifier see them
struct Disclosure {
    message_count: usize,
    revealed: BTreeMap<usize, Fr>,
    /// Hidden messages that take part in an equality
    equalities: Vec<(EqualityClass, usize)>,
}

impl Disclosure {
    fn new(
        credential: usize,
        holder_bound: bool,
        statement_count: usize,
        disclosed: &[Statement],
        index_map: &[usize],
        proof_statements: &[Statement],
    ) -> Self {
        let offset = usize::from(holder_bound);
        let mut revealed = BTreeMap::new();
        let mut equalities = Vec::new();
        if holder_bound {
            equalities.push((EqualityClass::HolderSecret, 0));
        }
        for (statement, original_idx) in disclosed.iter().zip(index_map) {
            for (k, term) in statement.terms().into_iter().enumerate() {
                let idx = offset + MESSAGES_PER_STATEMENT * original_idx + k;
                match term.blank_label() {
                    Some(label) => {
                        equalities.push((EqualityClass::of_blank_node(credential, label), idx))
                    }
                    None => {
                        revealed.insert(idx, term_to_message(term));
                    }
                }
            }
        }
        let proof_offset = offset + MESSAGES_PER_STATEMENT * statement_count;
        for (p, statement) in proof_statements.iter().enumerate() {
            for (k, term) in statement.terms().into_iter().enumerate() {
                revealed.insert(
                    proof_offset + MESSAGES_PER_STATEMENT * p + k,
                    term_to_message(term),
                );
            }
        }
        Self {
            message_count: layout_message_count(holder_bound, statement_count, proof_statements.len()),
            revealed,
            equalities,
        }
    }

    fn revealed_indices(&self) -> BTreeSet<usize> {
        self.revealed.keys().copied().collect()
    }
}

fn is_holder_bound(cryptosuite: &str) -> Option<bool> {
    match cryptosuite {
        CRYPTOSUITE_SIGN => Some(false),
        CRYPTOSUITE_BOUND_SIGN => Some(true),
        _ => None,
    }
}

/// Append a credential's layout and its proof's challenge contribution
fn append_credential(
    transcript: &mut MerlinTranscript,
    statement_count: u32,
    index_map: &[u32],
    contribution: impl FnOnce(&mut Vec<u8>) -> Result<()>,
) -> Result<()> {
    transcript.append(STATEMENT_COUNT_LABEL, &statement_count)?;
    transcript.append(INDEX_MAP_LABEL, &index_map)?;
    let mut bytes = Vec::new();
    contribution(&mut bytes)?;
    transcript.append_bytes(CREDENTIAL_PROOF_LABEL, &bytes);
    Ok(())
}

fn new_transcript(nonce: &str, domain: Option<&str>, credential_count: usize) -> MerlinTranscript {
    let mut transcript = new_merlin_transcript(PRESENTATION_TRANSCRIPT_LABEL);
    transcript.append_bytes(NONCE_LABEL, nonce.as_bytes());
    if let Some(domain) = domain {
        transcript.append_bytes(DOMAIN_LABEL, domain.as_bytes());
    }
    transcript.append_bytes(CREDENTIAL_COUNT_LABEL, &(credential_count as u64).to_le_bytes());
    transcript
}

/// Prover's state for one credential before the challenge is known
struct PendingProof {
    statement_count: u32,
    index_map: Vec<u32>,
    protocol: PoKOfSignatureG1Protocol<Bls12_381>,
}

pub fn derive_proof(
    backend: &Backend,
    request: &DeriveProofRequest,
    loader: &impl DocumentLoader,
) -> Result<VerifiablePresentation> {
    let params = backend.require_ready()?;
    if request.vc_with_disclosed.is_empty() {
        return Err(Error::malformed("no credential to derive a proof from"));
    }
    let deanon_map = DeanonMap::parse(&request.deanon_map)?;
    let secret = request.secret.as_deref().map(secret_to_message);
    let mut rng = backend.rng();

    let mut transcript = new_transcript(
        &request.nonce,
        request.domain.as_deref(),
        request.vc_with_disclosed.len(),
    );
    // Hidden value and blinding of each equality class
    let mut classes = BTreeMap::<EqualityClass, (Fr, Fr)>::new();
    let mut pending = Vec::with_capacity(request.vc_with_disclosed.len());

    for (i, vc) in request.vc_with_disclosed.iter().enumerate() {
        let holder_bound = is_holder_bound(&vc.vc_proof.cryptosuite).ok_or_else(|| {
            Error::InvalidCredential {
                index: i,
                reason: format!("unsupported cryptosuite {}", vc.vc_proof.cryptosuite),
            }
        })?;
        if holder_bound && secret.is_none() {
            return Err(Error::malformed(format!(
                "credential {} is holder-bound but no secret was given",
                i
            )));
        }
        let signed = match check_signature(
            params,
            &vc.vc_document,
            &vc.vc_proof,
            secret.as_ref(),
            loader,
        )? {
            Ok(signed) => signed,
            Err(reason) => return Err(Error::InvalidCredential { index: i, reason }),
        };
        if vc.disclosed_proof.config() != vc.vc_proof.config() {
            return Err(Error::malformed(format!(
                "disclosed proof of credential {} differs from its proof",
                i
            )));
        }

        let original = &signed.credential;
        let statement_count = original.statements.len();
        if statement_count > MAX_STATEMENT_COUNT {
            return Err(Error::malformed(format!(
                "credential {} has more than {} statements",
                i, MAX_STATEMENT_COUNT
            )));
        }
        let disclosed = canonicalize(&vc.disclosed_document, loader)?;
        let patterns = disclosed
            .iter()
            .map(|s| statement_pattern(s, &deanon_map))
            .collect::<Vec<_>>();
        let index_map = match_statements(&patterns, &original.statements).ok_or_else(|| {
            Error::malformed(format!(
                "disclosed document of credential {} is not a subset of it",
                i
            ))
        })?;

        let disclosure = Disclosure::new(
            i,
            holder_bound,
            statement_count,
            &disclosed,
            &index_map,
            &original.proof_statements,
        );
        let messages = original.messages(secret.as_ref())?;
        let mut blindings = BTreeMap::new();
        for (class, idx) in &disclosure.equalities {
            let value = messages[*idx];
            let blinding = match classes.entry(class.clone()) {
                Entry::Vacant(e) => e.insert((value, Fr::rand(&mut rng))).1,
                Entry::Occupied(e) => {
                    if e.get().0 != value {
                        return Err(Error::malformed(format!(
                            "{} stands for different values in credential {}",
                            class, i
                        )));
                    }
                    e.get().1
                }
            };
            blindings.insert(*idx, blinding);
        }

        let sig_params = params.signature_params(messages.len());
        let protocol = PoKOfSignatureG1Protocol::init(
            &mut rng,
            &signed.signature,
            &sig_params,
            &messages,
            blindings,
            &disclosure.revealed_indices(),
        )?;
        let statement_count = statement_count as u32;
        let index_map = index_map.into_iter().map(|i| i as u32).collect::<Vec<_>>();
        append_credential(&mut transcript, statement_count, &index_map, |w| {
            Ok(protocol.challenge_contribution(&disclosure.revealed, &sig_params, w)?)
        })?;
        debug!(
            credential = i,
            statements = statement_count,
            disclosed = disclosed.len(),
            revealed = disclosure.revealed.len(),
            hidden = messages.len() - disclosure.revealed.len(),
            "prepared credential proof"
        );
        pending.push(PendingProof {
            statement_count,
            index_map,
            protocol,
        });
    }

    let challenge = transcript.challenge_scalar::<Fr>(CHALLENGE_LABEL);
    let credentials = pending
        .into_iter()
        .map(|p| {
            Ok(CredentialProof {
                statement_count: p.statement_count,
                index_map: p.index_map,
                pok: p.protocol.gen_proof(&challenge)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let verifiable_credential = request
        .vc_with_disclosed
        .iter()
        .map(|vc| {
            let mut document = vc.disclosed_document.clone();
            let object = document
                .as_object_mut()
                .ok_or_else(|| Error::malformed("disclosed document must be a JSON object"))?;
            object.insert("proof".to_string(), vc.disclosed_proof.config().to_value()?);
            Ok(document)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(VerifiablePresentation {
        context: Value::String(PRESENTATION_CONTEXT.to_string()),
        presentation_type: vec![VERIFIABLE_PRESENTATION.to_string()],
        verifiable_credential,
        proof: PresentationProof {
            proof_type: DATA_INTEGRITY_PROOF.to_string(),
            cryptosuite: CRYPTOSUITE_PROOF.to_string(),
            proof_purpose: PRESENTATION_PROOF_PURPOSE.to_string(),
            created: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            domain: request.domain.clone(),
            proof_value: ark_to_multibase(&PresentationProofValue { credentials })?,
        },
    })
}

/// What the verifier needs to check one credential's proof after the challenge is known
struct CredentialCheck {
    disclosure: Disclosure,
    params: SignatureParamsG1<Bls12_381>,
    public_key: PublicKeyG2<Bls12_381>,
}

/// Verify a presentation for the verifier's `nonce` and, if it gave one, `domain`
pub fn verify_proof(
    backend: &Backend,
    vp: &Value,
    nonce: &str,
    domain: Option<&str>,
    loader: &impl DocumentLoader,
) -> Result<VerifyResult> {
    let params = backend.require_ready()?;
    let vp = VerifiablePresentation::deserialize(vp)
        .map_err(|e| Error::malformed(format!("invalid presentation: {}", e)))?;
    if !vp
        .presentation_type
        .iter()
        .any(|t| t == VERIFIABLE_PRESENTATION)
    {
        return Err(Error::malformed("not a verifiable presentation"));
    }
    if vp.verifiable_credential.is_empty() {
        return Err(Error::malformed("presentation has no credential"));
    }
    if vp.proof.cryptosuite != CRYPTOSUITE_PROOF {
        return Ok(VerifyResult::failure(format!(
            "unsupported cryptosuite {}",
            vp.proof.cryptosuite
        )));
    }
    let proof_value = match multibase_to_ark::<PresentationProofValue>(&vp.proof.proof_value) {
        Ok(v) => v,
        Err(e) => return Ok(VerifyResult::failure(format!("invalid proofValue: {}", e))),
    };
    if proof_value.credentials.len() != vp.verifiable_credential.len() {
        return Ok(VerifyResult::failure(format!(
            "proof covers {} credentials but {} are presented",
            proof_value.credentials.len(),
            vp.verifiable_credential.len()
        )));
    }

    let mut transcript = new_transcript(nonce, domain, vp.verifiable_credential.len());
    let mut checks = Vec::with_capacity(proof_value.credentials.len());
    for (i, (credential, proof)) in vp
        .verifiable_credential
        .iter()
        .zip(&proof_value.credentials)
        .enumerate()
    {
        let mut document = credential.clone();
        let config = document
            .as_object_mut()
            .ok_or_else(|| Error::malformed(format!("credential {} is not a JSON object", i)))?
            .remove("proof")
            .ok_or_else(|| Error::malformed(format!("credential {} has no proof", i)))?;
        let config = Proof::from_value(&config)?;
        let Some(holder_bound) = is_holder_bound(&config.cryptosuite) else {
            return Ok(credential_failure(
                i,
                format!("unsupported cryptosuite {}", config.cryptosuite),
            ));
        };

        let method = load_verification_method(loader, &config.verification_method)?;
        if let Err(reason) = check_issuer(&document, &method) {
            return Ok(credential_failure(i, reason));
        }
        let public_key = multibase_to_ark::<PublicKeyG2<Bls12_381>>(&method.public_key_multibase)?;
        if !public_key.is_valid() {
            return Ok(credential_failure(i, "invalid public key"));
        }

        let disclosed = canonicalize(&document, loader)?;
        let proof_statements = proof_statements(&config)?;
        let statement_count = proof.statement_count as usize;
        let index_map = match check_index_map(&proof.index_map, disclosed.len(), statement_count) {
            Ok(index_map) => index_map,
            Err(reason) => return Ok(credential_failure(i, reason)),
        };

        let disclosure = Disclosure::new(
            i,
            holder_bound,
            statement_count,
            &disclosed,
            &index_map,
            &proof_statements,
        );
        let sig_params = params.signature_params(disclosure.message_count);
        append_credential(
            &mut transcript,
            proof.statement_count,
            &proof.index_map,
            |w| Ok(proof.pok.challenge_contribution(&disclosure.revealed, &sig_params, w)?),
        )?;
        checks.push(CredentialCheck {
            disclosure,
            params: sig_params,
            public_key,
        });
    }

    let challenge = transcript.challenge_scalar::<Fr>(CHALLENGE_LABEL);
    // First credential and response seen for each equality class
    let mut responses = BTreeMap::<EqualityClass, (usize, Fr)>::new();
    for (i, (check, proof)) in checks.iter().zip(&proof_value.credentials).enumerate() {
        if let Err(e) = proof.pok.verify(
            &check.disclosure.revealed,
            &challenge,
            &check.public_key,
            &check.params,
        ) {
            return Ok(credential_failure(i, format!("proof does not verify: {:?}", e)));
        }
        let revealed = check.disclosure.revealed_indices();
        for (class, idx) in &check.disclosure.equalities {
            let response = match proof.pok.get_resp_for_message(*idx, &revealed) {
                Ok(r) => *r,
                Err(e) => return Ok(credential_failure(i, format!("{:?}", e))),
            };
            match responses.entry(class.clone()) {
                Entry::Vacant(e) => {
                    e.insert((i, response));
                }
                Entry::Occupied(e) if e.get().1 != response => {
                    return Ok(credential_failure(
                        i,
                        format!(
                            "{} is not the same as in credential {}",
                            class,
                            e.get().0
                        ),
                    ));
                }
                Entry::Occupied(_) => {}
            }
        }
    }
    debug!(credentials = checks.len(), "presentation verified");
    Ok(VerifyResult::success())
}

fn credential_failure(index: usize, reason: impl fmt::Display) -> VerifyResult {
    warn!(credential = index, %reason, "presentation does not verify");
    VerifyResult::failure(format!("credential {}: {}", index, reason))
}

/// Each disclosed statement maps to a distinct original statement
fn check_index_map(
    index_map: &[u32],
    disclosed_count: usize,
    statement_count: usize,
) -> std::result::Result<Vec<usize>, String> {
    if statement_count > MAX_STATEMENT_COUNT {
        return Err(format!("more than {} statements", MAX_STATEMENT_COUNT));
    }
    if index_map.len() != disclosed_count {
        return Err(format!(
            "{} disclosed statements but {} indices",
            disclosed_count,
            index_map.len()
        ));
    }
    let mut seen = BTreeSet::new();
    index_map
        .iter()
        .map(|i| {
            let i = *i as usize;
            if i >= statement_count {
                Err(format!("statement index {} out of range", i))
            } else if !seen.insert(i) {
                Err(format!("statement index {} is repeated", i))
            } else {
                Ok(i)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        loader::StaticDocumentLoader,
        signature::{key_gen, sign, KeyPair},
    };
    use serde_json::json;
    use test_utils::ld::*;

    struct Fixture {
        backend: Backend,
        loader: StaticDocumentLoader,
    }

    impl Fixture {
        fn new() -> Self {
            let backend = Backend::default();
            backend.initialize();
            let mut loader: StaticDocumentLoader = contexts().into_iter().collect();
            for issuer in [ISSUER_0, ISSUER_1] {
                let KeyPair {
                    secret_key,
                    public_key,
                } = key_gen(&backend).unwrap();
                loader.insert(
                    verification_method_id(issuer),
                    verification_method(issuer, &public_key, Some(&secret_key)),
                );
            }
            Self { backend, loader }
        }

        fn issue(&self, document: &Value, issuer: &str) -> Proof {
            let template = Proof::from_value(&proof_template(issuer, CRYPTOSUITE_SIGN)).unwrap();
            sign(&self.backend, document, &template, &self.loader).unwrap()
        }
    }

    fn disclose(document: &Value, proof: &Proof, disclosed_document: Value) -> VcWithDisclosed {
        VcWithDisclosed {
            vc_document: document.clone(),
            vc_proof: proof.clone(),
            disclosed_document,
            disclosed_proof: proof.config(),
        }
    }

    /// The person credential with only the subject identifier disclosed
    fn subject_only(subject: &str) -> Value {
        json!({
            "@context": [CREDENTIALS_CONTEXT, PERSON_CONTEXT],
            "id": "http://example.org/credentials/person/1",
            "type": ["VerifiableCredential", "Person"],
            "issuer": ISSUER_0,
            "credentialSubject": {
                "id": HOLDER,
                "subject": subject
            }
        })
    }

    fn request(vcs: Vec<VcWithDisclosed>, nonce: &str) -> DeriveProofRequest {
        DeriveProofRequest {
            vc_with_disclosed: vcs,
            deanon_map: HashMap::new(),
            nonce: nonce.to_string(),
            secret: None,
            domain: None,
        }
    }

    #[test]
    fn disclose_and_verify() {
        let f = Fixture::new();
        let doc = person_credential(ISSUER_0, "A", 30);
        let proof = f.issue(&doc, ISSUER_0);

        let req = request(vec![disclose(&doc, &proof, subject_only("A"))], "n1");
        let vp = derive_proof(&f.backend, &req, &f.loader).unwrap();
        assert_eq!(vp.verifiable_credential.len(), 1);
        assert_eq!(vp.proof.cryptosuite, CRYPTOSUITE_PROOF);
        assert!(vp.verifiable_credential[0]["proof"].get("proofValue").is_none());

        let vp = vp.to_value().unwrap();
        assert_eq!(
            verify_proof(&f.backend, &vp, "n1", None, &f.loader).unwrap(),
            VerifyResult::success()
        );
        let replayed = verify_proof(&f.backend, &vp, "n2", None, &f.loader).unwrap();
        assert!(!replayed.verified);
        assert!(replayed.error.unwrap().starts_with("credential 0"));

        // Hidden values are not in the presentation
        let text = vp.to_string();
        assert!(!text.contains("Alice"));
        assert!(!text.contains("1000001"));
    }

    #[test]
    fn tampered_presentation() {
        let f = Fixture::new();
        let doc = person_credential(ISSUER_0, "A", 30);
        let proof = f.issue(&doc, ISSUER_0);
        let req = request(vec![disclose(&doc, &proof, subject_only("A"))], "n1");
        let vp = derive_proof(&f.backend, &req, &f.loader).unwrap().to_value().unwrap();

        let mut changed = vp.clone();
        changed["verifiableCredential"][0]["credentialSubject"]["subject"] = json!("B");
        assert!(!verify_proof(&f.backend, &changed, "n1", None, &f.loader).unwrap().verified);

        let mut garbage = vp.clone();
        garbage["proof"]["proofValue"] = json!("uAAAA");
        assert!(!verify_proof(&f.backend, &garbage, "n1", None, &f.loader).unwrap().verified);

        let mut missing = vp;
        missing["verifiableCredential"][0]
            .as_object_mut()
            .unwrap()
            .remove("proof");
        assert!(matches!(
            verify_proof(&f.backend, &missing, "n1", None, &f.loader),
            Err(Error::MalformedInput(_))
        ));
        assert!(verify_proof(&f.backend, &json!({"not": "a vp"}), "n1", None, &f.loader).is_err());
    }

    #[test]
    fn presentation_without_credentials() {
        let f = Fixture::new();
        let empty = VerifiablePresentation {
            context: json!(PRESENTATION_CONTEXT),
            presentation_type: vec![VERIFIABLE_PRESENTATION.to_string()],
            verifiable_credential: vec![],
            proof: PresentationProof {
                proof_type: DATA_INTEGRITY_PROOF.to_string(),
                cryptosuite: CRYPTOSUITE_PROOF.to_string(),
                proof_purpose: PRESENTATION_PROOF_PURPOSE.to_string(),
                created: "2024-01-01T00:00:00Z".to_string(),
                domain: None,
                proof_value: ark_to_multibase(&PresentationProofValue {
                    credentials: vec![],
                })
                .unwrap(),
            },
        }
        .to_value()
        .unwrap();
        for nonce in ["n1", "n2"] {
            assert!(matches!(
                verify_proof(&f.backend, &empty, nonce, None, &f.loader),
                Err(Error::MalformedInput(_))
            ));
        }
    }

    #[test]
    fn bound_to_domain() {
        let f = Fixture::new();
        let doc = person_credential(ISSUER_0, "A", 30);
        let proof = f.issue(&doc, ISSUER_0);
        let mut req = request(vec![disclose(&doc, &proof, subject_only("A"))], "n1");
        req.domain = Some("verifier.example.org".to_string());
        let vp = derive_proof(&f.backend, &req, &f.loader).unwrap();
        assert_eq!(vp.proof.domain.as_deref(), Some("verifier.example.org"));
        let vp = vp.to_value().unwrap();

        assert!(
            verify_proof(&f.backend, &vp, "n1", Some("verifier.example.org"), &f.loader)
                .unwrap()
                .verified
        );
        assert!(
            !verify_proof(&f.backend, &vp, "n1", Some("other.example.org"), &f.loader)
                .unwrap()
                .verified
        );
        assert!(!verify_proof(&f.backend, &vp, "n1", None, &f.loader).unwrap().verified);

        // Presentation made without a domain does not verify under one
        let req = request(vec![disclose(&doc, &proof, subject_only("A"))], "n1");
        let vp = derive_proof(&f.backend, &req, &f.loader).unwrap().to_value().unwrap();
        assert!(
            !verify_proof(&f.backend, &vp, "n1", Some("verifier.example.org"), &f.loader)
                .unwrap()
                .verified
        );
    }

    #[test]
    fn invalid_requests() {
        let f = Fixture::new();
        let doc = person_credential(ISSUER_0, "A", 30);
        let proof = f.issue(&doc, ISSUER_0);

        // Claim absent from the credential
        let forged = request(vec![disclose(&doc, &proof, subject_only("B"))], "n1");
        assert!(matches!(
            derive_proof(&f.backend, &forged, &f.loader),
            Err(Error::MalformedInput(_))
        ));

        // Credential whose signature does not verify
        let mut other_doc = doc.clone();
        other_doc["credentialSubject"]["age"] = json!(40);
        let invalid = request(vec![disclose(&other_doc, &proof, subject_only("A"))], "n1");
        assert!(matches!(
            derive_proof(&f.backend, &invalid, &f.loader),
            Err(Error::InvalidCredential { index: 0, .. })
        ));

        // Disclosed proof configuration differs
        let mut vc = disclose(&doc, &proof, subject_only("A"));
        vc.disclosed_proof.created = Some("2030-01-01T00:00:00Z".to_string());
        assert!(derive_proof(&f.backend, &request(vec![vc], "n1"), &f.loader).is_err());

        assert!(derive_proof(&f.backend, &request(vec![], "n1"), &f.loader).is_err());
    }

    #[test]
    fn hidden_subject_across_credentials() {
        let f = Fixture::new();
        let person = person_credential(ISSUER_0, "A", 30);
        let person_proof = f.issue(&person, ISSUER_0);
        let employment = employment_credential(ISSUER_1);
        let employment_proof = f.issue(&employment, ISSUER_1);

        // Same placeholder hides the holder in both credentials
        let mut disclosed_person = subject_only("A");
        disclosed_person["credentialSubject"]["id"] = json!("_:holder");
        let disclosed_employment = json!({
            "@context": [CREDENTIALS_CONTEXT, EMPLOYMENT_CONTEXT],
            "id": "http://example.org/credentials/employment/7",
            "type": ["VerifiableCredential", "EmploymentCredential"],
            "issuer": ISSUER_1,
            "credentialSubject": {
                "id": "_:holder",
                "jobTitle": "Engineer"
            }
        });
        let mut req = request(
            vec![
                disclose(&person, &person_proof, disclosed_person),
                disclose(&employment, &employment_proof, disclosed_employment),
            ],
            "n1",
        );
        req.deanon_map
            .insert("_:holder".to_string(), format!("<{}>", HOLDER));
        let vp = derive_proof(&f.backend, &req, &f.loader).unwrap().to_value().unwrap();
        assert!(!vp.to_string().contains(HOLDER));
        assert!(verify_proof(&f.backend, &vp, "n1", None, &f.loader).unwrap().verified);

        // Swapping credentials breaks the transcript
        let mut swapped = vp.clone();
        let creds = swapped["verifiableCredential"].as_array_mut().unwrap();
        creds.swap(0, 1);
        assert!(!verify_proof(&f.backend, &swapped, "n1", None, &f.loader).unwrap().verified);
    }

    #[test]
    fn index_map_checks() {
        assert_eq!(check_index_map(&[2, 0], 2, 3), Ok(vec![2, 0]));
        assert!(check_index_map(&[0], 2, 3).is_err());
        assert!(check_index_map(&[0, 3], 2, 3).is_err());
        assert!(check_index_map(&[1, 1], 2, 3).is_err());
        assert!(check_index_map(&[], 0, MAX_STATEMENT_COUNT + 1).is_err());
    }

    #[test]
    fn not_ready() {
        let backend = Backend::default();
        let loader = StaticDocumentLoader::new();
        assert!(matches!(
            derive_proof(&backend, &request(vec![], "n1"), &loader),
            Err(Error::NotReady)
        ));
        assert!(matches!(
            verify_proof(&backend, &json!({}), "n1", None, &loader),
            Err(Error::NotReady)
        ));
    }
}
