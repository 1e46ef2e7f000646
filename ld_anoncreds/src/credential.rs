//! A credential reduced to the statements it signs and their messages.
//!
//! Messages are termwise: each statement contributes the scalars of its subject, predicate and object,
//! in that order. The multi-message of a credential is laid out as
//!
//! ```text
//! [holder secret] ++ document statements ++ proof configuration statements
//! ```
//!
//! where the holder secret is only present for holder-bound credentials.

use ark_bls12_381::Fr;
use ark_std::cfg_iter;
use blake2::Blake2b512;
use ld_crypto_utils::hashing_utils::hash_to_field;
use serde_json::Value;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    canonicalize::canonicalize,
    constants::{
        CREATED, CRYPTOSUITE, CRYPTOSUITE_BOUND_SIGN, MAP_SECRET_TO_SCALAR_DST,
        MAP_TERM_TO_SCALAR_DST, PROOF_NODE_LABEL, PROOF_PURPOSE, RDF_TYPE, SECURITY_VOCAB,
        VERIFICATION_METHOD, XSD_DATE_TIME, XSD_STRING,
    },
    error::{Error, Result},
    loader::DocumentLoader,
    signature::Proof,
    term::{Statement, Term},
};

/// Messages contributed by each statement
pub const MESSAGES_PER_STATEMENT: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CanonicalCredential {
    pub statements: Vec<Statement>,
    pub proof_statements: Vec<Statement>,
    pub holder_bound: bool,
}

impl CanonicalCredential {
    pub fn new(document: &Value, proof: &Proof, loader: &impl DocumentLoader) -> Result<Self> {
        Ok(Self {
            statements: canonicalize(document, loader)?,
            proof_statements: proof_statements(proof)?,
            holder_bound: proof.cryptosuite == CRYPTOSUITE_BOUND_SIGN,
        })
    }

    /// Index of the first statement message
    pub fn offset(&self) -> usize {
        usize::from(self.holder_bound)
    }

    pub fn message_count(&self) -> usize {
        layout_message_count(
            self.holder_bound,
            self.statements.len(),
            self.proof_statements.len(),
        )
    }

    /// Messages of the statements, without the holder secret
    pub fn statement_messages(&self) -> Vec<Fr> {
        let mut messages = statements_to_messages(&self.statements);
        messages.extend(statements_to_messages(&self.proof_statements));
        messages
    }

    /// The full multi-message. Holder-bound credentials need the holder secret.
    pub fn messages(&self, secret: Option<&Fr>) -> Result<Vec<Fr>> {
        let mut messages = Vec::with_capacity(self.message_count());
        if self.holder_bound {
            let secret = secret
                .ok_or_else(|| Error::malformed("holder-bound credential requires the holder secret"))?;
            messages.push(*secret);
        }
        messages.extend(self.statement_messages());
        Ok(messages)
    }
}

pub(crate) fn layout_message_count(
    holder_bound: bool,
    statement_count: usize,
    proof_statement_count: usize,
) -> usize {
    usize::from(holder_bound) + MESSAGES_PER_STATEMENT * (statement_count + proof_statement_count)
}

pub(crate) fn term_to_message(term: &Term) -> Fr {
    hash_to_field::<Fr, Blake2b512>(MAP_TERM_TO_SCALAR_DST, term.to_ntriples().as_bytes())
}

pub(crate) fn secret_to_message(secret: &[u8]) -> Fr {
    hash_to_field::<Fr, Blake2b512>(MAP_SECRET_TO_SCALAR_DST, secret)
}

pub(crate) fn statements_to_messages(statements: &[Statement]) -> Vec<Fr> {
    cfg_iter!(statements)
        .map(|s| s.terms().map(term_to_message))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Statements of the proof configuration, i.e. the proof without its value. They describe the
/// blank node `_:proof`.
pub(crate) fn proof_statements(proof: &Proof) -> Result<Vec<Statement>> {
    let subject = Term::blank(PROOF_NODE_LABEL);
    let mut statements = vec![
        Statement::new(
            subject.clone(),
            Term::iri(RDF_TYPE),
            Term::Iri(security_term(&proof.proof_type)),
        ),
        Statement::new(
            subject.clone(),
            Term::iri(CRYPTOSUITE),
            Term::literal(proof.cryptosuite.clone(), XSD_STRING),
        ),
        Statement::new(
            subject.clone(),
            Term::iri(PROOF_PURPOSE),
            Term::Iri(security_term(&proof.proof_purpose)),
        ),
    ];
    if !proof.verification_method.contains(':') {
        return Err(Error::malformed(format!(
            "verification method {} is not an absolute IRI",
            proof.verification_method
        )));
    }
    statements.push(Statement::new(
        subject.clone(),
        Term::iri(VERIFICATION_METHOD),
        Term::iri(proof.verification_method.clone()),
    ));
    if let Some(created) = &proof.created {
        statements.push(Statement::new(
            subject,
            Term::iri(CREATED),
            Term::literal(created.clone(), XSD_DATE_TIME),
        ));
    }
    statements.sort_by_cached_key(Statement::to_ntriples);
    Ok(statements)
}

fn security_term(value: &str) -> String {
    if value.contains(':') {
        value.to_string()
    } else {
        format!("{}{}", SECURITY_VOCAB, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::CRYPTOSUITE_SIGN, loader::StaticDocumentLoader};
    use test_utils::ld::*;

    #[test]
    fn layout() {
        let loader: StaticDocumentLoader = contexts().into_iter().collect();
        let doc = person_credential(ISSUER_0, "A", 30);
        let proof = Proof::from_value(&proof_template(ISSUER_0, CRYPTOSUITE_SIGN)).unwrap();
        let credential = CanonicalCredential::new(&doc, &proof, &loader).unwrap();
        assert!(!credential.holder_bound);
        assert_eq!(credential.proof_statements.len(), 5);
        assert_eq!(
            credential.message_count(),
            3 * (credential.statements.len() + 5)
        );

        let messages = credential.messages(None).unwrap();
        assert_eq!(messages.len(), credential.message_count());
        assert_eq!(messages[0], term_to_message(&credential.statements[0].subject));
        assert_eq!(messages[4], term_to_message(&credential.statements[1].predicate));
        let first_proof_msg = 3 * credential.statements.len();
        assert_eq!(
            messages[first_proof_msg],
            term_to_message(&Term::blank(PROOF_NODE_LABEL))
        );

        let mut bound_proof = proof;
        bound_proof.cryptosuite = CRYPTOSUITE_BOUND_SIGN.to_string();
        let bound = CanonicalCredential::new(&doc, &bound_proof, &loader).unwrap();
        assert!(bound.holder_bound);
        assert_eq!(bound.offset(), 1);
        assert!(matches!(bound.messages(None), Err(Error::MalformedInput(_))));
        let secret = secret_to_message(b"holder secret");
        let bound_messages = bound.messages(Some(&secret)).unwrap();
        assert_eq!(bound_messages[0], secret);
        assert_eq!(bound_messages.len(), bound.message_count());
        // The cryptosuite is signed
        assert_ne!(bound_messages[1..], messages[..]);
    }

    #[test]
    fn proof_configuration() {
        let mut proof = Proof::from_value(&proof_template(ISSUER_0, CRYPTOSUITE_SIGN)).unwrap();
        let lines = proof_statements(&proof)
            .unwrap()
            .iter()
            .map(Statement::to_ntriples)
            .collect::<Vec<_>>();
        assert!(lines.contains(&format!(
            "_:proof <{}> <https://w3id.org/security#DataIntegrityProof> .",
            RDF_TYPE
        )));
        assert!(lines.contains(
            &"_:proof <https://w3id.org/security#proofPurpose> <https://w3id.org/security#assertionMethod> ."
                .to_string()
        ));

        proof.created = None;
        assert_eq!(proof_statements(&proof).unwrap().len(), 4);
        proof.verification_method = "key-1".to_string();
        assert!(proof_statements(&proof).is_err());
    }
}
