//! JSON-LD fixtures shared by the credential tests: contexts, credentials, verification methods and
//! proof templates. Key material is generated by the tests themselves.

use serde_json::{json, Value};

pub const CREDENTIALS_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const PERSON_CONTEXT: &str = "https://schema.example.org/person/v1";
pub const EMPLOYMENT_CONTEXT: &str = "https://schema.example.org/employment/v1";

pub const ISSUER_0: &str = "did:example:issuer0";
pub const ISSUER_1: &str = "did:example:issuer1";
pub const HOLDER: &str = "did:example:holder";

/// Id of the verification method of `issuer`
pub fn verification_method_id(issuer: &str) -> String {
    format!("{}#bls12_381-g2-pub001", issuer)
}

pub fn credentials_context() -> Value {
    json!({
        "@context": {
            "@version": 1.1,
            "id": "@id",
            "type": "@type",
            "cred": "https://www.w3.org/2018/credentials#",
            "xsd": "http://www.w3.org/2001/XMLSchema#",
            "VerifiableCredential": "cred:VerifiableCredential",
            "credentialSubject": {"@id": "cred:credentialSubject", "@type": "@id"},
            "issuer": {"@id": "cred:issuer", "@type": "@id"},
            "issuanceDate": {"@id": "cred:issuanceDate", "@type": "xsd:dateTime"},
            "expirationDate": {"@id": "cred:expirationDate", "@type": "xsd:dateTime"}
        }
    })
}

pub fn person_context() -> Value {
    json!({
        "@context": {
            "@vocab": "https://schema.example.org/vocab#",
            "schema": "http://schema.org/",
            "xsd": "http://www.w3.org/2001/XMLSchema#",
            "Person": "schema:Person",
            "name": "schema:name",
            "subject": "schema:identifier",
            "age": {"@id": "schema:age", "@type": "xsd:integer"},
            "height": {"@id": "schema:height", "@type": "xsd:double"},
            "homeLocation": {"@id": "schema:homeLocation"}
        }
    })
}

pub fn employment_context() -> Value {
    json!({
        "@context": {
            "schema": "http://schema.org/",
            "EmploymentCredential": "https://schema.example.org/vocab#EmploymentCredential",
            "worksFor": {"@id": "schema:worksFor", "@type": "@id"},
            "jobTitle": "schema:jobTitle",
            "active": {"@id": "https://schema.example.org/vocab#active", "@type": "http://www.w3.org/2001/XMLSchema#boolean"}
        }
    })
}

/// Every context as `(url, document)`
pub fn contexts() -> Vec<(String, Value)> {
    vec![
        (CREDENTIALS_CONTEXT.to_string(), credentials_context()),
        (PERSON_CONTEXT.to_string(), person_context()),
        (EMPLOYMENT_CONTEXT.to_string(), employment_context()),
    ]
}

/// Verification method document. `secret_key` is only present in the issuer's own loader.
pub fn verification_method(issuer: &str, public_key: &str, secret_key: Option<&str>) -> Value {
    let mut vm = json!({
        "id": verification_method_id(issuer),
        "type": "Multikey",
        "controller": issuer,
        "publicKeyMultibase": public_key,
    });
    if let Some(sk) = secret_key {
        vm["secretKeyMultibase"] = Value::String(sk.to_string());
    }
    vm
}

/// Credential whose subject has the given identifier and age
pub fn person_credential(issuer: &str, subject: &str, age: u64) -> Value {
    json!({
        "@context": [CREDENTIALS_CONTEXT, PERSON_CONTEXT],
        "id": "http://example.org/credentials/person/1",
        "type": ["VerifiableCredential", "Person"],
        "issuer": issuer,
        "issuanceDate": "2024-01-01T00:00:00Z",
        "credentialSubject": {
            "id": HOLDER,
            "subject": subject,
            "name": "Alice",
            "age": age,
            "height": 1.65,
            "homeLocation": {
                "name": "Somewhere",
                "postalCode": "1000001"
            }
        }
    })
}

pub fn employment_credential(issuer: &str) -> Value {
    json!({
        "@context": [CREDENTIALS_CONTEXT, EMPLOYMENT_CONTEXT],
        "id": "http://example.org/credentials/employment/7",
        "type": ["VerifiableCredential", "EmploymentCredential"],
        "issuer": issuer,
        "issuanceDate": "2024-02-01T00:00:00Z",
        "credentialSubject": {
            "id": HOLDER,
            "worksFor": "did:example:acme",
            "jobTitle": "Engineer",
            "active": true
        }
    })
}

pub fn proof_template(issuer: &str, cryptosuite: &str) -> Value {
    json!({
        "type": "DataIntegrityProof",
        "cryptosuite": cryptosuite,
        "created": "2024-01-01T00:00:00Z",
        "verificationMethod": verification_method_id(issuer),
        "proofPurpose": "assertionMethod"
    })
}
