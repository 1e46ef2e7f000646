//! Anonymous credentials over JSON-LD documents.
//!
//! A credential is canonicalized into RDF statements and every term of every statement becomes one
//! message of a BBS+ signature (termwise signing). A holder can later present any subset of the
//! statements, hiding terms behind blank nodes, and prove in zero knowledge that the presented
//! statements belong to a credential signed by the issuer.
//!
//! Provides
//! - key generation, signing and verification of credentials - [`signature`]
//! - blind issuance of credentials bound to a holder secret - [`blind`]
//! - presentations with selective disclosure bound to a nonce - [`presentation`]
//! - ElGamal encryption of identifiers - [`elgamal`]
//!
//! Every operation takes a [`Backend`] which must have been initialized once with
//! [`Backend::initialize`]. Documents are canonicalized with contexts and verification methods
//! resolved through a caller-supplied [`DocumentLoader`].
//!
//! ## Message layout
//!
//! The messages of a credential are `[holder secret] ++ document statements ++ proof configuration
//! statements`, 3 messages per statement. The holder secret is only present in holder-bound
//! credentials, i.e. those issued with [`blind::blind_sign`].

pub mod backend;
pub mod blind;
pub mod canonicalize;
pub mod constants;
mod credential;
pub mod elgamal;
pub mod error;
pub mod loader;
pub mod matching;
pub mod presentation;
pub mod signature;
pub mod term;

pub use backend::{Backend, BackendConfig, BackendParams, BackendState};
pub use blind::{
    blind_sign, blind_verify, request_blind_sign, unblind, verify_blind_sign_request,
    BlindSignRequest, BlindSignRequestWithBlinding,
};
pub use elgamal::{
    elliptic_elgamal_decrypt, elliptic_elgamal_key_gen, encrypt_uid, uid_matches, EncryptedUid,
};
pub use error::{Error, Result, VerifyResult};
pub use loader::{DocumentLoader, LoaderError, StaticDocumentLoader, VerificationMethod};
pub use matching::DeanonMap;
pub use presentation::{
    derive_proof, verify_proof, DeriveProofRequest, PresentationProof, VcWithDisclosed,
    VerifiablePresentation,
};
pub use signature::{key_gen, sign, verify, KeyPair, Proof};
