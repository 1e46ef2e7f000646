//! Protocol identifiers, domain separation tags and vocabulary IRIs

pub const CRYPTOSUITE_SIGN: &str = "bbs-termwise-signature-2023";
/// Signature where message 0 is a holder secret the issuer only saw committed
pub const CRYPTOSUITE_BOUND_SIGN: &str = "bbs-termwise-bound-signature-2023";
pub const CRYPTOSUITE_PROOF: &str = "bbs-termwise-proof-2023";
pub const DATA_INTEGRITY_PROOF: &str = "DataIntegrityProof";
pub const PRESENTATION_PROOF_PURPOSE: &str = "authentication";
pub const VERIFIABLE_PRESENTATION: &str = "VerifiablePresentation";
pub const PRESENTATION_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

pub const DEFAULT_GENERATOR_LABEL: &str = "BBS_TERMWISE_MESSAGE_GENERATOR_SEED";
pub const DEFAULT_PRECOMPUTED_GENERATORS: usize = 128;
/// Largest number of statements of a credential inside a presentation
pub const MAX_STATEMENT_COUNT: usize = 4096;

pub const ELGAMAL_GENERATOR_DST: &[u8] = b"LD_ANONCREDS_ELGAMAL_GENERATOR_";
pub const MAP_TERM_TO_SCALAR_DST: &[u8] = b"BBS_TERMWISE_MAP_TERM_TO_SCALAR_";
pub const MAP_SECRET_TO_SCALAR_DST: &[u8] = b"BBS_TERMWISE_MAP_SECRET_TO_SCALAR_";
pub const MAP_UID_TO_GROUP_DST: &[u8] = b"LD_ANONCREDS_MAP_UID_TO_G1_";

pub const PRESENTATION_TRANSCRIPT_LABEL: &[u8] = b"ld-anoncreds-presentation";
pub const BLIND_SIGN_TRANSCRIPT_LABEL: &[u8] = b"ld-anoncreds-blind-sign-request";
pub const NONCE_LABEL: &[u8] = b"nonce";
pub const DOMAIN_LABEL: &[u8] = b"domain";
pub const CREDENTIAL_COUNT_LABEL: &[u8] = b"credential-count";
pub const STATEMENT_COUNT_LABEL: &[u8] = b"statement-count";
pub const INDEX_MAP_LABEL: &[u8] = b"index-map";
pub const CREDENTIAL_PROOF_LABEL: &[u8] = b"credential-proof";
pub const COMMITMENT_POK_LABEL: &[u8] = b"commitment-pok";
pub const CHALLENGE_LABEL: &[u8] = b"challenge";

/// Prefix of blank node labels assigned during canonicalization to nodes without an identifier
pub const AUTO_BLANK_NODE_PREFIX: &str = "c14n";
/// Blank node standing for the proof configuration
pub const PROOF_NODE_LABEL: &str = "proof";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

pub const SECURITY_VOCAB: &str = "https://w3id.org/security#";
pub const CRYPTOSUITE: &str = "https://w3id.org/security#cryptosuite";
pub const VERIFICATION_METHOD: &str = "https://w3id.org/security#verificationMethod";
pub const PROOF_PURPOSE: &str = "https://w3id.org/security#proofPurpose";
pub const CREATED: &str = "http://purl.org/dc/terms/created";
