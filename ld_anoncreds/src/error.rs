use ark_serialize::SerializationError;
use bbs_plus::error::BBSPlusError;
use ld_crypto_utils::multibase_utils::MultibaseError;
use schnorr_pok::error::SchnorrError;
use serde::{Deserialize, Serialize};

use crate::loader::LoaderError;

/// Hard failures. A signature or proof that does not verify is not an error, it is reported
/// through [`VerifyResult`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cryptographic backend is not initialized")]
    NotReady,
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("credential {index} is invalid: {reason}")]
    InvalidCredential { index: usize, reason: String },
    #[error("backend failure: {0}")]
    Backend(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }
}

impl From<BBSPlusError> for Error {
    fn from(e: BBSPlusError) -> Self {
        Self::Backend(format!("{:?}", e))
    }
}

impl From<SchnorrError> for Error {
    fn from(e: SchnorrError) -> Self {
        Self::Backend(format!("{:?}", e))
    }
}

impl From<SerializationError> for Error {
    fn from(e: SerializationError) -> Self {
        Self::Backend(e.to_string())
    }
}

/// Multibase strings are decoded from caller input, so a bad one is malformed input
impl From<MultibaseError> for Error {
    fn from(e: MultibaseError) -> Self {
        Self::MalformedInput(e.to_string())
    }
}

/// Outcome of a verification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResult {
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyResult {
    pub fn success() -> Self {
        Self {
            verified: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            verified: false,
            error: Some(error.into()),
        }
    }
}
