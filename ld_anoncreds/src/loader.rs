//! Resolution of contexts and verification methods.
//!
//! The crate never performs I/O. Every URL it needs, JSON-LD contexts and verification method
//! documents, is resolved through a caller supplied [`DocumentLoader`]. Loaders are synchronous;
//! a caller with an asynchronous source pre-fetches or blocks inside `load`.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("failed to load {url}: {reason}")]
    Failed { url: String, reason: String },
}

pub trait DocumentLoader {
    fn load(&self, url: &str) -> Result<Value, LoaderError>;
}

impl<F> DocumentLoader for F
where
    F: Fn(&str) -> Result<Value, LoaderError>,
{
    fn load(&self, url: &str) -> Result<Value, LoaderError> {
        self(url)
    }
}

/// Loader over an in-memory map from URL to document
#[derive(Clone, Debug, Default)]
pub struct StaticDocumentLoader {
    documents: HashMap<String, Value>,
}

impl StaticDocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, document: Value) -> Option<Value> {
        self.documents.insert(url.into(), document)
    }

    pub fn with(mut self, url: impl Into<String>, document: Value) -> Self {
        self.insert(url, document);
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentLoader for StaticDocumentLoader {
    fn load(&self, url: &str) -> Result<Value, LoaderError> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| LoaderError::NotFound(url.to_string()))
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for StaticDocumentLoader {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<S: Into<String>> Extend<(S, Value)> for StaticDocumentLoader {
    fn extend<I: IntoIterator<Item = (S, Value)>>(&mut self, iter: I) {
        self.documents
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v)));
    }
}

/// Key material published for an issuer
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type", default)]
    pub method_type: Option<String>,
    #[serde(default)]
    pub controller: Option<String>,
    pub public_key_multibase: String,
    #[serde(default)]
    pub secret_key_multibase: Option<String>,
}

/// Dereference a verification method. The loader may return the method itself or a controller
/// document listing it under `verificationMethod`, in which case the URL without fragment is tried too.
pub(crate) fn load_verification_method(
    loader: &impl DocumentLoader,
    url: &str,
) -> crate::Result<VerificationMethod> {
    let document = match loader.load(url) {
        Ok(doc) => doc,
        Err(LoaderError::NotFound(_)) if url.contains('#') => {
            let base = url.split('#').next().unwrap_or(url);
            loader.load(base)?
        }
        Err(e) => return Err(e.into()),
    };
    let method = find_method(&document, url).ok_or_else(|| {
        crate::Error::malformed(format!("no verification method {} in loaded document", url))
    })?;
    VerificationMethod::deserialize(method).map_err(|e| {
        crate::Error::malformed(format!("invalid verification method {}: {}", url, e))
    })
}

fn find_method<'a>(document: &'a Value, url: &str) -> Option<&'a Value> {
    if document.get("id").and_then(Value::as_str) == Some(url) {
        return Some(document);
    }
    document
        .get("verificationMethod")
        .and_then(Value::as_array)?
        .iter()
        .find(|m| m.get("id").and_then(Value::as_str) == Some(url))
}
