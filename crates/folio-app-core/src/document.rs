// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Read-only document service and storage port.
//!
//! Folio never writes anything: settings and content are loaded at startup and
//! navigation/render state resets on every launch.

use folio_core::content::{ContentBundle, ContentKey};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

/// Storage port for raw JSON documents (keyed by logical name).
pub trait DocumentStore {
    /// Load a raw document. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, DocumentError>;
}

/// Error type for document operations.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// I/O error while reading.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Thin service that decodes documents and delegates storage to a `DocumentStore`.
pub struct DocumentService<S> {
    store: S,
}

impl<S> DocumentService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> DocumentService<S>
where
    S: DocumentStore,
{
    /// Load and deserialize the document for `key`. Returns `Ok(None)` if missing.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, DocumentError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) => {
                if bytes.is_empty() {
                    return Ok(None);
                }
                let value = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            Err(DocumentError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Like [`DocumentService::load`], but any failure is logged and replaced by the default.
    pub fn load_or_default<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.load(key) {
            Ok(Some(v)) => v,
            Ok(None) => T::default(),
            Err(err) => {
                warn!(key, error = %err, "document unreadable; using defaults");
                T::default()
            }
        }
    }

    /// Raw text of a document, logging anything other than a plain miss.
    pub fn load_text(&self, key: &str) -> Option<String> {
        match self.store.load_raw(key) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(s) => Some(s),
                Err(err) => {
                    warn!(key, error = %err, "document is not UTF-8");
                    None
                }
            },
            Err(DocumentError::NotFound) => None,
            Err(err) => {
                warn!(key, error = %err, "document read failed");
                None
            }
        }
    }

    /// Every portfolio content document, each falling back to its empty default.
    pub fn load_content(&self) -> ContentBundle {
        ContentBundle::from_raw(|key: ContentKey| self.load_text(key.as_str()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MemStore(HashMap<&'static str, &'static str>);

    impl DocumentStore for MemStore {
        fn load_raw(&self, key: &str) -> Result<Vec<u8>, DocumentError> {
            match key {
                "denied" => Err(DocumentError::Other("permission denied".into())),
                _ => self
                    .0
                    .get(key)
                    .map(|s| s.as_bytes().to_vec())
                    .ok_or(DocumentError::NotFound),
            }
        }
    }

    #[derive(Debug, Default, PartialEq, serde::Deserialize)]
    struct Thing {
        n: u32,
    }

    fn service() -> DocumentService<MemStore> {
        DocumentService::new(MemStore(HashMap::from([
            ("thing", r#"{"n":7}"#),
            ("bad", "{"),
            ("empty", ""),
            ("about", r#"{"profile":{"name":"Ada"}}"#),
        ])))
    }

    #[test]
    fn missing_and_empty_are_none() {
        let svc = service();
        assert_eq!(svc.load::<Thing>("thing").unwrap(), Some(Thing { n: 7 }));
        assert!(svc.load::<Thing>("nope").unwrap().is_none());
        assert!(svc.load::<Thing>("empty").unwrap().is_none());
        assert!(svc.load::<Thing>("bad").is_err());
        assert!(svc.load::<Thing>("denied").is_err());
    }

    #[test]
    fn lenient_loads_fall_back() {
        let svc = service();
        assert_eq!(svc.load_or_default::<Thing>("bad"), Thing::default());
        assert_eq!(svc.load_or_default::<Thing>("denied"), Thing::default());
        let content = svc.load_content();
        assert_eq!(content.about.profile.name, "Ada");
        assert!(content.projects.projects.is_empty());
    }
}
