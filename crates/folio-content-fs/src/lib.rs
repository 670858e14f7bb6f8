// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `DocumentStore` for Folio (platform config dir or a content dir).

use directories::ProjectDirs;
use folio_app_core::document::{DocumentError, DocumentStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read JSON documents as `<key>.json` files under one directory.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    base: PathBuf,
}

impl FsDocumentStore {
    /// Store rooted at the user config directory (e.g., `~/.config/folio`).
    ///
    /// The directory is not created; a missing directory simply yields `NotFound`.
    pub fn user_config() -> Result<Self, DocumentError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "Folio")
            .ok_or_else(|| DocumentError::Other("could not resolve config dir".into()))?;
        Ok(Self::rooted(proj.config_dir()))
    }

    /// Store rooted at an explicit directory.
    pub fn rooted(base: impl AsRef<Path>) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
        }
    }

    /// Root directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl DocumentStore for FsDocumentStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, DocumentError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes = bytes.len(), "document loaded");
                Ok(bytes)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(DocumentError::NotFound),
            Err(err) => Err(DocumentError::Io(err)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use folio_app_core::document::DocumentService;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("folio-content-fs-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn reads_keyed_json_files() {
        let dir = scratch("read");
        fs::write(dir.join("experiences.json"), r#"{"experiences":[{"title":"Dev"}]}"#).unwrap();
        let svc = DocumentService::new(FsDocumentStore::rooted(&dir));
        let content = svc.load_content();
        assert_eq!(content.experiences.experiences[0].title, "Dev");
        assert!(content.about.social.is_empty());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_file_is_not_found() {
        let store = FsDocumentStore::rooted(scratch("missing"));
        assert!(matches!(store.load_raw("nope"), Err(DocumentError::NotFound)));
    }
}
