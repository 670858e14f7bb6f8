// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resolve content asset names to URIs egui's image loaders understand.

use std::path::PathBuf;

use folio_core::views::AssetResolver;

/// Looks assets up under one directory; absolute web URLs pass through.
#[derive(Clone, Debug)]
pub struct FsAssetResolver {
    root: PathBuf,
}

impl FsAssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetResolver for FsAssetResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if name.starts_with("http://") || name.starts_with("https://") {
            return Some(name.to_string());
        }
        let path = self.root.join(name.trim_start_matches('/'));
        path.is_file().then(|| format!("file://{}", path.display()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn resolves_existing_files_and_web_urls() {
        let dir = std::env::temp_dir().join(format!("folio-assets-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("thumbs")).unwrap();
        std::fs::write(dir.join("thumbs/a.png"), b"png").unwrap();
        let r = FsAssetResolver::new(&dir);

        let uri = r.resolve("/thumbs/a.png").unwrap();
        assert!(uri.starts_with("file://"));
        assert!(uri.ends_with("a.png"));
        assert_eq!(r.resolve("thumbs/missing.png"), None);
        assert_eq!(r.resolve(""), None);
        assert_eq!(
            r.resolve("https://example.com/x.jpg").as_deref(),
            Some("https://example.com/x.jpg")
        );
    }
}
