//! On-disk home of the tweak document.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Notices};
use crate::tweaks::Configuration;

const LEGACY_FILE_NAME: &str = "data.yaml";

#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the storage directory and drops the stale copy older builds
    /// left next to the executable.
    pub fn prepare(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Persist {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        if let Some(legacy) = legacy_copy() {
            self.remove_stale_copy(&legacy);
        }
        Ok(())
    }

    /// Deletes `legacy` unless it is, under any spelling, the document itself.
    /// Anything that can't be resolved is left alone.
    fn remove_stale_copy(&self, legacy: &Path) -> bool {
        if !legacy.is_file() {
            return false;
        }
        let (Some(stale), Some(document)) = (resolve(legacy), resolve(&self.path)) else {
            tracing::debug!(path = %legacy.display(), "could not resolve legacy copy, keeping it");
            return false;
        };
        if stale == document {
            return false;
        }

        match fs::remove_file(legacy) {
            Ok(()) => {
                tracing::info!(path = %legacy.display(), "removed legacy copy");
                true
            }
            Err(e) => {
                tracing::debug!(path = %legacy.display(), "could not remove legacy copy: {}", e);
                false
            }
        }
    }

    /// `Ok(None)` when there is nothing stored yet.
    pub fn try_load(&self) -> Result<Option<Configuration>, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        Configuration::parse(&text).map_err(|source| ConfigError::LoadParse {
            path: self.path.clone(),
            source,
        })
    }

    /// Loads the stored document. Problems become notices and read as "absent".
    pub fn load(&self, notices: &mut Notices) -> Option<Configuration> {
        match self.try_load() {
            Ok(Some(document)) => {
                tracing::debug!(path = %self.path.display(), "loaded local configuration");
                Some(document)
            }
            Ok(None) => None,
            Err(e) => {
                notices.push(e);
                None
            }
        }
    }

    /// Overwrites the stored document. A sibling temp file is renamed into
    /// place so a failed write never leaves a truncated document behind.
    pub fn persist(&self, document: &Configuration) -> Result<(), ConfigError> {
        let yaml = document.to_yaml().map_err(ConfigError::Serialize)?;
        let persist_err = |source| ConfigError::Persist {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(persist_err)?;
        }

        let tmp = self.temp_path();
        fs::write(&tmp, yaml).map_err(persist_err)?;
        if let Err(source) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(persist_err(source));
        }

        tracing::debug!(path = %self.path.display(), "saved configuration");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| LEGACY_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

// Canonical form of `path`; a file that doesn't exist yet resolves through its parent.
fn resolve(path: &Path) -> Option<PathBuf> {
    if let Ok(real) = fs::canonicalize(path) {
        return Some(real);
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    Some(fs::canonicalize(parent).ok()?.join(path.file_name()?))
}

fn legacy_copy() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join(LEGACY_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind as Kind;
    use crate::tweaks::IdentityKey;
    use tempfile::TempDir;

    const DOC: &str = "tweaks:\n  - feature: F\n    categories:\n      - category: C\n        items:\n          - name: X\n            enabled: true\n            true: echo on\n            false: echo off\ntheme:\n  mode: light\n";

    #[test]
    fn missing_file_is_absent_without_notice() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("data.yaml"));
        let mut notices = Notices::new();

        assert!(store.load(&mut notices).is_none());
        assert!(notices.is_empty());
    }

    #[test]
    fn malformed_file_is_absent_with_notice() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.yaml");
        fs::write(&path, "tweaks: [ {feature: F, categories: ").unwrap();
        let store = Store::new(&path);
        let mut notices = Notices::new();

        assert!(store.load(&mut notices).is_none());
        assert_eq!(notices.len(), 1);
        assert!(notices.has_kind(Kind::LoadParse));
    }

    #[test]
    fn persist_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("nested").join("data.yaml"));
        let original = Configuration::parse(DOC).unwrap().unwrap();

        store.persist(&original).unwrap();
        let reloaded = store.try_load().unwrap().unwrap();
        assert_eq!(reloaded, original);

        // A second save of the reloaded document is byte-identical.
        let first = fs::read_to_string(store.path()).unwrap();
        store.persist(&reloaded).unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), first);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn persist_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.yaml");
        fs::write(&path, DOC).unwrap();
        let store = Store::new(&path);

        let mut document = store.try_load().unwrap().unwrap();
        document
            .item_mut(&IdentityKey::new("F", "C", "X"))
            .unwrap()
            .enabled = false;
        store.persist(&document).unwrap();

        let reloaded = store.try_load().unwrap().unwrap();
        assert!(!reloaded.item(&IdentityKey::new("F", "C", "X")).unwrap().enabled);
    }

    #[test]
    fn stale_copy_elsewhere_is_removed() {
        let dir = TempDir::new().unwrap();
        let legacy = dir.path().join("data.yaml");
        fs::write(&legacy, DOC).unwrap();
        let store = Store::new(dir.path().join("winsane").join("data.yaml"));

        assert!(store.remove_stale_copy(&legacy));
        assert!(!legacy.exists());
    }

    #[test]
    fn stale_copy_that_is_the_document_is_kept() {
        let dir = TempDir::new().unwrap();
        let legacy = dir.path().join("data.yaml");
        fs::write(&legacy, DOC).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        for spelling in [
            dir.path().join(".").join("data.yaml"),
            dir.path().join("sub").join("..").join("data.yaml"),
        ] {
            let store = Store::new(spelling);
            assert!(!store.remove_stale_copy(&legacy));
            assert!(legacy.exists());
            assert!(store.try_load().unwrap().is_some());
        }
    }

    #[cfg(unix)]
    #[test]
    fn stale_copy_reached_through_symlink_is_kept() {
        let dir = TempDir::new().unwrap();
        let legacy = dir.path().join("data.yaml");
        fs::write(&legacy, DOC).unwrap();
        let link = dir.path().join("linked.yaml");
        std::os::unix::fs::symlink(&legacy, &link).unwrap();

        let store = Store::new(&link);
        assert!(!store.remove_stale_copy(&legacy));
        assert!(legacy.exists());
    }

    #[test]
    fn missing_stale_copy_is_ignored() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("data.yaml"));
        assert!(!store.remove_stale_copy(&dir.path().join("gone.yaml")));
    }

    #[test]
    fn persist_reports_unwritable_location() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let store = Store::new(blocker.join("data.yaml"));
        let document = Configuration::parse(DOC).unwrap().unwrap();

        let err = store.persist(&document).unwrap_err();
        assert_eq!(err.kind(), Kind::Persist);
    }
}
