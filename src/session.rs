//! The one live tweak document for this run of the program.

use std::collections::HashSet;

use crate::config::{normalize_accent, Settings, ThemeMode};
use crate::error::{ConfigError, Notices, TweakError};
use crate::reconcile::reconcile;
use crate::remote;
use crate::store::Store;
use crate::tweaks::{Configuration, IdentityKey};
use crate::utils::CommandRunner;

/// Which sources the live document was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote,
    Merged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggled {
    pub key: IdentityKey,
    pub enabled: bool,
    /// What was run; empty when the tweak has no command for that state.
    pub command: String,
}

#[derive(Debug)]
pub struct Session {
    document: Configuration,
    store: Store,
    origin: Origin,
}

impl Session {
    /// Loads, fetches, reconciles and saves. Only fails when neither a local
    /// nor a remote document could be obtained; everything else lands in
    /// `notices`.
    pub fn start(settings: &Settings, notices: &mut Notices) -> Result<Self, ConfigError> {
        let store = Store::new(&settings.document_path);
        if let Err(e) = store.prepare() {
            notices.push(e);
        }

        let local = store.load(notices);
        let remote = match settings.remote_url.as_deref() {
            Some(url) => remote::fetch(url, settings.fetch_timeout, notices),
            None => {
                tracing::debug!("offline, skipping remote configuration");
                None
            }
        };

        let origin = match (&remote, &local) {
            (Some(_), Some(_)) => Origin::Merged,
            (Some(_), None) => Origin::Remote,
            (None, Some(_)) => Origin::Local,
            (None, None) => return Err(ConfigError::Unavailable),
        };
        let document = reconcile(remote, local).ok_or(ConfigError::Unavailable)?;

        if let Err(e) = store.persist(&document) {
            notices.push(e);
        }

        tracing::info!(?origin, path = %store.path().display(), "configuration ready");
        Ok(Self {
            document,
            store,
            origin,
        })
    }

    pub fn from_document(document: Configuration, store: Store) -> Self {
        Self {
            document,
            store,
            origin: Origin::Local,
        }
    }

    pub fn document(&self) -> &Configuration {
        &self.document
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Mutates the live document, then saves it. If saving fails the change
    /// still stands in memory and the error is returned.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut Configuration) -> R) -> Result<R, ConfigError> {
        let result = f(&mut self.document);
        self.store.persist(&self.document)?;
        Ok(result)
    }

    /// Resolves a tweak by name, optionally narrowed by feature and category.
    /// Matching ignores case and surrounding whitespace.
    pub fn find(
        &self,
        name: &str,
        feature: Option<&str>,
        category: Option<&str>,
    ) -> Result<IdentityKey, TweakError> {
        let same = |a: &str, b: &str| a.trim().eq_ignore_ascii_case(b.trim());

        let mut seen = HashSet::new();
        let mut matches: Vec<IdentityKey> = self
            .document
            .items()
            .map(|(key, _)| key)
            .filter(|key| same(&key.name, name))
            .filter(|key| feature.map_or(true, |f| same(&key.feature, f)))
            .filter(|key| category.map_or(true, |c| same(&key.category, c)))
            .filter(|key| seen.insert(key.clone()))
            .collect();

        match matches.len() {
            0 => Err(TweakError::NotFound(name.trim().to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(TweakError::Ambiguous {
                name: name.trim().to_string(),
                matches,
            }),
        }
    }

    /// Moves a tweak into `target` (or flips it), running the matching command first.
    /// A failed command leaves the stored state untouched. A failed save
    /// returns [`TweakError::Unsaved`] carrying the outcome, which stays live
    /// in memory.
    pub fn toggle(
        &mut self,
        key: &IdentityKey,
        target: Option<bool>,
        runner: &dyn CommandRunner,
    ) -> Result<Toggled, TweakError> {
        let item = self
            .document
            .item(key)
            .ok_or_else(|| TweakError::NotFound(key.to_string()))?;
        let enabled = target.unwrap_or(!item.enabled);
        let command = item.command_for(enabled).to_string();

        if command.trim().is_empty() {
            tracing::debug!(%key, enabled, "no command for this state");
        } else {
            runner.run(&command).map_err(|e| TweakError::Command {
                key: key.clone(),
                message: format!("{:#}", e),
            })?;
        }

        let saved = self.update(|doc| {
            if let Some(item) = doc.item_mut(key) {
                item.enabled = enabled;
            }
        });

        tracing::info!(%key, enabled, "toggled tweak");
        let toggled = Toggled {
            key: key.clone(),
            enabled,
            command,
        };
        match saved {
            Ok(()) => Ok(toggled),
            Err(source) => Err(TweakError::Unsaved {
                toggled: Box::new(toggled),
                source,
            }),
        }
    }

    pub fn set_theme_mode(&mut self, mode: ThemeMode) -> Result<ThemeMode, ConfigError> {
        self.update(|doc| doc.theme_mut().mode = Some(mode))?;
        Ok(mode)
    }

    pub fn cycle_theme(&mut self) -> Result<ThemeMode, ConfigError> {
        let next = self.document.theme_mode().next();
        self.set_theme_mode(next)
    }

    /// Stores the accent as `#rrggbb`.
    pub fn set_accent_color(&mut self, input: &str) -> Result<String, TweakError> {
        let accent =
            normalize_accent(input).ok_or_else(|| TweakError::InvalidAccent(input.to_string()))?;
        let stored = accent.clone();
        self.update(|doc| doc.theme_mut().accent_color = Some(stored))?;
        Ok(accent)
    }
}
