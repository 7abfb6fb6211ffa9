use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::session::Toggled;
use crate::tweaks::IdentityKey;

/// Why a document body could not be turned into a [`crate::tweaks::Configuration`].
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid YAML: {0}")]
    Syntax(#[from] serde_yaml::Error),

    #[error("{0}")]
    Invalid(String),
}

/// Failures around obtaining and storing the tweak document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("local configuration '{path}' is malformed: {source}")]
    LoadParse {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    #[error("failed to fetch '{url}': {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("'{url}' answered with HTTP {status}")]
    FetchStatus { url: String, status: u16 },

    #[error("remote configuration from '{url}' is malformed: {source}")]
    FetchParse {
        url: String,
        #[source]
        source: DocumentError,
    },

    #[error("failed to save '{path}': {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("no configuration available: the local file is missing and the remote source could not be used")]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LoadParse,
    Fetch,
    Persist,
    Unavailable,
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::Read { .. } | ConfigError::LoadParse { .. } => ErrorKind::LoadParse,
            ConfigError::Fetch { .. }
            | ConfigError::FetchStatus { .. }
            | ConfigError::FetchParse { .. } => ErrorKind::Fetch,
            ConfigError::Persist { .. } | ConfigError::Serialize(_) => ErrorKind::Persist,
            ConfigError::Unavailable => ErrorKind::Unavailable,
        }
    }
}

/// Failures of user actions on the live document.
#[derive(Debug, Error)]
pub enum TweakError {
    #[error("tweak not found: '{0}'")]
    NotFound(String),

    #[error("'{name}' matches several tweaks: {}", join_keys(.matches))]
    Ambiguous {
        name: String,
        matches: Vec<IdentityKey>,
    },

    #[error("'{0}' is not a #RRGGBB color")]
    InvalidAccent(String),

    #[error("command for '{key}' failed: {message}")]
    Command { key: IdentityKey, message: String },

    /// The tweak was switched and is live in memory, but saving it failed.
    #[error("{} was switched but could not be saved: {source}", .toggled.key)]
    Unsaved {
        toggled: Box<Toggled>,
        #[source]
        source: ConfigError,
    },

    #[error(transparent)]
    Persist(#[from] ConfigError),
}

fn join_keys(keys: &[IdentityKey]) -> String {
    keys.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Non-fatal problems collected along the way, shown to the user as warnings.
#[derive(Debug, Default)]
pub struct Notices {
    entries: Vec<ConfigError>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ConfigError) {
        tracing::warn!(kind = ?error.kind(), "{}", error);
        self.entries.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigError> {
        self.entries.iter()
    }

    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.entries.iter().any(|e| e.kind() == kind)
    }
}

impl fmt::Display for Notices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "warning: {}", entry)?;
        }
        Ok(())
    }
}
