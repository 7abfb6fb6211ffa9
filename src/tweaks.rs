use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::config::{Theme, ThemeMode};
use crate::error::DocumentError;

/// Matches an item across two documents: (feature, category, item name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub feature: String,
    pub category: String,
    pub name: String,
}

impl IdentityKey {
    pub fn new(
        feature: impl Into<String>,
        category: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            feature: feature.into(),
            category: category.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.feature, self.category, self.name)
    }
}

// `key:` with no value should read as empty, not fail the whole document.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single switchable tweak and the commands that move it into each state.
///
/// On disk the commands are keyed by the YAML booleans `true` / `false`;
/// `on` / `off` are accepted on input as well.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Tweak {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub purpose: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(rename = "true", alias = "on", default, deserialize_with = "null_as_default")]
    pub enable_command: String,
    #[serde(rename = "false", alias = "off", default, deserialize_with = "null_as_default")]
    pub disable_command: String,
}

impl Tweak {
    pub fn new(
        name: &str,
        purpose: &str,
        enable_command: &str,
        disable_command: &str,
        enabled: bool,
    ) -> Self {
        Tweak {
            name: name.to_string(),
            purpose: purpose.to_string(),
            enabled,
            enable_command: enable_command.to_string(),
            disable_command: disable_command.to_string(),
        }
    }

    /// The command that moves the tweak into `state`.
    pub fn command_for(&self, state: bool) -> &str {
        if state {
            &self.enable_command
        } else {
            &self.disable_command
        }
    }
}

impl Serialize for Tweak {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        if !self.purpose.is_empty() {
            map.serialize_entry("purpose", &self.purpose)?;
        }
        map.serialize_entry("enabled", &self.enabled)?;
        if !self.enable_command.is_empty() {
            map.serialize_entry(&true, &self.enable_command)?;
        }
        if !self.disable_command.is_empty() {
            map.serialize_entry(&false, &self.disable_command)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<Tweak>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub feature: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<Category>,
}

/// The whole tweak document: what can be toggled, and how the user left it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub tweaks: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

impl Configuration {
    /// Parses a YAML body. A blank body is "no document", not an error.
    pub fn parse(text: &str) -> Result<Option<Self>, DocumentError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let document: Configuration = serde_yaml::from_str(text)?;
        document.validate()?;
        Ok(Some(document))
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Rejects documents whose names can't act as identity keys.
    pub fn validate(&self) -> Result<(), DocumentError> {
        for (fi, feature) in self.tweaks.iter().enumerate() {
            if feature.feature.trim().is_empty() {
                return Err(DocumentError::Invalid(format!(
                    "feature #{} has an empty name",
                    fi + 1
                )));
            }
            for (ci, category) in feature.categories.iter().enumerate() {
                if category.category.trim().is_empty() {
                    return Err(DocumentError::Invalid(format!(
                        "category #{} of '{}' has an empty name",
                        ci + 1,
                        feature.feature
                    )));
                }
                for (ii, item) in category.items.iter().enumerate() {
                    if item.name.trim().is_empty() {
                        return Err(DocumentError::Invalid(format!(
                            "item #{} of '{} / {}' has an empty name",
                            ii + 1,
                            feature.feature,
                            category.category
                        )));
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        for (key, _) in self.items() {
            if !seen.insert(key.clone()) {
                // Tolerated; whichever copy is read last wins during reconciliation.
                tracing::warn!(%key, "duplicate tweak identity");
            }
        }
        Ok(())
    }

    /// Every item in document order, paired with its identity key.
    pub fn items(&self) -> impl Iterator<Item = (IdentityKey, &Tweak)> + '_ {
        self.tweaks.iter().flat_map(|feature| {
            feature.categories.iter().flat_map(move |category| {
                category.items.iter().map(move |item| {
                    (
                        IdentityKey::new(&feature.feature, &category.category, &item.name),
                        item,
                    )
                })
            })
        })
    }

    pub fn enabled_map(&self) -> HashMap<IdentityKey, bool> {
        self.items()
            .map(|(key, item)| (key, item.enabled))
            .collect()
    }

    pub fn item(&self, key: &IdentityKey) -> Option<&Tweak> {
        self.items()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, item)| item)
    }

    pub fn item_mut(&mut self, key: &IdentityKey) -> Option<&mut Tweak> {
        self.tweaks
            .iter_mut()
            .filter(|f| f.feature == key.feature)
            .flat_map(|f| f.categories.iter_mut())
            .filter(|c| c.category == key.category)
            .flat_map(|c| c.items.iter_mut())
            .find(|item| item.name == key.name)
    }

    pub fn theme_mode(&self) -> ThemeMode {
        self.theme
            .as_ref()
            .and_then(|t| t.mode)
            .unwrap_or_default()
    }

    pub fn theme_mut(&mut self) -> &mut Theme {
        self.theme.get_or_insert_with(Theme::default)
    }
}
