use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_ACCENT: &str = "#3B8ED0";
pub const DEFAULT_REMOTE_URL: &str =
    "https://raw.githubusercontent.com/wirekurosastak/Switchcraft/main/data.yaml";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
/// Shade factor applied to the accent for hover/secondary highlights.
pub const HOVER_FACTOR: f32 = 0.85;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Dark,
    Light,
    // Anything unrecognised reads as "follow the system".
    #[default]
    #[serde(other)]
    System,
}

impl ThemeMode {
    /// The order the theme button steps through: system, dark, light, system.
    pub fn next(self) -> Self {
        match self {
            ThemeMode::System => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::System,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
            ThemeMode::System => "system",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(ThemeMode::Dark),
            "light" => Ok(ThemeMode::Light),
            "system" => Ok(ThemeMode::System),
            other => Err(format!(
                "unknown theme mode '{}' (expected dark, light or system)",
                other
            )),
        }
    }
}

/// User-chosen appearance, carried inside the tweak document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ThemeRepr")]
pub struct Theme {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ThemeMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
}

// Older documents stored the theme as a bare mode string.
#[derive(Deserialize)]
#[serde(untagged)]
enum ThemeRepr {
    Record {
        #[serde(default)]
        mode: Option<ThemeMode>,
        #[serde(default)]
        accent_color: Option<String>,
    },
    Mode(ThemeMode),
}

impl From<ThemeRepr> for Theme {
    fn from(repr: ThemeRepr) -> Self {
        match repr {
            ThemeRepr::Record { mode, accent_color } => Theme { mode, accent_color },
            ThemeRepr::Mode(mode) => Theme {
                mode: Some(mode),
                accent_color: None,
            },
        }
    }
}

impl Theme {
    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.accent_color.is_none()
    }

    /// The accent to paint with. Invalid stored values fall back to the default.
    pub fn accent_rgb(&self) -> (u8, u8, u8) {
        self.accent_color
            .as_deref()
            .and_then(hex_to_rgb)
            .or_else(|| hex_to_rgb(DEFAULT_ACCENT))
            .unwrap_or((0x3b, 0x8e, 0xd0))
    }
}

pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// Canonical `#rrggbb` form of a user-supplied color, or `None` if it isn't one.
pub fn normalize_accent(input: &str) -> Option<String> {
    let (r, g, b) = hex_to_rgb(input)?;
    Some(format!("#{:02x}{:02x}{:02x}", r, g, b))
}

pub fn darker(hex: &str, factor: f32) -> Option<String> {
    let (r, g, b) = hex_to_rgb(hex)?;
    let scale = |c: u8| (c as f32 * factor) as u8;
    Some(format!("#{:02x}{:02x}{:02x}", scale(r), scale(g), scale(b)))
}

/// Where the document lives and where updates come from.
#[derive(Debug, Clone)]
pub struct Settings {
    pub document_path: PathBuf,
    /// `None` runs offline: the local document is used as-is.
    pub remote_url: Option<String>,
    pub fetch_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            document_path: Self::default_document_path(),
            remote_url: Some(DEFAULT_REMOTE_URL.to_string()),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl Settings {
    #[cfg(windows)]
    pub fn default_document_path() -> PathBuf {
        PathBuf::from(r"C:\Winsane").join("data.yaml")
    }

    #[cfg(not(windows))]
    pub fn default_document_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("winsane");
        path.push("data.yaml");
        path
    }
}
