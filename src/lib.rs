//! Winsane: switch Windows tweaks on and off from a catalogue that updates
//! itself without forgetting what the user chose.

pub mod config;
pub mod error;
pub mod logging;
pub mod power;
pub mod reconcile;
pub mod remote;
pub mod session;
pub mod store;
pub mod tweaks;
pub mod ui;
pub mod utils;

pub use config::{Settings, Theme, ThemeMode};
pub use error::{ConfigError, ErrorKind, Notices, TweakError};
pub use reconcile::reconcile;
pub use session::{Origin, Session};
pub use store::Store;
pub use tweaks::{Category, Configuration, Feature, IdentityKey, Tweak};
