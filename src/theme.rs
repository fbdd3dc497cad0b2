//! Persisted light/dark theme preference

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::storage::{KeyValueStore, THEME_MODE_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeMode::Light => write!(f, "light"),
            ThemeMode::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for ThemeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => Err(Error::InvalidInput(format!("unknown theme mode '{}'", other))),
        }
    }
}

/// Read the stored theme; unknown or missing values fall back to light
pub fn load_theme(store: &dyn KeyValueStore) -> Result<ThemeMode> {
    Ok(store
        .get(THEME_MODE_KEY)?
        .and_then(|value| value.parse().ok())
        .unwrap_or_default())
}

pub fn save_theme(store: &dyn KeyValueStore, mode: ThemeMode) -> Result<()> {
    store.set(THEME_MODE_KEY, &mode.to_string())
}

/// Flip the stored theme and return the new value
pub fn toggle_theme(store: &dyn KeyValueStore) -> Result<ThemeMode> {
    let next = load_theme(store)?.toggled();
    save_theme(store, next)?;
    Ok(next)
}
