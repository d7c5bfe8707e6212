use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::config::ThemeSettings;
use crate::error::{IdeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Dark,
    #[default]
    Light,
}

impl Theme {
    pub fn all() -> [Theme; 2] {
        [Theme::Dark, Theme::Light]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Dark => "Dark",
            Theme::Light => "Light",
        }
    }

    /// Stylesheet configured for this theme, if any.
    pub fn stylesheet<'a>(&self, settings: &'a ThemeSettings) -> Option<&'a Path> {
        match self {
            Theme::Dark => settings.dark_stylesheet.as_deref(),
            Theme::Light => settings.light_stylesheet.as_deref(),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Theme {
    type Err = IdeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            _ => Err(IdeError::UnknownTheme(s.to_string())),
        }
    }
}

/// Read a stylesheet as opaque text for the front end to apply.
pub fn load_theme(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| IdeError::io(path, e))
}
