//! Video color themes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Color theme of the rendered video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Background color as a hex string.
    pub fn background_color(&self) -> &'static str {
        match self {
            Theme::Dark => "#0a0a0a",
            Theme::Light => "#ffffff",
        }
    }

    /// Foreground text color.
    pub fn text_color(&self) -> &'static str {
        match self {
            Theme::Dark => "white",
            Theme::Light => "black",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_parsing() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!("LIGHT".parse::<Theme>().unwrap(), Theme::Light);
        assert!("blue".parse::<Theme>().is_err());
    }

    #[test]
    fn test_theme_colors() {
        assert_eq!(Theme::default(), Theme::Dark);
        assert_eq!(Theme::Dark.background_color(), "#0a0a0a");
        assert_eq!(Theme::Light.text_color(), "black");
    }
}
