//! Theme palette and the built-in light/dark presets.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PRIMARY_COLOR: &str = "#F63366";
pub const DEFAULT_FONT: &str = "sans serif";

/// Fonts offered by the theme settings page.
pub const FONTS: [&str; 3] = ["sans serif", "serif", "monospace"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeBase {
    Light,
    Dark,
}

/// Whether the active theme equals one of the presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeStatus {
    Light,
    Dark,
    Custom,
}

impl ThemeStatus {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub base: ThemeBase,
    pub primary_color: String,
    pub background_color: String,
    pub secondary_background_color: String,
    pub text_color: String,
    pub font: String,
}

impl Theme {
    #[must_use]
    pub fn light() -> Self {
        Self {
            base: ThemeBase::Light,
            primary_color: DEFAULT_PRIMARY_COLOR.into(),
            background_color: "#FFFFFF".into(),
            secondary_background_color: "#F0F2F6".into(),
            text_color: "#262730".into(),
            font: DEFAULT_FONT.into(),
        }
    }

    #[must_use]
    pub fn dark() -> Self {
        Self {
            base: ThemeBase::Dark,
            primary_color: DEFAULT_PRIMARY_COLOR.into(),
            background_color: "#262730".into(),
            secondary_background_color: "#1A1A1A".into(),
            text_color: "#FFFFFF".into(),
            font: DEFAULT_FONT.into(),
        }
    }

    #[must_use]
    pub fn preset(base: ThemeBase) -> Self {
        match base {
            ThemeBase::Light => Self::light(),
            ThemeBase::Dark => Self::dark(),
        }
    }

    #[must_use]
    pub fn status(&self) -> ThemeStatus {
        if *self == Self::dark() {
            ThemeStatus::Dark
        } else if *self == Self::light() {
            ThemeStatus::Light
        } else {
            ThemeStatus::Custom
        }
    }

    /// CSS custom properties plus the body font, injected into every page.
    #[must_use]
    pub fn css(&self) -> String {
        format!(
            ":root {{ --primary: {}; --bg: {}; --bg-secondary: {}; --text: {}; }}\n\
             body {{ font-family: {}, sans-serif; background: var(--bg); color: var(--text); }}",
            self.primary_color, self.background_color, self.secondary_background_color, self.text_color, self.font
        )
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

/// A theme as written on disk: any key may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeOverrides {
    pub base: Option<ThemeBase>,
    pub primary_color: Option<String>,
    pub background_color: Option<String>,
    pub secondary_background_color: Option<String>,
    pub text_color: Option<String>,
    pub font: Option<String>,
}

impl ThemeOverrides {
    /// Fill missing keys from the preset of the declared base (light when absent).
    #[must_use]
    pub fn resolve(self) -> Theme {
        let base = self.base.unwrap_or(ThemeBase::Light);
        let preset = Theme::preset(base);
        Theme {
            base,
            primary_color: self.primary_color.unwrap_or(preset.primary_color),
            background_color: self.background_color.unwrap_or(preset.background_color),
            secondary_background_color: self
                .secondary_background_color
                .unwrap_or(preset.secondary_background_color),
            text_color: self.text_color.unwrap_or(preset.text_color),
            font: self.font.unwrap_or(preset.font),
        }
    }
}

impl From<Theme> for ThemeOverrides {
    fn from(theme: Theme) -> Self {
        Self {
            base: Some(theme.base),
            primary_color: Some(theme.primary_color),
            background_color: Some(theme.background_color),
            secondary_background_color: Some(theme.secondary_background_color),
            text_color: Some(theme.text_color),
            font: Some(theme.font),
        }
    }
}

#[cfg(test)]
#[path = "theme_test.rs"]
mod tests;
