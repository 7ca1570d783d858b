use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Auto,
    Blue,
    Pink,
    Green,
    Purple,
    Orange,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Pl,
    En,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Stored as a single object under `user-settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub name: String,
    pub theme: Theme,
    pub friendly_mode: bool,
    pub show_motivational_quotes: bool,
    pub enable_notifications: bool,
    pub language: Language,
    pub font_size: FontSize,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            theme: Theme::default(),
            friendly_mode: true,
            show_motivational_quotes: true,
            enable_notifications: false,
            language: Language::default(),
            font_size: FontSize::default(),
        }
    }
}

impl UserSettings {
    /// Apply a `field=value` style change as the CLI passes it. Returns
    /// false for unknown fields or unreadable values.
    pub fn set(&mut self, field: &str, value: &str) -> bool {
        fn flag(v: &str) -> Option<bool> {
            match v {
                "true" | "on" | "yes" | "1" => Some(true),
                "false" | "off" | "no" | "0" => Some(false),
                _ => None,
            }
        }
        fn variant<T: serde::de::DeserializeOwned>(v: &str) -> Option<T> {
            serde_json::from_value(serde_json::Value::String(v.to_lowercase())).ok()
        }

        match field {
            "name" => {
                self.name = value.to_string();
                true
            }
            "theme" => variant(value).map(|v| self.theme = v).is_some(),
            "language" => variant(value).map(|v| self.language = v).is_some(),
            "fontSize" | "font-size" => variant(value).map(|v| self.font_size = v).is_some(),
            "friendlyMode" | "friendly-mode" => flag(value).map(|v| self.friendly_mode = v).is_some(),
            "showMotivationalQuotes" | "quotes" => {
                flag(value).map(|v| self.show_motivational_quotes = v).is_some()
            }
            "enableNotifications" | "notifications" => {
                flag(value).map(|v| self.enable_notifications = v).is_some()
            }
            _ => false,
        }
    }
}
