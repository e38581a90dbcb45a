use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::typing::{DEFAULT_QUANTUM, MIN_QUANTUM};

pub const API_KEY_ENV: &str = "CHATDESK_API_KEY";

/// Desktop settings, stored as TOML. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where completion requests go. Defaults to the bundled server's proxy,
    /// which adds the model API key itself.
    pub completion_url: String,
    pub model: String,
    /// Only for talking to a completion service directly. The environment
    /// variable takes precedence.
    pub api_key: Option<String>,
    pub register_url: String,
    pub google_client_id: String,
    pub linkedin_client_id: String,
    pub linkedin_redirect_uri: String,
    pub typing_quantum_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            completion_url: "http://127.0.0.1:8080/v1/chat/completions".into(),
            model: "gpt-3.5-turbo".into(),
            api_key: None,
            register_url: "http://127.0.0.1:8080/register".into(),
            google_client_id: String::new(),
            linkedin_client_id: String::new(),
            linkedin_redirect_uri: String::new(),
            typing_quantum_ms: DEFAULT_QUANTUM.as_millis() as u64,
        }
    }
}

impl Settings {
    pub fn path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("chatdesk.toml"))
    }

    /// Reads the settings file, falling back to defaults when it is missing
    /// or unreadable. A missing file is created with the defaults.
    pub fn load() -> Self {
        let Some(path) = Self::path() else { return Self::default() };
        if !path.exists() {
            let settings = Self::default();
            if let Err(e) = settings.save() {
                log::warn!("could not write {}: {}", path.display(), e);
            }
            return settings;
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            log::warn!("using default settings: {}", e);
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    pub fn typing_quantum(&self) -> Duration {
        Duration::from_millis(self.typing_quantum_ms).max(MIN_QUANTUM)
    }
}

#[cfg(feature = "gui")]
pub fn build_ui(app: &adw::Application) {
    crate::ui::main_window::show_main_window(app, Settings::load());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.typing_quantum(), DEFAULT_QUANTUM);
    }

    #[test]
    fn zero_quantum_is_raised_to_minimum() {
        let settings = Settings { typing_quantum_ms: 0, ..Settings::default() };
        assert_eq!(settings.typing_quantum(), MIN_QUANTUM);
        assert_eq!(Settings::default().typing_quantum_ms, DEFAULT_QUANTUM.as_millis() as u64);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatdesk.toml");
        fs::write(&path, "model = \"gpt-4\"\ntyping_quantum_ms = 25\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.model, "gpt-4");
        assert_eq!(settings.typing_quantum(), Duration::from_millis(25));
        assert_eq!(settings.register_url, Settings::default().register_url);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("chatdesk.toml");
        let settings = Settings {
            linkedin_client_id: "li".into(),
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn broken_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatdesk.toml");
        fs::write(&path, "model = [").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
