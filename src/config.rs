use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{LensError, Result};

/// Environment variable that overrides the configured Gemini credential
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Configuration file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "readme-lens.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub translate: TranslateConfig,
    pub host: HostConfig,
    pub panel: PanelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// ISO 639-1 code of the language to translate into
    pub target_language: String,
    /// Source language passed to the machine translation backend ("auto" to detect)
    pub source_language: String,
    /// Credential for the generative backend; enables structured translation
    pub gemini_api_key: Option<String>,
    /// Generative model name
    pub gemini_model: String,
    /// Generative API base URL
    pub gemini_endpoint: String,
    /// Machine translation endpoint
    pub google_endpoint: String,
    /// Maximum characters per machine translation request
    pub max_chunk_chars: usize,
    /// HTTP timeout for backend calls (seconds)
    pub timeout_secs: u64,
    /// Refuse to translate descriptions when no credential is configured
    pub description_requires_credential: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Directory holding installed extensions, one sub-directory each
    pub extensions_dir: PathBuf,
    /// Documentation file read from an extension's install path
    pub readme_file: String,
    /// Extension id prefixes that are never offered for translation
    pub excluded_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Address the preview server binds to; port 0 picks a free port
    pub bind_address: String,
    /// Open the preview in the system browser once it is being served
    pub open_browser: bool,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            target_language: "ja".to_string(),
            source_language: "auto".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-1.5-flash".to_string(),
            gemini_endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            google_endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
            max_chunk_chars: 3800,
            timeout_secs: 120,
            description_requires_credential: false,
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        let extensions_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vscode")
            .join("extensions");

        Self {
            extensions_dir,
            readme_file: "README.md".to_string(),
            excluded_prefixes: vec!["vscode.".to_string()],
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:0".to_string(),
            open_browser: true,
        }
    }
}

impl TranslateConfig {
    /// The configured credential, if it is present and not blank
    pub fn credential(&self) -> Option<&str> {
        self.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LensError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| LensError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LensError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| LensError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Load from an explicit path, else `readme-lens.toml` in the working
    /// directory, else defaults. The environment credential is applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Config::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Config::default(),
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.apply_api_key(&key);
        }

        Ok(config)
    }

    /// Override the credential; blank values are ignored
    pub fn apply_api_key(&mut self, key: &str) {
        if !key.trim().is_empty() {
            self.translate.gemini_api_key = Some(key.trim().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_blank_credential_is_absent() {
        let mut config = TranslateConfig::default();
        assert_eq!(config.credential(), None);

        config.gemini_api_key = Some("   ".to_string());
        assert_eq!(config.credential(), None);

        config.gemini_api_key = Some(" key-123 ".to_string());
        assert_eq!(config.credential(), Some("key-123"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "[translate]\ntarget_language = \"de\"\n\n[panel]\nopen_browser = false\n",
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.translate.target_language, "de");
        assert_eq!(config.translate.max_chunk_chars, 3800);
        assert!(!config.panel.open_browser);
        assert_eq!(config.host.readme_file, "README.md");
    }

    #[test]
    fn test_save_and_reload() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.apply_api_key("secret");
        config.host.excluded_prefixes.push("ms-".to_string());
        config.save_to_file(file.path()).unwrap();

        let loaded = Config::from_file(file.path()).unwrap();
        assert_eq!(loaded.translate.credential(), Some("secret"));
        assert_eq!(loaded.host.excluded_prefixes, vec!["vscode.", "ms-"]);
    }

    #[test]
    fn test_blank_override_keeps_existing_key() {
        let mut config = Config::default();
        config.apply_api_key("first");
        config.apply_api_key("  ");
        assert_eq!(config.translate.credential(), Some("first"));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[translate\n").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(LensError::Config(_))
        ));
    }
}
