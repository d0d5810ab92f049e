use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CounselorError, Result};
use crate::types::Language;

/// Top-level configuration for the counselor assistant.
///
/// Loaded from `~/.counselor/config.toml` by default. Every section is
/// optional; missing sections and fields fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CounselorConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl CounselorConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CounselorConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values that would leave the assistant unable to reply.
    pub fn validate(&self) -> Result<()> {
        if self.remote.endpoint.trim().is_empty() {
            return Err(CounselorError::Config(
                "remote.endpoint must not be empty".to_string(),
            ));
        }
        if self.remote.timeout_ms == 0 {
            return Err(CounselorError::Config(
                "remote.timeout_ms must be greater than zero".to_string(),
            ));
        }
        for (name, command) in [
            ("speech.recognizer_command", &self.speech.recognizer_command),
            ("speech.synthesizer_command", &self.speech.synthesizer_command),
        ] {
            if matches!(command, Some(argv) if argv.is_empty()) {
                return Err(CounselorError::Config(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Conversation behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Language active when the widget opens.
    pub default_language: Language,
    /// Seed a new conversation with a greeting from the assistant.
    pub greeting: bool,
    /// Narrate every assistant reply through speech output.
    pub auto_speak: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            default_language: Language::En,
            greeting: true,
            auto_speak: false,
        }
    }
}

/// Remote reply endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// URL receiving `POST {message, language}`.
    pub endpoint: String,
    /// Upper bound for a single dispatch, after which the local fallback answers.
    pub timeout_ms: u64,
    /// Environment variable holding the bearer credential.
    pub token_env: String,
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000/chat".to_string(),
            timeout_ms: 10_000,
            token_env: "COUNSELOR_TOKEN".to_string(),
        }
    }
}

/// Host speech capabilities. An absent command means the capability is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Program (argv) that records one utterance and prints its transcript.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recognizer_command: Option<Vec<String>>,
    /// Program (argv) that reads text on stdin and speaks it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesizer_command: Option<Vec<String>>,
}

// =============================================================================
// Tests
// =============================================================================
