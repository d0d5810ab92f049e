//! CLI argument definitions and the terminal host's input commands.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use counselor_core::{Category, CounselorConfig, Language};

/// Counselor: a bilingual study and wellbeing assistant for the terminal.
#[derive(Parser, Debug)]
#[command(name = "counselor", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Remote reply endpoint URL.
    #[arg(short = 'e', long = "endpoint")]
    pub endpoint: Option<String>,

    /// Language to open the conversation in (en, hi).
    #[arg(short = 'L', long = "language")]
    pub language: Option<Language>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Open without the assistant's greeting.
    #[arg(long = "no-greeting")]
    pub no_greeting: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > COUNSELOR_CONFIG env var > ~/.counselor/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("COUNSELOR_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the reply endpoint.
    ///
    /// Priority: --endpoint flag > COUNSELOR_ENDPOINT env var > config file value.
    pub fn resolve_endpoint(&self, config_endpoint: &str) -> String {
        if let Some(ref e) = self.endpoint {
            return e.clone();
        }
        match std::env::var("COUNSELOR_ENDPOINT") {
            Ok(e) if !e.trim().is_empty() => e,
            _ => config_endpoint.to_string(),
        }
    }

    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Fold the overrides into a loaded configuration.
    pub fn apply(&self, config: &mut CounselorConfig) {
        config.remote.endpoint = self.resolve_endpoint(&config.remote.endpoint);
        config.general.log_level = self.resolve_log_level(&config.general.log_level);
        if let Some(language) = self.language {
            config.assistant.default_language = language;
        }
        if self.no_greeting {
            config.assistant.greeting = false;
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".counselor").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".counselor").join("config.toml");
    }
    PathBuf::from("config.toml")
}

/// One line typed into the terminal host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Plain text, submitted as a user message.
    Submit(String),
    /// `/lang` toggles; `/lang en|hi` selects.
    Language(Option<Language>),
    /// `/topic <n>`, 1-based index into the support topics.
    Topic(Category),
    /// `/speak` narrates the latest reply; `/speak <id>` a specific one.
    Speak(Option<u64>),
    Listen,
    Stop,
    Retry,
    History,
    Help,
    Close,
}

impl FromStr for HostCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Ok(HostCommand::Submit(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(format!("too many arguments for /{}", name));
        }

        match (name, arg) {
            ("lang", None) => Ok(HostCommand::Language(None)),
            ("lang", Some(code)) => Language::from_str(code)
                .map(|l| HostCommand::Language(Some(l)))
                .map_err(|e| e.to_string()),
            ("topic", Some(n)) => n
                .parse::<usize>()
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| Category::SUPPORT_TOPICS.get(i).copied())
                .map(HostCommand::Topic)
                .ok_or_else(|| {
                    format!(
                        "topic must be between 1 and {}",
                        Category::SUPPORT_TOPICS.len()
                    )
                }),
            ("topic", None) => Err("usage: /topic <n>".to_string()),
            ("speak", None) => Ok(HostCommand::Speak(None)),
            ("speak", Some(id)) => id
                .parse::<u64>()
                .map(|id| HostCommand::Speak(Some(id)))
                .map_err(|_| format!("not a message id: {}", id)),
            ("listen", None) => Ok(HostCommand::Listen),
            ("stop", None) => Ok(HostCommand::Stop),
            ("retry", None) => Ok(HostCommand::Retry),
            ("history", None) => Ok(HostCommand::History),
            ("help", None) => Ok(HostCommand::Help),
            ("close" | "quit", None) => Ok(HostCommand::Close),
            (other, _) => Err(format!("unknown command: /{}", other)),
        }
    }
}

pub const HELP: &str = "\
Commands:
  /lang [en|hi]   toggle or select the language
  /topic <n>      ask about a support topic
  /speak [id]     read a reply aloud
  /listen         speak your message
  /stop           cancel listening
  /retry          resend your last message
  /history        show the conversation
  /close          leave";
