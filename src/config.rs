use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::account::AccountSettings;
use crate::ai::GeneratorConfig;
use crate::error::ConfigError;
use crate::models::Difficulty;

pub const DEFAULT_CONFIG_PATH: &str = "trivia.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Question file; the bundled dataset is used when unset.
    pub questions: Option<PathBuf>,
    pub store_path: PathBuf,
    pub log_file: PathBuf,
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
    pub ai: GeneratorConfig,
    pub account: AccountSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            questions: None,
            store_path: "./data/trivia-store.json".into(),
            log_file: "./data/trivia.log".into(),
            difficulty: None,
            category: None,
            ai: GeneratorConfig::default(),
            account: AccountSettings::default(),
        }
    }
}

/// Defaults, then the config file, then `TRIVIA__*` environment variables.
///
/// An explicit `path` must exist; the default path is optional.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut settings = match path {
        Some(path) => read_file(path)?,
        None => match read_file(Path::new(DEFAULT_CONFIG_PATH)) {
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Settings::default()
            }
            other => other?,
        },
    };

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn read_file(path: &Path) -> Result<Settings, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_settings(&raw)
}

pub fn parse_settings(raw: &str) -> Result<Settings, ConfigError> {
    Ok(toml::from_str(raw)?)
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("TRIVIA__QUESTIONS") {
        settings.questions = Some(v.into());
    }
    if let Some(v) = var("TRIVIA__STORE_PATH") {
        settings.store_path = v.into();
    }
    if let Some(v) = var("TRIVIA__LOG_FILE") {
        settings.log_file = v.into();
    }
    if let Some(v) = var("TRIVIA__DIFFICULTY") {
        if let Ok(parsed) = v.parse() {
            settings.difficulty = Some(parsed);
        }
    }
    if let Some(v) = var("TRIVIA__CATEGORY") {
        settings.category = Some(v);
    }
    if let Some(v) = var("TRIVIA__ACCOUNT__USER") {
        settings.account.user = Some(v);
    }
    if let Some(v) = var("TRIVIA__ACCOUNT__CREDITS") {
        if let Ok(parsed) = v.parse() {
            settings.account.credits = Some(parsed);
        }
    }
    apply_ai_env(&mut settings.ai, &var);
}

fn apply_ai_env(ai: &mut GeneratorConfig, var: &impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("TRIVIA__AI__API_KEY") {
        ai.api_key = v;
    }
    if let Some(v) = var("TRIVIA__AI__BASE_URL") {
        ai.base_url = v;
    }
    if let Some(v) = var("TRIVIA__AI__MODEL") {
        ai.model = v;
    }
    if let Some(v) = var("TRIVIA__AI__IMAGE_MODEL") {
        ai.image_model = v;
    }
    if let Some(v) = var("TRIVIA__AI__QUESTION_COUNT") {
        if let Ok(parsed) = v.parse() {
            ai.question_count = parsed;
        }
    }
    if let Some(v) = var("TRIVIA__AI__IMAGE_HINTS") {
        if let Ok(parsed) = v.parse() {
            ai.image_hints = parsed;
        }
    }
    if let Some(v) = var("TRIVIA__AI__TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse() {
            ai.timeout_secs = parsed;
        }
    }
}
