use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::ai::{resolve_model, ModelSpec, DEFAULT_MODEL};
use crate::error::PipelineError;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Reported by every extraction attempt made without a credential.
pub fn missing_credential() -> PipelineError {
    PipelineError::Configuration(format!("{} is not set", API_KEY_VAR))
}
pub const MODEL_VAR: &str = "OPPTRACK_MODEL";
pub const DB_VAR: &str = "OPPTRACK_DB";
pub const API_URL_VAR: &str = "OPPTRACK_API_URL";
pub const TIMEOUT_VAR: &str = "OPPTRACK_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Process-wide settings, resolved once at start-up and passed down explicitly.
#[derive(Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: ModelSpec,
    pub db_path: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: ModelSpec {
                model_id: "gemini-2.0-flash".to_string(),
                short_name: DEFAULT_MODEL.to_string(),
            },
            db_path: None,
            api_base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("db_path", &self.db_path)
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolves settings through `lookup`, so tests never touch the real environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PipelineError> {
        let api_key = lookup(API_KEY_VAR).filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!(
                "{} is not set: extraction is disabled and fit scores fall back to a neutral value",
                API_KEY_VAR
            );
        }

        let model = resolve_model(lookup(MODEL_VAR).as_deref().unwrap_or(DEFAULT_MODEL))?;

        let timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => raw.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| {
                PipelineError::Configuration(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    TIMEOUT_VAR, raw
                ))
            })?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_key,
            model,
            db_path: lookup(DB_VAR).map(PathBuf::from),
            api_base_url: lookup(API_URL_VAR),
            timeout,
        })
    }

    pub fn with_model(mut self, name: &str) -> Result<Self, PipelineError> {
        self.model = resolve_model(name)?;
        Ok(self)
    }

    pub fn with_db_path(mut self, path: PathBuf) -> Self {
        self.db_path = Some(path);
        self
    }

    /// Database location: explicit path, else the platform data directory.
    pub fn resolved_db_path(&self) -> PathBuf {
        if let Some(path) = &self.db_path {
            return path.clone();
        }
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "opptrack") {
            proj_dirs.data_dir().join("opptrack.db")
        } else {
            PathBuf::from("opptrack.db")
        }
    }
}
