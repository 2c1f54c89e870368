use std::{fs, time::Duration};

use anyhow::Context;
use client_core::{
    backoff::{DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_BACKOFF},
    config::DEFAULT_ENDPOINT,
    BackoffPolicy, ClientConfig,
};
use serde::Deserialize;
use tracing::warn;

const SETTINGS_FILE: &str = "stepwatch.toml";

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: String,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            initial_backoff_ms: millis(DEFAULT_INITIAL_BACKOFF),
            max_backoff_ms: millis(DEFAULT_MAX_BACKOFF),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    endpoint: Option<String>,
    initial_backoff_ms: Option<u64>,
    max_backoff_ms: Option<u64>,
}

impl Settings {
    pub fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let backoff = BackoffPolicy {
            initial: Duration::from_millis(self.initial_backoff_ms),
            max: Duration::from_millis(self.max_backoff_ms.max(self.initial_backoff_ms)),
            ..BackoffPolicy::default()
        };
        let config = ClientConfig::from_url(&self.endpoint)
            .with_context(|| format!("invalid endpoint: {}", self.endpoint))?;
        Ok(config.with_backoff(backoff))
    }

    fn apply_file(&mut self, raw: &str) {
        let file_cfg = match toml::from_str::<FileSettings>(raw) {
            Ok(file_cfg) => file_cfg,
            Err(err) => {
                warn!("config: ignoring {SETTINGS_FILE}: {err}");
                return;
            }
        };
        if let Some(v) = file_cfg.endpoint {
            self.endpoint = v;
        }
        if let Some(v) = file_cfg.initial_backoff_ms {
            self.initial_backoff_ms = v;
        }
        if let Some(v) = file_cfg.max_backoff_ms {
            self.max_backoff_ms = v;
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("STEPWATCH_ENDPOINT") {
            self.endpoint = v;
        }
        if let Some(v) = var("APP__ENDPOINT") {
            self.endpoint = v;
        }

        if let Some(v) = var("APP__INITIAL_BACKOFF_MS") {
            match v.parse::<u64>() {
                Ok(parsed) => self.initial_backoff_ms = parsed,
                Err(_) => warn!(value = %v, "config: APP__INITIAL_BACKOFF_MS is not a number"),
            }
        }
        if let Some(v) = var("APP__MAX_BACKOFF_MS") {
            match v.parse::<u64>() {
                Ok(parsed) => self.max_backoff_ms = parsed,
                Err(_) => warn!(value = %v, "config: APP__MAX_BACKOFF_MS is not a number"),
            }
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        settings.apply_file(&raw);
    }
    settings.apply_env(|key| std::env::var(key).ok());

    settings
}
