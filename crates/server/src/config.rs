use std::fs;

use serde::Deserialize;
use tracing::warn;

const CONFIG_FILE: &str = "server.toml";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

// Later names win.
const BIND_VARS: [&str; 2] = ["SERVER_BIND", "APP__BIND_ADDR"];
const DATABASE_URL_VARS: [&str; 2] = ["DATABASE_URL", "APP__DATABASE_URL"];
const MAX_UPLOAD_VARS: [&str; 1] = ["APP__MAX_UPLOAD_BYTES"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/checkin.db".into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Keys accepted in `server.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileOverrides {
    bind_addr: Option<String>,
    database_url: Option<String>,
    max_upload_bytes: Option<usize>,
}

/// Defaults, then `server.toml`, then environment variables.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(CONFIG_FILE) {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let overrides = match toml::from_str::<FileOverrides>(raw) {
        Ok(overrides) => overrides,
        Err(error) => {
            warn!(file = CONFIG_FILE, %error, "ignoring unreadable config file");
            return;
        }
    };
    if let Some(bind) = overrides.bind_addr {
        settings.server_bind = bind;
    }
    if let Some(url) = overrides.database_url {
        settings.database_url = url;
    }
    if let Some(limit) = overrides.max_upload_bytes {
        settings.max_upload_bytes = limit;
    }
}

fn last_set(lookup: &impl Fn(&str) -> Option<String>, keys: &[&str]) -> Option<String> {
    keys.iter().rev().find_map(|&key| lookup(key))
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(bind) = last_set(&lookup, &BIND_VARS) {
        settings.server_bind = bind;
    }
    if let Some(url) = last_set(&lookup, &DATABASE_URL_VARS) {
        settings.database_url = url;
    }
    match last_set(&lookup, &MAX_UPLOAD_VARS).map(|raw| raw.trim().parse::<usize>()) {
        Some(Ok(limit)) => settings.max_upload_bytes = limit,
        Some(Err(error)) => warn!(%error, "ignoring invalid APP__MAX_UPLOAD_BYTES"),
        None => {}
    }
}

/// Turns bare paths and `sqlite:` paths into `sqlite://` URLs. A blank value
/// falls back to the default database.
pub fn normalize_database_url(raw: &str) -> String {
    match raw.trim() {
        "" => Settings::default().database_url,
        url if url.contains("://") || url.starts_with("sqlite::memory:") => url.to_string(),
        path => {
            let path = path.strip_prefix("sqlite:").unwrap_or(path);
            format!("sqlite://{}", path.replace('\\', "/"))
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
