//! Application-level configuration loading: JSON file first, then environment overrides.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CICERON_BACK_CONFIG_PATH";

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_FILE_SIZE: usize = 52_428_800;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_LIVE_TICK_MS: u64 = 1000;
const DEFAULT_FINISHED_GRACE_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// TCP port the HTTP server binds to.
    pub port: u16,
    /// PostgreSQL connection string; `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Upload limit for audio files, in bytes.
    pub max_file_size: usize,
    /// Directory receiving uploaded audio.
    pub upload_dir: PathBuf,
    /// Single allowed CORS origin; `None` is permissive.
    pub cors_origin: Option<String>,
    /// Interval between live session ticks.
    pub live_tick: Duration,
    /// How long a finished live session stays reachable before it is dropped.
    pub finished_grace: Duration,
}

impl AppConfig {
    /// Load the configuration file, then apply environment overrides.
    pub fn load() -> Self {
        let mut config = Self::from_file(&resolve_config_path());
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    fn from_file(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded config file");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Override fields from `lookup` (normally the process environment). Unparsable values
    /// are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = parse_var(&lookup, "PORT") {
            self.port = port;
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|value| !value.is_empty()) {
            self.database_url = Some(url);
        }
        if let Some(size) = parse_var(&lookup, "MAX_FILE_SIZE") {
            self.max_file_size = size;
        }
        if let Some(dir) = lookup("UPLOAD_DIR").filter(|value| !value.is_empty()) {
            self.upload_dir = PathBuf::from(dir);
        }
        if let Some(origin) = lookup("CORS_ORIGIN").filter(|value| !value.is_empty()) {
            self.cors_origin = Some(origin);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "LIVE_TICK_MS").filter(|ms| *ms > 0) {
            self.live_tick = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "LIVE_FINISHED_GRACE_SECS") {
            self.finished_grace = Duration::from_secs(secs);
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            cors_origin: None,
            live_tick: Duration::from_millis(DEFAULT_LIVE_TICK_MS),
            finished_grace: Duration::from_secs(DEFAULT_FINISHED_GRACE_SECS),
        }
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    port: Option<u16>,
    database_url: Option<String>,
    max_file_size: Option<usize>,
    upload_dir: Option<String>,
    cors_origin: Option<String>,
    live_tick_ms: Option<u64>,
    finished_grace_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            port: raw.port.unwrap_or(defaults.port),
            database_url: raw.database_url.filter(|url| !url.is_empty()),
            max_file_size: raw.max_file_size.unwrap_or(defaults.max_file_size),
            upload_dir: raw.upload_dir.map(PathBuf::from).unwrap_or(defaults.upload_dir),
            cors_origin: raw.cors_origin,
            live_tick: raw
                .live_tick_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.live_tick),
            finished_grace: raw
                .finished_grace_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.finished_grace),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"port": 8081, "liveTickMs": 250, "finishedGraceSecs": 30}"#)
                .unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.port, 8081);
        assert_eq!(config.live_tick, Duration::from_millis(250));
        assert_eq!(config.finished_grace, Duration::from_secs(30));
        assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("PORT", "6000"),
            ("DATABASE_URL", "postgres://localhost/ciceron"),
            ("MAX_FILE_SIZE", "not-a-number"),
            ("UPLOAD_DIR", "/tmp/audio"),
            ("LIVE_FINISHED_GRACE_SECS", "45"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.port, 6000);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/ciceron")
        );
        assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/audio"));
        assert_eq!(config.cors_origin, None);
        assert_eq!(config.finished_grace, Duration::from_secs(45));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = AppConfig::from_file(&PathBuf::from("does/not/exist.json"));
        assert_eq!(config, AppConfig::default());
    }
}
