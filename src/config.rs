use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use log::{info, warn};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".avian-journal";
/// SQLite file used when no hosted backend is configured.
const DB_FILE_NAME: &str = "journal.sqlite";
/// Directory that receives uploads for the local backend.
const BLOB_DIR_NAME: &str = "uploads";
/// Shared admin secret used when none is configured.
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const LOG_FILE_NAME: &str = "avian-journal.log";

/// Where records and images are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Remote { url: String, api_key: String },
    Local { database: PathBuf, blob_dir: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub admin_password: String,
    pub bird_bucket: String,
    pub event_bucket: String,
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
}

/// Command-line settings that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub force_local: bool,
    pub data_dir: Option<PathBuf>,
}

impl Config {
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let data_dir = resolve_data_dir(overrides)?;

        let backend = match (overrides.force_local, var("AVIAN_BACKEND_URL")) {
            (false, Some(url)) => BackendConfig::Remote {
                url,
                api_key: var("AVIAN_BACKEND_KEY").unwrap_or_else(|| {
                    warn!("AVIAN_BACKEND_KEY not set, requests will be anonymous");
                    String::new()
                }),
            },
            _ => local_backend(&data_dir),
        };

        Ok(Self {
            backend,
            admin_password: var("AVIAN_ADMIN_PASSWORD").unwrap_or_else(|| {
                warn!("AVIAN_ADMIN_PASSWORD not set, using the default admin secret");
                DEFAULT_ADMIN_PASSWORD.to_string()
            }),
            bird_bucket: try_load("AVIAN_BIRD_BUCKET", "birds")?,
            event_bucket: try_load("AVIAN_EVENT_BUCKET", "events")?,
            request_timeout: Duration::from_secs(try_load("AVIAN_REQUEST_TIMEOUT_SECS", "10")?),
            data_dir,
        })
    }

    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join("admin_session")
    }
}

/// `--data-dir`, then `AVIAN_DATA_DIR`, then `~/.avian-journal`.
pub fn resolve_data_dir(overrides: &Overrides) -> Result<PathBuf> {
    match &overrides.data_dir {
        Some(dir) => Ok(dir.clone()),
        None => match var("AVIAN_DATA_DIR") {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => default_data_dir(),
        },
    }
}

/// Where the admin console writes its log, since it owns the terminal.
pub fn log_file(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE_NAME)
}

fn local_backend(data_dir: &Path) -> BackendConfig {
    BackendConfig::Local {
        database: data_dir.join(DB_FILE_NAME),
        blob_dir: data_dir.join(BLOB_DIR_NAME),
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|err| anyhow!("invalid {key} value {raw:?}: {err}"))
}

/// `~/.avian-journal`, matching where the session marker and log live.
fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new()
        .ok_or_else(|| anyhow!("could not locate home directory"))
        .context("set AVIAN_DATA_DIR or pass --data-dir")?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_backend_lives_under_data_dir() {
        let backend = local_backend(Path::new("/tmp/journal"));
        assert_eq!(
            backend,
            BackendConfig::Local {
                database: PathBuf::from("/tmp/journal/journal.sqlite"),
                blob_dir: PathBuf::from("/tmp/journal/uploads"),
            }
        );
    }

    #[test]
    fn forced_local_ignores_backend_url() {
        let overrides = Overrides {
            force_local: true,
            data_dir: Some(PathBuf::from("/tmp/avian-test")),
        };
        let config = Config::load(&overrides).unwrap();
        assert!(matches!(config.backend, BackendConfig::Local { .. }));
        assert_eq!(config.session_file(), PathBuf::from("/tmp/avian-test/admin_session"));
    }
}
