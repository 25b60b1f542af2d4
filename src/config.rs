use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "MedSchedule";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Frequency label stored when the caller leaves it blank.
pub const DEFAULT_FREQUENCY_TYPE: &str = "Daily";

/// Upper bound on occurrences per schedule. A zero `repeat_duration` makes
/// the window check pass for any count, so the count is capped on its own.
pub const MAX_REPEAT_TIMES: u32 = 24 * 60;

/// How long a store call waits for the SQLite write lock before the
/// mutation is reported as a concurrent modification.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

const DB_PATH_ENV: &str = "MEDSCHEDULE_DB_PATH";
const BUSY_TIMEOUT_ENV: &str = "MEDSCHEDULE_BUSY_TIMEOUT_MS";

/// Get the application data directory
/// (platform data dir, falling back to the working directory).
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the SQLite database
pub fn database_path() -> PathBuf {
    app_data_dir().join("medschedule.db")
}

/// Log filter used when `RUST_LOG` is not set
pub fn default_log_filter() -> &'static str {
    "medschedule=info,warn"
}

/// Runtime settings for the SQLite-backed store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub database_path: PathBuf,
    pub busy_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: database_path(),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }
}

impl EngineConfig {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `MEDSCHEDULE_DB_PATH` and
    /// `MEDSCHEDULE_BUSY_TIMEOUT_MS`. Unparseable timeouts keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup(DB_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }
        match lookup(BUSY_TIMEOUT_ENV).map(|v| v.trim().parse::<u64>()) {
            Some(Ok(ms)) => config.busy_timeout = Duration::from_millis(ms),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Ignoring invalid {BUSY_TIMEOUT_ENV}");
            }
            None => {}
        }
        config
    }
}
