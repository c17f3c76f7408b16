//! Configuration for the `todoshare` daemon.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/todoshare/config.toml`)
//! 4. Compiled defaults

use std::path::PathBuf;
use std::time::Duration;

use todoshare_model::ReminderWindow;
use todoshare_model::reminder::DEFAULT_WINDOW_MINUTES;

use crate::reminders::queries::DEFAULT_HORIZON_HOURS;

/// Default pause between reminder scans.
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 60;

/// Largest accepted reminder window: one week.
pub const MAX_WINDOW_MINUTES: i64 = 7 * 24 * 60;

/// Largest accepted upcoming-reminders horizon: one leap year.
pub const MAX_HORIZON_HOURS: i64 = 366 * 24;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// A value was present but out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    reminders: RemindersFileConfig,
    seed: SeedFileConfig,
}

/// `[reminders]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RemindersFileConfig {
    scan_interval_secs: Option<u64>,
    window_minutes: Option<i64>,
    horizon_hours: Option<i64>,
    rearm_on_reschedule: Option<bool>,
}

/// `[seed]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SeedFileConfig {
    path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the daemon.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Shared task reminder daemon")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/todoshare/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seconds between reminder scans.
    #[arg(long)]
    pub scan_interval_secs: Option<u64>,

    /// Minutes ahead of a due or reminder time at which it fires.
    #[arg(long)]
    pub window_minutes: Option<i64>,

    /// Hours covered by the upcoming-reminders view.
    #[arg(long)]
    pub horizon_hours: Option<i64>,

    /// Clear a fired reminder when its time is edited (`true`/`false`).
    #[arg(long)]
    pub rearm_on_reschedule: Option<bool>,

    /// JSON fixture of users and tasks to load at startup.
    #[arg(long, env = "TODOSHARE_SEED")]
    pub seed: Option<PathBuf>,

    /// Run a single scan and exit.
    #[arg(long)]
    pub once: bool,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TODOSHARE_LOG")]
    pub log_level: String,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Reminder timing knobs shared by the scanner and the query surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderSettings {
    /// Pause between scans.
    pub scan_interval: Duration,
    /// Lead time at which reminders fire.
    pub window: ReminderWindow,
    /// Look-ahead of the upcoming-reminders view.
    pub horizon: chrono::Duration,
    /// Whether editing a time re-arms its reminder.
    pub rearm_on_reschedule: bool,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(DEFAULT_SCAN_INTERVAL_SECS),
            window: ReminderWindow::minutes(DEFAULT_WINDOW_MINUTES),
            horizon: chrono::Duration::hours(DEFAULT_HORIZON_HOURS),
            rearm_on_reschedule: false,
        }
    }
}

/// Fully resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub reminders: ReminderSettings,
    /// Fixture to apply at startup, if any.
    pub seed_path: Option<PathBuf>,
    /// Log level filter string.
    pub log_level: String,
    /// Scan once and exit instead of running the scanner loop.
    pub run_once: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reminders: ReminderSettings::default(),
            seed_path: None,
            log_level: "info".to_string(),
            run_once: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and missing file
    /// is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or a resolved value is out of range.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Result<Self, ConfigError> {
        let defaults = ReminderSettings::default();
        let section = &file.reminders;

        let scan_interval_secs = cli
            .scan_interval_secs
            .or(section.scan_interval_secs)
            .unwrap_or(DEFAULT_SCAN_INTERVAL_SECS);
        if scan_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "scan_interval_secs must be at least 1".to_string(),
            ));
        }
        let window_minutes = cli
            .window_minutes
            .or(section.window_minutes)
            .unwrap_or(DEFAULT_WINDOW_MINUTES);
        if !(1..=MAX_WINDOW_MINUTES).contains(&window_minutes) {
            return Err(ConfigError::Invalid(format!(
                "window_minutes must be between 1 and {MAX_WINDOW_MINUTES}, got {window_minutes}"
            )));
        }
        let horizon_hours = cli
            .horizon_hours
            .or(section.horizon_hours)
            .unwrap_or(DEFAULT_HORIZON_HOURS);
        if !(1..=MAX_HORIZON_HOURS).contains(&horizon_hours) {
            return Err(ConfigError::Invalid(format!(
                "horizon_hours must be between 1 and {MAX_HORIZON_HOURS}, got {horizon_hours}"
            )));
        }

        Ok(Self {
            reminders: ReminderSettings {
                scan_interval: Duration::from_secs(scan_interval_secs),
                window: ReminderWindow::minutes(window_minutes),
                horizon: chrono::Duration::hours(horizon_hours),
                rearm_on_reschedule: cli
                    .rearm_on_reschedule
                    .or(section.rearm_on_reschedule)
                    .unwrap_or(defaults.rearm_on_reschedule),
            },
            seed_path: cli.seed.clone().or_else(|| file.seed.path.clone()),
            log_level: cli.log_level.clone(),
            run_once: cli.once,
        })
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("todoshare").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
