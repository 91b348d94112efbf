use serde::Deserialize;
use serde_json::from_str;
use std::{
    fs::{read_to_string, OpenOptions},
    io::ErrorKind,
    path::PathBuf,
    time::Duration,
};

use tracing_subscriber::{filter::LevelFilter, fmt::time::ChronoLocal};

use crate::runtime::touchpad::MovePolicy;

// Wrapper so the logLevel field can be deserialized into a
// tracing LevelFilter, albeit in a roundabout way.
#[derive(Deserialize, Debug, Clone)]
pub enum LogLevel {
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "trace")]
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// All tunables, read once at startup from
/// `$XDG_CONFIG_HOME/touch-relay/config.json`. Every field has a
/// default, so a partial (or absent) file is fine.
#[serde_with::serde_as] // this has to be before the #[derive]
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Remote cursor endpoint, reached at `ws://host:port`.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Minimum spacing between two `move` (or two `scroll`) commands.
    #[serde(default = "default_50ms")]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub throttle_ms: Duration,

    /// Displacement (px, per axis) past which a contact counts as moved.
    #[serde(default = "default_5px")]
    pub move_threshold: f64,

    /// How long a stationary contact must stay down to begin a drag.
    #[serde(default = "default_500ms")]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub press_threshold_ms: Duration,

    #[serde(default = "default_1")]
    pub scroll_sensitivity: f64,

    #[serde(default = "default_1")]
    pub scrollbar_sensitivity: f64,

    /// What to do with motion while the long-press timer is running.
    #[serde(default = "default_immediate")]
    pub move_policy: MovePolicy,

    /// Fraction of the surface width, at the right edge, that acts as
    /// the scrollbar strip.
    #[serde(default = "default_tenth")]
    pub scrollbar_width: f64,

    /// Virtual resolution touch coordinates are scaled to. Thresholds
    /// above are in these units.
    #[serde(default = "default_1920")]
    pub surface_width: f64,

    #[serde(default = "default_1080")]
    pub surface_height: f64,

    /// Poll-loop sleep; keeps the event loop off a full CPU core.
    #[serde(default = "default_5ms")]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub response_time: Duration,

    #[serde(default = "default_stdout")]
    pub log_file: String,

    #[serde(default = "default_info")]
    pub log_level: LogLevel,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            host: "localhost".to_string(),
            port: 9000,
            throttle_ms: Duration::from_millis(50),
            move_threshold: 5.0,
            press_threshold_ms: Duration::from_millis(500),
            scroll_sensitivity: 1.0,
            scrollbar_sensitivity: 1.0,
            move_policy: MovePolicy::Immediate,
            scrollbar_width: 0.1,
            surface_width: 1920.0,
            surface_height: 1080.0,
            response_time: Duration::from_millis(5),
            log_file: "stdout".to_string(),
            log_level: LogLevel::Info,
        }
    }
}

impl Configuration {
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

// serde won't take default literals, only functions that yield them
fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    9000
}
fn default_1() -> f64 {
    1.0
}
fn default_5px() -> f64 {
    5.0
}
fn default_tenth() -> f64 {
    0.1
}
fn default_1920() -> f64 {
    1920.0
}
fn default_1080() -> f64 {
    1080.0
}
fn default_5ms() -> Duration {
    Duration::from_millis(5)
}
fn default_50ms() -> Duration {
    Duration::from_millis(50)
}
fn default_500ms() -> Duration {
    Duration::from_millis(500)
}
fn default_stdout() -> String {
    "stdout".to_string()
}
fn default_info() -> LogLevel {
    LogLevel::Info
}
fn default_immediate() -> MovePolicy {
    MovePolicy::Immediate
}

pub fn config_file_path() -> Result<PathBuf, std::io::Error> {
    let config_folder = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(config_dir) => PathBuf::from(config_dir),
        None => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(".config"),
            None => {
                return Err(std::io::Error::new(
                    ErrorKind::NotFound,
                    "Neither $XDG_CONFIG_HOME nor $HOME defined in environment",
                ));
            }
        },
    };
    Ok(config_folder.join("touch-relay/config.json"))
}

// A missing or broken config file should never stop the daemon; it only
// costs the user their customizations. parse_config_file raises so
// init_cfg can warn and fall back to defaults.
pub fn parse_config_file() -> Result<Configuration, std::io::Error> {
    let filepath = config_file_path()?;
    let jsonfile = read_to_string(&filepath).map_err(|_| {
        std::io::Error::new(
            ErrorKind::NotFound,
            format!("Unable to locate JSON file at {:?}", filepath),
        )
    })?;

    // use serde's error as is
    let config = from_str::<Configuration>(&jsonfile)?;

    Ok(config)
}

pub fn init_cfg() -> Configuration {
    println!("[PRE-LOG: INFO]: Loading configuration...");
    match parse_config_file() {
        Ok(cfg) => {
            println!(
                "[PRE-LOG: INFO]: Successfully loaded your configuration \
                (with defaults for unspecified values): \n{:#?}",
                &cfg
            );
            cfg
        }
        Err(err) => {
            let cfg = Configuration::default();
            println!(
                "\n[PRE-LOG: WARNING]: {err}\n\nThe configuration file could not be \
                loaded, so the program will continue with defaults of:\n{cfg:#?}",
            );
            cfg
        }
    }
}

/// Sets up the global tracing subscriber, logging to the configured
/// file, or stdout when `logFile` is "stdout" or cannot be opened.
pub fn init_logger(cfg: &Configuration) {
    let log_level: LevelFilter = cfg.log_level.clone().into();

    if cfg.log_file != "stdout" {
        match OpenOptions::new()
            .append(true)
            .create(true)
            .open(&cfg.log_file)
        {
            Ok(log_file) => {
                tracing_subscriber::fmt()
                    .with_writer(log_file)
                    .with_max_level(log_level)
                    .with_timer(ChronoLocal::rfc_3339())
                    .init();
                println!(
                    "[PRE-LOG: INFO]: Logging to '{}' at {}-level verbosity.",
                    cfg.log_file, log_level
                );
                return;
            }
            Err(open_err) => {
                println!(
                    "[PRE-LOG: WARN]: Failed to open logfile '{}': {}, {}. \
                    Logging to stdout at {log_level}-level verbosity.",
                    cfg.log_file,
                    open_err.kind(),
                    open_err
                );
            }
        }
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .with_max_level(log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();
}
