use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::Args;
use serde::Deserialize;
use tracing::warn;

use crate::serial::DEFAULT_BAUD_RATE;

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub serial_port: String,
    pub baud_rate: u32,
    pub votes_log_path: PathBuf,
    pub static_dir: PathBuf,
    pub log_queue_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            serial_port: default_serial_port().into(),
            baud_rate: DEFAULT_BAUD_RATE,
            votes_log_path: PathBuf::from("./data/votes-log.jsonl"),
            static_dir: PathBuf::from("public"),
            log_queue_capacity: storage::DEFAULT_QUEUE_CAPACITY,
        }
    }
}

fn default_serial_port() -> &'static str {
    if cfg!(windows) {
        "COM3"
    } else {
        "/dev/ttyUSB0"
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    bind_addr: Option<String>,
    serial_port: Option<String>,
    baud_rate: Option<u32>,
    votes_log_path: Option<PathBuf>,
    static_dir: Option<PathBuf>,
    log_queue_capacity: Option<usize>,
}

/// Command-line overrides, applied after the file and the environment.
#[derive(Debug, Default, Args)]
pub struct SettingsOverrides {
    /// Serial device the voting receiver is attached to.
    #[arg(long)]
    pub serial_port: Option<String>,
    #[arg(long)]
    pub baud_rate: Option<u32>,
    /// Address the HTTP server listens on.
    #[arg(long)]
    pub bind: Option<String>,
    /// Where received votes are logged.
    #[arg(long)]
    pub votes_log: Option<PathBuf>,
}

pub fn load_settings(config_path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => settings.apply_file(file_cfg),
            Err(error) => warn!(
                path = %config_path.display(),
                %error,
                "ignoring unreadable config file"
            ),
        }
    }

    settings.apply_env(|key| std::env::var(key).ok());
    settings
}

impl Settings {
    fn apply_file(&mut self, file_cfg: FileSettings) {
        if let Some(v) = file_cfg.bind_addr {
            self.bind_addr = v;
        }
        if let Some(v) = file_cfg.serial_port {
            self.serial_port = v;
        }
        if let Some(v) = file_cfg.baud_rate {
            self.baud_rate = v;
        }
        if let Some(v) = file_cfg.votes_log_path {
            self.votes_log_path = v;
        }
        if let Some(v) = file_cfg.static_dir {
            self.static_dir = v;
        }
        if let Some(v) = file_cfg.log_queue_capacity {
            self.log_queue_capacity = v;
        }
    }

    pub(crate) fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("SERVER_BIND") {
            self.bind_addr = v;
        }
        if let Some(v) = var("APP__BIND_ADDR") {
            self.bind_addr = v;
        }

        if let Some(v) = var("SERIAL_PORT") {
            self.serial_port = v;
        }
        if let Some(v) = var("APP__SERIAL_PORT") {
            self.serial_port = v;
        }

        for key in ["SERIAL_BAUD_RATE", "APP__BAUD_RATE"] {
            if let Some(parsed) = var(key).and_then(|v| v.parse::<u32>().ok()) {
                self.baud_rate = parsed;
            }
        }

        if let Some(v) = var("VOTES_LOG_PATH") {
            self.votes_log_path = PathBuf::from(v);
        }
        if let Some(v) = var("APP__VOTES_LOG_PATH") {
            self.votes_log_path = PathBuf::from(v);
        }

        if let Some(v) = var("APP__STATIC_DIR") {
            self.static_dir = PathBuf::from(v);
        }

        if let Some(parsed) = var("APP__LOG_QUEUE_CAPACITY").and_then(|v| v.parse::<usize>().ok()) {
            self.log_queue_capacity = parsed;
        }
    }

    pub fn apply(mut self, overrides: SettingsOverrides) -> Self {
        if let Some(v) = overrides.serial_port {
            self.serial_port = v;
        }
        if let Some(v) = overrides.baud_rate {
            self.baud_rate = v;
        }
        if let Some(v) = overrides.bind {
            self.bind_addr = v;
        }
        if let Some(v) = overrides.votes_log {
            self.votes_log_path = v;
        }
        self
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
