//! Configuration management
//!
//! Settings come from built-in defaults, an optional `~/.invdict.cfg` and
//! the command line, in increasing order of precedence. The resulting
//! `Config` is built once and handed to the tasks that need it.

use crate::{InvDictError, Result};
use ini::Ini;
use log::{debug, info};
use std::path::{Path, PathBuf};

pub const DEFAULT_PROGRAM: &str = "say";
pub const DEFAULT_RATE_FLAG: &str = "-r";
pub const DEFAULT_RATE: u32 = 100;

/// Invocation configuration for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Speaker program
    pub program: String,

    /// Flag that precedes the rate on the speaker's command line
    pub rate_flag: String,

    /// Speech rate, in the speaker's own units (words per minute for `say`)
    pub rate: u32,

    /// Additional arguments appended after the rate
    pub extra_args: Vec<String>,

    /// Complete speaker command line given by the user; replaces everything above
    pub command: Option<Vec<String>>,

    /// Diagnostic logging
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            rate_flag: DEFAULT_RATE_FLAG.to_string(),
            rate: DEFAULT_RATE,
            extra_args: Vec::new(),
            command: None,
            debug: false,
        }
    }
}

impl Config {
    /// Load `~/.invdict.cfg` if present, else defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load settings from an INI file on top of the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let ini = Ini::load_from_file(path).map_err(|e| {
            InvDictError::Config(format!("Failed to load {}: {}", path.display(), e))
        })?;
        let config = Self::from_ini(&ini)?;
        info!("Configuration loaded from {:?}", path);
        Ok(config)
    }

    /// Apply the `[speech]` and `[general]` sections of `ini` over the defaults
    pub fn from_ini(ini: &Ini) -> Result<Self> {
        let mut config = Self::default();

        if let Some(program) = ini.get_from(Some("speech"), "program") {
            config.program = program.trim().to_string();
        }
        if let Some(flag) = ini.get_from(Some("speech"), "rate_flag") {
            config.rate_flag = flag.trim().to_string();
        }
        if let Some(rate) = ini.get_from(Some("speech"), "rate") {
            config.rate = parse_rate(rate)?;
        }
        if let Some(args) = ini.get_from(Some("speech"), "args") {
            config.extra_args = args.split_whitespace().map(str::to_string).collect();
        }
        if let Some(debug) = ini.get_from(Some("general"), "debug") {
            config.debug = debug.trim().parse().map_err(|_| {
                InvDictError::Config(format!("general.debug must be true or false, got '{}'", debug))
            })?;
        }

        if config.program.is_empty() {
            return Err(InvDictError::Config("speech.program is empty".to_string()));
        }

        Ok(config)
    }

    /// Config file path (~/.invdict.cfg)
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".invdict.cfg"))
    }

    /// Full command line used to start the speaker
    pub fn speaker_command(&self) -> Vec<String> {
        if let Some(command) = &self.command {
            return command.clone();
        }

        let mut argv = vec![self.program.clone()];
        if !self.rate_flag.is_empty() {
            argv.push(self.rate_flag.clone());
            argv.push(self.rate.to_string());
        }
        argv.extend(self.extra_args.iter().cloned());
        argv
    }
}

/// Parse a speech rate value
pub fn parse_rate(value: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(rate) if rate > 0 => Ok(rate),
        _ => Err(InvDictError::Config(format!(
            "rate must be a positive integer, got '{}'",
            value.trim()
        ))),
    }
}
