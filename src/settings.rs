//! Configuration management for qctools.
//!
//! Users customize job generation and analysis defaults through an INI file.
//! Files are applied on top of each other with the following precedence:
//!
//! 1. Local configuration (`./qctools_config.cfg`)
//! 2. User configuration (`~/.config/qctools/qctools_config.cfg`)
//! 3. System configuration (`/etc/qctools/qctools_config.cfg`)
//! 4. Built-in defaults
//!
//! A file only needs the keys it changes; everything else keeps the value
//! from the lower-precedence layers.
//!
//! # Configuration File Format
//!
//! ```ini
//! [jobs]
//! username = alice
//! email_domain = pitt.edu
//! default_ppn = 4
//! default_walltime = 96
//! default_queue = shared
//!
//! [modules]
//! qchem = qchem/5.0
//!
//! [covp]
//! pct_cutoff = 2.0
//!
//! [vibrations]
//! co2_threshold = 0.50
//!
//! [logging]
//! level = info
//! ```

use configparser::ini::Ini;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::jobs::Program;

/// Name of the configuration file at every level.
pub const CONFIG_FILE_NAME: &str = "qctools_config.cfg";

/// Errors that can occur during configuration loading and processing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error when reading configuration files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// INI parsing error
    #[error("INI parsing error: {0}")]
    IniParse(String),
    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

type Section = HashMap<String, Option<String>>;

/// All program settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    /// Job file defaults
    pub jobs: JobSettings,
    /// Environment modules per program
    pub modules: ModuleSettings,
    /// COVP analysis defaults
    pub covp: CovpSettings,
    /// Vibrational analysis defaults
    pub vibrations: VibrationSettings,
    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Defaults for generated job files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobSettings {
    /// Mail recipient user name (default: `$USER`)
    pub username: String,
    /// Mail recipient domain (default: "pitt.edu")
    pub email_domain: String,
    /// Cores per job (default: 4)
    pub default_ppn: u32,
    /// Walltime in hours (default: 96)
    pub default_walltime: u32,
    /// Queue or partition (default: "shared")
    pub default_queue: String,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            username: std::env::var("USER").unwrap_or_else(|_| "user".to_string()),
            email_domain: "pitt.edu".to_string(),
            default_ppn: 4,
            default_walltime: 96,
            default_queue: "shared".to_string(),
        }
    }
}

/// Environment modules loaded by the job scripts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleSettings {
    /// Q-Chem module
    pub qchem: String,
    /// ORCA module
    pub orca: String,
    /// DALTON module (may list prerequisite modules first)
    pub dalton: String,
}

impl Default for ModuleSettings {
    fn default() -> Self {
        Self {
            qchem: "qchem/5.0".to_string(),
            orca: "orca/3.0.3".to_string(),
            dalton: "intel/15.0.3 mkl/11.2 dalton/2016.2-i2015.3-mkl_parallel-omp".to_string(),
        }
    }
}

impl ModuleSettings {
    /// Module line for a program.
    pub fn for_program(&self, program: Program) -> &str {
        match program {
            Program::QChem => &self.qchem,
            Program::Orca => &self.orca,
            Program::Dalton => &self.dalton,
        }
    }
}

/// COVP analysis defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CovpSettings {
    /// Minimum percentage contribution for a pair to be rendered (default: 2.0)
    pub pct_cutoff: f64,
}

impl Default for CovpSettings {
    fn default() -> Self {
        Self { pct_cutoff: 2.0 }
    }
}

/// Vibrational analysis defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VibrationSettings {
    /// Minimum normal-mode displacement of a CO2 atom (default: 0.50)
    pub co2_threshold: f64,
}

impl Default for VibrationSettings {
    fn default() -> Self {
        Self { co2_threshold: 0.50 }
    }
}

/// Logging configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level (default: "info")
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration manager that handles loading and accessing program settings.
pub struct SettingsManager {
    settings: Settings,
    config_source: String,
}

impl SettingsManager {
    /// Loads configuration from the system, user and local files in turn.
    ///
    /// Missing files are skipped. A file that cannot be read or parsed is
    /// reported with a warning and skipped as well.
    pub fn load() -> Result<Self, ConfigError> {
        let mut paths = Vec::new();
        if let Some(system) = Self::get_system_config_path() {
            paths.push(system);
        }
        if let Some(user) = Self::get_user_config_path() {
            paths.push(user);
        }
        paths.push(PathBuf::from(CONFIG_FILE_NAME));
        let manager = Self::load_from_paths(&paths);
        info!("Configuration loaded from: {}", manager.config_source);
        Ok(manager)
    }

    /// Applies the given files in order; later files win.
    pub fn load_from_paths(paths: &[PathBuf]) -> Self {
        let mut settings = Settings::default();
        let mut config_source = "built-in defaults".to_string();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load_config(path, &settings) {
                Ok(loaded) => {
                    settings = loaded;
                    config_source = path.display().to_string();
                    debug!("Loaded configuration from: {}", path.display());
                }
                Err(e) => {
                    warn!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }

        Self {
            settings,
            config_source,
        }
    }

    /// Returns the last configuration file applied.
    pub fn config_source(&self) -> &str {
        &self.config_source
    }

    /// Gets a reference to the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Gets the job settings.
    pub fn jobs(&self) -> &JobSettings {
        &self.settings.jobs
    }

    /// Gets the module settings.
    pub fn modules(&self) -> &ModuleSettings {
        &self.settings.modules
    }

    /// Gets the logging settings.
    pub fn logging(&self) -> &LoggingSettings {
        &self.settings.logging
    }

    /// Reads one INI file on top of `base`.
    fn load_config(path: &Path, base: &Settings) -> Result<Settings, ConfigError> {
        let content = fs::read_to_string(path)?;
        let mut ini = Ini::new();
        ini.read(content)
            .map_err(|e| ConfigError::IniParse(format!("Failed to parse INI: {}", e)))?;

        let mut settings = base.clone();
        let map = ini.get_map_ref();

        if let Some(section) = map.get("jobs") {
            Self::parse_jobs(section, &mut settings.jobs)?;
        }
        if let Some(section) = map.get("modules") {
            Self::parse_modules(section, &mut settings.modules);
        }
        if let Some(section) = map.get("covp") {
            if let Some(v) = parsed(section, "pct_cutoff")? {
                settings.covp.pct_cutoff = v;
            }
        }
        if let Some(section) = map.get("vibrations") {
            if let Some(v) = parsed(section, "co2_threshold")? {
                settings.vibrations.co2_threshold = v;
            }
        }
        if let Some(Some(level)) = map.get("logging").and_then(|s| s.get("level")) {
            settings.logging.level = level.clone();
        }

        Ok(settings)
    }

    fn parse_jobs(section: &Section, jobs: &mut JobSettings) -> Result<(), ConfigError> {
        if let Some(Some(username)) = section.get("username") {
            jobs.username = username.clone();
        }
        if let Some(Some(domain)) = section.get("email_domain") {
            jobs.email_domain = domain.clone();
        }
        if let Some(ppn) = parsed(section, "default_ppn")? {
            jobs.default_ppn = ppn;
        }
        if let Some(walltime) = parsed(section, "default_walltime")? {
            jobs.default_walltime = walltime;
        }
        if let Some(Some(queue)) = section.get("default_queue") {
            jobs.default_queue = queue.clone();
        }
        Ok(())
    }

    fn parse_modules(section: &Section, modules: &mut ModuleSettings) {
        if let Some(Some(qchem)) = section.get("qchem") {
            modules.qchem = qchem.clone();
        }
        if let Some(Some(orca)) = section.get("orca") {
            modules.orca = orca.clone();
        }
        if let Some(Some(dalton)) = section.get("dalton") {
            modules.dalton = dalton.clone();
        }
    }

    /// Gets the system configuration file path.
    fn get_system_config_path() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            Some(PathBuf::from("/etc/qctools").join(CONFIG_FILE_NAME))
        }
        #[cfg(windows)]
        {
            std::env::var("PROGRAMDATA")
                .ok()
                .map(|pd| PathBuf::from(pd).join("qctools").join(CONFIG_FILE_NAME))
        }
    }

    /// Gets the user configuration file path.
    fn get_user_config_path() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            std::env::var("HOME").ok().map(|home| {
                PathBuf::from(home)
                    .join(".config")
                    .join("qctools")
                    .join(CONFIG_FILE_NAME)
            })
        }
        #[cfg(windows)]
        {
            std::env::var("APPDATA")
                .ok()
                .map(|appdata| PathBuf::from(appdata).join("qctools").join(CONFIG_FILE_NAME))
        }
    }
}

fn parsed<T: FromStr>(section: &Section, key: &str) -> Result<Option<T>, ConfigError> {
    match section.get(key) {
        Some(Some(raw)) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(format!("Invalid {}: {}", key, raw))),
        _ => Ok(None),
    }
}

impl SettingsManager {
    /// Writes a commented configuration file holding every option at its
    /// default value.
    pub fn create_template(path: &Path) -> Result<(), ConfigError> {
        fs::write(path, Self::generate_template_content())?;
        info!("Created settings template at: {}", path.display());
        Ok(())
    }

    fn generate_template_content() -> String {
        let d = Settings::default();
        format!(
            r#"# qctools configuration file
#
# Files are read in this order, later ones overriding earlier ones:
#
# 1. /etc/qctools/qctools_config.cfg
# 2. ~/.config/qctools/qctools_config.cfg
# 3. ./qctools_config.cfg
#
# Missing sections or keys keep their built-in defaults shown below.

[jobs]
# Mail notifications go to <username>@<email_domain>
username = {}
email_domain = {}

# Cores, walltime (hours) and queue/partition used when the command line
# does not give them
default_ppn = {}
default_walltime = {}
default_queue = {}

[modules]
# Environment modules loaded by generated job scripts.
# Several space-separated modules may be given.
qchem = {}
orca = {}
dalton = {}

[covp]
# Pairs contributing less than this percentage are not rendered
pct_cutoff = {}

[vibrations]
# Minimum normal-mode displacement for a CO2 atom to count as moving
co2_threshold = {:.2}

[logging]
# debug, info, warn, error (RUST_LOG overrides this)
level = {}
"#,
            d.jobs.username,
            d.jobs.email_domain,
            d.jobs.default_ppn,
            d.jobs.default_walltime,
            d.jobs.default_queue,
            d.modules.qchem,
            d.modules.orca,
            d.modules.dalton,
            d.covp.pct_cutoff,
            d.vibrations.co2_threshold,
            d.logging.level,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_later_files_override_earlier() {
        let dir = TempDir::new().unwrap();
        let system = dir.path().join("system.cfg");
        let local = dir.path().join("local.cfg");
        fs::write(&system, "[jobs]\ndefault_ppn = 16\ndefault_queue = smp\n").unwrap();
        fs::write(&local, "[jobs]\ndefault_ppn = 8\n[covp]\npct_cutoff = 5.5\n").unwrap();

        let manager = SettingsManager::load_from_paths(&[
            system,
            dir.path().join("missing.cfg"),
            local.clone(),
        ]);
        assert_eq!(manager.jobs().default_ppn, 8);
        assert_eq!(manager.jobs().default_queue, "smp");
        assert!((manager.settings().covp.pct_cutoff - 5.5).abs() < 1e-12);
        assert_eq!(manager.jobs().default_walltime, 96);
        assert_eq!(manager.config_source(), local.display().to_string());
    }

    #[test]
    fn test_invalid_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad.cfg");
        fs::write(&bad, "[jobs]\ndefault_ppn = many\n").unwrap();
        let manager = SettingsManager::load_from_paths(&[bad]);
        assert_eq!(manager.settings(), &Settings::default());
        assert_eq!(manager.config_source(), "built-in defaults");
    }

    #[test]
    fn test_template_round_trips_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        SettingsManager::create_template(&path).unwrap();
        let manager = SettingsManager::load_from_paths(&[path]);
        assert_eq!(manager.settings(), &Settings::default());
        assert_eq!(manager.modules().for_program(Program::Orca), "orca/3.0.3");
    }
}
