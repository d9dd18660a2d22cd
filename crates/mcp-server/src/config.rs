use rtlscope_runner::DEFAULT_MAX_CAPTURE_BYTES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_ENV: &str = "RTLSCOPE_CONFIG";
pub const DOCS_DIR_ENV: &str = "RTLSCOPE_DOCS_DIR";
pub const MAKE_ENV: &str = "RTLSCOPE_MAKE";
pub const RUN_TIMEOUT_ENV: &str = "RTLSCOPE_RUN_TIMEOUT_SECS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Server settings, read from TOML and then overridden by environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Directory holding the markdown documents served as resources.
    pub docs_dir: PathBuf,
    /// Build driver invoked by `run-analysis`.
    pub make_program: String,
    /// Kill `run-analysis` builds after this many seconds. Absent or zero means no limit.
    pub run_timeout_secs: Option<u64>,
    /// Per-stream cap on captured subprocess output.
    pub max_capture_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("docs"),
            make_program: "make".to_string(),
            run_timeout_secs: None,
            max_capture_bytes: DEFAULT_MAX_CAPTURE_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Parse a config file. A relative `docs_dir` is taken relative to the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text, path)?;
        if config.docs_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.docs_dir = parent.join(&config.docs_dir);
            }
        }
        Ok(config)
    }

    /// Load using the process environment and the user config directory. A relative
    /// `docs_dir` is pinned to the current directory.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(|key| std::env::var(key).ok(), default_config_path())?;
        config.anchor_docs_dir_to_cwd();
        Ok(config)
    }

    pub fn anchor_docs_dir(&mut self, base: &Path) {
        if self.docs_dir.is_relative() {
            self.docs_dir = base.join(&self.docs_dir);
        }
    }

    pub fn anchor_docs_dir_to_cwd(&mut self) {
        match std::env::current_dir() {
            Ok(cwd) => self.anchor_docs_dir(&cwd),
            Err(err) => log::warn!("cannot resolve docs dir {}: {err}", self.docs_dir.display()),
        }
    }

    /// Warn when the docs directory is missing. Doc resources then answer with fallback text.
    pub fn check_docs_dir(&self) -> bool {
        let present = self.docs_dir.is_dir();
        if !present {
            log::warn!(
                "docs directory {} does not exist; doc resources will be unavailable (set {DOCS_DIR_ENV})",
                self.docs_dir.display()
            );
        }
        present
    }

    /// Lookup order: `$RTLSCOPE_CONFIG`, then `fallback_path`, then defaults. Environment
    /// overrides are applied last.
    ///
    /// Only an explicitly named config that cannot be read or parsed is an error; a broken
    /// file at the fallback location is logged and ignored.
    pub fn load_from<F>(env: F, fallback_path: Option<PathBuf>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = env(CONFIG_ENV).filter(|value| !value.trim().is_empty());
        let mut config = match explicit {
            Some(path) => Self::from_file(Path::new(path.trim()))?,
            None => match fallback_path {
                Some(path) if path.is_file() => Self::from_file(&path).unwrap_or_else(|err| {
                    log::warn!("{err}; using defaults");
                    Self::default()
                }),
                _ => Self::default(),
            },
        };
        config.apply_env(env);
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        if let Some(dir) = non_empty(DOCS_DIR_ENV) {
            self.docs_dir = PathBuf::from(dir.trim());
        }
        if let Some(program) = non_empty(MAKE_ENV) {
            self.make_program = program.trim().to_string();
        }
        if let Some(raw) = non_empty(RUN_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.run_timeout_secs = Some(secs),
                Err(_) => log::warn!("Ignoring {RUN_TIMEOUT_ENV}={raw:?}: expected whole seconds"),
            }
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rtlscope").join("config.toml"))
}
