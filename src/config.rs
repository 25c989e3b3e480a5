//! Optional TOML settings. Command-line flags win over file values,
//! file values win over built-in defaults.
//!
//! ```toml
//! max_depth = 3
//! words_per_minute = 230
//! format = "markdown"
//! raw_ids = false
//! globs = ["*.md", "*.markdown"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{OutlineError, Result};
use crate::outline::{OutlineOptions, MAX_DEPTH};
use crate::stats::DEFAULT_WORDS_PER_MINUTE;
use crate::toc::TocFormat;

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV: &str = "MDOUTLINE_CONFIG";

/// Effective settings after merging.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub max_depth: u8,
    pub words_per_minute: u32,
    pub format: TocFormat,
    /// Print raw slugs instead of unique anchors.
    pub raw_ids: bool,
    /// Include patterns for directory walks; empty means the defaults.
    pub globs: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            format: TocFormat::Text,
            raw_ids: false,
            globs: Vec::new(),
        }
    }
}

/// Values given on the command line; `None` leaves the config value alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub max_depth: Option<u8>,
    pub words_per_minute: Option<u32>,
    pub format: Option<TocFormat>,
    pub raw_ids: bool,
    pub globs: Vec<String>,
}

impl Config {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|e| OutlineError::Config {
            path: path.to_path_buf(),
            reason: e.message().to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| OutlineError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&text, path)
    }

    /// Resolve the config file: explicit path, then `$MDOUTLINE_CONFIG`,
    /// then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => {
                log::debug!("loading config from {}", path.display());
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn apply(mut self, o: Overrides) -> Self {
        if let Some(d) = o.max_depth {
            self.max_depth = d;
        }
        if let Some(w) = o.words_per_minute {
            self.words_per_minute = w;
        }
        if let Some(f) = o.format {
            self.format = f;
        }
        self.raw_ids |= o.raw_ids;
        if !o.globs.is_empty() {
            self.globs = o.globs;
        }
        self
    }

    pub fn outline_options(&self) -> OutlineOptions {
        OutlineOptions {
            max_depth: self.max_depth,
        }
    }
}
