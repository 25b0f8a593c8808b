use crate::search::SearchLimits;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    ops::RangeInclusive,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

/// The depths a search frame stack is sized for.
pub const DEPTH_RANGE: RangeInclusive<u8> = 1..=31;

const CACHE_SUBDIR: &str = "twophase-tables";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{name} must be between 1 and 31, got {value}")]
    DepthOutOfRange { name: &'static str, value: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// The longest solution to search for.
    pub max_depth: u8,
    /// The search budget in milliseconds.
    pub timeout_ms: u64,
    /// Mark the boundary between the phases in formatted solutions.
    pub use_separator: bool,
    /// Stop improving once a solution this short is known.
    pub target_length: Option<u8>,
    pub max_phase2_depth: u8,
    /// Where pruning tables are cached. See [`SolverConfig::cache_dir`].
    pub cache_dir: Option<PathBuf>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_depth: 24,
            timeout_ms: 1000,
            use_separator: false,
            target_length: None,
            max_phase2_depth: 10,
            cache_dir: None,
        }
    }
}

impl SolverConfig {
    /// # Errors
    ///
    /// Fails if `s` is not valid TOML for this struct or holds out of range
    /// values.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config = toml::from_str::<Self>(s)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Fails if the file cannot be read or does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// # Errors
    ///
    /// Fails if either depth is outside [`DEPTH_RANGE`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("max_depth", self.max_depth),
            ("max_phase2_depth", self.max_phase2_depth),
        ] {
            if !DEPTH_RANGE.contains(&value) {
                return Err(ConfigError::DepthOutOfRange { name, value });
            }
        }
        Ok(())
    }

    /// The configured cache directory, or `twophase-tables` under the user
    /// cache directory, or under the temp directory if there is none.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(CACHE_SUBDIR),
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn search_limits(&self) -> SearchLimits {
        SearchLimits {
            max_depth: self.max_depth,
            max_phase2_depth: self.max_phase2_depth,
            target_length: self.target_length,
            timeout: self.timeout(),
        }
    }
}
