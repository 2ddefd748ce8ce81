//! Server configuration.
//!
//! Loaded from a RON file; every field is optional and falls back to its
//! default, so an empty file (or none at all) gives the default config.
//! Command-line flags override whatever the file says.
//!
//! ```ron
//! (
//!     bind_address: "0.0.0.0:3001",
//!     database_path: "/var/lib/folio/folio.db",
//!     uploads_dir: "/var/lib/folio/uploads",
//!     max_upload_bytes: 5242880,
//!     seed_sample_data: false,
//! )
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_BIND_ADDRESS, DEFAULT_DATABASE_PATH, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_UPLOADS_DIR,
};

/// Errors loading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Ron {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("max_upload_bytes must be greater than zero")]
    ZeroUploadLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
    pub database_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Insert the sample document when the database is empty.
    pub seed_sample_data: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            uploads_dir: PathBuf::from(DEFAULT_UPLOADS_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            seed_sample_data: true,
        }
    }
}

impl ServerConfig {
    /// Read and parse a RON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ServerConfig = ron::from_str(&text).map_err(|source| ConfigError::Ron {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `path` if given (must exist), else `fallback` if it exists, else
    /// defaults.
    pub fn load_or_default(path: Option<&Path>, fallback: &Path) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if fallback.exists() => Self::load(fallback),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::ZeroUploadLimit);
        }
        Ok(())
    }

    /// Apply command-line overrides.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(bind) = overrides.bind {
            self.bind_address = bind;
        }
        if let Some(db) = &overrides.database {
            self.database_path = db.clone();
        }
        if let Some(dir) = &overrides.uploads_dir {
            self.uploads_dir = dir.clone();
        }
        if let Some(limit) = overrides.max_upload_bytes {
            self.max_upload_bytes = limit;
        }
        if overrides.no_seed {
            self.seed_sample_data = false;
        }
    }
}

/// Flags that take precedence over the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Address to listen on
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// SQLite database file
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Directory for uploaded images
    #[arg(long)]
    pub uploads_dir: Option<PathBuf>,

    /// Largest accepted upload, in bytes
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    /// Do not seed an empty database with sample blocks
    #[arg(long)]
    pub no_seed: bool,
}
