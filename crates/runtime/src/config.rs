//! Runtime configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file)
//! yields [`RuntimeConfig::default`].

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default cap on hook sort scans before a band is declared contradictory.
pub const DEFAULT_MAX_SORT_PASSES: usize = 4096;

/// Tunables for a [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
	/// Maximum number of scans the hook sorter performs per band.
	pub max_sort_passes: usize,
	/// Reject `add_hook` calls whose constraints do not settle instead of
	/// logging a warning and keeping the last order.
	pub strict_constraints: bool,
	/// Emit a trace event for every handler the invoker runs.
	pub trace_hooks: bool,
}

impl Default for RuntimeConfig {
	fn default() -> Self {
		Self {
			max_sort_passes: DEFAULT_MAX_SORT_PASSES,
			strict_constraints: false,
			trace_hooks: false,
		}
	}
}

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML syntax or field types.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// A field holds a value outside its valid range.
	#[error("invalid value for '{field}': {reason}")]
	InvalidValue {
		/// Field name.
		field: &'static str,
		/// Why the value was rejected.
		reason: &'static str,
	},
}

impl RuntimeConfig {
	/// Parses a configuration from TOML text.
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads and parses a configuration file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&text)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.max_sort_passes == 0 {
			return Err(ConfigError::InvalidValue {
				field: "max_sort_passes",
				reason: "must allow at least one pass",
			});
		}
		Ok(())
	}
}
