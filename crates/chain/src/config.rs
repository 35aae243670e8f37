//! Chain configuration.
//!
//! Configuration is written in TOML and applies to every method slot of a
//! type (instances inherit their type's settings):
//!
//! ```toml
//! default-priority = 5
//! tie-break = "first-attached"
//! uninstall-when-empty = false
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::interceptor::Priority;

/// Order among interceptors that share a priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
	/// Earlier attachments run first (outermost).
	#[default]
	FirstAttached,
	/// Later attachments run first.
	LastAttached,
}

/// Settings shared by the slots of one type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ChainConfig {
	/// Priority used by `attach_default`.
	pub default_priority: Priority,
	/// Ordering among equal priorities.
	pub tie_break: TieBreak,
	/// Remove a slot's dispatcher once its last interceptor detaches.
	pub uninstall_when_empty: bool,
}

impl ChainConfig {
	/// Parses a configuration from TOML text.
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(text)?)
	}

	/// Reads and parses a configuration file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&text)
	}

	/// Returns this config with a different tie-break.
	pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
		self.tie_break = tie_break;
		self
	}

	/// Returns this config with teardown-when-empty toggled.
	pub fn with_uninstall_when_empty(mut self, uninstall: bool) -> Self {
		self.uninstall_when_empty = uninstall;
		self
	}
}
