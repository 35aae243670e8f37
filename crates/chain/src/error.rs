//! Error types for attachment and configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the attachment layer.
///
/// Detaching is total and never produces one of these; behavior errors
/// travel inside the method's own output type and are never wrapped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterceptError {
	/// The type never defined the named method, so there is no original to fall back on.
	#[error("no original behavior for '{type_name}::{method}'")]
	MissingOriginal {
		type_name: &'static str,
		method: &'static str,
	},

	/// A method key names a defined method but disagrees on its signature.
	#[error("signature mismatch for '{type_name}::{method}': defined as {expected}, keyed as {found}")]
	SignatureMismatch {
		type_name: &'static str,
		method: &'static str,
		expected: &'static str,
		found: &'static str,
	},

	/// The same method name was defined twice on one type.
	#[error("method '{type_name}::{method}' is already defined")]
	DuplicateMethod {
		type_name: &'static str,
		method: &'static str,
	},
}

/// Result type for attachment operations.
pub type Result<T> = std::result::Result<T, InterceptError>;

/// Errors that can occur when loading a chain configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or an invalid field value.
	#[error("config parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},
}
