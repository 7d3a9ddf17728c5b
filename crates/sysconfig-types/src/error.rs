//! Error types for the configuration registry.
//!
//! Every variant is recoverable. Read-path resolution errors can be suppressed by
//! passing a default to the accessor, write-path errors always reach the caller.

use std::fmt;

pub type ClResult<T> = std::result::Result<T, Error>;

/// One failed validator, paired with the display label of the field it guards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
	pub label: Box<str>,
	pub message: Box<str>,
}

impl ValidationError {
	pub fn new(message: impl Into<Box<str>>) -> Self {
		Self { label: "".into(), message: message.into() }
	}

	pub fn with_label(mut self, label: impl Into<Box<str>>) -> Self {
		self.label = label.into();
		self
	}
}

impl fmt::Display for ValidationError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.label.is_empty() {
			write!(f, "{}", self.message)
		} else {
			write!(f, "{}: {}", self.label, self.message)
		}
	}
}

#[derive(Debug)]
pub enum Error {
	/// Path does not have the required shape
	InvalidPath { path: Box<str>, reason: Box<str> },
	/// No declaration registered for the namespace
	NamespaceNotFound(Box<str>),
	/// Namespace exists but the section/field does not
	FieldNotFound(Box<str>),
	/// Value could not be encoded for storage
	ConfigValueError { path: Box<str>, value: Box<str>, reason: Box<str> },
	/// Value failed one or more declared validators (all failures collected)
	Validation(Vec<ValidationError>),
	/// Ciphertext is malformed or was produced with another key
	InvalidToken,

	// store / environment
	DbError,
	ServiceUnavailable(String),
	ConfigError(String),
	Internal(String),
}

impl Error {
	pub fn invalid_path(path: &str, reason: impl Into<Box<str>>) -> Self {
		Self::InvalidPath { path: path.into(), reason: reason.into() }
	}

	/// Errors raised while resolving a path to a registered field
	pub fn is_resolution(&self) -> bool {
		matches!(self, Self::InvalidPath { .. } | Self::NamespaceNotFound(_) | Self::FieldNotFound(_))
	}

	/// Errors meaning the store cannot serve requests yet (schema missing, pool down)
	pub fn is_store_unready(&self) -> bool {
		matches!(self, Self::DbError | Self::ServiceUnavailable(_))
	}

	/// Collected validation messages, formatted with their field label
	pub fn validation_messages(&self) -> Vec<String> {
		match self {
			Self::Validation(errors) => errors.iter().map(ToString::to_string).collect(),
			_ => Vec::new(),
		}
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::InvalidPath { path, reason } => {
				write!(f, "Invalid configuration path '{}': {}", path, reason)
			}
			Self::NamespaceNotFound(namespace) => {
				write!(f, "No configuration registered for namespace: {}", namespace)
			}
			Self::FieldNotFound(path) => write!(f, "Field not found: {}", path),
			Self::ConfigValueError { path, value, reason } => {
				write!(f, "Invalid value for {}: {} ({})", path, value, reason)
			}
			Self::Validation(errors) => {
				let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
				write!(f, "Validation failed: {}", messages.join("; "))
			}
			Self::InvalidToken => write!(f, "Invalid or corrupted encryption token"),
			Self::DbError => write!(f, "Database error"),
			Self::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
			Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
			Self::Internal(msg) => write!(f, "Internal error: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::Internal(format!("JSON error: {}", err))
	}
}


// vim: ts=4
