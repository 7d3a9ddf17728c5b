//! Validators for configuration fields
//!
//! A validator inspects a candidate typed value before it is persisted. `None`
//! passes every validator except [`Required`]. Numeric comparisons go through
//! `Decimal`, never binary floating point.

use regex::Regex;
use rust_decimal::Decimal;
use std::{
	fmt::{self, Debug},
	net::{IpAddr, Ipv4Addr, Ipv6Addr},
	sync::LazyLock,
};

use crate::prelude::*;

/// Closure form of a validator, for checks that do not warrant their own type
pub type ValidatorFn = Box<dyn Fn(Option<&ConfigValue>) -> Result<(), String> + Send + Sync>;

pub trait Validator: Debug + Send + Sync {
	/// Check a value, returning the failure message
	fn validate(&self, value: Option<&ConfigValue>) -> Result<(), String>;

	/// Presence validators make a field "required"
	fn is_presence(&self) -> bool {
		false
	}
}

/// Run every validator and collect all failures, each paired with `label`
pub fn validate_value(
	value: Option<&ConfigValue>,
	validators: &[Box<dyn Validator>],
	label: &str,
) -> Vec<ValidationError> {
	validators
		.iter()
		.filter_map(|validator| validator.validate(value).err())
		.map(|message| ValidationError::new(message).with_label(label))
		.collect()
}

fn message_or(custom: Option<&str>, default: &str) -> String {
	custom.unwrap_or(default).to_string()
}

fn is_empty_str(value: Option<&ConfigValue>) -> bool {
	matches!(value, Some(ConfigValue::String(s)) if s.is_empty())
}

/// String view for format validators. Empty strings are skipped like `None`.
fn format_input(value: Option<&ConfigValue>) -> FormatInput<'_> {
	match value {
		None => FormatInput::Skip,
		Some(ConfigValue::String(s)) if s.is_empty() => FormatInput::Skip,
		Some(ConfigValue::String(s)) => FormatInput::Text(s),
		Some(_) => FormatInput::NotText,
	}
}

enum FormatInput<'a> {
	Skip,
	Text(&'a str),
	NotText,
}

// Presence
//**********
/// Fails on null, an empty/whitespace-only string, or an empty collection
#[derive(Debug, Default)]
pub struct Required {
	message: Option<Box<str>>,
}

impl Required {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_message(mut self, message: impl Into<Box<str>>) -> Self {
		self.message = Some(message.into());
		self
	}
}

impl Validator for Required {
	fn validate(&self, value: Option<&ConfigValue>) -> Result<(), String> {
		let empty = match value {
			None => true,
			Some(ConfigValue::String(s)) => s.trim().is_empty(),
			Some(ConfigValue::Json(serde_json::Value::Array(a))) => a.is_empty(),
			Some(ConfigValue::Json(serde_json::Value::Object(o))) => o.is_empty(),
			Some(ConfigValue::Json(serde_json::Value::Null)) => true,
			Some(_) => false,
		};
		if empty {
			return Err(message_or(self.message.as_deref(), "This field is required."));
		}
		Ok(())
	}

	fn is_presence(&self) -> bool {
		true
	}
}

/// Fails on a whitespace-only string; null is allowed
#[derive(Debug, Default)]
pub struct NotBlank {
	message: Option<Box<str>>,
}

impl NotBlank {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_message(mut self, message: impl Into<Box<str>>) -> Self {
		self.message = Some(message.into());
		self
	}
}

impl Validator for NotBlank {
	fn validate(&self, value: Option<&ConfigValue>) -> Result<(), String> {
		match value {
			Some(ConfigValue::String(s)) if s.trim().is_empty() => {
				Err(message_or(self.message.as_deref(), "This field cannot be blank."))
			}
			_ => Ok(()),
		}
	}
}

// Length
//********
/// Character-count bounds on string values (inclusive)
#[derive(Debug, Default)]
pub struct Length {
	min: Option<usize>,
	max: Option<usize>,
	message: Option<Box<str>>,
}

impl Length {
	pub fn min(min: usize) -> Self {
		Self { min: Some(min), ..Self::default() }
	}

	pub fn max(max: usize) -> Self {
		Self { max: Some(max), ..Self::default() }
	}

	pub fn between(min: usize, max: usize) -> Self {
		Self { min: Some(min), max: Some(max), message: None }
	}

	pub fn with_message(mut self, message: impl Into<Box<str>>) -> Self {
		self.message = Some(message.into());
		self
	}
}

impl Validator for Length {
	fn validate(&self, value: Option<&ConfigValue>) -> Result<(), String> {
		let Some(ConfigValue::String(s)) = value else { return Ok(()) };
		let len = s.chars().count();
		if let Some(min) = self.min {
			if len < min {
				return Err(self.message.as_deref().map_or_else(
					|| format!("Must be at least {} characters.", min),
					ToString::to_string,
				));
			}
		}
		if let Some(max) = self.max {
			if len > max {
				return Err(self.message.as_deref().map_or_else(
					|| format!("Must be at most {} characters.", max),
					ToString::to_string,
				));
			}
		}
		Ok(())
	}
}

// Regex
//*******
/// Regex match (or non-match when inverted) on string values
#[derive(Debug)]
pub struct Pattern {
	regex: Regex,
	inverse: bool,
	message: Option<Box<str>>,
}

impl Pattern {
	pub fn new(pattern: &str) -> ClResult<Self> {
		let regex = Regex::new(pattern)
			.map_err(|e| Error::ConfigError(format!("invalid validator pattern: {}", e)))?;
		Ok(Self { regex, inverse: false, message: None })
	}

	/// Fail when the pattern matches instead of when it does not
	pub fn inverse(mut self) -> Self {
		self.inverse = true;
		self
	}

	pub fn with_message(mut self, message: impl Into<Box<str>>) -> Self {
		self.message = Some(message.into());
		self
	}
}

impl Validator for Pattern {
	fn validate(&self, value: Option<&ConfigValue>) -> Result<(), String> {
		let Some(ConfigValue::String(s)) = value else { return Ok(()) };
		if self.regex.is_match(s) == self.inverse {
			return Err(message_or(
				self.message.as_deref(),
				"Value does not match the required pattern.",
			));
		}
		Ok(())
	}
}

// Numeric
//*********
const NOT_A_NUMBER: &str = "Must be a valid number.";

fn numeric(value: &ConfigValue) -> Result<Decimal, String> {
	value.to_decimal().ok_or_else(|| NOT_A_NUMBER.to_string())
}

/// Inclusive numeric range
#[derive(Debug)]
pub struct Range {
	min: Option<Decimal>,
	max: Option<Decimal>,
	message: Option<Box<str>>,
}

impl Range {
	pub fn new(min: impl Into<Decimal>, max: impl Into<Decimal>) -> Self {
		Self { min: Some(min.into()), max: Some(max.into()), message: None }
	}

	pub fn at_least(min: impl Into<Decimal>) -> Self {
		Self { min: Some(min.into()), max: None, message: None }
	}

	pub fn at_most(max: impl Into<Decimal>) -> Self {
		Self { min: None, max: Some(max.into()), message: None }
	}

	pub fn with_message(mut self, message: impl Into<Box<str>>) -> Self {
		self.message = Some(message.into());
		self
	}

	fn default_message(&self) -> String {
		match (self.min, self.max) {
			(Some(min), Some(max)) => format!("Must be between {} and {}.", min, max),
			(Some(min), None) => format!("Must be at least {}.", min),
			(None, Some(max)) => format!("Must be at most {}.", max),
			(None, None) => "Invalid value.".to_string(),
		}
	}
}

impl Validator for Range {
	fn validate(&self, value: Option<&ConfigValue>) -> Result<(), String> {
		let Some(value) = value else { return Ok(()) };
		let number = numeric(value)?;
		let below = self.min.is_some_and(|min| number < min);
		let above = self.max.is_some_and(|max| number > max);
		if below || above {
			return Err(self.message.as_deref().map_or_else(|| self.default_message(), ToString::to_string));
		}
		Ok(())
	}
}

/// Strictly greater than zero
#[derive(Debug, Default)]
pub struct Positive {
	message: Option<Box<str>>,
}

impl Positive {
	pub fn new() -> Self {
		Self::default()
	}
}

impl Validator for Positive {
	fn validate(&self, value: Option<&ConfigValue>) -> Result<(), String> {
		let Some(value) = value else { return Ok(()) };
		if numeric(value)? <= Decimal::ZERO {
			return Err(message_or(self.message.as_deref(), "Must be a positive number."));
		}
		Ok(())
	}
}

/// Zero or greater
#[derive(Debug, Default)]
pub struct NonNegative {
	message: Option<Box<str>>,
}

impl NonNegative {
	pub fn new() -> Self {
		Self::default()
	}
}

impl Validator for NonNegative {
	fn validate(&self, value: Option<&ConfigValue>) -> Result<(), String> {
		let Some(value) = value else { return Ok(()) };
		if numeric(value)? < Decimal::ZERO {
			return Err(message_or(self.message.as_deref(), "Must be zero or a positive number."));
		}
		Ok(())
	}
}

// Formats
//*********
static EMAIL_RE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(?i)^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").ok());

static URL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
	Regex::new(concat!(
		r"(?i)^[a-z][a-z0-9+.-]*://",
		r"(?:(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}\.?|",
		r"localhost|",
		r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})",
		r"(?::\d+)?",
		r"(?:/?|[/?]\S+)$",
	))
	.ok()
});

static DOMAIN_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
	Regex::new(concat!(
		r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)*",
		r"[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$",
	))
	.ok()
});

static SLUG_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").ok());

fn is_match(re: &LazyLock<Option<Regex>>, value: &str) -> bool {
	re.as_ref().is_some_and(|re| re.is_match(value))
}

/// Generates a format validator: a struct with an optional custom message whose
/// check runs on non-empty string values only (non-strings fail)
macro_rules! format_validator {
	($(#[$meta:meta])* $name:ident, $default:expr, $check:expr) => {
		$(#[$meta])*
		#[derive(Debug, Default)]
		pub struct $name {
			message: Option<Box<str>>,
		}

		impl $name {
			pub fn new() -> Self {
				Self::default()
			}

			pub fn with_message(mut self, message: impl Into<Box<str>>) -> Self {
				self.message = Some(message.into());
				self
			}
		}

		impl Validator for $name {
			fn validate(&self, value: Option<&ConfigValue>) -> Result<(), String> {
				let check: fn(&str) -> bool = $check;
				match format_input(value) {
					FormatInput::Skip => Ok(()),
					FormatInput::Text(s) if check(s) => Ok(()),
					_ => Err(message_or(self.message.as_deref(), $default)),
				}
			}
		}
	};
}

format_validator!(
	/// Email address
	Email,
	"Enter a valid email address.",
	|s| is_match(&EMAIL_RE, s)
);

format_validator!(
	/// Hostname: at most 253 characters, labels of 1-63 alphanumerics or hyphens,
	/// not starting or ending with a hyphen
	Hostname,
	"Enter a valid hostname.",
	|s| {
		s.len() <= 253
			&& !s.starts_with('-')
			&& !s.ends_with('-')
			&& s.split('.').all(|label| {
				(1..=63).contains(&label.len())
					&& label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
			})
	}
);

format_validator!(
	/// Domain name
	Domain,
	"Enter a valid domain name.",
	|s| s.len() <= 253 && is_match(&DOMAIN_RE, s)
);

format_validator!(
	/// Letters, numbers, hyphens and underscores
	Slug,
	"Enter a valid slug (letters, numbers, hyphens, underscores only).",
	|s| is_match(&SLUG_RE, s)
);

/// JSON syntax; already-parsed JSON values pass
#[derive(Debug, Default)]
pub struct Json {
	message: Option<Box<str>>,
}

impl Json {
	pub fn new() -> Self {
		Self::default()
	}
}

impl Validator for Json {
	fn validate(&self, value: Option<&ConfigValue>) -> Result<(), String> {
		match format_input(value) {
			FormatInput::Text(s) if serde_json::from_str::<serde_json::Value>(s).is_err() => {
				Err(message_or(self.message.as_deref(), "Enter valid JSON."))
			}
			_ => Ok(()),
		}
	}
}

/// URL with a scheme allow-list
#[derive(Debug)]
pub struct Url {
	schemes: Vec<Box<str>>,
	message: Option<Box<str>>,
}

impl Default for Url {
	fn default() -> Self {
		Self { schemes: vec!["http".into(), "https".into(), "ftp".into()], message: None }
	}
}

impl Url {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn schemes<S: Into<Box<str>>>(schemes: impl IntoIterator<Item = S>) -> Self {
		Self { schemes: schemes.into_iter().map(Into::into).collect(), message: None }
	}

	pub fn with_message(mut self, message: impl Into<Box<str>>) -> Self {
		self.message = Some(message.into());
		self
	}
}

impl Validator for Url {
	fn validate(&self, value: Option<&ConfigValue>) -> Result<(), String> {
		let s = match format_input(value) {
			FormatInput::Skip => return Ok(()),
			FormatInput::Text(s) if is_match(&URL_RE, s) => s,
			_ => return Err(message_or(self.message.as_deref(), "Enter a valid URL.")),
		};
		let scheme = s.split("://").next().unwrap_or_default().to_ascii_lowercase();
		if !self.schemes.iter().any(|allowed| allowed.eq_ignore_ascii_case(&scheme)) {
			return Err(format!("URL scheme must be one of: {}", self.schemes.join(", ")));
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
	V4,
	V6,
}

/// IPv4, IPv6, or either
#[derive(Debug, Default)]
pub struct IpAddress {
	version: Option<IpVersion>,
	message: Option<Box<str>>,
}

impl IpAddress {
	pub fn any() -> Self {
		Self::default()
	}

	pub fn v4() -> Self {
		Self { version: Some(IpVersion::V4), message: None }
	}

	pub fn v6() -> Self {
		Self { version: Some(IpVersion::V6), message: None }
	}

	pub fn with_message(mut self, message: impl Into<Box<str>>) -> Self {
		self.message = Some(message.into());
		self
	}
}

impl Validator for IpAddress {
	fn validate(&self, value: Option<&ConfigValue>) -> Result<(), String> {
		let (valid, default) = match (format_input(value), self.version) {
			(FormatInput::Skip, _) => return Ok(()),
			(FormatInput::Text(s), Some(IpVersion::V4)) => {
				(s.parse::<Ipv4Addr>().is_ok(), "Enter a valid IPv4 address.")
			}
			(FormatInput::Text(s), Some(IpVersion::V6)) => {
				(s.parse::<Ipv6Addr>().is_ok(), "Enter a valid IPv6 address.")
			}
			(FormatInput::Text(s), None) => (s.parse::<IpAddr>().is_ok(), "Enter a valid IP address."),
			(FormatInput::NotText, _) => (false, "Enter a valid IP address."),
		};
		if !valid {
			return Err(message_or(self.message.as_deref(), default));
		}
		Ok(())
	}
}

/// Filesystem path without NUL bytes, optionally absolute
#[derive(Debug, Default)]
pub struct FilePath {
	must_be_absolute: bool,
	message: Option<Box<str>>,
}

impl FilePath {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn absolute() -> Self {
		Self { must_be_absolute: true, message: None }
	}
}

impl Validator for FilePath {
	fn validate(&self, value: Option<&ConfigValue>) -> Result<(), String> {
		match format_input(value) {
			FormatInput::Skip => Ok(()),
			FormatInput::NotText => Err(message_or(self.message.as_deref(), "Enter a valid file path.")),
			FormatInput::Text(s) if s.contains('\0') => {
				Err(message_or(self.message.as_deref(), "Enter a valid file path."))
			}
			FormatInput::Text(s) if self.must_be_absolute && !std::path::Path::new(s).is_absolute() => {
				Err("Path must be absolute.".to_string())
			}
			FormatInput::Text(_) => Ok(()),
		}
	}
}

/// TCP/UDP port number 1-65535
#[derive(Debug, Default)]
pub struct Port {
	message: Option<Box<str>>,
}

impl Port {
	pub fn new() -> Self {
		Self::default()
	}
}

impl Validator for Port {
	fn validate(&self, value: Option<&ConfigValue>) -> Result<(), String> {
		if value.is_none() || is_empty_str(value) {
			return Ok(());
		}
		let port = value.and_then(|v| match v {
			ConfigValue::Bool(_) => None,
			v => v.to_decimal().filter(|d| d.fract().is_zero()),
		});
		match port {
			Some(port) if port >= Decimal::ONE && port <= Decimal::from(65535) => Ok(()),
			_ => Err(message_or(self.message.as_deref(), "Enter a valid port number (1-65535).")),
		}
	}
}

macro_rules! impl_with_message {
	($($name:ident),*) => {
		$(impl $name {
			pub fn with_message(mut self, message: impl Into<Box<str>>) -> Self {
				self.message = Some(message.into());
				self
			}
		})*
	};
}

impl_with_message!(Positive, NonNegative, Json, FilePath, Port);

// Choices
//*********
/// Membership in a fixed set of values
#[derive(Debug)]
pub struct Choice {
	choices: Vec<ConfigValue>,
	message: Option<Box<str>>,
}

impl Choice {
	pub fn new<V: Into<ConfigValue>>(choices: impl IntoIterator<Item = V>) -> Self {
		Self { choices: choices.into_iter().map(Into::into).collect(), message: None }
	}

	pub fn with_message(mut self, message: impl Into<Box<str>>) -> Self {
		self.message = Some(message.into());
		self
	}
}

impl Validator for Choice {
	fn validate(&self, value: Option<&ConfigValue>) -> Result<(), String> {
		let Some(value) = value else { return Ok(()) };
		if !self.choices.contains(value) {
			let listed: Vec<String> = self.choices.iter().map(ToString::to_string).collect();
			return Err(self
				.message
				.as_deref()
				.map_or_else(|| format!("Must be one of: {}", listed.join(", ")), ToString::to_string));
		}
		Ok(())
	}
}

// Custom
//********
/// Wraps a closure as a validator
pub struct Custom {
	check: ValidatorFn,
}

impl Custom {
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(Option<&ConfigValue>) -> Result<(), String> + Send + Sync + 'static,
	{
		Self { check: Box::new(f) }
	}
}

impl Debug for Custom {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Custom").finish_non_exhaustive()
	}
}

impl Validator for Custom {
	fn validate(&self, value: Option<&ConfigValue>) -> Result<(), String> {
		(self.check)(value)
	}
}


// vim: ts=4
