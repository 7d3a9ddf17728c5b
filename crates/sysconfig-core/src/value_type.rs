//! Value-type plugins
//!
//! A value type converts between the raw string kept in the store and the typed
//! value handed to callers. Decoding an absent or empty raw value always yields
//! `None`.
//!
//! Plugins are looked up by name through [`ValueTypes`], an explicit table of
//! names and aliases. Unknown names resolve to the string plugin.

use rust_decimal::Decimal;
use std::{collections::HashMap, fmt::Debug, sync::Arc};

use crate::encryption::Encryption;
use crate::prelude::*;

/// Open key/value bag carried by a field for plugin-specific parameters
pub type Extra = std::collections::BTreeMap<Box<str>, serde_json::Value>;

const DEFAULT_DECIMAL_STEP: &str = "0.01";
const TRUTHY_TOKENS: [&str; 4] = ["true", "1", "yes", "on"];

/// How an admin surface should present a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
	Text,
	Textarea,
	Number { step: Option<Box<str>> },
	Checkbox,
	Select { choices: Vec<(Box<str>, Box<str>)> },
	Password,
}

pub trait ValueType: Debug + Send + Sync {
	/// Canonical plugin name
	fn name(&self) -> &'static str;

	/// Stored raw string -> typed value
	fn decode(&self, raw: Option<&str>) -> ClResult<Option<ConfigValue>>;

	/// Typed value -> stored raw string
	fn encode(&self, value: Option<&ConfigValue>) -> ClResult<Option<String>>;

	/// Operator text input (form field, command line) -> typed value
	fn parse_input(&self, input: &str) -> ClResult<Option<ConfigValue>> {
		self.decode(Some(input))
	}

	fn presentation(&self, _extra: &Extra) -> Presentation {
		Presentation::Text
	}
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
	raw.filter(|s| !s.is_empty())
}

fn mismatch(expected: &str, value: &ConfigValue) -> Error {
	Error::Internal(format!("expected {}, got {}", expected, value.type_name()))
}

fn string_of(value: &ConfigValue) -> String {
	value.to_string()
}

// String
//********
#[derive(Debug, Default)]
pub struct StringType;

impl ValueType for StringType {
	fn name(&self) -> &'static str {
		"string"
	}

	fn decode(&self, raw: Option<&str>) -> ClResult<Option<ConfigValue>> {
		Ok(non_empty(raw).map(ConfigValue::from))
	}

	fn encode(&self, value: Option<&ConfigValue>) -> ClResult<Option<String>> {
		Ok(value.map(string_of))
	}
}

// Multi-line text
//*****************
#[derive(Debug, Default)]
pub struct MultilineTextType;

impl ValueType for MultilineTextType {
	fn name(&self) -> &'static str {
		"multiline-text"
	}

	fn decode(&self, raw: Option<&str>) -> ClResult<Option<ConfigValue>> {
		StringType.decode(raw)
	}

	fn encode(&self, value: Option<&ConfigValue>) -> ClResult<Option<String>> {
		StringType.encode(value)
	}

	fn presentation(&self, _extra: &Extra) -> Presentation {
		Presentation::Textarea
	}
}

// Integer
//*********
#[derive(Debug, Default)]
pub struct IntegerType;

impl IntegerType {
	fn coerce(value: &ConfigValue) -> ClResult<i64> {
		match value {
			ConfigValue::Int(i) => Ok(*i),
			ConfigValue::String(s) => s
				.trim()
				.parse::<i64>()
				.map_err(|_| Error::Internal(format!("'{}' is not an integer", s))),
			ConfigValue::Decimal(d) if d.fract().is_zero() => i64::try_from(*d)
				.map_err(|_| Error::Internal(format!("{} is out of integer range", d))),
			value => Err(mismatch("integer", value)),
		}
	}
}

impl ValueType for IntegerType {
	fn name(&self) -> &'static str {
		"integer"
	}

	fn decode(&self, raw: Option<&str>) -> ClResult<Option<ConfigValue>> {
		let Some(raw) = non_empty(raw) else { return Ok(None) };
		match raw.trim().parse::<i64>() {
			Ok(i) => Ok(Some(ConfigValue::Int(i))),
			Err(_) => {
				warn!("Stored value '{}' is not an integer, treating as unset", raw);
				Ok(None)
			}
		}
	}

	fn encode(&self, value: Option<&ConfigValue>) -> ClResult<Option<String>> {
		value.map(|v| Self::coerce(v).map(|i| i.to_string())).transpose()
	}

	fn parse_input(&self, input: &str) -> ClResult<Option<ConfigValue>> {
		if input.trim().is_empty() {
			return Ok(None);
		}
		Self::coerce(&ConfigValue::from(input)).map(|i| Some(ConfigValue::Int(i)))
	}

	fn presentation(&self, extra: &Extra) -> Presentation {
		Presentation::Number { step: extra_str(extra, "step") }
	}
}

// Decimal
//*********
#[derive(Debug, Default)]
pub struct DecimalType;

impl DecimalType {
	fn coerce(value: &ConfigValue) -> ClResult<Decimal> {
		match value {
			ConfigValue::Decimal(d) => Ok(*d),
			ConfigValue::Int(i) => Ok(Decimal::from(*i)),
			ConfigValue::String(s) => s
				.trim()
				.parse::<Decimal>()
				.map_err(|_| Error::Internal(format!("'{}' is not a decimal number", s))),
			value => Err(mismatch("decimal", value)),
		}
	}
}

impl ValueType for DecimalType {
	fn name(&self) -> &'static str {
		"decimal"
	}

	fn decode(&self, raw: Option<&str>) -> ClResult<Option<ConfigValue>> {
		let Some(raw) = non_empty(raw) else { return Ok(None) };
		match raw.trim().parse::<Decimal>() {
			Ok(d) => Ok(Some(ConfigValue::Decimal(d))),
			Err(_) => {
				warn!("Stored value '{}' is not a decimal, treating as unset", raw);
				Ok(None)
			}
		}
	}

	fn encode(&self, value: Option<&ConfigValue>) -> ClResult<Option<String>> {
		value.map(|v| Self::coerce(v).map(|d| d.to_string())).transpose()
	}

	fn parse_input(&self, input: &str) -> ClResult<Option<ConfigValue>> {
		if input.trim().is_empty() {
			return Ok(None);
		}
		Self::coerce(&ConfigValue::from(input)).map(|d| Some(ConfigValue::Decimal(d)))
	}

	fn presentation(&self, extra: &Extra) -> Presentation {
		Presentation::Number {
			step: Some(extra_str(extra, "step").unwrap_or_else(|| DEFAULT_DECIMAL_STEP.into())),
		}
	}
}

// Boolean
//*********
#[derive(Debug, Default)]
pub struct BooleanType;

impl BooleanType {
	pub fn is_truthy(token: &str) -> bool {
		let token = token.trim();
		TRUTHY_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(token))
	}

	fn coerce(value: &ConfigValue) -> ClResult<bool> {
		match value {
			ConfigValue::Bool(b) => Ok(*b),
			ConfigValue::String(s) => Ok(Self::is_truthy(s)),
			ConfigValue::Int(i) => Ok(*i != 0),
			ConfigValue::Decimal(d) => Ok(!d.is_zero()),
			value => Err(mismatch("boolean", value)),
		}
	}
}

impl ValueType for BooleanType {
	fn name(&self) -> &'static str {
		"boolean"
	}

	fn decode(&self, raw: Option<&str>) -> ClResult<Option<ConfigValue>> {
		Ok(non_empty(raw).map(|raw| ConfigValue::Bool(Self::is_truthy(raw))))
	}

	/// Always produces a canonical token; an unset boolean is stored as `"false"`
	fn encode(&self, value: Option<&ConfigValue>) -> ClResult<Option<String>> {
		let flag = match value {
			Some(value) => Self::coerce(value)?,
			None => false,
		};
		Ok(Some(if flag { "true" } else { "false" }.to_string()))
	}

	fn presentation(&self, _extra: &Extra) -> Presentation {
		Presentation::Checkbox
	}
}

// Enumerated choice
//*******************
/// Stored as a plain string; membership is checked by the `Choice` validator
#[derive(Debug, Default)]
pub struct SelectType;

impl ValueType for SelectType {
	fn name(&self) -> &'static str {
		"select"
	}

	fn decode(&self, raw: Option<&str>) -> ClResult<Option<ConfigValue>> {
		StringType.decode(raw)
	}

	fn encode(&self, value: Option<&ConfigValue>) -> ClResult<Option<String>> {
		StringType.encode(value)
	}

	/// Choices come from `extra["choices"]` as `[[value, label], ...]` or `[value, ...]`
	fn presentation(&self, extra: &Extra) -> Presentation {
		let choices = extra
			.get("choices")
			.and_then(serde_json::Value::as_array)
			.map(|items| items.iter().filter_map(parse_choice).collect())
			.unwrap_or_default();
		Presentation::Select { choices }
	}
}

fn parse_choice(item: &serde_json::Value) -> Option<(Box<str>, Box<str>)> {
	match item {
		serde_json::Value::Array(pair) => {
			let value = json_to_text(pair.first()?);
			let label = pair.get(1).map_or_else(|| value.clone(), json_to_text);
			Some((value, label))
		}
		item => {
			let value = json_to_text(item);
			Some((value.clone(), value))
		}
	}
}

fn json_to_text(value: &serde_json::Value) -> Box<str> {
	match value {
		serde_json::Value::String(s) => s.as_str().into(),
		other => other.to_string().into(),
	}
}

fn extra_str(extra: &Extra, key: &str) -> Option<Box<str>> {
	extra.get(key).map(json_to_text)
}

// Secret
//********
/// Encrypted at rest; callers only ever see plaintext
#[derive(Debug)]
pub struct SecretType {
	encryption: Arc<Encryption>,
}

impl SecretType {
	pub fn new(encryption: Arc<Encryption>) -> Self {
		Self { encryption }
	}
}

impl ValueType for SecretType {
	fn name(&self) -> &'static str {
		"secret"
	}

	fn decode(&self, raw: Option<&str>) -> ClResult<Option<ConfigValue>> {
		let Some(raw) = non_empty(raw) else { return Ok(None) };
		let plaintext = self.encryption.decrypt(raw)?;
		Ok(non_empty(Some(&plaintext)).map(ConfigValue::from))
	}

	fn encode(&self, value: Option<&ConfigValue>) -> ClResult<Option<String>> {
		value.map(|v| self.encryption.encrypt(&string_of(v))).transpose()
	}

	fn parse_input(&self, input: &str) -> ClResult<Option<ConfigValue>> {
		Ok(non_empty(Some(input)).map(ConfigValue::from))
	}

	fn presentation(&self, _extra: &Extra) -> Presentation {
		Presentation::Password
	}
}

/// Name -> plugin table with aliases
#[derive(Debug)]
pub struct ValueTypes {
	table: HashMap<&'static str, Arc<dyn ValueType>>,
	fallback: Arc<dyn ValueType>,
}

impl ValueTypes {
	pub fn new(encryption: Arc<Encryption>) -> Self {
		let string: Arc<dyn ValueType> = Arc::new(StringType);
		let mut types = Self { table: HashMap::new(), fallback: string.clone() };

		types.add(&["string", "text"], string);
		types.add(&["multiline-text", "textarea", "multiline"], Arc::new(MultilineTextType));
		types.add(&["integer", "int"], Arc::new(IntegerType));
		types.add(&["decimal", "float"], Arc::new(DecimalType));
		types.add(&["boolean", "bool"], Arc::new(BooleanType));
		types.add(&["select", "dropdown", "choice", "enum"], Arc::new(SelectType));
		types.add(&["secret", "password", "encrypted"], Arc::new(SecretType::new(encryption)));
		types
	}

	fn add(&mut self, names: &[&'static str], value_type: Arc<dyn ValueType>) {
		for name in names {
			self.table.insert(*name, value_type.clone());
		}
	}

	/// Resolve a plugin by case-insensitive name, falling back to string
	pub fn resolve(&self, name: &str) -> Arc<dyn ValueType> {
		match self.table.get(name.to_ascii_lowercase().as_str()) {
			Some(value_type) => value_type.clone(),
			None => {
				debug!("Unknown value type '{}', using string", name);
				self.fallback.clone()
			}
		}
	}

	/// Registered names and aliases
	pub fn names(&self) -> Vec<&'static str> {
		let mut names: Vec<_> = self.table.keys().copied().collect();
		names.sort_unstable();
		names
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn types() -> ValueTypes {
		ValueTypes::new(Arc::new(Encryption::new("value-type-tests").unwrap()))
	}

	fn round_trip(value_type: &dyn ValueType, value: ConfigValue) -> Option<ConfigValue> {
		let raw = value_type.encode(Some(&value)).unwrap();
		value_type.decode(raw.as_deref()).unwrap()
	}

	#[test]
	fn test_round_trips() {
		let types = types();
		let cases: Vec<(&str, ConfigValue)> = vec![
			("string", "hello".into()),
			("multiline-text", "line 1\nline 2".into()),
			("integer", 100.into()),
			("integer", (-42).into()),
			("decimal", "12.50".parse::<Decimal>().unwrap().into()),
			("boolean", true.into()),
			("boolean", false.into()),
			("select", "weekly".into()),
			("secret", "hunter2".into()),
		];
		for (name, value) in cases {
			let value_type = types.resolve(name);
			assert_eq!(round_trip(value_type.as_ref(), value.clone()), Some(value), "{}", name);
		}
	}

	#[test]
	fn test_decimal_keeps_scale() {
		let decimal = DecimalType;
		let value: Decimal = "12.50".parse().unwrap();
		let raw = decimal.encode(Some(&value.into())).unwrap();
		assert_eq!(raw.as_deref(), Some("12.50"));
		let mut current = raw;
		for _ in 0..5 {
			let decoded = decimal.decode(current.as_deref()).unwrap();
			current = decimal.encode(decoded.as_ref()).unwrap();
		}
		assert_eq!(current.as_deref(), Some("12.50"));
	}

	#[test]
	fn test_empty_and_null_decode_to_none() {
		let types = types();
		for name in ["string", "multiline-text", "integer", "decimal", "boolean", "select", "secret"] {
			let value_type = types.resolve(name);
			assert_eq!(value_type.decode(None).unwrap(), None, "{}", name);
			assert_eq!(value_type.decode(Some("")).unwrap(), None, "{}", name);
		}
	}

	#[test]
	fn test_boolean_tokens() {
		let boolean = BooleanType;
		for token in ["true", "TRUE", "1", "yes", "On"] {
			assert_eq!(boolean.decode(Some(token)).unwrap(), Some(ConfigValue::Bool(true)));
		}
		for token in ["false", "0", "no", "off", "maybe"] {
			assert_eq!(boolean.decode(Some(token)).unwrap(), Some(ConfigValue::Bool(false)));
		}
		assert_eq!(boolean.encode(Some(&true.into())).unwrap().as_deref(), Some("true"));
		assert_eq!(boolean.encode(Some(&"yes".into())).unwrap().as_deref(), Some("true"));
		assert_eq!(boolean.encode(None).unwrap().as_deref(), Some("false"));
	}

	#[test]
	fn test_integer_coercion() {
		let integer = IntegerType;
		assert_eq!(integer.encode(Some(&"42".into())).unwrap().as_deref(), Some("42"));
		assert_eq!(integer.encode(Some(&Decimal::from(7).into())).unwrap().as_deref(), Some("7"));
		assert!(integer.encode(Some(&"abc".into())).is_err());
		assert!(integer.encode(Some(&"1.5".parse::<Decimal>().unwrap().into())).is_err());
		assert!(integer.encode(Some(&true.into())).is_err());
		assert_eq!(integer.encode(None).unwrap(), None);
	}

	#[test]
	fn test_integer_decode_garbage_is_none() {
		assert_eq!(IntegerType.decode(Some("not a number")).unwrap(), None);
	}

	#[test]
	fn test_parse_input() {
		assert_eq!(IntegerType.parse_input("250").unwrap(), Some(ConfigValue::Int(250)));
		assert!(IntegerType.parse_input("lots").is_err());
		assert_eq!(IntegerType.parse_input("  ").unwrap(), None);
		assert_eq!(BooleanType.parse_input("on").unwrap(), Some(ConfigValue::Bool(true)));
	}

	#[test]
	fn test_secret_is_stored_encrypted() {
		let types = types();
		let secret = types.resolve("password");
		let raw = secret.encode(Some(&"hunter2".into())).unwrap().unwrap();
		assert!(Encryption::is_encrypted(&raw));
		assert!(!raw.contains("hunter2"));
		assert_eq!(secret.parse_input("hunter2").unwrap(), Some("hunter2".into()));
	}

	#[test]
	fn test_secret_empty_skips_cipher() {
		let types = types();
		let secret = types.resolve("secret");
		assert_eq!(secret.encode(Some(&"".into())).unwrap().as_deref(), Some(""));
		assert_eq!(secret.decode(Some("")).unwrap(), None);
	}

	#[test]
	fn test_secret_decode_foreign_token_fails() {
		let types = types();
		let secret = types.resolve("secret");
		assert!(matches!(secret.decode(Some("sc1~garbage")), Err(Error::InvalidToken)));
	}

	#[test]
	fn test_factory_aliases_and_fallback() {
		let types = types();
		assert_eq!(types.resolve("int").name(), "integer");
		assert_eq!(types.resolve("BOOL").name(), "boolean");
		assert_eq!(types.resolve("Password").name(), "secret");
		assert_eq!(types.resolve("textarea").name(), "multiline-text");
		assert_eq!(types.resolve("dropdown").name(), "select");
		assert_eq!(types.resolve("float").name(), "decimal");
		assert_eq!(types.resolve("color-picker").name(), "string");
		assert!(types.names().contains(&"int"));
	}

	#[test]
	fn test_presentation() {
		let mut extra = Extra::new();
		assert_eq!(
			DecimalType.presentation(&extra),
			Presentation::Number { step: Some("0.01".into()) }
		);
		extra.insert("step".into(), serde_json::json!("0.5"));
		assert_eq!(
			DecimalType.presentation(&extra),
			Presentation::Number { step: Some("0.5".into()) }
		);
		extra.insert("choices".into(), serde_json::json!([["d", "Daily"], "weekly"]));
		assert_eq!(
			SelectType.presentation(&extra),
			Presentation::Select {
				choices: vec![("d".into(), "Daily".into()), ("weekly".into(), "weekly".into())]
			}
		);
		assert_eq!(MultilineTextType.presentation(&extra), Presentation::Textarea);
	}
}

// vim: ts=4
