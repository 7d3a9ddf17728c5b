//! Typed configuration values
//!
//! A missing value (null) is represented as `Option<ConfigValue>::None`, never as
//! an empty variant.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Typed value of a configuration field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)] // No type tag - type is known from the field's value type
pub enum ConfigValue {
	Bool(bool),
	Int(i64),
	Decimal(Decimal),
	String(String),
	Json(serde_json::Value),
}

impl ConfigValue {
	/// Get the type name for error messages
	pub fn type_name(&self) -> &'static str {
		match self {
			ConfigValue::Bool(_) => "bool",
			ConfigValue::Int(_) => "int",
			ConfigValue::Decimal(_) => "decimal",
			ConfigValue::String(_) => "string",
			ConfigValue::Json(_) => "json",
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			ConfigValue::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			ConfigValue::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			ConfigValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_decimal(&self) -> Option<Decimal> {
		match self {
			ConfigValue::Decimal(d) => Some(*d),
			_ => None,
		}
	}

	/// Exact numeric view of the value, if it has one.
	///
	/// Strings are parsed, so `"12.50"` and `Decimal(12.50)` compare equal.
	pub fn to_decimal(&self) -> Option<Decimal> {
		match self {
			ConfigValue::Int(i) => Some(Decimal::from(*i)),
			ConfigValue::Decimal(d) => Some(*d),
			ConfigValue::String(s) => s.trim().parse::<Decimal>().ok(),
			ConfigValue::Bool(_) | ConfigValue::Json(_) => None,
		}
	}
}

impl fmt::Display for ConfigValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConfigValue::Bool(b) => write!(f, "{}", b),
			ConfigValue::Int(i) => write!(f, "{}", i),
			ConfigValue::Decimal(d) => write!(f, "{}", d),
			ConfigValue::String(s) => write!(f, "{}", s),
			ConfigValue::Json(j) => write!(f, "{}", j),
		}
	}
}

impl From<bool> for ConfigValue {
	fn from(value: bool) -> Self {
		ConfigValue::Bool(value)
	}
}

impl From<i64> for ConfigValue {
	fn from(value: i64) -> Self {
		ConfigValue::Int(value)
	}
}

impl From<i32> for ConfigValue {
	fn from(value: i32) -> Self {
		ConfigValue::Int(i64::from(value))
	}
}

impl From<u16> for ConfigValue {
	fn from(value: u16) -> Self {
		ConfigValue::Int(i64::from(value))
	}
}

impl From<Decimal> for ConfigValue {
	fn from(value: Decimal) -> Self {
		ConfigValue::Decimal(value)
	}
}

impl From<&str> for ConfigValue {
	fn from(value: &str) -> Self {
		ConfigValue::String(value.to_string())
	}
}

impl From<String> for ConfigValue {
	fn from(value: String) -> Self {
		ConfigValue::String(value)
	}
}

impl From<serde_json::Value> for ConfigValue {
	fn from(value: serde_json::Value) -> Self {
		ConfigValue::Json(value)
	}
}


// vim: ts=4
