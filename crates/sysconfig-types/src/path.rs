//! Configuration path parsing
//!
//! Two address forms exist for the same field:
//! - public: `namespace.section.field` (exactly three nonempty dot-separated parts)
//! - internal store key: `section/field` (exactly two nonempty slash-separated parts),
//!   scoped by the namespace it is stored under

use std::fmt;
use std::str::FromStr;

use crate::error::{ClResult, Error};

/// Public 3-part path: `namespace.section.field`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigPath {
	pub namespace: Box<str>,
	pub section: Box<str>,
	pub field: Box<str>,
}

impl ConfigPath {
	pub fn parse(path: &str) -> ClResult<Self> {
		let parts: Vec<&str> = path.split('.').collect();
		match parts.as_slice() {
			[namespace, section, field]
				if !namespace.is_empty() && !section.is_empty() && !field.is_empty() =>
			{
				Ok(Self { namespace: (*namespace).into(), section: (*section).into(), field: (*field).into() })
			}
			_ => Err(Error::invalid_path(path, "expected format: namespace.section.field")),
		}
	}

	/// Internal store key for this path (section as given, not normalized)
	pub fn store_key(&self) -> StoreKey {
		StoreKey { section: self.section.clone(), field: self.field.clone() }
	}
}

impl FromStr for ConfigPath {
	type Err = Error;

	fn from_str(s: &str) -> ClResult<Self> {
		Self::parse(s)
	}
}

impl fmt::Display for ConfigPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}.{}", self.namespace, self.section, self.field)
	}
}

/// Public 2-part section path: `namespace.section`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SectionPath {
	pub namespace: Box<str>,
	pub section: Box<str>,
}

impl SectionPath {
	pub fn parse(path: &str) -> ClResult<Self> {
		let parts: Vec<&str> = path.split('.').collect();
		match parts.as_slice() {
			[namespace, section] if !namespace.is_empty() && !section.is_empty() => {
				Ok(Self { namespace: (*namespace).into(), section: (*section).into() })
			}
			_ => Err(Error::invalid_path(path, "expected format: namespace.section")),
		}
	}
}

impl fmt::Display for SectionPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}", self.namespace, self.section)
	}
}

/// Internal 2-part store key: `section/field`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
	pub section: Box<str>,
	pub field: Box<str>,
}

impl StoreKey {
	pub fn new(section: &str, field: &str) -> Self {
		Self { section: section.into(), field: field.into() }
	}

	pub fn parse(key: &str) -> ClResult<Self> {
		let parts: Vec<&str> = key.split('/').collect();
		match parts.as_slice() {
			[section, field] if !section.is_empty() && !field.is_empty() => {
				Ok(Self::new(section, field))
			}
			_ => Err(Error::invalid_path(key, "expected format: section/field")),
		}
	}
}

impl FromStr for StoreKey {
	type Err = Error;

	fn from_str(s: &str) -> ClResult<Self> {
		Self::parse(s)
	}
}

impl fmt::Display for StoreKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.section, self.field)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_public_path() {
		let path = ConfigPath::parse("a.b.c").unwrap();
		assert_eq!(&*path.namespace, "a");
		assert_eq!(&*path.section, "b");
		assert_eq!(&*path.field, "c");
		assert_eq!(path.to_string(), "a.b.c");
	}

	#[test]
	fn test_parse_public_path_wrong_shape() {
		for bad in ["a.b", "a.b.c.d", "", "a..c", ".b.c", "a.b."] {
			let err = ConfigPath::parse(bad).unwrap_err();
			assert!(matches!(err, Error::InvalidPath { .. }), "{:?} should be invalid", bad);
		}
	}

	#[test]
	fn test_public_path_maps_to_store_key() {
		let path: ConfigPath = "todo.general.max_items".parse().unwrap();
		assert_eq!(path.store_key().to_string(), "general/max_items");
	}

	#[test]
	fn test_parse_section_path() {
		let path = SectionPath::parse("todo.general").unwrap();
		assert_eq!(&*path.namespace, "todo");
		assert_eq!(&*path.section, "general");
		assert!(SectionPath::parse("todo").is_err());
		assert!(SectionPath::parse("todo.general.x").is_err());
	}

	#[test]
	fn test_parse_store_key() {
		let key = StoreKey::parse("general/timeout").unwrap();
		assert_eq!(key, StoreKey::new("general", "timeout"));
		for bad in ["general", "a/b/c", "/b", "a/", ""] {
			assert!(StoreKey::parse(bad).is_err(), "{:?} should be invalid", bad);
		}
	}
}

// vim: ts=4
