//! Previews of stored raw values for external display
//!
//! Values that look like encryption tokens, and very long values, are masked.
//! Other long values are truncated.

use crate::encryption::Encryption;

pub const MASK: &str = "********";
pub const NULL_PREVIEW: &str = "(null)";

/// Values longer than this are never shown
pub const MASK_THRESHOLD: usize = 100;
/// Values longer than this are cut off
pub const TRUNCATE_AT: usize = 50;

pub fn preview(raw: Option<&str>) -> String {
	let Some(raw) = raw else { return NULL_PREVIEW.to_string() };
	let len = raw.chars().count();
	if Encryption::is_encrypted(raw) || len > MASK_THRESHOLD {
		return MASK.to_string();
	}
	if len > TRUNCATE_AT {
		let head: String = raw.chars().take(TRUNCATE_AT).collect();
		return format!("{}…", head);
	}
	raw.to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_short_values_shown() {
		assert_eq!(preview(Some("250")), "250");
		assert_eq!(preview(Some("")), "");
		assert_eq!(preview(None), "(null)");
	}

	#[test]
	fn test_tokens_masked() {
		let token = Encryption::new("display-tests").unwrap().encrypt("pw").unwrap();
		assert_eq!(preview(Some(&token)), MASK);
	}

	#[test]
	fn test_long_values() {
		let long = "x".repeat(60);
		let shown = preview(Some(&long));
		assert_eq!(shown.chars().count(), TRUNCATE_AT + 1);
		assert!(shown.ends_with('…'));

		let huge = "y".repeat(MASK_THRESHOLD + 1);
		assert_eq!(preview(Some(&huge)), MASK);
	}
}

// vim: ts=4
