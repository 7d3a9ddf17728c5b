//! Symmetric encryption for secret configuration values
//!
//! Tokens are `sc1~` followed by URL-safe base64 of `nonce || ciphertext || tag`
//! (AES-256-GCM). The key is the SHA-256 digest of the process secret, so no key
//! material is stored apart from the host's base secret.

use aes_gcm::{
	Aes256Gcm, Nonce,
	aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::prelude::*;

/// Recognizable prefix of every token produced by [`Encryption::encrypt`]
pub const TOKEN_PREFIX: &str = "sc1~";

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

pub struct Encryption {
	cipher: Aes256Gcm,
}

impl fmt::Debug for Encryption {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Encryption").finish_non_exhaustive()
	}
}

impl Encryption {
	/// Derive the cipher key from the process-wide secret
	pub fn new(secret: &str) -> ClResult<Self> {
		if secret.is_empty() {
			return Err(Error::ConfigError("Encryption secret must not be empty".into()));
		}
		let key = Sha256::digest(secret.as_bytes());
		let cipher = Aes256Gcm::new_from_slice(&key)
			.map_err(|_| Error::Internal("invalid encryption key length".into()))?;
		Ok(Self { cipher })
	}

	/// Encrypt a value. Empty input encrypts to empty output.
	pub fn encrypt(&self, plaintext: &str) -> ClResult<String> {
		if plaintext.is_empty() {
			return Ok(String::new());
		}
		let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
		let ciphertext = self
			.cipher
			.encrypt(&nonce, plaintext.as_bytes())
			.map_err(|_| Error::Internal("encryption failed".into()))?;

		let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
		payload.extend_from_slice(&nonce);
		payload.extend_from_slice(&ciphertext);
		Ok(format!("{}{}", TOKEN_PREFIX, URL_SAFE_NO_PAD.encode(payload)))
	}

	/// Decrypt a token. Empty input decrypts to empty output.
	///
	/// Fails with [`Error::InvalidToken`] on a malformed, tampered or foreign token.
	pub fn decrypt(&self, token: &str) -> ClResult<String> {
		if token.is_empty() {
			return Ok(String::new());
		}
		let payload = decode_payload(token).ok_or(Error::InvalidToken)?;
		let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
		let plaintext = self
			.cipher
			.decrypt(Nonce::from_slice(nonce), ciphertext)
			.map_err(|_| Error::InvalidToken)?;
		String::from_utf8(plaintext).map_err(|_| Error::InvalidToken)
	}

	/// Decrypt, returning `default` instead of failing
	pub fn safe_decrypt(&self, token: &str, default: &str) -> String {
		if token.is_empty() {
			return default.to_string();
		}
		match self.decrypt(token) {
			Ok(plaintext) => plaintext,
			Err(err) => {
				debug!("safe_decrypt fell back to default: {}", err);
				default.to_string()
			}
		}
	}

	/// Heuristic check whether a stored value looks like a token
	pub fn is_encrypted(value: &str) -> bool {
		decode_payload(value).is_some()
	}
}

fn decode_payload(token: &str) -> Option<Vec<u8>> {
	let encoded = token.strip_prefix(TOKEN_PREFIX)?;
	let payload = URL_SAFE_NO_PAD.decode(encoded).ok()?;
	(payload.len() >= NONCE_LEN + TAG_LEN).then_some(payload)
}


// vim: ts=4
