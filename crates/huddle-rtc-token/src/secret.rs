// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cleaning and validating the raw server secret.
//!
//! Secrets arrive from secret managers and environment files with all the
//! usual copy-paste damage: trailing newlines, surrounding spaces, and the
//! shell quotes someone typed around the value. [`normalize`] repairs what is
//! safe to repair and rejects everything else with an error an operator can
//! act on.

use std::fmt;

use huddle_common_secret::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Length of the server secret issued by the RTC platform console.
pub const DEFAULT_SECRET_LEN: usize = 32;

/// Characters a normalized secret may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretCharset {
	/// ASCII hex digits, either case.
	Hex,
	/// Any non-whitespace characters.
	Any,
}

impl fmt::Display for SecretCharset {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SecretCharset::Hex => write!(f, "hex"),
			SecretCharset::Any => write!(f, "any"),
		}
	}
}

/// The shape a secret must have after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretPolicy {
	pub expected_len: usize,
	pub charset: SecretCharset,
}

impl Default for SecretPolicy {
	fn default() -> Self {
		Self {
			expected_len: DEFAULT_SECRET_LEN,
			charset: SecretCharset::Hex,
		}
	}
}

impl SecretPolicy {
	pub fn normalize(&self, raw: &str) -> Result<NormalizedSecret, SecretError> {
		normalize(raw, self)
	}
}

/// Why a secret was rejected. None of the variants carry the secret itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretError {
	#[error("secret is missing or empty")]
	Missing,

	#[error("secret has length {len}, expected {expected}; it looks like it is still wrapped in quotes")]
	LikelyQuoted { len: usize, expected: usize },

	#[error("secret has length {len}, expected {expected}")]
	WrongLength { len: usize, expected: usize },

	#[error("secret contains a non-hex character at position {position}")]
	NonHex { position: usize },

	#[error("secret contains whitespace at position {position}")]
	InnerWhitespace { position: usize },
}

/// A secret that passed [`normalize`]. Redacted in `Debug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSecret {
	secret: SecretString,
}

impl NormalizedSecret {
	pub fn len(&self) -> usize {
		self.secret.len()
	}

	pub fn is_empty(&self) -> bool {
		self.secret.is_empty()
	}

	pub fn masked_preview(&self) -> String {
		self.secret.masked_preview()
	}

	/// The HMAC key: the normalized secret's UTF-8 bytes.
	pub fn key_bytes(&self) -> &[u8] {
		self.secret.expose().as_bytes()
	}
}

/// Trim, strip one pair of matching quotes, then check length and charset.
pub fn normalize(raw: &str, policy: &SecretPolicy) -> Result<NormalizedSecret, SecretError> {
	let candidate = strip_matching_quotes(raw.trim()).trim();

	match check_shape(candidate, policy) {
		Ok(()) => {
			let secret = NormalizedSecret {
				secret: SecretString::new(candidate.to_string()),
			};
			debug!(
				raw_len = raw.len(),
				secret_len = secret.len(),
				secret_preview = %secret.masked_preview(),
				"normalized RTC server secret"
			);
			Ok(secret)
		}
		Err(e) => {
			warn!(
				raw_len = raw.len(),
				normalized_len = candidate.chars().count(),
				expected_len = policy.expected_len,
				secret_preview = %huddle_common_secret::masked_preview(candidate),
				error = %e,
				"rejected RTC server secret"
			);
			Err(e)
		}
	}
}

fn strip_matching_quotes(value: &str) -> &str {
	for quote in ['"', '\''] {
		if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
			return &value[1..value.len() - 1];
		}
	}
	value
}

fn check_shape(candidate: &str, policy: &SecretPolicy) -> Result<(), SecretError> {
	if candidate.is_empty() {
		return Err(SecretError::Missing);
	}

	let len = candidate.chars().count();
	if len != policy.expected_len {
		return Err(if len == policy.expected_len + 2 {
			SecretError::LikelyQuoted {
				len,
				expected: policy.expected_len,
			}
		} else {
			SecretError::WrongLength {
				len,
				expected: policy.expected_len,
			}
		});
	}

	for (position, c) in candidate.chars().enumerate() {
		if c.is_whitespace() {
			return Err(SecretError::InnerWhitespace { position });
		}
		if policy.charset == SecretCharset::Hex && !c.is_ascii_hexdigit() {
			return Err(SecretError::NonHex { position });
		}
	}

	Ok(())
}
