// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for shared secrets.
//!
//! [`Secret<T>`] holds values such as the RTC server secret so that they:
//!
//! - print as `[REDACTED]` through both `Debug` and `Display`, which is what
//!   `tracing` uses for `%field` and `?field`
//! - serialize as `"[REDACTED]"` so config dumps never carry them
//! - are zeroized when dropped
//! - can only be read through an explicit `.expose()`
//!
//! Operators still need *some* signal when a secret is misconfigured, so
//! [`masked_preview`] renders a string with everything but its edges hidden.
//!
//! ```
//! use huddle_common_secret::{masked_preview, SecretString};
//!
//! let secret = SecretString::new("0123456789abcdef0123456789abcdef".to_string());
//! assert_eq!(format!("{secret}"), "[REDACTED]");
//! assert_eq!(secret.len(), 32);
//! assert_eq!(masked_preview(secret.expose()), "01****ef");
//! ```

use std::fmt;
use zeroize::Zeroize;

/// The redaction placeholder used in all output.
pub const REDACTED: &str = "[REDACTED]";

/// Values shorter than this are masked completely by [`masked_preview`].
pub const MIN_PREVIEW_LEN: usize = 8;

const PREVIEW_EDGE: usize = 2;
const PREVIEW_MASK: &str = "****";

/// A wrapper for sensitive values that prevents accidental exposure.
///
/// There is no `Deref`; call [`Secret::expose`] to read the value.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T>
where
	T: Zeroize,
{
	inner: T,
}

/// The common case: a secret string.
pub type SecretString = Secret<String>;

impl<T> Secret<T>
where
	T: Zeroize,
{
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Explicitly access the inner value.
	pub fn expose(&self) -> &T {
		&self.inner
	}
}

impl Secret<String> {
	/// Length of the secret in bytes. Safe to log.
	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	/// Masked preview of the secret, see [`masked_preview`].
	pub fn masked_preview(&self) -> String {
		masked_preview(&self.inner)
	}
}

impl<T> Clone for Secret<T>
where
	T: Zeroize + Clone,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> fmt::Debug for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T> fmt::Display for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T> PartialEq for Secret<T>
where
	T: Zeroize + PartialEq,
{
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T> Eq for Secret<T> where T: Zeroize + Eq {}

impl From<String> for Secret<String> {
	fn from(value: String) -> Self {
		Secret::new(value)
	}
}

impl From<&str> for Secret<String> {
	fn from(value: &str) -> Self {
		Secret::new(value.to_string())
	}
}

/// Render a log-safe preview of a sensitive string.
///
/// Keeps the first and last two characters and replaces the middle with a
/// fixed-width mask, so the preview never reveals the real length. Values
/// shorter than [`MIN_PREVIEW_LEN`] characters are masked entirely.
pub fn masked_preview(value: &str) -> String {
	let chars: Vec<char> = value.chars().collect();
	if chars.len() < MIN_PREVIEW_LEN {
		return PREVIEW_MASK.to_string();
	}

	let head: String = chars[..PREVIEW_EDGE].iter().collect();
	let tail: String = chars[chars.len() - PREVIEW_EDGE..].iter().collect();
	format!("{head}{PREVIEW_MASK}{tail}")
}

#[cfg(feature = "serde")]
mod serde_impl {
	use super::{Secret, REDACTED};
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use zeroize::Zeroize;

	impl<T> Serialize for Secret<T>
	where
		T: Serialize + Zeroize,
	{
		fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
		where
			S: Serializer,
		{
			serializer.serialize_str(REDACTED)
		}
	}

	impl<'de, T> Deserialize<'de> for Secret<T>
	where
		T: Deserialize<'de> + Zeroize,
	{
		fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
		where
			D: Deserializer<'de>,
		{
			T::deserialize(deserializer).map(Secret::new)
		}
	}
}
