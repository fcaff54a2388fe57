// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HMAC-SHA256 over canonical credential bytes.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::secret::NormalizedSecret;

type HmacSha256 = Hmac<Sha256>;

/// Raw digest length in bytes.
pub const SIGNATURE_LEN: usize = 32;

#[derive(Debug, Clone, Error)]
pub enum SigningError {
	#[error("HMAC rejected the key: {0}")]
	InvalidKey(String),
}

/// A raw 32-byte HMAC-SHA256 digest.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
	pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
		&self.0
	}

	pub fn to_hex(&self) -> String {
		hex::encode(self.0)
	}
}

impl fmt::Debug for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Signature(<{SIGNATURE_LEN} bytes>)")
	}
}

/// Signs and checks messages with one normalized secret.
///
/// Built once at start-up and shared by reference; holds no mutable state.
#[derive(Debug, Clone)]
pub struct Signer {
	secret: NormalizedSecret,
}

impl Signer {
	pub fn new(secret: NormalizedSecret) -> Self {
		Self { secret }
	}

	pub fn secret_len(&self) -> usize {
		self.secret.len()
	}

	fn mac(&self) -> Result<HmacSha256, SigningError> {
		HmacSha256::new_from_slice(self.secret.key_bytes())
			.map_err(|e| SigningError::InvalidKey(e.to_string()))
	}

	pub fn sign(&self, message: &[u8]) -> Result<Signature, SigningError> {
		let mut mac = self.mac()?;
		mac.update(message);
		let mut digest = [0u8; SIGNATURE_LEN];
		digest.copy_from_slice(&mac.finalize().into_bytes());
		Ok(Signature(digest))
	}

	/// Constant-time check of `candidate` against the HMAC of `message`.
	///
	/// A candidate of the wrong length is rejected before comparing.
	pub fn verify(&self, message: &[u8], candidate: &[u8]) -> Result<bool, SigningError> {
		let expected = self.sign(message)?;
		if candidate.len() != SIGNATURE_LEN {
			return Ok(false);
		}
		Ok(expected.0[..].ct_eq(candidate).into())
	}
}
