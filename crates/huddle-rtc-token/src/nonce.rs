// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-issuance nonces.
//!
//! Each call draws straight from the operating system CSPRNG. There is no
//! shared generator state or counter, so concurrent issuances cannot be
//! correlated through their nonces.

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("random source unavailable: {0}")]
pub struct NonceError(String);

pub trait NonceSource: Send + Sync {
	fn next_nonce(&self) -> Result<u32, NonceError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OsNonceSource;

impl NonceSource for OsNonceSource {
	fn next_nonce(&self) -> Result<u32, NonceError> {
		let mut bytes = [0u8; 4];
		OsRng
			.try_fill_bytes(&mut bytes)
			.map_err(|e| NonceError(e.to_string()))?;
		Ok(u32::from_le_bytes(bytes))
	}
}

/// Returns the same nonce every time. Tests only make sense of this.
#[derive(Debug, Clone, Copy)]
pub struct FixedNonce(pub u32);

impl NonceSource for FixedNonce {
	fn next_nonce(&self) -> Result<u32, NonceError> {
		Ok(self.0)
	}
}
