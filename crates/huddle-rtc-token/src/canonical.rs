// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Byte-exact rendering of a [`CredentialRecord`].
//!
//! The output is the HMAC pre-image, so it has to match any independently
//! built verifier byte for byte:
//!
//! ```text
//! {"version":"04","app_id":128222087,"user_id":"u-42","nonce":7,"ctime":1000,"expire":4600,"payload":""}
//! ```
//!
//! Keys appear in struct declaration order, there is no whitespace, integers
//! are plain decimal and `app_id` is never quoted.

use thiserror::Error;

use crate::record::{ArgumentError, CredentialRecord};

#[derive(Debug, Error)]
pub enum CanonicalError {
	#[error("credential body is not valid JSON for this version: {0}")]
	Json(#[from] serde_json::Error),

	#[error("credential body fails validation: {0}")]
	Invalid(#[from] ArgumentError),
}

pub fn serialize(record: &CredentialRecord) -> Result<Vec<u8>, CanonicalError> {
	Ok(serde_json::to_vec(record)?)
}

/// Parse canonical bytes back into a record.
///
/// Unknown keys and non-integer numbers are rejected. The caller is
/// expected to have checked the signature over `bytes` first.
pub fn parse(bytes: &[u8]) -> Result<CredentialRecord, CanonicalError> {
	let record: CredentialRecord = serde_json::from_slice(bytes)?;
	record.validate()?;
	Ok(record)
}
