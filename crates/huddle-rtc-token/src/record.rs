// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The credential fields that get signed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire-format generation tag carried in every record.
pub const PROTOCOL_VERSION: &str = "04";

/// Caller-supplied values that cannot form a valid record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
	#[error("app_id is required and must be non-zero")]
	MissingAppId,

	#[error("subject_id is required")]
	MissingSubject,

	#[error("ttl_seconds must be greater than zero")]
	ZeroTtl,

	#[error("issued_at {issued_at} + ttl {ttl_secs}s overflows")]
	ExpiryOverflow { issued_at: u64, ttl_secs: u64 },

	#[error("expire_at {expire_at} must be after issued_at {issued_at}")]
	ExpiryNotAfterIssue { issued_at: u64, expire_at: u64 },
}

/// One credential, built fresh per issuance and never mutated.
///
/// Field declaration order is the canonical serialization order; see
/// [`crate::canonical`]. `subject_id`, `issued_at` and `expire_at` travel
/// under the platform's names `user_id`, `ctime` and `expire`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialRecord {
	version: String,
	app_id: u64,
	#[serde(rename = "user_id")]
	subject_id: String,
	nonce: u32,
	#[serde(rename = "ctime")]
	issued_at: u64,
	#[serde(rename = "expire")]
	expire_at: u64,
	payload: String,
}

impl CredentialRecord {
	/// Build a record for the current protocol version.
	///
	/// `subject_id` is taken as given. Checking it against the authenticated
	/// caller is the RPC layer's job.
	pub fn new(
		app_id: u64,
		subject_id: impl Into<String>,
		nonce: u32,
		issued_at: u64,
		expire_at: u64,
		payload: impl Into<String>,
	) -> Result<Self, ArgumentError> {
		let record = Self {
			version: PROTOCOL_VERSION.to_string(),
			app_id,
			subject_id: subject_id.into(),
			nonce,
			issued_at,
			expire_at,
			payload: payload.into(),
		};
		record.validate()?;
		Ok(record)
	}

	pub(crate) fn validate(&self) -> Result<(), ArgumentError> {
		if self.app_id == 0 {
			return Err(ArgumentError::MissingAppId);
		}
		if self.subject_id.is_empty() {
			return Err(ArgumentError::MissingSubject);
		}
		if self.expire_at <= self.issued_at {
			return Err(ArgumentError::ExpiryNotAfterIssue {
				issued_at: self.issued_at,
				expire_at: self.expire_at,
			});
		}
		Ok(())
	}

	pub fn version(&self) -> &str {
		&self.version
	}

	pub fn app_id(&self) -> u64 {
		self.app_id
	}

	pub fn subject_id(&self) -> &str {
		&self.subject_id
	}

	pub fn nonce(&self) -> u32 {
		self.nonce
	}

	pub fn issued_at(&self) -> u64 {
		self.issued_at
	}

	pub fn expire_at(&self) -> u64 {
		self.expire_at
	}

	pub fn payload(&self) -> &str {
		&self.payload
	}

	pub fn ttl_secs(&self) -> u64 {
		self.expire_at - self.issued_at
	}

	/// Expired once `now` reaches `expire_at`.
	pub fn is_expired_at(&self, now: u64) -> bool {
		now >= self.expire_at
	}
}
