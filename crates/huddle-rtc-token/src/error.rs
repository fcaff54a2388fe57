// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for issuing and verifying credentials.
//!
//! Nothing here is worth retrying: every failure is a pure function of the
//! inputs, so the same call fails the same way until an operator fixes the
//! secret or the caller fixes its request.

use huddle_common_config::SecretStoreError;
use thiserror::Error;

use crate::canonical::CanonicalError;
use crate::nonce::NonceError;
use crate::record::ArgumentError;
use crate::secret::SecretError;
use crate::signer::SigningError;

/// Who has to act on a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Operator-fixable: the server secret is missing or malformed.
	Configuration,
	/// Caller-fixable: bad app_id, subject or ttl.
	Caller,
	/// A bug or a broken platform primitive.
	Internal,
}

#[derive(Debug, Error)]
pub enum IssueError {
	#[error("invalid argument: {0}")]
	InvalidArgument(#[from] ArgumentError),

	#[error("RTC server secret is not configured")]
	SecretNotConfigured,

	#[error("RTC server secret is malformed: {reason}")]
	SecretMalformed { reason: SecretError },

	#[error("RTC server secret could not be read: {0}")]
	SecretUnavailable(#[from] SecretStoreError),

	#[error("nonce generation failed: {0}")]
	NonceUnavailable(#[from] NonceError),

	#[error("canonical serialization failed: {0}")]
	Serialization(#[source] CanonicalError),

	#[error("signing failed: {0}")]
	SigningFailed(#[from] SigningError),
}

impl IssueError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			IssueError::InvalidArgument(_) => ErrorKind::Caller,
			IssueError::SecretNotConfigured
			| IssueError::SecretMalformed { .. }
			| IssueError::SecretUnavailable(_) => ErrorKind::Configuration,
			IssueError::NonceUnavailable(_)
			| IssueError::Serialization(_)
			| IssueError::SigningFailed(_) => ErrorKind::Internal,
		}
	}

	pub fn is_retryable(&self) -> bool {
		false
	}
}

impl From<SecretError> for IssueError {
	fn from(e: SecretError) -> Self {
		match e {
			SecretError::Missing => IssueError::SecretNotConfigured,
			reason => IssueError::SecretMalformed { reason },
		}
	}
}

impl From<CanonicalError> for IssueError {
	fn from(e: CanonicalError) -> Self {
		match e {
			CanonicalError::Invalid(arg) => IssueError::InvalidArgument(arg),
			other => IssueError::Serialization(other),
		}
	}
}

#[derive(Debug, Error)]
pub enum VerifyError {
	#[error("RTC server secret is not configured")]
	SecretNotConfigured,

	#[error("RTC server secret is malformed: {0}")]
	SecretMalformed(SecretError),

	#[error("RTC server secret could not be read: {0}")]
	SecretUnavailable(#[from] SecretStoreError),

	#[error("malformed token: {reason}")]
	Malformed { reason: String },

	#[error("token signature is invalid")]
	InvalidSignature,

	#[error("unsupported token version {version:?}")]
	UnsupportedVersion { version: String },

	#[error("token expired at {expire_at} (now {now})")]
	TokenExpired { expire_at: u64, now: u64 },

	#[error("token subject {actual:?} does not match expected subject {expected:?}")]
	SubjectMismatch { expected: String, actual: String },

	#[error("signing failed: {0}")]
	SigningFailed(#[from] SigningError),
}

impl VerifyError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			VerifyError::SecretNotConfigured
			| VerifyError::SecretMalformed(_)
			| VerifyError::SecretUnavailable(_) => ErrorKind::Configuration,
			VerifyError::SigningFailed(_) => ErrorKind::Internal,
			_ => ErrorKind::Caller,
		}
	}

	pub fn is_retryable(&self) -> bool {
		false
	}
}

impl From<SecretError> for VerifyError {
	fn from(e: SecretError) -> Self {
		match e {
			SecretError::Missing => VerifyError::SecretNotConfigured,
			other => VerifyError::SecretMalformed(other),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_secret_maps_to_not_configured() {
		let err: IssueError = SecretError::Missing.into();
		assert!(matches!(err, IssueError::SecretNotConfigured));
		assert_eq!(err.kind(), ErrorKind::Configuration);
	}

	#[test]
	fn quoted_secret_keeps_operator_hint() {
		let err: IssueError = SecretError::LikelyQuoted {
			len: 34,
			expected: 32,
		}
		.into();
		assert_eq!(err.kind(), ErrorKind::Configuration);
		assert_eq!(
			err.to_string(),
			"RTC server secret is malformed: secret has length 34, expected 32; it looks like it is still wrapped in quotes"
		);
	}

	#[test]
	fn caller_and_internal_kinds() {
		assert_eq!(
			IssueError::from(ArgumentError::MissingSubject).kind(),
			ErrorKind::Caller
		);
		assert_eq!(
			IssueError::from(SigningError::InvalidKey("x".into())).kind(),
			ErrorKind::Internal
		);
		assert!(!IssueError::SecretNotConfigured.is_retryable());
	}

	#[test]
	fn unreadable_secret_keeps_cause_for_verifier() {
		let err: VerifyError = SecretStoreError::Unavailable {
			store: "vault",
			message: "permission denied".to_string(),
		}
		.into();
		assert_eq!(err.kind(), ErrorKind::Configuration);
		assert!(err.to_string().contains("permission denied"));
	}

	#[test]
	fn verification_failures_are_terminal() {
		let err = VerifyError::TokenExpired {
			expire_at: 10,
			now: 10,
		};
		assert_eq!(err.kind(), ErrorKind::Caller);
		assert!(!err.is_retryable());
		assert!(!VerifyError::InvalidSignature.is_retryable());
	}
}
