// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential verification, the mirror image of [`crate::issuer`].
//!
//! In production the RTC platform does this check. It lives here so the
//! issuer can be tested end to end and so operators can debug rejected
//! tokens locally.
//!
//! Order of checks: decode with the configured variant, compare the HMAC in
//! constant time over the raw body bytes, and only then parse the body and
//! look at version, expiry and subject. A tampered body is therefore always
//! reported as [`VerifyError::InvalidSignature`], never as a parse error.

use huddle_common_config::SecretStore;
use tracing::{debug, instrument, warn};

use crate::canonical;
use crate::encoding::{self, DecodeError, TokenVariant};
use crate::error::VerifyError;
use crate::issuer::CredentialIssuer;
use crate::record::{CredentialRecord, PROTOCOL_VERSION};
use crate::secret::SecretPolicy;
use crate::signer::Signer;

#[derive(Debug, Clone)]
pub struct CredentialVerifier {
	signer: Signer,
	variant: TokenVariant,
}

impl CredentialVerifier {
	/// Build a verifier for the default 32-hex-character secret shape.
	pub fn new(variant: TokenVariant, secret_raw: Option<&str>) -> Result<Self, VerifyError> {
		Self::with_policy(variant, secret_raw, &SecretPolicy::default())
	}

	pub fn with_policy(
		variant: TokenVariant,
		secret_raw: Option<&str>,
		policy: &SecretPolicy,
	) -> Result<Self, VerifyError> {
		let raw = secret_raw.ok_or(VerifyError::SecretNotConfigured)?;
		let secret = policy.normalize(raw)?;
		Ok(Self::from_signer(Signer::new(secret), variant))
	}

	/// Read the raw secret from `store` and build a verifier.
	#[instrument(skip_all, fields(store = store.name(), variant = %variant))]
	pub fn from_store(
		variant: TokenVariant,
		store: &dyn SecretStore,
		policy: &SecretPolicy,
	) -> Result<Self, VerifyError> {
		let secret = store.load().map_err(|e| {
			warn!(error = %e, "RTC server secret could not be read");
			VerifyError::from(e)
		})?;
		Self::with_policy(variant, secret.as_ref().map(|s| s.expose().as_str()), policy)
	}

	pub fn from_signer(signer: Signer, variant: TokenVariant) -> Self {
		Self { signer, variant }
	}

	/// A verifier that accepts exactly what `issuer` produces.
	pub fn for_issuer(issuer: &CredentialIssuer) -> Self {
		Self::from_signer(issuer.signer().clone(), issuer.variant())
	}

	pub fn variant(&self) -> TokenVariant {
		self.variant
	}

	#[instrument(skip(self, token), fields(variant = %self.variant, token_len = token.len()))]
	pub fn verify(
		&self,
		token: &str,
		expected_subject: &str,
		now: u64,
	) -> Result<CredentialRecord, VerifyError> {
		let result = self.check(token, expected_subject, now);
		match &result {
			Ok(record) => debug!(
				app_id = record.app_id(),
				expire_at = record.expire_at(),
				"verified RTC credential"
			),
			Err(e) => warn!(error = %e, "rejected RTC credential"),
		}
		result
	}

	fn check(
		&self,
		token: &str,
		expected_subject: &str,
		now: u64,
	) -> Result<CredentialRecord, VerifyError> {
		let decoded = encoding::decode(self.variant, token).map_err(|e| match e {
			DecodeError::Malformed(reason) => VerifyError::Malformed { reason },
			DecodeError::Signature(_) => VerifyError::InvalidSignature,
		})?;

		if !self.signer.verify(&decoded.body, &decoded.signature)? {
			return Err(VerifyError::InvalidSignature);
		}

		let record = canonical::parse(&decoded.body).map_err(|e| VerifyError::Malformed {
			reason: e.to_string(),
		})?;

		if record.version() != PROTOCOL_VERSION {
			return Err(VerifyError::UnsupportedVersion {
				version: record.version().to_string(),
			});
		}

		if record.is_expired_at(now) {
			return Err(VerifyError::TokenExpired {
				expire_at: record.expire_at(),
				now,
			});
		}

		if record.subject_id() != expected_subject {
			return Err(VerifyError::SubjectMismatch {
				expected: expected_subject.to_string(),
				actual: record.subject_id().to_string(),
			});
		}

		Ok(record)
	}
}

/// One-shot verification against a raw secret.
pub fn verify(
	token: &str,
	secret_raw: Option<&str>,
	expected_subject: &str,
	now: u64,
	variant: TokenVariant,
) -> Result<CredentialRecord, VerifyError> {
	CredentialVerifier::new(variant, secret_raw)?.verify(token, expected_subject, now)
}

/// A token's contents, decoded but **not** authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectedToken {
	pub record: CredentialRecord,
	pub signature_len: usize,
}

/// Decode a token without the secret, for diagnosing platform rejections.
///
/// Nothing in the result can be trusted; use [`CredentialVerifier`] for that.
pub fn inspect(token: &str, variant: TokenVariant) -> Result<InspectedToken, VerifyError> {
	let decoded = encoding::decode(variant, token).map_err(|e| VerifyError::Malformed {
		reason: e.to_string(),
	})?;
	let record = canonical::parse(&decoded.body).map_err(|e| VerifyError::Malformed {
		reason: e.to_string(),
	})?;
	Ok(InspectedToken {
		record,
		signature_len: decoded.signature.len(),
	})
}
