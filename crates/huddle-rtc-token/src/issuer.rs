// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential issuance.
//!
//! [`CredentialIssuer`] is built once per process from configuration and the
//! raw server secret, then shared by reference across request handlers.
//! Each [`CredentialIssuer::issue`] call is independent: it owns its record,
//! draws its own nonce, and touches no shared mutable state.

use std::fmt;
use std::sync::Arc;

use huddle_common_config::SecretStore;
use tracing::{error, info, instrument, warn};

use crate::canonical;
use crate::clock::{Clock, SystemClock};
use crate::encoding::{self, TokenVariant};
use crate::error::{ErrorKind, IssueError};
use crate::nonce::{NonceSource, OsNonceSource};
use crate::record::{ArgumentError, CredentialRecord};
use crate::secret::SecretPolicy;
use crate::signer::Signer;

/// TTL used when the caller does not ask for one.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Longest TTL ever granted; longer requests are clamped.
pub const MAX_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
	pub default_secs: u64,
	pub max_secs: u64,
}

impl Default for TtlPolicy {
	fn default() -> Self {
		Self {
			default_secs: DEFAULT_TTL_SECS,
			max_secs: MAX_TTL_SECS,
		}
	}
}

impl TtlPolicy {
	/// `None` means default, zero is rejected, anything above the max is clamped.
	pub fn resolve(&self, requested: Option<u64>) -> Result<u64, ArgumentError> {
		let ttl = requested.unwrap_or(self.default_secs);
		if ttl == 0 {
			return Err(ArgumentError::ZeroTtl);
		}
		if ttl > self.max_secs {
			warn!(
				requested_ttl_secs = ttl,
				max_ttl_secs = self.max_secs,
				"clamping requested credential ttl"
			);
			return Ok(self.max_secs);
		}
		Ok(ttl)
	}
}

#[derive(Debug, Clone)]
pub struct IssuerConfig {
	pub variant: TokenVariant,
	pub ttl: TtlPolicy,
	pub secret_policy: SecretPolicy,
}

impl IssuerConfig {
	/// Defaults for everything except the variant, which has no safe default.
	pub fn new(variant: TokenVariant) -> Self {
		Self {
			variant,
			ttl: TtlPolicy::default(),
			secret_policy: SecretPolicy::default(),
		}
	}
}

/// What the RPC layer asks for on behalf of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
	pub app_id: u64,
	/// Must already equal the authenticated principal.
	pub subject_id: String,
	pub ttl_seconds: Option<u64>,
	pub payload: String,
}

impl IssueRequest {
	pub fn new(app_id: u64, subject_id: impl Into<String>) -> Self {
		Self {
			app_id,
			subject_id: subject_id.into(),
			ttl_seconds: None,
			payload: String::new(),
		}
	}

	pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
		self.ttl_seconds = Some(ttl_seconds);
		self
	}

	pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
		self.payload = payload.into();
		self
	}
}

/// The token handed back to the client plus the record it encodes.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
	pub token: String,
	pub record: CredentialRecord,
}

impl fmt::Debug for IssuedToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("IssuedToken")
			.field("token_len", &self.token.len())
			.field("record", &self.record)
			.finish()
	}
}

pub struct CredentialIssuer {
	signer: Signer,
	variant: TokenVariant,
	ttl: TtlPolicy,
	clock: Arc<dyn Clock>,
	nonces: Arc<dyn NonceSource>,
}

impl CredentialIssuer {
	/// Normalize `secret_raw` and build an issuer. Fails closed on any
	/// secret problem.
	#[instrument(skip_all, fields(variant = %config.variant))]
	pub fn new(config: IssuerConfig, secret_raw: Option<&str>) -> Result<Self, IssueError> {
		let Some(raw) = secret_raw else {
			warn!("RTC server secret is not configured");
			return Err(IssueError::SecretNotConfigured);
		};

		let secret = config.secret_policy.normalize(raw)?;
		info!(
			secret_len = secret.len(),
			default_ttl_secs = config.ttl.default_secs,
			max_ttl_secs = config.ttl.max_secs,
			"credential issuer ready"
		);

		Ok(Self {
			signer: Signer::new(secret),
			variant: config.variant,
			ttl: config.ttl,
			clock: Arc::new(SystemClock),
			nonces: Arc::new(OsNonceSource),
		})
	}

	/// Read the raw secret from `store` and build an issuer.
	#[instrument(skip_all, fields(store = store.name()))]
	pub fn from_store(config: IssuerConfig, store: &dyn SecretStore) -> Result<Self, IssueError> {
		let secret = store.load()?;
		Self::new(config, secret.as_ref().map(|s| s.expose().as_str()))
	}

	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	pub fn with_nonce_source(mut self, nonces: Arc<dyn NonceSource>) -> Self {
		self.nonces = nonces;
		self
	}

	pub fn variant(&self) -> TokenVariant {
		self.variant
	}

	pub fn ttl_policy(&self) -> TtlPolicy {
		self.ttl
	}

	/// The signer, for building a matching verifier.
	pub fn signer(&self) -> &Signer {
		&self.signer
	}

	#[instrument(skip_all, fields(app_id = request.app_id, subject_id = %request.subject_id, variant = %self.variant))]
	pub fn issue(&self, request: &IssueRequest) -> Result<IssuedToken, IssueError> {
		let result = self.build_record(request).and_then(|r| self.issue_record(r));
		if let Err(e) = &result {
			match e.kind() {
				ErrorKind::Internal => error!(error = %e, "credential issuance failed"),
				ErrorKind::Configuration => warn!(error = %e, "credential issuance misconfigured"),
				ErrorKind::Caller => warn!(error = %e, "credential request rejected"),
			}
		}
		result
	}

	fn build_record(&self, request: &IssueRequest) -> Result<CredentialRecord, IssueError> {
		if request.app_id == 0 {
			return Err(ArgumentError::MissingAppId.into());
		}
		if request.subject_id.is_empty() {
			return Err(ArgumentError::MissingSubject.into());
		}

		let ttl_secs = self.ttl.resolve(request.ttl_seconds)?;
		let issued_at = self.clock.now_secs();
		let expire_at = issued_at
			.checked_add(ttl_secs)
			.ok_or(ArgumentError::ExpiryOverflow {
				issued_at,
				ttl_secs,
			})?;
		let nonce = self.nonces.next_nonce()?;

		CredentialRecord::new(
			request.app_id,
			request.subject_id.clone(),
			nonce,
			issued_at,
			expire_at,
			request.payload.clone(),
		)
		.map_err(IssueError::from)
	}

	/// Serialize, sign and encode an already-built record.
	pub fn issue_record(&self, record: CredentialRecord) -> Result<IssuedToken, IssueError> {
		let body = canonical::serialize(&record)?;
		let signature = self.signer.sign(&body)?;
		let token = encoding::encode(self.variant, &body, &signature);

		info!(
			app_id = record.app_id(),
			subject_id = %record.subject_id(),
			secret_len = self.signer.secret_len(),
			variant = %self.variant,
			expire_at = record.expire_at(),
			token_len = token.len(),
			"issued RTC credential"
		);

		Ok(IssuedToken { token, record })
	}
}

/// One-shot issuance with system time and a fresh OS nonce.
///
/// Normalizes the secret on every call; long-lived services should build a
/// [`CredentialIssuer`] once instead.
pub fn issue(
	app_id: u64,
	subject_id: &str,
	secret_raw: Option<&str>,
	ttl_seconds: Option<u64>,
	payload: &str,
	variant: TokenVariant,
) -> Result<String, IssueError> {
	let issuer = CredentialIssuer::new(IssuerConfig::new(variant), secret_raw)?;
	let mut request = IssueRequest::new(app_id, subject_id).with_payload(payload);
	request.ttl_seconds = ttl_seconds;
	issuer.issue(&request).map(|issued| issued.token)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clock::FixedClock;
	use crate::nonce::FixedNonce;
	use crate::secret::SecretError;
	use huddle_common_config::StaticSecretStore;
	use std::io;
	use std::sync::Mutex;

	const HEX: &str = "0123456789abcdef0123456789abcdef";
	const SPLIT_GOLDEN: &str = "eyJ2ZXJzaW9uIjoiMDQiLCJhcHBfaWQiOjEyODIyMjA4NywidXNlcl9pZCI6InUtNDIiLCJub25jZSI6NywiY3RpbWUiOjEwMDAsImV4cGlyZSI6NDYwMCwicGF5bG9hZCI6IiJ9.IUFQbN7vpIcusBKbZIxMdci395FyIBQGRcMBix5gz4A=";

	fn fixed_issuer(variant: TokenVariant) -> CredentialIssuer {
		CredentialIssuer::new(IssuerConfig::new(variant), Some(HEX))
			.unwrap()
			.with_clock(Arc::new(FixedClock(1000)))
			.with_nonce_source(Arc::new(FixedNonce(7)))
	}

	#[test]
	fn golden_vector_split() {
		let issued = fixed_issuer(TokenVariant::Split)
			.issue(&IssueRequest::new(128222087, "u-42").with_ttl(3600))
			.unwrap();
		assert_eq!(issued.token, SPLIT_GOLDEN);
		assert_eq!(issued.record.issued_at(), 1000);
		assert_eq!(issued.record.expire_at(), 4600);
		assert_eq!(issued.record.nonce(), 7);
	}

	#[test]
	fn fixed_inputs_are_deterministic() {
		let issuer = fixed_issuer(TokenVariant::Blob);
		let request = IssueRequest::new(128222087, "u-42").with_payload("{}");
		let first = issuer.issue(&request).unwrap();
		let second = issuer.issue(&request).unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn quoted_secret_is_accepted() {
		let raw = format!(" \"{HEX}\" ");
		let issuer = CredentialIssuer::new(IssuerConfig::new(TokenVariant::Split), Some(&raw))
			.unwrap()
			.with_clock(Arc::new(FixedClock(1000)))
			.with_nonce_source(Arc::new(FixedNonce(7)));
		let issued = issuer.issue(&IssueRequest::new(128222087, "u-42")).unwrap();
		assert_eq!(issued.token, SPLIT_GOLDEN);
	}

	#[test]
	fn absent_secret_fails_closed() {
		let err = CredentialIssuer::new(IssuerConfig::new(TokenVariant::Split), None)
			.err()
			.unwrap();
		assert!(matches!(err, IssueError::SecretNotConfigured));

		let err = CredentialIssuer::new(IssuerConfig::new(TokenVariant::Split), Some("   "))
			.err()
			.unwrap();
		assert!(matches!(err, IssueError::SecretNotConfigured));
	}

	#[test]
	fn malformed_secret_carries_reason() {
		let err = CredentialIssuer::new(IssuerConfig::new(TokenVariant::Split), Some("abc"))
			.err()
			.unwrap();
		assert!(matches!(
			err,
			IssueError::SecretMalformed {
				reason: SecretError::WrongLength { len: 3, .. }
			}
		));
		assert_eq!(err.kind(), ErrorKind::Configuration);
	}

	#[test]
	fn from_store_reads_secret() {
		let issuer = CredentialIssuer::from_store(
			IssuerConfig::new(TokenVariant::Split),
			&StaticSecretStore::new(HEX),
		)
		.unwrap();
		assert_eq!(issuer.signer().secret_len(), 32);

		let err = CredentialIssuer::from_store(
			IssuerConfig::new(TokenVariant::Split),
			&StaticSecretStore::empty(),
		)
		.err()
		.unwrap();
		assert!(matches!(err, IssueError::SecretNotConfigured));
	}

	#[test]
	fn rejects_missing_app_id_and_subject() {
		let issuer = fixed_issuer(TokenVariant::Split);
		let err = issuer.issue(&IssueRequest::new(0, "u-42")).unwrap_err();
		assert!(matches!(
			err,
			IssueError::InvalidArgument(ArgumentError::MissingAppId)
		));
		let err = issuer.issue(&IssueRequest::new(1, "")).unwrap_err();
		assert!(matches!(
			err,
			IssueError::InvalidArgument(ArgumentError::MissingSubject)
		));
		assert_eq!(err.kind(), ErrorKind::Caller);
	}

	#[test]
	fn ttl_is_defaulted_clamped_and_bounded() {
		let issuer = fixed_issuer(TokenVariant::Split);

		let issued = issuer.issue(&IssueRequest::new(1, "u")).unwrap();
		assert_eq!(issued.record.ttl_secs(), DEFAULT_TTL_SECS);

		let issued = issuer.issue(&IssueRequest::new(1, "u").with_ttl(60)).unwrap();
		assert_eq!(issued.record.ttl_secs(), 60);

		let issued = issuer
			.issue(&IssueRequest::new(1, "u").with_ttl(86_400))
			.unwrap();
		assert_eq!(issued.record.ttl_secs(), MAX_TTL_SECS);

		let err = issuer.issue(&IssueRequest::new(1, "u").with_ttl(0)).unwrap_err();
		assert!(matches!(err, IssueError::InvalidArgument(ArgumentError::ZeroTtl)));
	}

	#[test]
	fn expiry_overflow_is_a_caller_error() {
		let issuer = fixed_issuer(TokenVariant::Split).with_clock(Arc::new(FixedClock(u64::MAX)));
		let err = issuer.issue(&IssueRequest::new(1, "u")).unwrap_err();
		assert!(matches!(
			err,
			IssueError::InvalidArgument(ArgumentError::ExpiryOverflow { .. })
		));
	}

	#[test]
	fn one_shot_issue_produces_verifiable_token() {
		let token = issue(128222087, "u-42", Some(HEX), Some(120), "", TokenVariant::Blob).unwrap();
		let verifier = crate::CredentialVerifier::new(TokenVariant::Blob, Some(HEX)).unwrap();
		let record = verifier.verify(&token, "u-42", SystemClock.now_secs()).unwrap();
		assert_eq!(record.ttl_secs(), 120);
	}

	#[test]
	fn issued_token_debug_hides_token() {
		let issued = fixed_issuer(TokenVariant::Split)
			.issue(&IssueRequest::new(128222087, "u-42"))
			.unwrap();
		let debug = format!("{issued:?}");
		assert!(!debug.contains(&issued.token));
		assert!(debug.contains("token_len"));
	}

	#[derive(Clone, Default)]
	struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

	impl io::Write for CapturedLogs {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.0.lock().unwrap().extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	#[test]
	fn logs_never_contain_secret_or_token() {
		let logs = CapturedLogs::default();
		let writer = logs.clone();
		let subscriber = tracing_subscriber::fmt()
			.with_writer(move || writer.clone())
			.with_max_level(tracing::Level::TRACE)
			.with_ansi(false)
			.finish();

		let quoted = format!("'{HEX}'");
		let token = tracing::subscriber::with_default(subscriber, || {
			let issuer = CredentialIssuer::new(IssuerConfig::new(TokenVariant::Split), Some(&quoted))
				.unwrap();
			issuer
				.issue(&IssueRequest::new(128222087, "u-42"))
				.unwrap()
				.token
		});

		let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
		assert!(output.contains("issued RTC credential"));
		assert!(output.contains("token_len"));
		assert!(output.contains("u-42"));
		assert!(!output.contains(HEX));
		assert!(!output.contains(&token));
		let (body, signature) = token.split_once('.').unwrap();
		assert!(!output.contains(body));
		assert!(!output.contains(signature));
	}
}
