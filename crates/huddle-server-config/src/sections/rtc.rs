// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! RTC credential issuance configuration.
//!
//! The shared secret is deliberately not part of this section. It is read at
//! start-up from the environment variable named by `secret_env_var` (or its
//! `_FILE` companion) so it never lands in a TOML file.

use huddle_common_config::{CachedSecretStore, EnvSecretStore};
use huddle_rtc_token::{
	IssueRequest, IssuerConfig, SecretCharset, SecretPolicy, TokenVariant, TtlPolicy,
	DEFAULT_SECRET_LEN, DEFAULT_TTL_SECS, MAX_TTL_SECS,
};
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_SECRET_ENV_VAR: &str = "HUDDLE_RTC_SERVER_SECRET";

/// RTC configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct RtcConfig {
	pub app_id: u64,
	pub token_variant: TokenVariant,
	pub ttl: TtlPolicy,
	pub secret_policy: SecretPolicy,
	pub secret_env_var: String,
}

impl RtcConfig {
	pub fn issuer_config(&self) -> IssuerConfig {
		IssuerConfig {
			variant: self.token_variant,
			ttl: self.ttl,
			secret_policy: self.secret_policy,
		}
	}

	/// Secret store reading `secret_env_var`, cached after the first hit.
	pub fn secret_store(&self) -> CachedSecretStore<EnvSecretStore> {
		CachedSecretStore::new(EnvSecretStore::new(self.secret_env_var.clone()))
	}

	/// A request for this tenant on behalf of `subject_id`.
	pub fn request(&self, subject_id: impl Into<String>) -> IssueRequest {
		IssueRequest::new(self.app_id, subject_id)
	}
}

/// RTC configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RtcConfigLayer {
	pub app_id: Option<u64>,
	pub token_variant: Option<TokenVariant>,
	pub default_ttl_secs: Option<u64>,
	pub max_ttl_secs: Option<u64>,
	pub secret_len: Option<usize>,
	pub secret_charset: Option<SecretCharset>,
	pub secret_env_var: Option<String>,
}

impl RtcConfigLayer {
	pub fn merge(&mut self, other: RtcConfigLayer) {
		if other.app_id.is_some() {
			self.app_id = other.app_id;
		}
		if other.token_variant.is_some() {
			self.token_variant = other.token_variant;
		}
		if other.default_ttl_secs.is_some() {
			self.default_ttl_secs = other.default_ttl_secs;
		}
		if other.max_ttl_secs.is_some() {
			self.max_ttl_secs = other.max_ttl_secs;
		}
		if other.secret_len.is_some() {
			self.secret_len = other.secret_len;
		}
		if other.secret_charset.is_some() {
			self.secret_charset = other.secret_charset;
		}
		if other.secret_env_var.is_some() {
			self.secret_env_var = other.secret_env_var;
		}
	}

	/// Resolve defaults. `app_id` and `token_variant` have none.
	pub fn finalize(self) -> Result<RtcConfig, ConfigError> {
		let app_id = self.app_id.filter(|&id| id != 0).ok_or_else(|| {
			ConfigError::MissingValue("rtc.app_id (HUDDLE_RTC_APP_ID) must be a non-zero integer".to_string())
		})?;
		let token_variant = self.token_variant.ok_or_else(|| {
			ConfigError::MissingValue(
				"rtc.token_variant (HUDDLE_RTC_TOKEN_VARIANT) must be \"split\" or \"blob\"; it must match the platform's verifier".to_string(),
			)
		})?;

		Ok(RtcConfig {
			app_id,
			token_variant,
			ttl: TtlPolicy {
				default_secs: self.default_ttl_secs.unwrap_or(DEFAULT_TTL_SECS),
				max_secs: self.max_ttl_secs.unwrap_or(MAX_TTL_SECS),
			},
			secret_policy: SecretPolicy {
				expected_len: self.secret_len.unwrap_or(DEFAULT_SECRET_LEN),
				charset: self.secret_charset.unwrap_or(SecretCharset::Hex),
			},
			secret_env_var: self
				.secret_env_var
				.unwrap_or_else(|| DEFAULT_SECRET_ENV_VAR.to_string()),
		})
	}
}
