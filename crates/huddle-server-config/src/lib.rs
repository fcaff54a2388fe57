// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the Huddle credential issuer.
//!
//! Sources are applied in precedence order: built-in defaults, then the TOML
//! file (`/etc/huddle/server.toml` unless overridden), then `HUDDLE_*`
//! environment variables. The shared secret never comes from a file layer;
//! see [`RtcConfig::secret_store`].

pub mod error;
pub mod layer;
pub mod logging;
pub mod sections;
pub mod sources;

use std::path::Path;

use huddle_common_config::SecretStore;
use huddle_rtc_token::{CredentialIssuer, CredentialVerifier, IssueError, VerifyError};
use tracing::info;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use logging::{filter_from_level, init_tracing};
pub use sections::{
	LoggingConfig, LoggingConfigLayer, RtcConfig, RtcConfigLayer, DEFAULT_SECRET_ENV_VAR,
};
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

/// Fully resolved server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
	pub rtc: RtcConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from the system TOML file and the environment.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from the environment only.
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![Box::new(DefaultsSource), Box::new(EnvSource)])
}

/// Load configuration from a specific TOML file, with env overrides.
pub fn load_config_with_file(path: impl AsRef<Path>) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(path.as_ref())),
		Box::new(EnvSource),
	])
}

/// Merge `sources` in precedence order and finalize the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in &sources {
		let layer = source.load()?;
		tracing::debug!(source = source.name(), "merged config layer");
		merged.merge(layer);
	}

	finalize(merged)
}

/// Resolve defaults and validate a merged layer.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		rtc: layer.rtc.unwrap_or_default().finalize()?,
		logging: layer.logging.unwrap_or_default().finalize(),
	};
	validate(&config)?;

	info!(
		app_id = config.rtc.app_id,
		token_variant = %config.rtc.token_variant,
		default_ttl_secs = config.rtc.ttl.default_secs,
		max_ttl_secs = config.rtc.ttl.max_secs,
		secret_env_var = %config.rtc.secret_env_var,
		"configuration loaded"
	);

	Ok(config)
}

fn validate(config: &ServerConfig) -> Result<(), ConfigError> {
	let ttl = &config.rtc.ttl;
	if ttl.max_secs == 0 {
		return Err(ConfigError::Validation(
			"rtc.max_ttl_secs must be greater than zero".to_string(),
		));
	}
	if ttl.default_secs == 0 || ttl.default_secs > ttl.max_secs {
		return Err(ConfigError::Validation(format!(
			"rtc.default_ttl_secs must be between 1 and {}, got {}",
			ttl.max_secs, ttl.default_secs
		)));
	}
	if config.rtc.secret_policy.expected_len == 0 {
		return Err(ConfigError::Validation(
			"rtc.secret_len must be greater than zero".to_string(),
		));
	}
	if config.rtc.secret_env_var.is_empty() {
		return Err(ConfigError::Validation(
			"rtc.secret_env_var must not be empty".to_string(),
		));
	}
	Ok(())
}

/// Build the process-wide issuer, reading the secret from `store` once.
pub fn build_issuer(
	config: &RtcConfig,
	store: &dyn SecretStore,
) -> Result<CredentialIssuer, IssueError> {
	CredentialIssuer::from_store(config.issuer_config(), store)
}

/// Build a verifier sharing the issuer's secret shape and variant.
pub fn build_verifier(
	config: &RtcConfig,
	store: &dyn SecretStore,
) -> Result<CredentialVerifier, VerifyError> {
	CredentialVerifier::from_store(config.token_variant, store, &config.secret_policy)
}

#[cfg(test)]
mod tests {
	use super::*;
	use huddle_common_config::StaticSecretStore;
	use huddle_rtc_token::{FixedClock, FixedNonce, TokenVariant};
	use std::io::Write;
	use std::sync::Arc;
	use tempfile::NamedTempFile;

	const SECRET: &str = "0123456789abcdef0123456789abcdef";

	fn rtc_layer(variant: TokenVariant) -> ServerConfigLayer {
		ServerConfigLayer {
			rtc: Some(RtcConfigLayer {
				app_id: Some(128222087),
				token_variant: Some(variant),
				..Default::default()
			}),
			..Default::default()
		}
	}

	#[test]
	fn test_finalize_minimal() {
		let config = finalize(rtc_layer(TokenVariant::Split)).unwrap();
		assert_eq!(config.rtc.app_id, 128222087);
		assert_eq!(config.logging, LoggingConfig::default());
	}

	#[test]
	fn test_finalize_empty_layer_fails() {
		assert!(matches!(
			finalize(ServerConfigLayer::default()),
			Err(ConfigError::MissingValue(_))
		));
	}

	#[test]
	fn test_validate_default_ttl_above_max() {
		let mut layer = rtc_layer(TokenVariant::Split);
		if let Some(rtc) = layer.rtc.as_mut() {
			rtc.default_ttl_secs = Some(7200);
		}
		assert!(matches!(finalize(layer), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_validate_zero_max_ttl() {
		let mut layer = rtc_layer(TokenVariant::Split);
		if let Some(rtc) = layer.rtc.as_mut() {
			rtc.max_ttl_secs = Some(0);
			rtc.default_ttl_secs = Some(0);
		}
		assert!(matches!(finalize(layer), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_validate_zero_secret_len() {
		let mut layer = rtc_layer(TokenVariant::Split);
		if let Some(rtc) = layer.rtc.as_mut() {
			rtc.secret_len = Some(0);
		}
		assert!(matches!(finalize(layer), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_load_from_toml_file() {
		let mut file = NamedTempFile::new().unwrap();
		write!(
			file,
			r#"
[rtc]
app_id = 128222087
token_variant = "blob"
default_ttl_secs = 600
max_ttl_secs = 1200
secret_env_var = "HUDDLE_TEST_LIB_TOML_SECRET"
"#
		)
		.unwrap();

		let config = load_from_sources(vec![
			Box::new(TomlSource::new(file.path())),
			Box::new(DefaultsSource),
		])
		.unwrap();
		assert_eq!(config.rtc.token_variant, TokenVariant::Blob);
		assert_eq!(config.rtc.ttl.default_secs, 600);
		assert_eq!(config.rtc.ttl.max_secs, 1200);
		assert_eq!(config.rtc.secret_env_var, "HUDDLE_TEST_LIB_TOML_SECRET");
	}

	#[test]
	fn test_build_issuer_and_verifier_agree() {
		let config = finalize(rtc_layer(TokenVariant::Blob)).unwrap().rtc;
		let store = StaticSecretStore::new(SECRET);

		let issuer = build_issuer(&config, &store)
			.unwrap()
			.with_clock(Arc::new(FixedClock(1000)))
			.with_nonce_source(Arc::new(FixedNonce(7)));
		let verifier = build_verifier(&config, &store).unwrap();

		let issued = issuer.issue(&config.request("u-42")).unwrap();
		let record = verifier.verify(&issued.token, "u-42", 1001).unwrap();
		assert_eq!(record.expire_at(), 4600);
	}

	#[test]
	fn test_build_issuer_without_secret() {
		let config = finalize(rtc_layer(TokenVariant::Split)).unwrap().rtc;
		let err = build_issuer(&config, &StaticSecretStore::empty())
			.err()
			.unwrap();
		assert!(matches!(err, IssueError::SecretNotConfigured));

		let err = build_verifier(&config, &StaticSecretStore::empty()).unwrap_err();
		assert!(matches!(err, VerifyError::SecretNotConfigured));
	}

	#[test]
	fn test_build_verifier_keeps_store_failure() {
		let var = "HUDDLE_TEST_LIB_UNREADABLE_SECRET";
		std::env::set_var(format!("{var}_FILE"), "/nonexistent/huddle/server-secret");
		let config = finalize(ServerConfigLayer {
			rtc: Some(RtcConfigLayer {
				secret_env_var: Some(var.to_string()),
				..rtc_layer(TokenVariant::Split).rtc.unwrap_or_default()
			}),
			..Default::default()
		})
		.unwrap()
		.rtc;

		let err = build_verifier(&config, &config.secret_store()).unwrap_err();
		assert!(matches!(err, VerifyError::SecretUnavailable(_)));

		let err = build_issuer(&config, &config.secret_store()).err().unwrap();
		assert!(matches!(err, IssueError::SecretUnavailable(_)));

		std::env::remove_var(format!("{var}_FILE"));
	}
}
