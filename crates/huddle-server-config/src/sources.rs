// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;
use std::str::FromStr;

use huddle_rtc_token::{SecretCharset, TokenVariant};
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{LoggingConfigLayer, RtcConfigLayer};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/huddle/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: HUDDLE_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			rtc: Some(load_rtc_from_env()?),
			logging: Some(load_logging_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T>(name: &str, kind: &str) -> Result<Option<T>, ConfigError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|e: T::Err| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {kind} value '{v}': {e}"),
		}),
		None => Ok(None),
	}
}

fn env_charset(name: &str) -> Result<Option<SecretCharset>, ConfigError> {
	match env_var(name) {
		Some(v) => match v.to_lowercase().as_str() {
			"hex" => Ok(Some(SecretCharset::Hex)),
			"any" => Ok(Some(SecretCharset::Any)),
			_ => Err(ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid charset '{v}': expected 'hex' or 'any'"),
			}),
		},
		None => Ok(None),
	}
}

fn load_rtc_from_env() -> Result<RtcConfigLayer, ConfigError> {
	Ok(RtcConfigLayer {
		app_id: env_parse::<u64>("HUDDLE_RTC_APP_ID", "u64")?,
		token_variant: env_parse::<TokenVariant>("HUDDLE_RTC_TOKEN_VARIANT", "token variant")?,
		default_ttl_secs: env_parse::<u64>("HUDDLE_RTC_DEFAULT_TTL_SECS", "u64")?,
		max_ttl_secs: env_parse::<u64>("HUDDLE_RTC_MAX_TTL_SECS", "u64")?,
		secret_len: env_parse::<usize>("HUDDLE_RTC_SECRET_LEN", "usize")?,
		secret_charset: env_charset("HUDDLE_RTC_SECRET_CHARSET")?,
		secret_env_var: env_var("HUDDLE_RTC_SECRET_ENV_VAR"),
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	Ok(LoggingConfigLayer {
		level: env_var("HUDDLE_LOG_LEVEL"),
		json: env_bool("HUDDLE_LOG_JSON"),
	})
}
