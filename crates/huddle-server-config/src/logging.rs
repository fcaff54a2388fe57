// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Global `tracing` subscriber set-up.

use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;
use crate::sections::LoggingConfig;

/// Build the filter: `RUST_LOG` wins, then the configured directives.
pub fn filter_from_level(level: &str) -> Result<EnvFilter, ConfigError> {
	if let Ok(filter) = EnvFilter::try_from_default_env() {
		return Ok(filter);
	}
	EnvFilter::try_new(level).map_err(|e| ConfigError::InvalidValue {
		key: "logging.level".to_string(),
		message: e.to_string(),
	})
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
	let filter = filter_from_level(&config.level)?;
	let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

	let result = if config.json {
		builder.json().try_init()
	} else {
		builder.try_init()
	};

	result.map_err(|e| ConfigError::Logging(e.to_string()))
}
