// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracing subscriber set-up.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::ConfigError;
use crate::sections::{LogFormat, LoggingConfig};

/// Build the filter: `RUST_LOG` if set, otherwise the configured level.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
	match EnvFilter::try_from_default_env() {
		Ok(filter) => Ok(filter),
		Err(_) => EnvFilter::try_new(&config.level).map_err(|e| ConfigError::InvalidValue {
			key: "logging.level".to_string(),
			message: e.to_string(),
		}),
	}
}

/// Install the global tracing subscriber.
///
/// # Errors
/// Returns `ConfigError::Logging` if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
	let filter = env_filter(config)?;
	let registry = tracing_subscriber::registry().with(filter);

	let result = match config.format {
		LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
		LogFormat::Json => registry
			.with(tracing_subscriber::fmt::layer().json())
			.try_init(),
	};

	result.map_err(|e| ConfigError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_invalid_level_is_rejected() {
		if std::env::var_os("RUST_LOG").is_some() {
			return;
		}
		let config = LoggingConfig {
			level: "salt=loudest".to_string(),
			..Default::default()
		};
		assert!(env_filter(&config).is_err());
	}

	#[test]
	fn test_second_init_fails() {
		let config = LoggingConfig::default();
		let _ = init_tracing(&config);
		assert!(matches!(
			init_tracing(&config),
			Err(ConfigError::Logging(_))
		));
	}
}
