// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration for SALT permission services.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`SALT_AUTH_*`)
//! - Tracing subscriber set-up driven by the logging section
//!
//! # Usage
//!
//! ```ignore
//! use salt_server_config::{init_tracing, load_config};
//!
//! let config = load_config()?;
//! init_tracing(&config.logging)?;
//! let pool = salt_server_db::create_pool_from_config(&config.database).await?;
//! ```

pub mod error;
pub mod layer;
pub mod logging;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::AuthConfigLayer;
pub use logging::init_tracing;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthConfig {
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`SALT_AUTH_*`)
/// 2. Config file (`/etc/salt/auth.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<AuthConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<AuthConfig, ConfigError> {
	load_from_sources(vec![Box::new(DefaultsSource), Box::new(EnvSource)])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<AuthConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<AuthConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = AuthConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: AuthConfigLayer) -> Result<AuthConfig, ConfigError> {
	let database = layer.database.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&database)?;

	info!(
		database = %database.url,
		max_connections = database.max_connections,
		log_level = %logging.level,
		log_format = %logging.format,
		"configuration loaded"
	);

	Ok(AuthConfig { database, logging })
}

/// Validate cross-field configuration rules.
fn validate_config(database: &DatabaseConfig) -> Result<(), ConfigError> {
	if database.max_connections == 0 {
		return Err(ConfigError::Validation(
			"database max_connections must be at least 1".to_string(),
		));
	}
	if database.url.trim().is_empty() {
		return Err(ConfigError::Validation(
			"database url must not be empty".to_string(),
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_zero_connections_rejected() {
		let database = DatabaseConfig {
			max_connections: 0,
			..Default::default()
		};
		let result = validate_config(&database);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("max_connections"));
	}

	#[test]
	fn test_empty_url_rejected() {
		let database = DatabaseConfig {
			url: "  ".to_string(),
			..Default::default()
		};
		assert!(validate_config(&database).is_err());
	}

	#[test]
	fn test_defaults_finalize() {
		let config = finalize(AuthConfigLayer::default()).unwrap();
		assert_eq!(config, AuthConfig::default());
	}

	#[test]
	fn test_file_overrides_defaults() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[database]
url = "sqlite:/var/lib/salt/pipt.db"
max_connections = 12

[logging]
format = "json"
"#
		)
		.unwrap();

		let config = load_from_sources(vec![
			Box::new(TomlSource::new(file.path())),
			Box::new(DefaultsSource),
		])
		.unwrap();

		assert_eq!(config.database.url, "sqlite:/var/lib/salt/pipt.db");
		assert_eq!(config.database.max_connections, 12);
		assert_eq!(config.database.acquire_timeout_secs, 30);
		assert_eq!(config.logging.level, "info");
		assert_eq!(config.logging.format, LogFormat::Json);
	}
}
