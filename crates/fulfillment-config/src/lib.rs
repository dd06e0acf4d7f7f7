//! Configuration module for the order fulfillment system.
//!
//! This module provides structures and utilities for managing service
//! configuration. It supports loading configuration from TOML files and
//! validates that all required values are properly set before the service
//! starts.

use fulfillment_types::Role;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the fulfillment service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration specific to the service instance.
	pub service: ServiceConfig,
	/// Configuration for the storage backend.
	#[serde(default)]
	pub storage: StorageConfig,
	/// Employees loaded into the store at startup.
	#[serde(default)]
	pub seed: SeedConfig,
}

/// Configuration specific to the service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier for this service instance.
	pub id: String,
	/// Host the HTTP API binds to.
	#[serde(default = "default_host")]
	pub host: String,
	/// Port the HTTP API binds to.
	#[serde(default = "default_port")]
	pub port: u16,
}

fn default_host() -> String {
	"127.0.0.1".to_string()
}

fn default_port() -> u16 {
	3000
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Backend implementation name.
	#[serde(default = "default_backend")]
	pub backend: String,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			backend: default_backend(),
		}
	}
}

fn default_backend() -> String {
	"memory".to_string()
}

/// Employees seeded into the store at startup, so a fresh process has a
/// staffed location to run against.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SeedConfig {
	/// Employee records to create.
	#[serde(default)]
	pub employees: Vec<SeedEmployee>,
}

/// One seeded employee record.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedEmployee {
	/// Location the employee works at.
	pub location_id: String,
	/// Employee identifier within the location.
	pub id: String,
	/// Display name.
	pub full_name: String,
	/// Role performed.
	pub role: Role,
	/// Initial review rating.
	pub rating: f64,
}

impl Config {
	/// Loads and validates configuration from a TOML file.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
		let contents = std::fs::read_to_string(path)?;
		contents.parse()
	}

	/// Checks the configuration for values the service cannot run with.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.trim().is_empty() {
			return Err(ConfigError::Validation(
				"service.id must not be empty".to_string(),
			));
		}
		if self.storage.backend != "memory" {
			return Err(ConfigError::Validation(format!(
				"unknown storage backend: {}",
				self.storage.backend
			)));
		}
		for employee in &self.seed.employees {
			if !(0.0..=5.0).contains(&employee.rating) {
				return Err(ConfigError::Validation(format!(
					"seed employee {} has rating {} outside 0.0..=5.0",
					employee.id, employee.rating
				)));
			}
		}
		Ok(())
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let config: Config = toml::from_str(s)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn minimal_config_parses_with_defaults() {
		let config: Config = "[service]\nid = \"fulfillment-1\"\n".parse().unwrap();
		assert_eq!(config.service.id, "fulfillment-1");
		assert_eq!(config.service.host, "127.0.0.1");
		assert_eq!(config.service.port, 3000);
		assert_eq!(config.storage.backend, "memory");
		assert!(config.seed.employees.is_empty());
	}

	#[test]
	fn seed_employees_parse() {
		let config: Config = r#"
[service]
id = "fulfillment-1"

[[seed.employees]]
location_id = "loc-1"
id = "cook-1"
full_name = "Ana Cook"
role = "cook"
rating = 4.8
"#
		.parse()
		.unwrap();
		assert_eq!(config.seed.employees.len(), 1);
		assert_eq!(config.seed.employees[0].role, Role::Cook);
	}

	#[test]
	fn empty_service_id_is_rejected() {
		let result: Result<Config, _> = "[service]\nid = \"  \"\n".parse();
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn unknown_backend_is_rejected() {
		let result: Result<Config, _> =
			"[service]\nid = \"s1\"\n[storage]\nbackend = \"dynamo\"\n".parse();
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn out_of_range_rating_is_rejected() {
		let result: Result<Config, _> = r#"
[service]
id = "s1"

[[seed.employees]]
location_id = "loc-1"
id = "cook-1"
full_name = "Ana Cook"
role = "cook"
rating = 7.5
"#
		.parse();
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn loads_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, "[service]\nid = \"fulfillment-1\"\n").unwrap();
		let config = Config::from_file(file.path()).unwrap();
		assert_eq!(config.service.id, "fulfillment-1");
	}

	#[test]
	fn missing_file_is_an_io_error() {
		let result = Config::from_file("/nonexistent/config.toml");
		assert!(matches!(result, Err(ConfigError::Io(_))));
	}
}
