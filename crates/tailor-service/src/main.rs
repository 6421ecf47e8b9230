//! Main entry point for the garment fulfillment service.
//!
//! This binary loads configuration, wires the configured storage backend
//! and notification channels into the fulfillment engine, and serves the
//! order API alongside the engine's event loop.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tailor_config::Config;
use tailor_core::{EngineBuilder, EngineFactories, FulfillmentEngine};

mod apis;
mod server;

use tailor_notify::implementations::log::create_notifier as create_log_notifier;
use tailor_notify::implementations::webhook::create_notifier as create_webhook_notifier;
use tailor_storage::implementations::file::create_storage as create_file_storage;
use tailor_storage::implementations::memory::create_storage as create_memory_storage;

/// Command-line arguments for the fulfillment service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started fulfillment service");

	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let engine = Arc::new(build_engine(config.clone())?);
	engine.initialize().await?;

	match config.api.clone().filter(|api| api.enabled) {
		Some(api_config) => {
			let api_engine = Arc::clone(&engine);
			tokio::select! {
				result = engine.run() => {
					tracing::info!("Engine finished");
					result?;
				}
				result = server::start_server(api_config, api_engine) => {
					tracing::info!("API server finished");
					result?;
				}
			}
		},
		None => {
			tracing::info!("Starting engine only");
			engine.run().await?;
		},
	}

	engine.shutdown().await?;
	tracing::info!("Stopped fulfillment service");
	Ok(())
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
	($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
		let mut factories = std::collections::HashMap::new();
		$(
			factories.insert(
				$name.to_string(),
				$factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
			);
		)*
		factories
	}};
}

/// Builds the fulfillment engine with every available implementation.
fn build_engine(config: Config) -> Result<FulfillmentEngine, Box<dyn std::error::Error>> {
	let builder = EngineBuilder::new(config);

	let storage_factories = create_factory_map!(
		tailor_storage::StorageInterface,
		tailor_storage::StorageError,
		"file" => create_file_storage,
		"memory" => create_memory_storage,
	);

	let notifier_factories = create_factory_map!(
		tailor_notify::NotifierInterface,
		tailor_notify::NotifyError,
		"log" => create_log_notifier,
		"webhook" => create_webhook_notifier,
	);

	let factories = EngineFactories {
		storage_factories,
		notifier_factories,
	};

	Ok(builder.build(factories)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tailor_config::builders::config::ConfigBuilder;
	use tempfile::tempdir;

	#[test]
	fn test_args_default_values() {
		let args = Args::parse_from(["atelier"]);
		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_args_custom_values() {
		let args = Args::parse_from(["atelier", "--config", "custom.toml", "-l", "debug"]);
		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
	}

	#[test]
	fn test_create_factory_map_macro() {
		let factories = create_factory_map!(
			tailor_storage::StorageInterface,
			tailor_storage::StorageError,
			"memory" => create_memory_storage,
			"file" => create_file_storage,
		);
		assert_eq!(factories.len(), 2);
		assert!(factories.contains_key("memory"));
		assert!(factories.contains_key("file"));
	}

	#[test]
	fn test_build_engine_with_minimal_config() {
		let engine = build_engine(ConfigBuilder::new().service_id("test-atelier").build());
		assert!(engine.is_ok(), "Failed to build engine: {:?}", engine.err());
		assert_eq!(engine.unwrap().config().service.id, "test-atelier");
	}

	#[tokio::test]
	async fn test_build_engine_from_file_config() {
		let temp_dir = tempdir().expect("Failed to create temp dir");
		let data_dir = temp_dir.path().join("orders");
		let config_path = temp_dir.path().join("atelier.toml");

		let config_content = format!(
			r#"
[service]
id = "test-file-atelier"

[storage]
primary = "file"

[storage.implementations.file]
storage_path = "{}"

[notifications.implementations.log]

[lifecycle]
pickup_auto_collect_days = 3
sweep_interval_seconds = 600
"#,
			data_dir.display()
		);
		std::fs::write(&config_path, config_content).expect("Failed to write config");

		let config = Config::from_file(config_path.to_str().unwrap())
			.await
			.expect("Failed to load config");
		assert_eq!(config.service.id, "test-file-atelier");
		assert_eq!(config.lifecycle.pickup_auto_collect_days, 3);

		let engine = build_engine(config).expect("Failed to build engine");
		engine.initialize().await.expect("Storage should be reachable");
	}
}
