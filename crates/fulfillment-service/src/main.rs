//! Main entry point for the order fulfillment service.
//!
//! This binary wires together the storage backends, the notifier, and the
//! fulfillment engine, then serves the engine's operations over a small HTTP
//! API. The outer pipeline driver (one call per stage, plus confirm and
//! rollback) is an external collaborator and talks to this service through
//! that API.

use clap::Parser;
use fulfillment_config::Config;
use fulfillment_core::{EventBus, FulfillmentEngine};
use fulfillment_notify::TracingNotifier;
use fulfillment_storage::implementations::memory::{MemoryEmployeeStore, MemoryOrderStore};
use fulfillment_storage::EmployeeStore;
use fulfillment_types::Employee;
use std::path::PathBuf;
use std::sync::Arc;

mod server;

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

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};
	let env_filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(args.log_level.clone()));
	fmt().with_env_filter(env_filter).init();

	let config = Config::from_file(&args.config)?;
	tracing::info!(service_id = %config.service.id, "Starting fulfillment service");

	// The config validator only admits the memory backend for now.
	let orders = Arc::new(MemoryOrderStore::new());
	let employees = Arc::new(MemoryEmployeeStore::new());

	for seed in &config.seed.employees {
		employees
			.put(&Employee {
				location_id: seed.location_id.clone(),
				id: seed.id.clone(),
				full_name: seed.full_name.clone(),
				role: seed.role,
				occupied: false,
				rating: seed.rating,
			})
			.await?;
	}
	if !config.seed.employees.is_empty() {
		tracing::info!(count = config.seed.employees.len(), "Seeded employees");
	}

	let engine = Arc::new(FulfillmentEngine::new(
		orders.clone(),
		employees.clone(),
		Arc::new(TracingNotifier),
		EventBus::default(),
	));

	server::start_server(config, engine, orders, employees).await
}
