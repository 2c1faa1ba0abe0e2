//! Simple tagconf usage.
//!
//! Loads a service configuration with a required key, defaults and a nested
//! record, then shows the aggregated report for a broken document.
//!
//! Run with `RUST_LOG=debug` to see the loader's log output.

use tagconf::Record;
use tracing_subscriber::EnvFilter;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration
#[derive(Debug, Default, Record)]
struct DatabaseConfig {
    #[config(yaml = "url", validate = "required")]
    url: String,
    #[config(yaml = "max_connections", default = "10", validate = ">0,<=100")]
    max_connections: u32,
}

/// Application configuration
#[derive(Debug, Default, Record)]
struct AppConfig {
    #[config(yaml = "service", validate = "required,len<=32")]
    service: String,
    #[config(yaml = "port", default = "8080", validate = ">=1024")]
    port: u16,
    #[config(yaml = "database")]
    database: DatabaseConfig,
    #[config(yaml = "allowed_origins", validate = "len>0")]
    allowed_origins: Vec<String>,
}

const VALID: &str = r"
service: example-service
database:
  url: postgres://localhost/example
allowed_origins:
  - https://example.com
";

const BROKEN: &str = r"
port: 80
database:
  max_connections: 500
allowed_origins: []
";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = AppConfig::default();
    match tagconf::from_yaml_str(VALID, &mut config) {
        Ok(()) => tracing::info!(?config, "configuration loaded"),
        Err(err) => tracing::error!(%err, "configuration rejected"),
    }

    let mut config = AppConfig::default();
    if let Err(err) = tagconf::from_yaml_str(BROKEN, &mut config) {
        let count = err.decode_errors().map_or(0, |errors| errors.len());
        tracing::warn!(count, "broken configuration rejected");
        eprintln!("{err}");
    }
}
