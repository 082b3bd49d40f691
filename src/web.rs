use ecomdash::app;
use ecomdash::config::DashboardConfig;

/// Main entry point for the dashboard server
///
/// Reads the configuration from the environment, then starts the web
/// application. Logging is controlled through `RUST_LOG` (for example
/// `RUST_LOG=ecomdash=debug`).
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = DashboardConfig::from_env()?;
    app::run(config).await
}
