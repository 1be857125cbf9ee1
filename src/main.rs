mod admin;
mod collector;
mod config;
mod metrics;
mod probe;
mod registry;
mod server;
mod store;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = config::Config::load();

    // Set up tracing with the configured log level
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    if let Err(e) = server::run(config).await {
        eprintln!("fatal: {e}");
        std::process::exit(1);
    }
}
