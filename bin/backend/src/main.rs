//! Unified Backend Binary
//!
//! Runs the contest engine: connects to Postgres, serves the HTTP/websocket
//! surface, and drives the background scheduling/pricing/scoreboard loops
//! until the process is interrupted. Configuration path comes from
//! `CONFIG_PATH` (defaults to `config.toml`).

#[tokio::main]
async fn main() {
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = ctf_core::config::Config::load(&config_path)
        .unwrap_or_else(|e| panic!("failed to load config from {config_path}: {e}"));

    ctf_core::logging::log(config.log_file.as_deref());
    ctf_core::logging::kys();

    ctf_server::run(config).await.unwrap();
}
