//! Realtime location sharing server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin mapshare-server -- --static-dir ../frontend/dist
//! ```

use clap::Parser;
use mapshare_server::{ServerArgs, ServerConfig};
use mapshare_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let args = ServerArgs::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = match ServerConfig::try_from(args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    // Run the server
    if let Err(e) = mapshare_server::run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
