//! oplay - Main entry point

use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oplay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    oplay::app::run(std::env::args_os()).await.into()
}
