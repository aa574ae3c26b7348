use std::{process::ExitCode, sync::Arc};

use tracing::{error, info};

use fxb_core::{catalog::PairCatalog, config::Config};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = fxb_core::logging::init("fxb") {
        eprintln!("{e}");
    }

    // Nothing is started until the config is valid.
    let cfg = match Config::load() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!(error = %e, "Startup aborted");
            return ExitCode::FAILURE;
        }
    };
    info!("Bot token loaded");

    let health_addr = cfg.health_addr;
    tokio::spawn(async move {
        if let Err(e) = fxb_health::serve(health_addr).await {
            error!(error = %e, "Health server stopped");
        }
    });

    let catalog = Arc::new(PairCatalog::reference());
    if let Err(e) = fxb_telegram::router::run_polling(cfg, catalog).await {
        error!(error = %e, "Telegram bot failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
