use std::{sync::Arc, time::Duration};

use teloxide::{
    dispatching::Dispatcher, dptree, error_handlers::LoggingErrorHandler, prelude::*,
    update_listeners::Polling,
};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use fxb_core::{
    catalog::PairCatalog, config::Config, handler::UpdateHandler,
    messaging::port::MessagingPort, router::Router,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<UpdateHandler>,
}

pub async fn run_polling(cfg: Arc<Config>, catalog: Arc<PairCatalog>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Basic startup info.
    match bot.get_me().await {
        Ok(me) => info!(username = %me.username(), "Bot connected"),
        Err(e) => warn!(error = %e, "get_me failed; continuing with polling"),
    }
    if cfg.authorized_users.is_empty() {
        info!("No authorized users configured; access is open");
    } else {
        info!(count = cfg.authorized_users.len(), "Loaded authorized users");
    }

    let router = Arc::new(Router::from_config(&cfg, catalog));
    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let handler = Arc::new(UpdateHandler::new(router.clone(), messenger));

    if let Some(every) = cfg.rate_limit_idle_evict {
        tokio::spawn(evict_idle_loop(router, every));
    }

    let state = Arc::new(AppState { handler });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    // By default the backlog queued while the bot was down is discarded.
    let mut polling = Polling::builder(bot.clone());
    if cfg.drop_pending_updates {
        polling = polling.drop_pending_updates();
    }
    let listener = polling.build();

    info!(
        drop_pending_updates = cfg.drop_pending_updates,
        "Starting bot in polling mode"
    );
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    Ok(())
}

/// Periodically forget identities whose rate-limit window is empty.
async fn evict_idle_loop(router: Arc<Router>, every: Duration) {
    let mut tick = interval(every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tick.tick().await;
        let evicted = router.evict_idle(Instant::now().into_std()).await;
        if evicted > 0 {
            let tracked = router.tracked_identities().await;
            debug!(evicted, tracked, "Evicted idle rate-limit windows");
        }
    }
}
