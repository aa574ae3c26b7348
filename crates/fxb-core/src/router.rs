//! Command/selection dispatch.
//!
//! Each event runs through an ordered guard chain; the first guard that
//! rejects answers for the whole event and later guards never run. Events
//! that pass every guard reach a handler that reads the catalog.

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    catalog::{Category, PairCatalog},
    commands::Command,
    config::Config,
    domain::UserId,
    messaging::types::{InlineKeyboard, Reply},
    navigation::NavToken,
    security::{AccessGate, RateLimitPolicy, RateLimitScope, SlidingWindowLimiter},
    views,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Command(Command),
    /// Raw callback data from a button press.
    Selection(String),
}

#[derive(Clone, Debug)]
pub struct Request {
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub event: Event,
}

impl Request {
    pub fn command(user_id: UserId, command: Command) -> Self {
        Self {
            user_id,
            username: None,
            first_name: None,
            event: Event::Command(command),
        }
    }

    pub fn selection(user_id: UserId, data: impl Into<String>) -> Self {
        Self {
            user_id,
            username: None,
            first_name: None,
            event: Event::Selection(data.into()),
        }
    }

    fn username(&self) -> &str {
        self.username.as_deref().unwrap_or("unknown")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Reject(Reply),
}

/// A predicate run before a handler; may short-circuit with its own reply.
#[async_trait]
pub trait Guard: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self, req: &Request, now: Instant) -> Verdict;
}

pub struct AccessGuard {
    gate: AccessGate,
}

impl AccessGuard {
    pub fn new(gate: AccessGate) -> Self {
        Self { gate }
    }
}

#[async_trait]
impl Guard for AccessGuard {
    fn name(&self) -> &'static str {
        "access"
    }

    async fn check(&self, req: &Request, _now: Instant) -> Verdict {
        info!(
            user_id = req.user_id.0,
            username = req.username(),
            "Access attempt"
        );
        if self.gate.is_authorized(req.user_id) {
            return Verdict::Pass;
        }
        warn!(
            user_id = req.user_id.0,
            username = req.username(),
            "Unauthorized access attempt"
        );
        Verdict::Reject(views::access_denied())
    }
}

pub struct RateLimitGuard {
    limiter: Arc<Mutex<SlidingWindowLimiter>>,
}

impl RateLimitGuard {
    pub fn new(limiter: Arc<Mutex<SlidingWindowLimiter>>) -> Self {
        Self { limiter }
    }
}

#[async_trait]
impl Guard for RateLimitGuard {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    async fn check(&self, req: &Request, now: Instant) -> Verdict {
        let (ok, retry_after) = self.limiter.lock().await.check_at(req.user_id, now);
        if ok {
            return Verdict::Pass;
        }
        warn!(
            user_id = req.user_id.0,
            username = req.username(),
            retry_after_ms = retry_after.map(|d| d.as_millis() as u64),
            "Rate limit exceeded"
        );
        Verdict::Reject(views::rate_limited(retry_after))
    }
}

pub struct Router {
    catalog: Arc<PairCatalog>,
    policy: RateLimitPolicy,
    limiter: Arc<Mutex<SlidingWindowLimiter>>,
    entry_guards: Vec<Arc<dyn Guard>>,
    command_guards: Vec<Arc<dyn Guard>>,
    selection_guards: Vec<Arc<dyn Guard>>,
}

impl Router {
    pub fn new(
        catalog: Arc<PairCatalog>,
        gate: AccessGate,
        policy: RateLimitPolicy,
        scope: RateLimitScope,
    ) -> Self {
        let limiter = Arc::new(Mutex::new(SlidingWindowLimiter::new(policy)));
        let access: Arc<dyn Guard> = Arc::new(AccessGuard::new(gate));
        let rate: Arc<dyn Guard> = Arc::new(RateLimitGuard::new(limiter.clone()));

        let entry_guards = vec![access.clone(), rate.clone()];
        let command_guards = match scope {
            RateLimitScope::Entry => vec![access.clone()],
            RateLimitScope::All => vec![access.clone(), rate],
        };
        let selection_guards = vec![access];

        Self {
            catalog,
            policy,
            limiter,
            entry_guards,
            command_guards,
            selection_guards,
        }
    }

    pub fn from_config(cfg: &Config, catalog: Arc<PairCatalog>) -> Self {
        Self::new(
            catalog,
            AccessGate::new(cfg.authorized_users.iter().copied()),
            cfg.rate_limit,
            cfg.rate_limit_scope,
        )
    }

    /// Guard chain applied to `event`, in order.
    pub fn guards_for(&self, event: &Event) -> &[Arc<dyn Guard>] {
        match event {
            Event::Command(c) if c.is_entry() => &self.entry_guards,
            Event::Command(_) => &self.command_guards,
            Event::Selection(_) => &self.selection_guards,
        }
    }

    pub async fn dispatch(&self, req: &Request) -> Reply {
        self.dispatch_at(req, Instant::now()).await
    }

    /// Produces exactly one reply for the request.
    pub async fn dispatch_at(&self, req: &Request, now: Instant) -> Reply {
        for guard in self.guards_for(&req.event) {
            if let Verdict::Reject(reply) = guard.check(req, now).await {
                debug!(guard = guard.name(), "Request rejected by guard");
                return reply;
            }
        }

        match &req.event {
            Event::Command(command) => self.handle_command(*command, req),
            Event::Selection(data) => self.handle_selection(data),
        }
    }

    fn handle_command(&self, command: Command, req: &Request) -> Reply {
        match command {
            Command::Start => {
                info!(
                    user_id = req.user_id.0,
                    username = req.username(),
                    "User started the bot"
                );
                self.welcome(req.first_name.as_deref())
            }
            Command::Pairs => self.list_all(),
            Command::Major | Command::Minor | Command::Exotic => {
                self.list_category(command.name())
            }
            Command::Random => self.random_pick(views::another_random()),
            Command::Stats => self.stats(),
            Command::Help => self.help(),
        }
    }

    fn handle_selection(&self, data: &str) -> Reply {
        let Some(token) = NavToken::parse(data) else {
            debug!(data, "Unknown menu option");
            return views::unknown_option();
        };

        match token {
            NavToken::Category(category) => self.list_category(category.key()),
            NavToken::All => {
                let mut reply = self.list_all();
                reply.keyboard = Some(views::back_to_menu());
                reply
            }
            NavToken::Random => self.random_pick(views::back_to_menu()),
            NavToken::BackToMenu => self.menu(),
        }
    }

    pub fn welcome(&self, first_name: Option<&str>) -> Reply {
        views::welcome(first_name, self.policy)
    }

    pub fn menu(&self) -> Reply {
        views::menu()
    }

    pub fn list_all(&self) -> Reply {
        views::all_pairs(&self.catalog)
    }

    /// Case-insensitive; unknown or empty categories yield "not found".
    pub fn list_category(&self, raw: &str) -> Reply {
        Category::parse(raw)
            .and_then(|c| views::category_pairs(&self.catalog, c))
            .unwrap_or_else(views::category_not_found)
    }

    pub fn random_pick(&self, keyboard: InlineKeyboard) -> Reply {
        let mut rng = rand::thread_rng();
        match self.catalog.random_pick(&mut rng) {
            Some((symbol, category)) => views::random_pair(symbol, category, keyboard),
            None => views::no_pairs(),
        }
    }

    pub fn stats(&self) -> Reply {
        views::stats(&self.catalog, Utc::now())
    }

    pub fn help(&self) -> Reply {
        views::help(self.policy)
    }

    /// Forget identities with no calls left in the window.
    pub async fn evict_idle(&self, now: Instant) -> usize {
        self.limiter.lock().await.evict_idle(now)
    }

    /// Identities currently holding rate-limit state.
    pub async fn tracked_identities(&self) -> usize {
        self.limiter.lock().await.tracked()
    }
}
