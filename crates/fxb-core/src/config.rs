use std::{
    env, fs,
    net::{IpAddr, SocketAddr},
    path::Path,
    time::Duration,
};

use tracing::warn;

use crate::{
    errors::Error,
    security::{RateLimitPolicy, RateLimitScope},
    Result,
};

/// Typed configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub authorized_users: Vec<i64>,
    pub drop_pending_updates: bool,

    // Rate limiting
    pub rate_limit: RateLimitPolicy,
    pub rate_limit_scope: RateLimitScope,
    pub rate_limit_idle_evict: Option<Duration>,

    // Health server
    pub health_addr: SocketAddr,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process env in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_str = |key: &str| lookup(key);

        // Required env vars
        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }
        let telegram_bot_token = telegram_bot_token.trim().to_string();

        // Empty or absent means open access.
        let authorized_users = parse_csv_i64("AUTHORIZED_USERS", env_str("AUTHORIZED_USERS"));

        let drop_pending_updates = parse_bool(env_str("DROP_PENDING_UPDATES")).unwrap_or(true);

        // Rate limiting
        let defaults = RateLimitPolicy::default();
        let rate_limit = RateLimitPolicy {
            enabled: parse_bool(env_str("RATE_LIMIT_ENABLED")).unwrap_or(defaults.enabled),
            max_calls: parse_num::<u32>("RATE_LIMIT_REQUESTS", env_str("RATE_LIMIT_REQUESTS"))
                .unwrap_or(defaults.max_calls),
            period: parse_num::<u64>("RATE_LIMIT_WINDOW", env_str("RATE_LIMIT_WINDOW"))
                .map(Duration::from_secs)
                .unwrap_or(defaults.period),
        };
        let rate_limit_scope = match env_str("RATE_LIMIT_SCOPE") {
            Some(raw) => RateLimitScope::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "Unknown RATE_LIMIT_SCOPE, using \"entry\"");
                RateLimitScope::Entry
            }),
            None => RateLimitScope::Entry,
        };
        let rate_limit_idle_evict =
            match parse_num::<u64>("RATE_LIMIT_IDLE_EVICT", env_str("RATE_LIMIT_IDLE_EVICT"))
                .unwrap_or(600)
            {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            };

        // Health server
        let port = parse_num::<u16>("PORT", env_str("PORT")).unwrap_or(10_000);
        let host = env_str("HEALTH_HOST")
            .and_then(non_empty)
            .unwrap_or_else(|| "0.0.0.0".to_string());
        let ip = host
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .map_err(|e| Error::Config(format!("invalid HEALTH_HOST {host:?}: {e}")))?;
        let health_addr = SocketAddr::new(ip, port);

        Ok(Self {
            telegram_bot_token,
            authorized_users,
            drop_pending_updates,
            rate_limit,
            rate_limit_scope,
            rate_limit_idle_evict,
            health_addr,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_bool(v: Option<String>) -> Option<bool> {
    v.map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_num<T: std::str::FromStr>(key: &str, v: Option<String>) -> Option<T> {
    let raw = v?;
    match raw.trim().parse::<T>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable numeric setting");
            None
        }
    }
}

/// Malformed entries are logged and skipped; they never abort startup.
fn parse_csv_i64(key: &str, v: Option<String>) -> Vec<i64> {
    let mut out = Vec::new();
    for s in v.unwrap_or_default().split(',').map(|s| s.trim()) {
        if s.is_empty() {
            continue;
        }
        match s.parse::<i64>() {
            Ok(id) if !out.contains(&id) => out.push(id),
            Ok(_) => {}
            Err(_) => warn!(key, entry = %s, "Skipping malformed user id"),
        }
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
