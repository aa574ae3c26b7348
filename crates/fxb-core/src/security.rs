use std::{
    collections::{HashMap, HashSet, VecDeque},
    time::{Duration, Instant},
};

use crate::domain::UserId;

// ============== Authorization ==============

/// Allow-list of identities loaded once at startup.
///
/// An empty list means the bot is open to everyone.
#[derive(Clone, Debug, Default)]
pub struct AccessGate {
    allowed: HashSet<UserId>,
}

impl AccessGate {
    pub fn new(allowed_users: impl IntoIterator<Item = i64>) -> Self {
        Self {
            allowed: allowed_users.into_iter().map(UserId).collect(),
        }
    }

    pub fn is_authorized(&self, user_id: UserId) -> bool {
        self.allowed.is_empty() || self.allowed.contains(&user_id)
    }

}

// ============== Rate Limiter (Sliding Window) ==============

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub enabled: bool,
    pub max_calls: u32,
    pub period: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_calls: 10,
            period: Duration::from_secs(60),
        }
    }
}

/// Which commands the rate-limit guard applies to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RateLimitScope {
    /// Only the entry command (`/start`).
    #[default]
    Entry,
    /// Every command.
    All,
}

impl RateLimitScope {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "entry" | "start" => Some(Self::Entry),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// Per-identity sliding window of accepted call timestamps.
///
/// Timestamps older than `period` are pruned before each count check; a new
/// timestamp is recorded only when the call is accepted.
#[derive(Clone, Debug)]
pub struct SlidingWindowLimiter {
    policy: RateLimitPolicy,
    windows: HashMap<UserId, VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            windows: HashMap::new(),
        }
    }

    pub fn allow_at(&mut self, user_id: UserId, now: Instant) -> bool {
        self.check_at(user_id, now).0
    }

    /// Returns whether the call is accepted and, on rejection, how long until
    /// the oldest call in the window ages out.
    pub fn check_at(&mut self, user_id: UserId, now: Instant) -> (bool, Option<Duration>) {
        if !self.policy.enabled {
            return (true, None);
        }

        let period = self.policy.period;
        let window = self.windows.entry(user_id).or_default();
        prune(window, now, period);

        if window.len() >= self.policy.max_calls as usize {
            let retry_after = window
                .front()
                .map(|oldest| period.saturating_sub(now.saturating_duration_since(*oldest)));
            return (false, retry_after);
        }

        window.push_back(now);
        (true, None)
    }

    /// Drop identities whose every recorded call has left the window.
    /// Returns how many identities were evicted.
    pub fn evict_idle(&mut self, now: Instant) -> usize {
        let period = self.policy.period;
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            prune(window, now, period);
            !window.is_empty()
        });
        before - self.windows.len()
    }

    /// Number of identities currently holding window state.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

fn prune(window: &mut VecDeque<Instant>, now: Instant, period: Duration) {
    while let Some(oldest) = window.front() {
        if now.saturating_duration_since(*oldest) >= period {
            window.pop_front();
        } else {
            break;
        }
    }
}
