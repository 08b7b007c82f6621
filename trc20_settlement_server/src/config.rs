use std::{env, time::Duration};

use log::*;
use tronscan_tools::TronscanConfig;
use tsg_common::Secret;

use crate::telegram::TelegramConfig;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_ROUND_BUDGET_MS: u64 = 4_000;
const DEFAULT_LOOKBACK_HOURS: i64 = 24;
const DEFAULT_CALLBACK_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_CALLBACK_BACKOFF_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    /// The cadence of wallet poll rounds.
    pub poll_interval: Duration,
    /// The admission budget of a single poll round. Wallets not yet dispatched when the budget runs out are
    /// skipped until the next round; wallets already in flight always run to completion. Clamped below
    /// `poll_interval`.
    pub round_budget: Duration,
    /// How far back each round's transfer-history window reaches. Generous on purpose: re-observing transfers
    /// that settled an order in an earlier round is harmless.
    pub lookback_hours: i64,
    /// Shared secret used to sign merchant notification payloads.
    pub api_auth_token: Secret<String>,
    /// Total delivery attempts per merchant notification (first try included).
    pub callback_max_attempts: u32,
    /// Delay between consecutive delivery attempts of the same notification.
    pub callback_backoff: Duration,
    pub tronscan: TronscanConfig,
    pub telegram: TelegramConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: String::default(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            round_budget: Duration::from_millis(DEFAULT_ROUND_BUDGET_MS),
            lookback_hours: DEFAULT_LOOKBACK_HOURS,
            api_auth_token: Secret::default(),
            callback_max_attempts: DEFAULT_CALLBACK_MAX_ATTEMPTS,
            callback_backoff: Duration::from_secs(DEFAULT_CALLBACK_BACKOFF_SECS),
            tronscan: TronscanConfig::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env::var("TSG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ TSG_DATABASE_URL is not set. Please set it to the URL for the gateway database.");
            String::default()
        });
        let poll_interval = Duration::from_secs(env_u64("TSG_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS));
        let round_budget = Duration::from_millis(env_u64("TSG_ROUND_BUDGET_MS", DEFAULT_ROUND_BUDGET_MS));
        let round_budget = if round_budget >= poll_interval {
            warn!(
                "🪛️ TSG_ROUND_BUDGET_MS ({}ms) is not shorter than the poll interval ({}ms). Rounds would pile up. \
                 Clamping the budget to {}ms.",
                round_budget.as_millis(),
                poll_interval.as_millis(),
                DEFAULT_ROUND_BUDGET_MS.min(poll_interval.as_millis() as u64 * 4 / 5)
            );
            Duration::from_millis(DEFAULT_ROUND_BUDGET_MS.min(poll_interval.as_millis() as u64 * 4 / 5))
        } else {
            round_budget
        };
        let lookback_hours = env_i64("TSG_LOOKBACK_HOURS", DEFAULT_LOOKBACK_HOURS);
        let api_auth_token = env::var("TSG_API_AUTH_TOKEN").map(Secret::new).unwrap_or_else(|_| {
            error!(
                "🪛️ TSG_API_AUTH_TOKEN is not set. Merchant notification signatures will be computed over an empty \
                 secret, and merchants will reject them."
            );
            Secret::default()
        });
        let callback_max_attempts =
            env_u64("TSG_CALLBACK_MAX_ATTEMPTS", u64::from(DEFAULT_CALLBACK_MAX_ATTEMPTS)) as u32;
        let callback_backoff =
            Duration::from_secs(env_u64("TSG_CALLBACK_BACKOFF_SECS", DEFAULT_CALLBACK_BACKOFF_SECS));
        let tronscan = TronscanConfig::new_from_env_or_default();
        let telegram = TelegramConfig::from_env_or_default();
        Self {
            database_url,
            poll_interval,
            round_budget,
            lookback_hours,
            api_auth_token,
            callback_max_attempts,
            callback_backoff,
            tronscan,
            telegram,
        }
    }
}

fn env_u64(var: &str, default: u64) -> u64 {
    env::var(var)
        .map(|s| {
            s.parse::<u64>().unwrap_or_else(|e| {
                error!("🪛️ {s} is not a valid value for {var}. {e} Using the default, {default}, instead.");
                default
            })
        })
        .ok()
        .unwrap_or(default)
}

fn env_i64(var: &str, default: i64) -> i64 {
    env::var(var)
        .map(|s| {
            s.parse::<i64>().unwrap_or_else(|e| {
                error!("🪛️ {s} is not a valid value for {var}. {e} Using the default, {default}, instead.");
                default
            })
        })
        .ok()
        .unwrap_or(default)
}
