use std::env;

use log::*;

pub const DEFAULT_TRONSCAN_API_URL: &str = "https://apilist.tronscanapi.com/api/token_trc20/transfers";
/// The USDT-TRC20 token contract on the Tron mainnet.
pub const DEFAULT_USDT_CONTRACT_ID: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

#[derive(Clone, Debug)]
pub struct TronscanConfig {
    /// The transfer-history endpoint, e.g. `https://apilist.tronscanapi.com/api/token_trc20/transfers`.
    pub api_url: String,
    /// The TRC20 token contract to watch.
    pub contract_id: String,
}

impl Default for TronscanConfig {
    fn default() -> Self {
        Self { api_url: DEFAULT_TRONSCAN_API_URL.to_string(), contract_id: DEFAULT_USDT_CONTRACT_ID.to_string() }
    }
}

impl TronscanConfig {
    pub fn new(api_url: &str, contract_id: &str) -> Self {
        Self { api_url: api_url.to_string(), contract_id: contract_id.to_string() }
    }

    pub fn new_from_env_or_default() -> Self {
        let api_url = env::var("TSG_TRONSCAN_API_URL").ok().unwrap_or_else(|| {
            info!("🪛️ TSG_TRONSCAN_API_URL is not set. Using the public Tronscan endpoint.");
            DEFAULT_TRONSCAN_API_URL.into()
        });
        let contract_id = env::var("TSG_USDT_CONTRACT_ID").ok().unwrap_or_else(|| {
            info!("🪛️ TSG_USDT_CONTRACT_ID is not set. Using the mainnet USDT contract.");
            DEFAULT_USDT_CONTRACT_ID.into()
        });
        Self { api_url, contract_id }
    }
}
