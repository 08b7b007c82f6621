use std::sync::Arc;

use log::*;
use reqwest::Client;

use crate::{
    config::TronscanConfig,
    data_objects::{RawTrc20Transfer, Trc20TransferPage},
    LedgerApiError,
};

/// Client for the Tronscan TRC20 transfer-history endpoint.
///
/// One call fetches a single page (newest first, capped at 50 records) of transfers for one wallet over a
/// millisecond time window. The caller decides the window; the settlement pipeline uses a 24-hour lookback to
/// tolerate ledger propagation lag, and relies on the order store's pending-order invariant to make
/// re-observation of old transfers harmless.
#[derive(Clone)]
pub struct TronscanApi {
    config: TronscanConfig,
    client: Arc<Client>,
}

impl TronscanApi {
    pub fn new(config: TronscanConfig) -> Result<Self, LedgerApiError> {
        let client = Client::builder().build().map_err(|e| LedgerApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn fetch_transfers(
        &self,
        wallet: &str,
        window_start_ms: i64,
        window_end_ms: i64,
    ) -> Result<Vec<RawTrc20Transfer>, LedgerApiError> {
        let start_timestamp = window_start_ms.to_string();
        let end_timestamp = window_end_ms.to_string();
        let params = [
            ("sort", "-timestamp"),
            ("limit", "50"),
            ("start", "0"),
            ("direction", "2"),
            ("db_version", "1"),
            ("trc20Id", self.config.contract_id.as_str()),
            ("address", wallet),
            ("start_timestamp", start_timestamp.as_str()),
            ("end_timestamp", end_timestamp.as_str()),
        ];
        trace!("⛓️ Fetching TRC20 transfers for {wallet} over [{window_start_ms} ~ {window_end_ms}]");
        let response = self
            .client
            .get(&self.config.api_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| LedgerApiError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| LedgerApiError::Transport(e.to_string()))?;
            return Err(LedgerApiError::QueryError { status, message });
        }
        let page =
            response.json::<Trc20TransferPage>().await.map_err(|e| LedgerApiError::JsonError(e.to_string()))?;
        debug!("⛓️ Tronscan returned {} transfer records for {wallet}", page.page_size);
        Ok(page.data)
    }
}
