//! Signed REST client for Binance USD-M futures.

use quoter_core::{ClientOrderId, OrderId, OrderParams, PositionLeg, RestingOrder, Size};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::signer::{signed_query, timestamp_ms};
use super::wire::{
    net_position, position_legs, ApiErrorWire, BatchEntryWire, ListenKeyWire, NewOrderWire,
    OpenOrderWire, PositionRiskWire,
};
use super::{BinanceConfig, MAX_CANCEL_CHUNK, MAX_SUBMIT_CHUNK};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{BoxFuture, ExchangeGateway, ItemResult};

const OPEN_ORDERS_PATH: &str = "/fapi/v1/openOrders";
const POSITION_RISK_PATH: &str = "/fapi/v2/positionRisk";
const BATCH_ORDERS_PATH: &str = "/fapi/v1/batchOrders";
const LISTEN_KEY_PATH: &str = "/fapi/v1/listenKey";

/// Gateway backed by the Binance USD-M futures REST API.
pub struct BinanceGateway {
    client: Client,
    config: BinanceConfig,
}

impl std::fmt::Debug for BinanceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceGateway")
            .field("rest_url", &self.config.rest_url)
            .field("symbol", &self.config.symbol)
            .finish_non_exhaustive()
    }
}

impl BinanceGateway {
    pub fn new(config: BinanceConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        info!(
            rest_url = %config.rest_url,
            symbol = %config.symbol,
            "Binance gateway created"
        );
        Ok(Self { client, config })
    }

    fn url(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}{}", self.config.rest_url, path)
        } else {
            format!("{}{}?{}", self.config.rest_url, path, query)
        }
    }

    /// Send a signed request and decode the JSON body.
    async fn signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> GatewayResult<T> {
        let query = signed_query(
            &self.config.api_secret,
            params,
            timestamp_ms(),
            self.config.recv_window_ms,
        )?;
        self.send(method, &self.url(path, &query)).await
    }

    /// Send an API-key-only request (listen key endpoints).
    async fn keyed<T: DeserializeOwned>(&self, method: Method, path: &str) -> GatewayResult<T> {
        self.send(method, &self.url(path, "")).await
    }

    async fn send<T: DeserializeOwned>(&self, method: Method, url: &str) -> GatewayResult<T> {
        let response = self
            .client
            .request(method, url)
            .header("X-MBX-APIKEY", &self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(match serde_json::from_str::<ApiErrorWire>(&body) {
                Ok(err) => GatewayError::Api {
                    code: err.code,
                    msg: err.msg,
                },
                Err(_) => GatewayError::HttpClient(format!("HTTP {status}: {body}")),
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| GatewayError::Parse(format!("{e}: {body}")))
    }

    async fn fetch_open_orders(&self) -> GatewayResult<Vec<RestingOrder>> {
        let wire: Vec<OpenOrderWire> = self
            .signed(
                Method::GET,
                OPEN_ORDERS_PATH,
                &[("symbol", self.config.symbol.clone())],
            )
            .await?;

        let mut orders = Vec::with_capacity(wire.len());
        for entry in wire {
            if entry.symbol != self.config.symbol {
                continue;
            }
            let order = entry.into_resting()?;
            if order.status.is_open() {
                orders.push(order);
            }
        }
        debug!(count = orders.len(), "Fetched open orders");
        Ok(orders)
    }

    async fn fetch_position_risk(&self) -> GatewayResult<Vec<PositionRiskWire>> {
        self.signed(
            Method::GET,
            POSITION_RISK_PATH,
            &[("symbol", self.config.symbol.clone())],
        )
        .await
    }

    async fn fetch_position(&self) -> GatewayResult<Size> {
        let wire = self.fetch_position_risk().await?;
        Ok(net_position(&wire, &self.config.symbol)?)
    }

    async fn fetch_position_legs(&self) -> GatewayResult<Vec<PositionLeg>> {
        let wire = self.fetch_position_risk().await?;
        Ok(position_legs(&wire, &self.config.symbol)?)
    }

    async fn cancel_chunk(&self, ids: &[OrderId]) -> GatewayResult<Vec<ItemResult>> {
        let list = serde_json::to_string(&ids.iter().map(OrderId::get).collect::<Vec<_>>())?;
        let entries: Vec<BatchEntryWire> = self
            .signed(
                Method::DELETE,
                BATCH_ORDERS_PATH,
                &[
                    ("symbol", self.config.symbol.clone()),
                    ("orderIdList", list),
                ],
            )
            .await?;
        Ok(entries.into_iter().map(ItemResult::from).collect())
    }

    async fn submit_chunk(&self, orders: &[OrderParams]) -> GatewayResult<Vec<ItemResult>> {
        let batch: Vec<NewOrderWire> = orders
            .iter()
            .map(|p| NewOrderWire::from_params(&self.config.symbol, p, ClientOrderId::new()))
            .collect();
        let entries: Vec<BatchEntryWire> = self
            .signed(
                Method::POST,
                BATCH_ORDERS_PATH,
                &[("batchOrders", serde_json::to_string(&batch)?)],
            )
            .await?;
        Ok(entries.into_iter().map(ItemResult::from).collect())
    }

    /// Cancel in chunks; a failed chunk is logged and its items reported as
    /// rejected so results stay aligned with the input.
    async fn cancel_all(&self, ids: Vec<OrderId>) -> GatewayResult<Vec<ItemResult>> {
        let mut results = Vec::with_capacity(ids.len());
        let mut last_err = None;
        for chunk in ids.chunks(MAX_CANCEL_CHUNK) {
            match self.cancel_chunk(chunk).await {
                Ok(items) => results.extend(items),
                Err(e) => {
                    warn!(error = %e, count = chunk.len(), "Cancel chunk failed");
                    results.extend(chunk.iter().map(|_| rejected_by(&e)));
                    last_err = Some(e);
                }
            }
        }
        all_failed_or(results, last_err)
    }

    async fn submit_all(&self, orders: Vec<OrderParams>) -> GatewayResult<Vec<ItemResult>> {
        let mut results = Vec::with_capacity(orders.len());
        let mut last_err = None;
        for chunk in orders.chunks(MAX_SUBMIT_CHUNK) {
            match self.submit_chunk(chunk).await {
                Ok(items) => results.extend(items),
                Err(e) => {
                    warn!(error = %e, count = chunk.len(), "Submit chunk failed");
                    results.extend(chunk.iter().map(|_| rejected_by(&e)));
                    last_err = Some(e);
                }
            }
        }
        all_failed_or(results, last_err)
    }
}

fn rejected_by(err: &GatewayError) -> ItemResult {
    let code = match err {
        GatewayError::Api { code, .. } => *code,
        _ => 0,
    };
    ItemResult::Rejected {
        code,
        msg: err.to_string(),
    }
}

/// If every chunk failed, surface the error instead of per-item rejections.
fn all_failed_or(
    results: Vec<ItemResult>,
    last_err: Option<GatewayError>,
) -> GatewayResult<Vec<ItemResult>> {
    match last_err {
        Some(e) if !results.iter().any(ItemResult::is_accepted) => Err(e),
        _ => Ok(results),
    }
}

impl ExchangeGateway for BinanceGateway {
    fn instrument(&self) -> &str {
        &self.config.symbol
    }

    fn list_open_orders(&self) -> BoxFuture<'_, GatewayResult<Vec<RestingOrder>>> {
        Box::pin(self.fetch_open_orders())
    }

    fn get_position(&self) -> BoxFuture<'_, GatewayResult<Size>> {
        Box::pin(self.fetch_position())
    }

    fn get_position_legs(&self) -> BoxFuture<'_, GatewayResult<Vec<PositionLeg>>> {
        Box::pin(self.fetch_position_legs())
    }

    fn cancel_batch(&self, ids: Vec<OrderId>) -> BoxFuture<'_, GatewayResult<Vec<ItemResult>>> {
        Box::pin(self.cancel_all(ids))
    }

    fn submit_batch(
        &self,
        orders: Vec<OrderParams>,
    ) -> BoxFuture<'_, GatewayResult<Vec<ItemResult>>> {
        Box::pin(self.submit_all(orders))
    }

    fn get_listen_key(&self) -> BoxFuture<'_, GatewayResult<String>> {
        Box::pin(async move {
            let wire: ListenKeyWire = self.keyed(Method::POST, LISTEN_KEY_PATH).await?;
            Ok(wire.listen_key)
        })
    }

    fn keepalive_listen_key(&self) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async move {
            let _: serde_json::Value = self.keyed(Method::PUT, LISTEN_KEY_PATH).await?;
            debug!("Listen key kept alive");
            Ok(())
        })
    }
}
