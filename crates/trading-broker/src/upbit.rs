//! Upbit REST integration for live trading.

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use reqwest::{header, Client, RequestBuilder, StatusCode};
use rust_decimal::prelude::RoundingStrategy;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};
use trading_core::error::ExchangeError;
use trading_core::traits::{Exchange, MarketData};
use trading_core::types::{
    AccountSnapshot, Bar, CandleInterval, Holding, Instrument, OrderAck, OrderIntent,
};

use crate::auth::{query_string, Credentials};

/// Upbit returns at most this many candles per request.
pub const MAX_CANDLES: usize = 200;

/// Connection settings for the Upbit API.
#[derive(Debug, Clone)]
pub struct UpbitConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for UpbitConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.upbit.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpbitCandle {
    candle_date_time_utc: Option<String>,
    opening_price: f64,
    high_price: f64,
    low_price: f64,
    trade_price: f64,
    timestamp: i64,
    candle_acc_trade_volume: f64,
}

impl UpbitCandle {
    fn into_bar(self) -> Bar {
        let ts = self
            .candle_date_time_utc
            .as_deref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok())
            .map(|dt| Utc.from_utc_datetime(&dt).timestamp_millis())
            .unwrap_or(self.timestamp);
        Bar::new(
            ts,
            self.opening_price,
            self.high_price,
            self.low_price,
            self.trade_price,
            self.candle_acc_trade_volume,
        )
    }
}

#[derive(Debug, Deserialize)]
struct UpbitTicker {
    market: String,
    trade_price: f64,
}

#[derive(Debug, Deserialize)]
struct UpbitAccount {
    currency: String,
    balance: Decimal,
    locked: Decimal,
    avg_buy_price: Decimal,
}

#[derive(Debug)]
struct CreateOrderRequest {
    market: String,
    side: &'static str,
    ord_type: &'static str,
    price: Option<String>,
    volume: Option<String>,
}

impl CreateOrderRequest {
    /// Parameters in the order they are hashed for signing and sent.
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("market", self.market.clone()),
            ("side", self.side.to_string()),
        ];
        if let Some(volume) = &self.volume {
            params.push(("volume", volume.clone()));
        }
        if let Some(price) = &self.price {
            params.push(("price", price.clone()));
        }
        params.push(("ord_type", self.ord_type.to_string()));
        params
    }
}

/// JSON object with the fields in the given order.
struct OrderBody<'a>(&'a [(&'static str, String)]);

impl Serialize for OrderBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

#[derive(Debug, Deserialize)]
struct UpbitOrder {
    uuid: String,
}

#[derive(Debug, Deserialize)]
struct UpbitErrorBody {
    error: UpbitErrorDetail,
}

#[derive(Debug, Deserialize)]
struct UpbitErrorDetail {
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
}

/// Which error bucket a failed call falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Data,
    Order,
}

fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}

/// Format a quantity the way the order endpoint accepts it.
fn format_volume(quantity: Decimal) -> String {
    quantity
        .round_dp_with_strategy(8, RoundingStrategy::ToZero)
        .normalize()
        .to_string()
}

fn map_status(kind: CallKind, status: StatusCode, body: &str) -> ExchangeError {
    let detail = serde_json::from_str::<UpbitErrorBody>(body)
        .map(|b| format!("{} ({})", b.error.message, b.error.name))
        .unwrap_or_else(|_| body.to_string());
    let msg = format!("{}: {}", status, detail);

    match status {
        StatusCode::UNAUTHORIZED => ExchangeError::Authentication(msg),
        StatusCode::TOO_MANY_REQUESTS => ExchangeError::RateLimited(msg),
        _ => match kind {
            CallKind::Data => ExchangeError::DataUnavailable(msg),
            CallKind::Order => ExchangeError::OrderRejected(msg),
        },
    }
}

fn map_transport(kind: CallKind, err: reqwest::Error) -> ExchangeError {
    match kind {
        CallKind::Data => ExchangeError::DataUnavailable(err.to_string()),
        CallKind::Order => ExchangeError::OrderRejected(err.to_string()),
    }
}

/// Upbit exchange client.
///
/// Public endpoints work without credentials; balances and orders need
/// [`Credentials`].
pub struct UpbitClient {
    config: UpbitConfig,
    client: Client,
    credentials: Option<Credentials>,
}

impl UpbitClient {
    /// Client for public market data only.
    pub fn public(config: UpbitConfig) -> Result<Self, ExchangeError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExchangeError::DataUnavailable(e.to_string()))?;

        Ok(Self {
            config,
            client,
            credentials: None,
        })
    }

    /// Client with account access.
    pub fn new(config: UpbitConfig, credentials: Credentials) -> Result<Self, ExchangeError> {
        let mut client = Self::public(config)?;
        client.credentials = Some(credentials);
        Ok(client)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, req: RequestBuilder, query: Option<&str>) -> Result<RequestBuilder, ExchangeError> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or_else(|| ExchangeError::Authentication("no API credentials configured".into()))?;
        Ok(req.header(header::AUTHORIZATION, creds.bearer(query)?))
    }

    async fn send<T: DeserializeOwned>(&self, kind: CallKind, req: RequestBuilder) -> Result<T, ExchangeError> {
        let resp = req.send().await.map_err(|e| map_transport(kind, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(map_status(kind, status, &text));
        }

        resp.json().await.map_err(|e| map_transport(kind, e))
    }

    async fn tickers(&self, instruments: &[Instrument]) -> Result<Vec<UpbitTicker>, ExchangeError> {
        let markets = instruments
            .iter()
            .map(|i| i.symbol())
            .collect::<Vec<_>>()
            .join(",");
        let req = self.client.get(self.url("ticker")).query(&[("markets", markets)]);
        self.send(CallKind::Data, req).await
    }

    async fn place(&self, request: CreateOrderRequest, intent: OrderIntent) -> Result<OrderAck, ExchangeError> {
        let params = request.params();
        let query = query_string(&params);
        let req = self.client.post(self.url("orders")).json(&OrderBody(&params));
        let req = self.authorize(req, Some(&query))?;

        let order: UpbitOrder = self.send(CallKind::Order, req).await?;
        info!(
            order_id = %order.uuid,
            instrument = %intent.instrument,
            side = %intent.side,
            amount = %intent.amount,
            "Order accepted"
        );
        Ok(OrderAck::accepted(order.uuid, intent))
    }
}

#[async_trait]
impl MarketData for UpbitClient {
    async fn candles(
        &self,
        instrument: &Instrument,
        interval: CandleInterval,
        count: usize,
    ) -> Result<Vec<Bar>, ExchangeError> {
        let count = count.clamp(1, MAX_CANDLES);
        let url = self.url(&format!("candles/{}", interval.endpoint()));
        let req = self.client.get(&url).query(&[
            ("market", instrument.symbol().to_string()),
            ("count", count.to_string()),
        ]);

        let raw: Vec<UpbitCandle> = self.send(CallKind::Data, req).await?;
        if raw.is_empty() {
            return Err(ExchangeError::DataUnavailable(format!(
                "no {} candles for {}",
                interval, instrument
            )));
        }

        // newest first on the wire
        let mut bars: Vec<Bar> = raw.into_iter().map(UpbitCandle::into_bar).collect();
        bars.reverse();
        debug!(instrument = %instrument, interval = %interval, bars = bars.len(), "Fetched candles");
        Ok(bars)
    }

    async fn current_price(&self, instrument: &Instrument) -> Result<Option<Decimal>, ExchangeError> {
        let tickers = self.tickers(std::slice::from_ref(instrument)).await?;
        Ok(tickers
            .into_iter()
            .find(|t| t.market == instrument.symbol())
            .and_then(|t| decimal_from_f64(t.trade_price)))
    }

    async fn current_prices(&self, instruments: &[Instrument]) -> HashMap<String, Decimal> {
        if instruments.is_empty() {
            return HashMap::new();
        }

        match self.tickers(instruments).await {
            Ok(tickers) => tickers
                .into_iter()
                .filter_map(|t| decimal_from_f64(t.trade_price).map(|p| (t.market, p)))
                .collect(),
            Err(e) => {
                // one unknown market fails the whole batch
                warn!(error = %e, "Batched ticker failed, falling back to per-market requests");
                let mut prices = HashMap::with_capacity(instruments.len());
                for instrument in instruments {
                    if let Ok(Some(price)) = self.current_price(instrument).await {
                        prices.insert(instrument.symbol().to_string(), price);
                    }
                }
                prices
            }
        }
    }
}

#[async_trait]
impl Exchange for UpbitClient {
    async fn balances(&self) -> Result<AccountSnapshot, ExchangeError> {
        let req = self.authorize(self.client.get(self.url("accounts")), None)?;
        let accounts: Vec<UpbitAccount> = self.send(CallKind::Data, req).await?;

        Ok(AccountSnapshot::new(accounts.into_iter().map(|a| Holding {
            currency: a.currency,
            balance: a.balance,
            locked: a.locked,
            avg_cost: a.avg_buy_price,
        })))
    }

    async fn market_buy(&self, instrument: &Instrument, notional: Decimal) -> Result<OrderAck, ExchangeError> {
        let price = notional.trunc();
        if price <= Decimal::ZERO {
            return Err(ExchangeError::OrderRejected(format!(
                "buy notional {} rounds to zero",
                notional
            )));
        }
        let request = CreateOrderRequest {
            market: instrument.symbol().to_string(),
            side: "bid",
            ord_type: "price",
            price: Some(price.to_string()),
            volume: None,
        };
        self.place(request, OrderIntent::buy(instrument.clone(), price)).await
    }

    async fn market_sell(&self, instrument: &Instrument, quantity: Decimal) -> Result<OrderAck, ExchangeError> {
        if quantity <= Decimal::ZERO {
            return Err(ExchangeError::OrderRejected(format!(
                "sell quantity {} is not positive",
                quantity
            )));
        }
        let request = CreateOrderRequest {
            market: instrument.symbol().to_string(),
            side: "ask",
            ord_type: "market",
            price: None,
            volume: Some(format_volume(quantity)),
        };
        self.place(request, OrderIntent::sell(instrument.clone(), quantity)).await
    }

    fn name(&self) -> &str {
        "Upbit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_candle_parsing_uses_open_time() {
        let json = r#"[{
            "market": "KRW-BTC",
            "candle_date_time_utc": "2024-03-01T00:15:00",
            "candle_date_time_kst": "2024-03-01T09:15:00",
            "opening_price": 90000000.0,
            "high_price": 91000000.0,
            "low_price": 89500000.0,
            "trade_price": 90500000.0,
            "timestamp": 1709252399000,
            "candle_acc_trade_price": 1.0,
            "candle_acc_trade_volume": 12.5,
            "unit": 15
        }]"#;
        let raw: Vec<UpbitCandle> = serde_json::from_str(json).unwrap();
        let bar = raw.into_iter().next().unwrap().into_bar();
        assert_eq!(bar.close, 90500000.0);
        assert_eq!(bar.volume, 12.5);
        assert_eq!(bar.timestamp, 1709252100000);
    }

    #[test]
    fn test_account_parsing() {
        let json = r#"[
            {"currency":"KRW","balance":"1000000.0","locked":"0.0","avg_buy_price":"0","avg_buy_price_modified":false,"unit_currency":"KRW"},
            {"currency":"BTC","balance":"0.0015","locked":"0.0","avg_buy_price":"90000000","avg_buy_price_modified":false,"unit_currency":"KRW"}
        ]"#;
        let raw: Vec<UpbitAccount> = serde_json::from_str(json).unwrap();
        assert_eq!(raw[1].balance, dec!(0.0015));
        assert_eq!(raw[1].avg_buy_price, dec!(90000000));
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{"error":{"name":"insufficient_funds_bid","message":"not enough KRW"}}"#;
        let err = map_status(CallKind::Order, StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, ExchangeError::OrderRejected(ref m) if m.contains("insufficient_funds_bid")));

        let err = map_status(CallKind::Data, StatusCode::NOT_FOUND, "gone");
        assert!(matches!(err, ExchangeError::DataUnavailable(_)));

        let err = map_status(CallKind::Data, StatusCode::UNAUTHORIZED, "{}");
        assert!(err.is_fatal());

        let err = map_status(CallKind::Order, StatusCode::TOO_MANY_REQUESTS, "");
        assert!(matches!(err, ExchangeError::RateLimited(_)));
    }

    #[test]
    fn test_order_params() {
        let buy = CreateOrderRequest {
            market: "KRW-BTC".into(),
            side: "bid",
            ord_type: "price",
            price: Some("10000".into()),
            volume: None,
        };
        assert_eq!(
            query_string(&buy.params()),
            "market=KRW-BTC&side=bid&price=10000&ord_type=price"
        );
        let body = serde_json::to_value(OrderBody(&buy.params())).unwrap();
        assert!(body.get("volume").is_none());
    }

    #[test]
    fn test_order_body_follows_signed_query() {
        let sell = CreateOrderRequest {
            market: "KRW-ETH".into(),
            side: "ask",
            ord_type: "market",
            price: None,
            volume: Some(format_volume(dec!(0.123456789))),
        };
        let params = sell.params();
        let body = serde_json::to_string(&OrderBody(&params)).unwrap();
        assert_eq!(
            body,
            r#"{"market":"KRW-ETH","side":"ask","volume":"0.12345678","ord_type":"market"}"#
        );

        // same fields, same order as the hashed query
        let keys: Vec<&str> = body
            .trim_matches(|c| c == '{' || c == '}')
            .split(',')
            .filter_map(|kv| kv.split(':').next())
            .map(|k| k.trim_matches('"'))
            .collect();
        let query = query_string(&params);
        let query_keys: Vec<&str> = query.split('&').filter_map(|kv| kv.split('=').next()).collect();
        assert_eq!(keys, query_keys);
    }

    #[test]
    fn test_volume_truncates() {
        assert_eq!(format_volume(dec!(0.123456789)), "0.12345678");
        assert_eq!(format_volume(dec!(1.50000000)), "1.5");
    }

    #[test]
    fn test_decimal_from_f64() {
        assert_eq!(decimal_from_f64(95000000.0), Some(dec!(95000000)));
        assert_eq!(decimal_from_f64(0.25), Some(dec!(0.25)));
        assert_eq!(decimal_from_f64(f64::NAN), None);
    }

    #[tokio::test]
    async fn test_private_call_without_credentials() {
        let client = UpbitClient::public(UpbitConfig::default()).unwrap();
        let err = client.balances().await.unwrap_err();
        assert!(matches!(err, ExchangeError::Authentication(_)));
    }
}
