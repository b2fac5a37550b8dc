//! In-memory market behind the routes, for handler tests.

use super::routes;
use actix_web::{dev::ServiceResponse, http::StatusCode, test, web, App};
use anyhow::{bail, Result};
use argus_market::{Connector, FastInfo, Frame, Market, Reply, RowKey, Scalar};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct FakeMarket {
    pub fail: bool,
    pub fast_info: Option<FastInfo>,
    pub history: Frame,
    pub statement: Option<Frame>,
    pub events: Option<Frame>,
    pub price_targets: Option<Reply>,
    pub recommendations: Option<Reply>,
    pub news: Option<Reply>,
    pub info: Option<Reply>,
    pub signals: Option<Reply>,
    pub current: Option<Reply>,
    pub index_info: Option<Reply>,
    pub components: Option<Reply>,
    pub inflation: Option<Reply>,
    pub bonds: Option<Reply>,
    pub download: Option<Frame>,
    pub policy_rate: Option<Scalar>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl FakeMarket {
    fn record(&self, call: String) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.fail {
            bail!("upstream unavailable");
        }
        Ok(())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

fn or_missing(reply: &Option<Reply>) -> Reply {
    reply.clone().unwrap_or(Reply::Missing)
}

#[async_trait]
impl Market for FakeMarket {
    async fn fast_info(&self, symbol: &str) -> Result<FastInfo> {
        self.record(format!("fast_info:{symbol}"))?;
        match &self.fast_info {
            Some(fi) => Ok(fi.clone()),
            None => bail!("no quote for {symbol}"),
        }
    }

    async fn history(&self, symbol: &str, period: &str, interval: &str) -> Result<Frame> {
        self.record(format!("history:{symbol}:{period}:{interval}"))?;
        Ok(self.history.clone())
    }

    async fn balance_sheet(&self, symbol: &str, quarterly: bool) -> Result<Option<Frame>> {
        self.record(format!("balance_sheet:{symbol}:{quarterly}"))?;
        Ok(self.statement.clone())
    }

    async fn income_stmt(&self, symbol: &str, quarterly: bool) -> Result<Option<Frame>> {
        self.record(format!("income_stmt:{symbol}:{quarterly}"))?;
        Ok(self.statement.clone())
    }

    async fn cashflow(&self, symbol: &str, quarterly: bool) -> Result<Option<Frame>> {
        self.record(format!("cashflow:{symbol}:{quarterly}"))?;
        Ok(self.statement.clone())
    }

    async fn dividends(&self, symbol: &str) -> Result<Option<Frame>> {
        self.record(format!("dividends:{symbol}"))?;
        Ok(self.events.clone())
    }

    async fn splits(&self, symbol: &str) -> Result<Option<Frame>> {
        self.record(format!("splits:{symbol}"))?;
        Ok(self.events.clone())
    }

    async fn analyst_price_targets(&self, symbol: &str) -> Result<Reply> {
        self.record(format!("analyst_price_targets:{symbol}"))?;
        Ok(or_missing(&self.price_targets))
    }

    async fn recommendations_summary(&self, symbol: &str) -> Result<Reply> {
        self.record(format!("recommendations_summary:{symbol}"))?;
        Ok(or_missing(&self.recommendations))
    }

    async fn news(&self, symbol: &str) -> Result<Reply> {
        self.record(format!("news:{symbol}"))?;
        Ok(or_missing(&self.news))
    }

    async fn info(&self, symbol: &str) -> Result<Reply> {
        self.record(format!("info:{symbol}"))?;
        Ok(or_missing(&self.info))
    }

    async fn ta_signals(&self, symbol: &str, timeframe: &str) -> Result<Reply> {
        self.record(format!("ta_signals:{symbol}:{timeframe}"))?;
        Ok(or_missing(&self.signals))
    }

    async fn fx_current(&self, code: &str) -> Result<Reply> {
        self.record(format!("fx_current:{code}"))?;
        Ok(or_missing(&self.current))
    }

    async fn fx_history(&self, code: &str, period: &str, interval: &str) -> Result<Frame> {
        self.record(format!("fx_history:{code}:{period}:{interval}"))?;
        Ok(self.history.clone())
    }

    async fn index_info(&self, code: &str) -> Result<Reply> {
        self.record(format!("index_info:{code}"))?;
        match &self.index_info {
            Some(info) => Ok(info.clone()),
            None => bail!("index info unavailable"),
        }
    }

    async fn index_history(&self, code: &str, period: &str, interval: &str) -> Result<Frame> {
        self.record(format!("index_history:{code}:{period}:{interval}"))?;
        Ok(self.history.clone())
    }

    async fn index_components(&self, code: &str) -> Result<Reply> {
        self.record(format!("index_components:{code}"))?;
        Ok(or_missing(&self.components))
    }

    async fn crypto_current(&self, pair: &str) -> Result<Reply> {
        self.record(format!("crypto_current:{pair}"))?;
        Ok(or_missing(&self.current))
    }

    async fn inflation_latest(&self) -> Result<Reply> {
        self.record("inflation_latest".to_string())?;
        Ok(or_missing(&self.inflation))
    }

    async fn bond_yields(&self) -> Result<Reply> {
        self.record("bond_yields".to_string())?;
        Ok(or_missing(&self.bonds))
    }

    async fn download(&self, symbols: &[String], period: &str) -> Result<Option<Frame>> {
        self.record(format!("download:{}:{period}", symbols.join(",")))?;
        Ok(self.download.clone())
    }

    async fn policy_rate(&self) -> Result<Scalar> {
        self.record("policy_rate".to_string())?;
        Ok(self.policy_rate.clone().unwrap_or(Scalar::Null))
    }
}

pub struct FakeConnector(pub FakeMarket);

impl Connector for FakeConnector {
    fn connect(&self) -> Result<Box<dyn Market>> {
        Ok(Box::new(self.0.clone()))
    }
}

/// Daily OHLCV frame with one row per close, starting 2024-01-02.
pub fn price_frame(closes: &[f64]) -> Frame {
    let mut frame = Frame::new(["Open", "High", "Low", "Close", "Volume"]);
    for (day, close) in closes.iter().enumerate() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2 + day as u32, 7, 0, 0).unwrap();
        frame.push_row(
            RowKey::Time(ts),
            vec![
                Scalar::Float(10.0),
                Scalar::Float(11.0),
                Scalar::Float(9.0),
                Scalar::Float(*close),
                Scalar::Int(1_000),
            ],
        );
    }
    frame
}

async fn call(market: FakeMarket, uri: &str) -> ServiceResponse {
    let connector: Arc<dyn Connector> = Arc::new(FakeConnector(market));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(connector))
            .configure(routes),
    )
    .await;
    test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await
}

/// Run one GET through the routes and decode the JSON body.
pub async fn get(market: FakeMarket, uri: &str) -> (StatusCode, Value) {
    let resp = call(market, uri).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

/// Status of one GET, body ignored.
pub async fn status(market: FakeMarket, uri: &str) -> StatusCode {
    call(market, uri).await.status()
}
