//! Yahoo Finance backed [`Market`], with TradingView (signals, index members)
//! and TCMB EVDS filling the gaps Yahoo does not cover.

mod chart;
mod search;
mod summary;

use crate::evds;
use crate::frame::{Frame, RowKey};
use crate::market::{Connector, Market};
use crate::period::{yahoo_interval, yahoo_range};
use crate::reply::{FastInfo, Reply};
use crate::settings::Settings;
use crate::symbol::{self, Metal, GRAMS_PER_OUNCE};
use crate::tradingview;
use crate::value::{Datum, Mapping, Scalar};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_stream::{self as stream, StreamExt};
use tracing::{debug, error, trace, warn};

use chart::{merge_histories, ChartResult};
use summary::Statement;

/// Error block Yahoo attaches to its envelopes.
#[derive(Deserialize, Debug)]
pub(crate) struct ApiError {
    pub code: Option<String>,
    pub description: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.code.as_deref().unwrap_or("Error"),
            self.description.as_deref().unwrap_or("no description")
        )
    }
}

/// Decode a Yahoo envelope.
///
/// Error statuses usually still carry a JSON error block, which names the
/// problem better than the status does; the status is reported only when the
/// body is not an envelope (rate limiting, HTML error pages).
pub(crate) fn decode<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
    symbol: &str,
    url: &str,
) -> Result<T> {
    match serde_json::from_slice::<T>(body) {
        Ok(data) => Ok(data),
        Err(e) if !status.is_success() => {
            error!("[{symbol}] HTTP {status}, unreadable body: {e}\nURL: {url}");
            bail!("[{symbol}] Yahoo Finance responded with HTTP {status}")
        }
        Err(e) => {
            error!("[{symbol}] deserialization error: {e}\nURL: {url}");
            Err(e.into())
        }
    }
}

/// Builds a [`Yahoo`] handle per request.
#[derive(Debug, Clone)]
pub struct YahooConnector {
    settings: Arc<Settings>,
}

impl YahooConnector {
    pub fn new(settings: Settings) -> Self {
        YahooConnector {
            settings: Arc::new(settings),
        }
    }
}

impl Connector for YahooConnector {
    fn connect(&self) -> Result<Box<dyn Market>> {
        Ok(Box::new(Yahoo::new(self.settings.clone())?))
    }
}

/// One request's worth of upstream access: its own client, cookie jar and crumb.
pub struct Yahoo {
    client: Client,
    settings: Arc<Settings>,
    crumb: OnceCell<String>,
}

impl Yahoo {
    pub fn new(settings: Arc<Settings>) -> Result<Self> {
        Ok(Yahoo {
            client: settings.http_client()?,
            settings,
            crumb: OnceCell::new(),
        })
    }

    async fn chart(&self, symbol: &str, interval: &str, range: &str) -> Result<ChartResult> {
        let time = std::time::Instant::now();
        let result = chart::fetch(&self.client, symbol, interval, range).await?;
        debug!(
            "[{symbol}] chart fetched. Elapsed time: {} ms",
            time.elapsed().as_millis()
        );
        Ok(result)
    }

    async fn prices(&self, symbol: &str, period: &str, interval: &str) -> Result<Frame> {
        let result = self
            .chart(symbol, &yahoo_interval(interval), &yahoo_range(period))
            .await?;
        Ok(result.history())
    }

    async fn events(&self, symbol: &str) -> Result<ChartResult> {
        self.chart(&symbol::equity(symbol, &self.settings), "1mo", "max")
            .await
    }

    async fn summary(&self, symbol: &str, modules: &[&str]) -> Result<Mapping> {
        let crumb = self
            .crumb
            .get_or_try_init(|| summary::crumb(&self.client))
            .await?;
        let symbol = symbol::equity(symbol, &self.settings);
        summary::fetch(&self.client, crumb, &symbol, modules).await
    }

    async fn statement(&self, symbol: &str, kind: Statement, quarterly: bool) -> Result<Option<Frame>> {
        let (module, _) = kind.module(quarterly);
        let data = self.summary(symbol, &[module]).await?;
        Ok(summary::statement(&data, kind, quarterly))
    }

    fn evds_key(&self) -> Result<&str> {
        self.settings
            .evds_key
            .as_deref()
            .ok_or_else(|| anyhow!("EVDS_API_KEY is not configured"))
    }

    async fn usd_rate(&self) -> Result<ChartResult> {
        let pair = symbol::currency("USD", &self.settings);
        self.chart(&pair, "1d", "5d").await
    }

    /// Precious metal priced per ounce in USD, or per gram in the quote currency.
    async fn metal_current(&self, kind: &str, metal: Metal) -> Result<Mapping> {
        let future = self.chart(metal.future, "1d", "5d").await?;
        let mut current = future.current();
        current.insert("unit", "ounce");
        if !metal.per_gram {
            return Ok(current);
        }

        let fx = self.usd_rate().await?;
        let rate = fx
            .meta
            .regular_market_price
            .ok_or_else(|| anyhow!("no USD rate to price {kind}"))?;
        let previous_rate = fx.meta.previous_close().unwrap_or(rate);
        let per_gram = |v: Option<f64>, r: f64| v.map(|v| v * r / GRAMS_PER_OUNCE);

        let last = per_gram(future.meta.regular_market_price, rate);
        let previous = per_gram(future.meta.previous_close(), previous_rate);
        let change = last.zip(previous).map(|(l, p)| l - p);

        let mut out = Mapping::new();
        out.insert("last", last);
        out.insert("high", per_gram(future.meta.regular_market_day_high, rate));
        out.insert("low", per_gram(future.meta.regular_market_day_low, rate));
        out.insert("previousClose", previous);
        out.insert("change", change);
        out.insert(
            "changePercent",
            change.zip(previous).map(|(c, p)| c / p * 100.0),
        );
        out.insert("usdRate", rate);
        out.insert("currency", self.settings.quote_currency.as_str());
        out.insert("unit", "gram");
        Ok(out)
    }

    async fn metal_history(&self, metal: Metal, period: &str, interval: &str) -> Result<Frame> {
        let ounces = self.prices(metal.future, period, interval).await?;
        if !metal.per_gram {
            return Ok(ounces);
        }
        let pair = symbol::currency("USD", &self.settings);
        let fx = self.prices(&pair, period, interval).await?;
        Ok(per_gram(&ounces, &fx))
    }
}

/// Rescale an ounce-priced OHLC table to grams in the quote currency, using
/// the FX close of the same day (or the latest earlier one).
fn per_gram(ounces: &Frame, fx: &Frame) -> Frame {
    let rates: BTreeMap<NaiveDate, f64> = fx
        .rows()
        .filter_map(|row| {
            let day = row.key.as_time()?.date_naive();
            let close = row.get("Close").and_then(Scalar::as_f64)?;
            close.is_finite().then_some((day, close))
        })
        .collect();

    let names: Vec<String> = ounces.column_names().map(String::from).collect();
    let mut out = Frame::new(names.clone());
    for row in ounces.rows() {
        let rate = row
            .key
            .as_time()
            .and_then(|t| rates.range(..=t.date_naive()).next_back())
            .map(|(_, r)| *r)
            .unwrap_or(f64::NAN);
        let values = names
            .iter()
            .map(|name| match row.get(name) {
                Some(Scalar::Float(v)) if name != "Volume" => {
                    Scalar::Float(v * rate / GRAMS_PER_OUNCE)
                }
                Some(other) => other.clone(),
                None => Scalar::Null,
            })
            .collect();
        out.push_row(row.key.clone(), values);
    }
    out
}

#[async_trait]
impl Market for Yahoo {
    async fn fast_info(&self, symbol: &str) -> Result<FastInfo> {
        let ticker = symbol::equity(symbol, &self.settings);
        let mut info = self.chart(&ticker, "1d", "1d").await?.fast_info();
        match self
            .summary(symbol, &["price", "summaryDetail", "defaultKeyStatistics"])
            .await
        {
            Ok(data) => {
                info.market_cap = summary::market_cap(&data);
                info.pe_ratio = summary::pe_ratio(&data);
            }
            Err(e) => warn!("[{ticker}] valuation fields left empty: {e:#}"),
        }
        Ok(info)
    }

    async fn history(&self, symbol: &str, period: &str, interval: &str) -> Result<Frame> {
        self.prices(&symbol::equity(symbol, &self.settings), period, interval)
            .await
    }

    async fn balance_sheet(&self, symbol: &str, quarterly: bool) -> Result<Option<Frame>> {
        self.statement(symbol, Statement::BalanceSheet, quarterly).await
    }

    async fn income_stmt(&self, symbol: &str, quarterly: bool) -> Result<Option<Frame>> {
        self.statement(symbol, Statement::Income, quarterly).await
    }

    async fn cashflow(&self, symbol: &str, quarterly: bool) -> Result<Option<Frame>> {
        self.statement(symbol, Statement::Cashflow, quarterly).await
    }

    async fn dividends(&self, symbol: &str) -> Result<Option<Frame>> {
        Ok(self.events(symbol).await?.dividends())
    }

    async fn splits(&self, symbol: &str) -> Result<Option<Frame>> {
        Ok(self.events(symbol).await?.splits())
    }

    async fn analyst_price_targets(&self, symbol: &str) -> Result<Reply> {
        let data = self.summary(symbol, &["financialData"]).await?;
        Ok(summary::price_targets(&data))
    }

    async fn recommendations_summary(&self, symbol: &str) -> Result<Reply> {
        let data = self.summary(symbol, &["recommendationTrend"]).await?;
        Ok(summary::recommendation_trend(&data))
    }

    async fn news(&self, symbol: &str) -> Result<Reply> {
        search::news(&self.client, &symbol::equity(symbol, &self.settings)).await
    }

    async fn info(&self, symbol: &str) -> Result<Reply> {
        let data = self.summary(symbol, &summary::INFO_MODULES).await?;
        Ok(Reply::from(summary::info(&data)))
    }

    async fn ta_signals(&self, symbol: &str, timeframe: &str) -> Result<Reply> {
        let tv_symbol = symbol::tradingview(symbol, &self.settings);
        let signals = tradingview::fetch(
            &self.client,
            &self.settings.tv_screener,
            &tv_symbol,
            timeframe,
        )
        .await?;
        Ok(Reply::from(signals))
    }

    async fn fx_current(&self, code: &str) -> Result<Reply> {
        if let Some(metal) = symbol::metal(code) {
            return Ok(Reply::from(self.metal_current(code, metal).await?));
        }
        let pair = symbol::currency(code, &self.settings);
        Ok(Reply::from(self.chart(&pair, "1d", "5d").await?.current()))
    }

    async fn fx_history(&self, code: &str, period: &str, interval: &str) -> Result<Frame> {
        if let Some(metal) = symbol::metal(code) {
            return self.metal_history(metal, period, interval).await;
        }
        let pair = symbol::currency(code, &self.settings);
        self.prices(&pair, period, interval).await
    }

    async fn index_info(&self, code: &str) -> Result<Reply> {
        let index = symbol::equity(code, &self.settings);
        Ok(Reply::from(self.chart(&index, "1d", "5d").await?.current()))
    }

    async fn index_history(&self, code: &str, period: &str, interval: &str) -> Result<Frame> {
        self.prices(&symbol::equity(code, &self.settings), period, interval)
            .await
    }

    async fn index_components(&self, code: &str) -> Result<Reply> {
        let members = tradingview::index_members(
            &self.client,
            &self.settings.tv_screener,
            &self.settings.tv_exchange,
            code,
        )
        .await?;
        Ok(Reply::Value(Datum::List(members)))
    }

    async fn crypto_current(&self, pair: &str) -> Result<Reply> {
        let pair = symbol::crypto(pair);
        Ok(Reply::from(self.chart(&pair, "1d", "5d").await?.current()))
    }

    async fn inflation_latest(&self) -> Result<Reply> {
        let key = self.evds_key()?;
        // 13 monthly prints plus slack for late publication
        let observations = evds::fetch_recent(&self.client, key, evds::CPI_SERIES, 500).await?;
        Ok(Reply::from(evds::latest_inflation(&observations)?))
    }

    async fn bond_yields(&self) -> Result<Reply> {
        let mut frame = Frame::new(["name", "yield", "previousClose", "change"]);
        let mut symbols = stream::iter(&self.settings.bond_symbols);
        while let Some(symbol) = symbols.next().await {
            let meta = self.chart(symbol, "1d", "5d").await?.meta;
            let last = meta.regular_market_price;
            let previous = meta.previous_close();
            let name = meta.short_name.or(meta.long_name).unwrap_or_else(|| symbol.clone());
            frame.push_row(
                RowKey::Label(symbol.clone()),
                vec![
                    Scalar::Text(name),
                    last.into(),
                    previous.into(),
                    last.zip(previous).map(|(l, p)| l - p).into(),
                ],
            );
        }
        Ok(Reply::from(frame))
    }

    async fn download(&self, symbols: &[String], period: &str) -> Result<Option<Frame>> {
        let range = yahoo_range(period);
        let mut histories = Vec::with_capacity(symbols.len());
        let mut stream = stream::iter(symbols);
        while let Some(sym) = stream.next().await {
            let ticker = symbol::equity(sym, &self.settings);
            let frame = self
                .chart(&ticker, "1d", &range)
                .await
                .with_context(|| format!("download failed for {sym}"))?
                .history();
            trace!("[{sym}] {} bars downloaded", frame.len());
            histories.push((sym.clone(), frame));
        }
        if histories.is_empty() {
            return Ok(None);
        }
        Ok(Some(merge_histories(&histories)))
    }

    async fn policy_rate(&self) -> Result<Scalar> {
        let key = self.evds_key()?;
        let observations =
            evds::fetch_recent(&self.client, key, &self.settings.policy_rate_series, 730).await?;
        Ok(evds::latest_value(&observations))
    }
}
