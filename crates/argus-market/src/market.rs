use crate::frame::Frame;
use crate::reply::{FastInfo, Reply};
use crate::value::Scalar;
use anyhow::Result;
use async_trait::async_trait;

/// Hands out a fresh [`Market`] handle per request.
///
/// Handles are never pooled; whatever session state an upstream needs
/// (cookies, crumbs) lives and dies with the handle.
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn Market>>;
}

/// Capability surface of a market-data source.
///
/// Symbols arrive exactly as the client sent them (upper-cased by the HTTP
/// layer); mapping them to upstream codes is the source's business.
#[async_trait]
pub trait Market: Send + Sync {
    /// Quote snapshot of an exchange ticker.
    async fn fast_info(&self, symbol: &str) -> Result<FastInfo>;

    /// OHLCV table of an exchange ticker.
    async fn history(&self, symbol: &str, period: &str, interval: &str) -> Result<Frame>;

    async fn balance_sheet(&self, symbol: &str, quarterly: bool) -> Result<Option<Frame>>;

    async fn income_stmt(&self, symbol: &str, quarterly: bool) -> Result<Option<Frame>>;

    async fn cashflow(&self, symbol: &str, quarterly: bool) -> Result<Option<Frame>>;

    async fn dividends(&self, symbol: &str) -> Result<Option<Frame>>;

    async fn splits(&self, symbol: &str) -> Result<Option<Frame>>;

    async fn analyst_price_targets(&self, symbol: &str) -> Result<Reply>;

    async fn recommendations_summary(&self, symbol: &str) -> Result<Reply>;

    async fn news(&self, symbol: &str) -> Result<Reply>;

    async fn info(&self, symbol: &str) -> Result<Reply>;

    /// Technical signals: a mapping with `summary`, `oscillators` and
    /// `moving_averages` groups.
    async fn ta_signals(&self, symbol: &str, timeframe: &str) -> Result<Reply>;

    /// Current value of a currency or precious-metal quote.
    async fn fx_current(&self, code: &str) -> Result<Reply>;

    async fn fx_history(&self, code: &str, period: &str, interval: &str) -> Result<Frame>;

    async fn index_info(&self, code: &str) -> Result<Reply>;

    async fn index_history(&self, code: &str, period: &str, interval: &str) -> Result<Frame>;

    async fn index_components(&self, code: &str) -> Result<Reply>;

    async fn crypto_current(&self, pair: &str) -> Result<Reply>;

    async fn inflation_latest(&self) -> Result<Reply>;

    async fn bond_yields(&self) -> Result<Reply>;

    /// Price history of many tickers in one frame, columns grouped by symbol.
    async fn download(&self, symbols: &[String], period: &str) -> Result<Option<Frame>>;

    async fn policy_rate(&self) -> Result<Scalar>;
}
