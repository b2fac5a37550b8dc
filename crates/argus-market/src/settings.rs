use std::time::Duration;

/// Everything a source handle needs to reach its upstreams.
#[derive(Debug, Clone)]
pub struct Settings {
    pub user_agent: String,
    /// Appended to bare exchange tickers, e.g. `THYAO` -> `THYAO.IS`.
    pub symbol_suffix: String,
    /// Quote side of currency pairs, e.g. `USD` -> `USDTRY=X`.
    pub quote_currency: String,
    pub timeout: Duration,
    pub evds_key: Option<String>,
    pub policy_rate_series: String,
    pub bond_symbols: Vec<String>,
    pub tv_exchange: String,
    pub tv_screener: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            user_agent: "Mozilla/5.0 (compatible; argus-market)".to_string(),
            symbol_suffix: ".IS".to_string(),
            quote_currency: "TRY".to_string(),
            timeout: Duration::from_secs(20),
            evds_key: None,
            policy_rate_series: "TP.PY.P02.1H".to_string(),
            bond_symbols: ["^IRX", "^FVX", "^TNX", "^TYX"]
                .into_iter()
                .map(String::from)
                .collect(),
            tv_exchange: "BIST".to_string(),
            tv_screener: "turkey".to_string(),
        }
    }
}

impl Settings {
    /// Fresh HTTP client; every request handle builds its own.
    pub fn http_client(&self) -> anyhow::Result<reqwest::Client> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(&self.user_agent)
            .cookie_store(true)
            .timeout(self.timeout)
            .build()?;
        Ok(client)
    }
}
