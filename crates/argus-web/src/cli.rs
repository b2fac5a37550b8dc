use argus_market::Settings;
use clap::{Parser, ValueEnum};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(version, about = "JSON gateway for market data", long_about = None)]
pub struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, env = "ARGUS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(long, env = "ARGUS_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Sets the level of tracing
    #[arg(long, default_value = "INFO", ignore_case = true)]
    pub trace: TraceLevel,

    /// User agent sent to upstream data sources
    #[arg(
        long,
        env = "USER_AGENT",
        default_value = "Mozilla/5.0 (compatible; argus-market)"
    )]
    pub user_agent: String,

    /// Suffix appended to bare exchange tickers
    #[arg(long, env = "ARGUS_SYMBOL_SUFFIX", default_value = ".IS")]
    pub symbol_suffix: String,

    /// Quote currency of FX pairs and gram-priced metals
    #[arg(long, env = "ARGUS_QUOTE_CURRENCY", default_value = "TRY")]
    pub quote_currency: String,

    /// Upstream request timeout, in seconds
    #[arg(long, env = "ARGUS_TIMEOUT", default_value_t = 20)]
    pub timeout: u64,

    /// TCMB EVDS API key (inflation, policy rate)
    #[arg(long, env = "EVDS_API_KEY", hide_env_values = true)]
    pub evds_key: Option<String>,

    /// EVDS series code of the policy rate
    #[arg(long, env = "ARGUS_POLICY_RATE_SERIES", default_value = "TP.PY.P02.1H")]
    pub policy_rate_series: String,

    /// Yahoo symbols listed by the bond endpoint
    #[arg(
        long,
        env = "ARGUS_BOND_SYMBOLS",
        value_delimiter = ',',
        default_value = "^IRX,^FVX,^TNX,^TYX"
    )]
    pub bond_symbols: Vec<String>,

    /// TradingView exchange prefix for technical signals
    #[arg(long, env = "ARGUS_TV_EXCHANGE", default_value = "BIST")]
    pub tv_exchange: String,

    /// TradingView screener for technical signals
    #[arg(long, env = "ARGUS_TV_SCREENER", default_value = "turkey")]
    pub tv_screener: String,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraceLevel {
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings {
            user_agent: self.user_agent.clone(),
            symbol_suffix: self.symbol_suffix.clone(),
            quote_currency: self.quote_currency.to_uppercase(),
            timeout: Duration::from_secs(self.timeout),
            evds_key: self.evds_key.clone().filter(|k| !k.is_empty()),
            policy_rate_series: self.policy_rate_series.clone(),
            bond_symbols: self
                .bond_symbols
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            tv_exchange: self.tv_exchange.clone(),
            tv_screener: self.tv_screener.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_args() {
        let cli = Cli::try_parse_from([
            "argus-web",
            "--port",
            "9000",
            "--quote-currency",
            "usd",
            "--bond-symbols",
            "^TNX, ^TYX",
            "--trace",
            "DEBUG",
        ])
        .unwrap();

        assert_eq!(cli.port, 9000);
        assert_eq!(cli.trace, TraceLevel::DEBUG);
        let settings = cli.settings();
        assert_eq!(settings.quote_currency, "USD");
        assert_eq!(settings.bond_symbols, vec!["^TNX", "^TYX"]);
        assert_eq!(settings.timeout, Duration::from_secs(20));
    }
}
