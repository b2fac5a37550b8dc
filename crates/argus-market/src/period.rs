//! Period and interval aliases accepted on the HTTP surface.
//!
//! Clients speak the Turkish shorthand (`1g` = one day, `1ay` = one month);
//! Yahoo Finance wants its own range and interval codes.

/// Map a requested period onto a Yahoo `range` code.
pub fn yahoo_range(period: &str) -> String {
    match period {
        "1g" => "1d",
        "5g" | "1h" => "5d",
        "1ay" => "1mo",
        "3ay" => "3mo",
        "6ay" => "6mo",
        other => other,
    }
    .to_string()
}

/// Map a requested interval onto a Yahoo `interval` code.
///
/// Case matters: `1m` is one minute, `1M` is one month. Codes Yahoo has no
/// bars for (`4h`) pass through and fail upstream.
pub fn yahoo_interval(interval: &str) -> String {
    match interval {
        "1W" | "1w" => "1wk",
        "1M" => "1mo",
        other => other,
    }
    .to_string()
}

/// TradingView column suffix for an indicator timeframe; daily has none.
pub fn tradingview_suffix(timeframe: &str) -> Option<&'static str> {
    match timeframe {
        "1m" => Some("|1"),
        "5m" => Some("|5"),
        "15m" => Some("|15"),
        "30m" => Some("|30"),
        "1h" => Some("|60"),
        "2h" => Some("|120"),
        "4h" => Some("|240"),
        "1d" => Some(""),
        "1W" => Some("|1W"),
        "1M" => Some("|1M"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turkish_periods() {
        assert_eq!(yahoo_range("1ay"), "1mo");
        assert_eq!(yahoo_range("1g"), "1d");
        assert_eq!(yahoo_range("1y"), "1y");
        assert_eq!(yahoo_range("max"), "max");
    }

    #[test]
    fn test_interval_case_matters() {
        assert_eq!(yahoo_interval("1m"), "1m");
        assert_eq!(yahoo_interval("1M"), "1mo");
        assert_eq!(yahoo_interval("1W"), "1wk");
        assert_eq!(yahoo_interval("1d"), "1d");
        assert_eq!(yahoo_interval("4h"), "4h");
    }

    #[test]
    fn test_tradingview_suffix() {
        assert_eq!(tradingview_suffix("1d"), Some(""));
        assert_eq!(tradingview_suffix("1h"), Some("|60"));
        assert_eq!(tradingview_suffix("3d"), None);
    }
}
