//! Client-facing codes -> upstream symbols.

use crate::settings::Settings;

/// Troy ounce in grams.
pub const GRAMS_PER_OUNCE: f64 = 31.1034768;

const CRYPTO_QUOTES: [&str; 6] = ["USDT", "USDC", "USD", "TRY", "EUR", "BTC"];

fn is_qualified(symbol: &str) -> bool {
    symbol.contains(['.', '=', '^', '-', ':'])
}

/// Exchange ticker or index code, e.g. `THYAO` -> `THYAO.IS`.
pub fn equity(symbol: &str, settings: &Settings) -> String {
    if is_qualified(symbol) {
        symbol.to_string()
    } else {
        format!("{symbol}{}", settings.symbol_suffix)
    }
}

/// Currency against the configured quote currency, e.g. `USD` -> `USDTRY=X`.
/// Full pairs (`EURUSD`) are kept.
pub fn currency(code: &str, settings: &Settings) -> String {
    if is_qualified(code) {
        code.to_string()
    } else if code.len() == 6 {
        format!("{code}=X")
    } else {
        format!("{code}{}=X", settings.quote_currency)
    }
}

/// Crypto pair, e.g. `BTCUSDT` -> `BTC-USD`, `ETHTRY` -> `ETH-TRY`.
pub fn crypto(pair: &str) -> String {
    if is_qualified(pair) {
        return pair.to_string();
    }
    for quote in CRYPTO_QUOTES {
        if let Some(base) = pair.strip_suffix(quote) {
            if base.is_empty() {
                continue;
            }
            let quote = match quote {
                "USDT" | "USDC" => "USD",
                q => q,
            };
            return format!("{base}-{quote}");
        }
    }
    format!("{pair}-USD")
}

/// Ticker as TradingView knows it, e.g. `THYAO.IS` -> `BIST:THYAO`.
pub fn tradingview(symbol: &str, settings: &Settings) -> String {
    if symbol.contains(':') {
        return symbol.to_string();
    }
    let bare = symbol
        .strip_suffix(settings.symbol_suffix.as_str())
        .unwrap_or(symbol);
    format!("{}:{bare}", settings.tv_exchange)
}

/// Precious-metal quote kinds served through the FX endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metal {
    /// Yahoo futures symbol, priced in USD per troy ounce.
    pub future: &'static str,
    /// Convert to the quote currency per gram.
    pub per_gram: bool,
}

pub fn metal(kind: &str) -> Option<Metal> {
    let metal = match kind.to_ascii_lowercase().as_str() {
        "ons" | "ons-altin" | "xau" => Metal {
            future: "GC=F",
            per_gram: false,
        },
        "gram-altin" | "gram" => Metal {
            future: "GC=F",
            per_gram: true,
        },
        "gumus-ons" | "ons-gumus" | "xag" => Metal {
            future: "SI=F",
            per_gram: false,
        },
        "gram-gumus" => Metal {
            future: "SI=F",
            per_gram: true,
        },
        _ => return None,
    };
    Some(metal)
}
