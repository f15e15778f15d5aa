//! Scan universe: which listed stocks get classified.
//!
//! Markets come from configuration as a comma list; an optional code list
//! narrows the market selection further.

use crate::domain::daily::StockInfo;
use crate::domain::error::LeadscanError;
use crate::ports::data_port::DataPort;
use std::collections::HashSet;

pub const DEFAULT_MARKETS: &str = "科创板,创业板,主板,中小板";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in list")]
    EmptyToken,

    #[error("duplicate entry: {0}")]
    Duplicate(String),
}

fn parse_list(input: &str, normalize: fn(&str) -> String) -> Result<Vec<String>, UniverseError> {
    let mut items = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let item = normalize(trimmed);
        if !seen.insert(item.clone()) {
            return Err(UniverseError::Duplicate(item));
        }
        items.push(item);
    }

    Ok(items)
}

pub fn parse_markets(input: &str) -> Result<Vec<String>, UniverseError> {
    parse_list(input, str::to_string)
}

/// Exchange codes are case-insensitive (`600000.sh` == `600000.SH`).
pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    parse_list(input, str::to_uppercase)
}

/// Stocks listed in `markets`, restricted to `codes` when given.
pub fn select_universe(
    data_port: &dyn DataPort,
    markets: &[String],
    codes: Option<&[String]>,
) -> Result<Vec<StockInfo>, LeadscanError> {
    let mut stocks = data_port.list_stocks(markets)?;

    if let Some(codes) = codes {
        let wanted: HashSet<&str> = codes.iter().map(String::as_str).collect();
        stocks.retain(|s| wanted.contains(s.code.as_str()));
        for code in codes {
            if !stocks.iter().any(|s| &s.code == code) {
                tracing::warn!(%code, "code not listed in configured markets");
            }
        }
    }

    tracing::info!(stocks = stocks.len(), markets = %markets.join(","), "universe selected");
    Ok(stocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_markets_default() {
        let markets = parse_markets(DEFAULT_MARKETS).unwrap();
        assert_eq!(markets, vec!["科创板", "创业板", "主板", "中小板"]);
    }

    #[test]
    fn parse_codes_with_whitespace_and_case() {
        let result = parse_codes("  600000.sh , 000001.SZ ").unwrap();
        assert_eq!(result, vec!["600000.SH", "000001.SZ"]);
    }

    #[test]
    fn parse_empty_token() {
        assert_eq!(parse_markets("主板,,创业板"), Err(UniverseError::EmptyToken));
    }

    #[test]
    fn parse_duplicate() {
        let result = parse_codes("600000.SH,600000.sh");
        assert_eq!(result, Err(UniverseError::Duplicate("600000.SH".into())));
    }
}
