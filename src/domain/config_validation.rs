//! Configuration validation.
//!
//! Checks the `[scan]` section before any data is fetched.

use crate::domain::error::LeadscanError;
use crate::domain::universe::{DEFAULT_MARKETS, parse_codes, parse_markets};
use crate::ports::config_port::ConfigPort;

pub fn validate_scan_config(config: &dyn ConfigPort) -> Result<(), LeadscanError> {
    validate_dates(config)?;
    validate_markets(config)?;
    validate_codes(config)?;
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), LeadscanError> {
    let start = config.get_date("scan", "start_date")?;
    let end = config.get_date("scan", "end_date")?;
    config.get_date("scan", "trade_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(LeadscanError::ConfigInvalid {
                section: "scan".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_markets(config: &dyn ConfigPort) -> Result<(), LeadscanError> {
    let markets = config
        .get_string("scan", "markets")
        .unwrap_or_else(|| DEFAULT_MARKETS.to_string());
    parse_markets(&markets).map_err(|e| LeadscanError::ConfigInvalid {
        section: "scan".to_string(),
        key: "markets".to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

fn validate_codes(config: &dyn ConfigPort) -> Result<(), LeadscanError> {
    if let Some(codes) = config
        .get_string("scan", "codes")
        .filter(|s| !s.trim().is_empty())
    {
        parse_codes(&codes).map_err(|e| LeadscanError::ConfigInvalid {
            section: "scan".to_string(),
            key: "codes".to_string(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn empty_scan_section_is_valid() {
        assert!(validate_scan_config(&config("[scan]\n")).is_ok());
    }

    #[test]
    fn full_scan_section_is_valid() {
        let ini = "[scan]\nstart_date = 2018-01-01\nend_date = 2023-05-09\ntrade_date = 2023-05-08\nmarkets = 主板,创业板\ncodes = 600000.SH\n";
        assert!(validate_scan_config(&config(ini)).is_ok());
    }

    #[test]
    fn bad_date_rejected() {
        let err = validate_scan_config(&config("[scan]\nstart_date = 2018/01/01\n")).unwrap_err();
        assert!(matches!(err, LeadscanError::ConfigInvalid { ref key, .. } if key == "start_date"));
    }

    #[test]
    fn bad_trade_date_rejected() {
        let err = validate_scan_config(&config("[scan]\ntrade_date = yesterday\n")).unwrap_err();
        assert!(matches!(err, LeadscanError::ConfigInvalid { ref key, .. } if key == "trade_date"));
    }

    #[test]
    fn start_after_end_rejected() {
        let ini = "[scan]\nstart_date = 2023-01-02\nend_date = 2023-01-01\n";
        let err = validate_scan_config(&config(ini)).unwrap_err();
        assert!(matches!(err, LeadscanError::ConfigInvalid { ref key, .. } if key == "start_date"));
    }

    #[test]
    fn duplicate_market_rejected() {
        let err = validate_scan_config(&config("[scan]\nmarkets = 主板,主板\n")).unwrap_err();
        assert!(matches!(err, LeadscanError::ConfigInvalid { ref key, .. } if key == "markets"));
    }

    #[test]
    fn empty_code_token_rejected() {
        let err = validate_scan_config(&config("[scan]\ncodes = 600000.SH,,\n")).unwrap_err();
        assert!(matches!(err, LeadscanError::ConfigInvalid { ref key, .. } if key == "codes"));
    }
}
