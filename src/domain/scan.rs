//! Batch scan: classify every stock in the universe and persist matches.

use crate::domain::daily::StockInfo;
use crate::domain::enrich::enrich;
use crate::domain::error::LeadscanError;
use crate::domain::signal::SignalRecord;
use crate::domain::tier::{Tier, TierResult, classify_latest};
use crate::domain::universe::select_universe;
use crate::ports::data_port::DataPort;
use crate::ports::store_port::StorePort;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Only stocks whose latest record falls on this date are classified.
    pub trade_date: Option<NaiveDate>,
    pub markets: Vec<String>,
    pub codes: Option<Vec<String>>,
    pub persist_signals: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StockOutcome {
    NoData,
    Stale { latest: NaiveDate },
    NoTier,
    Matched(TierResult),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSummary {
    pub scanned: usize,
    pub no_data: usize,
    pub stale: usize,
    pub no_tier: usize,
    pub failed: usize,
    pub matched: BTreeMap<Tier, usize>,
    pub results: Vec<TierResult>,
}

impl ScanSummary {
    pub fn matched_total(&self) -> usize {
        self.matched.values().sum()
    }

    fn record(&mut self, outcome: StockOutcome) {
        match outcome {
            StockOutcome::NoData => self.no_data += 1,
            StockOutcome::Stale { .. } => self.stale += 1,
            StockOutcome::NoTier => self.no_tier += 1,
            StockOutcome::Matched(result) => {
                *self.matched.entry(result.tier).or_default() += 1;
                self.results.push(result);
            }
        }
    }
}

/// Fetch, enrich, classify and persist one stock.
pub fn scan_stock(
    data_port: &dyn DataPort,
    store: &dyn StorePort,
    stock: &StockInfo,
    config: &ScanConfig,
) -> Result<StockOutcome, LeadscanError> {
    let records = data_port.fetch_daily(&stock.code, config.start_date, config.end_date)?;
    let series = enrich(&records);

    let Some(latest) = series.latest() else {
        return Ok(StockOutcome::NoData);
    };

    if let Some(trade_date) = config.trade_date {
        if latest.date() != trade_date {
            return Ok(StockOutcome::Stale {
                latest: latest.date(),
            });
        }
    }

    // Classify before any write so a failing stock leaves nothing stored.
    let tier = classify_latest(&series, &stock.code, &stock.name)?;

    if config.persist_signals {
        if let Some(signal) = SignalRecord::from_row(latest) {
            store.save_signals(&[signal])?;
        }
    }

    match tier {
        Some(result) => {
            store.save_tier(&result)?;
            Ok(StockOutcome::Matched(result))
        }
        None => Ok(StockOutcome::NoTier),
    }
}

/// Classify every stock in the configured universe.
///
/// Per-stock failures are logged and counted; only failing to list the
/// universe aborts the scan.
pub fn run_scan(
    data_port: &dyn DataPort,
    store: &dyn StorePort,
    config: &ScanConfig,
) -> Result<ScanSummary, LeadscanError> {
    let stocks = select_universe(data_port, &config.markets, config.codes.as_deref())?;
    let mut summary = ScanSummary::default();

    for stock in &stocks {
        summary.scanned += 1;
        match scan_stock(data_port, store, stock, config) {
            Ok(outcome) => {
                match &outcome {
                    StockOutcome::Matched(result) => {
                        tracing::info!(
                            code = %stock.code,
                            name = %stock.name,
                            tier = %result.tier,
                            "leader tier matched"
                        )
                    }
                    StockOutcome::Stale { latest } => {
                        tracing::debug!(
                            code = %stock.code,
                            %latest,
                            "latest record is not on the trade date"
                        )
                    }
                    StockOutcome::NoData => tracing::debug!(code = %stock.code, "no daily records"),
                    StockOutcome::NoTier => tracing::debug!(code = %stock.code, "no tier"),
                }
                summary.record(outcome);
            }
            Err(e) => {
                tracing::warn!(code = %stock.code, error = %e, "skipping stock");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        scanned = summary.scanned,
        matched = summary.matched_total(),
        failed = summary.failed,
        "scan complete"
    );
    Ok(summary)
}
