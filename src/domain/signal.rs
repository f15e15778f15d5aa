//! Persisted form of the per-day indicator signals.

use crate::domain::enrich::EnrichedRow;
use chrono::NaiveDate;
use std::fmt;

pub const DYNAMIC_BOTTOM: f64 = 0.2;
pub const DYNAMIC_BUY: f64 = 0.5;
pub const DYNAMIC_STAGED_SELL: f64 = 3.2;
pub const DYNAMIC_FULL_EXIT: f64 = 3.5;

/// Reading of the exit oscillator's dynamic line against its reference levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicZone {
    Bottom,
    BuyZone,
    Neutral,
    StagedSell,
    FullExit,
}

impl DynamicZone {
    pub fn of(dynamic_line: f64) -> Self {
        if dynamic_line >= DYNAMIC_FULL_EXIT {
            DynamicZone::FullExit
        } else if dynamic_line >= DYNAMIC_STAGED_SELL {
            DynamicZone::StagedSell
        } else if dynamic_line <= DYNAMIC_BOTTOM {
            DynamicZone::Bottom
        } else if dynamic_line <= DYNAMIC_BUY {
            DynamicZone::BuyZone
        } else {
            DynamicZone::Neutral
        }
    }
}

impl fmt::Display for DynamicZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DynamicZone::Bottom => "bottom",
            DynamicZone::BuyZone => "buy",
            DynamicZone::Neutral => "neutral",
            DynamicZone::StagedSell => "staged-sell",
            DynamicZone::FullExit => "full-exit",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    pub code: String,
    pub trade_date: NaiveDate,
    pub trend_buy: u8,
    pub trend_sell: u8,
    pub exit_buy: u8,
    pub exit_sell: u8,
    pub dynamic_line: f64,
    pub entry_buy: u8,
    pub build_area: u8,
}

impl SignalRecord {
    /// `None` unless the trend, exit and entry columns have all been computed.
    pub fn from_row(row: &EnrichedRow) -> Option<Self> {
        let trend = row.trend?;
        let exit = row.exit?;
        let entry = row.entry?;
        Some(Self {
            code: row.record.code.clone(),
            trade_date: row.record.date,
            trend_buy: trend.buy_signal,
            trend_sell: trend.sell_signal,
            exit_buy: exit.buy_signal,
            exit_sell: exit.sell_signal,
            dynamic_line: exit.dynamic_line,
            entry_buy: entry.buy_signal,
            build_area: entry.build_area_signal,
        })
    }

    pub fn zone(&self) -> DynamicZone {
        DynamicZone::of(self.dynamic_line)
    }
}
