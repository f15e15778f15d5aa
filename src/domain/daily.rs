//! Daily market record representation.

use chrono::NaiveDate;

/// Trade-size class used to split money flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeBucket {
    SuperLarge,
    Large,
    Medium,
    Small,
}

/// Buy/sell volume and amount for one size bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowSide {
    pub buy_vol: f64,
    pub buy_amount: f64,
    pub sell_vol: f64,
    pub sell_amount: f64,
}

/// Capital flow for one trading day, bucketed by trade size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoneyFlow {
    pub super_large: FlowSide,
    pub large: FlowSide,
    pub medium: FlowSide,
    pub small: FlowSide,
    pub net_vol: f64,
    pub net_amount: f64,
}

impl MoneyFlow {
    pub fn bucket(&self, bucket: SizeBucket) -> &FlowSide {
        match bucket {
            SizeBucket::SuperLarge => &self.super_large,
            SizeBucket::Large => &self.large,
            SizeBucket::Medium => &self.medium,
            SizeBucket::Small => &self.small,
        }
    }
}

/// One trading day for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub pre_close: f64,
    pub change: f64,
    pub pct_chg: f64,
    pub vol: f64,
    pub amount: f64,
    /// Present when the money-flow table had a row for the same (code, date).
    pub money_flow: Option<MoneyFlow>,
}

impl DailyRecord {
    pub fn open_minus_close(&self) -> f64 {
        self.open - self.close
    }

    pub fn high_minus_low(&self) -> f64 {
        self.high - self.low
    }
}

/// Reference data for one listed stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockInfo {
    pub code: String,
    pub name: String,
    pub market: String,
}
