#![allow(dead_code)]

use chrono::NaiveDate;
use leadscan::domain::daily::{DailyRecord, FlowSide, MoneyFlow, StockInfo};
use leadscan::domain::error::LeadscanError;
use leadscan::domain::signal::SignalRecord;
use leadscan::domain::tier::TierResult;
use leadscan::ports::data_port::DataPort;
use leadscan::ports::store_port::StorePort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub stocks: Vec<StockInfo>,
    pub data: HashMap<String, Vec<DailyRecord>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            stocks: Vec::new(),
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_stock(
        mut self,
        code: &str,
        name: &str,
        market: &str,
        records: Vec<DailyRecord>,
    ) -> Self {
        self.stocks.push(StockInfo {
            code: code.to_string(),
            name: name.to_string(),
            market: market.to_string(),
        });
        self.data.insert(code.to_string(), records);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_daily(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyRecord>, LeadscanError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(LeadscanError::DatabaseQuery {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.date >= start_date && r.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_stocks(&self, markets: &[String]) -> Result<Vec<StockInfo>, LeadscanError> {
        let mut stocks: Vec<StockInfo> = self
            .stocks
            .iter()
            .filter(|s| markets.contains(&s.market))
            .cloned()
            .collect();
        stocks.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(stocks)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, LeadscanError> {
        match self.data.get(code) {
            Some(records) if !records.is_empty() => {
                let min = records.iter().map(|r| r.date).min().unwrap();
                let max = records.iter().map(|r| r.date).max().unwrap();
                Ok(Some((min, max, records.len())))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct MockStore {
    pub tiers: RefCell<Vec<TierResult>>,
    pub signals: RefCell<Vec<SignalRecord>>,
}

impl StorePort for MockStore {
    fn save_tier(&self, result: &TierResult) -> Result<(), LeadscanError> {
        self.tiers.borrow_mut().push(result.clone());
        Ok(())
    }

    fn save_signals(&self, signals: &[SignalRecord]) -> Result<(), LeadscanError> {
        self.signals.borrow_mut().extend_from_slice(signals);
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn side(buy_amount: f64, sell_amount: f64) -> FlowSide {
    FlowSide {
        buy_vol: buy_amount / 10.0,
        buy_amount,
        sell_vol: sell_amount / 10.0,
        sell_amount,
    }
}

/// Money flow whose super-large bucket has the given buy and sell amounts.
pub fn flow(elg_buy: f64, elg_sell: f64) -> MoneyFlow {
    MoneyFlow {
        super_large: side(elg_buy, elg_sell),
        large: side(5_000.0, 5_000.0),
        medium: side(3_000.0, 3_000.0),
        small: side(1_000.0, 1_000.0),
        net_vol: 0.0,
        net_amount: elg_buy - elg_sell,
    }
}

pub fn make_record(code: &str, date: NaiveDate, close: f64, pct_chg: f64) -> DailyRecord {
    let pre_close = close / (1.0 + pct_chg / 100.0);
    DailyRecord {
        code: code.to_string(),
        date,
        open: pre_close,
        high: close.max(pre_close) * 1.01,
        low: close.min(pre_close) * 0.99,
        close,
        pre_close,
        change: close - pre_close,
        pct_chg,
        vol: 10_000.0,
        amount: 10_000.0 * close,
        money_flow: None,
    }
}

/// `closes.len()` consecutive days starting 2023-01-02 with `pct_chg` taken
/// from the close-to-close change, all without money flow.
pub fn generate_records(code: &str, closes: &[f64]) -> Vec<DailyRecord> {
    let start = date(2023, 1, 2);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let pct_chg = if i == 0 {
                0.0
            } else {
                (close - closes[i - 1]) / closes[i - 1] * 100.0
            };
            make_record(code, start + chrono::Duration::days(i as i64), close, pct_chg)
        })
        .collect()
}

/// A flat series of `days` rows at 10.0 whose final row moves by
/// `last_pct_chg` and carries `last_flow`.
pub fn series_ending_with(
    code: &str,
    days: usize,
    last_pct_chg: f64,
    last_flow: MoneyFlow,
) -> Vec<DailyRecord> {
    let mut closes = vec![10.0; days - 1];
    closes.push(10.0 * (1.0 + last_pct_chg / 100.0));
    let mut records = generate_records(code, &closes);
    for record in &mut records {
        record.money_flow = Some(flow(2_000.0, 2_000.0));
    }
    if let Some(last) = records.last_mut() {
        last.pct_chg = last_pct_chg;
        last.money_flow = Some(last_flow);
    }
    records
}
