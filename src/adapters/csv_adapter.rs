//! CSV directory data adapter.
//!
//! Layout: `stocks.csv` (`code,name,market`) plus one `<code>.csv` of daily
//! rows per stock. Money-flow columns may be missing or left empty.

use crate::adapters::schema::money_flow_from_nullable;
use crate::domain::daily::{DailyRecord, StockInfo};
use crate::domain::error::LeadscanError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const STOCKS_FILE: &str = "stocks.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct StockRow {
    code: String,
    name: String,
    market: String,
}

#[derive(Debug, Deserialize)]
struct DailyRow {
    trade_date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    pre_close: f64,
    change: f64,
    pct_chg: f64,
    vol: f64,
    amount: f64,
    #[serde(default)]
    buy_sm_vol: Option<f64>,
    #[serde(default)]
    buy_sm_amount: Option<f64>,
    #[serde(default)]
    sell_sm_vol: Option<f64>,
    #[serde(default)]
    sell_sm_amount: Option<f64>,
    #[serde(default)]
    buy_md_vol: Option<f64>,
    #[serde(default)]
    buy_md_amount: Option<f64>,
    #[serde(default)]
    sell_md_vol: Option<f64>,
    #[serde(default)]
    sell_md_amount: Option<f64>,
    #[serde(default)]
    buy_lg_vol: Option<f64>,
    #[serde(default)]
    buy_lg_amount: Option<f64>,
    #[serde(default)]
    sell_lg_vol: Option<f64>,
    #[serde(default)]
    sell_lg_amount: Option<f64>,
    #[serde(default)]
    buy_elg_vol: Option<f64>,
    #[serde(default)]
    buy_elg_amount: Option<f64>,
    #[serde(default)]
    sell_elg_vol: Option<f64>,
    #[serde(default)]
    sell_elg_amount: Option<f64>,
    #[serde(default)]
    net_mf_vol: Option<f64>,
    #[serde(default)]
    net_mf_amount: Option<f64>,
}

impl DailyRow {
    fn into_record(self, code: &str) -> DailyRecord {
        let flow = [
            self.buy_sm_vol,
            self.buy_sm_amount,
            self.sell_sm_vol,
            self.sell_sm_amount,
            self.buy_md_vol,
            self.buy_md_amount,
            self.sell_md_vol,
            self.sell_md_amount,
            self.buy_lg_vol,
            self.buy_lg_amount,
            self.sell_lg_vol,
            self.sell_lg_amount,
            self.buy_elg_vol,
            self.buy_elg_amount,
            self.sell_elg_vol,
            self.sell_elg_amount,
            self.net_mf_vol,
            self.net_mf_amount,
        ];
        DailyRecord {
            code: code.to_string(),
            date: self.trade_date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            pre_close: self.pre_close,
            change: self.change,
            pct_chg: self.pct_chg,
            vol: self.vol,
            amount: self.amount,
            money_flow: money_flow_from_nullable(&flow),
        }
    }
}

fn read_error(path: &Path, e: csv::Error) -> LeadscanError {
    LeadscanError::DatabaseQuery {
        reason: format!("failed to read {}: {}", path.display(), e),
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn daily_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{code}.csv"))
    }

    /// Every row of `stocks.csv`, ordered by code.
    pub fn all_stocks(&self) -> Result<Vec<StockInfo>, LeadscanError> {
        let path = self.base_path.join(STOCKS_FILE);
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| read_error(&path, e))?;

        let mut stocks = rdr
            .deserialize::<StockRow>()
            .map(|row| {
                row.map(|r| StockInfo {
                    code: r.code,
                    name: r.name,
                    market: r.market,
                })
                .map_err(|e| read_error(&path, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        stocks.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(stocks)
    }

    /// Every daily row stored for `code`, ascending by date. A missing file
    /// means no data rather than an error.
    pub fn read_daily(&self, code: &str) -> Result<Vec<DailyRecord>, LeadscanError> {
        let path = self.daily_path(code);
        if !path.is_file() {
            tracing::debug!(code, path = %path.display(), "no daily file");
            return Ok(Vec::new());
        }

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| read_error(&path, e))?;

        let mut records = rdr
            .deserialize::<DailyRow>()
            .map(|row| {
                row.map(|r| r.into_record(code))
                    .map_err(|e| read_error(&path, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        records.sort_by_key(|r| r.date);
        Ok(records)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_daily(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyRecord>, LeadscanError> {
        let mut records = self.read_daily(code)?;
        records.retain(|r| r.date >= start_date && r.date <= end_date);
        Ok(records)
    }

    fn list_stocks(&self, markets: &[String]) -> Result<Vec<StockInfo>, LeadscanError> {
        let mut stocks = self.all_stocks()?;
        stocks.retain(|s| markets.contains(&s.market));
        Ok(stocks)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, LeadscanError> {
        let records = self.read_daily(code)?;
        Ok(match (records.first(), records.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, records.len())),
            _ => None,
        })
    }
}
