//! SQLite data and result-store adapter.

use crate::adapters::schema::{
    MONEY_FLOW_COLUMNS, money_flow_from_nullable, money_flow_select_list, money_flow_values,
};
use crate::domain::daily::{DailyRecord, StockInfo};
use crate::domain::error::LeadscanError;
use crate::domain::signal::SignalRecord;
use crate::domain::tier::TierResult;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::store_port::StorePort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> LeadscanError {
    LeadscanError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> LeadscanError {
    LeadscanError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_date(raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            raw.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, LeadscanError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| LeadscanError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        tracing::debug!(path = %db_path, pool_size, "sqlite pool ready");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, LeadscanError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, LeadscanError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), LeadscanError> {
        let flow_columns = MONEY_FLOW_COLUMNS
            .iter()
            .map(|c| format!("{c} REAL NOT NULL DEFAULT 0"))
            .collect::<Vec<_>>()
            .join(",\n                ");

        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS stocks_base (
                code TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                market TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_stocks_base_market ON stocks_base(market);
            CREATE TABLE IF NOT EXISTS stock_daily (
                code TEXT NOT NULL,
                trade_date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                pre_close REAL NOT NULL,
                change REAL NOT NULL,
                pct_chg REAL NOT NULL,
                vol REAL NOT NULL,
                amount REAL NOT NULL,
                PRIMARY KEY (code, trade_date)
            );
            CREATE TABLE IF NOT EXISTS stock_daily_money_flow (
                code TEXT NOT NULL,
                trade_date TEXT NOT NULL,
                {flow_columns},
                PRIMARY KEY (code, trade_date)
            );
            CREATE TABLE IF NOT EXISTS stock_leader_tier (
                code TEXT NOT NULL,
                trade_date TEXT NOT NULL,
                name TEXT NOT NULL,
                tier INTEGER NOT NULL,
                PRIMARY KEY (code, trade_date)
            );
            CREATE TABLE IF NOT EXISTS stock_daily_signal (
                code TEXT NOT NULL,
                trade_date TEXT NOT NULL,
                trend_buy INTEGER NOT NULL,
                trend_sell INTEGER NOT NULL,
                exit_buy INTEGER NOT NULL,
                exit_sell INTEGER NOT NULL,
                dynamic_line REAL NOT NULL,
                entry_buy INTEGER NOT NULL,
                build_area INTEGER NOT NULL,
                PRIMARY KEY (code, trade_date)
            );"
        );

        self.conn()?.execute_batch(&ddl).map_err(query_error)?;
        Ok(())
    }

    pub fn insert_stocks(&self, stocks: &[StockInfo]) -> Result<(), LeadscanError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;
        for stock in stocks {
            tx.execute(
                "INSERT OR REPLACE INTO stocks_base (code, name, market) VALUES (?1, ?2, ?3)",
                params![stock.code, stock.name, stock.market],
            )
            .map_err(query_error)?;
        }
        tx.commit().map_err(query_error)?;
        Ok(())
    }

    /// Writes price rows, and money-flow rows for records that carry one.
    pub fn insert_daily(&self, records: &[DailyRecord]) -> Result<(), LeadscanError> {
        let flow_sql = format!(
            "INSERT OR REPLACE INTO stock_daily_money_flow (code, trade_date, {}) VALUES (?1, ?2, {})",
            MONEY_FLOW_COLUMNS.join(", "),
            (3..=20).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
        );

        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for rec in records {
            let date = rec.date.format(DATE_FORMAT).to_string();
            tx.execute(
                "INSERT OR REPLACE INTO stock_daily
                 (code, trade_date, open, high, low, close, pre_close, change, pct_chg, vol, amount)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    rec.code,
                    date,
                    rec.open,
                    rec.high,
                    rec.low,
                    rec.close,
                    rec.pre_close,
                    rec.change,
                    rec.pct_chg,
                    rec.vol,
                    rec.amount
                ],
            )
            .map_err(query_error)?;

            if let Some(flow) = &rec.money_flow {
                let mut values: Vec<Value> = vec![rec.code.clone().into(), date.clone().into()];
                values.extend(money_flow_values(flow).iter().map(|v| Value::Real(*v)));
                tx.execute(&flow_sql, params_from_iter(values))
                    .map_err(query_error)?;
            }
        }

        tx.commit().map_err(query_error)?;
        Ok(())
    }

    pub fn load_tiers(
        &self,
        trade_date: NaiveDate,
    ) -> Result<Vec<(String, String, u8)>, LeadscanError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT code, name, tier FROM stock_leader_tier WHERE trade_date = ?1 ORDER BY tier, code",
            )
            .map_err(query_error)?;
        let rows = stmt
            .query_map(params![trade_date.format(DATE_FORMAT).to_string()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(query_error)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(query_error)
    }

    pub fn load_signals(&self, code: &str) -> Result<Vec<SignalRecord>, LeadscanError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT code, trade_date, trend_buy, trend_sell, exit_buy, exit_sell,
                        dynamic_line, entry_buy, build_area
                 FROM stock_daily_signal WHERE code = ?1 ORDER BY trade_date ASC",
            )
            .map_err(query_error)?;
        let rows = stmt
            .query_map(params![code], |row| {
                let date: String = row.get(1)?;
                Ok(SignalRecord {
                    code: row.get(0)?,
                    trade_date: parse_date(&date)?,
                    trend_buy: row.get(2)?,
                    trend_sell: row.get(3)?,
                    exit_buy: row.get(4)?,
                    exit_sell: row.get(5)?,
                    dynamic_line: row.get(6)?,
                    entry_buy: row.get(7)?,
                    build_area: row.get(8)?,
                })
            })
            .map_err(query_error)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(query_error)
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_daily(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyRecord>, LeadscanError> {
        let conn = self.conn()?;

        let query = format!(
            "SELECT d.code, d.trade_date, d.open, d.high, d.low, d.close, d.pre_close,
                    d.change, d.pct_chg, d.vol, d.amount, {}
             FROM stock_daily d
             LEFT JOIN stock_daily_money_flow m
               ON m.code = d.code AND m.trade_date = d.trade_date
             WHERE d.code = ?1 AND d.trade_date >= ?2 AND d.trade_date <= ?3
             ORDER BY d.trade_date ASC",
            money_flow_select_list("m")
        );

        let mut stmt = conn.prepare(&query).map_err(query_error)?;

        let rows = stmt
            .query_map(
                params![
                    code,
                    start_date.format(DATE_FORMAT).to_string(),
                    end_date.format(DATE_FORMAT).to_string()
                ],
                |row| {
                    let date: String = row.get(1)?;
                    let mut flow = [None; 18];
                    for (i, slot) in flow.iter_mut().enumerate() {
                        *slot = row.get(11 + i)?;
                    }
                    Ok(DailyRecord {
                        code: row.get(0)?,
                        date: parse_date(&date)?,
                        open: row.get(2)?,
                        high: row.get(3)?,
                        low: row.get(4)?,
                        close: row.get(5)?,
                        pre_close: row.get(6)?,
                        change: row.get(7)?,
                        pct_chg: row.get(8)?,
                        vol: row.get(9)?,
                        amount: row.get(10)?,
                        money_flow: money_flow_from_nullable(&flow),
                    })
                },
            )
            .map_err(query_error)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(query_error)
    }

    fn list_stocks(&self, markets: &[String]) -> Result<Vec<StockInfo>, LeadscanError> {
        if markets.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;

        let placeholders = (1..=markets.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT code, name, market FROM stocks_base WHERE market IN ({placeholders}) ORDER BY code"
        );

        let mut stmt = conn.prepare(&query).map_err(query_error)?;
        let rows = stmt
            .query_map(params_from_iter(markets.iter()), |row| {
                Ok(StockInfo {
                    code: row.get(0)?,
                    name: row.get(1)?,
                    market: row.get(2)?,
                })
            })
            .map_err(query_error)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(query_error)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, LeadscanError> {
        let conn = self.conn()?;

        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(trade_date), MAX(trade_date), COUNT(*) FROM stock_daily WHERE code = ?1",
                params![code],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_error)?;

        match result {
            (Some(min), Some(max), count) if count > 0 => Ok(Some((
                parse_date(&min).map_err(query_error)?,
                parse_date(&max).map_err(query_error)?,
                count as usize,
            ))),
            _ => Ok(None),
        }
    }
}

impl StorePort for SqliteAdapter {
    fn save_tier(&self, result: &TierResult) -> Result<(), LeadscanError> {
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO stock_leader_tier (code, trade_date, name, tier)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    result.code,
                    result.trade_date.format(DATE_FORMAT).to_string(),
                    result.name,
                    result.tier.code()
                ],
            )
            .map_err(query_error)?;
        Ok(())
    }

    fn save_signals(&self, signals: &[SignalRecord]) -> Result<(), LeadscanError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;
        for s in signals {
            tx.execute(
                "INSERT OR REPLACE INTO stock_daily_signal
                 (code, trade_date, trend_buy, trend_sell, exit_buy, exit_sell, dynamic_line, entry_buy, build_area)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    s.code,
                    s.trade_date.format(DATE_FORMAT).to_string(),
                    s.trend_buy,
                    s.trend_sell,
                    s.exit_buy,
                    s.exit_sell,
                    s.dynamic_line,
                    s.entry_buy,
                    s.build_area
                ],
            )
            .map_err(query_error)?;
        }
        tx.commit().map_err(query_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::daily::{FlowSide, MoneyFlow};
    use crate::domain::tier::Tier;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 5, d).unwrap()
    }

    fn record(code: &str, day: u32, close: f64, flow: Option<MoneyFlow>) -> DailyRecord {
        DailyRecord {
            code: code.to_string(),
            date: date(day),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            pre_close: close,
            change: 0.0,
            pct_chg: 1.5,
            vol: 100.0,
            amount: 1000.0,
            money_flow: flow,
        }
    }

    fn flow() -> MoneyFlow {
        MoneyFlow {
            super_large: FlowSide {
                buy_vol: 1.0,
                buy_amount: 20_000.0,
                sell_vol: 1.0,
                sell_amount: 10_000.0,
            },
            net_amount: 10_000.0,
            ..MoneyFlow::default()
        }
    }

    fn seeded() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
    }

    #[test]
    fn from_config_missing_path() {
        match SqliteAdapter::from_config(&EmptyConfig) {
            Err(LeadscanError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn schema_is_idempotent() {
        let adapter = seeded();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn fetch_daily_joins_money_flow() {
        let adapter = seeded();
        adapter
            .insert_daily(&[
                record("600000.SH", 9, 10.5, None),
                record("600000.SH", 8, 10.0, Some(flow())),
                record("000001.SZ", 8, 12.0, None),
            ])
            .unwrap();

        let fetched = adapter.fetch_daily("600000.SH", date(1), date(31)).unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].date, date(8));
        assert_eq!(fetched[0].money_flow, Some(flow()));
        assert_eq!(fetched[1].date, date(9));
        assert_eq!(fetched[1].money_flow, None);
    }

    #[test]
    fn fetch_daily_range_is_inclusive() {
        let adapter = seeded();
        let records: Vec<DailyRecord> =
            (1..=5).map(|d| record("600000.SH", d, 10.0, None)).collect();
        adapter.insert_daily(&records).unwrap();

        let fetched = adapter.fetch_daily("600000.SH", date(2), date(4)).unwrap();
        let days: Vec<NaiveDate> = fetched.iter().map(|r| r.date).collect();
        assert_eq!(days, vec![date(2), date(3), date(4)]);
    }

    #[test]
    fn list_stocks_filters_by_market() {
        let adapter = seeded();
        adapter
            .insert_stocks(&[
                StockInfo {
                    code: "688001.SH".into(),
                    name: "华兴源创".into(),
                    market: "科创板".into(),
                },
                StockInfo {
                    code: "600000.SH".into(),
                    name: "浦发银行".into(),
                    market: "主板".into(),
                },
                StockInfo {
                    code: "830799.BJ".into(),
                    name: "艾融软件".into(),
                    market: "北交所".into(),
                },
            ])
            .unwrap();

        let stocks = adapter
            .list_stocks(&["主板".to_string(), "科创板".to_string()])
            .unwrap();
        let codes: Vec<&str> = stocks.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["600000.SH", "688001.SH"]);
        assert!(adapter.list_stocks(&[]).unwrap().is_empty());
    }

    #[test]
    fn data_range() {
        let adapter = seeded();
        assert!(adapter.get_data_range("600000.SH").unwrap().is_none());

        adapter
            .insert_daily(&[record("600000.SH", 2, 10.0, None), record("600000.SH", 5, 11.0, None)])
            .unwrap();
        let (min, max, count) = adapter.get_data_range("600000.SH").unwrap().unwrap();
        assert_eq!(min, date(2));
        assert_eq!(max, date(5));
        assert_eq!(count, 2);
    }

    #[test]
    fn save_tier_upserts() {
        let adapter = seeded();
        let mut result = TierResult {
            tier: Tier::Speculative,
            name: "浦发银行".into(),
            code: "600000.SH".into(),
            trade_date: date(8),
        };
        adapter.save_tier(&result).unwrap();
        result.tier = Tier::Emerging;
        adapter.save_tier(&result).unwrap();

        let tiers = adapter.load_tiers(date(8)).unwrap();
        assert_eq!(tiers, vec![("600000.SH".to_string(), "浦发银行".to_string(), 2)]);
    }

    #[test]
    fn save_signals_round_trip() {
        let adapter = seeded();
        let signal = SignalRecord {
            code: "600000.SH".into(),
            trade_date: date(8),
            trend_buy: 1,
            trend_sell: 0,
            exit_buy: 0,
            exit_sell: 1,
            dynamic_line: 3.3,
            entry_buy: 0,
            build_area: 1,
        };
        adapter.save_signals(&[signal.clone()]).unwrap();
        assert_eq!(adapter.load_signals("600000.SH").unwrap(), vec![signal]);
    }
}
