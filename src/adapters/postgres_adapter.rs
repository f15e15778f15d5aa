//! PostgreSQL data and result-store adapter.
//!
//! Works against the upstream market database, whose tables key stocks by
//! `ts_code`; the schema is owned by whatever loads the raw market data.

use crate::adapters::schema::{money_flow_from_nullable, money_flow_select_list};
use crate::domain::daily::{DailyRecord, StockInfo};
use crate::domain::error::LeadscanError;
use crate::domain::signal::SignalRecord;
use crate::domain::tier::TierResult;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::store_port::StorePort;
use chrono::NaiveDate;
use postgres::NoTls;
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;

pub struct PostgresAdapter {
    pool: Pool<PostgresConnectionManager<NoTls>>,
}

fn query_error(e: postgres::Error) -> LeadscanError {
    LeadscanError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, LeadscanError> {
        let connection_string = config
            .get_string("postgres", "connection_string")
            .ok_or_else(|| LeadscanError::ConfigMissing {
                section: "postgres".into(),
                key: "connection_string".into(),
            })?;

        let pg_config = connection_string
            .parse::<postgres::Config>()
            .map_err(|e| LeadscanError::ConfigInvalid {
                section: "postgres".into(),
                key: "connection_string".into(),
                reason: e.to_string(),
            })?;

        let pool_size = config.get_int("postgres", "pool_size", 4).max(1) as u32;
        let manager = PostgresConnectionManager::new(pg_config, NoTls);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e| LeadscanError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<PostgresConnectionManager<NoTls>>, LeadscanError> {
        self.pool.get().map_err(|e| LeadscanError::Database {
            reason: e.to_string(),
        })
    }
}

impl DataPort for PostgresAdapter {
    fn fetch_daily(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyRecord>, LeadscanError> {
        let flow_columns = money_flow_select_list("m")
            .split(", ")
            .map(|c| format!("{c}::double precision"))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT d.ts_code, d.trade_date, \
                    d.open::double precision, d.high::double precision, \
                    d.low::double precision, d.close::double precision, \
                    d.pre_close::double precision, d.change::double precision, \
                    d.pct_chg::double precision, d.vol::double precision, \
                    d.amount::double precision, {flow_columns} \
             FROM stock_daily d \
             LEFT JOIN stock_daily_money_flow m \
               ON m.ts_code = d.ts_code AND m.trade_date = d.trade_date \
             WHERE d.ts_code = $1 AND d.trade_date BETWEEN $2 AND $3 \
             ORDER BY d.trade_date ASC"
        );

        let rows = self
            .conn()?
            .query(query.as_str(), &[&code, &start_date, &end_date])
            .map_err(query_error)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut flow = [None; 18];
                for (i, slot) in flow.iter_mut().enumerate() {
                    *slot = row.get::<_, Option<f64>>(11 + i);
                }
                DailyRecord {
                    code: row.get(0),
                    date: row.get(1),
                    open: row.get(2),
                    high: row.get(3),
                    low: row.get(4),
                    close: row.get(5),
                    pre_close: row.get(6),
                    change: row.get(7),
                    pct_chg: row.get(8),
                    vol: row.get(9),
                    amount: row.get(10),
                    money_flow: money_flow_from_nullable(&flow),
                }
            })
            .collect())
    }

    fn list_stocks(&self, markets: &[String]) -> Result<Vec<StockInfo>, LeadscanError> {
        let rows = self
            .conn()?
            .query(
                "SELECT ts_code, name, market FROM stocks_base WHERE market = ANY($1) ORDER BY ts_code",
                &[&markets],
            )
            .map_err(query_error)?;

        Ok(rows
            .into_iter()
            .map(|row| StockInfo {
                code: row.get(0),
                name: row.get(1),
                market: row.get(2),
            })
            .collect())
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, LeadscanError> {
        let row = self
            .conn()?
            .query_one(
                "SELECT MIN(trade_date), MAX(trade_date), COUNT(*) FROM stock_daily WHERE ts_code = $1",
                &[&code],
            )
            .map_err(query_error)?;

        let min: Option<NaiveDate> = row.get(0);
        let max: Option<NaiveDate> = row.get(1);
        let count: i64 = row.get(2);

        match (min, max) {
            (Some(min), Some(max)) if count > 0 => Ok(Some((min, max, count as usize))),
            _ => Ok(None),
        }
    }
}

impl StorePort for PostgresAdapter {
    fn save_tier(&self, result: &TierResult) -> Result<(), LeadscanError> {
        let tier = i16::from(result.tier.code());
        self.conn()?
            .execute(
                "INSERT INTO stock_leader_tier (ts_code, trade_date, name, tier) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (ts_code, trade_date) DO UPDATE SET name = EXCLUDED.name, tier = EXCLUDED.tier",
                &[&result.code, &result.trade_date, &result.name, &tier],
            )
            .map_err(query_error)?;
        Ok(())
    }

    fn save_signals(&self, signals: &[SignalRecord]) -> Result<(), LeadscanError> {
        let mut conn = self.conn()?;
        let mut tx = conn.transaction().map_err(query_error)?;
        for s in signals {
            let flags: [i16; 6] = [
                s.trend_buy.into(),
                s.trend_sell.into(),
                s.exit_buy.into(),
                s.exit_sell.into(),
                s.entry_buy.into(),
                s.build_area.into(),
            ];
            tx.execute(
                "INSERT INTO stock_daily_signal \
                 (ts_code, trade_date, trend_buy, trend_sell, exit_buy, exit_sell, dynamic_line, entry_buy, build_area) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 ON CONFLICT (ts_code, trade_date) DO UPDATE SET \
                 trend_buy = EXCLUDED.trend_buy, trend_sell = EXCLUDED.trend_sell, \
                 exit_buy = EXCLUDED.exit_buy, exit_sell = EXCLUDED.exit_sell, \
                 dynamic_line = EXCLUDED.dynamic_line, entry_buy = EXCLUDED.entry_buy, \
                 build_area = EXCLUDED.build_area",
                &[
                    &s.code,
                    &s.trade_date,
                    &flags[0],
                    &flags[1],
                    &flags[2],
                    &flags[3],
                    &s.dynamic_line,
                    &flags[4],
                    &flags[5],
                ],
            )
            .map_err(query_error)?;
        }
        tx.commit().map_err(query_error)?;
        Ok(())
    }
}
