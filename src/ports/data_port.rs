//! Data access port trait.

use crate::domain::daily::{DailyRecord, StockInfo};
use crate::domain::error::LeadscanError;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily records for `code` with `start_date <= date <= end_date`, ascending
    /// by date, with money flow joined where the source has it.
    fn fetch_daily(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyRecord>, LeadscanError>;

    /// Listed stocks in any of `markets`, ordered by code.
    fn list_stocks(&self, markets: &[String]) -> Result<Vec<StockInfo>, LeadscanError>;

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, LeadscanError>;
}
