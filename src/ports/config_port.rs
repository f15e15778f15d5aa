//! Configuration access port trait.

use crate::domain::error::LeadscanError;
use chrono::NaiveDate;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Optional `YYYY-MM-DD` value; present but malformed is an error.
    fn get_date(&self, section: &str, key: &str) -> Result<Option<NaiveDate>, LeadscanError> {
        match self.get_string(section, key).filter(|s| !s.trim().is_empty()) {
            None => Ok(None),
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map(Some)
                .map_err(|_| LeadscanError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("invalid date `{raw}` (expected YYYY-MM-DD)"),
                }),
        }
    }
}
