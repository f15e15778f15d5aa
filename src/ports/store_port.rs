//! Result persistence port trait.

use crate::domain::error::LeadscanError;
use crate::domain::signal::SignalRecord;
use crate::domain::tier::TierResult;

/// Port for persisting classification outcomes. Writes are upserts keyed by
/// (code, trade date).
pub trait StorePort {
    fn save_tier(&self, result: &TierResult) -> Result<(), LeadscanError>;

    fn save_signals(&self, signals: &[SignalRecord]) -> Result<(), LeadscanError>;
}
