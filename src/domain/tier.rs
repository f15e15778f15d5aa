//! Leading-stock tier classification of the latest trading day.
//!
//! The cascade is first-match-wins:
//!
//! 1. 1-day change in (-1%, 5%]: emerging or speculative depending on the
//!    super-large amount ratio and buy amount, otherwise no tier.
//! 2. Any breakout window (1d > 5%, 2d > 10%, 3d > 15%, 5d > 20%): leader
//!    tiers when super-large buying is heavy, unsupported breakout when it
//!    is light.
//!
//! Branch 1 never falls through to branch 2.

use crate::domain::enrich::EnrichedSeries;
use crate::domain::error::LeadscanError;
use crate::domain::momentum::MomentumColumns;
use chrono::NaiveDate;
use std::fmt;

pub const MODERATE_FLOOR_PCT: f64 = -1.0;
pub const MODERATE_CEIL_PCT: f64 = 5.0;
pub const BREAKOUT_1D_PCT: f64 = 5.0;
pub const BREAKOUT_2D_PCT: f64 = 10.0;
pub const BREAKOUT_3D_PCT: f64 = 15.0;
pub const BREAKOUT_5D_PCT: f64 = 20.0;

pub const EMERGING_RATIO: f64 = 1.8;
pub const SPECULATIVE_RATIO: f64 = 1.2;
pub const DOMINANT_RATIO: f64 = 1.55;
pub const STRONG_RATIO: f64 = 1.2;
pub const SUPER_LARGE_BUY_FLOOR: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    DominantLeader,
    StrongLeader,
    Emerging,
    Speculative,
    UnsupportedBreakout,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::DominantLeader,
        Tier::StrongLeader,
        Tier::Emerging,
        Tier::Speculative,
        Tier::UnsupportedBreakout,
    ];

    pub fn code(self) -> u8 {
        match self {
            Tier::DominantLeader => 0,
            Tier::StrongLeader => 1,
            Tier::Emerging => 2,
            Tier::Speculative => 3,
            Tier::UnsupportedBreakout => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::DominantLeader => "dominant-leader",
            Tier::StrongLeader => "strong-leader",
            Tier::Emerging => "emerging",
            Tier::Speculative => "speculative",
            Tier::UnsupportedBreakout => "unsupported-breakout",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.code())
    }
}

/// Outcome of classifying one symbol's latest row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierResult {
    pub tier: Tier,
    pub name: String,
    pub code: String,
    pub trade_date: NaiveDate,
}

/// Inputs read from the latest row by the cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeInputs {
    pub pct_chg: f64,
    pub pct_chg2: Option<f64>,
    pub pct_chg3: Option<f64>,
    pub pct_chg5: Option<f64>,
    pub elg_amount_rate: Option<f64>,
    pub buy_elg_amount: f64,
}

impl CascadeInputs {
    pub fn new(pct_chg: f64, momentum: &MomentumColumns) -> Self {
        Self {
            pct_chg,
            pct_chg2: momentum.pct_chg2,
            pct_chg3: momentum.pct_chg3,
            pct_chg5: momentum.pct_chg5,
            elg_amount_rate: momentum.elg_amount_rate,
            buy_elg_amount: momentum.buy_elg_amount,
        }
    }
}

fn above(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v > threshold)
}

fn at_least(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v >= threshold)
}

fn within(value: Option<f64>, low: f64, high: f64) -> bool {
    value.is_some_and(|v| v >= low && v < high)
}

/// Run the decision cascade; `None` means no tier applies.
pub fn evaluate_cascade(inputs: &CascadeInputs) -> Option<Tier> {
    let day = Some(inputs.pct_chg);
    let ratio = inputs.elg_amount_rate;
    let heavy_buying = inputs.buy_elg_amount > SUPER_LARGE_BUY_FLOOR;

    if above(day, MODERATE_FLOOR_PCT) && !above(day, MODERATE_CEIL_PCT) {
        if at_least(ratio, EMERGING_RATIO) && heavy_buying {
            return Some(Tier::Emerging);
        }
        if within(ratio, SPECULATIVE_RATIO, EMERGING_RATIO)
            || (at_least(ratio, EMERGING_RATIO) && inputs.buy_elg_amount <= SUPER_LARGE_BUY_FLOOR)
        {
            return Some(Tier::Speculative);
        }
        return None;
    }

    let breakout = above(day, BREAKOUT_1D_PCT)
        || above(inputs.pct_chg2, BREAKOUT_2D_PCT)
        || above(inputs.pct_chg3, BREAKOUT_3D_PCT)
        || above(inputs.pct_chg5, BREAKOUT_5D_PCT);
    if !breakout {
        return None;
    }

    if heavy_buying {
        if at_least(ratio, DOMINANT_RATIO) {
            Some(Tier::DominantLeader)
        } else if within(ratio, STRONG_RATIO, DOMINANT_RATIO) {
            Some(Tier::StrongLeader)
        } else {
            None
        }
    } else {
        Some(Tier::UnsupportedBreakout)
    }
}

/// Classify the most recent row of an enriched series.
///
/// Fails with [`LeadscanError::Precondition`] when the series is empty or its
/// latest row lacks momentum columns. A row that matches no rule is `Ok(None)`.
pub fn classify_latest(
    enriched: &EnrichedSeries,
    symbol_id: &str,
    symbol_name: &str,
) -> Result<Option<TierResult>, LeadscanError> {
    let latest = enriched
        .latest()
        .ok_or(LeadscanError::Precondition { column: "latest_row" })?;
    let momentum = latest
        .momentum
        .as_ref()
        .ok_or(LeadscanError::Precondition { column: "momentum" })?;

    let inputs = CascadeInputs::new(latest.record.pct_chg, momentum);
    let tier = evaluate_cascade(&inputs);
    tracing::debug!(code = symbol_id, date = %latest.date(), ?tier, "cascade evaluated");

    Ok(tier.map(|tier| TierResult {
        tier,
        name: symbol_name.to_string(),
        code: symbol_id.to_string(),
        trade_date: latest.date(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(pct_chg: f64, ratio: Option<f64>, buy: f64) -> CascadeInputs {
        CascadeInputs {
            pct_chg,
            pct_chg2: None,
            pct_chg3: None,
            pct_chg5: None,
            elg_amount_rate: ratio,
            buy_elg_amount: buy,
        }
    }

    #[test]
    fn emerging() {
        let tier = evaluate_cascade(&inputs(2.0, Some(2.0), 15_000.0));
        assert_eq!(tier, Some(Tier::Emerging));
    }

    #[test]
    fn speculative_mid_ratio() {
        let tier = evaluate_cascade(&inputs(0.0, Some(1.5), 50_000.0));
        assert_eq!(tier, Some(Tier::Speculative));
    }

    #[test]
    fn speculative_high_ratio_light_buying() {
        assert_eq!(
            evaluate_cascade(&inputs(4.0, Some(2.5), 9_000.0)),
            Some(Tier::Speculative)
        );
        // exactly at the floor counts as light
        assert_eq!(
            evaluate_cascade(&inputs(4.0, Some(2.5), 10_000.0)),
            Some(Tier::Speculative)
        );
    }

    #[test]
    fn moderate_window_bounds() {
        // -1 is excluded, 5 is included
        assert_eq!(evaluate_cascade(&inputs(-1.0, Some(2.0), 15_000.0)), None);
        assert_eq!(
            evaluate_cascade(&inputs(5.0, Some(2.0), 15_000.0)),
            Some(Tier::Emerging)
        );
    }

    #[test]
    fn dominant_leader() {
        let tier = evaluate_cascade(&inputs(6.0, Some(1.6), 12_000.0));
        assert_eq!(tier, Some(Tier::DominantLeader));
    }

    #[test]
    fn strong_leader() {
        let tier = evaluate_cascade(&inputs(7.5, Some(1.3), 12_000.0));
        assert_eq!(tier, Some(Tier::StrongLeader));
    }

    #[test]
    fn breakout_low_ratio_is_none() {
        assert_eq!(evaluate_cascade(&inputs(8.0, Some(1.1), 12_000.0)), None);
    }

    #[test]
    fn unsupported_breakout_on_five_day_window() {
        let mut i = inputs(-3.0, Some(3.0), 5_000.0);
        i.pct_chg5 = Some(25.0);
        assert_eq!(evaluate_cascade(&i), Some(Tier::UnsupportedBreakout));
    }

    #[test]
    fn breakout_on_two_and_three_day_windows() {
        let mut two = inputs(-2.0, Some(1.6), 20_000.0);
        two.pct_chg2 = Some(10.5);
        assert_eq!(evaluate_cascade(&two), Some(Tier::DominantLeader));

        let mut three = inputs(-2.0, Some(1.4), 20_000.0);
        three.pct_chg3 = Some(15.1);
        assert_eq!(evaluate_cascade(&three), Some(Tier::StrongLeader));
    }

    #[test]
    fn moderate_branch_does_not_fall_through() {
        let mut i = inputs(0.5, Some(1.0), 50_000.0);
        i.pct_chg2 = Some(30.0);
        i.pct_chg5 = Some(40.0);
        assert_eq!(evaluate_cascade(&i), None);
    }

    #[test]
    fn undefined_ratio_matches_nothing() {
        assert_eq!(evaluate_cascade(&inputs(2.0, None, 50_000.0)), None);
        assert_eq!(evaluate_cascade(&inputs(9.0, None, 50_000.0)), None);
    }

    #[test]
    fn undefined_ratio_with_light_breakout_is_unsupported() {
        // the light-buying rule does not read the ratio
        assert_eq!(
            evaluate_cascade(&inputs(9.0, None, 100.0)),
            Some(Tier::UnsupportedBreakout)
        );
    }

    #[test]
    fn nan_day_change_matches_nothing() {
        assert_eq!(evaluate_cascade(&inputs(f64::NAN, Some(2.0), 50_000.0)), None);
    }

    #[test]
    fn quiet_day_is_none() {
        assert_eq!(evaluate_cascade(&inputs(-4.0, Some(2.0), 50_000.0)), None);
    }

    #[test]
    fn tier_codes_round_trip_labels() {
        assert_eq!(Tier::DominantLeader.code(), 0);
        assert_eq!(Tier::UnsupportedBreakout.code(), 4);
        assert_eq!(Tier::from_code(2), Some(Tier::Emerging));
        assert_eq!(Tier::from_code(9), None);
        assert_eq!(Tier::Emerging.to_string(), "emerging (2)");
    }

    #[test]
    fn classify_empty_series_is_precondition_error() {
        let err = classify_latest(&EnrichedSeries::default(), "000001.SZ", "PAB").unwrap_err();
        assert!(matches!(err, LeadscanError::Precondition { column: "latest_row" }));
    }
}
