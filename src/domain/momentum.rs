//! Momentum-flow columns: multi-day percentage changes and buy/sell amount
//! ratios per trade-size bucket.
//!
//! These columns are never 0-filled. An undefined value has to fail every
//! threshold comparison in the tier cascade, and a fabricated 0 would not.

use crate::domain::daily::{MoneyFlow, SizeBucket};
use crate::domain::enrich::EnrichedSeries;
use crate::domain::indicator::ratio;
use crate::domain::indicator::rolling::pct_change;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumColumns {
    pub pct_chg2: Option<f64>,
    pub pct_chg3: Option<f64>,
    pub pct_chg5: Option<f64>,
    /// Super-large plus large buy amount over the matching sell amount.
    pub ellg_amount_rate: Option<f64>,
    pub elg_amount_rate: Option<f64>,
    pub lg_amount_rate: Option<f64>,
    pub md_amount_rate: Option<f64>,
    pub sm_amount_rate: Option<f64>,
    pub buy_elg_amount: f64,
    pub buy_lg_amount: f64,
    pub buy_md_amount: f64,
    pub buy_sm_amount: f64,
}

impl MomentumColumns {
    fn from_flow(
        flow: &MoneyFlow,
        pct_chg2: Option<f64>,
        pct_chg3: Option<f64>,
        pct_chg5: Option<f64>,
    ) -> Self {
        let rate = |bucket| {
            let side = flow.bucket(bucket);
            ratio(side.buy_amount, side.sell_amount)
        };
        Self {
            pct_chg2,
            pct_chg3,
            pct_chg5,
            ellg_amount_rate: ratio(
                flow.super_large.buy_amount + flow.large.buy_amount,
                flow.super_large.sell_amount + flow.large.sell_amount,
            ),
            elg_amount_rate: rate(SizeBucket::SuperLarge),
            lg_amount_rate: rate(SizeBucket::Large),
            md_amount_rate: rate(SizeBucket::Medium),
            sm_amount_rate: rate(SizeBucket::Small),
            buy_elg_amount: flow.super_large.buy_amount,
            buy_lg_amount: flow.large.buy_amount,
            buy_md_amount: flow.medium.buy_amount,
            buy_sm_amount: flow.small.buy_amount,
        }
    }
}

/// Rows whose record carries no money flow are left without momentum columns.
pub fn add_momentum_flow(series: &mut EnrichedSeries) {
    let closes = series.closes();
    let chg2 = pct_change(&closes, 2);
    let chg3 = pct_change(&closes, 3);
    let chg5 = pct_change(&closes, 5);

    for (i, row) in series.rows.iter_mut().enumerate() {
        row.momentum = row
            .record
            .money_flow
            .as_ref()
            .map(|flow| MomentumColumns::from_flow(flow, chg2[i], chg3[i], chg5[i]));
    }
}
