//! Derived-column engine over one symbol's ordered daily series.
//!
//! Each `add_*` step computes its columns from a trailing window, applies
//! [`WarmupFill::Zero`] to what it publishes, and stores the result on every
//! row of the series. No step reads future rows except [`add_forward_labels`].

use crate::domain::daily::DailyRecord;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::ewm::ewm_mean;
use crate::domain::indicator::rolling::{rolling_max, rolling_min};
use crate::domain::indicator::slope::linreg_slope;
use crate::domain::indicator::{
    Column, WarmupFill, compare, compare_prev, lift, position_in_range,
};
use crate::domain::momentum::{MomentumColumns, add_momentum_flow};
use chrono::NaiveDate;
use std::collections::HashSet;

pub const TREND_FAST_SPAN: usize = 2;
pub const TREND_MID_SPAN: usize = 5;
pub const TREND_SLOW_SPAN: usize = 30;
pub const SLOPE_WINDOW: usize = 21;
pub const SLOPE_SCALE: f64 = 20.0;
pub const SLOPE_EMA_SPAN: usize = 42;

pub const EXIT_LOW_WINDOW: usize = 10;
pub const EXIT_HIGH_WINDOW: usize = 25;
pub const EXIT_SCALE: f64 = 4.0;
pub const EXIT_SMOOTH_SPAN: usize = 4;

pub const ENTRY_WINDOW: usize = 5;
pub const ENTRY_SMOOTH_SPAN: usize = 3;
pub const ENTRY_BUY_THRESHOLD: f64 = 8.0;
pub const BASE_LOW_WINDOW: usize = 34;
pub const BASE_HIGH_WINDOW: usize = 27;
pub const BASE_EMA_SPAN: usize = 4;
pub const BASE_SCALE: f64 = 25.0;
pub const BASE_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceDeltas {
    pub open_minus_close: f64,
    pub high_minus_low: f64,
}

/// Next-day labels for prediction-style consumers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForwardLabels {
    /// +1 when the next close is higher, otherwise -1; 0 on the final row.
    pub target_cls: i8,
    pub target_reg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendCrossover {
    pub ema_2: f64,
    pub ema_5: f64,
    pub ema_30: f64,
    pub slope_adjusted: f64,
    pub ema_42: f64,
    pub buy_signal: u8,
    pub sell_signal: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitSignal {
    pub llv_10: f64,
    pub hhv_25: f64,
    /// Smoothed oscillator in [0, 4].
    pub dynamic_line: f64,
    pub buy_signal: u8,
    pub sell_signal: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntrySignal {
    pub var1: f64,
    pub base_line: f64,
    pub buy_signal: u8,
    pub build_area_signal: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    pub record: DailyRecord,
    pub deltas: Option<PriceDeltas>,
    pub labels: Option<ForwardLabels>,
    pub trend: Option<TrendCrossover>,
    pub exit: Option<ExitSignal>,
    pub entry: Option<EntrySignal>,
    pub momentum: Option<MomentumColumns>,
}

impl EnrichedRow {
    fn bare(record: DailyRecord) -> Self {
        Self {
            record,
            deltas: None,
            labels: None,
            trend: None,
            exit: None,
            entry: None,
            momentum: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.record.date
    }
}

/// A date-ordered daily series with derived columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnrichedSeries {
    pub rows: Vec<EnrichedRow>,
}

impl EnrichedSeries {
    /// Sort ascending by date and keep the first record seen for each date.
    pub fn from_records(records: &[DailyRecord]) -> Self {
        let mut sorted: Vec<&DailyRecord> = records.iter().collect();
        sorted.sort_by_key(|r| r.date);

        let mut seen = HashSet::with_capacity(sorted.len());
        let mut rows = Vec::with_capacity(sorted.len());
        for record in sorted {
            if !seen.insert(record.date) {
                tracing::warn!(
                    code = %record.code,
                    date = %record.date,
                    "dropping duplicate daily record"
                );
                continue;
            }
            rows.push(EnrichedRow::bare(record.clone()));
        }
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<&EnrichedRow> {
        self.rows.last()
    }

    pub fn closes(&self) -> Column {
        lift(self.rows.iter().map(|r| r.record.close))
    }

    pub fn highs(&self) -> Column {
        lift(self.rows.iter().map(|r| r.record.high))
    }

    pub fn lows(&self) -> Column {
        lift(self.rows.iter().map(|r| r.record.low))
    }
}

/// Order the records and compute every column used for tiering and signals.
pub fn enrich(records: &[DailyRecord]) -> EnrichedSeries {
    let mut series = EnrichedSeries::from_records(records);
    add_price_deltas(&mut series);
    add_trend_crossover(&mut series);
    add_oscillator_exit_signal(&mut series);
    add_entry_signal(&mut series);
    add_momentum_flow(&mut series);
    tracing::debug!(rows = series.len(), "series enriched");
    series
}

pub fn add_price_deltas(series: &mut EnrichedSeries) {
    for row in &mut series.rows {
        row.deltas = Some(PriceDeltas {
            open_minus_close: row.record.open_minus_close(),
            high_minus_low: row.record.high_minus_low(),
        });
    }
}

pub fn add_forward_labels(series: &mut EnrichedSeries) {
    let closes: Vec<f64> = series.rows.iter().map(|r| r.record.close).collect();
    let fill = WarmupFill::Zero.value();
    for (i, row) in series.rows.iter_mut().enumerate() {
        row.labels = Some(match closes.get(i + 1) {
            Some(&next) => ForwardLabels {
                target_cls: if next > closes[i] { 1 } else { -1 },
                target_reg: next - closes[i],
            },
            None => ForwardLabels {
                target_cls: fill as i8,
                target_reg: fill,
            },
        });
    }
}

pub fn add_trend_crossover(series: &mut EnrichedSeries) {
    let closes = series.closes();
    let ema_2 = calculate_ema(&closes, TREND_FAST_SPAN);
    let ema_5 = calculate_ema(&closes, TREND_MID_SPAN);
    let ema_30 = calculate_ema(&closes, TREND_SLOW_SPAN);

    let slope_adjusted: Column = linreg_slope(&closes, SLOPE_WINDOW)
        .iter()
        .zip(&closes)
        .map(|(slope, close)| Some((*slope)? * SLOPE_SCALE + (*close)?))
        .collect();
    let ema_42 = calculate_ema(&slope_adjusted, SLOPE_EMA_SPAN);

    let buy = compare(&ema_2, &ema_42, |fast, slow| fast >= slow);
    let sell = compare(&ema_2, &ema_42, |fast, slow| fast < slow);

    let fill = WarmupFill::Zero;
    let ema_2 = fill.apply(&ema_2);
    let ema_5 = fill.apply(&ema_5);
    let ema_30 = fill.apply(&ema_30);
    let slope_adjusted = fill.apply(&slope_adjusted);
    let ema_42 = fill.apply(&ema_42);
    let buy = fill.apply_flags(&buy);
    let sell = fill.apply_flags(&sell);

    for (i, row) in series.rows.iter_mut().enumerate() {
        row.trend = Some(TrendCrossover {
            ema_2: ema_2[i],
            ema_5: ema_5[i],
            ema_30: ema_30[i],
            slope_adjusted: slope_adjusted[i],
            ema_42: ema_42[i],
            buy_signal: buy[i],
            sell_signal: sell[i],
        });
    }
}

pub fn add_oscillator_exit_signal(series: &mut EnrichedSeries) {
    let closes = series.closes();
    let llv_10 = rolling_min(&series.lows(), EXIT_LOW_WINDOW);
    let hhv_25 = rolling_max(&series.highs(), EXIT_HIGH_WINDOW);

    let oscillator = position_in_range(&closes, &llv_10, &hhv_25, EXIT_SCALE);
    let dynamic_line = ewm_mean(&oscillator, EXIT_SMOOTH_SPAN);

    let buy = compare_prev(&dynamic_line, |cur, prev| cur > prev);
    let sell = compare_prev(&dynamic_line, |cur, prev| cur <= prev);

    let fill = WarmupFill::Zero;
    let llv_10 = fill.apply(&llv_10);
    let hhv_25 = fill.apply(&hhv_25);
    let dynamic_line = fill.apply(&dynamic_line);
    let buy = fill.apply_flags(&buy);
    let sell = fill.apply_flags(&sell);

    for (i, row) in series.rows.iter_mut().enumerate() {
        row.exit = Some(ExitSignal {
            llv_10: llv_10[i],
            hhv_25: hhv_25[i],
            dynamic_line: dynamic_line[i],
            buy_signal: buy[i],
            sell_signal: sell[i],
        });
    }
}

pub fn add_entry_signal(series: &mut EnrichedSeries) {
    let closes = series.closes();
    let lows = series.lows();
    let highs = series.highs();

    let rsv = position_in_range(
        &closes,
        &rolling_min(&lows, ENTRY_WINDOW),
        &rolling_max(&highs, ENTRY_WINDOW),
        100.0,
    );
    let k = ewm_mean(&rsv, ENTRY_SMOOTH_SPAN);
    let d = ewm_mean(&k, ENTRY_SMOOTH_SPAN);
    let var1: Column = k
        .iter()
        .zip(&d)
        .map(|(k, d)| Some(3.0 * (*k)? - 2.0 * (*d)?))
        .collect();

    let base_raw = position_in_range(
        &closes,
        &rolling_min(&lows, BASE_LOW_WINDOW),
        &rolling_max(&highs, BASE_HIGH_WINDOW),
        EXIT_SCALE,
    );
    let base_line: Column = calculate_ema(&base_raw, BASE_EMA_SPAN)
        .into_iter()
        .map(|v| v.map(|v| v * BASE_SCALE))
        .collect();

    let buy: Vec<Option<bool>> = var1.iter().map(|v| v.map(|v| v < ENTRY_BUY_THRESHOLD)).collect();
    let build_area: Vec<Option<bool>> = base_line
        .iter()
        .map(|v| v.map(|v| v < BASE_THRESHOLD))
        .collect();

    let fill = WarmupFill::Zero;
    let var1 = fill.apply(&var1);
    let base_line = fill.apply(&base_line);
    let buy = fill.apply_flags(&buy);
    let build_area = fill.apply_flags(&build_area);

    for (i, row) in series.rows.iter_mut().enumerate() {
        row.entry = Some(EntrySignal {
            var1: var1[i],
            base_line: base_line[i],
            buy_signal: buy[i],
            build_area_signal: build_area[i],
        });
    }
}
