//! Table layout shared by the SQL adapters.

use crate::domain::daily::{FlowSide, MoneyFlow};

pub const MONEY_FLOW_COLUMNS: [&str; 18] = [
    "buy_sm_vol",
    "buy_sm_amount",
    "sell_sm_vol",
    "sell_sm_amount",
    "buy_md_vol",
    "buy_md_amount",
    "sell_md_vol",
    "sell_md_amount",
    "buy_lg_vol",
    "buy_lg_amount",
    "sell_lg_vol",
    "sell_lg_amount",
    "buy_elg_vol",
    "buy_elg_amount",
    "sell_elg_vol",
    "sell_elg_amount",
    "net_mf_vol",
    "net_mf_amount",
];

fn side(values: &[f64]) -> FlowSide {
    FlowSide {
        buy_vol: values[0],
        buy_amount: values[1],
        sell_vol: values[2],
        sell_amount: values[3],
    }
}

/// Values in [`MONEY_FLOW_COLUMNS`] order.
pub fn money_flow_from_values(values: &[f64; 18]) -> MoneyFlow {
    MoneyFlow {
        small: side(&values[0..4]),
        medium: side(&values[4..8]),
        large: side(&values[8..12]),
        super_large: side(&values[12..16]),
        net_vol: values[16],
        net_amount: values[17],
    }
}

/// A LEFT JOIN miss yields all-`NULL` money-flow columns.
pub fn money_flow_from_nullable(values: &[Option<f64>; 18]) -> Option<MoneyFlow> {
    let mut out = [0.0; 18];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = (*value)?;
    }
    Some(money_flow_from_values(&out))
}

pub fn money_flow_values(flow: &MoneyFlow) -> [f64; 18] {
    let mut out = [0.0; 18];
    for (i, s) in [flow.small, flow.medium, flow.large, flow.super_large]
        .iter()
        .enumerate()
    {
        out[i * 4] = s.buy_vol;
        out[i * 4 + 1] = s.buy_amount;
        out[i * 4 + 2] = s.sell_vol;
        out[i * 4 + 3] = s.sell_amount;
    }
    out[16] = flow.net_vol;
    out[17] = flow.net_amount;
    out
}

pub fn money_flow_select_list(alias: &str) -> String {
    MONEY_FLOW_COLUMNS
        .iter()
        .map(|c| format!("{alias}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_map_to_buckets() {
        let mut values = [0.0; 18];
        values[13] = 42.0; // buy_elg_amount
        values[3] = 7.0; // sell_sm_amount
        let flow = money_flow_from_values(&values);
        assert_eq!(flow.super_large.buy_amount, 42.0);
        assert_eq!(flow.small.sell_amount, 7.0);
        assert_eq!(money_flow_values(&flow), values);
    }

    #[test]
    fn any_null_means_no_flow() {
        let mut values = [Some(1.0); 18];
        assert!(money_flow_from_nullable(&values).is_some());
        values[5] = None;
        assert!(money_flow_from_nullable(&values).is_none());
    }

    #[test]
    fn select_list_is_aliased() {
        let list = money_flow_select_list("m");
        assert!(list.starts_with("m.buy_sm_vol, m.buy_sm_amount"));
        assert!(list.ends_with("m.net_mf_amount"));
    }
}
