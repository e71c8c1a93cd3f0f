use serde::{Deserialize, Serialize};

pub type Tick = i32;

/// Per-tick bookkeeping. `liquidity_net` is the signed amount applied when
/// the price crosses this tick; `liquidity_gross` counts every range boundary
/// referencing it. A tick whose gross drains to zero is dropped from the
/// ledger and its bitmap bit flipped back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInfo {
    pub liquidity_net:   i128,
    pub liquidity_gross: u128
}
