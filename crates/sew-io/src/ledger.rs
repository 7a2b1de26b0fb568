//! Per-style inventory ledger reconstruction.
//!
//! The report shows, for every style, a day-by-day accounting view: demand,
//! fabric receipts, beginning/ending fabric inventory, production,
//! beginning/ending finished-goods inventory, shipments and backlog. The view
//! is rebuilt here from the model and the realised production quantities by
//! plain day-by-day bookkeeping, independent of the simulator's internals.
//!
//! Fabric receipts are shown on their raw arrival day (processing leads are a
//! simulator concern, not an accounting one), and finished goods are counted
//! available on the production day.

use sew_core::{ProblemModel, Solution, StyleId};

/// One day of the accounting view for a single style.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub day: usize,
    pub demand: f64,
    pub fabric_received: f64,
    pub beginning_fabric: f64,
    pub produced: f64,
    pub ending_fabric: f64,
    pub beginning_fg: f64,
    pub shipped: f64,
    pub ending_fg: f64,
    pub backlog: f64,
}

/// Rebuild the full-horizon ledger for one style.
pub fn style_ledger(model: &ProblemModel, solution: &Solution, style: StyleId) -> Vec<LedgerRow> {
    let mut fabric = model.i0_fabric(style);
    let mut fg = model.i0_product(style);
    let mut backlog = model.backlog0(style);

    model
        .days()
        .map(|day| {
            let demand = model.demand(style, day);
            let fabric_received = model.fabric_in(style, day);
            let produced = solution.produced_of(style, day);

            let beginning_fabric = fabric;
            fabric = fabric + fabric_received - produced;
            let ending_fabric = fabric;

            let beginning_fg = fg;
            let available = fg + produced;
            let needed = demand + backlog;
            let shipped = available.min(needed);
            fg = available - shipped;
            backlog = needed - shipped;

            LedgerRow {
                day,
                demand,
                fabric_received,
                beginning_fabric,
                produced,
                ending_fabric,
                beginning_fg,
                shipped,
                ending_fg: fg,
                backlog,
            }
        })
        .collect()
}
