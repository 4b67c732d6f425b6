//! Manual holding adjustments: overrides and removals layered on top of the
//! computed portfolio without touching the transaction ledger.

mod adjustments_model;
mod overlay;


pub use adjustments_model::ManualAdjustment;
pub use overlay::AdjustmentOverlay;
