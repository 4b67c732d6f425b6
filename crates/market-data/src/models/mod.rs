//! Market data models
//!
//! Data shapes shared by every quote backend:
//! - `quote` - latest quote and daily historical bar structures
//! - `tick` - streaming price update

mod quote;
mod tick;

pub use quote::{HistoricalBar, Quote};
pub use tick::StreamTick;
