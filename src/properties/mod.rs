//! Properties - Records and the merge engine.
//!
//! - [`PropertyRecord`] - ordered key → [`PropertyValue`] map, built with
//!   [`record!`](crate::record)
//! - [`build_merged`] - reactive precedence view over several record cells
//! - [`Conditionals`] - trigger cells that gate nested records (`hover`, …)
//!
//! Components merge defaults < properties < style.

mod merged;
mod record;

pub use merged::{build_merged, Conditionals, MergedProperties};
pub use record::{record_cell, PropertyRecord, PropertyValue, RecordCell};
