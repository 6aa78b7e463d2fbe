//! State Module - Runtime state shared across components
//!
//! - **Context** - nearest-ancestor context cells and their binding
//! - **Events** - listener registry, dispatch, reactive handler binding

pub mod context;
pub mod events;

pub use context::*;
pub use events::*;
