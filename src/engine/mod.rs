//! Engine - Scene registry and subscription lists.
//!
//! - Registry: node allocation, parent/child links, provided contexts
//! - Subscriptions: ordered cleanup lists released newest-first
//!
//! # Architecture
//!
//! Components never hold each other. Every node is an index into the
//! thread-local registry, and every link (parent, children, the context a
//! node provides) is resolved through it:
//!
//! ```text
//! #0 Root       (parent=None, provides ctx depth 1)
//! #1 Mesh panel (parent=#0)
//! #2 Container  (parent=#0, provides ctx depth 2)
//! #3 Text       (parent=#2)
//! ```

mod registry;
mod subscriptions;

pub use registry::*;
pub use subscriptions::*;
