//! Reconciliation and view reuse for Trellis.
//!
//! This crate keeps a host container's live views in sync with a laid-out
//! [`trellis_layout::RenderNode`] tree.
//!
//! # Architecture
//!
//! 1. **Engine**: owns the root node and the cached tree; diffs the visible
//!    renderables of each pass against the previous pass by identity
//! 2. **Host**: the container supplying bounds and content offset and
//!    receiving the ordered view list
//! 3. **Pool**: a keyed LIFO cache of retired views, bulk-evicted after an
//!    idle TTL
//!
//! # Example
//!
//! ```ignore
//! use trellis_render::Engine;
//!
//! let mut engine = Engine::new(EngineConfig::default())?;
//! engine.set_component(Stack::vertical(rows));
//!
//! // From the host's layout callback
//! let stats = engine.layout_if_needed(&mut host);
//! ```

mod engine;
mod host;
mod pool;

pub use engine::{Engine, EngineHandle, ReconcileStats};
pub use host::Host;
pub use pool::{Clock, ManualClock, ReusePool, SharedPool, SystemClock};
