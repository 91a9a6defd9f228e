//! Layout for Trellis trees.
//!
//! This crate turns a declarative [`Node`] tree into an immutable
//! [`RenderNode`] tree under a [`Constraint`](trellis_core::Constraint), and
//! flattens that tree into visible [`Renderable`] leaves for a viewport.
//!
//! # Architecture
//!
//! 1. **Layout**: a single top-down pass; each node gets one constraint and
//!    returns its size and positioned children
//! 2. **Identity**: a pass-scoped [`LayoutContext`] hands out implicit ids and
//!    caches intrinsic measurements
//! 3. **Visibility**: only children intersecting the viewport are visited, so
//!    flattening costs O(visible leaves)
//!
//! # Example
//!
//! ```ignore
//! use trellis_layout::{Layout, LayoutContext, Node, Stack};
//!
//! let list: Node = Stack::vertical(rows).with_spacing(8.0).into();
//! let tree = list.layout(&mut LayoutContext::new(), Constraint::loose(viewport.size));
//!
//! for leaf in tree.visible_renderables(viewport) {
//!     println!("{}: {:?}", leaf.id, leaf.frame);
//! }
//! ```

mod component;
mod context;
mod decoration;
mod distribute;
mod flow;
mod grid;
mod lazy;
mod node;
mod pager;
mod render_node;
mod stack;
mod visibility;
mod waterfall;

pub use component::{Component, LeafSizing, ViewComponent, ViewContent, ViewLeaf};
pub use context::{LayoutContext, MeasurementCache, SavedContext, AUTO_ID_PREFIX};
pub use decoration::{
    Background, Badge, BadgeAnchor, BadgePlacement, ConstraintOverride, Insets, Offset, Overlay,
    SizeRule, ZStack,
};
pub use distribute::{distribute, CrossAlign, ItemAlignment, Justify};
pub use flow::Flow;
pub use grid::{Grid, GridItem, Span, Track};
pub use lazy::{Lazy, LazyContent};
pub use node::{Flex, FlexItem, Layout, Modified, Node};
pub use pager::{ErrorPlaceholder, Pager, PlaceholderView, PLACEHOLDER_SIZE};
pub use render_node::{Baseline, NodeContent, RenderNode, ReuseStrategy};
pub use stack::Stack;
pub use visibility::{Renderable, ROOT_KEY};
pub use waterfall::Waterfall;
