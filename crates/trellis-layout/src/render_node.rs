//! Render node tree data structures.
//!
//! A [`RenderNode`] is the immutable result of laying out one node: its
//! resolved size, its positioned children, and the identity/reuse/animation
//! metadata the render engine needs. Trees are built bottom-up by the layout
//! algorithms and may be cached across frames as long as the constraint that
//! produced them is unchanged.

use std::fmt;
use std::rc::Rc;

use trellis_core::{Animator, Axis, Point, Rect, Size};

use crate::component::ViewContent;
use crate::lazy::LazyContent;

/// How a leaf's live view is recycled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReuseStrategy {
    /// Reuse views of the same content type
    #[default]
    Automatic,
    /// Reuse views enqueued under this key
    Key(String),
    /// Always create a fresh view
    NoReuse,
}

/// Typographic metrics reported by a node for baseline alignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    /// Distance from the top edge to the first baseline
    pub ascender: f64,
    /// Distance from the last baseline to the bottom edge
    pub descender: f64,
}

/// What a node renders on its own, independent of its children.
#[derive(Clone, Default)]
pub enum NodeContent {
    /// Nothing; pure container or spacer
    #[default]
    Empty,
    /// A view-backed leaf
    View(Rc<dyn ViewContent>),
    /// Content laid out on first visibility
    Lazy(Rc<LazyContent>),
}

impl fmt::Debug for NodeContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeContent::Empty => f.write_str("Empty"),
            NodeContent::View(content) => write!(f, "View({})", content.reuse_key()),
            NodeContent::Lazy(lazy) => write!(f, "Lazy(materialized: {})", lazy.is_materialized()),
        }
    }
}

/// Child ordering hint used to speed up visibility queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum ChildOrder {
    /// No ordering; visibility scans every child
    #[default]
    Unordered,
    /// Children are packed along the axis without going backwards
    Sorted(Axis),
}

/// Immutable output of one layout call.
#[derive(Clone, Default)]
pub struct RenderNode {
    size: Size,
    children: Vec<RenderNode>,
    positions: Vec<Point>,
    id: Option<String>,
    reuse: Option<ReuseStrategy>,
    animator: Option<Rc<dyn Animator>>,
    content: NodeContent,
    baseline: Option<Baseline>,
    pub(crate) order: ChildOrder,
}

impl RenderNode {
    /// A childless node that renders nothing.
    pub fn spacer(size: Size) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    /// A view-backed leaf.
    pub fn view(size: Size, content: Rc<dyn ViewContent>) -> Self {
        Self {
            size,
            content: NodeContent::View(content),
            ..Default::default()
        }
    }

    /// A leaf whose content is laid out on first visibility.
    pub fn lazy(size: Size, content: Rc<LazyContent>) -> Self {
        Self {
            size,
            content: NodeContent::Lazy(content),
            ..Default::default()
        }
    }

    /// A container with positioned children.
    ///
    /// `positions` must be as long as `children`; missing positions default to
    /// the origin and extra ones are dropped.
    pub fn container(size: Size, children: Vec<RenderNode>, mut positions: Vec<Point>) -> Self {
        debug_assert_eq!(children.len(), positions.len());
        positions.resize(children.len(), Point::ZERO);
        Self {
            size,
            children,
            positions,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_reuse(mut self, reuse: ReuseStrategy) -> Self {
        self.reuse = Some(reuse);
        self
    }

    pub fn with_animator(mut self, animator: Rc<dyn Animator>) -> Self {
        self.animator = Some(animator);
        self
    }

    pub fn with_baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = Some(baseline);
        self
    }

    pub(crate) fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub(crate) fn with_order(mut self, order: ChildOrder) -> Self {
        self.order = order;
        self
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn children(&self) -> &[RenderNode] {
        &self.children
    }

    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn reuse_strategy(&self) -> Option<&ReuseStrategy> {
        self.reuse.as_ref()
    }

    pub fn animator(&self) -> Option<&Rc<dyn Animator>> {
        self.animator.as_ref()
    }

    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Distance from the top edge to the first baseline.
    ///
    /// Nodes without metrics use their bottom edge.
    pub fn ascender(&self) -> f64 {
        self.baseline.map(|b| b.ascender).unwrap_or(self.size.height)
    }

    /// Distance from the last baseline to the bottom edge.
    pub fn descender(&self) -> f64 {
        self.baseline.map(|b| b.descender).unwrap_or(0.0)
    }

    pub fn baseline(&self) -> Option<Baseline> {
        self.baseline
    }

    /// Frame of child `index` in this node's coordinate space.
    pub fn child_frame(&self, index: usize) -> Rect {
        Rect::from_origin_size(self.positions[index], self.children[index].size)
    }

    /// Indices of direct children intersecting `rect` (local coordinates).
    pub fn visible_indexes(&self, rect: Rect) -> Vec<usize> {
        if rect.is_empty() || self.children.is_empty() {
            return Vec::new();
        }

        match self.order {
            ChildOrder::Sorted(axis) => {
                let lo = rect.origin.along(axis);
                let hi = lo + rect.size.along(axis);
                let start = partition_point(self.children.len(), |i| {
                    self.positions[i].along(axis) + self.children[i].size.along(axis) <= lo
                });
                let end = partition_point(self.children.len(), |i| self.positions[i].along(axis) < hi);
                (start..end.max(start))
                    .filter(|&i| rect.intersects(&self.child_frame(i)))
                    .collect()
            }
            ChildOrder::Unordered => (0..self.children.len())
                .filter(|&i| rect.intersects(&self.child_frame(i)))
                .collect(),
        }
    }

    /// Number of nodes in this subtree, lazily materialized content excluded.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(RenderNode::node_count).sum::<usize>()
    }
}

/// First index in `0..len` for which `pred` is false, assuming `pred` holds for
/// a prefix of the range.
fn partition_point(len: usize, pred: impl Fn(usize) -> bool) -> usize {
    let (mut lo, mut hi) = (0, len);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

impl fmt::Debug for RenderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderNode")
            .field("size", &self.size)
            .field("id", &self.id)
            .field("reuse", &self.reuse)
            .field("animated", &self.animator.is_some())
            .field("content", &self.content)
            .field("positions", &self.positions)
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(count: usize, extent: f64) -> RenderNode {
        let children = (0..count)
            .map(|_| RenderNode::spacer(Size::new(extent, extent)))
            .collect();
        let positions = (0..count)
            .map(|i| Point::new(i as f64 * extent, 0.0))
            .collect();
        RenderNode::container(Size::new(count as f64 * extent, extent), children, positions)
    }

    #[test]
    fn test_visible_indexes_unordered() {
        let node = row(10, 10.0);
        assert_eq!(node.visible_indexes(Rect::new(15.0, 0.0, 20.0, 10.0)), vec![1, 2, 3]);
    }

    #[test]
    fn test_visible_indexes_sorted_matches_scan() {
        let scan = row(100, 10.0);
        let sorted = row(100, 10.0).with_order(ChildOrder::Sorted(Axis::Horizontal));
        for start in [0.0, 5.0, 95.0, 500.0, 990.0, 2000.0] {
            let rect = Rect::new(start, 0.0, 37.0, 10.0);
            assert_eq!(sorted.visible_indexes(rect), scan.visible_indexes(rect));
        }
    }

    #[test]
    fn test_visible_indexes_empty_rect() {
        let node = row(3, 10.0);
        assert!(node.visible_indexes(Rect::new(0.0, 0.0, 0.0, 10.0)).is_empty());
    }

    #[test]
    fn test_container_pads_positions() {
        let node = RenderNode::container(
            Size::new(10.0, 10.0),
            vec![RenderNode::spacer(Size::new(1.0, 1.0))],
            vec![Point::new(2.0, 3.0)],
        );
        assert_eq!(node.positions().len(), node.children().len());
        assert_eq!(node.child_frame(0), Rect::new(2.0, 3.0, 1.0, 1.0));
    }

    #[test]
    fn test_default_baseline() {
        let node = RenderNode::spacer(Size::new(10.0, 20.0));
        assert_eq!(node.ascender(), 20.0);
        assert_eq!(node.descender(), 0.0);
        let text = node.with_baseline(Baseline {
            ascender: 14.0,
            descender: 4.0,
        });
        assert_eq!(text.ascender(), 14.0);
    }
}
