//! Composition wrappers: insets, background/overlay, badges, offsets, size
//! overrides, and z-stacking.
//!
//! Every wrapper reports a size inside the constraint it was given.

use trellis_core::{Constraint, EdgeInsets, Point, Size};

use crate::context::LayoutContext;
use crate::distribute::ItemAlignment;
use crate::node::{Layout, Node};
use crate::render_node::{Baseline, RenderNode};

/// Padding around a child.
#[derive(Debug, Clone)]
pub struct Insets {
    pub child: Node,
    pub insets: EdgeInsets,
}

impl Insets {
    pub fn new(child: Node, insets: EdgeInsets) -> Self {
        Self { child, insets }
    }
}

impl Layout for Insets {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        let child = self.child.layout(cx, constraint.inset(self.insets));
        let size = constraint.clamp(child.size().inflate(self.insets));
        let baseline = child.baseline().map(|mut b| {
            b.ascender += self.insets.top;
            b.descender += self.insets.bottom;
            b
        });
        let node = RenderNode::container(
            size,
            vec![child],
            vec![Point::new(self.insets.left, self.insets.top)],
        );
        match baseline {
            Some(baseline) => node.with_baseline(baseline),
            None => node,
        }
    }
}

/// Lay out `child` under `constraint`, then `decoration` tight to its size.
fn decorate(
    child: &Node,
    decoration: &Node,
    cx: &mut LayoutContext,
    constraint: Constraint,
) -> (RenderNode, RenderNode) {
    let child = child.layout(cx, constraint);
    let decoration = decoration.layout(cx, Constraint::tight(child.size()));
    (child, decoration)
}

fn with_child_baseline(node: RenderNode, child_baseline: Option<Baseline>) -> RenderNode {
    match child_baseline {
        Some(baseline) => node.with_baseline(baseline),
        None => node,
    }
}

/// A decoration drawn behind a child and sized to it.
#[derive(Debug, Clone)]
pub struct Background {
    pub child: Node,
    pub background: Node,
}

impl Background {
    pub fn new(child: Node, background: Node) -> Self {
        Self { child, background }
    }
}

impl Layout for Background {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        let (child, background) = decorate(&self.child, &self.background, cx, constraint);
        let size = child.size();
        let baseline = child.baseline();
        let node = RenderNode::container(size, vec![background, child], vec![Point::ZERO; 2]);
        with_child_baseline(node, baseline)
    }
}

/// A decoration drawn over a child and sized to it.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub child: Node,
    pub overlay: Node,
}

impl Overlay {
    pub fn new(child: Node, overlay: Node) -> Self {
        Self { child, overlay }
    }
}

impl Layout for Overlay {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        let (child, overlay) = decorate(&self.child, &self.overlay, cx, constraint);
        let size = child.size();
        let baseline = child.baseline();
        let node = RenderNode::container(size, vec![child, overlay], vec![Point::ZERO; 2]);
        with_child_baseline(node, baseline)
    }
}

/// Where a badge sits relative to its host along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BadgeAnchor {
    /// Inside, flush with the start edge
    Start,
    Center,
    /// Inside, flush with the end edge
    #[default]
    End,
    /// Outside, just before the start edge
    Before,
    /// Outside, just after the end edge
    After,
}

impl BadgeAnchor {
    fn offset(self, host: f64, badge: f64) -> f64 {
        match self {
            BadgeAnchor::Start => 0.0,
            BadgeAnchor::Center => (host - badge) / 2.0,
            BadgeAnchor::End => host - badge,
            BadgeAnchor::Before => -badge,
            BadgeAnchor::After => host,
        }
    }
}

/// Badge anchoring on both axes plus a final nudge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BadgePlacement {
    pub horizontal: BadgeAnchor,
    pub vertical: BadgeAnchor,
    pub offset: Point,
}

impl BadgePlacement {
    /// Top-trailing corner, the usual notification badge spot.
    pub fn top_end() -> Self {
        Self {
            horizontal: BadgeAnchor::End,
            vertical: BadgeAnchor::Start,
            offset: Point::ZERO,
        }
    }

    pub fn with_offset(mut self, dx: f64, dy: f64) -> Self {
        self.offset = Point::new(dx, dy);
        self
    }
}

/// An overlay at its natural size, anchored to the child without changing
/// the child's size.
#[derive(Debug, Clone)]
pub struct Badge {
    pub child: Node,
    pub badge: Node,
    pub placement: BadgePlacement,
}

impl Badge {
    pub fn new(child: Node, badge: Node, placement: BadgePlacement) -> Self {
        Self {
            child,
            badge,
            placement,
        }
    }
}

impl Layout for Badge {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        let child = self.child.layout(cx, constraint);
        let badge = self.badge.layout(cx, Constraint::unbounded());
        let host = child.size();
        let mark = badge.size();
        let position = Point::new(
            self.placement.horizontal.offset(host.width, mark.width),
            self.placement.vertical.offset(host.height, mark.height),
        ) + self.placement.offset;
        let baseline = child.baseline();
        let node = RenderNode::container(host, vec![child, badge], vec![Point::ZERO, position]);
        with_child_baseline(node, baseline)
    }
}

/// Translates a child; its size is unchanged.
#[derive(Debug, Clone)]
pub struct Offset {
    pub child: Node,
    pub offset: Point,
}

impl Offset {
    pub fn new(child: Node, offset: Point) -> Self {
        Self { child, offset }
    }
}

impl Layout for Offset {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        let child = self.child.layout(cx, constraint);
        let size = child.size();
        RenderNode::container(size, vec![child], vec![self.offset])
    }
}

/// How a size override treats one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SizeRule {
    /// Keep the parent's range
    #[default]
    Auto,
    /// Exact extent
    Fixed(f64),
    /// Fraction of the parent's maximum; `Auto` when that is unbounded
    Fraction(f64),
}

/// Fixed/fractional size and min/max clamps applied to a child's constraint.
#[derive(Debug, Clone)]
pub struct ConstraintOverride {
    pub child: Node,
    pub width: SizeRule,
    pub height: SizeRule,
    pub min: Option<Size>,
    pub max: Option<Size>,
}

impl ConstraintOverride {
    pub fn new(child: Node) -> Self {
        Self {
            child,
            width: SizeRule::Auto,
            height: SizeRule::Auto,
            min: None,
            max: None,
        }
    }

    /// The child's constraint, always inside `parent`.
    pub fn resolve(&self, parent: &Constraint) -> Constraint {
        let (min_w, max_w) = resolve_axis(
            self.width,
            parent.min.width,
            parent.max.width,
            self.min.map(|s| s.width),
            self.max.map(|s| s.width),
        );
        let (min_h, max_h) = resolve_axis(
            self.height,
            parent.min.height,
            parent.max.height,
            self.min.map(|s| s.height),
            self.max.map(|s| s.height),
        );
        Constraint::new(Size::new(min_w, min_h), Size::new(max_w, max_h))
    }
}

fn resolve_axis(
    rule: SizeRule,
    parent_min: f64,
    parent_max: f64,
    min: Option<f64>,
    max: Option<f64>,
) -> (f64, f64) {
    let (mut lo, mut hi) = match rule {
        SizeRule::Fixed(value) => (value, value),
        SizeRule::Fraction(fraction) if parent_max.is_finite() => {
            (parent_max * fraction, parent_max * fraction)
        }
        SizeRule::Fraction(_) | SizeRule::Auto => (parent_min, parent_max),
    };
    if let Some(min) = min {
        lo = lo.max(min);
        hi = hi.max(lo);
    }
    if let Some(max) = max {
        hi = hi.min(max);
        lo = lo.min(hi);
    }
    let fit = |v: f64| v.max(parent_min).min(parent_max);
    (fit(lo), fit(hi))
}

impl Layout for ConstraintOverride {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        let child = self.child.layout(cx, self.resolve(&constraint));
        let size = constraint.clamp(child.size());
        let baseline = child.baseline();
        let node = RenderNode::container(size, vec![child], vec![Point::ZERO]);
        with_child_baseline(node, baseline)
    }
}

/// Children stacked on top of each other, later ones in front.
#[derive(Debug, Clone, Default)]
pub struct ZStack {
    pub children: Vec<Node>,
    pub horizontal: ItemAlignment,
    pub vertical: ItemAlignment,
}

impl ZStack {
    /// Centered on both axes.
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            children,
            horizontal: ItemAlignment::Center,
            vertical: ItemAlignment::Center,
        }
    }

    pub fn with_alignment(mut self, horizontal: ItemAlignment, vertical: ItemAlignment) -> Self {
        self.horizontal = horizontal;
        self.vertical = vertical;
        self
    }
}

impl Layout for ZStack {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        let loose = constraint.loosened();
        let mut nodes: Vec<RenderNode> = self
            .children
            .iter()
            .map(|child| child.layout(cx, loose))
            .collect();

        let natural = nodes
            .iter()
            .fold(Size::ZERO, |acc, node| acc.max(node.size()));
        let size = constraint.clamp(natural);

        let stretch_w = self.horizontal == ItemAlignment::Stretch;
        let stretch_h = self.vertical == ItemAlignment::Stretch;
        if stretch_w || stretch_h {
            for (index, child) in self.children.iter().enumerate() {
                let current = nodes[index].size();
                let target = Size::new(
                    if stretch_w { size.width } else { current.width },
                    if stretch_h { size.height } else { current.height },
                );
                if (target.width - current.width).abs() < 0.001
                    && (target.height - current.height).abs() < 0.001
                {
                    continue;
                }
                cx.note_relayout();
                nodes[index] = child.layout(cx, Constraint::tight(target));
            }
        }

        let positions = nodes
            .iter()
            .map(|node| {
                Point::new(
                    self.horizontal.offset(size.width, node.size().width),
                    self.vertical.offset(size.height, node.size().height),
                )
            })
            .collect();
        RenderNode::container(size, nodes, positions)
    }
}
