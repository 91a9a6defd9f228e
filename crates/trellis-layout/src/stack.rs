//! Linear stack layout with flex grow/shrink.

use trellis_core::{Axis, Constraint, Point, Size};

use crate::context::LayoutContext;
use crate::distribute::{cross_offsets, distribute, line_thickness, share, CrossAlign, Justify, LineItem};
use crate::node::{Layout, Node};
use crate::render_node::{ChildOrder, RenderNode};

/// Children placed one after another along a single axis.
#[derive(Debug, Clone, Default)]
pub struct Stack {
    /// Main axis
    pub axis: Axis,
    /// Minimum gap between items
    pub spacing: f64,
    /// Distribution on the main axis
    pub justify: Justify,
    /// Alignment on the cross axis
    pub align: CrossAlign,
    pub children: Vec<Node>,
}

impl Stack {
    /// Create a horizontal stack (HStack).
    pub fn horizontal(children: Vec<Node>) -> Self {
        Self {
            axis: Axis::Horizontal,
            children,
            ..Default::default()
        }
    }

    /// Create a vertical stack (VStack).
    pub fn vertical(children: Vec<Node>) -> Self {
        Self {
            axis: Axis::Vertical,
            children,
            ..Default::default()
        }
    }

    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_justify(mut self, justify: Justify) -> Self {
        self.justify = justify;
        self
    }

    pub fn with_align(mut self, align: CrossAlign) -> Self {
        self.align = align;
        self
    }

    /// Constraint for a child before its main extent is known.
    fn child_constraint(&self, constraint: &Constraint, align: CrossAlign) -> Constraint {
        let cross = self.axis.cross();
        let cross_max = if align == CrossAlign::Stretch {
            constraint.max_along(cross)
        } else {
            f64::INFINITY
        };
        Constraint::new(Size::ZERO, self.axis.size(f64::INFINITY, cross_max))
    }
}

impl Layout for Stack {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        let axis = self.axis;
        let cross = axis.cross();
        let count = self.children.len();
        if count == 0 {
            return RenderNode::spacer(constraint.clamp(Size::ZERO));
        }

        let flex: Vec<_> = self.children.iter().map(Node::flex_params).collect();
        let aligns: Vec<_> = flex
            .iter()
            .map(|f| f.align_self.unwrap_or(self.align))
            .collect();

        let gaps = self.spacing * (count - 1) as f64;
        let main_max = constraint.max_along(axis);
        let bounded = main_max.is_finite();

        // Non-growing children at their natural size. Growing children wait
        // for the remainder unless the main axis is unbounded.
        let mut laid_out: Vec<Option<RenderNode>> = self
            .children
            .iter()
            .zip(&flex)
            .zip(&aligns)
            .map(|((child, f), align)| {
                if bounded && f.grow > 0.0 {
                    None
                } else {
                    Some(child.layout(cx, self.child_constraint(&constraint, *align)))
                }
            })
            .collect();

        let main_of = |nodes: &[RenderNode]| -> f64 {
            nodes.iter().map(|n| n.size().along(axis)).sum::<f64>()
        };

        let mut free = 0.0;
        if bounded {
            let fixed: f64 = laid_out.iter().flatten().map(|n| n.size().along(axis)).sum();
            free = main_max - fixed - gaps;
            let weights: Vec<f64> = laid_out
                .iter()
                .zip(&flex)
                .map(|(node, f)| if node.is_none() { f.grow } else { 0.0 })
                .collect();
            let extents = share(free.max(0.0), &weights);
            for index in 0..count {
                if laid_out[index].is_some() {
                    continue;
                }
                let child_constraint = self
                    .child_constraint(&constraint, aligns[index])
                    .tight_along(axis, extents[index]);
                laid_out[index] = Some(self.children[index].layout(cx, child_constraint));
            }
        }
        let mut nodes: Vec<RenderNode> = laid_out.into_iter().flatten().collect();

        // Deficit taken from shrinkable children
        if free < 0.0 {
            let weights: Vec<f64> = flex
                .iter()
                .map(|f| if f.grow > 0.0 { 0.0 } else { f.shrink })
                .collect();
            let deltas = share(free, &weights);
            for (index, delta) in deltas.into_iter().enumerate() {
                if delta == 0.0 {
                    continue;
                }
                let target = (nodes[index].size().along(axis) + delta).max(0.0);
                let child_constraint = self
                    .child_constraint(&constraint, aligns[index])
                    .tight_along(axis, target);
                cx.note_relayout();
                nodes[index] = self.children[index].layout(cx, child_constraint);
            }
        }

        let content = main_of(&nodes);
        let total = content + gaps;
        let main_size = if self.justify != Justify::Start && main_max.is_finite() {
            total.max(main_max)
        } else {
            total
        };

        let mut items: Vec<LineItem> = nodes
            .iter()
            .zip(&aligns)
            .map(|(node, align)| LineItem::of(node, cross, *align))
            .collect();
        let size = constraint.clamp(axis.size(main_size, line_thickness(&items)));
        let cross_size = size.along(cross);

        // Stretched children take the final cross extent
        for index in 0..count {
            if aligns[index] != CrossAlign::Stretch {
                continue;
            }
            if (nodes[index].size().along(cross) - cross_size).abs() < 0.001 {
                continue;
            }
            let main = nodes[index].size().along(axis);
            let stretched = Constraint::new(Size::ZERO, Size::INFINITY)
                .tight_along(axis, main)
                .tight_along(cross, cross_size);
            cx.note_relayout();
            nodes[index] = self.children[index].layout(cx, stretched);
            items[index] = LineItem::of(&nodes[index], cross, aligns[index]);
        }

        let (offset, gap) = distribute(self.justify, content, size.along(axis), self.spacing, count);
        let crosses = cross_offsets(&items, cross_size);

        let mut cursor = offset;
        let positions: Vec<Point> = nodes
            .iter()
            .zip(crosses)
            .map(|(node, cross_offset)| {
                let position = axis.point(cursor, cross_offset);
                cursor += node.size().along(axis) + gap;
                position
            })
            .collect();

        let order = if gap >= 0.0 {
            ChildOrder::Sorted(axis)
        } else {
            ChildOrder::Unordered
        };
        RenderNode::container(size, nodes, positions).with_order(order)
    }
}
