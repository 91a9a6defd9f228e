//! Line-breaking flexbox layout.
//!
//! Items run along the flow axis and wrap into lines stacked on the cross
//! axis. A row flow (`Flow::row`) places items left to right and stacks lines
//! top to bottom.

use smallvec::SmallVec;
use trellis_core::{Axis, Constraint, Point, Size};

use crate::context::LayoutContext;
use crate::distribute::{cross_offsets, distribute, line_thickness, share, CrossAlign, Justify, LineItem};
use crate::node::{Flex, Layout, Node};
use crate::render_node::RenderNode;

/// Wrapping flex layout.
#[derive(Debug, Clone, Default)]
pub struct Flow {
    /// Axis items run along within a line
    pub axis: Axis,
    /// Gap between items in a line
    pub interitem_spacing: f64,
    /// Gap between lines
    pub line_spacing: f64,
    /// Distribution of items within each line
    pub justify_content: Justify,
    /// Distribution of lines along the cross axis
    pub align_content: Justify,
    /// Alignment of items within their line
    pub align_items: CrossAlign,
    pub children: Vec<Node>,
}

impl Flow {
    /// Items left to right, lines top to bottom.
    pub fn row(children: Vec<Node>) -> Self {
        Self {
            axis: Axis::Horizontal,
            children,
            ..Default::default()
        }
    }

    /// Items top to bottom, lines left to right.
    pub fn column(children: Vec<Node>) -> Self {
        Self {
            axis: Axis::Vertical,
            children,
            ..Default::default()
        }
    }

    /// Same gap between items and between lines.
    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.interitem_spacing = spacing;
        self.line_spacing = spacing;
        self
    }

    pub fn with_interitem_spacing(mut self, spacing: f64) -> Self {
        self.interitem_spacing = spacing;
        self
    }

    pub fn with_line_spacing(mut self, spacing: f64) -> Self {
        self.line_spacing = spacing;
        self
    }

    pub fn with_justify_content(mut self, justify: Justify) -> Self {
        self.justify_content = justify;
        self
    }

    pub fn with_align_content(mut self, align: Justify) -> Self {
        self.align_content = align;
        self
    }

    pub fn with_align_items(mut self, align: CrossAlign) -> Self {
        self.align_items = align;
        self
    }

    /// Group item indices into lines given their extents along the flow axis.
    ///
    /// The first item of a line never breaks.
    fn break_lines(&self, extents: &[f64], available: f64) -> Vec<LineIndices> {
        let mut lines: Vec<LineIndices> = Vec::new();
        let mut current = LineIndices::new();
        let mut used = 0.0;

        for (index, extent) in extents.iter().enumerate() {
            if !current.is_empty() && used + self.interitem_spacing + extent > available {
                lines.push(std::mem::take(&mut current));
                used = 0.0;
            }
            if !current.is_empty() {
                used += self.interitem_spacing;
            }
            used += extent;
            current.push(index);
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}

type LineIndices = SmallVec<[usize; 8]>;

struct Line {
    indices: LineIndices,
    thickness: f64,
}

impl Layout for Flow {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        let axis = self.axis;
        let cross = axis.cross();
        if self.children.is_empty() {
            return RenderNode::spacer(constraint.clamp(Size::ZERO));
        }

        let flex: Vec<Flex> = self.children.iter().map(Node::flex_params).collect();
        let aligns: Vec<CrossAlign> = flex
            .iter()
            .map(|f| f.align_self.unwrap_or(self.align_items))
            .collect();

        let available = constraint.max_along(axis);
        let natural = Constraint::new(Size::ZERO, axis.size(available, f64::INFINITY));
        let mut nodes: Vec<RenderNode> = self
            .children
            .iter()
            .map(|child| child.layout(cx, natural))
            .collect();

        let extents: Vec<f64> = nodes.iter().map(|n| n.size().along(axis)).collect();
        let groups = self.break_lines(&extents, available);

        // Grow within each line only when the flow axis is bounded
        if available.is_finite() {
            for group in &groups {
                let used: f64 = group.iter().map(|i| nodes[*i].size().along(axis)).sum::<f64>()
                    + self.interitem_spacing * (group.len() - 1) as f64;
                if used >= available {
                    continue;
                }
                let weights: Vec<f64> = group.iter().map(|i| flex[*i].grow).collect();
                for (index, delta) in group.iter().zip(share(available - used, &weights)) {
                    if delta == 0.0 {
                        continue;
                    }
                    let target = nodes[*index].size().along(axis) + delta;
                    cx.note_relayout();
                    nodes[*index] = self.children[*index].layout(cx, natural.tight_along(axis, target));
                }
            }
        }

        let lines: Vec<Line> = groups
            .into_iter()
            .map(|indices| {
                let items: Vec<LineItem> = indices
                    .iter()
                    .map(|i| LineItem::of(&nodes[*i], cross, aligns[*i]))
                    .collect();
                Line {
                    thickness: line_thickness(&items),
                    indices,
                }
            })
            .collect();

        // Stretched items fill their line
        for line in &lines {
            for index in &line.indices {
                let index = *index;
                if aligns[index] != CrossAlign::Stretch
                    || (nodes[index].size().along(cross) - line.thickness).abs() < 0.001
                {
                    continue;
                }
                let main = nodes[index].size().along(axis);
                let stretched = Constraint::unbounded()
                    .tight_along(axis, main)
                    .tight_along(cross, line.thickness);
                cx.note_relayout();
                nodes[index] = self.children[index].layout(cx, stretched);
            }
        }

        let line_extent = |line: &Line| -> f64 {
            line.indices
                .iter()
                .map(|i| nodes[*i].size().along(axis))
                .sum::<f64>()
                + self.interitem_spacing * (line.indices.len() - 1) as f64
        };
        let widest = lines.iter().map(line_extent).fold(0.0, f64::max);
        let flow_size = if self.justify_content != Justify::Start && available.is_finite() {
            widest.max(available)
        } else {
            widest
        };
        let thickness: f64 = lines.iter().map(|l| l.thickness).sum();
        let cross_total = thickness + self.line_spacing * (lines.len() - 1) as f64;
        let cross_max = constraint.max_along(cross);
        let cross_size = if self.align_content != Justify::Start && cross_max.is_finite() {
            cross_total.max(cross_max)
        } else {
            cross_total
        };

        let size = constraint.clamp(axis.size(flow_size, cross_size));
        let flow_extent = size.along(axis);

        let (mut line_cursor, line_gap) = distribute(
            self.align_content,
            thickness,
            size.along(cross),
            self.line_spacing,
            lines.len(),
        );

        let mut positions = vec![Point::ZERO; nodes.len()];
        for line in &lines {
            let content: f64 = line.indices.iter().map(|i| nodes[*i].size().along(axis)).sum();
            let (mut cursor, gap) = distribute(
                self.justify_content,
                content,
                flow_extent,
                self.interitem_spacing,
                line.indices.len(),
            );
            let items: Vec<LineItem> = line
                .indices
                .iter()
                .map(|i| LineItem::of(&nodes[*i], cross, aligns[*i]))
                .collect();
            let offsets = cross_offsets(&items, line.thickness);
            for (index, offset) in line.indices.iter().zip(offsets) {
                positions[*index] = axis.point(cursor, line_cursor + offset);
                cursor += nodes[*index].size().along(axis) + gap;
            }
            line_cursor += line.thickness + line_gap;
        }

        RenderNode::container(size, nodes, positions)
    }
}
