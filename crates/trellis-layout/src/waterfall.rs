//! Greedy shortest-column (masonry) layout.

use trellis_core::{Axis, Constraint, Point};

use crate::context::LayoutContext;
use crate::node::{Layout, Node};
use crate::render_node::RenderNode;

/// Equal-width columns filled greedily; each child goes to the column with
/// the least accumulated extent.
#[derive(Debug, Clone)]
pub struct Waterfall {
    /// Growth axis; columns run along it
    pub axis: Axis,
    pub columns: usize,
    /// Gap between items in a column
    pub spacing: f64,
    /// Gap between columns
    pub column_spacing: f64,
    pub children: Vec<Node>,
}

impl Waterfall {
    /// Vertical waterfall with `columns` columns.
    pub fn new(columns: usize, children: Vec<Node>) -> Self {
        Self {
            axis: Axis::Vertical,
            columns,
            spacing: 0.0,
            column_spacing: 0.0,
            children,
        }
    }

    /// Growth along the horizontal axis (rows instead of columns).
    pub fn horizontal(mut self) -> Self {
        self.axis = Axis::Horizontal;
        self
    }

    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self.column_spacing = spacing;
        self
    }

    pub fn with_column_spacing(mut self, spacing: f64) -> Self {
        self.column_spacing = spacing;
        self
    }
}

/// Index of the first column with the smallest offset.
fn shortest_column(offsets: &[f64]) -> usize {
    let mut index = 0;
    let mut best = offsets.first().copied().unwrap_or(0.0);
    for (i, offset) in offsets.iter().enumerate().skip(1) {
        if *offset < best {
            best = *offset;
            index = i;
        }
    }
    index
}

impl Layout for Waterfall {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        let axis = self.axis;
        let cross = axis.cross();
        let columns = self.columns.max(1);
        let gutters = self.column_spacing * (columns - 1) as f64;
        let cross_max = constraint.max_along(cross);

        let mut nodes: Vec<RenderNode>;
        let column_extent;
        if cross_max.is_finite() {
            column_extent = ((cross_max - gutters) / columns as f64).max(0.0);
            let child_constraint = Constraint::unbounded().tight_along(cross, column_extent);
            nodes = self
                .children
                .iter()
                .map(|child| child.layout(cx, child_constraint))
                .collect();
        } else {
            // No width to divide: columns take the widest natural child
            nodes = self
                .children
                .iter()
                .map(|child| child.layout(cx, Constraint::unbounded()))
                .collect();
            column_extent = nodes.iter().map(|n| n.size().along(cross)).fold(0.0, f64::max);
            let child_constraint = Constraint::unbounded().tight_along(cross, column_extent);
            for (index, child) in self.children.iter().enumerate() {
                if (nodes[index].size().along(cross) - column_extent).abs() >= 0.001 {
                    cx.note_relayout();
                    nodes[index] = child.layout(cx, child_constraint);
                }
            }
        }

        let mut offsets = vec![0.0; columns];
        let mut counts = vec![0usize; columns];
        let positions: Vec<Point> = nodes
            .iter()
            .map(|node| {
                let column = shortest_column(&offsets);
                let position = axis.point(
                    offsets[column],
                    column as f64 * (column_extent + self.column_spacing),
                );
                offsets[column] += node.size().along(axis) + self.spacing;
                counts[column] += 1;
                position
            })
            .collect();

        let main = offsets
            .iter()
            .zip(&counts)
            .filter(|(_, count)| **count > 0)
            .map(|(offset, _)| offset - self.spacing)
            .fold(0.0, f64::max);
        let cross_size = column_extent * columns as f64 + gutters;

        RenderNode::container(constraint.clamp(axis.size(main, cross_size)), nodes, positions)
    }
}
