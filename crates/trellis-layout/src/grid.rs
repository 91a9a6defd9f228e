//! Track-based grid layout with span placement.
//!
//! Tracks run across the fixed axis; lines grow along the growth axis as
//! items are placed. Placement is first-fit: a cursor walks the fixed axis,
//! wraps to the next line, and skips cells already taken by earlier spans.

use rustc_hash::FxHashSet;
use trellis_core::{Axis, Constraint, Diagnostic};

use crate::context::LayoutContext;
use crate::distribute::ItemAlignment;
use crate::node::{Layout, Node};
use crate::render_node::RenderNode;

/// Track sizing along the fixed axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Track {
    /// Fixed size in points
    Fixed(f64),
    /// Weighted share of the space left after fixed tracks
    Flex(f64),
}

/// Footprint of an item: `tracks` along the fixed axis, `lines` along the
/// growth axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub tracks: usize,
    pub lines: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            tracks: 1,
            lines: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GridItem {
    pub node: Node,
    pub span: Span,
    /// Alignment override along the growth axis
    pub align: Option<ItemAlignment>,
}

impl GridItem {
    pub fn new(node: Node) -> Self {
        Self {
            node,
            span: Span::default(),
            align: None,
        }
    }

    pub fn span(mut self, tracks: usize, lines: usize) -> Self {
        self.span = Span { tracks, lines };
        self
    }

    pub fn align(mut self, align: ItemAlignment) -> Self {
        self.align = Some(align);
        self
    }
}

impl From<Node> for GridItem {
    fn from(node: Node) -> Self {
        Self::new(node)
    }
}

/// Grid layout configuration.
#[derive(Debug, Clone)]
pub struct Grid {
    /// Growth axis (vertical grids have column tracks)
    pub axis: Axis,
    pub tracks: Vec<Track>,
    /// Gap between tracks
    pub track_spacing: f64,
    /// Gap between lines
    pub line_spacing: f64,
    /// Alignment of items within their cell along the growth axis
    pub align_items: ItemAlignment,
    pub items: Vec<GridItem>,
}

impl Grid {
    /// A vertically growing grid with the given column tracks.
    pub fn columns(tracks: Vec<Track>, items: Vec<GridItem>) -> Self {
        Self {
            axis: Axis::Vertical,
            tracks,
            track_spacing: 0.0,
            line_spacing: 0.0,
            align_items: ItemAlignment::Start,
            items,
        }
    }

    /// A horizontally growing grid with the given row tracks.
    pub fn rows(tracks: Vec<Track>, items: Vec<GridItem>) -> Self {
        Self {
            axis: Axis::Horizontal,
            ..Self::columns(tracks, items)
        }
    }

    /// `count` equal flex tracks.
    pub fn uniform(count: usize, items: Vec<GridItem>) -> Self {
        Self::columns(vec![Track::Flex(1.0); count.max(1)], items)
    }

    pub fn with_gap(mut self, gap: f64) -> Self {
        self.track_spacing = gap;
        self.line_spacing = gap;
        self
    }

    pub fn with_track_spacing(mut self, spacing: f64) -> Self {
        self.track_spacing = spacing;
        self
    }

    pub fn with_line_spacing(mut self, spacing: f64) -> Self {
        self.line_spacing = spacing;
        self
    }

    pub fn with_align_items(mut self, align: ItemAlignment) -> Self {
        self.align_items = align;
        self
    }

    /// Resolve track sizes against the available fixed-axis extent.
    fn resolve_tracks(&self, available: f64) -> Vec<f64> {
        let tracks: &[Track] = if self.tracks.is_empty() {
            &[Track::Flex(1.0)]
        } else {
            &self.tracks
        };

        let mut total_fixed = 0.0;
        let mut total_flex = 0.0;
        for track in tracks {
            match track {
                Track::Fixed(size) => total_fixed += size.max(0.0),
                Track::Flex(weight) => total_flex += weight.max(0.0),
            }
        }

        let gaps = self.track_spacing * (tracks.len() - 1) as f64;
        let flex_unit = if available.is_finite() && total_flex > 0.0 {
            (available - total_fixed - gaps).max(0.0) / total_flex
        } else {
            0.0
        };

        tracks
            .iter()
            .map(|track| match track {
                Track::Fixed(size) => size.max(0.0),
                Track::Flex(weight) => weight.max(0.0) * flex_unit,
            })
            .collect()
    }
}

/// A placed item: first track, first line, clamped span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    track: usize,
    line: usize,
    span: Span,
}

/// First-fit placement of every item.
fn place(items: &[GridItem], track_count: usize, cx: &mut LayoutContext) -> Vec<Placement> {
    let mut occupied: FxHashSet<(usize, usize)> = FxHashSet::default();
    let (mut track, mut line) = (0usize, 0usize);

    items
        .iter()
        .map(|item| {
            let requested = item.span.tracks.max(1);
            if requested > track_count {
                cx.report(Diagnostic::GridSpanOverflow {
                    requested,
                    tracks: track_count,
                });
            }
            let span = Span {
                tracks: requested.min(track_count),
                lines: item.span.lines.max(1),
            };

            loop {
                if track + span.tracks > track_count {
                    track = 0;
                    line += 1;
                    continue;
                }
                let free = (line..line + span.lines).all(|l| {
                    (track..track + span.tracks).all(|t| !occupied.contains(&(t, l)))
                });
                if free {
                    break;
                }
                track += 1;
            }

            for l in line..line + span.lines {
                for t in track..track + span.tracks {
                    occupied.insert((t, l));
                }
            }
            let placement = Placement { track, line, span };
            track += span.tracks;
            placement
        })
        .collect()
}

fn extent_of(sizes: &[f64], start: usize, count: usize, spacing: f64) -> f64 {
    sizes[start..start + count].iter().sum::<f64>() + spacing * (count - 1) as f64
}

impl Layout for Grid {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        let axis = self.axis;
        let fixed = axis.cross();

        let tracks = self.resolve_tracks(constraint.max_along(fixed));
        let mut track_offsets = Vec::with_capacity(tracks.len());
        let mut cursor = 0.0;
        for size in &tracks {
            track_offsets.push(cursor);
            cursor += size + self.track_spacing;
        }
        let fixed_extent = extent_of(&tracks, 0, tracks.len(), self.track_spacing);

        if self.items.is_empty() {
            return RenderNode::spacer(constraint.clamp(axis.size(0.0, fixed_extent)));
        }

        let placements = place(&self.items, tracks.len(), cx);

        let mut nodes: Vec<RenderNode> = self
            .items
            .iter()
            .zip(&placements)
            .map(|(item, placement)| {
                let cell = extent_of(&tracks, placement.track, placement.span.tracks, self.track_spacing);
                item.node
                    .layout(cx, Constraint::unbounded().tight_along(fixed, cell))
            })
            .collect();

        // Line extent: the tallest item starting on that line
        let line_count = placements
            .iter()
            .map(|p| p.line + p.span.lines)
            .max()
            .unwrap_or(0);
        let mut lines = vec![0.0f64; line_count];
        for (node, placement) in nodes.iter().zip(&placements) {
            let extent = &mut lines[placement.line];
            *extent = extent.max(node.size().along(axis));
        }
        let mut line_offsets = Vec::with_capacity(lines.len());
        let mut cursor = 0.0;
        for extent in &lines {
            line_offsets.push(cursor);
            cursor += extent + self.line_spacing;
        }
        let main_extent = extent_of(&lines, 0, lines.len(), self.line_spacing);

        let mut positions = Vec::with_capacity(nodes.len());
        for (index, placement) in placements.iter().enumerate() {
            let cell = extent_of(&lines, placement.line, placement.span.lines, self.line_spacing);
            let align = self.items[index].align.unwrap_or(self.align_items);
            if align == ItemAlignment::Stretch
                && (nodes[index].size().along(axis) - cell).abs() >= 0.001
            {
                let cross = nodes[index].size().along(fixed);
                cx.note_relayout();
                nodes[index] = self.items[index].node.layout(
                    cx,
                    Constraint::unbounded()
                        .tight_along(fixed, cross)
                        .tight_along(axis, cell),
                );
            }
            let offset = align.offset(cell, nodes[index].size().along(axis));
            positions.push(axis.point(
                line_offsets[placement.line] + offset,
                track_offsets[placement.track],
            ));
        }

        let size = constraint.clamp(axis.size(main_extent, fixed_extent));
        RenderNode::container(size, nodes, positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{Point, Size};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.001
    }

    fn cell(height: f64) -> GridItem {
        GridItem::new(Node::space(0.0, height))
    }

    fn layout(grid: Grid, constraint: Constraint) -> (RenderNode, LayoutContext) {
        let mut cx = LayoutContext::new();
        let node = grid.layout(&mut cx, constraint);
        (node, cx)
    }

    #[test]
    fn test_resolve_fixed_and_flex_tracks() {
        let grid = Grid::columns(
            vec![Track::Fixed(100.0), Track::Flex(1.0), Track::Flex(2.0)],
            Vec::new(),
        )
        .with_track_spacing(10.0);
        let sizes = grid.resolve_tracks(400.0);
        assert!(close(sizes[0], 100.0));
        assert!(close(sizes[1], 93.333));
        assert!(close(sizes[2], 186.667));
    }

    #[test]
    fn test_flex_tracks_collapse_when_unbounded() {
        let grid = Grid::columns(vec![Track::Fixed(50.0), Track::Flex(1.0)], Vec::new());
        assert_eq!(grid.resolve_tracks(f64::INFINITY), vec![50.0, 0.0]);
    }

    #[test]
    fn test_row_major_placement() {
        let grid = Grid::uniform(3, (0..5).map(|_| cell(20.0)).collect());
        let (node, _) = layout(grid, Constraint::loose(Size::new(300.0, f64::INFINITY)));
        let positions = node.positions();
        assert_eq!(positions[2], Point::new(200.0, 0.0));
        assert_eq!(positions[3], Point::new(0.0, 20.0));
        assert_eq!(node.size(), Size::new(300.0, 40.0));
        assert!(close(node.children()[0].size().width, 100.0));
    }

    #[test]
    fn test_spans_skip_occupied_cells() {
        let items = vec![
            cell(40.0).span(1, 2),
            cell(20.0).span(2, 1),
            cell(20.0),
            cell(20.0),
        ];
        let (node, _) = layout(
            Grid::uniform(3, items),
            Constraint::loose(Size::new(300.0, f64::INFINITY)),
        );
        let positions = node.positions();
        assert_eq!(positions[1], Point::new(100.0, 0.0));
        // Row 1, column 0 is taken by the tall item
        assert_eq!(positions[2], Point::new(100.0, 40.0));
        assert_eq!(positions[3], Point::new(200.0, 40.0));
        assert!(close(node.children()[1].size().width, 200.0));
    }

    #[test]
    fn test_spanning_item_sizes_its_starting_line() {
        let items = vec![cell(100.0).span(1, 2), cell(10.0), cell(10.0)];
        let (node, _) = layout(
            Grid::uniform(2, items),
            Constraint::loose(Size::new(200.0, f64::INFINITY)),
        );
        assert_eq!(
            node.positions(),
            &[Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(100.0, 100.0)]
        );
        assert_eq!(node.size(), Size::new(200.0, 110.0));
    }

    #[test]
    fn test_span_overflow_is_clamped() {
        let items = vec![cell(10.0).span(5, 1)];
        let (node, cx) = layout(Grid::uniform(3, items), Constraint::loose(Size::new(300.0, 100.0)));
        assert!(close(node.children()[0].size().width, 300.0));
        assert_eq!(
            cx.diagnostics(),
            &[Diagnostic::GridSpanOverflow {
                requested: 5,
                tracks: 3,
            }]
        );
    }

    #[test]
    fn test_line_extent_is_tallest_starter() {
        let items = vec![cell(10.0), cell(30.0), cell(20.0)];
        let (node, _) = layout(
            Grid::uniform(2, items).with_line_spacing(5.0),
            Constraint::loose(Size::new(200.0, f64::INFINITY)),
        );
        assert!(close(node.positions()[2].y, 35.0));
        assert!(close(node.size().height, 55.0));
    }

    #[test]
    fn test_item_alignment_in_cell() {
        let items = vec![cell(10.0).align(ItemAlignment::End), cell(30.0), cell(0.0).align(ItemAlignment::Stretch)];
        let (node, cx) = layout(
            Grid::uniform(3, items),
            Constraint::loose(Size::new(300.0, f64::INFINITY)),
        );
        assert!(close(node.positions()[0].y, 20.0));
        assert!(close(node.children()[2].size().height, 30.0));
        assert_eq!(cx.relayout_count(), 1);
    }

    #[test]
    fn test_horizontal_grid() {
        let items = (0..3).map(|_| GridItem::new(Node::space(25.0, 0.0))).collect();
        let (node, _) = layout(
            Grid::rows(vec![Track::Fixed(10.0), Track::Fixed(10.0)], items),
            Constraint::unbounded(),
        );
        assert_eq!(node.positions()[1], Point::new(0.0, 10.0));
        assert_eq!(node.positions()[2], Point::new(25.0, 0.0));
        assert_eq!(node.size(), Size::new(50.0, 20.0));
    }
}
