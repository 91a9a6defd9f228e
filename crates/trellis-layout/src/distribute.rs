//! Main-axis distribution and cross-axis alignment shared by every
//! line-based layout (Stack, Flow, Grid, ZStack).

use trellis_core::Axis;

use crate::render_node::RenderNode;

/// Distribution of items on the main axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    /// Pack items at the start
    #[default]
    Start,
    /// Pack items at the end
    End,
    /// Center items
    Center,
    /// Free space between items only
    SpaceBetween,
    /// Free space around each item (half-size at the edges)
    SpaceAround,
    /// Equal free space between items and at the edges
    SpaceEvenly,
}

/// Alignment of items on the cross axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossAlign {
    /// Align to start (top for rows, left for columns)
    #[default]
    Start,
    /// Center on the cross axis
    Center,
    /// Align to end
    End,
    /// Stretch to fill the line
    Stretch,
    /// Align first baselines
    BaselineFirst,
    /// Align last baselines
    BaselineLast,
}

/// Alignment of a single item inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemAlignment {
    #[default]
    Start,
    Center,
    End,
    /// Fill the cell; the item is laid out again with a tight constraint
    Stretch,
}

impl ItemAlignment {
    /// Offset of an item of `item` extent inside a cell of `cell` extent.
    pub fn offset(self, cell: f64, item: f64) -> f64 {
        match self {
            ItemAlignment::Start | ItemAlignment::Stretch => 0.0,
            ItemAlignment::Center => (cell - item) / 2.0,
            ItemAlignment::End => cell - item,
        }
    }
}

/// Leading offset and inter-item spacing for `count` items.
///
/// `content` is the summed extent of the items alone. When `available` is
/// unbounded there is no free space and items pack at `min_spacing`.
pub fn distribute(
    justify: Justify,
    content: f64,
    available: f64,
    min_spacing: f64,
    count: usize,
) -> (f64, f64) {
    if count == 0 {
        return (0.0, min_spacing);
    }

    let gaps = (count - 1) as f64;
    let free = if available.is_finite() {
        available - content - min_spacing * gaps
    } else {
        0.0
    };

    match justify {
        Justify::Start => (0.0, min_spacing),
        Justify::End => (free, min_spacing),
        Justify::Center => (free / 2.0, min_spacing),
        Justify::SpaceBetween => {
            if count == 1 {
                (0.0, min_spacing)
            } else {
                (0.0, min_spacing + free.max(0.0) / gaps)
            }
        }
        Justify::SpaceAround => {
            let share = free.max(0.0) / count as f64;
            (share / 2.0, min_spacing + share)
        }
        Justify::SpaceEvenly => {
            let share = free.max(0.0) / (count + 1) as f64;
            (share, min_spacing + share)
        }
    }
}

/// Cross-axis metrics of one item in a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LineItem {
    pub extent: f64,
    pub ascender: f64,
    pub descender: f64,
    pub align: CrossAlign,
}

impl LineItem {
    pub fn of(node: &RenderNode, cross: Axis, align: CrossAlign) -> Self {
        Self {
            extent: node.size().along(cross),
            ascender: node.ascender(),
            descender: node.descender(),
            align: effective(align, cross),
        }
    }
}

/// Baselines are vertical metrics; on a horizontal cross axis they fall back
/// to start alignment.
fn effective(align: CrossAlign, cross: Axis) -> CrossAlign {
    match (align, cross) {
        (CrossAlign::BaselineFirst | CrossAlign::BaselineLast, Axis::Horizontal) => {
            CrossAlign::Start
        }
        _ => align,
    }
}

struct Anchors {
    first: f64,
    last: f64,
}

fn anchors(items: &[LineItem]) -> Anchors {
    let mut anchors = Anchors {
        first: 0.0,
        last: 0.0,
    };
    for item in items {
        match item.align {
            CrossAlign::BaselineFirst => anchors.first = anchors.first.max(item.ascender),
            CrossAlign::BaselineLast => {
                anchors.last = anchors.last.max(item.extent - item.descender)
            }
            _ => {}
        }
    }
    anchors
}

/// Cross extent a line needs so every item fits after baseline alignment.
pub(crate) fn line_thickness(items: &[LineItem]) -> f64 {
    let anchors = anchors(items);
    items
        .iter()
        .map(|item| match item.align {
            CrossAlign::BaselineFirst => anchors.first - item.ascender + item.extent,
            CrossAlign::BaselineLast => anchors.last + item.descender,
            _ => item.extent,
        })
        .fold(0.0, f64::max)
}

/// Cross offset of every item inside a line of `line` extent.
pub(crate) fn cross_offsets(items: &[LineItem], line: f64) -> Vec<f64> {
    let anchors = anchors(items);
    items
        .iter()
        .map(|item| match item.align {
            CrossAlign::Start | CrossAlign::Stretch => 0.0,
            CrossAlign::Center => (line - item.extent) / 2.0,
            CrossAlign::End => line - item.extent,
            CrossAlign::BaselineFirst => anchors.first - item.ascender,
            CrossAlign::BaselineLast => anchors.last - item.extent + item.descender,
        })
        .collect()
}

/// Split `free` among items proportionally to `weights`.
pub(crate) fn share(free: f64, weights: &[f64]) -> Vec<f64> {
    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    weights
        .iter()
        .map(|w| {
            if total > 0.0 && *w > 0.0 {
                free * w / total
            } else {
                0.0
            }
        })
        .collect()
}
