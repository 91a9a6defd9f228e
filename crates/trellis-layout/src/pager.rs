//! One-child-per-page layout.

use std::any::Any;
use std::rc::Rc;

use trellis_core::{view_handle, Axis, Constraint, Diagnostic, Point, Rect, Size, View, ViewHandle};

use crate::component::ViewContent;
use crate::context::LayoutContext;
use crate::node::{Layout, Node};
use crate::render_node::{ChildOrder, RenderNode};

/// Size of the placeholder shown when a pager cannot be laid out.
pub const PLACEHOLDER_SIZE: Size = Size {
    width: 200.0,
    height: 100.0,
};

/// Children laid out one per page; each page spans the bounded main extent.
#[derive(Debug, Clone)]
pub struct Pager {
    pub axis: Axis,
    pub children: Vec<Node>,
    pub placeholder_size: Size,
}

impl Pager {
    pub fn horizontal(children: Vec<Node>) -> Self {
        Self {
            axis: Axis::Horizontal,
            children,
            placeholder_size: PLACEHOLDER_SIZE,
        }
    }

    pub fn vertical(children: Vec<Node>) -> Self {
        Self {
            axis: Axis::Vertical,
            ..Self::horizontal(children)
        }
    }

    pub fn with_placeholder_size(mut self, size: Size) -> Self {
        self.placeholder_size = size;
        self
    }
}

impl Layout for Pager {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        let axis = self.axis;
        let cross = axis.cross();
        let page = constraint.max_along(axis);

        if !page.is_finite() {
            cx.report(Diagnostic::UnboundedPager);
            let content = ErrorPlaceholder {
                message: "Pager needs a bounded main axis".into(),
            };
            return RenderNode::view(constraint.clamp(self.placeholder_size), Rc::new(content));
        }

        let page_constraint = Constraint::new(
            axis.size(page, constraint.min_along(cross)),
            axis.size(page, constraint.max_along(cross)),
        );
        let nodes: Vec<RenderNode> = self
            .children
            .iter()
            .map(|child| child.layout(cx, page_constraint))
            .collect();

        let cross_size = nodes.iter().map(|n| n.size().along(cross)).fold(0.0, f64::max);
        let positions: Vec<Point> = (0..nodes.len())
            .map(|index| axis.point(index as f64 * page, 0.0))
            .collect();

        // The pager's own size is one page; later pages sit past its edge
        let size = constraint.clamp(axis.size(page, cross_size));
        RenderNode::container(size, nodes, positions).with_order(ChildOrder::Sorted(axis))
    }
}

/// Leaf content rendered in place of a layout that could not be resolved.
#[derive(Debug, Clone)]
pub struct ErrorPlaceholder {
    pub message: String,
}

impl ViewContent for ErrorPlaceholder {
    fn reuse_key(&self) -> String {
        "trellis.error-placeholder".into()
    }

    fn make_view(&self) -> ViewHandle {
        view_handle(PlaceholderView::default())
    }

    fn update_view(&self, view: &ViewHandle) {
        if let Some(placeholder) = view.borrow_mut().as_any_mut().downcast_mut::<PlaceholderView>() {
            placeholder.message.clone_from(&self.message);
        }
    }
}

/// Host-independent view backing [`ErrorPlaceholder`].
#[derive(Debug, Default)]
pub struct PlaceholderView {
    pub frame: Rect,
    pub message: String,
    pub hidden: bool,
}

impl View for PlaceholderView {
    fn frame(&self) -> Rect {
        self.frame
    }

    fn set_frame(&mut self, frame: Rect) {
        self.frame = frame;
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
