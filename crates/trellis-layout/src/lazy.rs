//! Deferred layout: size now, content on first visibility.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use trellis_core::{Constraint, Size};

use crate::context::{LayoutContext, MeasurementCache};
use crate::node::{Layout, Node};
use crate::render_node::RenderNode;

type SizeProvider = Rc<dyn Fn(Constraint) -> Size>;

/// A node sized by a cheap provider whose content is laid out only when a
/// visibility query first reaches it.
#[derive(Clone)]
pub struct Lazy {
    size_provider: SizeProvider,
    content: Node,
}

impl Lazy {
    pub fn new(content: Node, size_provider: impl Fn(Constraint) -> Size + 'static) -> Self {
        Self {
            size_provider: Rc::new(size_provider),
            content,
        }
    }
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy").field("content", &self.content).finish()
    }
}

impl Layout for Lazy {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        let size = constraint.clamp((self.size_provider)(constraint));
        let content = LazyContent {
            node: self.content.clone(),
            constraint: Constraint::tight(size),
            measurements: cx.measurements().clone(),
            rendered: OnceCell::new(),
        };
        RenderNode::lazy(size, Rc::new(content))
    }
}

/// Content of a [`Lazy`] node, laid out at most once.
pub struct LazyContent {
    node: Node,
    constraint: Constraint,
    measurements: MeasurementCache,
    rendered: OnceCell<RenderNode>,
}

impl LazyContent {
    /// Lay out the content if needed and return the result.
    ///
    /// Runs in its own pass: implicit identities start from zero and only the
    /// measurement cache is shared with the pass that created this node.
    pub fn materialize(&self) -> &RenderNode {
        self.rendered.get_or_init(|| {
            let mut cx = LayoutContext::with_measurements(self.measurements.clone());
            tracing::trace!(constraint = ?self.constraint, "materializing lazy content");
            self.node.layout(&mut cx, self.constraint)
        })
    }

    pub fn is_materialized(&self) -> bool {
        self.rendered.get().is_some()
    }
}
