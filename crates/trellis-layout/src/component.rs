//! Leaf content: the open extension point of the layout system.
//!
//! Layout algorithms form a closed set (see [`Node`]). Content is open:
//! anything implementing [`Component`] can take part in layout, and anything
//! implementing [`ViewContent`] can be backed by a live host view.

use std::marker::PhantomData;
use std::rc::Rc;

use trellis_core::{view_handle, with_view, Constraint, Size, View, ViewHandle};

use crate::context::LayoutContext;
use crate::node::Node;
use crate::render_node::{Baseline, RenderNode};

/// A user-defined layout participant.
pub trait Component {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode;
}

impl<F> Component for F
where
    F: Fn(&mut LayoutContext, Constraint) -> RenderNode,
{
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        self(cx, constraint)
    }
}

/// Content that is displayed by a host view.
pub trait ViewContent {
    /// Pool bucket used under automatic reuse. Defaults to the type name.
    fn reuse_key(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    /// Build a fresh view.
    fn make_view(&self) -> ViewHandle;

    /// Apply this content to `view` (fresh, reused, or carried forward).
    fn update_view(&self, view: &ViewHandle);
}

/// How a view leaf picks its size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeafSizing {
    /// Fixed size, clamped into the constraint
    Fixed(Size),
    /// Largest bounded size; minimum on unbounded axes
    Fill,
    /// Measured from a probe view, cached per identity
    Intrinsic,
}

/// A view-backed leaf node.
#[derive(Clone)]
pub struct ViewLeaf {
    content: Rc<dyn ViewContent>,
    sizing: LeafSizing,
    baseline: Option<Baseline>,
}

impl ViewLeaf {
    pub fn new(content: Rc<dyn ViewContent>, sizing: LeafSizing) -> Self {
        Self {
            content,
            sizing,
            baseline: None,
        }
    }

    pub fn with_baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = Some(baseline);
        self
    }

    pub fn content(&self) -> &Rc<dyn ViewContent> {
        &self.content
    }

    pub(crate) fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        let key = cx.claim_key();
        let size = match self.sizing {
            LeafSizing::Fixed(size) => constraint.clamp(size),
            LeafSizing::Fill => constraint.clamp(Size::new(
                finite_or(constraint.max.width, constraint.min.width),
                finite_or(constraint.max.height, constraint.min.height),
            )),
            LeafSizing::Intrinsic => self.measure(cx, &key, constraint),
        };

        let node = RenderNode::view(size, self.content.clone());
        match self.baseline {
            Some(baseline) => node.with_baseline(baseline),
            None => node,
        }
    }

    fn measure(&self, cx: &mut LayoutContext, key: &str, constraint: Constraint) -> Size {
        if let Some(size) = cx.measurements().get(key, constraint) {
            return size;
        }

        let probe = self.content.make_view();
        self.content.update_view(&probe);
        let measured = probe.borrow().size_that_fits(constraint.max);
        let size = constraint.clamp(measured);
        tracing::trace!(key, ?size, "measured intrinsic leaf");
        cx.measurements().insert(key, constraint, size);
        size
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Builder for view leaves backed by a concrete view type `V`.
///
/// ```ignore
/// let title: Node = ViewComponent::new(Label::default)
///     .update(|label| label.text = "Hello".into())
///     .intrinsic();
/// ```
pub struct ViewComponent<V: View> {
    make: Rc<dyn Fn() -> V>,
    updates: Vec<Rc<dyn Fn(&mut V)>>,
    reuse_key: Option<String>,
    baseline: Option<Baseline>,
    _marker: PhantomData<fn() -> V>,
}

impl<V: View> ViewComponent<V> {
    pub fn new(make: impl Fn() -> V + 'static) -> Self {
        Self {
            make: Rc::new(make),
            updates: Vec::new(),
            reuse_key: None,
            baseline: None,
            _marker: PhantomData,
        }
    }

    /// Add an update applied whenever the view is (re)bound.
    pub fn update(mut self, update: impl Fn(&mut V) + 'static) -> Self {
        self.updates.push(Rc::new(update));
        self
    }

    /// Use an explicit pool bucket instead of the type name.
    pub fn reuse_key(mut self, key: impl Into<String>) -> Self {
        self.reuse_key = Some(key.into());
        self
    }

    /// Report typographic metrics for baseline alignment.
    pub fn baseline(mut self, ascender: f64, descender: f64) -> Self {
        self.baseline = Some(Baseline {
            ascender,
            descender,
        });
        self
    }

    pub fn size(self, width: f64, height: f64) -> Node {
        self.into_node(LeafSizing::Fixed(Size::new(width, height)))
    }

    pub fn fill(self) -> Node {
        self.into_node(LeafSizing::Fill)
    }

    pub fn intrinsic(self) -> Node {
        self.into_node(LeafSizing::Intrinsic)
    }

    fn into_node(self, sizing: LeafSizing) -> Node {
        let baseline = self.baseline;
        let content = BoundView {
            make: self.make,
            updates: self.updates,
            reuse_key: self.reuse_key,
        };
        let mut leaf = ViewLeaf::new(Rc::new(content), sizing);
        if let Some(baseline) = baseline {
            leaf = leaf.with_baseline(baseline);
        }
        Node::View(Rc::new(leaf))
    }
}

struct BoundView<V: View> {
    make: Rc<dyn Fn() -> V>,
    updates: Vec<Rc<dyn Fn(&mut V)>>,
    reuse_key: Option<String>,
}

impl<V: View> ViewContent for BoundView<V> {
    fn reuse_key(&self) -> String {
        self.reuse_key
            .clone()
            .unwrap_or_else(|| std::any::type_name::<V>().to_string())
    }

    fn make_view(&self) -> ViewHandle {
        view_handle((self.make)())
    }

    fn update_view(&self, view: &ViewHandle) {
        let applied = with_view::<V, _>(view, |v| {
            for update in &self.updates {
                update(v);
            }
        });
        if applied.is_none() {
            tracing::warn!(
                expected = std::any::type_name::<V>(),
                "update skipped: view has a different type"
            );
        }
    }
}
