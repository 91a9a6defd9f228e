//! The closed set of layout nodes.
//!
//! Every layout algorithm is a variant of [`Node`]; leaf content plugs in
//! through [`Component`] and [`ViewContent`]. Builder methods on `Node` wrap a
//! node in the composition wrappers and modifiers:
//!
//! ```ignore
//! let card: Node = Stack::vertical(vec![title, body])
//!     .with_spacing(8.0)
//!     .into();
//! let card = card.inset(EdgeInsets::uniform(12.0)).background(fill).id("card");
//! ```

use std::fmt;
use std::rc::Rc;

use trellis_core::{Animator, Constraint, Diagnostic, EdgeInsets, Point, Size};

use crate::component::{Component, LeafSizing, ViewContent, ViewLeaf};
use crate::context::LayoutContext;
use crate::decoration::{
    Background, Badge, BadgePlacement, ConstraintOverride, Insets, Offset, Overlay, SizeRule,
    ZStack,
};
use crate::distribute::CrossAlign;
use crate::flow::Flow;
use crate::grid::Grid;
use crate::lazy::Lazy;
use crate::pager::Pager;
use crate::render_node::{RenderNode, ReuseStrategy};
use crate::stack::Stack;
use crate::waterfall::Waterfall;

/// A layout algorithm: `(config, constraint) -> RenderNode`.
pub trait Layout {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode;
}

/// A node of the declarative layout tree.
#[derive(Clone)]
pub enum Node {
    /// Empty fixed-size node; takes part in layout but renders nothing
    Space(Size),
    View(Rc<ViewLeaf>),
    Custom(Rc<dyn Component>),
    Stack(Rc<Stack>),
    Flow(Rc<Flow>),
    Waterfall(Rc<Waterfall>),
    Grid(Rc<Grid>),
    Pager(Rc<Pager>),
    ZStack(Rc<ZStack>),
    Insets(Rc<Insets>),
    Background(Rc<Background>),
    Overlay(Rc<Overlay>),
    Badge(Rc<Badge>),
    Offset(Rc<Offset>),
    Sized(Rc<ConstraintOverride>),
    Lazy(Rc<Lazy>),
    Flex(Rc<FlexItem>),
    Modified(Rc<Modified>),
}

/// Flex parameters read by Stack and Flow.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Flex {
    /// Share of leftover main-axis space (0 = don't grow)
    pub grow: f64,
    /// Share of main-axis deficit (0 = don't shrink)
    pub shrink: f64,
    /// Cross-axis alignment override
    pub align_self: Option<CrossAlign>,
}

#[derive(Clone)]
pub struct FlexItem {
    pub child: Node,
    pub flex: Flex,
}

/// Identity, reuse, and animator overrides on a subtree.
#[derive(Clone)]
pub struct Modified {
    pub child: Node,
    pub id: Option<String>,
    pub reuse: Option<ReuseStrategy>,
    pub animator: Option<Rc<dyn Animator>>,
}

impl Modified {
    fn new(child: Node) -> Self {
        Self {
            child,
            id: None,
            reuse: None,
            animator: None,
        }
    }
}

impl Layout for Modified {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        if let Some(id) = &self.id {
            cx.set_pending_id(id.clone());
        }
        let mut node = self.child.layout(cx, constraint);
        if let Some(id) = &self.id {
            cx.clear_pending_id();
            node = node.with_id(id.clone());
        }
        if let Some(reuse) = &self.reuse {
            node = node.with_reuse(reuse.clone());
        }
        if let Some(animator) = &self.animator {
            node = node.with_animator(animator.clone());
        }
        node
    }
}

/// Lay out a container. Containers never claim a pending explicit id; the
/// enclosing modifier stamps it on the container's own render node.
fn container<L: Layout + ?Sized>(
    layout: &L,
    cx: &mut LayoutContext,
    constraint: Constraint,
) -> RenderNode {
    cx.clear_pending_id();
    layout.layout(cx, constraint)
}

fn custom(component: &dyn Component, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
    let node = component.layout(cx, constraint);
    let size = node.size();
    if constraint.contains(size) {
        return node;
    }

    let clamped = constraint.clamp(size);
    cx.report(Diagnostic::ConstraintViolation {
        reported: (size.width, size.height),
        clamped: (clamped.width, clamped.height),
    });
    node.with_size(clamped)
}

impl Layout for Node {
    fn layout(&self, cx: &mut LayoutContext, constraint: Constraint) -> RenderNode {
        match self {
            Node::Space(size) => {
                cx.clear_pending_id();
                RenderNode::spacer(constraint.clamp(*size))
            }
            Node::View(leaf) => leaf.layout(cx, constraint),
            Node::Custom(component) => custom(component.as_ref(), cx, constraint),
            Node::Stack(stack) => container(stack.as_ref(), cx, constraint),
            Node::Flow(flow) => container(flow.as_ref(), cx, constraint),
            Node::Waterfall(waterfall) => container(waterfall.as_ref(), cx, constraint),
            Node::Grid(grid) => container(grid.as_ref(), cx, constraint),
            Node::Pager(pager) => container(pager.as_ref(), cx, constraint),
            Node::ZStack(zstack) => container(zstack.as_ref(), cx, constraint),
            Node::Insets(insets) => container(insets.as_ref(), cx, constraint),
            Node::Background(background) => container(background.as_ref(), cx, constraint),
            Node::Overlay(overlay) => container(overlay.as_ref(), cx, constraint),
            Node::Badge(badge) => container(badge.as_ref(), cx, constraint),
            Node::Offset(offset) => container(offset.as_ref(), cx, constraint),
            Node::Sized(sized) => container(sized.as_ref(), cx, constraint),
            Node::Lazy(lazy) => container(lazy.as_ref(), cx, constraint),
            Node::Flex(item) => item.child.layout(cx, constraint),
            Node::Modified(modified) => modified.layout(cx, constraint),
        }
    }
}

impl Node {
    /// An empty node of a fixed size.
    pub fn space(width: f64, height: f64) -> Node {
        Node::Space(Size::new(width, height))
    }

    /// A user-defined leaf or subtree.
    pub fn component(component: impl Component + 'static) -> Node {
        Node::Custom(Rc::new(component))
    }

    /// A view-backed leaf.
    pub fn view(content: Rc<dyn ViewContent>, sizing: LeafSizing) -> Node {
        Node::View(Rc::new(ViewLeaf::new(content, sizing)))
    }

    /// Flex parameters of this node, looking through modifiers.
    pub fn flex_params(&self) -> Flex {
        match self {
            Node::Flex(item) => item.flex,
            Node::Modified(modified) => modified.child.flex_params(),
            _ => Flex::default(),
        }
    }

    fn modify(self, f: impl FnOnce(&mut Modified)) -> Node {
        let mut modified = match self {
            Node::Modified(m) => Rc::try_unwrap(m).unwrap_or_else(|rc| (*rc).clone()),
            other => Modified::new(other),
        };
        f(&mut modified);
        Node::Modified(Rc::new(modified))
    }

    fn flexed(self, f: impl FnOnce(&mut Flex)) -> Node {
        let mut item = match self {
            Node::Flex(item) => Rc::try_unwrap(item).unwrap_or_else(|rc| (*rc).clone()),
            other => FlexItem {
                child: other,
                flex: Flex::default(),
            },
        };
        f(&mut item.flex);
        Node::Flex(Rc::new(item))
    }

    fn sized(self, f: impl FnOnce(&mut ConstraintOverride)) -> Node {
        let mut sized = match self {
            Node::Sized(sized) => Rc::try_unwrap(sized).unwrap_or_else(|rc| (*rc).clone()),
            other => ConstraintOverride::new(other),
        };
        f(&mut sized);
        Node::Sized(Rc::new(sized))
    }

    /// Explicit identity, sticky across reloads.
    pub fn id(self, id: impl Into<String>) -> Node {
        let id = id.into();
        self.modify(|m| m.id = Some(id))
    }

    pub fn reuse(self, strategy: ReuseStrategy) -> Node {
        self.modify(|m| m.reuse = Some(strategy))
    }

    /// Shorthand for `reuse(ReuseStrategy::Key(..))`.
    pub fn reuse_key(self, key: impl Into<String>) -> Node {
        self.reuse(ReuseStrategy::Key(key.into()))
    }

    pub fn no_reuse(self) -> Node {
        self.reuse(ReuseStrategy::NoReuse)
    }

    pub fn animator(self, animator: Rc<dyn Animator>) -> Node {
        self.modify(|m| m.animator = Some(animator))
    }

    pub fn flex(self, grow: f64) -> Node {
        self.flexed(|f| f.grow = grow)
    }

    pub fn shrink(self, shrink: f64) -> Node {
        self.flexed(|f| f.shrink = shrink)
    }

    pub fn align_self(self, align: CrossAlign) -> Node {
        self.flexed(|f| f.align_self = Some(align))
    }

    pub fn inset(self, insets: EdgeInsets) -> Node {
        Insets::new(self, insets).into()
    }

    pub fn padding(self, amount: f64) -> Node {
        self.inset(EdgeInsets::uniform(amount))
    }

    pub fn background(self, background: impl Into<Node>) -> Node {
        Background::new(self, background.into()).into()
    }

    pub fn overlay(self, overlay: impl Into<Node>) -> Node {
        Overlay::new(self, overlay.into()).into()
    }

    pub fn badge(self, badge: impl Into<Node>, placement: BadgePlacement) -> Node {
        Badge::new(self, badge.into(), placement).into()
    }

    pub fn offset(self, dx: f64, dy: f64) -> Node {
        Offset::new(self, Point::new(dx, dy)).into()
    }

    /// Fixed size on both axes, clamped by the parent constraint.
    pub fn size(self, width: f64, height: f64) -> Node {
        self.sized(|s| {
            s.width = SizeRule::Fixed(width);
            s.height = SizeRule::Fixed(height);
        })
    }

    pub fn width(self, width: SizeRule) -> Node {
        self.sized(|s| s.width = width)
    }

    pub fn height(self, height: SizeRule) -> Node {
        self.sized(|s| s.height = height)
    }

    pub fn min_size(self, min: Size) -> Node {
        self.sized(|s| s.min = Some(min))
    }

    pub fn max_size(self, max: Size) -> Node {
        self.sized(|s| s.max = Some(max))
    }

    /// Defer laying out this node until it first becomes visible.
    pub fn lazy(self, size_provider: impl Fn(Constraint) -> Size + 'static) -> Node {
        Lazy::new(self, size_provider).into()
    }

    fn kind(&self) -> &'static str {
        match self {
            Node::Space(_) => "Space",
            Node::View(_) => "View",
            Node::Custom(_) => "Custom",
            Node::Stack(_) => "Stack",
            Node::Flow(_) => "Flow",
            Node::Waterfall(_) => "Waterfall",
            Node::Grid(_) => "Grid",
            Node::Pager(_) => "Pager",
            Node::ZStack(_) => "ZStack",
            Node::Insets(_) => "Insets",
            Node::Background(_) => "Background",
            Node::Overlay(_) => "Overlay",
            Node::Badge(_) => "Badge",
            Node::Offset(_) => "Offset",
            Node::Sized(_) => "Sized",
            Node::Lazy(_) => "Lazy",
            Node::Flex(_) => "Flex",
            Node::Modified(_) => "Modified",
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Space(size) => write!(f, "Space({}x{})", size.width, size.height),
            Node::Modified(m) => f
                .debug_struct("Modified")
                .field("id", &m.id)
                .field("reuse", &m.reuse)
                .field("child", &m.child)
                .finish(),
            other => f.write_str(other.kind()),
        }
    }
}

macro_rules! into_node {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Node {
                fn from(value: $ty) -> Self {
                    Node::$variant(Rc::new(value))
                }
            }
        )*
    };
}

into_node! {
    Stack => Stack,
    Flow => Flow,
    Waterfall => Waterfall,
    Grid => Grid,
    Pager => Pager,
    ZStack => ZStack,
    Insets => Insets,
    Background => Background,
    Overlay => Overlay,
    Badge => Badge,
    Offset => Offset,
    ConstraintOverride => Sized,
    Lazy => Lazy,
}

impl From<ViewLeaf> for Node {
    fn from(leaf: ViewLeaf) -> Self {
        Node::View(Rc::new(leaf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::testing::Swatch;

    #[test]
    fn test_space_is_clamped() {
        let node = Node::space(300.0, 10.0).layout(
            &mut LayoutContext::new(),
            Constraint::loose(Size::new(100.0, 100.0)),
        );
        assert_eq!(node.size(), Size::new(100.0, 10.0));
    }

    #[test]
    fn test_custom_violation_is_clamped_and_reported() {
        let node = Node::component(|_cx: &mut LayoutContext, _c: Constraint| {
            RenderNode::spacer(Size::new(500.0, 5.0))
        });
        let mut cx = LayoutContext::new();
        let result = node.layout(&mut cx, Constraint::loose(Size::new(100.0, 100.0)));
        assert_eq!(result.size(), Size::new(100.0, 5.0));
        assert_eq!(
            cx.diagnostics(),
            &[Diagnostic::ConstraintViolation {
                reported: (500.0, 5.0),
                clamped: (100.0, 5.0),
            }]
        );
    }

    #[test]
    fn test_id_is_claimed_by_leaf() {
        let leaf = Node::view(Swatch::natural(10.0, 10.0), LeafSizing::Intrinsic).id("avatar");
        let mut cx = LayoutContext::new();
        let node = leaf.layout(&mut cx, Constraint::unbounded());
        assert_eq!(node.id(), Some("avatar"));
        assert!(cx.measurements().contains("avatar"));
        // The explicit id did not consume an implicit one
        assert_eq!(cx.next_auto_id(), "auto-0");
    }

    #[test]
    fn test_id_does_not_leak_into_container_children() {
        let stack: Node = Stack::vertical(vec![
            Node::view(Swatch::natural(10.0, 10.0), LeafSizing::Intrinsic),
        ])
        .into();
        let mut cx = LayoutContext::new();
        let node = stack.id("list").layout(&mut cx, Constraint::unbounded());
        assert_eq!(node.id(), Some("list"));
        assert!(cx.measurements().contains("auto-0"));
        assert!(!cx.measurements().contains("list"));
    }

    #[test]
    fn test_modifiers_merge() {
        let node = Node::space(1.0, 1.0).id("a").no_reuse().id("b");
        let Node::Modified(m) = &node else {
            panic!("expected a modifier");
        };
        assert_eq!(m.id.as_deref(), Some("b"));
        assert_eq!(m.reuse, Some(ReuseStrategy::NoReuse));
        assert!(matches!(m.child, Node::Space(_)));
    }

    #[test]
    fn test_flex_params_look_through_modifiers() {
        let node = Node::space(1.0, 1.0).flex(2.0).shrink(1.0).id("x");
        let flex = node.flex_params();
        assert_eq!(flex.grow, 2.0);
        assert_eq!(flex.shrink, 1.0);
        assert_eq!(Node::space(1.0, 1.0).flex_params(), Flex::default());
    }

    #[test]
    fn test_size_modifiers_merge() {
        let node = Node::space(0.0, 0.0)
            .width(SizeRule::Fixed(40.0))
            .height(SizeRule::Fixed(20.0));
        assert!(matches!(node, Node::Sized(_)));
        let result = node.layout(&mut LayoutContext::new(), Constraint::unbounded());
        assert_eq!(result.size(), Size::new(40.0, 20.0));
    }
}
