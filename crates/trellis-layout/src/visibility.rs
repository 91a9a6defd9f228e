//! Flattening a render tree into visible, absolutely positioned leaves.

use std::fmt;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use trellis_core::{Animator, Diagnostic, Point, Rect};

use crate::component::ViewContent;
use crate::render_node::{NodeContent, RenderNode, ReuseStrategy};

/// Structural key of a root node without an explicit id.
pub const ROOT_KEY: &str = "root";

/// A visible leaf with its absolute frame and identity.
#[derive(Clone)]
pub struct Renderable {
    /// Explicit id, or the structural path of the leaf
    pub id: String,
    /// Frame in the root's coordinate space
    pub frame: Rect,
    /// Reuse strategy after inheritance from ancestors
    pub reuse: ReuseStrategy,
    /// Animator override from the closest ancestor that set one
    pub animator: Option<Rc<dyn Animator>>,
    /// The leaf render node
    pub node: RenderNode,
}

impl Renderable {
    /// The view content backing this leaf.
    pub fn content(&self) -> Option<&Rc<dyn ViewContent>> {
        match self.node.content() {
            NodeContent::View(content) => Some(content),
            _ => None,
        }
    }

    /// Pool bucket for this leaf's view; `None` means never reuse.
    pub fn reuse_key(&self) -> Option<String> {
        match &self.reuse {
            ReuseStrategy::NoReuse => None,
            ReuseStrategy::Key(key) => Some(key.clone()),
            ReuseStrategy::Automatic => self.content().map(|c| c.reuse_key()),
        }
    }
}

impl fmt::Debug for Renderable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderable")
            .field("id", &self.id)
            .field("frame", &self.frame)
            .field("reuse", &self.reuse)
            .field("animated", &self.animator.is_some())
            .finish()
    }
}

/// Overrides flowing from ancestors to descendants.
#[derive(Clone, Default)]
struct Inherited {
    reuse: Option<ReuseStrategy>,
    animator: Option<Rc<dyn Animator>>,
}

impl Inherited {
    fn merge(&self, node: &RenderNode) -> Inherited {
        Inherited {
            reuse: node.reuse_strategy().cloned().or_else(|| self.reuse.clone()),
            animator: node.animator().cloned().or_else(|| self.animator.clone()),
        }
    }
}

impl RenderNode {
    /// Visible leaves inside `rect` (this node's local space), in tree order.
    ///
    /// Only children reported by [`RenderNode::visible_indexes`] are visited,
    /// so the cost is proportional to the visible part of the tree. Leaves
    /// without an explicit id get a structural id built from their index path;
    /// ids that still collide are suffixed with `#n`.
    pub fn visible_renderables(&self, rect: Rect) -> Vec<Renderable> {
        self.visible_renderables_reporting(rect).0
    }

    /// Like [`RenderNode::visible_renderables`], also returning one
    /// [`Diagnostic::IdentityCollision`] per identity that had to be suffixed.
    pub fn visible_renderables_reporting(&self, rect: Rect) -> (Vec<Renderable>, Vec<Diagnostic>) {
        let mut out = Vec::new();
        let key = self.id().unwrap_or(ROOT_KEY).to_string();
        self.collect(rect, Point::ZERO, &key, &Inherited::default(), &mut out);
        let collisions = disambiguate(&mut out);
        (out, collisions)
    }

    fn collect(
        &self,
        rect: Rect,
        origin: Point,
        key: &str,
        inherited: &Inherited,
        out: &mut Vec<Renderable>,
    ) {
        if self.size().is_zero() || rect.is_empty() {
            return;
        }

        let inherited = inherited.merge(self);

        match self.content() {
            NodeContent::View(_) => {
                let local = Rect::from_origin_size(Point::ZERO, self.size());
                if rect.intersects(&local) {
                    out.push(Renderable {
                        id: key.to_string(),
                        frame: local.translate(origin),
                        reuse: inherited.reuse.clone().unwrap_or_default(),
                        animator: inherited.animator.clone(),
                        node: self.clone(),
                    });
                }
                return;
            }
            NodeContent::Lazy(lazy) => {
                lazy.materialize().collect(rect, origin, key, &inherited, out);
                return;
            }
            NodeContent::Empty => {}
        }

        for index in self.visible_indexes(rect) {
            let child = &self.children()[index];
            let position = self.positions()[index];
            let child_key = match child.id() {
                Some(id) => id.to_string(),
                None => format!("{key}.{index}"),
            };
            child.collect(
                rect.translate(-position),
                origin + position,
                &child_key,
                &inherited,
                out,
            );
        }
    }
}

fn disambiguate(renderables: &mut [Renderable]) -> Vec<Diagnostic> {
    // Suffixes must not land on an id already present in the pass
    let mut taken: FxHashSet<String> = renderables.iter().map(|r| r.id.clone()).collect();
    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    let mut collided = Vec::new();
    for renderable in renderables.iter_mut() {
        let count = seen.entry(renderable.id.clone()).or_insert(0);
        if *count > 0 {
            if *count == 1 {
                collided.push(renderable.id.clone());
            }
            let mut suffix = *count;
            let mut candidate = format!("{}#{}", renderable.id, suffix);
            while taken.contains(&candidate) {
                suffix += 1;
                candidate = format!("{}#{}", renderable.id, suffix);
            }
            tracing::debug!(id = %renderable.id, %candidate, "duplicate identity suffixed");
            taken.insert(candidate.clone());
            renderable.id = candidate;
        }
        *count += 1;
    }
    collided
        .into_iter()
        .map(|identity| {
            let count = seen.get(&identity).copied().unwrap_or_default();
            Diagnostic::IdentityCollision { identity, count }
        })
        .collect()
}
