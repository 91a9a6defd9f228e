//! The reconciliation engine.
//!
//! An [`Engine`] owns the root [`Node`], the cached [`RenderNode`] tree, and
//! the live views currently mounted in its [`Host`]. Each layout opportunity
//! it:
//!
//! 1. Lays the root out again if the tree was invalidated or never built
//! 2. Queries the visible renderables for the host viewport
//! 3. Diffs them by identity against the views of the previous pass
//! 4. Retires, carries forward, or creates views through the [`Animator`]
//!    and the [`ReusePool`](crate::ReusePool)
//! 5. Mounts the live views in tree order
//!
//! Reload and render never nest. Requests made while a pass is in flight
//! (for example from a leaf's update closure through an [`EngineHandle`])
//! only set a flag and are serviced on the next opportunity.

use std::cell::Cell;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};
use trellis_core::{
    Animator, ConfigError, Constraint, Diagnostic, EngineConfig, Immediate, Point, Rect, Size,
    ViewHandle,
};
use trellis_layout::{Layout, LayoutContext, MeasurementCache, Node, RenderNode, Renderable};

use crate::host::Host;
use crate::pool::{ReusePool, SharedPool, SystemClock};

/// What one render pass did to the live views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileStats {
    /// Views created or dequeued for new identities
    pub inserted: usize,
    /// Views carried forward to a new frame
    pub updated: usize,
    /// Views handed to the animator's delete hook
    pub removed: usize,
    /// Carried-forward views that also received a shift
    pub shifted: usize,
    /// Inserted views that came out of the reuse pool
    pub reused: usize,
}

impl ReconcileStats {
    pub fn is_noop(&self) -> bool {
        self.inserted == 0 && self.removed == 0
    }
}

#[derive(Debug, Default)]
struct Flags {
    needs_reload: Cell<bool>,
    needs_invalidate: Cell<bool>,
    needs_render: Cell<bool>,
    reloading: Cell<bool>,
    rendering: Cell<bool>,
}

impl Flags {
    fn in_flight(&self) -> bool {
        self.reloading.get() || self.rendering.get()
    }

    fn request(&self, flag: &Cell<bool>, what: &'static str) {
        if self.in_flight() {
            tracing::debug!(request = what, "deferred until next layout opportunity");
        }
        flag.set(true);
    }
}

/// Cloneable handle for requesting work from an [`Engine`] without `&mut`
/// access to it.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    flags: Rc<Flags>,
}

impl EngineHandle {
    /// Discard the cached tree; relayout and re-render on the next opportunity.
    pub fn set_needs_reload(&self) {
        self.flags.request(&self.flags.needs_reload, "reload");
    }

    /// Relayout on the next opportunity, keeping identity state.
    pub fn set_needs_invalidate_layout(&self) {
        self.flags.request(&self.flags.needs_invalidate, "invalidate");
    }

    /// Recompute the visible set from the cached tree.
    pub fn set_needs_render(&self) {
        self.flags.request(&self.flags.needs_render, "render");
    }

    /// Whether any request is waiting for the next opportunity.
    pub fn needs_layout(&self) -> bool {
        self.flags.needs_reload.get()
            || self.flags.needs_invalidate.get()
            || self.flags.needs_render.get()
    }
}

struct LiveView {
    view: ViewHandle,
    reuse_key: Option<String>,
    animator: Option<Rc<dyn Animator>>,
    frame: Rect,
}

pub struct Engine {
    config: EngineConfig,
    pool: SharedPool,
    animator: Rc<dyn Animator>,
    component: Option<Node>,
    flags: Rc<Flags>,
    measurements: MeasurementCache,
    render_node: Option<RenderNode>,
    last_constraint: Option<Constraint>,
    last_viewport: Option<Rect>,
    content_size: Size,
    visible: IndexMap<String, LiveView, FxBuildHasher>,
    renderables: Vec<Renderable>,
    layout_diagnostics: Vec<Diagnostic>,
    render_diagnostics: Vec<Diagnostic>,
    last_stats: ReconcileStats,
}

impl Engine {
    /// Create an engine backed by the thread's shared reuse pool.
    ///
    /// The shared pool keeps its own TTL; `reuse_ttl` only applies to a pool
    /// created by [`Engine::with_own_pool`]. The removal policy is applied
    /// per engine whenever it retires a view.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            pool: ReusePool::shared(),
            animator: Rc::new(Immediate),
            component: None,
            flags: Rc::new(Flags::default()),
            measurements: MeasurementCache::new(),
            render_node: None,
            last_constraint: None,
            last_viewport: None,
            content_size: Size::ZERO,
            visible: IndexMap::default(),
            renderables: Vec::new(),
            layout_diagnostics: Vec::new(),
            render_diagnostics: Vec::new(),
            last_stats: ReconcileStats::default(),
            config,
        })
    }

    /// Use `pool` instead of the shared one. Its TTL is left as is.
    pub fn with_pool(mut self, pool: SharedPool) -> Self {
        self.pool = pool;
        self
    }

    /// Use a pool private to this engine, evicting after `reuse_ttl`.
    pub fn with_own_pool(mut self) -> Self {
        self.pool = ReusePool::new(self.config.reuse_ttl, Rc::new(SystemClock)).into_shared();
        self
    }

    /// Default animator for views without an override.
    pub fn with_animator(mut self, animator: Rc<dyn Animator>) -> Self {
        self.animator = animator;
        self
    }

    /// Replace the root node. Takes effect as a reload.
    pub fn set_component(&mut self, component: impl Into<Node>) {
        self.component = Some(component.into());
        self.flags.needs_reload.set(true);
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            flags: self.flags.clone(),
        }
    }

    pub fn set_needs_reload(&self) {
        self.handle().set_needs_reload();
    }

    pub fn set_needs_invalidate_layout(&self) {
        self.handle().set_needs_invalidate_layout();
    }

    pub fn set_needs_render(&self) {
        self.handle().set_needs_render();
    }

    /// Service pending requests. Call once per host layout opportunity.
    ///
    /// A changed root constraint relayouts; a moved or resized viewport
    /// re-renders. With nothing to do only the pool's idle timer is polled.
    pub fn layout_if_needed(&mut self, host: &mut dyn Host) -> ReconcileStats {
        if self.flags.in_flight() {
            tracing::debug!("layout opportunity skipped; pass in flight");
            return ReconcileStats::default();
        }

        let constraint = host.constraint();
        if self.last_constraint != Some(constraint) {
            self.flags.needs_invalidate.set(true);
        }

        if self.flags.needs_reload.get() {
            return self.reload_data(host, None);
        }

        let mut dirty = self.flags.needs_render.get();
        let unbuilt = self.render_node.is_none() && self.component.is_some();
        if self.flags.needs_invalidate.get() || unbuilt {
            self.flags.needs_invalidate.set(false);
            self.layout(constraint);
            dirty = true;
        }

        let viewport = Rect::from_origin_size(host.content_offset(), host.bounds());
        if dirty || self.last_viewport != Some(viewport) {
            self.render(host, Point::ZERO)
        } else {
            self.pool.borrow_mut().poll_eviction();
            ReconcileStats::default()
        }
    }

    /// Lay the root out and render immediately.
    ///
    /// Measurements cached under implicit identities are dropped first, since
    /// those identities may now name other nodes. `offset_adjustment` is added
    /// to the host's content offset after layout; carried-forward views get
    /// the animator's shift hook with that delta.
    pub fn reload_data(
        &mut self,
        host: &mut dyn Host,
        offset_adjustment: Option<Point>,
    ) -> ReconcileStats {
        self.flags.reloading.set(true);
        self.flags.needs_reload.set(false);
        self.flags.needs_invalidate.set(false);

        let forgotten = self.measurements.forget_implicit();
        tracing::debug!(forgotten, "reload started");
        self.layout(host.constraint());
        self.flags.reloading.set(false);

        let adjustment = offset_adjustment.unwrap_or(Point::ZERO);
        if adjustment != Point::ZERO {
            host.set_content_offset(host.content_offset() + adjustment);
        }
        let stats = self.render(host, adjustment);
        tracing::debug!(content_size = ?self.content_size, "reload finished");
        stats
    }

    /// Size of the root laid out under `Constraint::loose(proposal)`.
    ///
    /// Touches neither the cached tree nor the live views.
    pub fn size_that_fits(&self, proposal: Size) -> Size {
        let Some(component) = &self.component else {
            return Size::ZERO;
        };
        let mut cx = LayoutContext::with_measurements(self.measurements.clone());
        component.layout(&mut cx, Constraint::loose(proposal)).size()
    }

    fn layout(&mut self, constraint: Constraint) {
        self.last_constraint = Some(constraint);
        let Some(component) = &self.component else {
            self.render_node = None;
            self.layout_diagnostics.clear();
            return;
        };

        let mut cx = LayoutContext::with_measurements(self.measurements.clone());
        let node = component.layout(&mut cx, constraint);
        tracing::debug!(
            size = ?node.size(),
            nodes = node.node_count(),
            relayouts = cx.relayout_count(),
            "layout pass"
        );
        self.layout_diagnostics = cx.take_diagnostics();
        self.render_node = Some(node);
    }

    fn render(&mut self, host: &mut dyn Host, adjustment: Point) -> ReconcileStats {
        self.flags.rendering.set(true);
        self.flags.needs_render.set(false);
        self.pool.borrow_mut().poll_eviction();

        // A host may clamp its offset when the content shrinks; that counts
        // as a shift too.
        let mut shift = adjustment;
        let size = self.render_node.as_ref().map_or(Size::ZERO, RenderNode::size);
        if size != self.content_size {
            let before = host.content_offset();
            self.content_size = size;
            host.set_content_size(size);
            shift += host.content_offset() - before;
        }

        let viewport = Rect::from_origin_size(host.content_offset(), host.bounds());
        let visible_rect = viewport.inset_by(self.config.visible_frame_inset);
        let renderables = match &self.render_node {
            Some(node) => {
                let (renderables, collisions) = node.visible_renderables_reporting(visible_rect);
                self.render_diagnostics = collisions;
                renderables
            }
            None => {
                self.render_diagnostics.clear();
                Vec::new()
            }
        };

        let mut stats = ReconcileStats::default();
        let incoming: FxHashMap<&str, usize> = renderables
            .iter()
            .enumerate()
            .map(|(index, r)| (r.id.as_str(), index))
            .collect();

        // Retire first so their views are back in the pool before new
        // identities dequeue.
        let mut carried: FxHashMap<String, LiveView> = FxHashMap::default();
        for (id, live) in std::mem::take(&mut self.visible) {
            let same_kind = incoming
                .get(id.as_str())
                .is_some_and(|&index| renderables[index].reuse_key() == live.reuse_key);
            if same_kind {
                carried.insert(id, live);
            } else {
                tracing::trace!(%id, "retiring view");
                self.retire(live);
                stats.removed += 1;
            }
        }

        let shifted = shift != Point::ZERO && self.config.animate_size_changes;
        let mut next = IndexMap::with_capacity_and_hasher(renderables.len(), FxBuildHasher);
        for renderable in &renderables {
            let Some(content) = renderable.content() else {
                continue;
            };
            let animator = renderable
                .animator
                .clone()
                .unwrap_or_else(|| self.animator.clone());

            let live = match carried.remove(&renderable.id) {
                Some(mut live) => {
                    content.update_view(&live.view);
                    animator.update(&live.view, renderable.frame);
                    stats.updated += 1;
                    if shifted {
                        animator.shift(&live.view, shift, renderable.frame);
                        stats.shifted += 1;
                    }
                    live.frame = renderable.frame;
                    live.animator = renderable.animator.clone();
                    live
                }
                None => {
                    let reuse_key = renderable.reuse_key();
                    let pooled = reuse_key
                        .as_deref()
                        .and_then(|key| self.pool.borrow_mut().take(key));
                    let view = match pooled {
                        Some(view) => {
                            stats.reused += 1;
                            view
                        }
                        None => content.make_view(),
                    };
                    content.update_view(&view);
                    animator.insert(&view, renderable.frame);
                    stats.inserted += 1;
                    LiveView {
                        view,
                        reuse_key,
                        animator: renderable.animator.clone(),
                        frame: renderable.frame,
                    }
                }
            };
            next.insert(renderable.id.clone(), live);
        }

        let views: Vec<ViewHandle> = next.values().map(|live| live.view.clone()).collect();
        host.mount(&views);

        self.visible = next;
        self.renderables = renderables;
        self.last_viewport = Some(viewport);
        self.last_stats = stats;
        self.flags.rendering.set(false);

        tracing::debug!(
            inserted = stats.inserted,
            updated = stats.updated,
            removed = stats.removed,
            shifted = stats.shifted,
            reused = stats.reused,
            "render pass"
        );
        stats
    }

    fn retire(&self, live: LiveView) {
        let animator = live.animator.unwrap_or_else(|| self.animator.clone());
        let pool = self.pool.clone();
        let view = live.view.clone();
        let key = live.reuse_key;
        let policy = self.config.removal_policy;
        animator.delete(
            &live.view,
            Box::new(move || match key {
                Some(key) => pool.borrow_mut().enqueue_with_policy(&key, view, policy),
                None => view.borrow_mut().detach(),
            }),
        );
    }

    /// Renderables of the last render pass, in tree order.
    pub fn visible_renderables(&self) -> &[Renderable] {
        &self.renderables
    }

    /// Live views in mount order.
    pub fn visible_views(&self) -> Vec<ViewHandle> {
        self.visible.values().map(|live| live.view.clone()).collect()
    }

    /// The live view for an identity, if it is visible.
    pub fn view_for(&self, id: &str) -> Option<&ViewHandle> {
        self.visible.get(id).map(|live| &live.view)
    }

    /// Frame last applied to the view for `id`.
    pub fn frame_for(&self, id: &str) -> Option<Rect> {
        self.visible.get(id).map(|live| live.frame)
    }

    pub fn content_size(&self) -> Size {
        self.content_size
    }

    pub fn render_node(&self) -> Option<&RenderNode> {
        self.render_node.as_ref()
    }

    /// Anomalies from the last layout and render passes.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.layout_diagnostics
            .iter()
            .chain(self.render_diagnostics.iter())
    }

    pub fn last_stats(&self) -> ReconcileStats {
        self.last_stats
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pool(&self) -> &SharedPool {
        &self.pool
    }

    pub fn measurements(&self) -> &MeasurementCache {
        &self.measurements
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        for (_, live) in self.visible.drain(..) {
            live.view.borrow_mut().detach();
        }
    }
}
