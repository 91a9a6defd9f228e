//! Pass-scoped layout context.
//!
//! A [`LayoutContext`] is threaded explicitly through every `layout` call. It
//! hands out implicit identities, carries the measurement cache shared across
//! passes, and collects diagnostics. Nothing here lives in thread-local or
//! global storage; nested passes save and restore the counters explicitly.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use trellis_core::{Constraint, Diagnostic, Size};

/// Prefix of identities handed out by the auto counter.
pub const AUTO_ID_PREFIX: &str = "auto-";

#[derive(Debug, Clone, Copy)]
struct Measurement {
    constraint: Constraint,
    size: Size,
}

/// Sizes measured for leaves, keyed by node identity.
///
/// Cloning shares the underlying storage.
#[derive(Debug, Clone, Default)]
pub struct MeasurementCache {
    entries: Rc<RefCell<FxHashMap<String, Measurement>>>,
}

impl MeasurementCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached size for `key`, if it was measured under the same constraint.
    pub fn get(&self, key: &str, constraint: Constraint) -> Option<Size> {
        self.entries
            .borrow()
            .get(key)
            .filter(|m| m.constraint == constraint)
            .map(|m| m.size)
    }

    pub fn insert(&self, key: impl Into<String>, constraint: Constraint, size: Size) {
        self.entries
            .borrow_mut()
            .insert(key.into(), Measurement { constraint, size });
    }

    pub fn remove(&self, key: &str) -> Option<Size> {
        self.entries.borrow_mut().remove(key).map(|m| m.size)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Drop every entry keyed by an implicit identity.
    ///
    /// Implicit identities are positional, so after the root data changes they
    /// may name a different node.
    pub fn forget_implicit(&self) -> usize {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(AUTO_ID_PREFIX));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// Counter state captured by [`LayoutContext::save`].
#[derive(Debug, Clone)]
pub struct SavedContext {
    next_auto_id: u64,
    pending_id: Option<String>,
}

/// State threaded through one layout pass.
#[derive(Debug, Default)]
pub struct LayoutContext {
    next_auto_id: u64,
    pending_id: Option<String>,
    measurements: MeasurementCache,
    diagnostics: Vec<Diagnostic>,
    relayouts: usize,
}

impl LayoutContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh pass sharing an existing measurement cache.
    pub fn with_measurements(measurements: MeasurementCache) -> Self {
        Self {
            measurements,
            ..Default::default()
        }
    }

    /// Next implicit identity in this pass.
    pub fn next_auto_id(&mut self) -> String {
        let id = format!("{AUTO_ID_PREFIX}{}", self.next_auto_id);
        self.next_auto_id += 1;
        id
    }

    /// Identity for the node being laid out: the explicit id set by an
    /// enclosing `.id()` modifier, or the next implicit one.
    pub fn claim_key(&mut self) -> String {
        match self.pending_id.take() {
            Some(id) => id,
            None => self.next_auto_id(),
        }
    }

    pub(crate) fn set_pending_id(&mut self, id: String) {
        self.pending_id = Some(id);
    }

    pub(crate) fn clear_pending_id(&mut self) {
        self.pending_id = None;
    }

    pub fn measurements(&self) -> &MeasurementCache {
        &self.measurements
    }

    /// Log and record a non-fatal anomaly.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Record that a child was laid out a second time in this pass.
    pub fn note_relayout(&mut self) {
        self.relayouts += 1;
    }

    /// Second layouts performed so far (stretch, flex grow/shrink).
    pub fn relayout_count(&self) -> usize {
        self.relayouts
    }

    pub fn save(&self) -> SavedContext {
        SavedContext {
            next_auto_id: self.next_auto_id,
            pending_id: self.pending_id.clone(),
        }
    }

    pub fn restore(&mut self, saved: SavedContext) {
        self.next_auto_id = saved.next_auto_id;
        self.pending_id = saved.pending_id;
    }

    /// Run an unrelated layout pass (e.g. a child engine) inside this one.
    ///
    /// The nested pass starts its own auto counter; this pass's counter is
    /// restored afterwards. Measurements and diagnostics are shared.
    pub fn nested<R>(&mut self, f: impl FnOnce(&mut LayoutContext) -> R) -> R {
        let saved = self.save();
        self.next_auto_id = 0;
        self.pending_id = None;
        let result = f(self);
        self.restore(saved);
        result
    }
}
