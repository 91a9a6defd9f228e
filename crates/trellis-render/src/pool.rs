//! Keyed LIFO pool of detached or hidden views.
//!
//! Views are grouped into buckets by reuse key. A single idle timer covers the
//! whole pool: once `ttl` passes without an enqueue or dequeue, every pooled
//! view is detached and dropped at once. Timers are polled, not scheduled;
//! the engine polls at the start of each render pass and the pool polls
//! itself on every enqueue/dequeue.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use trellis_core::{RemovalPolicy, ViewHandle, DEFAULT_REUSE_TTL};

/// Source of the current time for eviction.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }
}

/// A pool shared by every engine on the UI thread.
pub type SharedPool = Rc<RefCell<ReusePool>>;

thread_local! {
    static SHARED: SharedPool = Rc::new(RefCell::new(ReusePool::default()));
}

pub struct ReusePool {
    ttl: Duration,
    policy: RemovalPolicy,
    clock: Rc<dyn Clock>,
    buckets: FxHashMap<String, Vec<ViewHandle>>,
    /// Time of the last enqueue/dequeue; `None` when the timer is idle
    last_activity: Option<Instant>,
}

impl Default for ReusePool {
    fn default() -> Self {
        Self::new(DEFAULT_REUSE_TTL, Rc::new(SystemClock))
    }
}

impl ReusePool {
    pub fn new(ttl: Duration, clock: Rc<dyn Clock>) -> Self {
        Self {
            ttl,
            policy: RemovalPolicy::default(),
            clock,
            buckets: FxHashMap::default(),
            last_activity: None,
        }
    }

    /// The process-wide pool for the current (UI) thread.
    pub fn shared() -> SharedPool {
        SHARED.with(Rc::clone)
    }

    pub fn into_shared(self) -> SharedPool {
        Rc::new(RefCell::new(self))
    }

    pub fn with_policy(mut self, policy: RemovalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }

    pub fn policy(&self) -> RemovalPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: RemovalPolicy) {
        self.policy = policy;
    }

    /// Mark `view` free under `key` and restart the idle timer.
    pub fn enqueue(&mut self, key: &str, view: ViewHandle) {
        self.enqueue_with_policy(key, view, self.policy);
    }

    /// Like [`ReusePool::enqueue`], hiding or detaching per `policy` instead
    /// of the pool's own policy.
    pub fn enqueue_with_policy(&mut self, key: &str, view: ViewHandle, policy: RemovalPolicy) {
        self.poll_eviction();
        {
            let mut v = view.borrow_mut();
            match policy {
                RemovalPolicy::Hide => v.set_hidden(true),
                RemovalPolicy::Remove => v.detach(),
            }
        }
        tracing::trace!(key, "enqueue view");
        self.buckets.entry(key.to_string()).or_default().push(view);
        self.touch();
    }

    /// Most recently enqueued view under `key`, prepared for reuse.
    pub fn take(&mut self, key: &str) -> Option<ViewHandle> {
        self.poll_eviction();
        let view = self.buckets.get_mut(key)?.pop()?;
        {
            let mut v = view.borrow_mut();
            v.clear_transform();
            v.prepare_for_reuse();
            v.set_hidden(false);
        }
        tracing::trace!(key, "dequeue pooled view");
        self.touch();
        Some(view)
    }

    /// A pooled view under `key`, or a fresh one from `make`.
    pub fn dequeue(&mut self, key: &str, make: impl FnOnce() -> ViewHandle) -> ViewHandle {
        match self.take(key) {
            Some(view) => view,
            None => make(),
        }
    }

    /// Run `cleanup` if the pool has been idle for a full TTL. Returns the
    /// number of evicted views.
    pub fn poll_eviction(&mut self) -> usize {
        match self.last_activity {
            Some(at) if self.clock.now().saturating_duration_since(at) >= self.ttl => self.cleanup(),
            _ => 0,
        }
    }

    /// Detach and drop every pooled view.
    pub fn cleanup(&mut self) -> usize {
        let mut evicted = 0;
        for (_, views) in self.buckets.drain() {
            for view in views {
                view.borrow_mut().detach();
                evicted += 1;
            }
        }
        self.last_activity = None;
        if evicted > 0 {
            tracing::debug!(evicted, "reuse pool cleanup");
        }
        evicted
    }

    /// Total pooled views.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bucket_len(&self, key: &str) -> usize {
        self.buckets.get(key).map_or(0, Vec::len)
    }

    fn touch(&mut self) {
        self.last_activity = Some(self.clock.now());
    }
}

impl std::fmt::Debug for ReusePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReusePool")
            .field("ttl", &self.ttl)
            .field("policy", &self.policy)
            .field("len", &self.len())
            .finish()
    }
}
