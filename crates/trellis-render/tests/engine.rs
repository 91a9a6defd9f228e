//! Reconciliation driven through a recording host and animator.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use trellis_core::{
    same_view, with_view, Animator, Completion, Diagnostic, EngineConfig, Point, Rect,
    RemovalPolicy, Size, View, ViewHandle,
};
use trellis_layout::{Node, Pager, Stack, ViewComponent};
use trellis_render::{Engine, Host, ManualClock, ReconcileStats, ReusePool};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct Label {
    frame: Rect,
    text: String,
    hidden: bool,
    attached: bool,
    reuses: usize,
}

impl View for Label {
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

    fn detach(&mut self) {
        self.attached = false;
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn prepare_for_reuse(&mut self) {
        self.reuses += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn text_of(view: &ViewHandle) -> String {
    with_view::<Label, _>(view, |label| label.text.clone()).unwrap_or_default()
}

fn reuses_of(view: &ViewHandle) -> usize {
    with_view::<Label, _>(view, |label| label.reuses).unwrap_or_default()
}

struct RecordingHost {
    bounds: Size,
    offset: Point,
    content_size: Size,
    mounted: Vec<ViewHandle>,
}

impl RecordingHost {
    fn new(width: f64, height: f64) -> Self {
        Self {
            bounds: Size::new(width, height),
            offset: Point::ZERO,
            content_size: Size::ZERO,
            mounted: Vec::new(),
        }
    }
}

impl Host for RecordingHost {
    fn bounds(&self) -> Size {
        self.bounds
    }

    fn content_offset(&self) -> Point {
        self.offset
    }

    fn set_content_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    fn set_content_size(&mut self, size: Size) {
        self.content_size = size;
    }

    fn mount(&mut self, views: &[ViewHandle]) {
        self.mounted = views.to_vec();
    }
}

#[derive(Default)]
struct RecordingAnimator {
    events: RefCell<Vec<String>>,
    hold_deletes: bool,
    held: RefCell<Vec<Completion>>,
}

impl RecordingAnimator {
    fn holding_deletes() -> Self {
        Self {
            hold_deletes: true,
            ..Default::default()
        }
    }

    fn record(&self, kind: &str, frame: Rect) {
        self.events
            .borrow_mut()
            .push(format!("{kind} {} {}", frame.origin.x, frame.origin.y));
    }

    fn count(&self, kind: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.split(' ').next() == Some(kind))
            .count()
    }

    fn finish_deletes(&self) {
        let held: Vec<Completion> = self.held.borrow_mut().drain(..).collect();
        for completion in held {
            completion();
        }
    }
}

impl Animator for RecordingAnimator {
    fn insert(&self, view: &ViewHandle, frame: Rect) {
        self.record("insert", frame);
        view.borrow_mut().set_frame(frame);
    }

    fn update(&self, view: &ViewHandle, frame: Rect) {
        self.record("update", frame);
        view.borrow_mut().set_frame(frame);
    }

    fn shift(&self, view: &ViewHandle, delta: Point, frame: Rect) {
        self.events
            .borrow_mut()
            .push(format!("shift {} {}", delta.x, delta.y));
        view.borrow_mut().set_frame(frame);
    }

    fn delete(&self, view: &ViewHandle, completion: Completion) {
        let frame = view.borrow().frame();
        self.record("delete", frame);
        if self.hold_deletes {
            self.held.borrow_mut().push(completion);
        } else {
            completion();
        }
    }
}

/// A 100x20 label row counting how many views its factory built.
fn row(made: &Rc<Cell<usize>>, text: &str) -> Node {
    let made = made.clone();
    let text = text.to_string();
    ViewComponent::new(move || {
        made.set(made.get() + 1);
        Label {
            attached: true,
            ..Default::default()
        }
    })
    .update(move |label| label.text = text.clone())
    .reuse_key("label")
    .size(100.0, 20.0)
}

fn rows(made: &Rc<Cell<usize>>, count: usize) -> Stack {
    Stack::vertical((0..count).map(|i| row(made, &format!("row {i}"))).collect())
}

struct Fixture {
    engine: Engine,
    host: RecordingHost,
    animator: Rc<RecordingAnimator>,
    clock: ManualClock,
    made: Rc<Cell<usize>>,
}

fn fixture_with(config: EngineConfig, animator: RecordingAnimator) -> Fixture {
    init_tracing();
    let clock = ManualClock::new();
    let pool = ReusePool::new(config.reuse_ttl, Rc::new(clock.clone())).into_shared();
    let animator = Rc::new(animator);
    let engine = Engine::new(config)
        .expect("valid config")
        .with_pool(pool)
        .with_animator(animator.clone());
    Fixture {
        engine,
        host: RecordingHost::new(100.0, 100.0),
        animator,
        clock,
        made: Rc::new(Cell::new(0)),
    }
}

fn fixture() -> Fixture {
    fixture_with(EngineConfig::default(), RecordingAnimator::default())
}

impl Fixture {
    fn pass(&mut self) -> ReconcileStats {
        self.engine.layout_if_needed(&mut self.host)
    }

    fn ids(&self) -> Vec<String> {
        self.engine
            .visible_renderables()
            .iter()
            .map(|r| r.id.clone())
            .collect()
    }
}

#[test]
fn unchanged_tree_reconciles_without_churn() {
    let mut f = fixture();
    let made = f.made.clone();
    f.engine.set_component(Stack::vertical(vec![
        row(&made, "a").id("a"),
        row(&made, "b").id("b"),
        row(&made, "c").id("c"),
    ]));
    let first = f.pass();
    assert_eq!(first.inserted, 3);
    let before = f.engine.visible_views();

    f.engine.set_needs_reload();
    let second = f.pass();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.removed, 0);
    assert_eq!(second.updated, 3);

    let after = f.engine.visible_views();
    assert!(before.iter().zip(&after).all(|(a, b)| same_view(a, b)));
    assert_eq!(made.get(), 3);
}

#[test]
fn removing_an_explicit_id_deletes_only_its_view() {
    let mut f = fixture();
    let made = f.made.clone();
    f.engine.set_component(Stack::vertical(vec![
        row(&made, "a").id("a"),
        row(&made, "b").id("b"),
        row(&made, "c").id("c"),
    ]));
    f.pass();
    let a = f.engine.view_for("a").cloned().expect("a is visible");
    let b = f.engine.view_for("b").cloned().expect("b is visible");
    let c = f.engine.view_for("c").cloned().expect("c is visible");

    f.engine.set_component(Stack::vertical(vec![
        row(&made, "a").id("a"),
        row(&made, "c").id("c"),
    ]));
    let stats = f.pass();
    assert_eq!(stats.removed, 1);
    assert_eq!(stats.inserted, 0);
    assert_eq!(f.animator.count("delete"), 1);

    assert!(same_view(f.engine.view_for("a").expect("a"), &a));
    assert!(same_view(f.engine.view_for("c").expect("c"), &c));
    assert!(f.engine.view_for("b").is_none());
    assert!(!b.borrow().is_attached());

    // c moved up into b's slot
    assert_eq!(c.borrow().frame(), Rect::new(0.0, 20.0, 100.0, 20.0));
    assert_eq!(f.engine.pool().borrow().bucket_len("label"), 1);
}

#[test]
fn implicit_identity_follows_position() {
    let mut f = fixture();
    let made = f.made.clone();
    f.engine
        .set_component(Stack::vertical(vec![row(&made, "x"), row(&made, "y")]));
    f.pass();
    let first = f.engine.view_for("root.0").cloned().expect("root.0");

    f.engine.set_component(Stack::vertical(vec![
        row(&made, "new"),
        row(&made, "x"),
        row(&made, "y"),
    ]));
    let stats = f.pass();
    assert_eq!(stats.updated, 2);
    assert_eq!(stats.inserted, 1);
    assert_eq!(f.ids(), vec!["root.0", "root.1", "root.2"]);

    // The view that showed "x" now shows the inserted row
    assert!(same_view(f.engine.view_for("root.0").expect("root.0"), &first));
    assert_eq!(text_of(&first), "new");
}

#[test]
fn scrolling_reuses_retired_views() {
    let mut f = fixture();
    let made = f.made.clone();
    f.engine.set_component(rows(&made, 20));
    let first = f.pass();
    assert_eq!(first.inserted, 5);
    assert_eq!(f.host.content_size, Size::new(100.0, 400.0));

    f.host.offset = Point::new(0.0, 100.0);
    let stats = f.pass();
    assert_eq!(stats.removed, 5);
    assert_eq!(stats.inserted, 5);
    assert_eq!(stats.reused, 5);
    assert_eq!(made.get(), 5);
    assert_eq!(f.ids(), vec!["root.5", "root.6", "root.7", "root.8", "root.9"]);

    let top = &f.host.mounted[0];
    assert_eq!(text_of(top), "row 5");
    assert_eq!(reuses_of(top), 1);
    assert_eq!(top.borrow().frame(), Rect::new(0.0, 100.0, 100.0, 20.0));
}

#[test]
fn pooled_views_survive_until_the_ttl() {
    let mut f = fixture();
    let made = f.made.clone();
    f.engine.set_component(rows(&made, 5));
    f.pass();
    f.engine.set_component(Stack::vertical(Vec::new()));
    f.pass();
    assert_eq!(f.engine.pool().borrow().len(), 5);

    f.clock.advance(Duration::from_secs(4));
    f.engine.set_component(rows(&made, 5));
    let stats = f.pass();
    assert_eq!(stats.reused, 5);
    assert_eq!(made.get(), 5);
}

#[test]
fn idle_pool_is_evicted_after_the_ttl() {
    let mut f = fixture();
    let made = f.made.clone();
    f.engine.set_component(rows(&made, 5));
    f.pass();
    let old = f.engine.visible_views();
    f.engine.set_component(Stack::vertical(Vec::new()));
    f.pass();

    f.clock.advance(Duration::from_secs(5));
    f.engine.set_component(rows(&made, 5));
    let stats = f.pass();
    assert_eq!(stats.reused, 0);
    assert_eq!(made.get(), 10);

    let fresh = f.engine.visible_views();
    assert!(!fresh.iter().any(|v| old.iter().any(|o| same_view(v, o))));
    assert!(old.iter().all(|v| !v.borrow().is_attached()));
}

#[test]
fn no_reuse_always_builds_fresh_views() {
    let mut f = fixture();
    let made = f.made.clone();
    let list = || {
        Stack::vertical((0..3).map(|i| row(&made, &i.to_string()).no_reuse()).collect())
    };
    f.engine.set_component(list());
    f.pass();
    let old = f.engine.visible_views();

    f.engine.set_component(Stack::vertical(Vec::new()));
    f.pass();
    assert!(f.engine.pool().borrow().is_empty());
    assert!(old.iter().all(|v| !v.borrow().is_attached()));

    f.engine.set_component(list());
    let stats = f.pass();
    assert_eq!(stats.reused, 0);
    assert_eq!(made.get(), 6);
}

#[test]
fn hide_policy_keeps_retired_views_attached() {
    let config = EngineConfig::default().with_removal_policy(RemovalPolicy::Hide);
    let mut f = fixture_with(config, RecordingAnimator::default());
    let made = f.made.clone();
    f.engine.set_component(rows(&made, 2));
    f.pass();
    let old = f.engine.visible_views();

    f.engine.set_component(Stack::vertical(Vec::new()));
    f.pass();
    assert!(old.iter().all(|v| v.borrow().is_hidden() && v.borrow().is_attached()));

    f.engine.set_component(rows(&made, 1));
    f.pass();
    assert!(!f.host.mounted[0].borrow().is_hidden());
}

#[test]
fn delete_completion_controls_pool_return() {
    let mut f = fixture_with(EngineConfig::default(), RecordingAnimator::holding_deletes());
    let made = f.made.clone();
    f.engine.set_component(rows(&made, 2));
    f.pass();
    let leaving = f.engine.visible_views()[1].clone();
    f.engine.set_component(rows(&made, 1));
    let stats = f.pass();
    assert_eq!(stats.removed, 1);
    assert_eq!(f.engine.pool().borrow().len(), 0);
    // Left out of the mount list but still attached while animating out
    assert!(!f.host.mounted.iter().any(|v| same_view(v, &leaving)));
    assert!(leaving.borrow().is_attached());

    f.animator.finish_deletes();
    assert_eq!(f.engine.pool().borrow().bucket_len("label"), 1);
    assert!(!leaving.borrow().is_attached());
}

#[test]
fn engines_sharing_a_pool_keep_their_own_removal_policy() {
    init_tracing();
    let clock = ManualClock::new();
    let pool = ReusePool::new(Duration::from_secs(5), Rc::new(clock.clone())).into_shared();
    let made = Rc::new(Cell::new(0));

    let mut removing = Engine::new(EngineConfig::default().with_removal_policy(RemovalPolicy::Remove))
        .expect("valid config")
        .with_pool(pool.clone());
    let mut hiding = Engine::new(EngineConfig::default().with_removal_policy(RemovalPolicy::Hide))
        .expect("valid config")
        .with_pool(pool.clone());
    let mut removing_host = RecordingHost::new(100.0, 100.0);
    let mut hiding_host = RecordingHost::new(100.0, 100.0);

    removing.set_component(rows(&made, 1));
    removing.layout_if_needed(&mut removing_host);
    hiding.set_component(rows(&made, 1));
    hiding.layout_if_needed(&mut hiding_host);
    let removed = removing.visible_views()[0].clone();
    let hidden = hiding.visible_views()[0].clone();

    removing.set_component(Stack::vertical(Vec::new()));
    removing.layout_if_needed(&mut removing_host);
    hiding.set_component(Stack::vertical(Vec::new()));
    hiding.layout_if_needed(&mut hiding_host);

    assert!(!removed.borrow().is_attached());
    assert!(!removed.borrow().is_hidden());
    assert!(hidden.borrow().is_attached());
    assert!(hidden.borrow().is_hidden());
    assert_eq!(pool.borrow().len(), 2);
    assert_eq!(pool.borrow().ttl(), Duration::from_secs(5));
}

#[test]
fn requests_are_coalesced() {
    let mut f = fixture();
    let made = f.made.clone();
    f.engine.set_component(rows(&made, 3));
    f.pass();

    let handle = f.engine.handle();
    handle.set_needs_reload();
    handle.set_needs_reload();
    handle.set_needs_render();
    let stats = f.pass();
    assert_eq!(stats.updated, 3);
    assert!(!handle.needs_layout());
    assert_eq!(f.pass(), ReconcileStats::default());
}

#[test]
fn request_during_a_pass_is_deferred() {
    let mut f = fixture();
    let handle = f.engine.handle();
    let asked = Rc::new(Cell::new(false));
    let probe = {
        let asked = asked.clone();
        ViewComponent::new(Label::default)
            .update(move |_| {
                if !asked.get() {
                    asked.set(true);
                    handle.set_needs_render();
                }
            })
            .size(100.0, 20.0)
    };
    f.engine.set_component(probe);

    let first = f.pass();
    assert_eq!(first.inserted, 1);
    assert!(asked.get());
    assert!(f.engine.handle().needs_layout());

    let second = f.pass();
    assert_eq!(second.updated, 1);
    assert!(!f.engine.handle().needs_layout());
}

#[test]
fn offset_adjustment_shifts_carried_views() {
    let mut f = fixture();
    let made = f.made.clone();
    f.engine.set_component(rows(&made, 10));
    f.pass();

    let stats = f
        .engine
        .reload_data(&mut f.host, Some(Point::new(0.0, 20.0)));
    assert_eq!(f.host.offset, Point::new(0.0, 20.0));
    assert_eq!(stats.removed, 1);
    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.updated, 4);
    assert_eq!(stats.shifted, 4);
    assert_eq!(f.animator.count("shift"), 4);
    assert!(f.animator.events.borrow().contains(&"shift 0 20".to_string()));
}

#[test]
fn shift_hook_can_be_disabled() {
    let config = EngineConfig::default().with_animate_size_changes(false);
    let mut f = fixture_with(config, RecordingAnimator::default());
    let made = f.made.clone();
    f.engine.set_component(rows(&made, 10));
    f.pass();

    let stats = f
        .engine
        .reload_data(&mut f.host, Some(Point::new(0.0, 20.0)));
    assert_eq!(stats.shifted, 0);
    assert_eq!(f.animator.count("shift"), 0);
}

#[test]
fn animator_override_applies_to_subtree() {
    let mut f = fixture();
    let made = f.made.clone();
    let special = Rc::new(RecordingAnimator::default());
    f.engine.set_component(Stack::vertical(vec![
        row(&made, "plain"),
        row(&made, "fancy").animator(special.clone()),
    ]));
    f.pass();
    assert_eq!(f.animator.count("insert"), 1);
    assert_eq!(special.count("insert"), 1);

    f.engine.set_component(Stack::vertical(vec![row(&made, "plain")]));
    f.pass();
    assert_eq!(special.count("delete"), 1);
    assert_eq!(f.animator.count("delete"), 0);
}

#[test]
fn visible_frame_inset_prerenders_offscreen_rows() {
    let config = EngineConfig::default()
        .with_visible_frame_inset(trellis_core::EdgeInsets::symmetric(0.0, -20.0));
    let mut f = fixture_with(config, RecordingAnimator::default());
    let made = f.made.clone();
    f.engine.set_component(rows(&made, 20));
    f.host.offset = Point::new(0.0, 100.0);
    f.pass();
    assert_eq!(
        f.ids(),
        vec!["root.4", "root.5", "root.6", "root.7", "root.8", "root.9", "root.10"]
    );
}

#[test]
fn pager_misuse_renders_a_placeholder() {
    let mut f = fixture();
    let made = f.made.clone();
    f.engine
        .set_component(Pager::vertical(vec![row(&made, "page")]));
    let stats = f.pass();
    assert_eq!(stats.inserted, 1);
    assert_eq!(made.get(), 0);
    assert!(f
        .engine
        .diagnostics()
        .any(|d| *d == Diagnostic::UnboundedPager));
}

#[test]
fn colliding_ids_get_distinct_views() {
    let mut f = fixture();
    let made = f.made.clone();
    f.engine.set_component(Stack::vertical(vec![
        row(&made, "one").id("dup"),
        row(&made, "two").id("dup"),
    ]));
    let stats = f.pass();
    assert_eq!(stats.inserted, 2);
    assert_eq!(f.ids(), vec!["dup", "dup#1"]);
    assert_eq!(text_of(f.engine.view_for("dup#1").expect("suffixed")), "two");
    assert!(f.engine.diagnostics().any(|d| matches!(
        d,
        Diagnostic::IdentityCollision { identity, count: 2 } if identity == "dup"
    )));
}

#[test]
fn suffixed_ids_never_overwrite_an_existing_id() {
    let mut f = fixture();
    let made = f.made.clone();
    f.engine.set_component(Stack::vertical(vec![
        row(&made, "one").id("a"),
        row(&made, "two").id("a"),
        row(&made, "three").id("a#1"),
    ]));
    let stats = f.pass();
    assert_eq!(stats.inserted, 3);
    assert_eq!(f.host.mounted.len(), 3);
    assert_eq!(f.engine.visible_views().len(), 3);
    assert_eq!(f.ids(), vec!["a", "a#2", "a#1"]);
    assert_eq!(text_of(f.engine.view_for("a#1").expect("explicit")), "three");
    assert_eq!(text_of(f.engine.view_for("a#2").expect("suffixed")), "two");
}

#[test]
fn mounted_frames_snapshot() {
    let mut f = fixture();
    let made = f.made.clone();
    let mut children = vec![row(&made, "header").id("header")];
    children.extend((0..3).map(|i| row(&made, &i.to_string())));
    f.engine
        .set_component(Stack::vertical(children).with_spacing(4.0));
    f.host.bounds = Size::new(100.0, 60.0);
    f.host.offset = Point::new(0.0, 30.0);
    f.pass();

    let dump = f
        .engine
        .visible_renderables()
        .iter()
        .zip(&f.host.mounted)
        .map(|(r, view)| {
            let frame = view.borrow().frame();
            format!(
                "{} {} {} {} {} {}",
                r.id,
                frame.origin.x,
                frame.origin.y,
                frame.size.width,
                frame.size.height,
                text_of(view)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    insta::assert_snapshot!(dump, @r"
    root.1 0 24 100 20 0
    root.2 0 48 100 20 1
    root.3 0 72 100 20 2
    ");
}

proptest::proptest! {
    #[test]
    fn second_pass_at_rest_is_a_noop(count in 0usize..60, scroll in 0.0f64..1200.0) {
        let mut f = fixture();
        let made = f.made.clone();
        f.engine.set_component(rows(&made, count));
        f.host.offset = Point::new(0.0, scroll);
        f.pass();
        let built = made.get();

        f.engine.set_needs_reload();
        let stats = f.pass();
        proptest::prop_assert!(stats.is_noop());
        proptest::prop_assert_eq!(stats.updated, f.engine.visible_views().len());
        proptest::prop_assert_eq!(made.get(), built);
    }
}
