//! Pluggable view transitions.
//!
//! The engine calls an [`Animator`] at each lifecycle point of a live view and
//! never touches animation mechanics itself. Curve implementations live in
//! host code; this crate only ships [`Immediate`], which applies every change
//! without animating.

use crate::geometry::{Point, Rect};
use crate::view::ViewHandle;

/// Invoked once the delete transition has finished.
pub type Completion = Box<dyn FnOnce()>;

/// Strategy object invoked at insert/update/shift/delete.
pub trait Animator {
    /// A view appears for a renderable that was not visible last pass.
    fn insert(&self, view: &ViewHandle, frame: Rect) {
        view.borrow_mut().set_frame(frame);
    }

    /// A carried-forward view receives its new frame.
    fn update(&self, view: &ViewHandle, frame: Rect) {
        view.borrow_mut().set_frame(frame);
    }

    /// The content offset moved by `delta` during this pass (e.g. an anchored
    /// reload). Called after `update` for carried-forward views.
    fn shift(&self, view: &ViewHandle, _delta: Point, frame: Rect) {
        view.borrow_mut().set_frame(frame);
    }

    /// A view's renderable is gone. `completion` must be called exactly once,
    /// after which the view is returned to the reuse pool.
    fn delete(&self, _view: &ViewHandle, completion: Completion) {
        completion();
    }
}

/// Applies every transition instantly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl Animator for Immediate {}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::view::{view_handle, View};

    #[derive(Default)]
    struct Probe {
        frame: Rect,
    }

    impl View for Probe {
        fn frame(&self) -> Rect {
            self.frame
        }

        fn set_frame(&mut self, frame: Rect) {
            self.frame = frame;
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_immediate_sets_frames() {
        let view = view_handle(Probe::default());
        let frame = Rect::new(1.0, 2.0, 3.0, 4.0);
        Immediate.insert(&view, frame);
        assert_eq!(view.borrow().frame(), frame);

        let moved = Rect::new(5.0, 2.0, 3.0, 4.0);
        Immediate.shift(&view, Point::new(4.0, 0.0), moved);
        assert_eq!(view.borrow().frame(), moved);
    }

    #[test]
    fn test_immediate_delete_completes() {
        let view = view_handle(Probe::default());
        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        Immediate.delete(&view, Box::new(move || flag.set(true)));
        assert!(done.get());
    }
}
