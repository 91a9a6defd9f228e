//! The contract between the engine and the container hosting its views.

use trellis_core::{Constraint, Point, Size, ViewHandle};

/// A scrollable container that owns the live views.
///
/// The host calls [`Engine::layout_if_needed`](crate::Engine::layout_if_needed)
/// once per layout opportunity; the engine reads the viewport from it and
/// writes back the content size and the ordered view list.
pub trait Host {
    /// Size of the visible area.
    fn bounds(&self) -> Size;

    /// Top-left corner of the visible area in content coordinates.
    fn content_offset(&self) -> Point;

    fn set_content_offset(&mut self, offset: Point);

    /// Called when the root's laid-out size changes.
    fn set_content_size(&mut self, size: Size);

    /// Constraint for the root node: the host width, unbounded height.
    fn constraint(&self) -> Constraint {
        Constraint::loose(Size::new(self.bounds().width, f64::INFINITY))
    }

    /// Attach `views` in order; later views draw on top.
    ///
    /// Views whose delete animation is still running are not in `views` but
    /// must stay attached. The engine detaches or hides every retired view
    /// itself once its completion runs, so a host should only add and
    /// reorder here, never remove views missing from the list.
    fn mount(&mut self, views: &[ViewHandle]);
}
