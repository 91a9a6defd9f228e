//! The contract between the engine and host-native views.
//!
//! Trellis never draws anything itself. A host supplies concrete view objects
//! implementing [`View`]; the engine only positions, hides, detaches, and
//! recycles them. Everything runs on the host's UI thread, so views are shared
//! through `Rc<RefCell<_>>`.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::geometry::{Rect, Size};

/// A host-native view object.
pub trait View: Any {
    /// Current frame in the hosting container's coordinate space.
    fn frame(&self) -> Rect;

    /// Move/resize the view.
    fn set_frame(&mut self, frame: Rect);

    /// Whether the view is currently hidden.
    fn is_hidden(&self) -> bool {
        false
    }

    fn set_hidden(&mut self, _hidden: bool) {}

    /// Remove the view from its container.
    fn detach(&mut self) {}

    /// Whether the view is attached to a container.
    fn is_attached(&self) -> bool {
        true
    }

    /// Drop any in-flight visual transform (scale, translation, alpha ramp).
    fn clear_transform(&mut self) {}

    /// Called when the view leaves the reuse pool.
    fn prepare_for_reuse(&mut self) {}

    /// Natural size for the proposed size. Used for intrinsic measurement.
    fn size_that_fits(&self, _proposal: Size) -> Size {
        self.frame().size
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Shared handle to a live view.
pub type ViewHandle = Rc<RefCell<dyn View>>;

/// Wrap a concrete view into a handle.
pub fn view_handle<V: View>(view: V) -> ViewHandle {
    Rc::new(RefCell::new(view))
}

/// Reference identity of two handles.
pub fn same_view(a: &ViewHandle, b: &ViewHandle) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// Downcast a handle and run `f` on the concrete view.
///
/// Returns `None` when the handle holds a different view type.
pub fn with_view<V: View, R>(handle: &ViewHandle, f: impl FnOnce(&mut V) -> R) -> Option<R> {
    let mut view = handle.borrow_mut();
    view.as_any_mut().downcast_mut::<V>().map(f)
}
