//! Box constraints passed down a layout pass.
//!
//! A constraint is an immutable min/max box. Each axis is independently
//! bounded (finite max) or unbounded (`f64::INFINITY` max). Producers always go
//! through [`Constraint::new`], which normalizes the box so that
//! `0 <= min <= max` holds on both axes.

use crate::geometry::{Axis, EdgeInsets, Size};

/// Min/max size box handed to `layout`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub min: Size,
    pub max: Size,
}

impl Default for Constraint {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl Constraint {
    /// Create a normalized constraint.
    ///
    /// Negative, infinite, or NaN minimums become 0; a NaN max becomes
    /// unbounded; a max below its min is raised to the min.
    pub fn new(min: Size, max: Size) -> Self {
        let min_w = normalize_min(min.width);
        let min_h = normalize_min(min.height);
        Self {
            min: Size::new(min_w, min_h),
            max: Size::new(normalize_max(max.width, min_w), normalize_max(max.height, min_h)),
        }
    }

    /// Exact size required.
    pub fn tight(size: Size) -> Self {
        Self::new(size, size)
    }

    /// Anything between zero and `max`.
    pub fn loose(max: Size) -> Self {
        Self::new(Size::ZERO, max)
    }

    /// No bounds on either axis.
    pub fn unbounded() -> Self {
        Self {
            min: Size::ZERO,
            max: Size::INFINITY,
        }
    }

    /// Whether `min == max` on both axes.
    pub fn is_tight(&self) -> bool {
        self.min == self.max
    }

    /// Whether `axis` has a finite maximum.
    pub fn is_bounded(&self, axis: Axis) -> bool {
        self.max.along(axis).is_finite()
    }

    /// Clamp `size` into this box.
    ///
    /// NaN extents resolve to the minimum.
    pub fn clamp(&self, size: Size) -> Size {
        Size::new(
            clamp_axis(size.width, self.min.width, self.max.width),
            clamp_axis(size.height, self.min.height, self.max.height),
        )
    }

    /// Whether `size` already satisfies this box (with a small tolerance).
    pub fn contains(&self, size: Size) -> bool {
        const EPS: f64 = 0.0001;
        size.width >= self.min.width - EPS
            && size.width <= self.max.width + EPS
            && size.height >= self.min.height - EPS
            && size.height <= self.max.height + EPS
    }

    /// Subtract `insets` from both min and max.
    pub fn inset(&self, insets: EdgeInsets) -> Self {
        Self::new(
            Size::new(
                self.min.width - insets.horizontal(),
                self.min.height - insets.vertical(),
            ),
            Size::new(
                (self.max.width - insets.horizontal()).max(0.0),
                (self.max.height - insets.vertical()).max(0.0),
            ),
        )
    }

    /// Keep the max, drop the min.
    pub fn loosened(&self) -> Self {
        Self::new(Size::ZERO, self.max)
    }

    /// Minimum along `axis`.
    pub fn min_along(&self, axis: Axis) -> f64 {
        self.min.along(axis)
    }

    /// Maximum along `axis`.
    pub fn max_along(&self, axis: Axis) -> f64 {
        self.max.along(axis)
    }

    /// Same box with the maximum along `axis` replaced.
    pub fn with_max_along(&self, axis: Axis, value: f64) -> Self {
        let mut max = self.max;
        match axis {
            Axis::Horizontal => max.width = value,
            Axis::Vertical => max.height = value,
        }
        Self::new(self.min, max)
    }

    /// Same box with the minimum along `axis` replaced.
    pub fn with_min_along(&self, axis: Axis, value: f64) -> Self {
        let mut min = self.min;
        match axis {
            Axis::Horizontal => min.width = value,
            Axis::Vertical => min.height = value,
        }
        Self::new(min, self.max)
    }

    /// Tight along `axis`, unchanged on the other.
    pub fn tight_along(&self, axis: Axis, value: f64) -> Self {
        self.with_min_along(axis, value).with_max_along(axis, value)
    }
}

fn normalize_min(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn normalize_max(value: f64, min: f64) -> f64 {
    if value.is_nan() {
        f64::INFINITY
    } else {
        value.max(min)
    }
}

fn clamp_axis(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}
