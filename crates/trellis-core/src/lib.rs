//! Core types shared by every Trellis crate.
//!
//! This crate provides the vocabulary the layout and render crates agree on:
//! - Geometry (`Size`, `Point`, `Rect`, `EdgeInsets`, `Axis`)
//! - `Constraint`, the min/max box passed down a layout pass
//! - The `View` contract implemented by host-native views
//! - The `Animator` contract invoked at view lifecycle points
//! - Error, diagnostic, and configuration types

pub mod animator;
pub mod config;
pub mod constraint;
pub mod errors;
pub mod geometry;
pub mod view;

pub use animator::*;
pub use config::*;
pub use constraint::*;
pub use errors::*;
pub use geometry::*;
pub use view::*;
