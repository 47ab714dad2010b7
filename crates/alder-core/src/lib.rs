//! # Alder engine core
//!
//! A small retained-mode 2D game-engine core: a mutable view tree with
//! dynamic attribute binding, a thread-safe input event pipeline, and a
//! per-frame update/draw loop, hosted by a platform shell and consumed by
//! game code through callback subscriptions.
//!
//! The three main pieces:
//!
//! - [`View`] — a node in the scene tree: geometry, visibility, hit testing,
//!   and per-kind callback lists (`on_click`, `on_update`, `on_draw`, ...).
//!
//! ```rust
//! use alder_core::prelude::*;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let button = View::new();
//! button.set_size(120.0, 80.0);
//!
//! let clicks = Arc::new(AtomicUsize::new(0));
//! let n = clicks.clone();
//! button.on_click(move |_, _| {
//!     n.fetch_add(1, Ordering::Relaxed);
//! });
//!
//! // A leaf whose bounds contain the point always reports handled.
//! assert!(button.invoke_touch_up(&TouchState::at(10.0, 10.0)));
//! assert_eq!(clicks.load(Ordering::Relaxed), 1);
//! ```
//!
//! - [`EventQueue`] / [`EventResolver`] — input callbacks from the shell are
//!   enqueued from any thread and reconciled at the frame boundary into one
//!   time-ordered execution sequence.
//!
//! - [`ScreenService`] — owns the active [`Screen`] (a root view whose size
//!   tracks the live surface), the frame clock, and the resolver; the shell
//!   calls `update`/`draw` once per frame and forwards translated input
//!   through the `invoke_*` entry points, which never dispatch
//!   synchronously.
//!
//! Rendering, physics, and the platform shells themselves are collaborators
//! behind the [`Graphics`] and [`AppContext`] seams, not part of this crate.

pub mod clock;
pub mod color;
pub mod error;
pub mod fields;
pub mod geometry;
pub mod graphics;
pub mod input;
pub mod prelude;
pub mod queue;
pub mod resolver;
pub mod runtime;
pub mod screen;
pub mod tests;
pub mod timer;
pub mod view;

pub use clock::*;
pub use color::*;
pub use error::*;
pub use fields::{FieldGetter, FieldSetter, FieldValue};
pub use geometry::*;
pub use graphics::*;
pub use input::*;
pub use queue::*;
pub use resolver::*;
pub use runtime::*;
pub use screen::*;
pub use timer::*;
pub use view::*;
