//! Screens: root views whose dimensions track the live rendering surface.

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::fields::{FieldGetter, FieldValue};
use crate::geometry::Size;
use crate::view::{HEIGHT_FIELD, View, WIDTH_FIELD};

/// What the hosting shell exposes to a bound screen. Today that is just the
/// reported surface size; file system and the like stay on the shell side.
pub trait AppContext: Send + Sync {
    fn surface_size(&self) -> Size;
}

/// The application-side half of a screen: builds the view hierarchy and
/// wires callbacks when the screen is bound to a live context.
pub trait ScreenController: Send + Sync + 'static {
    /// Runs exactly once, after width/height are live.
    fn start(&self, screen: &Screen);
}

/// A root view whose width/height fields are indirections reading the bound
/// context's surface size (0 until bound). Derefs to its [`View`].
#[derive(Clone)]
pub struct Screen {
    view: View,
    controller: Arc<dyn ScreenController>,
    ctx: Arc<Mutex<Option<Arc<dyn AppContext>>>>,
}

impl Screen {
    pub fn new(controller: Arc<dyn ScreenController>) -> Self {
        let view = View::new();
        let ctx: Arc<Mutex<Option<Arc<dyn AppContext>>>> = Arc::new(Mutex::new(None));

        let get_width: FieldGetter = {
            let ctx = ctx.clone();
            Arc::new(move || {
                FieldValue::Float(
                    ctx.lock()
                        .as_ref()
                        .map(|c| c.surface_size().width)
                        .unwrap_or(0.0),
                )
            })
        };
        let get_height: FieldGetter = {
            let ctx = ctx.clone();
            Arc::new(move || {
                FieldValue::Float(
                    ctx.lock()
                        .as_ref()
                        .map(|c| c.surface_size().height)
                        .unwrap_or(0.0),
                )
            })
        };
        // Writes to a screen's size are discarded; the surface decides.
        view.register_field_ref(WIDTH_FIELD, get_width, None);
        view.register_field_ref(HEIGHT_FIELD, get_height, None);

        Screen {
            view,
            controller,
            ctx,
        }
    }

    /// Binds the live context and runs the controller's `start`. Called once
    /// per instance, by `ScreenService::set_screen`.
    pub(crate) fn bind(&self, ctx: Arc<dyn AppContext>) {
        *self.ctx.lock() = Some(ctx);
        self.controller.start(self);
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn context(&self) -> Option<Arc<dyn AppContext>> {
        self.ctx.lock().clone()
    }
}

impl Deref for Screen {
    type Target = View;

    fn deref(&self) -> &View {
        &self.view
    }
}
