pub use crate::clock::FrameClock;
pub use crate::color::Color;
pub use crate::error::ScreenError;
pub use crate::fields::{FieldGetter, FieldSetter, FieldValue};
pub use crate::geometry::{Rect, Size, Vec2};
pub use crate::graphics::{Graphics, Paint, PaintStyle, TextAlign};
pub use crate::input::{KeyCode, KeyPress, KeyboardState, Keys, TouchState};
pub use crate::queue::{EventAction, EventItem, EventQueue, MAX_PENDING};
pub use crate::resolver::EventResolver;
pub use crate::runtime::{CLEAR_COLOR, ScreenService};
pub use crate::screen::{AppContext, Screen, ScreenController};
pub use crate::timer::Timer;
pub use crate::view::{
    DOUBLE_CLICK_WINDOW, HEIGHT_FIELD, HandlerId, View, WIDTH_FIELD, X_FIELD, Y_FIELD,
};
