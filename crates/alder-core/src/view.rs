//! The retained scene tree. A `View` is a cheaply clonable handle to one
//! node: geometry resolved through the field registry, an owned ordered
//! child list (insertion order is traversal and hit-test priority), a weak
//! parent back-reference used only for absolute-coordinate composition, and
//! per-kind callback lists that game code subscribes to.
//!
//! Handles are `Send + Sync` so queued event closures can capture them, but
//! structural mutation and field writes are only supported from the single
//! render/update thread. No internal lock is held while user callbacks run;
//! handler and child lists are snapshotted first.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use smallvec::SmallVec;
use web_time::{Duration, Instant};

use crate::fields::{FieldGetter, FieldMap, FieldSetter, FieldSlot, FieldValue};
use crate::graphics::Graphics;
use crate::input::{KeyPress, KeyboardState, TouchState};

pub const X_FIELD: &str = "x";
pub const Y_FIELD: &str = "y";
pub const WIDTH_FIELD: &str = "width";
pub const HEIGHT_FIELD: &str = "height";

/// Two touch-ups on the same view within this window pair into a
/// double-click.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

fn next_handler_id() -> HandlerId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    HandlerId(NEXT.fetch_add(1, Ordering::Relaxed))
}

pub type LoadedHandler = Arc<dyn Fn(&View) + Send + Sync>;
pub type UpdateHandler = Arc<dyn Fn(f32) + Send + Sync>;
pub type DrawHandler = Arc<dyn Fn(&mut dyn Graphics) + Send + Sync>;
pub type TouchHandler = Arc<dyn Fn(&View, &TouchState) + Send + Sync>;
pub type KeyHandler = Arc<dyn Fn(&View, &KeyboardState) + Send + Sync>;
pub type KeyPressHandler = Arc<dyn Fn(&View, &KeyPress) + Send + Sync>;
pub type HitTestFn = Arc<dyn Fn(&View, f32, f32) -> bool + Send + Sync>;

/// Ordered multi-subscriber callback list for one event kind.
struct Slot<H>(Mutex<SmallVec<[(HandlerId, H); 2]>>);

impl<H: Clone> Slot<H> {
    fn new() -> Self {
        Slot(Mutex::new(SmallVec::new()))
    }

    fn add(&self, handler: H) -> HandlerId {
        let id = next_handler_id();
        self.0.lock().push((id, handler));
        id
    }

    fn remove(&self, id: HandlerId) -> bool {
        let mut entries = self.0.lock();
        let before = entries.len();
        entries.retain(|(hid, _)| *hid != id);
        entries.len() != before
    }

    /// Registration-order copy of the handlers, taken so no lock is held
    /// while they run.
    fn snapshot(&self) -> SmallVec<[H; 2]> {
        self.0.lock().iter().map(|(_, h)| h.clone()).collect()
    }
}

struct ViewInner {
    id: Mutex<String>,
    fields: Mutex<FieldMap>,
    parent: Mutex<Weak<ViewInner>>,
    children: Mutex<Vec<View>>,
    visible: AtomicBool,
    focusable: AtomicBool,
    focused: AtomicBool,
    cursor_over: AtomicBool,
    last_up: Mutex<Option<Instant>>,
    hit_test: Mutex<HitTestFn>,

    loaded: Slot<LoadedHandler>,
    update: Slot<UpdateHandler>,
    draw: Slot<DrawHandler>,
    touch_down: Slot<TouchHandler>,
    touch_move: Slot<TouchHandler>,
    touch_up: Slot<TouchHandler>,
    touch_enter: Slot<TouchHandler>,
    touch_leave: Slot<TouchHandler>,
    click: Slot<TouchHandler>,
    double_click: Slot<TouchHandler>,
    key_down: Slot<KeyHandler>,
    key_up: Slot<KeyHandler>,
    key_press: Slot<KeyPressHandler>,
}

#[derive(Clone)]
pub struct View {
    inner: Arc<ViewInner>,
}

fn default_hit_test(view: &View, x: f32, y: f32) -> bool {
    let vx = view.x();
    let vy = view.y();
    x >= vx && x <= vx + view.width() && y >= vy && y <= vy + view.height()
}

impl View {
    pub fn new() -> Self {
        static NEXT_VIEW: AtomicU64 = AtomicU64::new(1);
        let id = format!("view-{}", NEXT_VIEW.fetch_add(1, Ordering::Relaxed));

        let mut fields = FieldMap::default();
        fields.register(X_FIELD, FieldValue::Float(0.0));
        fields.register(Y_FIELD, FieldValue::Float(0.0));
        fields.register(WIDTH_FIELD, FieldValue::Float(0.0));
        fields.register(HEIGHT_FIELD, FieldValue::Float(0.0));

        View {
            inner: Arc::new(ViewInner {
                id: Mutex::new(id),
                fields: Mutex::new(fields),
                parent: Mutex::new(Weak::new()),
                children: Mutex::new(Vec::new()),
                visible: AtomicBool::new(true),
                focusable: AtomicBool::new(false),
                focused: AtomicBool::new(false),
                cursor_over: AtomicBool::new(false),
                last_up: Mutex::new(None),
                hit_test: Mutex::new(Arc::new(default_hit_test) as HitTestFn),
                loaded: Slot::new(),
                update: Slot::new(),
                draw: Slot::new(),
                touch_down: Slot::new(),
                touch_move: Slot::new(),
                touch_up: Slot::new(),
                touch_enter: Slot::new(),
                touch_leave: Slot::new(),
                click: Slot::new(),
                double_click: Slot::new(),
                key_down: Slot::new(),
                key_up: Slot::new(),
                key_press: Slot::new(),
            }),
        }
    }

    // --- identity ---

    pub fn id(&self) -> String {
        self.inner.id.lock().clone()
    }

    pub fn set_id(&self, id: &str) {
        *self.inner.id.lock() = id.to_string();
    }

    pub fn same(&self, other: &View) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // --- field registry ---

    pub fn register_field(&self, key: &str, value: impl Into<FieldValue>) {
        self.inner.fields.lock().register(key, value.into());
    }

    pub fn register_field_ref(&self, key: &str, get: FieldGetter, set: Option<FieldSetter>) {
        self.inner.fields.lock().register_ref(key, get, set);
    }

    /// Stored fields return their value, indirections call the getter each
    /// time, unregistered keys return [`FieldValue::Empty`].
    pub fn get_field(&self, key: &str) -> FieldValue {
        let getter = {
            let fields = self.inner.fields.lock();
            match fields.slot(key) {
                Some(FieldSlot::Stored(v)) => return v.clone(),
                Some(FieldSlot::Indirect { get, .. }) => get.clone(),
                None => return FieldValue::Empty,
            }
        };
        // Called outside the lock so a getter may read other views.
        getter()
    }

    pub fn set_field(&self, key: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        let setter = {
            let mut fields = self.inner.fields.lock();
            match fields.slot_mut(key) {
                Some(FieldSlot::Stored(v)) => {
                    *v = value;
                    return;
                }
                Some(FieldSlot::Indirect { set, .. }) => set.clone(),
                None => return,
            }
        };
        setter(value)
    }

    // --- geometry ---

    /// Absolute X: the local field composed with the parent chain.
    pub fn x(&self) -> f32 {
        self.get_field(X_FIELD).as_f32() + self.parent().map(|p| p.x()).unwrap_or(0.0)
    }

    pub fn y(&self) -> f32 {
        self.get_field(Y_FIELD).as_f32() + self.parent().map(|p| p.y()).unwrap_or(0.0)
    }

    pub fn width(&self) -> f32 {
        self.get_field(WIDTH_FIELD).as_f32()
    }

    pub fn height(&self) -> f32 {
        self.get_field(HEIGHT_FIELD).as_f32()
    }

    pub fn set_x(&self, x: f32) {
        self.set_field(X_FIELD, x);
    }

    pub fn set_y(&self, y: f32) {
        self.set_field(Y_FIELD, y);
    }

    pub fn set_position(&self, x: f32, y: f32) {
        self.set_x(x);
        self.set_y(y);
    }

    pub fn set_width(&self, width: f32) {
        self.set_field(WIDTH_FIELD, width);
    }

    pub fn set_height(&self, height: f32) {
        self.set_field(HEIGHT_FIELD, height);
    }

    pub fn set_size(&self, width: f32, height: f32) {
        self.set_width(width);
        self.set_height(height);
    }

    // --- flags ---

    pub fn visible(&self) -> bool {
        self.inner.visible.load(Ordering::Relaxed)
    }

    pub fn set_visible(&self, visible: bool) {
        self.inner.visible.store(visible, Ordering::Relaxed);
    }

    pub fn focusable(&self) -> bool {
        self.inner.focusable.load(Ordering::Relaxed)
    }

    pub fn set_focusable(&self, focusable: bool) {
        self.inner.focusable.store(focusable, Ordering::Relaxed);
    }

    /// Not consulted by dispatch yet; reserved for focus routing.
    pub fn focused(&self) -> bool {
        self.inner.focused.load(Ordering::Relaxed)
    }

    pub fn set_focused(&self, focused: bool) {
        self.inner.focused.store(focused, Ordering::Relaxed);
    }

    // --- tree ---

    pub fn parent(&self) -> Option<View> {
        self.inner.parent.lock().upgrade().map(|inner| View { inner })
    }

    /// Appends `child` (never detaches it from an old parent), then fires
    /// its loaded callbacks. Insertion order decides traversal and hit-test
    /// priority. Cycles are refused.
    pub fn add_view(&self, child: &View) {
        if child.same(self) || self.is_descendant_of(child) {
            log::warn!("add_view: refusing cycle, {} would become its own ancestor", child.id());
            return;
        }
        *child.inner.parent.lock() = Arc::downgrade(&self.inner);
        self.inner.children.lock().push(child.clone());
        child.initialize();
    }

    pub fn clear_views(&self) {
        self.inner.children.lock().clear();
    }

    pub fn children(&self) -> Vec<View> {
        self.inner.children.lock().clone()
    }

    pub fn child_by_id(&self, id: &str) -> Option<View> {
        self.inner
            .children
            .lock()
            .iter()
            .find(|c| *c.inner.id.lock() == id)
            .cloned()
    }

    fn is_descendant_of(&self, candidate: &View) -> bool {
        let mut current = self.parent();
        while let Some(view) = current {
            if view.same(candidate) {
                return true;
            }
            current = view.parent();
        }
        false
    }

    fn initialize(&self) {
        for handler in self.inner.loaded.snapshot() {
            handler(self);
        }
    }

    // --- subscriptions ---

    pub fn on_loaded(&self, f: impl Fn(&View) + Send + Sync + 'static) -> HandlerId {
        self.inner.loaded.add(Arc::new(f))
    }

    pub fn on_update(&self, f: impl Fn(f32) + Send + Sync + 'static) -> HandlerId {
        self.inner.update.add(Arc::new(f))
    }

    pub fn on_draw(&self, f: impl Fn(&mut dyn Graphics) + Send + Sync + 'static) -> HandlerId {
        self.inner.draw.add(Arc::new(f))
    }

    pub fn on_touch_down(&self, f: impl Fn(&View, &TouchState) + Send + Sync + 'static) -> HandlerId {
        self.inner.touch_down.add(Arc::new(f))
    }

    pub fn on_touch_move(&self, f: impl Fn(&View, &TouchState) + Send + Sync + 'static) -> HandlerId {
        self.inner.touch_move.add(Arc::new(f))
    }

    pub fn on_touch_up(&self, f: impl Fn(&View, &TouchState) + Send + Sync + 'static) -> HandlerId {
        self.inner.touch_up.add(Arc::new(f))
    }

    pub fn on_touch_enter(&self, f: impl Fn(&View, &TouchState) + Send + Sync + 'static) -> HandlerId {
        self.inner.touch_enter.add(Arc::new(f))
    }

    pub fn on_touch_leave(&self, f: impl Fn(&View, &TouchState) + Send + Sync + 'static) -> HandlerId {
        self.inner.touch_leave.add(Arc::new(f))
    }

    pub fn on_click(&self, f: impl Fn(&View, &TouchState) + Send + Sync + 'static) -> HandlerId {
        self.inner.click.add(Arc::new(f))
    }

    pub fn on_double_click(&self, f: impl Fn(&View, &TouchState) + Send + Sync + 'static) -> HandlerId {
        self.inner.double_click.add(Arc::new(f))
    }

    pub fn on_key_down(&self, f: impl Fn(&View, &KeyboardState) + Send + Sync + 'static) -> HandlerId {
        self.inner.key_down.add(Arc::new(f))
    }

    pub fn on_key_up(&self, f: impl Fn(&View, &KeyboardState) + Send + Sync + 'static) -> HandlerId {
        self.inner.key_up.add(Arc::new(f))
    }

    pub fn on_key_press(&self, f: impl Fn(&View, &KeyPress) + Send + Sync + 'static) -> HandlerId {
        self.inner.key_press.add(Arc::new(f))
    }

    /// Removes a handler by the id its `on_*` registration returned,
    /// whichever kind it belongs to.
    pub fn remove_handler(&self, id: HandlerId) -> bool {
        let i = &self.inner;
        i.loaded.remove(id)
            || i.update.remove(id)
            || i.draw.remove(id)
            || i.touch_down.remove(id)
            || i.touch_move.remove(id)
            || i.touch_up.remove(id)
            || i.touch_enter.remove(id)
            || i.touch_leave.remove(id)
            || i.click.remove(id)
            || i.double_click.remove(id)
            || i.key_down.remove(id)
            || i.key_up.remove(id)
            || i.key_press.remove(id)
    }

    // --- hit testing ---

    /// Replaces the containment predicate. The default is axis-aligned
    /// rectangle containment over the absolute x/y/width/height fields.
    pub fn set_hit_test(&self, f: impl Fn(&View, f32, f32) -> bool + Send + Sync + 'static) {
        *self.inner.hit_test.lock() = Arc::new(f);
    }

    pub fn hit_test(&self, x: f32, y: f32) -> bool {
        let test = self.inner.hit_test.lock().clone();
        test(self, x, y)
    }

    // --- traversal ---

    /// Pre-order: this view's update callbacks fire before its children's.
    /// An invisible view prunes its whole subtree.
    pub fn invoke_update(&self, dt: f32) {
        if !self.visible() {
            return;
        }
        for handler in self.inner.update.snapshot() {
            handler(dt);
        }
        for child in self.children() {
            child.invoke_update(dt);
        }
    }

    /// Pre-order, so draw order is back-to-front by insertion order.
    pub fn invoke_draw(&self, g: &mut dyn Graphics) {
        if !self.visible() {
            return;
        }
        for handler in self.inner.draw.snapshot() {
            handler(g);
        }
        for child in self.children() {
            child.invoke_draw(g);
        }
    }

    // --- touch dispatch ---

    /// Returns whether this subtree handled the event: some child handled
    /// it, or this view is a leaf whose bounds contain the point, or a
    /// callback stopped propagation. Leaves inside bounds always report
    /// handled, even with no callbacks; ancestors rely on this to stop
    /// propagation at known hit regions.
    pub fn invoke_touch_down(&self, state: &TouchState) -> bool {
        if !self.visible() {
            return false;
        }
        let hop = state.next_target();
        let p = hop.position();
        if !self.hit_test(p.x, p.y) {
            return false;
        }

        let children = self.children();
        let mut child_handled = false;
        for child in children.iter().filter(|c| c.visible()) {
            if child.invoke_touch_down(&hop) {
                child_handled = true;
                break;
            }
        }

        if !child_handled {
            for handler in self.inner.touch_down.snapshot() {
                handler(self, &hop);
            }
        }

        child_handled || children.is_empty() || hop.is_stop_propagation()
    }

    /// Like touch-down, plus enter/leave bookkeeping: crossing into the
    /// bounds fires enter once, crossing out fires leave once.
    pub fn invoke_touch_move(&self, state: &TouchState) -> bool {
        if !self.visible() {
            return false;
        }
        let hop = state.next_target();
        let p = hop.position();

        if !self.hit_test(p.x, p.y) {
            if self.inner.cursor_over.swap(false, Ordering::Relaxed) {
                for handler in self.inner.touch_leave.snapshot() {
                    handler(self, &hop);
                }
            }
            return false;
        }

        if !self.inner.cursor_over.swap(true, Ordering::Relaxed) {
            for handler in self.inner.touch_enter.snapshot() {
                handler(self, &hop);
            }
        }

        let children = self.children();
        let mut child_handled = false;
        for child in children.iter().filter(|c| c.visible()) {
            if child.invoke_touch_move(&hop) {
                child_handled = true;
                break;
            }
        }

        if !child_handled {
            for handler in self.inner.touch_move.snapshot() {
                handler(self, &hop);
            }
        }

        child_handled || children.is_empty() || hop.is_stop_propagation()
    }

    /// Touch-up additionally fires click, and a double-click when this up
    /// lands within [`DOUBLE_CLICK_WINDOW`] of the previous one. Pairing
    /// clears the stamp, so a third rapid up starts a new pair instead of
    /// chaining.
    pub fn invoke_touch_up(&self, state: &TouchState) -> bool {
        if !self.visible() {
            return false;
        }
        let hop = state.next_target();
        let p = hop.position();
        if !self.hit_test(p.x, p.y) {
            return false;
        }

        let children = self.children();
        let mut child_handled = false;
        for child in children.iter().filter(|c| c.visible()) {
            if child.invoke_touch_up(&hop) {
                child_handled = true;
                break;
            }
        }

        if !child_handled {
            for handler in self.inner.touch_up.snapshot() {
                handler(self, &hop);
            }
            for handler in self.inner.click.snapshot() {
                handler(self, &hop);
            }

            let now = Instant::now();
            let paired = {
                let mut last_up = self.inner.last_up.lock();
                let paired = matches!(*last_up, Some(t) if now.duration_since(t) <= DOUBLE_CLICK_WINDOW);
                *last_up = if paired { None } else { Some(now) };
                paired
            };
            if paired {
                for handler in self.inner.double_click.snapshot() {
                    handler(self, &hop);
                }
            }
        }

        child_handled || children.is_empty() || hop.is_stop_propagation()
    }

    // --- keyboard dispatch ---

    /// Fires only on this view; keyboard down/up are not routed through the
    /// tree.
    pub fn invoke_key_down(&self, state: &KeyboardState) {
        for handler in self.inner.key_down.snapshot() {
            handler(self, state);
        }
    }

    pub fn invoke_key_up(&self, state: &KeyboardState) {
        for handler in self.inner.key_up.snapshot() {
            handler(self, state);
        }
    }

    /// Fires on this view and then every descendant, visible or not.
    pub fn invoke_key_press(&self, press: &KeyPress) {
        for handler in self.inner.key_press.snapshot() {
            handler(self, press);
        }
        for child in self.children() {
            child.invoke_key_press(press);
        }
    }
}

impl Default for View {
    fn default() -> Self {
        View::new()
    }
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("id", &*self.inner.id.lock())
            .field("visible", &self.visible())
            .field("children", &self.inner.children.lock().len())
            .finish()
    }
}
