//! `ScreenService` drives the whole core: it owns the active screen, the
//! frame clock, and the event resolver, and is the shell's entire surface.
//! The six `invoke_*` input entry points only enqueue — dispatch happens on
//! the frame thread inside `update`, which decouples the shell's input
//! callback threads from the render loop.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::clock::FrameClock;
use crate::color::Color;
use crate::error::ScreenError;
use crate::graphics::{Graphics, Paint};
use crate::input::{KeyPress, KeyboardState, TouchState};
use crate::resolver::EventResolver;
use crate::screen::{AppContext, Screen, ScreenController};

pub const CLEAR_COLOR: Color = Color::from_rgb(3, 14, 27);

type ScreenFactory = Arc<dyn Fn() -> Arc<dyn ScreenController> + Send + Sync>;

#[derive(Clone)]
pub struct ScreenService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    ctx: Arc<dyn AppContext>,
    resolver: EventResolver,
    clock: Mutex<FrameClock>,
    screen: Mutex<Option<Screen>>,
    factories: Mutex<HashMap<TypeId, ScreenFactory>>,
    show_stats: AtomicBool,
}

impl ScreenService {
    pub fn new(ctx: Arc<dyn AppContext>) -> Self {
        ScreenService {
            inner: Arc::new(ServiceInner {
                ctx,
                resolver: EventResolver::new(),
                clock: Mutex::new(FrameClock::new()),
                screen: Mutex::new(None),
                factories: Mutex::new(HashMap::new()),
                show_stats: AtomicBool::new(false),
            }),
        }
    }

    /// Registers the factory `set_screen::<C>()` resolves. Registering the
    /// same type again replaces the factory.
    pub fn register_screen<C, F>(&self, factory: F)
    where
        C: ScreenController,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let factory: ScreenFactory = Arc::new(move || Arc::new(factory()) as Arc<dyn ScreenController>);
        self.inner.factories.lock().insert(TypeId::of::<C>(), factory);
    }

    /// Builds a fresh screen for `C`, discards the previous one with no
    /// teardown, binds the new one to the live context, and runs its
    /// `start` once.
    ///
    /// Events already queued keep targeting the screen they captured at
    /// enqueue time; see the module docs on `invoke_*`.
    pub fn set_screen<C: ScreenController>(&self) -> Result<(), ScreenError> {
        let name = std::any::type_name::<C>();
        let factory = {
            let factories = self.inner.factories.lock();
            match factories.get(&TypeId::of::<C>()) {
                Some(f) => f.clone(),
                None => {
                    log::warn!("set_screen: `{name}` was never registered");
                    return Err(ScreenError::NotRegistered(name));
                }
            }
        };

        let screen = Screen::new(factory());
        *self.inner.screen.lock() = Some(screen.clone());
        screen.bind(self.inner.ctx.clone());
        log::debug!("set_screen: `{name}` active");
        Ok(())
    }

    pub fn active_screen(&self) -> Option<Screen> {
        self.inner.screen.lock().clone()
    }

    /// One frame: advance the clock, execute everything the resolver has
    /// queued, then run the active screen's update traversal with the
    /// elapsed seconds. No-op while no screen is set.
    pub fn update(&self) {
        if self.inner.screen.lock().is_none() {
            return;
        }
        let dt = self.inner.clock.lock().tick();
        self.inner.resolver.invoke();

        // A queued callback may have swapped the screen; update the current one.
        let screen = self.active_screen();
        if let Some(screen) = screen {
            screen.view().invoke_update(dt);
        }
    }

    /// Clears to the fixed background color and runs the draw traversal.
    /// No-op while no screen is set.
    pub fn draw(&self, g: &mut dyn Graphics) {
        let Some(screen) = self.active_screen() else {
            return;
        };
        g.clear(CLEAR_COLOR);
        screen.view().invoke_draw(g);

        if self.inner.show_stats.load(Ordering::Relaxed) {
            let text = format!("{} fps", self.inner.clock.lock().fps());
            g.draw_text(&text, 8.0, 16.0, &Paint::fill(Color::WHITE));
        }
    }

    pub fn set_stats_visible(&self, visible: bool) {
        self.inner.show_stats.store(visible, Ordering::Relaxed);
    }

    pub fn fps(&self) -> u32 {
        self.inner.clock.lock().fps()
    }

    // Input entry points. Each captures the screen active *now*, so events
    // still run against it even if the screen is swapped before the next
    // frame drains the queue.

    pub fn invoke_touch_down(&self, state: TouchState) {
        let screen = self.active_screen();
        self.inner.resolver.add_touch_down(
            state,
            Arc::new(move |s: &TouchState| {
                if let Some(screen) = &screen {
                    screen.view().invoke_touch_down(s);
                }
            }),
        );
    }

    pub fn invoke_touch_move(&self, state: TouchState) {
        let screen = self.active_screen();
        self.inner.resolver.add_touch_move(
            state,
            Arc::new(move |s: &TouchState| {
                if let Some(screen) = &screen {
                    screen.view().invoke_touch_move(s);
                }
            }),
        );
    }

    pub fn invoke_touch_up(&self, state: TouchState) {
        let screen = self.active_screen();
        self.inner.resolver.add_touch_up(
            state,
            Arc::new(move |s: &TouchState| {
                if let Some(screen) = &screen {
                    screen.view().invoke_touch_up(s);
                }
            }),
        );
    }

    pub fn invoke_key_down(&self, state: KeyboardState) {
        let screen = self.active_screen();
        self.inner.resolver.add_key_down(
            state,
            Arc::new(move |s: &KeyboardState| {
                if let Some(screen) = &screen {
                    screen.view().invoke_key_down(s);
                }
            }),
        );
    }

    pub fn invoke_key_up(&self, state: KeyboardState) {
        let screen = self.active_screen();
        self.inner.resolver.add_key_up(
            state,
            Arc::new(move |s: &KeyboardState| {
                if let Some(screen) = &screen {
                    screen.view().invoke_key_up(s);
                }
            }),
        );
    }

    pub fn invoke_key_press(&self, press: KeyPress) {
        let screen = self.active_screen();
        self.inner.resolver.add_key_press(
            press,
            Arc::new(move |p: &KeyPress| {
                if let Some(screen) = &screen {
                    screen.view().invoke_key_press(p);
                }
            }),
        );
    }
}
