#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use parking_lot::Mutex;

    use crate::color::Color;
    use crate::error::ScreenError;
    use crate::fields::{FieldGetter, FieldValue};
    use crate::geometry::Size;
    use crate::graphics::{Graphics, Paint};
    use crate::input::{KeyCode, KeyPress, KeyboardState, Keys, TouchState};
    use crate::queue::{EventQueue, MAX_PENDING};
    use crate::resolver::EventResolver;
    use crate::runtime::ScreenService;
    use crate::screen::{AppContext, Screen, ScreenController};
    use crate::timer::Timer;
    use crate::view::View;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    fn noop_touch_action() -> crate::queue::EventAction<TouchState> {
        Arc::new(|_| {})
    }

    struct FixedContext {
        size: Size,
    }

    impl Default for FixedContext {
        fn default() -> Self {
            FixedContext {
                size: Size {
                    width: 200.0,
                    height: 200.0,
                },
            }
        }
    }

    impl AppContext for FixedContext {
        fn surface_size(&self) -> Size {
            self.size
        }
    }

    #[derive(Default)]
    struct TraceGraphics {
        calls: Vec<String>,
    }

    impl Graphics for TraceGraphics {
        fn clear(&mut self, _color: Color) {
            self.calls.push("clear".to_string());
        }
        fn save(&mut self) {}
        fn restore(&mut self) {}
        fn translate(&mut self, _x: f32, _y: f32) {}
        fn rotate_radians(&mut self, _radians: f32) {}
        fn scale(&mut self, _sx: f32, _sy: f32) {}
        fn draw_rect(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _paint: &Paint) {}
        fn draw_round_rect(
            &mut self,
            _x: f32,
            _y: f32,
            _w: f32,
            _h: f32,
            _rx: f32,
            _ry: f32,
            _paint: &Paint,
        ) {
        }
        fn draw_circle(&mut self, _x: f32, _y: f32, _r: f32, _paint: &Paint) {}
        fn draw_line(&mut self, _x1: f32, _y1: f32, _x2: f32, _y2: f32, _paint: &Paint) {}
        fn draw_text(&mut self, text: &str, _x: f32, _y: f32, _paint: &Paint) {
            self.calls.push(format!("text:{text}"));
        }
    }

    fn leaf(width: f32, height: f32) -> View {
        let view = View::new();
        view.set_size(width, height);
        view
    }

    // --- event queue ---

    #[test]
    fn queue_drains_in_enqueue_order() {
        let queue = EventQueue::new();
        for i in 0..5 {
            queue.enqueue(TouchState::at(i as f32, 0.0), noop_touch_action());
        }
        assert_eq!(queue.count(), 5);

        let items = queue.take();
        let xs: Vec<f32> = items.iter().map(|item| item.state.position().x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(queue.count(), 0);
    }

    #[test]
    fn queue_tail_drops_on_overflow() {
        let queue = EventQueue::new();
        for i in 0..(MAX_PENDING + 1) {
            queue.enqueue(TouchState::at(i as f32, 0.0), noop_touch_action());
        }
        assert_eq!(queue.count(), MAX_PENDING);

        // The newest item was the casualty; the first 50 survive intact.
        let items = queue.take();
        assert_eq!(items.last().unwrap().state.position().x, (MAX_PENDING - 1) as f32);
    }

    #[test]
    fn queue_supports_concurrent_producers() {
        let queue = Arc::new(EventQueue::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let queue = queue.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..10 {
                    queue.enqueue(TouchState::at(0.0, 0.0), Arc::new(|_| {}));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.count(), 40);
    }

    // --- resolver ---

    #[test]
    fn resolver_orders_across_kinds_by_timestamp() {
        let resolver = EventResolver::new();
        let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        // Key events drain after touch events; ordering must come from the
        // enqueue timestamps, not the drain sequence.
        let o = order.clone();
        resolver.add_key_down(
            KeyboardState::new(Keys::empty()),
            Arc::new(move |_| o.lock().push("key")),
        );
        thread::sleep(Duration::from_millis(5));
        let o = order.clone();
        resolver.add_touch_down(
            TouchState::at(0.0, 0.0),
            Arc::new(move |_| o.lock().push("touch")),
        );

        resolver.invoke();
        assert_eq!(*order.lock(), vec!["key", "touch"]);
    }

    // --- view dispatch ---

    #[test]
    fn leaf_inside_bounds_reports_handled_without_callbacks() {
        let view = leaf(100.0, 100.0);
        assert!(view.invoke_touch_down(&TouchState::at(10.0, 10.0)));
        assert!(!view.invoke_touch_down(&TouchState::at(150.0, 10.0)));
    }

    #[test]
    fn first_child_in_insertion_order_wins_the_hit() {
        let root = leaf(100.0, 100.0);
        let first = leaf(100.0, 100.0);
        let second = leaf(100.0, 100.0);
        root.add_view(&first);
        root.add_view(&second);

        let hits_first = counter();
        let hits_second = counter();
        let n = hits_first.clone();
        first.on_touch_down(move |_, _| {
            n.fetch_add(1, Ordering::Relaxed);
        });
        let n = hits_second.clone();
        second.on_touch_down(move |_, _| {
            n.fetch_add(1, Ordering::Relaxed);
        });

        assert!(root.invoke_touch_down(&TouchState::at(50.0, 50.0)));
        assert_eq!(hits_first.load(Ordering::Relaxed), 1);
        assert_eq!(hits_second.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn invisible_view_is_unhandled_and_unfired() {
        let view = leaf(100.0, 100.0);
        let hits = counter();
        let n = hits.clone();
        view.on_touch_down(move |_, _| {
            n.fetch_add(1, Ordering::Relaxed);
        });
        view.set_visible(false);

        assert!(!view.invoke_touch_down(&TouchState::at(10.0, 10.0)));
        assert_eq!(hits.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn stop_propagation_marks_parent_handled() {
        // Point inside the parent but outside its child: normally the
        // parent reports unhandled because it has children.
        let parent = leaf(200.0, 200.0);
        let child = leaf(50.0, 50.0);
        parent.add_view(&child);
        assert!(!parent.invoke_touch_down(&TouchState::at(100.0, 100.0)));

        parent.on_touch_down(|_, state| state.stop_propagation());
        assert!(parent.invoke_touch_down(&TouchState::at(100.0, 100.0)));
    }

    #[test]
    fn enter_and_leave_fire_on_crossings_only() {
        let view = leaf(100.0, 100.0);
        let enters = counter();
        let leaves = counter();
        let n = enters.clone();
        view.on_touch_enter(move |_, _| {
            n.fetch_add(1, Ordering::Relaxed);
        });
        let n = leaves.clone();
        view.on_touch_leave(move |_, _| {
            n.fetch_add(1, Ordering::Relaxed);
        });

        view.invoke_touch_move(&TouchState::at(10.0, 10.0));
        view.invoke_touch_move(&TouchState::at(20.0, 20.0));
        assert_eq!(enters.load(Ordering::Relaxed), 1);
        assert_eq!(leaves.load(Ordering::Relaxed), 0);

        assert!(!view.invoke_touch_move(&TouchState::at(500.0, 500.0)));
        assert_eq!(leaves.load(Ordering::Relaxed), 1);

        // Still outside: no second leave.
        view.invoke_touch_move(&TouchState::at(500.0, 500.0));
        assert_eq!(leaves.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn three_rapid_ups_pair_exactly_once() {
        let view = leaf(100.0, 100.0);
        let clicks = counter();
        let doubles = counter();
        let n = clicks.clone();
        view.on_click(move |_, _| {
            n.fetch_add(1, Ordering::Relaxed);
        });
        let n = doubles.clone();
        view.on_double_click(move |_, _| {
            n.fetch_add(1, Ordering::Relaxed);
        });

        for _ in 0..3 {
            view.invoke_touch_up(&TouchState::at(10.0, 10.0));
        }
        assert_eq!(clicks.load(Ordering::Relaxed), 3);
        // The third up starts a new pair instead of chaining off the second.
        assert_eq!(doubles.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn key_press_recurses_key_down_does_not() {
        let root = leaf(100.0, 100.0);
        let child = leaf(10.0, 10.0);
        root.add_view(&child);
        child.set_visible(false);

        let downs = counter();
        let presses = counter();
        let n = downs.clone();
        child.on_key_down(move |_, _| {
            n.fetch_add(1, Ordering::Relaxed);
        });
        let n = presses.clone();
        child.on_key_press(move |_, _| {
            n.fetch_add(1, Ordering::Relaxed);
        });

        root.invoke_key_down(&KeyboardState::new(Keys::from_code(KeyCode::Space)));
        assert_eq!(downs.load(Ordering::Relaxed), 0);

        // Press reaches every descendant, visibility notwithstanding.
        root.invoke_key_press(&KeyPress::new('a'));
        assert_eq!(presses.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn draw_traversal_is_preorder_and_skips_invisible_subtrees() {
        let root = leaf(100.0, 100.0);
        let shown = leaf(10.0, 10.0);
        let shown_child = leaf(5.0, 5.0);
        let hidden = leaf(10.0, 10.0);
        let hidden_child = leaf(5.0, 5.0);

        for (view, label) in [
            (&root, "root"),
            (&shown, "a"),
            (&shown_child, "a1"),
            (&hidden, "b"),
            (&hidden_child, "b1"),
        ] {
            let label = label.to_string();
            view.on_draw(move |g| g.draw_text(&label, 0.0, 0.0, &Paint::default()));
        }

        shown.add_view(&shown_child);
        hidden.add_view(&hidden_child);
        root.add_view(&shown);
        root.add_view(&hidden);
        hidden.set_visible(false);

        let mut g = TraceGraphics::default();
        root.invoke_draw(&mut g);
        assert_eq!(g.calls, vec!["text:root", "text:a", "text:a1"]);
    }

    // --- tree & fields ---

    #[test]
    fn absolute_coordinates_compose_through_parents() {
        let root = View::new();
        let mid = View::new();
        let deep = View::new();
        root.set_x(5.0);
        mid.set_x(5.0);
        deep.set_x(5.0);
        root.add_view(&mid);
        mid.add_view(&deep);

        assert_eq!(deep.x(), 15.0);
        assert_eq!(deep.y(), 0.0);
    }

    #[test]
    fn add_view_fires_loaded_and_refuses_cycles() {
        let root = View::new();
        let child = View::new();
        let loaded = counter();
        let n = loaded.clone();
        child.on_loaded(move |_| {
            n.fetch_add(1, Ordering::Relaxed);
        });

        root.add_view(&child);
        assert_eq!(loaded.load(Ordering::Relaxed), 1);

        root.add_view(&root);
        child.add_view(&root);
        assert_eq!(root.children().len(), 1);
        assert!(child.children().is_empty());
    }

    #[test]
    fn child_lookup_by_id() {
        let root = View::new();
        let child = View::new();
        child.set_id("overlay");
        root.add_view(&child);

        assert!(root.child_by_id("overlay").unwrap().same(&child));
        assert!(root.child_by_id("missing").is_none());
    }

    #[test]
    fn stored_binding_fully_replaces_indirection() {
        let view = View::new();
        let calls = counter();
        let n = calls.clone();
        let getter: FieldGetter = Arc::new(move || {
            n.fetch_add(1, Ordering::Relaxed);
            FieldValue::Float(42.0)
        });
        view.register_field_ref("k", getter, None);

        // No caching: every read goes through the getter.
        assert_eq!(view.get_field("k").as_f32(), 42.0);
        assert_eq!(view.get_field("k").as_f32(), 42.0);
        assert_eq!(calls.load(Ordering::Relaxed), 2);

        view.register_field("k", 7.0f32);
        assert_eq!(view.get_field("k").as_f32(), 7.0);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn missing_setter_discards_writes() {
        let view = View::new();
        let getter: FieldGetter = Arc::new(|| FieldValue::Float(42.0));
        view.register_field_ref("k", getter, None);

        view.set_field("k", 1.0f32);
        assert_eq!(view.get_field("k").as_f32(), 42.0);
    }

    #[test]
    fn unregistered_fields_yield_type_defaults() {
        let view = View::new();
        assert_eq!(view.get_field("nope"), FieldValue::Empty);
        assert_eq!(view.get_field("nope").as_f32(), 0.0);
        assert!(!view.get_field("nope").as_bool());
        assert_eq!(view.get_field("nope").as_str(), "");
    }

    #[test]
    fn handlers_are_removable_by_id() {
        let view = leaf(100.0, 100.0);
        let clicks = counter();
        let n = clicks.clone();
        let id = view.on_click(move |_, _| {
            n.fetch_add(1, Ordering::Relaxed);
        });

        assert!(view.remove_handler(id));
        view.invoke_touch_up(&TouchState::at(10.0, 10.0));
        assert_eq!(clicks.load(Ordering::Relaxed), 0);
        assert!(!view.remove_handler(id));
    }

    // --- keyboard state ---

    #[test]
    fn keyboard_state_unpacks_code_and_modifiers() {
        let state = KeyboardState::new(Keys::from_code(KeyCode::Left) | Keys::SHIFT);
        assert!(state.shift());
        assert!(!state.control());
        assert!(!state.alt());
        assert_eq!(state.modifiers(), Keys::SHIFT);
        assert_eq!(state.key_value(), 37);
        assert_eq!(state.key_code(), KeyCode::Left);

        let unknown = KeyboardState::new(Keys::from_bits_retain(12345));
        assert_eq!(unknown.key_code(), KeyCode::None);
    }

    // --- screens & service ---

    struct NullScreen;

    impl ScreenController for NullScreen {
        fn start(&self, _screen: &Screen) {}
    }

    struct CountingScreen {
        hits: Arc<AtomicUsize>,
    }

    impl ScreenController for CountingScreen {
        fn start(&self, screen: &Screen) {
            let hits = self.hits.clone();
            screen.view().on_touch_down(move |_, _| {
                hits.fetch_add(1, Ordering::Relaxed);
            });
        }
    }

    #[test]
    fn screen_size_tracks_the_bound_context() {
        let screen = Screen::new(Arc::new(NullScreen));
        assert_eq!(screen.width(), 0.0);

        screen.bind(Arc::new(FixedContext::default()));
        assert_eq!(screen.width(), 200.0);
        assert_eq!(screen.height(), 200.0);

        // Writes to the surface-backed size are discarded.
        screen.set_width(10.0);
        assert_eq!(screen.width(), 200.0);
    }

    #[test]
    fn update_and_draw_are_noops_without_a_screen() {
        let service = ScreenService::new(Arc::new(FixedContext::default()));
        service.update();

        let mut g = TraceGraphics::default();
        service.draw(&mut g);
        assert!(g.calls.is_empty());
    }

    #[test]
    fn set_screen_requires_registration() {
        let service = ScreenService::new(Arc::new(FixedContext::default()));
        assert!(matches!(
            service.set_screen::<NullScreen>(),
            Err(ScreenError::NotRegistered(_))
        ));
    }

    #[test]
    fn invoke_entry_points_enqueue_instead_of_dispatching() {
        let service = ScreenService::new(Arc::new(FixedContext::default()));
        let counters: Arc<Mutex<Vec<Arc<AtomicUsize>>>> = Arc::new(Mutex::new(Vec::new()));
        service.register_screen({
            let counters = counters.clone();
            move || {
                let hits = counter();
                counters.lock().push(hits.clone());
                CountingScreen { hits }
            }
        });
        service.set_screen::<CountingScreen>().unwrap();

        service.invoke_touch_down(TouchState::at(10.0, 10.0));
        assert_eq!(counters.lock()[0].load(Ordering::Relaxed), 0);

        service.update();
        assert_eq!(counters.lock()[0].load(Ordering::Relaxed), 1);
    }

    #[test]
    fn stale_screen_events_target_old_screen() {
        let service = ScreenService::new(Arc::new(FixedContext::default()));
        let counters: Arc<Mutex<Vec<Arc<AtomicUsize>>>> = Arc::new(Mutex::new(Vec::new()));
        service.register_screen({
            let counters = counters.clone();
            move || {
                let hits = counter();
                counters.lock().push(hits.clone());
                CountingScreen { hits }
            }
        });

        service.set_screen::<CountingScreen>().unwrap();
        service.invoke_touch_down(TouchState::at(10.0, 10.0));

        // Swap before the frame drains the queue: the queued event still
        // runs against the screen it captured at enqueue time.
        service.set_screen::<CountingScreen>().unwrap();
        service.update();

        let counters = counters.lock();
        assert_eq!(counters.len(), 2);
        assert_eq!(counters[0].load(Ordering::Relaxed), 1);
        assert_eq!(counters[1].load(Ordering::Relaxed), 0);
    }

    // --- timer ---

    #[test]
    fn timer_fires_once_then_disarms() {
        let mut timer = Timer::new();
        let fired = counter();
        let n = fired.clone();
        timer.on_elapsed(move || {
            n.fetch_add(1, Ordering::Relaxed);
        });

        timer.update();
        assert_eq!(fired.load(Ordering::Relaxed), 0);

        timer.set_interval(Duration::ZERO);
        timer.start();
        assert!(timer.is_enabled());

        timer.update();
        assert_eq!(fired.load(Ordering::Relaxed), 1);
        assert!(!timer.is_enabled());

        timer.update();
        assert_eq!(fired.load(Ordering::Relaxed), 1);
    }
}
