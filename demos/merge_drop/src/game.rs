//! The game screen: a column-drop merge puzzle. A spawn box rides above the
//! board, touch (or arrow keys) slides it sideways, releasing drops it into
//! a column; equal values merge downward and double, feeding the score.
//! Overflowing a column ends the run.

use std::sync::Arc;
use std::time::Duration;

use alder_core::prelude::*;
use parking_lot::Mutex;
use rand::Rng;

pub const COLS: usize = 5;
pub const ROWS: usize = 7;

const FALL_SPEED: f32 = 900.0; // px/s
const RESPAWN_DELAY: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GameState {
    Running,
    Finished,
}

#[derive(Clone, Copy)]
struct Falling {
    value: u32,
    col: usize,
    y: f32,
}

struct Board {
    cells: [[Option<u32>; COLS]; ROWS], // row 0 at the top of the board area
    falling: Option<Falling>,
}

impl Board {
    fn new() -> Self {
        Board {
            cells: [[None; COLS]; ROWS],
            falling: None,
        }
    }

    /// Deepest empty row of `col`, or `None` when the column is full.
    fn landing_row(&self, col: usize) -> Option<usize> {
        (0..ROWS).rev().find(|&row| self.cells[row][col].is_none())
    }

    /// Places `value` in the column's landing row, then merges downward
    /// while the cell beneath holds the same value. Returns the score
    /// gained.
    fn settle(&mut self, col: usize, value: u32) -> u32 {
        let Some(mut row) = self.landing_row(col) else {
            return 0;
        };
        let mut value = value;
        self.cells[row][col] = Some(value);

        let mut gained = 0;
        while row + 1 < ROWS && self.cells[row + 1][col] == Some(value) {
            value *= 2;
            self.cells[row][col] = None;
            self.cells[row + 1][col] = Some(value);
            gained += value;
            row += 1;
        }
        gained
    }
}

/// Current and best score for the run.
struct Score {
    current: u32,
    best: u32,
}

impl Score {
    fn apply(&mut self, points: u32) {
        self.current += points;
        if self.current > self.best {
            self.best = self.current;
        }
    }

    fn reset(&mut self) {
        self.current = 0;
    }
}

/// Offset-tracking drag helper: remembers where the finger grabbed relative
/// to the spawn box and clamps the tracked position to the playfield.
struct Manipulator {
    grip: Option<f32>,
    min: f32,
    max: f32,
}

impl Manipulator {
    fn new() -> Self {
        Manipulator {
            grip: None,
            min: 0.0,
            max: 0.0,
        }
    }

    fn set_limits(&mut self, min: f32, max: f32) {
        self.min = min;
        self.max = max;
    }

    fn touch_down(&mut self, x: f32, current: f32) {
        self.grip = Some(x - current);
    }

    fn touch_move(&mut self, x: f32) -> Option<f32> {
        let offset = self.grip?;
        let mut target = x - offset;
        if target < self.min {
            target = self.min;
            self.grip = Some(x - self.min);
        } else if target > self.max {
            target = self.max;
            self.grip = Some(x - self.max);
        }
        Some(target)
    }

    fn touch_up(&mut self, x: f32) -> Option<f32> {
        let target = self.touch_move(x);
        self.grip = None;
        target
    }
}

struct Spawn {
    value: u32,
    x: f32, // box center, screen px
    visible: bool,
}

#[derive(Clone, Copy, Default)]
struct Layout {
    width: f32,
    height: f32,
    cell: f32,
    board_top: f32,
    board_left: f32,
    spawn_y: f32,
}

struct SharedState {
    board: Mutex<Board>,
    spawn: Mutex<Spawn>,
    manipulator: Mutex<Manipulator>,
    score: Mutex<Score>,
    timer: Mutex<Timer>,
    state: Mutex<GameState>,
    layout: Mutex<Layout>,
}

#[derive(Clone)]
pub struct GameScreen {
    shared: Arc<SharedState>,
}

impl GameScreen {
    pub fn new() -> Self {
        GameScreen {
            shared: Arc::new(SharedState {
                board: Mutex::new(Board::new()),
                spawn: Mutex::new(Spawn {
                    value: next_value(),
                    x: 0.0,
                    visible: true,
                }),
                manipulator: Mutex::new(Manipulator::new()),
                score: Mutex::new(Score {
                    current: 0,
                    best: 0,
                }),
                timer: Mutex::new(Timer::new()),
                state: Mutex::new(GameState::Running),
                layout: Mutex::new(Layout::default()),
            }),
        }
    }

    pub fn score(&self) -> u32 {
        self.shared.score.lock().current
    }

    pub fn best(&self) -> u32 {
        self.shared.score.lock().best
    }
}

impl Default for GameScreen {
    fn default() -> Self {
        GameScreen::new()
    }
}

impl ScreenController for GameScreen {
    fn start(&self, screen: &Screen) {
        let width = screen.width();
        let height = screen.height();
        let cell = width / COLS as f32;
        let board_h = cell * ROWS as f32;
        let layout = Layout {
            width,
            height,
            cell,
            board_top: height - board_h,
            board_left: 0.0,
            spawn_y: height - board_h - cell / 2.0 - 10.0,
        };
        *self.shared.layout.lock() = layout;
        self.shared.spawn.lock().x = width / 2.0;
        self.shared
            .manipulator
            .lock()
            .set_limits(cell / 2.0, width - cell / 2.0);

        {
            let mut timer = self.shared.timer.lock();
            timer.set_interval(RESPAWN_DELAY);
            let shared = self.shared.clone();
            timer.on_elapsed(move || {
                let layout = *shared.layout.lock();
                let mut spawn = shared.spawn.lock();
                spawn.value = next_value();
                spawn.x = layout.width / 2.0;
                spawn.visible = true;
            });
        }

        let overlay = build_game_over_overlay(screen, &self.shared);
        screen.add_view(&overlay);

        // input
        {
            let shared = self.shared.clone();
            screen.on_touch_down(move |_, s| {
                if *shared.state.lock() == GameState::Finished {
                    return;
                }
                let current = shared.spawn.lock().x;
                shared.manipulator.lock().touch_down(s.position().x, current);
            });
        }
        {
            let shared = self.shared.clone();
            screen.on_touch_move(move |_, s| {
                if *shared.state.lock() == GameState::Finished {
                    return;
                }
                if let Some(x) = shared.manipulator.lock().touch_move(s.position().x) {
                    let mut spawn = shared.spawn.lock();
                    if spawn.visible {
                        spawn.x = x;
                    }
                }
            });
        }
        {
            let shared = self.shared.clone();
            let overlay = overlay.clone();
            screen.on_touch_up(move |_, s| {
                if *shared.state.lock() == GameState::Finished {
                    return;
                }
                if let Some(x) = shared.manipulator.lock().touch_up(s.position().x) {
                    let mut spawn = shared.spawn.lock();
                    if spawn.visible {
                        spawn.x = x;
                    }
                }
                drop_spawn(&shared, &overlay);
            });
        }
        {
            let shared = self.shared.clone();
            let overlay = overlay.clone();
            screen.on_key_down(move |_, s| {
                if *shared.state.lock() == GameState::Finished {
                    return;
                }
                let layout = *shared.layout.lock();
                match s.key_code() {
                    KeyCode::Left => nudge_spawn(&shared, -layout.cell),
                    KeyCode::Right => nudge_spawn(&shared, layout.cell),
                    KeyCode::Space => drop_spawn(&shared, &overlay),
                    _ => {}
                }
            });
        }

        // frame
        {
            let shared = self.shared.clone();
            let overlay = overlay.clone();
            screen.on_update(move |dt| {
                if *shared.state.lock() == GameState::Finished {
                    return;
                }
                shared.timer.lock().update();

                let layout = *shared.layout.lock();
                let mut overflowed = false;
                {
                    let mut board = shared.board.lock();
                    if let Some(mut falling) = board.falling {
                        match board.landing_row(falling.col) {
                            None => overflowed = true,
                            Some(row) => {
                                let target =
                                    layout.board_top + row as f32 * layout.cell + layout.cell / 2.0;
                                falling.y += FALL_SPEED * dt;
                                if falling.y >= target {
                                    board.falling = None;
                                    let gained = board.settle(falling.col, falling.value);
                                    if gained > 0 {
                                        shared.score.lock().apply(gained);
                                        log::info!("merge chain scored +{gained}");
                                    }
                                } else {
                                    board.falling = Some(falling);
                                }
                            }
                        }
                    }
                }
                if overflowed {
                    finish(&shared, &overlay);
                }
            });
        }

        {
            let shared = self.shared.clone();
            screen.on_draw(move |g| draw_game(g, &shared));
        }

        log::debug!("game screen started at {width}x{height}");
    }
}

fn next_value() -> u32 {
    2u32 << rand::rng().random_range(0..3u32)
}

fn col_for_x(x: f32, layout: &Layout) -> usize {
    let col = ((x - layout.board_left) / layout.cell).floor();
    col.clamp(0.0, (COLS - 1) as f32) as usize
}

fn nudge_spawn(shared: &Arc<SharedState>, dx: f32) {
    let (min, max) = {
        let manipulator = shared.manipulator.lock();
        (manipulator.min, manipulator.max)
    };
    let mut spawn = shared.spawn.lock();
    if spawn.visible {
        spawn.x = (spawn.x + dx).clamp(min, max);
    }
}

fn drop_spawn(shared: &Arc<SharedState>, overlay: &View) {
    let layout = *shared.layout.lock();
    let mut overflowed = false;
    {
        let mut spawn = shared.spawn.lock();
        let mut board = shared.board.lock();
        if !spawn.visible || board.falling.is_some() {
            return;
        }
        let col = col_for_x(spawn.x, &layout);
        if board.landing_row(col).is_none() {
            overflowed = true;
        } else {
            board.falling = Some(Falling {
                value: spawn.value,
                col,
                y: layout.spawn_y,
            });
            spawn.visible = false;
        }
    }
    if overflowed {
        finish(shared, overlay);
        return;
    }
    shared.timer.lock().start();
}

fn finish(shared: &Arc<SharedState>, overlay: &View) {
    *shared.state.lock() = GameState::Finished;
    overlay.set_visible(true);
    let score = shared.score.lock();
    log::info!("game over: score {}, best {}", score.current, score.best);
}

fn restart(shared: &Arc<SharedState>, overlay: &View) {
    {
        let mut board = shared.board.lock();
        board.cells = [[None; COLS]; ROWS];
        board.falling = None;
    }
    shared.score.lock().reset();
    {
        let layout = *shared.layout.lock();
        let mut spawn = shared.spawn.lock();
        spawn.value = next_value();
        spawn.x = layout.width / 2.0;
        spawn.visible = true;
    }
    *shared.state.lock() = GameState::Running;
    overlay.set_visible(false);
    log::info!("restart");
}

/// Full-screen dimmer with score readout and a restart button. Hidden until
/// the run ends; its size is bound to the screen's, so it keeps covering the
/// surface if the host resizes it.
fn build_game_over_overlay(screen: &Screen, shared: &Arc<SharedState>) -> View {
    let overlay = View::new();
    overlay.set_id("game-over");
    overlay.set_visible(false);
    {
        let sc = screen.clone();
        overlay.register_field_ref(
            WIDTH_FIELD,
            Arc::new(move || FieldValue::Float(sc.width())),
            None,
        );
    }
    {
        let sc = screen.clone();
        overlay.register_field_ref(
            HEIGHT_FIELD,
            Arc::new(move || FieldValue::Float(sc.height())),
            None,
        );
    }

    let button = View::new();
    button.set_id("restart");
    let bw = screen.width() / 2.5;
    let bh = 80.0;
    button.set_size(bw, bh);
    button.set_position(screen.width() / 2.0 - bw / 2.0, screen.height() / 2.0 + 90.0);
    {
        let b = button.clone();
        button.on_draw(move |g| {
            g.save();
            g.translate(b.x(), b.y());
            g.draw_round_rect(
                0.0,
                0.0,
                b.width(),
                b.height(),
                10.0,
                10.0,
                &Paint::fill(Color::from_rgb(90, 203, 135)),
            );
            let mut text_paint = Paint::fill(Color::from_rgb(248, 248, 248));
            text_paint.text_align = TextAlign::Center;
            g.draw_text("Play again", b.width() / 2.0, b.height() / 2.0 - 3.0, &text_paint);
            g.restore();
        });
    }
    {
        let shared = shared.clone();
        let overlay_for_click = overlay.clone();
        button.on_click(move |_, _| restart(&shared, &overlay_for_click));
    }
    // Populated when the overlay itself lands in the tree.
    overlay.on_loaded(move |ov| ov.add_view(&button));

    {
        let shared = shared.clone();
        let ov = overlay.clone();
        overlay.on_draw(move |g| {
            let w = ov.width();
            let h = ov.height();
            g.draw_rect(0.0, 0.0, w, h, &Paint::fill(Color::from_rgba(0, 0, 0, 200)));

            let mut title = Paint::fill(Color::from_rgb(248, 248, 248));
            title.text_align = TextAlign::Center;
            title.text_size = 35.0;
            g.draw_text("Game over", w / 2.0, h / 2.0 - 180.0, &title);

            let score = shared.score.lock();
            let mut big = title.clone();
            big.text_size = 60.0;
            big.bold = true;
            g.draw_text(&score.current.to_string(), w / 2.0, h / 2.0 - 60.0, &big);

            let mut small = title.clone();
            small.text_size = 18.0;
            g.draw_text("best", w / 2.0, h / 2.0, &small);
            let mut small_bold = small.clone();
            small_bold.bold = true;
            g.draw_text(&score.best.to_string(), w / 2.0, h / 2.0 + 30.0, &small_bold);
        });
    }

    overlay
}

fn value_color(value: u32) -> Color {
    match value {
        2 => Color::from_rgb(90, 203, 135),
        4 => Color::from_rgb(93, 160, 219),
        8 => Color::from_rgb(226, 188, 90),
        16 => Color::from_rgb(222, 120, 96),
        32 => Color::from_rgb(170, 112, 216),
        64 => Color::from_rgb(219, 93, 144),
        _ => Color::from_rgb(240, 240, 240),
    }
}

fn draw_box(g: &mut dyn Graphics, cx: f32, cy: f32, size: f32, value: u32) {
    let half = size / 2.0 - 2.0;
    g.draw_round_rect(
        cx - half,
        cy - half,
        half * 2.0,
        half * 2.0,
        8.0,
        8.0,
        &Paint::fill(value_color(value)),
    );
    let mut text = Paint::fill(Color::from_rgb(30, 30, 30));
    text.text_align = TextAlign::Center;
    text.bold = true;
    g.draw_text(&value.to_string(), cx, cy + 5.0, &text);
}

fn draw_game(g: &mut dyn Graphics, shared: &Arc<SharedState>) {
    let layout = *shared.layout.lock();

    // playfield frame and the dead line the stack must not cross
    let frame = Paint {
        color: Color::from_rgb(60, 70, 84),
        ..Paint::default()
    };
    for col in 0..=COLS {
        let x = layout.board_left + col as f32 * layout.cell;
        g.draw_line(x, layout.board_top, x, layout.height, &frame);
    }
    let mut dead_line = frame.clone();
    dead_line.color = Color::from_rgb(222, 120, 96);
    g.draw_line(0.0, layout.board_top, layout.width, layout.board_top, &dead_line);

    {
        let board = shared.board.lock();
        for row in 0..ROWS {
            for col in 0..COLS {
                if let Some(value) = board.cells[row][col] {
                    let cx = layout.board_left + col as f32 * layout.cell + layout.cell / 2.0;
                    let cy = layout.board_top + row as f32 * layout.cell + layout.cell / 2.0;
                    draw_box(g, cx, cy, layout.cell, value);
                }
            }
        }
        if let Some(falling) = board.falling {
            let cx = layout.board_left + falling.col as f32 * layout.cell + layout.cell / 2.0;
            draw_box(g, cx, falling.y, layout.cell, falling.value);
        }
    }

    {
        let spawn = shared.spawn.lock();
        if spawn.visible {
            draw_box(g, spawn.x, layout.spawn_y, layout.cell, spawn.value);
        }
    }

    let score = shared.score.lock();
    let mut score_paint = Paint::fill(Color::from_rgb(248, 248, 248));
    score_paint.text_align = TextAlign::Right;
    score_paint.text_size = 30.0;
    score_paint.bold = true;
    g.draw_text(&score.current.to_string(), layout.width - 10.0, 40.0, &score_paint);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_merges_down_the_column_and_scores_the_chain() {
        let mut board = Board::new();
        board.cells[ROWS - 1][0] = Some(4);
        board.cells[ROWS - 2][0] = Some(2);

        // 2 lands on the 2, doubles to 4, then that 4 merges with the 4 below.
        let gained = board.settle(0, 2);
        assert_eq!(gained, 4 + 8);
        assert_eq!(board.cells[ROWS - 1][0], Some(8));
        assert_eq!(board.cells[ROWS - 2][0], None);
    }

    #[test]
    fn settle_without_a_match_just_stacks() {
        let mut board = Board::new();
        board.cells[ROWS - 1][2] = Some(4);

        assert_eq!(board.settle(2, 2), 0);
        assert_eq!(board.cells[ROWS - 2][2], Some(2));
    }

    #[test]
    fn landing_row_reports_full_columns() {
        let mut board = Board::new();
        assert_eq!(board.landing_row(1), Some(ROWS - 1));
        for row in 0..ROWS {
            board.cells[row][1] = Some(2);
        }
        assert_eq!(board.landing_row(1), None);
    }

    #[test]
    fn manipulator_clamps_and_regrips_at_the_edges() {
        let mut m = Manipulator::new();
        m.set_limits(50.0, 430.0);

        m.touch_down(100.0, 240.0);
        assert_eq!(m.touch_move(110.0), Some(250.0));

        // Dragged past the left edge: clamped, and the grip re-anchors so
        // moving back right responds immediately.
        assert_eq!(m.touch_move(-500.0), Some(50.0));
        assert_eq!(m.touch_move(-480.0), Some(70.0));

        assert_eq!(m.touch_up(-480.0), Some(70.0));
        assert_eq!(m.touch_move(0.0), None);
    }

    #[test]
    fn spawn_x_maps_to_a_clamped_column() {
        let layout = Layout {
            width: 480.0,
            cell: 96.0,
            ..Layout::default()
        };
        assert_eq!(col_for_x(10.0, &layout), 0);
        assert_eq!(col_for_x(240.0, &layout), 2);
        assert_eq!(col_for_x(9999.0, &layout), COLS - 1);
    }
}
