//! Headless demo run: drives the merge-drop game for a few hundred frames
//! with scripted touch and key input, then reports the score and how many
//! draw calls the frames issued.

mod game;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use alder_core::prelude::*;

use crate::game::GameScreen;

const FRAMES: u32 = 400;
const FRAME_SLEEP: Duration = Duration::from_millis(5);

struct FixedSurface {
    size: Size,
}

impl AppContext for FixedSurface {
    fn surface_size(&self) -> Size {
        self.size
    }
}

/// Counts primitives instead of rasterizing them.
#[derive(Default)]
struct TallyGraphics {
    draw_calls: usize,
}

impl Graphics for TallyGraphics {
    fn clear(&mut self, _color: Color) {}
    fn save(&mut self) {}
    fn restore(&mut self) {}
    fn translate(&mut self, _dx: f32, _dy: f32) {}
    fn rotate_radians(&mut self, _radians: f32) {}
    fn scale(&mut self, _sx: f32, _sy: f32) {}

    fn draw_rect(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _paint: &Paint) {
        self.draw_calls += 1;
    }

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
        self.draw_calls += 1;
    }

    fn draw_circle(&mut self, _cx: f32, _cy: f32, _radius: f32, _paint: &Paint) {
        self.draw_calls += 1;
    }

    fn draw_line(&mut self, _x1: f32, _y1: f32, _x2: f32, _y2: f32, _paint: &Paint) {
        self.draw_calls += 1;
    }

    fn draw_text(&mut self, _text: &str, _x: f32, _y: f32, _paint: &Paint) {
        self.draw_calls += 1;
    }
}

/// Slides the spawn box left during the first second, drops it, then after
/// the respawn delay steps right once and drops again with the keyboard.
fn script(service: &ScreenService, frame: u32) {
    match frame {
        10 => service.invoke_touch_down(TouchState::at(240.0, 700.0)),
        11..=30 => {
            let x = 240.0 - (frame - 10) as f32 * 8.0;
            service.invoke_touch_move(TouchState::at(x, 700.0));
        }
        31 => service.invoke_touch_up(TouchState::at(80.0, 700.0)),
        236 => service.invoke_key_down(KeyboardState::new(Keys::from_code(KeyCode::Right))),
        238 => service.invoke_key_down(KeyboardState::new(Keys::from_code(KeyCode::Space))),
        _ => {}
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let service = ScreenService::new(Arc::new(FixedSurface {
        size: Size {
            width: 480.0,
            height: 800.0,
        },
    }));

    let game = GameScreen::new();
    service.register_screen({
        let game = game.clone();
        move || game.clone()
    });
    service.set_screen::<GameScreen>()?;
    service.set_stats_visible(true);

    let mut g = TallyGraphics::default();
    for frame in 0..FRAMES {
        script(&service, frame);
        service.update();
        service.draw(&mut g);
        thread::sleep(FRAME_SLEEP);
    }

    log::info!(
        "run finished: score {}, best {}, {} fps, {} draw calls issued",
        game.score(),
        game.best(),
        service.fps(),
        g.draw_calls,
    );
    Ok(())
}
