//! The 2D drawing seam between the view tree and whatever backend the host
//! shell provides (Skia, a canvas, a test recorder). Draw callbacks receive
//! a `&mut dyn Graphics` and issue calls against it; the engine itself never
//! rasterizes anything.

use crate::Color;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PaintStyle {
    Fill,
    #[default]
    Stroke,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    Center,
    #[default]
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Paint {
    pub style: PaintStyle,
    pub color: Color,
    pub stroke_width: f32,
    pub text_size: f32,
    pub text_align: TextAlign,
    pub bold: bool,
    pub antialias: bool,
}

impl Default for Paint {
    fn default() -> Self {
        Paint {
            style: PaintStyle::default(),
            color: Color::BLACK,
            stroke_width: 1.0,
            text_size: 16.0,
            text_align: TextAlign::default(),
            bold: false,
            antialias: true,
        }
    }
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Paint {
            style: PaintStyle::Fill,
            color,
            ..Paint::default()
        }
    }
}

pub trait Graphics {
    fn clear(&mut self, color: Color);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    fn rotate_radians(&mut self, radians: f32);
    fn scale(&mut self, sx: f32, sy: f32);
    fn draw_rect(&mut self, x: f32, y: f32, width: f32, height: f32, paint: &Paint);
    fn draw_round_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        rx: f32,
        ry: f32,
        paint: &Paint,
    );
    fn draw_circle(&mut self, x: f32, y: f32, radius: f32, paint: &Paint);
    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, paint: &Paint);
    fn draw_text(&mut self, text: &str, x: f32, y: f32, paint: &Paint);
}
