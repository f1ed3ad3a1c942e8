use anyhow::Result;
use image::RgbaImage;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use opencv::core::{Mat, Point, Scalar, Vec3b};
use opencv::imgproc;
use opencv::prelude::*;

use super::blit::{blend, for_each_scaled_pixel};
use super::framebuffer::FrameBuffer;
use super::scene::Painter;
use crate::tracker::{Rect, ScreenPoint};

/// minifbを使用したウィンドウ
pub struct MinifbRenderer {
    window: Window,
    buffer: FrameBuffer,
}

impl MinifbRenderer {
    /// ウィンドウを作成
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        Ok(Self {
            window,
            buffer: FrameBuffer::new(width, height),
        })
    }

    /// ウィンドウが開いているか
    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    /// 押された瞬間だけ true
    pub fn key_pressed(&self, key: Key) -> bool {
        self.window.is_key_pressed(key, KeyRepeat::No)
    }

    /// ウィンドウ内の左ボタン押下位置
    pub fn mouse_drag(&self) -> Option<ScreenPoint> {
        if !self.window.get_mouse_down(MouseButton::Left) {
            return None;
        }
        self.window
            .get_mouse_pos(MouseMode::Discard)
            .map(|(x, y)| ScreenPoint::new(x, y))
    }

    /// BGR Mat をバッファにコピー
    pub fn draw_frame(&mut self, frame: &Mat) -> Result<()> {
        let width = self.buffer.width();
        let frame_width = frame.cols() as usize;
        let frame_height = frame.rows() as usize;

        // サイズが異なる場合はクロップ
        for y in 0..self.buffer.height().min(frame_height) {
            for x in 0..width.min(frame_width) {
                let pixel = frame.at_2d::<Vec3b>(y as i32, x as i32)?;
                // BGR -> RGB -> u32
                let r = pixel[2] as u32;
                let g = pixel[1] as u32;
                let b = pixel[0] as u32;
                self.buffer.pixels_mut()[y * width + x] = (r << 16) | (g << 8) | b;
            }
        }

        Ok(())
    }

    /// バッファをウィンドウに表示
    pub fn update(&mut self) -> Result<()> {
        self.window
            .update_with_buffer(self.buffer.pixels(), self.buffer.width(), self.buffer.height())?;
        Ok(())
    }
}

fn bgr(color: u32) -> Scalar {
    Scalar::new(
        (color & 0xFF) as f64,
        ((color >> 8) & 0xFF) as f64,
        ((color >> 16) & 0xFF) as f64,
        0.0,
    )
}

fn to_point(p: ScreenPoint) -> Point {
    Point::new(p.x.round() as i32, p.y.round() as i32)
}

/// カメラ画像 (BGR Mat) に直接描く。ラベル文字は OpenCV のフォントで描く
pub struct MatPainter<'a> {
    frame: &'a mut Mat,
}

impl<'a> MatPainter<'a> {
    pub fn new(frame: &'a mut Mat) -> Self {
        Self { frame }
    }
}

impl Painter for MatPainter<'_> {
    fn draw_line(&mut self, from: ScreenPoint, to: ScreenPoint, width: f32, color: u32) -> Result<()> {
        imgproc::line(
            &mut *self.frame,
            to_point(from),
            to_point(to),
            bgr(color),
            width.round().max(1.0) as i32,
            imgproc::LINE_AA,
            0,
        )?;
        Ok(())
    }

    fn fill_circle(&mut self, center: ScreenPoint, radius: f32, color: u32) -> Result<()> {
        imgproc::circle(
            &mut *self.frame,
            to_point(center),
            radius.round().max(0.0) as i32,
            bgr(color),
            imgproc::FILLED,
            imgproc::LINE_AA,
            0,
        )?;
        Ok(())
    }

    /// 最近傍で拡縮してアルファ合成
    fn blit(&mut self, bitmap: &RgbaImage, rect: Rect) -> Result<()> {
        let cols = self.frame.cols().max(0) as usize;
        let rows = self.frame.rows().max(0) as usize;
        let frame = &mut *self.frame;
        for_each_scaled_pixel(bitmap, rect, cols, rows, |x, y, [r, g, b, a]| {
            let pixel = frame.at_2d_mut::<Vec3b>(y as i32, x as i32)?;
            // BGR
            for (channel, src) in [b, g, r].into_iter().enumerate() {
                pixel[channel] = blend(src, pixel[channel], a);
            }
            Ok(())
        })
    }

    fn draw_text(&mut self, origin: ScreenPoint, text: &str, color: u32) -> Result<()> {
        imgproc::put_text(
            &mut *self.frame,
            text,
            to_point(origin),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.8,
            bgr(color),
            2,
            imgproc::LINE_AA,
            false,
        )?;
        Ok(())
    }
}
