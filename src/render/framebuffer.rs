use anyhow::{Context, Result};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};
use std::path::Path;

use super::blit::{blend, for_each_scaled_pixel};
use super::scene::Painter;
use crate::tracker::{Rect, ScreenPoint};

/// 0RGB の u32 バッファ。minifb にそのまま渡せる
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

/// フォント1文字の大きさ（拡大前）
const GLYPH_SIZE: i32 = 8;
/// 文字の拡大率
const TEXT_SCALE: i32 = 2;

fn to_rgb(color: u32) -> [u8; 3] {
    [(color >> 16) as u8, (color >> 8) as u8, color as u8]
}

fn from_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    /// 背景画像から作る。アルファは捨てる
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let pixels = image
            .pixels()
            .map(|Rgba([r, g, b, _])| from_rgb(*r, *g, *b))
            .collect();
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let [r, g, b] = to_rgb(self.pixels[y as usize * self.width + x as usize]);
            Rgba([r, g, b, 255])
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.to_rgba_image()
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// ピクセルをセット（境界チェック付き）
    fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.pixels[y as usize * self.width + x as usize] = color;
        }
    }

    /// 円を描画（塗りつぶし）
    fn draw_disc(&mut self, cx: i32, cy: i32, radius: i32, color: u32) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Bresenhamのアルゴリズムで線を描画。太さは各点に円を置いて出す
    fn draw_segment(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, radius: i32, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let mut x = x0;
        let mut y = y0;

        loop {
            if radius > 0 {
                self.draw_disc(x, y, radius, color);
            } else {
                self.set_pixel(x, y, color);
            }

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

impl Painter for FrameBuffer {
    fn draw_line(&mut self, from: ScreenPoint, to: ScreenPoint, width: f32, color: u32) -> Result<()> {
        if !(from.x.is_finite() && from.y.is_finite() && to.x.is_finite() && to.y.is_finite()) {
            return Ok(());
        }
        let radius = (width / 2.0).floor().max(0.0) as i32;
        self.draw_segment(
            from.x.round() as i32,
            from.y.round() as i32,
            to.x.round() as i32,
            to.y.round() as i32,
            radius,
            color,
        );
        Ok(())
    }

    fn fill_circle(&mut self, center: ScreenPoint, radius: f32, color: u32) -> Result<()> {
        if center.x.is_finite() && center.y.is_finite() {
            self.draw_disc(
                center.x.round() as i32,
                center.y.round() as i32,
                radius.round().max(0.0) as i32,
                color,
            );
        }
        Ok(())
    }

    /// 最近傍で拡縮してアルファ合成
    fn blit(&mut self, bitmap: &RgbaImage, rect: Rect) -> Result<()> {
        let (width, height) = (self.width, self.height);
        let pixels = &mut self.pixels;
        for_each_scaled_pixel(bitmap, rect, width, height, |x, y, [r, g, b, a]| {
            let idx = y * width + x;
            let [dr, dg, db] = to_rgb(pixels[idx]);
            pixels[idx] = from_rgb(blend(r, dr, a), blend(g, dg, a), blend(b, db, a));
            Ok(())
        })
    }

    /// 8x8 ビットマップフォントを拡大して描く。`origin` は文字列の左下
    fn draw_text(&mut self, origin: ScreenPoint, text: &str, color: u32) -> Result<()> {
        if !(origin.x.is_finite() && origin.y.is_finite()) {
            return Ok(());
        }
        let glyph_size = GLYPH_SIZE * TEXT_SCALE;
        let left = origin.x.round() as i32;
        let top = origin.y.round() as i32 - glyph_size;

        for (i, c) in text.chars().enumerate() {
            // フォントに無い文字は空白扱い
            let Some(glyph) = BASIC_FONTS.get(c) else {
                continue;
            };
            let glyph_left = left + i as i32 * glyph_size;
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    // 下位ビットが左端
                    if (bits >> col) & 1 == 0 {
                        continue;
                    }
                    let x = glyph_left + col * TEXT_SCALE;
                    let y = top + row as i32 * TEXT_SCALE;
                    for dy in 0..TEXT_SCALE {
                        for dx in 0..TEXT_SCALE {
                            self.set_pixel(x + dx, y + dy, color);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
