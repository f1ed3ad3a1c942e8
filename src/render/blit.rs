use anyhow::Result;
use image::{Rgba, RgbaImage};

use crate::tracker::Rect;

/// アルファ合成（1チャンネル分）
pub fn blend(src: u8, dst: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((src as u32 * a + dst as u32 * (255 - a) + 127) / 255) as u8
}

/// 画像を矩形に最近傍で拡縮し、描画先に入る不透明な画素を `visit(x, y, rgba)` に渡す
///
/// 描画先 `width` x `height` の外と、透明な画素は渡さない。
/// 大きさ0や座標が有限でない矩形は何もしない。
pub fn for_each_scaled_pixel<F>(bitmap: &RgbaImage, rect: Rect, width: usize, height: usize, mut visit: F) -> Result<()>
where
    F: FnMut(usize, usize, [u8; 4]) -> Result<()>,
{
    if !(rect.width > 0.0 && rect.height > 0.0) || bitmap.width() == 0 || bitmap.height() == 0 {
        return Ok(());
    }
    if !(rect.left.is_finite() && rect.top.is_finite() && rect.width.is_finite() && rect.height.is_finite()) {
        return Ok(());
    }

    let x_start = rect.left.max(0.0).floor() as usize;
    let y_start = rect.top.max(0.0).floor() as usize;
    let x_end = ((rect.left + rect.width).ceil().max(0.0) as usize).min(width);
    let y_end = ((rect.top + rect.height).ceil().max(0.0) as usize).min(height);
    let (bw, bh) = bitmap.dimensions();

    for y in y_start..y_end {
        // ピクセル中心でサンプリング
        let v = (y as f32 + 0.5 - rect.top) / rect.height;
        if !(0.0..1.0).contains(&v) {
            continue;
        }
        let sy = ((v * bh as f32) as u32).min(bh - 1);
        for x in x_start..x_end {
            let u = (x as f32 + 0.5 - rect.left) / rect.width;
            if !(0.0..1.0).contains(&u) {
                continue;
            }
            let sx = ((u * bw as f32) as u32).min(bw - 1);
            let Rgba(rgba) = *bitmap.get_pixel(sx, sy);
            if rgba[3] == 0 {
                continue;
            }
            visit(x, y, rgba)?;
        }
    }
    Ok(())
}
