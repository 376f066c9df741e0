use image::RgbImage;

/// オーバーレイ描画の基本命令
pub trait Canvas {
    /// 塗りつぶし円
    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: u32);

    /// 線分
    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: u32);
}

/// 表示面: サイズと再描画要求を持つ
pub trait DisplaySurface: Canvas {
    fn size(&self) -> (u32, u32);

    fn request_redraw(&mut self);
}

/// ソフトウェア描画用の 0RGB バッファ
pub struct FrameBuffer {
    buffer: Vec<u32>,
    width: usize,
    height: usize,
    redraw_requested: bool,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            buffer: vec![0u32; width * height],
            width,
            height,
            redraw_requested: false,
        }
    }

    pub fn pixels(&self) -> &[u32] {
        &self.buffer
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buffer[y * self.width + x])
    }

    /// RGB 画像を背景として描画（サイズが違う場合は左上を基準にクロップ）
    pub fn draw_image(&mut self, image: &RgbImage) {
        let (img_w, img_h) = image.dimensions();
        for y in 0..self.height.min(img_h as usize) {
            for x in 0..self.width.min(img_w as usize) {
                let [r, g, b] = image.get_pixel(x as u32, y as u32).0;
                self.buffer[y * self.width + x] = ((r as u32) << 16) | ((g as u32) << 8) | b as u32;
            }
        }
    }

    /// 再描画要求を読み出してクリア
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    /// Bresenhamのアルゴリズムで1ピクセル幅の線を描画
    fn bresenham(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, mut plot: impl FnMut(&mut Self, i32, i32)) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let mut x = x0;
        let mut y = y0;

        loop {
            plot(self, x, y);

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

    /// 中心 (cx, cy) の円を塗る。バッファ外の部分は走査しない。
    fn stamp(&mut self, cx: i32, cy: i32, radius: i32, color: u32) {
        let x_min = cx.saturating_sub(radius).max(0);
        let x_max = cx.saturating_add(radius).min(self.width as i32 - 1);
        let y_min = cy.saturating_sub(radius).max(0);
        let y_max = cy.saturating_add(radius).min(self.height as i32 - 1);
        if x_min > x_max || y_min > y_max {
            return;
        }

        let r2 = radius as i64 * radius as i64;
        for y in y_min..=y_max {
            let dy = y as i64 - cy as i64;
            for x in x_min..=x_max {
                let dx = x as i64 - cx as i64;
                if (dx * dx).saturating_add(dy * dy) <= r2 {
                    self.buffer[y as usize * self.width + x as usize] = color;
                }
            }
        }
    }

    /// ピクセルをセット（境界チェック付き）
    fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize * self.width + x as usize] = color;
        }
    }
}

/// Liang-Barsky で線分を矩形 [min, max] に切り詰める。矩形と交わらなければ None。
fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    min: (f64, f64),
    max: (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    for (p, q) in [
        (-dx, from.0 - min.0),
        (dx, max.0 - from.0),
        (-dy, from.1 - min.1),
        (dy, max.1 - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((
        (from.0 + t0 * dx, from.1 + t0 * dy),
        (from.0 + t1 * dx, from.1 + t1 * dy),
    ))
}

fn is_finite_point(p: (f32, f32)) -> bool {
    p.0.is_finite() && p.1.is_finite()
}

impl Canvas for FrameBuffer {
    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: u32) {
        if !is_finite_point(center) || !radius.is_finite() || radius < 0.0 {
            return;
        }
        let radius = radius.round();
        let (w, h) = (self.width as f32, self.height as f32);
        // 外接矩形がバッファと交わらなければ何もしない
        if center.0 + radius < 0.0
            || center.1 + radius < 0.0
            || center.0 - radius >= w
            || center.1 - radius >= h
        {
            return;
        }
        self.stamp(
            center.0.round() as i32,
            center.1.round() as i32,
            radius as i32,
            color,
        );
    }

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: u32) {
        if !is_finite_point(from) || !is_finite_point(to) || self.width == 0 || self.height == 0 {
            return;
        }
        let half = if width.is_finite() {
            (width / 2.0).floor().clamp(0.0, (self.width + self.height) as f32) as i32
        } else {
            0
        };

        // 線の太さぶん広げた表示範囲に切り詰めてから走査する
        let margin = half as f64;
        let Some((a, b)) = clip_segment(
            (from.0 as f64, from.1 as f64),
            (to.0 as f64, to.1 as f64),
            (-margin, -margin),
            (
                self.width as f64 - 1.0 + margin,
                self.height as f64 - 1.0 + margin,
            ),
        ) else {
            return;
        };

        self.bresenham(
            a.0.round() as i32,
            a.1.round() as i32,
            b.0.round() as i32,
            b.1.round() as i32,
            |fb, x, y| {
                if half > 0 {
                    fb.stamp(x, y, half, color);
                } else {
                    fb.set_pixel(x, y, color);
                }
            },
        );
    }
}

impl DisplaySurface for FrameBuffer {
    fn size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }

    fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_circle_is_clipped() {
        let mut fb = FrameBuffer::new(10, 10);
        fb.fill_circle((0.0, 0.0), 3.0, 0xFF0000);
        assert_eq!(fb.pixel(0, 0), Some(0xFF0000));
        assert_eq!(fb.pixel(3, 0), Some(0xFF0000));
        assert_eq!(fb.pixel(3, 3), Some(0));
    }

    #[test]
    fn test_draw_line_covers_endpoints() {
        let mut fb = FrameBuffer::new(20, 20);
        fb.draw_line((2.0, 2.0), (17.0, 9.0), 1.0, 0xFFFFFF);
        assert_eq!(fb.pixel(2, 2), Some(0xFFFFFF));
        assert_eq!(fb.pixel(17, 9), Some(0xFFFFFF));
        assert_eq!(fb.pixel(2, 17), Some(0));
    }

    #[test]
    fn test_thick_line() {
        let mut fb = FrameBuffer::new(20, 20);
        fb.draw_line((5.0, 10.0), (15.0, 10.0), 4.0, 0x00FF00);
        assert_eq!(fb.pixel(10, 8), Some(0x00FF00));
        assert_eq!(fb.pixel(10, 12), Some(0x00FF00));
        assert_eq!(fb.pixel(10, 14), Some(0));
    }

    #[test]
    fn test_offscreen_circle_is_ignored() {
        let mut fb = FrameBuffer::new(10, 10);
        fb.fill_circle((f32::MAX, 10.0), 8.0, 1);
        fb.fill_circle((-f32::MAX, -f32::MAX), 8.0, 1);
        fb.fill_circle((200_000.0, 5.0), 8.0, 1);
        fb.fill_circle((f32::NAN, 5.0), 8.0, 1);
        fb.fill_circle((5.0, 5.0), f32::INFINITY, 1);
        assert!(fb.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_circle_partly_outside_is_clipped() {
        let mut fb = FrameBuffer::new(10, 10);
        fb.fill_circle((12.0, 5.0), 3.0, 0xFF0000);
        assert_eq!(fb.pixel(9, 5), Some(0xFF0000));
        assert_eq!(fb.pixel(8, 5), Some(0));
    }

    #[test]
    fn test_line_to_far_point_is_clipped() {
        let mut fb = FrameBuffer::new(640, 480);
        let started = std::time::Instant::now();
        fb.draw_line((320.0, 240.0), (128_000_000.0, 240.0), 4.0, 0xFFFFFF);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));

        // 画面内の部分だけが描かれる
        assert_eq!(fb.pixel(320, 240), Some(0xFFFFFF));
        assert_eq!(fb.pixel(639, 240), Some(0xFFFFFF));
        assert_eq!(fb.pixel(100, 240), Some(0));
    }

    #[test]
    fn test_line_outside_surface_draws_nothing() {
        let mut fb = FrameBuffer::new(20, 20);
        fb.draw_line((-100.0, -5.0), (100.0, -5.0), 4.0, 0xFFFFFF);
        fb.draw_line((f32::MAX, -50.0), (-f32::MAX, -50.0), 4.0, 0xFFFFFF);
        fb.draw_line((f32::NAN, 0.0), (5.0, 5.0), 4.0, 0xFFFFFF);
        assert!(fb.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_draw_image_packs_rgb() {
        let mut fb = FrameBuffer::new(2, 2);
        let image = RgbImage::from_pixel(4, 4, image::Rgb([0x12, 0x34, 0x56]));
        fb.draw_image(&image);
        assert!(fb.pixels().iter().all(|&p| p == 0x123456));
    }

    #[test]
    fn test_redraw_request_is_taken_once() {
        let mut fb = FrameBuffer::new(1, 1);
        assert!(!fb.take_redraw_request());
        fb.request_redraw();
        assert!(fb.take_redraw_request());
        assert!(!fb.take_redraw_request());
    }
}
