use crate::pool::Rgba;

/// Borrowed RGBA8 frame with clipped, alpha-blended drawing primitives.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: Rgba) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let Some(pixel_offset) = (y as usize)
            .checked_mul(self.width as usize)
            .and_then(|row| row.checked_add(x as usize))
        else {
            return;
        };
        let Some(byte_offset) = pixel_offset.checked_mul(4) else {
            return;
        };
        let Some(pixel) = self.frame.get_mut(byte_offset..byte_offset + 4) else {
            return;
        };

        match color[3] {
            0 => {}
            255 => pixel.copy_from_slice(&color),
            alpha => {
                let alpha = u16::from(alpha);
                for channel in 0..3 {
                    let src = u16::from(color[channel]);
                    let dst = u16::from(pixel[channel]);
                    pixel[channel] = ((src * alpha + dst * (255 - alpha)) / 255) as u8;
                }
                pixel[3] = 255;
            }
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, rect_width: i32, rect_height: i32, color: Rgba) {
        let start_x = x.max(0);
        let start_y = y.max(0);
        let end_x = x.saturating_add(rect_width).min(self.width as i32);
        let end_y = y.saturating_add(rect_height).min(self.height as i32);
        for py in start_y..end_y {
            for px in start_x..end_x {
                self.blend_pixel(px, py, color);
            }
        }
    }

    pub fn rect_outline(&mut self, x: i32, y: i32, rect_width: i32, rect_height: i32, color: Rgba) {
        if rect_width <= 1 || rect_height <= 1 {
            return;
        }
        self.fill_rect(x, y, rect_width, 1, color);
        self.fill_rect(x, y + rect_height - 1, rect_width, 1, color);
        self.fill_rect(x, y + 1, 1, rect_height - 2, color);
        self.fill_rect(x + rect_width - 1, y + 1, 1, rect_height - 2, color);
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba) {
        self.ring(cx, cy, 0.0, radius, color);
    }

    /// Pixels whose centers lie in `inner_radius < d <= outer_radius`.
    pub fn ring(&mut self, cx: f32, cy: f32, inner_radius: f32, outer_radius: f32, color: Rgba) {
        if !(outer_radius > 0.0) || !cx.is_finite() || !cy.is_finite() {
            return;
        }
        let outer_sq = outer_radius * outer_radius;
        let inner_sq = if inner_radius > 0.0 {
            inner_radius * inner_radius
        } else {
            -1.0
        };
        let min_x = (cx - outer_radius).floor().max(0.0) as i32;
        let max_x = (cx + outer_radius).ceil().min(self.width as f32) as i32;
        let min_y = (cy - outer_radius).floor().max(0.0) as i32;
        let max_y = (cy + outer_radius).ceil().min(self.height as f32) as i32;

        for py in min_y..max_y {
            let dy = py as f32 + 0.5 - cy;
            for px in min_x..max_x {
                let dx = px as f32 + 0.5 - cx;
                let distance_sq = dx * dx + dy * dy;
                if distance_sq <= outer_sq && distance_sq > inner_sq {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    pub fn crosshair(&mut self, cx: i32, cy: i32, gap: i32, arm: i32, color: Rgba) {
        self.fill_rect(cx - gap - arm, cy, arm, 1, color);
        self.fill_rect(cx + gap + 1, cy, arm, 1, color);
        self.fill_rect(cx, cy - gap - arm, 1, arm, color);
        self.fill_rect(cx, cy + gap + 1, 1, arm, color);
    }
}

/// `color` with its alpha multiplied by `factor` in [0, 1].
pub fn faded(color: Rgba, factor: f32) -> Rgba {
    let factor = if factor.is_finite() {
        factor.clamp(0.0, 1.0)
    } else {
        0.0
    };
    [
        color[0],
        color[1],
        color[2],
        (f32::from(color[3]) * factor).round() as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = [255, 0, 0, 255];

    fn pixel(frame: &[u8], width: u32, x: usize, y: usize) -> [u8; 4] {
        let offset = (y * width as usize + x) * 4;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn out_of_bounds_writes_are_dropped() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut canvas = Canvas::new(&mut frame, 4, 4);
        canvas.blend_pixel(-1, 0, RED);
        canvas.blend_pixel(4, 0, RED);
        canvas.blend_pixel(0, 4, RED);
        canvas.fill_rect(-10, -10, 5, 5, RED);
        canvas.fill_circle(100.0, 100.0, 10.0, RED);
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn x_past_row_end_does_not_wrap() {
        let mut frame = vec![0u8; 2 * 2 * 4];
        Canvas::new(&mut frame, 2, 2).blend_pixel(2, 0, RED);
        assert_eq!(pixel(&frame, 2, 0, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn half_alpha_blends_toward_source() {
        let mut frame = vec![0u8; 4];
        let mut canvas = Canvas::new(&mut frame, 1, 1);
        canvas.clear([0, 0, 200, 255]);
        canvas.blend_pixel(0, 0, [255, 0, 0, 128]);
        let blended = pixel(&frame, 1, 0, 0);
        assert_eq!(blended[0], 128);
        assert_eq!(blended[2], 99);
        assert_eq!(blended[3], 255);
    }

    #[test]
    fn circle_covers_center_not_corners() {
        let mut frame = vec![0u8; 20 * 20 * 4];
        Canvas::new(&mut frame, 20, 20).fill_circle(10.0, 10.0, 5.0, RED);
        assert_eq!(pixel(&frame, 20, 10, 10), RED);
        assert_eq!(pixel(&frame, 20, 6, 10), RED);
        assert_eq!(pixel(&frame, 20, 0, 0), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 20, 14, 14), [0, 0, 0, 0]);
    }

    #[test]
    fn ring_leaves_the_middle_empty() {
        let mut frame = vec![0u8; 20 * 20 * 4];
        Canvas::new(&mut frame, 20, 20).ring(10.0, 10.0, 4.0, 6.0, RED);
        assert_eq!(pixel(&frame, 20, 10, 10), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 20, 15, 10), RED);
    }

    #[test]
    fn degenerate_shapes_are_ignored() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        let mut canvas = Canvas::new(&mut frame, 8, 8);
        canvas.fill_circle(4.0, 4.0, 0.0, RED);
        canvas.fill_circle(f32::NAN, 4.0, 3.0, RED);
        canvas.rect_outline(2, 2, 1, 5, RED);
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn faded_scales_alpha_only() {
        assert_eq!(faded([10, 20, 30, 200], 0.5), [10, 20, 30, 100]);
        assert_eq!(faded([10, 20, 30, 200], 4.0), [10, 20, 30, 200]);
        assert_eq!(faded([10, 20, 30, 200], f32::NAN)[3], 0);
    }
}
