use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::{DrillWorld, Theme};
use crate::pool::{Target, Vec2};
use crate::quality::RenderQuality;

use super::overlay::{draw_overlay, OverlayData};
use super::raster::{faded, Canvas};
use super::Viewport;

const GLOW_RING_WIDTH_PX: f32 = 8.0;
const GLOW_INNER_RING_WIDTH_PX: f32 = 3.0;
const SPAWN_PULSE_SECONDS: f32 = 0.18;
const SPAWN_PULSE_START_SCALE: f32 = 0.55;
const EFFECT_CORE_RADIUS_FRACTION: f32 = 0.3;
const MIN_PARTICLE_SIZE_PX: f32 = 1.0;
const CROSSHAIR_GAP_PX: i32 = 6;
const CROSSHAIR_ARM_PX: i32 = 10;

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_frame(
        &mut self,
        world: &DrillWorld,
        quality: &RenderQuality,
        theme: &Theme,
        cursor_px: Option<Vec2>,
        overlay: Option<&OverlayData>,
    ) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        let mut canvas = Canvas::new(
            self.pixels.frame_mut(),
            self.viewport.width,
            self.viewport.height,
        );
        draw_scene(&mut canvas, world, quality, theme);
        if let Some(cursor) = cursor_px {
            canvas.crosshair(
                cursor.x.round() as i32,
                cursor.y.round() as i32,
                CROSSHAIR_GAP_PX,
                CROSSHAIR_ARM_PX,
                theme.crosshair,
            );
        }
        if let Some(data) = overlay {
            draw_overlay(&mut canvas, data, theme);
        }

        self.pixels.render()
    }
}

pub(crate) fn draw_scene(
    canvas: &mut Canvas<'_>,
    world: &DrillWorld,
    quality: &RenderQuality,
    theme: &Theme,
) {
    canvas.clear(theme.background);

    let now_s = world.elapsed_s();
    for (_, target) in world.targets().iter_in_use() {
        draw_target(canvas, target, now_s, quality, theme);
    }

    if quality.draw_particles() {
        for (_, particle) in world.particles().iter_in_use() {
            let life = particle.life_fraction();
            if life <= 0.0 {
                continue;
            }
            let size = (particle.size * life).max(MIN_PARTICLE_SIZE_PX);
            canvas.fill_circle(
                particle.position.x,
                particle.position.y,
                size,
                faded(particle.color, life),
            );
        }
    }
}

fn draw_target(
    canvas: &mut Canvas<'_>,
    target: &Target,
    now_s: f32,
    quality: &RenderQuality,
    theme: &Theme,
) {
    let radius = target.radius * spawn_scale(target.age_s(now_s), quality.animate());
    let Vec2 { x, y } = target.position;

    if quality.draw_glow() {
        canvas.ring(x, y, radius, radius + GLOW_RING_WIDTH_PX, theme.glow);
        canvas.ring(
            x,
            y,
            radius,
            radius + GLOW_INNER_RING_WIDTH_PX,
            faded(target.color, 0.6),
        );
    }
    canvas.fill_circle(x, y, radius, target.color);
    if quality.effects() {
        canvas.fill_circle(
            x,
            y,
            radius * EFFECT_CORE_RADIUS_FRACTION,
            theme.target_rim,
        );
    }
}

/// Grows fresh targets in over the first few frames; static when animations are off.
fn spawn_scale(age_s: f32, animate: bool) -> f32 {
    if !animate || age_s >= SPAWN_PULSE_SECONDS {
        return 1.0;
    }
    let progress = (age_s / SPAWN_PULSE_SECONDS).clamp(0.0, 1.0);
    SPAWN_PULSE_START_SCALE + (1.0 - SPAWN_PULSE_START_SCALE) * progress
}
