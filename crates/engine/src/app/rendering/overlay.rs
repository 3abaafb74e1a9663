use crate::app::drill::WorldPoolStats;
use crate::app::{LoopMetricsSnapshot, Theme};
use crate::quality::RenderQuality;

use super::raster::Canvas;

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
const TEXT_SCALE: i32 = 3;
const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;
const LINE_ADVANCE: i32 = (GLYPH_HEIGHT + 2) * TEXT_SCALE;
const OVERLAY_PADDING: i32 = 6 * TEXT_SCALE;
const OVERLAY_PANEL_INSET_X: i32 = 4 * TEXT_SCALE;
const OVERLAY_PANEL_INSET_Y: i32 = 3 * TEXT_SCALE;
const PERF_SECTION_LABEL: &str = "PERF";
const QUALITY_SECTION_LABEL: &str = "QUALITY";
const DRILL_SECTION_LABEL: &str = "DRILL";
const HINT_PREFIX: &str = "HINT: ";

#[derive(Debug, Clone)]
pub(crate) struct OverlayData {
    pub metrics: LoopMetricsSnapshot,
    pub render_fps_cap: Option<u32>,
    pub slow_frame_delay_ms: u64,
    pub quality: RenderQuality,
    pub auto_optimize: bool,
    pub pools: WorldPoolStats,
    pub suggestions: Vec<String>,
    pub drill_lines: Vec<String>,
}

pub(crate) fn draw_overlay(canvas: &mut Canvas<'_>, data: &OverlayData, theme: &Theme) {
    if canvas.width() == 0 || canvas.height() == 0 {
        return;
    }

    let lines = build_overlay_lines(data);
    let longest_line_chars = lines
        .iter()
        .map(|line| line.chars().count() as i32)
        .max()
        .unwrap_or(0);
    let panel_width = longest_line_chars * GLYPH_ADVANCE + OVERLAY_PANEL_INSET_X * 2;
    let panel_height = lines.len() as i32 * LINE_ADVANCE + OVERLAY_PANEL_INSET_Y * 2;
    let panel_left = OVERLAY_PADDING - OVERLAY_PANEL_INSET_X;
    let panel_top = OVERLAY_PADDING - OVERLAY_PANEL_INSET_Y;
    canvas.fill_rect(
        panel_left,
        panel_top,
        panel_width,
        panel_height,
        theme.panel_background,
    );
    canvas.rect_outline(
        panel_left,
        panel_top,
        panel_width,
        panel_height,
        theme.panel_border,
    );

    let mut y = OVERLAY_PADDING;
    for line in &lines {
        let color = if is_section_label(line) {
            theme.text_dim
        } else if line.starts_with(HINT_PREFIX) {
            theme.accent
        } else {
            theme.text_primary
        };
        draw_text(canvas, OVERLAY_PADDING, y, line, color);
        y += LINE_ADVANCE;
    }
}

fn build_overlay_lines(data: &OverlayData) -> Vec<String> {
    let quality = &data.quality;
    let mut lines = vec![
        PERF_SECTION_LABEL.to_string(),
        format_fps_line(
            data.metrics.fps,
            data.render_fps_cap,
            data.slow_frame_delay_ms,
        ),
        format!("TPS: {:.1}", data.metrics.tps),
        format!("FRAME: {:.2} MS", data.metrics.frame_time_ms),
        format!("SCORE: {:.0}", data.metrics.performance_score),
        String::new(),
        QUALITY_SECTION_LABEL.to_string(),
        format!(
            "TIER: {}  LVL: {}  AUTO: {}",
            quality.tier,
            data.metrics.optimization_level,
            on_off(data.auto_optimize)
        ),
        format!(
            "PARTICLES: {} X{:.2}  GLOW: {}",
            on_off(quality.draw_particles()),
            quality.settings.particle_count_multiplier,
            on_off(quality.draw_glow())
        ),
        format!(
            "ANIM: {}  FX: {}",
            on_off(quality.animate()),
            on_off(quality.effects())
        ),
        format!(
            "POOL TGT {}/{}  PRT {}/{}",
            data.pools.targets.in_use,
            data.pools.targets.total,
            data.pools.particles.in_use,
            data.pools.particles.total
        ),
    ];

    if !data.drill_lines.is_empty() {
        lines.push(String::new());
        lines.push(DRILL_SECTION_LABEL.to_string());
        lines.extend(data.drill_lines.iter().cloned());
    }
    if !data.suggestions.is_empty() {
        lines.push(String::new());
        lines.extend(
            data.suggestions
                .iter()
                .map(|suggestion| format!("{HINT_PREFIX}{suggestion}")),
        );
    }

    lines
}

fn is_section_label(line: &str) -> bool {
    matches!(
        line,
        PERF_SECTION_LABEL | QUALITY_SECTION_LABEL | DRILL_SECTION_LABEL
    )
}

fn on_off(value: bool) -> &'static str {
    if value {
        "ON"
    } else {
        "OFF"
    }
}

fn format_fps_line(current_fps: f32, cap: Option<u32>, slow_frame_delay_ms: u64) -> String {
    let cap_text = match cap {
        Some(value) => value.to_string(),
        None => "inf".to_string(),
    };
    format!(
        "[{:.0} / {}] dbg+{}ms",
        current_fps, cap_text, slow_frame_delay_ms
    )
}

pub(crate) fn draw_text(canvas: &mut Canvas<'_>, mut x: i32, y: i32, text: &str, color: [u8; 4]) {
    for ch in text.chars() {
        if let Some(bits) = glyph_bits(ch) {
            draw_glyph(canvas, x, y, bits, color);
        }
        x += GLYPH_ADVANCE;
    }
}

fn draw_glyph(canvas: &mut Canvas<'_>, x: i32, y: i32, bits: u16, color: [u8; 4]) {
    for row in 0..GLYPH_HEIGHT {
        let row_bits = (bits >> ((GLYPH_HEIGHT - 1 - row) * GLYPH_WIDTH)) & 0b111;
        for col in 0..GLYPH_WIDTH {
            if row_bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                continue;
            }
            canvas.fill_rect(
                x + col * TEXT_SCALE,
                y + row * TEXT_SCALE,
                TEXT_SCALE,
                TEXT_SCALE,
                color,
            );
        }
    }
}

/// 3x5 glyphs packed row-major, top row in the highest bits. Lowercase shares the uppercase
/// shapes; space and anything unknown draw nothing.
fn glyph_bits(ch: char) -> Option<u16> {
    let bits = match ch.to_ascii_uppercase() {
        '0' => 0x7b6f,
        '1' => 0x2c97,
        '2' => 0x73e7,
        '3' => 0x73cf,
        '4' => 0x5bc9,
        '5' => 0x79cf,
        '6' => 0x79ef,
        '7' => 0x7292,
        '8' => 0x7bef,
        '9' => 0x7bcf,
        'A' => 0x2bed,
        'B' => 0x6bae,
        'C' => 0x7927,
        'D' => 0x6b6e,
        'E' => 0x79a7,
        'F' => 0x79a4,
        'G' => 0x796f,
        'H' => 0x5bed,
        'I' => 0x7497,
        'J' => 0x726f,
        'K' => 0x5bad,
        'L' => 0x4927,
        'M' => 0x5fed,
        'N' => 0x5ffd,
        'O' => 0x7b6f,
        'P' => 0x6ba4,
        'Q' => 0x7b79,
        'R' => 0x6bad,
        'S' => 0x79cf,
        'T' => 0x7492,
        'U' => 0x5b6f,
        'V' => 0x5b6a,
        'W' => 0x5bfd,
        'X' => 0x5aad,
        'Y' => 0x5a92,
        'Z' => 0x72a7,
        '.' => 0x0002,
        ',' => 0x0014,
        ':' => 0x0410,
        '/' => 0x12a4,
        '%' => 0x52a5,
        '-' => 0x01c0,
        '+' => 0x05d0,
        '(' => 0x1491,
        ')' => 0x4494,
        '[' => 0x6926,
        ']' => 0x324b,
        '|' => 0x2492,
        '_' => 0x0007,
        '=' => 0x0e38,
        '<' => 0x1511,
        '>' => 0x4454,
        '#' => 0x5f7d,
        '!' => 0x2482,
        _ => return None,
    };
    Some(bits)
}
