use crate::pool::Vec2;
use crate::quality::QualityTier;

/// One simulation tick's worth of input. Press flags are edges and are seen by exactly one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    cursor_position_px: Option<Vec2>,
    left_click_pressed: bool,
    restart_pressed: bool,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        cursor_position_px: Option<Vec2>,
        left_click_pressed: bool,
        restart_pressed: bool,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            cursor_position_px,
            left_click_pressed,
            restart_pressed,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn left_click_pressed(&self) -> bool {
        self.left_click_pressed
    }

    pub fn restart_pressed(&self) -> bool {
        self.restart_pressed
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_left_click_pressed(mut self, left_click_pressed: bool) -> Self {
        self.left_click_pressed = left_click_pressed;
        self
    }

    pub fn with_restart_pressed(mut self, restart_pressed: bool) -> Self {
        self.restart_pressed = restart_pressed;
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }
}

/// Frame-level requests consumed by the loop itself rather than by the drill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityRequest {
    ForceTier(QualityTier),
    ResumeAuto,
}

pub(crate) fn tier_for_digit(digit: u8) -> Option<QualityTier> {
    match digit {
        1 => Some(QualityTier::Ultra),
        2 => Some(QualityTier::High),
        3 => Some(QualityTier::Medium),
        4 => Some(QualityTier::Low),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_map_best_to_worst() {
        assert_eq!(tier_for_digit(1), Some(QualityTier::Ultra));
        assert_eq!(tier_for_digit(4), Some(QualityTier::Low));
        assert_eq!(tier_for_digit(0), None);
        assert_eq!(tier_for_digit(5), None);
    }

    #[test]
    fn builder_sets_cursor_and_click() {
        let snapshot = InputSnapshot::empty()
            .with_cursor_position_px(Some(Vec2::new(4.0, 5.0)))
            .with_left_click_pressed(true)
            .with_window_size(800, 600);

        assert!(snapshot.left_click_pressed());
        assert!(!snapshot.restart_pressed());
        assert_eq!(snapshot.cursor_position_px(), Some(Vec2::new(4.0, 5.0)));
        assert_eq!(snapshot.window_size(), (800, 600));
    }
}
