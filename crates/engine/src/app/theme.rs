use crate::pool::{Rgba, TargetKind};

/// Palette handed to every draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    pub background: Rgba,
    pub target: Rgba,
    pub target_bonus: Rgba,
    pub target_moving: Rgba,
    pub target_rim: Rgba,
    pub glow: Rgba,
    pub accent: Rgba,
    pub crosshair: Rgba,
    pub text_primary: Rgba,
    pub text_dim: Rgba,
    pub panel_background: Rgba,
    pub panel_border: Rgba,
}

impl Theme {
    pub const DEFAULT: Theme = Theme {
        name: "default",
        background: [8, 12, 20, 255],
        target: [255, 70, 70, 255],
        target_bonus: [255, 215, 0, 255],
        target_moving: [255, 150, 50, 255],
        target_rim: [255, 255, 255, 255],
        glow: [255, 110, 110, 90],
        accent: [64, 224, 160, 255],
        crosshair: [255, 255, 255, 255],
        text_primary: [220, 230, 240, 255],
        text_dim: [150, 170, 190, 255],
        panel_background: [20, 25, 35, 215],
        panel_border: [64, 224, 160, 255],
    };

    pub const fn target_color(&self, kind: TargetKind) -> Rgba {
        match kind {
            TargetKind::Normal => self.target,
            TargetKind::Bonus => self.target_bonus,
            TargetKind::Moving => self.target_moving,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::DEFAULT
    }
}
