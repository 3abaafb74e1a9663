mod adaptive;
mod controller;
mod settings;
mod tier;

pub use adaptive::{AdaptiveQuality, ControlTick};
pub use controller::{
    ControlCadence, LevelChange, OptimizationInfo, QualityConfig, QualityController,
};
pub use settings::{
    overlay_for_level, OptimizationLevel, RenderQuality, RenderSettings, SettingKey,
    SettingsOverlay,
};
pub use tier::{ParseTierError, QualityTier, TierCapabilities};
