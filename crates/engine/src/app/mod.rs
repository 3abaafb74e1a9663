mod drill;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod theme;

pub use drill::{Drill, DrillCommand, DrillWorld, WorldPoolStats};
pub use input::{InputSnapshot, QualityRequest};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::{fps_from_frame_interval, LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{faded, Canvas, Renderer, Viewport};
pub use theme::Theme;

pub(crate) use rendering::OverlayData;
