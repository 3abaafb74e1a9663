mod monitor;
mod report;
mod window;

pub use monitor::{
    performance_score, FrameSample, MonitorConfig, PerformanceMetrics, PerformanceMonitor,
    Suggestion,
};
pub use report::{PerformanceReport, ReportError};
pub use window::{RollingWindow, WindowSummary, DEFAULT_WINDOW_CAPACITY};
