use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::window::{RollingWindow, DEFAULT_WINDOW_CAPACITY};

const DEFAULT_TARGET_FPS: f32 = 144.0;
const DEFAULT_LOW_FPS_THRESHOLD: f32 = 30.0;
const DEFAULT_CRITICAL_FPS_THRESHOLD: f32 = 25.0;
const DEFAULT_HIGH_FRAME_TIME_THRESHOLD_MS: f32 = 1000.0 / 30.0;
const FRAME_TIME_PENALTY_DIVISOR: f32 = 10.0;
const SPIKE_FACTOR: f32 = 2.0;
const PACING_VARIANCE_LIMIT: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub window_capacity: usize,
    pub target_fps: f32,
    pub low_fps_threshold: f32,
    pub critical_fps_threshold: f32,
    pub high_frame_time_threshold_ms: f32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            target_fps: DEFAULT_TARGET_FPS,
            low_fps_threshold: DEFAULT_LOW_FPS_THRESHOLD,
            critical_fps_threshold: DEFAULT_CRITICAL_FPS_THRESHOLD,
            high_frame_time_threshold_ms: DEFAULT_HIGH_FRAME_TIME_THRESHOLD_MS,
        }
    }
}

impl MonitorConfig {
    pub fn frame_budget_ms(&self) -> f32 {
        1000.0 / self.target_fps
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSample {
    pub frame_time_ms: f32,
    pub fps: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub avg_frame_time_ms: f32,
    pub min_frame_time_ms: f32,
    pub max_frame_time_ms: f32,
    pub avg_fps: f32,
    pub min_fps: f32,
    pub frame_time_variance: f32,
    pub performance_score: f32,
    pub sample_count: usize,
}

impl PerformanceMetrics {
    /// Metrics reported before any frame has been sampled: the target is assumed to be met.
    pub fn neutral(config: &MonitorConfig) -> Self {
        let budget_ms = config.frame_budget_ms();
        Self {
            avg_frame_time_ms: budget_ms,
            min_frame_time_ms: budget_ms,
            max_frame_time_ms: budget_ms,
            avg_fps: config.target_fps,
            min_fps: config.target_fps,
            frame_time_variance: 0.0,
            performance_score: 100.0,
            sample_count: 0,
        }
    }
}

/// Composite 0..=100 score: the fps ratio against the target, minus one point per 10 ms
/// that the worst frame overshoots the high frame-time threshold.
pub fn performance_score(
    avg_fps: f32,
    max_frame_time_ms: f32,
    target_fps: f32,
    high_frame_time_threshold_ms: f32,
) -> f32 {
    let fps_ratio = if target_fps > 0.0 {
        (avg_fps / target_fps).min(1.0)
    } else {
        1.0
    };
    let overshoot_ms = (max_frame_time_ms - high_frame_time_threshold_ms).max(0.0);
    let penalty = overshoot_ms / FRAME_TIME_PENALTY_DIVISOR;
    let score = fps_ratio * 100.0 - penalty;
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suggestion {
    ReduceEffects,
    LowerResolution,
    FrameTimeSpikes,
    InconsistentPacing,
}

impl Suggestion {
    const ALL: [Suggestion; 4] = [
        Suggestion::ReduceEffects,
        Suggestion::LowerResolution,
        Suggestion::FrameTimeSpikes,
        Suggestion::InconsistentPacing,
    ];

    fn applies(self, metrics: &PerformanceMetrics, config: &MonitorConfig) -> bool {
        match self {
            Suggestion::ReduceEffects | Suggestion::LowerResolution => {
                metrics.avg_fps < config.low_fps_threshold
            }
            Suggestion::FrameTimeSpikes => {
                metrics.max_frame_time_ms > config.high_frame_time_threshold_ms * SPIKE_FACTOR
            }
            Suggestion::InconsistentPacing => metrics.frame_time_variance > PACING_VARIANCE_LIMIT,
        }
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Suggestion::ReduceEffects => "Consider reducing particle count or visual effects",
            Suggestion::LowerResolution => "Lower screen resolution if possible",
            Suggestion::FrameTimeSpikes => {
                "Frame time spikes detected - check for expensive operations"
            }
            Suggestion::InconsistentPacing => "Inconsistent frame times - consider frame pacing",
        };
        f.write_str(text)
    }
}

/// Rolling frame statistics for the main loop.
///
/// `start_frame` and `end_frame` must alternate on the loop thread. A second `start_frame`
/// before `end_frame` simply moves the start timestamp forward.
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    config: MonitorConfig,
    frame_times_ms: RollingWindow,
    fps_history: RollingWindow,
    frame_start: Option<Instant>,
    metrics: PerformanceMetrics,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

impl PerformanceMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            frame_times_ms: RollingWindow::with_capacity(config.window_capacity),
            fps_history: RollingWindow::with_capacity(config.window_capacity),
            frame_start: None,
            metrics: PerformanceMetrics::neutral(&config),
            config,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn target_fps(&self) -> f32 {
        self.config.target_fps
    }

    pub fn start_frame(&mut self) {
        self.start_frame_at(Instant::now());
    }

    pub fn start_frame_at(&mut self, now: Instant) {
        self.frame_start = Some(now);
    }

    pub fn end_frame(&mut self, measured_fps: f32) {
        self.end_frame_at(Instant::now(), measured_fps);
    }

    pub fn end_frame_at(&mut self, now: Instant, measured_fps: f32) {
        let Some(start) = self.frame_start.take() else {
            trace!("end_frame_without_start");
            return;
        };
        let frame_time_ms = now.saturating_duration_since(start).as_secs_f32() * 1000.0;
        self.record_sample(FrameSample {
            frame_time_ms,
            fps: measured_fps,
        });
    }

    /// Appends a sample timed outside the monitor and recomputes the metrics.
    pub fn record_sample(&mut self, sample: FrameSample) {
        self.frame_times_ms.push(sample.frame_time_ms);
        self.fps_history.push(sample.fps);
        self.metrics = self.compute_metrics();
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    pub fn frame_times(&self) -> &RollingWindow {
        &self.frame_times_ms
    }

    pub fn fps_history(&self) -> &RollingWindow {
        &self.fps_history
    }

    pub fn sample_count(&self) -> usize {
        self.fps_history.len()
    }

    /// True only for a fully populated window whose average sits under both fps thresholds.
    pub fn should_reduce_quality(&self) -> bool {
        let avg_fps = self.metrics.avg_fps;
        self.fps_history.is_full()
            && avg_fps < self.config.low_fps_threshold
            && avg_fps < self.config.critical_fps_threshold
    }

    pub fn optimization_suggestions(&self) -> impl Iterator<Item = Suggestion> + '_ {
        Suggestion::ALL
            .into_iter()
            .filter(move |suggestion| suggestion.applies(&self.metrics, &self.config))
    }

    pub fn reset(&mut self) {
        self.frame_times_ms.clear();
        self.fps_history.clear();
        self.frame_start = None;
        self.metrics = PerformanceMetrics::neutral(&self.config);
    }

    fn compute_metrics(&self) -> PerformanceMetrics {
        let (Some(frame_times), Some(fps)) =
            (self.frame_times_ms.summary(), self.fps_history.summary())
        else {
            return PerformanceMetrics::neutral(&self.config);
        };

        PerformanceMetrics {
            avg_frame_time_ms: frame_times.mean,
            min_frame_time_ms: frame_times.min,
            max_frame_time_ms: frame_times.max,
            avg_fps: fps.mean,
            min_fps: fps.min,
            frame_time_variance: frame_times.variance,
            performance_score: performance_score(
                fps.mean,
                frame_times.max,
                self.config.target_fps,
                self.config.high_frame_time_threshold_ms,
            ),
            sample_count: self.fps_history.len(),
        }
    }
}
