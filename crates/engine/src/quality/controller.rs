use serde::{Deserialize, Serialize};
use tracing::info;

use super::settings::{OptimizationLevel, RenderSettings, SettingsOverlay};
use super::tier::QualityTier;
use crate::perf::{PerformanceMetrics, PerformanceMonitor};

const DEFAULT_CONTROL_TICK_FRAMES: u32 = 120;
const DEFAULT_RECOVERY_RATIO: f32 = 0.9;
const DEFAULT_TIER_DOWNGRADE_FPS: f32 = 30.0;
const DEFAULT_TIER_UPGRADE_FPS: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub auto_optimize: bool,
    pub control_tick_frames: u32,
    /// Fraction of the target fps the average must exceed before a level is recovered.
    pub recovery_ratio: f32,
    pub tier_downgrade_fps: f32,
    pub tier_upgrade_fps: f32,
    pub initial_tier: QualityTier,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            auto_optimize: false,
            control_tick_frames: DEFAULT_CONTROL_TICK_FRAMES,
            recovery_ratio: DEFAULT_RECOVERY_RATIO,
            tier_downgrade_fps: DEFAULT_TIER_DOWNGRADE_FPS,
            tier_upgrade_fps: DEFAULT_TIER_UPGRADE_FPS,
            initial_tier: QualityTier::Ultra,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelChange {
    Escalated,
    Recovered,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptimizationInfo {
    pub level: OptimizationLevel,
    pub auto_optimize: bool,
    pub overlay: SettingsOverlay,
    pub performance_score: f32,
}

/// Hysteresis over the optimization level plus the coarser tier selector.
///
/// Both move at most one step per control tick; the level reacts to
/// [`PerformanceMonitor::should_reduce_quality`], the tier to raw average fps.
#[derive(Debug, Clone)]
pub struct QualityController {
    config: QualityConfig,
    auto_optimize: bool,
    level: OptimizationLevel,
    tier: QualityTier,
}

impl Default for QualityController {
    fn default() -> Self {
        Self::new(QualityConfig::default())
    }
}

impl QualityController {
    pub fn new(config: QualityConfig) -> Self {
        Self {
            auto_optimize: config.auto_optimize,
            level: OptimizationLevel::NONE,
            tier: config.initial_tier,
            config,
        }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    pub fn current_level(&self) -> OptimizationLevel {
        self.level
    }

    pub fn current_tier(&self) -> QualityTier {
        self.tier
    }

    pub fn auto_optimize_enabled(&self) -> bool {
        self.auto_optimize
    }

    pub fn enable_auto_optimization(&mut self) {
        if !self.auto_optimize {
            info!("auto_optimization_enabled");
        }
        self.auto_optimize = true;
    }

    pub fn disable_auto_optimization(&mut self) {
        if self.auto_optimize {
            info!("auto_optimization_disabled");
        }
        self.auto_optimize = false;
    }

    /// Manual tier override; switches automatic optimization off.
    pub fn set_quality_level(&mut self, tier: QualityTier) {
        info!(from = %self.tier, to = %tier, "quality_tier_overridden");
        self.tier = tier;
        self.disable_auto_optimization();
    }

    /// Runs one hysteresis step and returns `current` with the level's overlay applied.
    ///
    /// With auto optimization off the input comes back untouched.
    pub fn update(
        &mut self,
        monitor: &PerformanceMonitor,
        current: &RenderSettings,
    ) -> RenderSettings {
        if !self.auto_optimize {
            return *current;
        }
        self.step_level(monitor);
        self.level.overlay().apply(current)
    }

    /// Overlay for the current level applied to `current`, without stepping.
    pub fn apply_current_overlay(&self, current: &RenderSettings) -> RenderSettings {
        if !self.auto_optimize {
            return *current;
        }
        self.level.overlay().apply(current)
    }

    fn step_level(&mut self, monitor: &PerformanceMonitor) -> LevelChange {
        let avg_fps = monitor.metrics().avg_fps;
        let recovery_floor = monitor.target_fps() * self.config.recovery_ratio;

        let (next, change) = if monitor.should_reduce_quality() {
            match self.level.escalated() {
                Some(next) => (next, LevelChange::Escalated),
                None => (self.level, LevelChange::Unchanged),
            }
        } else if avg_fps > recovery_floor {
            match self.level.recovered() {
                Some(next) => (next, LevelChange::Recovered),
                None => (self.level, LevelChange::Unchanged),
            }
        } else {
            (self.level, LevelChange::Unchanged)
        };

        if change != LevelChange::Unchanged {
            info!(
                from = self.level.get(),
                to = next.get(),
                avg_fps,
                ?change,
                "quality_level_changed"
            );
        }
        self.level = next;
        change
    }

    /// Coarse tier step: down below the downgrade fps, up above the upgrade fps.
    ///
    /// Returns the new tier when it changed.
    pub fn update_tier(&mut self, metrics: &PerformanceMetrics) -> Option<QualityTier> {
        if !self.auto_optimize || metrics.sample_count == 0 {
            return None;
        }

        let avg_fps = metrics.avg_fps;
        let next = if avg_fps < self.config.tier_downgrade_fps {
            self.tier.lower()
        } else if avg_fps > self.config.tier_upgrade_fps {
            self.tier.higher()
        } else {
            None
        }?;

        info!(from = %self.tier, to = %next, avg_fps, "quality_tier_changed");
        self.tier = next;
        Some(next)
    }

    pub fn optimization_info(&self, metrics: &PerformanceMetrics) -> OptimizationInfo {
        OptimizationInfo {
            level: self.level,
            auto_optimize: self.auto_optimize,
            overlay: self.level.overlay(),
            performance_score: metrics.performance_score,
        }
    }
}

/// Frame counter that fires on every `interval`-th frame.
#[derive(Debug, Clone, Copy)]
pub struct ControlCadence {
    interval: u32,
    frames: u64,
}

impl ControlCadence {
    pub fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            frames: 0,
        }
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn advance(&mut self) -> bool {
        self.frames = self.frames.saturating_add(1);
        self.frames % u64::from(self.interval) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perf::{FrameSample, MonitorConfig};

    fn auto_controller() -> QualityController {
        QualityController::new(QualityConfig {
            auto_optimize: true,
            ..QualityConfig::default()
        })
    }

    fn monitor_at(fps: f32, frames: usize) -> PerformanceMonitor {
        let mut monitor = PerformanceMonitor::new(MonitorConfig {
            target_fps: 144.0,
            window_capacity: 60,
            ..MonitorConfig::default()
        });
        for _ in 0..frames {
            monitor.record_sample(FrameSample {
                frame_time_ms: 1000.0 / fps,
                fps,
            });
        }
        monitor
    }

    #[test]
    fn slow_full_window_escalates_one_level_with_overlay() {
        let mut controller = auto_controller();
        let monitor = monitor_at(20.0, 60);
        let input = RenderSettings {
            particles_enabled: true,
            ..RenderSettings::default()
        };

        let output = controller.update(&monitor, &input);

        assert_eq!(controller.current_level(), OptimizationLevel::new(1));
        assert!(output.particles_enabled);
        assert!((output.particle_count_multiplier - 0.8).abs() < f32::EPSILON);
        assert!(output.glow_effects);
        assert_eq!(output.reduce_animations, input.reduce_animations);
    }

    #[test]
    fn disabled_auto_mode_returns_input_unchanged() {
        let mut controller = QualityController::default();
        let monitor = monitor_at(20.0, 60);
        let input = RenderSettings::default();

        assert_eq!(controller.update(&monitor, &input), input);
        assert_eq!(controller.current_level(), OptimizationLevel::NONE);
    }

    #[test]
    fn level_saturates_at_max() {
        let mut controller = auto_controller();
        let monitor = monitor_at(10.0, 60);
        for _ in 0..10 {
            controller.update(&monitor, &RenderSettings::default());
        }
        assert_eq!(controller.current_level(), OptimizationLevel::MAX);
    }

    #[test]
    fn recovery_requires_sustained_good_performance() {
        let mut controller = auto_controller();
        let slow = monitor_at(20.0, 60);
        controller.update(&slow, &RenderSettings::default());
        controller.update(&slow, &RenderSettings::default());
        assert_eq!(controller.current_level(), OptimizationLevel::new(2));

        // Not bad enough to degrade, not good enough to recover.
        let middling = monitor_at(100.0, 60);
        controller.update(&middling, &RenderSettings::default());
        assert_eq!(controller.current_level(), OptimizationLevel::new(2));

        let fast = monitor_at(140.0, 60);
        controller.update(&fast, &RenderSettings::default());
        assert_eq!(controller.current_level(), OptimizationLevel::new(1));
        let restored = controller.update(&fast, &RenderSettings::default());
        assert_eq!(controller.current_level(), OptimizationLevel::NONE);
        assert_eq!(restored, RenderSettings::default());
    }

    #[test]
    fn level_moves_at_most_one_step_per_tick() {
        let mut controller = auto_controller();
        let monitors = [
            monitor_at(10.0, 60),
            monitor_at(140.0, 60),
            monitor_at(20.0, 10),
            monitor_at(24.0, 60),
            monitor_at(200.0, 60),
            monitor_at(60.0, 60),
        ];
        let pattern = [0usize, 0, 3, 1, 0, 0, 0, 4, 2, 5, 1, 1, 3, 0, 4, 4, 4, 1];

        for index in pattern {
            let before = controller.current_level().get() as i16;
            controller.update(&monitors[index], &RenderSettings::default());
            let after = controller.current_level().get() as i16;
            assert!((after - before).abs() <= 1);
        }
    }

    #[test]
    fn tier_steps_one_at_a_time() {
        let mut controller = auto_controller();
        let slow = *monitor_at(20.0, 5).metrics();

        assert_eq!(controller.update_tier(&slow), Some(QualityTier::High));
        assert_eq!(controller.update_tier(&slow), Some(QualityTier::Medium));
        assert_eq!(controller.update_tier(&slow), Some(QualityTier::Low));
        assert_eq!(controller.update_tier(&slow), None);
        assert_eq!(controller.current_tier(), QualityTier::Low);

        let fast = *monitor_at(90.0, 5).metrics();
        assert_eq!(controller.update_tier(&fast), Some(QualityTier::Medium));

        let between = *monitor_at(45.0, 5).metrics();
        assert_eq!(controller.update_tier(&between), None);
        assert_eq!(controller.current_tier(), QualityTier::Medium);
    }

    #[test]
    fn tier_ignores_empty_metrics() {
        let mut controller = auto_controller();
        let empty = *PerformanceMonitor::default().metrics();
        assert_eq!(controller.update_tier(&empty), None);
    }

    #[test]
    fn manual_override_sets_tier_and_disables_auto_mode() {
        let mut controller = auto_controller();
        controller.set_quality_level(QualityTier::Medium);

        assert_eq!(controller.current_tier(), QualityTier::Medium);
        assert!(!controller.auto_optimize_enabled());

        let slow = *monitor_at(20.0, 60).metrics();
        assert_eq!(controller.update_tier(&slow), None);

        controller.enable_auto_optimization();
        assert!(controller.auto_optimize_enabled());
        assert_eq!(controller.update_tier(&slow), Some(QualityTier::Low));
    }

    #[test]
    fn optimization_info_reports_level_overlay() {
        let mut controller = auto_controller();
        let monitor = monitor_at(20.0, 60);
        controller.update(&monitor, &RenderSettings::default());
        let info = controller.optimization_info(monitor.metrics());

        assert_eq!(info.level, OptimizationLevel::new(1));
        assert!(info.auto_optimize);
        assert_eq!(info.overlay.particle_count_multiplier, Some(0.8));
    }

    #[test]
    fn cadence_fires_on_every_interval_frame() {
        let mut cadence = ControlCadence::new(120);
        let fired: Vec<u64> = (1..=360u64).filter(|_| cadence.advance()).collect();
        assert_eq!(fired.len(), 3);
        assert_eq!(cadence.frames(), 360);
    }

    #[test]
    fn cadence_interval_is_at_least_one() {
        let mut cadence = ControlCadence::new(0);
        assert_eq!(cadence.interval(), 1);
        assert!(cadence.advance());
        assert!(cadence.advance());
    }
}
