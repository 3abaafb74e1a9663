use std::time::{Instant, SystemTime, UNIX_EPOCH};

use super::controller::{ControlCadence, QualityConfig, QualityController};
use super::settings::{OptimizationLevel, RenderQuality, RenderSettings};
use super::tier::QualityTier;
use crate::perf::{MonitorConfig, PerformanceMonitor, PerformanceReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlTick {
    pub level: OptimizationLevel,
    pub tier: QualityTier,
    pub level_changed: bool,
    pub tier_changed: bool,
}

/// Frame-loop facade: owns the monitor, the controller and the control cadence, and keeps
/// the caller's base settings apart from the effective settings derived from them.
#[derive(Debug, Clone)]
pub struct AdaptiveQuality {
    monitor: PerformanceMonitor,
    controller: QualityController,
    cadence: ControlCadence,
    base_settings: RenderSettings,
    effective_settings: RenderSettings,
}

impl Default for AdaptiveQuality {
    fn default() -> Self {
        Self::new(
            MonitorConfig::default(),
            QualityConfig::default(),
            RenderSettings::default(),
        )
    }
}

impl AdaptiveQuality {
    pub fn new(
        monitor_config: MonitorConfig,
        quality_config: QualityConfig,
        base_settings: RenderSettings,
    ) -> Self {
        let base_settings = base_settings.sanitized();
        Self {
            monitor: PerformanceMonitor::new(monitor_config),
            cadence: ControlCadence::new(quality_config.control_tick_frames),
            controller: QualityController::new(quality_config),
            base_settings,
            effective_settings: base_settings,
        }
    }

    pub fn start_frame(&mut self) {
        self.monitor.start_frame();
    }

    pub fn start_frame_at(&mut self, now: Instant) {
        self.monitor.start_frame_at(now);
    }

    pub fn end_frame(&mut self, measured_fps: f32) -> Option<ControlTick> {
        self.end_frame_at(Instant::now(), measured_fps)
    }

    /// Closes the frame and, on a control tick, re-evaluates level and tier.
    pub fn end_frame_at(&mut self, now: Instant, measured_fps: f32) -> Option<ControlTick> {
        self.monitor.end_frame_at(now, measured_fps);
        if !self.cadence.advance() {
            return None;
        }
        Some(self.run_control_tick())
    }

    fn run_control_tick(&mut self) -> ControlTick {
        let level_before = self.controller.current_level();
        self.effective_settings = self
            .controller
            .update(&self.monitor, &self.base_settings);
        let tier_changed = self
            .controller
            .update_tier(self.monitor.metrics())
            .is_some();
        let level = self.controller.current_level();

        ControlTick {
            level,
            tier: self.controller.current_tier(),
            level_changed: level != level_before,
            tier_changed,
        }
    }

    pub fn render_quality(&self) -> RenderQuality {
        RenderQuality::new(self.controller.current_tier(), self.effective_settings)
    }

    pub fn base_settings(&self) -> &RenderSettings {
        &self.base_settings
    }

    pub fn effective_settings(&self) -> &RenderSettings {
        &self.effective_settings
    }

    pub fn set_base_settings(&mut self, settings: RenderSettings) {
        self.base_settings = settings.sanitized();
        self.effective_settings = self.controller.apply_current_overlay(&self.base_settings);
    }

    pub fn set_quality_level(&mut self, tier: QualityTier) {
        self.controller.set_quality_level(tier);
        self.effective_settings = self.base_settings;
    }

    pub fn enable_auto_optimization(&mut self) {
        self.controller.enable_auto_optimization();
        self.effective_settings = self.controller.apply_current_overlay(&self.base_settings);
    }

    pub fn disable_auto_optimization(&mut self) {
        self.controller.disable_auto_optimization();
        self.effective_settings = self.base_settings;
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    pub fn controller(&self) -> &QualityController {
        &self.controller
    }

    pub fn frames_observed(&self) -> u64 {
        self.cadence.frames()
    }

    pub fn report(&self) -> PerformanceReport {
        let generated_at_unix_s = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or(0.0);
        PerformanceReport::capture(&self.monitor, &self.controller, generated_at_unix_s)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn auto_system(control_tick_frames: u32) -> AdaptiveQuality {
        AdaptiveQuality::new(
            MonitorConfig::default(),
            QualityConfig {
                auto_optimize: true,
                control_tick_frames,
                ..QualityConfig::default()
            },
            RenderSettings::default(),
        )
    }

    fn run_frames(
        system: &mut AdaptiveQuality,
        frames: usize,
        fps: f32,
        base: Instant,
    ) -> Vec<ControlTick> {
        let frame = Duration::from_secs_f32(1.0 / fps);
        let mut ticks = Vec::new();
        for index in 0..frames {
            let start = base + frame * index as u32;
            system.start_frame_at(start);
            if let Some(tick) = system.end_frame_at(start + frame, fps) {
                ticks.push(tick);
            }
        }
        ticks
    }

    #[test]
    fn control_tick_runs_on_cadence_only() {
        let mut system = auto_system(120);
        let ticks = run_frames(&mut system, 240, 144.0, Instant::now());
        assert_eq!(ticks.len(), 2);
        assert_eq!(system.frames_observed(), 240);
    }

    #[test]
    fn sustained_low_fps_degrades_one_level_per_tick() {
        let mut system = auto_system(60);
        let ticks = run_frames(&mut system, 180, 20.0, Instant::now());

        let levels: Vec<u8> = ticks.iter().map(|tick| tick.level.get()).collect();
        assert_eq!(levels, vec![1, 2, 3]);
        assert!(ticks.iter().all(|tick| tick.level_changed));
        assert_eq!(ticks[0].tier, QualityTier::High);
        assert_eq!(system.controller().current_tier(), QualityTier::Low);

        let effective = system.effective_settings();
        assert!((effective.particle_count_multiplier - 0.4).abs() < f32::EPSILON);
        assert!(!effective.glow_effects);
        assert!(!system.render_quality().draw_particles());
    }

    #[test]
    fn recovery_restores_base_settings() {
        let mut system = auto_system(60);
        let base = Instant::now();
        run_frames(&mut system, 60, 20.0, base);
        assert_eq!(system.controller().current_level().get(), 1);

        run_frames(&mut system, 60, 144.0, base + Duration::from_secs(10));
        assert_eq!(system.controller().current_level().get(), 0);
        assert_eq!(system.effective_settings(), system.base_settings());
    }

    #[test]
    fn manual_tier_override_freezes_automatic_changes() {
        let mut system = auto_system(60);
        system.set_quality_level(QualityTier::High);
        let ticks = run_frames(&mut system, 120, 20.0, Instant::now());

        assert!(ticks.iter().all(|tick| !tick.level_changed && !tick.tier_changed));
        assert_eq!(system.render_quality().tier, QualityTier::High);
        assert_eq!(system.effective_settings(), &RenderSettings::default());
    }

    #[test]
    fn base_settings_changes_keep_current_overlay() {
        let mut system = auto_system(60);
        run_frames(&mut system, 60, 20.0, Instant::now());

        system.set_base_settings(RenderSettings {
            reduce_animations: true,
            ..RenderSettings::default()
        });

        let effective = system.effective_settings();
        assert!(effective.reduce_animations);
        assert!((effective.particle_count_multiplier - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn disabling_auto_mode_drops_the_overlay() {
        let mut system = auto_system(60);
        run_frames(&mut system, 60, 20.0, Instant::now());
        system.disable_auto_optimization();
        assert_eq!(system.effective_settings(), system.base_settings());

        system.enable_auto_optimization();
        assert!((system.effective_settings().particle_count_multiplier - 0.8).abs() < 0.0001);
    }
}
