use serde::Serialize;

use crate::config::PoolConfig;
use crate::pool::{ParticlePool, PoolStats, TargetPool, Vec2};
use crate::quality::RenderQuality;

use super::InputSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrillCommand {
    None,
    Quit,
}

/// A playable mode. The loop owns the [`DrillWorld`] and lends it out every tick.
pub trait Drill {
    fn load(&mut self, world: &mut DrillWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut DrillWorld,
        quality: &RenderQuality,
    ) -> DrillCommand;
    fn unload(&mut self, world: &mut DrillWorld);
    fn hud_lines(&self, _world: &DrillWorld) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorldPoolStats {
    pub targets: PoolStats,
    pub particles: PoolStats,
}

/// Pools, session clock and play-field size shared between a drill and the renderer.
#[derive(Debug)]
pub struct DrillWorld {
    targets: TargetPool,
    particles: ParticlePool,
    elapsed_s: f32,
    field_width: f32,
    field_height: f32,
}

impl Default for DrillWorld {
    fn default() -> Self {
        Self::new(PoolConfig::default(), 1400, 900)
    }
}

impl DrillWorld {
    pub fn new(pools: PoolConfig, field_width: u32, field_height: u32) -> Self {
        Self {
            targets: TargetPool::with_prewarm(pools.target_prewarm),
            particles: ParticlePool::with_prewarm(pools.particle_prewarm),
            elapsed_s: 0.0,
            field_width: field_width as f32,
            field_height: field_height as f32,
        }
    }

    pub fn targets(&self) -> &TargetPool {
        &self.targets
    }

    pub fn targets_mut(&mut self) -> &mut TargetPool {
        &mut self.targets
    }

    pub fn particles(&self) -> &ParticlePool {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticlePool {
        &mut self.particles
    }

    /// Both pools at once, for code that moves data from one to the other.
    pub fn pools_mut(&mut self) -> (&mut TargetPool, &mut ParticlePool) {
        (&mut self.targets, &mut self.particles)
    }

    pub fn elapsed_s(&self) -> f32 {
        self.elapsed_s
    }

    pub fn advance_clock(&mut self, dt_seconds: f32) {
        self.elapsed_s += dt_seconds.max(0.0);
    }

    pub fn reset_clock(&mut self) {
        self.elapsed_s = 0.0;
    }

    pub fn field_size(&self) -> Vec2 {
        Vec2::new(self.field_width, self.field_height)
    }

    pub fn set_field_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.field_width = width as f32;
        self.field_height = height as f32;
    }

    /// Returns every live entity to its pool; slots stay allocated.
    pub fn release_all(&mut self) -> usize {
        self.targets.release_where(|_| true) + self.particles.release_where(|_| true)
    }

    pub fn pool_stats(&self) -> WorldPoolStats {
        WorldPoolStats {
            targets: self.targets.stats(),
            particles: self.particles.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{TargetKind, TargetSpawn};

    fn spawn_at(x: f32, y: f32) -> TargetSpawn {
        TargetSpawn {
            position: Vec2::new(x, y),
            radius: 20.0,
            spawn_time_s: 0.0,
            kind: TargetKind::Normal,
            velocity: Vec2::ZERO,
            color: [255, 70, 70, 255],
            points: 1,
        }
    }

    #[test]
    fn world_uses_configured_prewarm() {
        let world = DrillWorld::new(
            PoolConfig {
                target_prewarm: 8,
                particle_prewarm: 32,
            },
            640,
            480,
        );
        let stats = world.pool_stats();
        assert_eq!(stats.targets.total, 8);
        assert_eq!(stats.particles.available, 32);
        assert_eq!(world.field_size(), Vec2::new(640.0, 480.0));
    }

    #[test]
    fn release_all_empties_both_pools_without_shrinking() {
        let mut world = DrillWorld::new(PoolConfig::default(), 640, 480);
        world.targets_mut().acquire_target(spawn_at(10.0, 10.0));
        world.targets_mut().acquire_target(spawn_at(50.0, 50.0));
        world.particles_mut().acquire();

        assert_eq!(world.release_all(), 3);
        let stats = world.pool_stats();
        assert_eq!(stats.targets.in_use, 0);
        assert_eq!(stats.particles.in_use, 0);
        assert_eq!(stats.targets.total, 50);
    }

    #[test]
    fn clock_ignores_negative_steps_and_resets() {
        let mut world = DrillWorld::default();
        world.advance_clock(0.5);
        world.advance_clock(-3.0);
        assert!((world.elapsed_s() - 0.5).abs() < f32::EPSILON);
        world.reset_clock();
        assert_eq!(world.elapsed_s(), 0.0);
    }

    #[test]
    fn zero_field_size_is_ignored() {
        let mut world = DrillWorld::new(PoolConfig::default(), 640, 480);
        world.set_field_size(0, 300);
        assert_eq!(world.field_size(), Vec2::new(640.0, 480.0));
    }
}
