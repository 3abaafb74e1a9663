use serde::{Deserialize, Serialize};

use super::{EntityPool, PoolHandle, Pooled};

pub type Rgba = [u8; 4];

const TARGET_DEFAULT_COLOR: Rgba = [255, 70, 70, 255];
const PARTICLE_DEFAULT_COLOR: Rgba = [255, 255, 255, 255];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[default]
    Normal,
    Bonus,
    Moving,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub position: Vec2,
    pub radius: f32,
    pub spawn_time_s: f32,
    pub hit: bool,
    pub kind: TargetKind,
    pub velocity: Vec2,
    pub color: Rgba,
    pub points: u32,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            radius: 0.0,
            spawn_time_s: 0.0,
            hit: false,
            kind: TargetKind::Normal,
            velocity: Vec2::ZERO,
            color: TARGET_DEFAULT_COLOR,
            points: 1,
        }
    }
}

impl Pooled for Target {}

impl Target {
    pub fn contains(&self, point: Vec2) -> bool {
        self.position.distance_squared(point) <= self.radius * self.radius
    }

    pub fn age_s(&self, now_s: f32) -> f32 {
        (now_s - self.spawn_time_s).max(0.0)
    }
}

/// Everything a drill decides when it places a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSpawn {
    pub position: Vec2,
    pub radius: f32,
    pub spawn_time_s: f32,
    pub kind: TargetKind,
    pub velocity: Vec2,
    pub color: Rgba,
    pub points: u32,
}

pub type TargetPool = EntityPool<Target>;

impl EntityPool<Target> {
    pub fn acquire_target(&mut self, spawn: TargetSpawn) -> PoolHandle {
        let handle = self.acquire();
        if let Some(target) = self.get_mut(handle) {
            *target = Target {
                position: spawn.position,
                radius: spawn.radius,
                spawn_time_s: spawn.spawn_time_s,
                hit: false,
                kind: spawn.kind,
                velocity: spawn.velocity,
                color: spawn.color,
                points: spawn.points,
            };
        }
        handle
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub life: f32,
    pub max_life: f32,
    pub color: Rgba,
    pub size: f32,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            life: 0.0,
            max_life: 0.0,
            color: PARTICLE_DEFAULT_COLOR,
            size: 0.0,
        }
    }
}

impl Pooled for Particle {}

impl Particle {
    pub fn is_dead(&self) -> bool {
        self.life <= 0.0
    }

    /// Remaining life in [0, 1]; zero for particles that never had any.
    pub fn life_fraction(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        (self.life / self.max_life).clamp(0.0, 1.0)
    }

    pub fn integrate(&mut self, dt_seconds: f32) {
        self.position = self.position + self.velocity.scaled(dt_seconds);
        self.life -= dt_seconds;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSpawn {
    pub position: Vec2,
    pub velocity: Vec2,
    pub life: f32,
    pub color: Rgba,
    pub size: f32,
}

pub type ParticlePool = EntityPool<Particle>;

impl EntityPool<Particle> {
    pub fn acquire_particle(&mut self, spawn: ParticleSpawn) -> PoolHandle {
        let handle = self.acquire();
        if let Some(particle) = self.get_mut(handle) {
            *particle = Particle {
                position: spawn.position,
                velocity: spawn.velocity,
                life: spawn.life,
                max_life: spawn.life,
                color: spawn.color,
                size: spawn.size,
            };
        }
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bonus_spawn() -> TargetSpawn {
        TargetSpawn {
            position: Vec2::new(120.0, 80.0),
            radius: 24.0,
            spawn_time_s: 3.5,
            kind: TargetKind::Bonus,
            velocity: Vec2::new(10.0, -5.0),
            color: [255, 215, 0, 255],
            points: 5,
        }
    }

    #[test]
    fn acquire_target_writes_every_field() {
        let mut pool = TargetPool::with_prewarm(2);
        let handle = pool.acquire_target(bonus_spawn());
        let target = pool.get(handle).copied().expect("live target");

        assert_eq!(target.position, Vec2::new(120.0, 80.0));
        assert_eq!(target.kind, TargetKind::Bonus);
        assert_eq!(target.points, 5);
        assert_eq!(target.color, [255, 215, 0, 255]);
        assert!(!target.hit);
    }

    #[test]
    fn released_target_slot_comes_back_neutral() {
        let mut pool = TargetPool::with_prewarm(1);
        let handle = pool.acquire_target(bonus_spawn());
        if let Some(target) = pool.get_mut(handle) {
            target.hit = true;
        }
        assert!(pool.release(handle));

        let reused = pool.acquire();
        assert_eq!(reused.index(), handle.index());
        let target = pool.get(reused).copied().expect("live target");
        assert_eq!(target, Target::default());
        assert_eq!(target.color, [255, 70, 70, 255]);
        assert_eq!(target.points, 1);
        assert_eq!(target.kind, TargetKind::Normal);
    }

    #[test]
    fn target_hit_test_includes_the_rim() {
        let target = Target {
            position: Vec2::new(10.0, 10.0),
            radius: 5.0,
            ..Target::default()
        };
        assert!(target.contains(Vec2::new(15.0, 10.0)));
        assert!(target.contains(Vec2::new(12.0, 12.0)));
        assert!(!target.contains(Vec2::new(15.1, 10.0)));
    }

    #[test]
    fn particles_age_and_expire() {
        let mut pool = ParticlePool::with_prewarm(4);
        let handle = pool.acquire_particle(ParticleSpawn {
            position: Vec2::ZERO,
            velocity: Vec2::new(100.0, 0.0),
            life: 0.5,
            color: [255, 255, 0, 255],
            size: 3.0,
        });

        for (_, particle) in pool.iter_in_use_mut() {
            particle.integrate(0.25);
        }
        let particle = pool.get(handle).copied().expect("live particle");
        assert!((particle.position.x - 25.0).abs() < 1e-4);
        assert!((particle.life_fraction() - 0.5).abs() < 1e-4);

        for (_, particle) in pool.iter_in_use_mut() {
            particle.integrate(0.3);
        }
        assert_eq!(pool.release_where(Particle::is_dead), 1);
        assert_eq!(pool.in_use_count(), 0);
    }

    #[test]
    fn default_particle_is_white_and_dead() {
        let particle = Particle::default();
        assert_eq!(particle.color, [255, 255, 255, 255]);
        assert!(particle.is_dead());
        assert_eq!(particle.life_fraction(), 0.0);
    }
}
