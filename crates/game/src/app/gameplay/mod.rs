use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reflex_engine::{
    Drill, DrillCommand, DrillWorld, InputSnapshot, Particle, ParticleSpawn, PoolHandle,
    RenderQuality, Target, TargetKind, TargetSpawn, Theme, Vec2,
};
use tracing::{debug, info};

const SPAWN_MARGIN_EXTRA_PX: f32 = 30.0;
const MIN_TARGET_GAP_PX: f32 = 25.0;
const MAX_PLACEMENT_ATTEMPTS: u32 = 30;
const BONUS_POINTS: u32 = 5;
const MOVING_POINTS: u32 = 2;
const NORMAL_POINTS: u32 = 1;
const MOVING_MAX_SPEED_X: f32 = 240.0;
const MOVING_MAX_SPEED_Y: f32 = 180.0;
const PARTICLE_MIN_SPEED: f32 = 80.0;
const PARTICLE_MAX_SPEED: f32 = 260.0;
const PARTICLE_MIN_LIFE_S: f32 = 0.35;
const PARTICLE_MAX_LIFE_S: f32 = 0.7;
const PARTICLE_MIN_SIZE_PX: f32 = 2.0;
const PARTICLE_MAX_SIZE_PX: f32 = 4.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GridshotConfig {
    pub(crate) target_count: usize,
    pub(crate) target_radius: f32,
    pub(crate) target_lifetime_s: f32,
    pub(crate) session_length_s: f32,
    pub(crate) moving_targets: bool,
    pub(crate) bonus_chance: f64,
    pub(crate) moving_chance: f64,
    pub(crate) burst_particles: u32,
    /// Top-left area kept clear of targets so the HUD never covers one.
    pub(crate) hud_exclusion: Vec2,
    pub(crate) seed: Option<u64>,
}

impl Default for GridshotConfig {
    fn default() -> Self {
        Self {
            target_count: 3,
            target_radius: 30.0,
            target_lifetime_s: 1.5,
            session_length_s: 45.0,
            moving_targets: true,
            bonus_chance: 0.1,
            moving_chance: 0.3,
            burst_particles: 12,
            hud_exclusion: Vec2::new(470.0, 330.0),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SessionStats {
    pub(crate) score: u32,
    pub(crate) hits: u32,
    pub(crate) misses: u32,
    pub(crate) expired: u32,
    pub(crate) streak: u32,
    pub(crate) best_streak: u32,
}

impl SessionStats {
    /// Percentage of resolved shots that hit; expired targets count as misses.
    pub(crate) fn accuracy(&self) -> f32 {
        let attempts = self.hits + self.misses;
        if attempts == 0 {
            return 0.0;
        }
        self.hits as f32 / attempts as f32 * 100.0
    }

    fn record_hit(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        self.hits += 1;
        self.streak += 1;
        self.best_streak = self.best_streak.max(self.streak);
    }

    fn record_miss(&mut self) {
        self.misses += 1;
        self.streak = 0;
    }

    fn record_expired(&mut self, count: u32) {
        if count == 0 {
            return;
        }
        self.expired += count;
        self.misses += count;
        self.streak = 0;
    }
}

pub(crate) struct Gridshot {
    config: GridshotConfig,
    theme: Theme,
    rng: StdRng,
    stats: SessionStats,
    finished: bool,
}

impl Gridshot {
    pub(crate) fn new(config: GridshotConfig, theme: Theme) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            theme,
            rng,
            stats: SessionStats::default(),
            finished: false,
        }
    }

    pub(crate) fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    fn start_session(&mut self, world: &mut DrillWorld) {
        world.release_all();
        world.reset_clock();
        self.stats = SessionStats::default();
        self.finished = false;
        self.refill_targets(world);
    }

    fn finish_session(&mut self, world: &mut DrillWorld) {
        self.finished = true;
        world.targets_mut().release_where(|_| true);
        info!(
            score = self.stats.score,
            hits = self.stats.hits,
            misses = self.stats.misses,
            expired = self.stats.expired,
            accuracy = self.stats.accuracy(),
            best_streak = self.stats.best_streak,
            "session_finished"
        );
    }

    fn move_targets(&self, fixed_dt_seconds: f32, world: &mut DrillWorld) {
        let field = world.field_size();
        for (_, target) in world.targets_mut().iter_in_use_mut() {
            if target.kind == TargetKind::Moving {
                target.position = target.position + target.velocity.scaled(fixed_dt_seconds);
                bounce_inside(target, field);
            }
        }
    }

    fn expire_targets(&mut self, world: &mut DrillWorld) {
        let now_s = world.elapsed_s();
        let lifetime_s = self.config.target_lifetime_s;
        let expired = world
            .targets_mut()
            .release_where(|target| target.age_s(now_s) >= lifetime_s);
        if expired > 0 {
            debug!(expired, "targets_expired");
        }
        self.stats.record_expired(expired as u32);
    }

    fn handle_click(&mut self, cursor: Vec2, world: &mut DrillWorld, quality: &RenderQuality) {
        let Some((handle, target)) = nearest_hit(world, cursor) else {
            self.stats.record_miss();
            return;
        };
        world.targets_mut().release(handle);
        self.stats.record_hit(target.points);
        self.spawn_burst(&target, world, quality);
    }

    fn spawn_burst(&mut self, target: &Target, world: &mut DrillWorld, quality: &RenderQuality) {
        let count = quality.particle_budget(self.config.burst_particles);
        let particles = world.particles_mut();
        for _ in 0..count {
            let angle = self.rng.gen_range(0.0..TAU);
            let speed = self.rng.gen_range(PARTICLE_MIN_SPEED..PARTICLE_MAX_SPEED);
            particles.acquire_particle(ParticleSpawn {
                position: target.position,
                velocity: Vec2::new(angle.cos() * speed, angle.sin() * speed),
                life: self.rng.gen_range(PARTICLE_MIN_LIFE_S..PARTICLE_MAX_LIFE_S),
                color: target.color,
                size: self.rng.gen_range(PARTICLE_MIN_SIZE_PX..PARTICLE_MAX_SIZE_PX),
            });
        }
    }

    fn refill_targets(&mut self, world: &mut DrillWorld) {
        while world.targets().in_use_count() < self.config.target_count {
            let spawn = self.roll_target(world);
            world.targets_mut().acquire_target(spawn);
        }
    }

    fn roll_target(&mut self, world: &DrillWorld) -> TargetSpawn {
        let kind = if self.rng.gen_bool(self.config.bonus_chance) {
            TargetKind::Bonus
        } else if self.config.moving_targets && self.rng.gen_bool(self.config.moving_chance) {
            TargetKind::Moving
        } else {
            TargetKind::Normal
        };
        let (points, velocity) = match kind {
            TargetKind::Bonus => (BONUS_POINTS, Vec2::ZERO),
            TargetKind::Moving => (
                MOVING_POINTS,
                Vec2::new(
                    self.rng.gen_range(-MOVING_MAX_SPEED_X..MOVING_MAX_SPEED_X),
                    self.rng.gen_range(-MOVING_MAX_SPEED_Y..MOVING_MAX_SPEED_Y),
                ),
            ),
            TargetKind::Normal => (NORMAL_POINTS, Vec2::ZERO),
        };

        TargetSpawn {
            position: self.place_target(world),
            radius: self.config.target_radius,
            spawn_time_s: world.elapsed_s(),
            kind,
            velocity,
            color: self.theme.target_color(kind),
            points,
        }
    }

    /// Random spot inside the margins, clear of the HUD and of other targets. Falls back to the
    /// first HUD-free candidate when the field is too crowded.
    fn place_target(&mut self, world: &DrillWorld) -> Vec2 {
        let field = world.field_size();
        let radius = self.config.target_radius;
        let margin = radius + SPAWN_MARGIN_EXTRA_PX;
        if field.x <= margin * 2.0 || field.y <= margin * 2.0 {
            return Vec2::new(field.x / 2.0, field.y / 2.0);
        }

        let avoid_hud = field.x - margin > self.config.hud_exclusion.x + radius
            || field.y - margin > self.config.hud_exclusion.y + radius;
        let min_distance = radius * 2.0 + MIN_TARGET_GAP_PX;
        let mut fallback = None;
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let candidate = Vec2::new(
                self.rng.gen_range(margin..field.x - margin),
                self.rng.gen_range(margin..field.y - margin),
            );
            if avoid_hud && self.overlaps_hud(candidate) {
                continue;
            }
            let crowded = world.targets().iter_in_use().any(|(_, other)| {
                other.position.distance_squared(candidate) < min_distance * min_distance
            });
            if !crowded {
                return candidate;
            }
            fallback.get_or_insert(candidate);
        }
        fallback.unwrap_or(Vec2::new(field.x / 2.0, field.y / 2.0))
    }

    fn overlaps_hud(&self, position: Vec2) -> bool {
        let reach = self.config.target_radius;
        position.x - reach < self.config.hud_exclusion.x
            && position.y - reach < self.config.hud_exclusion.y
    }

    fn remaining_s(&self, world: &DrillWorld) -> f32 {
        (self.config.session_length_s - world.elapsed_s()).max(0.0)
    }
}

impl Drill for Gridshot {
    fn load(&mut self, world: &mut DrillWorld) {
        self.start_session(world);
        info!(
            targets = self.config.target_count,
            lifetime_s = self.config.target_lifetime_s,
            session_length_s = self.config.session_length_s,
            "gridshot_loaded"
        );
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut DrillWorld,
        quality: &RenderQuality,
    ) -> DrillCommand {
        if input.quit_requested() {
            return DrillCommand::Quit;
        }
        if input.restart_pressed() {
            info!(score = self.stats.score, "session_restarted");
            self.start_session(world);
            return DrillCommand::None;
        }

        for (_, particle) in world.particles_mut().iter_in_use_mut() {
            particle.integrate(fixed_dt_seconds);
        }
        world.particles_mut().release_where(Particle::is_dead);

        if self.finished {
            return DrillCommand::None;
        }
        if world.elapsed_s() >= self.config.session_length_s {
            self.finish_session(world);
            return DrillCommand::None;
        }

        self.move_targets(fixed_dt_seconds, world);
        self.expire_targets(world);
        if input.left_click_pressed() {
            if let Some(cursor) = input.cursor_position_px() {
                self.handle_click(cursor, world, quality);
            }
        }
        self.refill_targets(world);

        DrillCommand::None
    }

    fn unload(&mut self, world: &mut DrillWorld) {
        let released = world.release_all();
        info!(
            released,
            score = self.stats.score,
            accuracy = self.stats.accuracy(),
            "gridshot_unloaded"
        );
    }

    fn hud_lines(&self, world: &DrillWorld) -> Vec<String> {
        let stats = self.stats();
        let mut lines = vec![
            format!("SCORE: {}", stats.score),
            format!(
                "ACC: {:.1}%  HITS: {}  MISS: {}",
                stats.accuracy(),
                stats.hits,
                stats.misses
            ),
            format!("STREAK: {}  BEST: {}", stats.streak, stats.best_streak),
        ];
        if self.is_finished() {
            lines.push("SESSION OVER - R TO RESTART".to_string());
        } else {
            lines.push(format!("TIME: {:.1}", self.remaining_s(world)));
        }
        lines
    }
}

fn nearest_hit(world: &DrillWorld, cursor: Vec2) -> Option<(PoolHandle, Target)> {
    world
        .targets()
        .iter_in_use()
        .filter(|(_, target)| target.contains(cursor))
        .min_by(|(_, a), (_, b)| {
            a.position
                .distance_squared(cursor)
                .total_cmp(&b.position.distance_squared(cursor))
        })
        .map(|(handle, target)| (handle, *target))
}

fn bounce_inside(target: &mut Target, field: Vec2) {
    let radius = target.radius;
    if target.position.x - radius < 0.0 {
        target.position.x = radius;
        target.velocity.x = target.velocity.x.abs();
    } else if target.position.x + radius > field.x {
        target.position.x = field.x - radius;
        target.velocity.x = -target.velocity.x.abs();
    }
    if target.position.y - radius < 0.0 {
        target.position.y = radius;
        target.velocity.y = target.velocity.y.abs();
    } else if target.position.y + radius > field.y {
        target.position.y = field.y - radius;
        target.velocity.y = -target.velocity.y.abs();
    }
}

#[cfg(test)]
mod tests;
