use reflex_engine::{PoolConfig, QualityTier, RenderSettings};

use super::*;

const FIELD_WIDTH: u32 = 1400;
const FIELD_HEIGHT: u32 = 900;

fn calm_config() -> GridshotConfig {
    GridshotConfig {
        target_count: 1,
        bonus_chance: 0.0,
        moving_targets: false,
        seed: Some(7),
        ..GridshotConfig::default()
    }
}

fn loaded(config: GridshotConfig) -> (Gridshot, DrillWorld) {
    let mut world = DrillWorld::new(PoolConfig::default(), FIELD_WIDTH, FIELD_HEIGHT);
    let mut drill = Gridshot::new(config, Theme::default());
    drill.load(&mut world);
    (drill, world)
}

fn only_target(world: &DrillWorld) -> Target {
    let targets: Vec<Target> = world.targets().iter_in_use().map(|(_, t)| *t).collect();
    assert_eq!(targets.len(), 1);
    targets[0]
}

fn click_at(position: Vec2) -> InputSnapshot {
    InputSnapshot::empty()
        .with_left_click_pressed(true)
        .with_cursor_position_px(Some(position))
        .with_window_size(FIELD_WIDTH, FIELD_HEIGHT)
}

fn tick(drill: &mut Gridshot, world: &mut DrillWorld, dt: f32, input: &InputSnapshot) {
    world.advance_clock(dt);
    let command = drill.update(dt, input, world, &RenderQuality::default());
    assert_eq!(command, DrillCommand::None);
}

#[test]
fn load_fills_the_field() {
    let (drill, world) = loaded(GridshotConfig {
        seed: Some(1),
        ..GridshotConfig::default()
    });

    assert_eq!(world.targets().in_use_count(), 3);
    assert_eq!(*drill.stats(), SessionStats::default());
    assert!(!drill.is_finished());
}

#[test]
fn hit_scores_releases_and_bursts() {
    let (mut drill, mut world) = loaded(calm_config());
    let target = only_target(&world);

    tick(&mut drill, &mut world, 0.01, &click_at(target.position));

    let stats = drill.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.score, 1);
    assert_eq!(stats.streak, 1);
    assert_eq!(world.particles().in_use_count(), 12);
    assert_eq!(world.targets().in_use_count(), 1);
    assert_ne!(only_target(&world).spawn_time_s, target.spawn_time_s);
}

#[test]
fn miss_resets_streak() {
    let (mut drill, mut world) = loaded(calm_config());
    let target = only_target(&world);
    tick(&mut drill, &mut world, 0.01, &click_at(target.position));
    assert_eq!(drill.stats().streak, 1);

    tick(&mut drill, &mut world, 0.01, &click_at(Vec2::new(1.0, 1.0)));

    let stats = drill.stats();
    assert_eq!(stats.streak, 0);
    assert_eq!(stats.best_streak, 1);
    assert_eq!(stats.misses, 1);
    assert!((stats.accuracy() - 50.0).abs() < 0.001);
}

#[test]
fn click_without_cursor_is_ignored() {
    let (mut drill, mut world) = loaded(calm_config());
    let input = InputSnapshot::empty().with_left_click_pressed(true);

    tick(&mut drill, &mut world, 0.01, &input);

    assert_eq!(drill.stats().hits + drill.stats().misses, 0);
}

#[test]
fn low_tier_hit_spawns_no_particles() {
    let (mut drill, mut world) = loaded(calm_config());
    let target = only_target(&world);
    let quality = RenderQuality::new(QualityTier::Low, RenderSettings::default());

    drill.update(0.01, &click_at(target.position), &mut world, &quality);

    assert_eq!(drill.stats().hits, 1);
    assert_eq!(world.particles().in_use_count(), 0);
}

#[test]
fn nearest_overlapping_target_wins() {
    let mut world = DrillWorld::new(PoolConfig::default(), FIELD_WIDTH, FIELD_HEIGHT);
    let spawn = |x: f32| TargetSpawn {
        position: Vec2::new(x, 100.0),
        radius: 30.0,
        spawn_time_s: 0.0,
        kind: TargetKind::Normal,
        velocity: Vec2::ZERO,
        color: [255, 70, 70, 255],
        points: 1,
    };
    let far = world.targets_mut().acquire_target(spawn(100.0));
    let near = world.targets_mut().acquire_target(spawn(120.0));

    let (handle, _) = nearest_hit(&world, Vec2::new(115.0, 100.0)).expect("hit");
    assert_eq!(handle, near);
    assert_ne!(handle, far);
    assert!(nearest_hit(&world, Vec2::new(400.0, 400.0)).is_none());
}

#[test]
fn expired_targets_count_as_misses_and_refill() {
    let (mut drill, mut world) = loaded(GridshotConfig {
        target_count: 3,
        target_lifetime_s: 1.0,
        ..calm_config()
    });

    tick(&mut drill, &mut world, 1.0, &InputSnapshot::empty());

    let stats = drill.stats();
    assert_eq!(stats.expired, 3);
    assert_eq!(stats.misses, 3);
    assert_eq!(world.targets().in_use_count(), 3);
    for (_, target) in world.targets().iter_in_use() {
        assert_eq!(target.spawn_time_s, 1.0);
    }
}

#[test]
fn dead_particles_are_returned_to_the_pool() {
    let (mut drill, mut world) = loaded(GridshotConfig {
        target_lifetime_s: 10.0,
        ..calm_config()
    });
    let target = only_target(&world);
    tick(&mut drill, &mut world, 0.01, &click_at(target.position));
    assert_eq!(world.particles().in_use_count(), 12);

    tick(&mut drill, &mut world, 1.0, &InputSnapshot::empty());

    assert_eq!(world.particles().in_use_count(), 0);
    assert!(world.particles().available_count() >= 12);
}

#[test]
fn session_ends_and_restart_resets() {
    let (mut drill, mut world) = loaded(GridshotConfig {
        session_length_s: 2.0,
        target_lifetime_s: 10.0,
        ..calm_config()
    });
    let target = only_target(&world);
    tick(&mut drill, &mut world, 0.01, &click_at(target.position));

    tick(&mut drill, &mut world, 2.0, &InputSnapshot::empty());
    assert!(drill.is_finished());
    assert_eq!(world.targets().in_use_count(), 0);
    assert!(drill
        .hud_lines(&world)
        .iter()
        .any(|line| line.starts_with("SESSION OVER")));

    tick(&mut drill, &mut world, 0.01, &click_at(Vec2::new(1.0, 1.0)));
    assert_eq!(drill.stats().misses, 0);

    let restart = InputSnapshot::empty().with_restart_pressed(true);
    tick(&mut drill, &mut world, 0.01, &restart);
    assert!(!drill.is_finished());
    assert_eq!(*drill.stats(), SessionStats::default());
    assert_eq!(world.elapsed_s(), 0.0);
    assert_eq!(world.targets().in_use_count(), 1);
}

#[test]
fn bonus_targets_are_worth_five() {
    let (drill, world) = loaded(GridshotConfig {
        target_count: 4,
        bonus_chance: 1.0,
        ..calm_config()
    });

    for (_, target) in world.targets().iter_in_use() {
        assert_eq!(target.kind, TargetKind::Bonus);
        assert_eq!(target.points, 5);
        assert_eq!(target.color, drill.theme.target_bonus);
    }
}

#[test]
fn moving_targets_get_bounded_velocity() {
    let (_, world) = loaded(GridshotConfig {
        target_count: 4,
        moving_targets: true,
        moving_chance: 1.0,
        ..calm_config()
    });

    for (_, target) in world.targets().iter_in_use() {
        assert_eq!(target.kind, TargetKind::Moving);
        assert_eq!(target.points, 2);
        assert!(target.velocity.x.abs() <= MOVING_MAX_SPEED_X);
        assert!(target.velocity.y.abs() <= MOVING_MAX_SPEED_Y);
    }
}

#[test]
fn moving_target_bounces_off_edges() {
    let mut target = Target {
        position: Vec2::new(-5.0, 895.0),
        radius: 20.0,
        velocity: Vec2::new(-100.0, 50.0),
        kind: TargetKind::Moving,
        ..Target::default()
    };

    bounce_inside(&mut target, Vec2::new(1400.0, 900.0));

    assert_eq!(target.position, Vec2::new(20.0, 880.0));
    assert_eq!(target.velocity, Vec2::new(100.0, -50.0));
}

#[test]
fn placement_respects_margins_and_hud() {
    let config = GridshotConfig {
        target_count: 6,
        seed: Some(42),
        ..GridshotConfig::default()
    };
    let (_, world) = loaded(config);
    let margin = config.target_radius + SPAWN_MARGIN_EXTRA_PX;

    for (_, target) in world.targets().iter_in_use() {
        let Vec2 { x, y } = target.position;
        assert!(x >= margin && x <= FIELD_WIDTH as f32 - margin);
        assert!(y >= margin && y <= FIELD_HEIGHT as f32 - margin);
        let under_hud = x - config.target_radius < config.hud_exclusion.x
            && y - config.target_radius < config.hud_exclusion.y;
        assert!(!under_hud, "target at ({x}, {y}) sits under the HUD");
    }
}

#[test]
fn tiny_field_centers_targets() {
    let mut world = DrillWorld::new(PoolConfig::default(), 50, 50);
    let mut drill = Gridshot::new(calm_config(), Theme::default());
    drill.load(&mut world);

    assert_eq!(only_target(&world).position, Vec2::new(25.0, 25.0));
}

#[test]
fn accuracy_is_zero_before_any_shot() {
    assert_eq!(SessionStats::default().accuracy(), 0.0);
}

#[test]
fn hud_lines_are_uppercase() {
    let (drill, world) = loaded(calm_config());
    for line in drill.hud_lines(&world) {
        assert_eq!(line, line.to_uppercase());
    }
}
