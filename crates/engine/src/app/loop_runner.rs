use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::config::{ConfigError, PoolConfig, ReflexConfig};
use crate::perf::MonitorConfig;
use crate::pool::Vec2;
use crate::quality::{AdaptiveQuality, ControlTick, QualityConfig, RenderSettings};
use crate::StartupError;

use super::input::{tier_for_digit, QualityRequest};
use super::metrics::{fps_from_frame_interval, MetricsAccumulator};
use super::{
    Drill, DrillCommand, DrillWorld, InputSnapshot, LoopMetricsSnapshot, MetricsHandle,
    OverlayData, Renderer, Theme,
};

pub const SLOW_FRAME_ENV_VAR: &str = "REFLEX_SLOW_FRAME_MS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub max_render_fps: Option<u32>,
    pub monitor: MonitorConfig,
    pub quality: QualityConfig,
    pub pools: PoolConfig,
    pub base_settings: RenderSettings,
    pub theme: Theme,
    pub report_path: Option<PathBuf>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::from_reflex(&ReflexConfig::default(), None)
    }
}

impl LoopConfig {
    pub fn from_reflex(config: &ReflexConfig, report_path: Option<PathBuf>) -> Self {
        Self {
            window_title: config.window.title.clone(),
            window_width: config.window.width,
            window_height: config.window.height,
            target_tps: config.window.target_tps,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            max_render_fps: config.window.max_render_fps,
            monitor: config.monitor,
            quality: config.quality,
            pools: config.pools,
            base_settings: config.render,
            theme: Theme::default(),
            report_path,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, drill: Box<dyn Drill>) -> Result<(), AppError> {
    let metrics_handle = MetricsHandle::default();
    run_app_with_metrics(config, drill, metrics_handle)
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    mut drill: Box<dyn Drill>,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let theme = config.theme;

    let viewport = renderer.viewport();
    let mut input_collector = InputCollector::new(viewport.width, viewport.height);
    let mut world = DrillWorld::new(config.pools, viewport.width, viewport.height);
    let mut adaptive = AdaptiveQuality::new(config.monitor, config.quality, config.base_settings);
    drill.load(&mut world);
    info!(
        targets = world.targets().in_use_count(),
        target_pool = world.targets().total_count(),
        particle_pool = world.particles().total_count(),
        "drill_loaded"
    );

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        target_fps = config.monitor.target_fps,
        auto_optimize = config.quality.auto_optimize,
        control_tick_frames = config.quality.control_tick_frames,
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut overlay_visible = true;
    let mut shutdown_done = false;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    input_collector.set_window_size(new_size.width, new_size.height);
                    world.set_field_size(new_size.width, new_size.height);
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    input_collector.set_window_size(size.width, size.height);
                    world.set_field_size(size.width, size.height);
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.set_cursor_position_px(position.x as f32, position.y as f32);
                }
                WindowEvent::CursorLeft { .. } => {
                    input_collector.clear_cursor_position();
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_mouse_input(button, state);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                    if input_collector.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    adaptive.start_frame();

                    if input_collector.overlay_toggle.take() {
                        overlay_visible = !overlay_visible;
                        info!(overlay_visible, "overlay_toggled");
                    }
                    if let Some(request) = input_collector.take_quality_request() {
                        apply_quality_request(&mut adaptive, request);
                    }
                    if input_collector.export.take() {
                        export_report(&adaptive, config.report_path.as_deref(), "hotkey");
                    }

                    if slow_frame_delay > Duration::ZERO {
                        // Debug perturbation only; this is not the FPS cap.
                        thread::sleep(slow_frame_delay);
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                    accumulator = accumulator.saturating_add(clamped_frame_dt);

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        let input_snapshot = input_collector.snapshot_for_tick();
                        let quality = adaptive.render_quality();
                        world.advance_clock(fixed_dt_seconds);
                        let command =
                            drill.update(fixed_dt_seconds, &input_snapshot, &mut world, &quality);
                        metrics_accumulator.record_tick();
                        if command == DrillCommand::Quit {
                            info!(reason = "drill", "shutdown_requested");
                            window_target.exit();
                            break;
                        }
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    // Single authoritative FPS cap sleep point for render pacing.
                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    let quality = adaptive.render_quality();
                    let overlay = overlay_visible.then(|| OverlayData {
                        metrics: metrics_handle.snapshot(),
                        render_fps_cap: effective_render_cap,
                        slow_frame_delay_ms: slow_frame_delay.as_millis() as u64,
                        quality,
                        auto_optimize: adaptive.controller().auto_optimize_enabled(),
                        pools: world.pool_stats(),
                        suggestions: adaptive
                            .monitor()
                            .optimization_suggestions()
                            .map(|suggestion| suggestion.to_string())
                            .collect(),
                        drill_lines: drill.hud_lines(&world),
                    });
                    if let Err(error) = renderer.render_frame(
                        &world,
                        &quality,
                        &theme,
                        input_collector.cursor_position_px,
                        overlay.as_ref(),
                    ) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();
                    metrics_accumulator.record_frame(raw_frame_dt);

                    if let Some(tick) = adaptive.end_frame(fps_from_frame_interval(raw_frame_dt)) {
                        log_control_tick(&adaptive, &tick);
                    }

                    if let Some(rates) = metrics_accumulator.maybe_rates(now) {
                        let performance = adaptive.monitor().metrics();
                        let snapshot = LoopMetricsSnapshot {
                            fps: rates.fps,
                            tps: rates.tps,
                            frame_time_ms: rates.frame_time_ms,
                            performance_score: performance.performance_score,
                            optimization_level: adaptive.controller().current_level(),
                            quality_tier: adaptive.controller().current_tier(),
                        };
                        metrics_handle.publish(snapshot);
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            score = snapshot.performance_score,
                            level = snapshot.optimization_level.get(),
                            tier = %snapshot.quality_tier,
                            targets = world.targets().in_use_count(),
                            particles = world.particles().in_use_count(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                if shutdown_done {
                    return;
                }
                shutdown_done = true;
                drill.unload(&mut world);
                let stats = world.pool_stats();
                info!(
                    target_in_use = stats.targets.in_use,
                    target_available = stats.targets.available,
                    target_total = stats.targets.total,
                    particle_in_use = stats.particles.in_use,
                    particle_available = stats.particles.available,
                    particle_total = stats.particles.total,
                    "pool_stats"
                );
                export_report(&adaptive, config.report_path.as_deref(), "shutdown");
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn apply_quality_request(adaptive: &mut AdaptiveQuality, request: QualityRequest) {
    match request {
        QualityRequest::ForceTier(tier) => adaptive.set_quality_level(tier),
        QualityRequest::ResumeAuto => adaptive.enable_auto_optimization(),
    }
}

fn export_report(adaptive: &AdaptiveQuality, path: Option<&Path>, reason: &'static str) {
    let Some(path) = path else {
        debug!(reason, "performance_report_skipped_no_path");
        return;
    };
    if let Err(error) = adaptive.report().export_json(path) {
        warn!(error = %error, reason, "performance_report_export_failed");
    }
}

fn log_control_tick(adaptive: &AdaptiveQuality, tick: &ControlTick) {
    let metrics = adaptive.monitor().metrics();
    if tick.level_changed || tick.tier_changed {
        info!(
            level = tick.level.get(),
            tier = %tick.tier,
            level_changed = tick.level_changed,
            tier_changed = tick.tier_changed,
            avg_fps = metrics.avg_fps,
            score = metrics.performance_score,
            "control_tick"
        );
    } else {
        debug!(
            level = tick.level.get(),
            tier = %tick.tier,
            avg_fps = metrics.avg_fps,
            "control_tick"
        );
    }
}

/// Press edge for one key or button; held input never re-fires.
#[derive(Debug, Default, Clone, Copy)]
struct EdgeLatch {
    is_down: bool,
    pressed_edge: bool,
}

impl EdgeLatch {
    fn handle(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.is_down {
                    self.pressed_edge = true;
                }
                self.is_down = true;
            }
            ElementState::Released => self.is_down = false,
        }
    }

    fn take(&mut self) -> bool {
        std::mem::take(&mut self.pressed_edge)
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    overlay_toggle: EdgeLatch,
    export: EdgeLatch,
    resume_auto: EdgeLatch,
    restart: EdgeLatch,
    tier_keys: [EdgeLatch; 4],
    pending_quality_request: Option<QualityRequest>,
    cursor_position_px: Option<Vec2>,
    left_mouse: EdgeLatch,
    window_width: u32,
    window_height: u32,
}

impl InputCollector {
    fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            window_width,
            window_height,
            ..Self::default()
        }
    }

    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        self.handle_physical_key(key_event.physical_key, key_event.state);
    }

    fn handle_physical_key(&mut self, key: PhysicalKey, state: ElementState) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::Escape => {
                if state == ElementState::Pressed {
                    self.mark_quit_requested();
                }
            }
            KeyCode::F3 => self.overlay_toggle.handle(state),
            KeyCode::F5 => self.export.handle(state),
            KeyCode::F2 => {
                self.resume_auto.handle(state);
                if self.resume_auto.take() {
                    self.pending_quality_request = Some(QualityRequest::ResumeAuto);
                }
            }
            KeyCode::KeyR => self.restart.handle(state),
            _ => {
                let Some(digit) = tier_digit(code) else {
                    return;
                };
                let latch = &mut self.tier_keys[usize::from(digit - 1)];
                latch.handle(state);
                if latch.take() {
                    self.pending_quality_request =
                        tier_for_digit(digit).map(QualityRequest::ForceTier);
                }
            }
        }
    }

    fn take_quality_request(&mut self) -> Option<QualityRequest> {
        self.pending_quality_request.take()
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        InputSnapshot::new(
            self.quit_requested,
            self.cursor_position_px,
            self.left_mouse.take(),
            self.restart.take(),
            self.window_width,
            self.window_height,
        )
    }

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
    }

    fn set_cursor_position_px(&mut self, x: f32, y: f32) {
        self.cursor_position_px = Some(Vec2 { x, y });
    }

    fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.left_mouse.handle(state);
        }
    }
}

fn tier_digit(code: KeyCode) -> Option<u8> {
    match code {
        KeyCode::Digit1 | KeyCode::Numpad1 => Some(1),
        KeyCode::Digit2 | KeyCode::Numpad2 => Some(2),
        KeyCode::Digit3 | KeyCode::Numpad3 => Some(3),
        KeyCode::Digit4 | KeyCode::Numpad4 => Some(4),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => parse_slow_frame_ms(&value).unwrap_or_else(|| {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                value = value.as_str(),
                "invalid slow-frame env var value; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }),
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_frame_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                error = %err,
                "unable to read slow-frame env var; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }
    }
}

fn parse_slow_frame_ms(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_millis)
}
