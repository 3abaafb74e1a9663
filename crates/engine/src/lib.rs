use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
mod atomic_io;
pub mod config;
pub mod perf;
pub mod pool;
pub mod quality;

pub use app::{
    fps_from_frame_interval, run_app, run_app_with_metrics, AppError, Canvas, Drill, DrillCommand,
    DrillWorld, InputSnapshot, LoopConfig, LoopMetricsSnapshot, MetricsHandle, QualityRequest,
    Renderer, Theme, Viewport, WorldPoolStats, SLOW_FRAME_ENV_VAR,
};
pub use config::{resolve_config_path, ConfigError, PoolConfig, ReflexConfig, WindowConfig};
pub use perf::{
    MonitorConfig, PerformanceMetrics, PerformanceMonitor, PerformanceReport, ReportError,
    Suggestion,
};
pub use pool::{
    EntityPool, Particle, ParticlePool, ParticleSpawn, PoolHandle, PoolStats, Pooled, Rgba,
    Target, TargetKind, TargetPool, TargetSpawn, Vec2,
};
pub use quality::{
    AdaptiveQuality, ControlTick, OptimizationLevel, QualityConfig, QualityController,
    QualityTier, RenderQuality, RenderSettings,
};

pub const ROOT_ENV_VAR: &str = "REFLEX_ROOT";
pub const REPORT_FILE_NAME: &str = "performance_report.json";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub config_dir: PathBuf,
    pub reports_dir: PathBuf,
}

impl AppPaths {
    pub fn report_file(&self) -> PathBuf {
        self.reports_dir.join(REPORT_FILE_NAME)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create reports directory at {path}: {source}")]
    CreateReportsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "REFLEX_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or config/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or config/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/reflex\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    app_paths_for_root(root)
}

fn app_paths_for_root(root: PathBuf) -> Result<AppPaths, StartupError> {
    let config_dir = root.join("config");
    let reports_dir = root.join("reports");

    fs::create_dir_all(&reports_dir).map_err(|source| StartupError::CreateReportsDir {
        path: reports_dir.clone(),
        source,
    })?;

    Ok(AppPaths {
        root,
        config_dir,
        reports_dir,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            find_root_from(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_from(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_config = path.join("config").is_dir();

    cargo_toml && (has_crates || has_config)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
