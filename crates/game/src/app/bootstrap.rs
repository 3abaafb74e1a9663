use reflex_engine::{
    resolve_app_paths, resolve_config_path, AppError, Drill, LoopConfig, ReflexConfig, Theme,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::{Gridshot, GridshotConfig};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) drill: Box<dyn Drill>,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    init_tracing();
    info!("=== Reflex Trainer Startup ===");

    let paths = resolve_app_paths()?;
    let config_path = resolve_config_path(&paths.config_dir);
    let reflex = ReflexConfig::load(&config_path)?;
    info!(
        root = %paths.root.display(),
        config = %config_path.display(),
        reports = %paths.reports_dir.display(),
        auto_optimize = reflex.quality.auto_optimize,
        target_fps = reflex.monitor.target_fps,
        "app_paths_resolved"
    );

    let theme = Theme::default();
    let config = LoopConfig {
        theme,
        ..LoopConfig::from_reflex(&reflex, Some(paths.report_file()))
    };
    let drill = Gridshot::new(GridshotConfig::default(), theme);

    Ok(AppWiring {
        config,
        drill: Box::new(drill),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
