use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use super::monitor::{PerformanceMetrics, PerformanceMonitor};
use crate::atomic_io::write_text_atomic;
use crate::quality::{OptimizationInfo, QualityController, QualityTier};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialize performance report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write performance report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Point-in-time dump of the monitor windows and controller state.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub metrics: PerformanceMetrics,
    pub optimization: OptimizationInfo,
    pub quality_tier: QualityTier,
    pub suggestions: Vec<String>,
    pub frame_times_ms: Vec<f32>,
    pub fps_history: Vec<f32>,
    pub generated_at_unix_s: f64,
}

impl PerformanceReport {
    pub fn capture(
        monitor: &PerformanceMonitor,
        controller: &QualityController,
        generated_at_unix_s: f64,
    ) -> Self {
        let metrics = *monitor.metrics();
        Self {
            optimization: controller.optimization_info(&metrics),
            quality_tier: controller.current_tier(),
            suggestions: monitor
                .optimization_suggestions()
                .map(|suggestion| suggestion.to_string())
                .collect(),
            frame_times_ms: monitor.frame_times().to_vec(),
            fps_history: monitor.fps_history().to_vec(),
            metrics,
            generated_at_unix_s,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn export_json(&self, path: &Path) -> Result<(), ReportError> {
        let text = self.to_json_pretty()?;
        write_text_atomic(path, &text).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            samples = self.metrics.sample_count,
            score = self.metrics.performance_score,
            "performance_report_exported"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::perf::{FrameSample, MonitorConfig};
    use crate::quality::QualityConfig;

    fn slow_monitor() -> PerformanceMonitor {
        let mut monitor = PerformanceMonitor::new(MonitorConfig {
            window_capacity: 4,
            ..MonitorConfig::default()
        });
        for frame_time_ms in [40.0, 50.0, 90.0, 45.0] {
            monitor.record_sample(FrameSample {
                frame_time_ms,
                fps: 1000.0 / frame_time_ms,
            });
        }
        monitor
    }

    #[test]
    fn capture_copies_windows_and_suggestions() {
        let monitor = slow_monitor();
        let report = PerformanceReport::capture(&monitor, &QualityController::default(), 12.5);

        assert_eq!(report.frame_times_ms, vec![40.0, 50.0, 90.0, 45.0]);
        assert_eq!(report.fps_history.len(), 4);
        assert_eq!(report.quality_tier, QualityTier::Ultra);
        assert!(!report.optimization.auto_optimize);
        assert!(report
            .suggestions
            .iter()
            .any(|text| text.contains("particle count")));
        assert!(report
            .suggestions
            .iter()
            .any(|text| text.contains("spikes")));
    }

    #[test]
    fn export_writes_pretty_json_with_lowercase_tier() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("reports").join("performance_report.json");
        let controller = QualityController::new(QualityConfig {
            initial_tier: QualityTier::Medium,
            ..QualityConfig::default()
        });
        let report = PerformanceReport::capture(&slow_monitor(), &controller, 1.0);

        report.export_json(&path).expect("export");

        let text = fs::read_to_string(&path).expect("read");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["quality_tier"], "medium");
        assert_eq!(value["optimization"]["level"], 0);
        assert_eq!(value["metrics"]["sample_count"], 4);
        assert_eq!(value["frame_times_ms"].as_array().map(Vec::len), Some(4));
        assert!(text.contains('\n'));
    }

    #[test]
    fn export_into_a_file_path_parent_fails_with_write_error() {
        let temp = TempDir::new().expect("temp");
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "not a directory").expect("blocker");

        let report =
            PerformanceReport::capture(&slow_monitor(), &QualityController::default(), 0.0);
        let error = report
            .export_json(&blocker.join("report.json"))
            .expect_err("parent is a file");

        assert!(matches!(error, ReportError::Write { .. }));
    }
}
