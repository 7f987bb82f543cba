use std::sync::Mutex;

use tempfile::NamedTempFile;

use scene_narrator::config::{DetectorKind, MonitorConfig};
use scene_narrator::MonitorSettings;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "NARRATOR_CONFIG",
        "NARRATOR_DB_PATH",
        "NARRATOR_SOURCE",
        "NARRATOR_CAPTURE_INTERVAL_MS",
        "NARRATOR_REPORT_INTERVAL_SECS",
        "NARRATOR_WINDOW_SECS",
        "NARRATOR_RETENTION_SECS",
        "NARRATOR_OUTPUT_DIR",
        "NARRATOR_MIN_CONFIDENCE",
        "NARRATOR_DETECTOR",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = MonitorConfig::load().expect("load defaults");
    assert_eq!(cfg.db_path, "narrator.db");
    assert_eq!(cfg.capture.source, "stub://screen");
    assert_eq!(cfg.capture.interval.as_secs(), 30);
    assert_eq!(cfg.reports.interval.as_secs(), 600);
    assert_eq!(cfg.reports.window.as_secs(), 600);
    assert_eq!(cfg.reports.retention.as_secs(), 3600);
    assert_eq!(cfg.analysis.min_confidence, 0.5);
    assert_eq!(cfg.detector.backend, DetectorKind::Stub);
    assert!(cfg.reports.output_dir.is_none());

    let pipeline = cfg.pipeline_config();
    assert_eq!(pipeline.reference.width, 1920);
    assert_eq!(pipeline.reference.height, 1080);

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"{
            "db_path": "office.db",
            "capture": { "source": "/srv/frames", "interval_ms": 5000, "queue_capacity": 8 },
            "analysis": { "min_confidence": 0.4, "reference_width": 1280, "reference_height": 720 },
            "reports": { "interval_secs": 120, "window_secs": 300, "retention_secs": 1800, "output_dir": "/tmp/reports" },
            "detector": { "backend": "stub" }
        }"#,
    );

    std::env::set_var("NARRATOR_CONFIG", file.path());
    std::env::set_var("NARRATOR_SOURCE", "stub://desk");
    std::env::set_var("NARRATOR_WINDOW_SECS", "600");
    std::env::set_var("NARRATOR_MIN_CONFIDENCE", "0.65");

    let cfg = MonitorConfig::load().expect("load config");

    assert_eq!(cfg.db_path, "office.db");
    assert_eq!(cfg.capture.source, "stub://desk");
    assert_eq!(cfg.capture.interval.as_millis(), 5000);
    assert_eq!(cfg.capture.queue_capacity, 8);
    assert_eq!(cfg.analysis.min_confidence, 0.65);
    assert_eq!(cfg.analysis.reference_width, 1280);
    assert_eq!(cfg.reports.interval.as_secs(), 120);
    assert_eq!(cfg.reports.window.as_secs(), 600);
    assert_eq!(cfg.reports.retention.as_secs(), 1800);
    assert_eq!(
        cfg.reports.output_dir.as_deref(),
        Some(std::path::Path::new("/tmp/reports"))
    );

    let settings = MonitorSettings::from_config(&cfg);
    assert_eq!(settings.queue_capacity, 8);
    assert_eq!(settings.pipeline.reference.height, 720);

    clear_env();
}

#[test]
fn rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("NARRATOR_RETENTION_SECS", "60");
    let err = MonitorConfig::load().unwrap_err();
    assert!(err.to_string().contains("retention"));
    clear_env();

    // Snapshots between two reports would fall outside a shorter window.
    std::env::set_var("NARRATOR_WINDOW_SECS", "300");
    let err = MonitorConfig::load().unwrap_err();
    assert!(err.to_string().contains("report interval"));
    clear_env();

    std::env::set_var("NARRATOR_CAPTURE_INTERVAL_MS", "soon");
    let err = MonitorConfig::load().unwrap_err();
    assert!(err.to_string().contains("NARRATOR_CAPTURE_INTERVAL_MS"));
    clear_env();

    std::env::set_var("NARRATOR_MIN_CONFIDENCE", "1.5");
    assert!(MonitorConfig::load().is_err());
    clear_env();

    std::env::set_var("NARRATOR_DETECTOR", "tract");
    let err = MonitorConfig::load().unwrap_err();
    assert!(err.to_string().contains("model_path"));
    clear_env();

    std::env::set_var("NARRATOR_DETECTOR", "opencv");
    assert!(MonitorConfig::load().is_err());
    clear_env();
}

#[test]
fn rejects_malformed_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config("{ not json");
    std::env::set_var("NARRATOR_CONFIG", file.path());
    let err = MonitorConfig::load().unwrap_err();
    assert!(err.to_string().contains("invalid config file"));

    clear_env();
}
