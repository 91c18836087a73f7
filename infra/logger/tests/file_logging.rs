use fpm_logger::{LogRotation, LogSettings, Logger};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn file_logging_writes_json_lines() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");
    let settings = LogSettings {
        console: false,
        json: true,
        dir: Some(log_dir.clone()),
        rotation: LogRotation::Never,
        ..LogSettings::default()
    };

    let logger = Logger::init("integration-file-logging", &settings)?;
    assert!(logger.guard().is_some());

    tracing::info!(feature_pack = "org.example:fp1:1.0", "hello from integration test");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(&log_file)?;
    let first = contents.lines().next().expect("log file should not be empty");
    assert!(first.trim_start().starts_with('{'), "json layer should emit one object per line");
    assert!(first.contains("hello from integration test"));

    Ok(())
}
