//! Station controller integration tests

use std::path::Path;

use stationd::app::StationController;

fn write_config(dir: &Path, device: &Path) -> std::path::PathBuf {
    let path = dir.join("config.json");
    let raw = serde_json::json!({
        "cameras": [
            {"id": 1, "type": "usb", "name": "front", "device": device},
            {"id": 2, "type": "keyence", "name": "side", "ip": "10.0.0.10", "port": 8500}
        ],
        "autoReconnect": false,
        "serialMapping": {"AB12": "ModelX"},
        "paths": {
            "captures": dir.join("captures"),
            "results": dir.join("results"),
            "logs": dir.join("logs")
        }
    });
    std::fs::write(&path, serde_json::to_string_pretty(&raw).unwrap()).unwrap();
    path
}

#[tokio::test]
async fn test_process_serial_captures_and_files_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("video0");
    std::fs::write(&device, b"dev").unwrap();
    let config_path = write_config(dir.path(), &device);

    let mut controller = StationController::init(&config_path).await.unwrap();
    controller.startup().await.unwrap();

    let results = controller.process_serial("AB12SN99").await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[&1].is_some());
    assert!(results[&2].is_some());

    // Both artifacts were filed under results, named serial_model_timestamp.
    let filed: Vec<String> = std::fs::read_dir(dir.path().join("results"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(filed.len(), 2);
    for name in &filed {
        assert!(name.starts_with("AB12SN99_ModelX_"));
        assert!(name.ends_with(".jpg"));
    }

    // startup + serial + one capture event per camera.
    let events = controller.events().entries();
    assert_eq!(events[0].event_type, "startup");
    assert_eq!(events[1].event_type, "serial");
    assert_eq!(
        events.iter().filter(|e| e.event_type == "capture").count(),
        2
    );

    controller.shutdown().await.unwrap();
    let events = controller.events().entries();
    assert_eq!(events.last().unwrap().event_type, "shutdown");
}

#[tokio::test]
async fn test_failed_camera_is_logged_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("video0");
    std::fs::write(&device, b"dev").unwrap();
    let config_path = write_config(dir.path(), &device);

    let mut controller = StationController::init(&config_path).await.unwrap();
    controller.startup().await.unwrap();

    // Camera 1 loses its device between startup and the next serial.
    std::fs::remove_file(&device).unwrap();
    controller.fleet().disconnect_one(1).await.unwrap();

    let results = controller.process_serial("ZZ99SN01").await.unwrap();
    assert_eq!(results[&1], None);
    assert!(results[&2].is_some());

    // Unknown prefix falls back to the "unknown" model label in filenames.
    let filed: Vec<String> = std::fs::read_dir(dir.path().join("results"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(filed.iter().any(|n| n.starts_with("ZZ99SN01_unknown_")));

    let events = controller.events().entries();
    assert!(events.iter().any(|e| e.event_type == "capture_failed"));
}
