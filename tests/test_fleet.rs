//! Fleet manager unit tests

use std::path::PathBuf;

use serde_json::{Map, Value};

use stationd::camera::{
    CameraDescriptor, CameraKind, EndpointParams, FleetManager, LinkState,
};

fn usb(id: u32, device: impl Into<PathBuf>) -> CameraDescriptor {
    CameraDescriptor {
        id,
        name: format!("cam{}", id),
        kind: CameraKind::Usb,
        device: Some(device.into()),
        ip: None,
        port: None,
    }
}

fn keyence(id: u32) -> CameraDescriptor {
    CameraDescriptor {
        id,
        name: format!("cam{}", id),
        kind: CameraKind::Keyence,
        device: None,
        ip: Some("10.0.0.10".to_string()),
        port: Some(8500),
    }
}

fn status_of(statuses: &[stationd::camera::CameraStatus], id: u32) -> LinkState {
    statuses.iter().find(|s| s.id == id).unwrap().status
}

#[tokio::test]
async fn test_connect_all_follows_device_presence() {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("video0");
    std::fs::write(&device, b"dev").unwrap();

    let fleet = FleetManager::new(
        vec![usb(1, &device), usb(2, dir.path().join("missing")), keyence(3)],
        false,
        dir.path().join("captures"),
    )
    .unwrap();

    fleet.connect_all().await;
    let statuses = fleet.status_all().await;
    assert_eq!(status_of(&statuses, 1), LinkState::Connected);
    assert_eq!(status_of(&statuses, 2), LinkState::Disconnected);
    assert_eq!(status_of(&statuses, 3), LinkState::Connected);
}

#[tokio::test]
async fn test_capture_fans_out_and_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("video0");
    std::fs::write(&device, b"dev").unwrap();
    let artifact_dir = dir.path().join("captures");

    // Camera 2 points at a missing device and stays disconnected.
    let fleet = FleetManager::new(
        vec![usb(1, &device), usb(2, dir.path().join("missing")), keyence(3)],
        false,
        &artifact_dir,
    )
    .unwrap();
    fleet.connect_all().await;

    let results = fleet.capture(None).await.unwrap();
    assert_eq!(results.len(), 3);
    assert!(results[&1].is_some());
    assert!(results[&2].is_none());
    assert!(results[&3].is_some());

    for id in [1u32, 3] {
        let path = results[&id].as_ref().unwrap();
        assert!(path.starts_with(&artifact_dir));
        assert_eq!(path.extension().unwrap(), "jpg");
        assert!(path.exists());
    }

    // The fleet remembers each camera's artifact independently.
    assert_eq!(fleet.latest_image(1).await.unwrap(), results[&1]);
    assert_eq!(fleet.latest_image(2).await.unwrap(), None);
}

#[tokio::test]
async fn test_capture_requires_connected_state() {
    let dir = tempfile::tempdir().unwrap();
    let fleet = FleetManager::new(vec![keyence(1)], false, dir.path().join("captures")).unwrap();

    // No connect: the capture is recorded as failed, not raised.
    let results = fleet.capture(Some(1)).await.unwrap();
    assert_eq!(results[&1], None);

    fleet.connect_one(1).await.unwrap();
    let results = fleet.capture(Some(1)).await.unwrap();
    assert!(results[&1].is_some());
}

#[tokio::test]
async fn test_unknown_id_is_a_not_found_error() {
    let dir = tempfile::tempdir().unwrap();
    let fleet = FleetManager::new(vec![keyence(1)], false, dir.path()).unwrap();

    assert!(fleet.connect_one(99).await.is_err());
    assert!(fleet.reconnect_one(99).await.is_err());
    assert!(fleet.capture(Some(99)).await.is_err());
    assert!(fleet.latest_image(99).await.is_err());
}

#[tokio::test]
async fn test_reset_swaps_device_path() {
    let dir = tempfile::tempdir().unwrap();
    let old_device = dir.path().join("old");
    let new_device = dir.path().join("new");
    std::fs::write(&new_device, b"dev").unwrap();

    let fleet = FleetManager::new(vec![usb(1, &old_device)], false, dir.path().join("captures"))
        .unwrap();
    assert!(!fleet.connect_one(1).await.unwrap());

    let ok = fleet
        .reset_one(
            1,
            EndpointParams {
                device: Some(new_device),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(ok);
    assert_eq!(status_of(&fleet.status_all().await, 1), LinkState::Connected);

    // Resetting back to a missing path leaves the camera disconnected.
    let ok = fleet
        .reset_one(
            1,
            EndpointParams {
                device: Some(dir.path().join("gone")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!ok);
    assert_eq!(
        status_of(&fleet.status_all().await, 1),
        LinkState::Disconnected
    );
}

#[tokio::test]
async fn test_add_and_remove_report_status_strings() {
    let dir = tempfile::tempdir().unwrap();
    let mut fleet = FleetManager::new(vec![keyence(1)], false, dir.path()).unwrap();

    assert!(fleet.add_camera(keyence(1)).await.starts_with("error:"));
    assert_eq!(fleet.add_camera(keyence(2)).await, "added");
    assert_eq!(fleet.len(), 2);

    // An invalid descriptor is rejected with a message, not a panic.
    let mut bad = keyence(3);
    bad.ip = None;
    assert!(fleet.add_camera(bad).await.starts_with("error:"));

    assert_eq!(fleet.remove_camera(2).await, "removed");
    assert_eq!(fleet.remove_camera(2).await, "error: camera not found");
    assert_eq!(fleet.len(), 1);
}

#[tokio::test]
async fn test_auto_reconnect_during_status_check() {
    let dir = tempfile::tempdir().unwrap();
    let fleet = FleetManager::new(vec![keyence(1)], true, dir.path()).unwrap();

    // Never connected: the status check reconnects inline.
    let statuses = fleet.status_all().await;
    assert_eq!(status_of(&statuses, 1), LinkState::Connected);
}

#[tokio::test]
async fn test_save_latest_image_names_and_preserves_extension() {
    let dir = tempfile::tempdir().unwrap();
    let fleet = FleetManager::new(vec![keyence(1)], false, dir.path().join("captures")).unwrap();
    let results_dir = dir.path().join("results");

    // Nothing captured yet.
    assert!(fleet
        .save_latest_image(1, &results_dir, Some("SN123456"), Some("ModelA"), None)
        .await
        .is_err());

    fleet.connect_one(1).await.unwrap();
    fleet.capture(Some(1)).await.unwrap();

    let saved = fleet
        .save_latest_image(1, &results_dir, Some("SN123456"), Some("ModelA"), None)
        .await
        .unwrap();
    let name = saved.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("SN123456_ModelA_"));
    assert!(name.ends_with(".jpg"));
    assert!(saved.exists());

    // A second save in the same second must not overwrite the first.
    let again = fleet
        .save_latest_image(1, &results_dir, Some("SN123456"), Some("ModelA"), None)
        .await
        .unwrap();
    assert_ne!(saved, again);
}

#[tokio::test]
async fn test_fleet_from_config_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("video0");
    std::fs::write(&device, b"dev").unwrap();
    let artifact_dir = dir.path().join("captures");

    let raw = format!(
        r#"{{"cameras": [{{"id": 1, "type": "usb", "name": "front", "device": {:?}}}], "autoReconnect": false}}"#,
        device
    );
    let config: Map<String, Value> = serde_json::from_str(&raw).unwrap();

    let fleet = FleetManager::from_config(&config, &artifact_dir).unwrap();
    fleet.connect_all().await;
    assert_eq!(status_of(&fleet.status_all().await, 1), LinkState::Connected);

    let results = fleet.capture(None).await.unwrap();
    let path = results[&1].as_ref().unwrap();
    assert!(path.starts_with(&artifact_dir));
    assert_eq!(path.extension().unwrap(), "jpg");
}
