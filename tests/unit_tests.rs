use std::sync::Arc;
use std::time::Duration;
use switchbot_metrics::{
    devices::{DeviceRef, DeviceStatus, DeviceType, FakeDeviceClient, HUB_MINI},
    error::{CycleError, DeviceError, MetricsError},
    metrics::{Metrics, Reading},
    normalize, FailurePolicy, Poller, PushConfig, WebConfig,
};

fn status(n: i64) -> DeviceStatus {
    DeviceStatus {
        battery: n,
        humidity: 100 - n,
        temperature: n as f64 / 4.0,
    }
}

/// A listing that interleaves hubs and sensors of several types.
fn mixed_listing(size: usize) -> Vec<DeviceRef> {
    (0..size)
        .map(|i| {
            let device_type = match i % 4 {
                0 => HUB_MINI,
                1 => "Meter",
                2 => "MeterPlus",
                _ => "WoIOSensor",
            };
            DeviceRef::new(format!("D{i}"), "HUB", format!("Device {i}"), device_type)
        })
        .collect()
}

/// Test that successful cycles drop every hub and keep listing order for the rest
#[tokio::test]
async fn test_batch_excludes_hubs_and_preserves_order() {
    for size in [0, 1, 4, 9, 16] {
        let listing = mixed_listing(size);
        let client = FakeDeviceClient::new();
        for (i, device) in listing.iter().enumerate() {
            client.add_device(device.clone(), status(i as i64));
        }

        let metrics = Poller::new(Arc::new(client)).run_cycle().await.unwrap();

        let expected: Vec<&str> = listing
            .iter()
            .filter(|d| !d.is_hub_only())
            .map(|d| d.id.as_str())
            .collect();
        let actual: Vec<&str> = metrics
            .devices_value
            .iter()
            .map(|r| r.device_id.as_str())
            .collect();
        assert_eq!(actual, expected, "listing of size {size}");
        assert!(metrics.devices_value.iter().all(|r| r.device_type != HUB_MINI));
    }
}

/// Test that fail-fast stops at the failing device and names it
#[tokio::test]
async fn test_fail_fast_produces_no_later_readings() {
    let listing = mixed_listing(8);
    let client = Arc::new(FakeDeviceClient::new());
    for (i, device) in listing.iter().enumerate() {
        client.add_device(device.clone(), status(i as i64));
    }
    client.set_failing("D2", true);

    let err = Poller::new(client.clone()).run_cycle().await.unwrap_err();

    match &err {
        CycleError::DeviceStatus {
            device_id,
            device_name,
            device_type,
            ..
        } => {
            assert_eq!(device_id, "D2");
            assert_eq!(device_name, "Device 2");
            assert_eq!(device_type, "MeterPlus");
        }
        other => panic!("unexpected error: {other}"),
    }
    // D0 is a hub, D1 succeeded, D2 failed; nothing after was requested
    assert_eq!(client.status_calls(), vec!["D1", "D2"]);
}

/// Test that fail-soft keeps polling past failures
#[tokio::test]
async fn test_fail_soft_polls_every_device() {
    let listing = mixed_listing(8);
    let client = Arc::new(FakeDeviceClient::new());
    for (i, device) in listing.iter().enumerate() {
        client.add_device(device.clone(), status(i as i64));
    }
    client.set_failing("D2", true);
    client.set_failing("D7", true);

    let metrics = Poller::new(client.clone())
        .with_policy(FailurePolicy::FailSoft)
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(metrics.len(), 4);
    assert!(metrics.is_partial());
    let failed: Vec<_> = metrics.failures.iter().map(|f| f.device_id.as_str()).collect();
    assert_eq!(failed, vec!["D2", "D7"]);
    assert_eq!(client.status_calls().len(), 6);
}

/// Test that two back-to-back cycles over an unchanged population are equal
#[tokio::test]
async fn test_back_to_back_cycles_are_idempotent() {
    let client = FakeDeviceClient::new();
    for (i, device) in mixed_listing(6).into_iter().enumerate() {
        client.add_device(device, status(i as i64));
    }
    let poller = Poller::new(Arc::new(client));

    let first = poller.run_cycle().await.unwrap();
    let second = poller.run_cycle().await.unwrap();
    assert_eq!(first, second);
}

/// Test that status changes between cycles are picked up
#[tokio::test]
async fn test_cycles_do_not_cache_statuses() {
    let client = Arc::new(FakeDeviceClient::new().with_device(
        DeviceRef::new("A", "", "Office", "Meter"),
        status(50),
    ));
    let poller = Poller::new(client.clone());

    let before = poller.run_cycle().await.unwrap();
    client.set_status("A", status(10));
    let after = poller.run_cycle().await.unwrap();

    assert_eq!(before.devices_value[0].battery, 50);
    assert_eq!(after.devices_value[0].battery, 10);
}

/// Test normalization is total and deterministic
#[test]
fn test_normalize_determinism() {
    for device in mixed_listing(8) {
        for n in [-40, 0, 1, 99, 100] {
            let a = normalize(&device, &status(n));
            let b = normalize(&device, &status(n));
            assert_eq!(a, b);
            assert_eq!(a.device_id, device.id);
            assert_eq!(a.hub_device_id, device.hub_id);
            assert_eq!(a.device_name, device.name);
            assert_eq!(a.device_type, device.device_type.as_str());
        }
    }
}

/// Test the batch JSON wire format
#[test]
fn test_metrics_json_schema() {
    let metrics = Metrics {
        devices_value: vec![Reading {
            device_id: "A".to_string(),
            hub_device_id: "H".to_string(),
            device_name: "Office".to_string(),
            device_type: "Meter".to_string(),
            battery: 90,
            humidity: 55,
            temperature: 21.5,
        }],
        failures: Vec::new(),
    };

    let json: serde_json::Value = serde_json::to_value(&metrics).unwrap();
    let reading = &json["devicesValue"][0];
    assert_eq!(reading["deviceId"], "A");
    assert_eq!(reading["hubDeviceId"], "H");
    assert_eq!(reading["deviceName"], "Office");
    assert_eq!(reading["deviceType"], "Meter");
    assert_eq!(reading["battery"], 90);
    assert_eq!(reading["humidity"], 55);
    assert_eq!(reading["temperature"], 21.5);
    assert!(json.get("failures").is_none());
}

/// Test error creation and formatting
#[test]
fn test_error_types() {
    let store_error = MetricsError::store_error("bucket missing");
    assert!(store_error.to_string().contains("bucket missing"));

    let web_error = MetricsError::web_server_error("Server startup failed");
    assert!(web_error.to_string().contains("Server startup failed"));

    let config_error = MetricsError::config_error("Invalid configuration");
    assert!(config_error.to_string().contains("Invalid configuration"));

    let decode_error = DeviceError::decode_error("unexpected body");
    assert!(decode_error.to_string().contains("unexpected body"));
}

/// Test WebConfig builder pattern
#[test]
fn test_web_config() {
    let config = WebConfig::default()
        .with_host("0.0.0.0")
        .with_port(9090)
        .with_monitoring_title("Sensors");

    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 9090);
    assert_eq!(config.monitoring_title, "Sensors");
    assert_eq!(config.bind_address(), "0.0.0.0:9090");
    assert_eq!(WebConfig::default().bind_address(), "127.0.0.1:3000");
}

/// Test PushConfig defaults and builder
#[test]
fn test_push_config() {
    let config = PushConfig::default();
    assert_eq!(config.interval, Duration::from_secs(10));
    assert_eq!(config.measurement, "switchbot");

    let config = config
        .with_interval(Duration::from_secs(30))
        .with_measurement("climate");
    assert_eq!(config.interval, Duration::from_secs(30));
    assert_eq!(config.measurement, "climate");
}

/// Test hub classification
#[test]
fn test_device_type_classification() {
    assert!(DeviceType::from(HUB_MINI).is_hub_only());
    assert!(!DeviceType::from("Meter").is_hub_only());
    assert_eq!(DeviceType::from("Meter").to_string(), "Meter");
}

/// Test that fake client scripts can be driven without a runtime
#[test]
fn test_fake_client_blocking() {
    let client = FakeDeviceClient::new().with_device(
        DeviceRef::new("A", "", "Office", "Meter"),
        status(1),
    );
    let metrics = tokio_test::block_on(Poller::new(Arc::new(client)).run_cycle()).unwrap();
    assert_eq!(metrics.len(), 1);
}
