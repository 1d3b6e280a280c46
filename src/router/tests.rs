//! Tests for the Router context: hotkey bindings from configuration, the
//! hardware event loop, and indicator reflection.

use super::*;
use crate::config::ChannelConfig;
use crate::testutil::{channel_with_indicator, registry_arc, RecordingIndicators};
use std::time::Duration;

fn make_test_config(hotkeys: Vec<&str>) -> Config {
    Config {
        local_gamepad_index: 0,
        channels: hotkeys
            .into_iter()
            .map(|hotkey| ChannelConfig {
                host: "localhost".to_string(),
                port: 33010,
                remote_index: 0,
                encryption_key: String::new(),
                encryption_mode: "aes-gcm".to_string(),
                hotkey: hotkey.to_string(),
                indicator: None,
            })
            .collect(),
        hardware: None,
        hotkey_poll_ms: 5,
        send_timeout_ms: 50,
    }
}

fn make_router(registry: Arc<ChannelRegistry>) -> (Router, watch::Receiver<u64>, watch::Sender<bool>) {
    let (refresh, refresh_rx) = refresh_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    (
        Router::new(registry, refresh, shutdown_rx),
        refresh_rx,
        shutdown_tx,
    )
}

#[test]
fn hotkey_bindings_skip_channels_without_a_hotkey() {
    let config = make_test_config(vec!["ctrl+1", "", "f3"]);
    let bindings = Router::hotkey_bindings(&config).unwrap();

    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].channel, 0);
    assert_eq!(bindings[1].channel, 2);
}

#[test]
fn hotkey_bindings_reject_unparseable_combos() {
    let config = make_test_config(vec!["ctrl+"]);
    assert!(Router::hotkey_bindings(&config).is_err());
}

#[tokio::test]
async fn hardware_events_drive_the_position_and_button_routers() {
    let registry = Arc::new(ChannelRegistry::new(vec![
        channel_with_indicator("btnA", [15, 15, 15], [1, 1, 1]),
        channel_with_indicator("btnB", [15, 15, 15], [1, 1, 1]),
        channel_with_indicator("btnC", [15, 15, 15], [1, 1, 1]),
    ]));
    let (router, _refresh_rx, _shutdown_tx) = make_router(registry.clone());

    let (event_tx, event_rx) = mpsc::channel(16);
    let handle = router.spawn_hardware(event_rx, 5, 95);

    // Slider into the middle section: exactly channel 1 active.
    event_tx
        .send(HardwareEvent::Position(50))
        .await
        .unwrap();
    // Button release on another identity adds its channel.
    event_tx
        .send(HardwareEvent::Button {
            uid: "btnC".to_string(),
            released: true,
        })
        .await
        .unwrap();

    // Closing the stream lets the loop finish after draining.
    drop(event_tx);
    handle.await.unwrap();

    assert_eq!(registry.snapshot(), vec![false, true, true]);
}

#[tokio::test]
async fn hardware_loop_stops_on_shutdown() {
    let registry = registry_arc(1);
    let (router, _refresh_rx, shutdown_tx) = make_router(registry);

    let (_event_tx, event_rx) = mpsc::channel(1);
    let handle = router.spawn_hardware(event_rx, 5, 95);

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("hardware loop must exit on shutdown")
        .unwrap();
}

#[tokio::test]
async fn reflector_pushes_composed_colors_on_refresh() {
    let registry = Arc::new(ChannelRegistry::new(vec![
        channel_with_indicator("btnA", [15, 15, 15], [1, 1, 1]),
        channel_with_indicator("btnA", [15, 15, 15], [1, 1, 1]),
    ]));
    let (refresh, refresh_rx) = refresh_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let router = Router::new(registry.clone(), refresh.clone(), shutdown_rx);

    let indicators = Arc::new(RecordingIndicators::default());
    let driver: Arc<dyn PeripheralDriver> = indicators.clone();
    let handle = router.spawn_reflector(Some(driver), refresh_rx);

    registry.set_active(0, true).unwrap();
    refresh.request();

    // Give the reflector a chance to observe the bump.
    tokio::time::sleep(Duration::from_millis(50)).await;

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("reflector must exit on shutdown")
        .unwrap();

    let pushes = indicators.pushes.lock();
    assert_eq!(pushes.as_slice(), &[("btnA".to_string(), 16, 16, 16)]);
}
