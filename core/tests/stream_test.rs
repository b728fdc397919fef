//! Event stream client tests
//!
//! - last-seen records per channel
//! - order independence across channels
//! - the transport pump

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::{alert, gps, health, satellite};
use std::sync::Arc;
use tidewatch_core::event::{AlertLevel, Channel, GpsQuality, HealthState};
use tidewatch_core::notify::{Dispatcher, DispatcherConfig, RecordingSink};
use tidewatch_core::presenter::{freshness_label, render_detailed};
use tidewatch_core::stream::{spawn_pump, EventStreamClient};
use tidewatch_core::ConnectionStatus;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{timeout, Duration};

#[test]
fn records_latest_value_with_timestamp() {
    let mut client = EventStreamClient::new();
    let before = Utc::now();
    client.on_channel_event(alert("a-1", AlertLevel::Watch, 55.0));
    let after = Utc::now();

    let rec = client.latest_alert_status();
    assert_eq!(rec.value().map(|a| a.id.as_str()), Some("a-1"));
    let at = rec.received_at().expect("timestamp set with value");
    assert!(at >= before && at <= after);
}

#[test]
fn untouched_channels_stay_empty_and_render_never() {
    let mut client = EventStreamClient::new();
    client.on_channel_event(satellite("s-1", 0.1));

    assert!(client.latest_alert_status().is_empty());
    assert!(client.latest_detection_result().is_empty());
    assert!(client.latest_gps_reading().is_empty());
    assert!(client.latest_system_health().is_empty());
    assert_eq!(
        freshness_label(client.received_at(Channel::GpsReading), Utc::now()),
        "Never"
    );

    let empty = EventStreamClient::new();
    let view = render_detailed(ConnectionStatus::Connected, &empty, Utc::now());
    assert_eq!(view.last_update, "Never");
    assert!(view.alert.is_none());
    assert!(view.system_health.is_none());
}

#[test]
fn channel_order_does_not_matter() {
    let t0 = Utc::now();
    let t1 = t0 + ChronoDuration::seconds(3);

    let mut a = EventStreamClient::new();
    a.on_channel_event_at(gps("g-1", GpsQuality::Good, 4.0), t0);
    a.on_channel_event_at(health("h-1", HealthState::Degraded), t1);

    let mut b = EventStreamClient::new();
    b.on_channel_event_at(health("h-1", HealthState::Degraded), t1);
    b.on_channel_event_at(gps("g-1", GpsQuality::Good, 4.0), t0);

    assert_eq!(a.latest_gps_reading(), b.latest_gps_reading());
    assert_eq!(a.latest_system_health(), b.latest_system_health());
    assert_eq!(a.last_update(), b.last_update());
}

#[tokio::test]
async fn pump_feeds_client_and_dispatcher() {
    let (tx, rx) = mpsc::channel(16);
    let client = Arc::new(RwLock::new(EventStreamClient::new()));
    let sink = Arc::new(RecordingSink::new());
    let dispatcher = Arc::new(Dispatcher::new(DispatcherConfig::default(), sink.clone()));

    let pump = spawn_pump(rx, Arc::clone(&client), Arc::clone(&dispatcher));

    tx.send(alert("a-1", AlertLevel::Safe, 10.0)).await.unwrap();
    tx.send(alert("a-2", AlertLevel::Alert, 90.0)).await.unwrap();
    tx.send(satellite("s-1", 0.95)).await.unwrap();
    drop(tx);

    timeout(Duration::from_millis(500), pump)
        .await
        .expect("pump should stop when the transport closes")
        .expect("pump task panicked");

    let client = client.read().await;
    assert_eq!(
        client.latest_alert_status().value().map(|a| a.id.as_str()),
        Some("a-2")
    );
    assert!(client.latest_satellite_data().value().is_some());

    // Safe/10 is not significant; the other two are
    assert_eq!(sink.len(), 2);
    assert_eq!(dispatcher.stats().evaluated, 3);
}
