use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use hostpulse::{
    channel::encode_record,
    web::{create_app, AppState},
    Backoff, ChannelGuard, Collector, CounterSource, FileChannel, IoCounters, MemoryChannel,
    RawReading, Result, Snapshot, SnapshotChannel, WebConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn temp_channel_path() -> PathBuf {
    std::env::temp_dir().join(format!("hostpulse-it-{}", uuid::Uuid::new_v4()))
}

fn snapshot(cpu_percent: f64, timestamp: f64) -> Snapshot {
    Snapshot {
        timestamp,
        cpu_percent,
        memory_percent: 40.0,
        disk_io_bytes: 2048,
        net_io_bytes: 512,
        load_avg: 1.5,
    }
}

async fn get_metrics(channel: AppState) -> (StatusCode, serde_json::Value) {
    let app = create_app(&WebConfig::default(), channel);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .expect("Should build request"),
        )
        .await
        .expect("Should get response");

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let json = serde_json::from_slice(&body).expect("Body should be JSON");
    (status, json)
}

/// Counter source fed from a fixed list, then repeating the last reading.
struct FixedSource {
    readings: Vec<RawReading>,
    next: usize,
}

impl CounterSource for FixedSource {
    async fn read(&mut self) -> Result<RawReading> {
        let idx = self.next.min(self.readings.len() - 1);
        self.next += 1;
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(self.readings[idx].clone())
    }
}

#[tokio::test]
async fn test_missing_channel_is_500_naming_path() {
    let path = temp_channel_path();
    let (status, body) = get_metrics(Arc::new(FileChannel::open(&path))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().expect("error should be a string");
    assert!(message.contains(&path.display().to_string()), "{message}");
}

#[tokio::test]
async fn test_empty_channel_is_503() {
    let guard = FileChannel::acquire(temp_channel_path()).expect("Should create channel");
    let (status, body) = get_metrics(guard.channel()).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "No data available from collector");
}

#[tokio::test]
async fn test_empty_memory_channel_is_503() {
    let (status, body) = get_metrics(Arc::new(MemoryChannel::new())).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "No data available from collector");
}

#[tokio::test]
async fn test_last_record_wins() {
    let guard = FileChannel::acquire(temp_channel_path()).expect("Should create channel");
    let batch = [
        snapshot(10.0, 1.0),
        snapshot(20.0, 2.0),
        snapshot(30.0, 3.0),
    ]
    .iter()
    .map(|s| encode_record(s).expect("Should encode"))
    .collect::<String>();
    std::fs::write(guard.path(), batch).expect("Should write batch");

    let (status, body) = get_metrics(guard.channel()).await;

    assert_eq!(status, StatusCode::OK);
    let served: Snapshot = serde_json::from_value(body).expect("Should be a snapshot");
    assert_eq!(served, snapshot(30.0, 3.0));
}

#[tokio::test]
async fn test_repeated_reads_return_same_record() {
    let guard = FileChannel::acquire(temp_channel_path()).expect("Should create channel");
    guard
        .channel()
        .publish(&snapshot(55.0, 100.0))
        .await
        .expect("Should publish");

    let (first_status, first) = get_metrics(guard.channel()).await;
    let (second_status, second) = get_metrics(guard.channel()).await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_truncated_record_is_500() {
    let guard = FileChannel::acquire(temp_channel_path()).expect("Should create channel");
    let record = encode_record(&snapshot(1.0, 1.0)).expect("Should encode");
    std::fs::write(guard.path(), &record[..record.len() / 2]).expect("Should write");

    let (status, body) = get_metrics(guard.channel()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().expect("error should be a string");
    assert!(!message.is_empty());
}

#[tokio::test]
async fn test_end_to_end_collector_to_server() {
    let guard: ChannelGuard =
        FileChannel::acquire(temp_channel_path()).expect("Should create channel");
    let baseline = RawReading {
        cpu_percent: 0.0,
        memory_percent: 0.0,
        disk: IoCounters::new(10_000, 5_000),
        net: IoCounters::new(700, 300),
        load_avg: 0.0,
    };
    let next = RawReading {
        cpu_percent: 85.0,
        memory_percent: 40.0,
        disk: IoCounters::new(11_000, 6_048),
        net: IoCounters::new(900, 612),
        load_avg: 1.5,
    };

    let mut collector = Collector::new(
        FixedSource {
            readings: vec![baseline, next],
            next: 0,
        },
        guard.channel(),
        Backoff::default(),
    );
    let published = collector.tick().await.expect("Should publish");

    let (status, body) = get_metrics(Arc::new(FileChannel::open(guard.path()))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cpu_percent"], 85.0);
    assert_eq!(body["memory_percent"], 40.0);
    assert_eq!(body["disk_io_bytes"], 2048);
    assert_eq!(body["net_io_bytes"], 512);
    assert_eq!(body["load_avg"], 1.5);
    let timestamp = body["timestamp"].as_f64().expect("timestamp should be a number");
    assert_eq!(timestamp, published.timestamp);
}

#[tokio::test]
async fn test_corrupt_channel_does_not_affect_collector() {
    let guard = FileChannel::acquire(temp_channel_path()).expect("Should create channel");
    std::fs::write(guard.path(), "{not json").expect("Should write garbage");

    let reading = RawReading {
        cpu_percent: 12.0,
        ..RawReading::default()
    };
    let mut collector = Collector::new(
        FixedSource {
            readings: vec![reading],
            next: 0,
        },
        guard.channel(),
        Backoff::default(),
    );

    let (status, _) = get_metrics(guard.channel()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    collector.tick().await.expect("Collector should publish over garbage");
    let (status, body) = get_metrics(guard.channel()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cpu_percent"], 12.0);
}

#[tokio::test]
async fn test_guard_drop_makes_channel_absent() {
    let path = temp_channel_path();
    let guard = FileChannel::acquire(&path).expect("Should create channel");
    guard
        .channel()
        .publish(&snapshot(5.0, 5.0))
        .await
        .expect("Should publish");
    drop(guard);

    let (status, _) = get_metrics(Arc::new(FileChannel::open(&path))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_concurrent_readers_during_publishing() {
    let guard = FileChannel::acquire(temp_channel_path()).expect("Should create channel");
    let writer = guard.channel();
    writer
        .publish(&snapshot(0.0, 1.0))
        .await
        .expect("Should publish");

    let publisher = tokio::spawn(async move {
        for i in 1..50 {
            writer
                .publish(&snapshot(i as f64, 1.0 + i as f64))
                .await
                .expect("Should publish");
        }
    });

    let readers = (0..20).map(|_| {
        let reader = FileChannel::open(guard.path());
        tokio::spawn(async move { reader.latest().await })
    });
    let results = futures_util::future::join_all(readers).await;
    publisher.await.expect("Publisher should finish");

    for result in results {
        let snapshot = result
            .expect("Reader task should complete")
            .expect("Readers should never see a partial record");
        assert_eq!(snapshot.memory_percent, 40.0);
    }
}
