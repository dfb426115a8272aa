//! Integration tests for sender-listener communication over loopback.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use twamp_light::error::TwampError;
use twamp_light::listener::Listener;
use twamp_light::metrics::MetricsSink;
use twamp_light::sender::Sender;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Test sink counting into plain atomics.
#[derive(Default)]
struct CountingSink {
    probes_sent: AtomicU64,
    probes_received: AtomicU64,
    packets_dropped: AtomicU64,
    rtt_observations: AtomicU64,
}

impl MetricsSink for CountingSink {
    fn inc_probes_sent(&self) {
        self.probes_sent.fetch_add(1, Ordering::Relaxed);
    }
    fn inc_probes_received(&self) {
        self.probes_received.fetch_add(1, Ordering::Relaxed);
    }
    fn inc_packets_dropped(&self) {
        self.packets_dropped.fetch_add(1, Ordering::Relaxed);
    }
    fn observe_rtt(&self, _seconds: f64) {
        self.rtt_observations.fetch_add(1, Ordering::Relaxed);
    }
}

struct ListenerHandle {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Result<(), TwampError>>,
}

async fn start_listener(metrics: Option<Arc<dyn MetricsSink>>) -> ListenerHandle {
    let listener = Listener::bind("127.0.0.1:0", 2048, metrics)
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let (shutdown, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(async move { listener.run(shutdown_rx).await });
    ListenerHandle {
        addr,
        shutdown,
        task,
    }
}

async fn new_sender(remote: SocketAddr) -> Sender {
    Sender::new("127.0.0.1:0", remote, Duration::from_secs(1), None)
        .await
        .expect("create sender")
}

fn assert_rtt_plausible(rtt: Duration) {
    assert!(rtt > Duration::ZERO, "RTT should be positive");
    assert!(
        rtt < Duration::from_millis(100),
        "loopback RTT should be under 100ms, got {:?}",
        rtt
    );
}

#[tokio::test]
async fn test_sender_to_listener_with_padding() {
    init_logging();
    let listener = start_listener(None).await;
    let sender = new_sender(listener.addr).await;

    let res = sender
        .send_probe_with_padding(64)
        .await
        .expect("probe should succeed");
    assert_rtt_plausible(res.rtt);
    assert!(res.received >= res.sent);

    let summary = sender.summary();
    assert_eq!(summary.count, 1);
    assert_eq!(summary.lost, 0);
}

#[tokio::test]
async fn test_multiple_padding_sizes() {
    init_logging();
    let listener = start_listener(None).await;
    let sender = new_sender(listener.addr).await;

    for pad in [0usize, 16, 128, 512] {
        let res = sender
            .send_probe_with_padding(pad)
            .await
            .unwrap_or_else(|e| panic!("probe with padding {} failed: {}", pad, e));
        assert_rtt_plausible(res.rtt);
    }

    assert_eq!(sender.summary().count, 4);
}

#[tokio::test]
async fn test_sender_timeout_records_loss() {
    init_logging();
    // Nothing listens on this port; the probe must time out.
    let remote: SocketAddr = "127.0.0.1:65000".parse().unwrap();
    let sender = Sender::new("127.0.0.1:0", remote, Duration::from_millis(100), None)
        .await
        .expect("create sender");

    let start = Instant::now();
    let err = sender.send_probe().await.expect_err("probe should fail");
    let elapsed = start.elapsed();

    assert!(matches!(err, TwampError::Timeout(_)), "got {:?}", err);
    assert!(
        elapsed >= Duration::from_millis(100) && elapsed < Duration::from_millis(500),
        "timeout should fire near 100ms, took {:?}",
        elapsed
    );

    let summary = sender.summary();
    assert_eq!(summary.count, 0);
    assert_eq!(summary.lost, 1);

    // The sender stays usable after a timeout.
    let err = sender.send_probe().await.expect_err("still no reflector");
    assert!(matches!(err, TwampError::Timeout(_)));
    assert_eq!(sender.summary().lost, 2);
}

#[tokio::test]
async fn test_concurrent_probes_distinct_sequences() {
    init_logging();
    let listener = start_listener(None).await;
    let sender = Arc::new(new_sender(listener.addr).await);

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let sender = sender.clone();
        tasks.push(tokio::spawn(async move {
            sender.send_probe_with_padding(32).await
        }));
    }

    let mut seqs = Vec::new();
    for task in tasks {
        let res = task.await.expect("task panicked").expect("probe failed");
        assert_rtt_plausible(res.rtt);
        seqs.push(res.seq);
    }

    seqs.sort_unstable();
    assert_eq!(seqs, (0u32..10).collect::<Vec<_>>());

    let summary = sender.summary();
    assert_eq!(summary.count, 10);
    assert_eq!(summary.lost, 0);
    assert_eq!(summary.count + summary.lost, 10);
}

#[tokio::test]
async fn test_malformed_datagrams_dropped_without_killing_loop() {
    init_logging();
    let sink = Arc::new(CountingSink::default());
    let listener = start_listener(Some(sink.clone())).await;

    // Two datagrams below the 24-byte minimum: dropped, never reflected.
    let raw = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    raw.send_to(&[0u8; 10], listener.addr).await.unwrap();
    raw.send_to(&[0u8; 23], listener.addr).await.unwrap();

    // Let the listener drain the malformed datagrams before probing.
    tokio::time::sleep(Duration::from_millis(50)).await;

    // A valid probe afterwards proves the loop survived; the listener is
    // strictly sequential, so its reply also orders the drops before it.
    let sender = new_sender(listener.addr).await;
    let res = sender.send_probe().await.expect("probe should succeed");
    assert_rtt_plausible(res.rtt);

    assert_eq!(sink.packets_dropped.load(Ordering::Relaxed), 2);
    assert_eq!(sink.probes_received.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_sender_metrics_reported() {
    init_logging();
    let listener = start_listener(None).await;
    let sink = Arc::new(CountingSink::default());
    let sender = Sender::new(
        "127.0.0.1:0",
        listener.addr,
        Duration::from_secs(1),
        Some(sink.clone() as Arc<dyn MetricsSink>),
    )
    .await
    .expect("create sender");

    sender.send_probe().await.expect("probe should succeed");

    assert_eq!(sink.probes_sent.load(Ordering::Relaxed), 1);
    assert_eq!(sink.rtt_observations.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_listener_stops_on_shutdown_signal() {
    init_logging();
    let listener = start_listener(None).await;

    listener.shutdown.send(true).expect("send shutdown");

    // Cancellation latency is bounded by the 1s poll interval.
    let result = tokio::time::timeout(Duration::from_millis(1500), listener.task)
        .await
        .expect("listener should stop within the poll bound")
        .expect("listener task panicked");
    assert!(result.is_ok(), "shutdown is a clean stop: {:?}", result);
}

#[tokio::test]
async fn test_summary_reset_starts_new_session() {
    init_logging();
    let listener = start_listener(None).await;
    let sender = new_sender(listener.addr).await;

    sender.send_probe().await.expect("probe should succeed");
    assert_eq!(sender.summary().count, 1);

    sender.reset_summary();
    let summary = sender.summary();
    assert_eq!(summary.count, 0);
    assert_eq!(summary.lost, 0);
    assert_eq!(summary.min_rtt, Duration::ZERO);

    // Sequence numbers keep climbing across summary resets.
    let res = sender.send_probe().await.expect("probe should succeed");
    assert_eq!(res.seq, 1);
    assert_eq!(sender.summary().count, 1);
}
