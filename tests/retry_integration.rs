//! Integration tests for the retry loop in the download engine.
//!
//! Transient failures are simulated with wiremock mocks that expire after a
//! fixed number of matches (`up_to_n_times`), letting a later success mock
//! take over. Tests use a millisecond-scale base delay so real backoff
//! sleeps stay fast.

use std::time::{Duration, Instant};

use dsfetch::download::{
    DownloadEngine, DownloadTask, HttpClient, RetryPolicy, TaskResult,
};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_five_attempt_policy() -> RetryPolicy {
    RetryPolicy::new(5, Duration::from_millis(10), 2.0)
}

#[tokio::test]
async fn test_endpoint_failing_four_times_succeeds_on_fifth_attempt() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let content = b"the eventual series archive";

    // First four requests fail with a server error, then the mock expires
    // and the success mock takes over.
    Mock::given(method("GET"))
        .and(path("/getImage"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(4)
        .expect(4)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/getImage"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let engine = DownloadEngine::new(fast_five_attempt_policy());
    let client = HttpClient::new();
    let dest = temp_dir.path().join("series_1.zip");
    let task = DownloadTask::new(
        format!("{}/getImage?SeriesInstanceUID=1.2.3", mock_server.uri()),
        &dest,
        "1.2.3",
    );

    let start = Instant::now();
    let result = engine.run(&client, &task).await;
    let elapsed = start.elapsed();

    match result {
        TaskResult::Completed { bytes, attempts } => {
            assert_eq!(attempts, 5, "success must land on the fifth attempt");
            assert_eq!(bytes, content.len() as u64);
        }
        other => panic!("expected completion, got {other:?}"),
    }
    assert_eq!(std::fs::read(&dest).unwrap(), content);
    // Backoff between the five attempts: 10 + 20 + 40 + 80 ms.
    assert!(
        elapsed >= Duration::from_millis(150),
        "expected at least 150ms of backoff, got {elapsed:?}"
    );
}

#[tokio::test]
async fn test_always_failing_endpoint_stops_after_exactly_five_attempts() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/getImage"))
        .respond_with(ResponseTemplate::new(500))
        .expect(5)
        .mount(&mock_server)
        .await;

    let engine = DownloadEngine::new(fast_five_attempt_policy());
    let client = HttpClient::new();
    let dest = temp_dir.path().join("series_1.zip");
    let task = DownloadTask::new(
        format!("{}/getImage?SeriesInstanceUID=1.2.3", mock_server.uri()),
        &dest,
        "1.2.3",
    );

    let result = engine.run(&client, &task).await;

    match result {
        TaskResult::Failed { attempts, .. } => assert_eq!(attempts, 5),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(
        !dest.exists(),
        "No destination file may be left behind by failed attempts"
    );
    // Mock expectations verify exactly 5 requests were made.
}

/// Serves one HTTP response per entry in `bodies`: `Content-Length` always
/// advertises `full_len` bytes, but only the entry's bytes are written
/// before the connection closes. Entries shorter than `full_len` simulate a
/// connection dropped mid-stream.
async fn spawn_flaky_byte_server(full_len: usize, bodies: Vec<Vec<u8>>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind an ephemeral port");
    let addr = listener.local_addr().expect("should have a local addr");
    tokio::spawn(async move {
        for body in bodies {
            let (mut socket, _) = listener.accept().await.expect("should accept");
            let mut buf = [0u8; 1024];
            // The request fits in one read for these tests.
            let _ = socket.read(&mut buf).await;
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {full_len}\r\nConnection: close\r\n\r\n"
            );
            socket.write_all(header.as_bytes()).await.expect("header write");
            socket.write_all(&body).await.expect("body write");
        }
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_truncated_attempt_is_retried_and_not_reported_as_skipped() {
    let body: &[u8] = b"0123456789abcdef0123456789abcdef";
    // First connection drops after 8 bytes; the second serves the full body.
    let base = spawn_flaky_byte_server(body.len(), vec![body[..8].to_vec(), body.to_vec()]).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dest = temp_dir.path().join("series_1.zip");

    let engine = DownloadEngine::new(fast_five_attempt_policy());
    let client = HttpClient::new();
    let task = DownloadTask::new(format!("{base}/series_1.zip"), &dest, "1.2.3");

    let result = engine.run(&client, &task).await;

    match result {
        TaskResult::Completed { bytes, attempts } => {
            assert_eq!(attempts, 2, "the truncated attempt must be re-requested");
            assert_eq!(bytes, body.len() as u64);
        }
        other => panic!("expected completion after a retry, got {other:?}"),
    }
    assert_eq!(
        std::fs::read(&dest).unwrap(),
        body,
        "the file on disk must be the full body, not the truncated prefix"
    );
}

#[tokio::test]
async fn test_no_retry_policy_makes_a_single_attempt() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/tile.tiff"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let engine = DownloadEngine::new(RetryPolicy::no_retry());
    let client = HttpClient::new();
    let task = DownloadTask::new(
        format!("{}/tile.tiff", mock_server.uri()),
        temp_dir.path().join("tile.tiff"),
        "tile.tiff",
    );

    let result = engine.run(&client, &task).await;
    assert!(matches!(result, TaskResult::Failed { attempts: 1, .. }));
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let engine = DownloadEngine::new(fast_five_attempt_policy());
    let client = HttpClient::new();
    let task = DownloadTask::new("::not-a-url::", temp_dir.path().join("x.bin"), "x");

    let result = engine.run(&client, &task).await;
    assert!(
        matches!(result, TaskResult::Failed { attempts: 1, .. }),
        "invalid URLs must fail without retry attempts"
    );
}

#[tokio::test]
async fn test_one_failing_task_does_not_prevent_subsequent_downloads() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/bad.zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/good.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"good bytes".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let engine = DownloadEngine::new(RetryPolicy::no_retry());
    let client = HttpClient::new();
    let good_dest = temp_dir.path().join("good.zip");
    let tasks = vec![
        DownloadTask::new(
            format!("{}/bad.zip", mock_server.uri()),
            temp_dir.path().join("bad.zip"),
            "bad",
        ),
        DownloadTask::new(format!("{}/good.zip", mock_server.uri()), &good_dest, "good"),
    ];

    let stats = engine.run_batch(&client, &tasks).await;

    assert_eq!(stats.failed(), 1);
    assert_eq!(stats.completed(), 1);
    assert_eq!(stats.total(), 2);
    assert_eq!(std::fs::read(&good_dest).unwrap(), b"good bytes");
}

#[tokio::test]
async fn test_skipped_tasks_count_in_stats() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"bytes".to_vec()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dest = temp_dir.path().join("already.zip");
    std::fs::write(&dest, b"present").unwrap();

    let engine = DownloadEngine::new(RetryPolicy::default());
    let client = HttpClient::new();
    let tasks = vec![DownloadTask::new(
        format!("{}/already.zip", mock_server.uri()),
        &dest,
        "already",
    )];

    let stats = engine.run_batch(&client, &tasks).await;
    assert_eq!(stats.skipped(), 1);
    assert_eq!(stats.completed(), 0);
    assert_eq!(stats.retried(), 0);
}
