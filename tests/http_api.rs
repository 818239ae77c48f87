#![cfg(unix)]

mod common;

use reqwest::StatusCode;
use serde_json::json;

use common::{setup_test_server, VIDEO_URL, WRITE_SUBTITLES};

#[tokio::test]
async fn health_reports_healthy() {
    let fixture = setup_test_server("exit 0", |_| {}).await;

    let response = fixture
        .client
        .get(format!("{}/health", fixture.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "healthy"}));
}

#[tokio::test]
async fn transcript_is_returned_as_plain_text() {
    let fixture = setup_test_server(WRITE_SUBTITLES, |_| {}).await;

    let response = fixture
        .client
        .post(format!("{}/api/transcript", fixture.base_url))
        .json(&json!({ "url": VIDEO_URL }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"), "{content_type}");
    assert_eq!(response.text().await.unwrap(), "Hello from captions");

    // The cookie jar lived in a per-attempt directory that is gone now
    let cookies = fixture.cookie_paths();
    assert_eq!(cookies.len(), 1);
    assert!(!cookies[0].exists());
    assert!(!cookies[0].parent().unwrap().exists());
}

#[tokio::test]
async fn non_youtube_url_is_rejected_without_running_downloader() {
    let fixture = setup_test_server(WRITE_SUBTITLES, |_| {}).await;

    let response = fixture
        .client
        .post(format!("{}/api/transcript", fixture.base_url))
        .json(&json!({ "url": "https://example.com/video" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid YouTube URL");
    assert_eq!(fixture.runs(), 0);
}

#[tokio::test]
async fn missing_url_is_rejected() {
    let fixture = setup_test_server(WRITE_SUBTITLES, |_| {}).await;

    let response = fixture
        .client
        .post(format!("{}/api/transcript", fixture.base_url))
        .header("content-type", "application/json")
        .body("{\"link\": \"https://youtu.be/abc123\"}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("YouTube URL"));
}

#[tokio::test]
async fn rate_limit_is_retried_until_success() {
    let counter_body = format!(
        r#"
count=$(cat "$(dirname "$0")/count" 2>/dev/null || echo 0)
count=$((count + 1))
echo "$count" > "$(dirname "$0")/count"
if [ "$count" -le 2 ]; then
  echo "ERROR: [youtube] abc123: Unable to download video subtitles: HTTP Error 429: Too Many Requests" >&2
  exit 1
fi
{WRITE_SUBTITLES}"#
    );
    let fixture = setup_test_server(&counter_body, |_| {}).await;

    let response = fixture
        .client
        .post(format!("{}/api/transcript", fixture.base_url))
        .json(&json!({ "url": VIDEO_URL }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "Hello from captions");
    assert_eq!(fixture.runs(), 3);
}

#[tokio::test]
async fn persistent_rate_limit_yields_503() {
    let body = r#"
echo "ERROR: HTTP Error 429: Too Many Requests" >&2
exit 1
"#;
    let fixture = setup_test_server(body, |config| config.retry.max_retries = 2).await;

    let response = fixture
        .client
        .post(format!("{}/api/transcript", fixture.base_url))
        .json(&json!({ "url": VIDEO_URL }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some());
    assert_eq!(fixture.runs(), 2);
}

#[tokio::test]
async fn missing_subtitles_yield_503_after_all_attempts() {
    let fixture = setup_test_server("exit 0", |_| {}).await;

    let response = fixture
        .client
        .post(format!("{}/api/transcript", fixture.base_url))
        .json(&json!({ "url": "https://youtu.be/abc123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(fixture.runs(), 3);
    for cookies in fixture.cookie_paths() {
        assert!(!cookies.parent().unwrap().exists());
    }
}

#[tokio::test]
async fn hung_downloader_is_killed_and_reported() {
    let fixture = setup_test_server(
        r#"echo $$ > "$(dirname "$0")/downloader.pid"
exec sleep 30"#,
        |config| {
            config.extractor.timeout_secs = 1;
            config.retry.max_retries = 1;
        },
    )
    .await;

    let started = std::time::Instant::now();
    let response = fixture
        .client
        .post(format!("{}/api/transcript", fixture.base_url))
        .json(&json!({ "url": VIDEO_URL }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(started.elapsed() < std::time::Duration::from_secs(10));

    let pid = fs_err::read_to_string(fixture.dir.path().join("downloader.pid")).unwrap();
    let alive = std::process::Command::new("kill")
        .args(["-0", pid.trim()])
        .stderr(std::process::Stdio::null())
        .status()
        .unwrap()
        .success();
    assert!(!alive, "downloader {} still running after timeout", pid.trim());
}

#[tokio::test]
async fn lingering_output_pipe_does_not_outlast_timeout() {
    // Exits straight away but leaves a background job holding stdout
    let body = format!("{WRITE_SUBTITLES}\nsleep 8 &\nexit 0\n");
    let fixture = setup_test_server(&body, |config| {
        config.extractor.timeout_secs = 1;
        config.retry.max_retries = 1;
    })
    .await;

    let started = std::time::Instant::now();
    let response = fixture
        .client
        .post(format!("{}/api/transcript", fixture.base_url))
        .json(&json!({ "url": VIDEO_URL }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(
        started.elapsed() < std::time::Duration::from_secs(5),
        "took {:?}",
        started.elapsed()
    );
}
