use chrono::{TimeZone, Utc};
use domain::{FieldValue, MachineRecord};
use mbridge_storage::{InfluxConfig, InfluxSink, RecordSink};
use std::collections::BTreeMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// 单次请求的 HTTP 桩：返回固定响应，并交回收到的原始请求。
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("http://{}", listener.local_addr().expect("addr"));
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.expect("read");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request_complete(&request) {
                break;
            }
        }
        let response = format!(
            "{}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write");
        socket.shutdown().await.expect("shutdown");
        String::from_utf8(request).expect("utf8")
    });
    (url, handle)
}

fn request_complete(request: &[u8]) -> bool {
    let text = String::from_utf8_lossy(request);
    let Some((head, body)) = text.split_once("\r\n\r\n") else {
        return false;
    };
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    body.len() >= content_length
}

fn sink(url: String, token: &str) -> InfluxSink {
    InfluxSink::new(InfluxConfig {
        url,
        token: token.to_string(),
        org: "my-org".to_string(),
        bucket: "machine".to_string(),
        measurement: "machine".to_string(),
    })
    .expect("sink")
}

fn sample_record() -> MachineRecord {
    let mut fields = BTreeMap::new();
    fields.insert("temperature".to_string(), FieldValue::F64(21.5));
    MachineRecord {
        machine_id: "42".to_string(),
        fields,
        ts: Utc.timestamp_opt(1_700_000_000, 0).single().expect("ts"),
    }
}

#[tokio::test]
async fn write_posts_line_protocol_with_token() {
    let (url, server) = serve_once("HTTP/1.1 204 No Content", "").await;
    let sink = sink(url, "secret-token");

    sink.write(&sample_record()).await.expect("write");

    let request = server.await.expect("server");
    let request_line = request.lines().next().expect("request line");
    assert!(request_line.starts_with("POST /api/v2/write?"));
    assert!(request_line.contains("org=my-org"));
    assert!(request_line.contains("bucket=machine"));
    assert!(request_line.contains("precision=ns"));
    assert!(
        request
            .to_ascii_lowercase()
            .contains("authorization: token secret-token")
    );
    assert!(request.ends_with("machine,machine_id=42 temperature=21.5 1700000000000000000"));
}

#[tokio::test]
async fn write_reports_rejected_request() {
    let (url, server) = serve_once(
        "HTTP/1.1 401 Unauthorized",
        r#"{"code":"unauthorized","message":"unauthorized access"}"#,
    )
    .await;
    let sink = sink(url, "wrong");

    let err = sink.write(&sample_record()).await.expect_err("rejected");
    assert!(err.to_string().contains("401"));
    server.await.expect("server");
}

#[tokio::test]
async fn health_passes_on_pass_status() {
    let (url, server) = serve_once("HTTP/1.1 200 OK", r#"{"name":"influxdb","status":"pass"}"#).await;
    let sink = sink(url, "");

    sink.health().await.expect("health");

    let request = server.await.expect("server");
    assert!(request.starts_with("GET /health "));
    assert!(!request.to_ascii_lowercase().contains("authorization:"));
}

#[tokio::test]
async fn health_fails_on_fail_status() {
    let (url, server) = serve_once("HTTP/1.1 200 OK", r#"{"name":"influxdb","status":"fail"}"#).await;
    let sink = sink(url, "");

    let err = sink.health().await.expect_err("unhealthy");
    assert!(err.to_string().contains("fail"));
    server.await.expect("server");
}

#[tokio::test]
async fn health_fails_when_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);

    assert!(sink(url, "").health().await.is_err());
}
