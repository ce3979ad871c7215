//! HTTP connector against a throwaway local server

#![cfg(feature = "http")]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use quakesense_connectors::{
    AsyncConnector, Connector, DeliveryPolicy, Delivery, EventPublisher, HttpConfig, HttpConnector, HttpError,
    SEISMIC_EVENT_PATH,
};
use quakesense_core::events::{DeviceId, RawSeismicEventBuilder};
use quakesense_schemas::{EventCodec, WireFormat};

struct Captured {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

fn read_request(stream: &mut std::net::TcpStream) -> Captured {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = HashMap::new();
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).unwrap();
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let len: usize = headers.get("content-length").and_then(|v| v.parse().ok()).unwrap_or(0);
    let mut body = vec![0; len];
    reader.read_exact(&mut body).unwrap();

    Captured {
        method,
        path,
        headers,
        body,
    }
}

/// Answers one connection per status in `statuses`, then stops
fn serve(statuses: Vec<u16>) -> (String, mpsc::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for status in statuses {
            let Ok((mut stream, _)) = listener.accept() else { return };
            let request = read_request(&mut stream);
            let _ = tx.send(request);

            let (reason, body) = match status {
                200 => ("OK", r#"{"status":"success"}"#),
                400 => ("Bad Request", r#"{"error":"missing fields"}"#),
                _ => ("Service Unavailable", ""),
            };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    (format!("http://{}", addr), rx)
}

fn config(base: &str) -> HttpConfig {
    HttpConfig::new(base).timeout_ms(2_000).backoff_ms(10, 40).max_retries(2)
}

fn event() -> quakesense_core::events::RawSeismicEvent {
    RawSeismicEventBuilder::new(DeviceId::new("ESP32-HTTP").unwrap(), 123_456)
        .axes(2.1, 0.9, 0.4)
        .sound(300, false)
        .duration_ms(640)
        .build()
}

#[test]
fn publisher_posts_json_envelope() {
    let (base, rx) = serve(vec![200]);
    let http = HttpConnector::new(config(&base).bearer_token("station-7")).unwrap();
    let codec = EventCodec::new(WireFormat::Json).unwrap();
    let mut publisher = EventPublisher::new(http, codec.clone(), DeliveryPolicy::default()).unwrap();

    assert_eq!(publisher.publish_event(&event(), None).unwrap(), Delivery::Sent);

    let req = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, SEISMIC_EVENT_PATH);
    assert_eq!(req.headers["content-type"], "application/json");
    assert_eq!(req.headers["authorization"], "Bearer station-7");
    assert_eq!(codec.decode(&req.body).unwrap(), event());

    let json: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
    assert_eq!(json["device_id"], "ESP32-HTTP");
    assert_eq!(publisher.connector().stats().messages_sent, 1);
}

#[test]
fn sync_send_makes_one_attempt() {
    let (base, rx) = serve(vec![503]);
    let mut http = HttpConnector::new(config(&base)).unwrap();

    let err = Connector::send(&mut http, SEISMIC_EVENT_PATH, b"{}").unwrap_err();
    assert!(matches!(err, HttpError::ServerError { status: 503, .. }));
    assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    assert_eq!(http.stats().messages_failed, 1);
}

#[test]
fn basic_auth_header() {
    let (base, rx) = serve(vec![200]);
    let mut http = HttpConnector::new(config(&base).basic_auth("edge", "s3cret")).unwrap();
    Connector::send(&mut http, "/x", b"{}").unwrap();

    let req = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    // base64("edge:s3cret")
    assert_eq!(req.headers["authorization"], "Basic ZWRnZTpzM2NyZXQ=");
}

#[tokio::test]
async fn async_send_retries_server_errors() {
    let (base, rx) = serve(vec![503, 503, 200]);
    let mut http = HttpConnector::new(config(&base)).unwrap();

    AsyncConnector::send(&mut http, SEISMIC_EVENT_PATH, br#"{"a":1}"#)
        .await
        .unwrap();

    let attempts: Vec<_> = rx.try_iter().collect();
    assert_eq!(attempts.len(), 3);
    let stats = AsyncConnector::stats(&http);
    assert_eq!(stats.retries, 2);
    assert_eq!(stats.messages_sent, 1);
}

#[tokio::test]
async fn async_typed_send_carries_avro_content_type() {
    let (base, rx) = serve(vec![503, 200]);
    let mut http = HttpConnector::new(config(&base)).unwrap();
    let body = EventCodec::new(WireFormat::Avro).unwrap().encode(&event()).unwrap();

    AsyncConnector::send_typed(&mut http, SEISMIC_EVENT_PATH, &body, "avro/binary")
        .await
        .unwrap();

    let attempts: Vec<_> = rx.try_iter().collect();
    assert_eq!(attempts.len(), 2);
    assert!(attempts.iter().all(|req| req.headers["content-type"] == "avro/binary"));
    assert_eq!(attempts[1].body, body);
}

#[tokio::test]
async fn async_send_gives_up_after_budget() {
    let (base, _rx) = serve(vec![503, 503, 503]);
    let mut http = HttpConnector::new(config(&base)).unwrap();

    let err = AsyncConnector::send(&mut http, SEISMIC_EVENT_PATH, b"{}").await.unwrap_err();
    assert!(matches!(err, HttpError::ServerError { status: 503, .. }));
    assert_eq!(AsyncConnector::stats(&http).messages_failed, 1);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let (base, rx) = serve(vec![400, 200]);
    let http = HttpConnector::new(config(&base)).unwrap();

    let err = http.post(SEISMIC_EVENT_PATH, &serde_json::json!({})).await.unwrap_err();
    assert!(matches!(err, HttpError::ServerError { status: 400, ref message } if message.contains("missing")));
    assert_eq!(rx.try_iter().count(), 1);
}

#[test]
fn unreachable_server_is_dropped_by_default() {
    // Bind then release a port so nothing listens on it
    let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let http = HttpConnector::new(config(&format!("http://{}", addr))).unwrap();
    let mut publisher =
        EventPublisher::new(http, EventCodec::new(WireFormat::Json).unwrap(), DeliveryPolicy::default()).unwrap();

    assert_eq!(publisher.publish_event(&event(), None).unwrap(), Delivery::Dropped);
    assert_eq!(publisher.stats().dropped, 1);
}
