// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// HTTP endpoint tests against a scripted local gateway

use std::sync::Arc;
use stream_batcher::config::HttpEndpointConfig;
use stream_batcher::{
    BatchingProducer, Datum, EndpointError, HttpEndpoint, ProducerError, PutRecordRequest,
    RecordKey, StreamEndpoint,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A request as seen by the scripted gateway
struct CapturedRequest {
    head: String,
    body: Vec<u8>,
}

/// Serve one scripted response per connection, in order, and hand back the requests
async fn scripted_gateway(
    responses: Vec<(u16, &'static str)>,
) -> (String, JoinHandle<Vec<CapturedRequest>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut captured = Vec::new();
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut buf = Vec::new();
            let mut chunk = [0u8; 8192];
            let header_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };

            let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .map(|v| v.trim().parse::<usize>().unwrap())
                .unwrap_or(0);
            while buf.len() < header_end + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before body");
                buf.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 {} Scripted\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            captured.push(CapturedRequest {
                head,
                body: buf[header_end..header_end + content_length].to_vec(),
            });
        }
        captured
    });

    (url, handle)
}

fn endpoint(url: &str, api_token: Option<&str>) -> HttpEndpoint {
    HttpEndpoint::new(HttpEndpointConfig {
        url: url.to_string(),
        api_token: api_token.map(str::to_string),
        timeout_seconds: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_put_record_round_trip() {
    let (url, gateway) = scripted_gateway(vec![(
        200,
        r#"{"sequence_number":"00000000000000000042","shard_id":"shardId-000000000001"}"#,
    )])
    .await;
    let ep = endpoint(&url, Some("secret"));

    let response = ep
        .put_record(PutRecordRequest {
            stream_name: "orders".to_string(),
            data: bytes::Bytes::from_static(b"hello"),
            partition_key: "pk-1".to_string(),
            explicit_hash_key: None,
            sequence_number_for_ordering: Some("0".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(response.sequence_number, "00000000000000000042");
    assert_eq!(response.shard_id, "shardId-000000000001");

    let requests = gateway.await.unwrap();
    let request = &requests[0];
    assert!(request.head.starts_with("post /streams/orders/records http/1.1"));
    assert!(request.head.contains("x-partition-key: pk-1"));
    assert!(request.head.contains("x-sequence-number-for-ordering: 0"));
    assert!(request.head.contains("authorization: bearer secret"));
    assert_eq!(request.body, b"hello");
}

#[tokio::test]
async fn test_put_records_round_trip() {
    let (url, gateway) = scripted_gateway(vec![(
        200,
        r#"{"failed_record_count":1,"records":[{"sequence_number":"1","shard_id":"s"},{"error_code":"InternalFailure","error_message":"boom"}]}"#,
    )])
    .await;
    let ep = endpoint(&url, None);

    let records = vec![
        Datum::new(&b"first"[..], RecordKey::Partition("a".to_string())),
        Datum::new(&b"second"[..], RecordKey::ExplicitHash("77".to_string())),
    ];
    let response = ep.put_records("orders", &records).await.unwrap();

    assert_eq!(response.failed_record_count, 1);
    assert!(response.records[0].is_success());
    assert_eq!(response.records[1].error_code.as_deref(), Some("InternalFailure"));

    let requests = gateway.await.unwrap();
    let request = &requests[0];
    assert!(request.head.starts_with("post /streams/orders/batch http/1.1"));
    assert!(request.head.contains("content-type: application/json"));
    assert!(!request.head.contains("authorization"));

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    let sent = body["records"].as_array().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["partition_key"], "a");
    assert_eq!(sent[0]["data"], serde_json::json!(b"first".to_vec()));
    assert_eq!(sent[1]["explicit_hash_key"], "77");
    assert_eq!(sent[1]["data"], serde_json::json!(b"second".to_vec()));
}

#[tokio::test]
async fn test_full_batch_is_delivered() {
    let response = format!(
        r#"{{"records":[{}]}}"#,
        vec![r#"{"sequence_number":"1","shard_id":"s"}"#; 500].join(",")
    );
    let (url, gateway) = scripted_gateway(vec![(200, Box::leak(response.into_boxed_str()))]).await;
    let mut producer = BatchingProducer::builder("orders", Arc::new(endpoint(&url, None)))
        .ordered(false)
        .build();

    let key = "k".repeat(256);
    let records: Vec<Vec<u8>> = (0..500).map(|i| format!("record-{}", i).into_bytes()).collect();
    producer
        .submit_many(records, Some(key.as_str()), None)
        .await
        .unwrap();
    let response = producer.flush().await.unwrap().unwrap();
    assert_eq!(response.records.len(), 500);

    let requests = gateway.await.unwrap();
    // One header block regardless of the batch size
    assert!(requests[0].head.lines().count() < 10);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let sent = body["records"].as_array().unwrap();
    assert_eq!(sent.len(), 500);
    assert_eq!(sent[499]["data"], serde_json::json!(b"record-499".to_vec()));
}

#[tokio::test]
async fn test_error_status_is_surfaced() {
    let (url, gateway) = scripted_gateway(vec![(503, "throughput exceeded")]).await;
    let ep = endpoint(&url, None);

    let records = vec![Datum::new(&b"x"[..], RecordKey::Partition("k".to_string()))];
    let err = ep.put_records("orders", &records).await.unwrap_err();

    match err {
        EndpointError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "throughput exceeded");
        }
        other => panic!("expected status error, got {:?}", other),
    }
    gateway.await.unwrap();
}

#[tokio::test]
async fn test_status_survives_truncated_error_body() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 8192];
        while !request.ends_with(b"}]}") {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before body");
            request.extend_from_slice(&chunk[..n]);
        }
        // Promise 100 bytes, deliver 5, hang up
        socket
            .write_all(b"HTTP/1.1 502 Bad Gateway\r\ncontent-length: 100\r\n\r\nshort")
            .await
            .unwrap();
        socket.shutdown().await.ok();
    });
    let ep = endpoint(&url, None);

    let records = vec![Datum::new(&b"x"[..], RecordKey::Partition("k".to_string()))];
    let err = ep.put_records("orders", &records).await.unwrap_err();

    match err {
        EndpointError::Status { status, body } => {
            assert_eq!(status, 502);
            assert!(body.is_empty());
        }
        other => panic!("expected status error, got {:?}", other),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_undecodable_response() {
    let (url, gateway) = scripted_gateway(vec![(200, "not json")]).await;
    let ep = endpoint(&url, None);

    let records = vec![Datum::new(&b"x"[..], RecordKey::Partition("k".to_string()))];
    let err = ep.put_records("orders", &records).await.unwrap_err();

    assert!(matches!(err, EndpointError::Decode(_)));
    gateway.await.unwrap();
}

#[tokio::test]
async fn test_health_check() {
    let (url, gateway) = scripted_gateway(vec![(200, "{}")]).await;
    let ep = endpoint(&url, None);

    assert!(ep.health_check().await);
    let requests = gateway.await.unwrap();
    assert!(requests[0].head.starts_with("get /health http/1.1"));

    // Nothing listens on the port once the gateway is gone
    assert!(!ep.health_check().await);
}

#[tokio::test]
async fn test_ordered_producer_over_http() {
    let (url, gateway) = scripted_gateway(vec![
        (200, r#"{"sequence_number":"101","shard_id":"s"}"#),
        (200, r#"{"sequence_number":"102","shard_id":"s"}"#),
    ])
    .await;
    let endpoint: Arc<dyn StreamEndpoint> = Arc::new(endpoint(&url, None));
    let mut producer = BatchingProducer::new("orders", endpoint);

    producer.submit_single(&b"a"[..], Some("pk"), None).await.unwrap();
    producer.submit_single(&b"b"[..], Some("pk"), None).await.unwrap();
    assert_eq!(producer.ordering_token(), "102");

    let requests = gateway.await.unwrap();
    assert!(requests[0].head.contains("x-sequence-number-for-ordering: 0"));
    assert!(requests[1].head.contains("x-sequence-number-for-ordering: 101"));
}

#[tokio::test]
async fn test_failed_http_flush_keeps_buffer() {
    let (url, gateway) = scripted_gateway(vec![
        (500, "internal"),
        (200, r#"{"records":[{"sequence_number":"1","shard_id":"s"}]}"#),
    ])
    .await;
    let mut producer = BatchingProducer::builder("orders", Arc::new(endpoint(&url, None)))
        .ordered(false)
        .build();

    producer
        .submit_many(vec![b"payload".to_vec()], Some("k"), None)
        .await
        .unwrap();

    let err = producer.flush().await.unwrap_err();
    assert!(matches!(
        err,
        ProducerError::Endpoint(EndpointError::Status { status: 500, .. })
    ));
    assert_eq!(producer.pending_records(), 1);

    let response = producer.flush().await.unwrap().unwrap();
    assert_eq!(response.records.len(), 1);
    assert!(producer.is_empty());

    let requests = gateway.await.unwrap();
    assert_eq!(requests[0].body, requests[1].body);
}
