//! Tests for the per-connection state machine over in-memory streams

mod common;

use common::TempRoot;
use staticd::files::StaticFiles;
use staticd::http::connection::{Connection, Deadlines};
use staticd::http::parser::MAX_REQUEST_BYTES;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex, split};

fn web_root() -> (TempRoot, Arc<StaticFiles>) {
    let root = TempRoot::new();
    root.file("index.html", b"<h1>home</h1>");
    root.file("notes.txt", b"plain notes\n");
    let files = Arc::new(StaticFiles::new(root.path()).unwrap());
    (root, files)
}

/// Sends `request`, optionally half-closes, and returns everything the server wrote.
async fn exchange(files: Arc<StaticFiles>, request: &[u8], close_write: bool) -> (Vec<u8>, anyhow::Result<()>) {
    let (mut client, server) = duplex(64 * 1024);
    let conn = Connection::new(server, "test-peer", files, Deadlines::default());
    let task = tokio::spawn(conn.run());

    client.write_all(request).await.unwrap();
    if close_write {
        client.shutdown().await.unwrap();
    }

    let mut reply = Vec::new();
    client.read_to_end(&mut reply).await.unwrap();
    (reply, task.await.unwrap())
}

fn split_reply(reply: &[u8]) -> (String, Vec<u8>) {
    let end = reply
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("no header terminator");
    (
        String::from_utf8(reply[..end].to_vec()).unwrap(),
        reply[end + 4..].to_vec(),
    )
}

#[tokio::test]
async fn test_get_existing_file() {
    let (_root, files) = web_root();
    let (reply, result) = exchange(files, b"GET /index.html HTTP/1.1\r\nHost: x\r\n\r\n", false).await;

    result.unwrap();
    let (head, body) = split_reply(&reply);
    assert!(head.starts_with("HTTP/1.0 200 OK\r\n"));
    assert!(head.contains("Content-Type: text/html\r\n"));
    assert!(head.contains("Content-Length: 13"));
    assert_eq!(body, b"<h1>home</h1>");
}

#[tokio::test]
async fn test_head_existing_file() {
    let (_root, files) = web_root();
    let (reply, _) = exchange(files, b"HEAD /notes.txt HTTP/1.0\r\n\r\n", false).await;

    let (head, body) = split_reply(&reply);
    assert!(head.starts_with("HTTP/1.0 200 OK\r\n"));
    assert!(head.contains("Content-Type: text/plain"));
    assert!(head.contains("Content-Length: 12"));
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_missing_file_is_404() {
    let (_root, files) = web_root();
    let (reply, _) = exchange(files, b"GET /ghost.txt HTTP/1.0\r\n\r\n", false).await;

    let (head, body) = split_reply(&reply);
    assert!(head.starts_with("HTTP/1.0 404 Not Found\r\n"));
    assert!(head.contains(&format!("Content-Length: {}", body.len())));
    assert!(String::from_utf8(body).unwrap().contains("/ghost.txt"));
}

#[tokio::test]
async fn test_post_is_501() {
    let (_root, files) = web_root();
    let (reply, _) = exchange(
        files,
        b"POST /index.html HTTP/1.0\r\nContent-Length: 3\r\n\r\nabc",
        false,
    )
    .await;

    let (head, body) = split_reply(&reply);
    assert!(head.starts_with("HTTP/1.0 501 Not Implemented\r\n"));
    assert!(!head.contains("Content-Length"));
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_request_split_across_writes() {
    let (_root, files) = web_root();
    let (mut client, server) = duplex(1024);
    let task = tokio::spawn(Connection::new(server, "test-peer", files, Deadlines::default()).run());

    client.write_all(b"GET /notes").await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    client.write_all(b".txt HTTP/1.0\r\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    client.write_all(b"\r\n").await.unwrap();

    let mut reply = Vec::new();
    client.read_to_end(&mut reply).await.unwrap();
    task.await.unwrap().unwrap();

    let (head, body) = split_reply(&reply);
    assert!(head.starts_with("HTTP/1.0 200 OK"));
    assert_eq!(body, b"plain notes\n");
}

#[tokio::test]
async fn test_request_ended_by_eof_is_served() {
    let (_root, files) = web_root();
    let (reply, result) = exchange(files, b"GET /notes.txt HTTP/1.0\r\n", true).await;

    result.unwrap();
    assert!(reply.starts_with(b"HTTP/1.0 200 OK\r\n"));
}

#[tokio::test]
async fn test_garbage_closes_without_reply() {
    let (_root, files) = web_root();
    let (reply, result) = exchange(files, b"HELLO\r\n\r\n", false).await;

    result.unwrap();
    assert!(reply.is_empty());
}

#[tokio::test]
async fn test_malformed_header_closes_without_reply() {
    let (_root, files) = web_root();
    let (reply, _) = exchange(files, b"GET / HTTP/1.0\r\nNoColonHere\r\n\r\n", false).await;

    assert!(reply.is_empty());
}

#[tokio::test]
async fn test_empty_stream_closes_without_reply() {
    let (_root, files) = web_root();
    let (reply, result) = exchange(files, b"", true).await;

    result.unwrap();
    assert!(reply.is_empty());
}

#[tokio::test]
async fn test_truncated_body_is_an_error() {
    let (_root, files) = web_root();
    let (reply, result) = exchange(
        files,
        b"GET /notes.txt HTTP/1.0\r\nContent-Length: 50\r\n\r\nshort",
        true,
    )
    .await;

    assert!(result.is_err());
    assert!(reply.is_empty());
}

#[tokio::test]
async fn test_read_deadline_closes_idle_connection() {
    let (_root, files) = web_root();
    let (mut client, server) = duplex(1024);
    let deadlines = Deadlines {
        read: Some(Duration::from_millis(50)),
        write: None,
    };
    let task = tokio::spawn(Connection::new(server, "slow-peer", files, deadlines).run());

    client.write_all(b"GET /notes.txt HTTP/1.0\r\n").await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("connection should give up on its own")
        .unwrap();
    assert!(result.is_err());

    let mut reply = Vec::new();
    client.read_to_end(&mut reply).await.unwrap();
    assert!(reply.is_empty());
}

#[tokio::test]
async fn test_oversized_content_length_closes_without_reply() {
    let (_root, files) = web_root();
    let (reply, result) = exchange(
        files,
        b"POST /notes.txt HTTP/1.0\r\nContent-Length: 1000000000000\r\n\r\nabc",
        false,
    )
    .await;

    result.unwrap();
    assert!(reply.is_empty());
}

#[tokio::test]
async fn test_endless_request_line_is_cut_off() {
    let (_root, files) = web_root();
    let (client, server) = duplex(64 * 1024);
    let task = tokio::spawn(Connection::new(server, "flooding-peer", files, Deadlines::default()).run());

    let (mut rx, mut tx) = split(client);
    let flood = tokio::spawn(async move {
        let chunk = vec![b'A'; 64 * 1024];
        for _ in 0..(2 * MAX_REQUEST_BYTES / chunk.len()) {
            if tx.write_all(&chunk).await.is_err() {
                break;
            }
        }
    });

    let result = tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .expect("connection should stop buffering")
        .unwrap();
    result.unwrap();

    let mut reply = Vec::new();
    rx.read_to_end(&mut reply).await.unwrap();
    assert!(reply.is_empty());
    flood.await.unwrap();
}

#[tokio::test]
async fn test_read_deadline_covers_whole_request() {
    let (_root, files) = web_root();
    let (client, server) = duplex(1024);
    let deadlines = Deadlines {
        read: Some(Duration::from_millis(100)),
        write: None,
    };
    let task = tokio::spawn(Connection::new(server, "trickling-peer", files, deadlines).run());

    let (mut rx, mut tx) = split(client);
    let trickle = tokio::spawn(async move {
        if tx.write_all(b"GET /notes.txt HTTP/1.0\r\n").await.is_err() {
            return;
        }
        // Each header arrives well inside a single read's patience
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if tx.write_all(b"X-Slow: 1\r\n").await.is_err() {
                break;
            }
        }
    });

    let result = tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("connection should give up before the client finishes")
        .unwrap();
    assert!(result.is_err());

    let mut reply = Vec::new();
    rx.read_to_end(&mut reply).await.unwrap();
    assert!(reply.is_empty());
    trickle.abort();
}
