// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the HTTP uploader
//!
//! A one-shot TCP server captures the raw request and answers with a canned
//! response.

use camera_capture::Config;
use camera_capture::errors::UploadError;
use camera_capture::media::{Blob, MediaKind};
use camera_capture::upload::{HttpUploader, MediaFile, UploadEndpoint, UploadOutcome};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const TIMEOUT: Duration = Duration::from_secs(10);

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Serve a single request; the handle resolves to the raw request bytes
async fn serve_once(
    status_line: &'static str,
    extra_headers: &'static str,
    body: &'static str,
) -> (String, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed before the headers ended");
            request.extend_from_slice(&buf[..n]);
            if let Some(pos) = find(&request, b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
        let length: usize = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|value| value.trim().parse().unwrap())
            .unwrap_or(0);

        while request.len() < header_end + length {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed before the body ended");
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
            status_line,
            body.len(),
            extra_headers,
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });

    (format!("http://{}/upload-media", addr), handle)
}

fn photo_file() -> MediaFile {
    MediaFile {
        filename: MediaKind::Photo.filename(1_700_000_000_000),
        blob: Blob::new(b"\x89PNG-not-really".to_vec(), MediaKind::Photo.mime()),
    }
}

#[tokio::test]
async fn test_multipart_request_and_see_other() {
    let (endpoint, server) = serve_once(
        "303 See Other",
        "Location: /add-photos-videos?message=ok\r\n",
        "",
    )
    .await;
    let uploader = HttpUploader::new(endpoint, TIMEOUT).unwrap();

    let response = uploader.upload(photo_file()).await.unwrap();
    assert_eq!(response.status, 303);
    assert_eq!(UploadOutcome::from(&response), UploadOutcome::Success);

    let request = server.await.unwrap();
    let text = String::from_utf8_lossy(&request).to_lowercase();
    assert!(text.starts_with("post /upload-media http/1.1\r\n"));
    assert!(text.contains("content-type: multipart/form-data; boundary="));
    // The form is sized up front, not sent chunked
    assert!(text.contains("content-length: "));
    assert!(!text.contains("transfer-encoding: chunked"));
    assert!(text.contains("name=\"file\""));
    assert!(text.contains("filename=\"capture_photo_1700000000000.png\""));
    assert!(text.contains("content-type: image/png"));
    assert!(find(&request, b"\x89PNG-not-really").is_some());
}

#[tokio::test]
async fn test_forbidden_means_login() {
    let (endpoint, server) = serve_once("403 Forbidden", "", "").await;
    let uploader = HttpUploader::new(endpoint, TIMEOUT).unwrap();

    let response = uploader.upload(photo_file()).await.unwrap();
    assert_eq!(response.status, 403);
    assert_eq!(response.reason, "Forbidden");
    assert_eq!(UploadOutcome::from(&response), UploadOutcome::AuthRequired);
    server.await.unwrap();
}

#[tokio::test]
async fn test_server_error_keeps_body() {
    let (endpoint, server) = serve_once(
        "500 Internal Server Error",
        "Content-Type: text/plain\r\n",
        "disk full",
    )
    .await;
    let uploader = HttpUploader::new(endpoint, TIMEOUT).unwrap();

    let response = uploader.upload(photo_file()).await.unwrap();
    assert_eq!(response.status, 500);
    assert_eq!(response.body, "disk full");
    assert_eq!(
        UploadOutcome::from(&response).status_message(),
        "Upload failed: 500 Internal Server Error"
    );
    server.await.unwrap();
}

#[tokio::test]
async fn test_video_content_type() {
    let (endpoint, server) = serve_once("200 OK", "", "").await;
    let uploader = HttpUploader::new(endpoint, TIMEOUT).unwrap();

    let file = MediaFile {
        filename: MediaKind::Video.filename(42),
        blob: Blob::new(b"webm-bytes".to_vec(), MediaKind::Video.mime()),
    };
    let response = uploader.upload(file).await.unwrap();
    assert_eq!(response.status, 200);

    let request = server.await.unwrap();
    let text = String::from_utf8_lossy(&request).to_lowercase();
    assert!(text.contains("filename=\"capture_video_42.webm\""));
    assert!(text.contains("content-type: video/webm"));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Grab a free port, then close it again
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let uploader = HttpUploader::new(format!("http://{}/upload-media", addr), TIMEOUT).unwrap();
    let result = uploader.upload(photo_file()).await;
    assert!(matches!(result, Err(UploadError::Network(_))));
}

#[test]
fn test_endpoint_from_config() {
    let config = Config {
        server_url: "http://media.local:8000/".into(),
        ..Default::default()
    };
    let uploader = HttpUploader::from_config(&config).unwrap();
    assert_eq!(uploader.endpoint(), "http://media.local:8000/upload-media");

    let broken = Config {
        server_url: "media.local".into(),
        ..Default::default()
    };
    assert!(HttpUploader::from_config(&broken).is_err());
}
