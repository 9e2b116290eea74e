use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::detection_client::{DetectionClient, DetectionError};
use crate::shared::constants::{
    API_KEY_HEADER, DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT_SECS, DETECT_PATH, HEALTH_PATH,
    UPLOAD_FIELD_NAME, UPLOAD_FILE_NAME, UPLOAD_MIME_TYPE,
};
use crate::shared::detection::Detection;
use crate::shared::frame::PreparedFrame;

#[derive(Error, Debug)]
pub enum ClientConfigError {
    #[error("invalid endpoint url '{0}': expected http:// or https://")]
    InvalidEndpoint(String),
    #[error("api key must not be empty")]
    MissingApiKey,
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
}

#[derive(Clone, Debug)]
pub struct HttpDetectionConfig {
    /// Base URL of the detection service, e.g. `http://10.0.0.5:8000`.
    pub endpoint: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl HttpDetectionConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpDetectionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT, String::new())
    }
}

/// Success body of `POST /detect`. Extra fields are ignored.
#[derive(Deserialize)]
struct DetectResponse {
    #[serde(default)]
    detections: Option<Vec<Detection>>,
    #[serde(default)]
    duration_ms: Option<f64>,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

/// Talks to the detection service over HTTP with a blocking `reqwest` client.
///
/// Uploads the prepared JPEG as the multipart field `file` and authenticates
/// with the `x-api-key` header.
pub struct HttpDetectionClient {
    client: Client,
    detect_url: String,
    health_url: String,
    api_key: String,
}

impl HttpDetectionClient {
    pub fn new(config: HttpDetectionConfig) -> Result<Self, ClientConfigError> {
        let base = config.endpoint.trim().trim_end_matches('/');
        let url = reqwest::Url::parse(base)
            .map_err(|_| ClientConfigError::InvalidEndpoint(config.endpoint.clone()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientConfigError::InvalidEndpoint(config.endpoint));
        }
        if config.api_key.trim().is_empty() {
            return Err(ClientConfigError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientConfigError::Build)?;

        Ok(Self {
            client,
            detect_url: format!("{base}{DETECT_PATH}"),
            health_url: format!("{base}{HEALTH_PATH}"),
            api_key: config.api_key,
        })
    }

    pub fn detect_url(&self) -> &str {
        &self.detect_url
    }

    /// Probes `GET /health`. True when the service answers `{"status": "ok"}`.
    pub fn health(&self) -> Result<bool, DetectionError> {
        let response = self
            .client
            .get(&self.health_url)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DetectionError::Server {
                status_code: status.as_u16(),
            });
        }
        let body = response.bytes().map_err(network)?;
        let health: HealthResponse =
            serde_json::from_slice(&body).map_err(DetectionError::protocol)?;
        Ok(health.status == "ok")
    }
}

fn network(e: reqwest::Error) -> DetectionError {
    DetectionError::Network { cause: Box::new(e) }
}

fn upload_part(jpeg: Vec<u8>, mime: &str) -> Result<Part, DetectionError> {
    Part::bytes(jpeg)
        .file_name(UPLOAD_FILE_NAME)
        .mime_str(mime)
        .map_err(|e| DetectionError::Request { cause: Box::new(e) })
}

/// Parses a success body. A missing or null `detections` key is an empty list.
pub fn parse_detections(body: &[u8]) -> Result<Vec<Detection>, DetectionError> {
    let response: DetectResponse =
        serde_json::from_slice(body).map_err(DetectionError::protocol)?;
    if let Some(ms) = response.duration_ms {
        log::debug!("Service reported inference time {ms:.1}ms");
    }
    Ok(response.detections.unwrap_or_default())
}

impl DetectionClient for HttpDetectionClient {
    fn detect(&self, frame: &PreparedFrame) -> Result<Vec<Detection>, DetectionError> {
        let part = upload_part(frame.jpeg().to_vec(), UPLOAD_MIME_TYPE)?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        log::debug!(
            "POST {} ({} bytes, {})",
            self.detect_url,
            frame.len(),
            frame.dimensions()
        );
        let response = self
            .client
            .post(&self.detect_url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Detection request rejected with status {status}");
            return Err(DetectionError::Server {
                status_code: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(network)?;
        parse_detections(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::dimensions::ImageDimensions;
    use crossbeam_channel::Receiver;
    use rstest::rstest;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    // --- Throwaway HTTP server ---

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn content_length(head: &str) -> Option<usize> {
        head.lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse().ok())
    }

    fn read_request(stream: &mut TcpStream) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            if let Some(end) = find(&buf, b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let body_len = buf.len() - end - 4;
                match content_length(&head) {
                    Some(len) if body_len >= len => break,
                    Some(_) => {}
                    None if head.contains("transfer-encoding: chunked") => {
                        if buf.ends_with(b"0\r\n\r\n") {
                            break;
                        }
                    }
                    None => break,
                }
            }
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        buf
    }

    /// Serves one canned response and hands back the raw request it received.
    fn serve_once(status: &'static str, body: &'static str) -> (String, Receiver<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = crossbeam_channel::bounded(1);
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            let _ = tx.send(request);
        });
        (url, rx)
    }

    fn client_for(url: &str) -> HttpDetectionClient {
        HttpDetectionClient::new(
            HttpDetectionConfig::new(url, "secret-key").with_timeout(Duration::from_secs(5)),
        )
        .unwrap()
    }

    fn frame() -> PreparedFrame {
        PreparedFrame::new(
            vec![0xFF, 0xD8, 0xFF, 0xE0, 0x42, 0x42, 0xFF, 0xD9],
            ImageDimensions::new(640, 360),
        )
    }

    // --- Request shape ---

    #[test]
    fn test_request_carries_auth_accept_and_multipart_file() {
        let (url, requests) = serve_once("200 OK", r#"{"detections": []}"#);
        client_for(&url).detect(&frame()).unwrap();

        let raw = requests.recv().unwrap();
        let text = String::from_utf8_lossy(&raw).to_ascii_lowercase();
        assert!(text.starts_with("post /detect http/1.1"));
        assert!(text.contains("x-api-key: secret-key"));
        assert!(text.contains("accept: application/json"));
        assert!(text.contains("content-type: multipart/form-data"));
        assert!(text.contains(r#"name="file"; filename="frame.jpg""#));
        assert!(text.contains("content-type: image/jpeg"));
        assert!(find(&raw, frame().jpeg()).is_some());
    }

    // --- Response handling ---

    #[test]
    fn test_success_parses_detections() {
        let (url, _requests) = serve_once(
            "200 OK",
            r#"{"detections": [{"label": "pothole", "confidence": 0.91, "box": [100, 100, 200, 200]}, {"label": "crack", "confidence": 0.3}], "duration_ms": 41.2}"#,
        );
        let detections = client_for(&url).detect(&frame()).unwrap();

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].label(), "pothole");
        assert_eq!(
            detections[0].bbox().unwrap().to_array(),
            [100.0, 100.0, 200.0, 200.0]
        );
        assert_eq!(detections[1].label(), "crack");
        assert!(detections[1].bbox().is_none());
    }

    #[rstest]
    #[case::null(r#"{"detections": null}"#)]
    #[case::absent(r#"{"duration_ms": 12.0}"#)]
    #[case::empty(r#"{"detections": []}"#)]
    fn test_missing_detections_is_empty(#[case] body: &'static str) {
        let (url, _requests) = serve_once("200 OK", body);
        let detections = client_for(&url).detect(&frame()).unwrap();
        assert!(detections.is_empty());
    }

    #[rstest]
    #[case::unauthorized("401 Unauthorized", 401)]
    #[case::bad_request("400 Bad Request", 400)]
    #[case::internal("500 Internal Server Error", 500)]
    fn test_non_success_status_is_server_error(
        #[case] status: &'static str,
        #[case] expected: u16,
    ) {
        let (url, _requests) = serve_once(status, r#"{"detail": "nope"}"#);
        match client_for(&url).detect(&frame()) {
            Err(DetectionError::Server { status_code }) => assert_eq!(status_code, expected),
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[rstest]
    #[case::not_json("<html>gateway</html>")]
    #[case::array_body("[]")]
    #[case::missing_label(r#"{"detections": [{"confidence": 0.5}]}"#)]
    #[case::bad_box(r#"{"detections": [{"label": "x", "confidence": 0.5, "box": [1, 2]}]}"#)]
    fn test_malformed_body_is_protocol_error(#[case] body: &'static str) {
        let (url, _requests) = serve_once("200 OK", body);
        let result = client_for(&url).detect(&frame());
        assert!(matches!(result, Err(DetectionError::Protocol { .. })));
    }

    #[test]
    fn test_refused_connection_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let result = client_for(&url).detect(&frame());
        assert!(matches!(result, Err(DetectionError::Network { .. })));
    }

    #[test]
    fn test_timeout_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_secs(3));
            drop(stream);
        });

        let client = HttpDetectionClient::new(
            HttpDetectionConfig::new(&url, "secret-key").with_timeout(Duration::from_millis(200)),
        )
        .unwrap();
        assert!(matches!(
            client.detect(&frame()),
            Err(DetectionError::Network { .. })
        ));
    }

    // --- Health probe ---

    #[test]
    fn test_health_ok() {
        let (url, requests) = serve_once("200 OK", r#"{"status": "ok"}"#);
        assert!(client_for(&url).health().unwrap());
        let text = String::from_utf8_lossy(&requests.recv().unwrap()).to_ascii_lowercase();
        assert!(text.starts_with("get /health http/1.1"));
    }

    #[test]
    fn test_health_unavailable_is_server_error() {
        let (url, _requests) = serve_once("503 Service Unavailable", "{}");
        assert!(matches!(
            client_for(&url).health(),
            Err(DetectionError::Server { status_code: 503 })
        ));
    }

    // --- Configuration ---

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = client_for("http://127.0.0.1:8000/");
        assert_eq!(client.detect_url(), "http://127.0.0.1:8000/detect");
    }

    #[rstest]
    #[case::garbage("not a url")]
    #[case::ftp("ftp://example.com")]
    fn test_invalid_endpoint_rejected(#[case] endpoint: &str) {
        let result = HttpDetectionClient::new(HttpDetectionConfig::new(endpoint, "key"));
        assert!(matches!(result, Err(ClientConfigError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = HttpDetectionClient::new(HttpDetectionConfig::new(DEFAULT_ENDPOINT, "  "));
        assert!(matches!(result, Err(ClientConfigError::MissingApiKey)));
    }

    #[test]
    fn test_server_error_message() {
        let err = DetectionError::Server { status_code: 500 };
        assert_eq!(err.to_string(), "Server responded with 500");
    }

    #[test]
    fn test_upload_part_build_failure_is_request_error() {
        assert!(upload_part(vec![0xFF, 0xD8], UPLOAD_MIME_TYPE).is_ok());
        let err = upload_part(vec![0xFF, 0xD8], "not a mime").unwrap_err();
        assert!(matches!(err, DetectionError::Request { .. }));
        assert!(err.to_string().starts_with("could not build detection request"));
    }
}
