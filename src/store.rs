//! Remote object storage.
//!
//! The [`ObjectStore`] trait is the seam between the upload pipeline and
//! whatever holds the bytes. The production implementation, [`HttpStore`],
//! speaks the bucket-over-HTTP dialect most hosted object stores expose:
//!
//! ```text
//! POST {base}/object/{bucket}/{key}        write (x-upsert: true to replace)
//! GET  {base}/object/{bucket}/{key}        read (authenticated)
//!      {base}/object/public/{bucket}/{key} public URL for shared buckets
//! ```
//!
//! A successful write answers `{"Key": "<bucket>/<key>"}`; the bucket prefix
//! is stripped so callers always work with bucket-relative paths — the same
//! shape they pass in.
//!
//! Authentication is a Bearer token installed as a default header at client
//! construction, so no call site can forget it.

use crate::config::StoreConfig;
use crate::keys::UploadKey;
use crate::session::Session;
use async_trait::async_trait;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("access token is not a valid header value")]
    InvalidToken,
}

/// Per-write options.
#[derive(Debug, Clone)]
pub struct PutOptions {
    /// MIME type recorded on the stored object.
    pub content_type: String,
    /// Replace an existing object at the same key instead of failing.
    pub upsert: bool,
}

impl PutOptions {
    pub fn jpeg() -> Self {
        Self {
            content_type: "image/jpeg".to_string(),
            upsert: false,
        }
    }

    pub fn with_upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }
}

impl Default for PutOptions {
    fn default() -> Self {
        Self {
            content_type: "application/octet-stream".to_string(),
            upsert: false,
        }
    }
}

/// Confirmation of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Bucket-relative path the store confirmed.
    pub path: String,
}

/// Trait for object storage backends.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` under `key`. One call is one write; there is no retry
    /// behind this interface.
    async fn put(
        &self,
        key: &UploadKey,
        bytes: Vec<u8>,
        options: &PutOptions,
    ) -> Result<StoredObject, StoreError>;

    /// Read the object at `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;
}

/// Characters percent-encoded inside a key path segment.
///
/// `/` separates segments and is never encoded; spaces and URL metacharacters
/// are. Unreserved characters pass through so typical keys stay readable.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Public URL for an object in a public bucket. No authentication involved,
/// so this needs no client or session.
pub fn public_url(base_url: &str, bucket: &str, key: &str) -> String {
    format!(
        "{}/object/public/{}/{}",
        base_url.trim_end_matches('/'),
        bucket,
        encode_key(key)
    )
}

/// Wire response from a successful write.
#[derive(Deserialize)]
struct PutResponse {
    #[serde(rename = "Key")]
    key: String,
}

/// HTTP client for a single bucket of a hosted object store.
pub struct HttpStore {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
}

impl HttpStore {
    /// Build a client for `config.bucket`, authenticated as `session`.
    pub fn new(config: &StoreConfig, session: &Session) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", session.access_token))
            .map_err(|_| StoreError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/object/{}/{}",
            self.base_url,
            self.bucket,
            encode_key(key)
        )
    }

    /// Public URL for `key` in this store's bucket.
    pub fn public_url(&self, key: &str) -> String {
        public_url(&self.base_url, &self.bucket, key)
    }
}

#[async_trait]
impl ObjectStore for HttpStore {
    async fn put(
        &self,
        key: &UploadKey,
        bytes: Vec<u8>,
        options: &PutOptions,
    ) -> Result<StoredObject, StoreError> {
        let url = self.object_url(key.as_str());
        let size_bytes = bytes.len();

        let mut request = self
            .http
            .post(&url)
            .header(header::CONTENT_TYPE, &options.content_type)
            .body(bytes);
        if options.upsert {
            request = request.header("x-upsert", "true");
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let parsed: PutResponse = serde_json::from_slice(&body)?;
        let path = parsed
            .key
            .strip_prefix(&format!("{}/", self.bucket))
            .unwrap_or(parsed.key.as_str())
            .to_string();

        tracing::info!(path = %path, size_bytes, "stored object");
        Ok(StoredObject { path })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let response = self.http.get(self.object_url(key)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One recorded write against a [`MockStore`].
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedPut {
        pub key: String,
        pub size_bytes: u64,
        pub content_type: String,
        pub upsert: bool,
    }

    /// In-memory store that records writes and serves reads from a map.
    ///
    /// `put_calls` counts every write attempt, including rejected ones, so
    /// tests can assert that a failed write was not retried.
    #[derive(Default)]
    pub struct MockStore {
        pub puts: Mutex<Vec<RecordedPut>>,
        pub objects: Mutex<HashMap<String, Vec<u8>>>,
        pub reject_with: Mutex<Option<(u16, String)>>,
        pub put_calls: Mutex<u32>,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Store whose next writes all fail with the given status.
        pub fn rejecting(status: u16, body: &str) -> Self {
            Self {
                reject_with: Mutex::new(Some((status, body.to_string()))),
                ..Self::default()
            }
        }

        pub fn with_object(key: &str, bytes: &[u8]) -> Self {
            let store = Self::default();
            store
                .objects
                .lock()
                .unwrap()
                .insert(key.to_string(), bytes.to_vec());
            store
        }

        pub fn recorded_puts(&self) -> Vec<RecordedPut> {
            self.puts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ObjectStore for MockStore {
        async fn put(
            &self,
            key: &UploadKey,
            bytes: Vec<u8>,
            options: &PutOptions,
        ) -> Result<StoredObject, StoreError> {
            *self.put_calls.lock().unwrap() += 1;
            if let Some((status, body)) = self.reject_with.lock().unwrap().clone() {
                return Err(StoreError::Rejected { status, body });
            }
            self.puts.lock().unwrap().push(RecordedPut {
                key: key.as_str().to_string(),
                size_bytes: bytes.len() as u64,
                content_type: options.content_type.clone(),
                upsert: options.upsert,
            });
            self.objects
                .lock()
                .unwrap()
                .insert(key.as_str().to_string(), bytes);
            Ok(StoredObject {
                path: key.as_str().to_string(),
            })
        }

        async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| StoreError::Rejected {
                    status: 404,
                    body: "object not found".to_string(),
                })
        }
    }

    fn test_config(base_url: &str) -> StoreConfig {
        StoreConfig {
            base_url: base_url.to_string(),
            bucket: "avatars".to_string(),
        }
    }

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Read one full HTTP request (headers plus content-length body).
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some((head, body)) = text.split_once("\r\n\r\n") {
                let want: usize = head
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if body.len() >= want {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Serve exactly one request, returning the base URL and a handle that
    /// yields the raw request once it has been answered.
    async fn one_shot_server(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });
        (format!("http://{addr}"), handle)
    }

    #[tokio::test]
    async fn put_posts_to_object_path_with_auth() {
        let (url, server) =
            one_shot_server(http_response("200 OK", r#"{"Key":"avatars/pic.jpg"}"#)).await;
        let session = Session::new("token-123");
        let store = HttpStore::new(&test_config(&url), &session).unwrap();

        let stored = store
            .put(
                &UploadKey::new("pic.jpg").unwrap(),
                b"jpegbytes".to_vec(),
                &PutOptions::jpeg(),
            )
            .await
            .unwrap();

        assert_eq!(stored.path, "pic.jpg");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /object/avatars/pic.jpg HTTP/1.1"));
        assert!(request.to_lowercase().contains("authorization: bearer token-123"));
        assert!(request.to_lowercase().contains("content-type: image/jpeg"));
        assert!(!request.to_lowercase().contains("x-upsert"));
        assert!(request.ends_with("jpegbytes"));
    }

    #[tokio::test]
    async fn put_with_upsert_sets_header() {
        let (url, server) =
            one_shot_server(http_response("200 OK", r#"{"Key":"avatars/pic.jpg"}"#)).await;
        let store = HttpStore::new(&test_config(&url), &Session::new("t")).unwrap();

        store
            .put(
                &UploadKey::new("pic.jpg").unwrap(),
                b"x".to_vec(),
                &PutOptions::jpeg().with_upsert(true),
            )
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert!(request.to_lowercase().contains("x-upsert: true"));
    }

    #[tokio::test]
    async fn put_strips_bucket_prefix_from_response() {
        let (url, _server) =
            one_shot_server(http_response("200 OK", r#"{"Key":"avatars/users/7/a.jpg"}"#)).await;
        let store = HttpStore::new(&test_config(&url), &Session::new("t")).unwrap();

        let stored = store
            .put(
                &UploadKey::new("users/7/a.jpg").unwrap(),
                b"x".to_vec(),
                &PutOptions::jpeg(),
            )
            .await
            .unwrap();

        assert_eq!(stored.path, "users/7/a.jpg");
    }

    #[tokio::test]
    async fn put_rejection_carries_status_and_body() {
        let (url, _server) =
            one_shot_server(http_response("403 Forbidden", r#"{"message":"no write"}"#)).await;
        let store = HttpStore::new(&test_config(&url), &Session::new("t")).unwrap();

        let err = store
            .put(
                &UploadKey::new("pic.jpg").unwrap(),
                b"x".to_vec(),
                &PutOptions::jpeg(),
            )
            .await
            .unwrap_err();

        match err {
            StoreError::Rejected { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("no write"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_returns_object_bytes() {
        let (url, server) = one_shot_server(http_response("200 OK", "rawbytes")).await;
        let store = HttpStore::new(&test_config(&url), &Session::new("t")).unwrap();

        let bytes = store.get("pic.jpg").await.unwrap();

        assert_eq!(bytes, b"rawbytes");
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /object/avatars/pic.jpg HTTP/1.1"));
    }

    #[tokio::test]
    async fn get_missing_object_is_rejected() {
        let (url, _server) =
            one_shot_server(http_response("404 Not Found", r#"{"message":"not found"}"#)).await;
        let store = HttpStore::new(&test_config(&url), &Session::new("t")).unwrap();

        let err = store.get("gone.jpg").await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 404, .. }));
    }

    #[test]
    fn newline_in_token_is_invalid() {
        let session = Session::new("bad\ntoken");
        let result = HttpStore::new(&test_config("http://localhost"), &session);
        assert!(matches!(result, Err(StoreError::InvalidToken)));
    }

    #[test]
    fn encode_key_escapes_within_segments_only() {
        assert_eq!(encode_key("plain.jpg"), "plain.jpg");
        assert_eq!(encode_key("users/7/a b.jpg"), "users/7/a%20b.jpg");
        assert_eq!(encode_key("100%.jpg"), "100%25.jpg");
    }

    #[test]
    fn public_url_is_unauthenticated_shape() {
        assert_eq!(
            public_url("https://store.example.com/", "avatars", "users/7/a.jpg"),
            "https://store.example.com/object/public/avatars/users/7/a.jpg"
        );
    }

    #[tokio::test]
    async fn mock_store_records_and_serves() {
        let store = MockStore::new();
        store
            .put(
                &UploadKey::new("k.jpg").unwrap(),
                b"data".to_vec(),
                &PutOptions::jpeg(),
            )
            .await
            .unwrap();

        let puts = store.recorded_puts();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].key, "k.jpg");
        assert_eq!(puts[0].content_type, "image/jpeg");
        assert_eq!(*store.put_calls.lock().unwrap(), 1);
        assert_eq!(store.get("k.jpg").await.unwrap(), b"data");
        assert!(store.get("other.jpg").await.is_err());
    }
}
