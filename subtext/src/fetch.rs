use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::config::ExtractOptions;
use crate::error::{Error, Result};
use crate::types::FormatDescriptor;

/// Retrieves the text behind a subtitle format URL.
///
/// The only I/O the resolution pipeline performs goes through this trait, so
/// tests can swap in an in-memory implementation.
pub trait Fetch {
    fn fetch(&self, location: &str) -> impl Future<Output = Result<String>> + Send;
}

/// [`Fetch`] over HTTP(S) with reqwest.
///
/// Rejects non-2xx responses, bodies over the configured size cap, and bodies
/// that are not valid UTF-8.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_payload_bytes: usize,
}

impl HttpFetcher {
    pub fn new(options: &ExtractOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(options.fetch_timeout);
        if let Some(agent) = &options.user_agent {
            builder = builder.user_agent(agent.as_str());
        }
        Ok(Self {
            client: builder.build()?,
            max_payload_bytes: options.max_payload_bytes,
        })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, location: &str) -> impl Future<Output = Result<String>> + Send {
        let request = self.client.get(location);
        let limit = self.max_payload_bytes;
        async move {
            let response = request.send().await?.error_for_status()?;

            if let Some(length) = response.content_length() {
                if length > limit as u64 {
                    return Err(Error::Fetch(format!(
                        "payload too large ({length} bytes, limit {limit})"
                    )));
                }
            }

            let mut body = Vec::new();
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                if body.len() + chunk.len() > limit {
                    return Err(Error::Fetch(format!(
                        "payload exceeds {limit} bytes"
                    )));
                }
                body.extend_from_slice(&chunk);
            }

            String::from_utf8(body)
                .map_err(|e| Error::Fetch(format!("payload is not valid UTF-8: {e}")))
        }
    }
}

/// Fetch the first descriptor that yields a non-empty payload.
///
/// Descriptors are tried in order; each attempt is bounded by `timeout`.
/// Missing locations, transport errors, deadline expiry and empty bodies are
/// logged and skipped. Returns `None` when every descriptor fails.
pub async fn fetch<'a, F: Fetch>(
    descriptors: &'a [FormatDescriptor],
    fetcher: &F,
    timeout: Duration,
) -> Option<(&'a FormatDescriptor, String)> {
    for descriptor in descriptors {
        let Some(location) = descriptor.location.as_deref() else {
            warn!(format = %descriptor.kind, "subtitle format has no URL, skipping");
            continue;
        };

        match tokio::time::timeout(timeout, fetcher.fetch(location)).await {
            Ok(Ok(payload)) if !payload.is_empty() => {
                debug!(format = %descriptor.kind, bytes = payload.len(), "subtitle payload fetched");
                return Some((descriptor, payload));
            }
            Ok(Ok(_)) => {
                warn!(format = %descriptor.kind, "subtitle payload was empty, trying next format");
            }
            Ok(Err(e)) => {
                warn!(format = %descriptor.kind, error = %e, "failed to download subtitle format");
            }
            Err(_) => {
                warn!(
                    format = %descriptor.kind,
                    error = %Error::Timeout(timeout),
                    "failed to download subtitle format"
                );
            }
        }
    }

    None
}

/// Stable reorder: kinds listed in `preferred` first (in that order), the
/// rest afterwards in backend order.
pub fn order_by_preference<'a>(
    descriptors: &'a [FormatDescriptor],
    preferred: &[String],
) -> Vec<&'a FormatDescriptor> {
    let mut ordered: Vec<&FormatDescriptor> = descriptors.iter().collect();
    if !preferred.is_empty() {
        ordered.sort_by_key(|d| {
            preferred
                .iter()
                .position(|kind| kind.eq_ignore_ascii_case(&d.kind))
                .unwrap_or(preferred.len())
        });
    }
    ordered
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory fetcher. Unknown locations fail; every request is recorded.
    #[derive(Default)]
    pub(crate) struct FakeFetcher {
        pub responses: HashMap<String, Result<String>>,
        pub slow: Vec<String>,
        pub requested: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn with(mut self, location: &str, payload: &str) -> Self {
            self.responses.insert(location.into(), Ok(payload.into()));
            self
        }

        pub fn failing(mut self, location: &str) -> Self {
            self.responses
                .insert(location.into(), Err(Error::Fetch("connection refused".into())));
            self
        }

        pub fn slow(mut self, location: &str, payload: &str) -> Self {
            self.slow.push(location.into());
            self.with(location, payload)
        }

        pub fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl Fetch for FakeFetcher {
        fn fetch(&self, location: &str) -> impl Future<Output = Result<String>> + Send {
            self.requested.lock().unwrap().push(location.to_string());
            let delay = self.slow.iter().any(|l| l == location);
            let result = match self.responses.get(location) {
                Some(Ok(payload)) => Ok(payload.clone()),
                Some(Err(e)) => Err(Error::Fetch(e.to_string())),
                None => Err(Error::Fetch(format!("no route to {location}"))),
            };
            async move {
                if delay {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
                result
            }
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn descriptors() -> Vec<FormatDescriptor> {
        vec![
            FormatDescriptor::new("json3", "https://subs/a.json3"),
            FormatDescriptor::new("vtt", "https://subs/a.vtt"),
            FormatDescriptor::new("srt", "https://subs/a.srt"),
        ]
    }

    #[tokio::test]
    async fn test_fetch_returns_first_success_and_stops() {
        let fetcher = FakeFetcher::default()
            .with("https://subs/a.json3", "{}")
            .with("https://subs/a.vtt", "WEBVTT");
        let descs = descriptors();
        let (desc, payload) = fetch(&descs, &fetcher, TIMEOUT).await.unwrap();
        assert_eq!(desc.kind, "json3");
        assert_eq!(payload, "{}");
        assert_eq!(fetcher.requested(), ["https://subs/a.json3"]);
    }

    #[tokio::test]
    async fn test_fetch_skips_failures() {
        let fetcher = FakeFetcher::default()
            .failing("https://subs/a.json3")
            .with("https://subs/a.srt", "1\n");
        let descs = descriptors();
        let (desc, _) = fetch(&descs, &fetcher, TIMEOUT).await.unwrap();
        assert_eq!(desc.kind, "srt");
        assert_eq!(fetcher.requested().len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_skips_empty_payload() {
        let fetcher = FakeFetcher::default()
            .with("https://subs/a.json3", "")
            .with("https://subs/a.vtt", "WEBVTT\n\nhi");
        let descs = descriptors();
        let (desc, _) = fetch(&descs, &fetcher, TIMEOUT).await.unwrap();
        assert_eq!(desc.kind, "vtt");
    }

    #[tokio::test]
    async fn test_fetch_skips_missing_location() {
        let descs = vec![
            FormatDescriptor {
                kind: "vtt".into(),
                location: None,
                name: None,
            },
            FormatDescriptor::new("srt", "https://subs/b.srt"),
        ];
        let fetcher = FakeFetcher::default().with("https://subs/b.srt", "text");
        let (desc, _) = fetch(&descs, &fetcher, TIMEOUT).await.unwrap();
        assert_eq!(desc.kind, "srt");
        assert_eq!(fetcher.requested(), ["https://subs/b.srt"]);
    }

    #[tokio::test]
    async fn test_fetch_all_fail() {
        let fetcher = FakeFetcher::default().failing("https://subs/a.vtt");
        let descs = descriptors();
        assert!(fetch(&descs, &fetcher, TIMEOUT).await.is_none());
        assert!(fetch(&[], &fetcher, TIMEOUT).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout_moves_to_next() {
        let fetcher = FakeFetcher::default()
            .slow("https://subs/a.json3", "late")
            .with("https://subs/a.vtt", "on time");
        let descs = descriptors();
        let (desc, payload) = fetch(&descs, &fetcher, Duration::from_secs(1)).await.unwrap();
        assert_eq!(desc.kind, "vtt");
        assert_eq!(payload, "on time");
    }

    #[test]
    fn test_order_by_preference() {
        let descs = descriptors();
        let kinds = |v: Vec<&FormatDescriptor>| v.iter().map(|d| d.kind.clone()).collect::<Vec<_>>();
        assert_eq!(kinds(order_by_preference(&descs, &[])), ["json3", "vtt", "srt"]);
        assert_eq!(
            kinds(order_by_preference(&descs, &["srt".into(), "vtt".into()])),
            ["srt", "vtt", "json3"]
        );
        assert_eq!(
            kinds(order_by_preference(&descs, &["VTT".into(), "ttml".into()])),
            ["vtt", "json3", "srt"]
        );
    }

    #[test]
    fn test_http_fetcher_builds_from_options() {
        let opts = ExtractOptions::new().user_agent("subtext-test/1.0");
        assert!(HttpFetcher::new(&opts).is_ok());
    }

    /// Serve one canned HTTP response on a loopback port and return its URL.
    async fn serve_once(response: Vec<u8>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/subs/en.vtt")
    }

    fn http_response(status: &str, body: &[u8], with_length: bool) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {status}\r\nContent-Type: text/vtt\r\nConnection: close\r\n");
        if with_length {
            head.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
        head.push_str("\r\n");
        let mut response = head.into_bytes();
        response.extend_from_slice(body);
        response
    }

    fn http_fetcher(limit: usize) -> HttpFetcher {
        let opts = ExtractOptions::new().max_payload_bytes(limit).unwrap();
        HttpFetcher::new(&opts).unwrap()
    }

    #[tokio::test]
    async fn test_http_fetcher_returns_body() {
        let url = serve_once(http_response("200 OK", b"WEBVTT\n\nhi", true)).await;
        let body = http_fetcher(1024).fetch(&url).await.unwrap();
        assert_eq!(body, "WEBVTT\n\nhi");
    }

    #[tokio::test]
    async fn test_http_fetcher_rejects_error_status() {
        let url = serve_once(http_response("404 Not Found", b"gone", true)).await;
        let err = http_fetcher(1024).fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::Http(ref e) if e.status().is_some_and(|s| s.as_u16() == 404)));
    }

    #[tokio::test]
    async fn test_http_fetcher_rejects_declared_length_over_limit() {
        let url = serve_once(http_response("200 OK", &[b'a'; 64], true)).await;
        let err = http_fetcher(16).fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(ref msg) if msg.contains("too large")));
    }

    #[tokio::test]
    async fn test_http_fetcher_caps_streamed_body() {
        let url = serve_once(http_response("200 OK", &[b'a'; 64], false)).await;
        let err = http_fetcher(16).fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(ref msg) if msg.contains("exceeds 16 bytes")));
    }

    #[tokio::test]
    async fn test_http_fetcher_rejects_invalid_utf8() {
        let url = serve_once(http_response("200 OK", &[0x57, 0xff, 0xfe, 0x41], true)).await;
        let err = http_fetcher(1024).fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(ref msg) if msg.contains("UTF-8")));
    }

    #[tokio::test]
    async fn test_fetch_skips_http_failures() {
        let bad = serve_once(http_response("500 Internal Server Error", b"", true)).await;
        let good = serve_once(http_response("200 OK", b"1\n00:00:01,000 --> 00:00:02,000\nok\n", true)).await;
        let descs = vec![
            FormatDescriptor::new("json3", bad),
            FormatDescriptor::new("srt", good),
        ];
        let (desc, payload) = fetch(&descs, &http_fetcher(1024), TIMEOUT).await.unwrap();
        assert_eq!(desc.kind, "srt");
        assert!(payload.ends_with("ok\n"));
    }
}
