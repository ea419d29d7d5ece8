//! Network transport for remote anchors and registry metadata.

use std::io::Read;
use std::time::Duration;

use crate::error::{AnchorError, AnchorResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on a single downloaded payload.
pub const MAX_PAYLOAD_BYTES: u64 = 64 * 1024 * 1024;

/// One synchronous GET. Implementations must not retry.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, headers: &[(String, String)]) -> AnchorResult<Vec<u8>>;
}

/// Blocking HTTP(S) fetcher.
///
/// `timeout` bounds the whole request, body included, as well as each
/// connect/read/write. Bodies over the payload cap are rejected, never cut.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let timeout = timeout.max(Duration::from_millis(100));
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .user_agent(concat!("unreanchor/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent, max_bytes: MAX_PAYLOAD_BYTES }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, headers: &[(String, String)]) -> AnchorResult<Vec<u8>> {
        let mut request = self.agent.get(url);
        for (name, value) in headers {
            request = request.set(name, value);
        }

        let response = request.call().map_err(|e| transport_error(url, e))?;

        let mut body = Vec::new();
        response
            .into_reader()
            .take(self.max_bytes.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|e| AnchorError::Transport { url: url.to_string(), message: e.to_string() })?;
        if body.len() as u64 > self.max_bytes {
            let limit = self.max_bytes;
            return Err(AnchorError::PayloadTooLarge { url: url.to_string(), limit });
        }
        tracing::debug!(%url, bytes = body.len(), "fetched");
        Ok(body)
    }
}

fn transport_error(url: &str, err: ureq::Error) -> AnchorError {
    match err {
        ureq::Error::Status(status, _) => AnchorError::HttpStatus { url: url.to_string(), status },
        ureq::Error::Transport(transport) => AnchorError::Transport {
            url: url.to_string(),
            message: format!("{:?}: {}", transport.kind(), transport),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::AnchorCache;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::Instant;
    use tempfile::TempDir;

    /// Serve one `200 OK` with `body_len` bytes, pausing `gap` between bytes
    /// when it is non-zero.
    fn serve_once(body_len: usize, gap: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else { return };
            let mut seen = Vec::new();
            let mut buf = [0u8; 1024];
            while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => return,
                    Ok(n) => seen.extend_from_slice(&buf[..n]),
                }
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {body_len}\r\nConnection: close\r\n\r\n"
            );
            if stream.write_all(head.as_bytes()).is_err() {
                return;
            }
            let body = vec![b'x'; body_len];
            let chunk = if gap.is_zero() { body_len.max(1) } else { 1 };
            for part in body.chunks(chunk) {
                if stream.write_all(part).is_err() {
                    return;
                }
                std::thread::sleep(gap);
            }
        });
        format!("http://{addr}/payload.csv")
    }

    #[test]
    fn test_body_within_cap_is_returned_whole() {
        let url = serve_once(1024, Duration::ZERO);
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).with_max_bytes(1024);
        assert_eq!(fetcher.fetch(&url, &[]).unwrap().len(), 1024);
    }

    #[test]
    fn test_oversized_body_is_rejected_and_not_cached() {
        let dir = TempDir::new().unwrap();
        let cache = AnchorCache::new(dir.path());
        let url = serve_once(2048, Duration::ZERO);
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).with_max_bytes(1024);

        let err = cache.get_or_fetch(&url, || fetcher.fetch(&url, &[])).unwrap_err();
        assert!(matches!(err, AnchorError::PayloadTooLarge { limit: 1024, .. }));
        assert_eq!(cache.lookup(&url), None);
    }

    #[test]
    fn test_trickling_server_hits_overall_deadline() {
        let url = serve_once(100, Duration::from_millis(50));
        let fetcher = HttpFetcher::new(Duration::from_millis(300));

        let started = Instant::now();
        let err = fetcher.fetch(&url, &[]).unwrap_err();
        assert!(err.is_transport());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        let fetcher = HttpFetcher::new(Duration::from_millis(200));
        let err = fetcher.fetch("http://127.0.0.1:1/anchor.json", &[]).unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("127.0.0.1:1"));
    }
}
