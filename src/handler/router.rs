//! Request routing dispatch module
//!
//! Entry point for request processing: parses the request line, validates the
//! method, and dispatches to the dice endpoint or the static file handler.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cache::ContentCache;
use crate::config::Config;
use crate::config::PathsConfig;
use crate::error::ServerError;
use crate::handler::dice;
use crate::handler::file_store::FileStore;
use crate::http::{RequestLine, ResponseFramer, Status};
use crate::logger::{self, CacheOutcome};

/// A fully framed response plus what the access log needs to know about it
#[derive(Debug)]
pub struct Response {
    pub status: Status,
    pub body_length: usize,
    pub cache: CacheOutcome,
    /// Bytes to write to the connection
    pub wire: Vec<u8>,
}

impl Response {
    pub const fn new(status: Status, body_length: usize, cache: CacheOutcome, wire: Vec<u8>) -> Self {
        Self {
            status,
            body_length,
            cache,
            wire,
        }
    }
}

/// Owns everything a request needs: the cache, file access, framing and the
/// dice source. Built once at startup and handed to the connection loop.
pub struct RequestPipeline {
    pub(super) cache: ContentCache,
    pub(super) store: FileStore,
    pub(super) framer: ResponseFramer,
    pub(super) paths: PathsConfig,
    rng: StdRng,
}

impl RequestPipeline {
    pub fn new(config: &Config) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Build a pipeline with a caller-supplied random source
    pub fn with_rng(config: &Config, rng: StdRng) -> Self {
        let framer = ResponseFramer::new(config.http.max_response_size);
        Self {
            cache: ContentCache::new(config.cache.capacity, config.cache.ttl),
            store: FileStore::with_limit(framer.max_response_size()),
            framer,
            paths: config.paths.clone(),
            rng,
        }
    }

    pub const fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Parse a raw request and produce its response
    pub async fn process(&mut self, raw: &[u8]) -> Result<(RequestLine, Response), ServerError> {
        let request = RequestLine::parse(raw)?;
        let response = self.handle(&request).await?;
        Ok((request, response))
    }

    /// Route a parsed request
    pub async fn handle(&mut self, request: &RequestLine) -> Result<Response, ServerError> {
        if request.method != "GET" {
            logger::log_warning(&format!("Method not allowed: {}", request.method));
            return self.method_not_allowed();
        }

        let path = request.path();
        if path == dice::D20_PATH {
            return self.serve_d20();
        }

        self.serve_static(path).await
    }

    fn serve_d20(&mut self) -> Result<Response, ServerError> {
        let body = dice::roll(&mut self.rng).to_string();
        let wire = self
            .framer
            .frame(Status::Ok, "text/plain", body.as_bytes(), body.len())?;
        Ok(Response::new(Status::Ok, body.len(), CacheOutcome::Bypass, wire))
    }

    fn method_not_allowed(&self) -> Result<Response, ServerError> {
        let body = b"405 Method Not Allowed";
        let wire = self
            .framer
            .frame(Status::MethodNotAllowed, "text/plain", body, body.len())?;
        Ok(Response::new(
            Status::MethodNotAllowed,
            body.len(),
            CacheOutcome::Bypass,
            wire,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const NOT_FOUND_BODY: &str = "<h1>404 Page Not Found</h1>";

    struct Fixture {
        _dirs: (TempDir, TempDir),
        config: Config,
    }

    impl Fixture {
        fn new() -> Self {
            let docs = tempfile::tempdir().unwrap();
            let system = tempfile::tempdir().unwrap();
            fs::write(docs.path().join("index.html"), "<h1>hi</h1>").unwrap();
            fs::write(system.path().join("404.html"), NOT_FOUND_BODY).unwrap();

            let mut config = Config::defaults().unwrap();
            config.paths.document_root = docs.path().to_path_buf();
            config.paths.system_root = system.path().to_path_buf();
            Self {
                _dirs: (docs, system),
                config,
            }
        }

        fn docs(&self) -> &Path {
            &self.config.paths.document_root
        }

        fn pipeline(&self) -> RequestPipeline {
            RequestPipeline::with_rng(&self.config, StdRng::seed_from_u64(1))
        }
    }

    /// Split a framed response into status line, headers, and body
    fn split(wire: &[u8]) -> (String, Vec<(String, String)>, Vec<u8>) {
        let boundary = wire
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("header terminator");
        let head = std::str::from_utf8(&wire[..boundary]).unwrap();
        let mut lines = head.split("\r\n");
        let status = lines.next().unwrap().to_string();
        let headers = lines
            .map(|line| {
                let (name, value) = line.split_once(": ").unwrap();
                (name.to_string(), value.to_string())
            })
            .collect();
        (status, headers, wire[boundary + 4..].to_vec())
    }

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> &'a str {
        headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing header {name}"))
    }

    fn get(path: &str) -> Vec<u8> {
        format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n").into_bytes()
    }

    #[tokio::test]
    async fn test_serves_index_for_root() {
        let fixture = Fixture::new();
        let mut pipeline = fixture.pipeline();

        let (request, response) = pipeline.process(&get("/")).await.unwrap();
        assert_eq!(request.target, "/");
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.cache, CacheOutcome::Miss);

        let (status, headers, body) = split(&response.wire);
        assert_eq!(status, "HTTP/1.1 200 OK");
        assert_eq!(header(&headers, "Content-Type"), "text/html");
        assert_eq!(header(&headers, "Content-Length"), "11");
        assert_eq!(header(&headers, "Connection"), "close");
        assert_eq!(body, b"<h1>hi</h1>");
    }

    #[tokio::test]
    async fn test_header_order_is_fixed() {
        let fixture = Fixture::new();
        let mut pipeline = fixture.pipeline();

        for path in ["/", "/d20", "/nope.txt"] {
            let (_, response) = pipeline.process(&get(path)).await.unwrap();
            let (_, headers, _) = split(&response.wire);
            let names: Vec<&str> = headers.iter().map(|(n, _)| n.as_str()).collect();
            assert_eq!(names, ["Date", "Content-Length", "Content-Type", "Connection"]);
        }
    }

    #[tokio::test]
    async fn test_missing_file_serves_404_page() {
        let fixture = Fixture::new();
        let mut pipeline = fixture.pipeline();

        let (_, response) = pipeline.process(&get("/nope.txt")).await.unwrap();
        assert_eq!(response.status, Status::NotFound);

        let (status, headers, body) = split(&response.wire);
        assert_eq!(status, "HTTP/1.1 404 NOT FOUND");
        assert_eq!(header(&headers, "Content-Type"), "text/html");
        assert_eq!(
            header(&headers, "Content-Length"),
            NOT_FOUND_BODY.len().to_string()
        );
        assert_eq!(body, NOT_FOUND_BODY.as_bytes());
        assert!(pipeline.cache().is_empty());
    }

    #[tokio::test]
    async fn test_missing_404_page_is_fatal() {
        let fixture = Fixture::new();
        fs::remove_file(fixture.config.paths.not_found_path()).unwrap();
        let mut pipeline = fixture.pipeline();

        let err = pipeline.process(&get("/nope.txt")).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, ServerError::SystemResourceMissing(_)));
    }

    #[tokio::test]
    async fn test_d20_returns_value_in_range() {
        let fixture = Fixture::new();
        let mut pipeline = fixture.pipeline();

        for _ in 0..1000 {
            let (_, response) = pipeline.process(&get("/d20")).await.unwrap();
            let (status, headers, body) = split(&response.wire);
            assert_eq!(status, "HTTP/1.1 200 OK");
            assert_eq!(header(&headers, "Content-Type"), "text/plain");

            let value: u32 = std::str::from_utf8(&body).unwrap().parse().unwrap();
            assert!(value <= 19);
            assert_eq!(header(&headers, "Content-Length"), body.len().to_string());
        }
        assert!(pipeline.cache().is_empty());
    }

    #[tokio::test]
    async fn test_warm_request_matches_cold_request() {
        let fixture = Fixture::new();
        fs::write(fixture.docs().join("style.css"), "body { color: red; }").unwrap();
        let mut pipeline = fixture.pipeline();

        let (_, cold) = pipeline.process(&get("/style.css")).await.unwrap();
        let (_, warm) = pipeline.process(&get("/style.css")).await.unwrap();
        assert_eq!(cold.cache, CacheOutcome::Miss);
        assert_eq!(warm.cache, CacheOutcome::Hit);

        let (cold_status, cold_headers, cold_body) = split(&cold.wire);
        let (warm_status, warm_headers, warm_body) = split(&warm.wire);
        assert_eq!(cold_status, warm_status);
        assert_eq!(cold_body, warm_body);
        assert_eq!(cold_headers[1..], warm_headers[1..]);
        assert_eq!(pipeline.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn test_cached_body_survives_file_change() {
        let fixture = Fixture::new();
        let file = fixture.docs().join("page.html");
        fs::write(&file, "v1").unwrap();
        let mut pipeline = fixture.pipeline();

        pipeline.process(&get("/page.html")).await.unwrap();
        fs::write(&file, "version two").unwrap();
        let (_, response) = pipeline.process(&get("/page.html")).await.unwrap();

        let (_, _, body) = split(&response.wire);
        assert_eq!(body, b"v1");
    }

    #[tokio::test]
    async fn test_cache_keyed_by_resolved_path() {
        let fixture = Fixture::new();
        let mut pipeline = fixture.pipeline();

        pipeline.process(&get("/")).await.unwrap();
        let (_, response) = pipeline.process(&get("/index.html")).await.unwrap();

        assert_eq!(response.cache, CacheOutcome::Hit);
        assert_eq!(pipeline.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_capacity_is_respected() {
        let mut fixture = Fixture::new();
        fixture.config.cache.capacity = 2;
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(fixture.docs().join(name), name).unwrap();
        }
        let mut pipeline = fixture.pipeline();

        for name in ["a.txt", "b.txt", "c.txt"] {
            pipeline.process(&get(&format!("/{name}"))).await.unwrap();
        }

        assert_eq!(pipeline.cache().len(), 2);
        let (_, response) = pipeline.process(&get("/a.txt")).await.unwrap();
        assert_eq!(response.cache, CacheOutcome::Miss);
    }

    #[tokio::test]
    async fn test_traversal_serves_404() {
        let fixture = Fixture::new();
        let mut pipeline = fixture.pipeline();

        let (_, response) = pipeline.process(&get("/../404.html")).await.unwrap();
        assert_eq!(response.status, Status::NotFound);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_out_of_root_serves_404() {
        let fixture = Fixture::new();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.txt"),
            fixture.docs().join("link.txt"),
        )
        .unwrap();
        let mut pipeline = fixture.pipeline();

        let (_, response) = pipeline.process(&get("/link.txt")).await.unwrap();
        assert_eq!(response.status, Status::NotFound);
        let (_, _, body) = split(&response.wire);
        assert_eq!(body, NOT_FOUND_BODY.as_bytes());
        assert!(pipeline.cache().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_inside_root_is_served() {
        let fixture = Fixture::new();
        std::os::unix::fs::symlink(
            fixture.docs().join("index.html"),
            fixture.docs().join("alias.html"),
        )
        .unwrap();
        let mut pipeline = fixture.pipeline();

        let (_, response) = pipeline.process(&get("/alias.html")).await.unwrap();
        assert_eq!(response.status, Status::Ok);
        let (_, _, body) = split(&response.wire);
        assert_eq!(body, b"<h1>hi</h1>");
    }

    #[tokio::test]
    async fn test_query_string_is_ignored() {
        let fixture = Fixture::new();
        let mut pipeline = fixture.pipeline();

        let (_, response) = pipeline.process(&get("/index.html?v=3")).await.unwrap();
        assert_eq!(response.status, Status::Ok);
        let (_, _, body) = split(&response.wire);
        assert_eq!(body, b"<h1>hi</h1>");
    }

    #[tokio::test]
    async fn test_non_get_is_rejected() {
        let fixture = Fixture::new();
        let mut pipeline = fixture.pipeline();

        let raw = b"POST /save HTTP/1.1\r\nContent-Type: text/plain\r\n\r\nHello";
        let (_, response) = pipeline.process(raw).await.unwrap();
        assert_eq!(response.status, Status::MethodNotAllowed);

        let (status, headers, _) = split(&response.wire);
        assert_eq!(status, "HTTP/1.1 405 METHOD NOT ALLOWED");
        assert_eq!(header(&headers, "Content-Type"), "text/plain");
    }

    #[tokio::test]
    async fn test_malformed_request_line() {
        let fixture = Fixture::new();
        let mut pipeline = fixture.pipeline();

        for raw in [&b"GARBAGE\r\n\r\n"[..], b"GET /\r\n", b"\r\n"] {
            let err = pipeline.process(raw).await.unwrap_err();
            assert!(matches!(err, ServerError::MalformedRequest(_)));
            assert!(!err.is_fatal());
        }
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected_and_not_cached() {
        let mut fixture = Fixture::new();
        fixture.config.http.max_response_size = 256;
        fs::write(fixture.docs().join("big.txt"), vec![b'x'; 1024]).unwrap();
        let mut pipeline = fixture.pipeline();

        let err = pipeline.process(&get("/big.txt")).await.unwrap_err();
        assert!(matches!(err, ServerError::ResponseTooLarge { .. }));
        assert!(pipeline.cache().is_empty());
    }

    #[tokio::test]
    async fn test_huge_sparse_file_is_rejected_without_caching() {
        let mut fixture = Fixture::new();
        fixture.config.http.max_response_size = 256;
        let huge = fs::File::create(fixture.docs().join("huge.bin")).unwrap();
        huge.set_len(1 << 30).unwrap();
        let mut pipeline = fixture.pipeline();

        let err = pipeline.process(&get("/huge.bin")).await.unwrap_err();
        assert!(matches!(
            err,
            ServerError::ResponseTooLarge { size, limit: 256 } if size == 1 << 30
        ));
        assert!(!err.is_fatal());
        assert!(pipeline.cache().is_empty());
        assert_eq!(pipeline.cache().stats().misses, 1);
    }

    #[tokio::test]
    async fn test_binary_file_round_trips() {
        let fixture = Fixture::new();
        let bytes: Vec<u8> = (0..=255).collect();
        fs::write(fixture.docs().join("blob.png"), &bytes).unwrap();
        let mut pipeline = fixture.pipeline();

        for _ in 0..2 {
            let (_, response) = pipeline.process(&get("/blob.png")).await.unwrap();
            let (_, headers, body) = split(&response.wire);
            assert_eq!(header(&headers, "Content-Type"), "image/png");
            assert_eq!(body, bytes);
        }
    }
}
