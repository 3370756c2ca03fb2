//! Static file serving module
//!
//! Maps request paths onto the document root, answers from the content cache
//! when possible, and falls back to the server's own 404 page.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::config::PathsConfig;
use crate::error::ServerError;
use crate::handler::file_store::FileStore;
use crate::handler::router::{RequestPipeline, Response};
use crate::http::{mime, Status};
use crate::logger::{self, CacheOutcome};

/// Map a request path to a file under `document_root`
///
/// `/` and any path ending in `/` get `index_file` appended. Empty and `.`
/// segments are skipped. Returns `None` for any `..` segment or a segment
/// holding a backslash or NUL, so the result never escapes the root
/// lexically. Symlinks are not followed here; `serve_static` checks where
/// they lead before reading.
pub fn resolve_target(document_root: &Path, index_file: &str, request_path: &str) -> Option<PathBuf> {
    let mut resolved = document_root.to_path_buf();
    let mut wants_index = true;

    for segment in request_path.split('/') {
        match segment {
            "" | "." => wants_index = true,
            ".." => return None,
            s if s.contains(['\\', '\0']) => return None,
            s => {
                resolved.push(s);
                wants_index = false;
            }
        }
    }

    if wants_index {
        resolved.push(index_file);
    }
    Some(resolved)
}

/// Whether `path`, once symlinks are resolved, still lies under `document_root`
///
/// A target that cannot be resolved counts as contained; the load that
/// follows reports it as missing.
async fn stays_under_root(document_root: &Path, path: &Path) -> bool {
    match (fs::canonicalize(document_root).await, fs::canonicalize(path).await) {
        (Ok(root), Ok(target)) => target.starts_with(root),
        (_, Err(_)) => true,
        (Err(_), Ok(_)) => false,
    }
}

/// Confirm the server's own 404 page is present before accepting traffic
pub async fn verify_system_files(paths: &PathsConfig) -> Result<(), ServerError> {
    let path = paths.not_found_path();
    match FileStore::new().load(&path).await {
        Ok(_) => Ok(()),
        Err(ServerError::NotFound(p)) => Err(ServerError::SystemResourceMissing(p)),
        Err(e) => Err(e),
    }
}

impl RequestPipeline {
    /// Serve a file from the document root, consulting the cache first
    pub(super) async fn serve_static(&mut self, request_path: &str) -> Result<Response, ServerError> {
        let Some(path) = resolve_target(
            &self.paths.document_root,
            &self.paths.index_file,
            request_path,
        ) else {
            logger::log_warning(&format!("Path traversal attempt blocked: {request_path}"));
            return self.serve_not_found().await;
        };
        let key = path.to_string_lossy().into_owned();

        if let Some(entry) = self.cache.get(&key) {
            logger::log_cache_event("hit", &key);
            let wire = self.framer.frame(
                Status::Ok,
                entry.content_type(),
                entry.content(),
                entry.content_length(),
            )?;
            return Ok(Response::new(Status::Ok, entry.content_length(), CacheOutcome::Hit, wire));
        }

        if !stays_under_root(&self.paths.document_root, &path).await {
            logger::log_warning(&format!("Symlink escape blocked: {request_path}"));
            return self.serve_not_found().await;
        }

        let buffer = match self.store.load(&path).await {
            Ok(buffer) => buffer,
            Err(ServerError::NotFound(_)) => return self.serve_not_found().await,
            Err(e) => return Err(e),
        };

        let content_type = mime::resolve(&key);
        let wire = self
            .framer
            .frame(Status::Ok, content_type, buffer.data(), buffer.size())?;
        self.cache.put(&key, content_type, buffer.data(), buffer.size());
        logger::log_cache_event("stored", &key);

        let body_length = buffer.size();
        self.store.release(buffer);
        Ok(Response::new(Status::Ok, body_length, CacheOutcome::Miss, wire))
    }

    /// Serve the server's own 404 page
    ///
    /// The page is part of the server, not of the site: if it is missing the
    /// server cannot run, so absence is reported as `SystemResourceMissing`.
    pub(super) async fn serve_not_found(&self) -> Result<Response, ServerError> {
        let path = self.paths.not_found_path();
        let buffer = match self.store.load(&path).await {
            Ok(buffer) => buffer,
            Err(ServerError::NotFound(p)) => return Err(ServerError::SystemResourceMissing(p)),
            Err(e) => return Err(e),
        };

        let content_type = mime::resolve(&path.to_string_lossy());
        let wire = self
            .framer
            .frame(Status::NotFound, content_type, buffer.data(), buffer.size())?;

        let body_length = buffer.size();
        self.store.release(buffer);
        Ok(Response::new(
            Status::NotFound,
            body_length,
            CacheOutcome::Bypass,
            wire,
        ))
    }
}
