//! MIME type detection module
//!
//! Maps a file path to the Content-Type sent with it.

/// Fallback for unknown or missing extensions
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Resolve the MIME type of a file path
///
/// The extension is whatever follows the last `.` of the final path segment,
/// compared case-insensitively.
///
/// # Examples
/// ```
/// use cached_webserver::http::mime::resolve;
/// assert_eq!(resolve("a/b.html"), "text/html");
/// assert_eq!(resolve("noext"), "application/octet-stream");
/// ```
pub fn resolve(path: &str) -> &'static str {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((_, ext)) => for_extension(&ext.to_ascii_lowercase()),
        None => DEFAULT_MIME_TYPE,
    }
}

/// Look up a lowercase extension without its leading dot
pub fn for_extension(ext: &str) -> &'static str {
    match ext {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "xml" => "application/xml",
        "js" | "mjs" => "application/javascript",
        "json" | "map" => "application/json",
        "wasm" => "application/wasm",

        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",

        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",

        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",

        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        _ => DEFAULT_MIME_TYPE,
    }
}
