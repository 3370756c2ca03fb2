//! File loading module
//!
//! Reads whole files into owned buffers and reports a missing file
//! separately from any other I/O failure.

use std::io;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::ServerError;

/// Contents of one file, owned by whoever called `FileStore::load`
#[derive(Debug)]
pub struct FileBuffer {
    data: Vec<u8>,
    size: usize,
}

impl FileBuffer {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub const fn size(&self) -> usize {
        self.size
    }
}

/// Loads files from disk, refusing any larger than `max_size` bytes
#[derive(Debug, Clone, Copy)]
pub struct FileStore {
    max_size: usize,
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStore {
    /// A store with no size limit
    pub const fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    pub const fn with_limit(max_size: usize) -> Self {
        Self { max_size }
    }

    /// Read the whole of `path`
    ///
    /// Returns `NotFound` when the path does not name a regular file,
    /// `ResponseTooLarge` when it holds more than `max_size` bytes (checked
    /// before any buffer is allocated), and `Io` for anything else.
    pub async fn load(&self, path: &Path) -> Result<FileBuffer, ServerError> {
        let file = File::open(path).await.map_err(|e| classify(path, e))?;
        let metadata = file.metadata().await.map_err(|e| classify(path, e))?;
        if !metadata.is_file() {
            return Err(ServerError::NotFound(path.to_path_buf()));
        }

        let on_disk = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        self.check_size(on_disk)?;

        // The file may grow after the metadata call, so bound the read too
        let read_limit = u64::try_from(self.max_size)
            .unwrap_or(u64::MAX)
            .saturating_add(1);
        let mut data = Vec::with_capacity(on_disk);
        file.take(read_limit)
            .read_to_end(&mut data)
            .await
            .map_err(|e| classify(path, e))?;
        self.check_size(data.len())?;

        let size = data.len();
        Ok(FileBuffer { data, size })
    }

    /// Give a buffer back once its bytes have been sent and cached
    pub fn release(&self, buffer: FileBuffer) {
        drop(buffer);
    }

    const fn check_size(&self, size: usize) -> Result<(), ServerError> {
        if size > self.max_size {
            return Err(ServerError::ResponseTooLarge {
                size,
                limit: self.max_size,
            });
        }
        Ok(())
    }
}

fn classify(path: &Path, err: io::Error) -> ServerError {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => {
            ServerError::NotFound(path.to_path_buf())
        }
        _ => ServerError::Io {
            path: path.to_path_buf(),
            source: err,
        },
    }
}
