//! Log writer module
//!
//! Routes log lines to one of two channels. Each channel goes to the console
//! unless a file was configured for it.

use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use super::Level;

static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Which log a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Access lines and informational server messages
    Access,
    /// Warnings and errors
    Error,
}

enum Sink {
    Stdout,
    Stderr,
    File(Mutex<LineWriter<File>>),
}

impl Sink {
    fn open(path: Option<&str>, console: Self) -> io::Result<Self> {
        match path {
            Some(path) => Ok(Self::File(Mutex::new(LineWriter::new(open_log_file(path)?)))),
            None => Ok(console),
        }
    }

    fn write_line(&self, message: &str) {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            Self::File(file) => {
                // A poisoned lock or a full disk drops the line; logging never fails a request
                if let Ok(mut file) = file.lock() {
                    let _ = writeln!(file, "{message}");
                }
            }
        }
    }
}

pub struct LogWriter {
    access: Sink,
    error: Sink,
    level: Level,
}

impl LogWriter {
    fn new(
        access_log_file: Option<&str>,
        error_log_file: Option<&str>,
        level: Level,
    ) -> io::Result<Self> {
        Ok(Self {
            access: Sink::open(access_log_file, Sink::Stdout)?,
            error: Sink::open(error_log_file, Sink::Stderr)?,
            level,
        })
    }

    pub const fn level(&self) -> Level {
        self.level
    }

    pub fn write(&self, channel: Channel, message: &str) {
        match channel {
            Channel::Access => self.access.write_line(message),
            Channel::Error => self.error.write_line(message),
        }
    }
}

/// Open a log file for appending, creating missing parent directories
fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the process-wide writer. Fails if called twice.
pub fn init(
    access_log_file: Option<&str>,
    error_log_file: Option<&str>,
    level: Level,
) -> io::Result<()> {
    let writer = LogWriter::new(access_log_file, error_log_file, level)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "log writer already initialized",
        )
    })
}

/// The installed writer, or `None` before `init` (tests, early startup)
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}

/// Write a line on `channel`, falling back to the console before `init`
pub fn emit(channel: Channel, message: &str) {
    match (get(), channel) {
        (Some(writer), _) => writer.write(channel, message),
        (None, Channel::Access) => println!("{message}"),
        (None, Channel::Error) => eprintln!("{message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_go_to_their_own_files() {
        let dir = tempfile::tempdir().unwrap();
        let access = dir.path().join("logs/access.log");
        let error = dir.path().join("logs/error.log");

        let writer = LogWriter::new(
            Some(access.to_str().unwrap()),
            Some(error.to_str().unwrap()),
            Level::Info,
        )
        .unwrap();
        writer.write(Channel::Access, "first");
        writer.write(Channel::Error, "oops");
        writer.write(Channel::Access, "second");

        assert_eq!(std::fs::read_to_string(&access).unwrap(), "first\nsecond\n");
        assert_eq!(std::fs::read_to_string(&error).unwrap(), "oops\n");
    }

    #[test]
    fn test_files_are_appended_not_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access.log");
        std::fs::write(&path, "old\n").unwrap();

        let writer = LogWriter::new(Some(path.to_str().unwrap()), None, Level::Info).unwrap();
        writer.write(Channel::Access, "new");

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }
}
