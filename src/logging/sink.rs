//! Log sinks: console plus two size-rotating files
//!
//! Sinks are shared per log directory through a process-wide registry, so
//! every logger pointed at the same directory appends through the same
//! rotating writer and a file is never rotated by two writers.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use super::format::{format_line, Level, LogRecord};
use crate::config::LoggingConfig;

/// File receiving every record at debug and above
pub const GENERAL_LOG_FILE: &str = "bot.log";

/// File receiving only error and critical records
pub const ERROR_LOG_FILE: &str = "errors.log";

/// Append-only file that rolls over once it reaches `max_bytes`
///
/// Rollover renames `name` → `name.1` → … → `name.{backups}`, dropping the
/// oldest. With zero backups the file is truncated instead.
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    file: Option<File>,
    written: u64,
}

impl RotatingFile {
    pub fn new(path: PathBuf, max_bytes: u64, backups: usize) -> Self {
        Self {
            path,
            max_bytes,
            backups,
            file: None,
            written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line, rotating first if it would cross the size limit
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let len = line.len() as u64 + 1;

        if self.file.is_none() {
            self.open()?;
        }

        if self.written > 0 && self.written + len >= self.max_bytes {
            self.rotate()?;
        }

        let file = match self.file.as_mut() {
            Some(file) => file,
            None => return Err(io::Error::new(io::ErrorKind::Other, "log file not open")),
        };

        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        self.written += len;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn open(&mut self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.written = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }

        if self.backups > 0 {
            for index in (1..self.backups).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    fs::rename(&from, self.backup_path(index + 1))?;
                }
            }
            if self.path.exists() {
                fs::rename(&self.path, self.backup_path(1))?;
            }
        } else {
            File::create(&self.path)?;
        }

        self.open()
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }
}

/// The three sinks of one log directory
#[derive(Debug)]
pub struct LogSinks {
    dir: PathBuf,
    console: bool,
    general: Mutex<RotatingFile>,
    errors: Mutex<RotatingFile>,
    failed_writes: AtomicU64,
}

impl LogSinks {
    pub fn new(config: &LoggingConfig) -> Self {
        let dir = config.dir.clone();
        Self {
            general: Mutex::new(RotatingFile::new(
                dir.join(GENERAL_LOG_FILE),
                config.max_file_size,
                config.backup_count,
            )),
            errors: Mutex::new(RotatingFile::new(
                dir.join(ERROR_LOG_FILE),
                config.max_file_size,
                config.backup_count,
            )),
            console: config.console,
            dir,
            failed_writes: AtomicU64::new(0),
        }
    }

    /// Shared sinks for `config.dir`, created on first use
    ///
    /// Later calls for the same directory return the existing sinks and
    /// ignore the rest of `config`.
    pub fn shared(config: &LoggingConfig) -> Arc<LogSinks> {
        static REGISTRY: OnceLock<DashMap<PathBuf, Arc<LogSinks>>> = OnceLock::new();

        let registry = REGISTRY.get_or_init(DashMap::new);
        registry
            .entry(registry_key(&config.dir))
            .or_insert_with(|| Arc::new(LogSinks::new(config)))
            .clone()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of lines that could not be written to a file sink
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }

    /// Fan a record out to every sink whose threshold it meets
    ///
    /// I/O failures are counted, never returned.
    pub fn write(&self, record: &LogRecord<'_>) {
        let line = format_line(record);

        if self.console && record.level >= Level::Info {
            let mut stderr = io::stderr().lock();
            if writeln!(stderr, "{}", line).is_err() {
                self.failed_writes.fetch_add(1, Ordering::Relaxed);
            }
        }

        if self.general.lock().write_line(&line).is_err() {
            self.record_failure();
        }

        if record.level >= Level::Error && self.errors.lock().write_line(&line).is_err() {
            self.record_failure();
        }
    }

    pub fn flush(&self) {
        if self.general.lock().flush().is_err() {
            self.record_failure();
        }
        if self.errors.lock().flush().is_err() {
            self.record_failure();
        }
    }

    fn record_failure(&self) {
        let previous = self.failed_writes.fetch_add(1, Ordering::Relaxed);
        if previous == 0 {
            eprintln!(
                "Warning: failed to write to log files in {}; further failures are counted silently",
                self.dir.display()
            );
        }
    }
}

fn registry_key(dir: &Path) -> PathBuf {
    // Directories that do not exist yet cannot be canonicalized
    let _ = fs::create_dir_all(dir);
    fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::fields::Fields;

    fn test_config(dir: &Path) -> LoggingConfig {
        LoggingConfig {
            dir: dir.to_path_buf(),
            console: false,
            ..LoggingConfig::default()
        }
    }

    #[test]
    fn test_rotating_file_rolls_over() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.log");
        let mut file = RotatingFile::new(path.clone(), 64, 2);

        for i in 0..10 {
            file.write_line(&format!("line number {:02} padded out", i)).unwrap();
        }
        file.flush().unwrap();

        assert!(path.exists());
        assert!(dir.path().join("bot.log.1").exists());
        assert!(dir.path().join("bot.log.2").exists());
        assert!(!dir.path().join("bot.log.3").exists());

        // Newest line lives in the active file
        let current = fs::read_to_string(&path).unwrap();
        assert!(current.contains("line number 09"));
        assert!(fs::metadata(&path).unwrap().len() < 64);
    }

    #[test]
    fn test_rotating_file_without_backups_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.log");
        let mut file = RotatingFile::new(path.clone(), 40, 0);

        for i in 0..5 {
            file.write_line(&format!("entry {} with some padding", i)).unwrap();
        }
        file.flush().unwrap();

        assert!(!dir.path().join("bot.log.1").exists());
        let current = fs::read_to_string(&path).unwrap();
        assert_eq!(current.lines().count(), 1);
        assert!(current.contains("entry 4"));
    }

    #[test]
    fn test_sinks_split_by_level() {
        let dir = tempfile::tempdir().unwrap();
        let sinks = LogSinks::new(&test_config(dir.path()));
        let fields = Fields::new().with("error_code", 500);

        sinks.write(&LogRecord::now(Level::Debug, "test", "debug line", &fields));
        sinks.write(&LogRecord::now(Level::Error, "test", "error line", &fields));
        sinks.flush();

        let general = fs::read_to_string(dir.path().join(GENERAL_LOG_FILE)).unwrap();
        let errors = fs::read_to_string(dir.path().join(ERROR_LOG_FILE)).unwrap();

        assert!(general.contains("debug line"));
        assert!(general.contains("error line"));
        assert!(!errors.contains("debug line"));
        assert!(errors.contains("error line | error_code=500"));
        assert_eq!(sinks.failed_writes(), 0);
    }

    #[test]
    fn test_shared_sinks_are_reused_per_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let first = LogSinks::shared(&config);
        let second = LogSinks::shared(&config);
        assert!(Arc::ptr_eq(&first, &second));

        let other_dir = tempfile::tempdir().unwrap();
        let other = LogSinks::shared(&test_config(other_dir.path()));
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[test]
    fn test_unwritable_directory_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file in the way").unwrap();

        let sinks = LogSinks::new(&test_config(&blocker));
        let fields = Fields::new();
        sinks.write(&LogRecord::now(Level::Error, "test", "lost", &fields));

        assert_eq!(sinks.failed_writes(), 2);
    }
}
