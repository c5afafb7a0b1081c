//! Size-based log file rotation.

use crate::record::LogRecord;
use crate::sink::LogSink;
use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::error::Error;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

const DEFAULT_MAX_SIZE_MB: u64 = 100;

/// When to rotate and which backups to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Rotate before a write would push the file past this size.
    pub max_size_bytes: u64,
    /// Rotated files to keep; `0` keeps all of them.
    pub max_backups: usize,
    /// Delete rotated files older than this; `None` keeps them forever.
    pub max_age: Option<Duration>,
    /// Gzip rotated files.
    pub compress: bool,
}

impl RotationPolicy {
    /// Build a policy from the units used in configuration. Zero size
    /// means 100 MB, zero age means no age limit.
    pub fn new(max_size_mb: u64, max_backups: usize, max_age_days: u64, compress: bool) -> Self {
        let max_size_mb = if max_size_mb == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            max_size_mb
        };
        RotationPolicy {
            max_size_bytes: max_size_mb.saturating_mul(1024 * 1024),
            max_backups,
            max_age: (max_age_days > 0)
                .then(|| Duration::from_secs(max_age_days.saturating_mul(24 * 60 * 60))),
            compress,
        }
    }
}

impl Default for RotationPolicy {
    fn default() -> Self {
        RotationPolicy::new(0, 0, 0, false)
    }
}

struct State {
    file: File,
    size: u64,
}

/// An append-only log file that rotates itself according to a
/// [`RotationPolicy`].
///
/// Rotated files sit next to the active one as `<stem>-<timestamp>.log`
/// (`.log.gz` when compressed).
pub struct RollingFile {
    path: PathBuf,
    policy: RotationPolicy,
    state: Mutex<State>,
}

impl RollingFile {
    /// Open (or create) `path` for appending, creating parent directories.
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> io::Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let file = open_append(&path)?;
        let size = file.metadata()?.len();
        Ok(RollingFile {
            path,
            policy,
            state: Mutex::new(State { file, size }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `bytes`, rotating first if they would not fit.
    pub fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.lock()?;
        let len = bytes.len() as u64;
        if state.size > 0 && state.size + len > self.policy.max_size_bytes {
            self.rotate(&mut state)?;
        }
        state.file.write_all(bytes)?;
        state.size += len;
        Ok(())
    }

    pub fn flush(&self) -> io::Result<()> {
        self.lock()?.file.flush()
    }

    /// Rotated files for this log, oldest first.
    pub fn backups(&self) -> io::Result<Vec<PathBuf>> {
        let (dir, prefix) = self.backup_prefix();
        let mut found = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&prefix) && (name.ends_with(".log") || name.ends_with(".log.gz")) {
                found.push(entry.path());
            }
        }
        found.sort();
        Ok(found)
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))
    }

    fn backup_prefix(&self) -> (PathBuf, String) {
        let dir = match self.path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        (dir, format!("{}-", stem))
    }

    fn next_backup_path(&self) -> PathBuf {
        let (dir, prefix) = self.backup_prefix();
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.9f").to_string();
        let mut candidate = dir.join(format!("{}{}.log", prefix, stamp));
        let mut n = 1;
        while candidate.exists() || gz_path(&candidate).exists() {
            candidate = dir.join(format!("{}{}_{:04}.log", prefix, stamp, n));
            n += 1;
        }
        candidate
    }

    fn rotate(&self, state: &mut State) -> io::Result<()> {
        state.file.flush()?;
        let backup = self.next_backup_path();
        fs::rename(&self.path, &backup)?;
        state.file = open_append(&self.path)?;
        state.size = 0;

        if self.policy.compress {
            if let Err(e) = compress(&backup) {
                eprintln!("failed to compress rotated log {}: {}", backup.display(), e);
            }
        }
        if let Err(e) = self.prune() {
            eprintln!("failed to prune rotated logs for {}: {}", self.path.display(), e);
        }
        Ok(())
    }

    fn prune(&self) -> io::Result<()> {
        let mut backups = self.backups()?;

        if let Some(max_age) = self.policy.max_age {
            let now = SystemTime::now();
            backups.retain(|path| {
                let expired = fs::metadata(path)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .map(|age| age > max_age)
                    .unwrap_or(false);
                if expired {
                    if let Err(e) = fs::remove_file(path) {
                        eprintln!("failed to remove expired log {}: {}", path.display(), e);
                    }
                }
                !expired
            });
        }

        if self.policy.max_backups > 0 && backups.len() > self.policy.max_backups {
            let excess = backups.len() - self.policy.max_backups;
            for path in backups.drain(..excess) {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

impl LogSink for RollingFile {
    fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.write_all(record.to_json_line().as_bytes())?;
        Ok(())
    }

    fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        RollingFile::flush(self)?;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

fn compress(path: &Path) -> io::Result<()> {
    let target = gz_path(path);
    let mut input = File::open(path)?;
    let mut encoder = GzEncoder::new(File::create(&target)?, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?;
    fs::remove_file(path)
}
