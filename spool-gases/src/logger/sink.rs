//! Output sinks for rendered access log lines.
//!
//! A sink receives each rendered line in one `write_line` call and is
//! responsible for its own serialisation between concurrent requests.

use chrono::{NaiveDate, Utc};
use spool_core::SpoolError;
use spool_core::config::{AccessLogSettings, FileOutputConfig, OutputKind};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tracing::{error, info, warn};

/// Destination for rendered lines.
pub trait Sink: Send + Sync {
    /// Write one rendered line, exactly as rendered.
    fn write_line(&self, line: &[u8]) -> io::Result<()>;
}

/// Process standard output.
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(line)?;
        out.flush()
    }
}

/// Process standard error.
pub struct StderrSink;

impl Sink for StderrSink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        io::stderr().lock().write_all(line)
    }
}

/// Forwards each line as an `info` event on the `access_log` target.
pub struct TracingSink;

impl Sink for TracingSink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(line);
        tracing::info!(target: "access_log", "{}", text.trim_end_matches('\n'));
        Ok(())
    }
}

/// Collects lines in memory. Handy in tests and for embedding.
#[derive(Default)]
pub struct MemorySink {
    buf: Mutex<Vec<u8>>,
    writes: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.buf.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Contents split on `\n`, without the terminators.
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.contents())
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Number of `write_line` calls.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Sink for MemorySink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut buf = self
            .buf
            .lock()
            .map_err(|_| io::Error::other("memory sink lock poisoned"))?;
        buf.extend_from_slice(line);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Append-only access log file with daily (UTC) and size-based rotation.
///
/// Rotated files get a date suffix (`access.log.2026-10-18`) or, for size
/// rotation, a timestamp suffix. Old rotations beyond `max_rotated_files`
/// are pruned.
pub struct RotatingFileSink {
    config: FileOutputConfig,
    inner: Mutex<FileState>,
}

struct FileState {
    writer: BufWriter<File>,
    current_date: NaiveDate,
    current_size: u64,
}

impl RotatingFileSink {
    /// Open (or create) the log file, creating parent directories.
    pub fn open(config: FileOutputConfig) -> io::Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = open_append(&config.path)?;
        let current_size = file.metadata()?.len();

        info!(path = %config.path.display(), "Access log file opened");

        Ok(Self {
            config,
            inner: Mutex::new(FileState {
                writer: BufWriter::new(file),
                current_date: Utc::now().date_naive(),
                current_size,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn rotate(&self, state: &mut FileState, today: NaiveDate, by_date: bool) -> io::Result<()> {
        state.writer.flush()?;

        let suffix = if by_date {
            state.current_date.format("%Y-%m-%d").to_string()
        } else {
            Utc::now().format("%Y-%m-%d-%H%M%S").to_string()
        };
        let rotated = unused_rotated_path(&self.config.path, &suffix);

        match fs::rename(&self.config.path, &rotated) {
            Ok(()) => info!(
                from = %self.config.path.display(),
                to = %rotated.display(),
                "Rotated access log"
            ),
            Err(e) => error!(
                error = %e,
                from = %self.config.path.display(),
                to = %rotated.display(),
                "Failed to rotate access log"
            ),
        }

        if self.config.max_rotated_files > 0 {
            if let Err(e) = prune_rotated_files(&self.config.path, self.config.max_rotated_files) {
                warn!(error = %e, "Failed to prune old access log files");
            }
        }

        state.writer = BufWriter::new(open_append(&self.config.path)?);
        state.current_date = today;
        state.current_size = 0;
        Ok(())
    }
}

impl Sink for RotatingFileSink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("access log writer lock poisoned"))?;

        let today = Utc::now().date_naive();
        let by_date = today != state.current_date;
        let by_size = self.config.max_file_size_bytes > 0
            && state.current_size >= self.config.max_file_size_bytes;
        if by_date || by_size {
            self.rotate(&mut state, today, by_date)?;
        }

        state.writer.write_all(line)?;
        state.writer.flush()?;
        state.current_size += line.len() as u64;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// `access.log` → `access.log.2026-10-18`.
fn rotated_file_path(base: &Path, suffix: &str) -> PathBuf {
    let mut path = base.as_os_str().to_owned();
    path.push(".");
    path.push(suffix);
    PathBuf::from(path)
}

/// Like [`rotated_file_path`], but adds `.1`, `.2`, ... while the target
/// already exists, so a rotation never replaces an earlier one.
fn unused_rotated_path(base: &Path, suffix: &str) -> PathBuf {
    let mut path = rotated_file_path(base, suffix);
    let mut n = 1u32;
    while path.exists() {
        path = rotated_file_path(base, &format!("{suffix}.{n}"));
        n += 1;
    }
    path
}

/// Keep only the newest `keep` rotated siblings of `base`, by mtime.
fn prune_rotated_files(base: &Path, keep: usize) -> io::Result<()> {
    let parent = match base.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let prefix = format!(
        "{}.",
        base.file_name().unwrap_or_default().to_string_lossy()
    );

    let mut rotated: Vec<(SystemTime, PathBuf)> = fs::read_dir(parent)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
        .map(|e| {
            let modified = e
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, e.path())
        })
        .collect();

    if rotated.len() <= keep {
        return Ok(());
    }
    // Date and size suffixes interleave lexically; ties fall back to name.
    rotated.sort();
    let excess = rotated.len() - keep;
    for (_, old) in rotated.into_iter().take(excess) {
        fs::remove_file(&old)?;
    }
    Ok(())
}

/// Build the sink named by the settings.
pub fn open_sink(settings: &AccessLogSettings) -> Result<Arc<dyn Sink>, SpoolError> {
    let sink: Arc<dyn Sink> = match settings.output {
        OutputKind::Stdout => Arc::new(StdoutSink),
        OutputKind::Stderr => Arc::new(StderrSink),
        OutputKind::Tracing => Arc::new(TracingSink),
        OutputKind::File => Arc::new(RotatingFileSink::open(settings.file.clone())?),
    };
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config(dir: &Path, max_size: u64, keep: usize) -> FileOutputConfig {
        FileOutputConfig {
            path: dir.join("logs").join("access.log"),
            max_file_size_bytes: max_size,
            max_rotated_files: keep,
        }
    }

    #[test]
    fn memory_sink_counts_writes() {
        let sink = MemorySink::new();
        sink.write_line(b"one\n").unwrap();
        sink.write_line(b"two\n").unwrap();
        assert_eq!(sink.writes(), 2);
        assert_eq!(sink.lines(), vec!["one".to_string(), "two".to_string()]);
        assert_eq!(sink.contents(), b"one\ntwo\n");
    }

    #[test]
    fn tracing_sink_never_fails() {
        assert!(TracingSink.write_line(b"GET / 200\n").is_ok());
        assert!(TracingSink.write_line(&[0xff, 0xfe]).is_ok());
    }

    #[test]
    fn file_sink_creates_parent_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let sink = RotatingFileSink::open(file_config(dir.path(), 0, 0)).unwrap();
        sink.write_line(b"first\n").unwrap();
        sink.write_line(b"second\n").unwrap();
        let text = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(text, "first\nsecond\n");
    }

    #[test]
    fn file_sink_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = file_config(dir.path(), 0, 0);
        {
            let sink = RotatingFileSink::open(cfg.clone()).unwrap();
            sink.write_line(b"before restart\n").unwrap();
        }
        let sink = RotatingFileSink::open(cfg).unwrap();
        sink.write_line(b"after restart\n").unwrap();
        let text = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(text, "before restart\nafter restart\n");
    }

    #[test]
    fn file_sink_rotates_by_size_and_prunes() {
        let dir = tempfile::tempdir().unwrap();
        let sink = RotatingFileSink::open(file_config(dir.path(), 8, 1)).unwrap();
        sink.write_line(b"0123456789\n").unwrap();
        sink.write_line(b"second file\n").unwrap();
        sink.write_line(b"third file\n").unwrap();

        let current = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(current, "third file\n");

        let rotated: Vec<_> = fs::read_dir(dir.path().join("logs"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("access.log."))
            .collect();
        assert_eq!(rotated.len(), 1);
        let kept = fs::read_to_string(rotated[0].path()).unwrap();
        assert_eq!(kept, "second file\n");
    }

    #[test]
    fn rapid_size_rotations_keep_every_line() {
        let dir = tempfile::tempdir().unwrap();
        let sink = RotatingFileSink::open(file_config(dir.path(), 1, 0)).unwrap();
        for i in 0..4 {
            sink.write_line(format!("line-{i}\n").as_bytes()).unwrap();
        }

        let mut lines: Vec<String> = fs::read_dir(dir.path().join("logs"))
            .unwrap()
            .filter_map(|e| e.ok())
            .flat_map(|e| {
                fs::read_to_string(e.path())
                    .unwrap()
                    .lines()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        lines.sort();
        assert_eq!(lines, vec!["line-0", "line-1", "line-2", "line-3"]);
    }

    #[test]
    fn unused_rotated_path_adds_counter() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("access.log");
        let first = unused_rotated_path(&base, "2026-10-19-083000");
        assert_eq!(first, dir.path().join("access.log.2026-10-19-083000"));
        fs::write(&first, "a").unwrap();
        let second = unused_rotated_path(&base, "2026-10-19-083000");
        assert_eq!(second, dir.path().join("access.log.2026-10-19-083000.1"));
        fs::write(&second, "b").unwrap();
        let third = unused_rotated_path(&base, "2026-10-19-083000");
        assert_eq!(third, dir.path().join("access.log.2026-10-19-083000.2"));
    }

    #[test]
    fn prune_keeps_newest_by_mtime_across_suffix_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("access.log");
        let at = |name: &str, secs: u64| {
            let path = dir.path().join(name);
            let file = File::create(&path).unwrap();
            file.set_modified(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(secs))
                .unwrap();
            path
        };
        // Midnight date rotation is newer than that day's size rotations.
        let size_early = at("access.log.2026-10-18-120000", 1_000);
        let size_late = at("access.log.2026-10-18-130000", 2_000);
        let by_date = at("access.log.2026-10-18", 3_000);
        fs::write(&base, "current").unwrap();

        prune_rotated_files(&base, 1).unwrap();

        assert!(by_date.exists());
        assert!(!size_early.exists());
        assert!(!size_late.exists());
        assert!(base.exists());
    }

    #[test]
    fn open_sink_builds_file_output() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AccessLogSettings {
            output: OutputKind::File,
            file: file_config(dir.path(), 0, 0),
            ..Default::default()
        };
        let sink = open_sink(&settings).unwrap();
        sink.write_line(b"via settings\n").unwrap();
        let text = fs::read_to_string(dir.path().join("logs").join("access.log")).unwrap();
        assert_eq!(text, "via settings\n");
    }

    #[test]
    fn rotated_path_appends_suffix() {
        let p = rotated_file_path(Path::new("/var/log/access.log"), "2026-10-18");
        assert_eq!(p, PathBuf::from("/var/log/access.log.2026-10-18"));
    }
}
