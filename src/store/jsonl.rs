// Garden - Field sensor time-series core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! JSON-lines file store
//!
//! # File Format
//!
//! One serialized [`Reading`] per line, in append order:
//!
//! ```text
//! {"temperature":21.5,"humidity":60.0,"light":null,"soil_moisture":33.1,"rainfall":0.0,"created_at":"2024-01-01T10:00:00Z"}
//! {"temperature":21.7,"humidity":59.0,"light":null,"soil_moisture":33.0,"rainfall":0.0,"created_at":"2024-01-01T10:01:00Z"}
//! ```
//!
//! The whole file is loaded at open; queries are answered from memory.
//! Each line is written in a single call and becomes visible to readers
//! only after the write succeeded. A failed write is truncated away, so
//! the file never keeps part of a rejected reading.
//!
//! A final line without its newline is a torn write from an earlier run:
//! it is kept when it parses and cut off otherwise. A bad line anywhere
//! else is reported as [`StoreError::Corrupt`].

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use tracing::{error, info, warn};

use super::{poisoned, ReadingLog, ReadingStore};
use crate::error::{StoreError, StoreResult};
use crate::reading::{Reading, Timestamp};

/// Append-only store persisted as JSON lines
#[derive(Debug)]
pub struct JsonlStore {
    path: PathBuf,
    file: Mutex<File>,
    log: RwLock<ReadingLog>,
}

impl JsonlStore {
    /// Open (or create) a store file and load its readings
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut log = ReadingLog::default();

        if path.exists() {
            load(&path, &mut log)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!(path = %path.display(), readings = log.len(), "opened reading store");

        Ok(Self {
            path,
            file: Mutex::new(file),
            log: RwLock::new(log),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReadingStore for JsonlStore {
    fn append(&self, reading: Reading) -> StoreResult<()> {
        let mut line = serde_json::to_vec(&reading)?;
        line.push(b'\n');
        {
            let mut file = self.file.lock().map_err(poisoned)?;
            append_line(&mut *file, &line)?;
        }
        self.log.write().map_err(poisoned)?.insert(reading);
        Ok(())
    }

    fn range(&self, start: Timestamp, end: Timestamp) -> StoreResult<Vec<Reading>> {
        Ok(self.log.read().map_err(poisoned)?.range(start, end))
    }

    fn latest(&self) -> StoreResult<Option<Reading>> {
        Ok(self.log.read().map_err(poisoned)?.latest())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.log.read().map_err(poisoned)?.len())
    }
}

/// Byte sink that can be cut back to an earlier length
trait LineSink: Write {
    fn byte_len(&self) -> io::Result<u64>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl LineSink for File {
    fn byte_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Write one complete line or nothing
fn append_line<S: LineSink>(sink: &mut S, line: &[u8]) -> io::Result<()> {
    let prev_len = sink.byte_len()?;
    let result = sink.write_all(line).and_then(|()| sink.flush());
    if let Err(e) = result {
        if let Err(rollback) = sink.truncate(prev_len) {
            error!(error = %rollback, len = prev_len, "failed to roll back partial line");
        }
        return Err(e);
    }
    Ok(())
}

fn load(path: &Path, log: &mut ReadingLog) -> StoreResult<()> {
    let bytes = std::fs::read(path)?;
    let mut offset = 0;
    let mut line_no = 0;

    while offset < bytes.len() {
        line_no += 1;
        let rest = &bytes[offset..];
        let Some(end) = rest.iter().position(|&b| b == b'\n') else {
            return load_tail(path, rest, offset, line_no, log);
        };
        let line = &rest[..end];
        offset += end + 1;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let reading: Reading =
            serde_json::from_slice(line).map_err(|e| StoreError::Corrupt {
                line: line_no,
                reason: e.to_string(),
            })?;
        log.insert(reading);
    }
    Ok(())
}

/// Final line with no newline
fn load_tail(
    path: &Path,
    tail: &[u8],
    offset: usize,
    line_no: usize,
    log: &mut ReadingLog,
) -> StoreResult<()> {
    if tail.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    let mut file = OpenOptions::new().append(true).open(path)?;
    match serde_json::from_slice::<Reading>(tail) {
        Ok(reading) => {
            file.write_all(b"\n")?;
            log.insert(reading);
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                line = line_no,
                error = %e,
                "dropping torn final line"
            );
            file.set_len(offset as u64)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use crate::reading::ReadingPayload;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn reading(m: u32, humidity: f64) -> Reading {
        Reading::from_payload(
            ReadingPayload::default().with_value(Channel::Humidity, humidity),
            Utc.with_ymd_and_hms(2024, 6, 1, 7, m, 0).unwrap(),
        )
    }

    #[test]
    fn test_open_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("readings.jsonl");

        let store = JsonlStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_readings_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("readings.jsonl");

        {
            let store = JsonlStore::open(&path).unwrap();
            store.append(reading(1, 50.0)).unwrap();
            store.append(reading(2, 55.0)).unwrap();
        }

        let store = JsonlStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.latest().unwrap().unwrap().humidity, Some(55.0));

        store.append(reading(3, 60.0)).unwrap();
        drop(store);
        let store = JsonlStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn test_absent_fields_persist_as_null() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("readings.jsonl");

        let store = JsonlStore::open(&path).unwrap();
        store.append(reading(1, 50.0)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"temperature\":null"));
        assert!(contents.contains("\"humidity\":50.0"));
    }

    #[test]
    fn test_corrupt_line_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("readings.jsonl");
        std::fs::write(
            &path,
            "{\"temperature\":null,\"humidity\":1.0,\"light\":null,\"soil_moisture\":null,\"rainfall\":null,\"created_at\":\"2024-06-01T07:00:00Z\"}\nnot json\n",
        )
        .unwrap();

        let result = JsonlStore::open(&path);
        assert!(matches!(result, Err(StoreError::Corrupt { line: 2, .. })));
    }

    const LINE_ONE: &str = "{\"temperature\":null,\"humidity\":1.0,\"light\":null,\"soil_moisture\":null,\"rainfall\":null,\"created_at\":\"2024-06-01T07:00:00Z\"}";

    #[test]
    fn test_torn_final_line_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("readings.jsonl");
        std::fs::write(
            &path,
            format!("{LINE_ONE}\n{{\"temperature\":null,\"humidity\":16.0,\"cre"),
        )
        .unwrap();

        let store = JsonlStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            format!("{LINE_ONE}\n")
        );

        store.append(reading(5, 70.0)).unwrap();
        drop(store);
        let store = JsonlStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.latest().unwrap().unwrap().humidity, Some(70.0));
    }

    #[test]
    fn test_complete_final_line_without_newline_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("readings.jsonl");
        std::fs::write(&path, LINE_ONE).unwrap();

        let store = JsonlStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 1);

        store.append(reading(5, 70.0)).unwrap();
        drop(store);
        let store = JsonlStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_corrupt_line_before_end_still_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("readings.jsonl");
        std::fs::write(&path, format!("{{\"cre\n{LINE_ONE}")).unwrap();

        let result = JsonlStore::open(&path);
        assert!(matches!(result, Err(StoreError::Corrupt { line: 1, .. })));
    }

    /// Accepts `limit` bytes in total, then fails every write
    struct ShortSink {
        buf: Vec<u8>,
        limit: usize,
    }

    impl Write for ShortSink {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            if self.buf.len() >= self.limit {
                return Err(io::Error::new(io::ErrorKind::Other, "file too large"));
            }
            let n = data.len().min(self.limit - self.buf.len());
            self.buf.extend_from_slice(&data[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LineSink for ShortSink {
        fn byte_len(&self) -> io::Result<u64> {
            Ok(self.buf.len() as u64)
        }

        fn truncate(&mut self, len: u64) -> io::Result<()> {
            self.buf.truncate(len as usize);
            Ok(())
        }
    }

    #[test]
    fn test_short_write_rolled_back() {
        let mut sink = ShortSink {
            buf: b"first\n".to_vec(),
            limit: 10,
        };

        assert!(append_line(&mut sink, b"second line\n").is_err());
        assert_eq!(sink.buf, b"first\n");

        sink.limit = 64;
        append_line(&mut sink, b"second line\n").unwrap();
        assert_eq!(sink.buf, b"first\nsecond line\n");
    }

    #[test]
    fn test_failed_append_not_visible() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("readings.jsonl");
        std::fs::write(&path, format!("{LINE_ONE}\n")).unwrap();

        let mut log = ReadingLog::default();
        load(&path, &mut log).unwrap();
        let store = JsonlStore {
            path: path.clone(),
            file: Mutex::new(File::open(&path).unwrap()),
            log: RwLock::new(log),
        };

        assert!(matches!(
            store.append(reading(5, 70.0)),
            Err(StoreError::Io(_))
        ));
        assert_eq!(store.len().unwrap(), 1);
        drop(store);

        let store = JsonlStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.latest().unwrap().unwrap().humidity, Some(1.0));
    }
}
