//! FileQueue - length-prefixed records on disk with an in-memory mirror
//!
//! File layout: a sequence of frames, each a little-endian `u32` length
//! followed by the record bytes. Appends go straight to the end of the
//! file; eviction and draining rewrite it through a temp file + rename.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use contracts::{DurableQueue, QueueError};
use ringbuf::{traits::*, HeapRb};
use tracing::{debug, warn};

/// Upper bound on a single record
const MAX_RECORD_LEN: usize = 16 * 1024 * 1024;

const LEN_PREFIX: usize = 4;

struct Inner {
    mirror: HeapRb<Bytes>,
    file: File,
}

/// File-backed bounded queue
pub struct FileQueue {
    path: PathBuf,
    capacity: usize,
    inner: Mutex<Inner>,
}

impl fmt::Debug for FileQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileQueue")
            .field("path", &self.path)
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl FileQueue {
    /// Open or create the queue at `path`, reloading surviving records
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::InvalidCapacity);
        }
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        let (records, clean) = parse_frames(&data)?;

        let mut mirror = HeapRb::new(capacity);
        let overflow = records.len().saturating_sub(capacity);
        for record in records {
            mirror.push_overwrite(record);
        }

        if !clean || overflow > 0 {
            if overflow > 0 {
                warn!(path = %path.display(), overflow, "queue file over capacity, oldest dropped");
            }
            rewrite(&path, mirror.iter())?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), len = mirror.occupied_len(), capacity, "queue opened");

        Ok(Self {
            path,
            capacity,
            inner: Mutex::new(Inner { mirror, file }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rewrite the file to hold exactly `records`, then mirror them
    ///
    /// The mirror is only touched once the rename has landed, so a failed
    /// rewrite leaves memory and disk agreeing on the old contents.
    fn commit(&self, inner: &mut Inner, mut records: Vec<Bytes>) -> Result<(), QueueError> {
        let overflow = records.len().saturating_sub(self.capacity);
        if overflow > 0 {
            records.drain(..overflow);
        }
        rewrite(&self.path, records.iter())?;
        inner.file = OpenOptions::new().append(true).open(&self.path)?;
        inner.mirror.clear();
        inner.mirror.push_iter(records.into_iter());
        Ok(())
    }
}

impl DurableQueue for FileQueue {
    fn enqueue(&self, record: Bytes) -> Result<(), QueueError> {
        if record.len() > MAX_RECORD_LEN {
            return Err(QueueError::RecordTooLarge { len: record.len() });
        }

        let mut inner = self.lock();
        if inner.mirror.is_full() {
            let kept: Vec<Bytes> = inner
                .mirror
                .iter()
                .skip(1)
                .cloned()
                .chain(std::iter::once(record))
                .collect();
            self.commit(&mut inner, kept)?;
            warn!(path = %self.path.display(), capacity = self.capacity, "queue full, oldest record evicted");
            return Ok(());
        }

        let mut frame = Vec::with_capacity(LEN_PREFIX + record.len());
        frame.extend_from_slice(&(record.len() as u32).to_le_bytes());
        frame.extend_from_slice(&record);
        inner.file.write_all(&frame)?;
        inner.file.flush()?;
        inner.mirror.push_overwrite(record);
        Ok(())
    }

    fn drain_all(&self) -> Result<Vec<Bytes>, QueueError> {
        let mut inner = self.lock();
        if inner.mirror.is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<Bytes> = inner.mirror.iter().cloned().collect();
        self.commit(&mut inner, Vec::new())?;
        debug!(path = %self.path.display(), drained = records.len(), "queue drained");
        Ok(records)
    }

    fn peek_all(&self) -> Result<Vec<Bytes>, QueueError> {
        Ok(self.lock().mirror.iter().cloned().collect())
    }

    fn replace_front(&self, count: usize, records: Vec<Bytes>) -> Result<(), QueueError> {
        if let Some(record) = records.iter().find(|r| r.len() > MAX_RECORD_LEN) {
            return Err(QueueError::RecordTooLarge { len: record.len() });
        }
        let mut inner = self.lock();
        let kept: Vec<Bytes> = inner
            .mirror
            .iter()
            .skip(count)
            .cloned()
            .chain(records)
            .collect();
        self.commit(&mut inner, kept)
    }

    fn len(&self) -> usize {
        self.lock().mirror.occupied_len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Split file contents into records
///
/// Returns `false` when a truncated tail was dropped.
fn parse_frames(data: &[u8]) -> Result<(Vec<Bytes>, bool), QueueError> {
    let mut records = Vec::new();
    let mut offset = 0usize;

    while offset < data.len() {
        let rest = &data[offset..];
        if rest.len() < LEN_PREFIX {
            warn!(offset, bytes = rest.len(), "truncated length prefix dropped");
            return Ok((records, false));
        }
        let mut prefix = [0u8; LEN_PREFIX];
        prefix.copy_from_slice(&rest[..LEN_PREFIX]);
        let len = u32::from_le_bytes(prefix) as usize;
        if len > MAX_RECORD_LEN {
            return Err(QueueError::Corrupt {
                offset: offset as u64,
                message: format!("frame length {len} exceeds limit"),
            });
        }
        let body = &rest[LEN_PREFIX..];
        if body.len() < len {
            warn!(offset, expected = len, found = body.len(), "truncated record dropped");
            return Ok((records, false));
        }
        records.push(Bytes::copy_from_slice(&body[..len]));
        offset += LEN_PREFIX + len;
    }

    Ok((records, true))
}

fn rewrite<'a>(path: &Path, records: impl Iterator<Item = &'a Bytes>) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp)?;
        for record in records {
            file.write_all(&(record.len() as u32).to_le_bytes())?;
            file.write_all(record)?;
        }
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}
