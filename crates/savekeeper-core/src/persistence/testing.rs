//! Instrumented storage backend for tests.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::store::{MemoryBackend, StorageBackend};

/// In-memory backend whose first `stale_reads` reads return an empty file,
/// as if the preceding write had not become visible yet.
pub struct StaleReadbackBackend {
    inner: MemoryBackend,
    stale_reads: usize,
    reads: AtomicUsize,
    writes: AtomicUsize,
    syncs: AtomicUsize,
}

impl StaleReadbackBackend {
    pub fn new(stale_reads: usize) -> Self {
        Self {
            inner: MemoryBackend::new(),
            stale_reads,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            syncs: AtomicUsize::new(0),
        }
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn sync_count(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }
}

impl StorageBackend for StaleReadbackBackend {
    fn list_file_names(&self, dir: &Path) -> io::Result<Vec<String>> {
        self.inner.list_file_names(dir)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        let previous = self.reads.fetch_add(1, Ordering::SeqCst);
        if previous < self.stale_reads {
            return Ok(String::new());
        }
        self.inner.read(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(path, contents)
    }

    fn sync(&self, path: &Path) -> io::Result<()> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        self.inner.sync(path)
    }
}
