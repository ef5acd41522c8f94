use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use super::{KeyValueStore, SyncStatus};

#[derive(Debug, Default)]
struct SyncState {
    pending: usize,
    last_error: Option<String>,
}

/// JSON-object file on disk.
///
/// Every `set` queues a full snapshot to a single writer task, so snapshots
/// reach the disk in the order they were taken.
pub struct FileStore {
    path: PathBuf,
    values: Mutex<HashMap<String, Value>>,
    writer: mpsc::UnboundedSender<String>,
    sync: Arc<Mutex<SyncState>>,
}

impl FileStore {
    /// Opens (or creates on first write) the store at `path`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = read_snapshot(&path)?;
        debug!(path = %path.display(), keys = values.len(), "opened store");

        let sync = Arc::new(Mutex::new(SyncState::default()));
        let (writer, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(path.clone(), rx, Arc::clone(&sync)));

        Ok(Self {
            path,
            values: Mutex::new(values),
            writer,
            sync,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Waits until queued writes have landed, up to `timeout`.
    pub async fn flush(&self, timeout: Duration) -> SyncStatus {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let status = self.sync_status();
            if status != SyncStatus::Pending || tokio::time::Instant::now() >= deadline {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        let snapshot = {
            let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
            values.insert(key.to_string(), value);
            serde_json::to_string_pretty(&*values)
        };

        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(e) => {
                mark_failed(&self.sync, e.to_string());
                return;
            }
        };

        lock(&self.sync).pending += 1;
        if self.writer.send(snapshot).is_err() {
            let mut sync = lock(&self.sync);
            sync.pending -= 1;
            sync.last_error = Some("store writer stopped".to_string());
        }
    }

    fn sync_status(&self) -> SyncStatus {
        let sync = lock(&self.sync);
        if let Some(e) = &sync.last_error {
            SyncStatus::Error(e.clone())
        } else if sync.pending > 0 {
            SyncStatus::Pending
        } else {
            SyncStatus::Synced
        }
    }
}

fn read_snapshot(path: &Path) -> io::Result<HashMap<String, Value>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e),
    };
    match serde_json::from_str(&raw) {
        Ok(values) => Ok(values),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "store file is unreadable, starting empty");
            Ok(HashMap::new())
        }
    }
}

async fn run_writer(
    path: PathBuf,
    mut rx: mpsc::UnboundedReceiver<String>,
    sync: Arc<Mutex<SyncState>>,
) {
    while let Some(snapshot) = rx.recv().await {
        let result = write_atomically(&path, &snapshot).await;
        let mut state = lock(&sync);
        state.pending = state.pending.saturating_sub(1);
        match result {
            Ok(()) => state.last_error = None,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to write store");
                state.last_error = Some(e.to_string());
            }
        }
    }
}

async fn write_atomically(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await
}

fn mark_failed(sync: &Mutex<SyncState>, message: String) {
    lock(sync).last_error = Some(message);
}

fn lock(sync: &Mutex<SyncState>) -> std::sync::MutexGuard<'_, SyncState> {
    sync.lock().unwrap_or_else(|e| e.into_inner())
}
