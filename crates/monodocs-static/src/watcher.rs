//! File watching for rebuilds.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Events emitted by the stylesheet watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A stylesheet compiled on its own changed
    Stylesheet(PathBuf),

    /// A `_partial.scss` changed; importers are unknown
    Partial(PathBuf),

    /// Some other file, usually an asset referenced through `url()`
    Asset(PathBuf),

    /// File was deleted
    Deleted(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::Stylesheet(p) | Self::Partial(p) | Self::Asset(p) | Self::Deleted(p) => p,
        }
    }
}

/// Watches stylesheet directories.
pub struct StyleWatcher {
    _watcher: RecommendedWatcher,
}

impl StyleWatcher {
    /// Watch `paths` recursively.
    ///
    /// Returns the watcher and a channel to receive events. Dropping the
    /// watcher closes the channel.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            } else {
                tracing::warn!("Not watching missing path {}", path.display());
            }
        }

        std::thread::spawn(move || {
            let debounce = Duration::from_millis(100);

            while let Some(batch) = next_batch(&sync_rx, debounce) {
                for e in classify_batch(&batch) {
                    if async_tx.blocking_send(e).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Block for the next event, then gather everything that follows until `quiet`
/// passes without another one. Editors save in bursts, so the batch always
/// ends with the final write. Returns `None` once the sender is gone.
fn next_batch(rx: &mpsc::Receiver<notify::Event>, quiet: Duration) -> Option<Vec<notify::Event>> {
    let mut batch = vec![rx.recv().ok()?];

    loop {
        match rx.recv_timeout(quiet) {
            Ok(event) => batch.push(event),
            Err(_) => return Some(batch),
        }
    }
}

/// One WatchEvent per path, reflecting the last thing that happened to it.
fn classify_batch(batch: &[notify::Event]) -> Vec<WatchEvent> {
    let mut latest: Vec<WatchEvent> = Vec::new();

    for event in batch {
        for path in &event.paths {
            if let Some(e) = classify_event(path, &event.kind) {
                latest.retain(|prev| prev.path() != path.as_path());
                latest.push(e);
            }
        }
    }

    latest
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: &Path, kind: &notify::EventKind) -> Option<WatchEvent> {
    use notify::EventKind;

    let path = path.to_path_buf();
    match kind {
        EventKind::Remove(_) => Some(WatchEvent::Deleted(path)),
        EventKind::Create(_) | EventKind::Modify(_) => {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

            if ext != "scss" && ext != "css" {
                Some(WatchEvent::Asset(path))
            } else if filename.starts_with('_') {
                Some(WatchEvent::Partial(path))
            } else {
                Some(WatchEvent::Stylesheet(path))
            }
        }
        _ => None,
    }
}
