use crate::routine::{Routine, RoutineError};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

/// Reloads the routine file whenever it changes on disk.
pub struct RoutineWatcher {
    // Dropping the watcher stops the notifications.
    _watcher: RecommendedWatcher,
    rx: Receiver<Result<Routine, RoutineError>>,
}

impl RoutineWatcher {
    /// Watch `path`. The parent directory is watched so editors that save by
    /// replacing the file are still picked up.
    pub fn spawn(path: &Path) -> notify::Result<Self> {
        let path = std::path::absolute(path)?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        // Events report resolved paths, so compare against the resolved directory.
        let dir = std::fs::canonicalize(&dir).unwrap_or(dir);
        let path = match path.file_name() {
            Some(name) => dir.join(name),
            None => path,
        };
        let (tx, rx) = mpsc::channel();

        let target = path.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(error = %e, "routine watcher error");
                    return;
                }
            };
            if !(event.kind.is_modify() || event.kind.is_create()) {
                return;
            }
            if !event.paths.iter().any(|p| p == &target) {
                return;
            }
            tracing::debug!(path = %target.display(), "routine changed on disk");
            let _ = tx.send(Routine::load(&target));
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %path.display(), "watching routine");

        Ok(RoutineWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Most recent reload since the last call, if any.
    pub fn latest(&self) -> Option<Result<Routine, RoutineError>> {
        self.rx.try_iter().last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    const ONE_ITEM: &str = r#"{"morningRoutine": [{"time": "7:00 AM", "activity": "Wake up"}]}"#;
    const TWO_ITEMS: &str = r#"{"morningRoutine": [
        {"time": "7:00 AM", "activity": "Wake up"},
        {"time": "7:15 AM", "activity": "Breakfast"}
    ]}"#;

    /// Poll until a reload parses, or give up after `timeout`.
    fn wait_for_routine(watcher: &RoutineWatcher, timeout: Duration) -> Option<Routine> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            // A write can be observed half-done; keep waiting for a clean parse.
            if let Some(Ok(routine)) = watcher.latest() {
                return Some(routine);
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        None
    }

    #[test]
    fn test_reloads_on_write_and_ignores_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routine.json");
        std::fs::write(&path, ONE_ITEM).unwrap();

        let watcher = RoutineWatcher::spawn(&path).unwrap();
        std::thread::sleep(Duration::from_millis(200));

        std::fs::write(dir.path().join("notes.txt"), "unrelated").unwrap();
        std::thread::sleep(Duration::from_millis(500));
        assert!(watcher.latest().is_none());

        std::fs::write(&path, TWO_ITEMS).unwrap();
        let reloaded = wait_for_routine(&watcher, Duration::from_secs(5)).expect("routine reload");
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.items[1].activity, "Breakfast");
    }
}
