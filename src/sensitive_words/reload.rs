// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Hot reload of the published PatternSet
//
// Single writer, many readers. Readers load the current snapshot from an
// ArcSwap and never block; every mutation (reload, add/remove, timer tick)
// goes through one writer mutex, so at most one rebuild is in flight.
// A PatternSet is always built fully before it is swapped in.

use arc_swap::ArcSwap;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

use super::config::{FilterConfig, DEFAULT_CACHE_TTL_SECS, DEFAULT_RELOAD_INTERVAL_MS};
use super::error::{FilterError, Result};
use super::loader::{self, SourceDescriptor, SourceKind};
use super::patterns::{fold, PatternSet};

/// Lifecycle status of a manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum ReloadStatus {
    Ready,
    Rebuilding,
    /// Last rebuild was rejected; the previous snapshot is still published
    Failed(String),
    Stopped,
}

/// Options fixed at start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadOptions {
    pub case_sensitive: bool,
    pub auto_reload: bool,
    pub interval: Duration,
    /// Maximum age of a snapshot before a timer tick forces a rebuild
    pub cache_ttl: Duration,
}

impl Default for ReloadOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            auto_reload: false,
            interval: Duration::from_millis(DEFAULT_RELOAD_INTERVAL_MS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl From<&FilterConfig> for ReloadOptions {
    fn from(config: &FilterConfig) -> Self {
        Self {
            case_sensitive: config.case_sensitive,
            auto_reload: config.auto_reload,
            interval: config.reload_interval,
            cache_ttl: config.cache_ttl,
        }
    }
}

/// Result of a successful reload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReloadOutcome {
    pub loaded_count: usize,
}

/// Result of `add_words`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    pub added: usize,
    pub total: usize,
}

/// Result of `remove_words`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemoveOutcome {
    pub removed: usize,
    pub total: usize,
}

/// Read-only view of manager state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagerStats {
    pub total: usize,
    pub last_updated: Option<SystemTime>,
    pub source_kind: SourceKind,
    pub status: ReloadStatus,
    pub case_sensitive: bool,
    pub auto_reload: bool,
}

/// State owned by the single writer
struct Writer {
    words: Vec<String>,
    descriptor: SourceDescriptor,
    built_at: Instant,
    stopped: bool,
}

impl Writer {
    /// Point a list source at the committed words so reload keeps them
    fn sync_list(&mut self) {
        if let SourceDescriptor::List(list) = &mut self.descriptor {
            list.clone_from(&self.words);
        }
    }
}

/// State visible to `stats` without waiting for the writer
#[derive(Debug, Clone)]
struct Published {
    status: ReloadStatus,
    total: usize,
    last_updated: Option<SystemTime>,
}

struct Shared {
    current: ArcSwap<PatternSet>,
    writer: Mutex<Writer>,
    published: RwLock<Published>,
    options: ReloadOptions,
    source_kind: SourceKind,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn set_status(&self, status: ReloadStatus) {
        self.published
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .status = status;
    }

    fn fail(&self, err: &FilterError) {
        warn!("sensitive word reload failed, keeping previous word list: {}", err);
        self.set_status(ReloadStatus::Failed(err.to_string()));
    }

    /// Build a new set from `words` and swap it in. Caller holds the writer.
    fn rebuild(&self, writer: &mut Writer, words: Vec<String>) -> Result<usize> {
        self.set_status(ReloadStatus::Rebuilding);
        let words = loader::dedup_folded(words, self.options.case_sensitive);

        let set = match PatternSet::build(&words, self.options.case_sensitive) {
            Ok(set) => set,
            Err(err) => {
                self.fail(&err);
                return Err(err);
            }
        };

        let total = set.len();
        self.current.store(Arc::new(set));
        writer.words = words;
        writer.built_at = Instant::now();

        {
            let mut published = self
                .published
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            published.status = ReloadStatus::Ready;
            published.total = total;
            published.last_updated = Some(SystemTime::now());
        }

        info!(
            "sensitive word list swapped in: {} words from {} source",
            total,
            self.source_kind.as_str()
        );
        Ok(total)
    }

    /// Reload from the source. Caller holds the writer.
    fn reload_locked(&self, writer: &mut Writer) -> Result<ReloadOutcome> {
        if writer.stopped {
            return Err(FilterError::Stopped);
        }

        // Capture the timestamp before reading so a write racing the read
        // triggers another reload on the next tick
        let modified = writer.descriptor.path().map(loader::modified_time);

        let words = match loader::load_words(&writer.descriptor) {
            Ok(words) => words,
            Err(err) => {
                self.fail(&err);
                return Err(err);
            }
        };

        let loaded_count = self.rebuild(writer, words)?;

        if let SourceDescriptor::File { last_modified, .. } = &mut writer.descriptor {
            *last_modified = modified.and_then(|m| m.ok());
        }
        Ok(ReloadOutcome { loaded_count })
    }

    fn reload(&self) -> Result<ReloadOutcome> {
        let mut writer = lock(&self.writer);
        self.reload_locked(&mut writer)
    }

    /// Timer tick: rebuild when the file changed or the snapshot expired
    fn check_reload(&self) -> Result<Option<ReloadOutcome>> {
        let mut writer = lock(&self.writer);
        if writer.stopped {
            return Err(FilterError::Stopped);
        }

        let SourceDescriptor::File {
            path,
            last_modified,
        } = &writer.descriptor
        else {
            return Ok(None);
        };

        let current = match loader::modified_time(path) {
            Ok(modified) => modified,
            Err(err) => {
                self.fail(&err);
                return Err(err);
            }
        };

        let changed = *last_modified != Some(current);
        let expired = writer.built_at.elapsed() >= self.options.cache_ttl;
        if !changed && !expired {
            debug!("sensitive word file unchanged: {}", path.display());
            return Ok(None);
        }

        if expired && !changed {
            debug!("sensitive word snapshot older than cache ttl, rebuilding");
        }
        self.reload_locked(&mut writer).map(Some)
    }

    fn add_words(&self, words: &[String]) -> Result<AddOutcome> {
        let mut writer = lock(&self.writer);
        if writer.stopped {
            return Err(FilterError::Stopped);
        }

        let case_sensitive = self.options.case_sensitive;
        let mut known: HashSet<String> = writer
            .words
            .iter()
            .map(|word| fold(word, case_sensitive).into_owned())
            .collect();
        let mut updated = writer.words.clone();
        let mut added = 0;
        for word in loader::normalize_words(words) {
            if known.insert(fold(&word, case_sensitive).into_owned()) {
                updated.push(word);
                added += 1;
            }
        }

        let total = if added == 0 {
            writer.words.len()
        } else {
            let total = self.rebuild(&mut writer, updated)?;
            writer.sync_list();
            total
        };
        Ok(AddOutcome { added, total })
    }

    fn remove_words(&self, words: &[String]) -> Result<RemoveOutcome> {
        let mut writer = lock(&self.writer);
        if writer.stopped {
            return Err(FilterError::Stopped);
        }

        let case_sensitive = self.options.case_sensitive;
        let doomed: HashSet<String> = loader::normalize_words(words)
            .iter()
            .map(|word| fold(word, case_sensitive).into_owned())
            .collect();
        let updated: Vec<String> = writer
            .words
            .iter()
            .filter(|word| !doomed.contains(fold(word, case_sensitive).as_ref()))
            .cloned()
            .collect();
        let removed = writer.words.len() - updated.len();

        let total = if removed == 0 {
            updated.len()
        } else {
            let total = self.rebuild(&mut writer, updated)?;
            writer.sync_list();
            total
        };
        Ok(RemoveOutcome { removed, total })
    }
}

/// Background thread driving `check_reload`
struct ReloadTimer {
    stop: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl ReloadTimer {
    fn spawn(shared: Arc<Shared>, interval: Duration) -> std::io::Result<Self> {
        let (stop, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("sensitive-words-reload".to_string())
            .spawn(move || loop {
                // Each tick runs to completion before the next wait, so ticks
                // never overlap
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if let Err(FilterError::Stopped) = shared.check_reload() {
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        Ok(Self { stop, handle })
    }

    fn cancel(self) {
        // The thread may already have exited; a failed send is fine
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            warn!("sensitive word reload timer panicked");
        }
    }
}

/// Owns the published PatternSet and every way of changing it
pub struct ReloadManager {
    shared: Arc<Shared>,
    timer: Mutex<Option<ReloadTimer>>,
}

impl ReloadManager {
    /// Load the initial word list and publish it
    ///
    /// Fails with `InitialLoadFailed` when there is nothing to fall back to.
    /// With `auto_reload` and a file source, a timer checks the file every
    /// `interval`.
    pub fn start(descriptor: SourceDescriptor, options: ReloadOptions) -> Result<Self> {
        let source_kind = descriptor.kind();
        let modified = descriptor.path().map(loader::modified_time);

        let initial = loader::load_words(&descriptor).and_then(|words| {
            let words = loader::dedup_folded(words, options.case_sensitive);
            Ok((PatternSet::build(&words, options.case_sensitive)?, words))
        });
        let (set, words) = match initial {
            Ok(built) => built,
            Err(err) => {
                error!("sensitive word filter failed to start: {}", err);
                return Err(FilterError::InitialLoadFailed(Box::new(err)));
            }
        };

        let mut descriptor = descriptor;
        if let SourceDescriptor::File { last_modified, .. } = &mut descriptor {
            *last_modified = modified.and_then(|m| m.ok());
        }

        let total = set.len();
        let shared = Arc::new(Shared {
            current: ArcSwap::from_pointee(set),
            writer: Mutex::new(Writer {
                words,
                descriptor,
                built_at: Instant::now(),
                stopped: false,
            }),
            published: RwLock::new(Published {
                status: ReloadStatus::Ready,
                total,
                last_updated: Some(SystemTime::now()),
            }),
            options,
            source_kind,
        });

        let timer = if options.auto_reload && source_kind == SourceKind::File {
            match ReloadTimer::spawn(Arc::clone(&shared), options.interval) {
                Ok(timer) => Some(timer),
                Err(err) => {
                    warn!("could not start sensitive word reload timer: {}", err);
                    None
                }
            }
        } else {
            None
        };

        info!(
            "sensitive word filter started: {} words from {} source",
            total,
            source_kind.as_str()
        );

        Ok(Self {
            shared,
            timer: Mutex::new(timer),
        })
    }

    /// Current snapshot; stays valid for as long as the caller holds it
    pub fn snapshot(&self) -> Arc<PatternSet> {
        self.shared.current.load_full()
    }

    /// Force a reload from the source right now
    pub fn reload(&self) -> Result<ReloadOutcome> {
        self.shared.reload()
    }

    /// One timer tick; `Ok(None)` when nothing needed rebuilding
    pub fn check_reload(&self) -> Result<Option<ReloadOutcome>> {
        self.shared.check_reload()
    }

    pub fn add_words<S: AsRef<str>>(&self, words: &[S]) -> Result<AddOutcome> {
        let words: Vec<String> = words.iter().map(|w| w.as_ref().to_string()).collect();
        self.shared.add_words(&words)
    }

    pub fn remove_words<S: AsRef<str>>(&self, words: &[S]) -> Result<RemoveOutcome> {
        let words: Vec<String> = words.iter().map(|w| w.as_ref().to_string()).collect();
        self.shared.remove_words(&words)
    }

    pub fn stats(&self) -> ManagerStats {
        let published = self
            .shared
            .published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        ManagerStats {
            total: published.total,
            last_updated: published.last_updated,
            source_kind: self.shared.source_kind,
            status: published.status,
            case_sensitive: self.shared.options.case_sensitive,
            auto_reload: self.shared.options.auto_reload,
        }
    }

    pub fn is_auto_reloading(&self) -> bool {
        lock(&self.timer).is_some()
    }

    /// Cancel the timer and refuse further mutations. Idempotent.
    pub fn stop(&self) {
        {
            let mut writer = lock(&self.shared.writer);
            if writer.stopped {
                return;
            }
            writer.stopped = true;
        }
        if let Some(timer) = lock(&self.timer).take() {
            timer.cancel();
        }
        self.shared.set_status(ReloadStatus::Stopped);
        info!("sensitive word filter stopped");
    }
}

impl Drop for ReloadManager {
    fn drop(&mut self) {
        self.stop();
    }
}
