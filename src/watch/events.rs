//! Change events and batching.

use crate::config::WatchConfig;
use crate::tree::path::any_segment_matches;
use notify::{Event, EventKind};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Filesystem change event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
}

impl ChangeEvent {
    /// Convert a raw watcher event. Access and other metadata-free kinds
    /// yield `None`.
    pub fn from_notify(event: &Event) -> Option<Self> {
        let first = event.paths.first().cloned();
        match event.kind {
            EventKind::Create(_) => first.map(ChangeEvent::Created),
            EventKind::Modify(notify::event::ModifyKind::Name(_)) if event.paths.len() >= 2 => {
                Some(ChangeEvent::Renamed {
                    from: event.paths[0].clone(),
                    to: event.paths[1].clone(),
                })
            }
            EventKind::Modify(_) => first.map(ChangeEvent::Modified),
            EventKind::Remove(_) => first.map(ChangeEvent::Removed),
            _ => None,
        }
    }

    pub fn paths(&self) -> Vec<&Path> {
        match self {
            ChangeEvent::Created(p) | ChangeEvent::Modified(p) | ChangeEvent::Removed(p) => {
                vec![p.as_path()]
            }
            ChangeEvent::Renamed { from, to } => vec![from.as_path(), to.as_path()],
        }
    }

    fn key(&self) -> &Path {
        match self {
            ChangeEvent::Created(p) | ChangeEvent::Modified(p) | ChangeEvent::Removed(p) => p,
            ChangeEvent::Renamed { to, .. } => to,
        }
    }
}

/// Groups events into batches; one batch becomes one rebuild.
///
/// A batch is ready once no event arrived for the debounce period, or once
/// it has been collecting for the whole batch window.
pub struct EventBatcher {
    root: PathBuf,
    ignore: Regex,
    config: WatchConfig,
    pending: HashMap<PathBuf, ChangeEvent>,
    first_at: Option<Instant>,
    last_at: Option<Instant>,
}

impl EventBatcher {
    pub fn new(root: impl Into<PathBuf>, ignore: Regex, config: WatchConfig) -> Self {
        Self {
            root: root.into(),
            ignore,
            config,
            pending: HashMap::new(),
            first_at: None,
            last_at: None,
        }
    }

    /// Queue an event; returns false when every path it touches is ignored.
    pub fn add_event(&mut self, event: ChangeEvent) -> bool {
        self.add_event_at(event, Instant::now())
    }

    pub(crate) fn add_event_at(&mut self, event: ChangeEvent, now: Instant) -> bool {
        if event.paths().iter().all(|p| self.is_ignored(p)) {
            return false;
        }
        self.pending.insert(event.key().to_path_buf(), event);
        self.first_at.get_or_insert(now);
        self.last_at = Some(now);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready_at(Instant::now())
    }

    pub(crate) fn is_ready_at(&self, now: Instant) -> bool {
        match (self.first_at, self.last_at) {
            (Some(first), Some(last)) => {
                now.duration_since(last) >= self.config.debounce()
                    || now.duration_since(first) >= self.config.batch_window()
            }
            _ => false,
        }
    }

    pub fn take_batch(&mut self) -> Vec<ChangeEvent> {
        self.first_at = None;
        self.last_at = None;
        self.pending.drain().map(|(_, e)| e).collect()
    }

    /// Paths outside the root and paths with an ignored segment are ignored.
    fn is_ignored(&self, path: &Path) -> bool {
        match path.strip_prefix(&self.root) {
            Ok(rel) => any_segment_matches(rel, &self.ignore),
            Err(_) => true,
        }
    }
}
