use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Kind of filesystem change an observer can report.
///
/// Platform events are folded into these four buckets; access and metadata
/// only notifications that carry no content change are mapped to `Modify`
/// or dropped (see `watch::event`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    #[serde(alias = "created")]
    Create,
    #[serde(alias = "modified")]
    Modify,
    #[serde(alias = "deleted", alias = "remove", alias = "removed")]
    Delete,
    #[serde(alias = "moved", alias = "rename", alias = "renamed")]
    Move,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 4] = [
        ChangeKind::Create,
        ChangeKind::Modify,
        ChangeKind::Delete,
        ChangeKind::Move,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Create => "create",
            ChangeKind::Modify => "modify",
            ChangeKind::Delete => "delete",
            ChangeKind::Move => "move",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" | "created" => Ok(ChangeKind::Create),
            "modify" | "modified" => Ok(ChangeKind::Modify),
            "delete" | "deleted" | "remove" | "removed" => Ok(ChangeKind::Delete),
            "move" | "moved" | "rename" | "renamed" => Ok(ChangeKind::Move),
            other => Err(format!(
                "invalid change kind: {other} (expected \"create\", \"modify\", \"delete\" or \"move\")"
            )),
        }
    }
}

/// Which notification mechanism an observer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchBackend {
    /// Platform notifications (inotify, FSEvents, ReadDirectoryChangesW).
    Native,
    /// Periodic directory scans.
    Poll,
}

impl Default for WatchBackend {
    fn default() -> Self {
        WatchBackend::Native
    }
}

impl fmt::Display for WatchBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchBackend::Native => f.write_str("native"),
            WatchBackend::Poll => f.write_str("poll"),
        }
    }
}

impl FromStr for WatchBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" => Ok(WatchBackend::Native),
            "poll" | "polling" => Ok(WatchBackend::Poll),
            other => Err(format!(
                "invalid watch backend: {other} (expected \"native\" or \"poll\")"
            )),
        }
    }
}
