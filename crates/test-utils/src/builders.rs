use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use foundation::config::{ObserverConfiguration, ObserverConfigurationBuilder};
use foundation::types::{ChangeKind, WatchBackend};
use foundation::watch::ChangeNotification;

/// A notification for `root/relative`, as the processor would emit it.
pub fn notification(root: impl AsRef<Path>, relative: &str, kind: ChangeKind) -> ChangeNotification {
    let now = SystemTime::now();
    ChangeNotification {
        path: root.as_ref().join(relative),
        relative_path: relative.to_string(),
        kind,
        first_seen: now,
        last_seen: now,
        event_count: 1,
    }
}

/// Observer settings that behave the same on every platform in tests:
/// polling every 50ms with a 100ms debounce window.
pub fn fast_poll_config(root: impl Into<PathBuf>) -> ObserverConfigurationBuilder {
    ObserverConfiguration::builder([root.into()])
        .backend(WatchBackend::Poll)
        .poll_interval(Duration::from_millis(50))
        .debounce(Duration::from_millis(100))
}
