// src/config/model.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::Result;
use crate::types::{ChangeKind, WatchBackend};

/// Debounce window used when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Scan interval for the polling backend.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Upper bound on a single responder invocation.
pub const DEFAULT_RESPONDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [observer]
/// paths = ["src", "docs"]
/// kinds = ["create", "modify"]
/// include = ["**/*.rs", "**/*.md"]
/// exclude = ["target/**"]
/// debounce = "250ms"
///
/// [[responder]]
/// kind = "log"
///
/// [[responder]]
/// kind = "command"
/// cmd = "cargo check"
/// ```
///
/// All sections are optional; CLI flags can fill in what the file leaves out.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Watch settings from `[observer]`.
    #[serde(default)]
    pub observer: ObserverSection,

    /// Reactions from `[[responder]]`, in declaration order.
    #[serde(default)]
    pub responder: Vec<ResponderSection>,
}

/// `[observer]` section.
///
/// Durations are strings such as `"500ms"`, `"2s"` or `"1m"`; they are parsed
/// during validation.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObserverSection {
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// If `None`, every change kind is observed.
    #[serde(default)]
    pub kinds: Option<Vec<ChangeKind>>,

    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub debounce: Option<String>,

    #[serde(default)]
    pub backend: Option<WatchBackend>,

    #[serde(default)]
    pub poll_interval: Option<String>,

    #[serde(default)]
    pub recursive: Option<bool>,

    /// Suppress modify notifications whose content hash did not change.
    #[serde(default)]
    pub use_hash: bool,

    /// While a file with this name exists in a watched root, all changes are
    /// ignored.
    #[serde(default)]
    pub processing_lock_file: Option<String>,

    /// `"off"` disables the timeout.
    #[serde(default)]
    pub responder_timeout: Option<String>,
}

/// `[[responder]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResponderSection {
    /// Log every notification.
    Log {
        #[serde(default)]
        level: Option<String>,
    },
    /// Run a shell command for every notification.
    Command {
        cmd: String,
        #[serde(default)]
        working_dir: Option<PathBuf>,
    },
}

/// A validated configuration file.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    observer: ObserverConfiguration,
    responders: Vec<ResponderSection>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        observer: ObserverConfiguration,
        responders: Vec<ResponderSection>,
    ) -> Self {
        Self {
            observer,
            responders,
        }
    }

    pub fn observer(&self) -> &ObserverConfiguration {
        &self.observer
    }

    pub fn responders(&self) -> &[ResponderSection] {
        &self.responders
    }

    pub fn into_parts(self) -> (ObserverConfiguration, Vec<ResponderSection>) {
        (self.observer, self.responders)
    }
}

/// Immutable settings for a [`crate::watch::FileSystemObserver`].
///
/// Only constructible through [`ObserverConfigurationBuilder::build`] (or a
/// validated config file), so every instance has at least one path, at least
/// one change kind and compilable glob patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverConfiguration {
    paths: Vec<PathBuf>,
    kinds: BTreeSet<ChangeKind>,
    include: Vec<String>,
    exclude: Vec<String>,
    debounce: Duration,
    backend: WatchBackend,
    poll_interval: Duration,
    recursive: bool,
    use_hash: bool,
    processing_lock_file: Option<String>,
    responder_timeout: Option<Duration>,
}

impl ObserverConfiguration {
    /// Start building a configuration that watches the given paths.
    pub fn builder<I, P>(paths: I) -> ObserverConfigurationBuilder
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        ObserverConfigurationBuilder::new().paths(paths)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn kinds(&self) -> &BTreeSet<ChangeKind> {
        &self.kinds
    }

    pub fn observes(&self, kind: ChangeKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn include_patterns(&self) -> &[String] {
        &self.include
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn backend(&self) -> WatchBackend {
        self.backend
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    pub fn processing_lock_file(&self) -> Option<&str> {
        self.processing_lock_file.as_deref()
    }

    pub fn responder_timeout(&self) -> Option<Duration> {
        self.responder_timeout
    }

    /// Copy the settings back into a builder, e.g. to derive a variant.
    pub fn to_builder(&self) -> ObserverConfigurationBuilder {
        ObserverConfigurationBuilder {
            paths: self.paths.clone(),
            kinds: Some(self.kinds.clone()),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            debounce: self.debounce,
            backend: self.backend,
            poll_interval: self.poll_interval,
            recursive: self.recursive,
            use_hash: self.use_hash,
            processing_lock_file: self.processing_lock_file.clone(),
            responder_timeout: self.responder_timeout,
        }
    }
}

/// Builder for [`ObserverConfiguration`].
#[derive(Debug, Clone)]
pub struct ObserverConfigurationBuilder {
    pub(crate) paths: Vec<PathBuf>,
    pub(crate) kinds: Option<BTreeSet<ChangeKind>>,
    pub(crate) include: Vec<String>,
    pub(crate) exclude: Vec<String>,
    pub(crate) debounce: Duration,
    pub(crate) backend: WatchBackend,
    pub(crate) poll_interval: Duration,
    pub(crate) recursive: bool,
    pub(crate) use_hash: bool,
    pub(crate) processing_lock_file: Option<String>,
    pub(crate) responder_timeout: Option<Duration>,
}

impl Default for ObserverConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ObserverConfigurationBuilder {
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            kinds: None,
            include: Vec::new(),
            exclude: Vec::new(),
            debounce: DEFAULT_DEBOUNCE,
            backend: WatchBackend::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            recursive: true,
            use_hash: false,
            processing_lock_file: None,
            responder_timeout: Some(DEFAULT_RESPONDER_TIMEOUT),
        }
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Observe one more kind. The first call replaces the "all kinds" default.
    pub fn kind(mut self, kind: ChangeKind) -> Self {
        self.kinds.get_or_insert_with(BTreeSet::new).insert(kind);
        self
    }

    pub fn kinds<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = ChangeKind>,
    {
        self.kinds.get_or_insert_with(BTreeSet::new).extend(kinds);
        self
    }

    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    pub fn debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    pub fn backend(mut self, backend: WatchBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn use_hash(mut self, use_hash: bool) -> Self {
        self.use_hash = use_hash;
        self
    }

    pub fn processing_lock_file(mut self, name: impl Into<String>) -> Self {
        self.processing_lock_file = Some(name.into());
        self
    }

    pub fn responder_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.responder_timeout = timeout;
        self
    }

    /// Validate and freeze the settings.
    pub fn build(self) -> Result<ObserverConfiguration> {
        let kinds = self
            .kinds
            .clone()
            .unwrap_or_else(|| ChangeKind::ALL.into_iter().collect());

        let include = trim_patterns(&self.include);
        let exclude = trim_patterns(&self.exclude);
        let processing_lock_file = self
            .processing_lock_file
            .as_ref()
            .map(|s| s.trim().to_string());

        super::validate::validate_observer_settings(
            &self.paths,
            &kinds,
            &include,
            &exclude,
            self.poll_interval,
            processing_lock_file.as_deref(),
        )?;

        Ok(ObserverConfiguration {
            paths: self.paths,
            kinds,
            include,
            exclude,
            debounce: self.debounce,
            backend: self.backend,
            poll_interval: self.poll_interval,
            recursive: self.recursive,
            use_hash: self.use_hash,
            processing_lock_file,
            responder_timeout: self.responder_timeout,
        })
    }
}

fn trim_patterns(patterns: &[String]) -> Vec<String> {
    patterns.iter().map(|p| p.trim().to_string()).collect()
}
