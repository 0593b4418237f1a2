// src/lib.rs

pub mod cli;
pub mod compare;
pub mod concurrency;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod operation;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{
    ConfigFile, RawConfigFile, ResponderSection, default_config_path, load_from_path,
};
use crate::logging::parse_level_str;
use crate::operation::ShellCommand;
use crate::types::WatchBackend;
use crate::watch::{ChangeResponder, CommandResponder, FileSystemObserver, LoggingResponder};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file, then CLI overrides)
/// - responder construction
/// - the observer
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = resolve_config(&args)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let (observer_cfg, sections) = cfg.into_parts();
    let responders = build_responders(&sections);

    let mut observer = FileSystemObserver::from_config(observer_cfg, responders)?;
    observer.start()?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C; stopping");
    }
    info!("shutdown requested");

    observer.stop().await?;
    if let Some(processor) = observer.processor() {
        let stats = processor.stats();
        info!(
            received = stats.received,
            emitted = stats.emitted,
            filtered = stats.filtered,
            suppressed = stats.suppressed,
            "observer summary"
        );
    }
    Ok(())
}

/// Load the config file (explicit `--config`, else `Foundation.toml` when
/// present) and apply CLI overrides on top.
pub fn resolve_config(args: &CliArgs) -> Result<ConfigFile> {
    let path = match &args.config {
        Some(p) => Some(PathBuf::from(p)),
        None => Some(default_config_path()).filter(|p| p.is_file()),
    };

    let mut raw = match &path {
        Some(p) => {
            debug!(path = ?p, "loading config file");
            load_from_path(p)?
        }
        None => RawConfigFile::default(),
    };

    apply_cli_overrides(&mut raw, args);

    if raw.observer.paths.is_empty() {
        raw.observer.paths.push(PathBuf::from("."));
    }

    Ok(ConfigFile::try_from(raw)?)
}

fn apply_cli_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    let observer = &mut raw.observer;
    if !args.paths.is_empty() {
        observer.paths = args.paths.iter().map(PathBuf::from).collect();
    }
    if !args.include.is_empty() {
        observer.include = args.include.clone();
    }
    if !args.exclude.is_empty() {
        observer.exclude = args.exclude.clone();
    }
    if !args.kinds.is_empty() {
        observer.kinds = Some(args.kinds.clone());
    }
    if let Some(d) = &args.debounce {
        observer.debounce = Some(d.clone());
    }
    if args.poll {
        observer.backend = Some(WatchBackend::Poll);
    }
    if let Some(cmd) = &args.exec {
        raw.responder.push(ResponderSection::Command {
            cmd: cmd.clone(),
            working_dir: None,
        });
    }
}

/// Responders for the configured sections; a single info-level logger when
/// none are configured.
pub fn build_responders(sections: &[ResponderSection]) -> Vec<Arc<dyn ChangeResponder>> {
    if sections.is_empty() {
        return vec![Arc::new(LoggingResponder::default())];
    }

    sections
        .iter()
        .map(|section| -> Arc<dyn ChangeResponder> {
            match section {
                ResponderSection::Log { level } => {
                    let level = level
                        .as_deref()
                        .and_then(parse_level_str)
                        .unwrap_or(tracing::Level::INFO);
                    Arc::new(LoggingResponder::new(level))
                }
                ResponderSection::Command { cmd, working_dir } => {
                    let mut command = ShellCommand::new(cmd.clone());
                    if let Some(dir) = working_dir {
                        command = command.working_dir(dir.clone());
                    }
                    Arc::new(CommandResponder::new(command))
                }
            }
        })
        .collect()
}

/// Simple dry-run output: print the resolved observer and responders.
fn print_dry_run(cfg: &ConfigFile) {
    let observer = cfg.observer();
    println!("foundation dry-run");
    println!("  paths: {:?}", observer.paths());
    let kinds: Vec<&str> = observer.kinds().iter().map(|k| k.as_str()).collect();
    println!("  kinds: {:?}", kinds);
    if !observer.include_patterns().is_empty() {
        println!("  include: {:?}", observer.include_patterns());
    }
    if !observer.exclude_patterns().is_empty() {
        println!("  exclude: {:?}", observer.exclude_patterns());
    }
    println!("  debounce: {:?}", observer.debounce());
    println!("  backend: {}", observer.backend());
    if observer.backend() == WatchBackend::Poll {
        println!("  poll_interval: {:?}", observer.poll_interval());
    }
    println!("  recursive: {}", observer.recursive());
    if observer.use_hash() {
        println!("  use_hash: true");
    }
    if let Some(lock) = observer.processing_lock_file() {
        println!("  processing_lock_file: {lock}");
    }
    match observer.responder_timeout() {
        Some(t) => println!("  responder_timeout: {t:?}"),
        None => println!("  responder_timeout: off"),
    }
    println!();

    println!("responders ({}):", cfg.responders().len().max(1));
    if cfg.responders().is_empty() {
        println!("  - log (default)");
    }
    for section in cfg.responders() {
        match section {
            ResponderSection::Log { level } => {
                println!("  - log ({})", level.as_deref().unwrap_or("info"));
            }
            ResponderSection::Command { cmd, working_dir } => {
                println!("  - command: {cmd}");
                if let Some(dir) = working_dir {
                    println!("      working_dir: {}", dir.display());
                }
            }
        }
    }

    debug!("dry-run complete (not watching)");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChangeKind;

    #[test]
    fn cli_flags_fill_in_an_empty_config() {
        let args = CliArgs {
            config: None,
            paths: vec!["src".into()],
            kinds: vec![ChangeKind::Modify],
            debounce: Some("100ms".into()),
            poll: true,
            exec: Some("echo hi".into()),
            ..CliArgs::default()
        };
        let mut raw = RawConfigFile::default();
        apply_cli_overrides(&mut raw, &args);
        let cfg = ConfigFile::try_from(raw).unwrap();

        assert_eq!(cfg.observer().paths(), &[PathBuf::from("src")]);
        assert!(cfg.observer().observes(ChangeKind::Modify));
        assert!(!cfg.observer().observes(ChangeKind::Create));
        assert_eq!(cfg.observer().debounce(), std::time::Duration::from_millis(100));
        assert_eq!(cfg.observer().backend(), WatchBackend::Poll);
        assert_eq!(cfg.responders().len(), 1);
    }

    #[test]
    fn default_responder_is_a_logger() {
        let responders = build_responders(&[]);
        assert_eq!(responders.len(), 1);
        assert_eq!(responders[0].name(), "log");
    }
}
