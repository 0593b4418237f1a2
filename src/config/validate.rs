// src/config/validate.rs

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use globset::Glob;

use crate::config::model::{
    ConfigFile, ObserverConfigurationBuilder, ObserverSection, RawConfigFile, ResponderSection,
};
use crate::errors::{FoundationError, Result};
use crate::logging::parse_level_str;
use crate::types::ChangeKind;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = FoundationError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_responders(&raw.responder)?;
        let observer = builder_from_section(&raw.observer)?.build()?;
        Ok(ConfigFile::new_unchecked(observer, raw.responder))
    }
}

/// Translate the string-typed `[observer]` section into a builder.
pub(crate) fn builder_from_section(
    section: &ObserverSection,
) -> Result<ObserverConfigurationBuilder> {
    let mut builder = ObserverConfigurationBuilder::new()
        .paths(section.paths.iter().cloned())
        .use_hash(section.use_hash);

    if let Some(kinds) = &section.kinds {
        builder = builder.kinds(kinds.iter().copied());
    }
    for pattern in &section.include {
        builder = builder.include(pattern.clone());
    }
    for pattern in &section.exclude {
        builder = builder.exclude(pattern.clone());
    }
    if let Some(s) = &section.debounce {
        builder = builder.debounce(parse_duration_field("debounce", s)?);
    }
    if let Some(backend) = section.backend {
        builder = builder.backend(backend);
    }
    if let Some(s) = &section.poll_interval {
        builder = builder.poll_interval(parse_duration_field("poll_interval", s)?);
    }
    if let Some(recursive) = section.recursive {
        builder = builder.recursive(recursive);
    }
    if let Some(name) = &section.processing_lock_file {
        builder = builder.processing_lock_file(name.clone());
    }
    if let Some(s) = &section.responder_timeout {
        let timeout = match s.trim().to_lowercase().as_str() {
            "off" | "none" => None,
            _ => Some(parse_duration_field("responder_timeout", s)?),
        };
        builder = builder.responder_timeout(timeout);
    }

    Ok(builder)
}

pub(crate) fn validate_observer_settings(
    paths: &[PathBuf],
    kinds: &BTreeSet<ChangeKind>,
    include: &[String],
    exclude: &[String],
    poll_interval: Duration,
    processing_lock_file: Option<&str>,
) -> Result<()> {
    if paths.is_empty() {
        return Err(FoundationError::ConfigError(
            "observer configuration must contain at least one path to watch".to_string(),
        ));
    }

    if let Some(empty) = paths.iter().find(|p| p.as_os_str().is_empty()) {
        return Err(FoundationError::ConfigError(format!(
            "observer path must not be empty (got {:?})",
            empty
        )));
    }

    if kinds.is_empty() {
        return Err(FoundationError::ConfigError(
            "observer configuration must observe at least one change kind".to_string(),
        ));
    }

    for pattern in include.iter().chain(exclude.iter()) {
        if pattern.is_empty() {
            return Err(FoundationError::ConfigError(
                "glob patterns must not be empty".to_string(),
            ));
        }
        Glob::new(pattern).map_err(|e| {
            FoundationError::ConfigError(format!("invalid glob pattern '{pattern}': {e}"))
        })?;
    }

    if poll_interval.is_zero() {
        return Err(FoundationError::ConfigError(
            "poll interval must be greater than zero".to_string(),
        ));
    }

    if let Some(name) = processing_lock_file {
        if name.is_empty() {
            return Err(FoundationError::ConfigError(
                "processing_lock_file must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_responders(responders: &[ResponderSection]) -> Result<()> {
    for (idx, responder) in responders.iter().enumerate() {
        match responder {
            ResponderSection::Log { level: Some(level) } => {
                if parse_level_str(level).is_none() {
                    return Err(FoundationError::ConfigError(format!(
                        "responder #{idx}: unknown log level '{level}'"
                    )));
                }
            }
            ResponderSection::Log { level: None } => {}
            ResponderSection::Command { cmd, .. } => {
                if cmd.trim().is_empty() {
                    return Err(FoundationError::ConfigError(format!(
                        "responder #{idx}: command must not be empty"
                    )));
                }
            }
        }
    }
    Ok(())
}

fn parse_duration_field(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| FoundationError::ConfigError(format!("[observer].{field}: {e}")))
}

/// Parse a duration string such as `"250ms"`, `"2s"`, `"1m"` or `"1h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: '{s}'"))
}
