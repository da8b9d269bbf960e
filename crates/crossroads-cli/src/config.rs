//! Startup layout – reads `~/.crossroads/config.toml`.
//!
//! The file is only ever read.  Layout changes made from the REPL live for
//! the lifetime of the process.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crossroads_core::CrossroadRegistry;
use crossroads_middleware::bus::DEFAULT_CAPACITY;
use crossroads_types::{CrossroadError, CrossroadId, HeadId, SignalHead, Timing};

/// One head in a `[[crossroads]]` entry.
///
/// Timing fields are all-or-nothing: either every field is present or the
/// head is placed without timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub green: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yellow: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red: Option<u32>,
}

impl HeadEntry {
    fn timing(&self) -> Result<Option<Timing>, String> {
        match (self.green, self.yellow, self.red) {
            (Some(green), Some(yellow), Some(red)) => Ok(Some(Timing::new(green, yellow, red))),
            (None, None, None) => Ok(None),
            _ => Err(format!(
                "head '{}' must set all of green/yellow/red or none of them",
                self.id
            )),
        }
    }

    fn to_head(&self) -> Result<SignalHead, String> {
        let head = SignalHead::new(self.id.as_str());
        Ok(match self.timing()? {
            Some(timing) => head.with_timing(timing),
            None => head,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossroadEntry {
    pub heads: Vec<HeadEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Broadcast capacity of the in-process message bus.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,

    /// Start every fully configured crossroad after loading.
    #[serde(default = "default_autostart")]
    pub autostart: bool,

    #[serde(default)]
    pub crossroads: Vec<CrossroadEntry>,
}

fn default_bus_capacity() -> usize {
    DEFAULT_CAPACITY
}
fn default_autostart() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus_capacity: default_bus_capacity(),
            autostart: default_autostart(),
            crossroads: Vec::new(),
        }
    }
}

impl Config {
    fn validate(&self) -> Result<(), String> {
        if self.bus_capacity == 0 {
            return Err("bus_capacity must be at least 1".to_string());
        }
        for (i, crossroad) in self.crossroads.iter().enumerate() {
            if crossroad.heads.is_empty() || crossroad.heads.len() > 2 {
                return Err(format!(
                    "crossroads[{i}] has {} head(s); expected 1 or 2",
                    crossroad.heads.len()
                ));
            }
            for head in &crossroad.heads {
                head.timing()?;
            }
        }
        Ok(())
    }
}

/// Return the config path: `$CROSSROADS_CONFIG` if set, otherwise
/// `~/.crossroads/config.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("CROSSROADS_CONFIG") {
        return PathBuf::from(p);
    }
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".crossroads").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg = parse(&raw)?;
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(Some(cfg))
}

/// Parse and validate a config document without env overrides.
pub(crate) fn parse(raw: &str) -> Result<Config, String> {
    let cfg: Config = toml::from_str(raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Apply `CROSSROADS_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `CROSSROADS_BUS_CAPACITY` | `bus_capacity` |
/// | `CROSSROADS_AUTOSTART` | `autostart` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("CROSSROADS_BUS_CAPACITY")
        && let Ok(capacity) = v.parse::<usize>()
    {
        cfg.bus_capacity = capacity;
    }
    if let Ok(v) = std::env::var("CROSSROADS_AUTOSTART")
        && let Ok(autostart) = v.parse::<bool>()
    {
        cfg.autostart = autostart;
    }
}

/// Place every configured crossroad into `registry`.
///
/// Returns the ids of the crossroads created, in file order.  When
/// `cfg.autostart` is set, crossroads whose two heads both carry timing
/// are started.
pub fn apply_layout(
    cfg: &Config,
    registry: &mut CrossroadRegistry,
) -> Result<Vec<CrossroadId>, String> {
    let mut created = Vec::with_capacity(cfg.crossroads.len());
    for entry in &cfg.crossroads {
        let mut heads = entry.heads.iter();
        let Some(first) = heads.next() else {
            continue;
        };
        let id = registry
            .create_solo(first.to_head()?)
            .map_err(describe)?;
        for head in heads {
            registry
                .join(&HeadId::from(first.id.as_str()), head.to_head()?)
                .map_err(describe)?;
        }
        created.push(id);
    }

    if cfg.autostart {
        for id in &created {
            let complete = registry
                .snapshot(*id)
                .is_some_and(|s| s.heads.len() == 2 && s.heads.iter().all(|h| h.timing.is_some()));
            if complete {
                registry.start(*id).map_err(describe)?;
            }
        }
    }
    Ok(created)
}

fn describe(e: CrossroadError) -> String {
    format!("Failed to apply layout: {}", e)
}
