//! `crossroads-types` – shared vocabulary for the crossroad controller.
//!
//! Everything that crosses a crate boundary lives here: identifiers, the
//! phase and timing model of a signal head, the JSON sensor payloads sent by
//! the hardware, the transport envelope, and the workspace-wide
//! [`CrossroadError`].

pub mod topics;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Identifiers
// ────────────────────────────────────────────────────────────────────────────

/// Opaque, stable identifier of a signal head as announced by the hardware.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeadId(String);

impl HeadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HeadId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for HeadId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Stable identifier of a crossroad.  Unlike a list position it survives
/// removal of other crossroads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrossroadId(Uuid);

impl CrossroadId {
    /// Allocate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CrossroadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CrossroadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Signal head model
// ────────────────────────────────────────────────────────────────────────────

/// Displayed color state of a signal head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Green,
    Yellow,
    Red,
    /// Never commanded yet.
    #[default]
    Unset,
}

impl Phase {
    /// Wire form used on the `traffic-light/state/<id>` topic.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Green => "green",
            Phase::Yellow => "yellow",
            Phase::Red => "red",
            Phase::Unset => "unset",
        }
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self, Phase::Unset)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = CrossroadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "green" => Ok(Phase::Green),
            "yellow" => Ok(Phase::Yellow),
            "red" => Ok(Phase::Red),
            "unset" => Ok(Phase::Unset),
            other => Err(CrossroadError::Serialization(format!(
                "unknown phase '{other}'"
            ))),
        }
    }
}

/// Per-head phase durations in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub green: u32,
    pub yellow: u32,
    pub red: u32,
}

impl Timing {
    pub const fn new(green: u32, yellow: u32, red: u32) -> Self {
        Self { green, yellow, red }
    }

    /// Build the timings of a head pair the way the editor does: each head's
    /// red duration mirrors its partner's green duration.
    ///
    /// ```
    /// use crossroads_types::Timing;
    ///
    /// let [a, b] = Timing::paired(10, 3, 8, 4);
    /// assert_eq!(a, Timing::new(10, 3, 8));
    /// assert_eq!(b, Timing::new(8, 4, 10));
    /// ```
    pub const fn paired(green_a: u32, yellow_a: u32, green_b: u32, yellow_b: u32) -> [Timing; 2] {
        [
            Timing::new(green_a, yellow_a, green_b),
            Timing::new(green_b, yellow_b, green_a),
        ]
    }
}

/// One physical traffic signal unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalHead {
    pub id: HeadId,
    pub phase: Phase,
    pub timing: Option<Timing>,
}

impl SignalHead {
    /// A head with no phase commanded and no timing configured.
    pub fn new(id: impl Into<HeadId>) -> Self {
        Self {
            id: id.into(),
            phase: Phase::Unset,
            timing: None,
        }
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = Some(timing);
        self
    }
}

/// Point-in-time copy of a crossroad, safe to hand to display code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossroadSnapshot {
    pub id: CrossroadId,
    /// Heads in pair order (A first).
    pub heads: Vec<SignalHead>,
    pub running: bool,
}

impl CrossroadSnapshot {
    pub fn contains(&self, head: &HeadId) -> bool {
        self.heads.iter().any(|h| &h.id == head)
    }

    pub fn phase_of(&self, head: &HeadId) -> Option<Phase> {
        self.heads.iter().find(|h| &h.id == head).map(|h| h.phase)
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.heads.iter().map(|h| h.phase).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sensor payloads
// ────────────────────────────────────────────────────────────────────────────

/// Digital level reported by a sensor input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "LOW")]
    Low,
}

/// Payload of `traffic-light/<id>/ldr-state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LdrReading {
    pub ldr_state: Level,
}

/// Payload of `traffic-light/<id>/walker-button`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonReading {
    pub button_state: Level,
}

/// The two sensor inputs every head carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Light-dependent resistor used as an occupancy detector.
    Ldr,
    /// Pedestrian call button.
    WalkerButton,
}

impl SensorKind {
    pub const ALL: [SensorKind; 2] = [SensorKind::Ldr, SensorKind::WalkerButton];

    /// Last topic segment for this sensor.
    pub fn topic_suffix(&self) -> &'static str {
        match self {
            SensorKind::Ldr => "ldr-state",
            SensorKind::WalkerButton => "walker-button",
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.topic_suffix() == suffix)
    }

    /// Decode the JSON payload of this sensor into its level.
    pub fn parse_level(&self, payload: &str) -> Result<Level, CrossroadError> {
        let level = match self {
            SensorKind::Ldr => serde_json::from_str::<LdrReading>(payload).map(|r| r.ldr_state),
            SensorKind::WalkerButton => {
                serde_json::from_str::<ButtonReading>(payload).map(|r| r.button_state)
            }
        };
        level.map_err(|e| CrossroadError::Serialization(e.to_string()))
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.topic_suffix())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transport envelope
// ────────────────────────────────────────────────────────────────────────────

/// A single message travelling over the publish/subscribe transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportMessage {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub topic: String,
    pub payload: String,
}

impl TransportMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Workspace-wide error type.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossroadError {
    #[error("Invalid Configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Crossroad {crossroad} is full; cannot add head {head}")]
    CrossroadFull { crossroad: CrossroadId, head: HeadId },

    #[error("Unknown head: {0}")]
    UnknownHead(HeadId),

    #[error("Unknown crossroad: {0}")]
    UnknownCrossroad(CrossroadId),

    #[error("Head {0} already belongs to a crossroad")]
    HeadAlreadyPlaced(HeadId),

    #[error("Transport Error: {0}")]
    Transport(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),
}
