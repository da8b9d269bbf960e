//! Joint-phase state machine for a pair of signal heads.
//!
//! Only four joint states are reachable, visited in a fixed order with head
//! A leading:
//!
//! ```text
//! (green, red) → (yellow, red) → (red, green) → (red, yellow) → (green, red) …
//! ```
//!
//! The two heads are never green together.  This module is pure: it knows
//! nothing about timers or transports, only which state follows which and how
//! long each state lasts.
//!
//! # Dwell times
//!
//! A state lasts as long as the edge that leaves it:
//!
//! | State | Leaving edge | Duration | Fallback |
//! |---|---|---|---|
//! | `(green, red)` | green(A)→yellow(A) | `A.yellow` | 5s |
//! | `(yellow, red)` | yellow(A)→green(B) | `B.red` | 3s |
//! | `(red, green)` | green(B)→yellow(B) | `B.yellow` | 5s |
//! | `(red, yellow)` | yellow(B)→green(A) | `A.green` | 3s |

use std::time::Duration;

use crossroads_types::{Phase, Timing};

/// Fallback for yellow edges when the head has no timing.
pub const DEFAULT_YELLOW_SECS: u32 = 5;

/// Fallback for red/green edges when the head has no timing.
pub const DEFAULT_GREEN_RED_SECS: u32 = 3;

/// Delay before the next edge once a sensor has forced a head to yellow.
pub const PREEMPT_INTERVAL: Duration = Duration::from_secs(2);

/// Position of a head inside its crossroad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Side::A),
            1 => Some(Side::B),
            _ => None,
        }
    }
}

/// One of the four reachable joint states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CyclePhase {
    /// A green, B red.
    AGreen,
    /// A yellow, B red.
    AYellow,
    /// A red, B green.
    BGreen,
    /// A red, B yellow.
    BYellow,
}

impl CyclePhase {
    /// Cycle order, starting from the state a fresh cycle enters.
    pub const ORDER: [CyclePhase; 4] = [
        CyclePhase::AGreen,
        CyclePhase::AYellow,
        CyclePhase::BGreen,
        CyclePhase::BYellow,
    ];

    pub fn next(self) -> Self {
        match self {
            CyclePhase::AGreen => CyclePhase::AYellow,
            CyclePhase::AYellow => CyclePhase::BGreen,
            CyclePhase::BGreen => CyclePhase::BYellow,
            CyclePhase::BYellow => CyclePhase::AGreen,
        }
    }

    /// Displayed phases as `(A, B)`.
    pub fn phases(self) -> (Phase, Phase) {
        match self {
            CyclePhase::AGreen => (Phase::Green, Phase::Red),
            CyclePhase::AYellow => (Phase::Yellow, Phase::Red),
            CyclePhase::BGreen => (Phase::Red, Phase::Green),
            CyclePhase::BYellow => (Phase::Red, Phase::Yellow),
        }
    }

    /// Displayed phase of the head on `side`.
    pub fn phase_of(self, side: Side) -> Phase {
        let (a, b) = self.phases();
        match side {
            Side::A => a,
            Side::B => b,
        }
    }

    /// How long this state lasts before the next edge fires.
    pub fn dwell(self, a: Option<&Timing>, b: Option<&Timing>) -> Duration {
        let secs = match self {
            CyclePhase::AGreen => a.map_or(DEFAULT_YELLOW_SECS, |t| t.yellow),
            CyclePhase::AYellow => b.map_or(DEFAULT_GREEN_RED_SECS, |t| t.red),
            CyclePhase::BGreen => b.map_or(DEFAULT_YELLOW_SECS, |t| t.yellow),
            CyclePhase::BYellow => a.map_or(DEFAULT_GREEN_RED_SECS, |t| t.green),
        };
        Duration::from_secs(u64::from(secs))
    }

    /// State to force when a sensor on `side` asks for right-of-way.
    ///
    /// Only a head that is currently green yields; every other combination
    /// returns `None` and the event is ignored.
    pub fn preempted(self, side: Side) -> Option<CyclePhase> {
        match (self, side) {
            (CyclePhase::AGreen, Side::A) => Some(CyclePhase::AYellow),
            (CyclePhase::BGreen, Side::B) => Some(CyclePhase::BYellow),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visits_states_in_fixed_order() {
        let mut phase = CyclePhase::AGreen;
        let mut seen = Vec::new();
        for _ in 0..8 {
            seen.push(phase.phases());
            phase = phase.next();
        }
        let expected = [
            (Phase::Green, Phase::Red),
            (Phase::Yellow, Phase::Red),
            (Phase::Red, Phase::Green),
            (Phase::Red, Phase::Yellow),
        ];
        assert_eq!(&seen[..4], &expected);
        assert_eq!(&seen[4..], &expected);
    }

    #[test]
    fn never_both_green_and_exactly_one_non_red() {
        for phase in CyclePhase::ORDER {
            let (a, b) = phase.phases();
            assert!(!(a == Phase::Green && b == Phase::Green));
            let non_red = [a, b].iter().filter(|p| **p != Phase::Red).count();
            assert_eq!(non_red, 1, "{phase:?}");
        }
    }

    #[test]
    fn dwell_follows_edge_table() {
        let a = Timing::new(10, 3, 0);
        let b = Timing::new(0, 4, 8);
        let secs = |p: CyclePhase| p.dwell(Some(&a), Some(&b)).as_secs();
        assert_eq!(secs(CyclePhase::AGreen), 3);
        assert_eq!(secs(CyclePhase::AYellow), 8);
        assert_eq!(secs(CyclePhase::BGreen), 4);
        assert_eq!(secs(CyclePhase::BYellow), 10);
    }

    #[test]
    fn dwell_falls_back_when_unconfigured() {
        let secs = |p: CyclePhase| p.dwell(None, None).as_secs();
        assert_eq!(secs(CyclePhase::AGreen), 5);
        assert_eq!(secs(CyclePhase::AYellow), 3);
        assert_eq!(secs(CyclePhase::BGreen), 5);
        assert_eq!(secs(CyclePhase::BYellow), 3);
    }

    #[test]
    fn dwell_mixes_configured_and_fallback() {
        let a = Timing::new(7, 2, 9);
        assert_eq!(CyclePhase::AGreen.dwell(Some(&a), None).as_secs(), 2);
        assert_eq!(CyclePhase::AYellow.dwell(Some(&a), None).as_secs(), 3);
        assert_eq!(CyclePhase::BYellow.dwell(Some(&a), None).as_secs(), 7);
    }

    #[test]
    fn only_green_head_can_be_preempted() {
        assert_eq!(CyclePhase::AGreen.preempted(Side::A), Some(CyclePhase::AYellow));
        assert_eq!(CyclePhase::BGreen.preempted(Side::B), Some(CyclePhase::BYellow));
        assert_eq!(CyclePhase::AGreen.preempted(Side::B), None);
        assert_eq!(CyclePhase::BGreen.preempted(Side::A), None);
        assert_eq!(CyclePhase::AYellow.preempted(Side::A), None);
        assert_eq!(CyclePhase::BYellow.preempted(Side::B), None);
    }

    #[test]
    fn side_index_roundtrip() {
        assert_eq!(Side::from_index(Side::A.index()), Some(Side::A));
        assert_eq!(Side::from_index(Side::B.index()), Some(Side::B));
        assert_eq!(Side::from_index(2), None);
        assert_eq!(CyclePhase::BYellow.phase_of(Side::B), Phase::Yellow);
    }
}
