//! Topic names used on the transport.
//!
//! | Topic | Direction | Payload |
//! |---|---|---|
//! | `traffic-light/<id>/ldr-state` | inbound | `{"ldrState":"HIGH"\|"LOW"}` |
//! | `traffic-light/<id>/walker-button` | inbound | `{"buttonState":"HIGH"\|"LOW"}` |
//! | `traffic-light/state/<id>` | outbound | `green` \| `yellow` \| `red` |
//! | `traffic-light/+/new` | inbound | opaque |

use crate::{HeadId, SensorKind};

pub const ROOT: &str = "traffic-light";

/// Pattern under which hardware announces freshly powered heads.
pub const NEW_HEAD_PATTERN: &str = "traffic-light/+/new";

/// Pattern covering every outbound state topic.
pub const STATE_PATTERN: &str = "traffic-light/state/#";

/// Inbound sensor topic for `head`.
pub fn sensor(head: &HeadId, kind: SensorKind) -> String {
    format!("{ROOT}/{head}/{}", kind.topic_suffix())
}

/// Outbound commanded-phase topic for `head`.
pub fn state(head: &HeadId) -> String {
    format!("{ROOT}/state/{head}")
}

/// Split a concrete sensor topic into the head it names and the sensor kind.
pub fn parse_sensor(topic: &str) -> Option<(HeadId, SensorKind)> {
    let mut parts = topic.split('/');
    let (root, head, suffix) = (parts.next()?, parts.next()?, parts.next()?);
    if root != ROOT || head.is_empty() || parts.next().is_some() {
        return None;
    }
    SensorKind::from_suffix(suffix).map(|kind| (HeadId::from(head), kind))
}

/// Extract the head id from a `traffic-light/<id>/new` announcement.
pub fn parse_new_head(topic: &str) -> Option<HeadId> {
    let mut parts = topic.split('/');
    let (root, head, suffix) = (parts.next()?, parts.next()?, parts.next()?);
    if root != ROOT || head.is_empty() || suffix != "new" || parts.next().is_some() {
        return None;
    }
    Some(HeadId::from(head))
}
