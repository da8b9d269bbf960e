//! Wildcard topic matching.
//!
//! Topics and patterns are `/`-delimited segment lists.  A pattern segment is
//! one of:
//!
//! | Segment | Matches |
//! |---|---|
//! | `+` | exactly one non-empty topic segment |
//! | `#` | the rest of the topic (one or more segments); only valid last |
//! | anything else | the identical topic segment |

/// Return `true` when `topic` satisfies `pattern`.
///
/// Pure and allocation-free; cost is linear in the segment count.
///
/// ```
/// use crossroads_middleware::topic::matches;
///
/// assert!(matches("traffic-light/+/new", "traffic-light/abc123/new"));
/// assert!(!matches("traffic-light/+/new", "traffic-light/abc123/state/new"));
/// assert!(matches("traffic-light/#", "traffic-light/x/y/z"));
/// ```
pub fn matches(pattern: &str, topic: &str) -> bool {
    if pattern == topic {
        return true;
    }

    let mut pattern_segments = pattern.split('/').peekable();
    let mut topic_segments = topic.split('/');

    while let Some(segment) = pattern_segments.next() {
        if segment == "#" {
            return pattern_segments.peek().is_none() && topic_segments.next().is_some();
        }
        let Some(topic_segment) = topic_segments.next() else {
            return false;
        };
        let satisfied = match segment {
            "+" => !topic_segment.is_empty(),
            literal => literal == topic_segment,
        };
        if !satisfied {
            return false;
        }
    }

    // A pattern that runs out before the topic does is not a match.
    topic_segments.next().is_none()
}
