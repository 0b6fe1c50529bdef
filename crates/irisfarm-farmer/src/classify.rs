//! Reply classification — decides what Iris said.

use regex::Regex;
use std::sync::LazyLock;

/// Acceptance marker in Iris replies.
const SUCCESS_MARKER: &str = "ЗАЧЁТ";

/// Rejection marker with the embedded cooldown, e.g.
/// "НЕЗАЧЁТ, приходи через 1 час 45 мин".
static FAILURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"НЕЗАЧЁТ.*через\s+(\d+)\s+час(?:а|ов)?\s+(\d+)\s+мин")
        .expect("failure pattern should compile")
});

/// Outcome of classifying one reply from Iris.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Farm accepted; wait the normal interval.
    Success,
    /// Farm rejected; Iris dictates the cooldown.
    Failure { hours: u32, minutes: u32 },
    /// Anything we cannot interpret.
    Unknown,
}

/// Classify a reply. Failure is checked first: its marker embeds the
/// success marker as a substring. A rejection without a parseable cooldown
/// does not match the failure pattern and falls through.
pub fn classify(text: &str) -> Reply {
    if let Some(caps) = FAILURE_RE.captures(text) {
        let hours = caps[1].parse().unwrap_or(0);
        let minutes = caps[2].parse().unwrap_or(0);
        return Reply::Failure { hours, minutes };
    }
    if text.contains(SUCCESS_MARKER) {
        return Reply::Success;
    }
    Reply::Unknown
}
