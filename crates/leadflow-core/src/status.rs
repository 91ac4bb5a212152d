//! Mapping from the tracker's free-text verdicts to lifecycle states.

use crate::lead::LeadStatus;

/// Substring rules, checked in order; the first rule with any matching
/// needle wins. Needles are lowercase.
///
/// Order matters: bounce notices often contain "response", and
/// "no response" contains "response".
const RULES: &[(&[&str], LeadStatus)] = &[
    (&["bounced", "bounce"], LeadStatus::Bounced),
    (&["no response", "no_response"], LeadStatus::NoResponse),
    (&["replied", "response"], LeadStatus::Replied),
];

/// Resolve a raw tracker classification into a canonical status.
///
/// Pure and total: case-insensitive substring matching in the priority order
/// of [`RULES`], falling back to [`LeadStatus::OutreachSent`] for anything
/// unrecognised (including the empty string).
pub fn resolve_status(raw: &str) -> LeadStatus {
    let lowered = raw.to_lowercase();
    RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lowered.contains(n)))
        .map(|(_, status)| *status)
        .unwrap_or(LeadStatus::OutreachSent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounce_wins_over_everything() {
        assert_eq!(resolve_status("Bounced - hard bounce"), LeadStatus::Bounced);
        assert_eq!(resolve_status("bounce: no response from mail server"), LeadStatus::Bounced);
        assert_eq!(resolve_status("Replied, then BOUNCED"), LeadStatus::Bounced);
    }

    #[test]
    fn no_response_before_response() {
        assert_eq!(resolve_status("No Response"), LeadStatus::NoResponse);
        assert_eq!(resolve_status("NO_RESPONSE"), LeadStatus::NoResponse);
    }

    #[test]
    fn replies() {
        assert_eq!(resolve_status("Replied"), LeadStatus::Replied);
        assert_eq!(resolve_status("positive response"), LeadStatus::Replied);
    }

    #[test]
    fn unmatched_defaults_to_sent() {
        for raw in ["", "Unknown", "pending", "opened", "  "] {
            assert_eq!(resolve_status(raw), LeadStatus::OutreachSent, "raw = {raw:?}");
        }
    }

    #[test]
    fn deterministic() {
        let inputs = ["Replied", "bounce", "No response", "??", "Response pending"];
        for raw in inputs {
            assert_eq!(resolve_status(raw), resolve_status(raw));
        }
    }

    #[test]
    fn only_tracked_states_or_sent() {
        let inputs = ["Replied", "bounce", "no_response", "interested", "ooo autoreply"];
        for raw in inputs {
            let status = resolve_status(raw);
            assert!(status.is_sent(), "{raw:?} resolved to {status}");
        }
    }
}
