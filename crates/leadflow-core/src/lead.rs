use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::LeadId;
use crate::outreach::OutreachData;

/// Position of a lead in the outreach lifecycle.
///
/// ```text
/// New ──draft──▶ DraftReady ──send──▶ OutreachSent ──track──▶ Replied
///                  │    ▲                  │                  NoResponse
///                  └────┘ (regenerate)     └──────────────────▶ Bounced
/// ```
///
/// The three tracked states may be re-entered from one another on later
/// checks. Nothing ever leads back to `New` or `DraftReady` once sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadStatus {
    #[serde(rename = "New")]
    New,
    #[serde(rename = "Draft Ready")]
    DraftReady,
    #[serde(rename = "Outreach Sent")]
    OutreachSent,
    #[serde(rename = "Replied")]
    Replied,
    #[serde(rename = "No Response")]
    NoResponse,
    #[serde(rename = "Bounced")]
    Bounced,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 6] = [
        Self::New,
        Self::DraftReady,
        Self::OutreachSent,
        Self::Replied,
        Self::NoResponse,
        Self::Bounced,
    ];

    /// Whether the directed lifecycle graph has an edge `self → next`.
    pub fn can_transition_to(self, next: LeadStatus) -> bool {
        use LeadStatus::*;
        match (self, next) {
            (New | DraftReady, DraftReady) => true,
            (DraftReady, OutreachSent) => true,
            (OutreachSent | Replied | NoResponse | Bounced, Replied | NoResponse | Bounced) => true,
            _ => false,
        }
    }

    /// Outreach has gone out; the lead is eligible for response tracking.
    pub fn is_sent(self) -> bool {
        matches!(
            self,
            Self::OutreachSent | Self::Replied | Self::NoResponse | Self::Bounced
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::DraftReady => "Draft Ready",
            Self::OutreachSent => "Outreach Sent",
            Self::Replied => "Replied",
            Self::NoResponse => "No Response",
            Self::Bounced => "Bounced",
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields supplied by the operator when registering a lead.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub context: String,
}

/// A prospective contact carried through the outreach lifecycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    pub email: String,
    pub company: String,
    pub role: String,
    pub context: String,
    pub status: LeadStatus,
    pub last_activity: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outreach_data: Option<OutreachData>,
}

impl Lead {
    pub fn new(fields: NewLead) -> Self {
        Self {
            id: LeadId::new(),
            name: fields.name,
            email: fields.email,
            company: fields.company,
            role: fields.role,
            context: fields.context,
            status: LeadStatus::New,
            last_activity: Utc::now(),
            outreach_data: None,
        }
    }

    /// Case-insensitive email comparison used to associate tracking records.
    pub fn email_matches(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LeadStatus::*;

    #[test]
    fn lifecycle_edges() {
        assert!(New.can_transition_to(DraftReady));
        assert!(DraftReady.can_transition_to(DraftReady));
        assert!(DraftReady.can_transition_to(OutreachSent));
        assert!(OutreachSent.can_transition_to(Replied));
        assert!(OutreachSent.can_transition_to(NoResponse));
        assert!(OutreachSent.can_transition_to(Bounced));
        assert!(Replied.can_transition_to(Bounced));
        assert!(Bounced.can_transition_to(Replied));
        assert!(NoResponse.can_transition_to(NoResponse));
    }

    #[test]
    fn nothing_returns_to_new_or_draft_after_send() {
        for from in LeadStatus::ALL {
            assert!(!from.can_transition_to(New), "{from} -> New must be rejected");
            if from.is_sent() {
                assert!(!from.can_transition_to(DraftReady), "{from} -> Draft Ready");
            }
        }
    }

    #[test]
    fn no_shortcuts() {
        assert!(!New.can_transition_to(OutreachSent));
        assert!(!New.can_transition_to(Replied));
        assert!(!DraftReady.can_transition_to(Bounced));
        assert!(!Replied.can_transition_to(OutreachSent));
    }

    #[test]
    fn sent_family() {
        let sent: Vec<_> = LeadStatus::ALL.into_iter().filter(|s| s.is_sent()).collect();
        assert_eq!(sent, vec![OutreachSent, Replied, NoResponse, Bounced]);
    }

    #[test]
    fn status_serde_uses_display_names() {
        assert_eq!(serde_json::to_string(&DraftReady).unwrap(), "\"Draft Ready\"");
        let parsed: LeadStatus = serde_json::from_str("\"No Response\"").unwrap();
        assert_eq!(parsed, NoResponse);
        assert_eq!(OutreachSent.to_string(), "Outreach Sent");
    }

    #[test]
    fn new_lead_starts_new() {
        let lead = Lead::new(NewLead {
            name: "David Kim".into(),
            email: "dkim@nexushealth.co".into(),
            ..Default::default()
        });
        assert_eq!(lead.status, New);
        assert!(lead.outreach_data.is_none());
        assert!(lead.email_matches("DKim@NexusHealth.co "));
    }

    #[test]
    fn lead_serializes_camel_case() {
        let lead = Lead::new(NewLead {
            name: "A".into(),
            email: "a@b.c".into(),
            ..Default::default()
        });
        let json = serde_json::to_value(&lead).unwrap();
        assert!(json.get("lastActivity").is_some());
        assert!(json.get("outreachData").is_none());
    }
}
