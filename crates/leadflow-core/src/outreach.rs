use serde::{Deserialize, Serialize};

/// Research notes the drafting agent assembles about a lead.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalizationBrief {
    pub company_overview: String,
    pub recent_news: String,
    pub industry_trends: String,
    pub role_analysis: String,
    pub conversation_hooks: Vec<String>,
    pub personalization_summary: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
}

impl EmailDraft {
    pub fn is_sendable(&self) -> bool {
        !self.subject.trim().is_empty() && !self.body.trim().is_empty()
    }
}

/// A scheduled follow-up in the sequence after the initial email.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    pub sequence_number: u32,
    pub subject: String,
    pub body: String,
    /// Days after the initial email. Always positive.
    pub send_after_days: u32,
}

impl FollowUp {
    pub const DEFAULT_SEND_AFTER_DAYS: u32 = 3;
}

/// Everything the drafting stage produced for a lead. Regeneration replaces
/// the whole value; nothing is merged across drafts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachData {
    pub personalization_brief: PersonalizationBrief,
    pub initial_email: EmailDraft,
    pub follow_ups: Vec<FollowUp>,
    pub outreach_summary: String,
}
