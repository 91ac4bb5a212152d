use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lead::LeadStatus;
use crate::status::resolve_status;

/// Sentinel used when the tracker reports no response date.
pub const NO_RESPONSE_DATE: &str = "N/A";

/// One tracker verdict about one lead, as reported by the tracking agent.
/// Associated with stored leads by case-insensitive email only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedLead {
    pub lead_name: String,
    pub email: String,
    /// Raw, free-text classification.
    pub status: String,
    pub last_response_date: String,
    pub response_summary: String,
    pub recommended_action: String,
}

impl TrackedLead {
    pub fn resolved_status(&self) -> LeadStatus {
        resolve_status(&self.status)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    pub total: u32,
    pub replied: u32,
    pub no_response: u32,
    pub bounced: u32,
}

impl EngagementMetrics {
    /// Derive the aggregate by classifying each tracked record.
    pub fn recount(tracked: &[TrackedLead]) -> Self {
        let mut metrics = Self {
            total: tracked.len() as u32,
            ..Self::default()
        };
        for record in tracked {
            match record.resolved_status() {
                LeadStatus::Replied => metrics.replied += 1,
                LeadStatus::NoResponse => metrics.no_response += 1,
                LeadStatus::Bounced => metrics.bounced += 1,
                _ => {}
            }
        }
        metrics
    }
}

/// Read model of the most recent successful tracking check.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingReport {
    pub tracked_leads: Vec<TrackedLead>,
    pub metrics: EngagementMetrics,
    pub overall_summary: String,
    pub checked_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracked(email: &str, status: &str) -> TrackedLead {
        TrackedLead {
            lead_name: String::new(),
            email: email.into(),
            status: status.into(),
            last_response_date: NO_RESPONSE_DATE.into(),
            response_summary: String::new(),
            recommended_action: String::new(),
        }
    }

    #[test]
    fn recount_classifies_each_record() {
        let records = vec![
            tracked("a@x.io", "Replied"),
            tracked("b@x.io", "No Response"),
            tracked("c@x.io", "Bounced - hard bounce"),
            tracked("d@x.io", "bounced"),
            tracked("e@x.io", "Unknown"),
        ];
        let m = EngagementMetrics::recount(&records);
        assert_eq!(m, EngagementMetrics { total: 5, replied: 1, no_response: 1, bounced: 2 });
    }

    #[test]
    fn recount_of_nothing_is_zero() {
        assert_eq!(EngagementMetrics::recount(&[]), EngagementMetrics::default());
    }
}
