//! Total decoding of agent payloads.
//!
//! Nothing in a reply is trusted: every field is type-checked and replaced by
//! a default when absent or of the wrong type. None of these functions fail.

use serde_json::Value;

use leadflow_core::tracking::NO_RESPONSE_DATE;
use leadflow_core::{
    EmailDraft, EngagementMetrics, FollowUp, OutreachData, PersonalizationBrief, TrackedLead,
};

static NULL: Value = Value::Null;

/// Classification used when the tracker omits one.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// The stage result inside a reply's `response`: its `result` object when
/// present, else the response itself when it is an object, else nothing.
pub fn payload(response: Option<&Value>) -> &Value {
    match response {
        Some(r) => match r.get("result") {
            Some(inner) if inner.is_object() => inner,
            _ if r.is_object() => r,
            _ => &NULL,
        },
        None => &NULL,
    }
}

fn text(v: &Value, key: &str) -> String {
    text_or(v, key, "")
}

fn text_or(v: &Value, key: &str, default: &str) -> String {
    v.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn array<'a>(v: &'a Value, key: &str) -> &'a [Value] {
    v.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Non-negative whole number, accepting `2` and `2.0` alike.
fn count(v: &Value) -> Option<u32> {
    let n = v.as_u64().or_else(|| {
        v.as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    })?;
    u32::try_from(n).ok()
}

fn positive(v: Option<&Value>) -> Option<u32> {
    v.and_then(count).filter(|n| *n > 0)
}

pub fn coerce_brief(v: &Value) -> PersonalizationBrief {
    PersonalizationBrief {
        company_overview: text(v, "company_overview"),
        recent_news: text(v, "recent_news"),
        industry_trends: text(v, "industry_trends"),
        role_analysis: text(v, "role_analysis"),
        conversation_hooks: array(v, "conversation_hooks")
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        personalization_summary: text(v, "personalization_summary"),
    }
}

pub fn coerce_email(v: &Value) -> EmailDraft {
    EmailDraft {
        subject: text(v, "subject"),
        body: text(v, "body"),
    }
}

/// Every element yields a follow-up, so the count always matches the input.
/// Missing sequence numbers take the element's 1-based position; missing or
/// non-positive cadences become [`FollowUp::DEFAULT_SEND_AFTER_DAYS`].
/// The result is stably ordered by sequence number.
pub fn coerce_follow_ups(items: &[Value]) -> Vec<FollowUp> {
    let mut follow_ups: Vec<FollowUp> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| FollowUp {
            sequence_number: positive(item.get("sequence_number")).unwrap_or(idx as u32 + 1),
            subject: text(item, "subject"),
            body: text(item, "body"),
            send_after_days: positive(item.get("send_after_days"))
                .unwrap_or(FollowUp::DEFAULT_SEND_AFTER_DAYS),
        })
        .collect();
    follow_ups.sort_by_key(|f| f.sequence_number);
    follow_ups
}

/// Drafting stage: `{personalization_brief, initial_email, follow_ups[], outreach_summary}`.
pub fn coerce_outreach(payload: &Value) -> OutreachData {
    OutreachData {
        personalization_brief: coerce_brief(payload.get("personalization_brief").unwrap_or(&NULL)),
        initial_email: coerce_email(payload.get("initial_email").unwrap_or(&NULL)),
        follow_ups: coerce_follow_ups(array(payload, "follow_ups")),
        outreach_summary: text(payload, "outreach_summary"),
    }
}

/// Sending stage result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SendReceipt {
    /// `sent_email.recipient`, empty when absent.
    pub recipient: String,
    pub follow_up_drafts: usize,
    pub summary: String,
}

/// Sending stage: `{sent_email, follow_up_drafts[], summary}`.
pub fn coerce_send(payload: &Value) -> SendReceipt {
    SendReceipt {
        recipient: text(payload.get("sent_email").unwrap_or(&NULL), "recipient"),
        follow_up_drafts: array(payload, "follow_up_drafts").len(),
        summary: text(payload, "summary"),
    }
}

pub fn coerce_tracked(v: &Value) -> TrackedLead {
    TrackedLead {
        lead_name: text(v, "lead_name"),
        email: text(v, "email"),
        status: text_or(v, "status", UNKNOWN_STATUS),
        last_response_date: text_or(v, "last_response_date", NO_RESPONSE_DATE),
        response_summary: text(v, "response_summary"),
        recommended_action: text(v, "recommended_action"),
    }
}

/// Agent-supplied counts win field by field; anything missing is recounted
/// from the records.
pub fn coerce_metrics(summary: &Value, tracked: &[TrackedLead]) -> EngagementMetrics {
    let recount = EngagementMetrics::recount(tracked);
    let field = |key: &str, fallback: u32| summary.get(key).and_then(count).unwrap_or(fallback);
    EngagementMetrics {
        total: field("total_tracked", recount.total),
        replied: field("replied", recount.replied),
        no_response: field("no_response", recount.no_response),
        bounced: field("bounced", recount.bounced),
    }
}

/// Tracking stage result, before it is stamped and stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackingResult {
    pub tracked_leads: Vec<TrackedLead>,
    pub metrics: EngagementMetrics,
    pub overall_summary: String,
}

/// Tracking stage: `{tracked_leads[], engagement_summary{...}, overall_summary}`.
pub fn coerce_tracking(payload: &Value) -> TrackingResult {
    let tracked_leads: Vec<TrackedLead> = array(payload, "tracked_leads")
        .iter()
        .map(coerce_tracked)
        .collect();
    let metrics = coerce_metrics(
        payload.get("engagement_summary").unwrap_or(&NULL),
        &tracked_leads,
    );
    TrackingResult {
        tracked_leads,
        metrics,
        overall_summary: text(payload, "overall_summary"),
    }
}
