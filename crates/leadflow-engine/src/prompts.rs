//! Natural-language instructions sent to the three agents.

use serde_json::{json, Value};

use leadflow_core::{EmailDraft, FollowUp, Lead};

pub fn draft_instruction(lead: &Lead) -> String {
    format!(
        "Generate personalized outreach for: Name: {}, Email: {}, Company: {}, Role: {}, Context: {}",
        lead.name, lead.email, lead.company, lead.role, lead.context
    )
}

pub fn send_instruction(recipient: &str, email: &EmailDraft, follow_ups: &[FollowUp]) -> String {
    let follow_ups: Value = follow_ups
        .iter()
        .map(|fu| {
            json!({
                "sequence_number": fu.sequence_number,
                "subject": fu.subject,
                "body": fu.body,
                "send_after_days": fu.send_after_days,
            })
        })
        .collect();
    format!(
        "Send this email to {recipient}. Subject: {}. Body: {}. Also create follow-up drafts: {follow_ups}",
        email.subject, email.body
    )
}

pub fn track_instruction(leads: &[Lead]) -> String {
    let targets: Value = leads
        .iter()
        .map(|l| json!({"name": l.name, "email": l.email}))
        .collect();
    format!("Check email responses and engagement status for these outreach leads: {targets}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::NewLead;

    fn lead(name: &str, email: &str) -> Lead {
        Lead::new(NewLead {
            name: name.into(),
            email: email.into(),
            company: "Nexus Health".into(),
            role: "CTO".into(),
            context: String::new(),
        })
    }

    #[test]
    fn draft_embeds_identity_fields() {
        let msg = draft_instruction(&lead("David Kim", "dkim@nexushealth.co"));
        assert_eq!(
            msg,
            "Generate personalized outreach for: Name: David Kim, Email: dkim@nexushealth.co, Company: Nexus Health, Role: CTO, Context: "
        );
    }

    #[test]
    fn send_embeds_follow_ups_as_json() {
        let email = EmailDraft {
            subject: "Hello".into(),
            body: "Hi David".into(),
        };
        let fus = vec![FollowUp {
            sequence_number: 1,
            subject: "Re: Hello".into(),
            body: "Checking in".into(),
            send_after_days: 3,
        }];
        let msg = send_instruction("dkim@nexushealth.co", &email, &fus);
        assert!(msg.starts_with("Send this email to dkim@nexushealth.co. Subject: Hello. Body: Hi David. Also create follow-up drafts: ["));
        let json_part = msg.split("follow-up drafts: ").nth(1).unwrap();
        let parsed: Value = serde_json::from_str(json_part).unwrap();
        assert_eq!(parsed[0]["send_after_days"], 3);
        assert_eq!(parsed[0]["subject"], "Re: Hello");
    }

    #[test]
    fn send_with_no_follow_ups() {
        let msg = send_instruction("a@x.io", &EmailDraft::default(), &[]);
        assert!(msg.ends_with("follow-up drafts: []"));
    }

    #[test]
    fn track_lists_name_email_pairs() {
        let msg = track_instruction(&[lead("A", "a@x.io"), lead("B", "b@x.io")]);
        let json_part = msg.split("leads: ").nth(1).unwrap();
        let parsed: Value = serde_json::from_str(json_part).unwrap();
        assert_eq!(parsed, json!([{"name": "A", "email": "a@x.io"}, {"name": "B", "email": "b@x.io"}]));
    }
}
