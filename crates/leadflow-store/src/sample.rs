//! Demo records for exploring the dashboard without a live agent service.

use chrono::{DateTime, TimeZone, Utc};

use leadflow_core::{
    EmailDraft, EngagementMetrics, FollowUp, Lead, LeadId, LeadStatus, OutreachData,
    PersonalizationBrief, TrackedLead, TrackingReport,
};

use crate::leads::LeadStore;

pub const SAMPLE_OVERALL_SUMMARY: &str = "Out of 2 tracked leads, 1 has replied with interest in a demo. 1 lead has not responded and may need a different approach.";

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .unwrap_or_default()
}

struct SampleLead {
    id: &'static str,
    name: &'static str,
    email: &'static str,
    company: &'static str,
    role: &'static str,
    context: &'static str,
    status: LeadStatus,
    last_activity: DateTime<Utc>,
}

impl SampleLead {
    fn build(self, outreach_data: Option<OutreachData>) -> Lead {
        Lead {
            id: LeadId::from_raw(self.id),
            name: self.name.into(),
            email: self.email.into(),
            company: self.company.into(),
            role: self.role.into(),
            context: self.context.into(),
            status: self.status,
            last_activity: self.last_activity,
            outreach_data,
        }
    }
}

fn sarah_outreach() -> OutreachData {
    OutreachData {
        personalization_brief: PersonalizationBrief {
            company_overview: "TechCorp Solutions is a mid-market SaaS company specializing in enterprise resource planning with 200+ employees and $45M ARR.".into(),
            recent_news: "Recently announced Series C funding of $30M and expansion into the European market.".into(),
            industry_trends: "Cloud migration and AI-driven automation are top priorities for ERP companies in 2025.".into(),
            role_analysis: "As VP of Engineering, Sarah oversees a team of 50+ engineers and drives technical strategy and architecture decisions.".into(),
            conversation_hooks: vec![
                "Cloud migration challenges discussed at SaaS Connect".into(),
                "Series C funding and scaling engineering team".into(),
                "AI integration into ERP workflows".into(),
            ],
            personalization_summary: "Sarah is a technically savvy leader focused on scaling her engineering organization while modernizing their cloud infrastructure.".into(),
        },
        initial_email: EmailDraft {
            subject: "Following up from SaaS Connect - Cloud Migration Insights".into(),
            body: "Hi Sarah,\n\nIt was great connecting with you at SaaS Connect last week. Our conversation about the challenges of migrating legacy ERP systems to cloud-native architectures really resonated with me.\n\nCongratulations on the Series C! As you scale your engineering team, I wanted to share some insights on how other ERP companies have successfully navigated cloud migration while maintaining uptime.\n\nWould you be open to a 20-minute call next week to explore how we might help TechCorp accelerate your cloud journey?\n\nBest regards".into(),
        },
        follow_ups: vec![
            FollowUp {
                sequence_number: 1,
                subject: "Re: Cloud Migration Insights for TechCorp".into(),
                body: "Hi Sarah,\n\nI wanted to follow up on my previous email. I recently published a case study on how a similar ERP company reduced their migration timeline by 40% - thought it might be relevant to your team.\n\nWould love to share it with you over a quick call.\n\nBest regards".into(),
                send_after_days: 3,
            },
            FollowUp {
                sequence_number: 2,
                subject: "Quick question about your cloud roadmap".into(),
                body: "Hi Sarah,\n\nI know you must be incredibly busy with the expansion, so I will keep this brief. Are you still exploring cloud migration solutions for Q2?\n\nEven a 15-minute conversation could be valuable - happy to work around your schedule.\n\nBest regards".into(),
                send_after_days: 7,
            },
        ],
        outreach_summary: "Personalized outreach leveraging SaaS Connect meeting context and Series C funding announcement.".into(),
    }
}

pub fn sample_leads() -> Vec<Lead> {
    vec![
        SampleLead {
            id: "sample-1",
            name: "Sarah Chen",
            email: "sarah.chen@techcorp.io",
            company: "TechCorp Solutions",
            role: "VP of Engineering",
            context: "Met at SaaS Connect conference, discussed cloud migration challenges",
            status: LeadStatus::DraftReady,
            last_activity: at(2025, 1, 15, 10, 30),
        }
        .build(Some(sarah_outreach())),
        SampleLead {
            id: "sample-2",
            name: "Marcus Williams",
            email: "marcus.w@innovatelabs.com",
            company: "InnovateLabs",
            role: "Head of Product",
            context: "LinkedIn connection, interested in AI-powered analytics",
            status: LeadStatus::OutreachSent,
            last_activity: at(2025, 1, 12, 14, 15),
        }
        .build(None),
        SampleLead {
            id: "sample-3",
            name: "Emily Rodriguez",
            email: "erodriguez@globalfinance.com",
            company: "Global Finance Group",
            role: "Chief Digital Officer",
            context: "Referral from James Park, looking to modernize data pipeline",
            status: LeadStatus::Replied,
            last_activity: at(2025, 1, 14, 9, 0),
        }
        .build(None),
        SampleLead {
            id: "sample-4",
            name: "David Kim",
            email: "dkim@nexushealth.co",
            company: "Nexus Health",
            role: "CTO",
            context: "Webinar attendee on healthcare data compliance",
            status: LeadStatus::New,
            last_activity: at(2025, 1, 10, 16, 45),
        }
        .build(None),
        SampleLead {
            id: "sample-5",
            name: "Aisha Patel",
            email: "aisha.p@scaledynamics.io",
            company: "Scale Dynamics",
            role: "Director of Operations",
            context: "Cold outreach, company expanding rapidly",
            status: LeadStatus::NoResponse,
            last_activity: at(2025, 1, 8, 11, 20),
        }
        .build(None),
    ]
}

pub fn sample_report() -> TrackingReport {
    TrackingReport {
        tracked_leads: vec![
            TrackedLead {
                lead_name: "Marcus Williams".into(),
                email: "marcus.w@innovatelabs.com".into(),
                status: "No Response".into(),
                last_response_date: "N/A".into(),
                response_summary: "No reply received to initial outreach or follow-up emails.".into(),
                recommended_action: "Send a final follow-up with a different value proposition angle.".into(),
            },
            TrackedLead {
                lead_name: "Emily Rodriguez".into(),
                email: "erodriguez@globalfinance.com".into(),
                status: "Replied".into(),
                last_response_date: "2025-01-14".into(),
                response_summary: "Emily expressed interest in a demo call and asked about compliance features.".into(),
                recommended_action: "Schedule a product demo focusing on compliance and data governance features.".into(),
            },
        ],
        metrics: EngagementMetrics {
            total: 2,
            replied: 1,
            no_response: 1,
            bounced: 0,
        },
        overall_summary: SAMPLE_OVERALL_SUMMARY.into(),
        checked_at: None,
    }
}

impl LeadStore {
    /// A store seeded with the demo leads and tracking report.
    pub fn with_sample_data() -> Self {
        Self::with_snapshot(sample_leads(), sample_report())
    }
}
