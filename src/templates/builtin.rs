//! Starter outreach sequence.

use super::{EmailTemplate, TemplateType};
use crate::models::LeadStatus;
use chrono::{DateTime, Utc};

struct Starter {
    id: &'static str,
    name: &'static str,
    subject: &'static str,
    body: &'static str,
    template_type: TemplateType,
    stage: &'static str,
    lead_status: Option<LeadStatus>,
}

const WELCOME_BODY: &str = "Hi {{first_name}},

Thank you for your interest in {{service_package}}. I'm excited to learn more about your goals: {{goals}}.

I'd love to schedule a brief 15-minute call to understand your needs better and see how we can help.

Are you available this week for a quick chat?

Best regards,
{{sender_name}}";

const FOLLOW_UP_BODY: &str = "Hi {{first_name}},

I just wanted to follow up on our last conversation. I hope you had a chance to think about {{service_package}} and how it might support your goals.

If you have any questions or need more information, I'm happy to help.

Looking forward to hearing from you!

Best regards,
{{sender_name}}";

const VALUE_SHARE_BODY: &str = "Hi {{first_name}},

I thought you'd be interested in how clients with similar goals got results with {{service_package}}.

I'd be happy to walk you through what that could look like for you.

Would you like to schedule a quick 15-minute call this week?

Best regards,
{{sender_name}}";

const DECISION_NUDGE_BODY: &str = "Hi {{first_name}},

I wanted to reconnect and see if you've had a chance to consider {{service_package}}.

I understand decision-making takes time, and I'm here to address any questions or concerns you might have.

Happy to jump on a quick call at your convenience.

Best regards,
{{sender_name}}";

const CHECK_IN_BODY: &str = "Hi {{first_name}},

I hope you're doing well! I wanted to check in and see how things are progressing.

Even if now isn't the right time, I'd love to stay connected and be a resource for you.

Best regards,
{{sender_name}}";

fn starters() -> Vec<Starter> {
    vec![
        Starter {
            id: "welcome",
            name: "Welcome Email",
            subject: "Welcome, {{first_name}}! Let's talk about your goals",
            body: WELCOME_BODY,
            template_type: TemplateType::Welcome,
            stage: "Day 1",
            lead_status: Some(LeadStatus::New),
        },
        Starter {
            id: "follow-up",
            name: "Follow-up Email",
            subject: "Just checking in: any questions?",
            body: FOLLOW_UP_BODY,
            template_type: TemplateType::FollowUp,
            stage: "Day 3",
            lead_status: Some(LeadStatus::Contacted),
        },
        Starter {
            id: "value-share",
            name: "Value Share Email",
            subject: "How others reached their goals with {{service_package}}",
            body: VALUE_SHARE_BODY,
            template_type: TemplateType::FollowUp,
            stage: "Day 7",
            lead_status: Some(LeadStatus::Interested),
        },
        Starter {
            id: "decision-nudge",
            name: "Decision Nudge",
            subject: "Moving forward with {{service_package}}?",
            body: DECISION_NUDGE_BODY,
            template_type: TemplateType::Promotional,
            stage: "Day 14",
            lead_status: None,
        },
        Starter {
            id: "check-in",
            name: "Long-term Check-in",
            subject: "Checking in: how are things going?",
            body: CHECK_IN_BODY,
            template_type: TemplateType::Reminder,
            stage: "Day 30+",
            lead_status: None,
        },
    ]
}

pub(super) fn templates(now: DateTime<Utc>) -> Vec<EmailTemplate> {
    starters()
        .into_iter()
        .map(|s| EmailTemplate {
            lead_status: s.lead_status,
            stage: Some(s.stage.to_string()),
            ..EmailTemplate::new(s.id, s.name, s.subject, s.body, s.template_type, now)
        })
        .collect()
}
