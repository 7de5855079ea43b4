//! Follow-up urgency classification.
//!
//! Compares a lead's next follow-up date against "today" at whole-day
//! granularity and builds the overdue / due-today / upcoming agenda.

use crate::error::Result;
use crate::models::{parse_calendar_date, Lead};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Urgency bucket of a follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Overdue,
    DueToday,
    Upcoming,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Overdue => write!(f, "Overdue"),
            Urgency::DueToday => write!(f, "Due Today"),
            Urgency::Upcoming => write!(f, "Upcoming"),
        }
    }
}

/// Classification of a single follow-up date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    /// Whole days from today until the follow-up; negative when past.
    pub days_until: i64,
    pub is_overdue: bool,
    pub is_due_today: bool,
}

impl FollowUp {
    pub fn urgency(&self) -> Urgency {
        if self.is_overdue {
            Urgency::Overdue
        } else if self.is_due_today {
            Urgency::DueToday
        } else {
            Urgency::Upcoming
        }
    }

    /// Short human-readable description, e.g. "In 5 days".
    pub fn label(&self) -> String {
        match self.days_until {
            0 => "Due today".to_string(),
            1 => "Tomorrow".to_string(),
            -1 => "1 day overdue".to_string(),
            d if d < 0 => format!("{} days overdue", -d),
            d => format!("In {} days", d),
        }
    }
}

/// Classify a follow-up date relative to `today`.
pub fn classify_follow_up_date(next_follow_up: NaiveDate, today: NaiveDate) -> FollowUp {
    let days_until = (next_follow_up - today).num_days();
    FollowUp {
        days_until,
        is_overdue: days_until < 0,
        is_due_today: days_until == 0,
    }
}

/// Classify a follow-up date given as text.
///
/// Any time of day in `next_follow_up` is ignored. Fails with
/// `InvalidDate` if the text is not a calendar date.
pub fn classify_follow_up(next_follow_up: &str, today: NaiveDate) -> Result<FollowUp> {
    let date = parse_calendar_date("next_follow_up", next_follow_up)?;
    Ok(classify_follow_up_date(date, today))
}

/// A lead with a scheduled follow-up and its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledFollowUp {
    pub lead_id: String,
    pub lead_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_rep: Option<String>,
    pub date: NaiveDate,
    pub follow_up: FollowUp,
}

/// Follow-ups grouped by urgency, each bucket ordered by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowUpAgenda {
    pub overdue: Vec<ScheduledFollowUp>,
    pub due_today: Vec<ScheduledFollowUp>,
    pub upcoming: Vec<ScheduledFollowUp>,
    /// Leads with no follow-up date.
    pub unscheduled: usize,
}

impl FollowUpAgenda {
    pub fn has_overdue(&self) -> bool {
        !self.overdue.is_empty()
    }

    pub fn scheduled_count(&self) -> usize {
        self.overdue.len() + self.due_today.len() + self.upcoming.len()
    }
}

/// Build the follow-up agenda for a set of leads.
pub fn follow_up_agenda(leads: &[Lead], today: NaiveDate) -> FollowUpAgenda {
    let mut agenda = FollowUpAgenda::default();

    for lead in leads {
        let Some(date) = lead.next_follow_up else {
            agenda.unscheduled += 1;
            continue;
        };

        let follow_up = classify_follow_up_date(date, today);
        let entry = ScheduledFollowUp {
            lead_id: lead.id.clone(),
            lead_name: lead.full_name(),
            assigned_rep: lead.assigned_rep.clone(),
            date,
            follow_up,
        };

        match follow_up.urgency() {
            Urgency::Overdue => agenda.overdue.push(entry),
            Urgency::DueToday => agenda.due_today.push(entry),
            Urgency::Upcoming => agenda.upcoming.push(entry),
        }
    }

    for bucket in [
        &mut agenda.overdue,
        &mut agenda.due_today,
        &mut agenda.upcoming,
    ] {
        bucket.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.lead_id.cmp(&b.lead_id)));
    }

    agenda
}
