//! Data models for the lead pipeline.
//!
//! This module contains the canonical lead record, its status union and
//! the raw input shape that leads are validated from.

use crate::analysis::{classify_follow_up_date, FollowUp, FollowUpAgenda, PipelineStats};
use crate::error::{PipelineError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::warn;

/// Lifecycle status of a lead.
///
/// Covers every status vocabulary used by the lead forms (the
/// wellness-studio pipeline, the qualified/converted pipeline and the
/// hot/warm/cold temperature scale). Labels outside these are kept verbatim
/// in [`LeadStatus::Other`].
///
/// Custom labels compare case-insensitively, so `Won` and `won` are the
/// same status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Interested,
    Qualified,
    NotInterested,
    BookedConsultation,
    Enrolled,
    Converted,
    Hot,
    Warm,
    Cold,
    Other(String),
}

impl PartialEq for LeadStatus {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LeadStatus::Other(a), LeadStatus::Other(b)) => a.to_lowercase() == b.to_lowercase(),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl Eq for LeadStatus {}

impl Hash for LeadStatus {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        if let LeadStatus::Other(label) = self {
            label.to_lowercase().hash(state);
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadStatus::New => write!(f, "New"),
            LeadStatus::Contacted => write!(f, "Contacted"),
            LeadStatus::Interested => write!(f, "Interested"),
            LeadStatus::Qualified => write!(f, "Qualified"),
            LeadStatus::NotInterested => write!(f, "Not Interested"),
            LeadStatus::BookedConsultation => write!(f, "Booked Consultation"),
            LeadStatus::Enrolled => write!(f, "Enrolled"),
            LeadStatus::Converted => write!(f, "Converted"),
            LeadStatus::Hot => write!(f, "Hot"),
            LeadStatus::Warm => write!(f, "Warm"),
            LeadStatus::Cold => write!(f, "Cold"),
            LeadStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for LeadStatus {
    fn from(s: &str) -> Self {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "new" => LeadStatus::New,
            "contacted" => LeadStatus::Contacted,
            "interested" => LeadStatus::Interested,
            "qualified" => LeadStatus::Qualified,
            "not interested" => LeadStatus::NotInterested,
            "booked consultation" => LeadStatus::BookedConsultation,
            "enrolled" => LeadStatus::Enrolled,
            "converted" => LeadStatus::Converted,
            "hot" => LeadStatus::Hot,
            "warm" => LeadStatus::Warm,
            "cold" => LeadStatus::Cold,
            _ => LeadStatus::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for LeadStatus {
    fn from(s: String) -> Self {
        LeadStatus::from(s.as_str())
    }
}

impl From<LeadStatus> for String {
    fn from(status: LeadStatus) -> Self {
        status.to_string()
    }
}

/// How to treat monetary values that are negative or not numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuePolicy {
    /// Reject the record with [`PipelineError::InvalidValue`].
    #[default]
    Reject,
    /// Log a warning and count the value as zero.
    DefaultToZero,
}

/// A monetary value as it appears in input files: a JSON number or a
/// string typed into a form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

/// A lead exactly as deserialized from input, before validation.
///
/// Accepts both the snake_case keys used by this tool and the camelCase
/// keys exported by the web forms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: String,
    #[serde(alias = "firstName", alias = "name")]
    pub first_name: String,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, alias = "leadStatus")]
    pub status: Option<String>,
    #[serde(default)]
    pub value: Option<RawValue>,
    #[serde(default, alias = "dateCaptured")]
    pub date_captured: Option<String>,
    #[serde(default, alias = "nextFollowUp")]
    pub next_follow_up: Option<String>,
    #[serde(default, alias = "leadSource")]
    pub source: Option<String>,
    #[serde(default, alias = "assignedSalesRep")]
    pub assigned_rep: Option<String>,
    #[serde(default, alias = "primaryGoals", alias = "wellnessGoals")]
    pub goals: Option<String>,
    #[serde(default, alias = "notesFromLastConversation")]
    pub notes: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default, alias = "preferredContactMethod")]
    pub preferred_contact_method: Option<String>,
    #[serde(default, alias = "servicePackageDiscussed")]
    pub service_package: Option<String>,
    #[serde(default, alias = "budgetRange")]
    pub budget_range: Option<String>,
    #[serde(default, alias = "leadScore")]
    pub lead_score: Option<u8>,
}

/// A validated lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Caller-assigned identifier, unique within a store.
    pub id: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub status: LeadStatus,
    /// Potential deal revenue, never negative.
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_captured: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_follow_up: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_rep: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_contact_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_score: Option<u8>,
}

impl Lead {
    /// Creates a lead with only the required fields set.
    pub fn new(id: &str, first_name: &str, email: &str, status: LeadStatus, value: f64) -> Self {
        Self {
            id: id.to_string(),
            first_name: first_name.to_string(),
            last_name: None,
            email: email.to_string(),
            phone: None,
            status,
            value,
            date_captured: None,
            next_follow_up: None,
            source: None,
            assigned_rep: None,
            goals: None,
            notes: None,
            company: None,
            preferred_contact_method: None,
            service_package: None,
            budget_range: None,
            lead_score: None,
        }
    }

    /// Validate a raw record into a lead.
    ///
    /// Errors are wrapped in [`PipelineError::InvalidRecord`] carrying the
    /// record id.
    pub fn from_record(record: LeadRecord, policy: ValuePolicy) -> Result<Self> {
        let id = record.id.clone();
        Self::validate(record, policy).map_err(|e| e.in_record(&id))
    }

    fn validate(record: LeadRecord, policy: ValuePolicy) -> Result<Self> {
        if record.first_name.trim().is_empty() {
            return Err(PipelineError::missing_field("first_name"));
        }
        if record.email.trim().is_empty() {
            return Err(PipelineError::missing_field("email"));
        }

        let value = parse_value(record.value.as_ref(), policy)?;
        let date_captured = parse_optional_date("date_captured", record.date_captured.as_deref())?;
        let next_follow_up =
            parse_optional_date("next_follow_up", record.next_follow_up.as_deref())?;

        Ok(Self {
            id: record.id,
            first_name: record.first_name,
            last_name: non_empty(record.last_name),
            email: record.email,
            phone: non_empty(record.phone),
            status: record
                .status
                .as_deref()
                .map(LeadStatus::from)
                .unwrap_or_default(),
            value,
            date_captured,
            next_follow_up,
            source: non_empty(record.source),
            assigned_rep: non_empty(record.assigned_rep),
            goals: non_empty(record.goals),
            notes: non_empty(record.notes),
            company: non_empty(record.company),
            preferred_contact_method: non_empty(record.preferred_contact_method),
            service_package: non_empty(record.service_package),
            budget_range: non_empty(record.budget_range),
            lead_score: record.lead_score,
        })
    }

    /// Returns "First Last", or just the first name.
    pub fn full_name(&self) -> String {
        match self.last_name.as_deref() {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }

    /// Text that table searches match against.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.full_name(),
            self.email,
            self.source.as_deref().unwrap_or(""),
            self.status
        )
    }
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

/// Produce a timestamp-derived lead id such as `LEAD-1705123456789`.
pub fn generate_lead_id(now: DateTime<Utc>) -> String {
    format!("LEAD-{}", now.timestamp_millis())
}

/// Metadata about a pipeline report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Where the leads were loaded from.
    pub source: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// The day follow-ups were classified against.
    pub today: NaiveDate,
    /// Search term the lead list was filtered with, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Number of leads in the store.
    pub total_in_store: usize,
    /// Number of leads included in the report.
    pub leads_included: usize,
    /// Currency label for amounts.
    pub currency: String,
}

/// One row of the lead table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRow {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub status: LeadStatus,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_rep: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_captured: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_follow_up: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<FollowUp>,
}

impl LeadRow {
    pub fn from_lead(lead: &Lead, today: NaiveDate) -> Self {
        Self {
            id: lead.id.clone(),
            name: lead.full_name(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            status: lead.status.clone(),
            value: lead.value,
            source: lead.source.clone(),
            assigned_rep: lead.assigned_rep.clone(),
            date_captured: lead.date_captured,
            next_follow_up: lead.next_follow_up,
            follow_up: lead
                .next_follow_up
                .map(|date| classify_follow_up_date(date, today)),
        }
    }
}

/// Templates suggested for leads in one status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSuggestion {
    pub status: String,
    pub templates: Vec<String>,
}

/// The complete pipeline report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Metadata about the report.
    pub metadata: ReportMetadata,
    /// Summary statistics.
    pub stats: PipelineStats,
    /// Follow-ups grouped by urgency.
    pub agenda: FollowUpAgenda,
    /// Most recently captured leads.
    pub recent_leads: Vec<LeadRow>,
    /// Every included lead.
    pub leads: Vec<LeadRow>,
    /// Outreach templates applicable to each status present.
    pub suggested_templates: Vec<TemplateSuggestion>,
}

/// Format a monetary amount with thousands separators, e.g. `5,300` or
/// `2,500.50`. Whole amounts are shown without decimals.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (digits, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0.0 && fixed != "0.00" {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if cents == "00" {
        grouped
    } else {
        format!("{}.{}", grouped, cents)
    }
}

/// Parse a calendar date, discarding any time of day.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_calendar_date(field: &str, raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }

    Err(PipelineError::invalid_date(field, raw))
}

fn parse_optional_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>> {
    match raw {
        Some(s) if !s.trim().is_empty() => parse_calendar_date(field, s).map(Some),
        _ => Ok(None),
    }
}

/// Validate a monetary value. Missing or blank values count as zero.
pub fn parse_value(raw: Option<&RawValue>, policy: ValuePolicy) -> Result<f64> {
    let parsed = match raw {
        None => return Ok(0.0),
        Some(RawValue::Number(n)) => Some(*n),
        Some(RawValue::Text(s)) if s.trim().is_empty() => return Ok(0.0),
        Some(RawValue::Text(s)) => s.trim().parse::<f64>().ok(),
    };

    match parsed {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => {
            let shown = match raw {
                Some(RawValue::Number(n)) => n.to_string(),
                Some(RawValue::Text(s)) => s.clone(),
                None => String::new(),
            };
            match policy {
                ValuePolicy::Reject => Err(PipelineError::invalid_value(shown)),
                ValuePolicy::DefaultToZero => {
                    warn!("Invalid lead value '{}', counting as 0", shown);
                    Ok(0.0)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> LeadRecord {
        LeadRecord {
            id: id.to_string(),
            first_name: "Sarah".to_string(),
            last_name: Some("Johnson".to_string()),
            email: "sarah@wellness.com".to_string(),
            status: Some("Interested".to_string()),
            value: Some(RawValue::Number(1800.0)),
            date_captured: Some("2024-01-15".to_string()),
            next_follow_up: Some("2024-01-18".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(LeadStatus::from("interested"), LeadStatus::Interested);
        assert_eq!(LeadStatus::from("Not Interested"), LeadStatus::NotInterested);
        assert_eq!(LeadStatus::from("not_interested"), LeadStatus::NotInterested);
        assert_eq!(
            LeadStatus::from("booked-consultation"),
            LeadStatus::BookedConsultation
        );
        assert_eq!(LeadStatus::from("HOT"), LeadStatus::Hot);
        assert_eq!(
            LeadStatus::from(" Waitlisted "),
            LeadStatus::Other("Waitlisted".to_string())
        );
    }

    #[test]
    fn test_custom_status_ignores_case() {
        assert_eq!(LeadStatus::from("Won"), LeadStatus::from("won"));
        assert_ne!(LeadStatus::from("Won"), LeadStatus::from("Lost"));
        assert_ne!(LeadStatus::from("Won"), LeadStatus::New);
        assert_eq!(LeadStatus::from("Won").to_string(), "Won");

        let set: std::collections::HashSet<_> =
            ["Won", "WON", "won"].into_iter().map(LeadStatus::from).collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_status_serde_uses_display_label() {
        let json = serde_json::to_string(&LeadStatus::BookedConsultation).unwrap();
        assert_eq!(json, "\"Booked Consultation\"");

        let status: LeadStatus = serde_json::from_str("\"enrolled\"").unwrap();
        assert_eq!(status, LeadStatus::Enrolled);
    }

    #[test]
    fn test_lead_from_record() {
        let lead = Lead::from_record(record("LEAD-1"), ValuePolicy::Reject).unwrap();
        assert_eq!(lead.full_name(), "Sarah Johnson");
        assert_eq!(lead.status, LeadStatus::Interested);
        assert_eq!(lead.value, 1800.0);
        assert_eq!(
            lead.next_follow_up,
            Some(NaiveDate::from_ymd_opt(2024, 1, 18).unwrap())
        );
    }

    #[test]
    fn test_camel_case_record() {
        let json = r#"{
            "id": "LEAD-1705123456790",
            "firstName": "Mike",
            "lastName": "Chen",
            "email": "mike@health.io",
            "leadStatus": "Contacted",
            "leadSource": "Website",
            "nextFollowUp": "2024-01-20",
            "leadScore": 7,
            "value": 3500
        }"#;
        let record: LeadRecord = serde_json::from_str(json).unwrap();
        let lead = Lead::from_record(record, ValuePolicy::Reject).unwrap();

        assert_eq!(lead.full_name(), "Mike Chen");
        assert_eq!(lead.source.as_deref(), Some("Website"));
        assert_eq!(lead.lead_score, Some(7));
        assert_eq!(lead.value, 3500.0);
    }

    #[test]
    fn test_missing_status_defaults_to_new() {
        let mut rec = record("LEAD-1");
        rec.status = None;
        let lead = Lead::from_record(rec, ValuePolicy::Reject).unwrap();
        assert_eq!(lead.status, LeadStatus::New);
    }

    #[test]
    fn test_invalid_follow_up_date_rejected() {
        let mut rec = record("LEAD-9");
        rec.next_follow_up = Some("next tuesday".to_string());

        let err = Lead::from_record(rec, ValuePolicy::Reject).unwrap_err();
        match err {
            PipelineError::InvalidRecord { id, source } => {
                assert_eq!(id, "LEAD-9");
                assert!(matches!(*source, PipelineError::InvalidDate { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_blank_name_or_email_rejected() {
        let json = r#"{"id": "L1", "first_name": "", "email": ""}"#;
        let rec: LeadRecord = serde_json::from_str(json).unwrap();
        let err = Lead::from_record(rec, ValuePolicy::Reject).unwrap_err();
        match err {
            PipelineError::InvalidRecord { id, source } => {
                assert_eq!(id, "L1");
                assert!(
                    matches!(*source, PipelineError::MissingField { ref field } if field == "first_name")
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let json = r#"{"id": "L2", "name": "Tom Baker"}"#;
        let rec: LeadRecord = serde_json::from_str(json).unwrap();
        let err = Lead::from_record(rec, ValuePolicy::Reject).unwrap_err();
        assert!(err.to_string().contains("Missing required field: email"));

        let mut rec = record("L3");
        rec.email = "   ".to_string();
        assert!(Lead::from_record(rec, ValuePolicy::Reject).is_err());
    }

    #[test]
    fn test_blank_dates_are_absent() {
        let mut rec = record("LEAD-1");
        rec.date_captured = Some("".to_string());
        rec.next_follow_up = None;
        let lead = Lead::from_record(rec, ValuePolicy::Reject).unwrap();
        assert!(lead.date_captured.is_none());
        assert!(lead.next_follow_up.is_none());
    }

    #[test]
    fn test_parse_calendar_date_strips_time() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_calendar_date("d", "2024-01-15").unwrap(), expected);
        assert_eq!(
            parse_calendar_date("d", "2024-01-15T23:59:00Z").unwrap(),
            expected
        );
        assert_eq!(
            parse_calendar_date("d", "2024-01-15T08:30:00").unwrap(),
            expected
        );
        assert!(parse_calendar_date("d", "2024-13-40").is_err());
    }

    #[test]
    fn test_parse_value() {
        let text = |s: &str| RawValue::Text(s.to_string());

        assert_eq!(parse_value(None, ValuePolicy::Reject).unwrap(), 0.0);
        assert_eq!(parse_value(Some(&text("  ")), ValuePolicy::Reject).unwrap(), 0.0);
        assert_eq!(parse_value(Some(&text("2500.5")), ValuePolicy::Reject).unwrap(), 2500.5);

        assert!(parse_value(Some(&text("lots")), ValuePolicy::Reject).is_err());
        assert!(parse_value(Some(&RawValue::Number(-1.0)), ValuePolicy::Reject).is_err());

        assert_eq!(
            parse_value(Some(&text("lots")), ValuePolicy::DefaultToZero).unwrap(),
            0.0
        );
        assert_eq!(
            parse_value(Some(&RawValue::Number(-1.0)), ValuePolicy::DefaultToZero).unwrap(),
            0.0
        );
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(950.0), "950");
        assert_eq!(format_amount(5300.0), "5,300");
        assert_eq!(format_amount(1234567.0), "1,234,567");
        assert_eq!(format_amount(2500.5), "2,500.50");
        assert_eq!(format_amount(-1500.0), "-1,500");
        assert_eq!(format_amount(1e20), "100,000,000,000,000,000,000");
    }

    #[test]
    fn test_generate_lead_id() {
        let now = DateTime::from_timestamp_millis(1_705_123_456_789).unwrap();
        assert_eq!(generate_lead_id(now), "LEAD-1705123456789");
    }

    #[test]
    fn test_search_text() {
        let mut lead = Lead::new("1", "Emma", "emma@spa.biz", LeadStatus::New, 5000.0);
        lead.last_name = Some("Davis".to_string());
        lead.source = Some("Referral".to_string());
        assert_eq!(lead.search_text(), "Emma Davis emma@spa.biz Referral New");
    }
}
