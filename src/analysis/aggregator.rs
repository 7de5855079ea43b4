//! Pipeline aggregation and statistics.
//!
//! This module computes the dashboard figures for a set of leads: totals,
//! qualified count, pipeline value, conversion rate and per-status
//! breakdowns.

use crate::config::PipelineConfig;
use crate::models::{Lead, LeadStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The status subsets that count as "qualified" and "converted".
///
/// Each deployment uses its own status vocabulary, so these come from
/// configuration rather than being fixed to one enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSets {
    pub qualified: Vec<LeadStatus>,
    pub converted: Vec<LeadStatus>,
}

impl Default for StatusSets {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for StatusSets {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            qualified: config
                .qualified_statuses
                .iter()
                .map(|s| LeadStatus::from(s.as_str()))
                .collect(),
            converted: config
                .converted_statuses
                .iter()
                .map(|s| LeadStatus::from(s.as_str()))
                .collect(),
        }
    }
}

impl StatusSets {
    pub fn is_qualified(&self, status: &LeadStatus) -> bool {
        self.qualified.contains(status)
    }

    pub fn is_converted(&self, status: &LeadStatus) -> bool {
        self.converted.contains(status)
    }
}

/// Summary statistics for a lead pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Number of leads.
    pub total_leads: usize,
    /// Leads whose status is in the qualified set.
    pub qualified_leads: usize,
    /// Sum of lead values.
    pub total_value: f64,
    /// Converted leads as a rounded percentage of all leads.
    pub conversion_rate: u32,
    /// Lead count per status label.
    pub by_status: BTreeMap<String, usize>,
    /// Pipeline value per status label.
    pub value_by_status: BTreeMap<String, f64>,
}

/// Compute summary statistics for a set of leads.
///
/// Order of the input does not matter and the leads are not modified.
pub fn compute_stats(leads: &[Lead], sets: &StatusSets) -> PipelineStats {
    let mut stats = PipelineStats {
        total_leads: leads.len(),
        ..Default::default()
    };
    let mut converted = 0usize;

    for lead in leads {
        if sets.is_qualified(&lead.status) {
            stats.qualified_leads += 1;
        }
        if sets.is_converted(&lead.status) {
            converted += 1;
        }
        stats.total_value += lead.value;

        let label = lead.status.to_string();
        *stats.by_status.entry(label.clone()).or_insert(0) += 1;
        *stats.value_by_status.entry(label).or_insert(0.0) += lead.value;
    }

    stats.conversion_rate = conversion_rate(converted, leads.len());
    stats
}

/// Percentage of `converted` out of `total`, rounded. Zero when `total` is zero.
pub fn conversion_rate(converted: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((converted as f64 / total as f64) * 100.0).round() as u32
}

/// Sum of values across leads.
pub fn pipeline_value(leads: &[Lead]) -> f64 {
    leads.iter().map(|l| l.value).sum()
}

/// The `n` most recently captured leads, newest first.
///
/// Leads without a capture date sort after dated ones, keeping input order.
pub fn recent_leads(leads: &[Lead], n: usize) -> Vec<&Lead> {
    let mut sorted: Vec<&Lead> = leads.iter().collect();
    sorted.sort_by_key(|l| std::cmp::Reverse(l.date_captured));
    sorted.truncate(n);
    sorted
}

/// The `n` highest-value leads.
pub fn top_leads_by_value(leads: &[Lead], n: usize) -> Vec<&Lead> {
    let mut sorted: Vec<&Lead> = leads.iter().collect();
    sorted.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
    sorted.truncate(n);
    sorted
}

/// Generate a text summary of pipeline statistics.
pub fn generate_summary_text(stats: &PipelineStats) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Total Leads: {}", stats.total_leads));
    lines.push(format!("Qualified Leads: {}", stats.qualified_leads));
    lines.push(format!("Pipeline Value: {:.2}", stats.total_value));
    lines.push(format!("Conversion Rate: {}%", stats.conversion_rate));

    if !stats.by_status.is_empty() {
        lines.push(String::new());
        lines.push("By Status:".to_string());

        let mut statuses: Vec<_> = stats.by_status.iter().collect();
        statuses.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

        for (status, count) in statuses {
            lines.push(format!("- {}: {}", status, count));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn create_test_lead(id: &str, status: LeadStatus, value: f64) -> Lead {
        Lead::new(id, "Test", "test@example.com", status, value)
    }

    fn sets(qualified: &[LeadStatus], converted: &[LeadStatus]) -> StatusSets {
        StatusSets {
            qualified: qualified.to_vec(),
            converted: converted.to_vec(),
        }
    }

    #[test]
    fn test_empty_pipeline() {
        let stats = compute_stats(&[], &StatusSets::default());
        assert_eq!(stats.total_leads, 0);
        assert_eq!(stats.qualified_leads, 0);
        assert_eq!(stats.total_value, 0.0);
        assert_eq!(stats.conversion_rate, 0);
        assert!(stats.by_status.is_empty());
    }

    #[test]
    fn test_qualified_and_total_value() {
        let leads = vec![
            create_test_lead("1", LeadStatus::Interested, 1800.0),
            create_test_lead("2", LeadStatus::Contacted, 3500.0),
        ];

        let stats = compute_stats(&leads, &sets(&[LeadStatus::Interested], &[]));

        assert_eq!(stats.total_leads, 2);
        assert_eq!(stats.qualified_leads, 1);
        assert_eq!(stats.total_value, 5300.0);
        assert_eq!(stats.conversion_rate, 0);
    }

    #[test]
    fn test_conversion_rate_rounds() {
        let leads = vec![
            create_test_lead("1", LeadStatus::Enrolled, 100.0),
            create_test_lead("2", LeadStatus::New, 0.0),
            create_test_lead("3", LeadStatus::Contacted, 0.0),
        ];

        let stats = compute_stats(&leads, &sets(&[], &[LeadStatus::Enrolled]));
        assert_eq!(stats.conversion_rate, 33);

        assert_eq!(conversion_rate(2, 3), 67);
        assert_eq!(conversion_rate(1, 8), 13);
        assert_eq!(conversion_rate(0, 0), 0);
        assert_eq!(conversion_rate(4, 4), 100);
    }

    #[test]
    fn test_status_sets_are_configurable() {
        let leads = vec![
            create_test_lead("1", LeadStatus::Qualified, 10.0),
            create_test_lead("2", LeadStatus::Converted, 20.0),
            create_test_lead("3", LeadStatus::Hot, 30.0),
        ];

        let temperature = sets(&[LeadStatus::Hot], &[]);
        assert_eq!(compute_stats(&leads, &temperature).qualified_leads, 1);

        let funnel = sets(&[LeadStatus::Qualified], &[LeadStatus::Converted]);
        let stats = compute_stats(&leads, &funnel);
        assert_eq!(stats.qualified_leads, 1);
        assert_eq!(stats.conversion_rate, 33);
    }

    #[test]
    fn test_status_sets_from_config() {
        let config = PipelineConfig {
            qualified_statuses: vec!["interested".to_string(), "Booked Consultation".to_string()],
            converted_statuses: vec!["Enrolled".to_string()],
            ..Default::default()
        };
        let sets = StatusSets::from(&config);

        assert!(sets.is_qualified(&LeadStatus::Interested));
        assert!(sets.is_qualified(&LeadStatus::BookedConsultation));
        assert!(!sets.is_qualified(&LeadStatus::Enrolled));
        assert!(sets.is_converted(&LeadStatus::Enrolled));
    }

    #[test]
    fn test_custom_converted_status_ignores_case() {
        let config = PipelineConfig {
            converted_statuses: vec!["won".to_string()],
            ..Default::default()
        };
        let leads = vec![create_test_lead("1", LeadStatus::from("Won"), 500.0)];

        let stats = compute_stats(&leads, &StatusSets::from(&config));
        assert_eq!(stats.conversion_rate, 100);
    }

    #[test]
    fn test_by_status_breakdown() {
        let leads = vec![
            create_test_lead("1", LeadStatus::New, 100.0),
            create_test_lead("2", LeadStatus::New, 250.0),
            create_test_lead("3", LeadStatus::NotInterested, 50.0),
        ];

        let stats = compute_stats(&leads, &StatusSets::default());

        assert_eq!(stats.by_status.get("New"), Some(&2));
        assert_eq!(stats.by_status.get("Not Interested"), Some(&1));
        assert_eq!(stats.value_by_status.get("New"), Some(&350.0));
    }

    #[test]
    fn test_compute_stats_is_idempotent() {
        let leads = vec![
            create_test_lead("1", LeadStatus::Interested, 1800.0),
            create_test_lead("2", LeadStatus::Enrolled, 3500.0),
            create_test_lead("3", LeadStatus::New, 5000.0),
        ];
        let snapshot = leads.clone();
        let sets = StatusSets::default();

        let first = compute_stats(&leads, &sets);
        let second = compute_stats(&leads, &sets);

        assert_eq!(first, second);
        assert_eq!(leads, snapshot);
        assert_eq!(first.total_leads, leads.len());
        assert_eq!(first.total_value, pipeline_value(&leads));
    }

    #[test]
    fn test_recent_and_top_leads() {
        let mut older = create_test_lead("old", LeadStatus::New, 5000.0);
        older.date_captured = NaiveDate::from_ymd_opt(2024, 1, 5);
        let mut newer = create_test_lead("new", LeadStatus::New, 1800.0);
        newer.date_captured = NaiveDate::from_ymd_opt(2024, 1, 15);
        let undated = create_test_lead("undated", LeadStatus::New, 3500.0);
        let leads = vec![older, undated, newer];

        let recent: Vec<_> = recent_leads(&leads, 2).iter().map(|l| l.id.as_str()).collect();
        assert_eq!(recent, vec!["new", "old"]);

        let top: Vec<_> = top_leads_by_value(&leads, 2).iter().map(|l| l.id.as_str()).collect();
        assert_eq!(top, vec!["old", "undated"]);
    }

    #[test]
    fn test_generate_summary_text() {
        let leads = vec![
            create_test_lead("1", LeadStatus::Interested, 1800.0),
            create_test_lead("2", LeadStatus::Contacted, 3500.0),
        ];
        let stats = compute_stats(&leads, &StatusSets::default());
        let text = generate_summary_text(&stats);

        assert!(text.contains("Total Leads: 2"));
        assert!(text.contains("Pipeline Value: 5300.00"));
        assert!(text.contains("- Interested: 1"));
    }
}
