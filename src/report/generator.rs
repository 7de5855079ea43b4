//! Pipeline report generation.
//!
//! This module assembles a [`PipelineReport`] from a set of leads and
//! renders it as Markdown or JSON.

use crate::analysis::{
    compute_stats, follow_up_agenda, recent_leads, PipelineStats, ScheduledFollowUp, StatusSets,
};
use crate::config::ReportConfig;
use crate::models::{
    format_amount, Lead, LeadRow, LeadStatus, PipelineReport, ReportMetadata, TemplateSuggestion,
};
use crate::templates::TemplateLibrary;
use anyhow::Result;

/// Assemble the report for `leads`.
///
/// `metadata.today` is the day follow-ups are classified against.
pub fn build_report(
    leads: &[Lead],
    sets: &StatusSets,
    templates: &TemplateLibrary,
    metadata: ReportMetadata,
    config: &ReportConfig,
) -> PipelineReport {
    let today = metadata.today;
    let stats = compute_stats(leads, sets);
    let agenda = follow_up_agenda(leads, today);

    let recent = recent_leads(leads, config.recent_leads)
        .into_iter()
        .map(|l| LeadRow::from_lead(l, today))
        .collect();

    let rows = if config.include_lead_table {
        leads.iter().map(|l| LeadRow::from_lead(l, today)).collect()
    } else {
        Vec::new()
    };

    let suggested_templates = if config.include_templates {
        suggest_templates(&stats, templates)
    } else {
        Vec::new()
    };

    PipelineReport {
        metadata,
        stats,
        agenda,
        recent_leads: recent,
        leads: rows,
        suggested_templates,
    }
}

/// Active templates for each status that has leads.
fn suggest_templates(stats: &PipelineStats, templates: &TemplateLibrary) -> Vec<TemplateSuggestion> {
    stats
        .by_status
        .keys()
        .filter_map(|label| {
            let names: Vec<String> = templates
                .for_status(&LeadStatus::from(label.as_str()))
                .into_iter()
                .map(|t| match t.stage {
                    Some(ref stage) => format!("{} ({})", t.name, stage),
                    None => t.name.clone(),
                })
                .collect();

            (!names.is_empty()).then(|| TemplateSuggestion {
                status: label.clone(),
                templates: names,
            })
        })
        .collect()
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &PipelineReport, title: &str) -> String {
    let currency = report.metadata.currency.as_str();
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", title));

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_summary_section(&report.stats, currency));
    output.push_str(&generate_agenda_section(report));
    output.push_str(&generate_recent_section(&report.recent_leads, currency));
    output.push_str(&generate_leads_section(&report.leads, currency));
    output.push_str(&generate_templates_section(&report.suggested_templates));
    output.push_str(&generate_footer(report));

    output
}

fn money(currency: &str, value: f64) -> String {
    format!("{}{}", currency, format_amount(value))
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Follow-ups As Of:** {}\n",
        metadata.today.format("%Y-%m-%d")
    ));
    if let Some(ref term) = metadata.search {
        section.push_str(&format!("- **Search:** `{}`\n", term));
        section.push_str(&format!(
            "- **Leads Matched:** {} of {}\n",
            metadata.leads_included, metadata.total_in_store
        ));
    } else {
        section.push_str(&format!("- **Leads:** {}\n", metadata.leads_included));
    }
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &PipelineReport) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Summary](#summary)\n");
    toc.push_str("- [Follow-ups](#follow-ups)\n");

    if !report.recent_leads.is_empty() {
        toc.push_str("- [Recent Leads](#recent-leads)\n");
    }
    if !report.leads.is_empty() {
        toc.push_str("- [All Leads](#all-leads)\n");
    }
    if !report.suggested_templates.is_empty() {
        toc.push_str("- [Suggested Templates](#suggested-templates)\n");
    }

    toc.push('\n');

    toc
}

/// Generate the summary section.
fn generate_summary_section(stats: &PipelineStats, currency: &str) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Total Leads | Qualified | Pipeline Value | Conversion Rate |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {}% |\n\n",
        stats.total_leads,
        stats.qualified_leads,
        money(currency, stats.total_value),
        stats.conversion_rate
    ));

    if !stats.by_status.is_empty() {
        section.push_str("### Leads by Status\n\n");
        section.push_str("| Status | Leads | Value |\n");
        section.push_str("|:---|:---:|---:|\n");

        let mut statuses: Vec<_> = stats.by_status.iter().collect();
        statuses.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

        for (status, count) in statuses {
            let value = stats.value_by_status.get(status).copied().unwrap_or(0.0);
            section.push_str(&format!(
                "| {} | {} | {} |\n",
                cell(status),
                count,
                money(currency, value)
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the follow-up agenda section.
fn generate_agenda_section(report: &PipelineReport) -> String {
    let agenda = &report.agenda;
    let mut section = String::new();

    section.push_str("## Follow-ups\n\n");

    if agenda.scheduled_count() == 0 {
        section.push_str("No follow-ups are scheduled.\n\n");
    } else {
        section.push_str(&generate_bucket("🔴 Overdue", &agenda.overdue));
        section.push_str(&generate_bucket("🟡 Due Today", &agenda.due_today));
        section.push_str(&generate_bucket("🟢 Upcoming", &agenda.upcoming));
    }

    if agenda.unscheduled > 0 {
        section.push_str(&format!(
            "*{} lead(s) have no follow-up scheduled.*\n\n",
            agenda.unscheduled
        ));
    }

    section
}

fn generate_bucket(heading: &str, entries: &[ScheduledFollowUp]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut block = String::new();
    block.push_str(&format!("### {} ({})\n\n", heading, entries.len()));
    block.push_str("| Lead | Rep | Date | When |\n");
    block.push_str("|:---|:---|:---:|:---|\n");

    for entry in entries {
        block.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            cell(&entry.lead_name),
            cell(entry.assigned_rep.as_deref().unwrap_or("-")),
            entry.date.format("%Y-%m-%d"),
            entry.follow_up.label()
        ));
    }
    block.push('\n');

    block
}

/// Generate the recent leads section.
fn generate_recent_section(rows: &[LeadRow], currency: &str) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Recent Leads\n\n");

    for row in rows {
        let captured = row
            .date_captured
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown date".to_string());
        section.push_str(&format!(
            "- **{}** ({}) - {} - {} - added {}\n",
            row.name,
            row.email,
            row.status,
            money(currency, row.value),
            captured
        ));
    }
    section.push('\n');

    section
}

/// Generate the full lead table.
fn generate_leads_section(rows: &[LeadRow], currency: &str) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## All Leads\n\n");
    section.push_str("| Name | Email | Phone | Source | Status | Value | Follow-up |\n");
    section.push_str("|:---|:---|:---|:---|:---|---:|:---|\n");

    for row in rows {
        let follow_up = match (row.next_follow_up, row.follow_up) {
            (Some(date), Some(f)) => format!("{} ({})", date.format("%Y-%m-%d"), f.label()),
            _ => "-".to_string(),
        };
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            cell(&row.name),
            cell(&row.email),
            cell(row.phone.as_deref().unwrap_or("-")),
            cell(row.source.as_deref().unwrap_or("-")),
            cell(&row.status.to_string()),
            money(currency, row.value),
            follow_up
        ));
    }

    let total: f64 = rows.iter().map(|r| r.value).sum();
    section.push_str(&format!(
        "\n**Total Leads:** {} | **Total Value:** {}\n\n",
        rows.len(),
        money(currency, total)
    ));

    section
}

/// Escape text for use inside a Markdown table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Generate the suggested templates section.
fn generate_templates_section(suggestions: &[TemplateSuggestion]) -> String {
    if suggestions.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Suggested Templates\n\n");

    for suggestion in suggestions {
        section.push_str(&format!(
            "- **{}:** {}\n",
            suggestion.status,
            suggestion.templates.join(", ")
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer(report: &PipelineReport) -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Generated on {} by leadpipe*\n",
        report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &PipelineReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
