//! Email outreach templates.
//!
//! Templates carry `{{placeholder}}` tokens that are filled from a lead's
//! fields when rendered. Templates are soft-deleted by deactivation and
//! never removed from the library.

mod builtin;

use crate::error::{PipelineError, Result};
use crate::models::{format_amount, Lead, LeadStatus};
use anyhow::Context;
use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Kind of outreach a template is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    Welcome,
    #[serde(alias = "follow-up")]
    FollowUp,
    Reminder,
    Promotional,
    #[serde(alias = "thank-you")]
    ThankYou,
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateType::Welcome => write!(f, "welcome"),
            TemplateType::FollowUp => write!(f, "follow_up"),
            TemplateType::Reminder => write!(f, "reminder"),
            TemplateType::Promotional => write!(f, "promotional"),
            TemplateType::ThankYou => write!(f, "thank_you"),
        }
    }
}

/// A reusable email template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: String,
    /// Owning user, if the template is user-specific.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub name: String,
    pub subject: String,
    pub body: String,
    /// Only offer this template for leads in this status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_status: Option<LeadStatus>,
    pub template_type: TemplateType,
    /// When in the sequence to send, e.g. "Day 3".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl EmailTemplate {
    pub fn new(
        id: &str,
        name: &str,
        subject: &str,
        body: &str,
        template_type: TemplateType,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.to_string(),
            owner: None,
            name: name.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            lead_status: None,
            template_type,
            stage: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this template applies to a lead in `status`.
    pub fn applies_to(&self, status: &LeadStatus) -> bool {
        self.lead_status.as_ref().map_or(true, |s| s == status)
    }

    /// Placeholder names used in the subject and body, in order of first use.
    pub fn placeholders(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for text in [&self.subject, &self.body] {
            for caps in placeholder_regex().captures_iter(text) {
                let name = caps[1].to_string();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

/// A template rendered for a specific lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedEmail {
    pub template_id: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Placeholders that had no value and were left in the text.
    pub unresolved: Vec<String>,
}

impl RenderedEmail {
    /// The text placed on the clipboard: subject line, blank line, body.
    pub fn to_clipboard_text(&self) -> String {
        format!("Subject: {}\n\n{}", self.subject, self.body)
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder regex is valid")
    })
}

/// Values a lead contributes to template placeholders.
fn lead_fields(lead: &Lead) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    fields.insert("first_name".to_string(), lead.first_name.clone());
    fields.insert("full_name".to_string(), lead.full_name());
    fields.insert("email".to_string(), lead.email.clone());
    fields.insert("status".to_string(), lead.status.to_string());
    fields.insert("value".to_string(), format_amount(lead.value));

    let optional = [
        ("last_name", &lead.last_name),
        ("phone", &lead.phone),
        ("company", &lead.company),
        ("source", &lead.source),
        ("assigned_rep", &lead.assigned_rep),
        ("goals", &lead.goals),
        ("service_package", &lead.service_package),
    ];
    for (key, value) in optional {
        if let Some(v) = value {
            fields.insert(key.to_string(), v.clone());
        }
    }
    if let Some(date) = lead.next_follow_up {
        fields.insert("next_follow_up".to_string(), date.format("%Y-%m-%d").to_string());
    }

    fields
}

fn substitute(text: &str, values: &HashMap<String, String>, unresolved: &mut Vec<String>) -> String {
    placeholder_regex()
        .replace_all(text, |caps: &Captures| match values.get(&caps[1]) {
            Some(v) => v.clone(),
            None => {
                if !unresolved.iter().any(|u| u == &caps[1]) {
                    unresolved.push(caps[1].to_string());
                }
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Render `template` for `lead`.
///
/// `extra` supplies values that are not lead fields (such as
/// `sender_name`) and overrides lead fields of the same name.
pub fn render(template: &EmailTemplate, lead: &Lead, extra: &HashMap<String, String>) -> RenderedEmail {
    let mut values = lead_fields(lead);
    values.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut unresolved = Vec::new();
    let subject = substitute(&template.subject, &values, &mut unresolved);
    let body = substitute(&template.body, &values, &mut unresolved);

    if !unresolved.is_empty() {
        debug!(
            "Template {} left unresolved placeholders: {}",
            template.id,
            unresolved.join(", ")
        );
    }

    RenderedEmail {
        template_id: template.id.clone(),
        to: lead.email.clone(),
        subject,
        body,
        unresolved,
    }
}

#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    templates: Vec<EmailTemplate>,
}

/// The set of templates available to a user.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: Vec<EmailTemplate>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// The starter outreach sequence shipped with the tool.
    pub fn builtin(now: DateTime<Utc>) -> Self {
        Self {
            templates: builtin::templates(now),
        }
    }

    /// Load templates from a TOML file with a `[[templates]]` array.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read templates file: {}", path.display()))?;

        let file: TemplateFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse templates file: {}", path.display()))?;

        let mut library = Self::new();
        for template in file.templates {
            library
                .insert(template)
                .with_context(|| format!("Invalid template in {}", path.display()))?;
        }

        info!("Loaded {} email templates", library.all().len());
        Ok(library)
    }

    /// Every template, including deactivated ones.
    pub fn all(&self) -> &[EmailTemplate] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&EmailTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn active(&self) -> Vec<&EmailTemplate> {
        self.templates.iter().filter(|t| t.is_active).collect()
    }

    /// Active templates usable for a lead in `status`.
    pub fn for_status(&self, status: &LeadStatus) -> Vec<&EmailTemplate> {
        self.templates
            .iter()
            .filter(|t| t.is_active && t.applies_to(status))
            .collect()
    }

    pub fn by_type(&self, template_type: TemplateType) -> Vec<&EmailTemplate> {
        self.templates
            .iter()
            .filter(|t| t.is_active && t.template_type == template_type)
            .collect()
    }

    /// Add a template, stamping both timestamps with `now`.
    pub fn create(&mut self, mut template: EmailTemplate, now: DateTime<Utc>) -> Result<()> {
        template.created_at = now;
        template.updated_at = now;
        self.insert(template)
    }

    fn insert(&mut self, template: EmailTemplate) -> Result<()> {
        if self.get(&template.id).is_some() {
            return Err(PipelineError::DuplicateTemplate(template.id));
        }
        self.templates.push(template);
        Ok(())
    }

    /// Replace a template's content. `created_at` is kept and
    /// `updated_at` set to `now`.
    pub fn update(&mut self, template: EmailTemplate, now: DateTime<Utc>) -> Result<()> {
        let existing = self
            .templates
            .iter_mut()
            .find(|t| t.id == template.id)
            .ok_or_else(|| PipelineError::TemplateNotFound(template.id.clone()))?;

        let created_at = existing.created_at;
        *existing = EmailTemplate {
            created_at,
            updated_at: now,
            ..template
        };
        Ok(())
    }

    /// Soft-delete a template.
    pub fn deactivate(&mut self, id: &str, now: DateTime<Utc>) -> Result<()> {
        let template = self
            .templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| PipelineError::TemplateNotFound(id.to_string()))?;

        template.is_active = false;
        template.updated_at = now;
        debug!("Deactivated template {}", id);
        Ok(())
    }
}
