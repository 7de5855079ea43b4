//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.leadpipe.toml` files.

use crate::models::ValuePolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".leadpipe.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Pipeline status vocabulary and validation.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "pipeline_report.md".to_string()
}

/// Which statuses count as qualified and converted, and how invalid
/// lead values are handled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Status labels counted as qualified leads.
    #[serde(default = "default_qualified")]
    pub qualified_statuses: Vec<String>,

    /// Status labels counted as conversions.
    #[serde(default = "default_converted")]
    pub converted_statuses: Vec<String>,

    /// Reject or zero out negative / non-numeric lead values.
    #[serde(default)]
    pub value_policy: ValuePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            qualified_statuses: default_qualified(),
            converted_statuses: default_converted(),
            value_policy: ValuePolicy::Reject,
        }
    }
}

fn default_qualified() -> Vec<String> {
    vec!["Interested", "Booked Consultation", "Qualified", "Hot"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_converted() -> Vec<String> {
    vec!["Enrolled", "Converted"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Currency label placed before amounts.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Number of leads in the "Recent Leads" section.
    #[serde(default = "default_recent_leads")]
    pub recent_leads: usize,

    /// Include the full lead table.
    #[serde(default = "default_true")]
    pub include_lead_table: bool,

    /// Include suggested templates per status.
    #[serde(default = "default_true")]
    pub include_templates: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            currency: default_currency(),
            recent_leads: default_recent_leads(),
            include_lead_table: true,
            include_templates: true,
        }
    }
}

fn default_title() -> String {
    "Lead Pipeline Report".to_string()
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_recent_leads() -> usize {
    3
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref qualified) = args.qualified {
            self.pipeline.qualified_statuses = qualified.clone();
        }
        if let Some(ref converted) = args.converted {
            self.pipeline.converted_statuses = converted.clone();
        }
        if args.coerce_invalid {
            self.pipeline.value_policy = ValuePolicy::DefaultToZero;
        }
        if let Some(ref currency) = args.currency {
            self.report.currency = currency.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
