//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use chrono::NaiveDate;
use clap::Parser;
use std::path::{Path, PathBuf};

/// LeadPipe - lead pipeline statistics and follow-up tracking
///
/// Summarize a lead list: pipeline value, qualified leads, conversion
/// rate and which follow-ups are overdue. Markdown/JSON reports.
///
/// Examples:
///   leadpipe --leads leads.json
///   leadpipe --leads leads.json --today 2024-01-15 --format json -o -
///   leadpipe --leads leads.json --search instagram
///   leadpipe --leads leads.json --render-template follow-up --lead LEAD-1 --sender "Lisa Chen"
///   leadpipe --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON file containing an array of lead records
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub leads: Option<PathBuf>,

    /// TOML file with `[[templates]]` entries
    ///
    /// If not specified, the built-in outreach sequence is used.
    #[arg(short, long, value_name = "FILE")]
    pub templates: Option<PathBuf>,

    /// Day to classify follow-ups against (YYYY-MM-DD)
    ///
    /// Defaults to the local date.
    #[arg(long, value_name = "DATE", env = "LEADPIPE_TODAY")]
    pub today: Option<NaiveDate>,

    /// Only include leads whose name, email, source or status contains TERM
    #[arg(short, long, value_name = "TERM")]
    pub search: Option<String>,

    /// Output file for the report ("-" for stdout)
    ///
    /// Default: from config or pipeline_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .leadpipe.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Statuses counted as qualified (comma-separated)
    ///
    /// Example: --qualified "Interested,Booked Consultation"
    #[arg(long, value_name = "STATUSES", value_delimiter = ',')]
    pub qualified: Option<Vec<String>>,

    /// Statuses counted as converted (comma-separated)
    #[arg(long, value_name = "STATUSES", value_delimiter = ',')]
    pub converted: Option<Vec<String>>,

    /// Count negative or non-numeric lead values as 0 instead of failing
    #[arg(long)]
    pub coerce_invalid: bool,

    /// Currency label placed before amounts
    #[arg(long, value_name = "LABEL")]
    pub currency: Option<String>,

    /// Exit with code 2 if any follow-up is overdue
    ///
    /// Useful for scheduled jobs that alert the sales team.
    #[arg(long)]
    pub fail_on_overdue: bool,

    /// Render a template for one lead instead of writing a report
    #[arg(long, value_name = "TEMPLATE_ID", requires = "lead")]
    pub render_template: Option<String>,

    /// Lead id to render the template for
    #[arg(long, value_name = "LEAD_ID", requires = "render_template")]
    pub lead: Option<String>,

    /// Sender name for the {{sender_name}} placeholder
    #[arg(long, value_name = "NAME", env = "LEADPIPE_SENDER")]
    pub sender: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .leadpipe.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match self.leads {
            Some(ref path) => check_file("Leads file", path)?,
            None => return Err("--leads is required".to_string()),
        }

        if let Some(ref path) = self.templates {
            check_file("Templates file", path)?;
        }

        for (flag, list) in [("--qualified", &self.qualified), ("--converted", &self.converted)] {
            if let Some(statuses) = list {
                if statuses.iter().all(|s| s.trim().is_empty()) {
                    return Err(format!("{} needs at least one status", flag));
                }
            }
        }

        if let Some(ref term) = self.search {
            if term.trim().is_empty() {
                return Err("Search term must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Whether the report goes to stdout.
    pub fn writes_to_stdout(&self) -> bool {
        self.output.as_deref() == Some(Path::new("-"))
    }
}

fn check_file(label: &str, path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("{} does not exist: {}", label, path.display()));
    }
    if !path.is_file() {
        return Err(format!("{} is not a file: {}", label, path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(leads: &Path) -> Args {
        Args {
            leads: Some(leads.to_path_buf()),
            templates: None,
            today: None,
            search: None,
            output: None,
            format: OutputFormat::Markdown,
            config: None,
            qualified: None,
            converted: None,
            coerce_invalid: false,
            currency: None,
            fail_on_overdue: false,
            render_template: None,
            lead: None,
            sender: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "leadpipe",
            "--leads",
            "leads.json",
            "--today",
            "2024-01-15",
            "--qualified",
            "Interested,Booked Consultation",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.today, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(
            args.qualified,
            Some(vec!["Interested".to_string(), "Booked Consultation".to_string()])
        );
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_leads_required_unless_init_config() {
        assert!(Args::try_parse_from(["leadpipe"]).is_err());
        assert!(Args::try_parse_from(["leadpipe", "--init-config"]).is_ok());
    }

    #[test]
    fn test_render_template_requires_lead() {
        let result = Args::try_parse_from([
            "leadpipe",
            "--leads",
            "leads.json",
            "--render-template",
            "welcome",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_today_rejected() {
        let result = Args::try_parse_from(["leadpipe", "--leads", "l.json", "--today", "tomorrow"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_missing_file() {
        let args = make_args(Path::new("/definitely/not/here.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut args = make_args(file.path());
        assert!(args.validate().is_ok());

        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_empty_status_list() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut args = make_args(file.path());
        args.converted = Some(vec![" ".to_string()]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut args = make_args(file.path());
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_writes_to_stdout() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut args = make_args(file.path());
        assert!(!args.writes_to_stdout());

        args.output = Some(PathBuf::from("-"));
        assert!(args.writes_to_stdout());
    }
}
