//! LeadPipe - Lead pipeline statistics and follow-up tracking
//!
//! A CLI tool that loads lead records, computes pipeline statistics and
//! follow-up urgency, and writes Markdown or JSON pipeline reports. It can
//! also render outreach email templates for a single lead.
//!
//! Exit codes:
//!   0 - Success (no overdue follow-ups, or no --fail-on-overdue set)
//!   1 - Runtime error (unreadable file, invalid lead record, etc.)
//!   2 - Overdue follow-ups found with --fail-on-overdue

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use leadpipe::analysis::{generate_summary_text, StatusSets};
use leadpipe::cli::{Args, OutputFormat};
use leadpipe::config::{Config, CONFIG_FILE_NAME};
use leadpipe::error::PipelineError;
use leadpipe::models::{format_amount, ReportMetadata};
use leadpipe::report;
use leadpipe::store::LeadStore;
use leadpipe::templates::{self, TemplateLibrary};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("LeadPipe v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .leadpipe.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize status sets, value handling and the report.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load data and dispatch to report or template rendering. Returns the exit code.
fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let leads_path = args
        .leads
        .clone()
        .context("No leads file given (use --leads)")?;

    let store = LeadStore::load(&leads_path, config.pipeline.value_policy)?;
    let library = load_templates(&args)?;

    if let (Some(template_id), Some(lead_id)) = (&args.render_template, &args.lead) {
        return handle_render_template(&args, &store, &library, template_id, lead_id);
    }

    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    run_report(&args, &config, &store, &library, &leads_path, today)
}

/// Build, write and summarize the pipeline report.
fn run_report(
    args: &Args,
    config: &Config,
    store: &LeadStore,
    library: &TemplateLibrary,
    leads_path: &Path,
    today: NaiveDate,
) -> Result<i32> {
    let leads: Vec<_> = match args.search {
        Some(ref term) => store.search(term).into_iter().cloned().collect(),
        None => store.list().to_vec(),
    };
    if let Some(ref term) = args.search {
        info!("Search '{}' matched {} of {} leads", term, leads.len(), store.len());
    }

    let sets = StatusSets::from(&config.pipeline);
    debug!("Status sets: {:?}", sets);

    let metadata = ReportMetadata {
        source: leads_path.display().to_string(),
        generated_at: Utc::now(),
        today,
        search: args.search.clone(),
        total_in_store: store.len(),
        leads_included: leads.len(),
        currency: config.report.currency.clone(),
    };

    let report = report::build_report(&leads, &sets, library, metadata, &config.report);
    debug!("Pipeline summary:\n{}", generate_summary_text(&report.stats));

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report.title),
    };

    if args.writes_to_stdout() {
        print!("{}", output);
    } else {
        let path = PathBuf::from(&config.general.output);
        std::fs::write(&path, &output)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;

        let stats = &report.stats;
        let agenda = &report.agenda;
        println!("\n📊 Pipeline Summary (as of {}):", today.format("%Y-%m-%d"));
        println!("   Total leads: {}", stats.total_leads);
        println!("   Qualified: {}", stats.qualified_leads);
        println!(
            "   Pipeline value: {}{}",
            config.report.currency,
            format_amount(stats.total_value)
        );
        println!("   Conversion rate: {}%", stats.conversion_rate);
        println!(
            "   Follow-ups - 🔴 Overdue: {} | 🟡 Today: {} | 🟢 Upcoming: {}",
            agenda.overdue.len(),
            agenda.due_today.len(),
            agenda.upcoming.len()
        );
        println!("\n✅ Report saved to: {}", path.display());
    }

    if args.fail_on_overdue && report.agenda.has_overdue() {
        eprintln!(
            "\n⛔ {} overdue follow-up(s). Failing (exit code 2).",
            report.agenda.overdue.len()
        );
        return Ok(2);
    }

    Ok(0)
}

/// Handle --render-template: print the filled-in email for one lead.
fn handle_render_template(
    args: &Args,
    store: &LeadStore,
    library: &TemplateLibrary,
    template_id: &str,
    lead_id: &str,
) -> Result<i32> {
    let lead = store
        .get(lead_id)
        .ok_or_else(|| PipelineError::LeadNotFound(lead_id.to_string()))?;
    let template = library
        .get(template_id)
        .ok_or_else(|| PipelineError::TemplateNotFound(template_id.to_string()))?;

    if !template.is_active {
        warn!("Template '{}' is deactivated", template_id);
    }

    let mut extra = HashMap::new();
    if let Some(ref sender) = args.sender {
        extra.insert("sender_name".to_string(), sender.clone());
    }

    let email = templates::render(template, lead, &extra);
    for name in &email.unresolved {
        warn!("No value for placeholder {{{{{}}}}}", name);
    }

    let text = email.to_clipboard_text();
    match args.output {
        Some(ref path) if !args.writes_to_stdout() => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write email to {}", path.display()))?;
            println!("✅ Email for {} saved to: {}", email.to, path.display());
        }
        _ => println!("To: {}\n{}", email.to, text),
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

/// Load templates from --templates or fall back to the built-in sequence.
fn load_templates(args: &Args) -> Result<TemplateLibrary> {
    match args.templates {
        Some(ref path) => TemplateLibrary::load(path),
        None => {
            debug!("No templates file given, using built-in templates");
            Ok(TemplateLibrary::builtin(Utc::now()))
        }
    }
}
