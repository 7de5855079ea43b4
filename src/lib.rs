//! LeadPipe - lead pipeline statistics and follow-up tracking.
//!
//! The library computes pipeline summary statistics and follow-up urgency
//! over a set of leads, keeps the working set in a [`store::LeadStore`],
//! renders outreach templates and produces Markdown/JSON reports. The
//! `leadpipe` binary wires these together behind a CLI.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod store;
pub mod templates;

pub use analysis::{
    classify_follow_up, classify_follow_up_date, compute_stats, FollowUp, PipelineStats,
    StatusSets,
};
pub use error::PipelineError;
pub use models::{Lead, LeadRecord, LeadStatus, ValuePolicy};
pub use store::LeadStore;
