//! In-memory lead store.
//!
//! Owns the working set of leads. Records are added with caller-supplied
//! ids and changed only by whole-record replacement; there is no delete.

use crate::error::{PipelineError, Result};
use crate::models::{Lead, LeadRecord, ValuePolicy};
use anyhow::Context;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// The working set of leads, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct LeadStore {
    leads: Vec<Lead>,
    index: HashMap<String, usize>,
}

impl LeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from raw records.
    ///
    /// Stops at the first record that fails validation or repeats an id.
    pub fn from_records(records: Vec<LeadRecord>, policy: ValuePolicy) -> Result<Self> {
        let mut store = Self::new();
        for record in records {
            let lead = Lead::from_record(record, policy)?;
            store.add(lead)?;
        }
        Ok(store)
    }

    /// Load leads from a JSON file containing an array of records.
    pub fn load(path: &Path, policy: ValuePolicy) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read leads file: {}", path.display()))?;

        let records: Vec<LeadRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse leads file: {}", path.display()))?;

        debug!("Parsed {} lead records from {}", records.len(), path.display());

        let store = Self::from_records(records, policy)
            .with_context(|| format!("Invalid lead in {}", path.display()))?;

        info!("Loaded {} leads", store.len());
        Ok(store)
    }

    /// All leads in insertion order.
    pub fn list(&self) -> &[Lead] {
        &self.leads
    }

    pub fn get(&self, id: &str) -> Option<&Lead> {
        self.index.get(id).map(|&i| &self.leads[i])
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    /// Add a new lead. Fails if a lead with the same id exists.
    pub fn add(&mut self, lead: Lead) -> Result<()> {
        check_value(&lead)?;
        if self.index.contains_key(&lead.id) {
            return Err(PipelineError::DuplicateLead(lead.id));
        }
        debug!("Adding lead {}", lead.id);
        self.index.insert(lead.id.clone(), self.leads.len());
        self.leads.push(lead);
        Ok(())
    }

    /// Replace the lead with the same id, returning the previous record.
    pub fn replace(&mut self, lead: Lead) -> Result<Lead> {
        let Some(&i) = self.index.get(&lead.id) else {
            return Err(PipelineError::LeadNotFound(lead.id));
        };
        check_value(&lead)?;
        debug!("Replacing lead {}", lead.id);
        Ok(std::mem::replace(&mut self.leads[i], lead))
    }

    /// Case-insensitive substring search over name, email, source and status.
    pub fn search(&self, term: &str) -> Vec<&Lead> {
        let needle = term.trim().to_lowercase();
        self.leads
            .iter()
            .filter(|lead| needle.is_empty() || lead.search_text().to_lowercase().contains(&needle))
            .collect()
    }
}

/// Stored values must be finite and non-negative.
fn check_value(lead: &Lead) -> Result<()> {
    if lead.value.is_finite() && lead.value >= 0.0 {
        Ok(())
    } else {
        Err(PipelineError::invalid_value(lead.value).in_record(&lead.id))
    }
}
