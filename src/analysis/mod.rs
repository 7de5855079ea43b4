//! Pipeline analysis.
//!
//! Pure computations over a slice of leads: summary statistics and
//! follow-up classification.

pub mod aggregator;
pub mod follow_up;

pub use aggregator::*;
pub use follow_up::*;
