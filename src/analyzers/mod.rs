//! School dataset classification, sanitization and cohort aggregation.
//!
//! Raw rows are classified into a [`types::Category`], filtered down to
//! complete, in-range records, then grouped into per-category mean rates.

pub mod aggregate;
pub mod analyzer;
pub mod classify;
pub mod sanitize;
pub mod types;
pub mod utility;
