pub mod analyzers;
pub mod columns;
pub mod error;
pub mod fetch;
pub mod inference;
pub mod output;
pub mod parser;
pub mod report;

pub use error::{Result, ScoreError};
