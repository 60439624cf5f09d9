//! Data types used by the classification and aggregation pipeline.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ScoreError;

/// One raw row of the school dataset. Every value may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchoolRecord {
    pub location_code: Option<i64>,
    pub admin_dependency_code: Option<i64>,

    pub mean_science_nature: Option<f64>,
    pub mean_human_sciences: Option<f64>,
    pub mean_languages: Option<f64>,
    pub mean_math: Option<f64>,
    pub mean_essay: Option<f64>,

    pub approval_rate: Option<f64>,
    pub failure_rate: Option<f64>,
    pub dropout_rate: Option<f64>,
    pub retention_rate: Option<f64>,
}

impl SchoolRecord {
    pub fn codes(&self) -> SchoolCodes {
        SchoolCodes {
            location_code: self.location_code,
            admin_dependency_code: self.admin_dependency_code,
        }
    }
}

/// The two categorical codes the classifier looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchoolCodes {
    pub location_code: Option<i64>,
    pub admin_dependency_code: Option<i64>,
}

/// School category derived from location and administrative dependency.
///
/// Declaration order is the display order of the comparative table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Federal,
    State,
    Private,
    Rural,
    Other,
}

impl Category {
    /// Categories a user may select and that survive sanitization.
    pub const SELECTABLE: [Category; 4] = [
        Category::Federal,
        Category::State,
        Category::Private,
        Category::Rural,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Federal => "Federal",
            Category::State => "State",
            Category::Private => "Private",
            Category::Rural => "Rural",
            Category::Other => "Other",
        }
    }

    pub fn is_selectable(self) -> bool {
        self != Category::Other
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parses a user-supplied label, case-insensitively.
///
/// `Other` is not selectable and is rejected like any unknown label. The
/// dataset's own Portuguese names are accepted as aliases.
impl FromStr for Category {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "federal" => Ok(Category::Federal),
            "state" | "estadual" => Ok(Category::State),
            "private" | "privada" => Ok(Category::Private),
            "rural" => Ok(Category::Rural),
            _ => Err(ScoreError::InvalidCategory(s.to_string())),
        }
    }
}

/// A raw record paired with its derived category.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRecord {
    pub category: Category,
    pub record: SchoolRecord,
}

/// Five subject averages of a sanitized record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubjectScores {
    pub science_nature: f64,
    pub human_sciences: f64,
    pub languages: f64,
    pub math: f64,
    pub essay: f64,
}

/// Four outcome rates, each a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rates {
    pub approval: f64,
    pub failure: f64,
    pub dropout: f64,
    pub retention: f64,
}

impl Rates {
    pub fn as_array(&self) -> [f64; 4] {
        [self.approval, self.failure, self.dropout, self.retention]
    }
}

/// A record that passed every completeness and range check.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedRecord {
    pub category: Category,
    pub subjects: SubjectScores,
    pub rates: Rates,
    pub(crate) source: SchoolRecord,
}

impl SanitizedRecord {
    /// The untouched raw record this one was built from.
    pub fn source(&self) -> &SchoolRecord {
        &self.source
    }

    pub fn to_classified(&self) -> ClassifiedRecord {
        ClassifiedRecord {
            category: self.category,
            record: self.source.clone(),
        }
    }
}

/// Rows dropped by sanitization, by first failing reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropTally {
    pub unclassified: usize,
    pub missing_field: usize,
    pub rate_out_of_range: usize,
}

impl DropTally {
    pub fn total(&self) -> usize {
        self.unclassified + self.missing_field + self.rate_out_of_range
    }
}

/// Mean rates of one cohort, at full precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CohortRates {
    pub schools: usize,
    pub approval: f64,
    pub failure: f64,
    pub dropout: f64,
    pub retention: f64,
}

/// Per-category mean rates. A category with no sanitized records has no
/// entry; it is never reported as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CohortStatistics {
    pub(crate) cohorts: BTreeMap<Category, CohortRates>,
}

impl CohortStatistics {
    pub fn get(&self, category: Category) -> Option<&CohortRates> {
        self.cohorts.get(&category)
    }

    /// Cohorts with data, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &CohortRates)> {
        self.cohorts.iter().map(|(c, r)| (*c, r))
    }

    pub fn is_empty(&self) -> bool {
        self.cohorts.is_empty()
    }
}
