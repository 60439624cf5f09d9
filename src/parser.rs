//! Delimited-text parser for the school dataset.

use clap::ValueEnum;
use csv::{ByteRecord, ReaderBuilder};
use std::borrow::Cow;
use std::io::Read;
use tracing::{debug, warn};

use crate::analyzers::types::SchoolRecord;
use crate::columns::ColumnMap;
use crate::error::{Result, ScoreError};

/// Text encoding of the dataset file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Encoding {
    /// ISO-8859-1, as the exam microdata is published.
    #[default]
    Latin1,
    Utf8,
}

impl Encoding {
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self {
            Encoding::Latin1 => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Utf8 => String::from_utf8_lossy(bytes),
        }
    }
}

/// How to read the dataset file.
#[derive(Debug, Clone)]
pub struct DatasetOptions {
    pub delimiter: u8,
    pub encoding: Encoding,
    pub decimal: char,
    pub columns: ColumnMap,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            encoding: Encoding::Latin1,
            decimal: '.',
            columns: ColumnMap::default(),
        }
    }
}

/// Parses every row of a delimited dataset into [`SchoolRecord`]s.
///
/// Empty or unparsable cells become `None`; the sanitizer decides what to
/// do with them.
///
/// # Errors
///
/// Returns [`ScoreError::DatasetUnavailable`] if the header lacks a required
/// column or the input is not readable as delimited text.
pub fn parse_dataset<R: Read>(reader: R, options: &DatasetOptions) -> Result<Vec<SchoolRecord>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 { strip_bom(h) } else { h };
            options.encoding.decode(h).trim().to_string()
        })
        .collect();

    let mut idx = [0usize; 11];
    for (slot, name) in idx.iter_mut().zip(options.columns.required()) {
        *slot = headers.iter().position(|h| h == name).ok_or_else(|| {
            ScoreError::DatasetUnavailable(format!("missing required column '{name}'"))
        })?;
    }
    debug!(columns = headers.len(), "Dataset header resolved");

    let cells = CellReader { options };
    let mut records = Vec::new();
    let mut row = ByteRecord::new();

    while rdr.read_byte_record(&mut row)? {
        records.push(SchoolRecord {
            location_code: cells.code(&row, idx[0]),
            admin_dependency_code: cells.code(&row, idx[1]),
            mean_science_nature: cells.real(&row, idx[2]),
            mean_human_sciences: cells.real(&row, idx[3]),
            mean_languages: cells.real(&row, idx[4]),
            mean_math: cells.real(&row, idx[5]),
            mean_essay: cells.real(&row, idx[6]),
            approval_rate: cells.real(&row, idx[7]),
            failure_rate: cells.real(&row, idx[8]),
            dropout_rate: cells.real(&row, idx[9]),
            retention_rate: cells.real(&row, idx[10]),
        });
    }

    if records.is_empty() {
        warn!("Dataset has a header but no rows");
    }

    Ok(records)
}

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Drops a UTF-8 byte order mark before decoding, whatever the encoding.
fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

struct CellReader<'a> {
    options: &'a DatasetOptions,
}

impl CellReader<'_> {
    fn text(&self, row: &ByteRecord, i: usize) -> Option<String> {
        let raw = row.get(i)?;
        let text = self.options.encoding.decode(raw);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(if self.options.decimal == '.' {
            text.to_string()
        } else {
            text.replace(self.options.decimal, ".")
        })
    }

    /// `NaN` cells count as absent, like empty ones.
    fn real(&self, row: &ByteRecord, i: usize) -> Option<f64> {
        self.text(row, i)?
            .parse::<f64>()
            .ok()
            .filter(|v| !v.is_nan())
    }

    /// Integer code; integral floats such as `2.0` are accepted.
    fn code(&self, row: &ByteRecord, i: usize) -> Option<i64> {
        let text = self.text(row, i)?;
        text.parse::<i64>().ok().or_else(|| {
            text.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && v.fract() == 0.0)
                .map(|v| v as i64)
        })
    }
}
