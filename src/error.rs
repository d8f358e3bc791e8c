use std::io;
use thiserror::Error;

use crate::recombination::Position;

/// Errors from reading the tab-delimited tables and detecting boundaries.
#[derive(Error, Debug)]
pub enum HaploblockError {
    #[error("Cannot open '{path}': {source}")]
    ResourceUnavailable {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Bad line {line} in '{path}' (expected {expected} tab-separated fields, found {found})")]
    MalformedRecord {
        path: String,
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("No recombination records for chromosome '{0}' (wrong chromosome?)")]
    EmptySeries(String),
    #[error("Failed to parse a column at line {line} of '{path}': {message}")]
    ParseError {
        path: String,
        line: u64,
        message: String,
    },
    #[error("Improper rate value, either NaN or negative ({0})")]
    ImproperRate(String),
    #[error("Positions for '{chrom}' are not ascending ({previous} followed by {position})")]
    UnsortedPositions {
        chrom: String,
        previous: Position,
        position: Position,
    },
    #[error("'{path}' is headerless? Expected a header starting with '{expected}'")]
    MissingHeader { path: String, expected: String },
    #[error("TSV parsing error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
}

/// 1-based line number of a csv record, or zero if the reader did not track it.
pub(crate) fn record_line(record: &csv::StringRecord) -> u64 {
    record.position().map_or(0, |pos| pos.line())
}
