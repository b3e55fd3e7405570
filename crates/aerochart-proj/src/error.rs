//! Error types for the chart projection crate.

use thiserror::Error;

/// Errors that can occur while building or querying a chart.
#[derive(Debug, Error)]
pub enum ChartError {
    /// I/O error reading a chart data file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The descriptor line does not have the fields its projection needs.
    #[error("Malformed chart descriptor: {0}")]
    MalformedDescriptor(String),

    /// A numeric field could not be parsed.
    #[error("Invalid value {value:?} for field '{field}'")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Raw text found in the field.
        value: String,
    },

    /// The pixel calibration of a conformal conic chart cannot be inverted.
    #[error("Chart calibration for '{0}' is singular")]
    SingularCalibration(String),

    /// The chart edges do not meet at a pole.
    #[error("Polar chart edges for '{0}' are parallel")]
    ParallelEdges(String),

    /// A charted-limits override entry could not be understood.
    #[error("Invalid charted limit '{entry}' for chart '{chart}'")]
    InvalidOverride {
        /// Chart the override belongs to.
        chart: String,
        /// The offending entry.
        entry: String,
    },

    /// An outline line could not be parsed.
    #[error("Invalid outline for chart '{chart}': {reason}")]
    InvalidOutline {
        /// Chart the outline belongs to.
        chart: String,
        /// Reason for failure.
        reason: String,
    },

    /// CSV tokenizing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// No chart with the given name is known.
    #[error("No chart named '{0}'")]
    UnknownChart(String),
}
