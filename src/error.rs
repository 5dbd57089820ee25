use thiserror::Error;

use crate::ingestion::quotes::QuoteError;

/// Convenience result type for stats collection.
pub type StatsResult<T> = Result<T, StatsError>;

/// Error type returned by decoding and transport functions.
///
/// Every variant aborts the whole operation. Field-level coercion failures are reported
/// separately as [`crate::fields::FieldError`] and never surface here.
#[derive(Debug, Error)]
pub enum StatsError {
    /// The stats socket could not be dialed.
    #[error("failed to connect to {address}: {source}")]
    Connection {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Underlying I/O error outside of stream reads (e.g. file not found, command write failed).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading the stats stream failed, including a stream too short to hold the marker prefix.
    #[error("stream error: {0}")]
    Stream(#[source] std::io::Error),

    /// A CSV row could not be parsed (field count differs from the header, invalid UTF-8).
    #[error("csv error: {0}")]
    Csv(#[source] csv::Error),

    /// A row breaks the CSV quoting rules (unterminated quoted field, bare `"`).
    #[error("malformed csv: {0}")]
    MalformedQuote(#[source] QuoteError),

    /// The stream ended before a header row was read.
    #[error("stream ended before the header row")]
    MissingHeader,

    /// A field dictionary could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl StatsError {
    /// Returns `true` for the decode failures (malformed CSV or missing header).
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Csv(_) | Self::MalformedQuote(_) | Self::MissingHeader)
    }
}

impl From<csv::Error> for StatsError {
    /// CSV reader I/O failures are stream failures, unless they carry a quoting violation;
    /// everything else is a decode failure.
    fn from(err: csv::Error) -> Self {
        if !err.is_io_error() {
            return Self::Csv(err);
        }
        match err.into_kind() {
            csv::ErrorKind::Io(io) => match QuoteError::from_io(io) {
                Ok(quote) => Self::MalformedQuote(quote),
                Err(io) => Self::Stream(io),
            },
            other => Self::Stream(std::io::Error::other(format!("{other:?}"))),
        }
    }
}
