//! Collection entrypoints and implementations.
//!
//! Most callers should use [`collect`] (from [`unified`]) which:
//!
//! - reads a stats socket or a saved dump, chosen by [`StatsSource`]
//! - decodes it into a [`crate::types::RecordSet`] using [`StatsOptions`]
//! - optionally reports success/failure/alerts to a [`StatsObserver`]
//!
//! Lower-level functions are also available:
//! - [`decode_from_reader`] (any byte stream, from [`csv`])
//! - [`decode_from_file`] and [`fetch_over_network`] (from [`transport`])

pub mod csv;
pub mod observability;
pub mod quotes;
pub mod transport;
pub mod unified;

pub use self::csv::decode_from_reader;
pub use observability::{
    CollectStats, CompositeObserver, FileObserver, LogObserver, Outcome, StatsContext, StatsEvent, StatsObserver,
    StatsSeverity,
};
pub use quotes::{QuoteError, QuoteErrorKind};
pub use transport::{decode_from_file, fetch_over_network, NetworkMode, UnknownNetworkMode};
pub use unified::{collect, StatsOptions, StatsRequest, StatsSource, DEFAULT_TIMEOUT};
