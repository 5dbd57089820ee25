//! Unified collection entrypoint.
//!
//! Most callers should use [`collect`], which reads a [`StatsSource`] (stats socket or saved
//! `show stat` dump) into a [`crate::types::RecordSet`] using the field dictionary and
//! transform chain carried by [`StatsOptions`].
//!
//! - If an [`super::observability::StatsObserver`] is provided, success/failure/alerts are
//!   reported to it.

use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{StatsError, StatsResult};
use crate::fields::FieldDictionary;
use crate::processing::TransformChain;
use crate::types::{Record, RecordSet};

use super::observability::{StatsContext, StatsObserver, StatsSeverity, CollectStats};
use super::transport::{self, NetworkMode};

/// Default deadline for a socket exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where to read `show stat` output from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsSource {
    /// A file holding a saved `show stat` dump.
    File(PathBuf),
    /// A live stats socket.
    Socket {
        mode: NetworkMode,
        /// Socket path for [`NetworkMode::Unix`], `host:port` for [`NetworkMode::Tcp`].
        address: String,
    },
}

impl fmt::Display for StatsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file:{}", path.display()),
            Self::Socket { mode, address } => write!(f, "{mode}:{address}"),
        }
    }
}

impl FromStr for StatsSource {
    type Err = Infallible;

    /// Parses `unix:/path`, `tcp:host:port` or `file:/path`. Anything else is a file path, so
    /// parsing never fails.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((scheme, rest)) = s.split_once(':') {
            if scheme == "file" {
                return Ok(Self::File(PathBuf::from(rest)));
            }
            if let Ok(mode) = scheme.parse::<NetworkMode>() {
                return Ok(Self::Socket {
                    mode,
                    address: rest.to_owned(),
                });
            }
        }
        Ok(Self::File(PathBuf::from(s)))
    }
}

/// Configuration for decoding and collection.
///
/// Holds the field dictionary and transform chain every decode call uses, replacing any
/// process-wide state. Options are read through a shared reference for the whole decode, so
/// they cannot change mid-stream; callers that mutate options from several threads should
/// guard them with their own lock and pass a clone to each call.
///
/// Use [`Default`] for the HAProxy dictionary with no transforms.
#[derive(Clone)]
pub struct StatsOptions {
    fields: FieldDictionary,
    transforms: TransformChain,
    /// Connect timeout and exchange deadline for socket sources.
    pub timeout: Duration,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn StatsObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: StatsSeverity,
}

impl StatsOptions {
    /// Replace the field dictionary wholesale. There is no merge with the previous one.
    pub fn set_field_dictionary(&mut self, fields: FieldDictionary) {
        self.fields = fields;
    }

    /// Append a transform; it runs after every previously registered transform.
    pub fn register_transform<F>(&mut self, transform: F)
    where
        F: Fn(Record) -> Record + Send + Sync + 'static,
    {
        self.transforms.register(transform);
    }

    pub fn fields(&self) -> &FieldDictionary {
        &self.fields
    }

    pub fn transforms(&self) -> &TransformChain {
        &self.transforms
    }
}

impl fmt::Debug for StatsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsOptions")
            .field("fields_len", &self.fields.len())
            .field("transforms", &self.transforms)
            .field("timeout", &self.timeout)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            fields: FieldDictionary::haproxy(),
            transforms: TransformChain::new(),
            timeout: DEFAULT_TIMEOUT,
            observer: None,
            alert_at_or_above: StatsSeverity::Critical,
        }
    }
}

/// Unified collection entry point.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with record count stats
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ## Stats socket
///
/// ```no_run
/// use haproxy_stats::ingestion::{collect, StatsOptions, StatsSource};
///
/// # fn main() -> Result<(), haproxy_stats::StatsError> {
/// let Ok(source) = "unix:/var/run/haproxy.sock".parse::<StatsSource>();
/// let records = collect(&source, &StatsOptions::default())?;
/// for r in &records {
///     println!("{}/{} {}", r.string("proxy"), r.string("name"), r.string("status"));
/// }
/// # Ok(())
/// # }
/// ```
///
/// ## Observability (`log` output + alert threshold)
///
/// ```no_run
/// use std::sync::Arc;
///
/// use haproxy_stats::ingestion::{collect, StatsOptions, StatsSeverity, StatsSource, LogObserver};
///
/// let mut opts = StatsOptions::default();
/// opts.observer = Some(Arc::new(LogObserver::default()));
/// opts.alert_at_or_above = StatsSeverity::Critical;
///
/// // Dial failures are Critical and trigger `on_alert` at this threshold.
/// let source: StatsSource = "tcp:127.0.0.1:1".parse().unwrap();
/// let _err = collect(&source, &opts).unwrap_err();
/// ```
pub fn collect(source: &StatsSource, options: &StatsOptions) -> StatsResult<RecordSet> {
    let ctx = StatsContext {
        source: source.clone(),
    };

    let result = match source {
        StatsSource::File(path) => transport::decode_from_file(path, options),
        StatsSource::Socket { mode, address } => {
            transport::fetch_over_network(*mode, address, options.timeout, options)
        }
    };

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(records) => obs.on_success(&ctx, CollectStats { records: records.len() }),
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

fn severity_for_error(e: &StatsError) -> StatsSeverity {
    match e {
        StatsError::Connection { .. } | StatsError::Io(_) | StatsError::Stream(_) => {
            StatsSeverity::Critical
        }
        StatsError::Csv(_)
        | StatsError::MalformedQuote(_)
        | StatsError::MissingHeader
        | StatsError::Config(_) => StatsSeverity::Error,
    }
}

/// Owned form of a [`collect`] call.
///
/// Useful for scheduling periodic scrapes of several load balancers.
#[derive(Debug, Clone)]
pub struct StatsRequest {
    pub source: StatsSource,
    pub options: StatsOptions,
}

impl StatsRequest {
    /// Execute the request by calling [`collect`].
    pub fn run(&self) -> StatsResult<RecordSet> {
        collect(&self.source, &self.options)
    }
}
