//! Collection outcome reporting.
//!
//! [`collect`](super::collect) hands every outcome to the configured [`StatsObserver`]. Two
//! sinks ship with the crate: [`LogObserver`] forwards events to the `log` facade at a level
//! derived from their severity, and [`FileObserver`] appends them to a file as JSON lines.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{log, warn, Level};
use serde::Serialize;

use crate::error::StatsError;

use super::unified::StatsSource;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Malformed stats output or a bad field dictionary.
    Error,
    /// The load balancer could not be reached or read (dial, open, read failures).
    Critical,
}

impl StatsSeverity {
    /// The `log` level a failure of this severity is emitted at.
    pub fn log_level(self) -> Level {
        match self {
            Self::Info => Level::Info,
            Self::Warning => Level::Warn,
            Self::Error | Self::Critical => Level::Error,
        }
    }
}

/// Context about a collection attempt.
#[derive(Debug, Clone)]
pub struct StatsContext {
    /// The source that was read.
    pub source: StatsSource,
}

/// Minimal stats reported on successful collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectStats {
    /// Number of decoded records.
    pub records: usize,
}

/// Observer interface for collection outcomes.
pub trait StatsObserver: Send + Sync {
    /// Called when collection succeeds.
    fn on_success(&self, _ctx: &StatsContext, _stats: CollectStats) {}

    /// Called when collection fails.
    fn on_failure(&self, _ctx: &StatsContext, _severity: StatsSeverity, _error: &StatsError) {}

    /// Called, after [`Self::on_failure`], when a failure meets the alert threshold.
    ///
    /// Forwards to [`Self::on_failure`] unless overridden.
    fn on_alert(&self, ctx: &StatsContext, severity: StatsSeverity, error: &StatsError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Fans every callback out to a list of observers, in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn StatsObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn StatsObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl StatsObserver for CompositeObserver {
    fn on_success(&self, ctx: &StatsContext, stats: CollectStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &StatsContext, severity: StatsSeverity, error: &StatsError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &StatsContext, severity: StatsSeverity, error: &StatsError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// What happened to one collection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok,
    Fail,
    Alert,
}

/// One observed collection outcome, as written by [`FileObserver`].
#[derive(Debug, Clone, Serialize)]
pub struct StatsEvent {
    /// Seconds since the Unix epoch.
    pub ts: u64,
    pub outcome: Outcome,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<StatsSeverity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatsEvent {
    fn success(ctx: &StatsContext, stats: CollectStats) -> Self {
        Self {
            ts: unix_ts(),
            outcome: Outcome::Ok,
            source: ctx.source.to_string(),
            records: Some(stats.records),
            severity: None,
            error: None,
        }
    }

    fn failure(outcome: Outcome, ctx: &StatsContext, severity: StatsSeverity, error: &StatsError) -> Self {
        Self {
            ts: unix_ts(),
            outcome,
            source: ctx.source.to_string(),
            records: None,
            severity: Some(severity),
            error: Some(error.to_string()),
        }
    }
}

/// Emits collection events through the `log` facade.
///
/// Successes log at `info`; failures at [`StatsSeverity::log_level`]; alerts always at `error`.
/// All events use the configured target, `haproxy_stats::collect` by default.
#[derive(Debug, Clone)]
pub struct LogObserver {
    target: String,
}

impl LogObserver {
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into() }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new("haproxy_stats::collect")
    }
}

impl StatsObserver for LogObserver {
    fn on_success(&self, ctx: &StatsContext, stats: CollectStats) {
        log!(target: self.target.as_str(), Level::Info, "collected {} records from {}", stats.records, ctx.source);
    }

    fn on_failure(&self, ctx: &StatsContext, severity: StatsSeverity, error: &StatsError) {
        log!(
            target: self.target.as_str(),
            severity.log_level(),
            "collecting from {} failed ({severity:?}): {error}",
            ctx.source
        );
    }

    fn on_alert(&self, ctx: &StatsContext, severity: StatsSeverity, error: &StatsError) {
        log!(
            target: self.target.as_str(),
            Level::Error,
            "ALERT: collecting from {} failed ({severity:?}): {error}",
            ctx.source
        );
    }
}

/// Appends collection events to a file, one JSON object per line.
///
/// A file that cannot be opened or written is reported through `log::warn!` and the event is
/// dropped; collection itself never fails because of the observer.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(&self, event: &StatsEvent) {
        if let Err(err) = self.append(event) {
            warn!("dropping stats event for {}: cannot write {}: {err}", event.source, self.path.display());
        }
    }

    fn append(&self, event: &StatsEvent) -> io::Result<()> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(&line)
    }
}

impl StatsObserver for FileObserver {
    fn on_success(&self, ctx: &StatsContext, stats: CollectStats) {
        self.record(&StatsEvent::success(ctx, stats));
    }

    fn on_failure(&self, ctx: &StatsContext, severity: StatsSeverity, error: &StatsError) {
        self.record(&StatsEvent::failure(Outcome::Fail, ctx, severity, error));
    }

    fn on_alert(&self, ctx: &StatsContext, severity: StatsSeverity, error: &StatsError) {
        self.record(&StatsEvent::failure(Outcome::Alert, ctx, severity, error));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
