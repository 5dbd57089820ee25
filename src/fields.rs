//! Field decoding rules and the column dictionary.
//!
//! A [`Field`] pairs a canonical output name with a [`FieldKind`] that coerces raw column
//! text into a [`Value`]. A [`FieldDictionary`] maps `show stat` source column names to
//! fields; columns missing from the dictionary are ignored during decoding.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::StatsResult;
use crate::types::Value;

/// A column value could not be coerced into its field's kind.
///
/// The decoder omits the field from the record; this never aborts a decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse field '{field}': {message} (raw='{raw}')")]
pub struct FieldError {
    pub field: String,
    pub raw: String,
    pub message: String,
}

/// How a field's raw text is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Identity: the raw text is kept as-is.
    Text,
    /// Base-10 signed 64-bit integer.
    Number,
}

impl FieldKind {
    fn decode(self, raw: &str) -> Result<Value, String> {
        match self {
            Self::Text => Ok(Value::Utf8(raw.to_owned())),
            Self::Number => raw.parse::<i64>().map(Value::Int64).map_err(|e| e.to_string()),
        }
    }
}

/// A named, typed decoding rule for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    name: String,
    kind: FieldKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// A text field published under `name`.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// An integer field published under `name`.
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    /// Canonical output key.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Coerce a raw column value.
    ///
    /// Text fields always succeed. Number fields fail on anything that is not a base-10
    /// `i64`, including the empty string; whitespace is not trimmed.
    pub fn decode(&self, raw: &str) -> Result<Value, FieldError> {
        self.kind.decode(raw).map_err(|message| FieldError {
            field: self.name.clone(),
            raw: raw.to_owned(),
            message,
        })
    }
}

/// Mapping from source CSV column name to [`Field`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldDictionary {
    fields: BTreeMap<String, Field>,
}

impl FieldDictionary {
    /// An empty dictionary. Decoding with it yields records with no keys.
    pub fn empty() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// The HAProxy `show stat` columns mapped to camelCase names.
    pub fn haproxy() -> Self {
        HAPROXY_COLUMNS
            .iter()
            .map(|&(column, name, kind)| (column, Field::new(name, kind)))
            .collect()
    }

    /// Parse a dictionary from JSON: `{"svname": {"name": "name", "kind": "text"}, ...}`.
    pub fn from_json_str(json: &str) -> StatsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a dictionary from a JSON file (see [`Self::from_json_str`]).
    pub fn from_json_path(path: impl AsRef<Path>) -> StatsResult<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    /// Insert a rule for `column`, returning the previous rule if any.
    pub fn insert(&mut self, column: impl Into<String>, field: Field) -> Option<Field> {
        self.fields.insert(column.into(), field)
    }

    /// Builder-style [`Self::insert`].
    pub fn with_field(mut self, column: impl Into<String>, field: Field) -> Self {
        self.insert(column, field);
        self
    }

    pub fn remove(&mut self, column: &str) -> Option<Field> {
        self.fields.remove(column)
    }

    /// Look up the rule for a source column.
    pub fn get(&self, column: &str) -> Option<&Field> {
        self.fields.get(column)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate `(source column, field)` pairs in column-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(c, f)| (c.as_str(), f))
    }
}

impl Default for FieldDictionary {
    fn default() -> Self {
        Self::haproxy()
    }
}

impl<C: Into<String>> FromIterator<(C, Field)> for FieldDictionary {
    fn from_iter<I: IntoIterator<Item = (C, Field)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(c, f)| (c.into(), f)).collect(),
        }
    }
}

use FieldKind::{Number, Text};

// Column order follows the management guide's CSV section.
const HAPROXY_COLUMNS: &[(&str, &str, FieldKind)] = &[
    ("pxname", "proxy", Text),
    ("svname", "name", Text),
    ("qcur", "currentQueued", Number),
    ("qmax", "maxQueued", Number),
    ("scur", "currentSessions", Number),
    ("smax", "maxSessions", Number),
    ("slim", "sessionLimit", Number),
    ("stot", "totalSessions", Number),
    ("bin", "bytesIn", Number),
    ("bout", "bytesOut", Number),
    ("dreq", "deniedRequests", Number),
    ("dresp", "deniedResponses", Number),
    ("ereq", "requestErrors", Number),
    ("econ", "connectionErrors", Number),
    ("eresp", "responseErrors", Number),
    ("wretr", "retries", Number),
    ("wredis", "redispatches", Number),
    ("status", "status", Text),
    ("weight", "weight", Number),
    ("act", "activeServers", Number),
    ("bck", "backupServers", Number),
    ("chkfail", "checkFailures", Number),
    ("chkdown", "checkDowns", Number),
    ("lastchg", "lastStatusChange", Number),
    ("downtime", "downtime", Number),
    ("qlimit", "queueLimit", Number),
    ("pid", "processId", Number),
    ("iid", "proxyId", Number),
    ("sid", "serviceId", Number),
    ("throttle", "throttle", Number),
    ("lbtot", "loadBalancedTotal", Number),
    ("tracked", "tracked", Text),
    ("type", "type", Number),
    ("rate", "sessionRate", Number),
    ("rate_lim", "sessionRateLimit", Number),
    ("rate_max", "sessionRateMax", Number),
    ("check_status", "checkStatus", Text),
    ("check_code", "checkCode", Number),
    ("check_duration", "checkDuration", Number),
    ("hrsp_1xx", "httpResponse1xx", Number),
    ("hrsp_2xx", "httpResponse2xx", Number),
    ("hrsp_3xx", "httpResponse3xx", Number),
    ("hrsp_4xx", "httpResponse4xx", Number),
    ("hrsp_5xx", "httpResponse5xx", Number),
    ("hrsp_other", "httpResponseOther", Number),
    ("hanafail", "failedHealthChecks", Number),
    ("req_rate", "requestRate", Number),
    ("req_rate_max", "requestRateMax", Number),
    ("req_tot", "requestTotal", Number),
    ("cli_abrt", "clientAborts", Number),
    ("srv_abrt", "serverAborts", Number),
    ("comp_in", "compressionIn", Number),
    ("comp_out", "compressionOut", Number),
    ("comp_byp", "compressionBypassed", Number),
    ("comp_rsp", "compressionResponses", Number),
    ("lastsess", "lastSession", Number),
    ("last_chk", "lastCheck", Text),
    ("last_agt", "lastAgentCheck", Text),
    ("qtime", "queueTime", Number),
    ("ctime", "connectTime", Number),
    ("rtime", "responseTime", Number),
    ("ttime", "totalTime", Number),
    ("agent_status", "agentStatus", Text),
    ("agent_code", "agentCode", Number),
    ("agent_duration", "agentDuration", Number),
    ("check_desc", "checkDescription", Text),
    ("agent_desc", "agentDescription", Text),
    ("check_rise", "checkRise", Number),
    ("check_fall", "checkFall", Number),
    ("check_health", "checkHealth", Number),
    ("agent_rise", "agentRise", Number),
    ("agent_fall", "agentFall", Number),
    ("agent_health", "agentHealth", Number),
    ("addr", "address", Text),
    ("cookie", "cookie", Text),
    ("mode", "mode", Text),
    ("algo", "algorithm", Text),
    ("conn_rate", "connectionRate", Number),
    ("conn_rate_max", "connectionRateMax", Number),
    ("conn_tot", "connectionsTotal", Number),
    ("intercepted", "intercepted", Number),
    ("dcon", "deniedConnections", Number),
    ("dses", "deniedSessions", Number),
    ("wrew", "rewriteFailures", Number),
    ("connect", "connectionAttempts", Number),
    ("reuse", "connectionReuses", Number),
    ("cache_lookups", "cacheLookups", Number),
    ("cache_hits", "cacheHits", Number),
    ("srv_icur", "idleConnections", Number),
    ("srv_ilim", "idleConnectionLimit", Number),
    ("qtime_max", "queueTimeMax", Number),
    ("ctime_max", "connectTimeMax", Number),
    ("rtime_max", "responseTimeMax", Number),
    ("ttime_max", "totalTimeMax", Number),
    ("eint", "internalErrors", Number),
    ("idle_conn_cur", "unsafeIdleConnections", Number),
    ("safe_conn_cur", "safeIdleConnections", Number),
    ("used_conn_cur", "usedConnections", Number),
    ("need_conn_est", "neededConnections", Number),
    ("uweight", "userWeight", Number),
    ("agg_server_status", "aggregatedServerStatus", Number),
    ("agg_check_status", "aggregatedCheckStatus", Number),
    ("srid", "serverId", Number),
    ("sess_other", "sessionsOther", Number),
    ("h1sess", "sessionsHttp1", Number),
    ("h2sess", "sessionsHttp2", Number),
    ("h3sess", "sessionsHttp3", Number),
    ("req_other", "requestsOther", Number),
    ("h1req", "requestsHttp1", Number),
    ("h2req", "requestsHttp2", Number),
    ("h3req", "requestsHttp3", Number),
    ("proto", "protocol", Text),
];
