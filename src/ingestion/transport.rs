//! Stream acquisition: stats sockets and saved `show stat` dumps.
//!
//! Both paths hand the opened stream to [`super::csv::decode_from_reader`] and drop it before
//! returning, so the socket or file is closed on success and on every error path.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{StatsError, StatsResult};
use crate::types::RecordSet;

use super::csv::decode_from_reader;
use super::unified::StatsOptions;

/// Command sent to the stats socket.
pub const STAT_COMMAND: &[u8] = b"show stat\n";

/// Stream transport used to reach a stats socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    /// Unix domain socket; the address is a filesystem path.
    Unix,
    /// TCP; the address is `host:port`.
    Tcp,
}

/// Returned when parsing an unknown [`NetworkMode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown network mode '{0}' (expected unix, tcp, tcp4 or tcp6)")]
pub struct UnknownNetworkMode(pub String);

impl FromStr for NetworkMode {
    type Err = UnknownNetworkMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unix" => Ok(Self::Unix),
            "tcp" | "tcp4" | "tcp6" => Ok(Self::Tcp),
            _ => Err(UnknownNetworkMode(s.to_owned())),
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix => f.write_str("unix"),
            Self::Tcp => f.write_str("tcp"),
        }
    }
}

/// Decode a saved `show stat` dump.
pub fn decode_from_file(path: impl AsRef<Path>, options: &StatsOptions) -> StatsResult<RecordSet> {
    let path = path.as_ref();
    let file = File::open(path)?;
    debug!("decoding stats from {}", path.display());
    decode_from_reader(BufReader::new(file), options)
}

/// Dial a stats socket, send `show stat` and decode the reply.
///
/// For TCP, `timeout` bounds the connect. Once connected, the whole exchange (command write
/// and every read) must finish within `timeout`; an expired deadline surfaces as
/// [`StatsError::Stream`] (or [`StatsError::Io`] if it hits the write) and no records are
/// returned.
pub fn fetch_over_network(
    mode: NetworkMode,
    address: &str,
    timeout: Duration,
    options: &StatsOptions,
) -> StatsResult<RecordSet> {
    match mode {
        NetworkMode::Tcp => {
            let stream = dial_tcp(address, timeout)?;
            exchange(stream, timeout, options)
        }
        #[cfg(unix)]
        NetworkMode::Unix => {
            let stream = UnixStream::connect(address).map_err(|source| StatsError::Connection {
                address: address.to_owned(),
                source,
            })?;
            exchange(stream, timeout, options)
        }
        #[cfg(not(unix))]
        NetworkMode::Unix => Err(StatsError::Connection {
            address: address.to_owned(),
            source: io::Error::new(io::ErrorKind::Unsupported, "unix sockets are not supported"),
        }),
    }
}

fn dial_tcp(address: &str, timeout: Duration) -> StatsResult<TcpStream> {
    let connection_error = |source| StatsError::Connection {
        address: address.to_owned(),
        source,
    };

    let mut last_err = None;
    for addr in address.to_socket_addrs().map_err(connection_error)? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(connection_error(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing")
    })))
}

fn exchange<S: TimeoutStream>(stream: S, timeout: Duration, options: &StatsOptions) -> StatsResult<RecordSet> {
    let mut conn = Deadline::new(stream, timeout);
    conn.write_all(STAT_COMMAND)?;
    conn.flush()?;
    debug!("sent show stat, decoding reply");
    decode_from_reader(conn, options)
}

/// Socket types whose per-operation timeouts can be adjusted.
trait TimeoutStream: Read + Write {
    fn set_read_timeout(&self, dur: Option<Duration>) -> io::Result<()>;
    fn set_write_timeout(&self, dur: Option<Duration>) -> io::Result<()>;
}

impl TimeoutStream for TcpStream {
    fn set_read_timeout(&self, dur: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, dur)
    }

    fn set_write_timeout(&self, dur: Option<Duration>) -> io::Result<()> {
        TcpStream::set_write_timeout(self, dur)
    }
}

#[cfg(unix)]
impl TimeoutStream for UnixStream {
    fn set_read_timeout(&self, dur: Option<Duration>) -> io::Result<()> {
        UnixStream::set_read_timeout(self, dur)
    }

    fn set_write_timeout(&self, dur: Option<Duration>) -> io::Result<()> {
        UnixStream::set_write_timeout(self, dur)
    }
}

/// Wraps a socket with an absolute deadline shared by all reads and writes.
///
/// std sockets only offer per-call timeouts, so each call is given the time remaining.
struct Deadline<S> {
    inner: S,
    deadline: Instant,
}

impl<S: TimeoutStream> Deadline<S> {
    fn new(inner: S, timeout: Duration) -> Self {
        Self {
            inner,
            deadline: Instant::now() + timeout,
        }
    }

    fn remaining(&self) -> io::Result<Duration> {
        let left = self.deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "stats socket deadline exceeded"));
        }
        Ok(left)
    }
}

impl<S: TimeoutStream> Read for Deadline<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let left = self.remaining()?;
        self.inner.set_read_timeout(Some(left))?;
        self.inner.read(buf)
    }
}

impl<S: TimeoutStream> Write for Deadline<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let left = self.remaining()?;
        self.inner.set_write_timeout(Some(left))?;
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
