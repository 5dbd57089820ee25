//! Strict quote checking for `show stat` CSV.
//!
//! The `csv` reader accepts any byte sequence: a quote left open at end of input just ends the
//! field, and a `"` inside an unquoted field is kept as data. [`QuoteCheck`] sits between the
//! stream and the CSV reader and fails the read as soon as the input breaks the quoting rules.

use std::io::{self, Read};

use thiserror::Error;

/// Which quoting rule was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteErrorKind {
    /// A `"` appeared inside an unquoted field.
    BareQuote,
    /// A closing `"` was followed by something other than `"`, `,` or a line end.
    ExtraneousQuote,
    /// The input ended inside a quoted field.
    Unterminated,
}

/// A row violates the CSV quoting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{} on line {line}", describe(.kind))]
pub struct QuoteError {
    /// 1-based input line; the header is line 1. For unterminated fields, the line the quote
    /// was opened on.
    pub line: u64,
    pub kind: QuoteErrorKind,
}

fn describe(kind: &QuoteErrorKind) -> &'static str {
    match kind {
        QuoteErrorKind::BareQuote => "bare \" in non-quoted field",
        QuoteErrorKind::ExtraneousQuote => "extraneous or missing \" in quoted field",
        QuoteErrorKind::Unterminated => "unterminated quoted field",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    /// Saw `"` inside a quoted field: either an escaped quote or the closing one.
    QuoteInQuoted,
    /// Closing quote followed by `\r`; only `\n` may come next.
    ClosedCr,
}

/// Incremental quote validator, fed one chunk at a time.
#[derive(Debug)]
struct Scanner {
    state: State,
    line: u64,
    quote_line: u64,
}

impl Scanner {
    fn new() -> Self {
        Self {
            state: State::FieldStart,
            line: 1,
            quote_line: 1,
        }
    }

    fn feed(&mut self, chunk: &[u8]) -> Result<(), QuoteError> {
        for &b in chunk {
            self.state = match (self.state, b) {
                (State::FieldStart, b'"') => {
                    self.quote_line = self.line;
                    State::Quoted
                }
                (State::FieldStart | State::Unquoted, b',') => State::FieldStart,
                (State::FieldStart | State::Unquoted, b'\n') => State::FieldStart,
                (State::Unquoted, b'"') => return Err(self.error(QuoteErrorKind::BareQuote)),
                (State::FieldStart | State::Unquoted, _) => State::Unquoted,
                (State::Quoted, b'"') => State::QuoteInQuoted,
                (State::Quoted, _) => State::Quoted,
                (State::QuoteInQuoted, b'"') => State::Quoted,
                (State::QuoteInQuoted, b',' | b'\n') => State::FieldStart,
                (State::QuoteInQuoted, b'\r') => State::ClosedCr,
                (State::ClosedCr, b'\n') => State::FieldStart,
                (State::QuoteInQuoted | State::ClosedCr, _) => {
                    return Err(self.error(QuoteErrorKind::ExtraneousQuote));
                }
            };
            if b == b'\n' {
                self.line += 1;
            }
        }
        Ok(())
    }

    fn finish(&self) -> Result<(), QuoteError> {
        if self.state == State::Quoted {
            return Err(QuoteError {
                line: self.quote_line,
                kind: QuoteErrorKind::Unterminated,
            });
        }
        Ok(())
    }

    fn error(&self, kind: QuoteErrorKind) -> QuoteError {
        QuoteError {
            line: self.line,
            kind,
        }
    }
}

/// Reader adapter that validates quoting on the bytes passing through.
///
/// A violation is returned as an [`io::ErrorKind::InvalidData`] error wrapping a
/// [`QuoteError`]; see [`QuoteError::from_io`] to recover it.
pub(crate) struct QuoteCheck<R> {
    inner: R,
    scanner: Scanner,
}

impl<R: Read> QuoteCheck<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            scanner: Scanner::new(),
        }
    }
}

impl<R: Read> Read for QuoteCheck<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        let checked = if n == 0 {
            self.scanner.finish()
        } else {
            self.scanner.feed(&buf[..n])
        };
        checked.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(n)
    }
}

impl QuoteError {
    /// Recover a quote violation raised by [`QuoteCheck`], or hand the error back unchanged.
    pub(crate) fn from_io(err: io::Error) -> Result<Self, io::Error> {
        let found = err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<QuoteError>())
            .copied();
        found.ok_or(err)
    }
}
