//! Memory access traces.
//!
//! A trace is plain text with one record per line:
//!
//! ```text
//! <hex-address> <operation> <cycle>
//! ```
//!
//! [`TraceReader`] streams records from any [`BufRead`]. Reading stops at the
//! first line that is not a valid record, exactly as it stops at the end of the
//! input; [`TraceReader::end`] tells the two apart afterwards.

use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use std::io::BufRead;

/// A single memory access.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    /// Linear address
    pub address: u64,
    /// Operation tag, e.g. `READ`, `WRITE` or `NEI_ACT`
    pub operation: String,
    /// Issue cycle
    pub cycle: u64,
}

impl AccessRecord {
    /// Creates a new access record.
    pub fn new(address: u64, operation: impl Into<String>, cycle: u64) -> Self {
        AccessRecord {
            address,
            operation: operation.into(),
            cycle,
        }
    }
}

impl Display for AccessRecord {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "0x{:x} {} {}", self.address, self.operation, self.cycle)
    }
}

/// A record read from an input trace, together with the address as it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLine {
    /// Address text as found in the trace
    pub raw_address: String,
    /// Parsed record
    pub record: AccessRecord,
}

/// Echoes the line with its original address text.
impl Display for TraceLine {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.raw_address, self.record.operation, self.record.cycle
        )
    }
}

impl TraceLine {
    /// Parses a single trace line.
    ///
    /// Returns `None` unless the line consists of exactly a hexadecimal address
    /// (with optional `0x` prefix), an operation tag and a decimal cycle.
    pub fn parse(line: &str) -> Option<TraceLine> {
        let mut tokens = line.split_whitespace();
        let (raw_address, operation, cycle) = (tokens.next()?, tokens.next()?, tokens.next()?);
        if tokens.next().is_some() {
            return None;
        }
        let address = parse_hex_address(raw_address)?;
        let cycle = cycle.parse().ok()?;
        Some(TraceLine {
            raw_address: raw_address.to_string(),
            record: AccessRecord::new(address, operation, cycle),
        })
    }
}

/// Parses a hexadecimal address with optional `0x` or `0X` prefix.
pub fn parse_hex_address(text: &str) -> Option<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16).ok()
}

/// Why a [`TraceReader`] stopped producing records.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub enum TraceEnd {
    /// The input was exhausted.
    Exhausted,
    /// A line could not be parsed as a record.
    Malformed {
        /// 1-based line number
        line: usize,
        /// Offending line
        content: String,
    },
    /// The underlying reader failed.
    ReadFailed {
        /// 1-based line number of the failed read
        line: usize,
        /// Error description
        error: String,
    },
}

impl Display for TraceEnd {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            TraceEnd::Exhausted => write!(f, "end of trace"),
            TraceEnd::Malformed { line, content } => {
                write!(f, "malformed record in line {}: {:?}", line, content)
            }
            TraceEnd::ReadFailed { line, error } => {
                write!(f, "read failed in line {}: {}", line, error)
            }
        }
    }
}

/// Streaming reader over trace records.
///
/// Blank lines are skipped. Once the reader has stopped it keeps returning `None`.
pub struct TraceReader<R> {
    inner: R,
    line: usize,
    buf: String,
    end: Option<TraceEnd>,
}

impl<R: BufRead> TraceReader<R> {
    /// Creates a reader over `inner`.
    pub fn new(inner: R) -> Self {
        TraceReader {
            inner,
            line: 0,
            buf: String::new(),
            end: None,
        }
    }

    /// Returns why the reader stopped, or `None` while records may still follow.
    pub fn end(&self) -> Option<&TraceEnd> {
        self.end.as_ref()
    }

    /// Number of lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = TraceLine;

    fn next(&mut self) -> Option<TraceLine> {
        if self.end.is_some() {
            return None;
        }
        loop {
            self.buf.clear();
            match self.inner.read_line(&mut self.buf) {
                Ok(0) => {
                    self.end = Some(TraceEnd::Exhausted);
                    return None;
                }
                Ok(_) => self.line += 1,
                Err(e) => {
                    self.end = Some(TraceEnd::ReadFailed {
                        line: self.line + 1,
                        error: e.to_string(),
                    });
                    return None;
                }
            }
            if self.buf.trim().is_empty() {
                continue;
            }
            return match TraceLine::parse(&self.buf) {
                Some(line) => Some(line),
                None => {
                    self.end = Some(TraceEnd::Malformed {
                        line: self.line,
                        content: self.buf.trim_end().to_string(),
                    });
                    None
                }
            };
        }
    }
}
