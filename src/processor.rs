//! Per-line classification and emission.

use std::io::{self, Write};
use std::net::IpAddr;

use crate::matcher::FilterChain;

/// Output policy for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Print lines that matched no filter
    #[default]
    HideMatches,
    /// Print lines that matched at least one filter
    ShowMatches,
}

impl Mode {
    pub fn from_show(show: bool) -> Self {
        if show {
            Mode::ShowMatches
        } else {
            Mode::HideMatches
        }
    }

    pub fn shows_matches(self) -> bool {
        matches!(self, Mode::ShowMatches)
    }
}

/// Applies a filter chain to input lines.
///
/// Immutable once built; share it between workers behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Processor {
    filters: FilterChain,
    mode: Mode,
}

impl Processor {
    pub fn new(filters: FilterChain, mode: Mode) -> Self {
        Self { filters, mode }
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether `line` parses as an address that some filter claims.
    ///
    /// Lines that are not addresses are unmatched. IPv4-mapped IPv6
    /// addresses (`::ffff:a.b.c.d`) are classified as the IPv4 address.
    pub fn classify(&self, line: &str) -> bool {
        let ip = line.parse::<IpAddr>().ok().map(|ip| ip.to_canonical());
        self.filters.classify(ip.as_ref())
    }

    /// [`classify`](Self::classify) for raw input. Bytes that are not
    /// UTF-8 cannot be an address, so they are unmatched.
    pub fn classify_bytes(&self, line: &[u8]) -> bool {
        match std::str::from_utf8(line) {
            Ok(line) => self.classify(line),
            Err(_) => false,
        }
    }

    /// The line to emit, newline terminated, or `None` to suppress it.
    pub fn process_line(&self, line: &str) -> Option<String> {
        if self.classify(line) != self.mode.shows_matches() {
            return None;
        }
        Some(format!("{line}\n"))
    }

    /// Byte-for-byte form of [`process_line`](Self::process_line).
    pub fn process_bytes(&self, line: &[u8]) -> Option<Vec<u8>> {
        if self.classify_bytes(line) != self.mode.shows_matches() {
            return None;
        }
        let mut out = Vec::with_capacity(line.len() + 1);
        out.extend_from_slice(line);
        out.push(b'\n');
        Some(out)
    }

    /// Write the line to `out` if it should be emitted.
    ///
    /// Returns whether anything was written.
    pub fn process_into<W: Write + ?Sized>(&self, line: &[u8], out: &mut W) -> io::Result<bool> {
        match self.process_bytes(line) {
            Some(emitted) => {
                out.write_all(&emitted)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
