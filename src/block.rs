//! Block sets: ordered lists of network prefixes for one filter category.

use std::fs;
use std::net::IpAddr;
use std::path::Path;

use ipnet::IpNet;
use tracing::debug;

use crate::error::{FilterError, Result};

/// Prefix that marks a comment line in range tables.
pub const COMMENT_PREFIX: &str = "//";

/// An ordered, immutable set of network blocks.
///
/// Every block is truncated to its prefix length on construction, so
/// `10.1.2.3/8` is stored as `10.0.0.0/8`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSet {
    source: String,
    blocks: Vec<IpNet>,
}

impl BlockSet {
    /// Build a block set from already parsed networks.
    pub fn from_networks(source: impl Into<String>, networks: impl IntoIterator<Item = IpNet>) -> Self {
        Self {
            source: source.into(),
            blocks: networks.into_iter().map(|net| net.trunc()).collect(),
        }
    }

    /// Parse a newline-delimited range table.
    ///
    /// One CIDR per line. Blank lines and lines starting with `//` are
    /// skipped. Any other line that is not a valid CIDR fails the whole
    /// set; `source` names the table in the error.
    pub fn parse(source: &str, text: &str) -> Result<Self> {
        let mut blocks = Vec::new();

        for (line_num, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
                continue;
            }

            let net: IpNet = line.parse().map_err(|reason| FilterError::InvalidCidr {
                source_name: source.to_string(),
                line: line_num + 1,
                entry: line.to_string(),
                reason,
            })?;
            blocks.push(net.trunc());
        }

        debug!(source, blocks = blocks.len(), "parsed block set");

        Ok(Self {
            source: source.to_string(),
            blocks,
        })
    }

    /// Read and parse a range table from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| FilterError::RangeFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&path.display().to_string(), &text)
    }

    /// Check whether `ip` falls inside any block.
    ///
    /// Families never cross: an IPv4 address only matches IPv4 blocks.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.blocks.iter().any(|block| match (block, ip) {
            (IpNet::V4(net), IpAddr::V4(v4)) => net.contains(v4),
            (IpNet::V6(net), IpAddr::V6(v6)) => net.contains(v6),
            _ => false,
        })
    }

    /// Name of the table this set was built from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IpNet> {
        self.blocks.iter()
    }
}
