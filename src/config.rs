//! Run configuration, built once at startup.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use tracing::debug;

use crate::block::BlockSet;
use crate::error::{FilterError, Result};
use crate::matcher::{Filter, FilterChain, InternalFilter, ProviderFilter};
use crate::processor::{Mode, Processor};

/// Default worker pool size
pub const DEFAULT_PROCS: i64 = 10;

/// Where a filter's ranges come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSource {
    /// Table compiled into the binary
    Builtin,
    /// Newline-delimited CIDR file read at startup
    File(PathBuf),
}

impl RangeSource {
    /// File source if a path is given, otherwise the built-in table.
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map_or(RangeSource::Builtin, RangeSource::File)
    }
}

/// Everything a run needs, fixed before any input is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mode: Mode,
    pub procs: NonZeroUsize,
    pub internal: Option<RangeSource>,
    pub cloudflare: Option<RangeSource>,
    pub s3: Option<RangeSource>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            procs: NonZeroUsize::new(DEFAULT_PROCS as usize).unwrap_or(NonZeroUsize::MIN),
            internal: None,
            cloudflare: None,
            s3: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count; anything below 1 is a usage error.
    pub fn with_procs(mut self, procs: i64) -> Result<Self> {
        self.procs = usize::try_from(procs)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or(FilterError::InvalidProcs(procs))?;
        Ok(self)
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_internal(mut self, source: RangeSource) -> Self {
        self.internal = Some(source);
        self
    }

    pub fn with_cloudflare(mut self, source: RangeSource) -> Self {
        self.cloudflare = Some(source);
        self
    }

    pub fn with_s3(mut self, source: RangeSource) -> Self {
        self.s3 = Some(source);
        self
    }

    /// Build the filter chain: internal, then cloudflare, then s3.
    ///
    /// Any malformed table fails the whole build.
    pub fn build_filters(&self) -> Result<FilterChain> {
        let mut chain = FilterChain::new();

        if let Some(source) = &self.internal {
            let filter = match source {
                RangeSource::Builtin => InternalFilter::builtin()?,
                RangeSource::File(path) => InternalFilter::new(BlockSet::from_file(path)?),
            };
            chain.push(filter);
        }

        if let Some(source) = &self.cloudflare {
            let filter = match source {
                RangeSource::Builtin => ProviderFilter::cloudflare()?,
                RangeSource::File(path) => ProviderFilter::new("cloudflare", BlockSet::from_file(path)?),
            };
            chain.push(filter);
        }

        if let Some(source) = &self.s3 {
            let filter = match source {
                RangeSource::Builtin => ProviderFilter::s3()?,
                RangeSource::File(path) => ProviderFilter::new("s3", BlockSet::from_file(path)?),
            };
            chain.push(filter);
        }

        for filter in chain.iter() {
            let blocks = match filter {
                Filter::Internal(f) => f.blocks().len(),
                Filter::Provider(f) => f.blocks().len(),
            };
            debug!(filter = filter.name(), blocks, "filter attached");
        }

        Ok(chain)
    }

    pub fn build_processor(&self) -> Result<Processor> {
        Ok(Processor::new(self.build_filters()?, self.mode))
    }
}
