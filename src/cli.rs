//! Command line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, RangeSource, DEFAULT_PROCS};
use crate::error::Result;
use crate::processor::Mode;

/// Filter IP addresses read from stdin against internal and cloud provider ranges.
///
/// By default lines that match an enabled filter are dropped and everything
/// else (including lines that are not addresses) is printed.
#[derive(Parser, Debug, Clone)]
#[command(name = "ipfilter", version, about)]
pub struct Cli {
    /// Print only lines that matched a filter
    #[arg(long)]
    pub show: bool,

    /// Filter internal IPs (loopback, private, link-local)
    #[arg(long = "int")]
    pub internal: bool,

    /// Filter Cloudflare IPs
    #[arg(long)]
    pub cf: bool,

    /// Filter Amazon S3 IPs
    #[arg(long)]
    pub s3: bool,

    /// Number of concurrent workers
    #[arg(long, default_value_t = DEFAULT_PROCS, allow_negative_numbers = true)]
    pub procs: i64,

    /// Read internal ranges from a file instead of the built-in table (implies --int)
    #[arg(long, value_name = "PATH")]
    pub int_file: Option<PathBuf>,

    /// Read Cloudflare ranges from a file instead of the built-in table (implies --cf)
    #[arg(long, value_name = "PATH")]
    pub cf_file: Option<PathBuf>,

    /// Read S3 ranges from a file instead of the built-in table (implies --s3)
    #[arg(long, value_name = "PATH")]
    pub s3_file: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Turn parsed flags into a validated [`Config`].
    pub fn to_config(&self) -> Result<Config> {
        let mut config = Config::new()
            .with_procs(self.procs)?
            .with_mode(Mode::from_show(self.show));

        if self.internal || self.int_file.is_some() {
            config = config.with_internal(RangeSource::from_path(self.int_file.clone()));
        }
        if self.cf || self.cf_file.is_some() {
            config = config.with_cloudflare(RangeSource::from_path(self.cf_file.clone()));
        }
        if self.s3 || self.s3_file.is_some() {
            config = config.with_s3(RangeSource::from_path(self.s3_file.clone()));
        }

        Ok(config)
    }
}
