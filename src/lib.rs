//! ipfilter - filter streams of IP addresses against static CIDR tables
//!
//! Lines are read one at a time, parsed as IPv4/IPv6 addresses and checked
//! against the enabled filters:
//! - Internal: loopback, RFC1918, link-local, IPv6 unique-local
//! - Cloudflare: published edge ranges
//! - S3: Amazon S3 published ranges
//!
//! A line that is not an address never matches. Depending on the [`Mode`],
//! either matching or non-matching lines are printed verbatim.
//!
//! # Example
//!
//! ```rust
//! use ipfilter::{FilterChain, InternalFilter, Mode, Processor, ProviderFilter};
//!
//! let filters = FilterChain::new()
//!     .with(InternalFilter::builtin().unwrap())
//!     .with(ProviderFilter::cloudflare().unwrap());
//! let processor = Processor::new(filters, Mode::HideMatches);
//!
//! assert_eq!(processor.process_line("8.8.8.8"), Some("8.8.8.8\n".to_string()));
//! assert_eq!(processor.process_line("192.168.0.12"), None);
//! assert_eq!(processor.process_line("104.16.52.111"), None);
//! assert_eq!(processor.process_line("not an ip"), Some("not an ip\n".to_string()));
//! ```
//!
//! # Range Tables
//!
//! One CIDR per line, `//` comments and blank lines ignored:
//! ```text
//! // RFC1918
//! 10.0.0.0/8
//! 172.16.0.0/12
//! 192.168.0.0/16
//! ```

pub mod block;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod matcher;
pub mod processor;
pub mod ranges;

// Re-export commonly used items
pub use block::BlockSet;
pub use cli::Cli;
pub use config::{Config, RangeSource, DEFAULT_PROCS};
pub use dispatcher::{CancelToken, DispatchState, DispatchStats, Dispatcher};
pub use error::{ErrorKind, FilterError, Result};
pub use matcher::{AddressMatcher, Filter, FilterChain, InternalFilter, ProviderFilter};
pub use processor::{Mode, Processor};
