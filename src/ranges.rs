//! Built-in range tables, embedded at compile time from `data/`.

/// Loopback, RFC1918, link-local and IPv6 unique-local ranges.
pub const INTERNAL: &str = include_str!("../data/internal.txt");

/// Cloudflare's published edge ranges.
pub const CLOUDFLARE: &str = include_str!("../data/cloudflare.txt");

/// Amazon S3's published ranges.
pub const S3: &str = include_str!("../data/s3.txt");

/// Source names used in log and error messages.
pub const INTERNAL_SOURCE: &str = "internal.txt";
pub const CLOUDFLARE_SOURCE: &str = "cloudflare.txt";
pub const S3_SOURCE: &str = "s3.txt";
