use std::net::IpAddr;

use super::AddressMatcher;
use crate::block::BlockSet;
use crate::error::Result;
use crate::ranges;

/// Named provider filter - matches addresses inside the provider's published ranges
#[derive(Debug, Clone)]
pub struct ProviderFilter {
    name: String,
    blocks: BlockSet,
}

impl ProviderFilter {
    pub fn new(name: impl Into<String>, blocks: BlockSet) -> Self {
        Self {
            name: name.into(),
            blocks,
        }
    }

    /// Cloudflare edge ranges from the compiled-in table.
    pub fn cloudflare() -> Result<Self> {
        let blocks = BlockSet::parse(ranges::CLOUDFLARE_SOURCE, ranges::CLOUDFLARE)?;
        Ok(Self::new("cloudflare", blocks))
    }

    /// Amazon S3 ranges from the compiled-in table.
    pub fn s3() -> Result<Self> {
        let blocks = BlockSet::parse(ranges::S3_SOURCE, ranges::S3)?;
        Ok(Self::new("s3", blocks))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blocks(&self) -> &BlockSet {
        &self.blocks
    }
}

impl AddressMatcher for ProviderFilter {
    fn matches(&self, ip: &IpAddr) -> bool {
        self.blocks.contains(ip)
    }
}
