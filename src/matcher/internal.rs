use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::AddressMatcher;
use crate::block::BlockSet;
use crate::error::Result;
use crate::ranges;

/// Internal/private address filter.
///
/// Loopback, link-local unicast and link-local multicast addresses are
/// recognised structurally before the block set is scanned, so they match
/// even when the range table leaves them out.
#[derive(Debug, Clone)]
pub struct InternalFilter {
    blocks: BlockSet,
}

impl InternalFilter {
    pub fn new(blocks: BlockSet) -> Self {
        Self { blocks }
    }

    /// Filter over the compiled-in private ranges.
    pub fn builtin() -> Result<Self> {
        let blocks = BlockSet::parse(ranges::INTERNAL_SOURCE, ranges::INTERNAL)?;
        Ok(Self::new(blocks))
    }

    pub fn blocks(&self) -> &BlockSet {
        &self.blocks
    }

    fn is_structurally_internal(ip: &IpAddr) -> bool {
        match ip {
            IpAddr::V4(v4) => v4.is_loopback() || v4.is_link_local() || is_v4_link_local_multicast(v4),
            IpAddr::V6(v6) => v6.is_loopback() || is_v6_link_local_unicast(v6) || is_v6_link_local_multicast(v6),
        }
    }
}

impl AddressMatcher for InternalFilter {
    fn matches(&self, ip: &IpAddr) -> bool {
        Self::is_structurally_internal(ip) || self.blocks.contains(ip)
    }
}

// 224.0.0.0/24
fn is_v4_link_local_multicast(ip: &Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    a == 224 && b == 0 && c == 0
}

// fe80::/10
fn is_v6_link_local_unicast(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xffc0 == 0xfe80
}

// ffX2::/16, multicast with link-local scope
fn is_v6_link_local_multicast(ip: &Ipv6Addr) -> bool {
    let octets = ip.octets();
    octets[0] == 0xff && octets[1] & 0x0f == 0x02
}
