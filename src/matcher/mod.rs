mod internal;
mod provider;

pub use internal::InternalFilter;
pub use provider::ProviderFilter;

use std::net::IpAddr;

/// Trait for address matchers
pub trait AddressMatcher: Send + Sync {
    /// Check if the address belongs to this matcher's ranges
    fn matches(&self, ip: &IpAddr) -> bool;
}

/// Enum wrapper for all filter kinds
#[derive(Debug, Clone)]
pub enum Filter {
    Internal(InternalFilter),
    Provider(ProviderFilter),
}

impl Filter {
    /// Short name used in logs.
    pub fn name(&self) -> &str {
        match self {
            Filter::Internal(_) => "internal",
            Filter::Provider(f) => f.name(),
        }
    }
}

impl AddressMatcher for Filter {
    fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            Filter::Internal(f) => f.matches(ip),
            Filter::Provider(f) => f.matches(ip),
        }
    }
}

impl From<InternalFilter> for Filter {
    fn from(f: InternalFilter) -> Self {
        Filter::Internal(f)
    }
}

impl From<ProviderFilter> for Filter {
    fn from(f: ProviderFilter) -> Self {
        Filter::Provider(f)
    }
}

/// Ordered filters evaluated as a short-circuit OR.
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a filter after the ones already present.
    pub fn push(&mut self, filter: impl Into<Filter>) {
        self.filters.push(filter.into());
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, filter: impl Into<Filter>) -> Self {
        self.push(filter);
        self
    }

    /// True as soon as one filter matches.
    ///
    /// An absent address (the input was not an IP) and an empty chain
    /// both classify as unmatched.
    pub fn classify(&self, ip: Option<&IpAddr>) -> bool {
        match ip {
            Some(ip) => self.filters.iter().any(|f| f.matches(ip)),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }
}

impl FromIterator<Filter> for FilterChain {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}
