//! Upstream tagging for outbound calls.

use crate::TimeoutConfig;
use std::fmt;
use std::time::Duration;

/// The services PriceLens talks to, each with its own timeout budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Upstream {
    /// Shopping search provider, possibly behind a CORS proxy.
    ShoppingSearch,
    /// The same-origin image search endpoint served by `lens-server`.
    ImageEndpoint,
    /// The visual-match provider, called from the server.
    LensProvider,
    /// Custom upstream with name.
    Custom(&'static str),
}

impl Upstream {
    /// Get the default timeout for this upstream.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::ShoppingSearch => Duration::from_secs(30),
            Self::ImageEndpoint => Duration::from_secs(40),
            Self::LensProvider => Duration::from_secs(35),
            Self::Custom(_) => Duration::from_secs(30),
        }
    }

    /// Default timeouts derived from [`Upstream::default_timeout`].
    pub fn timeouts(&self) -> TimeoutConfig {
        TimeoutConfig::from_total(self.default_timeout())
    }

    /// Get the name of this upstream.
    pub fn name(&self) -> &str {
        match self {
            Self::ShoppingSearch => "shopping_search",
            Self::ImageEndpoint => "image_endpoint",
            Self::LensProvider => "lens_provider",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
