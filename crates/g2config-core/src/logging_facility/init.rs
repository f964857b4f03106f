//! Subscriber installation

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Output profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable lines, `g2config=debug`
    Development,
    /// One JSON object per event, `g2config=info`
    Production,
    /// Bare registry; tests install a capture layer instead
    Test,
}

impl Profile {
    pub fn default_filter(&self) -> &'static str {
        match self {
            Profile::Development => "g2config=debug",
            Profile::Production | Profile::Test => "g2config=info",
        }
    }
}

static INIT_ONCE: Once = Once::new();

fn filter(profile: Profile) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(profile.default_filter()))
}

/// Install the global subscriber for `profile`
///
/// Only the first call has an effect. `RUST_LOG` overrides the profile's
/// default filter. Logs go to stderr so command output on stdout stays
/// machine-readable.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_env_filter(filter(profile))
                .with_writer(std::io::stderr)
                .init();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter(profile))
                .with_writer(std::io::stderr)
                .init();
        }
        Profile::Test => {
            tracing_subscriber::registry().init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init(Profile::Test);
        init(Profile::Test);
    }

    #[test]
    fn test_profile_filters() {
        assert_eq!(Profile::Development.default_filter(), "g2config=debug");
        assert_eq!(Profile::Production.default_filter(), "g2config=info");
    }
}
