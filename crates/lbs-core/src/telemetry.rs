//! Tracing setup
//!
//! Every crate logs through `tracing`; hosts call one of these once at
//! startup. `RUST_LOG` overrides the default filter.

use tracing_subscriber::EnvFilter;

fn filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install a human-readable fmt subscriber
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter(default_filter))
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Install a JSON subscriber for log shipping
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_json_tracing(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter(default_filter))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        let _ = init_tracing("lbs=debug");
        assert!(!init_tracing("lbs=debug"));
        assert!(!init_json_tracing("lbs=info"));
    }
}
