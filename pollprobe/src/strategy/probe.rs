//! Capability probe for the one-off selector path.
//!
//! Runs once, during strategy resolution. It has no side effects beyond the
//! empty `poll(2)` call it issues, and reports every failure, panics included,
//! as "unavailable".

use super::{OneShotFactory, SelectorFactory};
use crate::config::Provider;
use crate::poller::unix::sys_poll;

use std::panic;
use std::time::Duration;

/// Looks for the one-off construction path.
///
/// Returns the factory if it is usable, or the reason it is not.
pub(super) fn probe(
    provider: Provider,
    enabled: bool,
) -> Result<Box<dyn SelectorFactory>, String> {
    match panic::catch_unwind(move || check(provider, enabled)) {
        Ok(result) => result,
        Err(_) => Err("capability probe panicked".to_string()),
    }
}

fn check(provider: Provider, enabled: bool) -> Result<Box<dyn SelectorFactory>, String> {
    if !enabled {
        return Err("disabled by configuration".to_string());
    }

    if provider == Provider::Poll {
        return Err("default provider is already poll-based".to_string());
    }

    sys_poll(&mut [], Some(Duration::ZERO)).map_err(|e| format!("poll(2) probe failed: {e}"))?;

    Ok(Box::new(OneShotFactory))
}
