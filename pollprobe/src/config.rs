//! Selector configuration.
//!
//! The process-wide strategy is resolved from a [`SelectorConfig`]. Unless
//! one is installed explicitly before the first [`acquire`](crate::acquire),
//! it is read from the environment:
//!
//! - `POLLPROBE_PROVIDER`: `epoll` or `poll`, the default selector provider.
//! - `POLLPROBE_ONESHOT`: boolean, whether one-off selectors may use the
//!   cheaper `poll(2)` path.

use crate::cache::SelectorCache;
use crate::error::ConfigError;
use crate::strategy::Strategy;

use std::fmt;
use std::str::FromStr;

pub(crate) const PROVIDER_VAR: &str = "POLLPROBE_PROVIDER";
pub(crate) const ONESHOT_VAR: &str = "POLLPROBE_ONESHOT";

/// A selector provider: the mechanism default selectors are built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Epoll,
    Poll,
}

impl Provider {
    /// The provider this platform uses when none is configured.
    pub fn platform_default() -> Self {
        if cfg!(any(target_os = "linux", target_os = "android")) {
            Provider::Epoll
        } else {
            Provider::Poll
        }
    }

    /// Whether this provider exists on the current platform.
    pub fn is_supported(self) -> bool {
        match self {
            Provider::Epoll => cfg!(any(target_os = "linux", target_os = "android")),
            Provider::Poll => true,
        }
    }

    /// Whether pollprobe warns about this provider being the default one.
    ///
    /// `poll` works, but gives one-off selectors no cheaper path.
    pub fn is_known_unsupported(self) -> bool {
        self == Provider::Poll
    }

    /// The provider's lowercase name, as accepted by `POLLPROBE_PROVIDER`.
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Epoll => "epoll",
            Provider::Poll => "poll",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "epoll" => Ok(Provider::Epoll),
            "poll" => Ok(Provider::Poll),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// Builder for the process-wide selector strategy.
///
/// # Examples
///
/// ```rust,ignore
/// SelectorConfig::new()
///     .provider(Provider::Epoll)
///     .oneshot(false)
///     .install()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Default provider. `None` means the platform default.
    provider: Option<Provider>,

    /// Whether the one-off `poll(2)` path may be probed.
    oneshot: bool,
}

impl SelectorConfig {
    /// Creates a configuration with the platform default provider and the
    /// one-off path enabled.
    pub fn new() -> Self {
        Self {
            provider: None,
            oneshot: true,
        }
    }

    /// Reads the configuration from the environment.
    ///
    /// Invalid values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new();

        if let Some(value) = lookup(PROVIDER_VAR) {
            match value.parse() {
                Ok(provider) => config.provider = Some(provider),
                Err(e) => log::warn!("Ignoring {PROVIDER_VAR}: {e}"),
            }
        }

        if let Some(value) = lookup(ONESHOT_VAR) {
            match parse_flag(ONESHOT_VAR, &value) {
                Ok(flag) => config.oneshot = flag,
                Err(e) => log::warn!("Ignoring {ONESHOT_VAR}: {e}"),
            }
        }

        config
    }

    /// Sets the default selector provider.
    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Enables or disables the one-off `poll(2)` path.
    pub fn oneshot(mut self, enabled: bool) -> Self {
        self.oneshot = enabled;
        self
    }

    pub(crate) fn configured_provider(&self) -> Option<Provider> {
        self.provider
    }

    pub(crate) fn oneshot_enabled(&self) -> bool {
        self.oneshot
    }

    /// Resolves the process-wide strategy from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AlreadyResolved`] if a selector was already
    /// acquired, or a configuration installed, in this process.
    pub fn install(self) -> Result<(), ConfigError> {
        let mut config = Some(self);

        SelectorCache::global_with(|| {
            let config = config.take().unwrap_or_default();
            SelectorCache::new(Strategy::resolve(&config))
        });

        match config {
            None => Ok(()),
            Some(_) => Err(ConfigError::AlreadyResolved),
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key,
            value: value.to_string(),
        }),
    }
}
