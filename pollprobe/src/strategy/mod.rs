//! Selector strategy resolution.
//!
//! A [`Strategy`] decides, once per process, how selectors are built. It
//! always holds the default provider's factory and, when the capability
//! probe succeeds, a cheaper factory for one-off selectors. Invoking the
//! strategy tries the one-off path first; a recoverable failure there falls
//! back to the default path for that call only.

mod probe;

use crate::config::{Provider, SelectorConfig};
use crate::error::OpenError;
use crate::selector::Selector;

use std::io;

/// A way of constructing selectors.
pub(crate) trait SelectorFactory: Send + Sync {
    fn name(&self) -> &'static str;

    /// Opens a new selector.
    ///
    /// [`OpenError::Unsupported`] signals that this path cannot be used for
    /// now and another one should be tried.
    fn open(&self) -> Result<Selector, OpenError>;
}

/// Builds selectors on the default provider.
pub(crate) struct ProviderFactory(Provider);

impl SelectorFactory for ProviderFactory {
    fn name(&self) -> &'static str {
        self.0.as_str()
    }

    fn open(&self) -> Result<Selector, OpenError> {
        match self.0 {
            Provider::Epoll => open_epoll(),
            Provider::Poll => Ok(Selector::open_poll()),
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn open_epoll() -> Result<Selector, OpenError> {
    Ok(Selector::open_epoll()?)
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn open_epoll() -> Result<Selector, OpenError> {
    Err(OpenError::Unsupported {
        path: "epoll",
        reason: "not available on this platform".to_string(),
    })
}

/// Builds `poll(2)` selectors for one-off use.
pub(crate) struct OneShotFactory;

impl SelectorFactory for OneShotFactory {
    fn name(&self) -> &'static str {
        "poll"
    }

    fn open(&self) -> Result<Selector, OpenError> {
        Ok(Selector::open_poll())
    }
}

/// The resolved selector construction strategy.
pub(crate) struct Strategy {
    default: Box<dyn SelectorFactory>,
    oneshot: Option<Box<dyn SelectorFactory>>,
}

impl Strategy {
    pub(crate) fn new(
        default: Box<dyn SelectorFactory>,
        oneshot: Option<Box<dyn SelectorFactory>>,
    ) -> Self {
        Self { default, oneshot }
    }

    /// Resolves the strategy for `config`.
    ///
    /// Never fails: in the worst case every selector comes from the default
    /// provider.
    pub(crate) fn resolve(config: &SelectorConfig) -> Self {
        let fallback = Provider::platform_default();

        let provider = match config.configured_provider() {
            Some(provider) if provider.is_supported() => provider,
            Some(provider) => {
                log::warn!(
                    "Selector provider {provider} is not available on this platform, using {fallback}"
                );
                fallback
            }
            None => fallback,
        };

        if provider.is_known_unsupported() {
            log::warn!(
                "The currently defined selector provider ({provider}) is not supported for use with pollprobe"
            );
        }

        log::trace!("Starting up with selector provider {provider}");

        let oneshot = match probe::probe(provider, config.oneshot_enabled()) {
            Ok(factory) => {
                log::trace!(
                    "Using {} selector type for one-off selectors.",
                    factory.name()
                );
                Some(factory)
            }
            Err(reason) => {
                log::trace!("Using default selector type for one-off selectors ({reason}).");
                None
            }
        };

        Self::new(Box::new(ProviderFactory(provider)), oneshot)
    }

    /// Whether the one-off path was found during resolution.
    #[cfg(test)]
    pub(crate) fn has_oneshot(&self) -> bool {
        self.oneshot.is_some()
    }

    /// Opens a new selector.
    pub(crate) fn open(&self) -> io::Result<Selector> {
        if let Some(oneshot) = &self.oneshot {
            match oneshot.open() {
                Ok(selector) => return Ok(selector),
                Err(OpenError::Unsupported { path, reason }) => {
                    log::trace!(
                        "{path} selector unavailable ({reason}), falling back to {}",
                        self.default.name()
                    );
                }
                Err(OpenError::Io(e)) => return Err(e),
            }
        }

        self.default.open().map_err(io::Error::from)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::selector::CountingBackend;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Script = dyn Fn(usize) -> Result<(), OpenError> + Send + Sync;

    /// A factory that counts its invocations and fails on demand.
    ///
    /// The script receives the zero-based call number. With `closes` set,
    /// selectors are built on the counting backend.
    pub(crate) struct ScriptedFactory {
        name: &'static str,
        calls: Arc<AtomicUsize>,
        script: Box<Script>,
        closes: Option<Arc<AtomicUsize>>,
        fail_close: bool,
    }

    impl ScriptedFactory {
        pub(crate) fn new(
            name: &'static str,
            script: impl Fn(usize) -> Result<(), OpenError> + Send + Sync + 'static,
        ) -> (Box<dyn SelectorFactory>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let factory = Self {
                name,
                calls: calls.clone(),
                script: Box::new(script),
                closes: None,
                fail_close: false,
            };
            (Box::new(factory), calls)
        }

        /// A working factory whose selectors count their closes, and fail
        /// them when `fail_close` is set.
        ///
        /// Returns the factory, its open counter and the close counter.
        pub(crate) fn counting_closes(
            name: &'static str,
            fail_close: bool,
        ) -> (Box<dyn SelectorFactory>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let closes = Arc::new(AtomicUsize::new(0));
            let factory = Self {
                name,
                calls: calls.clone(),
                script: Box::new(|_| Ok(())),
                closes: Some(closes.clone()),
                fail_close,
            };
            (Box::new(factory), calls, closes)
        }

        pub(crate) fn working(name: &'static str) -> (Box<dyn SelectorFactory>, Arc<AtomicUsize>) {
            Self::new(name, |_| Ok(()))
        }
    }

    impl SelectorFactory for ScriptedFactory {
        fn name(&self) -> &'static str {
            self.name
        }

        fn open(&self) -> Result<Selector, OpenError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            (self.script)(call)?;

            match &self.closes {
                Some(closes) => Ok(Selector::open_counting(CountingBackend {
                    closes: closes.clone(),
                    fail_close: self.fail_close,
                })),
                None => Ok(Selector::open_poll()),
            }
        }
    }

    pub(crate) fn unsupported() -> OpenError {
        OpenError::Unsupported {
            path: "scripted",
            reason: "instantiation failed".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{ScriptedFactory, unsupported};
    use super::*;

    use std::sync::atomic::Ordering;

    #[test]
    fn test_resolve_without_oneshot_uses_default_path() {
        let strategy = Strategy::resolve(&SelectorConfig::new().oneshot(false));
        assert!(!strategy.has_oneshot());

        let selector = strategy.open().expect("default path must open");
        assert_eq!(selector.backend(), Provider::platform_default().as_str());
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[test]
    fn test_resolve_prefers_poll_for_oneshot() {
        let strategy = Strategy::resolve(&SelectorConfig::new().provider(Provider::Epoll));
        assert!(strategy.has_oneshot());
        assert_eq!(strategy.open().unwrap().backend(), "poll");
    }

    #[test]
    fn test_resolve_with_poll_provider() {
        let strategy = Strategy::resolve(&SelectorConfig::new().provider(Provider::Poll));
        assert!(!strategy.has_oneshot());
        assert_eq!(strategy.open().unwrap().backend(), "poll");
    }

    #[test]
    fn test_oneshot_success_skips_default() {
        let (default, default_calls) = ScriptedFactory::working("default");
        let (oneshot, oneshot_calls) = ScriptedFactory::working("oneshot");
        let strategy = Strategy::new(default, Some(oneshot));

        strategy.open().unwrap();
        strategy.open().unwrap();

        assert_eq!(oneshot_calls.load(Ordering::SeqCst), 2);
        assert_eq!(default_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_recoverable_failure_falls_back_for_one_call() {
        let (default, default_calls) = ScriptedFactory::working("default");
        let (oneshot, oneshot_calls) =
            ScriptedFactory::new("oneshot", |call| if call == 1 { Err(unsupported()) } else { Ok(()) });
        let strategy = Strategy::new(default, Some(oneshot));

        strategy.open().unwrap();
        assert_eq!(default_calls.load(Ordering::SeqCst), 0);

        strategy.open().expect("fallback must succeed");
        assert_eq!(default_calls.load(Ordering::SeqCst), 1);

        strategy.open().unwrap();
        assert_eq!(oneshot_calls.load(Ordering::SeqCst), 3);
        assert_eq!(default_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_io_failure_on_oneshot_propagates() {
        let (default, default_calls) = ScriptedFactory::working("default");
        let (oneshot, _) = ScriptedFactory::new("oneshot", |_| {
            Err(io::Error::from_raw_os_error(libc::EMFILE).into())
        });
        let strategy = Strategy::new(default, Some(oneshot));

        let err = strategy.open().unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EMFILE));
        assert_eq!(default_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_default_failure_surfaces_as_io_error() {
        let (default, _) = ScriptedFactory::new("default", |_| Err(unsupported()));
        let strategy = Strategy::new(default, None);

        let err = strategy.open().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }
}
