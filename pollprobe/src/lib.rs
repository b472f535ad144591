//! # pollprobe
//!
//! **pollprobe** hands out per-thread readiness selectors for one-off,
//! non-blocking I/O checks made outside of an event loop, such as waiting for
//! a single socket to become readable before retrying a read.
//!
//! It solves two problems:
//!
//! - **Choosing how selectors are built.** Once per process, the default
//!   selector provider (`epoll` on Linux) is determined and a capability
//!   probe looks for a cheaper path for short-lived selectors (`poll(2)`,
//!   which needs no kernel object). If that path later fails to construct a
//!   selector, the default provider is used for that call.
//! - **Owning selectors per thread.** Every thread gets at most one selector,
//!   created on first use and closed exactly once when the thread detaches.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pollprobe::Interest;
//! use std::time::Duration;
//!
//! let selector = pollprobe::acquire()?;
//! let ready = selector.await_ready(&stream, Interest::READABLE, Some(Duration::from_millis(50)))?;
//!
//! if ready.readable {
//!     // retry the read
//! }
//!
//! // On worker shutdown:
//! pollprobe::release();
//! ```
//!
//! ## Configuration
//!
//! The strategy is resolved from [`SelectorConfig::from_env`] on the first
//! [`acquire`], unless a configuration was installed before with
//! [`SelectorConfig::install`]. Diagnostics go through the [`log`] facade.

#[cfg(not(unix))]
compile_error!("pollprobe only supports unix targets");

mod cache;
mod config;
mod error;
mod poller;
mod selector;
mod strategy;

pub use cache::{DetachGuard, acquire, attach, release};
pub use config::{Provider, SelectorConfig};
pub use error::ConfigError;
pub use poller::{Interest, Ready};
pub use selector::Selector;

use std::io;
use std::os::fd::AsRawFd;
use std::time::Duration;

/// Waits for `source` to become ready using the calling thread's selector.
///
/// Shorthand for [`acquire`] followed by [`Selector::await_ready`].
pub fn await_ready<S: AsRawFd + ?Sized>(
    source: &S,
    interest: Interest,
    timeout: Option<Duration>,
) -> io::Result<Ready> {
    acquire()?.await_ready(source, interest, timeout)
}
