//! Platform-specific readiness backends.
//!
//! Two construction paths exist:
//! - the platform's default provider (`epoll` on Linux and Android),
//! - the `poll(2)` backend, available on every Unix and used for one-off
//!   selectors when the capability probe allows it.
//!
//! The epoll backend is selected at compile time; platforms without it use
//! `poll` for both paths.

pub(crate) mod common;
pub(crate) mod poll;
pub(crate) mod unix;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub(crate) mod epoll;

pub use common::{Interest, Ready};
