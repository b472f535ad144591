//! `poll(2)`-based backend.
//!
//! The cheapest selector to construct: it owns no kernel object, so opening
//! and closing it never touch the file descriptor table. Each readiness check
//! is a single `poll` call over one descriptor.

use super::common::{Interest, Ready};
use super::unix::sys_poll;

use libc::{POLLERR, POLLHUP, POLLIN, POLLNVAL, POLLOUT, pollfd};
use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

/// A stateless `poll(2)` selector backend.
#[derive(Debug, Default)]
pub(crate) struct PollBackend;

impl PollBackend {
    /// Creates the backend. Never touches the OS.
    pub(crate) fn open() -> Self {
        Self
    }

    /// Waits until `fd` satisfies `interest` or the timeout expires.
    pub(crate) fn await_ready(
        &self,
        fd: RawFd,
        interest: Interest,
        timeout: Option<Duration>,
    ) -> io::Result<Ready> {
        let mut events = 0;

        if interest.read {
            events |= POLLIN;
        }
        if interest.write {
            events |= POLLOUT;
        }

        let mut fds = [pollfd {
            fd,
            events,
            revents: 0,
        }];

        if sys_poll(&mut fds, timeout)? == 0 {
            return Ok(Ready::default());
        }

        let revents = fds[0].revents;
        if revents & POLLNVAL != 0 {
            return Err(io::Error::from_raw_os_error(libc::EBADF));
        }

        Ok(Ready {
            readable: revents & (POLLIN | POLLERR | POLLHUP) != 0,
            writable: revents & POLLOUT != 0,
        })
    }
}
