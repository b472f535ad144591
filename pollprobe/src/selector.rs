//! The polling handle handed out by the per-thread cache.

use crate::poller::poll::PollBackend;
use crate::poller::{Interest, Ready};

#[cfg(any(target_os = "linux", target_os = "android"))]
use crate::poller::epoll::EpollBackend;

use std::cell::Cell;
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
enum Backend {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Epoll(EpollBackend),
    Poll(PollBackend),
    #[cfg(test)]
    Counting(CountingBackend),
}

/// Test backend: polls like [`PollBackend`], counts the closes that reach it
/// and can be told to fail them.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct CountingBackend {
    pub(crate) closes: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    pub(crate) fail_close: bool,
}

#[cfg(test)]
impl CountingBackend {
    fn close(&self) -> io::Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(io::Error::from_raw_os_error(libc::EBADF));
        }
        Ok(())
    }
}

/// A readiness-polling handle.
///
/// A `Selector` answers one readiness question at a time about a single
/// descriptor. It is either open or closed; the underlying OS resource is
/// released at most once, by [`Selector::close`] or on drop.
///
/// Selectors obtained through [`acquire`](crate::acquire) are owned by the
/// calling thread and cannot be sent to another one.
#[derive(Debug)]
pub struct Selector {
    id: u64,
    backend: Backend,
    closed: Cell<bool>,
}

impl Selector {
    fn new(backend: Backend) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            backend,
            closed: Cell::new(false),
        }
    }

    /// Opens a selector backed by a fresh epoll instance.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    pub(crate) fn open_epoll() -> io::Result<Self> {
        Ok(Self::new(Backend::Epoll(EpollBackend::open()?)))
    }

    /// Opens a selector backed by `poll(2)`.
    pub(crate) fn open_poll() -> Self {
        Self::new(Backend::Poll(PollBackend::open()))
    }

    /// Opens a selector on the counting test backend.
    #[cfg(test)]
    pub(crate) fn open_counting(backend: CountingBackend) -> Self {
        Self::new(Backend::Counting(backend))
    }

    /// Process-unique identity of this selector.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Name of the backend that built this selector.
    pub fn backend(&self) -> &'static str {
        match self.backend {
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Backend::Epoll(_) => "epoll",
            Backend::Poll(_) => "poll",
            #[cfg(test)]
            Backend::Counting(_) => "counting",
        }
    }

    /// Returns `false` once [`Selector::close`] has been called.
    pub fn is_open(&self) -> bool {
        !self.closed.get()
    }

    /// Waits until `source` is ready for `interest`, or until `timeout`
    /// elapses.
    ///
    /// `None` waits indefinitely and `Some(Duration::ZERO)` returns
    /// immediately. An empty [`Ready`] means the timeout expired or the wait
    /// was interrupted by a signal.
    ///
    /// # Errors
    ///
    /// Fails if the selector is closed or the descriptor cannot be polled.
    pub fn await_ready<S: AsRawFd + ?Sized>(
        &self,
        source: &S,
        interest: Interest,
        timeout: Option<Duration>,
    ) -> io::Result<Ready> {
        self.await_ready_fd(source.as_raw_fd(), interest, timeout)
    }

    /// [`Selector::await_ready`] on a raw descriptor.
    pub(crate) fn await_ready_fd(
        &self,
        fd: RawFd,
        interest: Interest,
        timeout: Option<Duration>,
    ) -> io::Result<Ready> {
        if self.closed.get() {
            return Err(io::Error::other("selector is closed"));
        }

        match &self.backend {
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Backend::Epoll(epoll) => epoll.await_ready(fd, interest, timeout),
            Backend::Poll(poll) => poll.await_ready(fd, interest, timeout),
            #[cfg(test)]
            Backend::Counting(_) => PollBackend::open().await_ready(fd, interest, timeout),
        }
    }

    /// Closes the selector.
    ///
    /// Only the first call reaches the OS. Later calls return `Ok(())`
    /// without doing anything, even if the first close failed.
    pub fn close(&self) -> io::Result<()> {
        if self.closed.replace(true) {
            return Ok(());
        }

        match &self.backend {
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Backend::Epoll(epoll) => epoll.close(),
            Backend::Poll(_) => Ok(()),
            #[cfg(test)]
            Backend::Counting(counting) => counting.close(),
        }
    }
}

impl Drop for Selector {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to close {} selector {}: {e}", self.backend(), self.id);
        }
    }
}
