//! Linux `epoll`-based backend.
//!
//! This is the platform's default selector provider. Each selector owns an
//! epoll instance; a readiness check registers the target descriptor, waits
//! once and deregisters it again, so nothing stays registered between calls.

use super::common::{Interest, Ready};
use super::unix::{sys_close, timeout_millis};

use libc::{
    EPOLL_CLOEXEC, EPOLL_CTL_ADD, EPOLL_CTL_DEL, EPOLLERR, EPOLLHUP, EPOLLIN, EPOLLOUT,
    epoll_create1, epoll_ctl, epoll_event, epoll_wait,
};
use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

/// Token attached to the single registration of a readiness check.
const PROBE_TOKEN: u64 = 1;

/// An epoll instance used for one readiness question at a time.
#[derive(Debug)]
pub(crate) struct EpollBackend {
    /// Epoll file descriptor.
    epoll: RawFd,
}

impl EpollBackend {
    /// Creates a new epoll instance.
    pub(crate) fn open() -> io::Result<Self> {
        let epoll = unsafe { epoll_create1(EPOLL_CLOEXEC) };
        if epoll < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self { epoll })
    }

    /// Waits until `fd` satisfies `interest` or the timeout expires.
    pub(crate) fn await_ready(
        &self,
        fd: RawFd,
        interest: Interest,
        timeout: Option<Duration>,
    ) -> io::Result<Ready> {
        let mut flags = 0;

        if interest.read {
            flags |= EPOLLIN;
        }
        if interest.write {
            flags |= EPOLLOUT;
        }

        let mut event = epoll_event {
            events: flags as u32,
            u64: PROBE_TOKEN,
        };

        let rc = unsafe { epoll_ctl(self.epoll, EPOLL_CTL_ADD, fd, &mut event) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        let result = self.wait(timeout);

        if let Err(e) = self.deregister(fd) {
            log::warn!("Failed to deregister fd {fd} from epoll instance {}: {e}", self.epoll);
        }

        result
    }

    /// Removes `fd` from the epoll interest list.
    fn deregister(&self, fd: RawFd) -> io::Result<()> {
        let rc = unsafe { epoll_ctl(self.epoll, EPOLL_CTL_DEL, fd, std::ptr::null_mut()) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(())
    }

    fn wait(&self, timeout: Option<Duration>) -> io::Result<Ready> {
        let mut events = [epoll_event { events: 0, u64: 0 }; 1];

        let n = unsafe {
            epoll_wait(
                self.epoll,
                events.as_mut_ptr(),
                events.len() as i32,
                timeout_millis(timeout),
            )
        };

        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(Ready::default());
            }
            return Err(err);
        }

        let mut ready = Ready::default();

        for ev in &events[..n as usize] {
            if ev.u64 != PROBE_TOKEN {
                continue;
            }

            ready.readable |= ev.events & ((EPOLLIN | EPOLLERR | EPOLLHUP) as u32) != 0;
            ready.writable |= ev.events & (EPOLLOUT as u32) != 0;
        }

        Ok(ready)
    }

    /// Closes the epoll descriptor. Callers guarantee this runs at most once.
    pub(crate) fn close(&self) -> io::Result<()> {
        sys_close(self.epoll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::AsRawFd;
    use std::os::unix::net::UnixStream;

    #[test]
    fn test_readiness_check_leaves_nothing_registered() {
        let epoll = EpollBackend::open().expect("epoll_create1 failed");
        let (a, _b) = UnixStream::pair().unwrap();

        epoll
            .await_ready(a.as_raw_fd(), Interest::WRITABLE, Some(Duration::ZERO))
            .unwrap();

        let err = epoll.deregister(a.as_raw_fd()).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENOENT));

        epoll.close().unwrap();
    }

    #[test]
    fn test_repeated_checks_on_one_instance() {
        let epoll = EpollBackend::open().unwrap();
        let (a, _b) = UnixStream::pair().unwrap();

        for _ in 0..2 {
            let ready = epoll
                .await_ready(a.as_raw_fd(), Interest::WRITABLE, Some(Duration::ZERO))
                .expect("readiness check must succeed on a reused instance");
            assert!(ready.writable);
        }

        assert!(epoll.deregister(a.as_raw_fd()).is_err());
        epoll.close().unwrap();
    }
}
