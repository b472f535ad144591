use libc::{c_int, close, nfds_t, poll, pollfd};
use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

/// Closes a file descriptor.
pub(crate) fn sys_close(fd: RawFd) -> io::Result<()> {
    let rc = unsafe { close(fd) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Calls `poll(2)` over the given descriptors.
///
/// Returns the number of ready descriptors. An interrupted call reports zero.
pub(crate) fn sys_poll(fds: &mut [pollfd], timeout: Option<Duration>) -> io::Result<usize> {
    let n = unsafe {
        poll(
            fds.as_mut_ptr(),
            fds.len() as nfds_t,
            timeout_millis(timeout),
        )
    };

    if n < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(0);
        }
        return Err(err);
    }

    Ok(n as usize)
}

/// Converts an optional timeout to the millisecond form `poll`/`epoll_wait` take.
///
/// `None` blocks forever. Sub-millisecond timeouts round up so a non-zero
/// timeout never turns into a busy poll.
pub(crate) fn timeout_millis(timeout: Option<Duration>) -> c_int {
    match timeout {
        None => -1,
        Some(t) => {
            let mut ms = t.as_millis();
            if t.subsec_nanos() % 1_000_000 != 0 {
                ms += 1;
            }
            ms.min(c_int::MAX as u128) as c_int
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_millis() {
        assert_eq!(timeout_millis(None), -1);
        assert_eq!(timeout_millis(Some(Duration::ZERO)), 0);
        assert_eq!(timeout_millis(Some(Duration::from_millis(25))), 25);
        assert_eq!(timeout_millis(Some(Duration::from_micros(10))), 1);
        assert_eq!(timeout_millis(Some(Duration::from_secs(u64::MAX))), c_int::MAX);
    }

    #[test]
    fn test_poll_without_descriptors() {
        let n = sys_poll(&mut [], Some(Duration::ZERO)).expect("empty poll failed");
        assert_eq!(n, 0);
    }
}
