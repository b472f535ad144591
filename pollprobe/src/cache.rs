//! Per-thread selector cache.
//!
//! Each thread that asks for a selector gets exactly one, created lazily on
//! its first request and kept in a thread-local slot. The slot is emptied,
//! and the selector closed, when the thread detaches through [`release`],
//! a [`DetachGuard`], or thread exit.

use crate::config::SelectorConfig;
use crate::selector::Selector;
use crate::strategy::Strategy;

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_CACHE_ID: AtomicUsize = AtomicUsize::new(0);

static GLOBAL: OnceLock<SelectorCache> = OnceLock::new();

/// Selectors owned by the current thread, keyed by cache.
struct Slots(HashMap<usize, Rc<Selector>>);

impl Drop for Slots {
    /// Thread teardown: every selector still held is closed here.
    fn drop(&mut self) {
        for (_, selector) in self.0.drain() {
            close_quietly(&selector);
        }
    }
}

thread_local! {
    static SLOTS: RefCell<Slots> = RefCell::new(Slots(HashMap::new()));
}

/// Closes a selector, logging instead of returning a failure.
fn close_quietly(selector: &Selector) {
    if let Err(e) = selector.close() {
        log::warn!(
            "Failed to close {} selector {}: {e}",
            selector.backend(),
            selector.id()
        );
    }
}

/// Hands out one selector per thread, built by a fixed [`Strategy`].
pub(crate) struct SelectorCache {
    id: usize,
    strategy: Strategy,
}

impl SelectorCache {
    pub(crate) fn new(strategy: Strategy) -> Self {
        Self {
            id: NEXT_CACHE_ID.fetch_add(1, Ordering::Relaxed),
            strategy,
        }
    }

    /// The process-wide cache, resolving its strategy from the environment
    /// on first use.
    pub(crate) fn global() -> &'static SelectorCache {
        Self::global_with(|| SelectorCache::new(Strategy::resolve(&SelectorConfig::from_env())))
    }

    /// The process-wide cache, built by `init` if it does not exist yet.
    ///
    /// Concurrent callers wait for the single initialization to finish.
    pub(crate) fn global_with(init: impl FnOnce() -> SelectorCache) -> &'static SelectorCache {
        GLOBAL.get_or_init(init)
    }

    /// Returns the calling thread's selector, opening it if needed.
    ///
    /// Nothing is stored when opening fails, so the next call tries again.
    pub(crate) fn acquire(&self) -> io::Result<Rc<Selector>> {
        let cached = SLOTS
            .try_with(|slots| slots.borrow().0.get(&self.id).cloned())
            .map_err(|_| io::Error::other("thread is shutting down"))?;

        if let Some(selector) = cached {
            return Ok(selector);
        }

        let selector = Rc::new(self.strategy.open()?);

        let stored = SLOTS.try_with(|slots| {
            slots
                .borrow_mut()
                .0
                .insert(self.id, selector.clone());
        });

        if stored.is_err() {
            return Err(io::Error::other("thread is shutting down"));
        }

        Ok(selector)
    }

    /// Closes and forgets the calling thread's selector, if any.
    pub(crate) fn release(&self) {
        // Slots already destroyed means teardown has closed everything.
        let removed = SLOTS
            .try_with(|slots| slots.borrow_mut().0.remove(&self.id))
            .ok()
            .flatten();

        if let Some(selector) = removed {
            close_quietly(&selector);
        }
    }
}

/// Returns the calling thread's selector, creating it on first use.
///
/// Repeated calls on the same thread return the same selector until
/// [`release`] is called. The first call in the process resolves the
/// selector strategy.
///
/// # Errors
///
/// Fails if the selector cannot be opened. Nothing is cached in that case.
pub fn acquire() -> io::Result<Rc<Selector>> {
    SelectorCache::global().acquire()
}

/// Closes the calling thread's selector, if it has one.
///
/// Close failures are logged, never returned. Clones of the selector still
/// held elsewhere observe it as closed. The next [`acquire`] opens a new one.
pub fn release() {
    if let Some(cache) = GLOBAL.get() {
        cache.release();
    }
}

/// Releases the calling thread's selector when dropped.
///
/// Worker threads hold one for their lifetime to tie the selector to the
/// worker rather than to the OS thread.
#[must_use = "the selector is released when the guard is dropped"]
#[derive(Debug)]
pub struct DetachGuard {
    _not_send: PhantomData<Rc<()>>,
}

/// Attaches the calling thread to the selector cache.
pub fn attach() -> DetachGuard {
    DetachGuard {
        _not_send: PhantomData,
    }
}

impl Drop for DetachGuard {
    fn drop(&mut self) {
        release();
    }
}
