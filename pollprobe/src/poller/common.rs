/// The readiness question asked of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interest {
    /// Wait for the descriptor to become readable.
    pub read: bool,
    /// Wait for the descriptor to become writable.
    pub write: bool,
}

impl Interest {
    /// Readable only.
    pub const READABLE: Interest = Interest {
        read: true,
        write: false,
    };

    /// Writable only.
    pub const WRITABLE: Interest = Interest {
        read: false,
        write: true,
    };

    /// Readable or writable.
    pub const BOTH: Interest = Interest {
        read: true,
        write: true,
    };
}

/// The answer to an [`Interest`].
///
/// Error and hang-up conditions are reported as `readable` so the caller's
/// next read observes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ready {
    /// Data, end of stream, or an error is waiting to be read.
    pub readable: bool,
    /// A write would not block.
    pub writable: bool,
}

impl Ready {
    /// Returns `true` if neither direction is ready.
    pub fn is_empty(&self) -> bool {
        !self.readable && !self.writable
    }
}
