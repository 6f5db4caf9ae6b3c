//! Error types for the memory core.

use std::fmt;

/// Errors surfaced by fallible allocators.
///
/// The system allocator never returns these: it aborts the process on
/// out-of-memory instead (see [`crate::alloc::System`]). Bounded allocators
/// such as [`crate::arena::FixedArena`] report `ArenaFull` and leave the
/// decision to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A bounded arena has no room for the requested size.
    ArenaFull {
        /// The requested allocation size in bytes.
        requested: usize,
        /// The space still available in the arena.
        available: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ArenaFull {
                requested,
                available,
            } => {
                write!(
                    f,
                    "Arena full: requested {requested} bytes, available {available} bytes"
                )
            }
        }
    }
}

impl std::error::Error for Error {}

/// Result type for memory core operations.
pub type Result<T> = std::result::Result<T, Error>;
