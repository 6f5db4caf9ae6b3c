//! Corex memory core: a pluggable allocator interface and the collection
//! primitives built on top of it.
//!
//! Dependency order, leaves first:
//!
//! - [`alloc`]: the [`Allocator`] trait and the fail-fast [`System`]
//!   allocator. [`AllocRef`] is the currency every other component accepts.
//! - [`array`]: [`Array`], a growable collection that doubles as the block
//!   storage for arenas.
//! - [`arena`]: [`Arena`] (chained bump blocks, bulk reclamation) and
//!   [`FixedArena`] (bounded, caller-owned buffer). Both are allocators.
//! - [`ring`]: [`RingBuffer`], the circular scratch allocator whose
//!   allocations live only until the next wraparound.
//! - [`string`]: [`SmallStr`], a small-string-optimized string that keeps
//!   its creating allocator with it.
//! - [`context`]: one temp arena + one scratch ring per thread for
//!   allocator-free transient formatting.
//!
//! Everything here is single-threaded by design: no allocator or container
//! may be shared across threads, and the only concession to threading is
//! that each thread gets its own [`context::Context`].
//!
//! # Example
//!
//! ```
//! use corex_mem::{Arena, Array, SmallStr};
//!
//! let arena = Arena::new();
//!
//! let mut numbers: Array<u32> = Array::new_in(&arena);
//! for i in 0..9 {
//!     numbers.push(i);
//! }
//! assert_eq!(numbers.capacity(), 16);
//!
//! let label = SmallStr::format_in(
//!     format_args!("{} numbers", numbers.len()),
//!     &arena,
//! );
//! assert_eq!(label.as_str(), "9 numbers");
//!
//! drop((numbers, label));
//! arena.clear(); // everything above reclaimed in one sweep
//! ```

pub mod alloc;
pub mod arena;
pub mod array;
pub mod context;
pub mod error;
pub mod ring;
pub mod string;

pub use alloc::{AllocRef, Allocator, DEFAULT_ALIGNMENT, System, system};
pub use arena::{ARENA_BLOCK_SIZE, Arena, ArenaStats, FixedArena};
pub use array::{Array, DEFAULT_CAPACITY};
pub use context::{Context, ScratchStr, scratch_copy, scratch_format, temp_format};
pub use error::{Error, Result};
pub use ring::{RingBuffer, SCRATCH_SIZE};
pub use string::{INLINE_CAP, SmallStr};
