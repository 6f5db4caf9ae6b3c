//! Circular scratch allocator.
//!
//! [`RingBuffer`] bump-allocates through a fixed-size buffer and wraps to
//! offset zero whenever a request would not fit in the remainder. Wrapping
//! silently invalidates every earlier scratch allocation; that is the
//! design, not an error. Use it for results that are consumed immediately
//! after creation, e.g. formatted text headed for a sink or transient byte
//! copies; never for data expected to outlive the next scratch call.
//!
//! A request larger than the whole buffer can never be served and is a
//! fatal error.

use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::NonNull;

use crate::alloc::{
    Allocator, DEFAULT_ALIGNMENT, align_up, bytes_layout, system,
};
use crate::error::Result;

/// Default scratch capacity (4 KiB).
pub const SCRATCH_SIZE: usize = 4096;

/// A fixed-capacity circular bump allocator.
///
/// The write offset always satisfies `0 <= write_offset <= capacity`.
pub struct RingBuffer {
    base: NonNull<u8>,
    size: usize,
    write_pos: Cell<usize>,
}

impl RingBuffer {
    /// Creates a ring with the default capacity on the system allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(SCRATCH_SIZE)
    }

    /// Creates a ring of `size` bytes on the system allocator.
    #[must_use]
    pub fn with_capacity(size: usize) -> Self {
        assert!(size > 0, "scratch buffer size must be nonzero");
        let base = system()
            .allocate(bytes_layout(size))
            .expect("scratch buffer allocation failed");
        RingBuffer {
            base,
            size,
            write_pos: Cell::new(0),
        }
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.size
    }

    /// Returns the current write offset.
    #[inline]
    #[must_use]
    pub fn write_offset(&self) -> usize {
        self.write_pos.get()
    }

    /// Allocates `size` scratch bytes at the default alignment.
    ///
    /// # Panics
    ///
    /// Panics if `size` exceeds the ring's total capacity; no wraparound
    /// can ever make such a request fit.
    pub fn alloc(&self, size: usize) -> NonNull<u8> {
        self.alloc_aligned(size, DEFAULT_ALIGNMENT)
    }

    fn alloc_aligned(&self, size: usize, align: usize) -> NonNull<u8> {
        assert!(
            size <= self.size,
            "scratch request of {size} bytes exceeds ring capacity {}",
            self.size
        );

        let base_addr = self.base.as_ptr().addr();
        let end_addr = base_addr + self.size;

        let mut start = align_up(base_addr + self.write_pos.get(), align);
        if start + size > end_addr {
            // Wrap: every prior scratch allocation is invalid from here on.
            corex_log::trace!(
                "scratch wraparound at offset {}",
                self.write_pos.get()
            );
            start = align_up(base_addr, align);
        }
        assert!(
            start + size <= end_addr,
            "scratch request of {size} bytes at alignment {align} exceeds ring capacity {}",
            self.size
        );

        self.write_pos.set(start + size - base_addr);
        // SAFETY: start lies within the buffer; with_addr keeps the
        // buffer's provenance and the address is nonzero.
        unsafe { NonNull::new_unchecked(self.base.as_ptr().with_addr(start)) }
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator for RingBuffer {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        Ok(self.alloc_aligned(
            layout.size(),
            layout.align().max(DEFAULT_ALIGNMENT),
        ))
    }

    /// Fresh allocation, no content preservation: the ring keeps no record
    /// of what `ptr` was.
    fn reallocate(
        &self,
        _ptr: NonNull<u8>,
        old: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>> {
        Ok(self.alloc_aligned(new_size, old.align().max(DEFAULT_ALIGNMENT)))
    }

    /// No-op: scratch memory is reclaimed by wrapping over it.
    fn release(&self, _ptr: NonNull<u8>, _layout: Layout) {}
}

impl Drop for RingBuffer {
    fn drop(&mut self) {
        system().release(self.base, bytes_layout(self.size));
    }
}
