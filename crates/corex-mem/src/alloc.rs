//! The allocator interface: the single currency for passing "how to
//! allocate" across component boundaries.
//!
//! Every container in this crate holds an [`AllocRef`] instead of calling a
//! fixed memory function. Concrete allocators implement [`Allocator`]:
//!
//! - [`System`]: the process heap. Fails fast (aborts) on out-of-memory.
//! - [`crate::arena::Arena`]: chained bump allocator, bulk reclamation only.
//! - [`crate::arena::FixedArena`]: bounded bump allocator over a caller
//!   buffer.
//! - [`crate::ring::RingBuffer`]: circular scratch allocator.
//!
//! # Contract
//!
//! `allocate` returns a block of at least `layout.size()` bytes aligned to
//! `layout.align()`. For the system allocator, `reallocate` returns a block
//! whose leading `min(new_size, old.size())` bytes equal the old content.
//! Arena and ring allocators deliberately diverge: their
//! `reallocate` is a fresh `allocate` that preserves nothing, and their
//! `release` is a no-op because they reclaim memory only in bulk. Callers
//! that must work with any allocator copy contents themselves and never
//! rely on `release` freeing space.
//!
//! All three functions of a given allocation must go through the same
//! allocator value; the containers in this crate enforce that by capturing
//! their allocator at construction.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::Result;

/// Minimum alignment honored by every allocator in this crate (8 bytes).
///
/// Covers pointers, `u64`/`i64`, and the byte-oriented containers; layouts
/// requesting more are aligned up by the bump allocators.
pub const DEFAULT_ALIGNMENT: usize = 8;

/// Dynamic-dispatch allocation capability.
///
/// The triple {`allocate`, `reallocate`, `release`} bound to whatever state
/// the implementor carries. Copied freely; never owns the allocator it
/// points at.
pub type AllocRef<'a> = &'a dyn Allocator;

/// The allocation capability implemented by every backing store.
pub trait Allocator {
    /// Allocates at least `layout.size()` bytes at `layout.align()`.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>>;

    /// Reallocates `ptr` (previously returned by this allocator with layout
    /// `old`) to at least `new_size` bytes.
    ///
    /// Content preservation is guaranteed by the system allocator only;
    /// arena and ring implementations return fresh uninitialized memory.
    fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>>;

    /// Invalidates `ptr`. A no-op on bulk-reclaiming allocators.
    fn release(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Layout for `size` raw bytes at the crate default alignment.
#[inline]
pub(crate) fn bytes_layout(size: usize) -> Layout {
    // SAFETY: DEFAULT_ALIGNMENT is a nonzero power of two and callers keep
    // sizes within capacity arithmetic that cannot approach isize::MAX.
    unsafe { Layout::from_size_align_unchecked(size, DEFAULT_ALIGNMENT) }
}

/// Rounds `addr` up to the next multiple of `align` (a power of two).
#[inline]
pub(crate) fn align_up(addr: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (addr + align - 1) & !(align - 1)
}

/// The process heap, wrapped as an [`Allocator`].
///
/// Out-of-memory is not a recoverable condition at this layer: allocation
/// failure diverges through [`std::alloc::handle_alloc_error`] rather than
/// returning an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct System;

static SYSTEM: System = System;

/// Returns the shared handle to the default system allocator.
#[inline]
#[must_use]
pub fn system() -> AllocRef<'static> {
    &SYSTEM
}

impl Allocator for System {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        debug_assert!(layout.size() > 0, "zero-sized system allocation");

        // SAFETY: layout has nonzero size (checked above in debug, upheld
        // by the container capacity arithmetic in release).
        let raw = unsafe { alloc::alloc(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout);
        };

        #[cfg(feature = "alloc-trace")]
        corex_log::trace!("allocated {} bytes at {:p}", layout.size(), ptr);

        Ok(ptr)
    }

    fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>> {
        debug_assert!(new_size > 0, "zero-sized system reallocation");

        // SAFETY: ptr was allocated by this allocator with layout `old`;
        // new_size is nonzero.
        let raw = unsafe { alloc::realloc(ptr.as_ptr(), old, new_size) };
        let Some(new_ptr) = NonNull::new(raw) else {
            // SAFETY: same alignment as the original allocation.
            let layout = unsafe {
                Layout::from_size_align_unchecked(new_size, old.align())
            };
            alloc::handle_alloc_error(layout);
        };

        #[cfg(feature = "alloc-trace")]
        corex_log::trace!(
            "reallocated {:p} to {:p} ({} bytes)",
            ptr,
            new_ptr,
            new_size
        );

        Ok(new_ptr)
    }

    fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        #[cfg(feature = "alloc-trace")]
        corex_log::trace!("released {} bytes at {:p}", layout.size(), ptr);

        // SAFETY: ptr was allocated by this allocator with this layout.
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_allocate_release() {
        let layout = bytes_layout(64);
        let ptr = system().allocate(layout).unwrap();

        // The block is writable for its whole extent.
        unsafe {
            std::ptr::write_bytes(ptr.as_ptr(), 0xAB, 64);
            assert_eq!(*ptr.as_ptr(), 0xAB);
            assert_eq!(*ptr.as_ptr().add(63), 0xAB);
        }

        system().release(ptr, layout);
    }

    #[test]
    fn test_system_reallocate_preserves_content() {
        let old = bytes_layout(16);
        let ptr = system().allocate(old).unwrap();
        unsafe {
            for i in 0..16 {
                *ptr.as_ptr().add(i) = i as u8;
            }
        }

        let grown = system().reallocate(ptr, old, 64).unwrap();
        unsafe {
            for i in 0..16 {
                assert_eq!(*grown.as_ptr().add(i), i as u8);
            }
        }

        system().release(grown, bytes_layout(64));
    }

    #[test]
    fn test_system_alignment() {
        let layout = Layout::from_size_align(32, 32).unwrap();
        let ptr = system().allocate(layout).unwrap();
        assert_eq!(ptr.as_ptr() as usize % 32, 0);
        system().release(ptr, layout);
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(9, 8), 16);
        assert_eq!(align_up(17, 16), 32);
    }

    #[test]
    fn test_system_handle_is_shared() {
        let a = system();
        let b = system();
        assert!(std::ptr::addr_eq(a, b));
    }
}
