//! Small-string-optimized string carrying its allocator.
//!
//! [`SmallStr`] keeps short text (up to 23 bytes) directly inside the
//! handle and moves to an allocator-backed buffer only when it outgrows
//! the inline form. Both representations keep a NUL byte just past the
//! logical length so the raw pointer is always usable as C-style text.
//!
//! # Representations
//!
//! - **Inline**: a 24-byte buffer inside the value, 23 addressable text
//!   bytes plus the terminator. Reported capacity is the buffer size, 24.
//! - **Heap**: pointer + length + capacity, allocated through the
//!   [`AllocRef`] captured at construction. `cap >= len + 1` always holds;
//!   growth multiplies capacity by 1.5.
//!
//! Pushing past the inline capacity spills to the heap; popping a heap
//! string back down to 23 bytes or fewer demotes it to inline again,
//! releasing the heap buffer through the same allocator that created it.
//!
//! # Examples
//!
//! ```
//! use corex_mem::SmallStr;
//!
//! let mut s = SmallStr::from("Hello World");
//! assert!(s.is_inline());
//! assert_eq!(s.len(), 11);
//! assert_eq!(s.capacity(), 24);
//!
//! s.push_str(", and then some more text");
//! assert!(!s.is_inline());
//! assert_eq!(s.as_str(), "Hello World, and then some more text");
//! ```

use std::fmt;
use std::ptr::{self, NonNull};
use std::slice;

use crate::alloc::{AllocRef, bytes_layout, system};

/// Size of the inline buffer, terminator included.
pub const INLINE_BUF: usize = 24;

/// Addressable text bytes in the inline form.
pub const INLINE_CAP: usize = INLINE_BUF - 1;

#[derive(Clone, Copy)]
enum Repr {
    Inline {
        len: u8,
        buf: [u8; INLINE_BUF],
    },
    Heap {
        ptr: NonNull<u8>,
        len: usize,
        cap: usize,
    },
}

/// A small-string-optimized, allocator-aware string.
///
/// The contents are always valid UTF-8 (only `char` and `&str` can enter)
/// and always NUL-terminated in storage. Every heap operation goes through
/// the allocator captured at construction; no operation accepts a
/// different one.
pub struct SmallStr<'a> {
    alloc: AllocRef<'a>,
    repr: Repr,
}

impl SmallStr<'static> {
    /// Creates an empty inline string on the system allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(system())
    }

    /// Creates a string with room for `capacity` text bytes on the system
    /// allocator.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, system())
    }

    /// Renders `args` into a new string on the system allocator.
    ///
    /// ```
    /// use corex_mem::SmallStr;
    ///
    /// let s = SmallStr::format(format_args!("{}-{}", "x", 5));
    /// assert_eq!(s.as_str(), "x-5");
    /// ```
    #[must_use]
    pub fn format(args: fmt::Arguments<'_>) -> Self {
        Self::format_in(args, system())
    }
}

impl<'a> SmallStr<'a> {
    /// Creates an empty inline string bound to `alloc`.
    #[must_use]
    pub fn new_in(alloc: AllocRef<'a>) -> Self {
        SmallStr {
            alloc,
            repr: Repr::Inline {
                len: 0,
                buf: [0; INLINE_BUF],
            },
        }
    }

    /// Creates a string with room for `capacity` text bytes bound to
    /// `alloc`. Capacities at or below the inline threshold stay inline.
    #[must_use]
    pub fn with_capacity_in(capacity: usize, alloc: AllocRef<'a>) -> Self {
        if capacity <= INLINE_CAP {
            return Self::new_in(alloc);
        }
        let cap = capacity + 1;
        let ptr = alloc
            .allocate(bytes_layout(cap))
            .expect("string allocation failed");
        // SAFETY: cap >= 1 writable bytes at ptr.
        unsafe { *ptr.as_ptr() = 0 };
        SmallStr {
            alloc,
            repr: Repr::Heap { ptr, len: 0, cap },
        }
    }

    /// Creates a string holding a copy of `s`, bound to `alloc`.
    #[must_use]
    pub fn from_str_in(s: &str, alloc: AllocRef<'a>) -> Self {
        let mut out = Self::with_capacity_in(s.len(), alloc);
        out.push_bytes(s.as_bytes());
        out
    }

    /// Creates a string holding a copy of `s` with room for at least
    /// `capacity` text bytes, bound to `alloc`.
    #[must_use]
    pub fn from_parts_in(
        s: &str,
        capacity: usize,
        alloc: AllocRef<'a>,
    ) -> Self {
        let mut out = Self::with_capacity_in(capacity.max(s.len()), alloc);
        out.push_bytes(s.as_bytes());
        out
    }

    /// Renders `args` into a new string bound to `alloc`.
    #[must_use]
    pub fn format_in(args: fmt::Arguments<'_>, alloc: AllocRef<'a>) -> Self {
        let mut out = Self::new_in(alloc);
        let _ = fmt::Write::write_fmt(&mut out, args);
        out
    }

    /// Returns the text length in bytes, terminator excluded.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Inline { len, .. } => *len as usize,
            Repr::Heap { len, .. } => *len,
        }
    }

    /// Returns whether the string is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the storage capacity in bytes (24 for the inline form).
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        match &self.repr {
            Repr::Inline { .. } => INLINE_BUF,
            Repr::Heap { cap, .. } => *cap,
        }
    }

    /// Returns whether the text currently lives in the inline buffer.
    #[inline]
    #[must_use]
    pub fn is_inline(&self) -> bool {
        matches!(self.repr, Repr::Inline { .. })
    }

    /// Returns the text bytes, terminator excluded.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.repr {
            Repr::Inline { len, buf } => &buf[..*len as usize],
            // SAFETY: ptr is valid for len initialized bytes.
            Repr::Heap { ptr, len, .. } => unsafe {
                slice::from_raw_parts(ptr.as_ptr(), *len)
            },
        }
    }

    /// Returns the text as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        // SAFETY: contents only ever enter as &str or char.
        unsafe { std::str::from_utf8_unchecked(self.as_bytes()) }
    }

    /// Returns a raw pointer to the NUL-terminated text.
    ///
    /// Invalidated by any subsequent call that may grow or demote the
    /// string.
    #[inline]
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        match &self.repr {
            Repr::Inline { buf, .. } => buf.as_ptr(),
            Repr::Heap { ptr, .. } => ptr.as_ptr(),
        }
    }

    /// Appends one character.
    pub fn push(&mut self, ch: char) {
        let mut utf8 = [0u8; 4];
        let encoded = ch.encode_utf8(&mut utf8);
        self.push_bytes(encoded.as_bytes());
    }

    /// Appends a string slice.
    pub fn push_str(&mut self, s: &str) {
        self.push_bytes(s.as_bytes());
    }

    /// Renders `args` into the thread's scratch ring, then appends the
    /// result. The scratch bytes are consumed before any further scratch
    /// use, so the transient copy never needs a second allocator.
    ///
    /// # Panics
    ///
    /// Panics if the rendered text exceeds the thread scratch capacity;
    /// use `write!` (via [`fmt::Write`]) for unbounded payloads.
    pub fn push_fmt(&mut self, args: fmt::Arguments<'_>) {
        let scratch = crate::context::scratch_format(args);
        // SAFETY: nothing allocates from the thread ring between the
        // format above and this copy.
        self.push_str(unsafe { scratch.as_str() });
    }

    /// Removes and returns the last character. A heap string short enough
    /// for the inline buffer is demoted back to it.
    pub fn pop(&mut self) -> Option<char> {
        let ch = self.as_str().chars().next_back()?;
        let new_len = self.len() - ch.len_utf8();

        match &mut self.repr {
            Repr::Inline { len, buf } => {
                *len = new_len as u8;
                buf[new_len] = 0;
            }
            Repr::Heap { ptr, len, .. } => {
                *len = new_len;
                // SAFETY: new_len < cap, the slot is within the buffer.
                unsafe { *ptr.as_ptr().add(new_len) = 0 };
            }
        }

        if let Repr::Heap { len, .. } = self.repr
            && len <= INLINE_CAP
        {
            self.demote_to_inline();
        }
        Some(ch)
    }

    /// Copies the text into a string owned by `other`, e.g. to move an
    /// arena-resident string onto the system heap before the arena is
    /// cleared.
    #[must_use]
    pub fn clone_in<'b>(&self, other: AllocRef<'b>) -> SmallStr<'b> {
        SmallStr::from_str_in(self.as_str(), other)
    }

    /// Naive substring scan. An empty needle is never contained.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return false;
        }
        let hay = self.as_bytes();
        let needle = needle.as_bytes();
        if needle.len() > hay.len() {
            return false;
        }
        for start in 0..=hay.len() - needle.len() {
            if &hay[start..start + needle.len()] == needle {
                return true;
            }
        }
        false
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.reserve(bytes.len());
        match &mut self.repr {
            Repr::Inline { len, buf } => {
                let at = *len as usize;
                buf[at..at + bytes.len()].copy_from_slice(bytes);
                *len = (at + bytes.len()) as u8;
                buf[at + bytes.len()] = 0;
            }
            Repr::Heap { ptr, len, cap } => {
                debug_assert!(*len + bytes.len() + 1 <= *cap);
                // SAFETY: reserve guaranteed len + bytes.len() + 1 <= cap.
                unsafe {
                    ptr::copy_nonoverlapping(
                        bytes.as_ptr(),
                        ptr.as_ptr().add(*len),
                        bytes.len(),
                    );
                    *len += bytes.len();
                    *ptr.as_ptr().add(*len) = 0;
                }
            }
        }
    }

    /// Ensures room for `additional` more text bytes plus the terminator.
    fn reserve(&mut self, additional: usize) {
        let needed = self.len() + additional + 1;
        match self.repr {
            Repr::Inline { .. } => {
                if needed <= INLINE_BUF {
                    return;
                }
                self.spill_to_heap(needed);
            }
            Repr::Heap { cap, .. } => {
                if needed <= cap {
                    return;
                }
                let grown = cap + cap / 2;
                self.grow_heap(grown.max(needed));
            }
        }
    }

    /// Moves inline text into a fresh heap buffer of at least `min_cap`
    /// bytes.
    fn spill_to_heap(&mut self, min_cap: usize) {
        let Repr::Inline { len, buf } = self.repr else {
            return;
        };
        let len = len as usize;
        let cap = min_cap.max(INLINE_BUF + 1);
        let ptr = self
            .alloc
            .allocate(bytes_layout(cap))
            .expect("string allocation failed");
        // SAFETY: cap > len bytes writable at ptr; buf holds len text
        // bytes.
        unsafe {
            ptr::copy_nonoverlapping(buf.as_ptr(), ptr.as_ptr(), len);
            *ptr.as_ptr().add(len) = 0;
        }
        self.repr = Repr::Heap { ptr, len, cap };
        corex_log::trace!("string spilled to heap (len {len}, cap {cap})");
    }

    /// Relocates the heap buffer to `new_cap` bytes.
    ///
    /// Copies by hand instead of `reallocate`: arena- and scratch-backed
    /// strings get uninitialized memory back from `reallocate`.
    fn grow_heap(&mut self, new_cap: usize) {
        let Repr::Heap { ptr, len, cap } = self.repr else {
            return;
        };
        let new_ptr = self
            .alloc
            .allocate(bytes_layout(new_cap))
            .expect("string allocation failed");
        // SAFETY: both buffers hold at least len + 1 bytes; fresh
        // allocation cannot overlap the old one.
        unsafe {
            ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), len + 1);
        }
        self.alloc.release(ptr, bytes_layout(cap));
        self.repr = Repr::Heap {
            ptr: new_ptr,
            len,
            cap: new_cap,
        };
    }

    /// Copies a short heap string back into the inline buffer and releases
    /// the heap allocation.
    fn demote_to_inline(&mut self) {
        let Repr::Heap { ptr, len, cap } = self.repr else {
            return;
        };
        debug_assert!(len <= INLINE_CAP);
        let mut buf = [0u8; INLINE_BUF];
        // SAFETY: the heap buffer holds len initialized bytes, len <= 23.
        unsafe {
            ptr::copy_nonoverlapping(ptr.as_ptr(), buf.as_mut_ptr(), len);
        }
        self.alloc.release(ptr, bytes_layout(cap));
        self.repr = Repr::Inline {
            len: len as u8,
            buf,
        };
        corex_log::trace!("string demoted to inline (len {len})");
    }
}

impl Default for SmallStr<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for SmallStr<'static> {
    fn from(s: &str) -> Self {
        Self::from_str_in(s, system())
    }
}

impl fmt::Write for SmallStr<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }

    fn write_char(&mut self, c: char) -> fmt::Result {
        self.push(c);
        Ok(())
    }
}

impl Clone for SmallStr<'_> {
    /// Deep copy through the same allocator.
    fn clone(&self) -> Self {
        let mut out = SmallStr::with_capacity_in(self.len(), self.alloc);
        out.push_bytes(self.as_bytes());
        out
    }
}

impl PartialEq for SmallStr<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for SmallStr<'_> {}

impl PartialEq<str> for SmallStr<'_> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for SmallStr<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Display for SmallStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for SmallStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmallStr")
            .field("data", &self.as_str())
            .field("len", &self.len())
            .field("cap", &self.capacity())
            .field("is_inline", &self.is_inline())
            .finish()
    }
}

impl Drop for SmallStr<'_> {
    fn drop(&mut self) {
        if let Repr::Heap { ptr, cap, .. } = self.repr {
            self.alloc.release(ptr, bytes_layout(cap));
        }
    }
}
