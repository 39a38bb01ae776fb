//! User allocators: the source of whole memory regions.
//!
//! A pool never allocates chunks individually; it asks a [`RawAllocator`] for
//! one large region at a time and carves it up itself. The contract is
//! deliberately narrow so any region source can be plugged in: the system
//! allocator, `malloc`/`free`, an mmap wrapper, or a failing stub in tests.
//!
//! # Safety
//!
//! Implementations must return regions that are valid for reads and writes of
//! `bytes` bytes and aligned to at least [`REGION_ALIGN`]. The pool hands the
//! original byte length back to [`RawAllocator::deallocate`], so
//! implementations that need the size to free (the system allocator does) get
//! it for free and implementations that don't (libc) may ignore it.

use core::alloc::Layout;
use core::ptr::NonNull;

use crate::utils::lcm;

/// Minimum alignment of every region returned by a [`RawAllocator`].
///
/// A free chunk stores a forward pointer in its first word and each region
/// trailer stores a `usize`, so region bases must suit both.
pub const REGION_ALIGN: usize =
    lcm(core::mem::align_of::<*mut u8>(), core::mem::align_of::<usize>());

/// Source of raw memory regions for a pool.
///
/// # Safety
///
/// Implementors must guarantee:
/// - `allocate(bytes)` returns either `None` or a pointer valid for reads and
///   writes of `bytes` bytes, aligned to at least [`REGION_ALIGN`], and not
///   aliased by any other live allocation.
/// - `deallocate(ptr, bytes)` accepts exactly the pointers previously
///   returned by `allocate` on the same instance, with the same `bytes`.
/// - `allocate` does not unwind.
pub unsafe trait RawAllocator {
    /// Requests a region of `bytes` bytes. Returns `None` when the underlying
    /// source is exhausted (or refuses the request).
    fn allocate(&self, bytes: usize) -> Option<NonNull<u8>>;

    /// Releases a region previously returned by [`RawAllocator::allocate`].
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate(bytes)` on this instance
    /// and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, bytes: usize);
}

/// Region source backed by the global Rust allocator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAllocator;

impl SystemAllocator {
    /// Creates the (stateless) system region source.
    #[inline]
    pub const fn new() -> Self {
        SystemAllocator
    }
}

// SAFETY: std::alloc::alloc returns null or a region valid for the requested
// layout; REGION_ALIGN is a power of two, so the layout is always valid for
// any non-zero size below the isize::MAX guard inside std.
unsafe impl RawAllocator for SystemAllocator {
    fn allocate(&self, bytes: usize) -> Option<NonNull<u8>> {
        if bytes == 0 {
            return None;
        }
        let layout = Layout::from_size_align(bytes, REGION_ALIGN).ok()?;
        // SAFETY: layout has non-zero size (checked above).
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, bytes: usize) {
        debug_assert!(bytes != 0);
        // SAFETY: caller passes back a pointer from allocate(bytes), which
        // used exactly this layout.
        unsafe {
            let layout = Layout::from_size_align_unchecked(bytes, REGION_ALIGN);
            std::alloc::dealloc(ptr.as_ptr(), layout);
        }
    }
}

/// Region source backed by `libc::malloc` / `libc::free`.
///
/// `malloc` guarantees alignment suitable for any fundamental type, which
/// covers [`REGION_ALIGN`] on every supported platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibcAllocator;

impl LibcAllocator {
    /// Creates the (stateless) libc region source.
    #[inline]
    pub const fn new() -> Self {
        LibcAllocator
    }
}

// SAFETY: malloc returns null or a region of at least `bytes` bytes aligned
// to max_align_t; free accepts exactly those pointers.
unsafe impl RawAllocator for LibcAllocator {
    fn allocate(&self, bytes: usize) -> Option<NonNull<u8>> {
        if bytes == 0 {
            return None;
        }
        // SAFETY: malloc has no preconditions beyond bytes != 0 (a zero-size
        // malloc is legal but its result would be useless to the pool).
        NonNull::new(unsafe { libc::malloc(bytes) }.cast::<u8>())
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, _bytes: usize) {
        // SAFETY: caller passes back a pointer obtained from malloc.
        unsafe { libc::free(ptr.as_ptr().cast()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<A: RawAllocator>(raw: &A) {
        let region = raw.allocate(4096).expect("allocation failed");
        assert_eq!(region.as_ptr() as usize % REGION_ALIGN, 0);
        unsafe {
            core::ptr::write_bytes(region.as_ptr(), 0xAB, 4096);
            assert_eq!(*region.as_ptr(), 0xAB);
            raw.deallocate(region, 4096);
        }
    }

    #[test]
    fn system_round_trip() {
        round_trip(&SystemAllocator::new());
    }

    #[test]
    fn libc_round_trip() {
        round_trip(&LibcAllocator::new());
    }

    #[test]
    fn zero_byte_request_is_refused() {
        assert!(SystemAllocator::new().allocate(0).is_none());
        assert!(LibcAllocator::new().allocate(0).is_none());
    }
}
