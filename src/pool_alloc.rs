//! Container-facing allocators over the tagged singleton pools.
//!
//! [`PoolAlloc<T>`] and [`FastPoolAlloc<T>`] size their chunks to
//! `size_of::<T>()` and delegate to a process-wide [`singleton`] pool, so
//! every allocator instance for the same element size shares storage.
//! Engine exhaustion (`None`) is translated into an [`AllocError`] here —
//! generic code wants a real error, not a null.
//!
//! The two types differ in strategy, mirroring their pools being keyed by
//! two different tags (they never share memory):
//!
//! - [`PoolAlloc`] always uses the ordered paths. Freed memory keeps the
//!   free list sorted, so containers that allocate many runs (vectors,
//!   deques) keep finding contiguous space and `release_memory` stays
//!   effective.
//! - [`FastPoolAlloc`] uses the O(1) unordered single-chunk path for
//!   one-element requests and falls back to the run path otherwise — the
//!   right trade for node-based containers (lists, maps) that allocate one
//!   node at a time.
//!
//! [`singleton`]: crate::singleton

use core::alloc::Layout;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::error::{AllocError, AllocResult};
use crate::singleton::with_pool;

/// Tag keying the singleton pools behind [`PoolAlloc`].
pub struct PoolAllocTag;

/// Tag keying the singleton pools behind [`FastPoolAlloc`].
pub struct FastPoolAllocTag;

const DEFAULT_NEXT_SIZE: usize = 32;

fn array_layout<T>(n: usize) -> AllocResult<Layout> {
    Layout::array::<T>(n).map_err(|_| AllocError::size_overflow())
}

/// Allocator for arrays of `T` over an ordered singleton pool.
pub struct PoolAlloc<T> {
    _marker: PhantomData<T>,
}

// Manual impls: the handle is a ZST, none of these depend on T.
impl<T> Clone for PoolAlloc<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for PoolAlloc<T> {}
impl<T> Default for PoolAlloc<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T> core::fmt::Debug for PoolAlloc<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PoolAlloc")
    }
}

impl<T> PoolAlloc<T> {
    const SIZE_OK: () = assert!(core::mem::size_of::<T>() != 0, "zero-sized T");

    /// Creates an allocator handle. The underlying pool is created lazily on
    /// first allocation.
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::SIZE_OK;
        Self { _marker: PhantomData }
    }

    /// Allocates storage for `n` values of `T` as one contiguous run.
    ///
    /// # Errors
    ///
    /// [`AllocError`] when the singleton pool cannot obtain memory or the
    /// request overflows. `n == 0` yields a dangling, well-aligned pointer.
    pub fn allocate(&self, n: usize) -> AllocResult<NonNull<T>> {
        if n == 0 {
            return Ok(NonNull::dangling());
        }
        let layout = array_layout::<T>(n)?;
        with_pool::<PoolAllocTag, _>(core::mem::size_of::<T>(), DEFAULT_NEXT_SIZE, 0, |pool| {
            pool.ordered_allocate_n(n)
        })
        .map(NonNull::cast)
        .ok_or(AllocError::out_of_memory(layout))
    }

    /// Returns storage previously obtained from [`PoolAlloc::allocate`] with
    /// the same `n`.
    ///
    /// # Safety
    ///
    /// `ptr` must have come from `allocate(n)` on a `PoolAlloc<T>` and not
    /// be freed already. No destructors run.
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        if n == 0 {
            return;
        }
        with_pool::<PoolAllocTag, _>(core::mem::size_of::<T>(), DEFAULT_NEXT_SIZE, 0, |pool| {
            // SAFETY: forwarded contract.
            unsafe { pool.ordered_deallocate_n(ptr.cast(), n) }
        })
    }

    /// Frees fully free regions of the shared pool.
    pub fn release_memory() -> bool {
        with_pool::<PoolAllocTag, _>(core::mem::size_of::<T>(), DEFAULT_NEXT_SIZE, 0, |pool| {
            pool.release_memory()
        })
    }

    /// Frees all regions of the shared pool, invalidating every outstanding
    /// allocation of this element size.
    pub fn purge_memory() -> bool {
        with_pool::<PoolAllocTag, _>(core::mem::size_of::<T>(), DEFAULT_NEXT_SIZE, 0, |pool| {
            pool.purge_memory()
        })
    }
}

/// Allocator for mostly-single values of `T`, trading free-list order for an
/// O(1) hot path.
pub struct FastPoolAlloc<T> {
    _marker: PhantomData<T>,
}

impl<T> Clone for FastPoolAlloc<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for FastPoolAlloc<T> {}
impl<T> Default for FastPoolAlloc<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T> core::fmt::Debug for FastPoolAlloc<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("FastPoolAlloc")
    }
}

impl<T> FastPoolAlloc<T> {
    const SIZE_OK: () = assert!(core::mem::size_of::<T>() != 0, "zero-sized T");

    /// Creates an allocator handle. The underlying pool is created lazily on
    /// first allocation.
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::SIZE_OK;
        Self { _marker: PhantomData }
    }

    /// Allocates storage for one `T`. O(1) when a free chunk exists.
    ///
    /// # Errors
    ///
    /// [`AllocError`] when the singleton pool cannot obtain memory.
    pub fn allocate_one(&self) -> AllocResult<NonNull<T>> {
        with_pool::<FastPoolAllocTag, _>(core::mem::size_of::<T>(), DEFAULT_NEXT_SIZE, 0, |pool| {
            pool.allocate()
        })
        .map(NonNull::cast)
        .ok_or(AllocError::out_of_memory(Layout::new::<T>()))
    }

    /// Allocates storage for `n` values, using the single-chunk path when
    /// `n == 1` and the contiguous-run path otherwise.
    ///
    /// # Errors
    ///
    /// [`AllocError`] on exhaustion or overflow; `n == 0` yields a dangling
    /// pointer.
    pub fn allocate(&self, n: usize) -> AllocResult<NonNull<T>> {
        if n == 0 {
            return Ok(NonNull::dangling());
        }
        if n == 1 {
            return self.allocate_one();
        }
        let layout = array_layout::<T>(n)?;
        with_pool::<FastPoolAllocTag, _>(core::mem::size_of::<T>(), DEFAULT_NEXT_SIZE, 0, |pool| {
            pool.ordered_allocate_n(n)
        })
        .map(NonNull::cast)
        .ok_or(AllocError::out_of_memory(layout))
    }

    /// Returns storage for one `T`.
    ///
    /// # Safety
    ///
    /// `ptr` must have come from this allocator with `n == 1` and not be
    /// freed already.
    pub unsafe fn deallocate_one(&self, ptr: NonNull<T>) {
        with_pool::<FastPoolAllocTag, _>(core::mem::size_of::<T>(), DEFAULT_NEXT_SIZE, 0, |pool| {
            // SAFETY: forwarded contract.
            unsafe { pool.deallocate(ptr.cast()) }
        })
    }

    /// Returns storage previously obtained with the same `n`.
    ///
    /// # Safety
    ///
    /// `ptr` must have come from `allocate(n)` on a `FastPoolAlloc<T>` and
    /// not be freed already.
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        if n == 0 {
            return;
        }
        if n == 1 {
            // SAFETY: forwarded contract.
            unsafe { self.deallocate_one(ptr) };
            return;
        }
        with_pool::<FastPoolAllocTag, _>(core::mem::size_of::<T>(), DEFAULT_NEXT_SIZE, 0, |pool| {
            // SAFETY: forwarded contract.
            unsafe { pool.deallocate_n(ptr.cast(), n) }
        })
    }

    /// Frees all regions of the shared pool, invalidating every outstanding
    /// allocation of this element size.
    pub fn purge_memory() -> bool {
        with_pool::<FastPoolAllocTag, _>(core::mem::size_of::<T>(), DEFAULT_NEXT_SIZE, 0, |pool| {
            pool.purge_memory()
        })
    }
}
