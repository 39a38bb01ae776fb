//! Typed object pool with automatic destruction of live elements.
//!
//! [`ObjectPool<T>`] serves chunks of `size_of::<T>()` through an ordered
//! [`Pool`] and remembers, by way of the ordered free list, which chunks are
//! live. Dropping the pool walks the block list and free list in lockstep
//! and runs `T`'s destructor for every chunk that was never returned, then
//! frees the regions — leak-free even when callers only ever `construct`.

use core::marker::PhantomData;
use core::mem;
use core::ptr::NonNull;

use crate::pool::{Pool, PoolConfig};
use crate::raw_alloc::{RawAllocator, SystemAllocator};
use crate::storage::SegregatedStorage;

/// Fast allocator for objects of a single type `T`.
///
/// All allocation goes through the ordered paths of the underlying [`Pool`]:
/// ordering is what makes the destructor sweep on drop possible (an
/// unordered free list cannot be walked in lockstep with the region list).
///
/// `T`'s destructor must not panic; a panicking destructor during the drop
/// sweep aborts the sweep mid-way.
pub struct ObjectPool<T, A: RawAllocator = SystemAllocator> {
    pool: Pool<A>,
    _marker: PhantomData<T>,
}

impl<T> ObjectPool<T, SystemAllocator> {
    /// Creates an empty pool for `T` with default growth parameters.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Creates an empty pool for `T` with explicit growth parameters.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized or `config.next_size` is zero.
    pub fn with_config(config: PoolConfig) -> Self {
        Self::with_allocator(config, SystemAllocator::new())
    }
}

impl<T, A: RawAllocator> ObjectPool<T, A> {
    /// Creates an empty pool for `T` drawing regions from `raw`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized or `config.next_size` is zero.
    pub fn with_allocator(config: PoolConfig, raw: A) -> Self {
        assert!(mem::size_of::<T>() != 0, "zero-sized types cannot be pooled");
        Self {
            pool: Pool::with_allocator(mem::size_of::<T>(), config, raw),
            _marker: PhantomData,
        }
    }

    /// Allocates storage for one `T` without initialising it. Returns `None`
    /// when the user allocator is exhausted. Amortised O(1).
    #[inline]
    pub fn allocate(&mut self) -> Option<NonNull<T>> {
        self.pool.ordered_allocate().map(NonNull::cast)
    }

    /// Returns storage to the pool without running `T`'s destructor.
    ///
    /// # Safety
    ///
    /// `ptr` must have come from this pool and not be freed already. Any
    /// value still in the chunk is forgotten, not dropped.
    #[inline]
    pub unsafe fn deallocate(&mut self, ptr: NonNull<T>) {
        // SAFETY: forwarded contract.
        unsafe { self.pool.ordered_deallocate(ptr.cast()) };
    }

    /// Allocates and moves `value` into the pool. Returns `None` (dropping
    /// the value) when the user allocator is exhausted.
    pub fn construct(&mut self, value: T) -> Option<NonNull<T>> {
        let chunk = self.allocate()?;
        // SAFETY: chunk is fresh, properly aligned storage for a T.
        unsafe { chunk.as_ptr().write(value) };
        Some(chunk)
    }

    /// Allocates and initialises in place with `init`. If `init` panics the
    /// chunk goes back to the pool before the panic continues, so nothing
    /// leaks.
    pub fn construct_with<F>(&mut self, init: F) -> Option<NonNull<T>>
    where
        F: FnOnce() -> T,
    {
        let chunk = self.allocate()?;

        // Return the chunk on unwind; defused once the write happened.
        struct Reclaim<'a, A: RawAllocator> {
            pool: &'a mut Pool<A>,
            chunk: NonNull<u8>,
        }
        impl<A: RawAllocator> Drop for Reclaim<'_, A> {
            fn drop(&mut self) {
                // SAFETY: the chunk came from this pool and holds no value.
                unsafe { self.pool.ordered_deallocate(self.chunk) };
            }
        }

        let guard = Reclaim { pool: &mut self.pool, chunk: chunk.cast() };
        let value = init();
        mem::forget(guard);
        // SAFETY: chunk is fresh, properly aligned storage for a T.
        unsafe { chunk.as_ptr().write(value) };
        Some(chunk)
    }

    /// Runs `T`'s destructor and returns the storage to the pool.
    ///
    /// # Safety
    ///
    /// `ptr` must have come from this pool, hold an initialised value, and
    /// not be freed already.
    pub unsafe fn destroy(&mut self, ptr: NonNull<T>) {
        // SAFETY: forwarded contract.
        unsafe {
            ptr.as_ptr().drop_in_place();
            self.pool.ordered_deallocate(ptr.cast());
        }
    }

    /// Tests whether `ptr` lies inside storage owned by this pool. See
    /// [`Pool::is_from`] for the caveats.
    #[inline]
    pub fn is_from(&self, ptr: *const T) -> bool {
        self.pool.is_from(ptr.cast())
    }

    /// Number of chunks the next grow will request.
    #[inline]
    pub fn next_size(&self) -> usize {
        self.pool.next_size()
    }

    /// Sets the chunk count for the next grow.
    ///
    /// # Panics
    ///
    /// Panics if `next_size` is zero.
    #[inline]
    pub fn set_next_size(&mut self, next_size: usize) {
        self.pool.set_next_size(next_size);
    }
}

impl<T> Default for ObjectPool<T, SystemAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: RawAllocator> Drop for ObjectPool<T, A> {
    fn drop(&mut self) {
        // Without a destructor there is nothing to sweep; the inner pool's
        // drop purges the regions.
        if !mem::needs_drop::<T>() {
            return;
        }
        if !self.pool.block_list().valid() {
            return;
        }

        let partition_size = self.pool.partition_size();
        let mut iter = self.pool.block_list();
        // Both lists are address ordered, so one cursor pass over the free
        // list identifies the free chunk positions of every region in turn.
        let mut freed = self.pool.free_head();

        while iter.valid() {
            // SAFETY: iter is a live region owned by the pool.
            let next = unsafe { iter.next() };

            let end = iter.end();
            let mut chunk = iter.begin();
            while chunk != end {
                if chunk == freed {
                    // Free chunk: skip, advance the free-list cursor.
                    // SAFETY: freed is a live free chunk.
                    freed = unsafe { SegregatedStorage::next_raw(freed) };
                } else {
                    // Live chunk: it holds a constructed T nobody returned.
                    // SAFETY: live chunks of an object pool hold initialised
                    // values; each is dropped exactly once.
                    unsafe { chunk.cast::<T>().drop_in_place() };
                }
                chunk = chunk.wrapping_add(partition_size);
            }

            // SAFETY: the region came from the pool's allocator with exactly
            // this size; it is unlinked from further traversal via `next`.
            unsafe {
                self.pool
                    .raw()
                    .deallocate(NonNull::new_unchecked(iter.begin()), iter.total_size());
            }
            iter = next;
        }

        // Regions are gone; stop the inner pool from purging them again.
        self.pool.forget_all();
    }
}
