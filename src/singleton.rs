//! Process-wide, mutex-guarded pools keyed by a tag type and chunk size.
//!
//! Many allocator façades for the same element size should share one pool.
//! This module keeps a lazily initialised registry of pools keyed by
//! `(tag type, requested size, next_size, max_size)`; every access locks the
//! pool's own mutex, so the single-threaded engine underneath is never
//! entered concurrently.
//!
//! The tag type carries no data — it only partitions the key space, so two
//! façades can be sure they never share a pool (see [`crate::pool_alloc`]).
//!
//! Pools created here live until process exit: Rust never drops statics, and
//! the operating system reclaims the memory. Call
//! [`SingletonPool::purge_memory`] or [`SingletonPool::release_memory`] for
//! explicit teardown.

use core::any::TypeId;
use core::marker::PhantomData;
use core::ptr::NonNull;
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::pool::{Pool, PoolConfig};
use crate::raw_alloc::SystemAllocator;

type PoolKey = (TypeId, usize, usize, usize);
type SharedPool = Arc<Mutex<Pool<SystemAllocator>>>;

static REGISTRY: LazyLock<DashMap<PoolKey, SharedPool>> = LazyLock::new(DashMap::new);

/// Runs `f` on the process-wide pool for `(Tag, requested_size, next_size,
/// max_size)`, creating the pool on first use. The pool's mutex is held for
/// the duration of `f`.
///
/// This is the runtime-keyed core under [`SingletonPool`]; the façade
/// allocators use it directly because a type's size cannot appear as a const
/// generic argument on stable Rust.
pub fn with_pool<Tag, R>(
    requested_size: usize,
    next_size: usize,
    max_size: usize,
    f: impl FnOnce(&mut Pool<SystemAllocator>) -> R,
) -> R
where
    Tag: 'static,
{
    let key = (TypeId::of::<Tag>(), requested_size, next_size, max_size);
    // Clone out of the map entry before locking the pool, so the registry
    // shard lock is never held across user code.
    let pool = {
        let entry = REGISTRY.entry(key).or_insert_with(|| {
            Arc::new(Mutex::new(Pool::with_config(
                requested_size,
                PoolConfig { next_size, max_size },
            )))
        });
        Arc::clone(&entry)
    };
    let mut guard = pool.lock();
    f(&mut guard)
}

/// Static interface to one process-wide pool, identified by a tag type, the
/// requested chunk size and the growth parameters.
///
/// All operations are associated functions; every one of them locks the
/// pool's mutex for its duration. Different parameter tuples address
/// entirely separate pools.
///
/// ```
/// use chunk_pool::SingletonPool;
///
/// struct PacketTag;
/// type PacketPool = SingletonPool<PacketTag, 64>;
///
/// let chunk = PacketPool::allocate().unwrap();
/// assert!(PacketPool::is_from(chunk.as_ptr()));
/// unsafe { PacketPool::deallocate(chunk) };
/// PacketPool::purge_memory();
/// ```
pub struct SingletonPool<
    Tag: 'static,
    const SIZE: usize,
    const NEXT_SIZE: usize = 32,
    const MAX_SIZE: usize = 0,
> {
    _tag: PhantomData<Tag>,
}

impl<Tag: 'static, const SIZE: usize, const NEXT_SIZE: usize, const MAX_SIZE: usize>
    SingletonPool<Tag, SIZE, NEXT_SIZE, MAX_SIZE>
{
    fn with<R>(f: impl FnOnce(&mut Pool<SystemAllocator>) -> R) -> R {
        with_pool::<Tag, R>(SIZE, NEXT_SIZE, MAX_SIZE, f)
    }

    /// Single-chunk allocation; see [`Pool::allocate`].
    pub fn allocate() -> Option<NonNull<u8>> {
        Self::with(|pool| pool.allocate())
    }

    /// Order-preserving single-chunk allocation; see
    /// [`Pool::ordered_allocate`].
    pub fn ordered_allocate() -> Option<NonNull<u8>> {
        Self::with(|pool| pool.ordered_allocate())
    }

    /// Contiguous-run allocation; see [`Pool::ordered_allocate_n`].
    pub fn ordered_allocate_n(n: usize) -> Option<NonNull<u8>> {
        Self::with(|pool| pool.ordered_allocate_n(n))
    }

    /// Returns a chunk; see [`Pool::deallocate`].
    ///
    /// # Safety
    ///
    /// `chunk` must have come from this singleton pool and not be freed
    /// already.
    pub unsafe fn deallocate(chunk: NonNull<u8>) {
        // SAFETY: forwarded contract.
        Self::with(|pool| unsafe { pool.deallocate(chunk) })
    }

    /// Order-preserving return; see [`Pool::ordered_deallocate`].
    ///
    /// # Safety
    ///
    /// Same as [`SingletonPool::deallocate`].
    pub unsafe fn ordered_deallocate(chunk: NonNull<u8>) {
        // SAFETY: forwarded contract.
        Self::with(|pool| unsafe { pool.ordered_deallocate(chunk) })
    }

    /// Returns a run of `n`; see [`Pool::deallocate_n`].
    ///
    /// # Safety
    ///
    /// `chunks` must be a run from this singleton pool allocated with the
    /// same `n`, not already freed.
    pub unsafe fn deallocate_n(chunks: NonNull<u8>, n: usize) {
        // SAFETY: forwarded contract.
        Self::with(|pool| unsafe { pool.deallocate_n(chunks, n) })
    }

    /// Order-preserving run return; see [`Pool::ordered_deallocate_n`].
    ///
    /// # Safety
    ///
    /// Same as [`SingletonPool::deallocate_n`].
    pub unsafe fn ordered_deallocate_n(chunks: NonNull<u8>, n: usize) {
        // SAFETY: forwarded contract.
        Self::with(|pool| unsafe { pool.ordered_deallocate_n(chunks, n) })
    }

    /// Ownership test; see [`Pool::is_from`].
    pub fn is_from(chunk: *const u8) -> bool {
        Self::with(|pool| pool.is_from(chunk))
    }

    /// Frees fully free regions; see [`Pool::release_memory`].
    pub fn release_memory() -> bool {
        Self::with(|pool| pool.release_memory())
    }

    /// Frees all regions; see [`Pool::purge_memory`].
    pub fn purge_memory() -> bool {
        Self::with(|pool| pool.purge_memory())
    }
}
