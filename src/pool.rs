//! The chunk-pool engine.
//!
//! A [`Pool`] owns an ordered list of raw regions obtained from a
//! [`RawAllocator`], carves each region into equally sized chunks through a
//! [`SegregatedStorage`], and serves single chunks or contiguous runs far
//! faster than a general-purpose heap. Region sizes grow geometrically:
//! every grow doubles the chunk count requested next time, optionally capped
//! by `max_size`.
//!
//! The engine is single-threaded and non-reentrant by design; it performs no
//! internal synchronisation. Wrap it in a mutex (see [`crate::singleton`])
//! when sharing across threads.
//!
//! # Memory layout
//!
//! ```text
//! region:  [ chunk 0 | chunk 1 | ... | chunk N-1 | pad | next base | next size ]
//!                                                       `----------trailer---'
//! ```
//!
//! Every chunk is `partition_size` bytes: the least common multiple of the
//! requested size and the platform word sizes, so a free chunk can hold the
//! free-list link and the trailer lands aligned.

use core::fmt;
use core::ptr::{self, NonNull};

use tracing::{debug, trace};

use crate::block::{BlockPtr, TRAILER_SIZE};
use crate::raw_alloc::{RawAllocator, SystemAllocator};
use crate::storage::SegregatedStorage;
use crate::utils::lcm;

/// Smallest admissible chunk stride: a free chunk must hold a pointer and the
/// region trailer must hold a `usize`, so every stride is a multiple of both.
pub const MIN_CHUNK_ALIGN: usize =
    lcm(core::mem::size_of::<*mut u8>(), core::mem::size_of::<usize>());

/// Growth parameters of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of chunks to request from the user allocator on the next grow.
    /// Doubles after every grow. Must be at least 1.
    pub next_size: usize,
    /// Cap on `next_size`, expressed in requested-size units (`0` means
    /// unlimited): a single grow never exceeds `max_size * requested_size`
    /// bytes worth of chunks.
    pub max_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { next_size: 32, max_size: 0 }
    }
}

/// Fast fixed-chunk allocator over user-provided raw regions.
///
/// All chunks served by one pool have the same effective size,
/// [`Pool::partition_size`]. Allocation is amortised O(1); the ordered
/// variants additionally keep the free list sorted by address, which enables
/// contiguous-run allocation, [`Pool::release_memory`] and the typed pool's
/// destructor sweep.
///
/// Deallocation performs no verification: passing a pointer that did not
/// come from the same pool is undefined behaviour, which is why the
/// `deallocate` family is `unsafe`.
pub struct Pool<A: RawAllocator = SystemAllocator> {
    store: SegregatedStorage,
    /// First block record; the rest of the list lives in region trailers,
    /// ascending by base address.
    list: BlockPtr,
    raw: A,
    requested_size: usize,
    next_size: usize,
    start_size: usize,
    max_size: usize,
}

impl Pool<SystemAllocator> {
    /// Creates an empty pool serving chunks of `requested_size` bytes,
    /// backed by the system allocator, with default growth parameters.
    ///
    /// No memory is requested until the first allocation.
    ///
    /// # Panics
    ///
    /// Panics if `requested_size` is zero.
    pub fn new(requested_size: usize) -> Self {
        Self::with_config(requested_size, PoolConfig::default())
    }

    /// Creates an empty pool with explicit growth parameters.
    ///
    /// # Panics
    ///
    /// Panics if `requested_size` or `config.next_size` is zero.
    pub fn with_config(requested_size: usize, config: PoolConfig) -> Self {
        Self::with_allocator(requested_size, config, SystemAllocator::new())
    }
}

impl<A: RawAllocator> Pool<A> {
    /// Creates an empty pool drawing regions from `raw`.
    ///
    /// # Panics
    ///
    /// Panics if `requested_size` or `config.next_size` is zero.
    pub fn with_allocator(requested_size: usize, config: PoolConfig, raw: A) -> Self {
        assert!(requested_size >= 1, "requested chunk size must be at least 1");
        assert!(config.next_size >= 1, "next_size must be at least 1");
        Self {
            store: SegregatedStorage::new(),
            list: BlockPtr::invalid(),
            raw,
            requested_size,
            next_size: config.next_size,
            start_size: config.next_size,
            max_size: config.max_size,
        }
    }

    /// The chunk size the caller asked for.
    #[inline]
    pub fn requested_size(&self) -> usize {
        self.requested_size
    }

    /// The effective chunk stride:
    /// `lcm(requested_size, lcm(size_of::<*mut u8>(), size_of::<usize>()))`.
    ///
    /// Every returned chunk address is a multiple of this stride away from
    /// its region base.
    #[inline]
    pub fn partition_size(&self) -> usize {
        lcm(self.requested_size, MIN_CHUNK_ALIGN)
    }

    /// Number of chunks the next grow will request.
    #[inline]
    pub fn next_size(&self) -> usize {
        self.next_size
    }

    /// Sets the chunk count for the next grow; also becomes the value
    /// restored by [`Pool::release_memory`] and [`Pool::purge_memory`].
    ///
    /// # Panics
    ///
    /// Panics if `next_size` is zero.
    pub fn set_next_size(&mut self, next_size: usize) {
        assert!(next_size >= 1, "next_size must be at least 1");
        self.next_size = next_size;
        self.start_size = next_size;
    }

    /// Current grow cap in requested-size units (0 = unlimited).
    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Sets the grow cap (0 = unlimited).
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
    }

    /// Allocates one chunk. Pops the free list, growing the pool when it is
    /// empty. Returns `None` only when the user allocator refuses the grow.
    /// Amortised O(1).
    pub fn allocate(&mut self) -> Option<NonNull<u8>> {
        if let Some(chunk) = self.store.pop() {
            return Some(chunk);
        }
        self.grow(false)
    }

    /// Like [`Pool::allocate`], but a grow merges the new region into the
    /// free list and block list in address order, preserving the ordered
    /// invariant. Amortised O(1); a grow itself is O(regions + chunks).
    pub fn ordered_allocate(&mut self) -> Option<NonNull<u8>> {
        if let Some(chunk) = self.store.pop() {
            return Some(chunk);
        }
        self.grow(true)
    }

    /// Allocates `n * requested_size` contiguous bytes as a run of whole
    /// chunks, searching the ordered free list first and growing on miss.
    /// Returns `None` for `n == 0`, on arithmetic overflow, or when the user
    /// allocator refuses the grow.
    ///
    /// The pool must be used in ordered mode for the run search to see
    /// contiguous chunks.
    pub fn ordered_allocate_n(&mut self, n: usize) -> Option<NonNull<u8>> {
        if n == 0 {
            return None;
        }
        let partition_size = self.partition_size();
        let num_chunks = self.chunks_for(n, partition_size)?;

        if let Some(run) = self.store.allocate_n(num_chunks, partition_size) {
            return Some(run);
        }
        trace!(n, num_chunks, "no contiguous run in free list, growing");

        // Grow by at least the requested run, never less than the scheduled
        // next_size; commit the bump only once the region is in hand.
        let grow_chunks = self.next_size.max(num_chunks);
        let region_size = grow_chunks
            .checked_mul(partition_size)?
            .checked_add(TRAILER_SIZE)?;
        let region = self.raw.allocate(region_size)?;
        self.next_size = grow_chunks;
        let node = BlockPtr::new(region.as_ptr(), region_size);
        debug!(
            bytes = region_size,
            chunks = grow_chunks,
            run = num_chunks,
            "pool grew for a contiguous run"
        );

        // The first num_chunks chunks become the returned run; the remainder
        // of the region joins the ordered free list.
        if grow_chunks > num_chunks {
            // SAFETY: the split point is inside the freshly allocated chunk
            // area; the remainder is a whole number of chunks.
            unsafe {
                let rest = NonNull::new_unchecked(region.as_ptr().add(num_chunks * partition_size));
                self.store.add_ordered_block(
                    rest,
                    node.element_size() - num_chunks * partition_size,
                    partition_size,
                );
            }
        }

        self.bump_next_size(partition_size);
        // SAFETY: node is the live region just obtained from `raw`.
        unsafe { self.insert_block_ordered(node) };
        Some(region)
    }

    /// Returns one chunk to the free list. O(1).
    ///
    /// # Safety
    ///
    /// `chunk` must have come from an allocation method of this pool and not
    /// be in the free list already (no double free).
    #[inline]
    pub unsafe fn deallocate(&mut self, chunk: NonNull<u8>) {
        debug_assert!(self.is_from(chunk.as_ptr()));
        // SAFETY: forwarded contract.
        unsafe { self.store.push(chunk) };
    }

    /// Returns one chunk to the free list at its address-ordered position.
    /// O(F) in the free-list length.
    ///
    /// # Safety
    ///
    /// Same as [`Pool::deallocate`].
    #[inline]
    pub unsafe fn ordered_deallocate(&mut self, chunk: NonNull<u8>) {
        debug_assert!(self.is_from(chunk.as_ptr()));
        // SAFETY: forwarded contract.
        unsafe { self.store.ordered_push(chunk) };
    }

    /// Returns a run previously obtained from
    /// [`Pool::ordered_allocate_n`] with the same `n`. O(n).
    ///
    /// # Safety
    ///
    /// `chunks` must be a run of this pool allocated with the same `n`, not
    /// already freed.
    pub unsafe fn deallocate_n(&mut self, chunks: NonNull<u8>, n: usize) {
        let partition_size = self.partition_size();
        if let Some(num_chunks) = self.chunks_for(n, partition_size) {
            // SAFETY: forwarded contract.
            unsafe { self.store.free_n(chunks, num_chunks, partition_size) };
        }
    }

    /// Order-preserving variant of [`Pool::deallocate_n`]. O(F + n).
    ///
    /// # Safety
    ///
    /// Same as [`Pool::deallocate_n`]; the pool must be ordered.
    pub unsafe fn ordered_deallocate_n(&mut self, chunks: NonNull<u8>, n: usize) {
        let partition_size = self.partition_size();
        if let Some(num_chunks) = self.chunks_for(n, partition_size) {
            // SAFETY: forwarded contract.
            unsafe { self.store.ordered_free_n(chunks, num_chunks, partition_size) };
        }
    }

    /// Tests whether `chunk` lies in the chunk area of any region owned by
    /// this pool.
    ///
    /// Only meaningful for pointers that were actually produced by *some*
    /// pool: a true result says the address belongs to this pool (now or as
    /// a future allocation), a false result says it belongs elsewhere. It is
    /// not a validity predicate for arbitrary addresses.
    pub fn is_from(&self, chunk: *const u8) -> bool {
        let mut iter = self.list;
        while iter.valid() {
            if Self::chunk_in_block(chunk, iter.begin(), iter.element_size()) {
                return true;
            }
            // SAFETY: iter is a live region of this pool.
            iter = unsafe { iter.next() };
        }
        false
    }

    /// Frees every region whose chunks are all currently free, walking the
    /// ordered block list and ordered free list in lockstep. O(total
    /// chunks). Returns true if at least one region went back to the user
    /// allocator. Resets `next_size` to its starting value.
    ///
    /// Requires the pool to have been used exclusively through the ordered
    /// operations; an unordered free list makes the lockstep walk miss
    /// regions (it stays memory-safe).
    pub fn release_memory(&mut self) -> bool {
        let mut released = false;
        let partition_size = self.partition_size();

        let mut ptr = self.list;
        let mut prev = BlockPtr::invalid();

        // free_p: the first free chunk in this or some later region.
        // prev_free_p: the last free chunk in an earlier region.
        let mut free_p = self.store.head_raw();
        let mut prev_free_p: *mut u8 = ptr::null_mut();

        while ptr.valid() {
            // Every remaining region is fully live once the free list is
            // exhausted.
            if free_p.is_null() {
                break;
            }

            // A region may be freed iff each chunk position is exactly the
            // next free-list entry.
            let mut all_chunks_free = true;
            let saved_free = free_p;
            let end = ptr.end();
            let mut i = ptr.begin();
            while i != end {
                if i != free_p {
                    all_chunks_free = false;
                    // The cursor may have run ahead; rewind to this region's
                    // first free chunk.
                    free_p = saved_free;
                    break;
                }
                // SAFETY: free_p is a live free chunk (it matched a chunk
                // position and came off the free list).
                free_p = unsafe { SegregatedStorage::next_raw(free_p) };
                i = i.wrapping_add(partition_size);
            }

            // SAFETY: ptr is a live region.
            let next = unsafe { ptr.next() };

            if all_chunks_free {
                // Unlink the region from the block list...
                if prev.valid() {
                    // SAFETY: prev is a live region preceding ptr.
                    unsafe { prev.set_next(&next) };
                } else {
                    self.list = next;
                }
                // ...and its chunks from the free list as one span.
                if prev_free_p.is_null() {
                    self.store.set_head_raw(free_p);
                } else {
                    // SAFETY: prev_free_p is a live free chunk of an earlier
                    // region.
                    unsafe { SegregatedStorage::set_next_raw(prev_free_p, free_p) };
                }
                // SAFETY: the region came from `raw` with exactly this size.
                unsafe {
                    self.raw
                        .deallocate(NonNull::new_unchecked(ptr.begin()), ptr.total_size());
                }
                released = true;
            } else {
                // Skip the free cursor past this region's remaining free
                // chunks so it points into a later region.
                if Self::chunk_in_block(free_p, ptr.begin(), ptr.element_size()) {
                    let end_addr = end as usize;
                    loop {
                        prev_free_p = free_p;
                        // SAFETY: free_p is a live free chunk.
                        free_p = unsafe { SegregatedStorage::next_raw(free_p) };
                        if free_p.is_null() || free_p as usize >= end_addr {
                            break;
                        }
                    }
                }
                prev = ptr;
            }

            ptr = next;
        }

        self.next_size = self.start_size;
        if released {
            debug!("released fully free regions");
        }
        released
    }

    /// Unconditionally returns every region to the user allocator,
    /// invalidating all outstanding chunks, and resets `next_size`. Returns
    /// false when the pool owned no memory (making a second call a no-op).
    pub fn purge_memory(&mut self) -> bool {
        let mut iter = self.list;
        if !iter.valid() {
            return false;
        }

        let mut regions = 0usize;
        while iter.valid() {
            // SAFETY: iter is a live region; read the link before freeing.
            let next = unsafe { iter.next() };
            // SAFETY: the region came from `raw` with exactly this size.
            unsafe {
                self.raw
                    .deallocate(NonNull::new_unchecked(iter.begin()), iter.total_size());
            }
            regions += 1;
            iter = next;
        }

        self.list.invalidate();
        self.store.set_head_raw(ptr::null_mut());
        self.next_size = self.start_size;
        debug!(regions, "purged pool");
        true
    }

    /// Grows the pool by one region of `next_size` chunks and pops the first
    /// free chunk. Returns `None` (with no state change) when the user
    /// allocator refuses or the region size overflows.
    fn grow(&mut self, ordered: bool) -> Option<NonNull<u8>> {
        let partition_size = self.partition_size();
        let region_size = self
            .next_size
            .checked_mul(partition_size)?
            .checked_add(TRAILER_SIZE)?;
        let region = self.raw.allocate(region_size)?;
        let node = BlockPtr::new(region.as_ptr(), region_size);
        debug!(bytes = region_size, chunks = self.next_size, ordered, "pool grew");

        self.bump_next_size(partition_size);

        // SAFETY: node is the live region just obtained from `raw`; its
        // chunk area satisfies the segregate preconditions (stride >= word,
        // word-aligned base from RawAllocator's REGION_ALIGN contract).
        unsafe {
            if ordered {
                self.store
                    .add_ordered_block(region, node.element_size(), partition_size);
                self.insert_block_ordered(node);
            } else {
                self.store.add_block(region, node.element_size(), partition_size);
                node.set_next(&self.list);
                self.list = node;
            }
        }

        self.store.pop()
    }

    /// Doubles `next_size`, clamped so a grow never exceeds
    /// `max_size * requested_size` bytes worth of chunks (when capped).
    fn bump_next_size(&mut self, partition_size: usize) {
        if self.max_size == 0 {
            self.next_size <<= 1;
        } else if self.next_size * partition_size / self.requested_size < self.max_size {
            self.next_size =
                (self.next_size << 1).min(self.max_size * self.requested_size / partition_size);
        }
    }

    /// Splices `node` into the block list, keeping base addresses ascending.
    ///
    /// # Safety
    ///
    /// `node` must be a live region not yet in the list; the list must be
    /// ordered.
    unsafe fn insert_block_ordered(&mut self, node: BlockPtr) {
        if !self.list.valid() || self.list.begin() as usize > node.begin() as usize {
            // SAFETY: node is live per contract.
            unsafe { node.set_next(&self.list) };
            self.list = node;
            return;
        }

        let mut prev = self.list;
        loop {
            // SAFETY: prev is a live listed region.
            let next = unsafe { prev.next() };
            if !next.valid() || next.begin() as usize > node.begin() as usize {
                break;
            }
            prev = next;
        }
        // SAFETY: prev and node are live; splice preserves the chain.
        unsafe {
            node.set_next(&prev.next());
            prev.set_next(&node);
        }
    }

    /// Number of whole chunks covering `n` requested-size units, or `None`
    /// on overflow.
    fn chunks_for(&self, n: usize, partition_size: usize) -> Option<usize> {
        let total = n.checked_mul(self.requested_size)?;
        Some(total / partition_size + usize::from(total % partition_size != 0))
    }

    /// Range test with a strict total order on addresses; raw pointer
    /// comparison across unrelated regions would be meaningless.
    #[inline]
    fn chunk_in_block(chunk: *const u8, begin: *const u8, element_size: usize) -> bool {
        let (chunk, begin) = (chunk as usize, begin as usize);
        begin <= chunk && chunk < begin + element_size
    }

    // Internals shared with the typed pool's destructor sweep.

    #[inline]
    pub(crate) fn block_list(&self) -> BlockPtr {
        self.list
    }

    #[inline]
    pub(crate) fn free_head(&self) -> *mut u8 {
        self.store.head_raw()
    }

    #[inline]
    pub(crate) fn raw(&self) -> &A {
        &self.raw
    }

    /// Drops all bookkeeping without touching the regions. Used after a
    /// manual sweep has already freed them.
    pub(crate) fn forget_all(&mut self) {
        self.list.invalidate();
        self.store.set_head_raw(ptr::null_mut());
    }
}

impl<A: RawAllocator> Drop for Pool<A> {
    fn drop(&mut self) {
        self.purge_memory();
    }
}

impl<A: RawAllocator + fmt::Debug> fmt::Debug for Pool<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("requested_size", &self.requested_size)
            .field("partition_size", &self.partition_size())
            .field("next_size", &self.next_size)
            .field("max_size", &self.max_size)
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}

// SAFETY: a Pool exclusively owns its regions and free list; no operation
// shares state outside &mut self, so moving the whole pool to another thread
// is sound whenever the region source is.
unsafe impl<A: RawAllocator + Send> Send for Pool<A> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counters {
        allocs: Cell<usize>,
        frees: Cell<usize>,
    }

    /// Region source that counts calls and can refuse large requests.
    struct StubAllocator {
        limit: usize,
        counters: Rc<Counters>,
    }

    impl StubAllocator {
        fn new(limit: usize) -> Self {
            Self { limit, counters: Rc::default() }
        }
    }

    // SAFETY: delegates to the system allocator, which honours the contract.
    unsafe impl RawAllocator for StubAllocator {
        fn allocate(&self, bytes: usize) -> Option<NonNull<u8>> {
            if bytes > self.limit {
                return None;
            }
            let region = SystemAllocator::new().allocate(bytes)?;
            self.counters.allocs.set(self.counters.allocs.get() + 1);
            Some(region)
        }

        unsafe fn deallocate(&self, ptr: NonNull<u8>, bytes: usize) {
            self.counters.frees.set(self.counters.frees.get() + 1);
            // SAFETY: forwarded contract.
            unsafe { SystemAllocator::new().deallocate(ptr, bytes) };
        }
    }

    fn pool_with_stub(requested: usize, config: PoolConfig, limit: usize) -> Pool<StubAllocator> {
        Pool::with_allocator(requested, config, StubAllocator::new(limit))
    }

    #[test]
    fn partition_size_is_the_documented_lcm() {
        let pool = Pool::new(1501);
        assert_eq!(pool.partition_size(), lcm(1501, MIN_CHUNK_ALIGN));
        let pool = Pool::new(MIN_CHUNK_ALIGN);
        assert_eq!(pool.partition_size(), MIN_CHUNK_ALIGN);
        let pool = Pool::new(1);
        assert_eq!(pool.partition_size(), MIN_CHUNK_ALIGN);
    }

    #[test]
    fn construction_allocates_nothing() {
        let counters;
        {
            let pool = pool_with_stub(1024, PoolConfig::default(), usize::MAX);
            counters = Rc::clone(&pool.raw().counters);
        }
        assert_eq!(counters.allocs.get(), 0);
        assert_eq!(counters.frees.get(), 0);
    }

    #[test]
    fn next_size_doubles_without_a_cap() {
        let mut pool = pool_with_stub(8, PoolConfig { next_size: 4, max_size: 0 }, usize::MAX);
        assert_eq!(pool.next_size(), 4);
        let counters = Rc::clone(&pool.raw().counters);

        let mut live = Vec::new();
        live.push(pool.allocate().unwrap());
        assert_eq!(pool.next_size(), 8);
        assert_eq!(counters.allocs.get(), 1);

        // Drain the rest of the first region: no further grow.
        for _ in 0..3 {
            live.push(pool.allocate().unwrap());
        }
        assert_eq!(counters.allocs.get(), 1);

        // Fifth chunk forces the second grow.
        live.push(pool.allocate().unwrap());
        assert_eq!(pool.next_size(), 16);
        assert_eq!(counters.allocs.get(), 2);

        for chunk in live {
            unsafe { pool.deallocate(chunk) };
        }
    }

    #[test]
    fn next_size_respects_the_cap() {
        // requested == partition here, so the cap predicate is exact.
        let r = MIN_CHUNK_ALIGN;
        let mut pool = pool_with_stub(r, PoolConfig { next_size: 32, max_size: 40 }, usize::MAX);

        let mut live = Vec::new();
        // First grow: 32 chunks; doubling would give 64, the cap clamps at 40.
        live.push(pool.allocate().unwrap());
        assert_eq!(pool.next_size(), 40);

        // Drain the first region and force a second grow: at the cap the
        // value stays put.
        for _ in 0..31 {
            live.push(pool.allocate().unwrap());
        }
        live.push(pool.allocate().unwrap());
        assert_eq!(pool.next_size(), 40);

        for chunk in live {
            unsafe { pool.deallocate(chunk) };
        }
    }

    #[test]
    fn failed_grow_leaves_state_unchanged() {
        let mut pool = pool_with_stub(1501, PoolConfig::default(), 2000);
        assert!(pool.allocate().is_none());
        assert_eq!(pool.next_size(), 32);
        assert_eq!(pool.raw().counters.allocs.get(), 0);
        assert!(!pool.release_memory());
        assert!(!pool.purge_memory());
    }

    #[test]
    fn set_next_size_also_resets_the_restart_value() {
        let mut pool = pool_with_stub(8, PoolConfig::default(), usize::MAX);
        pool.set_next_size(4);

        let chunk = pool.ordered_allocate().unwrap();
        assert_eq!(pool.next_size(), 8);
        unsafe { pool.ordered_deallocate(chunk) };

        assert!(pool.release_memory());
        assert_eq!(pool.next_size(), 4);
    }

    #[test]
    fn drop_returns_all_regions() {
        let counters;
        {
            let mut pool = pool_with_stub(64, PoolConfig::default(), usize::MAX);
            counters = Rc::clone(&pool.raw().counters);
            let _chunk = pool.allocate().unwrap();
            assert_eq!(counters.allocs.get(), 1);
            assert_eq!(counters.frees.get(), 0);
        }
        assert_eq!(counters.frees.get(), counters.allocs.get());
    }

    #[test]
    fn purge_is_idempotent() {
        let mut pool = pool_with_stub(16, PoolConfig::default(), usize::MAX);
        let counters = Rc::clone(&pool.raw().counters);
        let _ = pool.allocate().unwrap();
        assert!(pool.purge_memory());
        assert!(!pool.purge_memory());
        assert_eq!(counters.frees.get(), counters.allocs.get());
    }

    #[test]
    #[should_panic(expected = "requested chunk size")]
    fn zero_requested_size_panics() {
        let _ = Pool::new(0);
    }

    #[test]
    #[should_panic(expected = "next_size")]
    fn zero_next_size_panics() {
        let _ = Pool::with_config(8, PoolConfig { next_size: 0, max_size: 0 });
    }
}
