//! Integration tests for the pool engine.

use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

use chunk_pool::{Pool, PoolConfig, RawAllocator, SystemAllocator, MIN_CHUNK_ALIGN, REGION_ALIGN};

/// Region source that counts calls and refuses requests above a byte limit.
struct MeteredAllocator {
    limit: usize,
    allocs: Rc<Cell<usize>>,
    frees: Rc<Cell<usize>>,
}

impl MeteredAllocator {
    fn new(limit: usize) -> Self {
        Self { limit, allocs: Rc::default(), frees: Rc::default() }
    }
}

// SAFETY: delegates to the system allocator, which honours the contract.
unsafe impl RawAllocator for MeteredAllocator {
    fn allocate(&self, bytes: usize) -> Option<NonNull<u8>> {
        if bytes > self.limit {
            return None;
        }
        let region = SystemAllocator::new().allocate(bytes)?;
        self.allocs.set(self.allocs.get() + 1);
        Some(region)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, bytes: usize) {
        self.frees.set(self.frees.get() + 1);
        unsafe { SystemAllocator::new().deallocate(ptr, bytes) };
    }
}

fn metered(requested: usize, config: PoolConfig, limit: usize) -> (Pool<MeteredAllocator>, Rc<Cell<usize>>, Rc<Cell<usize>>) {
    let raw = MeteredAllocator::new(limit);
    let allocs = Rc::clone(&raw.allocs);
    let frees = Rc::clone(&raw.frees);
    (Pool::with_allocator(requested, config, raw), allocs, frees)
}

#[test]
fn refused_grow_reports_exhaustion_and_changes_nothing() {
    // A 1501-byte chunk size needs a first region of 32 strides plus the
    // trailer, far above the 2000-byte limit.
    let (mut pool, allocs, _) = metered(1501, PoolConfig::default(), 2000);

    assert!(pool.allocate().is_none());
    assert!(pool.ordered_allocate().is_none());
    assert!(pool.ordered_allocate_n(1).is_none());

    assert_eq!(allocs.get(), 0);
    assert_eq!(pool.next_size(), 32);
    assert!(!pool.release_memory());
    assert!(!pool.purge_memory());
}

#[test]
fn next_size_saturates_at_max_size() {
    // With requested == stride the cap arithmetic is exact: 32 doubles to 64
    // on the first grow and then stays there.
    let mut pool = Pool::with_config(8, PoolConfig { next_size: 32, max_size: 64 });
    let mut live = Vec::new();

    for i in 0..=33 {
        let expected = if i == 0 { 32 } else { 64 };
        assert_eq!(pool.next_size(), expected, "iteration {i}");
        live.push(pool.allocate().expect("allocation must succeed"));
    }

    for chunk in live {
        unsafe { pool.deallocate(chunk) };
    }
}

#[test]
fn unused_pool_never_calls_the_user_allocator() {
    let (pool, allocs, frees) = metered(1024, PoolConfig::default(), usize::MAX);
    drop(pool);
    assert_eq!(allocs.get(), 0);
    assert_eq!(frees.get(), 0);
}

#[test]
fn grown_region_is_split_between_run_and_free_list() {
    // requested == stride so one chunk covers exactly one requested unit.
    let r = MIN_CHUNK_ALIGN;
    let (mut pool, allocs, _) = metered(r, PoolConfig::default(), usize::MAX);

    // Empty pool: the run forces one grow of next_size (32) chunks.
    let run = pool.ordered_allocate_n(5).expect("run allocation failed");
    assert_eq!(allocs.get(), 1);
    assert_eq!(pool.next_size(), 64);

    // The 27 leftover chunks serve singles without another grow...
    let mut singles = Vec::new();
    for _ in 0..27 {
        singles.push(pool.ordered_allocate().unwrap());
    }
    assert_eq!(allocs.get(), 1);

    // ...and the 28th allocation grows again.
    singles.push(pool.ordered_allocate().unwrap());
    assert_eq!(allocs.get(), 2);

    // The run chunks are consecutive at the partition stride and disjoint
    // from every single.
    let p = pool.partition_size();
    let base = run.as_ptr() as usize;
    for i in 0..5 {
        let addr = base + i * p;
        assert!(pool.is_from(addr as *const u8));
        assert!(singles.iter().all(|s| s.as_ptr() as usize != addr));
    }

    unsafe {
        pool.ordered_deallocate_n(run, 5);
        for chunk in singles {
            pool.ordered_deallocate(chunk);
        }
    }
    assert!(pool.release_memory());
}

#[test]
fn chunks_are_aligned_and_strided() {
    let mut pool = Pool::new(1501);
    let p = pool.partition_size();
    assert_eq!(p % MIN_CHUNK_ALIGN, 0);
    assert!(p >= 1501);

    // Fresh ordered pool: the first two chunks come from one new region in
    // ascending order, exactly one stride apart.
    let a = pool.ordered_allocate().unwrap();
    let b = pool.ordered_allocate().unwrap();
    assert_eq!(b.as_ptr() as usize - a.as_ptr() as usize, p);
    assert_eq!(a.as_ptr() as usize % REGION_ALIGN, 0);

    unsafe {
        pool.ordered_deallocate(b);
        pool.ordered_deallocate(a);
    }
}

#[test]
fn is_from_tracks_regions_not_liveness() {
    let mut pool = Pool::new(32);
    let chunk = pool.allocate().unwrap();
    assert!(pool.is_from(chunk.as_ptr()));

    let outside = 0usize;
    assert!(!pool.is_from(&outside as *const usize as *const u8));

    unsafe { pool.deallocate(chunk) };
    // The region still contains the address after the free.
    assert!(pool.is_from(chunk.as_ptr()));

    let other = Pool::new(32);
    assert!(!other.is_from(chunk.as_ptr()));
}

#[test]
fn matched_use_releases_every_region() {
    let (mut pool, allocs, frees) = metered(48, PoolConfig::default(), usize::MAX);

    let chunk = pool.ordered_allocate().unwrap();
    unsafe { pool.ordered_deallocate(chunk) };

    assert!(pool.release_memory());
    assert_eq!(frees.get(), allocs.get());
    assert!(!pool.release_memory(), "nothing left to release");
    assert_eq!(pool.next_size(), 32, "release restores the start size");
}

#[test]
fn run_free_then_release_round_trips() {
    let (mut pool, allocs, frees) = metered(40, PoolConfig::default(), usize::MAX);

    let run = pool.ordered_allocate_n(7).unwrap();
    unsafe { pool.ordered_deallocate_n(run, 7) };

    assert!(pool.release_memory());
    assert_eq!(frees.get(), allocs.get());
}

#[test]
fn purge_invalidates_everything_at_once() {
    let (mut pool, allocs, frees) = metered(16, PoolConfig::default(), usize::MAX);

    // Leave chunks live on purpose: purge frees regions regardless.
    let _a = pool.allocate().unwrap();
    let _b = pool.allocate().unwrap();

    assert!(pool.purge_memory());
    assert_eq!(frees.get(), allocs.get());
    assert_eq!(pool.next_size(), 32);
    assert!(!pool.purge_memory());

    // The pool remains usable after a purge.
    let c = pool.allocate().unwrap();
    unsafe { pool.deallocate(c) };
}
