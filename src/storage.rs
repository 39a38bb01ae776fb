//! Segregated storage: the free-list primitive under every pool.
//!
//! A [`SegregatedStorage`] threads a singly-linked list of equally sized free
//! chunks through the chunks' own first words. It owns no memory; callers
//! (the pool engine) feed it raw regions via `add_block`/`add_ordered_block`
//! and it hands chunks back out in O(1), or in address order when asked.
//!
//! # Safety
//!
//! The list is intrusive: a free chunk's first pointer-sized word *is* its
//! list node. Everything here relies on one structural invariant, established
//! by the unsafe insertion methods and preserved by every operation:
//!
//! - every pointer reachable from `first` refers to a chunk of at least
//!   pointer size, aligned for a pointer, inside memory the caller keeps
//!   alive for as long as the chunk is listed, and
//! - no chunk appears twice.
//!
//! Given that, the safe read-side operations (`pop`, `allocate_n`) cannot go
//! wrong; the unsafe write-side operations each document what the caller must
//! uphold.

use core::ptr::{self, NonNull};

use crate::utils::is_aligned_to;

/// View of a free chunk's first word as the link to the next free chunk.
#[repr(C)]
struct FreeChunk {
    next: *mut FreeChunk,
}

/// Singly-linked list of equally sized free chunks laid out inside caller
/// provided memory regions.
pub struct SegregatedStorage {
    /// Head of the free list; null iff the list is empty.
    first: *mut FreeChunk,
}

impl SegregatedStorage {
    /// Creates an empty storage.
    #[inline]
    pub const fn new() -> Self {
        Self { first: ptr::null_mut() }
    }

    /// Returns true if no free chunk is available.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.first.is_null()
    }

    /// Carves `block[..size]` into chunks of `partition_size` bytes, threads
    /// them into a list in ascending address order and terminates the last
    /// chunk with `end`. Returns the head (equal to `block`).
    ///
    /// Trailing bytes that do not fill a whole chunk are left untouched.
    ///
    /// # Safety
    ///
    /// - `partition_size >= size_of::<*mut u8>()` and a multiple of the
    ///   pointer alignment; `size >= partition_size`.
    /// - `block` is aligned for a pointer and valid for writes of `size`
    ///   bytes.
    /// - `end` is null or a valid free chunk.
    unsafe fn segregate(
        block: *mut u8,
        size: usize,
        partition_size: usize,
        end: *mut FreeChunk,
    ) -> *mut FreeChunk {
        debug_assert!(partition_size >= core::mem::size_of::<*mut u8>());
        debug_assert!(is_aligned_to(partition_size, core::mem::align_of::<*mut u8>()));
        debug_assert!(size >= partition_size);
        debug_assert!(is_aligned_to(block as usize, core::mem::align_of::<*mut u8>()));

        // Last whole chunk in the block. The divide-then-multiply keeps the
        // offset a multiple of partition_size even when size is not.
        // SAFETY: the offset is < size, so the result stays inside the block.
        let mut old = unsafe {
            block.add((size - partition_size) / partition_size * partition_size)
        }
        .cast::<FreeChunk>();
        // SAFETY: old is a chunk inside the block; chunks hold a pointer.
        unsafe { (*old).next = end };

        // Single-chunk block: head and tail coincide.
        if old.cast::<u8>() == block {
            return block.cast();
        }

        // Walk backwards so the finished list reads front-to-back in
        // ascending address order.
        // SAFETY: iter steps through whole chunks strictly inside the block.
        unsafe {
            let mut iter = old.cast::<u8>().sub(partition_size).cast::<FreeChunk>();
            while iter.cast::<u8>() != block {
                (*iter).next = old;
                old = iter;
                iter = iter.cast::<u8>().sub(partition_size).cast::<FreeChunk>();
            }
            (*iter).next = old;
        }
        block.cast()
    }

    /// Segregates a fresh region and prepends its chunks to the free list.
    ///
    /// # Safety
    ///
    /// Same preconditions as `segregate`; additionally the region must stay
    /// valid (and unaliased) for as long as any of its chunks is either
    /// listed here or held by a caller.
    pub unsafe fn add_block(&mut self, block: NonNull<u8>, size: usize, partition_size: usize) {
        // SAFETY: forwarded preconditions; self.first is null or a valid
        // chunk by the structural invariant.
        self.first = unsafe { Self::segregate(block.as_ptr(), size, partition_size, self.first) };
    }

    /// Segregates a fresh region and merges its chunks into the free list so
    /// that ascending address order is preserved.
    ///
    /// # Safety
    ///
    /// Same as [`SegregatedStorage::add_block`]; the existing list must
    /// already be address ordered.
    pub unsafe fn add_ordered_block(
        &mut self,
        block: NonNull<u8>,
        size: usize,
        partition_size: usize,
    ) {
        let loc = self.find_prev(block.as_ptr());
        if loc.is_null() {
            // Region precedes every listed chunk (or the list is empty).
            // SAFETY: forwarded preconditions.
            unsafe { self.add_block(block, size, partition_size) };
        } else {
            // SAFETY: loc is a live chunk from the list; splice the new run
            // between loc and its successor.
            unsafe {
                (*loc).next = Self::segregate(block.as_ptr(), size, partition_size, (*loc).next);
            }
        }
    }

    /// Finds the listed chunk with the largest address strictly below `ptr`,
    /// or null if `ptr` precedes the whole list.
    ///
    /// Addresses are compared as `usize`, a strict total order even across
    /// unrelated regions.
    fn find_prev(&self, ptr: *const u8) -> *mut FreeChunk {
        if self.first.is_null() || self.first as usize > ptr as usize {
            return ptr::null_mut();
        }

        let mut iter = self.first;
        loop {
            // SAFETY: iter is reachable from first, hence a valid chunk.
            let next = unsafe { (*iter).next };
            if next.is_null() || next as usize > ptr as usize {
                return iter;
            }
            iter = next;
        }
    }

    /// Pops the head chunk. O(1). On an ordered list this is the
    /// lowest-addressed free chunk.
    #[inline]
    pub fn pop(&mut self) -> Option<NonNull<u8>> {
        let head = self.first;
        if head.is_null() {
            return None;
        }
        // SAFETY: head is a valid chunk by the structural invariant.
        self.first = unsafe { (*head).next };
        NonNull::new(head.cast())
    }

    /// Pushes a chunk onto the head of the list. O(1).
    ///
    /// # Safety
    ///
    /// `chunk` must have been obtained from this storage (via `pop` or
    /// `allocate_n`) and not be in the list already.
    #[inline]
    pub unsafe fn push(&mut self, chunk: NonNull<u8>) {
        let chunk = chunk.as_ptr().cast::<FreeChunk>();
        // SAFETY: chunk is a live chunk per the caller contract.
        unsafe { (*chunk).next = self.first };
        self.first = chunk;
    }

    /// Splices a chunk back into the list at its address-ordered position.
    /// O(F) in the free-list length.
    ///
    /// # Safety
    ///
    /// Same as [`SegregatedStorage::push`]; the list must be ordered.
    pub unsafe fn ordered_push(&mut self, chunk: NonNull<u8>) {
        let loc = self.find_prev(chunk.as_ptr());
        if loc.is_null() {
            // SAFETY: forwarded contract.
            unsafe { self.push(chunk) };
        } else {
            let chunk = chunk.as_ptr().cast::<FreeChunk>();
            // SAFETY: loc is a live listed chunk; chunk is live and unlisted.
            unsafe {
                (*chunk).next = (*loc).next;
                (*loc).next = chunk;
            }
        }
    }

    /// Searches the (ordered) list for `n` chunks at consecutive addresses
    /// exactly `partition_size` apart, unlinks the run and returns its first
    /// chunk. Returns `None` if no such run exists (or `n == 0`).
    ///
    /// Worst case O(F * n): the scan restarts just past the break point each
    /// time a candidate run turns out too short.
    pub fn allocate_n(&mut self, n: usize, partition_size: usize) -> Option<NonNull<u8>> {
        if n == 0 {
            return None;
        }

        // `link` is the location holding the candidate run's head: either the
        // list head itself or some chunk's `next` field. Working on the link
        // lets the found run be unlinked without re-walking.
        let mut link: *mut *mut FreeChunk = &mut self.first;
        let last = loop {
            // SAFETY: link always points at either self.first or the `next`
            // field of a live chunk.
            if unsafe { (*link).is_null() } {
                return None;
            }
            // SAFETY: *link is a non-null valid chunk (checked above).
            match unsafe { Self::try_run(&mut link, n, partition_size) } {
                Some(last) => break last,
                None => continue,
            }
        };

        // SAFETY: run spans [*link, last]; both ends are valid chunks.
        unsafe {
            let head = *link;
            *link = (*last).next;
            NonNull::new(head.cast())
        }
    }

    /// Checks whether the `n` chunks starting at `**link` are contiguous.
    /// On success returns the last chunk of the run. On failure advances
    /// `link` to the `next` field of the last chunk scanned, so the caller
    /// resumes right after the break.
    ///
    /// # Safety
    ///
    /// `**link` must be a non-null chunk of an ordered list; `n >= 1`.
    unsafe fn try_run(
        link: &mut *mut *mut FreeChunk,
        n: usize,
        partition_size: usize,
    ) -> Option<*mut FreeChunk> {
        // SAFETY: per contract, **link is a valid chunk.
        let mut iter = unsafe { **link };
        let mut remaining = n;
        while remaining > 1 {
            // SAFETY: iter is a valid listed chunk.
            let next = unsafe { (*iter).next };
            if next as usize != iter as usize + partition_size {
                // End of list or a gap: resume the search after this chunk.
                *link = unsafe { ptr::addr_of_mut!((*iter).next) };
                return None;
            }
            iter = next;
            remaining -= 1;
        }
        Some(iter)
    }

    /// Returns a run of `n` chunks to the list, head-first. Equivalent to
    /// `add_block` on a trailer-less region of `n * partition_size` bytes.
    ///
    /// # Safety
    ///
    /// `chunks` must be a run previously obtained from this storage with the
    /// same `n` and `partition_size`.
    pub unsafe fn free_n(&mut self, chunks: NonNull<u8>, n: usize, partition_size: usize) {
        if n != 0 {
            // SAFETY: the run is owned caller memory of n whole chunks.
            unsafe { self.add_block(chunks, n * partition_size, partition_size) };
        }
    }

    /// Returns a run of `n` chunks to the list in address order.
    ///
    /// # Safety
    ///
    /// Same as [`SegregatedStorage::free_n`]; the list must be ordered.
    pub unsafe fn ordered_free_n(&mut self, chunks: NonNull<u8>, n: usize, partition_size: usize) {
        if n != 0 {
            // SAFETY: as in free_n.
            unsafe { self.add_ordered_block(chunks, n * partition_size, partition_size) };
        }
    }

    // Raw accessors for the engine's lockstep walks (release_memory and the
    // typed pool's drop sweep), which traverse the free list while comparing
    // against chunk positions inside regions.

    #[inline]
    pub(crate) fn head_raw(&self) -> *mut u8 {
        self.first.cast()
    }

    #[inline]
    pub(crate) fn set_head_raw(&mut self, head: *mut u8) {
        self.first = head.cast();
    }

    /// # Safety
    ///
    /// `chunk` must be a live free chunk of some storage.
    #[inline]
    pub(crate) unsafe fn next_raw(chunk: *mut u8) -> *mut u8 {
        // SAFETY: per contract.
        unsafe { (*chunk.cast::<FreeChunk>()).next.cast() }
    }

    /// # Safety
    ///
    /// `chunk` must be a live free chunk; `next` null or a live free chunk.
    #[inline]
    pub(crate) unsafe fn set_next_raw(chunk: *mut u8, next: *mut u8) {
        // SAFETY: per contract.
        unsafe { (*chunk.cast::<FreeChunk>()).next = next.cast() };
    }
}

impl Default for SegregatedStorage {
    fn default() -> Self {
        Self::new()
    }
}
