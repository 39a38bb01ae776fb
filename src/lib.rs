//! # chunk-pool
//!
//! Fast fixed-chunk memory pools: carve large regions into equally sized
//! chunks and serve them far faster than a general-purpose heap, with
//! alignment guaranteed for both the chunk size and any pointer stored in a
//! chunk.
//!
//! The crate is built from small layers:
//!
//! - [`SegregatedStorage`] — the free-list primitive: a singly-linked list
//!   of free chunks threaded through the chunks' own storage.
//! - [`Pool`] — the engine: owns an address-ordered list of regions obtained
//!   from a [`RawAllocator`], grows geometrically on demand, and serves
//!   single chunks, contiguous runs, and order-preserving variants, plus
//!   bulk release ([`Pool::release_memory`], [`Pool::purge_memory`]).
//! - [`ObjectPool`] — typed pool over the engine that runs destructors for
//!   still-live elements when it drops.
//! - [`SingletonPool`] / [`PoolAlloc`] / [`FastPoolAlloc`] — process-wide,
//!   mutex-guarded pools keyed by a tag and chunk size, and the
//!   container-facing allocators on top of them.
//!
//! ## Quick start
//!
//! ```
//! use chunk_pool::Pool;
//!
//! let mut pool = Pool::new(64);
//! let chunk = pool.allocate().expect("out of memory");
//! // ... use the 64 bytes at `chunk` ...
//! unsafe { pool.deallocate(chunk) };
//! ```
//!
//! Typed, with automatic cleanup:
//!
//! ```
//! use chunk_pool::ObjectPool;
//!
//! let mut pool = ObjectPool::<String>::new();
//! let s = pool.construct(String::from("pooled")).unwrap();
//! assert!(pool.is_from(s.as_ptr()));
//! // Dropping the pool runs the destructor of every live element.
//! ```
//!
//! ## What this is not
//!
//! One pool serves one chunk size; this is not a general-purpose heap. Live
//! chunks are never relocated, adjacent free chunks of different pools are
//! never coalesced, and the engine itself is single-threaded — share a pool
//! across threads only through the singleton layer (or your own lock).
//!
//! Deallocation performs no verification. Freeing a pointer that came from a
//! different pool, double-freeing, or freeing a run with the wrong length is
//! undefined behaviour, which is why those operations are `unsafe`.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]

mod block;
mod error;
mod object_pool;
mod pool;
mod pool_alloc;
mod raw_alloc;
mod singleton;
mod storage;
mod utils;

pub use error::{AllocError, AllocErrorKind, AllocResult};
pub use object_pool::ObjectPool;
pub use pool::{Pool, PoolConfig, MIN_CHUNK_ALIGN};
pub use pool_alloc::{FastPoolAlloc, FastPoolAllocTag, PoolAlloc, PoolAllocTag};
pub use raw_alloc::{LibcAllocator, RawAllocator, SystemAllocator, REGION_ALIGN};
pub use singleton::{with_pool, SingletonPool};
pub use storage::SegregatedStorage;
