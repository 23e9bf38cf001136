//! # rheap - A Fixed-Region Heap Allocator
//!
//! This crate provides a deterministic, introspectable heap that lives entirely
//! inside **one caller-owned buffer**. It never asks the system for memory,
//! which makes it a fit for embedded and console style targets that hand out a
//! single fixed region at startup.
//!
//! ## Overview
//!
//! The buffer starts with a small root record, followed by blocks that tile
//! the rest of it. Every block is on exactly one of two intrusive lists:
//!
//! ```text
//!   Arena Layout:
//!
//!   ┌──────┬───────────┬─────────┬────────────────────┬───────────┬─────────┐
//!   │ Info │  A1 used  │ A2 used │        free        │  B1 used  │  free   │
//!   └──────┴───────────┴─────────┴────────────────────┴───────────┴─────────┘
//!      │                          ▲                                ▲
//!      ├── free list ─────────────┴────────────────────────────────┘
//!      │   (ascending address, adjacent blocks always merged)
//!      │
//!      └── alloc list: B1 ⇄ A2 ⇄ A1   (most recent first)
//!
//!   A* carved from the front, B* carved from the back.
//! ```
//!
//! Front allocations take the first large enough free block scanning from the
//! low end and carve its low part. Back allocations scan from the high end and
//! carve the high part. Long lived data can grow from one end while scratch
//! data grows from the other.
//!
//! ## Crate Structure
//!
//! ```text
//!   rheap
//!   ├── align       - Rounding macros (align!, align_to!), Alignment, Strategy
//!   ├── block       - Block header (internal)
//!   ├── info        - Arena root record (internal)
//!   ├── free_list   - Insert-with-coalescing, first-fit search (internal)
//!   ├── alloc_list  - LIFO bookkeeping of live blocks (internal)
//!   ├── checkpoint  - Checkpoint tags and the checkpoint! macro
//!   ├── config      - HeapConfig
//!   ├── error       - HeapError
//!   ├── mem         - Word-at-a-time compare/copy/fill/zero
//!   ├── stats       - HeapStats, FreeBlock, Allocation
//!   └── heap        - FixedHeap
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rheap::{Alignment, FixedHeap};
//!
//! let mut buffer = vec![0u8; 4096];
//! let mut heap = FixedHeap::new(&mut buffer).unwrap();
//!
//! let permanent = heap.allocate(128, Alignment::FRONT).unwrap();
//! let scratch = heap.allocate(512, Alignment::BACK).unwrap();
//! assert!(permanent < scratch);
//!
//! unsafe {
//!     permanent.as_ptr().write(42);
//!     heap.free(scratch.as_ptr()).unwrap();
//!     heap.free(permanent.as_ptr()).unwrap();
//! }
//! assert_eq!(heap.allocation_count(), 0);
//! ```
//!
//! ## How It Works
//!
//! Each block begins with a header. The size recorded in it spans the whole
//! block, so `block + size` is exactly where the next block starts:
//!
//! ```text
//!   Single Allocation:
//!   ┌───────────────────────┬─────────────────┬──────────────────────────┐
//!   │    Block Header       │  Tag (optional) │        User Data         │
//!   │  ┌─────────────────┐  │  ┌───────────┐  │                          │
//!   │  │ prev / next     │  │  │ "file.rs" │  │                          │
//!   │  │ size: N         │  │  │ 0 … 0 len │  │                          │
//!   │  │ line, magic ... │  │  └───────────┘  │                          │
//!   │  └─────────────────┘  │                 │                          │
//!   └───────────────────────┴─────────────────┴──────────────────────────┘
//!   ◄─────────────────────────── N bytes, rounded ──────────────────────►
//!                                              ▲
//!                                              └── Pointer returned to user
//! ```
//!
//! Freeing moves a block back to the free list at its address position and
//! merges it with any free neighbor it touches, so the free list never holds
//! two adjacent blocks.
//!
//! ## Features
//!
//! - **No system allocation**: all state lives in the caller's buffer
//! - **Two ends**: front and back first-fit from one arena
//! - **Coalescing**: adjacent free blocks are merged on every free
//! - **Introspection**: free/allocated totals, block iterators, `dump()`
//! - **Checkpoint tags**: optional file/line labels per allocation
//! - **Hardened free**: header magic catches double and foreign frees
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization primitives
//! - **Fixed size**: the arena cannot grow or shrink after creation
//! - **Size-only alignment**: the alignment rounds block sizes; payloads are
//!   only guaranteed word alignment
//!
//! ## Safety
//!
//! Creating a heap from a `&mut [u8]` and allocating are safe. Freeing is
//! `unsafe`: the pointer must come from the same heap and must not have been
//! freed already. Header verification catches most violations but cannot
//! prove provenance.

pub mod align;
mod alloc_list;
mod block;
mod checkpoint;
mod config;
mod error;
mod free_list;
mod heap;
mod info;
pub mod mem;
mod stats;

pub use align::{Alignment, Strategy, WORD};
pub use checkpoint::{Checkpoint, LABEL_CAPACITY};
pub use config::HeapConfig;
pub use error::HeapError;
pub use heap::FixedHeap;
pub use stats::{Allocation, FreeBlock, HeapStats};
