//! # freelist-arena - An Explicit Free-List Allocator
//!
//! This crate provides a **free-list allocator** that manages one growable
//! arena, extended in fixed-size chunks by a pluggable growth provider
//! (an owned byte buffer, or the real program break through `sbrk`).
//!
//! ## Overview
//!
//! Every byte of the arena belongs to exactly one block. Each block starts
//! with a header; free blocks are threaded into a doubly-linked list
//! through those headers, so bookkeeping needs no memory outside the arena:
//!
//! ```text
//!   Arena (two chunks of 2048 bytes, blocks may span the boundary):
//!
//!   ┌─────┬──────────┬─────┬──────────┬─────┬──────────┬─────┬──────────┐
//!   │ hdr │  in use  │ hdr │   free   │ hdr │  in use  │ hdr │   free   │
//!   └─────┴──────────┴─────┴──────────┴─────┴──────────┴─────┴──────────┘
//!   0                      ▲                                 ▲      4096
//!                          │                                 │
//!   free list:  head ──────┘ ◄────────── prev / next ──────► ┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   freelist-arena
//!   ├── align      - Alignment macro (align_to!)
//!   ├── block      - Block header layout (internal)
//!   ├── free_list  - Free list threaded through the arena (internal)
//!   ├── policy     - Size-first-fit and address-best-fit selection
//!   ├── provider   - GrowthProvider trait and HeapProvider
//!   ├── sbrk       - SbrkProvider (unix)
//!   ├── config     - AllocatorConfig
//!   ├── error      - AllocError, ErrorCode, InvariantViolation
//!   └── allocator  - Allocator implementation
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use freelist_arena::{Allocator, AllocatorConfig, HeapProvider};
//!
//! let mut heap = Allocator::new(AllocatorConfig::size_ordered(), HeapProvider::new()).unwrap();
//!
//! let ptr = heap.allocate(8).unwrap();
//! heap.payload_mut(ptr).unwrap().copy_from_slice(&42u64.to_ne_bytes());
//! assert_eq!(heap.payload(ptr).unwrap(), &42u64.to_ne_bytes());
//!
//! heap.release(ptr).unwrap();
//! assert_eq!(heap.debug_free_list_head_size(), 2048);
//! ```
//!
//! ## How It Works
//!
//! - **Allocation** searches the free list under the active [`Policy`].
//!   A hit is split when the remainder can hold two headers and a byte,
//!   otherwise the whole block is handed out. A miss grows the arena by
//!   one chunk, merges it with a free block ending where it starts, and
//!   searches once more.
//! - **Release** merges the block with the free blocks directly left and
//!   right of it in the arena, then reinserts the result. No two free
//!   blocks are ever adjacent afterwards.
//!
//! Pointers are arena offsets ([`ArenaPtr`]). The allocator validates them
//! on every use, so payloads are read and written through
//! [`Allocator::payload`] and [`Allocator::payload_mut`].
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization primitives
//! - **No realloc**: blocks never shrink or grow in place
//! - **No trimming**: arena chunks are never returned to the OS
//! - **Bounded requests**: a request plus its header must fit one chunk

pub mod align;
mod allocator;
mod block;
mod config;
mod error;
mod free_list;
mod policy;
mod provider;
#[cfg(unix)]
mod sbrk;

pub use allocator::{Allocator, ArenaPtr, ArenaStats, BlockInfo, Blocks};
pub use block::HEADER_SIZE;
pub use config::AllocatorConfig;
pub use error::{AllocError, AllocResult, ErrorCode, InvariantViolation};
pub use free_list::{FreeBlock, Iter as FreeBlocks};
pub use policy::Policy;
pub use provider::{GrowthProvider, HeapProvider};
#[cfg(unix)]
pub use sbrk::SbrkProvider;
