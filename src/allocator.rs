use std::collections::HashSet;

use tracing::{debug, trace, warn};

use crate::block::{
  Block, HEADER_SIZE, MAX_ARENA_BYTES, MIN_SPLIT_REMAINDER, prev_of, set_in_use, set_size, size_of_block,
};
use crate::config::AllocatorConfig;
use crate::error::{AllocError, AllocResult, ErrorCode, InvariantViolation};
use crate::free_list::{self, FreeList};
use crate::policy::Policy;
use crate::provider::{GrowthProvider, HeapProvider};

/// Handle to an allocation: the arena offset of its payload.
///
/// Offset 0 can never be a payload (a header always precedes it), so it
/// doubles as the null pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArenaPtr(usize);

impl ArenaPtr {
  pub const fn null() -> Self {
    Self(0)
  }

  /// Rebuilds a handle from a raw payload offset. The allocator validates
  /// it on every use.
  pub const fn from_offset(offset: usize) -> Self {
    Self(offset)
  }

  pub fn is_null(&self) -> bool {
    self.0 == 0
  }

  pub fn offset(&self) -> usize {
    self.0
  }
}

/// One block found by walking the arena in address order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
  pub offset: usize,
  pub size: usize,
  pub in_use: bool,
}

/// Snapshot of arena usage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
  pub chunks: usize,
  pub arena_bytes: usize,
  pub free_blocks: usize,
  pub free_bytes: usize,
  pub used_blocks: usize,
  pub used_bytes: usize,
}

/// Explicit free-list allocator over an arena grown one chunk at a time.
///
/// ```text
///   allocate(n)                         release(p)
///       │                                   │
///       ▼                                   ▼
///   search free list ──hit──► split?    find left/right free
///       │ miss                  │       neighbours by address
///       ▼                       ▼           │
///   grow one chunk,         mark in use     ▼
///   merge with free tail,                merge, reinsert
///   retry once                           under the policy
/// ```
pub struct Allocator<P: GrowthProvider = HeapProvider> {
  provider: P,
  config: AllocatorConfig,
  free: FreeList,
  chunks: usize,
  last_error: ErrorCode,
}

impl<P: GrowthProvider> Allocator<P> {
  /// Creates an allocator over a provider that has not grown yet.
  pub fn new(
    config: AllocatorConfig,
    provider: P,
  ) -> AllocResult<Self> {
    config.validate()?;
    if !provider.memory().is_empty() {
      return Err(AllocError::invalid_config(
        "growth provider must start with an empty arena",
      ));
    }
    debug!(chunk_size = config.chunk_size, policy = ?config.policy, "created allocator");
    Ok(Self {
      provider,
      config,
      free: FreeList::default(),
      chunks: 0,
      last_error: ErrorCode::Ok,
    })
  }

  /// Size-first-fit allocator with 2048-byte chunks.
  pub fn with_provider(provider: P) -> AllocResult<Self> {
    Self::new(AllocatorConfig::default(), provider)
  }

  pub fn config(&self) -> &AllocatorConfig {
    &self.config
  }

  pub fn policy(&self) -> Policy {
    self.config.policy
  }

  /// Switches the selection policy, re-sorting the current free list.
  pub fn set_policy(
    &mut self,
    policy: Policy,
  ) {
    if policy == self.config.policy {
      return;
    }
    self.config.policy = policy;
    self.free.relink(self.provider.memory_mut(), policy);
    debug!(?policy, free_blocks = self.free.len(), "switched selection policy");
  }

  pub fn provider(&self) -> &P {
    &self.provider
  }

  /// Outcome of the last `allocate`, or of the last non-null `release`.
  pub fn last_error(&self) -> ErrorCode {
    self.last_error
  }

  /// Allocates `size` payload bytes.
  ///
  /// Fails with [`AllocError::SingleRequestTooLarge`] when `size` plus a
  /// header does not fit one chunk, without touching the provider, and
  /// with [`AllocError::OutOfMemory`] when the provider is exhausted.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> AllocResult<ArenaPtr> {
    let result = self.allocate_block(size);
    self.last_error = ErrorCode::from(&result);
    result
  }

  fn allocate_block(
    &mut self,
    size: usize,
  ) -> AllocResult<ArenaPtr> {
    let chunk_size = self.config.chunk_size;
    let needed = size
      .checked_add(HEADER_SIZE)
      .filter(|needed| *needed <= chunk_size)
      .ok_or_else(|| AllocError::too_large(size, chunk_size))?;

    let mut grown = false;
    loop {
      let policy = self.config.policy;
      if let Some(at) = policy.search(&self.free, self.provider.memory(), needed) {
        trace!(block = at, needed, ?policy, "found free block");
        return Ok(self.carve(at, needed));
      }
      // A fresh chunk always fits one request, so one growth is enough.
      if grown {
        return Err(AllocError::out_of_memory(self.chunks));
      }
      self.grow()?;
      grown = true;
    }
  }

  /// Takes the free block at `at` off the list and hands out its first
  /// `needed` bytes, returning any useful remainder to the list.
  fn carve(
    &mut self,
    at: usize,
    needed: usize,
  ) -> ArenaPtr {
    let memory = self.provider.memory_mut();
    self.free.remove(memory, at);

    let size = size_of_block(memory, at);
    let remainder = size - needed;
    if remainder >= MIN_SPLIT_REMAINDER {
      set_size(memory, at, needed);
      let rest = at + needed;
      Block::free(remainder).write(memory, rest);
      self.free.insert(memory, rest, self.config.policy);
      debug!(block = at, needed, remainder, "split free block");
    }
    set_in_use(memory, at, true);

    ArenaPtr(at + HEADER_SIZE)
  }

  /// Obtains one chunk and links it, merged with a free block that ends
  /// where the chunk starts.
  fn grow(&mut self) -> AllocResult<()> {
    let chunk_size = self.config.chunk_size;
    let arena_bytes = self.provider.memory().len();
    if arena_bytes
      .checked_add(chunk_size)
      .is_none_or(|total| total > MAX_ARENA_BYTES)
    {
      warn!(arena_bytes, chunk_size, "arena reached the largest addressable size");
      return Err(AllocError::out_of_memory(self.chunks));
    }

    let Some(start) = self.provider.grow(chunk_size) else {
      warn!(chunks = self.chunks, chunk_size, "growth provider exhausted");
      return Err(AllocError::out_of_memory(self.chunks));
    };
    debug_assert_eq!(start, arena_bytes, "provider chunks must be contiguous");
    self.chunks += 1;

    let memory = self.provider.memory_mut();
    let mut block = start;
    let mut size = chunk_size;
    if let Some(left) = self.free.left_neighbor(memory, start) {
      self.free.remove(memory, left);
      size += size_of_block(memory, left);
      block = left;
    }
    Block::free(size).write(memory, block);
    self.free.insert(memory, block, self.config.policy);

    debug!(chunk = start, block, size, chunks = self.chunks, "grew arena");
    Ok(())
  }

  /// Returns a block to the free list, merging it with free neighbours.
  ///
  /// A null pointer is a no-op and leaves the last error untouched.
  pub fn release(
    &mut self,
    ptr: ArenaPtr,
  ) -> AllocResult<()> {
    if ptr.is_null() {
      return Ok(());
    }
    let result = self.release_block(ptr);
    self.last_error = ErrorCode::from(&result);
    result
  }

  fn release_block(
    &mut self,
    ptr: ArenaPtr,
  ) -> AllocResult<()> {
    let at = self
      .locate(ptr)
      .inspect_err(|err| warn!(%err, "rejected release"))?;

    let memory = self.provider.memory_mut();
    let mut start = at;
    let mut size = size_of_block(memory, at);

    if let Some(left) = self.free.left_neighbor(memory, start) {
      self.free.remove(memory, left);
      size += size_of_block(memory, left);
      start = left;
    }
    if let Some(right) = self.free.right_neighbor(memory, start + size) {
      self.free.remove(memory, right);
      size += size_of_block(memory, right);
    }

    Block::free(size).write(memory, start);
    self.free.insert(memory, start, self.config.policy);

    debug!(block = at, merged = start, size, "released block");
    Ok(())
  }

  /// Maps a payload pointer to the header offset of a live block.
  fn locate(
    &self,
    ptr: ArenaPtr,
  ) -> AllocResult<usize> {
    let invalid = AllocError::InvalidPointer { offset: ptr.0 };
    let at = ptr.0.checked_sub(HEADER_SIZE).ok_or(invalid)?;
    let block = self
      .blocks()
      .find(|block| block.offset >= at)
      .filter(|block| block.offset == at)
      .ok_or(invalid)?;
    if !block.in_use {
      return Err(AllocError::DoubleFree { offset: ptr.0 });
    }
    Ok(at)
  }

  fn locate_live(
    &self,
    ptr: ArenaPtr,
  ) -> AllocResult<usize> {
    self
      .locate(ptr)
      .map_err(|_| AllocError::InvalidPointer { offset: ptr.0 })
  }

  /// Payload bytes of a live allocation.
  pub fn payload(
    &self,
    ptr: ArenaPtr,
  ) -> AllocResult<&[u8]> {
    let at = self.locate_live(ptr)?;
    let memory = self.provider.memory();
    let end = at + size_of_block(memory, at);
    Ok(&memory[ptr.0..end])
  }

  pub fn payload_mut(
    &mut self,
    ptr: ArenaPtr,
  ) -> AllocResult<&mut [u8]> {
    let at = self.locate_live(ptr)?;
    let memory = self.provider.memory_mut();
    let end = at + size_of_block(memory, at);
    Ok(&mut memory[ptr.0..end])
  }

  /// Payload bytes actually available behind `ptr`; at least the
  /// requested size, more when a whole block was handed out.
  pub fn usable_size(
    &self,
    ptr: ArenaPtr,
  ) -> AllocResult<usize> {
    let at = self.locate_live(ptr)?;
    Ok(size_of_block(self.provider.memory(), at) - HEADER_SIZE)
  }

  /// Size of the block at the head of the free list, or -1 when empty.
  pub fn debug_free_list_head_size(&self) -> isize {
    match self.free.head() {
      Some(at) => size_of_block(self.provider.memory(), at) as isize,
      None => -1,
    }
  }

  /// Free blocks in free-list order.
  pub fn free_blocks(&self) -> free_list::Iter<'_> {
    self.free.iter(self.provider.memory())
  }

  /// Every block in address order.
  pub fn blocks(&self) -> Blocks<'_> {
    Blocks {
      memory: self.provider.memory(),
      cursor: 0,
    }
  }

  pub fn stats(&self) -> ArenaStats {
    let mut stats = ArenaStats {
      chunks: self.chunks,
      arena_bytes: self.provider.memory().len(),
      ..ArenaStats::default()
    };
    for block in self.blocks() {
      if block.in_use {
        stats.used_blocks += 1;
        stats.used_bytes += block.size;
      } else {
        stats.free_blocks += 1;
        stats.free_bytes += block.size;
      }
    }
    stats
  }

  /// Verifies the heap: blocks tile the arena, the free list holds exactly
  /// the free blocks in policy order with consistent back links, and no
  /// two free blocks touch.
  pub fn check(&self) -> Result<(), InvariantViolation> {
    let memory = self.provider.memory();
    let arena_bytes = memory.len();

    let mut walked = Vec::new();
    let mut end = 0;
    for block in self.blocks() {
      if block.size < HEADER_SIZE || block.offset + block.size > arena_bytes {
        return Err(InvariantViolation::BrokenPartition {
          offset: block.offset,
          size: block.size,
          arena_bytes,
        });
      }
      end = block.offset + block.size;
      walked.push(block);
    }
    if end != arena_bytes {
      return Err(InvariantViolation::BrokenPartition {
        offset: end,
        size: 0,
        arena_bytes,
      });
    }

    let mut listed = HashSet::new();
    let mut prev: Option<free_list::FreeBlock> = None;
    for block in self.free.iter(memory).take(walked.len() + 1) {
      if prev_of(memory, block.offset) != prev.map(|p| p.offset) {
        return Err(InvariantViolation::BrokenLink {
          offset: block.offset,
        });
      }
      if let Some(prev) = prev {
        let ordered = match self.config.policy {
          Policy::SizeFirstFit => prev.size <= block.size,
          Policy::AddressBestFit => prev.offset < block.offset,
        };
        if !ordered {
          return Err(InvariantViolation::OutOfOrder {
            first: prev.offset,
            second: block.offset,
          });
        }
      }
      listed.insert(block.offset);
      prev = Some(block);
    }
    if listed.len() != self.free.len() {
      return Err(InvariantViolation::LengthMismatch {
        cached: self.free.len(),
        counted: listed.len(),
      });
    }

    for block in &walked {
      let is_listed = listed.contains(&block.offset);
      if block.in_use == is_listed {
        return Err(InvariantViolation::FlagMismatch {
          offset: block.offset,
          in_use: block.in_use,
          listed: is_listed,
        });
      }
    }

    for pair in walked.windows(2) {
      if !pair[0].in_use && !pair[1].in_use {
        return Err(InvariantViolation::AdjacentFree {
          left: pair[0].offset,
          right: pair[1].offset,
        });
      }
    }
    Ok(())
  }
}

/// Walks every block of the arena in address order.
pub struct Blocks<'a> {
  memory: &'a [u8],
  cursor: usize,
}

impl Iterator for Blocks<'_> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<BlockInfo> {
    if self.cursor + HEADER_SIZE > self.memory.len() {
      return None;
    }
    let header = Block::read(self.memory, self.cursor);
    let info = BlockInfo {
      offset: self.cursor,
      size: header.size,
      in_use: header.in_use,
    };
    // A corrupt size ends the walk instead of looping forever.
    self.cursor = if header.size < HEADER_SIZE {
      self.memory.len()
    } else {
      self.cursor + header.size
    };
    Some(info)
  }
}
