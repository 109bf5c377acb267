//! Allocator configuration parameters.

use crate::block::{HEADER_SIZE, MAX_ARENA_BYTES};
use crate::error::{AllocError, AllocResult};
use crate::policy::Policy;

/// Configuration for one allocator instance.
///
/// Validated at construction. The chunk size is fixed for the lifetime of
/// the allocator; the policy can be switched later with
/// [`Allocator::set_policy`](crate::Allocator::set_policy).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocatorConfig {
  /// Bytes requested from the growth provider per growth.
  ///
  /// Default: 2048. Bounds every single request: `size + HEADER_SIZE`
  /// must not exceed it.
  pub chunk_size: usize,

  /// Free-list ordering and block selection strategy.
  ///
  /// Default: [`Policy::SizeFirstFit`].
  pub policy: Policy,
}

impl AllocatorConfig {
  /// Default chunk size in bytes.
  pub const DEFAULT_CHUNK_SIZE: usize = 2048;

  /// Smallest chunk that can hold a header and one payload byte.
  pub const MIN_CHUNK_SIZE: usize = HEADER_SIZE + 1;

  pub fn new(
    chunk_size: usize,
    policy: Policy,
  ) -> Self {
    Self { chunk_size, policy }
  }

  /// Size-first-fit flavor with the default chunk size.
  pub fn size_ordered() -> Self {
    Self::new(Self::DEFAULT_CHUNK_SIZE, Policy::SizeFirstFit)
  }

  /// Address-best-fit flavor with the default chunk size.
  pub fn address_ordered() -> Self {
    Self::new(Self::DEFAULT_CHUNK_SIZE, Policy::AddressBestFit)
  }

  pub fn with_chunk_size(
    mut self,
    chunk_size: usize,
  ) -> Self {
    self.chunk_size = chunk_size;
    self
  }

  pub fn validate(&self) -> AllocResult<()> {
    if self.chunk_size < Self::MIN_CHUNK_SIZE {
      return Err(AllocError::invalid_config(
        "chunk size must hold a header and at least one byte",
      ));
    }
    if self.chunk_size >= MAX_ARENA_BYTES {
      return Err(AllocError::invalid_config(
        "chunk size must be representable as a block size",
      ));
    }
    Ok(())
  }

  /// Largest payload a single `allocate` call can ask for.
  pub fn max_request(&self) -> usize {
    self.chunk_size - HEADER_SIZE
  }
}

impl Default for AllocatorConfig {
  fn default() -> Self {
    Self::size_ordered()
  }
}
