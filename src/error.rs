//! Allocator error types.

use thiserror::Error;

/// Result type for allocator operations.
pub type AllocResult<T> = Result<T, AllocError>;

/// Errors returned by [`Allocator`](crate::Allocator) operations.
///
/// Every failure leaves the free list and all existing blocks exactly as
/// they were before the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum AllocError {
  /// The payload plus one header does not fit in a single arena chunk.
  #[error("single request too large: {requested} bytes plus header exceeds chunk size {chunk_size}")]
  SingleRequestTooLarge { requested: usize, chunk_size: usize },

  /// The growth provider could not supply another chunk.
  #[error("out of memory: growth provider exhausted after {chunks} chunks")]
  OutOfMemory { chunks: usize },

  /// The pointer does not name a live allocation in this arena.
  #[error("invalid pointer: offset {offset} is not a block handed out by this allocator")]
  InvalidPointer { offset: usize },

  /// The pointer names a block that is already on the free list.
  #[error("double free of block at offset {offset}")]
  DoubleFree { offset: usize },

  /// The configuration was rejected at construction.
  #[error("invalid allocator configuration: {reason}")]
  InvalidConfig { reason: &'static str },
}

impl AllocError {
  /// Creates a request too large error.
  pub fn too_large(
    requested: usize,
    chunk_size: usize,
  ) -> Self {
    Self::SingleRequestTooLarge {
      requested,
      chunk_size,
    }
  }

  /// Creates an out of memory error.
  pub fn out_of_memory(chunks: usize) -> Self {
    Self::OutOfMemory { chunks }
  }

  /// Creates an invalid config error.
  pub fn invalid_config(reason: &'static str) -> Self {
    Self::InvalidConfig { reason }
  }

  /// Last-error code equivalent of this error.
  pub fn code(&self) -> ErrorCode {
    match self {
      Self::SingleRequestTooLarge { .. } => ErrorCode::SingleRequestTooLarge,
      Self::OutOfMemory { .. } => ErrorCode::OutOfMemory,
      Self::InvalidPointer { .. } | Self::DoubleFree { .. } | Self::InvalidConfig { .. } => {
        ErrorCode::InvalidPointer
      }
    }
  }
}

/// Outcome of the most recent `allocate`/`release` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ErrorCode {
  #[default]
  Ok,
  SingleRequestTooLarge,
  OutOfMemory,
  InvalidPointer,
}

impl<T> From<&AllocResult<T>> for ErrorCode {
  fn from(result: &AllocResult<T>) -> Self {
    match result {
      Ok(_) => Self::Ok,
      Err(err) => err.code(),
    }
  }
}

/// A broken heap invariant, reported by [`Allocator::check`](crate::Allocator::check).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
  /// Block sizes do not tile the arena exactly.
  #[error("block at offset {offset} with size {size} does not tile an arena of {arena_bytes} bytes")]
  BrokenPartition {
    offset: usize,
    size: usize,
    arena_bytes: usize,
  },

  /// A block's in-use flag disagrees with its free-list membership.
  #[error("block at offset {offset} has in_use={in_use} but free-list membership={listed}")]
  FlagMismatch {
    offset: usize,
    in_use: bool,
    listed: bool,
  },

  /// Two consecutive free-list entries are out of policy order.
  #[error("free list out of order: {first} precedes {second}")]
  OutOfOrder { first: usize, second: usize },

  /// Two free blocks touch and should have been coalesced.
  #[error("free blocks at {left} and {right} are adjacent")]
  AdjacentFree { left: usize, right: usize },

  /// A `prev` link does not point back at its predecessor.
  #[error("broken back link at offset {offset}")]
  BrokenLink { offset: usize },

  /// The cached free-list length disagrees with the list contents.
  #[error("free list length {cached} does not match {counted} linked blocks")]
  LengthMismatch { cached: usize, counted: usize },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_codes() {
    assert_eq!(AllocError::too_large(2049, 2048).code(), ErrorCode::SingleRequestTooLarge);
    assert_eq!(AllocError::out_of_memory(4).code(), ErrorCode::OutOfMemory);
    assert_eq!(AllocError::DoubleFree { offset: 0 }.code(), ErrorCode::InvalidPointer);
    assert_eq!(ErrorCode::from(&Ok::<_, AllocError>(())), ErrorCode::Ok);
    assert_eq!(ErrorCode::default(), ErrorCode::Ok);
  }

  #[test]
  fn test_display_mentions_sizes() {
    let msg = AllocError::too_large(2049, 2048).to_string();
    assert!(msg.contains("2049"));
    assert!(msg.contains("2048"));
  }
}
