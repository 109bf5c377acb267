//! Arena growth providers.
//!
//! The allocator never owns memory itself. A provider owns one contiguous
//! arena and extends it by exactly one chunk per [`GrowthProvider::grow`]
//! call, the way `sbrk` extends the program break.

/// Source of fixed-size arena chunks.
pub trait GrowthProvider {
  /// Extends the arena by exactly `chunk_size` bytes and returns the
  /// offset at which the new chunk starts, or `None` when exhausted.
  ///
  /// A successful call must return the previous arena length: chunks are
  /// laid out back to back. A failed call must leave the arena untouched.
  fn grow(
    &mut self,
    chunk_size: usize,
  ) -> Option<usize>;

  /// Every byte obtained so far.
  fn memory(&self) -> &[u8];

  fn memory_mut(&mut self) -> &mut [u8];
}

/// Arena backed by an owned byte buffer.
///
/// Optionally capped at a number of chunks to model a finite heap.
#[derive(Debug, Default)]
pub struct HeapProvider {
  bytes: Vec<u8>,
  max_chunks: Option<usize>,
  chunks: usize,
  grow_calls: usize,
}

impl HeapProvider {
  /// Unbounded provider.
  pub fn new() -> Self {
    Self::default()
  }

  /// Provider that refuses to grow past `max_chunks` chunks.
  pub fn bounded(max_chunks: usize) -> Self {
    Self {
      max_chunks: Some(max_chunks),
      ..Self::default()
    }
  }

  /// Chunks handed out so far.
  pub fn chunks(&self) -> usize {
    self.chunks
  }

  /// Growth attempts so far, successful or not.
  pub fn grow_calls(&self) -> usize {
    self.grow_calls
  }
}

impl GrowthProvider for HeapProvider {
  fn grow(
    &mut self,
    chunk_size: usize,
  ) -> Option<usize> {
    self.grow_calls += 1;
    if self.max_chunks.is_some_and(|max| self.chunks >= max) {
      return None;
    }
    let start = self.bytes.len();
    self.bytes.resize(start + chunk_size, 0);
    self.chunks += 1;
    Some(start)
  }

  fn memory(&self) -> &[u8] {
    &self.bytes
  }

  fn memory_mut(&mut self) -> &mut [u8] {
    &mut self.bytes
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn chunks_are_back_to_back() {
    let mut provider = HeapProvider::new();
    assert_eq!(provider.grow(128), Some(0));
    assert_eq!(provider.grow(128), Some(128));
    assert_eq!(provider.memory().len(), 256);
    assert_eq!(provider.chunks(), 2);
  }

  #[test]
  fn bounded_provider_exhausts() {
    let mut provider = HeapProvider::bounded(1);
    assert_eq!(provider.grow(64), Some(0));
    assert_eq!(provider.grow(64), None);
    assert_eq!(provider.memory().len(), 64);
    assert_eq!(provider.grow_calls(), 2);
    assert_eq!(provider.chunks(), 1);
  }
}
