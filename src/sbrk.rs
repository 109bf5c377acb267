//! Growth provider backed by the real program break.

use std::{mem, ptr, slice};

use libc::{c_void, intptr_t, sbrk};
use tracing::{debug, warn};

use crate::align_to;
use crate::provider::GrowthProvider;

/// Alignment of the arena base: the scalar width of a header field.
const ARENA_ALIGN: usize = mem::size_of::<u32>();

/// Returns true for the `(void *) -1` failure sentinel of `sbrk(2)`.
fn sbrk_failed(address: *mut c_void) -> bool {
  address as usize == usize::MAX
}

/// Arena carved out of the process heap with `sbrk(2)`.
///
/// ```text
///   ┌──────────┬──────────┬──────────┬─────────────┐
///   │ chunk 0  │ chunk 1  │ chunk 2  │  (break)    │
///   └──────────┴──────────┴──────────┴─────────────┘
///   ▲ base                           ▲ base + len
/// ```
///
/// Chunks must stay contiguous. When something else in the process moves
/// the break between two growths, the new chunk is handed back and the
/// growth reports exhaustion. Memory is never returned to the OS.
pub struct SbrkProvider {
  base: *mut u8,
  len: usize,
  max_chunks: Option<usize>,
  chunks: usize,
}

impl SbrkProvider {
  pub fn new() -> Self {
    Self {
      base: ptr::null_mut(),
      len: 0,
      max_chunks: None,
      chunks: 0,
    }
  }

  pub fn bounded(max_chunks: usize) -> Self {
    Self {
      max_chunks: Some(max_chunks),
      ..Self::new()
    }
  }

  pub fn chunks(&self) -> usize {
    self.chunks
  }

  /// Moves the break forward so the first chunk starts aligned.
  unsafe fn align_break(&mut self) -> bool {
    unsafe {
      let current = sbrk(0);
      if sbrk_failed(current) {
        return false;
      }
      let current = current as usize;
      let padding = align_to!(current, ARENA_ALIGN) - current;
      padding == 0 || !sbrk_failed(sbrk(padding as intptr_t))
    }
  }
}

impl Default for SbrkProvider {
  fn default() -> Self {
    Self::new()
  }
}

impl GrowthProvider for SbrkProvider {
  fn grow(
    &mut self,
    chunk_size: usize,
  ) -> Option<usize> {
    if self.max_chunks.is_some_and(|max| self.chunks >= max) {
      return None;
    }
    let increment = intptr_t::try_from(chunk_size).ok()?;

    unsafe {
      if self.base.is_null() && !self.align_break() {
        warn!("sbrk could not align the program break");
        return None;
      }

      let address = sbrk(increment);
      if sbrk_failed(address) {
        warn!(chunk_size, "sbrk refused to extend the program break");
        return None;
      }
      let address = address as *mut u8;

      if self.base.is_null() {
        self.base = address;
      } else if address != self.base.add(self.len) {
        sbrk(-increment);
        warn!(
          expected = ?self.base.add(self.len),
          found = ?address,
          "program break moved by another owner; arena cannot stay contiguous"
        );
        return None;
      }
    }

    let start = self.len;
    self.len += chunk_size;
    self.chunks += 1;
    debug!(base = ?self.base, len = self.len, "extended program break");
    Some(start)
  }

  fn memory(&self) -> &[u8] {
    if self.len == 0 {
      return &[];
    }
    // The region was obtained by this provider alone and is never released.
    unsafe { slice::from_raw_parts(self.base, self.len) }
  }

  fn memory_mut(&mut self) -> &mut [u8] {
    if self.len == 0 {
      return &mut [];
    }
    unsafe { slice::from_raw_parts_mut(self.base, self.len) }
  }
}
