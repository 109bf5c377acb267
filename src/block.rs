//! Block header layout inside the arena bytes.
//!
//! ```text
//!   ┌──────────┬──────────┬──────────┬──────────┬─────────────────────┐
//!   │ size u32 │ used u32 │ prev u32 │ next u32 │      payload        │
//!   └──────────┴──────────┴──────────┴──────────┴─────────────────────┘
//!   ▲                                           ▲
//!   block offset                                ArenaPtr handed out
//! ```
//!
//! `prev`/`next` are free-list links and only mean something while the
//! block is free.

use std::mem;

/// Link value meaning "no block".
const NIL: u32 = u32::MAX;

const SIZE_AT: usize = 0;
const USED_AT: usize = 4;
const PREV_AT: usize = 8;
const NEXT_AT: usize = 12;

/// Bytes taken by every block header.
pub const HEADER_SIZE: usize = 4 * mem::size_of::<u32>();

/// Smallest remainder worth splitting off as its own free block.
pub const MIN_SPLIT_REMAINDER: usize = 2 * HEADER_SIZE + 1;

/// Largest arena offset a link can encode.
pub const MAX_ARENA_BYTES: usize = NIL as usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
  pub size: usize,
  pub in_use: bool,
  pub prev: Option<usize>,
  pub next: Option<usize>,
}

impl Block {
  /// A free, unlinked block of `size` bytes.
  pub fn free(size: usize) -> Self {
    Self {
      size,
      in_use: false,
      prev: None,
      next: None,
    }
  }

  pub fn read(
    memory: &[u8],
    at: usize,
  ) -> Self {
    Self {
      size: read_u32(memory, at + SIZE_AT) as usize,
      in_use: read_u32(memory, at + USED_AT) != 0,
      prev: decode_link(read_u32(memory, at + PREV_AT)),
      next: decode_link(read_u32(memory, at + NEXT_AT)),
    }
  }

  pub fn write(
    &self,
    memory: &mut [u8],
    at: usize,
  ) {
    set_size(memory, at, self.size);
    set_in_use(memory, at, self.in_use);
    set_prev(memory, at, self.prev);
    set_next(memory, at, self.next);
  }
}

pub fn size_of_block(
  memory: &[u8],
  at: usize,
) -> usize {
  read_u32(memory, at + SIZE_AT) as usize
}

pub fn next_of(
  memory: &[u8],
  at: usize,
) -> Option<usize> {
  decode_link(read_u32(memory, at + NEXT_AT))
}

pub fn prev_of(
  memory: &[u8],
  at: usize,
) -> Option<usize> {
  decode_link(read_u32(memory, at + PREV_AT))
}

pub fn set_size(
  memory: &mut [u8],
  at: usize,
  size: usize,
) {
  debug_assert!(size <= MAX_ARENA_BYTES);
  write_u32(memory, at + SIZE_AT, size as u32);
}

pub fn set_in_use(
  memory: &mut [u8],
  at: usize,
  in_use: bool,
) {
  write_u32(memory, at + USED_AT, in_use as u32);
}

pub fn set_prev(
  memory: &mut [u8],
  at: usize,
  prev: Option<usize>,
) {
  write_u32(memory, at + PREV_AT, encode_link(prev));
}

pub fn set_next(
  memory: &mut [u8],
  at: usize,
  next: Option<usize>,
) {
  write_u32(memory, at + NEXT_AT, encode_link(next));
}

fn encode_link(link: Option<usize>) -> u32 {
  match link {
    Some(offset) => {
      debug_assert!(offset < MAX_ARENA_BYTES);
      offset as u32
    }
    None => NIL,
  }
}

fn decode_link(raw: u32) -> Option<usize> {
  (raw != NIL).then_some(raw as usize)
}

fn read_u32(
  memory: &[u8],
  at: usize,
) -> u32 {
  let mut raw = [0u8; 4];
  raw.copy_from_slice(&memory[at..at + 4]);
  u32::from_ne_bytes(raw)
}

fn write_u32(
  memory: &mut [u8],
  at: usize,
  value: u32,
) {
  memory[at..at + 4].copy_from_slice(&value.to_ne_bytes());
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_header_round_trips_through_bytes() {
    let mut memory = vec![0u8; 64];

    let block = Block {
      size: 40,
      in_use: true,
      prev: Some(0),
      next: None,
    };
    block.write(&mut memory, 16);

    assert_eq!(Block::read(&memory, 16), block);
    assert_eq!(size_of_block(&memory, 16), 40);
    assert!(Block::read(&memory, 16).in_use);
    assert_eq!(prev_of(&memory, 16), Some(0));
    assert_eq!(next_of(&memory, 16), None);
  }

  #[test]
  fn test_field_setters_leave_neighbours_alone() {
    let mut memory = vec![0u8; 2 * HEADER_SIZE];

    Block::free(HEADER_SIZE).write(&mut memory, 0);
    Block::free(HEADER_SIZE).write(&mut memory, HEADER_SIZE);

    set_next(&mut memory, 0, Some(HEADER_SIZE));
    set_prev(&mut memory, HEADER_SIZE, Some(0));
    set_in_use(&mut memory, HEADER_SIZE, true);

    assert_eq!(Block::read(&memory, 0).next, Some(HEADER_SIZE));
    assert_eq!(Block::read(&memory, 0).prev, None);
    assert!(!Block::read(&memory, 0).in_use);
    assert_eq!(Block::read(&memory, HEADER_SIZE).prev, Some(0));
    assert_eq!(Block::read(&memory, HEADER_SIZE).size, HEADER_SIZE);
  }

  #[test]
  fn test_split_threshold_is_two_headers_and_a_byte() {
    assert_eq!(HEADER_SIZE, 16);
    assert_eq!(MIN_SPLIT_REMAINDER, 33);
  }
}
