//! Doubly-linked free list threaded through the arena bytes.
//!
//! The list owns no memory. It only remembers the head offset and its
//! length; every link lives in the header of the block it belongs to.

use crate::block::{self, set_in_use, set_next, set_prev, size_of_block};
use crate::policy::Policy;

/// A free block as seen through the free list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeBlock {
  /// Arena offset of the block header.
  pub offset: usize,
  /// Total block size, header included.
  pub size: usize,
}

impl FreeBlock {
  pub fn end(&self) -> usize {
    self.offset + self.size
  }
}

#[derive(Debug, Default)]
pub(crate) struct FreeList {
  head: Option<usize>,
  len: usize,
}

impl FreeList {
  pub fn head(&self) -> Option<usize> {
    self.head
  }

  pub fn len(&self) -> usize {
    self.len
  }

  /// Links a free, unlinked, already-coalesced block at its policy
  /// position.
  pub fn insert(
    &mut self,
    memory: &mut [u8],
    at: usize,
    policy: Policy,
  ) {
    set_in_use(memory, at, false);

    let mut prev = None;
    let mut cursor = self.head;
    while let Some(existing) = cursor {
      if policy.precedes(memory, at, existing) {
        break;
      }
      prev = Some(existing);
      cursor = block::next_of(memory, existing);
    }

    set_prev(memory, at, prev);
    set_next(memory, at, cursor);
    match prev {
      Some(prev) => set_next(memory, prev, Some(at)),
      None => self.head = Some(at),
    }
    if let Some(next) = cursor {
      set_prev(memory, next, Some(at));
    }
    self.len += 1;
  }

  /// Unlinks a block from wherever it sits in the list.
  pub fn remove(
    &mut self,
    memory: &mut [u8],
    at: usize,
  ) {
    let prev = block::prev_of(memory, at);
    let next = block::next_of(memory, at);
    debug_assert!(prev.is_some() || self.head == Some(at), "block {at} is not linked");

    match prev {
      Some(prev) => set_next(memory, prev, next),
      None => self.head = next,
    }
    if let Some(next) = next {
      set_prev(memory, next, prev);
    }
    set_prev(memory, at, None);
    set_next(memory, at, None);
    self.len -= 1;
  }

  /// Re-sorts every linked block under `policy`.
  pub fn relink(
    &mut self,
    memory: &mut [u8],
    policy: Policy,
  ) {
    let offsets: Vec<usize> = self.iter(memory).map(|block| block.offset).collect();
    self.head = None;
    self.len = 0;
    for at in offsets {
      self.insert(memory, at, policy);
    }
  }

  pub fn iter<'a>(
    &self,
    memory: &'a [u8],
  ) -> Iter<'a> {
    Iter {
      memory,
      cursor: self.head,
    }
  }

  /// The free block whose range ends exactly at `start`, if any.
  pub fn left_neighbor(
    &self,
    memory: &[u8],
    start: usize,
  ) -> Option<usize> {
    let closest = self
      .iter(memory)
      .filter(|block| block.offset < start)
      .max_by_key(|block| block.offset)?;
    (closest.end() == start).then_some(closest.offset)
  }

  /// The free block that begins exactly at `end`, if any.
  pub fn right_neighbor(
    &self,
    memory: &[u8],
    end: usize,
  ) -> Option<usize> {
    self
      .iter(memory)
      .find(|block| block.offset == end)
      .map(|block| block.offset)
  }
}

/// Walks the free list in list order.
pub struct Iter<'a> {
  memory: &'a [u8],
  cursor: Option<usize>,
}

impl Iterator for Iter<'_> {
  type Item = FreeBlock;

  fn next(&mut self) -> Option<FreeBlock> {
    let at = self.cursor?;
    self.cursor = block::next_of(self.memory, at);
    Some(FreeBlock {
      offset: at,
      size: size_of_block(self.memory, at),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::Block;

  fn arena(sizes: &[usize]) -> (Vec<u8>, Vec<usize>) {
    let mut memory = vec![0u8; sizes.iter().sum()];
    let mut offsets = Vec::new();
    let mut at = 0;
    for &size in sizes {
      Block::free(size).write(&mut memory, at);
      offsets.push(at);
      at += size;
    }
    (memory, offsets)
  }

  fn offsets(
    list: &FreeList,
    memory: &[u8],
  ) -> Vec<usize> {
    list.iter(memory).map(|block| block.offset).collect()
  }

  #[test]
  fn insert_keeps_size_order() {
    let (mut memory, at) = arena(&[64, 32, 48, 32]);
    let mut list = FreeList::default();
    for &offset in &at {
      list.insert(&mut memory, offset, Policy::SizeFirstFit);
    }
    assert_eq!(offsets(&list, &memory), vec![at[1], at[3], at[2], at[0]]);
    assert_eq!(list.len(), 4);
  }

  #[test]
  fn insert_keeps_address_order() {
    let (mut memory, at) = arena(&[64, 32, 48, 32]);
    let mut list = FreeList::default();
    for &offset in at.iter().rev() {
      list.insert(&mut memory, offset, Policy::AddressBestFit);
    }
    assert_eq!(offsets(&list, &memory), at);
    assert_eq!(list.head(), Some(0));
  }

  #[test]
  fn remove_head_middle_tail_and_sole() {
    let (mut memory, at) = arena(&[32, 32, 32, 32]);
    let mut list = FreeList::default();
    for &offset in &at {
      list.insert(&mut memory, offset, Policy::AddressBestFit);
    }

    list.remove(&mut memory, at[0]);
    assert_eq!(offsets(&list, &memory), vec![at[1], at[2], at[3]]);
    assert_eq!(Block::read(&memory, at[1]).prev, None);

    list.remove(&mut memory, at[2]);
    assert_eq!(offsets(&list, &memory), vec![at[1], at[3]]);
    assert_eq!(Block::read(&memory, at[3]).prev, Some(at[1]));

    list.remove(&mut memory, at[3]);
    assert_eq!(offsets(&list, &memory), vec![at[1]]);
    assert_eq!(Block::read(&memory, at[1]).next, None);

    list.remove(&mut memory, at[1]);
    assert_eq!(list.head(), None);
    assert_eq!(list.len(), 0);
  }

  #[test]
  fn relink_switches_order() {
    let (mut memory, at) = arena(&[64, 32, 48]);
    let mut list = FreeList::default();
    for &offset in &at {
      list.insert(&mut memory, offset, Policy::AddressBestFit);
    }
    list.relink(&mut memory, Policy::SizeFirstFit);
    assert_eq!(offsets(&list, &memory), vec![at[1], at[2], at[0]]);
    assert_eq!(list.len(), 3);
  }

  #[test]
  fn neighbours_require_exact_adjacency() {
    let (mut memory, at) = arena(&[32, 32, 32, 32]);
    let mut list = FreeList::default();
    // Blocks 0 and 3 free, 1 and 2 treated as in use.
    list.insert(&mut memory, at[0], Policy::AddressBestFit);
    list.insert(&mut memory, at[3], Policy::AddressBestFit);

    assert_eq!(list.left_neighbor(&memory, at[1]), Some(at[0]));
    assert_eq!(list.left_neighbor(&memory, at[2]), None);
    assert_eq!(list.right_neighbor(&memory, at[2] + 32), Some(at[3]));
    assert_eq!(list.right_neighbor(&memory, at[1] + 32), None);
  }

  #[test]
  fn no_neighbour_below_lowest_block_or_in_empty_list() {
    let (mut memory, at) = arena(&[32, 32]);
    let mut list = FreeList::default();
    assert_eq!(list.left_neighbor(&memory, at[1]), None);
    assert_eq!(list.right_neighbor(&memory, at[1]), None);

    list.insert(&mut memory, at[1], Policy::SizeFirstFit);
    assert_eq!(list.left_neighbor(&memory, at[0]), None);
  }
}
