//! Block selection policies.
//!
//! A policy decides two things: where a free block sits in the free list,
//! and which free block answers a request. The two are coupled, so a
//! policy is applied to a list that was built under the same policy.

use crate::block::size_of_block;
use crate::free_list::FreeList;

/// Free-list ordering and search strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Policy {
  /// List sorted by ascending size; the first sufficient block is also
  /// the smallest one.
  #[default]
  SizeFirstFit,
  /// List sorted by ascending address; the whole list is scanned for the
  /// smallest sufficient block, lowest address winning ties.
  AddressBestFit,
}

impl Policy {
  /// Returns true when a free block at `new` belongs in front of the one
  /// at `existing`.
  ///
  /// Equal sizes keep arrival order: a new block goes after every block
  /// of the same size.
  pub(crate) fn precedes(
    self,
    memory: &[u8],
    new: usize,
    existing: usize,
  ) -> bool {
    match self {
      Self::SizeFirstFit => size_of_block(memory, existing) > size_of_block(memory, new),
      Self::AddressBestFit => existing > new,
    }
  }

  /// Finds the free block that should satisfy a request needing `needed`
  /// bytes including its header.
  pub(crate) fn search(
    self,
    list: &FreeList,
    memory: &[u8],
    needed: usize,
  ) -> Option<usize> {
    match self {
      Self::SizeFirstFit => list
        .iter(memory)
        .find(|block| block.size >= needed)
        .map(|block| block.offset),
      Self::AddressBestFit => {
        let mut best: Option<(usize, usize)> = None;
        for block in list.iter(memory) {
          if block.size < needed {
            continue;
          }
          // Strict comparison keeps the lowest address on ties.
          if best.is_none_or(|(_, size)| block.size < size) {
            best = Some((block.offset, block.size));
          }
        }
        best.map(|(offset, _)| offset)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::Block;

  /// Lays out free blocks of the given sizes back to back and links them
  /// under `policy`.
  fn build(
    sizes: &[usize],
    policy: Policy,
  ) -> (Vec<u8>, FreeList, Vec<usize>) {
    let mut memory = vec![0u8; sizes.iter().sum()];
    let mut list = FreeList::default();
    let mut offsets = Vec::new();
    let mut at = 0;
    for &size in sizes {
      Block::free(size).write(&mut memory, at);
      offsets.push(at);
      at += size;
    }
    for &offset in &offsets {
      list.insert(&mut memory, offset, policy);
    }
    (memory, list, offsets)
  }

  #[test]
  fn size_first_fit_takes_smallest_sufficient() {
    let (memory, list, offsets) = build(&[100, 40, 64, 40], Policy::SizeFirstFit);
    assert_eq!(Policy::SizeFirstFit.search(&list, &memory, 41), Some(offsets[2]));
    assert_eq!(Policy::SizeFirstFit.search(&list, &memory, 40), Some(offsets[1]));
    assert_eq!(Policy::SizeFirstFit.search(&list, &memory, 101), None);
  }

  #[test]
  fn size_order_is_stable_for_equal_sizes() {
    let (memory, list, offsets) = build(&[40, 40, 40], Policy::SizeFirstFit);
    let order: Vec<usize> = list.iter(&memory).map(|b| b.offset).collect();
    assert_eq!(order, offsets);
  }

  #[test]
  fn address_best_fit_scans_whole_list() {
    let (memory, list, offsets) = build(&[100, 64, 50, 64], Policy::AddressBestFit);
    assert_eq!(Policy::AddressBestFit.search(&list, &memory, 60), Some(offsets[1]));
    assert_eq!(Policy::AddressBestFit.search(&list, &memory, 50), Some(offsets[2]));
    assert_eq!(Policy::AddressBestFit.search(&list, &memory, 65), Some(offsets[0]));
    assert_eq!(Policy::AddressBestFit.search(&list, &memory, 200), None);
  }

  #[test]
  fn empty_list_finds_nothing() {
    let list = FreeList::default();
    assert_eq!(Policy::SizeFirstFit.search(&list, &[], 1), None);
    assert_eq!(Policy::AddressBestFit.search(&list, &[], 1), None);
  }
}
