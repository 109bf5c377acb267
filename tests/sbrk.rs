#![cfg(unix)]

use freelist_arena::{AllocError, Allocator, AllocatorConfig, SbrkProvider};

#[test]
fn test_sbrk_backed_arena() {
  let mut heap = Allocator::new(AllocatorConfig::address_ordered(), SbrkProvider::bounded(2)).unwrap();

  let a = heap.allocate(100).unwrap();
  let b = heap.allocate(200).unwrap();
  heap.payload_mut(a).unwrap()[..100].fill(0xAB);
  heap.payload_mut(b).unwrap()[..200].fill(0xCD);

  heap.release(a).unwrap();
  assert!(heap.payload(b).unwrap()[..200].iter().all(|byte| *byte == 0xCD));
  heap.check().unwrap();

  // A second chunk is only granted while the break stays contiguous.
  match heap.allocate(2000) {
    Ok(c) => assert_eq!(heap.provider().chunks(), 2, "grew for {c:?}"),
    Err(err) => assert!(matches!(err, AllocError::OutOfMemory { .. })),
  }
  heap.check().unwrap();

  heap.release(b).unwrap();
  heap.check().unwrap();
}
