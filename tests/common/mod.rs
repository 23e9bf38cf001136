#![allow(dead_code)]

use rheap::FixedHeap;

#[repr(C, align(16))]
pub struct Arena<const N: usize>(pub [u8; N]);

pub fn arena<const N: usize>() -> Box<Arena<N>> {
  Box::new(Arena([0; N]))
}

#[derive(Clone, Copy, Debug)]
pub struct XorShift64 {
  state: u64,
}

impl XorShift64 {
  pub fn new(seed: u64) -> Self {
    Self { state: seed }
  }

  pub fn next_u64(&mut self) -> u64 {
    let mut x = self.state;
    x ^= x >> 12;
    x ^= x << 25;
    x ^= x >> 27;
    self.state = x;
    x.wrapping_mul(0x2545_F491_4F6C_DD1D)
  }

  pub fn gen_range(
    &mut self,
    low: usize,
    high_inclusive: usize,
  ) -> usize {
    assert!(low <= high_inclusive);
    let span = high_inclusive - low + 1;
    low + (self.next_u64() as usize % span)
  }

  pub fn gen_bool(&mut self) -> bool {
    self.next_u64() & 1 == 1
  }
}

/// Checks that blocks tile the block region exactly, that no two free blocks
/// touch, and that the byte accounting adds up.
pub fn assert_invariants(heap: &FixedHeap<'_>) {
  let region = heap.block_region();

  let free: Vec<_> = heap.free_blocks().collect();
  for pair in free.windows(2) {
    assert!(pair[0].offset < pair[1].offset, "free list out of order: {free:?}");
  }

  let mut blocks: Vec<(usize, usize, bool)> = free.iter().map(|b| (b.offset, b.size, true)).collect();
  blocks.extend(heap.allocations().map(|a| (a.offset, a.size, false)));
  blocks.sort_unstable();

  let mut cursor = region.start;
  let mut previous_free = false;
  for &(offset, size, is_free) in &blocks {
    assert_eq!(offset, cursor, "gap or overlap at {offset}: {blocks:?}");
    assert!(!(previous_free && is_free), "adjacent free blocks at {offset}");
    cursor += size;
    previous_free = is_free;
  }
  assert_eq!(cursor, region.end);

  let stats = heap.stats();
  assert_eq!(
    stats.free_bytes + stats.allocated_bytes + stats.overhead,
    stats.arena_size
  );
  assert_eq!(stats.allocations, heap.allocations().count());
  assert_eq!(heap.total_free_size(), stats.free_bytes);
  assert_eq!(heap.max_free_size(), stats.largest_free_block);
}
