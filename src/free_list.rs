//! Free list management.
//!
//! The free list is kept sorted by ascending address, and no two free blocks
//! in it are ever address-adjacent: [`Info::insert_and_coalesce`] merges such
//! neighbors the moment they appear.
//!
//! ```text
//!   insert B between P and N:
//!
//!   P+B+N adjacent   ┌── P ──┬── B ──┬── N ──┐  ->  ┌────────── P ──────────┐
//!   P+B adjacent     ┌── P ──┬── B ──┐   ┌ N ┐  ->  ┌───── P ─────┐   ┌ N ┐
//!   B+N adjacent     ┌ P ┐   ┌── B ──┬── N ──┐  ->  ┌ P ┐   ┌───── B ─────┐
//!   none             ┌ P ┐   ┌ B ┐   ┌ N ┐      ->  ┌ P ┐ ⇄ ┌ B ┐ ⇄ ┌ N ┐
//! ```

use std::ptr;

use crate::{
  block::{Block, STATE_FREE},
  info::Info,
};

impl Info {
  /// Returns `block` to the free list, merging it with address-adjacent
  /// neighbors.
  ///
  /// # Safety
  ///
  /// `block` must be an initialized header that is in neither list, and its
  /// range must not overlap any block currently in the free list.
  pub(crate) unsafe fn insert_and_coalesce(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      (*block).state = STATE_FREE;

      let mut next = self.free_head;
      while !next.is_null() && next < block {
        next = (*next).next;
      }

      let prev = if next.is_null() {
        self.free_tail
      } else {
        (*next).prev
      };

      let joins_prev = !prev.is_null() && Block::end(prev) == block as usize;
      let joins_next = !next.is_null() && Block::end(block) == next as usize;

      match (joins_prev, joins_next) {
        (true, true) => {
          (*prev).size += (*block).size + (*next).size;
          self.unlink_free(next);
        }
        (true, false) => {
          (*prev).size += (*block).size;
        }
        (false, true) => {
          (*block).size += (*next).size;
          let after = (*next).next;
          self.splice(prev, block, after);
        }
        (false, false) => {
          self.splice(prev, block, next);
        }
      }
    }
  }

  /// Links `block` between `prev` and `next`, either of which may be null.
  unsafe fn splice(
    &mut self,
    prev: *mut Block,
    block: *mut Block,
    next: *mut Block,
  ) {
    unsafe {
      (*block).prev = prev;
      (*block).next = next;

      if prev.is_null() {
        self.free_head = block;
      } else {
        (*prev).next = block;
      }

      if next.is_null() {
        self.free_tail = block;
      } else {
        (*next).prev = block;
      }
    }
  }

  /// Detaches `block` from the free list in O(1).
  ///
  /// # Safety
  ///
  /// `block` must currently be a member of this free list.
  pub(crate) unsafe fn unlink_free(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      let prev = (*block).prev;
      let next = (*block).next;

      if prev.is_null() {
        self.free_head = next;
      } else {
        (*prev).next = next;
      }

      if next.is_null() {
        self.free_tail = prev;
      } else {
        (*next).prev = prev;
      }

      (*block).prev = ptr::null_mut();
      (*block).next = ptr::null_mut();
    }
  }

  /// First free block, scanning from the lowest address, of at least `size`
  /// bytes. Null if none fits.
  pub(crate) fn first_front_fit(
    &self,
    size: usize,
  ) -> *mut Block {
    let mut current = self.free_head;
    while !current.is_null() {
      // Free list links always point at live headers inside the arena.
      unsafe {
        if size <= (*current).size {
          break;
        }
        current = (*current).next;
      }
    }
    current
  }

  /// First free block, scanning from the highest address, of at least `size`
  /// bytes. Null if none fits.
  pub(crate) fn first_back_fit(
    &self,
    size: usize,
  ) -> *mut Block {
    let mut current = self.free_tail;
    while !current.is_null() {
      unsafe {
        if size <= (*current).size {
          break;
        }
        current = (*current).prev;
      }
    }
    current
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::HEADER_SIZE;

  #[repr(C, align(16))]
  struct Region([u8; 1024]);

  struct Fixture {
    _region: Box<Region>,
    base: *mut u8,
    info: Info,
  }

  impl Fixture {
    fn new() -> Self {
      let mut region = Box::new(Region([0; 1024]));
      let base = region.0.as_mut_ptr();
      Self {
        _region: region,
        base,
        info: Info::new(),
      }
    }

    fn block(
      &mut self,
      offset: usize,
      size: usize,
    ) -> *mut Block {
      unsafe { Block::init(self.base.add(offset), size) }
    }

    fn insert(
      &mut self,
      offset: usize,
      size: usize,
    ) -> *mut Block {
      let block = self.block(offset, size);
      unsafe { self.info.insert_and_coalesce(block) };
      block
    }

    /// `(offset, size)` of each free block, head to tail.
    fn layout(&self) -> Vec<(usize, usize)> {
      let base = self.base as usize;
      self
        .info
        .free_iter()
        .map(|block| unsafe { (block as usize - base, (*block).size) })
        .collect()
    }

    /// Same walk in reverse, to check the `prev` links and the tail.
    fn layout_backwards(&self) -> Vec<(usize, usize)> {
      let base = self.base as usize;
      let mut out = Vec::new();
      let mut current = self.info.free_tail;
      while !current.is_null() {
        unsafe {
          out.push((current as usize - base, (*current).size));
          current = (*current).prev;
        }
      }
      out.reverse();
      out
    }

    fn assert_layout(
      &self,
      expected: &[(usize, usize)],
    ) {
      assert_eq!(self.layout(), expected);
      assert_eq!(self.layout_backwards(), expected);
    }
  }

  const S: usize = HEADER_SIZE * 2;

  #[test]
  fn test_insert_into_empty_list() {
    let mut f = Fixture::new();
    let block = f.insert(0, S);

    assert_eq!(f.info.free_head, block);
    assert_eq!(f.info.free_tail, block);
    f.assert_layout(&[(0, S)]);
  }

  #[test]
  fn test_insert_keeps_address_order() {
    let mut f = Fixture::new();
    f.insert(4 * S, S);
    f.insert(0, S);
    f.insert(8 * S, S);
    f.insert(2 * S, S);

    f.assert_layout(&[(0, S), (2 * S, S), (4 * S, S), (8 * S, S)]);
  }

  #[test]
  fn test_merge_with_previous_only() {
    let mut f = Fixture::new();
    f.insert(0, S);
    f.insert(4 * S, S);
    f.insert(S, S);

    f.assert_layout(&[(0, 2 * S), (4 * S, S)]);
  }

  #[test]
  fn test_merge_with_next_only() {
    let mut f = Fixture::new();
    f.insert(0, S);
    f.insert(4 * S, S);
    let block = f.insert(3 * S, S);

    f.assert_layout(&[(0, S), (3 * S, 2 * S)]);
    assert_eq!(f.info.free_tail, block);
  }

  #[test]
  fn test_merge_with_both_neighbors() {
    let mut f = Fixture::new();
    f.insert(0, S);
    f.insert(2 * S, S);
    f.insert(6 * S, S);
    f.insert(S, S);

    f.assert_layout(&[(0, 3 * S), (6 * S, S)]);
  }

  #[test]
  fn test_merge_both_neighbors_at_tail() {
    let mut f = Fixture::new();
    let head = f.insert(0, S);
    f.insert(2 * S, S);
    f.insert(S, S);

    f.assert_layout(&[(0, 3 * S)]);
    assert_eq!(f.info.free_head, head);
    assert_eq!(f.info.free_tail, head);
  }

  #[test]
  fn test_insert_before_head() {
    let mut f = Fixture::new();
    f.insert(4 * S, S);
    let head = f.insert(0, S);

    assert_eq!(f.info.free_head, head);
    f.assert_layout(&[(0, S), (4 * S, S)]);
  }

  #[test]
  fn test_insert_before_and_adjacent_to_head() {
    let mut f = Fixture::new();
    f.insert(2 * S, S);
    f.insert(6 * S, S);
    let head = f.insert(S, S);

    assert_eq!(f.info.free_head, head);
    f.assert_layout(&[(S, 2 * S), (6 * S, S)]);
  }

  #[test]
  fn test_insert_after_tail() {
    let mut f = Fixture::new();
    f.insert(0, S);
    let tail = f.insert(4 * S, S);

    assert_eq!(f.info.free_tail, tail);
    f.assert_layout(&[(0, S), (4 * S, S)]);
  }

  #[test]
  fn test_insert_after_and_adjacent_to_tail() {
    let mut f = Fixture::new();
    f.insert(0, S);
    let tail = f.insert(4 * S, S);
    f.insert(5 * S, S);

    assert_eq!(f.info.free_tail, tail);
    f.assert_layout(&[(0, S), (4 * S, 2 * S)]);
  }

  #[test]
  fn test_unlink_head_middle_tail() {
    let mut f = Fixture::new();
    let a = f.insert(0, S);
    let b = f.insert(2 * S, S);
    let c = f.insert(4 * S, S);
    let d = f.insert(6 * S, S);

    unsafe { f.info.unlink_free(b) };
    f.assert_layout(&[(0, S), (4 * S, S), (6 * S, S)]);

    unsafe { f.info.unlink_free(a) };
    assert_eq!(f.info.free_head, c);
    f.assert_layout(&[(4 * S, S), (6 * S, S)]);

    unsafe { f.info.unlink_free(d) };
    assert_eq!(f.info.free_tail, c);
    f.assert_layout(&[(4 * S, S)]);

    unsafe { f.info.unlink_free(c) };
    assert!(f.info.free_head.is_null());
    assert!(f.info.free_tail.is_null());
  }

  #[test]
  fn test_first_fit_from_both_ends() {
    let mut f = Fixture::new();
    let small = f.insert(0, S);
    let large_low = f.insert(2 * S, 3 * S);
    let large_high = f.insert(6 * S, 3 * S);
    let small_high = f.insert(10 * S, S);

    assert_eq!(f.info.first_front_fit(S), small);
    assert_eq!(f.info.first_front_fit(2 * S), large_low);
    assert_eq!(f.info.first_back_fit(S), small_high);
    assert_eq!(f.info.first_back_fit(2 * S), large_high);
    assert!(f.info.first_front_fit(4 * S).is_null());
    assert!(f.info.first_back_fit(4 * S).is_null());
  }
}
