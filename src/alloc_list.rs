use std::ptr;

use crate::{
  block::{Block, STATE_ALLOCATED},
  info::Info,
};

impl Info {
  /// Pushes `block` onto the head of the alloc list.
  ///
  /// # Safety
  ///
  /// `block` must be an initialized header that is in neither list.
  pub(crate) unsafe fn push_alloc(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      (*block).state = STATE_ALLOCATED;
      (*block).prev = ptr::null_mut();
      (*block).next = self.alloc_head;

      if !self.alloc_head.is_null() {
        (*self.alloc_head).prev = block;
      }
    }

    self.alloc_head = block;
    self.alloc_count += 1;
  }

  /// Detaches `block` from anywhere in the alloc list.
  ///
  /// # Safety
  ///
  /// `block` must currently be a member of this alloc list.
  pub(crate) unsafe fn remove_alloc(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      let prev = (*block).prev;
      let next = (*block).next;

      if prev.is_null() {
        self.alloc_head = next;
      } else {
        (*prev).next = next;
      }

      if !next.is_null() {
        (*next).prev = prev;
      }

      (*block).prev = ptr::null_mut();
      (*block).next = ptr::null_mut();
    }

    self.alloc_count -= 1;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::HEADER_SIZE;

  fn blocks(words: &mut [usize]) -> Vec<*mut Block> {
    let base = words.as_mut_ptr() as *mut u8;
    (0..4)
      .map(|i| unsafe { Block::init(base.add(i * HEADER_SIZE), HEADER_SIZE) })
      .collect()
  }

  fn order(info: &Info) -> Vec<*mut Block> {
    info.alloc_iter().map(|block| block as *mut Block).collect()
  }

  #[test]
  fn test_push_is_lifo() {
    let mut words = [0usize; 64];
    let b = blocks(&mut words);
    let mut info = Info::new();

    unsafe {
      info.push_alloc(b[0]);
      info.push_alloc(b[1]);
      info.push_alloc(b[2]);

      assert_eq!(info.alloc_count, 3);
      assert_eq!(order(&info), vec![b[2], b[1], b[0]]);
      assert!((*b[2]).prev.is_null());
      assert_eq!((*b[1]).prev, b[2]);
      assert_eq!((*b[2]).state, STATE_ALLOCATED);
    }
  }

  #[test]
  fn test_remove_from_any_position() {
    let mut words = [0usize; 64];
    let b = blocks(&mut words);
    let mut info = Info::new();

    unsafe {
      for &block in &b {
        info.push_alloc(block);
      }

      // head: b3, then b2, b1, b0
      info.remove_alloc(b[1]);
      assert_eq!(order(&info), vec![b[3], b[2], b[0]]);
      assert_eq!((*b[0]).prev, b[2]);

      info.remove_alloc(b[3]);
      assert_eq!(info.alloc_head, b[2]);
      assert!((*b[2]).prev.is_null());

      info.remove_alloc(b[0]);
      assert_eq!(order(&info), vec![b[2]]);

      info.remove_alloc(b[2]);
      assert!(info.alloc_head.is_null());
      assert_eq!(info.alloc_count, 0);
    }
  }
}
