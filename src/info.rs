use std::{marker::PhantomData, mem, ptr};

use crate::block::Block;

/// Bytes taken by the root record at the start of the arena.
pub(crate) const INFO_SIZE: usize = mem::size_of::<Info>();

/// Root state of an arena, stored in the arena itself.
///
/// The free list runs `free_head -> ... -> free_tail` in ascending address
/// order. The alloc list is LIFO from `alloc_head`.
#[repr(C)]
pub(crate) struct Info {
  pub free_head: *mut Block,
  pub free_tail: *mut Block,
  pub alloc_head: *mut Block,
  pub alloc_count: usize,
  /// Successful allocations since the last (re)initialization.
  pub lifetime_allocs: usize,
  /// Successful frees since the last (re)initialization.
  pub lifetime_frees: usize,
}

impl Info {
  pub fn new() -> Self {
    Self {
      free_head: ptr::null_mut(),
      free_tail: ptr::null_mut(),
      alloc_head: ptr::null_mut(),
      alloc_count: 0,
      lifetime_allocs: 0,
      lifetime_frees: 0,
    }
  }

  pub fn free_iter(&self) -> Blocks<'_> {
    Blocks::new(self.free_head)
  }

  pub fn alloc_iter(&self) -> Blocks<'_> {
    Blocks::new(self.alloc_head)
  }
}

/// Walks a list by `next` links.
pub(crate) struct Blocks<'a> {
  current: *const Block,
  _info: PhantomData<&'a Info>,
}

impl Blocks<'_> {
  fn new(head: *const Block) -> Self {
    Self {
      current: head,
      _info: PhantomData,
    }
  }
}

impl Iterator for Blocks<'_> {
  type Item = *const Block;

  fn next(&mut self) -> Option<Self::Item> {
    if self.current.is_null() {
      return None;
    }

    let block = self.current;
    // Links are only ever written by the list managers, which keep them
    // pointing at live headers inside the arena.
    self.current = unsafe { (*block).next };
    Some(block)
  }
}
