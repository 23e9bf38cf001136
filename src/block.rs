use std::{mem, ptr};

/// Bytes taken by the header in front of every block.
pub(crate) const HEADER_SIZE: usize = mem::size_of::<Block>();

pub(crate) const MAGIC: u16 = 0xB10C;

pub(crate) const STATE_FREE: u8 = 0xF5;
pub(crate) const STATE_ALLOCATED: u8 = 0xA1;

/// Header embedded at the start of every block, free or allocated.
///
/// ```text
///   ┌──────┬──────┬──────┬──────┬───────┬───────┬─────────┐
///   │ prev │ next │ size │ line │ magic │ state │ tag_len │
///   └──────┴──────┴──────┴──────┴───────┴───────┴─────────┘
///                                                    ▲
///                        last byte, read back by free ┘
/// ```
///
/// `size` spans the whole block including this header. `prev`/`next` link the
/// block into whichever list currently owns it.
///
/// `tag_len` must stay the final field: with no tag region it is the byte right
/// before the payload.
#[repr(C)]
pub(crate) struct Block {
  pub prev: *mut Block,
  pub next: *mut Block,
  pub size: usize,
  pub line: u32,
  pub magic: u16,
  pub state: u8,
  pub tag_len: u8,
}

impl Block {
  pub fn new(size: usize) -> Self {
    Self {
      prev: ptr::null_mut(),
      next: ptr::null_mut(),
      size,
      line: 0,
      magic: MAGIC,
      state: STATE_FREE,
      tag_len: 0,
    }
  }

  /// Writes a fresh free header of `size` bytes at `addr`.
  ///
  /// # Safety
  ///
  /// `addr` must be word aligned and valid for `size` bytes, with
  /// `size >= HEADER_SIZE`.
  pub unsafe fn init(
    addr: *mut u8,
    size: usize,
  ) -> *mut Block {
    let block = addr as *mut Block;
    unsafe { block.write(Block::new(size)) };
    block
  }

  /// One past the last byte of `block`.
  ///
  /// # Safety
  ///
  /// `block` must point to an initialized header.
  pub unsafe fn end(block: *const Block) -> usize {
    block as usize + unsafe { (*block).size }
  }

  /// First payload byte of an allocated block.
  ///
  /// # Safety
  ///
  /// `block` must point to an initialized header.
  pub unsafe fn payload(block: *mut Block) -> *mut u8 {
    unsafe { (block as *mut u8).add(HEADER_SIZE + (*block).tag_len as usize) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_tag_len_is_last_byte() {
    assert_eq!(mem::offset_of!(Block, tag_len), HEADER_SIZE - 1);
    assert_eq!(HEADER_SIZE % mem::align_of::<usize>(), 0);
  }

  #[test]
  fn test_init_and_end() {
    let mut words = [0usize; 16];
    let base = words.as_mut_ptr() as *mut u8;

    unsafe {
      let block = Block::init(base, 64);
      assert_eq!((*block).size, 64);
      assert_eq!((*block).magic, MAGIC);
      assert_eq!((*block).state, STATE_FREE);
      assert!((*block).prev.is_null() && (*block).next.is_null());
      assert_eq!(Block::end(block), base as usize + 64);
      assert_eq!(Block::payload(block), base.add(HEADER_SIZE));
    }
  }
}
