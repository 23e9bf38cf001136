use std::{fmt, marker::PhantomData, mem, ops::Range, ptr::NonNull, slice, str};

use log::{debug, info, trace};

use crate::{
  align::{Alignment, Strategy, WORD, checked_align_up},
  block::{Block, HEADER_SIZE, MAGIC, STATE_ALLOCATED, STATE_FREE},
  checkpoint::Checkpoint,
  config::HeapConfig,
  error::HeapError,
  info::{INFO_SIZE, Info},
  mem as raw,
  stats::{Allocation, FreeBlock, HeapStats},
};

/// Heap allocator over a single caller-owned buffer.
///
/// All bookkeeping lives inside the buffer: a root record at its (aligned)
/// start, then a tiling of blocks that are each either on the address-ordered
/// free list or on the LIFO alloc list.
///
/// Not thread safe. A heap may move to another thread, but sharing one
/// between threads needs external locking.
pub struct FixedHeap<'a> {
  base: NonNull<u8>,
  size: usize,
  /// Bytes skipped at the start so the root record is aligned.
  padding: usize,
  /// Bytes handed to the initial free block.
  usable: usize,
  config: HeapConfig,
  pending: Option<Checkpoint>,
  _buffer: PhantomData<&'a mut [u8]>,
}

// Safety: every pointer held or reachable from the heap points into the
// exclusively borrowed buffer, so moving the heap moves sole access to it.
unsafe impl Send for FixedHeap<'_> {}

impl<'a> FixedHeap<'a> {
  pub fn new(buffer: &'a mut [u8]) -> Result<Self, HeapError> {
    Self::with_config(buffer, HeapConfig::default())
  }

  pub fn with_config(
    buffer: &'a mut [u8],
    config: HeapConfig,
  ) -> Result<Self, HeapError> {
    let size = buffer.len();
    let base = NonNull::from(buffer).cast::<u8>();
    unsafe { Self::from_raw_parts(base, size, config) }
  }

  /// Takes over `size` bytes at `base` and lays out an empty arena in them.
  ///
  /// # Safety
  ///
  /// `base` must be valid for reads and writes of `size` bytes for `'a`, and
  /// nothing else may access that memory while the heap is alive, except
  /// through pointers the heap hands out.
  pub unsafe fn from_raw_parts(
    base: NonNull<u8>,
    size: usize,
    config: HeapConfig,
  ) -> Result<Self, HeapError> {
    let addr = base.as_ptr() as usize;
    let too_small = |required| HeapError::ArenaTooSmall { size, required };

    let start = checked_align_up(addr, mem::align_of::<Info>()).ok_or(too_small(usize::MAX))?;
    let padding = start - addr;
    let required = padding + INFO_SIZE + HEADER_SIZE;
    if size < required {
      return Err(too_small(required));
    }

    let usable = (size - padding - INFO_SIZE) & !(WORD - 1);

    let mut heap = Self {
      base,
      size,
      padding,
      usable,
      config,
      pending: None,
      _buffer: PhantomData,
    };
    heap.reset();

    info!(
      "heap: created at {:p}, {} bytes ({} usable)",
      base.as_ptr(),
      size,
      usable
    );

    Ok(heap)
  }

  fn reset(&mut self) {
    unsafe {
      let info = self.base.as_ptr().add(self.padding) as *mut Info;
      info.write(Info::new());

      let block = Block::init(self.base.as_ptr().add(self.padding + INFO_SIZE), self.usable);
      (*info).free_head = block;
      (*info).free_tail = block;
    }
    self.pending = None;
  }

  /// Drops every outstanding allocation and starts over with one free block.
  ///
  /// Pointers handed out before the call must not be used again.
  pub fn clear(&mut self) {
    self.reset();
    info!("heap: cleared {:p}", self.base.as_ptr());
  }

  fn info(&self) -> &Info {
    unsafe { &*(self.base.as_ptr().add(self.padding) as *const Info) }
  }

  fn info_mut(&mut self) -> &mut Info {
    unsafe { &mut *(self.base.as_ptr().add(self.padding) as *mut Info) }
  }

  pub fn config(&self) -> &HeapConfig {
    &self.config
  }

  pub fn arena_size(&self) -> usize {
    self.size
  }

  /// Bytes never available to blocks.
  pub fn overhead(&self) -> usize {
    self.size - self.usable
  }

  /// Offsets, from the buffer start, of the bytes tiled by blocks.
  pub fn block_region(&self) -> Range<usize> {
    let start = self.padding + INFO_SIZE;
    start..start + self.usable
  }

  /// Tags the next successful untagged allocation with `label` and `line`.
  ///
  /// Has no visible effect unless [`HeapConfig::tagging`] is set.
  pub fn set_checkpoint(
    &mut self,
    label: &str,
    line: u32,
  ) {
    self.pending = Some(Checkpoint::new(label, line));
  }

  /// Allocates `size` bytes with [`HeapConfig::default_alignment`].
  pub fn allocate_default(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, HeapError> {
    self.allocate(size, self.config.default_alignment)
  }

  /// Signed entry point: negative `size` is rejected, the sign of `alignment`
  /// picks the strategy (see [`Alignment::from_signed`]).
  pub fn allocate_signed(
    &mut self,
    size: isize,
    alignment: isize,
  ) -> Result<NonNull<u8>, HeapError> {
    if size < 0 {
      debug!("heap: rejected negative size {size}");
      return Err(HeapError::InvalidArgument("size must not be negative"));
    }
    self.allocate(size.unsigned_abs(), Alignment::from_signed(alignment)?)
  }

  /// Allocates `size` bytes, consuming any pending checkpoint.
  pub fn allocate(
    &mut self,
    size: usize,
    alignment: Alignment,
  ) -> Result<NonNull<u8>, HeapError> {
    let pending = self.pending;
    let payload = self.carve(size, alignment, pending)?;
    self.pending = None;
    Ok(payload)
  }

  /// Allocates `size` bytes tagged with `checkpoint`.
  pub fn allocate_tagged(
    &mut self,
    size: usize,
    alignment: Alignment,
    checkpoint: Checkpoint,
  ) -> Result<NonNull<u8>, HeapError> {
    self.carve(size, alignment, Some(checkpoint))
  }

  fn carve(
    &mut self,
    size: usize,
    alignment: Alignment,
    checkpoint: Option<Checkpoint>,
  ) -> Result<NonNull<u8>, HeapError> {
    let out_of_memory = HeapError::OutOfMemory { requested: size };

    let tag = checkpoint.filter(|_| self.config.tagging);
    let tag_len = tag.map_or(0, |c| tag_region_len(c.label_bytes().len()));

    let effective = HEADER_SIZE
      .checked_add(size)
      .and_then(|n| n.checked_add(tag_len))
      .and_then(|n| checked_align_up(n, alignment.granularity()))
      .ok_or(out_of_memory)?;

    let info = self.info_mut();

    let carved = match alignment.strategy() {
      Strategy::Front => {
        let block = info.first_front_fit(effective);
        if block.is_null() {
          debug!("heap: front: no free block of {effective} bytes");
          return Err(out_of_memory);
        }

        unsafe {
          let remainder = (*block).size - effective;
          info.unlink_free(block);
          if remainder >= HEADER_SIZE {
            let rest = Block::init((block as *mut u8).add(effective), remainder);
            info.insert_and_coalesce(rest);
            (*block).size = effective;
          }
        }
        block
      }
      Strategy::Back => {
        let block = info.first_back_fit(effective);
        if block.is_null() {
          debug!("heap: back: no free block of {effective} bytes");
          return Err(out_of_memory);
        }

        unsafe {
          let remainder = (*block).size - effective;
          if remainder >= HEADER_SIZE {
            // The free block keeps its address and list position; only its
            // high end is handed out.
            (*block).size = remainder;
            Block::init((block as *mut u8).add(remainder), effective)
          } else {
            info.unlink_free(block);
            block
          }
        }
      }
    };

    unsafe {
      (*carved).magic = MAGIC;
      (*carved).line = checkpoint.map_or(0, |c| c.line());
      (*carved).tag_len = tag_len as u8;
      if let Some(tag) = tag.filter(|_| tag_len > 0) {
        write_tag(carved, tag_len, tag.label_bytes());
      }

      info.push_alloc(carved);
    }
    info.lifetime_allocs += 1;

    let payload = unsafe { Block::payload(carved) };
    trace!(
      "heap: {:?} allocated {} bytes ({} requested) at {:p}",
      alignment.strategy(),
      unsafe { (*carved).size },
      size,
      payload
    );

    NonNull::new(payload).ok_or(out_of_memory)
  }

  /// Returns an allocation to the free list. Null is a no-op.
  ///
  /// With [`HeapConfig::verify_frees`] the block header is checked first and a
  /// bad pointer is reported instead of corrupting the lists. The check is
  /// best effort, not a provenance proof.
  ///
  /// # Safety
  ///
  /// `ptr` must be null or a pointer returned by an allocate call on this heap
  /// since the last [`clear`](Self::clear), not yet freed. Without
  /// `verify_frees`, breaking this corrupts the heap.
  pub unsafe fn free(
    &mut self,
    ptr: *mut u8,
  ) -> Result<(), HeapError> {
    let Some(ptr) = NonNull::new(ptr) else {
      return Ok(());
    };

    let block = if self.config.verify_frees {
      self.checked_header(ptr)?
    } else {
      unsafe { header_of(ptr) }
    };

    let info = self.info_mut();
    unsafe {
      let size = (*block).size;
      info.remove_alloc(block);
      info.insert_and_coalesce(block);
      trace!("heap: freed {size} bytes at {:p}", ptr.as_ptr());
    }
    info.lifetime_frees += 1;

    Ok(())
  }

  fn checked_header(
    &self,
    ptr: NonNull<u8>,
  ) -> Result<*mut Block, HeapError> {
    let addr = ptr.as_ptr() as usize;
    let region = self.block_region();
    let (low, high) = (
      self.base.as_ptr() as usize + region.start,
      self.base.as_ptr() as usize + region.end,
    );
    let invalid = HeapError::InvalidFree(addr);

    if addr < low + HEADER_SIZE || addr > high {
      debug!("heap: free of {addr:#x} outside the block region");
      return Err(invalid);
    }

    let tag_len = unsafe { *ptr.as_ptr().sub(1) } as usize;
    let header = match addr.checked_sub(HEADER_SIZE + tag_len) {
      Some(header) if header >= low && header % WORD == 0 => header,
      _ => return Err(invalid),
    };

    let block = unsafe { ptr.as_ptr().sub(addr - header) } as *mut Block;
    unsafe {
      if (*block).magic != MAGIC
        || (*block).tag_len as usize != tag_len
        || (*block).size < HEADER_SIZE
        || high - header < (*block).size
      {
        debug!("heap: free of {addr:#x} has no valid block header");
        return Err(invalid);
      }

      match (*block).state {
        STATE_ALLOCATED => Ok(block),
        STATE_FREE => {
          debug!("heap: double free of {addr:#x}");
          Err(HeapError::DoubleFree(addr))
        }
        _ => Err(invalid),
      }
    }
  }

  /// Size of the largest free block, header included.
  pub fn max_free_size(&self) -> usize {
    self.free_blocks().map(|block| block.size).max().unwrap_or(0)
  }

  /// Sum of all free block sizes, headers included.
  pub fn total_free_size(&self) -> usize {
    self.free_blocks().map(|block| block.size).sum()
  }

  /// Live allocations.
  pub fn allocation_count(&self) -> usize {
    self.info().alloc_count
  }

  /// Free blocks in ascending address order.
  pub fn free_blocks(&self) -> impl Iterator<Item = FreeBlock> + '_ {
    let base = self.base.as_ptr() as usize;
    self.info().free_iter().map(move |block| FreeBlock {
      offset: block as usize - base,
      size: unsafe { (*block).size },
    })
  }

  /// Live allocations, most recent first.
  pub fn allocations(&self) -> impl Iterator<Item = Allocation<'_>> + '_ {
    let base = self.base.as_ptr() as usize;
    self.info().alloc_iter().filter_map(move |block| {
      let block = block as *mut Block;
      unsafe {
        Some(Allocation {
          offset: block as usize - base,
          size: (*block).size,
          payload: NonNull::new(Block::payload(block))?,
          label: read_label(block),
          line: (*block).line,
        })
      }
    })
  }

  pub fn stats(&self) -> HeapStats {
    let info = self.info();
    let mut stats = HeapStats {
      arena_size: self.size,
      overhead: self.overhead(),
      allocations: info.alloc_count,
      lifetime_allocations: info.lifetime_allocs,
      lifetime_frees: info.lifetime_frees,
      ..HeapStats::default()
    };

    for block in self.free_blocks() {
      stats.free_bytes += block.size;
      stats.free_blocks += 1;
      stats.largest_free_block = stats.largest_free_block.max(block.size);
    }
    stats.allocated_bytes = self.allocations().map(|a| a.size).sum();

    stats
  }

  /// Logs both lists, one block per line, at `info` level.
  pub fn dump(&self) {
    let base = self.base.as_ptr() as usize;
    let stats = self.stats();

    info!("---------------------");
    info!("lifetime allocations : {}", stats.lifetime_allocations);
    info!("lifetime frees       : {}", stats.lifetime_frees);

    info!("----- free list -----");
    for (i, block) in self.free_blocks().enumerate() {
      let start = base + block.offset;
      info!(
        "{:5}: {:#010x} - {:#010x} {}",
        i + 1,
        start,
        start + block.size - 1,
        block.size
      );
    }
    info!(
      "== total : {} ({} KiB), count {}",
      stats.free_bytes,
      stats.free_bytes / 1024,
      stats.free_blocks
    );

    info!("----- alloc list ----");
    for (i, allocation) in self.allocations().enumerate() {
      let start = base + allocation.offset;
      info!(
        "{:5}: {:#010x} - {:#010x} {}, {}({})",
        i + 1,
        start,
        start + allocation.size - 1,
        allocation.size,
        allocation.label,
        allocation.line
      );
    }
    info!(
      "== total : {} ({} KiB), count {}",
      stats.allocated_bytes,
      stats.allocated_bytes / 1024,
      stats.allocations
    );
    info!("---------------------");
  }
}

impl fmt::Debug for FixedHeap<'_> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("FixedHeap")
      .field("base", &self.base)
      .field("size", &self.size)
      .field("allocations", &self.allocation_count())
      .field("total_free", &self.total_free_size())
      .field("config", &self.config)
      .finish()
  }
}

/// Bytes reserved after the header for a label of `len` bytes: the label, at
/// least one zero byte, and the region length in the last byte.
fn tag_region_len(len: usize) -> usize {
  if len == 0 { 0 } else { crate::align_to!(len + 1, WORD) }
}

unsafe fn write_tag(
  block: *mut Block,
  tag_len: usize,
  label: &[u8],
) {
  let region = unsafe { slice::from_raw_parts_mut((block as *mut u8).add(HEADER_SIZE), tag_len) };
  raw::zero(region, tag_len);
  raw::copy(region, label, label.len());
  region[tag_len - 1] = tag_len as u8;
}

unsafe fn read_label<'a>(block: *const Block) -> &'a str {
  let tag_len = unsafe { (*block).tag_len } as usize;
  if tag_len == 0 {
    return "";
  }

  let bytes = unsafe { slice::from_raw_parts((block as *const u8).add(HEADER_SIZE), tag_len - 1) };
  let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
  str::from_utf8(&bytes[..end]).unwrap_or_default()
}

/// Recovers the header of an allocation from its payload pointer.
///
/// The byte before the payload is either the tag region length or, untagged,
/// the header's own zero `tag_len`.
unsafe fn header_of(ptr: NonNull<u8>) -> *mut Block {
  unsafe {
    let tag_len = *ptr.as_ptr().sub(1) as usize;
    ptr.as_ptr().sub(HEADER_SIZE + tag_len) as *mut Block
  }
}
