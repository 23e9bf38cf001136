use std::{fmt, ptr::NonNull};

/// A block on the free list, as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
  /// Offset of the block header from the start of the arena buffer.
  pub offset: usize,
  /// Whole block size, header included.
  pub size: usize,
}

/// A live allocation, as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation<'a> {
  /// Offset of the block header from the start of the arena buffer.
  pub offset: usize,
  /// Rounded block size, header and tag included.
  pub size: usize,
  /// The pointer handed out by `allocate`.
  pub payload: NonNull<u8>,
  /// Checkpoint label, empty when untagged.
  pub label: &'a str,
  /// Checkpoint line, zero when untagged.
  pub line: u32,
}

/// Point-in-time summary of an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeapStats {
  pub arena_size: usize,
  /// Bytes never available to blocks: base padding, root record, tail slack.
  pub overhead: usize,
  pub free_bytes: usize,
  pub free_blocks: usize,
  pub largest_free_block: usize,
  pub allocated_bytes: usize,
  pub allocations: usize,
  pub lifetime_allocations: usize,
  pub lifetime_frees: usize,
}

impl fmt::Display for HeapStats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "arena      : {} bytes ({} overhead)", self.arena_size, self.overhead)?;
    writeln!(
      f,
      "free       : {} bytes in {} blocks (largest {})",
      self.free_bytes, self.free_blocks, self.largest_free_block
    )?;
    writeln!(
      f,
      "allocated  : {} bytes in {} blocks",
      self.allocated_bytes, self.allocations
    )?;
    write!(
      f,
      "lifetime   : {} allocations, {} frees",
      self.lifetime_allocations, self.lifetime_frees
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display() {
    let stats = HeapStats {
      arena_size: 1024,
      overhead: 48,
      free_bytes: 840,
      free_blocks: 1,
      largest_free_block: 840,
      allocated_bytes: 136,
      allocations: 1,
      lifetime_allocations: 3,
      lifetime_frees: 2,
    };

    let text = stats.to_string();
    assert!(text.contains("1024 bytes (48 overhead)"));
    assert!(text.contains("840 bytes in 1 blocks (largest 840)"));
    assert!(text.contains("3 allocations, 2 frees"));
  }
}
