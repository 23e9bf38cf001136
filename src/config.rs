use crate::align::Alignment;

/// Runtime options for a [`FixedHeap`](crate::FixedHeap).
///
/// ```rust
/// use rheap::{Alignment, HeapConfig};
///
/// let config = HeapConfig::default()
///   .with_tagging(true)
///   .with_default_alignment(Alignment::BACK);
/// assert!(config.tagging);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
  /// Store [`Checkpoint`](crate::Checkpoint) labels in front of each payload.
  pub tagging: bool,
  /// Check the block header before releasing a pointer in `free`.
  pub verify_frees: bool,
  /// Alignment used by [`FixedHeap::allocate_default`](crate::FixedHeap::allocate_default).
  pub default_alignment: Alignment,
}

impl HeapConfig {
  pub const fn new() -> Self {
    Self {
      tagging: false,
      verify_frees: true,
      default_alignment: Alignment::FRONT,
    }
  }

  pub const fn with_tagging(
    mut self,
    tagging: bool,
  ) -> Self {
    self.tagging = tagging;
    self
  }

  pub const fn with_verify_frees(
    mut self,
    verify_frees: bool,
  ) -> Self {
    self.verify_frees = verify_frees;
    self
  }

  pub const fn with_default_alignment(
    mut self,
    alignment: Alignment,
  ) -> Self {
    self.default_alignment = alignment;
    self
  }
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self::new()
  }
}
