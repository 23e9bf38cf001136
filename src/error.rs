/// Failure modes of [`FixedHeap`](crate::FixedHeap) operations.
///
/// Every error is raised before any list is touched, so a failed call leaves
/// the arena exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeapError {
  #[error("invalid argument: {0}")]
  InvalidArgument(&'static str),
  #[error("out of memory: no free block fits a {requested} byte request")]
  OutOfMemory { requested: usize },
  #[error("arena of {size} bytes is too small, at least {required} bytes are needed")]
  ArenaTooSmall { size: usize, required: usize },
  /// The pointer does not lead back to a live block header of this arena.
  #[error("pointer {0:#x} was not allocated by this heap")]
  InvalidFree(usize),
  #[error("pointer {0:#x} was already freed")]
  DoubleFree(usize),
}
