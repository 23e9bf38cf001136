use std::mem;

use crate::error::HeapError;

/// Granularity every block size is rounded to, at minimum.
///
/// Block headers hold pointers, so no block may start off this boundary.
pub const WORD: usize = mem::align_of::<usize>();

/// Calculates the machine word alignment for the given size.
///
/// # Examples
///
/// ```rust
/// use rheap::align;
///
/// match std::mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, ::core::mem::size_of::<usize>())
  };
}

/// Rounds `value` up to the next multiple of `alignment`, which must be a
/// power of two.
///
/// ```rust
/// use rheap::align_to;
///
/// assert_eq!(align_to!(100, 16), 112);
/// assert_eq!(align_to!(128, 64), 128);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $alignment:expr) => {
    ($value + $alignment - 1) & !($alignment - 1)
  };
}

/// Overflow-checked [`align_to!`].
pub(crate) const fn checked_align_up(
  value: usize,
  alignment: usize,
) -> Option<usize> {
  match value.checked_add(alignment - 1) {
    Some(bumped) => Some(bumped & !(alignment - 1)),
    None => None,
  }
}

/// Which end of the arena an allocation is carved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
  /// First fit scanning low to high addresses, carving the low end of the match.
  Front,
  /// First fit scanning high to low addresses, carving the high end of the match.
  Back,
}

/// Size rounding granularity paired with an allocation [`Strategy`].
///
/// The signed form (`from_signed`) follows the classic convention where the
/// magnitude is the alignment and a negative sign requests back allocation.
/// Long lived data goes to the front and scratch data to the back, so both
/// can share one arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Alignment {
  bytes: usize,
  strategy: Strategy,
}

impl Alignment {
  /// Word alignment, front allocation.
  pub const FRONT: Self = Self {
    bytes: WORD,
    strategy: Strategy::Front,
  };

  /// Word alignment, back allocation.
  pub const BACK: Self = Self {
    bytes: WORD,
    strategy: Strategy::Back,
  };

  pub fn new(
    bytes: usize,
    strategy: Strategy,
  ) -> Result<Self, HeapError> {
    if !bytes.is_power_of_two() {
      return Err(HeapError::InvalidArgument(
        "alignment must be a non-zero power of two",
      ));
    }

    Ok(Self { bytes, strategy })
  }

  pub fn front(bytes: usize) -> Result<Self, HeapError> {
    Self::new(bytes, Strategy::Front)
  }

  pub fn back(bytes: usize) -> Result<Self, HeapError> {
    Self::new(bytes, Strategy::Back)
  }

  /// Decodes a signed alignment: positive is front, negative is back.
  pub fn from_signed(value: isize) -> Result<Self, HeapError> {
    let strategy = if value < 0 {
      Strategy::Back
    } else {
      Strategy::Front
    };

    Self::new(value.unsigned_abs(), strategy)
  }

  pub const fn bytes(&self) -> usize {
    self.bytes
  }

  pub const fn strategy(&self) -> Strategy {
    self.strategy
  }

  /// Rounding actually applied to block sizes. Never finer than [`WORD`].
  pub(crate) const fn granularity(&self) -> usize {
    if self.bytes < WORD { WORD } else { self.bytes }
  }
}

impl Default for Alignment {
  fn default() -> Self {
    Self::FRONT
  }
}
