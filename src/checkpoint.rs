use std::fmt;

/// Longest label, in bytes, a [`Checkpoint`] keeps.
pub const LABEL_CAPACITY: usize = 63;

/// Source location attached to an allocation for diagnostics.
///
/// Labels longer than [`LABEL_CAPACITY`] are cut at the last character
/// boundary that fits.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
  label: [u8; LABEL_CAPACITY],
  len: u8,
  line: u32,
}

/// Captures the current file and line as a [`Checkpoint`].
///
/// ```rust
/// let here = rheap::checkpoint!();
/// assert!(here.line() > 0);
/// ```
#[macro_export]
macro_rules! checkpoint {
  () => {
    $crate::Checkpoint::new(::core::file!(), ::core::line!())
  };
}

impl Checkpoint {
  pub fn new(
    label: &str,
    line: u32,
  ) -> Self {
    let mut len = label.len().min(LABEL_CAPACITY);
    while !label.is_char_boundary(len) {
      len -= 1;
    }

    let mut stored = [0; LABEL_CAPACITY];
    stored[..len].copy_from_slice(&label.as_bytes()[..len]);

    Self {
      label: stored,
      len: len as u8,
      line,
    }
  }

  pub fn label(&self) -> &str {
    // Only ever cut on a char boundary of a valid &str.
    std::str::from_utf8(self.label_bytes()).unwrap_or_default()
  }

  pub(crate) fn label_bytes(&self) -> &[u8] {
    &self.label[..self.len as usize]
  }

  pub fn line(&self) -> u32 {
    self.line
  }
}

impl fmt::Debug for Checkpoint {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Checkpoint")
      .field("label", &self.label())
      .field("line", &self.line)
      .finish()
  }
}

impl fmt::Display for Checkpoint {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{}({})", self.label(), self.line)
  }
}
