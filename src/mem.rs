//! Word-at-a-time memory primitives.
//!
//! Each routine walks 8-byte words first and finishes the remaining tail one
//! byte at a time. They are independent of any arena. All of them process
//! `min(n, len...)` bytes, so they never touch memory outside the slices.

const WORD_BYTES: usize = size_of::<u64>();

/// Compares the first `n` bytes of `a` and `b`.
///
/// Returns zero when they are equal. Otherwise only the **sign** of the result
/// is meaningful: words compare as native-endian `i64`, tail bytes as `i8`, and
/// the first differing unit decides. Do not rely on the magnitude.
pub fn compare(
  a: &[u8],
  b: &[u8],
  n: usize,
) -> i32 {
  let count = n.min(a.len()).min(b.len());
  let (a, b) = (&a[..count], &b[..count]);

  let a_words = a.chunks_exact(WORD_BYTES);
  let b_words = b.chunks_exact(WORD_BYTES);
  let (a_tail, b_tail) = (a_words.remainder(), b_words.remainder());

  for (x, y) in a_words.zip(b_words) {
    let x = i64::from_ne_bytes(x.try_into().unwrap_or_default());
    let y = i64::from_ne_bytes(y.try_into().unwrap_or_default());
    if x != y {
      return if x < y { -1 } else { 1 };
    }
  }

  for (&x, &y) in a_tail.iter().zip(b_tail) {
    if x != y {
      return i32::from(x as i8) - i32::from(y as i8);
    }
  }

  0
}

/// Copies the first `n` bytes of `src` into `dst`.
///
/// The borrows rule out overlapping regions. Returns the number of bytes
/// copied.
pub fn copy(
  dst: &mut [u8],
  src: &[u8],
  n: usize,
) -> usize {
  let count = n.min(dst.len()).min(src.len());
  let (dst, src) = (&mut dst[..count], &src[..count]);

  let mut dst_words = dst.chunks_exact_mut(WORD_BYTES);
  let mut src_words = src.chunks_exact(WORD_BYTES);
  for (d, s) in (&mut dst_words).zip(&mut src_words) {
    let word = u64::from_ne_bytes(s.try_into().unwrap_or_default());
    d.copy_from_slice(&word.to_ne_bytes());
  }

  for (d, s) in dst_words
    .into_remainder()
    .iter_mut()
    .zip(src_words.remainder())
  {
    *d = *s;
  }

  count
}

/// Sets the first `n` bytes of `dst` to `value`. Returns the number of bytes
/// written.
pub fn fill(
  dst: &mut [u8],
  value: u8,
  n: usize,
) -> usize {
  let count = n.min(dst.len());
  let word = u64::from_ne_bytes([value; WORD_BYTES]).to_ne_bytes();

  let mut words = dst[..count].chunks_exact_mut(WORD_BYTES);
  for chunk in &mut words {
    chunk.copy_from_slice(&word);
  }
  for byte in words.into_remainder() {
    *byte = value;
  }

  count
}

/// [`fill`] with zero.
pub fn zero(
  dst: &mut [u8],
  n: usize,
) -> usize {
  fill(dst, 0, n)
}
