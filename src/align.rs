/// Rounds `value` up to the next multiple of `align`, which must be a power
/// of two.
///
/// # Examples
///
/// ```rust
/// use freelist_arena::align_to;
///
/// assert_eq!(align_to!(13usize, 4), 16);
/// assert_eq!(align_to!(16usize, 4), 16);
/// assert_eq!(align_to!(0usize, 8), 0);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}
