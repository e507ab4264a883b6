/// Builds a `Sequence` from a list of values, or from `n` clones of one
/// value, like `vec!`.
///
/// Diverges on allocation failure. Use `Sequence::from_elem` or
/// `Sequence::try_from` where the error must be handled.
#[macro_export]
macro_rules! sequence {
    () => (
        $crate::Sequence::new()
    );
    ($elem:expr; $n:expr) => (
        $crate::Sequence::__from_elem($elem, $n)
    );
    ($($item:expr),+ $(,)?) => (
        $crate::Sequence::from([$($item),+])
    );
}
