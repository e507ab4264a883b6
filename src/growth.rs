//! Capacity growth policy.

/// Next capacity after `current` is exhausted: roughly 1.5x, plus one so an
/// empty sequence grows and every step strictly increases.
#[inline]
pub const fn next_capacity(current: usize) -> Option<usize> {
    match current.checked_add(current / 2) {
        Some(grown) => grown.checked_add(1),
        None => None,
    }
}

/// Capacity to allocate when appends need `required` slots and the block
/// holds `current`.
///
/// If the policy itself overflows, `required` is used as is and the layout
/// check in the allocator reports the overflow.
#[inline]
pub(crate) fn grow_for_append(current: usize, required: usize) -> usize {
    match next_capacity(current) {
        Some(grown) => grown.max(required),
        None => required,
    }
}

/// Capacity to allocate when `resize` must hold `count` elements.
///
/// Applies the policy to the target itself so a run of growing resizes does
/// not reallocate on every call.
#[inline]
pub(crate) fn grow_for_resize(count: usize) -> usize {
    match next_capacity(count) {
        Some(grown) => grown,
        None => count,
    }
}
