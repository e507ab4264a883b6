use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::Sub;
use std::ptr::{self, NonNull};
use std::slice;

use crate::block::RawBlock;

/// Random-access position inside a sequence's live range.
///
/// A cursor borrows the sequence, so it can not outlive a reallocation or
/// any other mutation. Valid positions are `0..=len`; the last one is the
/// end position and has no element.
pub struct Cursor<'a, T> {
    base: NonNull<T>,
    len: usize,
    pos: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Cursor<'a, T> {
    #[inline]
    pub(crate) fn new(items: &'a [T], pos: usize) -> Cursor<'a, T> {
        debug_assert!(pos <= items.len(), "cursor past end");
        Cursor {
            base: NonNull::from(items).cast(),
            len: items.len(),
            pos,
            _marker: PhantomData,
        }
    }

    /// Index of this position in the sequence.
    #[inline(always)]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn is_begin(&self) -> bool {
        self.pos == 0
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.pos == self.len
    }

    /// Address of the slot this cursor points at.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        unsafe { self.base.as_ptr().add(self.pos) }
    }

    /// Element at this position, `None` at the end.
    #[inline]
    pub fn get(&self) -> Option<&'a T> {
        self.peek(0)
    }

    /// Element `n` slots away from this position.
    pub fn peek(&self, n: isize) -> Option<&'a T> {
        let index = self.shifted(n)?;
        if index < self.len {
            Some(unsafe { &*self.base.as_ptr().add(index) })
        } else {
            None
        }
    }

    /// Cursor `n` slots away, or `None` if that leaves `0..=len`.
    pub fn offset(&self, n: isize) -> Option<Cursor<'a, T>> {
        let pos = self.shifted(n)?;
        Some(Cursor { pos, ..*self })
    }

    /// Signed number of slots from `origin` to this cursor.
    #[inline]
    pub fn distance_from(&self, origin: &Cursor<'a, T>) -> isize {
        debug_assert!(self.base == origin.base, "cursors of different sequences");
        self.pos as isize - origin.pos as isize
    }

    /// Iterator over the elements from this position to the end.
    pub fn iter(&self) -> Iter<'a, T> {
        let rest = unsafe { slice::from_raw_parts(self.as_ptr(), self.len - self.pos) };
        Iter::new(rest)
    }

    fn shifted(&self, n: isize) -> Option<usize> {
        let pos = (self.pos as isize).checked_add(n)?;
        if pos < 0 || pos as usize > self.len {
            None
        } else {
            Some(pos as usize)
        }
    }
}

unsafe impl<T: Sync> Send for Cursor<'_, T> {}
unsafe impl<T: Sync> Sync for Cursor<'_, T> {}

impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<'_, T> {}

impl<'a, T> Sub for Cursor<'a, T> {
    type Output = isize;

    fn sub(self, origin: Cursor<'a, T>) -> isize {
        self.distance_from(&origin)
    }
}

impl<T> PartialEq for Cursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        // zero-sized slots share one address, so the position decides
        self.base == other.base && self.pos == other.pos
    }
}

impl<T> Eq for Cursor<'_, T> {}

impl<T> PartialOrd for Cursor<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.base == other.base {
            Some(self.pos.cmp(&other.pos))
        } else {
            None
        }
    }
}

impl<T> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("pos", &self.pos)
            .field("len", &self.len)
            .finish()
    }
}

/// Random-access position that can write through to the element under it.
///
/// Holds the sequence's unique borrow, so only one exists at a time and it
/// moves in place instead of being copied.
pub struct CursorMut<'a, T> {
    base: NonNull<T>,
    len: usize,
    pos: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> CursorMut<'a, T> {
    #[inline]
    pub(crate) fn new(items: &'a mut [T], pos: usize) -> CursorMut<'a, T> {
        let len = items.len();
        debug_assert!(pos <= len, "cursor past end");
        CursorMut {
            base: NonNull::from(items).cast(),
            len,
            pos,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.pos == self.len
    }

    #[inline]
    pub fn get(&self) -> Option<&T> {
        if self.pos < self.len {
            Some(unsafe { &*self.base.as_ptr().add(self.pos) })
        } else {
            None
        }
    }

    /// Element at this position, `None` at the end.
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        if self.pos < self.len {
            Some(unsafe { &mut *self.base.as_ptr().add(self.pos) })
        } else {
            None
        }
    }

    /// Gives up the cursor for a reference that lives as long as the borrow.
    pub fn into_mut(self) -> Option<&'a mut T> {
        if self.pos < self.len {
            Some(unsafe { &mut *self.base.as_ptr().add(self.pos) })
        } else {
            None
        }
    }

    /// Moves `n` slots. Returns false and stays put if that leaves `0..=len`.
    pub fn move_by(&mut self, n: isize) -> bool {
        match (self.pos as isize).checked_add(n) {
            Some(pos) if pos >= 0 && pos as usize <= self.len => {
                self.pos = pos as usize;
                true
            }
            _ => false,
        }
    }

    /// Read-only view of the same position.
    pub fn as_cursor(&self) -> Cursor<'_, T> {
        let items = unsafe { slice::from_raw_parts(self.base.as_ptr(), self.len) };
        Cursor::new(items, self.pos)
    }
}

unsafe impl<T: Send> Send for CursorMut<'_, T> {}
unsafe impl<T: Sync> Sync for CursorMut<'_, T> {}

impl<T> fmt::Debug for CursorMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorMut")
            .field("pos", &self.pos)
            .field("len", &self.len)
            .finish()
    }
}

/// Borrowing iterator over a sequence's elements.
pub struct Iter<'a, T> {
    start: NonNull<T>,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iter<'a, T> {
    #[inline]
    pub(crate) fn new(items: &'a [T]) -> Iter<'a, T> {
        Iter {
            start: NonNull::from(items).cast(),
            remaining: items.len(),
            _marker: PhantomData,
        }
    }

    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &'a [T] {
        unsafe { slice::from_raw_parts(self.start.as_ptr(), self.remaining) }
    }
}

unsafe impl<T: Sync> Send for Iter<'_, T> {}
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            start: self.start,
            remaining: self.remaining,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        unsafe {
            let item = &*self.start.as_ptr();
            self.start = NonNull::new_unchecked(self.start.as_ptr().add(1));
            self.remaining -= 1;
            Some(item)
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        unsafe { Some(&*self.start.as_ptr().add(self.remaining)) }
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// Borrowing iterator over mutable references to a sequence's elements.
pub struct IterMut<'a, T> {
    start: NonNull<T>,
    remaining: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> IterMut<'a, T> {
    #[inline]
    pub(crate) fn new(items: &'a mut [T]) -> IterMut<'a, T> {
        IterMut {
            remaining: items.len(),
            start: NonNull::from(items).cast(),
            _marker: PhantomData,
        }
    }
}

unsafe impl<T: Send> Send for IterMut<'_, T> {}
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        unsafe {
            let item = &mut *self.start.as_ptr();
            self.start = NonNull::new_unchecked(self.start.as_ptr().add(1));
            self.remaining -= 1;
            Some(item)
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        unsafe { Some(&mut *self.start.as_ptr().add(self.remaining)) }
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

/// Owning iterator. Elements it does not yield are dropped with it, then the
/// block is freed.
pub struct IntoIter<T> {
    buf: RawBlock<T>,
    start: usize,
    end: usize,
}

impl<T> IntoIter<T> {
    #[inline]
    pub(crate) fn new(buf: RawBlock<T>, len: usize) -> IntoIter<T> {
        IntoIter { buf, start: 0, end: len }
    }

    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.buf.as_ptr().add(self.start), self.end - self.start) }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        let item = unsafe { ptr::read(self.buf.as_ptr().add(self.start)) };
        self.start += 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.end - self.start;
        (len, Some(len))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        self.end -= 1;
        unsafe { Some(ptr::read(self.buf.as_ptr().add(self.end))) }
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        let rest = ptr::slice_from_raw_parts_mut(unsafe { self.buf.as_ptr().add(self.start) }, self.end - self.start);
        self.start = self.end;
        unsafe { ptr::drop_in_place(rest) };
    }
}
