use core::iter::FusedIterator;
use core::marker::PhantomData;

use super::cursor::Path;
use super::node::Node;

/// An iterator over the elements of a `BTreeSet`, in ascending order.
///
/// This struct is created by the [`iter`](super::BTreeSet::iter) method on
/// [`BTreeSet`](super::BTreeSet). See its documentation for more.
pub struct Iter<'a, T> {
    front: Path<T>,
    back: Path<T>,
    phantom: PhantomData<&'a Node<T>>,
}

impl<'a, T> Iter<'a, T> {
    pub(super) fn new(root: &'a Node<T>) -> Self {
        Self {
            front: Path::start_of(root),
            back: Path::end_of(root),
            phantom: PhantomData,
        }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            front: self.front.clone(),
            back: self.back.clone(),
            phantom: PhantomData,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        // SAFETY: the tree is borrowed for 'a, so every node on both paths is
        // alive and cannot be mutated.
        let value = unsafe { self.front.value() }?;
        // SAFETY: as above.
        unsafe { self.front.form_successor() };
        Some(value)
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        // SAFETY: the tree is borrowed for 'a, so every node on both paths is
        // alive and cannot be mutated. `back` is strictly after `front`, so a
        // predecessor exists.
        unsafe {
            self.back.form_predecessor();
            self.back.value()
        }
    }
}

impl<T> FusedIterator for Iter<'_, T> {}
