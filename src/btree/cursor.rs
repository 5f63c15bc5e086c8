use core::cmp::Ordering;
use core::fmt;
use core::ptr::NonNull;

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;

use super::node::Node;

/// A non-owning reference to a slot within a node.
///
/// The pointer never keeps its node alive; every dereference relies on the
/// owner of the path having proved that the tree it was built from is still
/// intact.
pub(crate) struct PathElement<T> {
    node: NonNull<Node<T>>,
    slot: usize,
}

impl<T> Clone for PathElement<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PathElement<T> {}

impl<T> PartialEq for PathElement<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.slot == other.slot
    }
}

impl<T> Eq for PathElement<T> {}

impl<T> PathElement<T> {
    fn new(node: &Node<T>, slot: usize) -> Self {
        Self {
            node: NonNull::from(node),
            slot,
        }
    }

    /// # Safety
    ///
    /// The node must still be alive and unmodified for `'a`.
    unsafe fn node<'a>(&self) -> &'a Node<T> {
        // SAFETY: guaranteed by the caller.
        unsafe { self.node.as_ref() }
    }
}

/// A root-to-node path through a tree, the last step being the current position.
///
/// Each entry on `path` is an ancestor together with the slot of the element
/// that follows the subtree the path descended into.
pub(crate) struct Path<T> {
    path: Vec<PathElement<T>>,
    current: PathElement<T>,
}

impl<T> Clone for Path<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            current: self.current,
        }
    }
}

impl<T> PartialEq for Path<T> {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
    }
}

impl<T> Eq for Path<T> {}

impl<T> Path<T> {
    /// Position of the smallest element: the leftmost leaf at slot 0.
    pub(crate) fn start_of(root: &Node<T>) -> Self {
        let mut path = Vec::new();
        let mut node = root;
        while let Some(child) = node.children().first() {
            path.push(PathElement::new(node, 0));
            node = child.as_ref();
        }

        Self {
            path,
            current: PathElement::new(node, 0),
        }
    }

    /// Position just past the largest element, expressed on the root.
    pub(crate) fn end_of(root: &Node<T>) -> Self {
        Self {
            path: Vec::new(),
            current: PathElement::new(root, root.len()),
        }
    }

    /// # Safety
    ///
    /// Every node on the path must be alive and unmodified for `'a`.
    pub(crate) unsafe fn value<'a>(&self) -> Option<&'a T> {
        // SAFETY: guaranteed by the caller.
        let node = unsafe { self.current.node() };
        node.elements().get(self.current.slot)
    }

    pub(crate) fn depth(&self) -> usize {
        self.path.len()
    }

    pub(crate) fn slot(&self) -> usize {
        self.current.slot
    }

    /// # Safety
    ///
    /// The current node must be alive, and internal with a child at the current slot.
    unsafe fn push(&mut self, slot: usize) {
        // SAFETY: guaranteed by the caller.
        let node = unsafe { self.current.node() };
        let child = node.children()[self.current.slot].as_ref();
        self.path.push(self.current);
        self.current = PathElement::new(child, slot);
    }

    fn pop(&mut self) {
        if let Some(parent) = self.path.pop() {
            self.current = parent;
        }
    }

    /// Steps to the next element in order.
    ///
    /// # Safety
    ///
    /// Every node on the path, and every node below it, must be alive and
    /// unmodified.
    ///
    /// # Panics
    ///
    /// Panics if the path is already at the end.
    pub(crate) unsafe fn form_successor(&mut self) {
        // SAFETY: guaranteed by the caller.
        let node = unsafe { self.current.node() };
        assert!(
            self.current.slot < node.len(),
            "cannot advance a cursor beyond the end"
        );

        self.current.slot += 1;
        if node.is_leaf() {
            // Climb to the nearest ancestor that still has elements to the right.
            // SAFETY: ancestors are covered by the caller's guarantee.
            while self.current.slot == unsafe { self.current.node() }.len()
                && !self.path.is_empty()
            {
                self.pop();
            }
            return;
        }

        // Descend to the leftmost leaf of the subtree right of the old slot.
        loop {
            // SAFETY: descendants are covered by the caller's guarantee.
            if unsafe { self.current.node() }.is_leaf() {
                break;
            }
            // SAFETY: the current node is alive and internal, and `slot <= len`.
            unsafe { self.push(0) };
        }
    }

    /// Steps to the previous element in order.
    ///
    /// # Safety
    ///
    /// Every node on the path, and every node below it, must be alive and
    /// unmodified.
    ///
    /// # Panics
    ///
    /// Panics if the path is at the first element.
    pub(crate) unsafe fn form_predecessor(&mut self) {
        // SAFETY: guaranteed by the caller.
        let node = unsafe { self.current.node() };
        if node.is_leaf() {
            while self.current.slot == 0 && !self.path.is_empty() {
                self.pop();
            }
            assert!(
                self.current.slot > 0,
                "cannot move a cursor before the start"
            );
            self.current.slot -= 1;
            return;
        }

        // Descend to the rightmost element of the subtree left of the slot.
        loop {
            // SAFETY: descendants are covered by the caller's guarantee.
            let node = unsafe { self.current.node() };
            if node.is_leaf() {
                break;
            }
            let child = &node.children()[self.current.slot];
            let slot = if child.is_leaf() {
                child.len() - 1
            } else {
                child.len()
            };
            // SAFETY: the current node is alive and internal, and `slot <= len`.
            unsafe { self.push(slot) };
        }
    }
}

/// A position in a [`BTreeSet`](super::BTreeSet), used for ordered stepping and comparison.
///
/// A cursor does not keep the tree alive and does not count as an owner for
/// copy-on-write purposes. It remembers which root it was created from and
/// that root's mutation counter: inserting into the tree afterwards
/// invalidates it, while a copy of the tree taken before the insertion still
/// accepts it.
///
/// Using an invalidated cursor, or a cursor with a tree it does not belong
/// to, panics.
///
/// ```
/// use cow_btree::BTreeSet;
///
/// let set: BTreeSet<u32> = [3, 1, 2].into_iter().collect();
/// let mut cursor = set.begin();
/// assert_eq!(set.element(&cursor), &1);
/// set.advance(&mut cursor);
/// assert_eq!(set.element(&cursor), &2);
/// assert!(cursor < set.end());
/// ```
pub struct Cursor<T> {
    root: Weak<Node<T>>,
    mutation_count: u64,
    path: Path<T>,
}

impl<T> Cursor<T> {
    pub(crate) fn start_of(root: &Rc<Node<T>>) -> Self {
        Self {
            root: Rc::downgrade(root),
            mutation_count: root.mutation_count(),
            path: Path::start_of(root),
        }
    }

    pub(crate) fn end_of(root: &Rc<Node<T>>) -> Self {
        Self {
            root: Rc::downgrade(root),
            mutation_count: root.mutation_count(),
            path: Path::end_of(root),
        }
    }

    /// Checks that this cursor was created from `root` and that nothing has
    /// been inserted through it since.
    ///
    /// # Panics
    ///
    /// Panics if either check fails.
    pub(crate) fn validate_for(&self, root: &Rc<Node<T>>) {
        assert!(
            core::ptr::eq(self.root.as_ptr(), Rc::as_ptr(root)),
            "cursor used with a tree it does not belong to"
        );
        assert!(
            self.mutation_count == root.mutation_count(),
            "cursor invalidated by a mutation of its tree"
        );
    }

    /// Checks that two cursors refer to the same, still intact tree, and
    /// returns its root so the nodes stay alive while they are compared.
    fn validate_pair(left: &Self, right: &Self) -> Rc<Node<T>> {
        assert!(
            Weak::ptr_eq(&left.root, &right.root),
            "cursors from different trees cannot be compared"
        );
        assert!(
            left.mutation_count == right.mutation_count,
            "cursors from different versions of a tree cannot be compared"
        );
        let Some(root) = left.root.upgrade() else {
            panic!("cursor outlived its tree");
        };
        assert!(
            left.mutation_count == root.mutation_count(),
            "cursor invalidated by a mutation of its tree"
        );
        root
    }

    pub(crate) fn path(&self) -> &Path<T> {
        &self.path
    }

    pub(crate) fn path_mut(&mut self) -> &mut Path<T> {
        &mut self.path
    }
}

impl<T> Clone for Cursor<T> {
    fn clone(&self) -> Self {
        Self {
            root: Weak::clone(&self.root),
            mutation_count: self.mutation_count,
            path: self.path.clone(),
        }
    }
}

impl<T> fmt::Debug for Cursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("mutation_count", &self.mutation_count)
            .field("depth", &self.path.depth())
            .field("slot", &self.path.slot())
            .finish_non_exhaustive()
    }
}

impl<T> PartialEq for Cursor<T> {
    fn eq(&self, other: &Self) -> bool {
        let _root = Self::validate_pair(self, other);
        self.path == other.path
    }
}

impl<T> Eq for Cursor<T> {}

impl<T: Ord> PartialOrd for Cursor<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for Cursor<T> {
    /// Orders by the referenced elements; the end cursor is greater than every other.
    fn cmp(&self, other: &Self) -> Ordering {
        let _root = Self::validate_pair(self, other);
        // SAFETY: `_root` keeps the validated tree alive, and a matching mutation
        // counter means no node on either path has changed.
        let (left, right) = unsafe { (self.path.value(), other.path.value()) };
        match (left, right) {
            (Some(a), Some(b)) => a.cmp(b),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
        }
    }
}
