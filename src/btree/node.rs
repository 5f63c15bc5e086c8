use core::borrow::Borrow;
use core::ops::ControlFlow;

#[cfg(feature = "std")]
use alloc::boxed::Box;
#[cfg(feature = "std")]
use alloc::format;
#[cfg(feature = "std")]
use alloc::string::String;
#[cfg(feature = "std")]
use std::error::Error;
#[cfg(feature = "std")]
use std::io::Write;

use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::common::ElementBuf;

mod splinter;
mod validate;

pub use splinter::Splinter;

/// A single B-tree node.
///
/// `elements` is sorted and holds at most `order - 1` values at rest; it has
/// room for exactly `order` so an insertion can overflow by one before the
/// node splits. Internal nodes hold `elements.len() + 1` children, leaves
/// hold none.
pub struct Node<T> {
    order: usize,
    mutation_count: u64,
    elements: ElementBuf<T>,
    children: Vec<Rc<Node<T>>>,
}

/// Outcome of inserting into a subtree.
pub enum Insertion<T> {
    /// An equal element was already present; this is a copy of it.
    Existing(T),
    /// The element was added. Carries the splinter if the subtree root overflowed.
    Inserted(Option<Splinter<T>>),
}

impl<T> Node<T> {
    pub fn new(order: usize) -> Self {
        Self {
            order,
            mutation_count: 0,
            elements: ElementBuf::with_capacity(order),
            children: Vec::new(),
        }
    }

    /// Builds a new root one level above `trunk`, separated from the splinter's node.
    pub fn with_root(order: usize, trunk: Rc<Node<T>>, splinter: Splinter<T>) -> Self {
        let mut root = Self::new(order);
        root.elements.push(splinter.separator);
        root.children.reserve_exact(order + 1);
        root.children.push(trunk);
        root.children.push(Rc::new(splinter.node));
        root
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    #[inline]
    pub fn mutation_count(&self) -> u64 {
        self.mutation_count
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    #[inline]
    pub fn children(&self) -> &[Rc<Node<T>>] {
        &self.children
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub fn max_elements(&self) -> usize {
        self.order - 1
    }

    #[inline]
    pub fn min_elements(&self) -> usize {
        (self.order + 1) / 2 - 1
    }

    #[inline]
    pub fn is_too_large(&self) -> bool {
        self.len() > self.max_elements()
    }

    /// Returns whether `element` is present here, and the smallest slot whose
    /// element is not less than it.
    ///
    /// This is the only search in the tree; lookups, insertion and the
    /// placement of splinters all go through it.
    pub fn slot<Q>(&self, element: &Q) -> (bool, usize)
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let elements = self.elements();
        let index = elements.partition_point(|e| e.borrow() < element);
        let matched = index < elements.len() && elements[index].borrow() == element;
        (matched, index)
    }

    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (matched, index) = self.slot(element);
        if matched {
            return true;
        }
        if self.is_leaf() {
            return false;
        }
        self.children[index].contains(element)
    }

    pub fn get<Q>(&self, element: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = self;
        loop {
            let (matched, index) = node.slot(element);
            if matched {
                return Some(&node.elements[index]);
            }
            node = node.children.get(index).map(Rc::as_ref)?;
        }
    }

    pub fn first(&self) -> Option<&T> {
        let mut node = self;
        while let Some(child) = node.children.first() {
            node = child.as_ref();
        }
        node.elements.first()
    }

    pub fn last(&self) -> Option<&T> {
        let mut node = self;
        while let Some(child) = node.children.last() {
            node = child.as_ref();
        }
        node.elements.last()
    }

    /// Visits the subtree in order, stopping at the first `Break`.
    pub fn try_for_each<B, F>(&self, body: &mut F) -> ControlFlow<B>
    where
        F: FnMut(&T) -> ControlFlow<B>,
    {
        if self.is_leaf() {
            for element in self.elements.iter() {
                body(element)?;
            }
            return ControlFlow::Continue(());
        }

        for (child, element) in self.children.iter().zip(self.elements.iter()) {
            child.try_for_each(body)?;
            body(element)?;
        }
        self.children[self.len()].try_for_each(body)
    }

    pub fn count(&self) -> usize {
        self.children
            .iter()
            .fold(self.len(), |total, child| total + child.count())
    }

    pub fn height(&self) -> usize {
        match self.children.first() {
            Some(child) => child.height() + 1,
            None => 1,
        }
    }
}

impl<T: Clone> Node<T> {
    /// Shallow copy: elements are cloned, children are shared.
    pub fn clone_node(&self) -> Self {
        let mut children = Vec::new();
        if !self.is_leaf() {
            children.reserve_exact(self.order + 1);
            children.extend(self.children.iter().cloned());
        }

        Self {
            order: self.order,
            mutation_count: self.mutation_count,
            elements: self.elements.clone_buf(),
            children,
        }
    }
}

impl<T: Ord + Clone> Node<T> {
    pub fn insert(&mut self, element: T) -> Insertion<T> {
        let (matched, slot) = self.slot(&element);
        if matched {
            return Insertion::Existing(self.elements[slot].clone());
        }

        // Bumped on every node along the insertion path, so the root's counter
        // changes whenever anything below it does.
        self.mutation_count += 1;

        if self.is_leaf() {
            self.elements.insert(slot, element);
            return Insertion::Inserted(self.split_if_too_large());
        }

        match make_unique(&mut self.children[slot]).insert(element) {
            Insertion::Inserted(Some(splinter)) => {
                self.elements.insert(slot, splinter.separator);
                self.children.insert(slot + 1, Rc::new(splinter.node));
                Insertion::Inserted(self.split_if_too_large())
            }
            outcome => outcome,
        }
    }

    fn split_if_too_large(&mut self) -> Option<Splinter<T>> {
        self.is_too_large().then(|| self.split())
    }
}

/// Returns exclusive access to the node behind `link`, cloning it first if
/// another tree shares it.
///
/// Uniqueness is decided by the strong count alone. Cursors hold only weak
/// references and raw pointers and must never keep a node from being
/// mutated in place. The check runs on the owning slot itself; an `Rc::clone`
/// taken beforehand would inflate the count and force a needless copy.
pub fn make_unique<T: Clone>(link: &mut Rc<Node<T>>) -> &mut Node<T> {
    if Rc::strong_count(link) != 1 {
        tracing::trace!(
            order = link.order(),
            elements = link.len(),
            leaf = link.is_leaf(),
            "cloning shared node before mutation"
        );
        *link = Rc::new(link.clone_node());
    }

    // SAFETY: the strong count is 1 and `link` is borrowed mutably, so no other
    // `Rc` can observe the node. Remaining `Weak`s belong to cursors, which only
    // dereference a node after checking the root's mutation counter. Callers
    // only take this reference to add an element, and `Node::insert` bumps the
    // counter of every node on the path before any cursor can run again.
    unsafe { &mut *Rc::as_ptr(link).cast_mut() }
}

#[cfg(test)]
impl<T: Clone> Node<T> {
    pub fn child_mut(&mut self, i: usize) -> &mut Node<T> {
        make_unique(&mut self.children[i])
    }

    pub fn truncate_elements(&mut self, len: usize) {
        self.elements.truncate(len);
    }
}

#[cfg(feature = "std")]
impl<T: core::fmt::Debug> Node<T> {
    pub fn to_dot(&self, data: &mut Vec<u8>) -> Result<(), Box<dyn Error>> {
        let this = core::ptr::from_ref(self);
        let labels: Vec<String> = self
            .elements
            .iter()
            .map(|element| escape_record(&format!("{element:?}")))
            .collect();

        data.write_all(
            format!(
                "\"p{:?}\" [shape=\"record\"; label=\"{{{}|{{{}}}}}\"];\n",
                this,
                self.mutation_count,
                labels.join("|")
            )
            .as_bytes(),
        )?;

        for child in &self.children {
            data.write_all(
                format!("\"p{:?}\" -> \"p{:?}\";\n", this, Rc::as_ptr(child)).as_bytes(),
            )?;
            child.to_dot(data)?;
        }

        Ok(())
    }
}

#[cfg(feature = "std")]
fn escape_record(label: &str) -> String {
    let mut escaped = String::with_capacity(label.len());
    for c in label.chars() {
        if matches!(c, '"' | '{' | '}' | '|' | '<' | '>' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
