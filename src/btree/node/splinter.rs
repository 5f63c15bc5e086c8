use alloc::vec::Vec;

use super::Node;

/// The upper half of a node that overflowed, ready to be linked into its parent.
///
/// `separator` is greater than every element left behind in the split node
/// and less than every element in `node`.
pub struct Splinter<T> {
    pub separator: T,
    pub node: Node<T>,
}

impl<T> Node<T> {
    /// Splits this node around its middle element.
    ///
    /// With `count` elements and `middle = count / 2`, this node keeps
    /// `elements[..middle]` (and `children[..=middle]`), the sibling receives
    /// `elements[middle + 1..]` (and `children[middle + 1..]`), and
    /// `elements[middle]` becomes the separator, belonging to neither half.
    pub fn split(&mut self) -> Splinter<T> {
        let count = self.len();
        let middle = count / 2;
        assert!(middle > 0, "cannot split a node holding {count} elements");

        let upper = self.elements.split_off(middle + 1);
        let Some(separator) = self.elements.pop() else {
            unreachable!("split point lies inside the element buffer");
        };

        let mut node = Node {
            order: self.order,
            mutation_count: 0,
            elements: upper,
            children: Vec::new(),
        };

        if !self.is_leaf() {
            node.children.reserve_exact(self.order + 1);
            node.children.extend(self.children.drain(middle + 1..));
        }

        debug_assert_eq!(self.len(), middle);
        debug_assert_eq!(node.len(), count - middle - 1);

        tracing::trace!(
            order = self.order,
            leaf = node.is_leaf(),
            kept = middle,
            moved = node.len(),
            "split overflowing node"
        );

        Splinter { separator, node }
    }
}
