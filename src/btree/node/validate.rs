use super::Node;

impl<T: Ord> Node<T> {
    /// Checks the structural invariants of this subtree and returns its depth
    /// below this node (0 for a leaf).
    ///
    /// Every element must lie strictly between `min` and `max` when given.
    ///
    /// # Panics
    ///
    /// Panics on the first violated invariant.
    pub fn validate(&self, level: usize, min: Option<&T>, max: Option<&T>) -> usize {
        let count = self.len();

        assert!(
            self.order >= crate::Order::MIN,
            "node at level {level} has order {}",
            self.order
        );
        assert!(
            !self.is_too_large(),
            "node at level {level} holds {count} elements, more than the {} allowed",
            self.max_elements()
        );
        assert!(
            level == 0 || count >= self.min_elements(),
            "node at level {level} holds {count} elements, fewer than the {} required",
            self.min_elements()
        );

        if count == 0 {
            assert!(
                self.children.is_empty(),
                "empty node at level {level} has children"
            );
            return 0;
        }

        let mut previous = min;
        for (i, element) in self.elements.iter().enumerate() {
            if let Some(previous) = previous {
                assert!(
                    previous < element,
                    "element {i} at level {level} is out of order"
                );
            }
            previous = Some(element);
        }
        if let (Some(last), Some(max)) = (previous, max) {
            assert!(
                last < max,
                "last element at level {level} is not below its upper separator"
            );
        }

        if self.is_leaf() {
            return 0;
        }

        assert_eq!(
            self.children.len(),
            count + 1,
            "internal node at level {level} has {} children for {count} elements",
            self.children.len()
        );

        let elements = self.elements();
        let depth = self.children[0].validate(level + 1, min, Some(&elements[0]));
        for i in 1..=count {
            let upper = if i == count { max } else { Some(&elements[i]) };
            let d = self.children[i].validate(level + 1, Some(&elements[i - 1]), upper);
            assert_eq!(depth, d, "leaves under child {i} at level {level} are at a different depth");
        }

        depth + 1
    }
}
