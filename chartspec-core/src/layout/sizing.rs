//! Discovery of the ancestor whose size is authoritative for the chart
use log::debug;

/// Node of a host layout tree that can be probed
pub trait LayoutNode: Sized {
    fn parent(&self) -> Option<Self>;

    /// Current rendered height
    fn height(&self) -> f64;

    fn set_hidden(&self, hidden: bool);
}

/// Walk up from `root` and return the first ancestor whose height does not change when `root`
/// is hidden. Ancestors that size themselves to the chart would oscillate if measured.
pub fn find_sizing_parent<N: LayoutNode>(root: &N) -> Option<N> {
    let mut candidate = root.parent();
    let mut depth = 0;
    while let Some(node) = candidate {
        let before = node.height();
        root.set_hidden(true);
        let after = node.height();
        root.set_hidden(false);

        if before == after {
            debug!("Sizing parent found {depth} level(s) above the render root");
            return Some(node);
        }
        candidate = node.parent();
        depth += 1;
    }
    None
}

/// How the host designates the container used for measurement
#[derive(Debug, Clone)]
pub enum SizingParent<N> {
    /// Container stated by the host
    Declared(N),
    /// Probe ancestors of the render root
    Probe(N),
}

impl<N: LayoutNode> SizingParent<N> {
    pub fn resolve(self) -> Option<N> {
        match self {
            SizingParent::Declared(node) => Some(node),
            SizingParent::Probe(root) => find_sizing_parent(&root),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Chain of nodes where the first `auto_sized` ancestors grow with the root
    struct Tree {
        root_hidden: Cell<bool>,
        auto_sized: usize,
        depth: usize,
        probes: Cell<usize>,
    }

    #[derive(Clone)]
    struct Node {
        tree: Rc<Tree>,
        level: usize,
    }

    impl LayoutNode for Node {
        fn parent(&self) -> Option<Self> {
            (self.level < self.tree.depth).then(|| Node {
                tree: self.tree.clone(),
                level: self.level + 1,
            })
        }

        fn height(&self) -> f64 {
            self.tree.probes.set(self.tree.probes.get() + 1);
            if self.level <= self.tree.auto_sized && self.tree.root_hidden.get() {
                0.0
            } else {
                300.0
            }
        }

        fn set_hidden(&self, hidden: bool) {
            self.tree.root_hidden.set(hidden);
        }
    }

    fn root(auto_sized: usize, depth: usize) -> Node {
        Node {
            tree: Rc::new(Tree {
                root_hidden: Cell::new(false),
                auto_sized,
                depth,
                probes: Cell::new(0),
            }),
            level: 0,
        }
    }

    #[test]
    fn test_skips_auto_sized_ancestors() {
        let root = root(2, 5);
        let parent = find_sizing_parent(&root).unwrap();
        assert_eq!(parent.level, 3);
        assert!(!root.tree.root_hidden.get());
    }

    #[test]
    fn test_no_fixed_ancestor() {
        assert!(find_sizing_parent(&root(5, 5)).is_none());
    }

    #[test]
    fn test_declared_parent_is_not_probed() {
        let root = root(0, 5);
        let declared = root.parent().unwrap().parent().unwrap();
        let resolved = SizingParent::Declared(declared).resolve().unwrap();
        assert_eq!(resolved.level, 2);
        assert_eq!(root.tree.probes.get(), 0);
    }
}
