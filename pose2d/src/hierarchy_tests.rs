use crate::{Hierarchy, PreOrder, angle_difference, normalize_angle, tree_root};
use std::f32::consts::PI;

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-5,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

/// Plain parent list with child lists derived in index order.
struct Tree {
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

impl Tree {
    fn new(parents: Vec<Option<usize>>) -> Self {
        let mut children = vec![Vec::new(); parents.len()];
        for (index, parent) in parents.iter().enumerate() {
            if let Some(parent) = *parent {
                children[parent].push(index);
            }
        }
        Self { parents, children }
    }
}

impl Hierarchy for Tree {
    fn len(&self) -> usize {
        self.parents.len()
    }

    fn parent_of(&self, index: usize) -> Option<usize> {
        self.parents.get(index).copied().flatten()
    }

    fn children_of(&self, index: usize) -> &[usize] {
        self.children.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[test]
fn pre_order_visits_parents_before_children_in_child_order() {
    //      0
    //    /   \
    //   1     4
    //  / \     \
    // 2   3     5
    let tree = Tree::new(vec![None, Some(0), Some(1), Some(1), Some(0), Some(4)]);
    let order = tree.pre_order(0).collect::<Vec<_>>();
    assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);

    let subtree = tree.pre_order(4).collect::<Vec<_>>();
    assert_eq!(subtree, vec![4, 5]);
}

#[test]
fn pre_order_restart_replays_the_walk() {
    let tree = Tree::new(vec![None, Some(0), Some(0), Some(2)]);
    let mut walk = PreOrder::new(&tree, 0);
    assert_eq!(walk.next(), Some(0));
    assert_eq!(walk.next(), Some(1));

    walk.restart();
    assert_eq!(walk.collect::<Vec<_>>(), vec![0, 1, 2, 3]);
}

#[test]
fn pre_order_of_unknown_top_is_empty() {
    let tree = Tree::new(vec![None]);
    assert_eq!(tree.pre_order(7).count(), 0);
}

#[test]
fn tree_root_walks_up_the_parent_chain() {
    let tree = Tree::new(vec![None, Some(0), Some(1), None, Some(3)]);
    assert_eq!(tree_root(&tree, 2, 16).unwrap(), 0);
    assert_eq!(tree_root(&tree, 0, 16).unwrap(), 0);
    assert_eq!(tree_root(&tree, 4, 16).unwrap(), 3);
}

#[test]
fn tree_root_rejects_unknown_and_runaway_chains() {
    let tree = Tree::new(vec![None, Some(0), Some(1)]);
    assert!(matches!(
        tree_root(&tree, 9, 16),
        Err(crate::Error::UnknownBone { index: 9 })
    ));
    assert!(matches!(
        tree_root(&tree, 2, 1),
        Err(crate::Error::DepthLimitExceeded { bone: 2, limit: 1 })
    ));

    let cyclic = Tree {
        parents: vec![Some(1), Some(0)],
        children: vec![vec![1], vec![0]],
    };
    assert!(tree_root(&cyclic, 0, 8).is_err());
}

#[test]
fn normalize_angle_wraps_into_half_open_range() {
    assert_approx(normalize_angle(0.25), 0.25);
    assert_approx(normalize_angle(PI), PI);
    assert_approx(normalize_angle(-PI), PI);
    assert_approx(normalize_angle(3.0 * PI / 2.0), -PI / 2.0);
    assert_approx(normalize_angle(-5.0 * PI / 2.0), -PI / 2.0);
}

#[test]
fn angle_difference_takes_the_short_way_round() {
    assert_approx(angle_difference(0.1, 0.3), 0.2);
    assert_approx(angle_difference(0.3, 0.1), -0.2);
    assert_approx(angle_difference(PI - 0.1, -PI + 0.1), 0.2);
    assert_approx(angle_difference(-PI + 0.1, PI - 0.1), -0.2);
}
