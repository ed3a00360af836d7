use crate::Error;
use glam::Vec2;

/// Index-addressed tree shape. Indices are `0..len()`.
pub trait Hierarchy {
    fn len(&self) -> usize;

    fn parent_of(&self, index: usize) -> Option<usize>;

    fn children_of(&self, index: usize) -> &[usize];

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, index: usize) -> bool {
        index < self.len()
    }

    /// Parent-before-children traversal of the subtree under `top`.
    fn pre_order(&self, top: usize) -> PreOrder<'_, Self> {
        PreOrder::new(self, top)
    }
}

/// Read-only view of a posed skeleton, as consumed by the solver.
///
/// Angles are radians. `world_angle` of a bone is the direction of the segment from its parent's
/// world position to its own; `rotate` is the pose value layered on top of `local_angle`.
pub trait BoneSource: Hierarchy {
    fn world_position(&self, bone: usize) -> Vec2;

    fn world_angle(&self, bone: usize) -> f32;

    fn local_angle(&self, bone: usize) -> f32;

    fn rotate(&self, bone: usize) -> f32;
}

/// Lazy pre-order walk with an explicit stack.
///
/// Children are yielded in their stored order. The hierarchy must be acyclic.
pub struct PreOrder<'a, H: Hierarchy + ?Sized> {
    tree: &'a H,
    top: usize,
    stack: Vec<usize>,
}

impl<'a, H: Hierarchy + ?Sized> PreOrder<'a, H> {
    pub fn new(tree: &'a H, top: usize) -> Self {
        let mut walk = Self {
            tree,
            top,
            stack: Vec::new(),
        };
        walk.restart();
        walk
    }

    /// Rewinds to the top of the subtree.
    pub fn restart(&mut self) {
        self.stack.clear();
        if self.tree.contains(self.top) {
            self.stack.push(self.top);
        }
    }
}

impl<H: Hierarchy + ?Sized> Iterator for PreOrder<'_, H> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let index = self.stack.pop()?;
        let tree = self.tree;
        self.stack.extend(
            tree.children_of(index)
                .iter()
                .rev()
                .copied()
                .filter(|&child| tree.contains(child)),
        );
        Some(index)
    }
}

/// Walks up from `bone` to the top of its tree.
pub fn tree_root<H: Hierarchy + ?Sized>(
    tree: &H,
    bone: usize,
    max_depth: usize,
) -> Result<usize, Error> {
    if !tree.contains(bone) {
        return Err(Error::UnknownBone { index: bone });
    }
    let mut current = bone;
    for _ in 0..=max_depth {
        match tree.parent_of(current) {
            Some(parent) if tree.contains(parent) => current = parent,
            Some(parent) => return Err(Error::UnknownBone { index: parent }),
            None => return Ok(current),
        }
    }
    Err(Error::DepthLimitExceeded {
        bone,
        limit: max_depth,
    })
}

/// Wraps an angle into `(-PI, PI]`.
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let mut wrapped = angle % TAU;
    if wrapped > PI {
        wrapped -= TAU;
    } else if wrapped <= -PI {
        wrapped += TAU;
    }
    wrapped
}

/// Signed shortest turn from `from` to `to`, in `(-PI, PI]`.
pub fn angle_difference(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}
