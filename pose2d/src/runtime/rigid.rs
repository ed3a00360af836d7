use crate::{BoneSource, Error, Hierarchy};
use glam::Vec2;
use std::collections::HashSet;

/// Segments shorter than this are treated as points.
pub const DEFAULT_EPSILON: f32 = 1.0e-5;

/// Where a segment turns when its torque is applied.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Pivot {
    /// Around the root, after translation.
    #[default]
    Free,
    /// Around the midpoint, after translation.
    Center,
    /// Around the tail, after translation.
    Tail,
}

/// Rigid stand-in for one source bone: a rod from its parent's position to its own.
#[derive(Clone, Debug)]
pub struct RigidNode {
    bone: usize,
    parent: Option<usize>,
    children: Vec<usize>,
    depth: usize,

    pub root_pos: Vec2,
    pub angle: f32,
    length: f32,

    /// Pending translation, consumed by [`RigidNode::apply_motion`].
    pub force: Vec2,
    /// Pending rotation in radians, consumed by [`RigidNode::apply_motion`].
    pub torque: f32,

    local_angle: f32,
    rest_angle: f32,
}

impl RigidNode {
    /// Source bone this node was snapshotted from.
    pub fn bone(&self) -> usize {
        self.bone
    }

    pub fn parent_index(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn local_angle(&self) -> f32 {
        self.local_angle
    }

    /// World angle at snapshot time.
    pub fn rest_angle(&self) -> f32 {
        self.rest_angle
    }

    pub fn dir(&self) -> Vec2 {
        Vec2::from_angle(self.angle) * self.length
    }

    pub fn tail_pos(&self) -> Vec2 {
        self.root_pos + self.dir()
    }

    pub fn center_pos(&self) -> Vec2 {
        self.root_pos + 0.5 * self.dir()
    }

    pub fn is_degenerate(&self, epsilon: f32) -> bool {
        self.length < epsilon
    }

    /// Moves by `force`, turns by `torque` around `pivot`, then clears both.
    ///
    /// A degenerate segment has no orientation to turn, so its torque is dropped.
    pub fn apply_motion(&mut self, pivot: Pivot, epsilon: f32) {
        self.root_pos += self.force;

        if !self.is_degenerate(epsilon) && self.torque != 0.0 {
            let rotation = Vec2::from_angle(self.torque);
            let center = match pivot {
                Pivot::Free => self.root_pos,
                Pivot::Center => self.center_pos(),
                Pivot::Tail => self.tail_pos(),
            };
            self.root_pos = center + rotation.rotate(self.root_pos - center);
            self.angle += self.torque;
        }

        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }
}

/// Arena of [`RigidNode`]s mirroring one connected source tree, stored in pre-order.
#[derive(Clone, Debug)]
pub struct RigidTree {
    nodes: Vec<RigidNode>,
}

impl RigidTree {
    /// Snapshots the subtree under `top`.
    ///
    /// Fails on unknown indices, on a bone reached twice and on bones nested deeper than
    /// `max_depth` below `top`.
    pub fn from_source<S: BoneSource + ?Sized>(
        source: &S,
        top: usize,
        max_depth: usize,
    ) -> Result<Self, Error> {
        if !source.contains(top) {
            return Err(Error::UnknownBone { index: top });
        }

        let mut nodes = Vec::<RigidNode>::new();
        let mut visited = HashSet::<usize>::new();
        // (bone, parent node index, depth)
        let mut stack = vec![(top, None::<usize>, 0usize)];

        while let Some((bone, parent, depth)) = stack.pop() {
            if !visited.insert(bone) {
                return Err(Error::CyclicHierarchy { bone });
            }
            if depth > max_depth {
                return Err(Error::DepthLimitExceeded {
                    bone,
                    limit: max_depth,
                });
            }

            let world = source.world_position(bone);
            let root_pos = match parent {
                Some(parent) => source.world_position(nodes[parent].bone),
                None => world,
            };
            let angle = source.world_angle(bone);

            let index = nodes.len();
            nodes.push(RigidNode {
                bone,
                parent,
                children: Vec::new(),
                depth,
                root_pos,
                angle,
                length: (world - root_pos).length(),
                force: Vec2::ZERO,
                torque: 0.0,
                local_angle: source.local_angle(bone),
                rest_angle: angle,
            });
            if let Some(parent) = parent {
                nodes[parent].children.push(index);
            }

            for &child in source.children_of(bone).iter().rev() {
                if !source.contains(child) {
                    return Err(Error::UnknownBone { index: child });
                }
                stack.push((child, Some(index), depth + 1));
            }
        }

        log::trace!(
            "rigid tree snapshot: {} nodes under bone {top}",
            nodes.len()
        );
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[RigidNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [RigidNode] {
        &mut self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&RigidNode> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut RigidNode> {
        self.nodes.get_mut(index)
    }

    /// The node snapshotted from the top bone.
    pub fn root(&self) -> &RigidNode {
        &self.nodes[0]
    }

    pub fn find(&self, bone: usize) -> Option<usize> {
        self.nodes.iter().position(|node| node.bone == bone)
    }

    /// `index` followed by its ancestors, nearest first.
    pub fn ancestry(&self, index: usize) -> Vec<usize> {
        let mut chain = Vec::with_capacity(self.nodes.get(index).map_or(0, |n| n.depth + 1));
        let mut current = self.nodes.get(index).map(|_| index);
        while let Some(node) = current {
            chain.push(node);
            current = self.nodes[node].parent;
        }
        chain
    }
}

impl Hierarchy for RigidTree {
    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn parent_of(&self, index: usize) -> Option<usize> {
        self.nodes.get(index).and_then(|node| node.parent)
    }

    fn children_of(&self, index: usize) -> &[usize] {
        self.nodes
            .get(index)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }
}
