use crate::{BoneSource, DEFAULT_EPSILON, Error, Hierarchy, Pivot, RigidNode, RigidTree};
use crate::{angle_difference, normalize_angle, tree_root};
use glam::Vec2;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SolverConfig {
    /// Share of a pull that travels on as translation, in `(0, 1]`. Lower values keep
    /// ancestors stiffer and favour rotation of the pulled bone.
    pub conduction: f32,
    /// Small pulls applied per drag increment.
    pub substeps: u32,
    /// Parent/child re-anchoring sweeps after every small pull.
    pub relaxation_passes: u32,
    /// Deepest nesting accepted below the top bone.
    pub max_depth: usize,
    /// Segments shorter than this are treated as points.
    pub epsilon: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            conduction: 0.1,
            substeps: 16,
            relaxation_passes: 3,
            max_depth: 256,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl SolverConfig {
    pub fn with_conduction(mut self, conduction: f32) -> Self {
        self.conduction = conduction;
        self
    }

    pub fn with_substeps(mut self, substeps: u32) -> Self {
        self.substeps = substeps;
        self
    }

    pub fn with_relaxation_passes(mut self, passes: u32) -> Self {
        self.relaxation_passes = passes;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.conduction > 0.0 && self.conduction <= 1.0) {
            return Err(Error::InvalidValue {
                message: format!("conduction must be in (0, 1], got {}", self.conduction),
            });
        }
        if self.substeps == 0 {
            return Err(Error::InvalidValue {
                message: "substeps must be at least 1".to_string(),
            });
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(Error::InvalidValue {
                message: format!("epsilon must be positive, got {}", self.epsilon),
            });
        }
        Ok(())
    }
}

/// A pull split against a segment direction.
#[derive(Copy, Clone, Debug)]
struct Split {
    /// Along the segment.
    trans: Vec2,
    /// Across the segment.
    rotate: Vec2,
    /// `cross(direction, rotate)`: positive when `rotate` points to the segment's left.
    cross: f32,
}

impl Split {
    fn new(node: &RigidNode, pull: Vec2) -> Self {
        let norm_dir = node.dir().normalize_or_zero();
        let trans = norm_dir * norm_dir.dot(pull);
        let rotate = pull - trans;
        Self {
            trans,
            rotate,
            cross: norm_dir.perp_dot(rotate),
        }
    }

    /// Turn for a pull acting on the tail while the root holds.
    fn tail_torque(&self, lever: f32) -> f32 {
        let sign = if self.cross > 0.0 { 1.0 } else { -1.0 };
        self.rotate.length() / lever * sign
    }

    /// Turn for a pull acting on the root while the tail holds.
    fn root_torque(&self, lever: f32) -> f32 {
        let sign = if self.cross < 0.0 { 1.0 } else { -1.0 };
        self.rotate.length() / lever * sign
    }
}

/// `pull_pos` clamped into `[0, 1]`, or `None` when either input is not finite.
fn checked_pull_pos(pull: Vec2, pull_pos: f32) -> Option<f32> {
    (pull.is_finite() && pull_pos.is_finite()).then(|| pull_pos.clamp(0.0, 1.0))
}

/// Propagates pulls through a rigid shadow of one connected skeleton.
///
/// Built fresh for every drag increment; the source skeleton is only read.
pub struct PullSolver<'a, S: BoneSource + ?Sized> {
    source: &'a S,
    top: usize,
    tree: RigidTree,
    config: SolverConfig,
}

impl<'a, S: BoneSource + ?Sized> PullSolver<'a, S> {
    /// Snapshots the whole skeleton that contains `bone`.
    pub fn new(source: &'a S, bone: usize, config: SolverConfig) -> Result<Self, Error> {
        config.validate()?;
        let top = tree_root(source, bone, config.max_depth)?;
        let tree = RigidTree::from_source(source, top, config.max_depth)?;
        log::debug!(
            "pull solver: bone {bone}, top bone {top}, {} rigid nodes",
            tree.len()
        );
        Ok(Self {
            source,
            top,
            tree,
            config,
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn conduction(&self) -> f32 {
        self.config.conduction
    }

    pub fn top_bone(&self) -> usize {
        self.top
    }

    pub fn rigid_tree(&self) -> &RigidTree {
        &self.tree
    }

    pub fn rigid_tree_mut(&mut self) -> &mut RigidTree {
        &mut self.tree
    }

    pub fn rigid_root(&self) -> &RigidNode {
        self.tree.root()
    }

    /// The fixed world point the chain stays attached to.
    pub fn anchor(&self) -> Vec2 {
        self.source.world_position(self.top)
    }

    /// Drags `bone` by `pull`, split into `substeps` small pulls. `pull_pos` is where along the
    /// segment the pull acts: 0 at the root, 1 at the tail.
    ///
    /// Does nothing when `bone` is not part of this skeleton or the pull is not finite.
    /// `pull_pos` is clamped to `[0, 1]`.
    pub fn pull(&mut self, bone: usize, pull: Vec2, pull_pos: f32) {
        let Some(target) = self.tree.find(bone) else {
            log::trace!("pull ignored: bone {bone} is not in this skeleton");
            return;
        };
        let Some(pull_pos) = checked_pull_pos(pull, pull_pos) else {
            log::debug!("pull ignored: non-finite pull {pull} at {pull_pos}");
            return;
        };
        let steps = self.config.substeps.max(1);
        let step = pull / steps as f32;
        for _ in 0..steps {
            self.pull_node(target, step, pull_pos);
        }
    }

    /// One small pull on the rigid node at `target`, followed by propagation and relaxation.
    /// Non-finite input is ignored and `pull_pos` is clamped to `[0, 1]`.
    pub fn pull_node(&mut self, target: usize, pull: Vec2, pull_pos: f32) {
        let Some(pull_pos) = checked_pull_pos(pull, pull_pos) else {
            return;
        };
        let epsilon = self.config.epsilon;
        let conduction = self.config.conduction;
        let Some(node) = self.tree.node_mut(target) else {
            return;
        };

        let pre_root = node.root_pos;
        let pre_tail = node.tail_pos();

        if node.is_degenerate(epsilon) {
            node.force = pull;
            node.apply_motion(Pivot::Free, epsilon);
        } else {
            let linear = (2.0 * (pull_pos - 0.5)).abs();
            let rate = 1.0 - (1.0 - linear) * (1.0 - linear);
            let rotate_rate = conduction * rate + (1.0 - conduction);

            let split = Split::new(node, pull);
            node.force = conduction * (split.trans + (1.0 - rotate_rate) * split.rotate);

            let turn = split.rotate * rotate_rate;
            let end_sign = if pull_pos >= 0.5 { 1.0 } else { -1.0 };
            let turn_sign = if split.cross > 0.0 { 1.0 } else { -1.0 };
            node.torque = turn.length() / node.length() * end_sign * turn_sign;

            // the end away from the pull stays put
            let pivot = if pull_pos >= 0.5 {
                Pivot::Free
            } else {
                Pivot::Tail
            };
            node.apply_motion(pivot, epsilon);
        }

        let root_shift = self.tree.nodes()[target].root_pos - pre_root;
        self.pull_parent_bones(target, root_shift);
        self.adjust_by_origin_constraint(target);

        let tail_shift = self.tree.nodes()[target].tail_pos() - pre_tail;
        self.pull_child_bones(target, tail_shift);

        for _ in 0..self.config.relaxation_passes {
            self.adjust_parent_bones(target);
            self.adjust_child_bones(target);
        }
    }

    /// Passes the target's root displacement up to its ancestors, damped by `conduction` at
    /// every hop. Only the translated part travels on.
    pub fn pull_parent_bones(&mut self, target: usize, pull: Vec2) {
        let epsilon = self.config.epsilon;
        let conduction = self.config.conduction;
        let mut pull = pull;
        let mut current = self.tree.parent_of(target);
        while let Some(index) = current {
            let parent = &mut self.tree.nodes_mut()[index];
            if parent.is_degenerate(epsilon) {
                parent.force = conduction * pull;
            } else {
                let split = Split::new(parent, pull);
                parent.force = conduction * split.trans;
                parent.torque = split.tail_torque(parent.length());
                pull = conduction * split.trans;
            }
            parent.apply_motion(Pivot::Free, epsilon);
            current = parent.parent_index();
        }
    }

    /// Pins the chain from the top node down to `target` back onto the anchor.
    pub fn adjust_by_origin_constraint(&mut self, target: usize) {
        let epsilon = self.config.epsilon;
        let mut chain = self.tree.ancestry(target);
        chain.reverse();

        // ancestry always ends at the top node
        let mut pull = self.anchor() - self.tree.root().root_pos;
        for index in chain {
            let node = &mut self.tree.nodes_mut()[index];
            if node.is_degenerate(epsilon) {
                node.force = pull;
            } else {
                let split = Split::new(node, pull);
                node.force = split.trans;
                node.torque = split.root_torque(node.length());
                pull = split.trans;
            }
            node.apply_motion(Pivot::Tail, epsilon);
        }
    }

    /// Passes the target's tail displacement, undamped, to every descendant.
    pub fn pull_child_bones(&mut self, target: usize, pull: Vec2) {
        let epsilon = self.config.epsilon;
        let mut stack = self
            .tree
            .children_of(target)
            .iter()
            .rev()
            .map(|&child| (child, pull))
            .collect::<Vec<_>>();

        while let Some((index, pull)) = stack.pop() {
            let child = &mut self.tree.nodes_mut()[index];
            let mut trans = pull;
            if !child.is_degenerate(epsilon) {
                let split = Split::new(child, pull);
                trans = split.trans;
                child.torque = split.root_torque(child.length());
            }
            child.force = trans;
            child.apply_motion(Pivot::Tail, epsilon);

            stack.extend(
                self.tree.nodes()[index]
                    .children()
                    .iter()
                    .rev()
                    .map(|&grandchild| (grandchild, trans)),
            );
        }
    }

    /// Turns each ancestor so its tail meets the root of the node below it.
    pub fn adjust_parent_bones(&mut self, target: usize) {
        let epsilon = self.config.epsilon;
        let mut prev = target;
        let mut current = self.tree.parent_of(target);
        while let Some(index) = current {
            let child_root = self.tree.nodes()[prev].root_pos;
            let parent = &mut self.tree.nodes_mut()[index];
            let pull = child_root - parent.tail_pos();
            if parent.is_degenerate(epsilon) {
                parent.force = pull;
            } else {
                let split = Split::new(parent, pull);
                parent.force = split.trans;
                parent.torque = split.tail_torque(parent.length());
            }
            parent.apply_motion(Pivot::Free, epsilon);
            prev = index;
            current = parent.parent_index();
        }
    }

    /// Moves each descendant so its root meets the tail of its parent.
    pub fn adjust_child_bones(&mut self, target: usize) {
        let epsilon = self.config.epsilon;
        let mut stack = self
            .tree
            .children_of(target)
            .iter()
            .rev()
            .copied()
            .collect::<Vec<_>>();

        while let Some(index) = stack.pop() {
            let Some(parent) = self.tree.parent_of(index) else {
                continue;
            };
            let parent_tail = self.tree.nodes()[parent].tail_pos();
            let child = &mut self.tree.nodes_mut()[index];
            let pull = parent_tail - child.root_pos;
            if child.is_degenerate(epsilon) {
                child.force = pull;
            } else {
                let split = Split::new(child, pull);
                child.force = split.trans;
                child.torque = split.root_torque(child.length());
            }
            child.apply_motion(Pivot::Tail, epsilon);

            stack.extend(self.tree.nodes()[index].children().iter().rev().copied());
        }
    }

    /// Applies whatever force and torque every node still holds, turning around roots.
    pub fn update_motions(&mut self) {
        let epsilon = self.config.epsilon;
        for node in self.tree.nodes_mut() {
            node.apply_motion(Pivot::Free, epsilon);
        }
    }

    /// Where the tail of `index` should sit so that it and all its children's roots meet:
    /// the mean of its tail and their roots.
    pub fn connect_point(&self, index: usize) -> Option<Vec2> {
        let node = self.tree.node(index)?;
        let count = 1 + node.children().len();
        let sum = node
            .children()
            .iter()
            .fold(node.tail_pos(), |sum, &child| sum + self.tree.nodes()[child].root_pos);
        Some(sum / count as f32)
    }

    /// Pulls multi-child joints back together. Every segment is tugged at its root towards the
    /// shared point above it and at its tail towards its own connect point, and turns about its
    /// middle.
    ///
    /// Each segment moves as soon as it is visited, so children aim at their parent's updated
    /// connect point. Nothing is left pending for [`PullSolver::update_motions`].
    pub fn reconnect_bones(&mut self) {
        let epsilon = self.config.epsilon;
        let root = self.tree.root();
        let origin = root.tail_pos();
        let mut stack = root
            .children()
            .iter()
            .rev()
            .map(|&child| (child, origin))
            .collect::<Vec<_>>();

        while let Some((index, shared)) = stack.pop() {
            let Some(connect) = self.connect_point(index) else {
                continue;
            };
            let node = &mut self.tree.nodes_mut()[index];
            let root_pull = shared - node.root_pos;
            let tail_pull = connect - node.tail_pos();

            if node.is_degenerate(epsilon) {
                node.force = root_pull + tail_pull;
                node.torque = 0.0;
            } else {
                let half_length = 0.5 * node.length();
                let root_split = Split::new(node, root_pull);
                let tail_split = Split::new(node, tail_pull);
                node.force = root_split.trans + tail_split.trans;
                node.torque =
                    root_split.root_torque(half_length) + tail_split.tail_torque(half_length);
            }
            node.apply_motion(Pivot::Center, epsilon);

            stack.extend(
                self.tree.nodes()[index]
                    .children()
                    .iter()
                    .rev()
                    .map(|&child| (child, connect)),
            );
        }
    }

    /// Change of every bone's pose rotation since the snapshot, in pre-order. Nodes without a
    /// parent report 0.
    pub fn rotation_differences(&self) -> Vec<f32> {
        let nodes = self.tree.nodes();
        self.tree
            .pre_order(0)
            .map(|index| {
                let node = &nodes[index];
                let Some(parent) = node.parent_index().map(|parent| &nodes[parent]) else {
                    return 0.0;
                };
                let before = node.rest_angle() - parent.rest_angle() - node.local_angle();
                let after = node.angle - parent.angle - node.local_angle();
                angle_difference(normalize_angle(before), normalize_angle(after))
            })
            .collect()
    }

    /// The source's current rotations with [`PullSolver::rotation_differences`] added, in
    /// pre-order. Multi-turn rotation values are kept.
    pub fn next_rotations(&self) -> Vec<f32> {
        let nodes = self.tree.nodes();
        self.tree
            .pre_order(0)
            .zip(self.rotation_differences())
            .map(|(index, diff)| self.source.rotate(nodes[index].bone()) + diff)
            .collect()
    }
}
