use crate::{BoneSource, Error, PullSolver, SolverConfig};
use glam::{Affine2, Vec2};

/// Receiver of the rotations produced by a drag, usually an undo stack.
///
/// Rotations cover the whole tree under `top`, in pre-order.
pub trait PoseCommitter {
    /// Handle to an edit that later drag increments may merge into.
    type Edit;

    /// Records a new edit.
    fn push(&mut self, top: usize, rotations: &[f32]) -> Self::Edit;

    /// Replaces the values of an earlier edit. Returns `false` when that edit can no longer
    /// be changed, in which case a new one is pushed.
    fn modify(&mut self, edit: &Self::Edit, rotations: &[f32]) -> bool;
}

/// State of one press-drag-release gesture on a bone.
#[derive(Clone, Debug)]
pub struct DragSession<E> {
    bone: usize,
    to_local: Affine2,
    grab_point: Vec2,
    grab_offset: Vec2,
    pull_pos: f32,
    edit: Option<E>,
}

impl<E> DragSession<E> {
    /// Grabs `bone` at `cursor`. `to_local` maps cursor coordinates into skeleton space.
    ///
    /// The grab point is the cursor projected onto the segment from the parent to `bone`.
    /// Bones without a parent have no segment and cannot be grabbed.
    pub fn begin<S: BoneSource + ?Sized>(
        source: &S,
        bone: usize,
        cursor: Vec2,
        to_local: Affine2,
    ) -> Option<Self> {
        if !source.contains(bone) {
            return None;
        }
        let parent = source.parent_of(bone)?;

        let start = source.world_position(parent);
        let segment = source.world_position(bone) - start;
        let local = to_local.transform_point2(cursor);

        let length_sq = segment.length_squared();
        let pull_pos = if length_sq > 0.0 {
            ((local - start).dot(segment) / length_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let grab_point = start + segment * pull_pos;

        log::debug!("drag begin: bone {bone} at {pull_pos:.3} along its segment");
        Some(Self {
            bone,
            to_local,
            grab_point,
            grab_offset: local - grab_point,
            pull_pos,
            edit: None,
        })
    }

    pub fn bone(&self) -> usize {
        self.bone
    }

    /// Where the drag acts along the segment: 0 at the parent, 1 at the bone.
    pub fn pull_pos(&self) -> f32 {
        self.pull_pos
    }

    /// Current grab point in skeleton space.
    pub fn grab_point(&self) -> Vec2 {
        self.grab_point
    }

    pub fn edit(&self) -> Option<&E> {
        self.edit.as_ref()
    }

    /// Follows the cursor to `cursor`: solves the pull since the last update on a fresh
    /// snapshot of `source` and hands the new rotations to `committer`.
    ///
    /// The caller applies committed rotations to `source` before the next increment.
    pub fn drag<S, C>(
        &mut self,
        source: &S,
        cursor: Vec2,
        config: SolverConfig,
        committer: &mut C,
    ) -> Result<Vec<f32>, Error>
    where
        S: BoneSource + ?Sized,
        C: PoseCommitter<Edit = E>,
    {
        let local = self.to_local.transform_point2(cursor);
        let next = local - self.grab_offset;
        let pull = next - self.grab_point;
        self.grab_point = next;

        let mut solver = PullSolver::new(source, self.bone, config)?;
        solver.pull(self.bone, pull, self.pull_pos);
        let rotations = solver.next_rotations();

        let top = solver.top_bone();
        if let Some(edit) = &self.edit {
            if committer.modify(edit, &rotations) {
                log::trace!("drag: merged {} rotations into current edit", rotations.len());
                return Ok(rotations);
            }
        }
        log::debug!("drag: new edit for the tree under bone {top}");
        self.edit = Some(committer.push(top, &rotations));
        Ok(rotations)
    }

    /// Releases the bone, returning the last edit made by this gesture.
    pub fn end(self) -> Option<E> {
        self.edit
    }
}
