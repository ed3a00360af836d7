use crate::{
    BoneData, BoneSource, DragSession, PoseCommitter, Skeleton, SkeletonData, SolverConfig,
};
use glam::{Affine2, Vec2};
use std::sync::Arc;

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-4,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

fn upright_chain() -> Skeleton {
    Skeleton::new(Arc::new(
        SkeletonData::new(vec![
            BoneData::root("anchor", 0.0, 0.0, 90.0),
            BoneData::child("upper", 0, 10.0, 0.0),
            BoneData::child("middle", 1, 10.0, 0.0),
            BoneData::child("tip", 2, 10.0, 0.0),
        ])
        .unwrap(),
    ))
}

/// Undo stack stand-in that can refuse merges.
#[derive(Default)]
struct History {
    edits: Vec<(usize, Vec<f32>)>,
    sealed: bool,
}

impl PoseCommitter for History {
    type Edit = usize;

    fn push(&mut self, top: usize, rotations: &[f32]) -> usize {
        self.edits.push((top, rotations.to_vec()));
        self.edits.len() - 1
    }

    fn modify(&mut self, edit: &usize, rotations: &[f32]) -> bool {
        if self.sealed {
            return false;
        }
        self.edits[*edit].1 = rotations.to_vec();
        true
    }
}

#[test]
fn begin_needs_a_bone_with_a_segment() {
    let skeleton = upright_chain();
    let cursor = Vec2::new(0.0, 0.0);
    assert!(DragSession::<usize>::begin(&skeleton, 0, cursor, Affine2::IDENTITY).is_none());
    assert!(DragSession::<usize>::begin(&skeleton, 12, cursor, Affine2::IDENTITY).is_none());
    assert!(DragSession::<usize>::begin(&skeleton, 1, cursor, Affine2::IDENTITY).is_some());
}

#[test]
fn begin_projects_cursor_onto_segment() {
    let skeleton = upright_chain();

    let session =
        DragSession::<usize>::begin(&skeleton, 3, Vec2::new(2.0, 27.5), Affine2::IDENTITY)
            .unwrap();
    assert_eq!(session.bone(), 3);
    assert_approx(session.pull_pos(), 0.75);
    assert_approx(session.grab_point().x, 0.0);
    assert_approx(session.grab_point().y, 27.5);
    assert!(session.edit().is_none());

    let past_tail =
        DragSession::<usize>::begin(&skeleton, 3, Vec2::new(0.0, 40.0), Affine2::IDENTITY)
            .unwrap();
    assert_approx(past_tail.pull_pos(), 1.0);

    let before_root =
        DragSession::<usize>::begin(&skeleton, 3, Vec2::new(0.0, 5.0), Affine2::IDENTITY)
            .unwrap();
    assert_approx(before_root.pull_pos(), 0.0);
}

#[test]
fn begin_maps_cursor_into_skeleton_space() {
    let skeleton = upright_chain();
    let to_local = Affine2::from_translation(Vec2::new(-100.0, 0.0));
    let session =
        DragSession::<usize>::begin(&skeleton, 2, Vec2::new(100.0, 15.0), to_local).unwrap();
    assert_approx(session.pull_pos(), 0.5);
    assert_approx(session.grab_point().x, 0.0);
}

#[test]
fn drag_increments_merge_into_one_edit() {
    let mut skeleton = upright_chain();
    let mut history = History::default();
    let config = SolverConfig::default();

    let mut session =
        DragSession::begin(&skeleton, 3, Vec2::new(0.0, 30.0), Affine2::IDENTITY).unwrap();

    let first = session
        .drag(&skeleton, Vec2::new(1.0, 30.0), config, &mut history)
        .unwrap();
    assert_eq!(history.edits.len(), 1);
    assert_eq!(history.edits[0].0, 0);
    assert_eq!(history.edits[0].1, first);
    assert_eq!(first.len(), 4);
    assert_eq!(session.edit(), Some(&0));

    skeleton.set_rotations(0, &first).unwrap();
    let tip_after_first = skeleton.world_position(3);
    assert!(tip_after_first.x > 0.9, "tip at {tip_after_first}");
    assert!(first[3] < 0.0);

    let second = session
        .drag(&skeleton, Vec2::new(2.0, 30.0), config, &mut history)
        .unwrap();
    assert_eq!(history.edits.len(), 1);
    assert_eq!(history.edits[0].1, second);
    assert!(second[3] < first[3]);

    skeleton.set_rotations(0, &second).unwrap();
    assert!(skeleton.world_position(3).x > tip_after_first.x + 0.5);

    history.sealed = true;
    let third = session
        .drag(&skeleton, Vec2::new(2.5, 30.0), config, &mut history)
        .unwrap();
    assert_eq!(history.edits.len(), 2);
    assert_eq!(history.edits[1].1, third);
    assert_eq!(session.end(), Some(1));
}
