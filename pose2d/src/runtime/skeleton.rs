use crate::{BoneSource, Error, Hierarchy, SkeletonData};
use glam::Vec2;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Bone {
    data_index: usize,
    parent: Option<usize>,

    /// Setup angle relative to the parent segment, radians.
    pub local_angle: f32,
    /// Pose rotation on top of `local_angle`, radians. May hold several turns.
    pub rotate: f32,

    pub world_x: f32,
    pub world_y: f32,
    pub world_angle: f32,
}

impl Bone {
    pub fn data_index(&self) -> usize {
        self.data_index
    }

    pub fn parent_index(&self) -> Option<usize> {
        self.parent
    }

    pub fn world_position(&self) -> Vec2 {
        Vec2::new(self.world_x, self.world_y)
    }
}

#[derive(Clone, Debug)]
pub struct Skeleton {
    data: Arc<SkeletonData>,
    pub bones: Vec<Bone>,
    bone_children: Vec<Vec<usize>>,
}

impl Skeleton {
    pub fn new(data: Arc<SkeletonData>) -> Self {
        let bones = data
            .bones
            .iter()
            .enumerate()
            .map(|(data_index, bone)| Bone {
                data_index,
                parent: bone.parent,
                local_angle: bone.rotation.to_radians(),
                rotate: 0.0,
                world_x: 0.0,
                world_y: 0.0,
                world_angle: 0.0,
            })
            .collect::<Vec<_>>();

        let bone_children = build_bone_children_indices(&bones);

        let mut skeleton = Self {
            data,
            bones,
            bone_children,
        };
        skeleton.update_world_transform();
        skeleton
    }

    pub fn data(&self) -> &Arc<SkeletonData> {
        &self.data
    }

    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.data.find_bone(name)
    }

    /// Bones without a parent, in data order.
    pub fn top_bones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| bone.parent.is_none())
            .map(|(index, _)| index)
    }

    /// Clears every pose rotation.
    pub fn set_to_setup_pose(&mut self) {
        for bone in &mut self.bones {
            bone.rotate = 0.0;
        }
        self.update_world_transform();
    }

    /// Assigns pose rotations to the tree under `top`, in pre-order, and refreshes world
    /// transforms. Extra values are ignored; missing values leave bones untouched.
    pub fn set_rotations(&mut self, top: usize, rotations: &[f32]) -> Result<(), Error> {
        if !self.contains(top) {
            return Err(Error::UnknownBone { index: top });
        }
        let order = self.pre_order(top).collect::<Vec<_>>();
        for (bone_index, rotate) in order.into_iter().zip(rotations.iter().copied()) {
            self.bones[bone_index].rotate = rotate;
        }
        self.update_world_transform();
        Ok(())
    }

    /// Recomputes world positions and angles. Parents precede children in `bones`, so one
    /// forward sweep is enough.
    pub fn update_world_transform(&mut self) {
        for bone_index in 0..self.bones.len() {
            let data = &self.data.bones[self.bones[bone_index].data_index];
            let parent = self.bones[bone_index]
                .parent
                .map(|parent| (self.bones[parent].world_position(), self.bones[parent].world_angle));

            let bone = &mut self.bones[bone_index];
            match parent {
                Some((parent_position, parent_angle)) => {
                    bone.world_angle = parent_angle + bone.local_angle + bone.rotate;
                    let position =
                        parent_position + Vec2::from_angle(bone.world_angle) * data.length;
                    bone.world_x = position.x;
                    bone.world_y = position.y;
                }
                None => {
                    bone.world_angle = bone.local_angle + bone.rotate;
                    bone.world_x = data.x;
                    bone.world_y = data.y;
                }
            }
        }
    }
}

impl Hierarchy for Skeleton {
    fn len(&self) -> usize {
        self.bones.len()
    }

    fn parent_of(&self, index: usize) -> Option<usize> {
        self.bones.get(index).and_then(|bone| bone.parent)
    }

    fn children_of(&self, index: usize) -> &[usize] {
        self.bone_children
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl BoneSource for Skeleton {
    fn world_position(&self, bone: usize) -> Vec2 {
        self.bones[bone].world_position()
    }

    fn world_angle(&self, bone: usize) -> f32 {
        self.bones[bone].world_angle
    }

    fn local_angle(&self, bone: usize) -> f32 {
        self.bones[bone].local_angle
    }

    fn rotate(&self, bone: usize) -> f32 {
        self.bones[bone].rotate
    }
}

fn build_bone_children_indices(bones: &[Bone]) -> Vec<Vec<usize>> {
    let mut children = vec![Vec::<usize>::new(); bones.len()];
    for (index, bone) in bones.iter().enumerate() {
        if let Some(parent) = bone.parent {
            if parent < children.len() {
                children[parent].push(index);
            }
        }
    }
    children
}
