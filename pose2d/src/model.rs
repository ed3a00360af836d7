use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct BoneData {
    pub name: String,
    pub parent: Option<usize>,
    /// Distance from the parent's world position. Ignored for top bones.
    pub length: f32,
    /// World position of a top bone. Ignored for bones with a parent.
    pub x: f32,
    pub y: f32,
    /// Setup angle relative to the parent segment, in degrees.
    pub rotation: f32,
}

impl BoneData {
    pub fn root(name: impl Into<String>, x: f32, y: f32, rotation: f32) -> Self {
        Self {
            name: name.into(),
            parent: None,
            length: 0.0,
            x,
            y,
            rotation,
        }
    }

    pub fn child(name: impl Into<String>, parent: usize, length: f32, rotation: f32) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent),
            length,
            x: 0.0,
            y: 0.0,
            rotation,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SkeletonData {
    /// Parents always precede their children.
    pub bones: Vec<BoneData>,
    pub(crate) bone_index: HashMap<String, usize>,
}

impl SkeletonData {
    /// Builds skeleton data from bones listed parent-first.
    pub fn new(bones: Vec<BoneData>) -> Result<Self, crate::Error> {
        let mut bone_index = HashMap::with_capacity(bones.len());
        for (index, bone) in bones.iter().enumerate() {
            if let Some(parent) = bone.parent {
                if parent >= index {
                    return Err(crate::Error::InvalidValue {
                        message: format!(
                            "bone '{}' references parent {parent} which is not listed before it",
                            bone.name
                        ),
                    });
                }
            }
            if !bone.length.is_finite() || bone.length < 0.0 {
                return Err(crate::Error::InvalidValue {
                    message: format!("bone '{}' has invalid length {}", bone.name, bone.length),
                });
            }
            bone_index.insert(bone.name.clone(), index);
        }
        Ok(Self { bones, bone_index })
    }

    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bone_index.get(name).copied()
    }
}
