//! Skeleton descriptions in JSON.
//!
//! ```json
//! { "bones": [
//!     { "name": "hip", "x": 0, "y": 0, "rotation": 90 },
//!     { "name": "thigh", "parent": "hip", "length": 10 }
//! ] }
//! ```
//!
//! Rotations are degrees. Parents must be listed before their children.

use crate::{BoneData, Error, SkeletonData};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct Root {
    #[serde(default)]
    bones: Vec<BoneDef>,
}

#[derive(Debug, Deserialize)]
struct BoneDef {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    length: f32,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    rotation: f32,
}

impl SkeletonData {
    pub fn from_json_str(input: &str) -> Result<Arc<Self>, Error> {
        let root: Root = serde_json::from_str(input).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })?;

        let mut bones = Vec::with_capacity(root.bones.len());
        let mut bone_index = HashMap::<String, usize>::new();
        for bone in root.bones {
            let parent = match bone.parent.as_deref() {
                None => None,
                Some(parent_name) => {
                    Some(bone_index.get(parent_name).copied().ok_or_else(|| {
                        Error::JsonUnknownBoneParent {
                            bone: bone.name.clone(),
                            parent: parent_name.to_string(),
                        }
                    })?)
                }
            };
            bone_index.insert(bone.name.clone(), bones.len());
            bones.push(BoneData {
                name: bone.name,
                parent,
                length: bone.length,
                x: bone.x,
                y: bone.y,
                rotation: bone.rotation,
            });
        }

        Ok(Arc::new(Self::new(bones)?))
    }
}
