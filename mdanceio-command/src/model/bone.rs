use std::collections::HashMap;

use cgmath::{One, Quaternion, Vector3, Vector4, Zero};

use crate::keyframe::update::BoneKeyframeBezierControlPointParameter;

use super::BoneIndex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoneStates {
    pub dirty: bool,
    pub editing_masked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub canonical_name: String,
    pub handle: BoneIndex,
    pub local_user_orientation: Quaternion<f32>,
    pub local_user_translation: Vector3<f32>,
    pub bezier_control_points: BoneKeyframeBezierControlPointParameter,
    pub states: BoneStates,
    movable: bool,
}

impl Bone {
    pub const DEFAULT_BEZIER_CONTROL_POINT: Vector4<u8> = Vector4::new(20, 20, 107, 107);

    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            canonical_name: name.to_owned(),
            handle: 0,
            local_user_orientation: Quaternion::one(),
            local_user_translation: Vector3::zero(),
            bezier_control_points: BoneKeyframeBezierControlPointParameter::default(),
            states: BoneStates::default(),
            movable: true,
        }
    }

    /// A bone that only rotates; its translation curves are never adjusted.
    pub fn new_rotatable(name: &str) -> Self {
        Self {
            movable: false,
            ..Self::new(name)
        }
    }

    pub fn is_movable(&self) -> bool {
        self.movable
    }
}

#[derive(Debug, Clone, Default)]
pub struct BoneSet {
    bones: Vec<Bone>,
    bones_by_name: HashMap<String, BoneIndex>,
}

impl BoneSet {
    pub fn new(bones: Vec<Bone>) -> Self {
        let mut set = Self::default();
        for bone in bones {
            set.push(bone);
        }
        set
    }

    /// Appends `bone` and returns its index. The bone is also reachable by its canonical name.
    pub fn push(&mut self, mut bone: Bone) -> BoneIndex {
        let handle = self.bones.len();
        bone.handle = handle;
        self.bones_by_name.insert(bone.name.clone(), handle);
        self.bones_by_name
            .entry(bone.canonical_name.clone())
            .or_insert(handle);
        self.bones.push(bone);
        handle
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn get_mut(&mut self, bone: BoneIndex) -> Option<&mut Bone> {
        self.bones.get_mut(bone)
    }

    pub fn find(&self, name: &str) -> Option<&Bone> {
        self.bones_by_name
            .get(name)
            .and_then(|idx| self.bones.get(*idx))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Bone> {
        self.bones_by_name
            .get(name)
            .and_then(|idx| self.bones.get_mut(*idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Bone> {
        self.bones.iter_mut()
    }

    pub fn has_any_dirty_bone(&self) -> bool {
        self.bones.iter().any(|bone| bone.states.dirty)
    }
}

#[test]
fn test_bone_set_lookup() {
    let mut bones = BoneSet::new(vec![Bone::new("全ての親"), Bone::new_rotatable("首")]);
    assert_eq!(2, bones.len());
    assert_eq!(Some(1), bones.find("首").map(|bone| bone.handle));
    assert_eq!(Some(false), bones.find("首").map(Bone::is_movable));
    if let Some(bone) = bones.find_mut("全ての親") {
        bone.states.dirty = true;
    }
    assert!(bones.has_any_dirty_bone());
    assert!(bones.find("センター").is_none());
}
