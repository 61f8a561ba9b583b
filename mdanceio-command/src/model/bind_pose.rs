use cgmath::{Quaternion, Vector3};
use nanoem::{
    common::{Buffer, Status, F128},
    mutable::common::MutableBuffer,
};

use crate::{
    keyframe::update::{BoneKeyframeBezierControlPointParameter, CommandMessage},
    utils::{f128_to_quat, quat_to_f128},
};

use super::{Bone, BoneSet};

/// User transform of one bone as stored in a [`BindPose`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindPoseParameter {
    pub local_user_translation: Vector3<f32>,
    pub local_user_orientation: Quaternion<f32>,
    pub bezier_control_points: BoneKeyframeBezierControlPointParameter,
}

impl BindPoseParameter {
    pub fn save(bone: &Bone) -> Self {
        Self {
            local_user_translation: bone.local_user_translation,
            local_user_orientation: bone.local_user_orientation,
            bezier_control_points: bone.bezier_control_points,
        }
    }

    pub fn restore(&self, bone: &mut Bone) {
        bone.local_user_translation = self.local_user_translation;
        bone.local_user_orientation = self.local_user_orientation;
        bone.bezier_control_points = self.bezier_control_points;
    }
}

impl CommandMessage for BindPoseParameter {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_f32_3_little_endian(F128(self.local_user_translation.extend(0f32).into()))?;
        buffer.write_f32_4_little_endian(F128(quat_to_f128(self.local_user_orientation)))?;
        self.bezier_control_points.write_message(buffer)
    }

    fn read_message(buffer: &mut Buffer) -> Result<Self, Status> {
        let translation = buffer.read_f32_3_little_endian()?.0;
        Ok(Self {
            local_user_translation: Vector3::new(translation[0], translation[1], translation[2]),
            local_user_orientation: f128_to_quat(buffer.read_f32_4_little_endian()?.0),
            bezier_control_points: BoneKeyframeBezierControlPointParameter::read_message(buffer)?,
        })
    }
}

/// User transforms of every bone of a model, in bone order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindPose {
    parameters: Vec<BindPoseParameter>,
}

impl BindPose {
    pub fn save(bones: &BoneSet) -> Self {
        Self {
            parameters: bones.iter().map(BindPoseParameter::save).collect(),
        }
    }

    /// Writes the pose back. Bones beyond the saved ones are left alone.
    pub fn restore(&self, bones: &mut BoneSet) {
        for (parameter, bone) in self.parameters.iter().zip(bones.iter_mut()) {
            parameter.restore(bone);
        }
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut BindPoseParameter> {
        self.parameters.get_mut(index)
    }
}

impl CommandMessage for BindPose {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_u32_little_endian(self.parameters.len() as u32)?;
        for parameter in &self.parameters {
            parameter.write_message(buffer)?;
        }
        Ok(())
    }

    fn read_message(buffer: &mut Buffer) -> Result<Self, Status> {
        let num_parameters = buffer.read_len()?;
        let mut parameters = Vec::with_capacity(num_parameters);
        for _ in 0..num_parameters {
            parameters.push(BindPoseParameter::read_message(buffer)?);
        }
        Ok(Self { parameters })
    }
}

#[test]
fn test_restore_bind_pose() {
    use cgmath::{Deg, Rotation3};

    let mut bones = BoneSet::new(vec![Bone::new("センター"), Bone::new("首")]);
    let pose = BindPose::save(&bones);
    if let Some(bone) = bones.find_mut("首") {
        bone.local_user_orientation = Quaternion::from_angle_x(Deg(45f32));
        bone.local_user_translation = Vector3::new(0f32, 1f32, 0f32);
    }
    assert_ne!(pose, BindPose::save(&bones));
    pose.restore(&mut bones);
    assert_eq!(pose, BindPose::save(&bones));
}
