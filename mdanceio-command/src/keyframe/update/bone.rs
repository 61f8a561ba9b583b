use cgmath::{Quaternion, Vector3, Vector4, Zero};
use nanoem::{
    common::{Buffer, Status, F128},
    motion::{MotionBoneKeyframe, MotionBoneKeyframeInterpolation, MotionKeyframeTypes},
    mutable::common::MutableBuffer,
};

use crate::{
    model::Bone,
    motion::{KeyframeBound, NanoemMotion},
    motion_keyframe_selection::{KeyframeSelectionSet, MotionKeyframeSelection},
    project::{ModelHandle, Project},
    utils::{f128_to_quat, f128_to_vec4, quat_to_f128},
};

use super::updater::{
    split_bezier_channels, BezierCurveOverride, CommandMessage, KeyframeUpdater, Updatable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoneKeyframeBezierControlPointParameter {
    pub translation: Vector3<Vector4<u8>>,
    pub orientation: Vector4<u8>,
}

impl Default for BoneKeyframeBezierControlPointParameter {
    fn default() -> Self {
        Self::from_channels([Bone::DEFAULT_BEZIER_CONTROL_POINT; 4])
    }
}

impl BoneKeyframeBezierControlPointParameter {
    /// Channels in keyframe order: translation x, y, z, then orientation.
    pub fn channels(&self) -> [Vector4<u8>; 4] {
        [
            self.translation.x,
            self.translation.y,
            self.translation.z,
            self.orientation,
        ]
    }

    pub fn from_channels(channels: [Vector4<u8>; 4]) -> Self {
        Self {
            translation: Vector3::new(channels[0], channels[1], channels[2]),
            orientation: channels[3],
        }
    }

    pub fn from_interpolation(interpolation: &MotionBoneKeyframeInterpolation) -> Self {
        Self::from_channels([
            interpolation.translation_x.into(),
            interpolation.translation_y.into(),
            interpolation.translation_z.into(),
            interpolation.orientation.into(),
        ])
    }

    pub fn assign_to(&self, interpolation: &mut MotionBoneKeyframeInterpolation) {
        interpolation.translation_x = self.translation.x.into();
        interpolation.translation_y = self.translation.y.into();
        interpolation.translation_z = self.translation.z.into();
        interpolation.orientation = self.orientation.into();
    }
}

impl CommandMessage for BoneKeyframeBezierControlPointParameter {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        for channel in self.channels() {
            channel.write_message(buffer)?;
        }
        Ok(())
    }

    fn read_message(buffer: &mut Buffer) -> Result<Self, Status> {
        Ok(Self::from_channels([
            Vector4::read_message(buffer)?,
            Vector4::read_message(buffer)?,
            Vector4::read_message(buffer)?,
            Vector4::read_message(buffer)?,
        ]))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoneKeyframeState {
    pub translation: Vector4<f32>,
    pub orientation: Quaternion<f32>,
    pub stage_index: u32,
    pub bezier_param: BoneKeyframeBezierControlPointParameter,
    pub enable_physics_simulation: bool,
}

impl Default for BoneKeyframeState {
    fn default() -> Self {
        Self {
            translation: Vector4::zero(),
            orientation: Quaternion::new(1f32, 0f32, 0f32, 0f32),
            stage_index: 0,
            bezier_param: BoneKeyframeBezierControlPointParameter::default(),
            enable_physics_simulation: true,
        }
    }
}

impl BoneKeyframeState {
    pub fn from_bone(bone: &Bone, enable_physics_simulation: bool) -> Self {
        Self {
            translation: bone.local_user_translation.extend(1f32),
            orientation: bone.local_user_orientation,
            stage_index: 0,
            bezier_param: bone.bezier_control_points,
            enable_physics_simulation,
        }
    }

    pub fn from_keyframe(keyframe: &MotionBoneKeyframe) -> Self {
        Self {
            translation: f128_to_vec4(keyframe.translation),
            orientation: f128_to_quat(keyframe.orientation),
            stage_index: keyframe.stage_index,
            bezier_param: BoneKeyframeBezierControlPointParameter::from_interpolation(
                &keyframe.interpolation,
            ),
            enable_physics_simulation: keyframe.is_physics_simulation_enabled,
        }
    }

    pub fn assign_to(&self, keyframe: &mut MotionBoneKeyframe) {
        keyframe.translation = self.translation.into();
        keyframe.orientation = quat_to_f128(self.orientation);
        keyframe.stage_index = self.stage_index;
        keyframe.is_physics_simulation_enabled = self.enable_physics_simulation;
        self.bezier_param.assign_to(&mut keyframe.interpolation);
    }
}

impl CommandMessage for BoneKeyframeState {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_f32_4_little_endian(F128(self.translation.into()))?;
        buffer.write_f32_4_little_endian(F128(quat_to_f128(self.orientation)))?;
        buffer.write_u32_little_endian(self.stage_index)?;
        self.bezier_param.write_message(buffer)?;
        buffer.write_bool(self.enable_physics_simulation)
    }

    fn read_message(buffer: &mut Buffer) -> Result<Self, Status> {
        Ok(Self {
            translation: f128_to_vec4(buffer.read_f32_4_little_endian()?.0),
            orientation: f128_to_quat(buffer.read_f32_4_little_endian()?.0),
            stage_index: buffer.read_u32_little_endian()?,
            bezier_param: BoneKeyframeBezierControlPointParameter::read_message(buffer)?,
            enable_physics_simulation: buffer.read_bool()?,
        })
    }
}

impl Updatable for MotionBoneKeyframe {
    type State = BoneKeyframeState;
    type Track = String;
    type Target = ModelHandle;
    type OverrideParameter = BoneKeyframeBezierControlPointParameter;

    const KEYFRAME_TYPE: MotionKeyframeTypes = MotionKeyframeTypes::BONE;
    const ALREADY_EXISTS: Status = Status::ErrorMotionBoneKeyframeAlreadyExists;
    const NOT_FOUND: Status = Status::ErrorMotionBoneKeyframeNotFound;
    const ADD_COMMAND_NAME: &'static str = "AddBoneKeyframeCommand";
    const REMOVE_COMMAND_NAME: &'static str = "RemoveBoneKeyframeCommand";

    fn create(frame_index: u32) -> Self {
        MotionBoneKeyframe::create(frame_index)
    }

    fn frame_index(&self) -> u32 {
        self.base.frame_index
    }

    fn find<'a>(motion: &'a NanoemMotion, track: &String, frame_index: u32) -> Option<&'a Self> {
        motion.find_bone_keyframe_object(track, frame_index)
    }

    fn find_mut<'a>(
        motion: &'a mut NanoemMotion,
        track: &String,
        frame_index: u32,
    ) -> Option<&'a mut Self> {
        motion.find_mut_bone_keyframe_object(track, frame_index)
    }

    fn search_closest<'a>(
        motion: &'a NanoemMotion,
        track: &String,
        frame_index: u32,
    ) -> (Option<&'a Self>, Option<&'a Self>) {
        motion.search_closest_bone_keyframes(track, frame_index)
    }

    fn insert(
        motion: &mut NanoemMotion,
        keyframe: Self,
        track: &String,
        frame_index: u32,
    ) -> Result<(), Status> {
        motion.add_bone_keyframe(keyframe, track, frame_index)
    }

    fn remove(motion: &mut NanoemMotion, track: &String, frame_index: u32) -> Result<Self, Status> {
        motion.remove_bone_keyframe(track, frame_index)
    }

    fn selection_set(selection: &MotionKeyframeSelection) -> &KeyframeSelectionSet<String> {
        &selection.bone
    }

    fn selection_set_mut(
        selection: &mut MotionKeyframeSelection,
    ) -> &mut KeyframeSelectionSet<String> {
        &mut selection.bone
    }

    fn capture_state(&self) -> BoneKeyframeState {
        BoneKeyframeState::from_keyframe(self)
    }

    fn restore_state(&mut self, state: &BoneKeyframeState) {
        state.assign_to(self)
    }

    fn apply_override(&mut self, parameter: &BoneKeyframeBezierControlPointParameter) {
        parameter.assign_to(&mut self.interpolation)
    }

    fn after_add(
        project: &mut Project,
        target: ModelHandle,
        updaters: &mut [KeyframeUpdater<Self>],
    ) {
        if let Some(model) = project.find_model_mut(target) {
            for updater in updaters {
                if let Some(bone) = model.bones.find_mut(&updater.track) {
                    if bone.states.dirty {
                        updater.was_dirty = true;
                        bone.states.dirty = false;
                    }
                }
            }
        }
    }

    fn after_remove(project: &mut Project, target: ModelHandle, updaters: &[KeyframeUpdater<Self>]) {
        if let Some(model) = project.find_model_mut(target) {
            for updater in updaters.iter().filter(|updater| updater.was_dirty) {
                if let Some(bone) = model.bones.find_mut(&updater.track) {
                    bone.states.dirty = true;
                }
            }
        }
    }
}

/// Builds the updater registering the live pose of `bone` at `frame_index`.
///
/// When the new keyframe lands between two existing ones, the curve of the previous keyframe
/// is split so the motion keeps its shape.
pub fn build_updater_add(
    motion: &NanoemMotion,
    bone: &Bone,
    frame_index: u32,
    enable_bezier_curve_adjustment: bool,
    enable_physics_simulation: bool,
) -> KeyframeUpdater<MotionBoneKeyframe> {
    let state = BoneKeyframeState::from_bone(bone, enable_physics_simulation);
    let mut updater = KeyframeUpdater::adding(motion, bone.name.clone(), frame_index, state);
    if updater.updated() {
        return updater;
    }
    let bound = updater.bound(motion);
    if let Some(previous) = bound
        .previous
        .and_then(|previous| MotionBoneKeyframe::find(motion, &bone.name, previous))
    {
        updater.bezier_curve_override = Some(override_interpolation(
            previous,
            &mut updater.after_state.bezier_param,
            &bound,
            enable_bezier_curve_adjustment,
            bone.is_movable(),
        ));
    }
    updater
}

fn override_interpolation(
    previous: &MotionBoneKeyframe,
    incoming: &mut BoneKeyframeBezierControlPointParameter,
    bound: &KeyframeBound,
    enable_bezier_curve_adjustment: bool,
    movable: bool,
) -> BezierCurveOverride<BoneKeyframeBezierControlPointParameter> {
    let before = BoneKeyframeBezierControlPointParameter::from_interpolation(&previous.interpolation);
    let translation = enable_bezier_curve_adjustment && movable;
    let mut channels = incoming.channels();
    let after = split_bezier_channels(
        before.channels(),
        &mut channels,
        bound,
        [
            translation,
            translation,
            translation,
            enable_bezier_curve_adjustment,
        ],
    );
    *incoming = BoneKeyframeBezierControlPointParameter::from_channels(channels);
    BezierCurveOverride {
        target_frame_index: previous.base.frame_index,
        after: BoneKeyframeBezierControlPointParameter::from_channels(after),
        before,
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Quaternion, Vector3, Vector4};
    use nanoem::{
        common::Buffer,
        motion::{MotionBoneKeyframe, DEFAULT_INTERPOLATION},
        mutable::common::MutableBuffer,
    };

    use crate::{keyframe::update::updater::CommandMessage, model::Bone, motion::NanoemMotion};

    use super::{build_updater_add, BoneKeyframeState};

    #[test]
    fn test_state_round_trip_through_keyframe() {
        let mut keyframe = MotionBoneKeyframe::create(10);
        keyframe.translation = [1f32, 2f32, 3f32, 0f32];
        keyframe.interpolation.orientation = [64, 0, 64, 127];
        keyframe.stage_index = 2;
        let state = BoneKeyframeState::from_keyframe(&keyframe);
        let mut restored = MotionBoneKeyframe::create(10);
        state.assign_to(&mut restored);
        assert_eq!(keyframe, restored);
    }

    #[test]
    fn test_state_message() {
        let state = BoneKeyframeState {
            translation: Vector4::new(1f32, 2f32, 3f32, 1f32),
            orientation: Quaternion::new(0.5f32, 0.5f32, 0.5f32, 0.5f32),
            stage_index: 3,
            bezier_param: Default::default(),
            enable_physics_simulation: false,
        };
        let mut buffer = MutableBuffer::create().unwrap();
        state.write_message(&mut buffer).unwrap();
        let mut buffer = Buffer::create(buffer.into_bytes());
        assert_eq!(state, BoneKeyframeState::read_message(&mut buffer).unwrap());
        assert!(buffer.is_end());
    }

    #[test]
    fn test_build_updater_splits_previous_curve() {
        let mut motion = NanoemMotion::empty();
        let mut previous = MotionBoneKeyframe::create(0);
        previous.interpolation.translation_x = [64, 0, 64, 127];
        motion.add_bone_keyframe(previous, "センター", 0).unwrap();
        motion
            .add_bone_keyframe(MotionBoneKeyframe::create(100), "センター", 100)
            .unwrap();
        let mut bone = Bone::new("センター");
        bone.local_user_translation = Vector3::new(1f32, 0f32, 0f32);
        let updater = build_updater_add(&motion, &bone, 50, true, true);
        assert!(!updater.updated());
        assert!(updater.selected());
        let bezier_curve_override = updater.bezier_curve_override.unwrap();
        assert_eq!(0, bezier_curve_override.target_frame_index);
        assert_eq!(
            Vector4::from([64, 0, 64, 127]),
            bezier_curve_override.before.translation.x
        );
        assert_ne!(
            bezier_curve_override.before.translation.x,
            bezier_curve_override.after.translation.x
        );
        assert_eq!(
            Vector4::from(DEFAULT_INTERPOLATION),
            updater.after_state.bezier_param.translation.y
        );
    }

    #[test]
    fn test_build_updater_on_existing_keyframe() {
        let mut motion = NanoemMotion::empty();
        motion
            .add_bone_keyframe(MotionBoneKeyframe::create(5), "センター", 5)
            .unwrap();
        let updater = build_updater_add(&motion, &Bone::new("センター"), 5, true, true);
        assert!(updater.updated());
        assert!(!updater.selected());
        assert!(updater.bezier_curve_override.is_none());
    }
}
