use cgmath::{Quaternion, Vector4, Zero};
use nanoem::{
    common::{Buffer, Status, F128},
    motion::{MotionAccessoryKeyframe, MotionKeyframeTypes, MotionOutsideParent},
    mutable::common::MutableBuffer,
};

use crate::{
    accessory::Accessory,
    motion::NanoemMotion,
    motion_keyframe_selection::{KeyframeSelectionSet, MotionKeyframeSelection},
    project::AccessoryHandle,
    utils::{f128_to_quat, f128_to_vec4, quat_to_f128},
};

use super::updater::{CommandMessage, KeyframeUpdater, Updatable};

#[derive(Debug, Clone, PartialEq)]
pub struct AccessoryKeyframeState {
    pub translation: Vector4<f32>,
    pub orientation: Quaternion<f32>,
    pub scale_factor: f32,
    pub opacity: f32,
    pub enable_add_blending: bool,
    pub enable_shadow: bool,
    pub visible: bool,
    /// `(object, bone)` the accessory is parented to.
    pub outside_parent: Option<(String, String)>,
}

impl Default for AccessoryKeyframeState {
    fn default() -> Self {
        Self {
            translation: Vector4::zero(),
            orientation: Quaternion::new(1f32, 0f32, 0f32, 0f32),
            scale_factor: 1f32,
            opacity: 1f32,
            enable_add_blending: false,
            enable_shadow: true,
            visible: true,
            outside_parent: None,
        }
    }
}

impl AccessoryKeyframeState {
    pub fn from_accessory(accessory: &Accessory) -> Self {
        Self {
            translation: accessory.translation().extend(1f32),
            orientation: accessory.orientation(),
            scale_factor: accessory.scale_factor(),
            opacity: accessory.opacity(),
            enable_add_blending: accessory.is_add_blending_enabled(),
            enable_shadow: accessory.is_shadow_enabled(),
            visible: accessory.is_visible(),
            outside_parent: accessory.outside_parent().cloned(),
        }
    }

    pub fn from_keyframe(keyframe: &MotionAccessoryKeyframe) -> Self {
        Self {
            translation: f128_to_vec4(keyframe.translation),
            orientation: f128_to_quat(keyframe.orientation),
            scale_factor: keyframe.scale_factor,
            opacity: keyframe.opacity,
            enable_add_blending: keyframe.is_add_blending_enabled,
            enable_shadow: keyframe.is_shadow_enabled,
            visible: keyframe.visible,
            outside_parent: keyframe
                .outside_parent
                .as_ref()
                .map(|op| (op.target_object_name.clone(), op.target_bone_name.clone())),
        }
    }

    pub fn assign_to(&self, keyframe: &mut MotionAccessoryKeyframe) {
        keyframe.translation = self.translation.into();
        keyframe.orientation = quat_to_f128(self.orientation);
        keyframe.scale_factor = self.scale_factor;
        keyframe.opacity = self.opacity;
        keyframe.is_add_blending_enabled = self.enable_add_blending;
        keyframe.is_shadow_enabled = self.enable_shadow;
        keyframe.visible = self.visible;
        keyframe.outside_parent =
            self.outside_parent
                .as_ref()
                .map(|(object, bone)| MotionOutsideParent {
                    subject_bone_name: String::new(),
                    target_object_name: object.clone(),
                    target_bone_name: bone.clone(),
                });
    }

    pub fn assign_to_accessory(&self, accessory: &mut Accessory) {
        accessory.set_translation(self.translation.truncate());
        accessory.set_orientation(self.orientation);
        accessory.set_scale_factor(self.scale_factor);
        accessory.set_opacity(self.opacity);
        accessory.set_add_blending_enabled(self.enable_add_blending);
        accessory.set_shadow_enabled(self.enable_shadow);
        accessory.set_visible(self.visible);
        accessory.set_outside_parent(self.outside_parent.clone());
    }
}

impl CommandMessage for AccessoryKeyframeState {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_f32_4_little_endian(F128(self.translation.into()))?;
        buffer.write_f32_4_little_endian(F128(quat_to_f128(self.orientation)))?;
        buffer.write_f32_little_endian(self.scale_factor)?;
        buffer.write_f32_little_endian(self.opacity)?;
        buffer.write_bool(self.enable_add_blending)?;
        buffer.write_bool(self.enable_shadow)?;
        buffer.write_bool(self.visible)?;
        buffer.write_bool(self.outside_parent.is_some())?;
        if let Some((object, bone)) = &self.outside_parent {
            object.write_message(buffer)?;
            bone.write_message(buffer)?;
        }
        Ok(())
    }

    fn read_message(buffer: &mut Buffer) -> Result<Self, Status> {
        Ok(Self {
            translation: f128_to_vec4(buffer.read_f32_4_little_endian()?.0),
            orientation: f128_to_quat(buffer.read_f32_4_little_endian()?.0),
            scale_factor: buffer.read_f32_little_endian()?,
            opacity: buffer.read_f32_little_endian()?,
            enable_add_blending: buffer.read_bool()?,
            enable_shadow: buffer.read_bool()?,
            visible: buffer.read_bool()?,
            outside_parent: if buffer.read_bool()? {
                Some((String::read_message(buffer)?, String::read_message(buffer)?))
            } else {
                None
            },
        })
    }
}

impl Updatable for MotionAccessoryKeyframe {
    type State = AccessoryKeyframeState;
    type Track = ();
    type Target = AccessoryHandle;
    type OverrideParameter = ();

    const KEYFRAME_TYPE: MotionKeyframeTypes = MotionKeyframeTypes::ACCESSORY;
    const ALREADY_EXISTS: Status = Status::ErrorMotionAccessoryKeyframeAlreadyExists;
    const NOT_FOUND: Status = Status::ErrorMotionAccessoryKeyframeNotFound;
    const ADD_COMMAND_NAME: &'static str = "AddAccessoryKeyframeCommand";
    const REMOVE_COMMAND_NAME: &'static str = "RemoveAccessoryKeyframeCommand";

    fn create(frame_index: u32) -> Self {
        MotionAccessoryKeyframe::create(frame_index)
    }

    fn frame_index(&self) -> u32 {
        self.base.frame_index
    }

    fn find<'a>(motion: &'a NanoemMotion, _track: &(), frame_index: u32) -> Option<&'a Self> {
        motion.find_accessory_keyframe_object(frame_index)
    }

    fn find_mut<'a>(
        motion: &'a mut NanoemMotion,
        _track: &(),
        frame_index: u32,
    ) -> Option<&'a mut Self> {
        motion.find_mut_accessory_keyframe_object(frame_index)
    }

    fn search_closest<'a>(
        motion: &'a NanoemMotion,
        _track: &(),
        frame_index: u32,
    ) -> (Option<&'a Self>, Option<&'a Self>) {
        motion.search_closest_accessory_keyframes(frame_index)
    }

    fn insert(
        motion: &mut NanoemMotion,
        keyframe: Self,
        _track: &(),
        frame_index: u32,
    ) -> Result<(), Status> {
        motion.add_accessory_keyframe(keyframe, frame_index)
    }

    fn remove(motion: &mut NanoemMotion, _track: &(), frame_index: u32) -> Result<Self, Status> {
        motion.remove_accessory_keyframe(frame_index)
    }

    fn selection_set(selection: &MotionKeyframeSelection) -> &KeyframeSelectionSet<()> {
        &selection.accessory
    }

    fn selection_set_mut(
        selection: &mut MotionKeyframeSelection,
    ) -> &mut KeyframeSelectionSet<()> {
        &mut selection.accessory
    }

    fn capture_state(&self) -> AccessoryKeyframeState {
        AccessoryKeyframeState::from_keyframe(self)
    }

    fn restore_state(&mut self, state: &AccessoryKeyframeState) {
        state.assign_to(self)
    }
}

pub fn build_updater_add(
    motion: &NanoemMotion,
    accessory: &Accessory,
    frame_index: u32,
) -> KeyframeUpdater<MotionAccessoryKeyframe> {
    KeyframeUpdater::adding(
        motion,
        (),
        frame_index,
        AccessoryKeyframeState::from_accessory(accessory),
    )
}

#[test]
fn test_accessory_state_keeps_outside_parent() {
    let mut accessory = Accessory::new("stage.x");
    accessory.set_outside_parent(Some(("model".to_owned(), "右手首".to_owned())));
    accessory.set_opacity(0.5f32);
    let state = AccessoryKeyframeState::from_accessory(&accessory);
    let mut keyframe = MotionAccessoryKeyframe::create(0);
    state.assign_to(&mut keyframe);
    assert_eq!(
        Some("右手首"),
        keyframe
            .outside_parent
            .as_ref()
            .map(|op| op.target_bone_name.as_str())
    );
    assert_eq!(state, AccessoryKeyframeState::from_keyframe(&keyframe));
}
