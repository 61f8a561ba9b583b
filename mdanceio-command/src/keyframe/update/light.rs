use cgmath::Vector4;
use nanoem::{
    common::{Buffer, Status, F128},
    motion::{MotionKeyframeTypes, MotionLightKeyframe},
    mutable::common::MutableBuffer,
};

use crate::{
    light::DirectionalLight,
    motion::NanoemMotion,
    motion_keyframe_selection::{KeyframeSelectionSet, MotionKeyframeSelection},
    utils::f128_to_vec4,
};

use super::updater::{CommandMessage, KeyframeUpdater, Updatable};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightKeyframeState {
    pub color: Vector4<f32>,
    pub direction: Vector4<f32>,
}

impl Default for LightKeyframeState {
    fn default() -> Self {
        Self {
            color: DirectionalLight::INITIAL_COLOR.extend(1f32),
            direction: DirectionalLight::INITIAL_DIRECTION.extend(0f32),
        }
    }
}

impl LightKeyframeState {
    pub fn from_light(light: &DirectionalLight) -> Self {
        Self {
            color: light.color().extend(1f32),
            direction: light.direction().extend(0f32),
        }
    }

    pub fn from_keyframe(keyframe: &MotionLightKeyframe) -> Self {
        Self {
            color: f128_to_vec4(keyframe.color),
            direction: f128_to_vec4(keyframe.direction),
        }
    }

    pub fn assign_to(&self, keyframe: &mut MotionLightKeyframe) {
        keyframe.color = self.color.into();
        keyframe.direction = self.direction.into();
    }

    pub fn assign_to_light(&self, light: &mut DirectionalLight) {
        light.set_color(self.color.truncate());
        light.set_direction(self.direction.truncate());
    }
}

impl CommandMessage for LightKeyframeState {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_f32_4_little_endian(F128(self.color.into()))?;
        buffer.write_f32_4_little_endian(F128(self.direction.into()))
    }

    fn read_message(buffer: &mut Buffer) -> Result<Self, Status> {
        Ok(Self {
            color: f128_to_vec4(buffer.read_f32_4_little_endian()?.0),
            direction: f128_to_vec4(buffer.read_f32_4_little_endian()?.0),
        })
    }
}

impl Updatable for MotionLightKeyframe {
    type State = LightKeyframeState;
    type Track = ();
    type Target = ();
    type OverrideParameter = ();

    const KEYFRAME_TYPE: MotionKeyframeTypes = MotionKeyframeTypes::LIGHT;
    const ALREADY_EXISTS: Status = Status::ErrorMotionLightKeyframeAlreadyExists;
    const NOT_FOUND: Status = Status::ErrorMotionLightKeyframeNotFound;
    const ADD_COMMAND_NAME: &'static str = "AddLightKeyframeCommand";
    const REMOVE_COMMAND_NAME: &'static str = "RemoveLightKeyframeCommand";

    fn create(frame_index: u32) -> Self {
        MotionLightKeyframe::create(frame_index)
    }

    fn frame_index(&self) -> u32 {
        self.base.frame_index
    }

    fn find<'a>(motion: &'a NanoemMotion, _track: &(), frame_index: u32) -> Option<&'a Self> {
        motion.find_light_keyframe_object(frame_index)
    }

    fn find_mut<'a>(
        motion: &'a mut NanoemMotion,
        _track: &(),
        frame_index: u32,
    ) -> Option<&'a mut Self> {
        motion.find_mut_light_keyframe_object(frame_index)
    }

    fn search_closest<'a>(
        motion: &'a NanoemMotion,
        _track: &(),
        frame_index: u32,
    ) -> (Option<&'a Self>, Option<&'a Self>) {
        motion.search_closest_light_keyframes(frame_index)
    }

    fn insert(
        motion: &mut NanoemMotion,
        keyframe: Self,
        _track: &(),
        frame_index: u32,
    ) -> Result<(), Status> {
        motion.add_light_keyframe(keyframe, frame_index)
    }

    fn remove(motion: &mut NanoemMotion, _track: &(), frame_index: u32) -> Result<Self, Status> {
        motion.remove_light_keyframe(frame_index)
    }

    fn selection_set(selection: &MotionKeyframeSelection) -> &KeyframeSelectionSet<()> {
        &selection.light
    }

    fn selection_set_mut(
        selection: &mut MotionKeyframeSelection,
    ) -> &mut KeyframeSelectionSet<()> {
        &mut selection.light
    }

    fn capture_state(&self) -> LightKeyframeState {
        LightKeyframeState::from_keyframe(self)
    }

    fn restore_state(&mut self, state: &LightKeyframeState) {
        state.assign_to(self)
    }
}

pub fn build_updater_add(
    motion: &NanoemMotion,
    light: &DirectionalLight,
    frame_index: u32,
) -> KeyframeUpdater<MotionLightKeyframe> {
    KeyframeUpdater::adding(motion, (), frame_index, LightKeyframeState::from_light(light))
}

#[test]
fn test_light_state_keeps_direction_of_keyframe() {
    let mut keyframe = MotionLightKeyframe::create(0);
    keyframe.direction = [0f32, -1f32, 0f32, 0f32];
    let state = LightKeyframeState::from_keyframe(&keyframe);
    let mut light = DirectionalLight::new();
    state.assign_to_light(&mut light);
    assert_eq!(cgmath::Vector3::new(0f32, -1f32, 0f32), light.direction());
    assert_eq!(state, LightKeyframeState::from_light(&light));
}
