use nanoem::{
    common::{Buffer, Status},
    motion::{MotionKeyframeTypes, MotionSelfShadowKeyframe},
    mutable::common::MutableBuffer,
};

use crate::{
    motion::NanoemMotion,
    motion_keyframe_selection::{KeyframeSelectionSet, MotionKeyframeSelection},
    shadow_camera::{CoverageMode, ShadowCamera},
};

use super::updater::{CommandMessage, KeyframeUpdater, Updatable};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfShadowKeyframeState {
    /// Distance as the shadow camera sees it; keyframes store it negated.
    pub distance: f32,
    pub mode: CoverageMode,
}

impl Default for SelfShadowKeyframeState {
    fn default() -> Self {
        Self {
            distance: ShadowCamera::INITIAL_DISTANCE,
            mode: CoverageMode::Type1,
        }
    }
}

impl SelfShadowKeyframeState {
    pub fn from_shadow_camera(shadow_camera: &ShadowCamera) -> Self {
        Self {
            distance: shadow_camera.distance(),
            mode: shadow_camera.coverage_mode(),
        }
    }

    pub fn from_keyframe(keyframe: &MotionSelfShadowKeyframe) -> Self {
        Self {
            distance: -keyframe.distance,
            mode: CoverageMode::from(keyframe.mode as u32),
        }
    }

    pub fn assign_to(&self, keyframe: &mut MotionSelfShadowKeyframe) {
        keyframe.distance = -self.distance;
        keyframe.mode = u32::from(self.mode) as i32;
    }
}

impl CommandMessage for SelfShadowKeyframeState {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_f32_little_endian(self.distance)?;
        buffer.write_u32_little_endian(self.mode.into())
    }

    fn read_message(buffer: &mut Buffer) -> Result<Self, Status> {
        Ok(Self {
            distance: buffer.read_f32_little_endian()?,
            mode: CoverageMode::from(buffer.read_u32_little_endian()?),
        })
    }
}

impl Updatable for MotionSelfShadowKeyframe {
    type State = SelfShadowKeyframeState;
    type Track = ();
    type Target = ();
    type OverrideParameter = ();

    const KEYFRAME_TYPE: MotionKeyframeTypes = MotionKeyframeTypes::SELF_SHADOW;
    const ALREADY_EXISTS: Status = Status::ErrorMotionSelfShadowKeyframeAlreadyExists;
    const NOT_FOUND: Status = Status::ErrorMotionSelfShadowKeyframeNotFound;
    const ADD_COMMAND_NAME: &'static str = "AddSelfShadowKeyframeCommand";
    const REMOVE_COMMAND_NAME: &'static str = "RemoveSelfShadowKeyframeCommand";

    fn create(frame_index: u32) -> Self {
        MotionSelfShadowKeyframe::create(frame_index)
    }

    fn frame_index(&self) -> u32 {
        self.base.frame_index
    }

    fn find<'a>(motion: &'a NanoemMotion, _track: &(), frame_index: u32) -> Option<&'a Self> {
        motion.find_self_shadow_keyframe_object(frame_index)
    }

    fn find_mut<'a>(
        motion: &'a mut NanoemMotion,
        _track: &(),
        frame_index: u32,
    ) -> Option<&'a mut Self> {
        motion.find_mut_self_shadow_keyframe_object(frame_index)
    }

    fn search_closest<'a>(
        motion: &'a NanoemMotion,
        _track: &(),
        frame_index: u32,
    ) -> (Option<&'a Self>, Option<&'a Self>) {
        motion.search_closest_self_shadow_keyframes(frame_index)
    }

    fn insert(
        motion: &mut NanoemMotion,
        keyframe: Self,
        _track: &(),
        frame_index: u32,
    ) -> Result<(), Status> {
        motion.add_self_shadow_keyframe(keyframe, frame_index)
    }

    fn remove(motion: &mut NanoemMotion, _track: &(), frame_index: u32) -> Result<Self, Status> {
        motion.remove_self_shadow_keyframe(frame_index)
    }

    fn selection_set(selection: &MotionKeyframeSelection) -> &KeyframeSelectionSet<()> {
        &selection.self_shadow
    }

    fn selection_set_mut(
        selection: &mut MotionKeyframeSelection,
    ) -> &mut KeyframeSelectionSet<()> {
        &mut selection.self_shadow
    }

    fn capture_state(&self) -> SelfShadowKeyframeState {
        SelfShadowKeyframeState::from_keyframe(self)
    }

    fn restore_state(&mut self, state: &SelfShadowKeyframeState) {
        state.assign_to(self)
    }
}

pub fn build_updater_add(
    motion: &NanoemMotion,
    shadow_camera: &ShadowCamera,
    frame_index: u32,
) -> KeyframeUpdater<MotionSelfShadowKeyframe> {
    KeyframeUpdater::adding(
        motion,
        (),
        frame_index,
        SelfShadowKeyframeState::from_shadow_camera(shadow_camera),
    )
}

#[test]
fn test_self_shadow_distance_is_negated_in_keyframe() {
    let state = SelfShadowKeyframeState {
        distance: 8000f32,
        mode: CoverageMode::Type2,
    };
    let mut keyframe = MotionSelfShadowKeyframe::create(0);
    state.assign_to(&mut keyframe);
    assert_eq!(-8000f32, keyframe.distance);
    assert_eq!(2, keyframe.mode);
    assert_eq!(state, SelfShadowKeyframeState::from_keyframe(&keyframe));
}
