use nanoem::{
    common::{Buffer, Status},
    motion::{MotionKeyframeTypes, MotionMorphKeyframe},
    mutable::common::MutableBuffer,
};

use crate::{
    model::Morph,
    motion::NanoemMotion,
    motion_keyframe_selection::{KeyframeSelectionSet, MotionKeyframeSelection},
    project::ModelHandle,
};

use super::updater::{CommandMessage, KeyframeUpdater, Updatable};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MorphKeyframeState {
    pub weight: f32,
}

impl MorphKeyframeState {
    pub fn from_morph(morph: &Morph) -> Self {
        Self {
            weight: morph.weight(),
        }
    }

    pub fn from_keyframe(keyframe: &MotionMorphKeyframe) -> Self {
        Self {
            weight: keyframe.weight,
        }
    }

    pub fn assign_to(&self, keyframe: &mut MotionMorphKeyframe) {
        keyframe.weight = self.weight;
    }
}

impl CommandMessage for MorphKeyframeState {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_f32_little_endian(self.weight)
    }

    fn read_message(buffer: &mut Buffer) -> Result<Self, Status> {
        Ok(Self {
            weight: buffer.read_f32_little_endian()?,
        })
    }
}

impl Updatable for MotionMorphKeyframe {
    type State = MorphKeyframeState;
    type Track = String;
    type Target = ModelHandle;
    type OverrideParameter = ();

    const KEYFRAME_TYPE: MotionKeyframeTypes = MotionKeyframeTypes::MORPH;
    const ALREADY_EXISTS: Status = Status::ErrorMotionMorphKeyframeAlreadyExists;
    const NOT_FOUND: Status = Status::ErrorMotionMorphKeyframeNotFound;
    const ADD_COMMAND_NAME: &'static str = "AddMorphKeyframeCommand";
    const REMOVE_COMMAND_NAME: &'static str = "RemoveMorphKeyframeCommand";

    fn create(frame_index: u32) -> Self {
        MotionMorphKeyframe::create(frame_index)
    }

    fn frame_index(&self) -> u32 {
        self.base.frame_index
    }

    fn find<'a>(motion: &'a NanoemMotion, track: &String, frame_index: u32) -> Option<&'a Self> {
        motion.find_morph_keyframe_object(track, frame_index)
    }

    fn find_mut<'a>(
        motion: &'a mut NanoemMotion,
        track: &String,
        frame_index: u32,
    ) -> Option<&'a mut Self> {
        motion.find_mut_morph_keyframe_object(track, frame_index)
    }

    fn search_closest<'a>(
        motion: &'a NanoemMotion,
        track: &String,
        frame_index: u32,
    ) -> (Option<&'a Self>, Option<&'a Self>) {
        motion.search_closest_morph_keyframes(track, frame_index)
    }

    fn insert(
        motion: &mut NanoemMotion,
        keyframe: Self,
        track: &String,
        frame_index: u32,
    ) -> Result<(), Status> {
        motion.add_morph_keyframe(keyframe, track, frame_index)
    }

    fn remove(motion: &mut NanoemMotion, track: &String, frame_index: u32) -> Result<Self, Status> {
        motion.remove_morph_keyframe(track, frame_index)
    }

    fn selection_set(selection: &MotionKeyframeSelection) -> &KeyframeSelectionSet<String> {
        &selection.morph
    }

    fn selection_set_mut(
        selection: &mut MotionKeyframeSelection,
    ) -> &mut KeyframeSelectionSet<String> {
        &mut selection.morph
    }

    fn capture_state(&self) -> MorphKeyframeState {
        MorphKeyframeState::from_keyframe(self)
    }

    fn restore_state(&mut self, state: &MorphKeyframeState) {
        state.assign_to(self)
    }
}

pub fn build_updater_add(
    motion: &NanoemMotion,
    morph: &Morph,
    frame_index: u32,
) -> KeyframeUpdater<MotionMorphKeyframe> {
    KeyframeUpdater::adding(
        motion,
        morph.name.clone(),
        frame_index,
        MorphKeyframeState::from_morph(morph),
    )
}
