use cgmath::Vector4;
use nanoem::{
    common::{Buffer, Status, F128},
    motion::{MotionKeyframeTypes, MotionModelKeyframe, MotionOutsideParent},
    mutable::common::MutableBuffer,
};

use crate::{
    model::Model,
    motion::NanoemMotion,
    motion_keyframe_selection::{KeyframeSelectionSet, MotionKeyframeSelection},
    project::ModelHandle,
    utils::f128_to_vec4,
};

use super::updater::{CommandMessage, KeyframeUpdater, Updatable};

#[derive(Debug, Clone, PartialEq)]
pub struct ModelKeyframeState {
    pub visible: bool,
    pub enable_physics_simulation: bool,
    pub edge_color: Vector4<f32>,
    pub edge_scale_factor: f32,
    pub has_edge_option: bool,
    pub enable_add_blending: bool,
    /// Constraint enabled flag per bone name, in keyframe order.
    pub constraint_states: Vec<(String, bool)>,
    /// Outside parent `(object, bone)` per subject bone name, in keyframe order.
    pub outside_parents: Vec<(String, (String, String))>,
}

impl Default for ModelKeyframeState {
    fn default() -> Self {
        Self {
            visible: true,
            enable_physics_simulation: true,
            edge_color: Vector4::new(0f32, 0f32, 0f32, 1f32),
            edge_scale_factor: 1f32,
            has_edge_option: false,
            enable_add_blending: false,
            constraint_states: vec![],
            outside_parents: vec![],
        }
    }
}

impl ModelKeyframeState {
    pub fn from_model(model: &Model) -> Self {
        Self {
            visible: model.is_visible(),
            enable_physics_simulation: model.is_physics_simulation_enabled(),
            edge_color: model.edge_color(),
            edge_scale_factor: model.edge_size_scale_factor(),
            has_edge_option: model.has_edge_option(),
            enable_add_blending: model.is_add_blending_enabled(),
            constraint_states: model
                .constraint_states()
                .map(|(name, enabled)| (name.clone(), enabled))
                .collect(),
            outside_parents: model
                .outside_parents()
                .map(|(name, parent)| (name.clone(), parent.clone()))
                .collect(),
        }
    }

    pub fn from_keyframe(keyframe: &MotionModelKeyframe) -> Self {
        Self {
            visible: keyframe.visible,
            enable_physics_simulation: keyframe.is_physics_simulation_enabled,
            edge_color: f128_to_vec4(keyframe.edge_color),
            edge_scale_factor: keyframe.edge_scale_factor,
            has_edge_option: keyframe.has_edge_option,
            enable_add_blending: keyframe.is_add_blending_enabled,
            constraint_states: keyframe
                .constraint_states
                .iter()
                .map(|state| (state.bone_name.clone(), state.enabled))
                .collect(),
            outside_parents: keyframe
                .outside_parents
                .iter()
                .map(|op| {
                    (
                        op.subject_bone_name.clone(),
                        (op.target_object_name.clone(), op.target_bone_name.clone()),
                    )
                })
                .collect(),
        }
    }

    /// Writes the state into `keyframe`, replacing all of its constraint states and outside
    /// parents.
    pub fn assign_to(&self, keyframe: &mut MotionModelKeyframe) -> Result<(), Status> {
        keyframe.visible = self.visible;
        keyframe.is_physics_simulation_enabled = self.enable_physics_simulation;
        keyframe.edge_color = self.edge_color.into();
        keyframe.edge_scale_factor = self.edge_scale_factor;
        keyframe.has_edge_option = self.has_edge_option;
        keyframe.is_add_blending_enabled = self.enable_add_blending;
        keyframe.remove_all_constraint_states();
        for (bone_name, enabled) in &self.constraint_states {
            keyframe.add_constraint_state(bone_name, *enabled)?;
        }
        keyframe.remove_all_outside_parents();
        for (subject_bone_name, (target_object_name, target_bone_name)) in &self.outside_parents {
            keyframe.add_outside_parent(MotionOutsideParent {
                subject_bone_name: subject_bone_name.clone(),
                target_object_name: target_object_name.clone(),
                target_bone_name: target_bone_name.clone(),
            })?;
        }
        Ok(())
    }
}

impl CommandMessage for ModelKeyframeState {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_bool(self.visible)?;
        buffer.write_bool(self.enable_physics_simulation)?;
        buffer.write_f32_4_little_endian(F128(self.edge_color.into()))?;
        buffer.write_f32_little_endian(self.edge_scale_factor)?;
        buffer.write_bool(self.has_edge_option)?;
        buffer.write_bool(self.enable_add_blending)?;
        buffer.write_u32_little_endian(self.constraint_states.len() as u32)?;
        for (bone_name, enabled) in &self.constraint_states {
            bone_name.write_message(buffer)?;
            buffer.write_bool(*enabled)?;
        }
        buffer.write_u32_little_endian(self.outside_parents.len() as u32)?;
        for (subject_bone_name, (target_object_name, target_bone_name)) in &self.outside_parents {
            subject_bone_name.write_message(buffer)?;
            target_object_name.write_message(buffer)?;
            target_bone_name.write_message(buffer)?;
        }
        Ok(())
    }

    fn read_message(buffer: &mut Buffer) -> Result<Self, Status> {
        let mut state = Self {
            visible: buffer.read_bool()?,
            enable_physics_simulation: buffer.read_bool()?,
            edge_color: f128_to_vec4(buffer.read_f32_4_little_endian()?.0),
            edge_scale_factor: buffer.read_f32_little_endian()?,
            has_edge_option: buffer.read_bool()?,
            enable_add_blending: buffer.read_bool()?,
            constraint_states: vec![],
            outside_parents: vec![],
        };
        let num_constraint_states = buffer.read_len()?;
        for _ in 0..num_constraint_states {
            let bone_name = String::read_message(buffer)?;
            state.constraint_states.push((bone_name, buffer.read_bool()?));
        }
        let num_outside_parents = buffer.read_len()?;
        for _ in 0..num_outside_parents {
            let subject_bone_name = String::read_message(buffer)?;
            let target_object_name = String::read_message(buffer)?;
            let target_bone_name = String::read_message(buffer)?;
            state
                .outside_parents
                .push((subject_bone_name, (target_object_name, target_bone_name)));
        }
        Ok(state)
    }
}

impl Updatable for MotionModelKeyframe {
    type State = ModelKeyframeState;
    type Track = ();
    type Target = ModelHandle;
    type OverrideParameter = ();

    const KEYFRAME_TYPE: MotionKeyframeTypes = MotionKeyframeTypes::MODEL;
    const ALREADY_EXISTS: Status = Status::ErrorMotionModelKeyframeAlreadyExists;
    const NOT_FOUND: Status = Status::ErrorMotionModelKeyframeNotFound;
    const ADD_COMMAND_NAME: &'static str = "AddModelKeyframeCommand";
    const REMOVE_COMMAND_NAME: &'static str = "RemoveModelKeyframeCommand";

    fn create(frame_index: u32) -> Self {
        MotionModelKeyframe::create(frame_index)
    }

    fn frame_index(&self) -> u32 {
        self.base.frame_index
    }

    fn find<'a>(motion: &'a NanoemMotion, _track: &(), frame_index: u32) -> Option<&'a Self> {
        motion.find_model_keyframe_object(frame_index)
    }

    fn find_mut<'a>(
        motion: &'a mut NanoemMotion,
        _track: &(),
        frame_index: u32,
    ) -> Option<&'a mut Self> {
        motion.find_mut_model_keyframe_object(frame_index)
    }

    fn search_closest<'a>(
        motion: &'a NanoemMotion,
        _track: &(),
        frame_index: u32,
    ) -> (Option<&'a Self>, Option<&'a Self>) {
        motion.search_closest_model_keyframes(frame_index)
    }

    fn insert(
        motion: &mut NanoemMotion,
        keyframe: Self,
        _track: &(),
        frame_index: u32,
    ) -> Result<(), Status> {
        motion.add_model_keyframe(keyframe, frame_index)
    }

    fn remove(motion: &mut NanoemMotion, _track: &(), frame_index: u32) -> Result<Self, Status> {
        motion.remove_model_keyframe(frame_index)
    }

    fn selection_set(selection: &MotionKeyframeSelection) -> &KeyframeSelectionSet<()> {
        &selection.model
    }

    fn selection_set_mut(
        selection: &mut MotionKeyframeSelection,
    ) -> &mut KeyframeSelectionSet<()> {
        &mut selection.model
    }

    fn capture_state(&self) -> ModelKeyframeState {
        ModelKeyframeState::from_keyframe(self)
    }

    fn restore_state(&mut self, state: &ModelKeyframeState) {
        if let Err(status) = state.assign_to(self) {
            log::warn!("Cannot restore the model keyframe state: {:?}", status);
        }
    }
}

pub fn build_updater_add(
    motion: &NanoemMotion,
    model: &Model,
    frame_index: u32,
) -> KeyframeUpdater<MotionModelKeyframe> {
    KeyframeUpdater::adding(motion, (), frame_index, ModelKeyframeState::from_model(model))
}

#[cfg(test)]
mod tests {
    use nanoem::{
        common::Buffer,
        motion::{MotionModelKeyframe, MotionOutsideParent},
        mutable::common::MutableBuffer,
    };

    use crate::keyframe::update::updater::CommandMessage;

    use super::ModelKeyframeState;

    fn keyframe_with_bindings() -> MotionModelKeyframe {
        let mut keyframe = MotionModelKeyframe::create(0);
        keyframe.add_constraint_state("左足ＩＫ", false).unwrap();
        keyframe.add_constraint_state("右足ＩＫ", true).unwrap();
        keyframe
            .add_outside_parent(MotionOutsideParent {
                subject_bone_name: "センター".to_owned(),
                target_object_name: "stage".to_owned(),
                target_bone_name: "root".to_owned(),
            })
            .unwrap();
        keyframe
    }

    #[test]
    fn test_assign_replaces_bindings() {
        let state = ModelKeyframeState::from_keyframe(&keyframe_with_bindings());
        let mut keyframe = MotionModelKeyframe::create(0);
        keyframe.add_constraint_state("首", true).unwrap();
        state.assign_to(&mut keyframe).unwrap();
        assert!(keyframe.find_constraint_state("首").is_none());
        assert_eq!(
            Some(false),
            keyframe
                .find_constraint_state("左足ＩＫ")
                .map(|state| state.enabled)
        );
        assert_eq!(state, ModelKeyframeState::from_keyframe(&keyframe));
    }

    #[test]
    fn test_assign_keeps_keyframe_order() {
        let original = keyframe_with_bindings();
        let mut keyframe = MotionModelKeyframe::create(0);
        ModelKeyframeState::from_keyframe(&original)
            .assign_to(&mut keyframe)
            .unwrap();
        assert_eq!(original, keyframe);
    }

    #[test]
    fn test_state_message() {
        let state = ModelKeyframeState::from_keyframe(&keyframe_with_bindings());
        let mut buffer = MutableBuffer::create().unwrap();
        state.write_message(&mut buffer).unwrap();
        let mut buffer = Buffer::create(buffer.into_bytes());
        assert_eq!(state, ModelKeyframeState::read_message(&mut buffer).unwrap());
    }
}
