use cgmath::{Euler, One, Quaternion, Rad, Vector3};
use nanoem::{
    common::{Buffer, Status},
    mutable::common::MutableBuffer,
};

use crate::{
    error::MdanceioError,
    keyframe::update::CommandMessage,
    model::{BindPose, BoneIndex, Model},
    project::{ModelHandle, Project},
};

use super::Command;

/// Which part of a bone user transform a reset clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoneResetType {
    TranslationAxisX,
    TranslationAxisY,
    TranslationAxisZ,
    Orientation,
    OrientationAngleX,
    OrientationAngleY,
    OrientationAngleZ,
}

fn find_model(project: &Project, model: ModelHandle) -> Result<&Model, MdanceioError> {
    project
        .model(model)
        .ok_or_else(MdanceioError::model_not_found)
}

/// Swaps the user transforms of every bone of a model between two bind poses.
///
/// Bones named as targets are marked dirty on redo and get their previous dirty flag back on
/// undo.
#[derive(Debug, Clone)]
pub struct TransformBoneCommand {
    model: ModelHandle,
    local_frame_index: u32,
    last: BindPose,
    current: BindPose,
    dirty_states: Vec<(BoneIndex, bool)>,
}

impl TransformBoneCommand {
    pub fn create(
        project: &Project,
        model: ModelHandle,
        last: BindPose,
        current: BindPose,
        target_bones: &[&str],
    ) -> Result<Self, MdanceioError> {
        let dirty_states = find_model(project, model)?
            .bones
            .iter()
            .filter(|bone| target_bones.contains(&bone.name.as_str()))
            .map(|bone| (bone.handle, bone.states.dirty))
            .collect();
        Ok(Self {
            model,
            local_frame_index: project.current_local_frame_index(),
            last,
            current,
            dirty_states,
        })
    }

    /// Moves a single bone to `translation` and `orientation`.
    pub fn create_from_transform(
        project: &Project,
        model: ModelHandle,
        bone_name: &str,
        translation: Vector3<f32>,
        orientation: Quaternion<f32>,
    ) -> Result<Self, MdanceioError> {
        let target = find_model(project, model)?;
        let bone = target
            .find_bone(bone_name)
            .ok_or_else(|| MdanceioError::bone_not_found(bone_name))?;
        let last = BindPose::save(&target.bones);
        let mut current = last.clone();
        if let Some(parameter) = current.get_mut(bone.handle) {
            parameter.local_user_translation = translation;
            parameter.local_user_orientation = orientation;
        }
        Self::create(project, model, last, current, &[bone_name])
    }

    /// Clears one part of the user transform of each named bone. Unknown names are skipped.
    pub fn create_reset(
        project: &Project,
        model: ModelHandle,
        bone_names: &[&str],
        reset_type: BoneResetType,
    ) -> Result<Self, MdanceioError> {
        let target = find_model(project, model)?;
        let last = BindPose::save(&target.bones);
        let mut current = last.clone();
        for name in bone_names {
            let parameter = match target
                .find_bone(name)
                .and_then(|bone| current.get_mut(bone.handle))
            {
                Some(parameter) => parameter,
                None => {
                    log::warn!("Bone {} is not in the model, skip resetting", name);
                    continue;
                }
            };
            let translation = &mut parameter.local_user_translation;
            let orientation = &mut parameter.local_user_orientation;
            match reset_type {
                BoneResetType::TranslationAxisX => translation.x = 0f32,
                BoneResetType::TranslationAxisY => translation.y = 0f32,
                BoneResetType::TranslationAxisZ => translation.z = 0f32,
                BoneResetType::Orientation => *orientation = Quaternion::one(),
                BoneResetType::OrientationAngleX
                | BoneResetType::OrientationAngleY
                | BoneResetType::OrientationAngleZ => {
                    let mut angle = Euler::from(*orientation);
                    match reset_type {
                        BoneResetType::OrientationAngleX => angle.x = Rad(0f32),
                        BoneResetType::OrientationAngleY => angle.y = Rad(0f32),
                        _ => angle.z = Rad(0f32),
                    }
                    *orientation = angle.into();
                }
            }
        }
        Self::create(project, model, last, current, bone_names)
    }

    pub fn model(&self) -> ModelHandle {
        self.model
    }

    pub fn local_frame_index(&self) -> u32 {
        self.local_frame_index
    }

    pub fn last(&self) -> &BindPose {
        &self.last
    }

    pub fn current(&self) -> &BindPose {
        &self.current
    }

    pub fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_u32_little_endian(self.local_frame_index)?;
        self.current.write_message(buffer)?;
        self.last.write_message(buffer)?;
        buffer.write_u32_little_endian(self.dirty_states.len() as u32)?;
        for (bone, dirty) in &self.dirty_states {
            buffer.write_u32_little_endian(*bone as u32)?;
            buffer.write_bool(*dirty)?;
        }
        Ok(())
    }

    pub fn read_message(model: ModelHandle, buffer: &mut Buffer) -> Result<Self, Status> {
        let local_frame_index = buffer.read_u32_little_endian()?;
        let current = BindPose::read_message(buffer)?;
        let last = BindPose::read_message(buffer)?;
        let num_dirty_states = buffer.read_len()?;
        let mut dirty_states = Vec::with_capacity(num_dirty_states);
        for _ in 0..num_dirty_states {
            let bone = buffer.read_u32_little_endian()? as BoneIndex;
            dirty_states.push((bone, buffer.read_bool()?));
        }
        Ok(Self {
            model,
            local_frame_index,
            last,
            current,
            dirty_states,
        })
    }

    fn execute(&self, project: &mut Project, undo: bool) {
        project.set_local_frame_index(self.local_frame_index);
        let model = match project.find_model_mut(self.model) {
            Some(model) => model,
            None => {
                log::debug!("Model {} is no longer in the project", self.model);
                return;
            }
        };
        let pose = if undo { &self.last } else { &self.current };
        pose.restore(&mut model.bones);
        for (index, dirty) in &self.dirty_states {
            if let Some(bone) = model.bones.get_mut(*index) {
                bone.states.dirty = if undo { *dirty } else { true };
            }
        }
    }
}

impl Command<Project> for TransformBoneCommand {
    fn undo(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        self.execute(project, true);
        Ok(())
    }

    fn redo(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        self.execute(project, false);
        Ok(())
    }

    fn name(&self) -> &str {
        "TransformBoneCommand"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MorphWeightState {
    pub name: String,
    pub current: f32,
    pub last: f32,
}

impl CommandMessage for MorphWeightState {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        self.name.write_message(buffer)?;
        buffer.write_f32_little_endian(self.current)?;
        buffer.write_f32_little_endian(self.last)
    }

    fn read_message(buffer: &mut Buffer) -> Result<Self, Status> {
        Ok(Self {
            name: String::read_message(buffer)?,
            current: buffer.read_f32_little_endian()?,
            last: buffer.read_f32_little_endian()?,
        })
    }
}

/// Sets morph weights of a model, keeping the bone pose taken when the command was made.
#[derive(Debug, Clone)]
pub struct TransformMorphCommand {
    model: ModelHandle,
    local_frame_index: u32,
    weight_states: Vec<MorphWeightState>,
    bind_pose: BindPose,
}

impl TransformMorphCommand {
    /// Captures the live weight of each named morph as the undo side. Unknown morphs are
    /// skipped.
    pub fn create(
        project: &Project,
        model: ModelHandle,
        weights: &[(&str, f32)],
    ) -> Result<Self, MdanceioError> {
        let target = find_model(project, model)?;
        let weight_states = weights
            .iter()
            .filter_map(|(name, weight)| match target.find_morph(name) {
                Some(morph) => Some(MorphWeightState {
                    name: morph.name.clone(),
                    current: *weight,
                    last: morph.weight(),
                }),
                None => {
                    log::warn!("Morph {} is not in the model, skip transforming", name);
                    None
                }
            })
            .collect();
        Ok(Self {
            model,
            local_frame_index: project.current_local_frame_index(),
            weight_states,
            bind_pose: BindPose::save(&target.bones),
        })
    }

    /// Sets the weight of each named morph to zero.
    pub fn create_reset(
        project: &Project,
        model: ModelHandle,
        morph_names: &[&str],
    ) -> Result<Self, MdanceioError> {
        let weights = morph_names
            .iter()
            .map(|name| (*name, 0f32))
            .collect::<Vec<_>>();
        Self::create(project, model, &weights)
    }

    pub fn model(&self) -> ModelHandle {
        self.model
    }

    pub fn weight_states(&self) -> &[MorphWeightState] {
        &self.weight_states
    }

    pub fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_u32_little_endian(self.local_frame_index)?;
        self.bind_pose.write_message(buffer)?;
        buffer.write_u32_little_endian(self.weight_states.len() as u32)?;
        for state in &self.weight_states {
            state.write_message(buffer)?;
        }
        Ok(())
    }

    pub fn read_message(model: ModelHandle, buffer: &mut Buffer) -> Result<Self, Status> {
        let local_frame_index = buffer.read_u32_little_endian()?;
        let bind_pose = BindPose::read_message(buffer)?;
        let num_weight_states = buffer.read_len()?;
        let mut weight_states = Vec::with_capacity(num_weight_states);
        for _ in 0..num_weight_states {
            weight_states.push(MorphWeightState::read_message(buffer)?);
        }
        Ok(Self {
            model,
            local_frame_index,
            weight_states,
            bind_pose,
        })
    }

    fn execute(&self, project: &mut Project, undo: bool) {
        project.set_local_frame_index(self.local_frame_index);
        let model = match project.find_model_mut(self.model) {
            Some(model) => model,
            None => {
                log::debug!("Model {} is no longer in the project", self.model);
                return;
            }
        };
        self.bind_pose.restore(&mut model.bones);
        for state in &self.weight_states {
            if let Some(morph) = model.find_morph_mut(&state.name) {
                morph.set_weight(if undo { state.last } else { state.current });
            }
        }
    }
}

impl Command<Project> for TransformMorphCommand {
    fn undo(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        self.execute(project, true);
        Ok(())
    }

    fn redo(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        self.execute(project, false);
        Ok(())
    }

    fn name(&self) -> &str {
        "TransformMorphCommand"
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, One, Quaternion, Rotation3, Vector3};
    use nanoem::mutable::common::MutableBuffer;

    use crate::{
        command::Command,
        model::{Bone, Model, Morph},
        project::Project,
    };

    use super::{BoneResetType, TransformBoneCommand, TransformMorphCommand};

    fn project_with_model() -> (Project, u32) {
        let mut project = Project::new();
        let model = project.add_model(Model::new(
            "miku",
            vec![Bone::new("センター"), Bone::new("首")],
            vec![Morph::new("あ")],
        ));
        (project, model)
    }

    #[test]
    fn test_reset_translation_axis() {
        let (mut project, model) = project_with_model();
        project
            .find_model_mut(model)
            .unwrap()
            .find_bone_mut("センター")
            .unwrap()
            .local_user_translation = Vector3::new(1f32, 2f32, 3f32);
        let mut command = TransformBoneCommand::create_reset(
            &project,
            model,
            &["センター", "存在しない"],
            BoneResetType::TranslationAxisY,
        )
        .unwrap();
        command.redo(&mut project).unwrap();
        let center = project.model(model).unwrap().find_bone("センター").unwrap();
        assert_eq!(Vector3::new(1f32, 0f32, 3f32), center.local_user_translation);
        assert!(center.states.dirty);
        assert!(project.model(model).unwrap().has_any_dirty_bone());
        command.undo(&mut project).unwrap();
        let center = project.model(model).unwrap().find_bone("センター").unwrap();
        assert_eq!(Vector3::new(1f32, 2f32, 3f32), center.local_user_translation);
        assert!(!center.states.dirty);
    }

    #[test]
    fn test_transform_bone_message() {
        let (mut project, model) = project_with_model();
        project.set_local_frame_index(9);
        let command = TransformBoneCommand::create_from_transform(
            &project,
            model,
            "首",
            Vector3::new(0f32, 1f32, 0f32),
            Quaternion::from_angle_z(Deg(15f32)),
        )
        .unwrap();
        assert!(TransformBoneCommand::create_from_transform(
            &project,
            model,
            "存在しない",
            Vector3::new(0f32, 0f32, 0f32),
            Quaternion::one(),
        )
        .is_err());
        let mut buffer = MutableBuffer::create().unwrap();
        command.write_message(&mut buffer).unwrap();
        let mut buffer = buffer.create_buffer_object();
        let mut restored = TransformBoneCommand::read_message(model, &mut buffer).unwrap();
        assert!(buffer.is_end());
        assert_eq!(command.current(), restored.current());
        assert_eq!(command.last(), restored.last());
        project.set_local_frame_index(0);
        restored.redo(&mut project).unwrap();
        assert_eq!(9, project.current_local_frame_index());
        assert_eq!(
            Vector3::new(0f32, 1f32, 0f32),
            project
                .model(model)
                .unwrap()
                .find_bone("首")
                .unwrap()
                .local_user_translation
        );
    }

    #[test]
    fn test_transform_morph_keeps_bind_pose() {
        let (mut project, model) = project_with_model();
        let mut command = TransformMorphCommand::create(&project, model, &[("あ", 0.8f32)]).unwrap();
        project
            .find_model_mut(model)
            .unwrap()
            .find_bone_mut("首")
            .unwrap()
            .local_user_translation = Vector3::new(5f32, 0f32, 0f32);
        command.redo(&mut project).unwrap();
        let target = project.model(model).unwrap();
        assert_eq!(Some(0.8f32), target.find_morph("あ").map(Morph::weight));
        assert_eq!(
            Vector3::new(0f32, 0f32, 0f32),
            target.find_bone("首").unwrap().local_user_translation
        );
        command.undo(&mut project).unwrap();
        assert_eq!(
            Some(0f32),
            project.model(model).unwrap().find_morph("あ").map(Morph::weight)
        );
    }
}
