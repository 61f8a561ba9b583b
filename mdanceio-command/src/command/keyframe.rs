use nanoem::{
    common::{Buffer, Status},
    motion::{
        MotionAccessoryKeyframe, MotionBoneKeyframe, MotionCameraKeyframe, MotionLightKeyframe,
        MotionModelKeyframe, MotionMorphKeyframe, MotionSelfShadowKeyframe,
    },
    mutable::common::MutableBuffer,
};

use crate::{
    error::MdanceioError,
    keyframe::update::{
        accessory, bone, camera, light, model, morph, self_shadow, CommandMessage,
        KeyframeUpdater, Updatable,
    },
    motion::Motion,
    project::{AccessoryHandle, ModelHandle, MotionHandle, Project},
};

use super::Command;

pub type AddAccessoryKeyframeCommand = AddKeyframeCommand<MotionAccessoryKeyframe>;
pub type AddBoneKeyframeCommand = AddKeyframeCommand<MotionBoneKeyframe>;
pub type AddCameraKeyframeCommand = AddKeyframeCommand<MotionCameraKeyframe>;
pub type AddLightKeyframeCommand = AddKeyframeCommand<MotionLightKeyframe>;
pub type AddModelKeyframeCommand = AddKeyframeCommand<MotionModelKeyframe>;
pub type AddMorphKeyframeCommand = AddKeyframeCommand<MotionMorphKeyframe>;
pub type AddSelfShadowKeyframeCommand = AddKeyframeCommand<MotionSelfShadowKeyframe>;

pub type RemoveAccessoryKeyframeCommand = RemoveKeyframeCommand<MotionAccessoryKeyframe>;
pub type RemoveBoneKeyframeCommand = RemoveKeyframeCommand<MotionBoneKeyframe>;
pub type RemoveCameraKeyframeCommand = RemoveKeyframeCommand<MotionCameraKeyframe>;
pub type RemoveLightKeyframeCommand = RemoveKeyframeCommand<MotionLightKeyframe>;
pub type RemoveModelKeyframeCommand = RemoveKeyframeCommand<MotionModelKeyframe>;
pub type RemoveMorphKeyframeCommand = RemoveKeyframeCommand<MotionMorphKeyframe>;
pub type RemoveSelfShadowKeyframeCommand = RemoveKeyframeCommand<MotionSelfShadowKeyframe>;

/// Writes the `after_state` of every keyframe, inserting the ones that do not exist yet.
fn apply_keyframes<K: Updatable>(
    motion: &mut Motion,
    keyframes: &[KeyframeUpdater<K>],
) -> Result<(), MdanceioError> {
    for updater in keyframes {
        if updater.updated {
            match K::find_mut(&mut motion.opaque, &updater.track, updater.frame_index) {
                Some(keyframe) => keyframe.restore_state(&updater.after_state),
                None => log::warn!(
                    "{:?} keyframe at {} to overwrite is missing",
                    updater.track,
                    updater.frame_index
                ),
            }
        } else {
            let mut keyframe = K::create(updater.frame_index);
            keyframe.restore_state(&updater.after_state);
            match K::insert(
                &mut motion.opaque,
                keyframe,
                &updater.track,
                updater.frame_index,
            ) {
                Ok(_) => {}
                Err(status) if status == K::ALREADY_EXISTS => {
                    log::warn!(
                        "{:?} keyframe at {} already exists",
                        updater.track,
                        updater.frame_index
                    )
                }
                Err(status) => {
                    return Err(MdanceioError::from_nanoem(
                        "Cannot add the keyframe: ",
                        status,
                    ))
                }
            }
            if updater.selected {
                K::selection_set_mut(motion.selection_mut())
                    .add(&updater.track, updater.frame_index);
            }
        }
        if let Some(bezier_curve_override) = &updater.bezier_curve_override {
            if let Some(previous) = K::find_mut(
                &mut motion.opaque,
                &updater.track,
                bezier_curve_override.target_frame_index,
            ) {
                previous.apply_override(&bezier_curve_override.after);
            }
        }
        log::trace!("Applied {:?} keyframe at {}", updater.track, updater.frame_index);
    }
    Ok(())
}

/// Takes every keyframe back to its `before_state`, removing the ones that were inserted.
fn revert_keyframes<K: Updatable>(
    motion: &mut Motion,
    keyframes: &[KeyframeUpdater<K>],
) -> Result<(), MdanceioError> {
    for updater in keyframes.iter().rev() {
        if let Some(bezier_curve_override) = &updater.bezier_curve_override {
            if let Some(previous) = K::find_mut(
                &mut motion.opaque,
                &updater.track,
                bezier_curve_override.target_frame_index,
            ) {
                previous.apply_override(&bezier_curve_override.before);
            }
        }
        if updater.updated {
            match K::find_mut(&mut motion.opaque, &updater.track, updater.frame_index) {
                Some(keyframe) => keyframe.restore_state(&updater.before_state),
                None => log::warn!(
                    "{:?} keyframe at {} to restore is missing",
                    updater.track,
                    updater.frame_index
                ),
            }
        } else {
            match K::remove(&mut motion.opaque, &updater.track, updater.frame_index) {
                Ok(_) => {}
                Err(status) if status == K::NOT_FOUND => {
                    log::warn!(
                        "{:?} keyframe at {} is already removed",
                        updater.track,
                        updater.frame_index
                    )
                }
                Err(status) => {
                    return Err(MdanceioError::from_nanoem(
                        "Cannot remove the keyframe: ",
                        status,
                    ))
                }
            }
            K::selection_set_mut(motion.selection_mut())
                .remove(&updater.track, updater.frame_index);
        }
        log::trace!("Reverted {:?} keyframe at {}", updater.track, updater.frame_index);
    }
    Ok(())
}

fn write_keyframes<K: Updatable>(
    keyframes: &[KeyframeUpdater<K>],
    buffer: &mut MutableBuffer,
) -> Result<(), Status> {
    buffer.write_u32_little_endian(keyframes.len() as u32)?;
    for updater in keyframes {
        updater.write_message(buffer)?;
    }
    Ok(())
}

fn read_keyframes<K: Updatable>(buffer: &mut Buffer) -> Result<Vec<KeyframeUpdater<K>>, Status> {
    let len = buffer.read_len()?;
    let mut keyframes = Vec::with_capacity(len);
    for _ in 0..len {
        keyframes.push(KeyframeUpdater::read_message(buffer)?);
    }
    Ok(keyframes)
}

fn resolve_motion(
    project: &Project,
    handle: Option<MotionHandle>,
) -> Result<(MotionHandle, &Motion), MdanceioError> {
    handle
        .and_then(|handle| project.motion(handle).map(|motion| (handle, motion)))
        .ok_or_else(MdanceioError::motion_not_found)
}

/// Registers keyframes built from the live state of an entity.
///
/// Redo inserts new keyframes or overwrites existing ones with their after state; undo takes
/// every keyframe back to where it was, including the curve of a previous keyframe that the
/// insertion split.
#[derive(Debug, Clone)]
pub struct AddKeyframeCommand<K: Updatable> {
    motion: MotionHandle,
    target: K::Target,
    keyframes: Vec<KeyframeUpdater<K>>,
}

impl<K: Updatable> AddKeyframeCommand<K> {
    pub fn new(motion: MotionHandle, target: K::Target, keyframes: Vec<KeyframeUpdater<K>>) -> Self {
        Self {
            motion,
            target,
            keyframes,
        }
    }

    pub fn motion(&self) -> MotionHandle {
        self.motion
    }

    pub fn keyframes(&self) -> &[KeyframeUpdater<K>] {
        &self.keyframes
    }

    pub fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        write_keyframes(&self.keyframes, buffer)
    }

    pub fn read_message(
        motion: MotionHandle,
        target: K::Target,
        buffer: &mut Buffer,
    ) -> Result<Self, Status> {
        Ok(Self::new(motion, target, read_keyframes(buffer)?))
    }
}

impl<K: Updatable> Command<Project> for AddKeyframeCommand<K> {
    fn undo(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        let last_duration = project.project_duration();
        let result = match project.motion_mut(self.motion) {
            Some(motion) => revert_keyframes(motion, &self.keyframes),
            None => {
                log::debug!("Motion {} is detached, skip undo", self.motion);
                return Ok(());
            }
        };
        K::after_remove(project, self.target, &self.keyframes);
        project.commit_motion(self.motion, last_duration);
        result
    }

    fn redo(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        let last_duration = project.project_duration();
        let result = match project.motion_mut(self.motion) {
            Some(motion) => apply_keyframes(motion, &self.keyframes),
            None => {
                log::debug!("Motion {} is detached, skip redo", self.motion);
                return Ok(());
            }
        };
        K::after_add(project, self.target, &mut self.keyframes);
        project.commit_motion(self.motion, last_duration);
        result
    }

    fn name(&self) -> &str {
        K::ADD_COMMAND_NAME
    }
}

/// Takes existing keyframes out of a motion. Undo puts them back with their selection.
#[derive(Debug, Clone)]
pub struct RemoveKeyframeCommand<K: Updatable> {
    motion: MotionHandle,
    keyframes: Vec<KeyframeUpdater<K>>,
}

impl<K: Updatable> RemoveKeyframeCommand<K> {
    pub fn new(motion: MotionHandle, keyframes: Vec<KeyframeUpdater<K>>) -> Self {
        Self { motion, keyframes }
    }

    /// Collects the keyframes found at `frame_indices` on each of `tracks`; missing ones are
    /// skipped.
    pub fn from_existing(
        handle: MotionHandle,
        motion: &Motion,
        tracks: &[K::Track],
        frame_indices: &[u32],
    ) -> Self {
        let mut keyframes = vec![];
        for track in tracks {
            for &frame_index in frame_indices {
                if let Some(keyframe) = K::find(&motion.opaque, track, frame_index) {
                    let selected =
                        K::selection_set(motion.selection()).contains(track, frame_index);
                    keyframes.push(KeyframeUpdater::removing(track.clone(), keyframe, selected));
                }
            }
        }
        Self::new(handle, keyframes)
    }

    pub fn motion(&self) -> MotionHandle {
        self.motion
    }

    pub fn keyframes(&self) -> &[KeyframeUpdater<K>] {
        &self.keyframes
    }

    pub fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        write_keyframes(&self.keyframes, buffer)
    }

    pub fn read_message(motion: MotionHandle, buffer: &mut Buffer) -> Result<Self, Status> {
        Ok(Self::new(motion, read_keyframes(buffer)?))
    }
}

impl<K: Updatable> Command<Project> for RemoveKeyframeCommand<K> {
    fn undo(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        let last_duration = project.project_duration();
        let result = match project.motion_mut(self.motion) {
            Some(motion) => apply_keyframes(motion, &self.keyframes),
            None => return Ok(()),
        };
        project.commit_motion(self.motion, last_duration);
        result
    }

    fn redo(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        let last_duration = project.project_duration();
        let result = match project.motion_mut(self.motion) {
            Some(motion) => revert_keyframes(motion, &self.keyframes),
            None => return Ok(()),
        };
        project.commit_motion(self.motion, last_duration);
        result
    }

    fn name(&self) -> &str {
        K::REMOVE_COMMAND_NAME
    }
}

impl AddKeyframeCommand<MotionBoneKeyframe> {
    /// Registers the current pose of each named bone at every frame index.
    pub fn create(
        project: &Project,
        model: ModelHandle,
        bone_names: &[&str],
        frame_indices: &[u32],
    ) -> Result<Self, MdanceioError> {
        let model_object = project
            .model(model)
            .ok_or_else(MdanceioError::model_not_found)?;
        let (handle, motion) = resolve_motion(project, project.resolve_model_motion(model))?;
        let mut keyframes = vec![];
        for name in bone_names {
            match model_object.find_bone(name) {
                Some(bone) => {
                    for &frame_index in frame_indices {
                        keyframes.push(bone::build_updater_add(
                            &motion.opaque,
                            bone,
                            frame_index,
                            project.is_bezier_curve_adjustment_enabled(),
                            project.is_physics_simulation_enabled_for_bone_keyframe(),
                        ));
                    }
                }
                None => log::warn!("Bone {} is not found in {}", name, model_object.get_name()),
            }
        }
        Ok(Self::new(handle, model, keyframes))
    }
}

impl AddKeyframeCommand<MotionMorphKeyframe> {
    /// Registers the current weight of each named morph at every frame index.
    pub fn create(
        project: &Project,
        model: ModelHandle,
        morph_names: &[&str],
        frame_indices: &[u32],
    ) -> Result<Self, MdanceioError> {
        let model_object = project
            .model(model)
            .ok_or_else(MdanceioError::model_not_found)?;
        let (handle, motion) = resolve_motion(project, project.resolve_model_motion(model))?;
        let mut keyframes = vec![];
        for name in morph_names {
            match model_object.find_morph(name) {
                Some(morph) => {
                    for &frame_index in frame_indices {
                        keyframes.push(morph::build_updater_add(
                            &motion.opaque,
                            morph,
                            frame_index,
                        ));
                    }
                }
                None => log::warn!("Morph {} is not found in {}", name, model_object.get_name()),
            }
        }
        Ok(Self::new(handle, model, keyframes))
    }
}

impl AddKeyframeCommand<MotionModelKeyframe> {
    pub fn create(
        project: &Project,
        model: ModelHandle,
        frame_indices: &[u32],
    ) -> Result<Self, MdanceioError> {
        let model_object = project
            .model(model)
            .ok_or_else(MdanceioError::model_not_found)?;
        let (handle, motion) = resolve_motion(project, project.resolve_model_motion(model))?;
        let keyframes = frame_indices
            .iter()
            .map(|&frame_index| model::build_updater_add(&motion.opaque, model_object, frame_index))
            .collect();
        Ok(Self::new(handle, model, keyframes))
    }
}

impl AddKeyframeCommand<MotionAccessoryKeyframe> {
    pub fn create(
        project: &Project,
        accessory: AccessoryHandle,
        frame_indices: &[u32],
    ) -> Result<Self, MdanceioError> {
        let accessory_object = project
            .accessory(accessory)
            .ok_or_else(MdanceioError::accessory_not_found)?;
        let (handle, motion) =
            resolve_motion(project, project.resolve_accessory_motion(accessory))?;
        let keyframes = frame_indices
            .iter()
            .map(|&frame_index| {
                accessory::build_updater_add(&motion.opaque, accessory_object, frame_index)
            })
            .collect();
        Ok(Self::new(handle, accessory, keyframes))
    }
}

impl AddKeyframeCommand<MotionCameraKeyframe> {
    pub fn create(project: &Project, frame_indices: &[u32]) -> Result<Self, MdanceioError> {
        let (handle, motion) = resolve_motion(project, Some(project.camera_motion()))?;
        let keyframes = frame_indices
            .iter()
            .map(|&frame_index| {
                camera::build_updater_add(
                    &motion.opaque,
                    project.global_camera(),
                    frame_index,
                    project.is_bezier_curve_adjustment_enabled(),
                )
            })
            .collect();
        Ok(Self::new(handle, (), keyframes))
    }
}

impl AddKeyframeCommand<MotionLightKeyframe> {
    pub fn create(project: &Project, frame_indices: &[u32]) -> Result<Self, MdanceioError> {
        let (handle, motion) = resolve_motion(project, Some(project.light_motion()))?;
        let keyframes = frame_indices
            .iter()
            .map(|&frame_index| {
                light::build_updater_add(&motion.opaque, project.global_light(), frame_index)
            })
            .collect();
        Ok(Self::new(handle, (), keyframes))
    }
}

impl AddKeyframeCommand<MotionSelfShadowKeyframe> {
    pub fn create(project: &Project, frame_indices: &[u32]) -> Result<Self, MdanceioError> {
        let (handle, motion) = resolve_motion(project, Some(project.self_shadow_motion()))?;
        let keyframes = frame_indices
            .iter()
            .map(|&frame_index| {
                self_shadow::build_updater_add(
                    &motion.opaque,
                    project.shadow_camera(),
                    frame_index,
                )
            })
            .collect();
        Ok(Self::new(handle, (), keyframes))
    }
}

impl RemoveKeyframeCommand<MotionBoneKeyframe> {
    pub fn create(
        project: &Project,
        model: ModelHandle,
        bone_names: &[&str],
        frame_indices: &[u32],
    ) -> Result<Self, MdanceioError> {
        let (handle, motion) = resolve_motion(project, project.resolve_model_motion(model))?;
        let tracks = bone_names
            .iter()
            .map(|name| name.to_string())
            .collect::<Vec<_>>();
        Ok(Self::from_existing(handle, motion, &tracks, frame_indices))
    }
}

impl RemoveKeyframeCommand<MotionMorphKeyframe> {
    pub fn create(
        project: &Project,
        model: ModelHandle,
        morph_names: &[&str],
        frame_indices: &[u32],
    ) -> Result<Self, MdanceioError> {
        let (handle, motion) = resolve_motion(project, project.resolve_model_motion(model))?;
        let tracks = morph_names
            .iter()
            .map(|name| name.to_string())
            .collect::<Vec<_>>();
        Ok(Self::from_existing(handle, motion, &tracks, frame_indices))
    }
}

impl RemoveKeyframeCommand<MotionModelKeyframe> {
    pub fn create(
        project: &Project,
        model: ModelHandle,
        frame_indices: &[u32],
    ) -> Result<Self, MdanceioError> {
        let (handle, motion) = resolve_motion(project, project.resolve_model_motion(model))?;
        Ok(Self::from_existing(handle, motion, &[()], frame_indices))
    }
}

impl RemoveKeyframeCommand<MotionAccessoryKeyframe> {
    pub fn create(
        project: &Project,
        accessory: AccessoryHandle,
        frame_indices: &[u32],
    ) -> Result<Self, MdanceioError> {
        let (handle, motion) =
            resolve_motion(project, project.resolve_accessory_motion(accessory))?;
        Ok(Self::from_existing(handle, motion, &[()], frame_indices))
    }
}

impl RemoveKeyframeCommand<MotionCameraKeyframe> {
    pub fn create(project: &Project, frame_indices: &[u32]) -> Result<Self, MdanceioError> {
        let (handle, motion) = resolve_motion(project, Some(project.camera_motion()))?;
        Ok(Self::from_existing(handle, motion, &[()], frame_indices))
    }
}

impl RemoveKeyframeCommand<MotionLightKeyframe> {
    pub fn create(project: &Project, frame_indices: &[u32]) -> Result<Self, MdanceioError> {
        let (handle, motion) = resolve_motion(project, Some(project.light_motion()))?;
        Ok(Self::from_existing(handle, motion, &[()], frame_indices))
    }
}

impl RemoveKeyframeCommand<MotionSelfShadowKeyframe> {
    pub fn create(project: &Project, frame_indices: &[u32]) -> Result<Self, MdanceioError> {
        let (handle, motion) = resolve_motion(project, Some(project.self_shadow_motion()))?;
        Ok(Self::from_existing(handle, motion, &[()], frame_indices))
    }
}

#[cfg(test)]
mod tests {
    use nanoem::{motion::MotionLightKeyframe, mutable::common::MutableBuffer};

    use crate::{command::Command, project::Project};

    use super::{AddLightKeyframeCommand, RemoveLightKeyframeCommand};

    #[test]
    fn test_add_light_keyframe_redo_undo() {
        let mut project = Project::new();
        let mut command = AddLightKeyframeCommand::create(&project, &[10]).unwrap();
        command.redo(&mut project).unwrap();
        let motion = project.motion(project.light_motion()).unwrap();
        assert!(motion.opaque.find_light_keyframe_object(10).is_some());
        assert!(motion.selection().light.contains(&(), 10));
        assert!(motion.is_dirty());
        command.undo(&mut project).unwrap();
        let motion = project.motion(project.light_motion()).unwrap();
        assert!(motion.opaque.find_light_keyframe_object(10).is_none());
        assert!(motion.selection().light.is_empty());
    }

    #[test]
    fn test_remove_skips_missing_keyframes() {
        let mut project = Project::new();
        let light_motion = project.light_motion();
        project
            .motion_mut(light_motion)
            .unwrap()
            .opaque
            .add_light_keyframe(MotionLightKeyframe::create(0), 4)
            .unwrap();
        let command = RemoveLightKeyframeCommand::create(&project, &[4, 5]).unwrap();
        assert_eq!(1, command.keyframes().len());
        assert_eq!(4, command.keyframes()[0].frame_index);
        assert!(!command.keyframes()[0].selected);
    }

    #[test]
    fn test_command_message() {
        let project = Project::new();
        let command = AddLightKeyframeCommand::create(&project, &[1, 2]).unwrap();
        let mut buffer = MutableBuffer::create().unwrap();
        command.write_message(&mut buffer).unwrap();
        let mut buffer = buffer.create_buffer_object();
        let restored =
            AddLightKeyframeCommand::read_message(command.motion(), (), &mut buffer).unwrap();
        assert_eq!(command.keyframes(), restored.keyframes());
        assert!(buffer.is_end());
    }
}
