use nanoem::motion::{MotionKeyframeColumn, MotionKeyframeTypes};

use crate::{
    error::MdanceioError,
    motion_keyframe_selection::MotionKeyframeSelection,
    project::{ModelHandle, MotionHandle, Project},
};

use super::{BatchUndoCommandListCommand, Command};

/// Moves a frame column of one motion in either direction.
///
/// The column removed by a forward shift is kept and put back by the next backward shift,
/// together with the selection as it was before the removal.
#[derive(Debug, Clone)]
struct TimelineFrameShift {
    motion: MotionHandle,
    frame_index: u32,
    types: MotionKeyframeTypes,
    column: MotionKeyframeColumn,
    selection: Option<MotionKeyframeSelection>,
}

impl TimelineFrameShift {
    fn new(motion: MotionHandle, frame_index: u32, types: MotionKeyframeTypes) -> Self {
        Self {
            motion,
            frame_index,
            types,
            column: MotionKeyframeColumn::default(),
            selection: None,
        }
    }

    /// Opens an empty column at the pivot by moving every later keyframe one frame later.
    fn shift_backward(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        let last_duration = project.project_duration();
        let motion = match project.motion_mut(self.motion) {
            Some(motion) => motion,
            None => {
                log::debug!("Motion {} is detached, skip shifting", self.motion);
                return Ok(());
            }
        };
        motion.opaque.shift_keyframes(self.types, self.frame_index, 1);
        match self.selection.take() {
            Some(saved) => motion.selection_mut().restore(self.types, &saved),
            None => motion
                .selection_mut()
                .shift_keyframes(self.types, self.frame_index, 1),
        }
        let column = std::mem::take(&mut self.column);
        let result = if column.is_empty() {
            Ok(())
        } else {
            log::trace!(
                "Restoring {} keyframes at {}",
                column.len(),
                self.frame_index
            );
            motion
                .opaque
                .restore_keyframe_column(column, self.frame_index)
                .map_err(|status| {
                    MdanceioError::from_nanoem("Cannot restore the frame column: ", status)
                })
        };
        project.commit_motion(self.motion, last_duration);
        result
    }

    /// Drops the column at the pivot and moves every later keyframe one frame earlier.
    fn shift_forward(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        let last_duration = project.project_duration();
        let motion = match project.motion_mut(self.motion) {
            Some(motion) => motion,
            None => {
                log::debug!("Motion {} is detached, skip shifting", self.motion);
                return Ok(());
            }
        };
        let next_frame_index = self.frame_index.saturating_add(1);
        self.selection = Some(motion.selection().clone());
        self.column = motion
            .opaque
            .take_keyframe_column(self.types, self.frame_index);
        motion.opaque.shift_keyframes(self.types, next_frame_index, -1);
        let selection = motion.selection_mut();
        selection.remove_keyframe_column(self.types, self.frame_index);
        selection.shift_keyframes(self.types, next_frame_index, -1);
        project.commit_motion(self.motion, last_duration);
        Ok(())
    }
}

/// Commands shifting the model channels of `model`, or the accessory, camera, light and self
/// shadow channels when there is no model.
fn build_shift_commands<F>(
    project: &Project,
    model: Option<ModelHandle>,
    mut create: F,
) -> Vec<Box<dyn Command<Project>>>
where
    F: FnMut(MotionHandle, MotionKeyframeTypes) -> Box<dyn Command<Project>>,
{
    let mut commands = vec![];
    match model {
        Some(model) => {
            if let Some(motion) = project.resolve_model_motion(model) {
                for types in [
                    MotionKeyframeTypes::BONE,
                    MotionKeyframeTypes::MODEL,
                    MotionKeyframeTypes::MORPH,
                ] {
                    commands.push(create(motion, types));
                }
            }
        }
        None => {
            for accessory in project.accessory_handles() {
                if let Some(motion) = project.resolve_accessory_motion(accessory) {
                    commands.push(create(motion, MotionKeyframeTypes::ACCESSORY));
                }
            }
            commands.push(create(project.camera_motion(), MotionKeyframeTypes::CAMERA));
            commands.push(create(project.light_motion(), MotionKeyframeTypes::LIGHT));
            commands.push(create(
                project.self_shadow_motion(),
                MotionKeyframeTypes::SELF_SHADOW,
            ));
        }
    }
    commands
}

/// Records `batch` in the history of `model`, or in the project history for global channels.
fn push_shift_batch(
    project: &mut Project,
    model: Option<ModelHandle>,
    batch: Option<Box<dyn Command<Project>>>,
) -> Result<(), MdanceioError> {
    match (batch, model) {
        (Some(batch), Some(model)) => project.push_model_undo(model, batch),
        (Some(batch), None) => project.push_undo(batch),
        (None, _) => Ok(()),
    }
}

/// Inserts an empty frame column at a pivot, pushing every later keyframe one frame later.
///
/// Frame zero always holds the initial keyframes, so a pivot of zero does nothing.
#[derive(Debug, Clone)]
pub struct InsertEmptyTimelineFrameCommand {
    shift: TimelineFrameShift,
}

impl InsertEmptyTimelineFrameCommand {
    pub fn new(motion: MotionHandle, frame_index: u32, types: MotionKeyframeTypes) -> Self {
        Self {
            shift: TimelineFrameShift::new(motion, frame_index, types),
        }
    }

    /// Builds one command per channel at the current local frame index, grouped into a batch.
    pub fn create_batch(
        project: &Project,
        model: Option<ModelHandle>,
    ) -> Option<Box<dyn Command<Project>>> {
        let frame_index = project.current_local_frame_index();
        if frame_index == 0 {
            return None;
        }
        BatchUndoCommandListCommand::create(build_shift_commands(
            project,
            model,
            |motion, types| Box::new(Self::new(motion, frame_index, types)),
        ))
    }

    /// Shifts the channels of the active model, or the global channels when no model is
    /// active, at the current local frame index.
    pub fn register(project: &mut Project) -> Result<(), MdanceioError> {
        let model = project.active_model();
        let batch = Self::create_batch(project, model);
        push_shift_batch(project, model, batch)
    }

    pub fn frame_index(&self) -> u32 {
        self.shift.frame_index
    }
}

impl Command<Project> for InsertEmptyTimelineFrameCommand {
    fn undo(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        if self.shift.frame_index == 0 {
            return Ok(());
        }
        self.shift.shift_forward(project)
    }

    fn redo(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        if self.shift.frame_index == 0 {
            return Ok(());
        }
        self.shift.shift_backward(project)
    }

    fn name(&self) -> &str {
        "InsertEmptyTimelineFrameCommand"
    }
}

/// Deletes the frame column at a pivot, pulling every later keyframe one frame earlier.
#[derive(Debug, Clone)]
pub struct RemoveTimelineFrameCommand {
    shift: TimelineFrameShift,
}

impl RemoveTimelineFrameCommand {
    pub fn new(motion: MotionHandle, frame_index: u32, types: MotionKeyframeTypes) -> Self {
        Self {
            shift: TimelineFrameShift::new(motion, frame_index, types),
        }
    }

    /// Builds one command per channel at the current local frame index, grouped into a batch.
    pub fn create_batch(
        project: &Project,
        model: Option<ModelHandle>,
    ) -> Option<Box<dyn Command<Project>>> {
        let frame_index = project.current_local_frame_index();
        BatchUndoCommandListCommand::create(build_shift_commands(
            project,
            model,
            |motion, types| Box::new(Self::new(motion, frame_index, types)),
        ))
    }

    /// Shifts the channels of the active model, or the global channels when no model is
    /// active, at the current local frame index.
    pub fn register(project: &mut Project) -> Result<(), MdanceioError> {
        let model = project.active_model();
        let batch = Self::create_batch(project, model);
        push_shift_batch(project, model, batch)
    }

    pub fn frame_index(&self) -> u32 {
        self.shift.frame_index
    }
}

impl Command<Project> for RemoveTimelineFrameCommand {
    fn undo(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        self.shift.shift_backward(project)
    }

    fn redo(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        self.shift.shift_forward(project)
    }

    fn name(&self) -> &str {
        "RemoveTimelineFrameCommand"
    }
}

#[cfg(test)]
mod tests {
    use nanoem::motion::{MotionKeyframeTypes, MotionLightKeyframe};

    use crate::{command::Command, project::Project};

    use super::{InsertEmptyTimelineFrameCommand, RemoveTimelineFrameCommand};

    fn light_frames(project: &Project) -> Vec<u32> {
        let mut frames = project
            .motion(project.light_motion())
            .unwrap()
            .opaque
            .light_keyframes
            .iter()
            .map(|keyframe| keyframe.base.frame_index)
            .collect::<Vec<_>>();
        frames.sort_unstable();
        frames
    }

    fn project_with_light_keyframes(frames: &[u32]) -> Project {
        let mut project = Project::new();
        let motion = project.light_motion();
        for &frame_index in frames {
            project
                .motion_mut(motion)
                .unwrap()
                .opaque
                .add_light_keyframe(MotionLightKeyframe::create(frame_index), frame_index)
                .unwrap();
        }
        project
    }

    #[test]
    fn test_insert_empty_frame() {
        let mut project = project_with_light_keyframes(&[0, 5, 10]);
        let mut command =
            InsertEmptyTimelineFrameCommand::new(project.light_motion(), 5, MotionKeyframeTypes::LIGHT);
        command.redo(&mut project).unwrap();
        assert_eq!(vec![0, 6, 11], light_frames(&project));
        command.undo(&mut project).unwrap();
        assert_eq!(vec![0, 5, 10], light_frames(&project));
    }

    #[test]
    fn test_remove_frame_restores_column() {
        let mut project = project_with_light_keyframes(&[0, 5, 10]);
        let mut command =
            RemoveTimelineFrameCommand::new(project.light_motion(), 5, MotionKeyframeTypes::LIGHT);
        command.redo(&mut project).unwrap();
        assert_eq!(vec![0, 9], light_frames(&project));
        command.undo(&mut project).unwrap();
        assert_eq!(vec![0, 5, 10], light_frames(&project));
    }

    #[test]
    fn test_insert_at_zero_is_noop() {
        let mut project = project_with_light_keyframes(&[0, 5]);
        let mut command =
            InsertEmptyTimelineFrameCommand::new(project.light_motion(), 0, MotionKeyframeTypes::LIGHT);
        command.redo(&mut project).unwrap();
        assert_eq!(vec![0, 5], light_frames(&project));
        assert!(InsertEmptyTimelineFrameCommand::create_batch(&project, None).is_none());
    }
}
