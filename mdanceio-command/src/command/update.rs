use nanoem::{
    common::{Buffer, Status},
    mutable::common::MutableBuffer,
};

use crate::{
    accessory::Accessory,
    camera::PerspectiveCamera,
    error::MdanceioError,
    keyframe::update::{
        AccessoryKeyframeState, CameraKeyframeState, CommandMessage, LightKeyframeState,
    },
    light::DirectionalLight,
    project::{AccessoryHandle, Project},
};

use super::Command;

pub type UpdateAccessoryCommand = UpdateEntityCommand<Accessory>;
pub type UpdateCameraCommand = UpdateEntityCommand<PerspectiveCamera>;
pub type UpdateLightCommand = UpdateEntityCommand<DirectionalLight>;

/// A live project entity whose whole editable state can be swapped in one step.
pub trait UpdatableEntity: Sized {
    type State: CommandMessage + Clone + PartialEq + std::fmt::Debug;
    /// How the project addresses the entity; `()` for the global ones.
    type Target: Copy + std::fmt::Debug;

    const COMMAND_NAME: &'static str;

    fn state_of(entity: &Self) -> Self::State;

    fn find(project: &Project, target: Self::Target) -> Option<&Self>;

    fn find_mut(project: &mut Project, target: Self::Target) -> Option<&mut Self>;

    fn apply(&mut self, state: &Self::State);
}

impl UpdatableEntity for PerspectiveCamera {
    type State = CameraKeyframeState;
    type Target = ();

    const COMMAND_NAME: &'static str = "UpdateCameraCommand";

    fn state_of(entity: &Self) -> Self::State {
        CameraKeyframeState::from_camera(entity)
    }

    fn find(project: &Project, _target: ()) -> Option<&Self> {
        Some(project.global_camera())
    }

    fn find_mut(project: &mut Project, _target: ()) -> Option<&mut Self> {
        Some(project.global_camera_mut())
    }

    fn apply(&mut self, state: &Self::State) {
        state.assign_to_camera(self);
        self.set_dirty(true);
    }
}

impl UpdatableEntity for DirectionalLight {
    type State = LightKeyframeState;
    type Target = ();

    const COMMAND_NAME: &'static str = "UpdateLightCommand";

    fn state_of(entity: &Self) -> Self::State {
        LightKeyframeState::from_light(entity)
    }

    fn find(project: &Project, _target: ()) -> Option<&Self> {
        Some(project.global_light())
    }

    fn find_mut(project: &mut Project, _target: ()) -> Option<&mut Self> {
        Some(project.global_light_mut())
    }

    fn apply(&mut self, state: &Self::State) {
        state.assign_to_light(self);
        self.set_dirty(true);
    }
}

impl UpdatableEntity for Accessory {
    type State = AccessoryKeyframeState;
    type Target = AccessoryHandle;

    const COMMAND_NAME: &'static str = "UpdateAccessoryCommand";

    fn state_of(entity: &Self) -> Self::State {
        AccessoryKeyframeState::from_accessory(entity)
    }

    fn find(project: &Project, target: AccessoryHandle) -> Option<&Self> {
        project.accessory(target)
    }

    fn find_mut(project: &mut Project, target: AccessoryHandle) -> Option<&mut Self> {
        project.find_accessory_mut(target)
    }

    fn apply(&mut self, state: &Self::State) {
        state.assign_to_accessory(self);
        self.set_dirty(true);
    }
}

/// Replaces the live state of a camera, light or accessory.
///
/// Both directions first seek back to the local frame index the edit was made at.
#[derive(Debug, Clone)]
pub struct UpdateEntityCommand<E: UpdatableEntity> {
    target: E::Target,
    local_frame_index: u32,
    before: E::State,
    after: E::State,
}

impl<E: UpdatableEntity> UpdateEntityCommand<E> {
    /// Captures the current state of the entity as the undo side.
    pub fn create(
        project: &Project,
        target: E::Target,
        after: E::State,
    ) -> Result<Self, MdanceioError> {
        let entity = E::find(project, target).ok_or_else(MdanceioError::accessory_not_found)?;
        Ok(Self {
            target,
            local_frame_index: project.current_local_frame_index(),
            before: E::state_of(entity),
            after,
        })
    }

    /// Same as [`Self::create`] with the state copied from `source`.
    pub fn create_from(
        project: &Project,
        target: E::Target,
        source: &E,
    ) -> Result<Self, MdanceioError> {
        Self::create(project, target, E::state_of(source))
    }

    pub fn local_frame_index(&self) -> u32 {
        self.local_frame_index
    }

    pub fn before(&self) -> &E::State {
        &self.before
    }

    pub fn after(&self) -> &E::State {
        &self.after
    }

    pub fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_u32_little_endian(self.local_frame_index)?;
        self.after.write_message(buffer)?;
        self.before.write_message(buffer)
    }

    pub fn read_message(target: E::Target, buffer: &mut Buffer) -> Result<Self, Status> {
        let local_frame_index = buffer.read_u32_little_endian()?;
        let after = E::State::read_message(buffer)?;
        let before = E::State::read_message(buffer)?;
        Ok(Self {
            target,
            local_frame_index,
            before,
            after,
        })
    }

    fn execute(&self, project: &mut Project, state: &E::State) {
        project.set_local_frame_index(self.local_frame_index);
        match E::find_mut(project, self.target) {
            Some(entity) => entity.apply(state),
            None => log::debug!("{:?} is no longer in the project", self.target),
        }
    }
}

impl<E: UpdatableEntity> Command<Project> for UpdateEntityCommand<E> {
    fn undo(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        self.execute(project, &self.before);
        Ok(())
    }

    fn redo(&mut self, project: &mut Project) -> Result<(), MdanceioError> {
        self.execute(project, &self.after);
        Ok(())
    }

    fn name(&self) -> &str {
        E::COMMAND_NAME
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use crate::{
        command::Command, keyframe::update::LightKeyframeState, light::DirectionalLight,
        project::Project,
    };

    use super::UpdateLightCommand;

    #[test]
    fn test_update_light_restores_frame_index() {
        let mut project = Project::new();
        project.set_local_frame_index(12);
        let mut source = DirectionalLight::new();
        source.set_color(Vector3::new(1f32, 0f32, 0f32));
        let mut command = UpdateLightCommand::create_from(&project, (), &source).unwrap();
        command.redo(&mut project).unwrap();
        assert_eq!(Vector3::new(1f32, 0f32, 0f32), project.global_light().color());
        project.set_local_frame_index(30);
        command.undo(&mut project).unwrap();
        assert_eq!(12, project.current_local_frame_index());
        assert_eq!(DirectionalLight::INITIAL_COLOR, project.global_light().color());
        assert_eq!(
            &LightKeyframeState::from_light(&DirectionalLight::new()),
            command.before()
        );
    }
}
