pub mod batch;
pub mod keyframe;
pub mod motion_snapshot;
pub mod shift;
pub mod stack;
pub mod transform;
pub mod update;

use crate::error::MdanceioError;

pub use batch::BatchUndoCommandListCommand;
pub use keyframe::{
    AddAccessoryKeyframeCommand, AddBoneKeyframeCommand, AddCameraKeyframeCommand,
    AddKeyframeCommand, AddLightKeyframeCommand, AddModelKeyframeCommand,
    AddMorphKeyframeCommand, AddSelfShadowKeyframeCommand, RemoveAccessoryKeyframeCommand,
    RemoveBoneKeyframeCommand, RemoveCameraKeyframeCommand, RemoveKeyframeCommand,
    RemoveLightKeyframeCommand, RemoveModelKeyframeCommand, RemoveMorphKeyframeCommand,
    RemoveSelfShadowKeyframeCommand,
};
pub use motion_snapshot::{CompressedSnapshot, MotionSnapshot, MotionSnapshotCommand};
pub use shift::{InsertEmptyTimelineFrameCommand, RemoveTimelineFrameCommand};
pub use stack::CommandStack;
pub use transform::{
    BoneResetType, MorphWeightState, TransformBoneCommand, TransformMorphCommand,
};
pub use update::{
    UpdatableEntity, UpdateAccessoryCommand, UpdateCameraCommand, UpdateEntityCommand,
    UpdateLightCommand,
};

/// A reversible unit of work recorded in a [`CommandStack`].
///
/// `T` is whatever the command mutates; editor commands use the project. Dropping a command
/// releases everything it captured.
pub trait Command<T> {
    fn undo(&mut self, target: &mut T) -> Result<(), MdanceioError>;

    fn redo(&mut self, target: &mut T) -> Result<(), MdanceioError>;

    fn can_undo(&self, _target: &T) -> bool {
        true
    }

    fn can_redo(&self, _target: &T) -> bool {
        true
    }

    /// Returning false skips the undo callback while the stack cursor still moves.
    fn persist_undo(&self, _target: &T) -> bool {
        true
    }

    /// Returning false skips the redo callback. A push is rejected outright.
    fn persist_redo(&self, _target: &T) -> bool {
        true
    }

    fn name(&self) -> &str;
}
