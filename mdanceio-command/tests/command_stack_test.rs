use mdanceio_command::{
    command::{
        AddBoneKeyframeCommand, AddCameraKeyframeCommand, AddLightKeyframeCommand,
        BatchUndoCommandListCommand, InsertEmptyTimelineFrameCommand,
    },
    error::{DomainType, MdanceioError},
    Command, CommandStack, Project,
};

use crate::common::{add_test_model, init_logger, recording_project, Event};

struct FailingCommand;

impl Command<Project> for FailingCommand {
    fn undo(&mut self, _project: &mut Project) -> Result<(), MdanceioError> {
        Ok(())
    }

    fn redo(&mut self, _project: &mut Project) -> Result<(), MdanceioError> {
        Err(MdanceioError::new("broken", "", DomainType::Command))
    }

    fn name(&self) -> &str {
        "FailingCommand"
    }
}

struct Append(&'static str);

impl Command<Vec<&'static str>> for Append {
    fn undo(&mut self, target: &mut Vec<&'static str>) -> Result<(), MdanceioError> {
        target.retain(|value| *value != self.0);
        Ok(())
    }

    fn redo(&mut self, target: &mut Vec<&'static str>) -> Result<(), MdanceioError> {
        target.push(self.0);
        Ok(())
    }

    fn name(&self) -> &str {
        self.0
    }
}

#[test]
fn soft_limit_evicts_oldest() {
    init_logger();
    let mut stack = CommandStack::new(2);
    let mut values = vec![];
    stack.push(Box::new(Append("a")), &mut values).unwrap();
    stack.push(Box::new(Append("b")), &mut values).unwrap();
    stack.push(Box::new(Append("c")), &mut values).unwrap();
    assert_eq!(2, stack.len());
    assert_eq!(2, stack.offset());
    assert_eq!(Some("c"), stack.undo_command_name());
    stack.undo(&mut values).unwrap();
    assert_eq!(1, stack.offset());
    assert_eq!(vec!["a", "b"], values);
    stack.redo(&mut values).unwrap();
    assert_eq!(2, stack.offset());
    assert_eq!(vec!["a", "b", "c"], values);
    assert!(stack.is_dirty());
}

#[test]
fn dirty_follows_save_point() {
    init_logger();
    let mut stack = CommandStack::new(8);
    let mut values = vec![];
    assert!(!stack.is_dirty());
    stack.push(Box::new(Append("a")), &mut values).unwrap();
    stack.mark_saved();
    assert!(!stack.is_dirty());
    stack.push(Box::new(Append("b")), &mut values).unwrap();
    stack.push(Box::new(Append("c")), &mut values).unwrap();
    assert!(stack.is_dirty());
    stack.set_offset(1, &mut values).unwrap();
    assert!(!stack.is_dirty());
    assert_eq!(vec!["a"], values);
    stack.push(Box::new(Append("d")), &mut values).unwrap();
    assert_eq!(2, stack.len());
    assert_eq!(None, stack.redo_command_name());
}

#[test]
fn failed_command_still_advances_cursor() {
    init_logger();
    let (mut project, events) = recording_project();
    assert!(project.push_undo(Box::new(FailingCommand)).is_err());
    assert_eq!(1, project.undo_stack().offset());
    assert!(project.can_undo());
    let events = events.borrow();
    assert!(events.contains(&Event::Error("broken".to_owned())));
    assert_eq!(Some(&Event::UndoChange(true, false)), events.last());
}

#[test]
fn batch_takes_one_history_slot() {
    init_logger();
    let (mut project, _) = recording_project();
    let camera = AddCameraKeyframeCommand::create(&project, &[3]).unwrap();
    let light = AddLightKeyframeCommand::create(&project, &[3]).unwrap();
    let batch = BatchUndoCommandListCommand::create(vec![
        Box::new(camera) as Box<dyn Command<Project>>,
        Box::new(light),
    ])
    .unwrap();
    project.push_undo(batch).unwrap();
    assert_eq!(1, project.undo_stack().len());
    let camera_motion = project.motion(project.camera_motion()).unwrap();
    assert!(camera_motion.opaque.find_camera_keyframe_object(3).is_some());
    project.undo().unwrap();
    let camera_motion = project.motion(project.camera_motion()).unwrap();
    assert!(camera_motion.opaque.find_camera_keyframe_object(3).is_none());
    let light_motion = project.motion(project.light_motion()).unwrap();
    assert!(light_motion.opaque.find_light_keyframe_object(3).is_none());
    assert!(!project.is_dirty());
}

#[test]
fn project_soft_limit_uses_wide_history() {
    init_logger();
    let mut project = Project::new();
    assert_eq!(Project::UNDO_HARD_LIMIT, project.undo_stack().hard_limit());
    assert_eq!(Project::DEFAULT_UNDO_SOFT_LIMIT, project.undo_stack().soft_limit());
    project.set_undo_soft_limit(1000);
    assert_eq!(1000, project.undo_stack().soft_limit());
    project.set_undo_soft_limit(Project::UNDO_HARD_LIMIT + 1);
    assert_eq!(1000, project.undo_stack().soft_limit());
    project.set_undo_soft_limit(2);
    for frame_index in [1, 2, 3] {
        project
            .push_undo(Box::new(
                AddLightKeyframeCommand::create(&project, &[frame_index]).unwrap(),
            ))
            .unwrap();
    }
    assert_eq!(2, project.undo_stack().len());
    let model = add_test_model(&mut project);
    assert_eq!(2, project.model_undo_stack(model).unwrap().soft_limit());
    assert_eq!(
        Project::UNDO_HARD_LIMIT,
        project.model_undo_stack(model).unwrap().hard_limit()
    );
}

#[test]
fn clearing_history_publishes_undo_change() {
    init_logger();
    let (mut project, events) = recording_project();
    let model = add_test_model(&mut project);
    project
        .push_undo(Box::new(AddCameraKeyframeCommand::create(&project, &[4]).unwrap()))
        .unwrap();
    project
        .push_model_undo(
            model,
            Box::new(AddBoneKeyframeCommand::create(&project, model, &["センター"], &[4]).unwrap()),
        )
        .unwrap();
    assert!(project.is_dirty());
    project.clear_undo_stack();
    assert!(project.undo_stack().is_empty());
    assert!(project.model_undo_stack(model).unwrap().is_empty());
    assert!(!project.can_undo());
    assert!(!project.is_dirty());
    assert_eq!(Some(&Event::UndoChange(false, false)), events.borrow().last());
    let camera_motion = project.motion(project.camera_motion()).unwrap();
    assert!(camera_motion.opaque.find_camera_keyframe_object(4).is_some());
}

#[test]
fn active_model_owns_history() {
    init_logger();
    let (mut project, events) = recording_project();
    let model = add_test_model(&mut project);
    project.set_active_model(Some(model));
    assert_eq!(Some(model), project.active_model());
    assert_eq!(Some(&Event::UndoChange(false, false)), events.borrow().last());
    project
        .push_undo(Box::new(
            AddBoneKeyframeCommand::create(&project, model, &["センター"], &[7]).unwrap(),
        ))
        .unwrap();
    assert_eq!(1, project.model_undo_stack(model).unwrap().len());
    assert!(project.project_undo_stack().is_empty());
    assert!(project.can_undo());

    project.set_active_model(None);
    assert!(!project.can_undo());
    project.undo().unwrap();
    let motion = project.resolve_model_motion(model).unwrap();
    assert!(project
        .motion(motion)
        .unwrap()
        .opaque
        .find_bone_keyframe_object("センター", 7)
        .is_some());

    project.set_active_model(Some(model));
    project.undo().unwrap();
    assert!(project
        .motion(motion)
        .unwrap()
        .opaque
        .find_bone_keyframe_object("センター", 7)
        .is_none());
    assert!(project.can_redo());

    project.set_active_model(Some(1000));
    assert_eq!(None, project.active_model());
    assert!(project.push_model_undo(1000, Box::new(FailingCommand)).is_err());
}

#[test]
fn timeline_shift_goes_to_active_model_history() {
    init_logger();
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    project.set_local_frame_index(5);
    project.set_active_model(Some(model));
    InsertEmptyTimelineFrameCommand::register(&mut project).unwrap();
    assert_eq!(1, project.model_undo_stack(model).unwrap().len());
    assert!(project.project_undo_stack().is_empty());

    project.set_active_model(None);
    InsertEmptyTimelineFrameCommand::register(&mut project).unwrap();
    assert_eq!(1, project.project_undo_stack().len());
    assert_eq!(1, project.model_undo_stack(model).unwrap().len());
}
