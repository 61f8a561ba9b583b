use nanoem::motion::{MotionKeyframeTypes, MotionMorphKeyframe};

use mdanceio_command::{
    command::{CompressedSnapshot, MotionSnapshot, MotionSnapshotCommand},
    error::DomainType,
    motion_keyframe_selection::MotionKeyframeSelection,
    Command, Project,
};

use crate::common::{add_test_model, init_logger};

fn morph_frames(project: &Project, motion: u32) -> Vec<u32> {
    let mut frames = project
        .motion(motion)
        .unwrap()
        .opaque
        .get_all_morph_keyframe_objects()
        .map(|(_, keyframe)| keyframe.base.frame_index)
        .collect::<Vec<_>>();
    frames.sort_unstable();
    frames
}

fn add_morph_keyframe(project: &mut Project, motion: u32, frame_index: u32) {
    project
        .motion_mut(motion)
        .unwrap()
        .opaque
        .add_morph_keyframe(MotionMorphKeyframe::create(frame_index), "あ", frame_index)
        .unwrap();
}

#[test]
fn snapshot_swaps_whole_channel() {
    init_logger();
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    let motion = project.resolve_model_motion(model).unwrap();
    add_morph_keyframe(&mut project, motion, 0);
    add_morph_keyframe(&mut project, motion, 10);
    let last =
        MotionSnapshot::capture(project.motion(motion).unwrap(), MotionKeyframeTypes::MORPH)
            .unwrap();
    {
        let edited = project.motion_mut(motion).unwrap();
        edited.opaque.remove_morph_keyframe("あ", 10).unwrap();
        edited
            .opaque
            .add_morph_keyframe(MotionMorphKeyframe::create(20), "あ", 20)
            .unwrap();
        edited.selection_mut().morph.add(&"あ".to_owned(), 20);
    }
    let command =
        MotionSnapshotCommand::create(&project, motion, last, MotionKeyframeTypes::MORPH).unwrap();
    project.push_undo(Box::new(command)).unwrap();
    assert_eq!(vec![0, 20], morph_frames(&project, motion));
    project.undo().unwrap();
    assert_eq!(vec![0, 10], morph_frames(&project, motion));
    assert!(project.motion(motion).unwrap().selection().morph.is_empty());
    project.redo().unwrap();
    assert_eq!(vec![0, 20], morph_frames(&project, motion));
    assert!(project
        .motion(motion)
        .unwrap()
        .selection()
        .morph
        .contains(&"あ".to_owned(), 20));
}

#[test]
fn corrupted_snapshot_leaves_motion_untouched() {
    init_logger();
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    let motion = project.resolve_model_motion(model).unwrap();
    add_morph_keyframe(&mut project, motion, 5);
    let corrupted = MotionSnapshot::from_parts(
        CompressedSnapshot::from_raw_parts(vec![0xff, 0xff, 0xff], 64),
        MotionKeyframeSelection::default(),
    );
    let mut command =
        MotionSnapshotCommand::create(&project, motion, corrupted, MotionKeyframeTypes::MORPH)
            .unwrap();
    let err = command.undo(&mut project).unwrap_err();
    assert_eq!(DomainType::Command, err.domain());
    assert_eq!(vec![5], morph_frames(&project, motion));
}

#[test]
fn detached_motion_skips_snapshot() {
    init_logger();
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    let motion = project.resolve_model_motion(model).unwrap();
    add_morph_keyframe(&mut project, motion, 0);
    let last =
        MotionSnapshot::capture(project.motion(motion).unwrap(), MotionKeyframeTypes::MORPH)
            .unwrap();
    add_morph_keyframe(&mut project, motion, 10);
    let command =
        MotionSnapshotCommand::create(&project, motion, last, MotionKeyframeTypes::MORPH).unwrap();
    project.remove_motion(motion).unwrap();
    project.push_undo(Box::new(command)).unwrap();
    project.undo().unwrap();
    project.redo().unwrap();
    assert!(!project.contains_motion(motion));
    assert_eq!(None, project.resolve_model_motion(model));
    assert_eq!(1, project.undo_stack().offset());
}

#[test]
fn oversized_inflated_size_is_corrupted() {
    init_logger();
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    let motion = project.resolve_model_motion(model).unwrap();
    add_morph_keyframe(&mut project, motion, 5);
    let oversized = MotionSnapshot::from_parts(
        CompressedSnapshot::from_raw_parts(vec![0u8; 4], usize::MAX),
        MotionKeyframeSelection::default(),
    );
    let mut command =
        MotionSnapshotCommand::create(&project, motion, oversized, MotionKeyframeTypes::MORPH)
            .unwrap();
    let err = command.undo(&mut project).unwrap_err();
    assert_eq!(DomainType::Command, err.domain());
    assert_eq!(vec![5], morph_frames(&project, motion));
}
