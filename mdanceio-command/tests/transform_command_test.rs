use cgmath::{Deg, One, Quaternion, Rotation3, Vector3};
use nanoem::mutable::common::MutableBuffer;

use mdanceio_command::{
    command::{BoneResetType, TransformBoneCommand, TransformMorphCommand},
    model::BindPose,
    Project,
};

use crate::common::{add_test_model, init_logger};

fn bone_transform(project: &Project, model: u32, name: &str) -> (Vector3<f32>, Quaternion<f32>) {
    let bone = project.model(model).unwrap().find_bone(name).unwrap();
    (bone.local_user_translation, bone.local_user_orientation)
}

#[test]
fn bone_transform_goes_to_model_history() {
    init_logger();
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    project.set_local_frame_index(24);
    let orientation = Quaternion::from_angle_z(Deg(30f32));
    let command = TransformBoneCommand::create_from_transform(
        &project,
        model,
        "左腕",
        Vector3::new(0f32, 1f32, 0f32),
        orientation,
    )
    .unwrap();
    assert_eq!(24, command.local_frame_index());
    project.push_model_undo(model, Box::new(command)).unwrap();
    assert_eq!(
        (Vector3::new(0f32, 1f32, 0f32), orientation),
        bone_transform(&project, model, "左腕")
    );
    assert!(project.model(model).unwrap().has_any_dirty_bone());
    assert_eq!(1, project.model_undo_stack(model).unwrap().len());
    assert!(project.project_undo_stack().is_empty());

    project.set_local_frame_index(0);
    project.set_active_model(Some(model));
    project.undo().unwrap();
    assert_eq!(24, project.current_local_frame_index());
    assert_eq!(
        (Vector3::new(0f32, 0f32, 0f32), Quaternion::one()),
        bone_transform(&project, model, "左腕")
    );
    assert!(!project.model(model).unwrap().has_any_dirty_bone());
    project.redo().unwrap();
    assert_eq!(
        (Vector3::new(0f32, 1f32, 0f32), orientation),
        bone_transform(&project, model, "左腕")
    );
}

#[test]
fn unknown_bone_cannot_be_transformed() {
    init_logger();
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    assert!(TransformBoneCommand::create_from_transform(
        &project,
        model,
        "存在しない",
        Vector3::new(0f32, 0f32, 0f32),
        Quaternion::one(),
    )
    .is_err());
    assert!(TransformBoneCommand::create_reset(
        &project,
        1000,
        &["センター"],
        BoneResetType::Orientation
    )
    .is_err());
}

#[test]
fn orientation_reset_is_undoable() {
    init_logger();
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    let orientation = Quaternion::from_angle_y(Deg(45f32));
    project
        .find_model_mut(model)
        .unwrap()
        .find_bone_mut("センター")
        .unwrap()
        .local_user_orientation = orientation;
    let command = TransformBoneCommand::create_reset(
        &project,
        model,
        &["センター", "存在しない"],
        BoneResetType::Orientation,
    )
    .unwrap();
    project.push_model_undo(model, Box::new(command)).unwrap();
    assert_eq!(
        Quaternion::one(),
        bone_transform(&project, model, "センター").1
    );
    project.set_active_model(Some(model));
    project.undo().unwrap();
    assert_eq!(orientation, bone_transform(&project, model, "センター").1);
}

#[test]
fn morph_transform_restores_weights_and_pose() {
    init_logger();
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    project
        .find_model_mut(model)
        .unwrap()
        .find_morph_mut("あ")
        .unwrap()
        .set_weight(0.25f32);
    let pose = BindPose::save(&project.model(model).unwrap().bones);
    let command = TransformMorphCommand::create(
        &project,
        model,
        &[("あ", 1f32), ("まばたき", 0.5f32), ("存在しない", 1f32)],
    )
    .unwrap();
    assert_eq!(2, command.weight_states().len());
    project.push_model_undo(model, Box::new(command)).unwrap();
    let weight = |project: &Project, name: &str| {
        project.model(model).unwrap().find_morph(name).unwrap().weight()
    };
    assert_eq!(1f32, weight(&project, "あ"));
    assert_eq!(0.5f32, weight(&project, "まばたき"));

    project
        .find_model_mut(model)
        .unwrap()
        .find_bone_mut("センター")
        .unwrap()
        .local_user_translation = Vector3::new(3f32, 0f32, 0f32);
    project.set_active_model(Some(model));
    project.undo().unwrap();
    assert_eq!(0.25f32, weight(&project, "あ"));
    assert_eq!(0f32, weight(&project, "まばたき"));
    assert_eq!(pose, BindPose::save(&project.model(model).unwrap().bones));

    project
        .push_undo(Box::new(
            TransformMorphCommand::create_reset(&project, model, &["あ"]).unwrap(),
        ))
        .unwrap();
    assert_eq!(0f32, weight(&project, "あ"));
}

#[test]
fn morph_transform_message_round_trip() {
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    let command = TransformMorphCommand::create(&project, model, &[("あ", 0.75f32)]).unwrap();
    let mut buffer = MutableBuffer::create().unwrap();
    command.write_message(&mut buffer).unwrap();
    let mut buffer = buffer.create_buffer_object();
    let restored = TransformMorphCommand::read_message(model, &mut buffer).unwrap();
    assert_eq!(command.weight_states(), restored.weight_states());
    assert!(buffer.is_end());
}
