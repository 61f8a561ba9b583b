use cgmath::{Quaternion, Rotation3, Vector3, Vector4};
use nanoem::{
    motion::{
        MotionBoneKeyframe, MotionCameraKeyframe, MotionModelKeyframe, MotionMorphKeyframe,
        MotionOutsideParent,
    },
    mutable::common::MutableBuffer,
};

use mdanceio_command::{
    accessory::Accessory,
    command::{
        AddAccessoryKeyframeCommand, AddBoneKeyframeCommand, AddCameraKeyframeCommand,
        AddModelKeyframeCommand, AddMorphKeyframeCommand, AddSelfShadowKeyframeCommand,
        RemoveBoneKeyframeCommand, RemoveMorphKeyframeCommand,
    },
    Project,
};

use crate::common::{add_test_model, init_logger, recording_project, Event};

const NON_LINEAR: [u8; 4] = [10, 90, 80, 30];

fn add_bone_keyframe(project: &mut Project, model: u32, frame_index: u32) {
    let motion = project.resolve_model_motion(model).unwrap();
    let mut keyframe = MotionBoneKeyframe::create(frame_index);
    keyframe.interpolation.orientation = NON_LINEAR;
    project
        .motion_mut(motion)
        .unwrap()
        .opaque
        .add_bone_keyframe(keyframe, "センター", frame_index)
        .unwrap();
}

#[test]
fn bone_keyframe_insertion_splits_and_restores_curve() {
    init_logger();
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    add_bone_keyframe(&mut project, model, 0);
    add_bone_keyframe(&mut project, model, 100);
    let motion = project.resolve_model_motion(model).unwrap();
    let original = project
        .motion(motion)
        .unwrap()
        .opaque
        .find_bone_keyframe_object("センター", 0)
        .cloned()
        .unwrap();
    project
        .find_model_mut(model)
        .unwrap()
        .find_bone_mut("センター")
        .unwrap()
        .local_user_orientation = Quaternion::from_angle_y(cgmath::Deg(30f32));
    let command = AddBoneKeyframeCommand::create(&project, model, &["センター"], &[50]).unwrap();
    assert!(command.keyframes()[0].bezier_curve_override.is_some());
    project.push_undo(Box::new(command)).unwrap();
    let opaque = &project.motion(motion).unwrap().opaque;
    assert!(opaque.find_bone_keyframe_object("センター", 50).is_some());
    assert_ne!(
        original.interpolation.orientation,
        opaque
            .find_bone_keyframe_object("センター", 0)
            .unwrap()
            .interpolation
            .orientation
    );
    project.undo().unwrap();
    let opaque = &project.motion(motion).unwrap().opaque;
    assert!(opaque.find_bone_keyframe_object("センター", 50).is_none());
    assert_eq!(
        Some(&original),
        opaque.find_bone_keyframe_object("センター", 0)
    );
}

#[test]
fn overwriting_keyframe_is_reversible() {
    init_logger();
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    add_bone_keyframe(&mut project, model, 0);
    let motion = project.resolve_model_motion(model).unwrap();
    let original = project
        .motion(motion)
        .unwrap()
        .opaque
        .find_bone_keyframe_object("センター", 0)
        .cloned()
        .unwrap();
    project
        .find_model_mut(model)
        .unwrap()
        .find_bone_mut("センター")
        .unwrap()
        .local_user_translation = Vector3::new(1f32, 2f32, 3f32);
    let command = AddBoneKeyframeCommand::create(&project, model, &["センター"], &[0]).unwrap();
    assert!(command.keyframes()[0].updated());
    assert!(!command.keyframes()[0].selected());
    project.push_undo(Box::new(command)).unwrap();
    let translation = project
        .motion(motion)
        .unwrap()
        .opaque
        .find_bone_keyframe_object("センター", 0)
        .unwrap()
        .translation;
    assert_eq!([1f32, 2f32, 3f32], translation[..3]);
    project.undo().unwrap();
    assert_eq!(
        Some(&original),
        project
            .motion(motion)
            .unwrap()
            .opaque
            .find_bone_keyframe_object("センター", 0)
    );
}

#[test]
fn unknown_bone_is_skipped() {
    init_logger();
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    let command =
        AddBoneKeyframeCommand::create(&project, model, &["存在しない", "左腕"], &[4, 8]).unwrap();
    assert_eq!(2, command.keyframes().len());
    assert!(command.keyframes().iter().all(|k| k.track == "左腕"));
    assert!(AddBoneKeyframeCommand::create(&project, 1000, &["左腕"], &[0]).is_err());
}

#[test]
fn remove_morph_keyframe_restores_selection() {
    init_logger();
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    project
        .find_model_mut(model)
        .unwrap()
        .find_morph_mut("まばたき")
        .unwrap()
        .set_weight(0.75f32);
    project
        .push_undo(Box::new(
            AddMorphKeyframeCommand::create(&project, model, &["まばたき"], &[12]).unwrap(),
        ))
        .unwrap();
    let motion = project.resolve_model_motion(model).unwrap();
    assert!(project
        .motion(motion)
        .unwrap()
        .selection()
        .morph
        .contains(&"まばたき".to_owned(), 12));
    let command = RemoveMorphKeyframeCommand::create(&project, model, &["まばたき"], &[12]).unwrap();
    assert!(command.keyframes()[0].selected());
    project.push_undo(Box::new(command)).unwrap();
    let removed = project.motion(motion).unwrap();
    assert!(removed.opaque.find_morph_keyframe_object("まばたき", 12).is_none());
    assert!(removed.selection().morph.is_empty());
    project.undo().unwrap();
    let restored = project.motion(motion).unwrap();
    assert_eq!(
        Some(0.75f32),
        restored
            .opaque
            .find_morph_keyframe_object("まばたき", 12)
            .map(|keyframe: &MotionMorphKeyframe| keyframe.weight)
    );
    assert!(restored
        .selection()
        .morph
        .contains(&"まばたき".to_owned(), 12));
}

#[test]
fn model_keyframe_carries_constraints_and_outside_parents() {
    init_logger();
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    {
        let model = project.find_model_mut(model).unwrap();
        model.set_constraint_enabled("左足ＩＫ", false);
        model.set_outside_parent("センター", Some(("stage".to_owned(), "root".to_owned())));
        model.set_visible(false);
    }
    project
        .push_undo(Box::new(
            AddModelKeyframeCommand::create(&project, model, &[0]).unwrap(),
        ))
        .unwrap();
    let motion = project.resolve_model_motion(model).unwrap();
    let keyframe: &MotionModelKeyframe = project
        .motion(motion)
        .unwrap()
        .opaque
        .find_model_keyframe_object(0)
        .unwrap();
    assert!(!keyframe.visible);
    assert_eq!(
        Some(false),
        keyframe
            .find_constraint_state("左足ＩＫ")
            .map(|state| state.enabled)
    );
    assert_eq!(
        Some("root"),
        keyframe
            .find_outside_parent("センター")
            .map(|op| op.target_bone_name.as_str())
    );
    project.undo().unwrap();
    assert!(project
        .motion(motion)
        .unwrap()
        .opaque
        .find_model_keyframe_object(0)
        .is_none());
}

#[test]
fn overwriting_model_keyframe_keeps_binding_order() {
    init_logger();
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    let motion = project.resolve_model_motion(model).unwrap();
    let mut keyframe = MotionModelKeyframe::create(0);
    keyframe.add_constraint_state("左足ＩＫ", false).unwrap();
    keyframe.add_constraint_state("右足ＩＫ", true).unwrap();
    keyframe
        .add_outside_parent(MotionOutsideParent {
            subject_bone_name: "左腕".to_owned(),
            target_object_name: "stage".to_owned(),
            target_bone_name: "root".to_owned(),
        })
        .unwrap();
    keyframe
        .add_outside_parent(MotionOutsideParent {
            subject_bone_name: "センター".to_owned(),
            target_object_name: "stage".to_owned(),
            target_bone_name: "root".to_owned(),
        })
        .unwrap();
    project
        .motion_mut(motion)
        .unwrap()
        .opaque
        .add_model_keyframe(keyframe, 0)
        .unwrap();
    let original = project
        .motion(motion)
        .unwrap()
        .opaque
        .find_model_keyframe_object(0)
        .cloned()
        .unwrap();
    project
        .push_undo(Box::new(
            AddModelKeyframeCommand::create(&project, model, &[0]).unwrap(),
        ))
        .unwrap();
    project.undo().unwrap();
    let restored = project
        .motion(motion)
        .unwrap()
        .opaque
        .find_model_keyframe_object(0)
        .unwrap();
    assert_eq!(&original, restored);
    let names = restored
        .constraint_states
        .iter()
        .map(|state| state.bone_name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(vec!["左足ＩＫ", "右足ＩＫ"], names);
}

#[test]
fn disabled_curve_adjustment_keeps_previous_bone_curve() {
    init_logger();
    let mut project = Project::new();
    project.state_flags_mut().enable_bezier_curve_adjustment = false;
    let model = add_test_model(&mut project);
    add_bone_keyframe(&mut project, model, 0);
    add_bone_keyframe(&mut project, model, 100);
    let motion = project.resolve_model_motion(model).unwrap();
    let original = project
        .motion(motion)
        .unwrap()
        .opaque
        .find_bone_keyframe_object("センター", 0)
        .cloned()
        .unwrap();
    let command = AddBoneKeyframeCommand::create(&project, model, &["センター"], &[50]).unwrap();
    project.push_undo(Box::new(command)).unwrap();
    let opaque = &project.motion(motion).unwrap().opaque;
    assert!(opaque.find_bone_keyframe_object("センター", 50).is_some());
    assert_eq!(
        Some(&original),
        opaque.find_bone_keyframe_object("センター", 0)
    );
    project.undo().unwrap();
    let opaque = &project.motion(motion).unwrap().opaque;
    assert!(opaque.find_bone_keyframe_object("センター", 50).is_none());
    assert_eq!(
        Some(&original),
        opaque.find_bone_keyframe_object("センター", 0)
    );
}

#[test]
fn disabled_curve_adjustment_keeps_previous_camera_curve() {
    init_logger();
    let mut project = Project::new();
    project.state_flags_mut().enable_bezier_curve_adjustment = false;
    let motion = project.camera_motion();
    for frame_index in [0, 100] {
        let mut keyframe = MotionCameraKeyframe::create(frame_index);
        keyframe.interpolation.lookat_x = NON_LINEAR;
        keyframe.interpolation.angle = NON_LINEAR;
        project
            .motion_mut(motion)
            .unwrap()
            .opaque
            .add_camera_keyframe(keyframe, frame_index)
            .unwrap();
    }
    let original = project
        .motion(motion)
        .unwrap()
        .opaque
        .find_camera_keyframe_object(0)
        .cloned()
        .unwrap();
    project
        .push_undo(Box::new(AddCameraKeyframeCommand::create(&project, &[50]).unwrap()))
        .unwrap();
    let opaque = &project.motion(motion).unwrap().opaque;
    assert!(opaque.find_camera_keyframe_object(50).is_some());
    assert_eq!(Some(&original), opaque.find_camera_keyframe_object(0));
    project.undo().unwrap();
    let opaque = &project.motion(motion).unwrap().opaque;
    assert!(opaque.find_camera_keyframe_object(50).is_none());
    assert_eq!(Some(&original), opaque.find_camera_keyframe_object(0));
}

#[test]
fn camera_and_self_shadow_keyframes_negate_distance() {
    init_logger();
    let mut project = Project::new();
    project.global_camera_mut().set_distance(30f32);
    project.shadow_camera_mut().set_distance(5000f32);
    project
        .push_undo(Box::new(AddCameraKeyframeCommand::create(&project, &[0]).unwrap()))
        .unwrap();
    project
        .push_undo(Box::new(
            AddSelfShadowKeyframeCommand::create(&project, &[0]).unwrap(),
        ))
        .unwrap();
    let camera = project.motion(project.camera_motion()).unwrap();
    assert_eq!(
        Some(-30f32),
        camera
            .opaque
            .find_camera_keyframe_object(0)
            .map(|keyframe| keyframe.distance)
    );
    let self_shadow = project.motion(project.self_shadow_motion()).unwrap();
    assert_eq!(
        Some(-5000f32),
        self_shadow
            .opaque
            .find_self_shadow_keyframe_object(0)
            .map(|keyframe| keyframe.distance)
    );
}

#[test]
fn accessory_keyframe_round_trip() {
    init_logger();
    let mut project = Project::new();
    let mut accessory = Accessory::new("stage.x");
    accessory.set_translation(Vector3::new(0f32, 1f32, 0f32));
    accessory.set_opacity(0.5f32);
    let accessory = project.add_accessory(accessory);
    let motion = project.resolve_accessory_motion(accessory).unwrap();
    project
        .push_undo(Box::new(
            AddAccessoryKeyframeCommand::create(&project, accessory, &[6]).unwrap(),
        ))
        .unwrap();
    let keyframe = project
        .motion(motion)
        .unwrap()
        .opaque
        .find_accessory_keyframe_object(6)
        .cloned()
        .unwrap();
    assert_eq!(0.5f32, keyframe.opacity);
    assert_eq!([0f32, 1f32, 0f32, 1f32], keyframe.translation);
    project.undo().unwrap();
    project.redo().unwrap();
    assert_eq!(
        Some(&keyframe),
        project
            .motion(motion)
            .unwrap()
            .opaque
            .find_accessory_keyframe_object(6)
    );
}

#[test]
fn detached_motion_is_left_alone() {
    init_logger();
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    let command = AddBoneKeyframeCommand::create(&project, model, &["センター"], &[1]).unwrap();
    let motion = project.resolve_model_motion(model).unwrap();
    project.remove_motion(motion);
    project.push_undo(Box::new(command)).unwrap();
    project.undo().unwrap();
    assert!(!project.contains_motion(motion));
    assert_eq!(0, project.undo_stack().offset());
}

#[test]
fn duration_change_is_published() {
    init_logger();
    let (mut project, events) = recording_project();
    let model = add_test_model(&mut project);
    project
        .push_undo(Box::new(
            RemoveBoneKeyframeCommand::create(&project, model, &["センター"], &[0]).unwrap(),
        ))
        .unwrap();
    project
        .push_undo(Box::new(
            AddBoneKeyframeCommand::create(&project, model, &["センター"], &[500]).unwrap(),
        ))
        .unwrap();
    project.undo().unwrap();
    let durations = events
        .borrow()
        .iter()
        .filter_map(|event| match event {
            Event::UpdateDuration(current, last) => Some((*current, *last)),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(vec![(500, 300), (300, 500)], durations);
}

#[test]
fn keyframe_list_message_round_trip() {
    let mut project = Project::new();
    let model = add_test_model(&mut project);
    project
        .find_model_mut(model)
        .unwrap()
        .find_bone_mut("センター")
        .unwrap()
        .bezier_control_points
        .orientation = Vector4::new(1, 2, 3, 4);
    let command =
        AddBoneKeyframeCommand::create(&project, model, &["センター", "左腕"], &[0, 30]).unwrap();
    let mut buffer = MutableBuffer::create().unwrap();
    command.write_message(&mut buffer).unwrap();
    let mut buffer = buffer.create_buffer_object();
    let restored =
        AddBoneKeyframeCommand::read_message(command.motion(), model, &mut buffer).unwrap();
    assert_eq!(command.keyframes(), restored.keyframes());
    assert!(buffer.is_end());
}
