mod common;

mod command_stack_test;
mod keyframe_command_test;
mod motion_snapshot_test;
mod transform_command_test;
