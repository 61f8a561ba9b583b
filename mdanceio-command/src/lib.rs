#![allow(unknown_lints)]

pub mod accessory;
pub mod bezier_curve;
pub mod camera;
pub mod command;
pub mod error;
pub mod event_publisher;
pub mod keyframe;
pub mod light;
pub mod model;
pub mod motion;
pub mod motion_keyframe_selection;
pub mod project;
pub mod shadow_camera;
mod utils;

pub use command::{Command, CommandStack};
pub use error::{DomainType, MdanceioError};
pub use project::Project;
