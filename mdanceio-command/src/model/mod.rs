pub type BoneIndex = usize;
pub type MorphIndex = usize;

pub mod bind_pose;
pub mod bone;
pub mod model;
pub mod morph;

pub use bind_pose::{BindPose, BindPoseParameter};
pub use bone::{Bone, BoneSet, BoneStates};
pub use model::{Model, ModelStates};
pub use morph::{Morph, MorphSet};
